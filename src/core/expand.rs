//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use super::error::ExpandError;
use super::preprocess::char_set;
use std::fmt::Display;
use std::str::FromStr;

/// A reference to one or more scalar bits written as a single identifier
/// token: either a plain scalar name, or a vector notation carrying a
/// descending bit range with an optional step.
#[derive(Debug, PartialEq, Clone)]
pub enum NetRef {
    Scalar(String),
    Vector(VectorRef),
}

impl NetRef {
    /// Access the common name prefix shared by all referenced bits.
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(name) => name.as_ref(),
            Self::Vector(vec) => vec.name.as_ref(),
        }
    }

    /// Casts to the inner vector reference, if the token is one.
    pub fn as_vector(&self) -> Option<&VectorRef> {
        match self {
            Self::Vector(vec) => Some(vec),
            _ => None,
        }
    }

    /// Rewrites the reference into its ordered list of scalar bit names,
    /// most significant bit first.
    pub fn expand(&self) -> Vec<String> {
        match self {
            Self::Scalar(name) => vec![name.clone()],
            Self::Vector(vec) => vec.components(),
        }
    }
}

impl FromStr for NetRef {
    type Err = ExpandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, selection) = match s.find(char_set::BRACK_L) {
            Some(i) => (&s[0..i], Some(&s[i..])),
            None => (s, None),
        };
        if is_identifier(name) == false {
            return Err(ExpandError::InvalidIdentifier(s.to_string()));
        }
        match selection {
            Some(sel) => Ok(Self::Vector(VectorRef::parse(name, sel, s)?)),
            None => Ok(Self::Scalar(name.to_string())),
        }
    }
}

impl Display for NetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(name) => write!(f, "{}", name),
            Self::Vector(vec) => write!(f, "{}", vec),
        }
    }
}

/// A bit-sliced vector notation: `name[msb..lsb]` or `name[msb.step.lsb]`.
///
/// Bit indices are non-negative and run most significant to least
/// significant.
#[derive(Debug, PartialEq, Clone)]
pub struct VectorRef {
    name: String,
    msb: usize,
    lsb: usize,
    step: usize,
}

impl VectorRef {
    /// Creates a unit-step vector reference over `[msb..lsb]`.
    pub fn new(name: &str, msb: usize, lsb: usize) -> Self {
        Self {
            name: name.to_string(),
            msb: msb,
            lsb: lsb,
            step: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn msb(&self) -> usize {
        self.msb
    }

    pub fn lsb(&self) -> usize {
        self.lsb
    }

    /// Expands the notation into scalar bit names, descending from the msb
    /// by `step` while the index remains at or above the lsb.
    pub fn components(&self) -> Vec<String> {
        let mut bits = Vec::new();
        let mut i = self.msb;
        loop {
            bits.push(format!("{}{}", self.name, i));
            if i < self.lsb + self.step {
                break;
            }
            i -= self.step;
        }
        bits
    }

    /// Interprets the bracketed selection `sel` (including its brackets) for
    /// the vector named `name`. The full token `token` is only used in error
    /// reporting.
    fn parse(name: &str, sel: &str, token: &str) -> Result<Self, ExpandError> {
        let inner = sel
            .strip_prefix(char_set::BRACK_L)
            .and_then(|s| s.strip_suffix(char_set::BRACK_R))
            .ok_or(ExpandError::InvalidVector(token.to_string()))?;
        // the range form takes precedence over the step form because the
        // step form never contains consecutive dots
        let (msb, lsb, step) = if let Some((hi, lo)) = inner.split_once("..") {
            (hi, lo, None)
        } else {
            let mut parts = inner.split('.');
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(hi), Some(k), Some(lo), None) => (hi, lo, Some(k)),
                _ => return Err(ExpandError::InvalidVector(token.to_string())),
            }
        };
        let msb = parse_index(msb, token)?;
        let lsb = parse_index(lsb, token)?;
        let step = match step {
            Some(k) => {
                let k = parse_index(k, token)?;
                if k == 0 {
                    return Err(ExpandError::ZeroStep(token.to_string()));
                }
                k
            }
            None => 1,
        };
        if msb < lsb {
            return Err(ExpandError::ReversedRange(token.to_string(), msb, lsb));
        }
        Ok(Self {
            name: name.to_string(),
            msb: msb,
            lsb: lsb,
            step: step,
        })
    }
}

impl Display for VectorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.step {
            1 => write!(f, "{}[{}..{}]", self.name, self.msb, self.lsb),
            _ => write!(f, "{}[{}.{}.{}]", self.name, self.msb, self.step, self.lsb),
        }
    }
}

/// Verifies `s` is a legal identifier: a letter followed by letters, digits,
/// or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => {
            char_set::is_letter(&c) && chars.all(|d| char_set::is_identifier_character(&d))
        }
        None => false,
    }
}

fn parse_index(s: &str, token: &str) -> Result<usize, ExpandError> {
    match s.parse::<usize>() {
        Ok(i) => Ok(i),
        Err(_) => Err(ExpandError::InvalidVector(token.to_string())),
    }
}

/// Splits a whitespace-separated identifier list into net references,
/// flattening `{ … }` concatenations while preserving left-to-right order.
pub fn expand_list(text: &str) -> Result<Vec<NetRef>, ExpandError> {
    let mut refs = Vec::new();
    let mut depth: usize = 0;
    let mut any_braced = false;
    for word in text
        .replace(char_set::BRACE_L, " { ")
        .replace(char_set::BRACE_R, " } ")
        .split_whitespace()
    {
        match word {
            "{" => {
                depth += 1;
                any_braced = true;
            }
            "}" => {
                depth = depth.checked_sub(1).ok_or(ExpandError::MismatchedBraces)?;
            }
            _ => refs.push(NetRef::from_str(word)?),
        }
    }
    if depth != 0 {
        return Err(ExpandError::MismatchedBraces);
    }
    if any_braced == true && refs.is_empty() == true {
        return Err(ExpandError::EmptyConcat);
    }
    Ok(refs)
}

/// Rewrites a list of net references into the flat ordered list of scalar
/// bit names.
pub fn flatten(refs: &[NetRef]) -> Vec<String> {
    refs.iter().flat_map(|r| r.expand()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ut_scalar() {
        let net = NetRef::from_str("ready").unwrap();
        assert_eq!(net.expand(), vec!["ready"]);
    }

    #[test]
    fn ut_vector_range() {
        let net = NetRef::from_str("X[3..0]").unwrap();
        assert_eq!(net.expand(), vec!["X3", "X2", "X1", "X0"]);
    }

    #[test]
    fn ut_vector_single_bit_range() {
        let net = NetRef::from_str("q[2..2]").unwrap();
        assert_eq!(net.expand(), vec!["q2"]);
    }

    #[test]
    fn ut_vector_step() {
        let net = NetRef::from_str("X[6.2.0]").unwrap();
        assert_eq!(net.expand(), vec!["X6", "X4", "X2", "X0"]);
        // a step that does not land exactly on the lsb stops above it
        let net = NetRef::from_str("X[7.3.0]").unwrap();
        assert_eq!(net.expand(), vec!["X7", "X4", "X1"]);
    }

    #[test]
    fn ut_reversed_range() {
        assert_eq!(
            NetRef::from_str("X[0..3]").unwrap_err(),
            ExpandError::ReversedRange(String::from("X[0..3]"), 0, 3)
        );
    }

    #[test]
    fn ut_zero_step() {
        assert_eq!(
            NetRef::from_str("X[3.0.0]").unwrap_err(),
            ExpandError::ZeroStep(String::from("X[3.0.0]"))
        );
    }

    #[test]
    fn ut_bad_notation() {
        assert!(NetRef::from_str("X[3..]").is_err());
        assert!(NetRef::from_str("X[..0]").is_err());
        assert!(NetRef::from_str("X[a..b]").is_err());
        assert!(NetRef::from_str("X[3..0").is_err());
        assert!(NetRef::from_str("2bad").is_err());
        assert!(NetRef::from_str("").is_err());
    }

    #[test]
    fn ut_expand_list_flattens_concat() {
        let refs = expand_list("{a b[2..0] c}").unwrap();
        assert_eq!(
            flatten(&refs),
            vec!["a", "b2", "b1", "b0", "c"]
        );
    }

    #[test]
    fn ut_expand_list_plain() {
        let refs = expand_list("en q[1..0]").unwrap();
        assert_eq!(flatten(&refs), vec!["en", "q1", "q0"]);
    }

    #[test]
    fn ut_expand_list_mismatched() {
        assert_eq!(
            expand_list("{a b").unwrap_err(),
            ExpandError::MismatchedBraces
        );
        assert_eq!(expand_list("a } b").unwrap_err(), ExpandError::MismatchedBraces);
    }

    #[test]
    fn ut_expand_list_empty_concat() {
        assert_eq!(expand_list("{ }").unwrap_err(), ExpandError::EmptyConcat);
    }

    #[test]
    fn ut_display_round_trip() {
        let net = NetRef::from_str("X[3..0]").unwrap();
        assert_eq!(net.to_string(), "X[3..0]");
        let net = NetRef::from_str("X[6.2.0]").unwrap();
        assert_eq!(net.to_string(), "X[6.2.0]");
    }
}
