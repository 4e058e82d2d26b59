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

use super::super::error::ParseError;
use super::super::expand::NetRef;
use std::fmt::Display;

#[derive(Debug, PartialEq, Clone)]
pub enum ExprToken {
    Identifier(NetRef),
    Constant(Constant),
    Operator(Operator),
}

impl ExprToken {
    /// Checks if the token can begin an operand, which makes plain adjacency
    /// act as a logical AND.
    pub fn starts_operand(&self) -> bool {
        match self {
            Self::Identifier(_) | Self::Constant(_) => true,
            Self::Operator(op) => match op {
                Operator::Not | Operator::ParenL | Operator::BraceL => true,
                _ => false,
            },
        }
    }

    pub fn as_operator(&self) -> Option<&Operator> {
        match self {
            Self::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Checks if the token is a particular operator `op`.
    pub fn check_operator(&self, op: &Operator) -> bool {
        match self {
            Self::Operator(o) => o == op,
            _ => false,
        }
    }
}

impl Display for ExprToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(net) => write!(f, "{}", net),
            Self::Constant(c) => write!(f, "{}", c),
            Self::Operator(op) => write!(f, "{}", op),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operator {
    Not,
    And,
    Or,
    Xor,
    Eq,
    Add,
    Sub,
    ParenL,
    ParenR,
    BraceL,
    BraceR,
}

impl Operator {
    /// Attempts to match the given string of characters `s` to an operator.
    /// A `*` is accepted as a synonym for `&`.
    pub fn transform(s: &str) -> Option<Self> {
        Some(match s {
            "~" => Self::Not,
            "&" => Self::And,
            "*" => Self::And,
            "|" => Self::Or,
            "^" => Self::Xor,
            "==" => Self::Eq,
            "+" => Self::Add,
            "-" => Self::Sub,
            "(" => Self::ParenL,
            ")" => Self::ParenR,
            "{" => Self::BraceL,
            "}" => Self::BraceR,
            _ => return None,
        })
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Not => "~",
                Self::And => "&",
                Self::Or => "|",
                Self::Xor => "^",
                Self::Eq => "==",
                Self::Add => "+",
                Self::Sub => "-",
                Self::ParenL => "(",
                Self::ParenR => ")",
                Self::BraceL => "{",
                Self::BraceR => "}",
            }
        )
    }
}

/// A literal of form `'b…`, `'d…`, or `'h…`, or a bare run of decimal
/// digits.
///
/// The display width of a binary literal is the number of digits as
/// written; a hex literal spans four bits per digit; decimal forms take the
/// minimum number of binary digits required for the value.
#[derive(Debug, PartialEq, Clone)]
pub struct Constant {
    value: u64,
    width: usize,
    text: String,
}

impl Constant {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Interprets the literal text `s`, with or without the leading quote.
    pub fn transform(s: &str) -> Result<Self, ParseError> {
        let bad = || ParseError::InvalidConstant(s.to_string());
        let make = |value: u64, width: usize| Self {
            value: value,
            width: width,
            text: s.to_string(),
        };
        match s.strip_prefix('\'') {
            Some(body) => {
                let mut chars = body.chars();
                let base = chars.next().ok_or(bad())?;
                let digits: String = chars.collect();
                if digits.is_empty() == true {
                    return Err(bad());
                }
                match base {
                    'b' | 'B' => {
                        let value = u64::from_str_radix(&digits, 2).map_err(|_| bad())?;
                        Ok(make(value, digits.len()))
                    }
                    'h' | 'H' => {
                        let value = u64::from_str_radix(&digits, 16).map_err(|_| bad())?;
                        Ok(make(value, digits.len() * 4))
                    }
                    'd' | 'D' => {
                        let value = digits.parse::<u64>().map_err(|_| bad())?;
                        Ok(make(value, min_width(value)))
                    }
                    _ => Err(bad()),
                }
            }
            None => {
                // a bare digit run is read as a decimal constant
                let value = s.parse::<u64>().map_err(|_| bad())?;
                Ok(make(value, min_width(value)))
            }
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// The minimum number of binary digits required to write `value`.
fn min_width(value: u64) -> usize {
    match value {
        0 => 1,
        v => (64 - v.leading_zeros()) as usize,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ut_constant_binary() {
        let c = Constant::transform("'b0010").unwrap();
        assert_eq!(c.value(), 2);
        assert_eq!(c.width(), 4);
    }

    #[test]
    fn ut_constant_hex() {
        let c = Constant::transform("'hA").unwrap();
        assert_eq!(c.value(), 10);
        assert_eq!(c.width(), 4);
        let c = Constant::transform("'h1F").unwrap();
        assert_eq!(c.value(), 31);
        assert_eq!(c.width(), 8);
    }

    #[test]
    fn ut_constant_decimal() {
        let c = Constant::transform("'d10").unwrap();
        assert_eq!(c.value(), 10);
        assert_eq!(c.width(), 4);
        let c = Constant::transform("0").unwrap();
        assert_eq!(c.value(), 0);
        assert_eq!(c.width(), 1);
        let c = Constant::transform("1").unwrap();
        assert_eq!(c.value(), 1);
        assert_eq!(c.width(), 1);
    }

    #[test]
    fn ut_constant_invalid() {
        assert!(Constant::transform("'b").is_err());
        assert!(Constant::transform("'b2").is_err());
        assert!(Constant::transform("'x5").is_err());
        assert!(Constant::transform("'").is_err());
        assert!(Constant::transform("abc").is_err());
    }

    #[test]
    fn ut_operator_transform() {
        assert_eq!(Operator::transform("=="), Some(Operator::Eq));
        assert_eq!(Operator::transform("~"), Some(Operator::Not));
        assert_eq!(Operator::transform("="), None);
        assert_eq!(Operator::transform("<="), None);
    }
}
