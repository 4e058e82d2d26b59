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

use std::fmt::Display;

/// The rendering base for a format specifier statement.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum FormatRadix {
    Binary,
    Signed,
    Hex,
    Unsigned,
}

impl FormatRadix {
    /// Matches a format letter, in either case, to its radix.
    pub fn from_letter(c: &char) -> Option<Self> {
        match c {
            'b' | 'B' => Some(Self::Binary),
            'd' | 'D' => Some(Self::Signed),
            'h' | 'H' => Some(Self::Hex),
            'u' | 'U' => Some(Self::Unsigned),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Self::Binary => 'b',
            Self::Signed => 'd',
            Self::Hex => 'h',
            Self::Unsigned => 'u',
        }
    }
}

impl Display for FormatRadix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.letter())
    }
}

/// Renders the bit group `bits` (msb first) in the radix `radix`.
pub fn format_bits(radix: &FormatRadix, bits: &[bool]) -> String {
    match radix {
        FormatRadix::Binary => bits
            .iter()
            .map(|b| match b {
                true => '1',
                false => '0',
            })
            .collect(),
        FormatRadix::Hex => {
            // group into 4-bit nibbles from the lsb, padding the msb nibble
            let mut digits = Vec::new();
            let mut i = bits.len();
            while i > 0 {
                let lo = match i >= 4 {
                    true => i - 4,
                    false => 0,
                };
                let nibble = bits[lo..i]
                    .iter()
                    .fold(0u8, |acc, b| (acc << 1) | (*b as u8));
                digits.push(std::char::from_digit(nibble as u32, 16).unwrap());
                i = lo;
            }
            digits.iter().rev().collect::<String>().to_uppercase()
        }
        FormatRadix::Unsigned => unsigned(bits).to_string(),
        FormatRadix::Signed => {
            // sign-magnitude: a set msb negates the remaining bits
            match bits.first() {
                Some(true) => format!("-{}", unsigned(&bits[1..])),
                _ => unsigned(bits).to_string(),
            }
        }
    }
}

/// Renders `bits` by a raw format letter; an unrecognized letter renders
/// nothing.
pub fn format_letter(letter: &char, bits: &[bool]) -> String {
    match FormatRadix::from_letter(letter) {
        Some(radix) => format_bits(&radix, bits),
        None => String::new(),
    }
}

fn unsigned(bits: &[bool]) -> u64 {
    bits.iter().fold(0u64, |acc, b| (acc << 1) | (*b as u64))
}

#[cfg(test)]
mod test {
    use super::*;

    fn bits(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn ut_binary() {
        assert_eq!(format_bits(&FormatRadix::Binary, &bits("1010")), "1010");
        assert_eq!(format_bits(&FormatRadix::Binary, &bits("0")), "0");
    }

    #[test]
    fn ut_hex_nibbles_from_lsb() {
        assert_eq!(format_bits(&FormatRadix::Hex, &bits("1010")), "A");
        // 6 bits: the msb nibble is padded with zeros
        assert_eq!(format_bits(&FormatRadix::Hex, &bits("101111")), "2F");
        assert_eq!(format_bits(&FormatRadix::Hex, &bits("00010000")), "10");
    }

    #[test]
    fn ut_unsigned() {
        assert_eq!(format_bits(&FormatRadix::Unsigned, &bits("1010")), "10");
        assert_eq!(format_bits(&FormatRadix::Unsigned, &bits("0000")), "0");
    }

    #[test]
    fn ut_signed_is_sign_magnitude() {
        // msb set: negative of the unsigned low bits, not two's complement
        assert_eq!(format_bits(&FormatRadix::Signed, &bits("1010")), "-2");
        assert_eq!(format_bits(&FormatRadix::Signed, &bits("0110")), "6");
        assert_eq!(format_bits(&FormatRadix::Signed, &bits("1000")), "-0");
    }

    #[test]
    fn ut_unrecognized_letter_is_empty() {
        assert_eq!(format_letter(&'z', &bits("1010")), "");
        assert_eq!(format_letter(&'B', &bits("1010")), "1010");
    }
}
