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
use super::super::lexer::Token;
use super::super::lexer::TokenError;
use super::super::lexer::Tokenize;
use super::super::lexer::TrainCar;
use super::super::preprocess::char_set;
use super::token::Constant;
use super::token::ExprToken;
use super::token::Operator;
use std::str::FromStr;

pub struct ExprTokenizer;

impl Tokenize for ExprTokenizer {
    type TokenType = ExprToken;
    type Err = ParseError;

    fn tokenize(s: &str) -> Vec<Result<Token<Self::TokenType>, TokenError<Self::Err>>> {
        let mut train = TrainCar::new(s.chars());
        let mut tokens: Vec<Result<Token<Self::TokenType>, TokenError<Self::Err>>> = Vec::new();
        while let Some(c) = train.consume() {
            // skip over whitespace
            if char_set::is_whitespace(&c) == true {
                continue;
            }
            let tk_loc = train.locate().clone();
            tokens.push(if char_set::is_letter(&c) == true {
                // collect an identifier with an optional vector selection
                match Self::consume_identifier(&mut train, c) {
                    Ok(tk) => Ok(Token::new(tk, tk_loc)),
                    Err(e) => Err(TokenError::new(e, tk_loc.clone())),
                }
            } else if c == '\'' || char_set::is_digit(&c) == true {
                // collect a constant literal
                match Self::consume_constant(&mut train, c) {
                    Ok(tk) => Ok(Token::new(tk, tk_loc)),
                    Err(e) => Err(TokenError::new(e, tk_loc.clone())),
                }
            } else if c == '=' && train.peek() == Some(&'=') {
                train.consume();
                Ok(Token::new(ExprToken::Operator(Operator::Eq), tk_loc))
            } else {
                // collect a single-character operator or delimiter
                match Operator::transform(&String::from(c)) {
                    Some(op) => Ok(Token::new(ExprToken::Operator(op), tk_loc)),
                    None => Err(TokenError::new(ParseError::InvalidChar(c), tk_loc.clone())),
                }
            });
        }
        tokens
    }
}

impl ExprTokenizer {
    /// Tokenizes `s` and lifts the first error, if any, out of the stream.
    pub fn from_source_code(s: &str) -> Result<Vec<Token<ExprToken>>, ParseError> {
        let mut tokens = Vec::new();
        for tk in Self::tokenize(s) {
            match tk {
                Ok(t) => tokens.push(t),
                Err(e) => return Err(e.take()),
            }
        }
        Ok(tokens)
    }

    /// Captures an identifier beginning with the consumed letter `c0`,
    /// swallowing a trailing `[…]` selection into the same token.
    fn consume_identifier(
        train: &mut TrainCar<impl Iterator<Item = char>>,
        c0: char,
    ) -> Result<ExprToken, ParseError> {
        let mut word = train.gather(Some(c0), char_set::is_identifier_character);
        if train.peek() == Some(&char_set::BRACK_L) {
            word.push(train.consume().unwrap());
            while let Some(c) = train.consume() {
                word.push(c);
                if c == char_set::BRACK_R {
                    break;
                }
            }
        }
        Ok(ExprToken::Identifier(NetRef::from_str(&word)?))
    }

    /// Captures a constant literal: quoted (`'b…`, `'d…`, `'h…`) when `c0`
    /// is the quote, otherwise a bare decimal digit run.
    fn consume_constant(
        train: &mut TrainCar<impl Iterator<Item = char>>,
        c0: char,
    ) -> Result<ExprToken, ParseError> {
        let word = if c0 == '\'' {
            let mut word = String::from(c0);
            if let Some(b) = train.consume() {
                word.push(b);
            }
            word + &train.gather(None, |c| c.is_ascii_alphanumeric())
        } else {
            train.gather(Some(c0), char_set::is_digit)
        };
        Ok(ExprToken::Constant(Constant::transform(&word)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(s: &str) -> Vec<ExprToken> {
        ExprTokenizer::from_source_code(s)
            .unwrap()
            .into_iter()
            .map(|t| t.take())
            .collect()
    }

    #[test]
    fn ut_tokenize_operators() {
        let tks = tokens("~a & b | c ^ d == e + f - g");
        assert_eq!(tks.len(), 14);
        assert_eq!(tks[0], ExprToken::Operator(Operator::Not));
        assert_eq!(tks[6], ExprToken::Operator(Operator::Xor));
        assert_eq!(tks[8], ExprToken::Operator(Operator::Eq));
    }

    #[test]
    fn ut_tokenize_vector() {
        let tks = tokens("x[3..0] & y");
        assert_eq!(tks.len(), 3);
        match &tks[0] {
            ExprToken::Identifier(net) => {
                assert_eq!(net.expand(), vec!["x3", "x2", "x1", "x0"])
            }
            _ => panic!("expected identifier"),
        }
    }

    #[test]
    fn ut_tokenize_constants() {
        let tks = tokens("'b1010 == x[3..0]");
        match &tks[0] {
            ExprToken::Constant(c) => {
                assert_eq!(c.value(), 10);
                assert_eq!(c.width(), 4);
            }
            _ => panic!("expected constant"),
        }
    }

    #[test]
    fn ut_tokenize_adjacency_tokens() {
        // adjacency carries no operator token; the tree builder inserts it
        let tks = tokens("a b");
        assert_eq!(tks.len(), 2);
    }

    #[test]
    fn ut_tokenize_invalid_char() {
        assert_eq!(
            ExprTokenizer::from_source_code("a % b").unwrap_err(),
            ParseError::InvalidChar('%')
        );
    }

    #[test]
    fn ut_tokenize_bad_vector() {
        assert!(ExprTokenizer::from_source_code("x[3..0").is_err());
    }
}
