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
use super::token::Constant;
use super::token::ExprToken;
use super::token::Operator;

/// A parsed operator tree over identifiers, constants, and the boolean and
/// arithmetic operators of the language.
#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Net(NetRef),
    Constant(Constant),
    Not(Box<Expr>),
    Concat(Vec<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinOp {
    And,
    Or,
    Xor,
    Eq,
    Add,
    Sub,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::And => "&",
                Self::Or => "|",
                Self::Xor => "^",
                Self::Eq => "==",
                Self::Add => "+",
                Self::Sub => "-",
            }
        )
    }
}

impl Expr {
    /// Builds the operator tree from the token stream.
    ///
    /// Precedence, highest to lowest: `~`, concatenation, `&` and
    /// adjacency, `|`, `^`, `==`, `+`/`-`. Binary operators associate left.
    pub fn build(tokens: &[ExprToken]) -> Result<Self, ParseError> {
        let mut cur = Cursor {
            tokens: tokens,
            idx: 0,
        };
        let expr = cur.parse_sum()?;
        match cur.peek() {
            Some(tk) => Err(ParseError::UnexpectedToken(tk.to_string())),
            None => Ok(expr),
        }
    }

    /// Checks if the tree crosses a non-monotone operator (`==`, `+`, `-`),
    /// which makes the expression eligible for pinning during a solve.
    pub fn is_nonmonotone(&self) -> bool {
        match self {
            Self::Net(_) | Self::Constant(_) => false,
            Self::Not(inner) => inner.is_nonmonotone(),
            Self::Concat(items) => items.iter().any(|e| e.is_nonmonotone()),
            Self::Binary(op, lhs, rhs) => match op {
                BinOp::Eq | BinOp::Add | BinOp::Sub => true,
                _ => lhs.is_nonmonotone() || rhs.is_nonmonotone(),
            },
        }
    }

    /// Collects every net reference in the tree, left to right.
    pub fn nets(&self) -> Vec<&NetRef> {
        let mut out = Vec::new();
        self.visit_nets(&mut out);
        out
    }

    fn visit_nets<'a>(&'a self, out: &mut Vec<&'a NetRef>) {
        match self {
            Self::Net(net) => out.push(net),
            Self::Constant(_) => (),
            Self::Not(inner) => inner.visit_nets(out),
            Self::Concat(items) => {
                for item in items {
                    item.visit_nets(out);
                }
            }
            Self::Binary(_, lhs, rhs) => {
                lhs.visit_nets(out);
                rhs.visit_nets(out);
            }
        }
    }
}

struct Cursor<'a> {
    tokens: &'a [ExprToken],
    idx: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a ExprToken> {
        self.tokens.get(self.idx)
    }

    fn next(&mut self) -> Option<&'a ExprToken> {
        let tk = self.tokens.get(self.idx);
        if tk.is_some() == true {
            self.idx += 1;
        }
        tk
    }

    /// Consumes the next token if it is the operator `op`.
    fn eat(&mut self, op: &Operator) -> bool {
        match self.peek() {
            Some(tk) => {
                if tk.check_operator(op) == true {
                    self.idx += 1;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_eq()?;
        loop {
            let op = if self.eat(&Operator::Add) == true {
                BinOp::Add
            } else if self.eat(&Operator::Sub) == true {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_eq()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_eq(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_xor()?;
        while self.eat(&Operator::Eq) == true {
            let rhs = self.parse_xor()?;
            lhs = Expr::Binary(BinOp::Eq, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_or()?;
        while self.eat(&Operator::Xor) == true {
            let rhs = self.parse_or()?;
            lhs = Expr::Binary(BinOp::Xor, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Operator::Or) == true {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            if self.eat(&Operator::And) == true {
                let rhs = self.parse_unary()?;
                lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
            } else {
                // two operands written side by side form an implicit AND
                let adjacent = match self.peek() {
                    Some(tk) => tk.starts_operand(),
                    None => false,
                };
                if adjacent == false {
                    break;
                }
                let rhs = self.parse_unary()?;
                lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Operator::Not) == true {
            match self.peek() {
                Some(_) => Ok(Expr::Not(Box::new(self.parse_unary()?))),
                None => Err(ParseError::MissingOperand(String::from("~"))),
            }
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(ExprToken::Identifier(net)) => Ok(Expr::Net(net.clone())),
            Some(ExprToken::Constant(c)) => Ok(Expr::Constant(c.clone())),
            Some(ExprToken::Operator(Operator::ParenL)) => {
                let inner = self.parse_sum()?;
                match self.eat(&Operator::ParenR) {
                    true => Ok(inner),
                    false => Err(ParseError::UnclosedParen),
                }
            }
            Some(ExprToken::Operator(Operator::BraceL)) => {
                let mut items = Vec::new();
                while self.eat(&Operator::BraceR) == false {
                    if self.peek().is_none() == true {
                        return Err(ParseError::UnclosedParen);
                    }
                    items.push(self.parse_unary()?);
                }
                if items.is_empty() == true {
                    return Err(ParseError::EmptyExpression);
                }
                Ok(Expr::Concat(items))
            }
            Some(tk) => Err(ParseError::UnexpectedToken(tk.to_string())),
            None => Err(ParseError::EmptyExpression),
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::tokenizer::ExprTokenizer;
    use super::*;

    fn build(s: &str) -> Expr {
        let tokens: Vec<ExprToken> = ExprTokenizer::from_source_code(s)
            .unwrap()
            .into_iter()
            .map(|t| t.take())
            .collect();
        Expr::build(&tokens).unwrap()
    }

    fn net(s: &str) -> Expr {
        Expr::Net(NetRef::Scalar(s.to_string()))
    }

    #[test]
    fn ut_and_binds_tighter_than_or() {
        assert_eq!(
            build("a & b | c"),
            Expr::Binary(
                BinOp::Or,
                Box::new(Expr::Binary(
                    BinOp::And,
                    Box::new(net("a")),
                    Box::new(net("b"))
                )),
                Box::new(net("c"))
            )
        );
    }

    #[test]
    fn ut_or_binds_tighter_than_xor() {
        assert_eq!(
            build("a | b ^ c"),
            Expr::Binary(
                BinOp::Xor,
                Box::new(Expr::Binary(
                    BinOp::Or,
                    Box::new(net("a")),
                    Box::new(net("b"))
                )),
                Box::new(net("c"))
            )
        );
    }

    #[test]
    fn ut_adjacency_is_and() {
        assert_eq!(build("a b"), build("a & b"));
        assert_eq!(build("a b | c"), build("(a & b) | c"));
        assert_eq!(build("a ~b"), build("a & ~b"));
    }

    #[test]
    fn ut_star_is_and() {
        assert_eq!(build("a * b"), build("a & b"));
    }

    #[test]
    fn ut_not_binds_tightest() {
        assert_eq!(
            build("~a & b"),
            Expr::Binary(
                BinOp::And,
                Box::new(Expr::Not(Box::new(net("a")))),
                Box::new(net("b"))
            )
        );
    }

    #[test]
    fn ut_sum_binds_loosest() {
        assert_eq!(
            build("a == b + c"),
            Expr::Binary(
                BinOp::Add,
                Box::new(Expr::Binary(
                    BinOp::Eq,
                    Box::new(net("a")),
                    Box::new(net("b"))
                )),
                Box::new(net("c"))
            )
        );
    }

    #[test]
    fn ut_left_associative() {
        assert_eq!(build("a & b & c"), build("(a & b) & c"));
    }

    #[test]
    fn ut_concat() {
        assert_eq!(
            build("{a b}"),
            Expr::Concat(vec![net("a"), net("b")])
        );
    }

    #[test]
    fn ut_nonmonotone() {
        assert_eq!(build("a & b").is_nonmonotone(), false);
        assert_eq!(build("a == b").is_nonmonotone(), true);
        assert_eq!(build("~(a + b)").is_nonmonotone(), true);
        assert_eq!(build("a - b").is_nonmonotone(), true);
    }

    #[test]
    fn ut_errors() {
        let toks = |s: &str| -> Vec<ExprToken> {
            ExprTokenizer::from_source_code(s)
                .unwrap()
                .into_iter()
                .map(|t| t.take())
                .collect()
        };
        assert_eq!(Expr::build(&toks("")).unwrap_err(), ParseError::EmptyExpression);
        assert_eq!(
            Expr::build(&toks("(a & b")).unwrap_err(),
            ParseError::UnclosedParen
        );
        assert_eq!(
            Expr::build(&toks("a &")).unwrap_err(),
            ParseError::EmptyExpression
        );
        assert_eq!(
            Expr::build(&toks("~")).unwrap_err(),
            ParseError::MissingOperand(String::from("~"))
        );
    }
}
