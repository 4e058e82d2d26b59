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

use super::lexer::Position;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LexError {
    #[error("missing closing sequence for comment (\")")]
    UnclosedComment(Position),
    #[error("missing closing delimiter {0}")]
    UnclosedGroup(char, Position),
    #[error("missing terminator ; for statement")]
    MissingTerminator(Position),
    #[error("stray closing delimiter {0}")]
    StrayClosingDelimiter(char, Position),
}

impl LexError {
    /// Access the position in the source where the error was caught.
    pub fn locate(&self) -> &Position {
        match self {
            Self::UnclosedComment(p) => p,
            Self::UnclosedGroup(_, p) => p,
            Self::MissingTerminator(p) => p,
            Self::StrayClosingDelimiter(_, p) => p,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ExpandError {
    #[error("vector {0} has reversed range: msb {1} is less than lsb {2}")]
    ReversedRange(String, usize, usize),
    #[error("vector {0} has step of zero")]
    ZeroStep(String),
    #[error("invalid vector notation {0}")]
    InvalidVector(String),
    #[error("missing closing brace in concatenation")]
    MismatchedBraces,
    #[error("empty concatenation")]
    EmptyConcat,
    #[error("invalid identifier {0}")]
    InvalidIdentifier(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("statement is not recognized as any known form")]
    StatementNotRecognized(Position),
    #[error("header is malformed: {0}")]
    BadHeader(String),
    #[error("unknown directive #{0}")]
    UnknownDirective(String),
    #[error("directive #{0} is missing an argument")]
    EmptyDirective(String),
    #[error("unknown format letter %{0}")]
    UnknownFormatLetter(char),
    #[error("instantiation is missing an instance name")]
    MissingInstanceName(Position),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error("empty expression")]
    EmptyExpression,
    #[error("operator {0} is missing an operand")]
    MissingOperand(String),
    #[error("missing closing parenthesis in expression")]
    UnclosedParen,
    #[error("unexpected token {0} in expression")]
    UnexpectedToken(String),
    #[error("invalid character {0} in expression")]
    InvalidChar(char),
    #[error("invalid constant {0}")]
    InvalidConstant(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum NameError {
    #[error("output {0} is declared more than once in the header")]
    DuplicateOutput(String),
    #[error("header input {0} is not an independent variable")]
    InputNotIndependent(String),
    #[error("header output {0} is never driven")]
    OutputNeverDriven(String),
    #[error("variable {0} does not exist")]
    UnknownVariable(String),
    #[error("variable {0} is not independent and cannot be set directly")]
    NotIndependent(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum EvalError {
    #[error("operands of {0} differ in width: {1} vs. {2}")]
    WidthMismatch(String, usize, usize),
    #[error("unknown identifier {0}")]
    UnknownIdentifier(String),
    #[error("operator {0} has an empty operand")]
    EmptyOperand(String),
    #[error("expression exceeds the supported width of {0} bits")]
    WidthOverflow(usize),
}

#[derive(Error, Debug, PartialEq)]
pub enum RuntimeError {
    #[error("fixed-point solver failed to settle within {0} iterations")]
    SolverDivergence(usize),
    #[error("instantiation pass failed to settle within {0} iterations")]
    InstantiationDivergence(usize),
}

#[derive(Error, Debug, PartialEq)]
pub enum InstantiationError {
    #[error("module {0} does not declare a header")]
    MissingHeader(String),
    #[error("instantiation of {0} binds {1} inputs but the module declares {2}")]
    InputArityMismatch(String, usize, usize),
    #[error("instantiation of {0} binds {1} outputs but the module declares {2}")]
    OutputArityMismatch(String, usize, usize),
    #[error("instantiation depth exceeds the limit of {0}")]
    RecursionLimit(usize),
}
