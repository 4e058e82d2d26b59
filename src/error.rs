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

use colored::Colorize;
use std::fmt::Display;
use std::path::PathBuf;

use crate::core::error::EvalError;
use crate::core::error::ExpandError;
use crate::core::error::InstantiationError;
use crate::core::error::LexError;
use crate::core::error::NameError;
use crate::core::error::ParseError;
use crate::core::error::RuntimeError;
use crate::core::lexer::Position;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Custom(String),
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Instantiation(#[from] InstantiationError),
    #[error("failed to read file {0:?}: {1}")]
    SourceRead(PathBuf, LastError),
    #[error("failed to load design \"{0}\": {1}")]
    InFile(String, Box<Error>),
    #[error("{0} {1}")]
    At(Position, Box<Error>),
    #[error("module {0:?} could not be found in the search path{1}")]
    ModuleNotFoundAnywhere(String, Hint),
}

impl Error {
    /// Pins a bare error to the source position `loc`.
    pub fn at(self, loc: Position) -> Self {
        match self {
            Self::At(_, _) => self,
            _ => Self::At(loc, Box::new(self)),
        }
    }
}

/// Caches the error-of-interest for error chains formed at higher levels of
/// abstraction.
#[derive(Debug, PartialEq)]
pub struct LastError(pub String);

impl Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string())
    }
}

#[derive(Debug, PartialEq)]
pub enum Hint {
    LibraryDirective,
}

impl Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::LibraryDirective => {
                "use a #library directive to add directories to the module search path"
            }
        };
        write!(f, "\n\n{}: {}", "hint".green(), message)
    }
}
