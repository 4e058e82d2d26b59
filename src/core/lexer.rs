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

//! Character-level scanning shared by the statement splitter and the
//! expression tokenizer: a source location, a location-stamped token, and a
//! position-tracking character stream.

use std::fmt::Display;
use std::iter::Peekable;

/// Turns raw source text into located tokens, collecting per-token errors
/// instead of aborting the scan.
pub trait Tokenize {
    type TokenType;
    type Err;

    fn tokenize(s: &str) -> Vec<Result<Token<Self::TokenType>, TokenError<Self::Err>>>
    where
        <Self as Tokenize>::Err: Display;
}

/// A line and column in the source text. Lines count from 1; the column is
/// 0 until the first character of a line is consumed.
#[derive(Debug, PartialEq, Clone)]
pub struct Position {
    line: usize,
    col: usize,
}

impl Position {
    pub fn new() -> Self {
        Self { line: 1, col: 0 }
    }

    /// Builds the location `line`:`col` directly.
    pub fn place(line: usize, col: usize) -> Self {
        Self {
            line: line,
            col: col,
        }
    }

    /// Advances past the consumed character `c`, wrapping to the next line
    /// when `c` is a newline.
    pub fn step(&mut self, c: &char) {
        self.col += 1;
        if c == &'\n' {
            self.line += 1;
            self.col = 0;
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}:{}", self.line, self.col)
    }
}

/// A token stamped with the location where its first character was
/// consumed.
#[derive(Debug, PartialEq, Clone)]
pub struct Token<T> {
    position: Position,
    ttype: T,
}

impl<T> Token<T> {
    pub fn new(ttype: T, loc: Position) -> Self {
        Self {
            position: loc,
            ttype: ttype,
        }
    }

    /// Discards the location and keeps the inner type.
    pub fn take(self) -> T {
        self.ttype
    }

    /// Splits the token into its location and inner type.
    pub fn decouple(self) -> (Position, T) {
        (self.position, self.ttype)
    }

    /// Where the token was captured in the source.
    pub fn locate(&self) -> &Position {
        &self.position
    }

    pub fn as_ref(&self) -> &T {
        &self.ttype
    }
}

/// A scanning failure stamped with the location where it was caught.
#[derive(Debug, PartialEq)]
pub struct TokenError<T: Display> {
    position: Position,
    err: T,
}

impl<T: Display> TokenError<T> {
    pub fn new(err: T, loc: Position) -> Self {
        Self {
            position: loc,
            err: err,
        }
    }

    /// Discards the location and keeps the inner error.
    pub fn take(self) -> T {
        self.err
    }
}

impl<T: Display> Display for TokenError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.position, self.err)
    }
}

/// A peekable character stream that carries its own source location, so
/// every consumer reports errors against the same line/column accounting.
pub struct TrainCar<T>
where
    T: Iterator<Item = char>,
{
    contents: Peekable<T>,
    loc: Position,
}

impl<T> TrainCar<T>
where
    T: Iterator<Item = char>,
{
    pub fn new(s: T) -> Self {
        Self {
            loc: Position::new(),
            contents: s.peekable(),
        }
    }

    /// Takes the next character, stepping the location over it.
    pub fn consume(&mut self) -> Option<char> {
        if let Some(c) = self.contents.next() {
            self.loc.step(&c);
            Some(c)
        } else {
            None
        }
    }

    /// Looks at the next character without taking it.
    pub fn peek(&mut self) -> Option<&char> {
        self.contents.peek()
    }

    /// The location of the most recently consumed character.
    pub fn locate(&self) -> &Position {
        &self.loc
    }

    /// Consumes characters into a `String` for as long as `eval` accepts
    /// the peeked character, seeded with an optional already-consumed char
    /// `c0`.
    pub fn gather(&mut self, c0: Option<char>, eval: fn(&char) -> bool) -> String {
        let mut word = if let Some(c) = c0 {
            String::from(c)
        } else {
            String::new()
        };
        while let Some(c) = self.peek() {
            if eval(&c) == true {
                word.push(self.consume().unwrap());
            } else {
                break;
            }
        }
        word
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ut_position_steps_through_lines() {
        let mut pos = Position::new();
        assert_eq!(pos, Position::place(1, 0));
        pos.step(&'a');
        assert_eq!(pos, Position::place(1, 1));
        pos.step(&'b');
        assert_eq!(pos, Position::place(1, 2));
        pos.step(&'\n');
        assert_eq!(pos, Position::place(2, 0));
        pos.step(&'c');
        assert_eq!(pos, Position::place(2, 1));
    }

    #[test]
    fn ut_traincar_tracks_location() {
        let mut tc = TrainCar::new("x\ny".chars());
        tc.consume();
        assert_eq!(tc.locate(), &Position::place(1, 1));
        tc.consume();
        assert_eq!(tc.locate(), &Position::place(2, 0));
        tc.consume();
        assert_eq!(tc.locate(), &Position::place(2, 1));
        assert_eq!(tc.consume(), None);
    }

    #[test]
    fn ut_gather_word() {
        let mut tc = TrainCar::new("abc1 23".chars());
        let c0 = tc.consume().unwrap();
        let word = tc.gather(Some(c0), |c| c.is_ascii_alphanumeric());
        assert_eq!(word, "abc1");
        assert_eq!(tc.peek(), Some(&' '));
        assert_eq!(tc.locate(), &Position::place(1, 4));
    }
}
