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

use super::error::LexError;
use super::lexer::Position;
use super::lexer::Token;
use super::lexer::TrainCar;

pub mod char_set {
    pub const DOUBLE_QUOTE: char = '\"';
    pub const SEMICOLON: char = ';';
    pub const POUND: char = '#';
    pub const TAB: char = '\t';
    pub const ESC: char = '\\';
    pub const PAREN_L: char = '(';
    pub const PAREN_R: char = ')';
    pub const BRACE_L: char = '{';
    pub const BRACE_R: char = '}';
    pub const BRACK_L: char = '[';
    pub const BRACK_R: char = ']';
    pub const STAR: char = '*';
    pub const UNDER_SCORE: char = '_';

    /// Checks if `c` is a digit.
    pub fn is_digit(c: &char) -> bool {
        match c {
            '0'..='9' => true,
            _ => false,
        }
    }

    /// Checks if `c` is a letter.
    pub fn is_letter(c: &char) -> bool {
        match c {
            'a'..='z' | 'A'..='Z' => true,
            _ => false,
        }
    }

    /// The set of characters \[a-z]\[A-Z]\[0-9]\[_] are allowed in identifiers
    /// after the initial letter is captured.
    pub fn is_identifier_character(c: &char) -> bool {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => true,
            _ => false,
        }
    }

    pub fn is_whitespace(c: &char) -> bool {
        c == &'\u{0020}' || c == &'\u{0009}' || c == &'\u{000D}' || c == &'\u{000A}'
    }

    pub fn is_newline(c: &char) -> bool {
        c == &'\n'
    }
}

/// A logical statement captured from the source text: the raw text between
/// the previous terminator and the next `;` found at zero grouping depth and
/// outside of any comment quotes. The position marks the first non-blank
/// character.
#[derive(Debug, PartialEq, Clone)]
pub struct SourceStatement {
    position: Position,
    text: String,
}

impl SourceStatement {
    pub fn new(text: &str, loc: Position) -> Self {
        Self {
            position: loc,
            text: text.to_string(),
        }
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }

    pub fn locate(&self) -> &Position {
        &self.position
    }

    pub fn take(self) -> (Position, String) {
        (self.position, self.text)
    }
}

/// First pass over the raw source text: normalizes tabs, captures `#`
/// preamble directives, and splits the remainder into logical statements.
#[derive(Debug, PartialEq)]
pub struct Preprocessor {
    directives: Vec<Token<String>>,
    statements: Vec<SourceStatement>,
}

impl Preprocessor {
    /// Consumes the raw source `s` into directives and logical statements.
    ///
    /// Statements may span physical lines and terminate at the first `;`
    /// found at zero grouping depth while not inside a comment. Blank
    /// statements are discarded.
    pub fn read(s: &str) -> Result<Self, LexError> {
        let mut train = TrainCar::new(s.chars());
        let mut directives: Vec<Token<String>> = Vec::new();
        let mut statements: Vec<SourceStatement> = Vec::new();

        // state for the statement currently being accumulated
        let mut text = String::new();
        let mut start: Option<Position> = None;
        // stack of open grouping delimiters and where they were opened
        let mut groups: Vec<(char, Position)> = Vec::new();
        // position of the opening quote when inside a comment
        let mut comment: Option<Position> = None;

        while let Some(c) = train.consume() {
            // comments are opaque up to the matching unescaped quote
            if comment.is_some() == true {
                text.push(c);
                if c == char_set::ESC {
                    if let Some(d) = train.consume() {
                        text.push(d);
                    }
                } else if c == char_set::DOUBLE_QUOTE {
                    comment = None;
                }
                continue;
            }
            // a pound sign before any statement text opens a directive line
            if c == char_set::POUND && start.is_none() == true && groups.is_empty() == true {
                let loc = train.locate().clone();
                let line = train.gather(None, |c| char_set::is_newline(c) == false);
                directives.push(Token::new(line.trim().to_string(), loc));
                continue;
            }
            match c {
                char_set::DOUBLE_QUOTE => {
                    if start.is_none() == true {
                        start = Some(train.locate().clone());
                    }
                    comment = Some(train.locate().clone());
                    text.push(c);
                }
                char_set::SEMICOLON => {
                    if groups.is_empty() == false {
                        // terminators are inert inside a grouping
                        text.push(c);
                        continue;
                    }
                    if let Some(loc) = start.take() {
                        statements.push(SourceStatement::new(text.trim_end(), loc));
                    }
                    text.clear();
                }
                char_set::PAREN_L | char_set::BRACE_L | char_set::BRACK_L => {
                    if start.is_none() == true {
                        start = Some(train.locate().clone());
                    }
                    groups.push((c, train.locate().clone()));
                    text.push(c);
                }
                char_set::PAREN_R | char_set::BRACE_R | char_set::BRACK_R => {
                    match groups.pop() {
                        Some((open, loc)) => {
                            if mate(&open) != c {
                                return Err(LexError::UnclosedGroup(open, loc));
                            }
                        }
                        None => {
                            return Err(LexError::StrayClosingDelimiter(
                                c,
                                train.locate().clone(),
                            ))
                        }
                    }
                    text.push(c);
                }
                char_set::TAB => {
                    // tabs are normalized to four spaces on ingest
                    if start.is_some() == true {
                        text.push_str("    ");
                    }
                }
                _ => {
                    if char_set::is_whitespace(&c) == true {
                        // whitespace before the first visible character is dropped
                        if start.is_some() == true {
                            text.push(c);
                        }
                    } else {
                        if start.is_none() == true {
                            start = Some(train.locate().clone());
                        }
                        text.push(c);
                    }
                }
            }
        }
        // verify nothing is left dangling at the end of the file
        if let Some(loc) = comment {
            return Err(LexError::UnclosedComment(loc));
        }
        if let Some((open, loc)) = groups.pop() {
            return Err(LexError::UnclosedGroup(open, loc));
        }
        if let Some(loc) = start {
            if text.trim().is_empty() == false {
                return Err(LexError::MissingTerminator(loc));
            }
        }
        Ok(Self {
            directives: directives,
            statements: statements,
        })
    }

    pub fn as_statements(&self) -> &Vec<SourceStatement> {
        &self.statements
    }

    pub fn as_directives(&self) -> &Vec<Token<String>> {
        &self.directives
    }

    pub fn decouple(self) -> (Vec<Token<String>>, Vec<SourceStatement>) {
        (self.directives, self.statements)
    }
}

/// Returns the closing delimiter paired with the opening delimiter `c`.
fn mate(c: &char) -> char {
    match c {
        &char_set::PAREN_L => char_set::PAREN_R,
        &char_set::BRACE_L => char_set::BRACE_R,
        &char_set::BRACK_L => char_set::BRACK_R,
        _ => *c,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ut_split_simple() {
        let src = "a b c;\nd = a & b;\n";
        let pre = Preprocessor::read(src).unwrap();
        assert_eq!(pre.as_statements().len(), 2);
        assert_eq!(pre.as_statements()[0].as_text(), "a b c");
        assert_eq!(pre.as_statements()[1].as_text(), "d = a & b");
        assert_eq!(pre.as_statements()[0].locate(), &Position::place(1, 1));
        assert_eq!(pre.as_statements()[1].locate(), &Position::place(2, 1));
    }

    #[test]
    fn ut_statement_spans_lines() {
        let src = "d = a &\n    b;\n";
        let pre = Preprocessor::read(src).unwrap();
        assert_eq!(pre.as_statements().len(), 1);
        assert_eq!(pre.as_statements()[0].as_text(), "d = a &\n    b");
    }

    #[test]
    fn ut_semicolon_in_comment() {
        let src = "\"hello; world\";\n";
        let pre = Preprocessor::read(src).unwrap();
        assert_eq!(pre.as_statements().len(), 1);
        assert_eq!(pre.as_statements()[0].as_text(), "\"hello; world\"");
    }

    #[test]
    fn ut_semicolon_in_group() {
        // terminators inside a grouping do not split the statement
        let src = "x = M(a b : c;);";
        let pre = Preprocessor::read(src).unwrap();
        assert_eq!(pre.as_statements().len(), 1);
    }

    #[test]
    fn ut_blank_statements_discarded() {
        let src = ";;\n  ;\n a;\n";
        let pre = Preprocessor::read(src).unwrap();
        assert_eq!(pre.as_statements().len(), 1);
        assert_eq!(pre.as_statements()[0].as_text(), "a");
    }

    #[test]
    fn ut_directives() {
        let src = "#library libs;\n#library ../shared;\na;\n";
        let pre = Preprocessor::read(src).unwrap();
        assert_eq!(pre.as_directives().len(), 2);
        assert_eq!(pre.as_directives()[0].as_ref(), "library libs;");
        assert_eq!(pre.as_directives()[1].as_ref(), "library ../shared;");
        assert_eq!(pre.as_statements().len(), 1);
    }

    #[test]
    fn ut_tab_normalized() {
        let src = "a =\tb;";
        let pre = Preprocessor::read(src).unwrap();
        assert_eq!(pre.as_statements()[0].as_text(), "a =    b");
    }

    #[test]
    fn ut_unclosed_comment() {
        let src = "\"oops;\n";
        assert_eq!(
            Preprocessor::read(src).unwrap_err(),
            LexError::UnclosedComment(Position::place(1, 1))
        );
    }

    #[test]
    fn ut_unclosed_group() {
        let src = "x = (a & b;\n";
        assert_eq!(
            Preprocessor::read(src).unwrap_err(),
            LexError::UnclosedGroup('(', Position::place(1, 5))
        );
    }

    #[test]
    fn ut_mismatched_group() {
        let src = "x = (a & b};";
        assert_eq!(
            Preprocessor::read(src).unwrap_err(),
            LexError::UnclosedGroup('(', Position::place(1, 5))
        );
    }

    #[test]
    fn ut_missing_terminator() {
        let src = "a = b";
        assert_eq!(
            Preprocessor::read(src).unwrap_err(),
            LexError::MissingTerminator(Position::place(1, 1))
        );
    }

    #[test]
    fn ut_empty_source() {
        let pre = Preprocessor::read("").unwrap();
        assert_eq!(pre.as_statements().len(), 0);
        assert_eq!(pre.as_directives().len(), 0);
    }
}
