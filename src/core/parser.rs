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

use super::database::Database;
use super::database::Header;
use super::database::NEXT_STATE_SUFFIX;
use super::error::ParseError;
use super::expand;
use super::expand::NetRef;
use super::expand::VectorRef;
use super::expr::eval;
use super::expr::tokenizer::ExprTokenizer;
use super::expr::tree::Expr;
use super::format::FormatRadix;
use super::lexer::Position;
use super::lexer::Token;
use super::preprocess::char_set;
use super::preprocess::Preprocessor;
use super::preprocess::SourceStatement;
use super::statement::*;
use crate::error::Error;
use std::str::FromStr;

/// The directive name that extends the module search path.
const LIBRARY_DIRECTIVE: &str = "library";

/// Classifies the logical statements of one design, registering every
/// identifier with the database along the way.
#[derive(Debug, PartialEq)]
pub struct Parser {
    database: Database,
    statements: Vec<Statement>,
    libraries: Vec<String>,
}

impl Parser {
    /// Runs the preprocessor and parser over the raw source `s`, producing
    /// the statement list and populated database.
    ///
    /// The first error encountered aborts the parse; partial state is
    /// discarded with the `Parser` itself.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let pre = Preprocessor::read(s)?;
        let (directives, sources) = pre.decouple();
        let mut parser = Self {
            database: Database::new(),
            statements: Vec::new(),
            libraries: Vec::new(),
        };
        for dir in directives {
            parser.interpret_directive(dir)?;
        }
        // only the first non-comment statement may declare the header
        let mut saw_code = false;
        for src in sources {
            let loc = src.locate().clone();
            parser
                .interpret_statement(src, &mut saw_code)
                .map_err(|e| e.at(loc))?;
        }
        parser.database.check_header().map_err(Error::from)?;
        Ok(parser)
    }

    pub fn as_database(&self) -> &Database {
        &self.database
    }

    pub fn as_statements(&self) -> &Vec<Statement> {
        &self.statements
    }

    pub fn as_libraries(&self) -> &Vec<String> {
        &self.libraries
    }

    pub fn decouple(self) -> (Database, Vec<Statement>, Vec<String>) {
        (self.database, self.statements, self.libraries)
    }

    /// Executes a preamble `#` directive.
    fn interpret_directive(&mut self, dir: Token<String>) -> Result<(), Error> {
        let (loc, text) = dir.decouple();
        let text = text.trim_end_matches(char_set::SEMICOLON).trim();
        let (name, arg) = match text.split_once(|c: char| c.is_whitespace()) {
            Some((name, arg)) => (name, arg.trim()),
            None => (text, ""),
        };
        let err = |e: ParseError| -> Result<(), Error> { Err(Error::from(e).at(loc.clone())) };
        match name {
            LIBRARY_DIRECTIVE => {
                if arg.is_empty() == true {
                    return err(ParseError::EmptyDirective(name.to_string()));
                }
                self.libraries.push(arg.to_string());
                Ok(())
            }
            _ => err(ParseError::UnknownDirective(name.to_string())),
        }
    }

    /// Classifies a single logical statement and applies its registration
    /// side effects. The checks run in fixed precedence: comment, format
    /// specifier, instantiation, alternate clock, clock, boolean assign,
    /// declaration.
    fn interpret_statement(
        &mut self,
        src: SourceStatement,
        saw_code: &mut bool,
    ) -> Result<(), Error> {
        let (loc, text) = src.take();
        let text = text.trim();
        if text.starts_with('"') == true {
            let comment = self.parse_comment(loc, text)?;
            self.statements.push(Statement::Comment(comment));
            return Ok(());
        }
        let first = *saw_code == false;
        *saw_code = true;
        if first == true && is_header_shape(text) == true {
            let header = self.parse_header(loc, text)?;
            self.statements.push(Statement::Header(header));
            return Ok(());
        }
        if text.starts_with('%') == true {
            let format = self.parse_format(loc, text)?;
            self.statements.push(Statement::Format(format));
            return Ok(());
        }
        if is_instantiation_shape(text) == true {
            let inst = self.parse_instantiation(loc, text)?;
            self.statements.push(Statement::Instantiation(inst));
            return Ok(());
        }
        if text.contains("<=") == true {
            let gate = alternate_clock_gate(text);
            let clock = self.parse_clock(loc, text, gate)?;
            self.statements.push(Statement::Clock(clock));
            return Ok(());
        }
        if text.contains('=') == true {
            let assign = self.parse_boolean(loc, text)?;
            self.statements.push(Statement::Boolean(assign));
            return Ok(());
        }
        if is_declaration_shape(text) == true {
            let decl = self.parse_declaration(loc, text)?;
            self.statements.push(Statement::Declaration(decl));
            return Ok(());
        }
        Err(Error::from(ParseError::StatementNotRecognized(loc)))
    }

    fn parse_comment(&self, loc: Position, text: &str) -> Result<CommentStatement, Error> {
        let body = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .ok_or(Error::from(ParseError::StatementNotRecognized(loc.clone())))?;
        let body = body.replace("\\\"", "\"").replace("\\\\", "\\");
        Ok(CommentStatement::new(loc, &body))
    }

    fn parse_header(&mut self, loc: Position, text: &str) -> Result<HeaderStatement, Error> {
        let (name, inner) = split_call(text)
            .ok_or(Error::from(ParseError::BadHeader(text.to_string())))?;
        let (ins, outs) = inner
            .split_once(':')
            .ok_or(Error::from(ParseError::BadHeader(text.to_string())))?;
        let input_refs = expand::expand_list(ins).map_err(Error::from)?;
        let output_refs = expand::expand_list(outs).map_err(Error::from)?;
        // declared inputs must exist as independent variables after parse
        for net in &input_refs {
            self.register_net(net, false);
        }
        let header = Header::new(
            name.to_string(),
            expand::flatten(&input_refs),
            expand::flatten(&output_refs),
        );
        self.database.set_header(header).map_err(Error::from)?;
        Ok(HeaderStatement {
            position: loc,
            name: name.to_string(),
            input_refs: input_refs,
            output_refs: output_refs,
        })
    }

    fn parse_format(&mut self, loc: Position, text: &str) -> Result<FormatStatement, Error> {
        // shape: %b{ … }
        let mut chars = text.chars();
        chars.next();
        let letter = chars
            .next()
            .ok_or(Error::from(ParseError::StatementNotRecognized(loc.clone())))?;
        let radix = FormatRadix::from_letter(&letter)
            .ok_or(Error::from(ParseError::UnknownFormatLetter(letter)))?;
        let rest = chars.as_str().trim();
        let inner = rest
            .strip_prefix(char_set::BRACE_L)
            .and_then(|t| t.strip_suffix(char_set::BRACE_R))
            .ok_or(Error::from(ParseError::StatementNotRecognized(loc.clone())))?;
        let operands = expand::expand_list(inner).map_err(Error::from)?;
        if operands.is_empty() == true {
            return Err(Error::from(ParseError::EmptyExpression));
        }
        for net in &operands {
            self.register_net(net, false);
        }
        Ok(FormatStatement {
            position: loc,
            radix: radix,
            operands: operands,
        })
    }

    fn parse_instantiation(
        &mut self,
        loc: Position,
        text: &str,
    ) -> Result<InstantiationStatement, Error> {
        let (inst, call) = text.split_once('=').unwrap();
        let inst = inst.trim();
        if expand::is_identifier(inst) == false {
            return Err(Error::from(ParseError::MissingInstanceName(loc)));
        }
        let (module, inner) = split_call(call.trim())
            .ok_or(Error::from(ParseError::StatementNotRecognized(loc.clone())))?;
        let (ins, outs) = inner
            .split_once(':')
            .ok_or(Error::from(ParseError::StatementNotRecognized(loc.clone())))?;
        let input_refs = expand::expand_list(ins).map_err(Error::from)?;
        let output_refs = expand::expand_list(outs).map_err(Error::from)?;
        for net in &input_refs {
            self.register_net(net, false);
        }
        // caller scalars receiving child outputs are driven by the child
        for net in &output_refs {
            self.register_net(net, false);
            for bit in net.expand() {
                self.database.declare_dependent(&bit);
            }
        }
        let inputs = expand::flatten(&input_refs);
        let outputs = expand::flatten(&output_refs);
        Ok(InstantiationStatement {
            position: loc,
            instance: inst.to_string(),
            module: module.to_string(),
            input_refs: input_refs,
            output_refs: output_refs,
            inputs: inputs,
            outputs: outputs,
        })
    }

    fn parse_clock(
        &mut self,
        loc: Position,
        text: &str,
        gate: Option<String>,
    ) -> Result<ClockStatement, Error> {
        let text = match &gate {
            Some(g) => {
                self.database.declare(g, false);
                text.split_once(':').unwrap().1
            }
            None => text,
        };
        let (lhs_text, rhs_text) = text.split_once("<=").unwrap();
        let expr = self.parse_assign(loc, lhs_text, rhs_text)?;
        // the driven scalars stay tick-advanced; their dependent next-state
        // shadows carry the captured value
        for name in expr.lhs() {
            let shadow = format!("{}{}", name, NEXT_STATE_SUFFIX);
            self.database.declare_dependent(&shadow);
        }
        Ok(ClockStatement::new(expr, gate))
    }

    fn parse_boolean(&mut self, loc: Position, text: &str) -> Result<ExpressionStatement, Error> {
        let (lhs_text, rhs_text) = text.split_once('=').unwrap();
        let expr = self.parse_assign(loc, lhs_text, rhs_text)?;
        for name in expr.lhs() {
            self.database.declare_dependent(name);
        }
        Ok(expr)
    }

    /// The common half of `=` and `<=` statements: expands the left-hand
    /// list, parses the right-hand operator tree, and registers every
    /// referenced identifier.
    fn parse_assign(
        &mut self,
        loc: Position,
        lhs_text: &str,
        rhs_text: &str,
    ) -> Result<ExpressionStatement, Error> {
        let lhs_refs = expand::expand_list(lhs_text).map_err(Error::from)?;
        if lhs_refs.is_empty() == true {
            return Err(Error::from(ParseError::StatementNotRecognized(loc)));
        }
        let tokens: Vec<_> = ExprTokenizer::from_source_code(rhs_text)
            .map_err(Error::from)?
            .into_iter()
            .map(|t| t.take())
            .collect();
        let tree = Expr::build(&tokens).map_err(Error::from)?;
        for net in tree.nets() {
            self.register_net(net, false);
        }
        let lhs = self.expand_lhs(&lhs_refs, &tree);
        Ok(ExpressionStatement::new(
            loc,
            lhs,
            lhs_text.trim().to_string(),
            rhs_text.trim().to_string(),
            tree,
        ))
    }

    /// Expands the left-hand references to scalars. A lone bare name with
    /// no prior declaration grows into a vector namespace matching the
    /// right-hand expression's width, so `y = x[3..0];` creates `y3…y0`.
    fn expand_lhs(&mut self, lhs_refs: &[NetRef], tree: &Expr) -> Vec<String> {
        if let [NetRef::Scalar(name)] = lhs_refs {
            let fresh = self.database.contains(name) == false
                && self.database.namespace(name).is_none() == true;
            if fresh == true {
                let width = eval::static_width(tree, &self.database);
                if width > 1 {
                    let vec = VectorRef::new(name, width - 1, 0);
                    self.database.update_namespace(&vec);
                    return vec.components();
                }
            }
        }
        for net in lhs_refs {
            self.register_net(net, false);
        }
        expand::flatten(lhs_refs)
    }

    fn parse_declaration(
        &mut self,
        loc: Position,
        text: &str,
    ) -> Result<DeclarationStatement, Error> {
        let mut nets = Vec::new();
        for word in text.split_whitespace() {
            let (word, starred) = match word.strip_prefix(char_set::STAR) {
                Some(rest) => (rest, true),
                None => (word, false),
            };
            let net = NetRef::from_str(word).map_err(Error::from)?;
            self.register_net(&net, starred);
            nets.push(DeclaredNet {
                net: net,
                starred: starred,
            });
        }
        Ok(DeclarationStatement {
            position: loc,
            nets: nets,
        })
    }

    /// Registers a net reference with the database: scalars are declared as
    /// independent variables, vectors widen their namespace. A scalar name
    /// already known as a namespace prefix registers nothing new.
    fn register_net(&mut self, net: &NetRef, starred: bool) {
        match net {
            NetRef::Scalar(name) => {
                if self.database.namespace(name).is_none() == true {
                    self.database.declare(name, starred);
                }
            }
            NetRef::Vector(vec) => {
                // seed every referenced bit first so a starred declaration
                // takes its initial value before the namespace backfill
                for bit in vec.components() {
                    self.database.declare(&bit, starred);
                }
                self.database.update_namespace(vec);
            }
        }
    }
}

/// Checks if `text` fits `ident ( … : … )` with the closing paren at the
/// very end.
fn is_header_shape(text: &str) -> bool {
    match split_call(text) {
        Some((_, inner)) => inner.contains(':'),
        None => false,
    }
}

/// Checks if `text` fits `ident = ident ( … : … )`.
fn is_instantiation_shape(text: &str) -> bool {
    // a `<=` is a clock statement, never an instantiation
    match text.split_once('=') {
        Some((lhs, rhs)) => {
            lhs.ends_with('<') == false
                && rhs.starts_with('=') == false
                && is_header_shape(rhs.trim()) == true
        }
        None => false,
    }
}

/// Checks if `text` contains only identifier and star tokens.
fn is_declaration_shape(text: &str) -> bool {
    text.split_whitespace().count() > 0
        && text
            .split_whitespace()
            .all(|w| w.chars().all(|c| {
                char_set::is_identifier_character(&c)
                    || c == char_set::STAR
                    || c == char_set::BRACK_L
                    || c == char_set::BRACK_R
                    || c == '.'
            }))
}

/// Splits `name(inner)` into its name and the text between the outer
/// parens. The name must be a legal identifier and the closing paren must
/// end the text.
fn split_call(text: &str) -> Option<(&str, &str)> {
    let open = text.find(char_set::PAREN_L)?;
    let name = text[..open].trim();
    if expand::is_identifier(name) == false {
        return None;
    }
    let inner = text[open + 1..].trim().strip_suffix(char_set::PAREN_R)?;
    Some((name, inner))
}

/// Detects an alternate-clock gate: a lone identifier before a `:` that
/// sits outside any vector selection, ahead of the `<=`.
fn alternate_clock_gate(text: &str) -> Option<String> {
    let stop = text.find("<=")?;
    let mut depth = 0;
    for (i, c) in text[..stop].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ':' => {
                if depth == 0 {
                    let gate = text[..i].trim();
                    if expand::is_identifier(gate) == true {
                        return Some(gate.to_string());
                    }
                    return None;
                }
            }
            _ => (),
        }
    }
    None
}
