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
use super::design::Design;
use super::expand::NetRef;
use super::expr::token::ExprToken;
use super::expr::token::Operator;
use super::expr::tokenizer::ExprTokenizer;
use super::format;
use super::lexer::Tokenize;
use super::statement::ExpressionStatement;
use super::statement::Statement;
use serde_derive::Serialize;

/// One annotated fragment of the rendered design, consumed by the external
/// display layer.
///
/// The `value` drives truth coloring; `Grouping` tokens back-link their
/// matching parenthesis so the renderer can draw overbars across negated
/// sub-expressions; `Instantiation` tokens carry the dotted path handle for
/// open/close navigation.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct DisplayToken {
    text: String,
    value: Option<bool>,
    kind: TokenKind,
    undefined: bool,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Constant,
    Independent,
    Dependent,
    Instantiation { path: String },
    LineBreak,
    Comment { color: Option<String> },
    Operator,
    Grouping { mate: usize },
    Formatted,
    Text,
}

impl DisplayToken {
    fn new(text: String, value: Option<bool>, kind: TokenKind) -> Self {
        Self {
            text: text,
            value: value,
            kind: kind,
            undefined: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> Option<bool> {
        self.value
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn is_undefined(&self) -> bool {
        self.undefined
    }
}

/// Renders the design's statements into the annotated token stream.
pub fn build(design: &Design) -> Vec<DisplayToken> {
    let db = design.database();
    let mut tokens: Vec<DisplayToken> = Vec::new();
    // instantiation statements pair with their instances in order
    let mut inst_idx = 0;
    for stmt in design.statements() {
        match stmt {
            Statement::Comment(c) => {
                for seg in c.segments() {
                    tokens.push(DisplayToken::new(
                        seg.text().to_string(),
                        None,
                        TokenKind::Comment {
                            color: seg.color().cloned(),
                        },
                    ));
                }
            }
            Statement::Declaration(d) => {
                for declared in d.nets() {
                    push_net(&mut tokens, declared.net(), db);
                }
            }
            Statement::Boolean(e) => {
                push_assignment(&mut tokens, e, "=", db);
            }
            Statement::Clock(c) => {
                if let Some(gate) = c.gate() {
                    push_variable(&mut tokens, gate, db);
                    tokens.push(operator(":"));
                }
                push_assignment(&mut tokens, c.expr(), "<=", db);
            }
            Statement::Format(f) => {
                let mut bits = Vec::new();
                for net in f.operands() {
                    for name in net.expand() {
                        bits.push(db.value_of(&name).unwrap_or(false));
                    }
                }
                tokens.push(DisplayToken::new(
                    format::format_bits(f.radix(), &bits),
                    None,
                    TokenKind::Formatted,
                ));
            }
            Statement::Instantiation(i) => {
                let path = match design.instances().get(inst_idx) {
                    Some(inst) => inst.path().to_string(),
                    None => i.instance().to_string(),
                };
                inst_idx += 1;
                tokens.push(DisplayToken::new(
                    i.instance().to_string(),
                    None,
                    TokenKind::Instantiation { path: path },
                ));
                tokens.push(operator("="));
                tokens.push(DisplayToken::new(
                    i.module().to_string(),
                    None,
                    TokenKind::Text,
                ));
                push_paren(&mut tokens, "(");
                for net in &i.input_refs {
                    push_net(&mut tokens, net, db);
                }
                tokens.push(operator(":"));
                for net in &i.output_refs {
                    push_net(&mut tokens, net, db);
                }
                push_paren(&mut tokens, ")");
            }
            Statement::Header(h) => {
                tokens.push(DisplayToken::new(
                    h.name().to_string(),
                    None,
                    TokenKind::Text,
                ));
                push_paren(&mut tokens, "(");
                for net in h.input_refs() {
                    push_net(&mut tokens, net, db);
                }
                tokens.push(operator(":"));
                for net in h.output_refs() {
                    push_net(&mut tokens, net, db);
                }
                push_paren(&mut tokens, ")");
            }
        }
        tokens.push(DisplayToken::new(
            String::new(),
            None,
            TokenKind::LineBreak,
        ));
    }
    link_groupings(&mut tokens);
    tokens
}

/// Emits the tokens of one assignment statement: targets, the assignment
/// operator, and the re-tokenized right-hand expression.
fn push_assignment(
    tokens: &mut Vec<DisplayToken>,
    expr: &ExpressionStatement,
    op: &str,
    db: &Database,
) {
    let start = tokens.len();
    for name in expr.lhs() {
        push_variable(tokens, name, db);
    }
    tokens.push(operator(op));
    for tk in ExprTokenizer::tokenize(expr.rhs_text()) {
        let tk = match tk {
            Ok(t) => t.take(),
            Err(_) => continue,
        };
        match tk {
            ExprToken::Identifier(net) => push_net(tokens, &net, db),
            ExprToken::Constant(c) => tokens.push(DisplayToken::new(
                c.to_string(),
                None,
                TokenKind::Constant,
            )),
            ExprToken::Operator(op) => match op {
                Operator::ParenL | Operator::BraceL => push_paren(tokens, &op.to_string()),
                Operator::ParenR | Operator::BraceR => push_paren(tokens, &op.to_string()),
                _ => tokens.push(operator(&op.to_string())),
            },
        }
    }
    if expr.is_undefined() == true {
        for tk in tokens[start..].iter_mut() {
            tk.undefined = true;
            tk.value = None;
        }
    }
}

/// Emits one token per scalar bit referenced by `net`.
fn push_net(tokens: &mut Vec<DisplayToken>, net: &NetRef, db: &Database) {
    let names = match net {
        NetRef::Scalar(name) => match db.namespace(name) {
            // a bare prefix with no scalar of its own shows the whole vector
            Some(ns) => match db.get(name) {
                Some(_) => vec![name.clone()],
                None => ns.components(),
            },
            None => vec![name.clone()],
        },
        NetRef::Vector(_) => net.expand(),
    };
    for name in names {
        push_variable(tokens, &name, db);
    }
}

fn push_variable(tokens: &mut Vec<DisplayToken>, name: &str, db: &Database) {
    let (value, kind) = match db.get(name) {
        Some(var) => (
            Some(var.value()),
            match var.is_independent() {
                true => TokenKind::Independent,
                false => TokenKind::Dependent,
            },
        ),
        None => (None, TokenKind::Text),
    };
    tokens.push(DisplayToken::new(name.to_string(), value, kind));
}

fn operator(text: &str) -> DisplayToken {
    DisplayToken::new(text.to_string(), None, TokenKind::Operator)
}

fn push_paren(tokens: &mut Vec<DisplayToken>, text: &str) {
    let idx = tokens.len();
    tokens.push(DisplayToken::new(
        text.to_string(),
        None,
        TokenKind::Grouping { mate: idx },
    ));
}

/// Patches every grouping token's back-link to the index of its matching
/// mate. An unmatched token keeps itself as its mate.
fn link_groupings(tokens: &mut Vec<DisplayToken>) {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for idx in 0..tokens.len() {
        let open = match &tokens[idx].kind {
            TokenKind::Grouping { .. } => match tokens[idx].text.as_str() {
                "(" => Some(('(', true)),
                "{" => Some(('{', true)),
                ")" => Some(('(', false)),
                "}" => Some(('{', false)),
                _ => None,
            },
            _ => None,
        };
        let (c, is_open) = match open {
            Some(pair) => pair,
            None => continue,
        };
        if is_open == true {
            stack.push((c, idx));
        } else if let Some((open_char, open_idx)) = stack.pop() {
            if open_char == c {
                tokens[open_idx].kind = TokenKind::Grouping { mate: idx };
                tokens[idx].kind = TokenKind::Grouping { mate: open_idx };
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::filesystem::NullResolver;

    fn parse(src: &str) -> Design {
        Design::parse("top", src, &NullResolver).unwrap()
    }

    fn texts(tokens: &[DisplayToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text()).collect()
    }

    #[test]
    fn ut_assignment_tokens() {
        let design = parse("y = a & b;\na b;");
        let tokens = design.display();
        assert_eq!(
            texts(&tokens),
            vec!["y", "=", "a", "&", "b", "", "a", "b", ""]
        );
        assert_eq!(tokens[0].kind(), &TokenKind::Dependent);
        assert_eq!(tokens[2].kind(), &TokenKind::Independent);
        assert_eq!(tokens[2].value(), Some(false));
        assert_eq!(tokens[5].kind(), &TokenKind::LineBreak);
    }

    #[test]
    fn ut_grouping_back_links() {
        let design = parse("y = ~(a & b);\na b;");
        let tokens = design.display();
        // y = ~ ( a & b ) <break> …
        assert_eq!(tokens[3].text(), "(");
        assert_eq!(tokens[7].text(), ")");
        assert_eq!(tokens[3].kind(), &TokenKind::Grouping { mate: 7 });
        assert_eq!(tokens[7].kind(), &TokenKind::Grouping { mate: 3 });
    }

    #[test]
    fn ut_vector_reference_expands_to_bits() {
        let design = parse("x[1..0];\ny = x[1..0];");
        let tokens = design.display();
        assert_eq!(
            texts(&tokens),
            vec!["x1", "x0", "", "y1", "y0", "=", "x1", "x0", ""]
        );
    }

    #[test]
    fn ut_format_token_renders_value() {
        let mut design = parse("x[3..0];\n%u{x[3..0]};");
        design.click_variable("x3").unwrap();
        design.click_variable("x1").unwrap();
        let tokens = design.display();
        let formatted: Vec<&DisplayToken> = tokens
            .iter()
            .filter(|t| t.kind() == &TokenKind::Formatted)
            .collect();
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0].text(), "10");
    }

    #[test]
    fn ut_comment_tokens_carry_color() {
        let design = parse("\"plain <red>hot</>\";");
        let tokens = design.display();
        assert_eq!(tokens[0].kind(), &TokenKind::Comment { color: None });
        assert_eq!(
            tokens[1].kind(),
            &TokenKind::Comment {
                color: Some(String::from("red"))
            }
        );
    }

    #[test]
    fn ut_undefined_statement_is_marked() {
        let mut design = parse("y = x[1..0] == z;\nz;");
        design.solve().unwrap();
        let tokens = design.display();
        let marked: Vec<&DisplayToken> =
            tokens.iter().filter(|t| t.is_undefined() == true).collect();
        assert!(marked.len() > 0);
        assert!(marked.iter().all(|t| t.value().is_none()));
    }

    #[test]
    fn ut_header_round_trip() {
        let src = "M(a b[1..0] : s);\ns = a;";
        let design = parse(src);
        let tokens = design.display();
        // re-assembling the header tokens reproduces a parseable header
        let mut text = String::new();
        for tk in &tokens {
            match tk.kind() {
                TokenKind::LineBreak => break,
                _ => {
                    text.push_str(tk.text());
                    text.push(' ');
                }
            }
        }
        let rendered = format!("{};\ns = a;", text.trim().replace("( ", "(").replace(" )", ")"));
        let again = parse(&rendered);
        assert_eq!(
            design.database().header(),
            again.database().header()
        );
    }

    #[test]
    fn ut_tokens_serialize() {
        let design = parse("y = a;\na;");
        let json = serde_json::to_string(&design.display()).unwrap();
        assert!(json.contains("\"text\":\"y\""));
        assert!(json.contains("line-break"));
    }
}
