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

use super::expand::NetRef;
use super::expr::eval::Value;
use super::expr::tree::Expr;
use super::format::FormatRadix;
use super::lexer::Position;

/// A classified logical statement of a design.
#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Comment(CommentStatement),
    Declaration(DeclarationStatement),
    Boolean(ExpressionStatement),
    Clock(ClockStatement),
    Format(FormatStatement),
    Instantiation(InstantiationStatement),
    Header(HeaderStatement),
}

impl Statement {
    pub fn locate(&self) -> &Position {
        match self {
            Self::Comment(s) => &s.position,
            Self::Declaration(s) => &s.position,
            Self::Boolean(s) => &s.position,
            Self::Clock(s) => &s.expr.position,
            Self::Format(s) => &s.position,
            Self::Instantiation(s) => &s.position,
            Self::Header(s) => &s.position,
        }
    }

    pub fn as_boolean(&self) -> Option<&ExpressionStatement> {
        match self {
            Self::Boolean(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boolean_mut(&mut self) -> Option<&mut ExpressionStatement> {
        match self {
            Self::Boolean(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_clock(&self) -> Option<&ClockStatement> {
        match self {
            Self::Clock(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_clock_mut(&mut self) -> Option<&mut ClockStatement> {
        match self {
            Self::Clock(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_instantiation(&self) -> Option<&InstantiationStatement> {
        match self {
            Self::Instantiation(s) => Some(s),
            _ => None,
        }
    }
}

/// A display-only statement: quoted text that may carry inline
/// `<color>…</>` spans.
#[derive(Debug, PartialEq, Clone)]
pub struct CommentStatement {
    pub(crate) position: Position,
    pub(crate) segments: Vec<CommentSegment>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommentSegment {
    pub(crate) color: Option<String>,
    pub(crate) text: String,
}

impl CommentStatement {
    /// Splits the comment body `text` (without its surrounding quotes) into
    /// segments at its color tags. A malformed tag renders literally.
    pub fn new(position: Position, text: &str) -> Self {
        let mut segments: Vec<CommentSegment> = Vec::new();
        let mut colors: Vec<String> = Vec::new();
        let mut run = String::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '<' {
                run.push(c);
                continue;
            }
            // capture a candidate tag up to the next closing angle
            let mut tag = String::new();
            let mut closed = false;
            while let Some(d) = chars.next() {
                if d == '>' {
                    closed = true;
                    break;
                }
                tag.push(d);
            }
            let accept = closed == true && (tag == "/" || is_color(&tag) == true);
            if accept == false {
                run.push('<');
                run.push_str(&tag);
                if closed == true {
                    run.push('>');
                }
                continue;
            }
            // the tag is real: close out the running segment
            if run.is_empty() == false {
                segments.push(CommentSegment {
                    color: colors.last().cloned(),
                    text: std::mem::take(&mut run),
                });
            }
            if tag == "/" {
                colors.pop();
            } else {
                colors.push(tag);
            }
        }
        if run.is_empty() == false {
            segments.push(CommentSegment {
                color: colors.last().cloned(),
                text: run,
            });
        }
        Self {
            position: position,
            segments: segments,
        }
    }

    pub fn segments(&self) -> &Vec<CommentSegment> {
        &self.segments
    }
}

impl CommentSegment {
    pub fn color(&self) -> Option<&String> {
        self.color.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Checks if `tag` is a usable color: a named color, a `#rrggbb` code, or
/// the `true`/`false` pseudo-names.
fn is_color(tag: &str) -> bool {
    if let Some(hex) = tag.strip_prefix('#') {
        return hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    tag.is_empty() == false && tag.chars().all(|c| c.is_ascii_alphabetic())
}

/// Introduces variables with default value 0, or 1 when starred.
#[derive(Debug, PartialEq, Clone)]
pub struct DeclarationStatement {
    pub(crate) position: Position,
    pub(crate) nets: Vec<DeclaredNet>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DeclaredNet {
    pub(crate) net: NetRef,
    pub(crate) starred: bool,
}

impl DeclarationStatement {
    pub fn nets(&self) -> &Vec<DeclaredNet> {
        &self.nets
    }
}

impl DeclaredNet {
    pub fn net(&self) -> &NetRef {
        &self.net
    }

    pub fn is_starred(&self) -> bool {
        self.starred
    }
}

/// The shared payload of combinational and clocked assignments: the
/// expanded left-hand scalars, the parsed right-hand operator tree, and the
/// solver's stability cache.
#[derive(Debug, PartialEq, Clone)]
pub struct ExpressionStatement {
    pub(crate) position: Position,
    pub(crate) lhs: Vec<String>,
    pub(crate) lhs_text: String,
    pub(crate) rhs_text: String,
    pub(crate) tree: Expr,
    pub(crate) nonmonotone: bool,
    pub(crate) last: Option<Value>,
    pub(crate) undefined: bool,
}

impl ExpressionStatement {
    pub fn new(
        position: Position,
        lhs: Vec<String>,
        lhs_text: String,
        rhs_text: String,
        tree: Expr,
    ) -> Self {
        let nonmonotone = tree.is_nonmonotone();
        Self {
            position: position,
            lhs: lhs,
            lhs_text: lhs_text,
            rhs_text: rhs_text,
            tree: tree,
            nonmonotone: nonmonotone,
            last: None,
            undefined: false,
        }
    }

    pub fn lhs(&self) -> &Vec<String> {
        &self.lhs
    }

    pub fn lhs_text(&self) -> &str {
        &self.lhs_text
    }

    pub fn rhs_text(&self) -> &str {
        &self.rhs_text
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    /// Checks if the expression crosses `==`, `+`, or `-`.
    pub fn is_nonmonotone(&self) -> bool {
        self.nonmonotone
    }

    /// The value committed by the most recent evaluation, used by the
    /// solver to detect stability.
    pub fn cached(&self) -> Option<Value> {
        self.last
    }

    pub fn cache(&mut self, value: Value) {
        self.last = Some(value);
    }

    pub fn clear_cache(&mut self) {
        self.last = None;
    }

    /// Flags the statement as undefined for the current solve cycle after a
    /// runtime evaluation error.
    pub fn mark_undefined(&mut self, flag: bool) {
        self.undefined = flag;
    }

    pub fn is_undefined(&self) -> bool {
        self.undefined
    }
}

/// An edge-triggered assignment `y <= expr;`, optionally gated on an
/// alternate clock's rising edge.
#[derive(Debug, PartialEq, Clone)]
pub struct ClockStatement {
    pub(crate) expr: ExpressionStatement,
    pub(crate) gate: Option<String>,
    pub(crate) next: Option<Value>,
    pub(crate) gate_sample: bool,
}

impl ClockStatement {
    pub fn new(expr: ExpressionStatement, gate: Option<String>) -> Self {
        Self {
            expr: expr,
            gate: gate,
            next: None,
            gate_sample: false,
        }
    }

    pub fn expr(&self) -> &ExpressionStatement {
        &self.expr
    }

    pub fn expr_mut(&mut self) -> &mut ExpressionStatement {
        &mut self.expr
    }

    pub fn gate(&self) -> Option<&String> {
        self.gate.as_ref()
    }

    /// The captured next-state value waiting for the next tick.
    pub fn next(&self) -> Option<Value> {
        self.next
    }

    pub fn set_next(&mut self, value: Option<Value>) {
        self.next = value;
    }

    /// The gating clock's value sampled at the previous tick.
    pub fn gate_sample(&self) -> bool {
        self.gate_sample
    }

    pub fn set_gate_sample(&mut self, value: bool) {
        self.gate_sample = value;
    }
}

/// A render-only statement producing a value string in a chosen radix.
#[derive(Debug, PartialEq, Clone)]
pub struct FormatStatement {
    pub(crate) position: Position,
    pub(crate) radix: FormatRadix,
    pub(crate) operands: Vec<NetRef>,
}

impl FormatStatement {
    pub fn radix(&self) -> &FormatRadix {
        &self.radix
    }

    pub fn operands(&self) -> &Vec<NetRef> {
        &self.operands
    }
}

/// A call binding a child design to this design's scalars by header
/// position.
#[derive(Debug, PartialEq, Clone)]
pub struct InstantiationStatement {
    pub(crate) position: Position,
    pub(crate) instance: String,
    pub(crate) module: String,
    pub(crate) input_refs: Vec<NetRef>,
    pub(crate) output_refs: Vec<NetRef>,
    pub(crate) inputs: Vec<String>,
    pub(crate) outputs: Vec<String>,
}

impl InstantiationStatement {
    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// The caller-side scalars feeding the child's inputs, in header order.
    pub fn inputs(&self) -> &Vec<String> {
        &self.inputs
    }

    /// The caller-side scalars receiving the child's outputs, in header
    /// order.
    pub fn outputs(&self) -> &Vec<String> {
        &self.outputs
    }
}

/// The design's declared interface, `Name(inputs : outputs);`.
#[derive(Debug, PartialEq, Clone)]
pub struct HeaderStatement {
    pub(crate) position: Position,
    pub(crate) name: String,
    pub(crate) input_refs: Vec<NetRef>,
    pub(crate) output_refs: Vec<NetRef>,
}

impl HeaderStatement {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_refs(&self) -> &Vec<NetRef> {
        &self.input_refs
    }

    pub fn output_refs(&self) -> &Vec<NetRef> {
        &self.output_refs
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ut_comment_plain() {
        let c = CommentStatement::new(Position::new(), "hello world");
        assert_eq!(c.segments().len(), 1);
        assert_eq!(c.segments()[0].text(), "hello world");
        assert_eq!(c.segments()[0].color(), None);
    }

    #[test]
    fn ut_comment_color_tags() {
        let c = CommentStatement::new(Position::new(), "ok <red>warn</> done");
        let segs = c.segments();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].text(), "ok ");
        assert_eq!(segs[0].color(), None);
        assert_eq!(segs[1].text(), "warn");
        assert_eq!(segs[1].color(), Some(&String::from("red")));
        assert_eq!(segs[2].text(), " done");
        assert_eq!(segs[2].color(), None);
    }

    #[test]
    fn ut_comment_hex_and_pseudo_colors() {
        let c = CommentStatement::new(Position::new(), "<#00ff00>go</> <true>on</>");
        let segs = c.segments();
        assert_eq!(segs[0].color(), Some(&String::from("#00ff00")));
        assert_eq!(segs[2].color(), Some(&String::from("true")));
    }

    #[test]
    fn ut_comment_malformed_tag_is_literal() {
        let c = CommentStatement::new(Position::new(), "a < b and <2bad> c");
        assert_eq!(c.segments().len(), 1);
        assert_eq!(c.segments()[0].text(), "a < b and <2bad> c");
    }
}
