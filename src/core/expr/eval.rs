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

use super::super::database::Database;
use super::super::error::EvalError;
use super::super::expand::NetRef;
use super::tree::BinOp;
use super::tree::Expr;

/// The widest value the evaluator can carry.
pub const MAX_WIDTH: usize = 64;

/// A fixed-width bit group produced by evaluation: a single bit for boolean
/// results, or a wider group for vectors and arithmetic.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Value {
    width: usize,
    bits: u64,
}

impl Value {
    /// Creates a value of `width` bits, truncating `bits` to fit.
    pub fn new(width: usize, bits: u64) -> Self {
        Self {
            width: width,
            bits: bits & mask(width),
        }
    }

    /// Creates a single-bit value.
    pub fn bit(b: bool) -> Self {
        Self {
            width: 1,
            bits: b as u64,
        }
    }

    /// Packs a slice of bits, most significant first.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut packed: u64 = 0;
        for b in bits {
            packed = (packed << 1) | (*b as u64);
        }
        Self {
            width: bits.len(),
            bits: packed,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Decodes the group as an unsigned integer.
    pub fn unsigned(&self) -> u64 {
        self.bits
    }

    /// Reduces the group to a single bit by OR.
    pub fn reduce(&self) -> bool {
        self.bits != 0
    }

    /// Unpacks into a list of bits, most significant first.
    pub fn to_bits(&self) -> Vec<bool> {
        (0..self.width)
            .rev()
            .map(|i| (self.bits >> i) & 1 == 1)
            .collect()
    }

    /// Reshapes to exactly `width` bits: wider values are truncated to
    /// their low bits, narrower values are zero-extended.
    pub fn resize(&self, width: usize) -> Self {
        Self::new(width, self.bits)
    }

    /// Fits the value to a left-hand side of `width` bits. A single-bit
    /// target is a scalar context, so a wider value reduces by OR; any
    /// other target takes the bits positionally.
    pub fn fit(&self, width: usize) -> Self {
        match width {
            1 => Self::bit(self.reduce()),
            _ => self.resize(width),
        }
    }
}

fn mask(width: usize) -> u64 {
    match width >= MAX_WIDTH {
        true => u64::MAX,
        false => (1u64 << width) - 1,
    }
}

/// Evaluates a parsed operator tree against the current variable values in
/// `db`, returning a single bit or a multi-bit group.
pub fn evaluate(expr: &Expr, db: &Database) -> Result<Value, EvalError> {
    match expr {
        Expr::Net(net) => read_net(net, db),
        Expr::Constant(c) => Ok(Value::new(c.width(), c.value())),
        Expr::Not(inner) => {
            let v = evaluate(inner, db)?;
            Ok(Value::new(v.width, !v.bits))
        }
        Expr::Concat(items) => {
            if items.is_empty() == true {
                return Err(EvalError::EmptyOperand(String::from("{}")));
            }
            let mut acc = Value::new(0, 0);
            for item in items {
                let v = evaluate(item, db)?;
                if acc.width + v.width > MAX_WIDTH {
                    return Err(EvalError::WidthOverflow(MAX_WIDTH));
                }
                acc = Value {
                    width: acc.width + v.width,
                    bits: (acc.bits << v.width) | v.bits,
                };
            }
            Ok(acc)
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = evaluate(lhs, db)?;
            let r = evaluate(rhs, db)?;
            match op {
                BinOp::And => Ok(Value::bit(l.reduce() && r.reduce())),
                BinOp::Or => Ok(Value::bit(l.reduce() || r.reduce())),
                BinOp::Xor => Ok(Value::bit(l.reduce() != r.reduce())),
                BinOp::Eq => {
                    check_widths(op, &l, &r)?;
                    Ok(Value::bit(l.bits == r.bits))
                }
                BinOp::Add => {
                    check_widths(op, &l, &r)?;
                    Ok(Value::new(l.width, l.bits.wrapping_add(r.bits)))
                }
                BinOp::Sub => {
                    check_widths(op, &l, &r)?;
                    Ok(Value::new(l.width, l.bits.wrapping_sub(r.bits)))
                }
            }
        }
    }
}

/// Reads a net reference out of the database. A scalar name that instead
/// matches a vector namespace reads the whole namespace, msb first.
fn read_net(net: &NetRef, db: &Database) -> Result<Value, EvalError> {
    let bits = match net {
        NetRef::Scalar(name) => {
            if let Some(var) = db.get(name) {
                return Ok(Value::bit(var.value()));
            }
            match db.namespace(name) {
                Some(ns) => ns.components(),
                None => return Err(EvalError::UnknownIdentifier(name.clone())),
            }
        }
        NetRef::Vector(vec) => vec.components(),
    };
    let mut packed = Vec::with_capacity(bits.len());
    for bit in bits {
        match db.get(&bit) {
            Some(var) => packed.push(var.value()),
            None => return Err(EvalError::UnknownIdentifier(bit)),
        }
    }
    Ok(Value::from_bits(&packed))
}

/// Predicts the width of `expr` without reading any values: vector and
/// constant operands carry their declared widths, boolean operators
/// collapse to one bit, and arithmetic keeps its operand width.
pub fn static_width(expr: &Expr, db: &Database) -> usize {
    match expr {
        Expr::Net(NetRef::Scalar(name)) => {
            if db.contains(name) == true {
                1
            } else {
                match db.namespace(name) {
                    Some(ns) => ns.width(),
                    None => 1,
                }
            }
        }
        Expr::Net(NetRef::Vector(vec)) => vec.components().len(),
        Expr::Constant(c) => c.width(),
        Expr::Not(inner) => static_width(inner, db),
        Expr::Concat(items) => items.iter().map(|e| static_width(e, db)).sum(),
        Expr::Binary(op, lhs, _) => match op {
            BinOp::And | BinOp::Or | BinOp::Xor | BinOp::Eq => 1,
            BinOp::Add | BinOp::Sub => static_width(lhs, db),
        },
    }
}

fn check_widths(op: &BinOp, l: &Value, r: &Value) -> Result<(), EvalError> {
    if l.width != r.width {
        return Err(EvalError::WidthMismatch(op.to_string(), l.width, r.width));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::super::tokenizer::ExprTokenizer;
    use super::*;
    use std::str::FromStr;

    fn build(s: &str) -> Expr {
        let tokens: Vec<_> = ExprTokenizer::from_source_code(s)
            .unwrap()
            .into_iter()
            .map(|t| t.take())
            .collect();
        Expr::build(&tokens).unwrap()
    }

    fn db(pairs: &[(&str, bool)]) -> Database {
        let mut db = Database::new();
        for (name, value) in pairs {
            db.declare(name, *value);
        }
        db
    }

    #[test]
    fn ut_and_or_xor() {
        let db = db(&[("a", true), ("b", false), ("c", true)]);
        assert_eq!(evaluate(&build("a & b"), &db).unwrap(), Value::bit(false));
        assert_eq!(evaluate(&build("a | b"), &db).unwrap(), Value::bit(true));
        assert_eq!(evaluate(&build("a ^ c"), &db).unwrap(), Value::bit(false));
        assert_eq!(evaluate(&build("a b c"), &db).unwrap(), Value::bit(false));
        assert_eq!(evaluate(&build("a ~b c"), &db).unwrap(), Value::bit(true));
    }

    #[test]
    fn ut_multibit_reduced_by_or_in_scalar_context() {
        let db = db(&[("x1", true), ("x0", false), ("y", false)]);
        assert_eq!(
            evaluate(&build("x[1..0] | y"), &db).unwrap(),
            Value::bit(true)
        );
    }

    #[test]
    fn ut_vector_equality() {
        let db = db(&[("x1", true), ("x0", false), ("y1", true), ("y0", false)]);
        assert_eq!(
            evaluate(&build("x[1..0] == y[1..0]"), &db).unwrap(),
            Value::bit(true)
        );
        assert_eq!(
            evaluate(&build("x[1..0] == 'b10"), &db).unwrap(),
            Value::bit(true)
        );
        assert_eq!(
            evaluate(&build("x[1..0] == 'b01"), &db).unwrap(),
            Value::bit(false)
        );
    }

    #[test]
    fn ut_width_mismatch() {
        let db = db(&[("x1", true), ("x0", false), ("y", false)]);
        assert_eq!(
            evaluate(&build("x[1..0] == y"), &db).unwrap_err(),
            EvalError::WidthMismatch(String::from("=="), 2, 1)
        );
        assert_eq!(
            evaluate(&build("x[1..0] + 'b111"), &db).unwrap_err(),
            EvalError::WidthMismatch(String::from("+"), 2, 3)
        );
    }

    #[test]
    fn ut_add_truncates() {
        // 11 + 01 = 100 -> truncated to width 2 = 00
        let db = db(&[("x1", true), ("x0", true), ("y1", false), ("y0", true)]);
        assert_eq!(
            evaluate(&build("x[1..0] + y[1..0]"), &db).unwrap(),
            Value::new(2, 0)
        );
    }

    #[test]
    fn ut_sub_wraps() {
        // 00 - 01 wraps within width 2 to 11
        let db = db(&[("x1", false), ("x0", false), ("y1", false), ("y0", true)]);
        assert_eq!(
            evaluate(&build("x[1..0] - y[1..0]"), &db).unwrap(),
            Value::new(2, 3)
        );
    }

    #[test]
    fn ut_not_on_vector_keeps_width() {
        let db = db(&[("x1", true), ("x0", false)]);
        assert_eq!(
            evaluate(&build("~x[1..0]"), &db).unwrap(),
            Value::new(2, 1)
        );
    }

    #[test]
    fn ut_concat_packs_msb_first() {
        let db = db(&[("a", true), ("b", false), ("c", true)]);
        assert_eq!(
            evaluate(&build("{a b c}"), &db).unwrap(),
            Value::new(3, 0b101)
        );
    }

    #[test]
    fn ut_namespace_reference_by_prefix() {
        let mut db = Database::new();
        db.update_namespace(
            crate::core::expand::NetRef::from_str("x[1..0]")
                .unwrap()
                .as_vector()
                .unwrap(),
        );
        db.set_value("x1", true).unwrap();
        assert_eq!(evaluate(&build("x"), &db).unwrap(), Value::new(2, 2));
    }

    #[test]
    fn ut_unknown_identifier() {
        let db = Database::new();
        assert_eq!(
            evaluate(&build("ghost"), &db).unwrap_err(),
            EvalError::UnknownIdentifier(String::from("ghost"))
        );
    }

    #[test]
    fn ut_value_round_trip() {
        let v = Value::from_bits(&[true, false, true, false]);
        assert_eq!(v.unsigned(), 10);
        assert_eq!(v.to_bits(), vec![true, false, true, false]);
        assert_eq!(v.resize(2), Value::new(2, 2));
        assert_eq!(v.resize(6), Value::new(6, 10));
    }
}
