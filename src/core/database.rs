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

use super::error::NameError;
use super::expand::VectorRef;
use super::variable::Net;
use super::variable::Variable;
use indexmap::IndexMap;

/// The suffix attached to a clocked variable's next-state shadow.
pub const NEXT_STATE_SUFFIX: &str = ".d";

/// An ordered list of scalar bit names sharing a common prefix, stored as a
/// contiguous descending index range.
#[derive(Debug, PartialEq, Clone)]
pub struct Namespace {
    prefix: String,
    msb: usize,
    lsb: usize,
}

impl Namespace {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn msb(&self) -> usize {
        self.msb
    }

    pub fn lsb(&self) -> usize {
        self.lsb
    }

    pub fn width(&self) -> usize {
        self.msb - self.lsb + 1
    }

    /// Lists the component bit names, most significant first.
    pub fn components(&self) -> Vec<String> {
        (self.lsb..=self.msb)
            .rev()
            .map(|i| format!("{}{}", self.prefix, i))
            .collect()
    }
}

/// The declared input/output interface of a design, flattened to scalar bit
/// names.
#[derive(Debug, PartialEq, Clone)]
pub struct Header {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Header {
    pub fn new(name: String, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self {
            name: name,
            inputs: inputs,
            outputs: outputs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &Vec<String> {
        &self.inputs
    }

    pub fn outputs(&self) -> &Vec<String> {
        &self.outputs
    }
}

/// The symbol table for a single design: every scalar variable, the vector
/// namespaces, and the optional header.
#[derive(Debug, PartialEq)]
pub struct Database {
    variables: IndexMap<String, Variable>,
    namespaces: IndexMap<String, Namespace>,
    header: Option<Header>,
}

impl Database {
    /// Creates an empty `Database`.
    pub fn new() -> Self {
        Self {
            variables: IndexMap::new(),
            namespaces: IndexMap::new(),
            header: None,
        }
    }

    /// Registers `name` as an independent variable with initial value
    /// `init`, if it does not already exist.
    pub fn declare(&mut self, name: &str, init: bool) {
        if self.variables.contains_key(name) == false {
            self.variables.insert(
                name.to_string(),
                Variable::Independent(Net::new(name.to_string(), init)),
            );
        }
    }

    /// Registers `name` as a dependent variable, promoting it from
    /// independent if it already exists.
    pub fn declare_dependent(&mut self, name: &str) {
        match self.variables.get_mut(name) {
            Some(var) => var.promote(),
            None => {
                self.variables.insert(
                    name.to_string(),
                    Variable::Dependent(Net::new(name.to_string(), false)),
                );
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Reads the current logical value of the variable `name`.
    pub fn value_of(&self, name: &str) -> Result<bool, NameError> {
        match self.variables.get(name) {
            Some(var) => Ok(var.value()),
            None => Err(NameError::UnknownVariable(name.to_string())),
        }
    }

    /// Writes `value` to the variable `name` regardless of its kind.
    ///
    /// Engine-internal setter; user interaction goes through [Self::toggle].
    pub fn set_value(&mut self, name: &str, value: bool) -> Result<(), NameError> {
        match self.variables.get_mut(name) {
            Some(var) => Ok(var.set_value(value)),
            None => Err(NameError::UnknownVariable(name.to_string())),
        }
    }

    /// Flips the value of the independent variable `name`, returning the new
    /// value.
    pub fn toggle(&mut self, name: &str) -> Result<bool, NameError> {
        match self.variables.get_mut(name) {
            Some(var) => {
                if var.is_independent() == false {
                    return Err(NameError::NotIndependent(name.to_string()));
                }
                let flipped = var.value() == false;
                var.set_value(flipped);
                Ok(flipped)
            }
            None => Err(NameError::UnknownVariable(name.to_string())),
        }
    }

    /// Registers a vector notation with the namespace, widening any existing
    /// range so the component list stays a contiguous descending range.
    /// Missing bits are created as new independent variables with value 0.
    pub fn update_namespace(&mut self, vec: &VectorRef) {
        let entry = match self.namespaces.get_mut(vec.name()) {
            Some(ns) => {
                if vec.msb() > ns.msb {
                    ns.msb = vec.msb();
                }
                if vec.lsb() < ns.lsb {
                    ns.lsb = vec.lsb();
                }
                ns.clone()
            }
            None => {
                let ns = Namespace {
                    prefix: vec.name().to_string(),
                    msb: vec.msb(),
                    lsb: vec.lsb(),
                };
                self.namespaces.insert(vec.name().to_string(), ns.clone());
                ns
            }
        };
        for bit in entry.components() {
            self.declare(&bit, false);
        }
    }

    pub fn namespace(&self, prefix: &str) -> Option<&Namespace> {
        self.namespaces.get(prefix)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Stores the design's header, rejecting an output listed twice.
    pub fn set_header(&mut self, header: Header) -> Result<(), NameError> {
        let mut seen: Vec<&String> = Vec::new();
        for out in header.outputs() {
            if seen.contains(&out) == true {
                return Err(NameError::DuplicateOutput(out.clone()));
            }
            seen.push(out);
        }
        self.header = Some(header);
        Ok(())
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Verifies the header invariants after a parse: every declared input
    /// exists as an independent variable, and every declared output is
    /// dependent or carries a dependent next-state shadow.
    pub fn check_header(&self) -> Result<(), NameError> {
        let header = match &self.header {
            Some(h) => h,
            None => return Ok(()),
        };
        for name in header.inputs() {
            match self.variables.get(name) {
                Some(var) => {
                    if var.is_independent() == false {
                        return Err(NameError::InputNotIndependent(name.clone()));
                    }
                }
                None => return Err(NameError::UnknownVariable(name.clone())),
            }
        }
        for name in header.outputs() {
            let driven = match self.variables.get(name) {
                Some(var) => var.is_dependent(),
                None => false,
            };
            let shadow = format!("{}{}", name, NEXT_STATE_SUFFIX);
            let shadowed = match self.variables.get(&shadow) {
                Some(var) => var.is_dependent(),
                None => false,
            };
            if driven == false && shadowed == false {
                return Err(NameError::OutputNeverDriven(name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ut_declare_once() {
        let mut db = Database::new();
        db.declare("a", false);
        db.declare("a", true);
        // the second declaration does not overwrite the first
        assert_eq!(db.value_of("a").unwrap(), false);
        assert_eq!(db.variable_count(), 1);
    }

    #[test]
    fn ut_promote_on_dependent_declare() {
        let mut db = Database::new();
        db.declare("y", true);
        db.declare_dependent("y");
        assert_eq!(db.get("y").unwrap().is_dependent(), true);
        assert_eq!(db.value_of("y").unwrap(), true);
    }

    #[test]
    fn ut_toggle() {
        let mut db = Database::new();
        db.declare("a", false);
        assert_eq!(db.toggle("a").unwrap(), true);
        assert_eq!(db.toggle("a").unwrap(), false);
        db.declare_dependent("y");
        assert_eq!(
            db.toggle("y").unwrap_err(),
            NameError::NotIndependent(String::from("y"))
        );
        assert_eq!(
            db.toggle("zz").unwrap_err(),
            NameError::UnknownVariable(String::from("zz"))
        );
    }

    #[test]
    fn ut_namespace_contiguous() {
        let mut db = Database::new();
        db.update_namespace(
            crate::core::expand::NetRef::from_str("x[2..1]")
                .unwrap()
                .as_vector()
                .unwrap(),
        );
        assert_eq!(db.namespace("x").unwrap().components(), vec!["x2", "x1"]);
        // referencing an outer bit later widens the range and fills the gap
        db.update_namespace(
            crate::core::expand::NetRef::from_str("x[5..5]")
                .unwrap()
                .as_vector()
                .unwrap(),
        );
        let ns = db.namespace("x").unwrap();
        assert_eq!(
            ns.components(),
            vec!["x5", "x4", "x3", "x2", "x1"]
        );
        // the auto-created intermediate bits exist with value 0
        assert_eq!(db.value_of("x4").unwrap(), false);
        assert_eq!(db.value_of("x3").unwrap(), false);
    }

    #[test]
    fn ut_header_duplicate_output() {
        let mut db = Database::new();
        let header = Header::new(
            String::from("M"),
            vec![String::from("a")],
            vec![String::from("s"), String::from("s")],
        );
        assert_eq!(
            db.set_header(header).unwrap_err(),
            NameError::DuplicateOutput(String::from("s"))
        );
    }

    #[test]
    fn ut_header_checks() {
        let mut db = Database::new();
        db.declare("a", false);
        db.declare_dependent("s");
        db.set_header(Header::new(
            String::from("M"),
            vec![String::from("a")],
            vec![String::from("s")],
        ))
        .unwrap();
        assert_eq!(db.check_header(), Ok(()));
        // a clocked output is accepted through its next-state shadow
        db.declare("q", false);
        db.declare_dependent("q.d");
        db.set_header(Header::new(
            String::from("M"),
            vec![String::from("a")],
            vec![String::from("q")],
        ))
        .unwrap();
        assert_eq!(db.check_header(), Ok(()));
        // an output with no driver anywhere is rejected
        db.declare("w", false);
        db.set_header(Header::new(
            String::from("M"),
            vec![String::from("a")],
            vec![String::from("w")],
        ))
        .unwrap();
        assert_eq!(
            db.check_header(),
            Err(NameError::OutputNeverDriven(String::from("w")))
        );
    }
}
