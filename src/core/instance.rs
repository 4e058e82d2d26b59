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
use super::error::InstantiationError;
use super::error::RuntimeError;
use super::statement::InstantiationStatement;
use crate::error::Error;
use log::debug;

/// The ceiling on rerun passes before the engine reports divergence.
const RERUN_LIMIT: usize = 100;

/// A caller-site binding to a child design: each header slot of the child
/// is wired by position to a caller scalar, copy-in on the way down and
/// copy-out on the way up.
#[derive(Debug, PartialEq)]
pub struct Instance {
    path: String,
    module: String,
    design: Design,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Instance {
    /// Wires the parsed child `design` to the caller scalars named by the
    /// instantiation statement, verifying the binding arity slot-by-slot
    /// against the child's header.
    pub fn bind(
        path: String,
        stmt: &InstantiationStatement,
        design: Design,
    ) -> Result<Self, Error> {
        let header = match design.database().header() {
            Some(h) => h.clone(),
            None => {
                return Err(Error::from(InstantiationError::MissingHeader(
                    stmt.module().to_string(),
                )))
            }
        };
        if stmt.inputs().len() != header.inputs().len() {
            return Err(Error::from(InstantiationError::InputArityMismatch(
                stmt.module().to_string(),
                stmt.inputs().len(),
                header.inputs().len(),
            )));
        }
        if stmt.outputs().len() != header.outputs().len() {
            return Err(Error::from(InstantiationError::OutputArityMismatch(
                stmt.module().to_string(),
                stmt.outputs().len(),
                header.outputs().len(),
            )));
        }
        Ok(Self {
            path: path,
            module: stmt.module().to_string(),
            design: design,
            inputs: stmt.inputs().clone(),
            outputs: stmt.outputs().clone(),
        })
    }

    /// The dotted navigation path of this caller site.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Copies caller input values down, runs the child, and copies child
    /// output values up. Returns true if any caller-side output changed.
    fn run(&mut self, db: &mut Database, ticking: bool) -> Result<bool, Error> {
        let header = match self.design.database().header() {
            Some(h) => h.clone(),
            None => {
                return Err(Error::from(InstantiationError::MissingHeader(
                    self.module.clone(),
                )))
            }
        };
        // bind inputs down: the child observes caller state frozen here
        for (caller, child) in self.inputs.iter().zip(header.inputs()) {
            let value = db.value_of(caller)?;
            self.design.database_mut().set_value(child, value)?;
        }
        self.design.run(ticking)?;
        // bind outputs up
        let mut changed = false;
        for (caller, child) in self.outputs.iter().zip(header.outputs()) {
            let value = self.design.database().value_of(child)?;
            if db.value_of(caller)? != value {
                changed = true;
            }
            db.set_value(caller, value)?;
        }
        Ok(changed)
    }
}

/// Runs every instance once, then reruns the whole pass while any instance
/// reports a changed caller-side output. The first pass of a tick runs the
/// children's clock engines; rerun passes only re-solve.
pub fn run_instances(
    instances: &mut Vec<Instance>,
    db: &mut Database,
    ticking: bool,
) -> Result<(), Error> {
    if instances.is_empty() == true {
        return Ok(());
    }
    let mut ticking = ticking;
    let mut passes = 0;
    loop {
        let mut changed = false;
        for inst in instances.iter_mut() {
            if inst.run(db, ticking)? == true {
                debug!("instance {} changed caller outputs", inst.path());
                changed = true;
            }
        }
        // a tick edge advances each child exactly once
        ticking = false;
        if changed == false {
            break;
        }
        passes += 1;
        if passes >= RERUN_LIMIT {
            return Err(Error::from(RuntimeError::InstantiationDivergence(
                RERUN_LIMIT,
            )));
        }
    }
    Ok(())
}

/// Finds the instance at the dotted `path`, descending through child
/// designs.
pub fn find_instance<'a>(instances: &'a [Instance], path: &str) -> Option<&'a Instance> {
    for inst in instances {
        if inst.path() == path {
            return Some(inst);
        }
        if path.starts_with(&format!("{}.", inst.path())) == true {
            return find_instance(inst.design().instances(), path);
        }
    }
    None
}
