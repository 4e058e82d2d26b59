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

use super::clock;
use super::database::Database;
use super::display;
use super::display::DisplayToken;
use super::error::InstantiationError;
use super::error::RuntimeError;
use super::expr::eval::Value;
use super::instance;
use super::instance::Instance;
use super::parser::Parser;
use super::solver;
use super::statement::Statement;
use crate::error::Error;
use crate::error::Hint;
use crate::util::filesystem;
use crate::util::filesystem::FileResolver;
use crate::util::filesystem::SourceResolver;
use std::path::Path;

/// The deepest an instance tree may nest before loading fails.
const INSTANTIATION_DEPTH_LIMIT: usize = 32;

/// The ceiling on alternating solver/instance passes in one resolve.
const RESOLVE_LIMIT: usize = 100;

/// A parsed source file: its text, classified statements, symbol database,
/// and the owned child designs of its instantiations.
///
/// All simulation state lives here. Values move only through the database
/// setters driven by [Self::solve], [Self::tick], and the click operations.
#[derive(Debug, PartialEq)]
pub struct Design {
    name: String,
    source: String,
    statements: Vec<Statement>,
    database: Database,
    instances: Vec<Instance>,
    libraries: Vec<String>,
    nav: Vec<String>,
}

impl Design {
    /// Loads the design source at `path`, resolving sub-modules against the
    /// file's own directory.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let source = filesystem::read_source(path)?;
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => String::from("design"),
        };
        let resolver = FileResolver::sibling_of(path);
        Self::parse(&name, &source, &resolver)
            .map_err(|e| Error::InFile(path.display().to_string(), Box::new(e)))
    }

    /// Parses `source` into a ready design: preprocess, expand, classify,
    /// recursively load instantiated modules, and run the initial solve.
    ///
    /// Any error discards the partial design.
    pub fn parse(name: &str, source: &str, resolver: &dyn SourceResolver) -> Result<Self, Error> {
        Self::parse_at(name, source, resolver, name, 0)
    }

    fn parse_at(
        name: &str,
        source: &str,
        resolver: &dyn SourceResolver,
        path: &str,
        depth: usize,
    ) -> Result<Self, Error> {
        if depth > INSTANTIATION_DEPTH_LIMIT {
            return Err(Error::from(InstantiationError::RecursionLimit(
                INSTANTIATION_DEPTH_LIMIT,
            )));
        }
        let (database, statements, libraries) = Parser::parse(source)?.decouple();
        // each caller site owns one recursively parsed child design
        let mut instances = Vec::new();
        for stmt in statements.iter().filter_map(|s| s.as_instantiation()) {
            let module_path = match resolver.resolve(stmt.module(), &libraries) {
                Some(p) => p,
                None => {
                    return Err(Error::ModuleNotFoundAnywhere(
                        stmt.module().to_string(),
                        Hint::LibraryDirective,
                    ))
                }
            };
            let module_source = filesystem::read_source(&module_path)?;
            let sub_path = format!("{}.{}", path, stmt.instance());
            let child =
                Self::parse_at(stmt.module(), &module_source, resolver, &sub_path, depth + 1)
                    .map_err(|e| {
                        Error::InFile(module_path.display().to_string(), Box::new(e))
                    })?;
            instances.push(Instance::bind(sub_path, stmt, child)?);
        }
        let mut design = Self {
            name: name.to_string(),
            source: source.to_string(),
            statements: statements,
            database: database,
            instances: instances,
            libraries: libraries,
            nav: Vec::new(),
        };
        design.solve()?;
        Ok(design)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub(crate) fn database_mut(&mut self) -> &mut Database {
        &mut self.database
    }

    pub fn statements(&self) -> &Vec<Statement> {
        &self.statements
    }

    pub fn instances(&self) -> &Vec<Instance> {
        &self.instances
    }

    pub fn libraries(&self) -> &Vec<String> {
        &self.libraries
    }

    /// Runs combinational evaluation to a fixed point, alternating with
    /// instance passes until the whole tree is quiescent.
    ///
    /// Solving twice in a row without an input change commits nothing on
    /// the second run.
    pub fn solve(&mut self) -> Result<(), Error> {
        let mut passes = 0;
        loop {
            solver::solve(&mut self.statements, &mut self.database)?;
            if self.instances.is_empty() == true {
                return Ok(());
            }
            let before: Vec<bool> = self.database.variables().map(|v| v.value()).collect();
            instance::run_instances(&mut self.instances, &mut self.database, false)?;
            let after: Vec<bool> = self.database.variables().map(|v| v.value()).collect();
            if before == after {
                return Ok(());
            }
            passes += 1;
            if passes >= RESOLVE_LIMIT {
                return Err(Error::from(RuntimeError::InstantiationDivergence(
                    RESOLVE_LIMIT,
                )));
            }
        }
    }

    /// Advances one global clock edge: every register takes its buffered
    /// next value, child designs tick once, and the combinational state is
    /// re-solved against the new register outputs.
    pub fn tick(&mut self) -> Result<(), Error> {
        clock::tick(&mut self.statements, &mut self.database)?;
        instance::run_instances(&mut self.instances, &mut self.database, true)?;
        self.solve()
    }

    /// Runs the design as part of a parent's instance pass.
    pub(crate) fn run(&mut self, ticking: bool) -> Result<(), Error> {
        match ticking {
            true => self.tick(),
            false => self.solve(),
        }
    }

    /// Toggles the independent variable `name` and re-solves.
    pub fn click_variable(&mut self, name: &str) -> Result<(), Error> {
        self.database.toggle(name)?;
        self.solve()
    }

    /// Steps a displayed bit group to its next value: the group reads as an
    /// unsigned integer, increments, and wraps at its width. Only the
    /// independent bits are written; dependent bits stay with their
    /// drivers.
    pub fn click_group(&mut self, names: &[String]) -> Result<(), Error> {
        if names.is_empty() == true {
            return Ok(());
        }
        let group = solver::read_group(names, &self.database)?;
        let stepped = Value::new(names.len(), group.unsigned().wrapping_add(1));
        for (name, bit) in names.iter().zip(stepped.to_bits()) {
            let independent = match self.database.get(name) {
                Some(var) => var.is_independent(),
                None => false,
            };
            if independent == true {
                self.database.set_value(name, bit)?;
            }
        }
        self.solve()
    }

    /// Pushes the instance at the dotted `path` onto the navigation stack.
    pub fn open_instance(&mut self, path: &str) -> Result<(), Error> {
        match instance::find_instance(&self.instances, path) {
            Some(_) => {
                self.nav.push(path.to_string());
                Ok(())
            }
            None => Err(Error::Custom(format!(
                "no instantiation exists at path {:?}",
                path
            ))),
        }
    }

    /// Pops the instance at the dotted `path` off the navigation stack.
    pub fn close_instance(&mut self, path: &str) -> Result<(), Error> {
        match self.nav.last() {
            Some(top) => {
                if top != path {
                    return Err(Error::Custom(format!(
                        "instantiation {:?} is not on top of the navigation stack",
                        path
                    )));
                }
                self.nav.pop();
                Ok(())
            }
            None => Err(Error::Custom(String::from(
                "no instantiation is currently open",
            ))),
        }
    }

    /// The design currently in view: the top of the navigation stack, or
    /// this design when nothing is open.
    pub fn in_view(&self) -> &Design {
        match self.nav.last() {
            Some(path) => match instance::find_instance(&self.instances, path) {
                Some(inst) => inst.design(),
                None => self,
            },
            None => self,
        }
    }

    /// Renders the annotated token stream consumed by the display layer.
    pub fn display(&self) -> Vec<DisplayToken> {
        display::build(self)
    }
}
