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

use std::fmt::Display;

/// A scalar named signal carrying a single-bit value.
///
/// An `Independent` variable has no driving expression; its value changes
/// only through a user click or a clock tick. A `Dependent` variable is
/// driven by at least one expression or next-state assignment and is
/// recomputed by the solver.
#[derive(Debug, PartialEq, Clone)]
pub enum Variable {
    Independent(Net),
    Dependent(Net),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Net {
    name: String,
    value: bool,
}

impl Net {
    pub fn new(name: String, value: bool) -> Self {
        Self {
            name: name,
            value: value,
        }
    }
}

impl Variable {
    /// Access the variable's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Independent(net) => net.name.as_ref(),
            Self::Dependent(net) => net.name.as_ref(),
        }
    }

    /// Access the variable's current logical value.
    pub fn value(&self) -> bool {
        match self {
            Self::Independent(net) => net.value,
            Self::Dependent(net) => net.value,
        }
    }

    pub fn set_value(&mut self, value: bool) {
        match self {
            Self::Independent(net) => net.value = value,
            Self::Dependent(net) => net.value = value,
        }
    }

    pub fn is_independent(&self) -> bool {
        match self {
            Self::Independent(_) => true,
            _ => false,
        }
    }

    pub fn is_dependent(&self) -> bool {
        match self {
            Self::Dependent(_) => true,
            _ => false,
        }
    }

    /// Rebinds the variable as dependent once it becomes driven by an
    /// expression. A dependent variable never reverts to independent within
    /// a single parse.
    pub fn promote(&mut self) {
        if let Self::Independent(net) = self {
            *self = Self::Dependent(Net::new(net.name.clone(), net.value));
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.name(), self.value() as u8)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ut_promote() {
        let mut var = Variable::Independent(Net::new(String::from("a"), true));
        assert_eq!(var.is_independent(), true);
        var.promote();
        assert_eq!(var.is_dependent(), true);
        // the value carries across the promotion
        assert_eq!(var.value(), true);
        // promoting twice is a no-op
        var.promote();
        assert_eq!(var.is_dependent(), true);
    }

    #[test]
    fn ut_set_value() {
        let mut var = Variable::Independent(Net::new(String::from("a"), false));
        var.set_value(true);
        assert_eq!(var.value(), true);
    }
}
