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
use super::statement::Statement;
use crate::error::Error;
use log::debug;

/// Advances every clocked statement by one edge: each register takes the
/// value its next-state buffer captured before the tick.
///
/// An alternate-clock statement fires only when its gating variable has
/// risen since the sample taken at the previous tick; the sample is
/// refreshed either way. Because every buffer was filled before any
/// register is written, each register sees the old value of every other
/// register.
pub fn tick(statements: &mut Vec<Statement>, db: &mut Database) -> Result<(), Error> {
    for idx in 0..statements.len() {
        let clock = match statements[idx].as_clock() {
            Some(c) => c,
            None => continue,
        };
        let fire = match clock.gate() {
            Some(gate) => {
                let now = db.value_of(gate)?;
                let rose = clock.gate_sample() == false && now == true;
                if let Some(c) = statements[idx].as_clock_mut() {
                    c.set_gate_sample(now);
                }
                rose
            }
            None => true,
        };
        if fire == false {
            continue;
        }
        let (names, next) = match statements[idx].as_clock() {
            Some(c) => match c.next() {
                Some(v) => (c.expr().lhs().clone(), v),
                None => {
                    // an undefined capture holds the register steady
                    debug!("clock statement{} holds: no capture", statements[idx].locate());
                    continue;
                }
            },
            None => continue,
        };
        for (name, bit) in names.iter().zip(next.to_bits()) {
            db.set_value(name, bit)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::super::parser::Parser;
    use super::super::solver;
    use super::*;

    fn load(src: &str) -> (Vec<Statement>, Database) {
        let (db, statements, _) = Parser::parse(src).unwrap().decouple();
        (statements, db)
    }

    fn cycle(stmts: &mut Vec<Statement>, db: &mut Database) {
        tick(stmts, db).unwrap();
        solver::solve(stmts, db).unwrap();
    }

    #[test]
    fn ut_register_advances_on_tick() {
        let (mut stmts, mut db) = load("q <= d;\nd;");
        db.toggle("d").unwrap();
        solver::solve(&mut stmts, &mut db).unwrap();
        // solving alone never moves the register
        assert_eq!(db.value_of("q").unwrap(), false);
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("q").unwrap(), true);
        db.toggle("d").unwrap();
        solver::solve(&mut stmts, &mut db).unwrap();
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("q").unwrap(), false);
    }

    #[test]
    fn ut_registers_swap_simultaneously() {
        // each register sees the other's pre-tick value
        let (mut stmts, mut db) = load("a <= b;\nb <= a;");
        db.set_value("a", true).unwrap();
        solver::solve(&mut stmts, &mut db).unwrap();
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("a").unwrap(), false);
        assert_eq!(db.value_of("b").unwrap(), true);
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("a").unwrap(), true);
        assert_eq!(db.value_of("b").unwrap(), false);
    }

    #[test]
    fn ut_alternate_clock_fires_on_rise_only() {
        let (mut stmts, mut db) = load("clk : q <= d;\nd clk;");
        db.toggle("d").unwrap();
        solver::solve(&mut stmts, &mut db).unwrap();
        // clk stays low: no capture lands
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("q").unwrap(), false);
        // clk rises: the register takes the buffer
        db.toggle("clk").unwrap();
        solver::solve(&mut stmts, &mut db).unwrap();
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("q").unwrap(), true);
        // clk still high: no new edge, the register holds
        db.set_value("d", false).unwrap();
        solver::solve(&mut stmts, &mut db).unwrap();
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("q").unwrap(), true);
        // falling edge does not fire either
        db.toggle("clk").unwrap();
        solver::solve(&mut stmts, &mut db).unwrap();
        cycle(&mut stmts, &mut db);
        assert_eq!(db.value_of("q").unwrap(), true);
    }
}
