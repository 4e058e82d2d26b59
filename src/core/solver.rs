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
use super::database::NEXT_STATE_SUFFIX;
use super::error::RuntimeError;
use super::expr::eval;
use super::expr::eval::Value;
use super::statement::Statement;
use crate::error::Error;
use log::debug;
use log::trace;

/// Repeatedly re-evaluates the boolean expression statements, in ascending
/// source order, until the committed values stabilize.
///
/// A commit restarts the sweep from the top. An expression crossing a
/// non-monotone operator (`==`, `+`, `-`) is pinned after its second commit
/// within one cycle, breaking oscillators that would never settle. A
/// runtime evaluation error pins the offending statement as undefined for
/// this cycle and the sweep moves on.
///
/// After the combinational values settle, every clock statement's
/// next-value buffer and its `.d` shadow variables are recomputed.
pub fn solve(statements: &mut Vec<Statement>, db: &mut Database) -> Result<(), Error> {
    let exprs: Vec<usize> = statements
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.as_boolean().map(|_| i))
        .collect();
    let mut pinned = vec![false; exprs.len()];
    let mut commits = vec![0usize; exprs.len()];
    for &si in &exprs {
        if let Some(s) = statements[si].as_boolean_mut() {
            s.mark_undefined(false);
        }
    }
    // a legal solve cannot commit more often than every expression flipping
    // every variable once
    let ceiling = (exprs.len() + 1) * (db.variable_count() + 2);
    let mut total_commits = 0;

    let mut i = 0;
    while i < exprs.len() {
        if pinned[i] == true {
            i += 1;
            continue;
        }
        let si = exprs[i];
        let fresh = match statements[si].as_boolean() {
            Some(s) => eval::evaluate(s.tree(), db),
            None => {
                i += 1;
                continue;
            }
        };
        let fresh = match fresh {
            Ok(v) => v,
            Err(e) => {
                // the statement holds no defined value this cycle
                debug!("expression{} is undefined: {}", statements[si].locate(), e);
                if let Some(s) = statements[si].as_boolean_mut() {
                    s.mark_undefined(true);
                }
                pinned[i] = true;
                i += 1;
                continue;
            }
        };
        let (resized, names) = match statements[si].as_boolean() {
            Some(s) => (fresh.fit(s.lhs().len()), s.lhs().clone()),
            None => {
                i += 1;
                continue;
            }
        };
        let mut current = Vec::with_capacity(names.len());
        for name in &names {
            current.push(db.value_of(name)?);
        }
        let changed = current != resized.to_bits();
        if let Some(s) = statements[si].as_boolean_mut() {
            s.cache(resized);
        }
        if changed == false {
            i += 1;
            continue;
        }
        // commit the fresh value and restart the sweep from the top
        for (name, bit) in names.iter().zip(resized.to_bits()) {
            db.set_value(name, bit)?;
        }
        commits[i] += 1;
        total_commits += 1;
        trace!("commit #{} at expression index {}", total_commits, i);
        if total_commits > ceiling {
            return Err(Error::from(RuntimeError::SolverDivergence(ceiling)));
        }
        let nonmonotone = match statements[si].as_boolean() {
            Some(s) => s.is_nonmonotone(),
            None => false,
        };
        if nonmonotone == true && commits[i] >= 2 {
            debug!(
                "pinning non-monotone expression{} after commit {}",
                statements[si].locate(),
                commits[i]
            );
            pinned[i] = true;
        }
        i = 0;
    }

    refresh_next_values(statements, db)
}

/// Recomputes each clock statement's next-value buffer against the settled
/// combinational state and mirrors it into the `.d` shadow variables.
pub fn refresh_next_values(
    statements: &mut Vec<Statement>,
    db: &mut Database,
) -> Result<(), Error> {
    for idx in 0..statements.len() {
        let fresh = match statements[idx].as_clock() {
            Some(c) => Some(eval::evaluate(c.expr().tree(), db)),
            None => None,
        };
        let fresh = match fresh {
            Some(f) => f,
            None => continue,
        };
        match fresh {
            Ok(v) => {
                let (next, names) = match statements[idx].as_clock() {
                    Some(c) => (v.fit(c.expr().lhs().len()), c.expr().lhs().clone()),
                    None => continue,
                };
                for (name, bit) in names.iter().zip(next.to_bits()) {
                    db.set_value(&format!("{}{}", name, NEXT_STATE_SUFFIX), bit)?;
                }
                if let Some(c) = statements[idx].as_clock_mut() {
                    c.set_next(Some(next));
                    c.expr_mut().mark_undefined(false);
                }
            }
            Err(e) => {
                debug!(
                    "next-state expression{} is undefined: {}",
                    statements[idx].locate(),
                    e
                );
                if let Some(c) = statements[idx].as_clock_mut() {
                    c.set_next(None);
                    c.expr_mut().mark_undefined(true);
                }
            }
        }
    }
    Ok(())
}

/// Reads the bit group for a list of scalar names, msb first.
pub fn read_group(names: &[String], db: &Database) -> Result<Value, Error> {
    let mut bits = Vec::with_capacity(names.len());
    for name in names {
        bits.push(db.value_of(name)?);
    }
    Ok(Value::from_bits(&bits))
}
