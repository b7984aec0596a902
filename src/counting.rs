//! Counting integer points of parametric polyhedra
//!
//! A [`PointCounter`] turns a polyhedron into a [`ParametricCount`]: a count
//! of distinct integer prefixes that can be evaluated at any parameter
//! instantiation. The trailing `existential` coordinates are projected out,
//! so a prefix counts once however many completions it has.
//!
//! [`EnumerativeCounter`] keeps the polyhedron itself as the "formula" and
//! evaluates it by scanning, with loop bounds from Fourier-Motzkin
//! projections.

use std::collections::HashSet;
use std::fmt;

use log::trace;
use num_integer::Integer;
use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, ExploreResult};
use crate::polyhedron::{ConstraintKind, Polyhedron};

/// A parametric point count
pub trait ParametricCount: fmt::Debug {
    fn evaluate(&self, parameters: &[i64]) -> ExploreResult<i64>;

    /// Human-readable form using the given parameter names
    fn render(&self, parameter_names: &[String]) -> String;
}

pub trait PointCounter {
    type Count: ParametricCount;

    fn count(
        &self,
        polyhedron: &Polyhedron,
        existential: usize,
        parameters: usize,
    ) -> ExploreResult<Self::Count>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerativeCounter;

impl PointCounter for EnumerativeCounter {
    type Count = PeCount;

    fn count(
        &self,
        polyhedron: &Polyhedron,
        existential: usize,
        parameters: usize,
    ) -> ExploreResult<PeCount> {
        if parameters != polyhedron.parameters {
            return Err(ExploreError::geometry(format!(
                "counting over {} parameters, polyhedron has {}",
                parameters, polyhedron.parameters
            )));
        }
        if existential > polyhedron.dimensions {
            return Err(ExploreError::geometry(format!(
                "cannot project out {} of {} dimensions",
                existential, polyhedron.dimensions
            )));
        }
        Ok(PeCount {
            polyhedron: polyhedron.clone(),
            existential,
        })
    }
}

/// Count of `{ z[0..D-e] : exists z[D-e..D] : z ∈ polyhedron }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeCount {
    polyhedron: Polyhedron,
    existential: usize,
}

impl PeCount {
    pub fn polyhedron(&self) -> &Polyhedron {
        &self.polyhedron
    }

    fn variable_names(&self) -> Vec<String> {
        let d = self.polyhedron.dimensions;
        let kept = d - self.existential;
        (0..d)
            .map(|i| {
                if i < kept {
                    format!("a{}", i)
                } else if self.existential == 1 {
                    "t".to_string()
                } else {
                    format!("t{}", i - kept)
                }
            })
            .collect()
    }
}

impl ParametricCount for PeCount {
    fn evaluate(&self, parameters: &[i64]) -> ExploreResult<i64> {
        let p = self.polyhedron.parameters;
        if parameters.len() != p {
            return Err(ExploreError::geometry(format!(
                "expected {} parameter values, got {}",
                p,
                parameters.len()
            )));
        }
        let system = instantiate(&self.polyhedron, parameters);
        let scanner = Scanner::new(system, self.polyhedron.dimensions)?;
        let kept = self.polyhedron.dimensions - self.existential;
        let mut prefixes = HashSet::new();
        let mut point = Vec::with_capacity(self.polyhedron.dimensions);
        scanner.collect_prefixes(&mut point, kept, &mut prefixes)?;
        trace!("{} distinct prefixes at {:?}", prefixes.len(), parameters);
        Ok(prefixes.len() as i64)
    }

    fn render(&self, parameter_names: &[String]) -> String {
        let variables = self.variable_names();
        let kept = self.polyhedron.dimensions - self.existential;
        let mut names = variables.clone();
        names.extend(parameter_names.iter().cloned());
        let constraints: Vec<String> = self
            .polyhedron
            .constraints
            .iter()
            .map(|c| c.format_with_names(&names))
            .collect();
        let prefix = variables[..kept].join(", ");
        if self.existential == 0 {
            format!("#{{ [{}] : {} }}", prefix, constraints.join(" and "))
        } else {
            format!(
                "#{{ [{}] : exists {} : {} }}",
                prefix,
                variables[kept..].join(", "),
                constraints.join(" and ")
            )
        }
    }
}

/// `a·z + c >= 0` over `i128`, parameters already substituted
type Row = Vec<i128>;

fn instantiate(polyhedron: &Polyhedron, parameters: &[i64]) -> Vec<Row> {
    let d = polyhedron.dimensions;
    let mut rows = Vec::new();
    for c in &polyhedron.constraints {
        let mut row: Row = c.coeffs[..d].iter().map(|&v| i128::from(v)).collect();
        let constant = c.coeffs[d..d + parameters.len()]
            .iter()
            .zip(parameters)
            .map(|(&a, &v)| i128::from(a) * i128::from(v))
            .sum::<i128>()
            + i128::from(c.constant());
        row.push(constant);
        if c.kind == ConstraintKind::Equality {
            rows.push(row.iter().map(|v| -v).collect());
        }
        rows.push(row);
    }
    rows
}

/// Loop-nest scanner: `levels[k]` constrains `z[0..=k]` only
struct Scanner {
    levels: Vec<Vec<Row>>,
    empty: bool,
}

impl Scanner {
    fn new(system: Vec<Row>, dimensions: usize) -> ExploreResult<Self> {
        let mut levels = vec![Vec::new(); dimensions];
        let mut current = system;
        for k in (0..dimensions).rev() {
            let projected = eliminate(&current, k)?;
            levels[k] = current;
            current = projected;
        }
        // what is left constrains no variable at all
        let empty = current.iter().any(|row| row[row.len() - 1] < 0);
        Ok(Self { levels, empty })
    }

    /// Integer range of `z[k]` once `z[0..k]` are fixed
    fn bounds(&self, point: &[i64], k: usize) -> ExploreResult<Option<(i64, i64)>> {
        let mut lower: Option<i128> = None;
        let mut upper: Option<i128> = None;
        for row in &self.levels[k] {
            let constant = row[row.len() - 1];
            let rest: i128 = point
                .iter()
                .zip(row)
                .map(|(&z, &a)| a * i128::from(z))
                .sum::<i128>()
                + constant;
            let a = row[k];
            if a == 0 {
                if rest < 0 {
                    return Ok(None);
                }
            } else if a > 0 {
                let bound = Integer::div_ceil(&(-rest), &a);
                lower = Some(lower.map_or(bound, |l| l.max(bound)));
            } else {
                let bound = Integer::div_floor(&rest, &(-a));
                upper = Some(upper.map_or(bound, |u| u.min(bound)));
            }
        }
        match (lower, upper) {
            (Some(l), Some(u)) if l > u => Ok(None),
            (Some(l), Some(u)) => {
                let narrow = |v: i128| {
                    i64::try_from(v).map_err(|_| ExploreError::geometry("scan bound overflows i64"))
                };
                Ok(Some((narrow(l)?, narrow(u)?)))
            }
            _ => Err(ExploreError::geometry(format!(
                "coordinate {} is unbounded; cannot count points",
                k
            ))),
        }
    }

    fn collect_prefixes(
        &self,
        point: &mut Vec<i64>,
        kept: usize,
        prefixes: &mut HashSet<Vec<i64>>,
    ) -> ExploreResult<()> {
        if self.empty {
            return Ok(());
        }
        let k = point.len();
        if k == kept {
            if self.has_completion(point)? {
                prefixes.insert(point.clone());
            }
            return Ok(());
        }
        let Some((low, high)) = self.bounds(point, k)? else {
            return Ok(());
        };
        for v in low..=high {
            point.push(v);
            self.collect_prefixes(point, kept, prefixes)?;
            point.pop();
        }
        Ok(())
    }

    fn has_completion(&self, point: &mut Vec<i64>) -> ExploreResult<bool> {
        let k = point.len();
        if k == self.levels.len() {
            return Ok(true);
        }
        let Some((low, high)) = self.bounds(point, k)? else {
            return Ok(false);
        };
        for v in low..=high {
            point.push(v);
            let found = self.has_completion(point)?;
            point.pop();
            if found {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Fourier-Motzkin elimination of `z[k]`, the last variable of `rows`
///
/// Returned rows drop the `z[k]` column.
fn eliminate(rows: &[Row], k: usize) -> ExploreResult<Vec<Row>> {
    let mut lower = Vec::new();
    let mut upper = Vec::new();
    let mut result: Vec<Row> = Vec::new();
    for row in rows {
        match row[k].signum() {
            1 => lower.push(row),
            -1 => upper.push(row),
            _ => result.push(drop_column(row, k)),
        }
    }
    for l in &lower {
        for u in &upper {
            let (a, b) = (l[k], -u[k]);
            let combined = l
                .iter()
                .zip(u.iter())
                .map(|(&x, &y)| {
                    b.checked_mul(x)
                        .zip(a.checked_mul(y))
                        .and_then(|(p, q)| p.checked_add(q))
                        .ok_or_else(|| ExploreError::geometry("projection overflows"))
                })
                .collect::<ExploreResult<Row>>()?;
            result.push(normalize(drop_column(&combined, k)));
        }
    }
    result.sort();
    result.dedup();
    Ok(result)
}

fn drop_column(row: &[i128], k: usize) -> Row {
    row.iter()
        .enumerate()
        .filter(|&(i, _)| i != k)
        .map(|(_, &v)| v)
        .collect()
}

/// Divide the variable coefficients by their gcd, tightening the constant
fn normalize(mut row: Row) -> Row {
    let last = row.len() - 1;
    let g = row[..last].iter().fold(0i128, |acc, v| acc.gcd(v));
    if g > 1 {
        for v in &mut row[..last] {
            *v /= g;
        }
        row[last] = Integer::div_floor(&row[last], &g);
    }
    row
}
