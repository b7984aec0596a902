//! The built-in parametric solver
//!
//! Each call to [`PipSolver::solve`] opens a [`Session`] that owns the
//! initial tableau and context and counts the work done. The session walks
//! the dual simplex:
//!
//! 1. a row whose constant is negative over the whole context is pivoted;
//!    with no positive entry the node has no solution;
//! 2. a row whose sign depends on the parameters splits the context;
//! 3. once every row is non-negative, the first unknown with a fractional
//!    value gets a Gomory cut, introducing a new parameter when the
//!    fraction depends on the parameters;
//! 4. otherwise the unknown rows are the lexicographic minimum.
//!
//! The big parameter is larger than anything else: its coefficient alone
//! decides the sign of a row when it is non-zero.

use log::{debug, trace};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::{BigRational, Rational64};
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{ExploreError, ExploreResult};
use crate::ilp::ParametricProgram;
use crate::pip::context::Context;
use crate::pip::tableau::{ParamVector, Remainder, Tableau};
use crate::pip::{NewParameter, ParametricSolver, SolutionTree, SolutionVector, TreeBody};
use crate::polyhedron::ConstraintKind;

/// Default cap on simplex steps per solve and per context check
pub const DEFAULT_MAX_ITERATIONS: usize = 20_000;

#[derive(Debug, Clone)]
pub struct PipSolver {
    max_iterations: usize,
}

impl PipSolver {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for PipSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ParametricSolver for PipSolver {
    fn solve(&self, program: &ParametricProgram) -> ExploreResult<SolutionTree> {
        let mut session = Session::open(program, self.max_iterations);
        let tree = session.run()?;
        debug!(
            "solved {}x{} program: {} pivots, {} cuts, {} branches",
            program.rows().len(),
            program.unknowns(),
            session.pivots,
            session.cuts,
            session.branches
        );
        Ok(tree)
    }
}

enum Sign {
    NonNegative,
    Negative,
    /// Both signs occur; the condition is the integer row `e` with `e >= 0`
    /// on the non-negative side
    Undetermined(Vec<BigInt>),
}

enum Integrality {
    Integral,
    /// A fraction was rewritten through an existing new parameter
    Absorbed,
    /// A cut row was added, possibly with a new parameter
    Cut(Option<NewParameter>),
}

/// New parameter definitions along the current path, by rank
#[derive(Debug, Clone, Default)]
struct Definitions {
    entries: Vec<Remainder>,
}

/// Working state of one solve
struct Session {
    tableau: Tableau,
    context: Context,
    parameters: usize,
    big_parameter: usize,
    limit: usize,
    steps: usize,
    pivots: usize,
    cuts: usize,
    branches: usize,
}

impl Session {
    fn open(program: &ParametricProgram, limit: usize) -> Self {
        trace!(
            "opening solver session: {} unknowns, {} parameters, {} rows",
            program.unknowns(),
            program.parameters(),
            program.rows().len()
        );
        let mut tableau = Tableau::new(program.unknowns(), program.parameters());
        for row in program.rows() {
            let coeffs: Vec<BigInt> = row.coeffs.iter().map(|&v| BigInt::from(v)).collect();
            match row.kind {
                ConstraintKind::Inequality => tableau.push_inequality(&coeffs),
                ConstraintKind::Equality => tableau.push_equality(&coeffs),
            }
        }
        Self {
            tableau,
            context: Context::new(program.parameters(), program.context()),
            parameters: program.parameters(),
            big_parameter: program.big_parameter(),
            limit,
            steps: 0,
            pivots: 0,
            cuts: 0,
            branches: 0,
        }
    }

    fn run(&mut self) -> ExploreResult<SolutionTree> {
        if !self.context.is_feasible(self.limit)? {
            trace!("empty parameter context");
            return Ok(SolutionTree::no_solution());
        }
        let tableau = self.tableau.clone();
        let context = self.context.clone();
        self.solve_node(tableau, context, Definitions::default())
    }

    fn step(&mut self) -> ExploreResult<()> {
        self.steps += 1;
        if self.steps > self.limit {
            return Err(ExploreError::solver(format!(
                "no solution tree within {} simplex steps",
                self.limit
            )));
        }
        Ok(())
    }

    fn solve_node(
        &mut self,
        mut tableau: Tableau,
        mut context: Context,
        mut definitions: Definitions,
    ) -> ExploreResult<SolutionTree> {
        let mut new_parameters = Vec::new();
        loop {
            self.step()?;

            let mut negative = None;
            let mut undetermined = None;
            for (i, row) in tableau.rows().iter().enumerate() {
                match self.sign(&row.constant, &context)? {
                    Sign::Negative => {
                        negative = Some(i);
                        break;
                    }
                    Sign::Undetermined(condition) if undetermined.is_none() => {
                        undetermined = Some(condition);
                    }
                    _ => {}
                }
            }

            if let Some(r) = negative {
                let Some(j) = tableau.pivot_column(r) else {
                    trace!("row {} is negative with no positive entry: no solution", r);
                    return Ok(SolutionTree {
                        new_parameters,
                        body: TreeBody::NoSolution,
                    });
                };
                trace!("pivot row {} column {}", r, j);
                tableau.pivot(r, j);
                self.pivots += 1;
                continue;
            }

            if let Some(condition) = undetermined {
                self.branches += 1;
                trace!("branch on {:?} >= 0", condition);
                let opposite: Vec<BigInt> = condition
                    .iter()
                    .enumerate()
                    .map(|(k, c)| if k + 1 == condition.len() { -c - 1 } else { -c })
                    .collect();
                let then_branch = self.solve_node(
                    tableau.clone(),
                    context.with(condition.clone()),
                    definitions.clone(),
                )?;
                let else_branch = self.solve_node(tableau, context.with(opposite), definitions)?;
                return Ok(SolutionTree {
                    new_parameters,
                    body: TreeBody::Conditional {
                        condition: to_i64_vec(&condition)?,
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    },
                });
            }

            match self.integrality_cut(&mut tableau, &mut context, &mut definitions)? {
                Integrality::Integral => {}
                Integrality::Absorbed => continue,
                Integrality::Cut(parameter) => {
                    new_parameters.extend(parameter);
                    continue;
                }
            }

            let vectors = tableau.rows()[..tableau.unknowns()]
                .iter()
                .map(|row| to_solution_vector(&row.constant))
                .collect::<ExploreResult<Vec<_>>>()?;
            return Ok(SolutionTree {
                new_parameters,
                body: TreeBody::Solution(vectors),
            });
        }
    }

    /// Handle the first fractional unknown, if any
    ///
    /// A fraction that the context already pins to an existing new
    /// parameter is folded into that parameter instead of being cut again.
    fn integrality_cut(
        &mut self,
        tableau: &mut Tableau,
        context: &mut Context,
        definitions: &mut Definitions,
    ) -> ExploreResult<Integrality> {
        let Some((i, remainder)) = tableau.first_remainder() else {
            return Ok(Integrality::Integral);
        };

        if remainder.is_constant() {
            trace!("constant cut on unknown {}", i);
            tableau.push_cut(i, &remainder, None);
            self.cuts += 1;
            return Ok(Integrality::Cut(None));
        }

        if let Some(rank) = definitions.find(&remainder, tableau.parameters()) {
            let column = self.parameters + rank;
            // remainder - divisor·q - 1 >= 0 is infeasible iff remainder = divisor·q
            let mut gap = remainder.numerator.clone();
            gap[column] -= &remainder.divisor;
            if let Some(constant) = gap.last_mut() {
                *constant -= 1;
            }
            if !context.with(gap).is_feasible(self.limit)? {
                trace!("unknown {} is integral through new parameter {}", i, rank);
                tableau.absorb_remainder(i, &remainder, column);
                return Ok(Integrality::Absorbed);
            }
            trace!("cut on unknown {} reusing new parameter {}", i, rank);
            tableau.push_cut(i, &remainder, Some(column));
            self.cuts += 1;
            return Ok(Integrality::Cut(None));
        }

        let rank = tableau.parameters() - self.parameters;
        let numerator = remainder.numerator.clone();
        let divisor = remainder.divisor.clone();
        tableau.add_parameter();
        context.add_parameter();
        let column = tableau.parameters() - 1;

        let mut padded = numerator.clone();
        padded.insert(column, BigInt::zero());
        let padded = Remainder {
            numerator: padded,
            divisor: divisor.clone(),
        };

        // divisor·q <= e <= divisor·q + divisor - 1
        let mut lower = padded.numerator.clone();
        lower[column] = -divisor.clone();
        let mut upper: Vec<BigInt> = lower.iter().map(|v| -v).collect();
        if let Some(constant) = upper.last_mut() {
            *constant += &divisor - BigInt::one();
        }
        context.push(lower);
        context.push(upper);

        trace!("cut on unknown {} with new parameter {}", i, rank);
        tableau.push_cut(i, &padded, Some(column));
        definitions.entries.push(Remainder {
            numerator: numerator.clone(),
            divisor: divisor.clone(),
        });
        self.cuts += 1;

        Ok(Integrality::Cut(Some(NewParameter {
            rank,
            numerator: to_i64_vec(&numerator)?,
            divisor: to_i64(&divisor)?,
        })))
    }

    fn sign(&self, constant: &ParamVector, context: &Context) -> ExploreResult<Sign> {
        let big = &constant[self.big_parameter];
        if big.is_positive() {
            return Ok(Sign::NonNegative);
        }
        if big.is_negative() {
            return Ok(Sign::Negative);
        }

        let row = integer_row(constant);
        let (value, coeffs) = match row.split_last() {
            Some(split) => split,
            None => return Ok(Sign::NonNegative),
        };
        if !value.is_negative() && coeffs.iter().all(|c| !c.is_negative()) {
            return Ok(Sign::NonNegative);
        }
        if value.is_negative() && coeffs.iter().all(|c| !c.is_positive()) {
            return Ok(Sign::Negative);
        }

        // e <= -1 somewhere?
        let mut below: Vec<BigInt> = row.iter().map(|v| -v).collect();
        if let Some(c) = below.last_mut() {
            *c -= 1;
        }
        if !context.with(below).is_feasible(self.limit)? {
            return Ok(Sign::NonNegative);
        }
        if !context.with(row.clone()).is_feasible(self.limit)? {
            return Ok(Sign::Negative);
        }
        Ok(Sign::Undetermined(row))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        trace!(
            "closing solver session after {} steps ({} pivots, {} cuts, {} branches)",
            self.steps,
            self.pivots,
            self.cuts,
            self.branches
        );
    }
}

impl Definitions {
    /// Rank of the new parameter defined by `remainder`, padded to `width`
    /// parameters
    fn find(&self, remainder: &Remainder, width: usize) -> Option<usize> {
        self.entries.iter().position(|entry| {
            if entry.divisor != remainder.divisor {
                return false;
            }
            let defined = entry.numerator.len() - 1;
            let (constant, params) = match remainder.numerator.split_last() {
                Some(split) => split,
                None => return false,
            };
            debug_assert_eq!(params.len(), width);
            params[..defined] == entry.numerator[..defined]
                && params[defined..].iter().all(|v| v.is_zero())
                && Some(constant) == entry.numerator.last()
        })
    }
}

/// Scale to integers and divide out the common factor
fn integer_row(constant: &ParamVector) -> Vec<BigInt> {
    let scale = constant
        .iter()
        .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
    let scale = BigRational::from_integer(scale);
    let row: Vec<BigInt> = constant.iter().map(|c| (c * &scale).to_integer()).collect();
    let common = row.iter().fold(BigInt::zero(), |acc, v| acc.gcd(v));
    if common.is_zero() || common.is_one() {
        return row;
    }
    row.into_iter().map(|v| v / &common).collect()
}

fn to_i64(value: &BigInt) -> ExploreResult<i64> {
    value
        .to_i64()
        .ok_or_else(|| ExploreError::solver(format!("coefficient {} overflows i64", value)))
}

fn to_i64_vec(values: &[BigInt]) -> ExploreResult<Vec<i64>> {
    values.iter().map(to_i64).collect()
}

fn to_solution_vector(constant: &ParamVector) -> ExploreResult<SolutionVector> {
    let coeffs = constant
        .iter()
        .map(|c| Ok(Rational64::new(to_i64(c.numer())?, to_i64(c.denom())?)))
        .collect::<ExploreResult<Vec<_>>>()?;
    Ok(SolutionVector { coeffs })
}
