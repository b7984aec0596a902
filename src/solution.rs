//! One evaluated projection vector and everything derived from it

use std::fmt;

use colored::Colorize;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::affine::AffineForm;
use crate::counting::{ParametricCount, PeCount, PointCounter};
use crate::error::{ExploreError, ExploreResult};
use crate::extract::{ScheduleSolution, ThroughputSolution};
use crate::geometry::{annihilates, is_unimodular, GeometryService};
use crate::matrix::{dot, IntMatrix};
use crate::polyhedron::Polyhedron;

/// Result record for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSolution {
    /// The sign that admitted a schedule
    pub projection_vector: Vec<i64>,
    /// Block pipelining period minus one, as a function of the parameters
    pub bpp: AffineForm,
    pub x1: Vec<AffineForm>,
    pub x2: Vec<AffineForm>,
    pub instance_bpp: i64,
    pub schedule: Vec<i64>,
    pub utilization: i64,
    pub latency: i64,
    /// `(D-1) x D`, rows orthogonal to the projection vector
    pub allocation: IntMatrix,
    pub network_sum_delays: i64,
    pub network_max_delay: i64,
    pub network_avg_delay: f64,
    pub network_max_length: i64,
    pub network_avg_length: f64,
    /// Parametric PE count, `None` until counted
    pub pe_count: Option<PeCount>,
    pub instance_pe_count: i64,
    pub parameter_names: Vec<String>,
}

impl ProjectionSolution {
    pub fn new(
        projection_vector: Vec<i64>,
        throughput: ThroughputSolution,
        schedule: ScheduleSolution,
        parameter_names: Vec<String>,
    ) -> Self {
        let d = projection_vector.len();
        Self {
            projection_vector,
            bpp: throughput.bpp,
            x1: throughput.x1,
            x2: throughput.x2,
            instance_bpp: 0,
            schedule: schedule.schedule,
            utilization: schedule.utilization,
            latency: schedule.latency,
            allocation: IntMatrix::zeros(d.saturating_sub(1), d),
            network_sum_delays: 0,
            network_max_delay: 0,
            network_avg_delay: 0.0,
            network_max_length: 0,
            network_avg_length: 0.0,
            pe_count: None,
            instance_pe_count: 0,
            parameter_names,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.projection_vector.len()
    }

    /// `bpp` at the instantiation, rounded up
    pub fn compute_instance_bpp(&mut self, instantiation: &[i64]) {
        self.instance_bpp = self.bpp.evaluate_ceil(instantiation);
    }

    /// Per-dependency delay `-(l·d)`: sum, maximum and average
    pub fn compute_schedule_network(&mut self, dependencies: &IntMatrix) {
        let delays: Vec<i64> = dependencies
            .rows()
            .map(|d| -dot(&self.schedule, d))
            .collect();
        self.network_sum_delays = delays.iter().sum();
        self.network_max_delay = delays.iter().copied().fold(0, i64::max);
        self.network_avg_delay = average(self.network_sum_delays, delays.len());
    }

    /// Allocation rows: an integer basis of the projection vector's kernel
    pub fn compute_allocation<G: GeometryService>(&mut self, geometry: &G) -> ExploreResult<()> {
        let d = self.dimensions();
        let basis = geometry.nullspace(&self.projection_vector)?;
        if basis.nrows() != d || basis.ncols() + 1 != d {
            return Err(ExploreError::violation(format!(
                "nullspace basis of {:?} is {}x{}, expected {}x{}",
                self.projection_vector,
                basis.nrows(),
                basis.ncols(),
                d,
                d.saturating_sub(1)
            )));
        }
        let allocation = basis.transpose();
        if !annihilates(&allocation, &self.projection_vector) {
            return Err(ExploreError::violation(format!(
                "allocation {} is not orthogonal to {:?}",
                allocation, self.projection_vector
            )));
        }
        self.allocation = allocation;
        Ok(())
    }

    /// Link length `|a·d|` over every allocation row and dependency
    pub fn compute_interconnection_network(&mut self, dependencies: &IntMatrix) {
        let mut sum = 0;
        let mut max = 0;
        for d in dependencies.rows() {
            for a in self.allocation.rows() {
                let length = dot(a, d).abs();
                sum += length;
                max = max.max(length);
            }
        }
        self.network_max_length = max;
        self.network_avg_length = average(sum, dependencies.nrows());
    }

    /// The change of basis: allocation rows, schedule row, identity on
    /// parameters and constant
    pub fn change_of_basis(&self, parameters: usize) -> IntMatrix {
        let d = self.dimensions();
        let n = d + parameters + 1;
        let mut cob = IntMatrix::identity(n);
        for (i, row) in self.allocation.rows().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                cob.set(i, j, v);
            }
        }
        for (j, &v) in self.schedule.iter().enumerate() {
            cob.set(d - 1, j, v);
        }
        cob
    }

    /// Count processor coordinates of the domain in the new basis
    pub fn count_pes<G, C>(
        &mut self,
        domain: &Polyhedron,
        instantiation: &[i64],
        geometry: &G,
        counter: &C,
    ) -> ExploreResult<()>
    where
        G: GeometryService,
        C: PointCounter<Count = PeCount>,
    {
        let cob = self.change_of_basis(domain.parameters);
        if !is_unimodular(&cob) {
            trace!("change of basis {} is not unimodular", cob);
        }
        let inverse = geometry.inverse(&cob)?;
        let transformed = geometry.preimage(domain, &inverse)?;
        let count = counter.count(&transformed, 1, domain.parameters)?;
        self.instance_pe_count = count.evaluate(instantiation)?;
        self.pe_count = Some(count);
        debug!(
            "{:?}: {} PEs at {:?}",
            self.projection_vector, self.instance_pe_count, instantiation
        );
        Ok(())
    }

    /// PE count at another instantiation of the parameters
    pub fn pe_count_at(&self, instantiation: &[i64]) -> ExploreResult<i64> {
        match &self.pe_count {
            Some(count) => count.evaluate(instantiation),
            None => Err(ExploreError::geometry(format!(
                "PEs of {:?} have not been counted",
                self.projection_vector
            ))),
        }
    }

    /// PE count formula, empty until counted
    pub fn pe_formula(&self) -> String {
        self.pe_count
            .as_ref()
            .map(|count| count.render(&self.parameter_names))
            .unwrap_or_default()
    }

    /// BPP formula as the exploration report prints it
    pub fn bpp_formula(&self) -> String {
        format!("{} + 1", self.bpp.format_with_names(&self.parameter_names))
    }

    /// One CSV-style report line
    pub fn to_csv_line(&self) -> String {
        format!(
            "\"{}\",\"{}\",\"{}\",{}, \"{}\",{},{}, {}, {}, {}, \"{}\",{}, {}",
            spaced(&self.projection_vector),
            self.bpp_formula(),
            self.pe_formula(),
            self.instance_pe_count,
            spaced(&self.schedule),
            self.utilization,
            self.network_sum_delays,
            format_general(self.network_avg_delay),
            self.network_max_delay,
            self.latency,
            self.allocation,
            format_general(self.network_avg_length),
            self.network_max_length
        )
    }

    /// Colored multi-line summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {}\n",
            "Projection vector:".bold(),
            spaced(&self.projection_vector).cyan()
        ));
        out.push_str(&format!(
            "  BPP:          {} (instance {})\n",
            self.bpp_formula(),
            (self.instance_bpp + 1).to_string().green()
        ));
        out.push_str(&format!(
            "  PEs:          {} ({})\n",
            self.instance_pe_count.to_string().green(),
            self.pe_formula().dimmed()
        ));
        out.push_str(&format!("  Schedule:     [{}]\n", spaced(&self.schedule)));
        out.push_str(&format!(
            "  Utilization:  {}  Latency: {}\n",
            self.utilization, self.latency
        ));
        out.push_str(&format!(
            "  Delays:       sum {} avg {:.2} max {}\n",
            self.network_sum_delays, self.network_avg_delay, self.network_max_delay
        ));
        out.push_str(&format!("  Allocation:   {}\n", self.allocation));
        out.push_str(&format!(
            "  Links:        avg {:.2} max {}\n",
            self.network_avg_length, self.network_max_length
        ));
        out
    }
}

impl fmt::Display for ProjectionSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_csv_line())
    }
}

fn spaced(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| format!("{} ", v))
        .collect::<String>()
}

/// Six significant digits without trailing zeros, the way C streams print
/// floating point values by default
fn format_general(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let scientific = format!("{:.5e}", value);
    let Some((mantissa, exponent)) = scientific
        .split_once('e')
        .and_then(|(m, e)| e.parse::<i32>().ok().map(|e| (m.to_string(), e)))
    else {
        return value.to_string();
    };
    if (-4..6).contains(&exponent) {
        trim_fraction(format!("{:.*}", (5 - exponent) as usize, value))
    } else {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    }
}

fn trim_fraction(digits: String) -> String {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        digits
    }
}

fn average(sum: i64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
