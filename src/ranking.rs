//! Ordering and filtering of explored solutions

use std::cmp::Ordering;

use crate::solution::ProjectionSolution;

/// Best first: smallest instance BPP, then the most PEs, utilization,
/// latency, max link length and average link length.
pub fn compare(a: &ProjectionSolution, b: &ProjectionSolution) -> Ordering {
    a.instance_bpp
        .cmp(&b.instance_bpp)
        .then_with(|| b.instance_pe_count.cmp(&a.instance_pe_count))
        .then_with(|| b.utilization.cmp(&a.utilization))
        .then_with(|| b.latency.cmp(&a.latency))
        .then_with(|| b.network_max_length.cmp(&a.network_max_length))
        .then_with(|| b.network_avg_length.total_cmp(&a.network_avg_length))
}

/// Sort in place; equal solutions keep their exploration order
pub fn sort(results: &mut [ProjectionSolution]) {
    results.sort_by(compare);
}

/// Sorted solutions whose utilization does not exceed `threshold`
pub fn rank(mut results: Vec<ProjectionSolution>, threshold: i64) -> Vec<ProjectionSolution> {
    sort(&mut results);
    results.retain(|s| s.utilization <= threshold);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::AffineForm;
    use crate::extract::{ScheduleSolution, ThroughputSolution};
    use pretty_assertions::assert_eq;

    fn solution(pv: Vec<i64>, bpp: i64, pes: i64, utilization: i64) -> ProjectionSolution {
        let mut s = ProjectionSolution::new(
            pv,
            ThroughputSolution {
                bpp: AffineForm::zero(0),
                x1: vec![],
                x2: vec![],
            },
            ScheduleSolution {
                schedule: vec![0, 0],
                utilization,
                latency: 0,
            },
            vec![],
        );
        s.instance_bpp = bpp;
        s.instance_pe_count = pes;
        s
    }

    fn vectors(results: &[ProjectionSolution]) -> Vec<Vec<i64>> {
        results.iter().map(|s| s.projection_vector.clone()).collect()
    }

    #[test]
    fn test_bpp_then_pes() {
        let ranked = rank(
            vec![
                solution(vec![0, 1], 4, 2, 1),
                solution(vec![1, 0], 2, 2, 1),
                solution(vec![1, 1], 2, 5, 1),
            ],
            100,
        );
        assert_eq!(vectors(&ranked), vec![vec![1, 1], vec![1, 0], vec![0, 1]]);
    }

    #[test]
    fn test_ties_keep_exploration_order() {
        let ranked = rank(
            vec![
                solution(vec![0, 1], 1, 2, 1),
                solution(vec![1, -1], 1, 2, 1),
                solution(vec![1, 0], 1, 2, 1),
            ],
            100,
        );
        assert_eq!(vectors(&ranked), vec![vec![0, 1], vec![1, -1], vec![1, 0]]);
    }

    #[test]
    fn test_sorting_ranked_results_keeps_their_order() {
        let mut results = vec![
            solution(vec![0, 1], 3, 2, 1),
            solution(vec![1, -1], 1, 2, 1),
            solution(vec![1, 0], 3, 2, 1),
            solution(vec![1, 1], 1, 2, 1),
            solution(vec![2, 1], 1, 4, 1),
        ];
        sort(&mut results);
        let once = vectors(&results);
        assert_eq!(
            once,
            vec![vec![2, 1], vec![1, -1], vec![1, 1], vec![0, 1], vec![1, 0]]
        );
        sort(&mut results);
        assert_eq!(vectors(&results), once);
    }

    #[test]
    fn test_link_length_breaks_ties() {
        let mut short = solution(vec![0, 1], 1, 2, 1);
        short.network_avg_length = 0.5;
        let mut long = solution(vec![1, 0], 1, 2, 1);
        long.network_avg_length = 1.5;
        assert_eq!(compare(&long, &short), Ordering::Less);
    }

    #[test]
    fn test_threshold_filters_utilization() {
        let ranked = rank(
            vec![
                solution(vec![0, 1], 1, 2, 3),
                solution(vec![1, 0], 1, 2, 2),
            ],
            2,
        );
        assert_eq!(vectors(&ranked), vec![vec![1, 0]]);
    }
}
