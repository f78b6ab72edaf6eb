// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-sample correlation and delay-referencing.
//!
//! `correlate` multiplies one node's sample at `t1` by the complex conjugate
//! of the other's at `t2`; `t1`/`t2` differ from the nominal sample time `t`
//! only when delay referencing is active. Delay referencing is resolved by
//! finding the baseline (among all pairs currently registered) with the
//! largest absolute delay toward the same target, and re-deriving each
//! node's offset from its own baseline to that farthest node.

use itertools::Itertools;
use num_complex::Complex64;

use crate::baseline::{Baseline, ReferenceMode};
use crate::node::SampleStream;
use crate::node_registry::NodeRegistry;

/// Correlate a single sample pair: `s1(t1) * conj(s2(t2))`.
pub fn correlate(s1: &SampleStream, t1: f64, s2: &SampleStream, t2: f64) -> Complex64 {
    Complex64::new(s1.sample_at(t1), 0.0) * Complex64::new(s2.sample_at(t2), 0.0).conj()
}

/// The per-node time offsets to apply before sampling, derived by finding
/// the node (besides this baseline's own two) whose baseline to either
/// endpoint has the largest absolute geometric delay toward `(ra, dec)`, and
/// re-deriving each endpoint's delay against that farthest node.
///
/// Returns `(0.0, 0.0)` when fewer than 3 live nodes exist (no third node to
/// reference against) or when neither re-derived baseline exists.
#[allow(clippy::too_many_arguments)]
pub fn delay_referenced_offsets(
    baseline: &Baseline,
    nodes: &NodeRegistry,
    t_j2000: f64,
    ra: f64,
    dec: f64,
    reference: ReferenceMode,
) -> (f64, f64) {
    let mut live: Vec<(&str, usize)> = nodes.iter().map(|(n, i, _)| (n, i)).collect();
    live.sort_by_key(|&(_, i)| i);

    let mut max_delay = 0.0_f64;
    let mut farthest: Option<(&str, usize)> = None;
    // Tie-break: iterate over all distinct pairs (x, y) with x < y and
    // retain the pair/endpoint with maximum |tau|. `live` is already
    // index-sorted, so `tuple_combinations` yields exactly that pair set in
    // order.
    for ((n1, i1), (n2, i2)) in live.iter().copied().tuple_combinations() {
        let node1 = nodes.at(i1).expect("index from iter() is live");
        let node2 = nodes.at(i2).expect("index from iter() is live");
        let pair = Baseline::new(n1, i1, n2, i2);
        let Some(uvw) = pair.project(
            t_j2000,
            ra,
            dec,
            node1.location.ecef(),
            node2.location.ecef(),
            reference,
            node1.stream.wavelength.max(f64::MIN_POSITIVE),
        ) else {
            continue;
        };
        if uvw.tau.abs() > max_delay {
            max_delay = uvw.tau.abs();
            farthest = Some(if uvw.tau < 0.0 { (n1, i1) } else { (n2, i2) });
        }
    }

    let Some((far_name, far_index)) = farthest else {
        return (0.0, 0.0);
    };
    if far_index == baseline.n1_index || far_index == baseline.n2_index {
        return (0.0, 0.0);
    }

    let far_node = nodes.at(far_index).expect("farthest index is live");
    let mut offset_for = |name: &str, index: usize| -> f64 {
        if index == far_index {
            return 0.0;
        }
        let node = nodes.at(index).expect("endpoint index is live");
        let pair = Baseline::new(name, index, far_name, far_index);
        pair.project(
            t_j2000,
            ra,
            dec,
            node.location.ecef(),
            far_node.location.ecef(),
            reference,
            node.stream.wavelength.max(f64::MIN_POSITIVE),
        )
        .map(|uvw| uvw.tau)
        .unwrap_or(0.0)
    };

    let offset1 = offset_for(&baseline.n1_name, baseline.n1_index);
    let offset2 = offset_for(&baseline.n2_name, baseline.n2_index);
    (offset1, offset2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Location;

    fn registry_with_collinear_nodes(n: usize) -> NodeRegistry {
        let mut reg = NodeRegistry::new();
        for i in 0..n {
            let stream = SampleStream::new(vec![1.0; 8], 0.0, 1.0, 1.0);
            reg.add(&format!("node{i}"), stream, (i as f64 * 1000.0, 0.0, 0.0), false)
                .unwrap();
        }
        reg
    }

    #[test]
    fn correlate_multiplies_and_conjugates() {
        let s1 = SampleStream::new(vec![2.0], 0.0, 1.0, 1.0);
        let s2 = SampleStream::new(vec![3.0], 0.0, 1.0, 1.0);
        let v = correlate(&s1, 0.0, &s2, 0.0);
        assert_eq!(v, Complex64::new(6.0, 0.0));
    }

    #[test]
    fn too_few_nodes_yields_zero_offsets() {
        let reg = registry_with_collinear_nodes(2);
        let baseline = Baseline::new("node0", 0, "node1", 1);
        let (o1, o2) =
            delay_referenced_offsets(&baseline, &reg, 0.0, 0.1, 0.4, ReferenceMode::Relative);
        assert_eq!((o1, o2), (0.0, 0.0));
    }

    #[test]
    fn third_node_present_yields_some_offset_when_visible() {
        let reg = registry_with_collinear_nodes(3);
        // Pick a target that's above the horizon for at least some pairs at
        // these equatorial, geocentric-only stations.
        let baseline = Baseline::new("node0", 0, "node1", 1);
        let (o1, o2) =
            delay_referenced_offsets(&baseline, &reg, 0.0, 0.0, 0.0, ReferenceMode::Relative);
        // With purely geocentric (non-geographic) locations the horizontal
        // frame is degenerate for every node's own lat/lon (all near the
        // equator/prime-meridian chord), so we only assert this doesn't
        // panic and returns finite offsets.
        assert!(o1.is_finite());
        assert!(o2.is_finite());
        let _ = Location::Geocentric;
    }
}
