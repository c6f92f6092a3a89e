//! Stable topological ordering for unit precondition graphs.

use std::collections::BTreeSet;

/// Stable Kahn's algorithm over `count` nodes with `edges` running from
/// precondition to dependent.
///
/// Among nodes with no remaining unmet precondition, the lowest index is
/// scheduled first.  Indices are contribution order, so two runs over
/// unchanged input produce identical orderings.
///
/// Returns the schedule, or the indices of every node that could not be
/// scheduled (the cycle members plus anything downstream of them), sorted.
pub(crate) fn stable_topo(count: usize, edges: &[(usize, usize)]) -> Result<Vec<usize>, Vec<usize>> {
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(from, to) in edges {
        if let Some(d) = in_degree.get_mut(to) {
            *d += 1;
        }
        if let Some(children) = dependents.get_mut(from) {
            children.push(to);
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| (d == 0).then_some(i))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        if let Some(children) = dependents.get(idx) {
            for &child in children {
                if let Some(d) = in_degree.get_mut(child) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(child);
                    }
                }
            }
        }
    }

    if order.len() == count {
        Ok(order)
    } else {
        let scheduled: BTreeSet<usize> = order.into_iter().collect();
        Err((0..count).filter(|i| !scheduled.contains(i)).collect())
    }
}
