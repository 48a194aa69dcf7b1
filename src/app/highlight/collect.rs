use std::collections::{HashSet, VecDeque};

const NEIGHBORHOOD_NODE_LIMIT: usize = 280;

/// Breadth-first walk up to `max_depth` hops over `(neighbor, edge)` lists,
/// recording every node and edge it touches.
pub(super) fn collect_neighborhood(
    adjacency: &[Vec<(usize, usize)>],
    start: usize,
    max_depth: usize,
    nodes: &mut HashSet<usize>,
    edges: &mut HashSet<usize>,
) {
    if start >= adjacency.len() {
        return;
    }

    nodes.insert(start);
    let mut queue = VecDeque::from([(start, 0usize)]);
    let mut visited = HashSet::from([start]);

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        for &(next, edge) in &adjacency[node] {
            edges.insert(edge);
            nodes.insert(next);

            if nodes.len() >= NEIGHBORHOOD_NODE_LIMIT {
                return;
            }

            if visited.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }
}
