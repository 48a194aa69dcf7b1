use std::collections::HashSet;

mod collect;

use self::collect::collect_neighborhood;
use super::filter::DisplayGraph;
use super::model::GraphModel;

/// Nodes and edges (model edge indices) lit up around the hovered node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Highlight {
    pub nodes: HashSet<usize>,
    pub edges: HashSet<usize>,
}

impl Highlight {
    pub fn contains_node(&self, index: usize) -> bool {
        self.nodes.contains(&index)
    }

    pub fn contains_edge(&self, index: usize) -> bool {
        self.edges.contains(&index)
    }
}

/// `(neighbor, model edge index)` lists over the displayed edges only.
pub fn display_adjacency(model: &GraphModel, display: &DisplayGraph) -> Vec<Vec<(usize, usize)>> {
    let mut adjacency = vec![Vec::new(); model.len()];
    for &edge_index in &display.edges {
        let Some(edge) = model.edges().get(edge_index) else {
            continue;
        };
        adjacency[edge.source].push((edge.target, edge_index));
        if edge.source != edge.target {
            adjacency[edge.target].push((edge.source, edge_index));
        }
    }
    adjacency
}

pub fn neighborhood(adjacency: &[Vec<(usize, usize)>], start: usize, depth: usize) -> Highlight {
    let mut highlight = Highlight::default();
    collect_neighborhood(
        adjacency,
        start,
        depth.clamp(1, 3),
        &mut highlight.nodes,
        &mut highlight.edges,
    );
    highlight
}

/// The node plus its one-hop neighbors over the full edge set.
pub fn isolation_set(model: &GraphModel, index: usize) -> HashSet<usize> {
    let mut kept = HashSet::from([index]);
    kept.extend(model.neighbors(index).iter().copied());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::filter::{Density, DisplayFilter};
    use crate::app::model::GroupingConfig;

    fn fallback_display() -> (GraphModel, DisplayGraph) {
        let model = GraphModel::fallback(GroupingConfig::default());
        let filter = DisplayFilter {
            density: Density::Dense,
            ..Default::default()
        };
        let display = DisplayGraph::build(&model, &filter, None);
        (model, display)
    }

    #[test]
    fn depth_one_is_the_connected_set() {
        let (model, display) = fallback_display();
        let adjacency = display_adjacency(&model, &display);
        let n1 = model.index_of("n1").unwrap();

        let highlight = neighborhood(&adjacency, n1, 1);
        let ids = highlight
            .nodes
            .iter()
            .map(|&index| model.nodes()[index].id.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(ids, HashSet::from(["n1", "n2", "n4", "n5"]));
        assert_eq!(highlight.edges, HashSet::from([0, 1, 2]));
    }

    #[test]
    fn deeper_walks_reach_further() {
        let (model, display) = fallback_display();
        let adjacency = display_adjacency(&model, &display);
        let n6 = model.index_of("n6").unwrap();

        assert_eq!(neighborhood(&adjacency, n6, 1).nodes.len(), 2);
        assert_eq!(neighborhood(&adjacency, n6, 2).nodes.len(), 3);
        assert_eq!(neighborhood(&adjacency, n6, 3).nodes.len(), 5);
        // Depth is capped at three hops.
        assert_eq!(neighborhood(&adjacency, n6, 9).nodes.len(), 5);
    }

    #[test]
    fn sparse_display_limits_the_walk() {
        let model = GraphModel::fallback(GroupingConfig::default());
        let display = DisplayGraph::build(&model, &DisplayFilter::default(), None);
        let adjacency = display_adjacency(&model, &display);
        let n2 = model.index_of("n2").unwrap();
        // Sparse keeps n1-n2, n1-n5, n3-n4.
        assert_eq!(neighborhood(&adjacency, n2, 3).nodes.len(), 3);
    }

    #[test]
    fn isolation_uses_full_adjacency() {
        let model = GraphModel::fallback(GroupingConfig::default());
        let n4 = model.index_of("n4").unwrap();
        let kept = isolation_set(&model, n4);
        assert_eq!(kept.len(), 3);
        assert!(kept.contains(&model.index_of("n3").unwrap()));
    }
}
