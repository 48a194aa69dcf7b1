use std::collections::{BTreeSet, HashSet};

use super::model::{GraphModel, Relation};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Density {
    #[default]
    Sparse,
    Dense,
}

impl Density {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Dense => "dense",
        }
    }

    fn keeps(self, edge_index: usize) -> bool {
        match self {
            Self::Dense => true,
            Self::Sparse => edge_index % 2 == 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeMode {
    #[default]
    All,
    SharedAuthorOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationToggles {
    pub author: bool,
    pub venue: bool,
    pub year: bool,
}

impl Default for RelationToggles {
    fn default() -> Self {
        Self {
            author: true,
            venue: true,
            year: true,
        }
    }
}

impl RelationToggles {
    pub fn allows(self, relation: Relation) -> bool {
        match relation {
            Relation::Author => self.author,
            Relation::Venue => self.venue,
            Relation::Year => self.year,
        }
    }
}

/// Display-time edge/node filtering. Never touches the model: degree and
/// grouping stay as computed at ingestion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayFilter {
    pub density: Density,
    pub edge_mode: EdgeMode,
    pub relations: RelationToggles,
    /// `None` shows every source.
    pub active_sources: Option<BTreeSet<String>>,
}

impl DisplayFilter {
    pub fn source_active(&self, source: &str) -> bool {
        self.active_sources
            .as_ref()
            .is_none_or(|active| active.contains(source))
    }

    /// Flips one source. Turning off the last active source resets the filter
    /// to show everything again.
    pub fn toggle_source(&mut self, source: &str, all_sources: &BTreeSet<String>) {
        let mut active = self
            .active_sources
            .take()
            .unwrap_or_else(|| all_sources.clone());
        if !active.remove(source) {
            active.insert(source.to_owned());
        }

        if active.is_empty() || active == *all_sources {
            self.active_sources = None;
        } else {
            self.active_sources = Some(active);
        }
    }
}

/// Snapshot of what is currently shown: indices into `GraphModel::edges()`
/// plus per-node visibility and degree over the shown edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayGraph {
    pub edges: Vec<usize>,
    pub node_visible: Vec<bool>,
    pub display_degree: Vec<usize>,
}

impl DisplayGraph {
    pub fn build(model: &GraphModel, filter: &DisplayFilter, isolation: Option<&HashSet<usize>>) -> Self {
        let node_visible = model
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                filter.source_active(node.meta.source_key())
                    && isolation.is_none_or(|kept| kept.contains(&index))
            })
            .collect::<Vec<_>>();

        let mut display_degree = vec![0usize; model.len()];
        let mut edges = Vec::new();
        for (index, edge) in model.edges().iter().enumerate() {
            if !filter.density.keeps(index) {
                continue;
            }
            if !node_visible[edge.source] || !node_visible[edge.target] {
                continue;
            }

            let relation = edge.relation_kind();
            if filter.edge_mode == EdgeMode::SharedAuthorOnly && relation != Some(Relation::Author) {
                continue;
            }
            if relation.is_some_and(|relation| !filter.relations.allows(relation)) {
                continue;
            }

            display_degree[edge.source] += 1;
            display_degree[edge.target] += 1;
            edges.push(index);
        }

        Self {
            edges,
            node_visible,
            display_degree,
        }
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.node_visible.get(index).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.node_visible.iter().filter(|visible| **visible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::model::{GroupingConfig, NodeGroup};
    use crate::papers::{RawEdge, RawNode};

    fn ten_edge_model() -> GraphModel {
        let nodes = (0..6)
            .map(|i| RawNode::new(format!("p{i}"), format!("Paper {i}")))
            .collect::<Vec<_>>();
        let pairs = [
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (0, 5),
            (1, 2),
            (2, 3),
            (3, 4),
            (4, 5),
            (5, 1),
        ];
        let edges = pairs
            .iter()
            .map(|(a, b)| RawEdge::new(format!("p{a}"), format!("p{b}")))
            .collect::<Vec<_>>();
        GraphModel::normalize(&nodes, &edges, GroupingConfig::default())
    }

    #[test]
    fn sparse_keeps_even_indices_and_dense_keeps_all() {
        let model = ten_edge_model();
        assert_eq!(model.edges().len(), 10);
        let groups_before = model.nodes().iter().map(|node| node.group).collect::<Vec<_>>();
        let degrees_before = model.nodes().iter().map(|node| node.degree).collect::<Vec<_>>();

        let sparse = DisplayGraph::build(&model, &DisplayFilter::default(), None);
        assert_eq!(sparse.edges, vec![0, 2, 4, 6, 8]);

        let dense = DisplayFilter {
            density: Density::Dense,
            ..Default::default()
        };
        let dense = DisplayGraph::build(&model, &dense, None);
        assert_eq!(dense.edges.len(), 10);

        assert_eq!(model.node(0).unwrap().degree, 5);
        assert_eq!(model.node(0).unwrap().group, NodeGroup::Core);
        assert_eq!(sparse.display_degree[0], 3);
        assert_eq!(
            model.nodes().iter().map(|node| node.group).collect::<Vec<_>>(),
            groups_before
        );
        assert_eq!(
            model.nodes().iter().map(|node| node.degree).collect::<Vec<_>>(),
            degrees_before
        );
    }

    #[test]
    fn relation_filters_hide_only_matching_edges() {
        let nodes = vec![RawNode::new("a", "A"), RawNode::new("b", "B"), RawNode::new("c", "C")];
        let edges = vec![
            RawEdge::new("a", "b").with_relation("author"),
            RawEdge::new("b", "c").with_relation("venue"),
            RawEdge::new("a", "c"),
        ];
        let model = GraphModel::normalize(&nodes, &edges, GroupingConfig::default());

        let mut filter = DisplayFilter {
            density: Density::Dense,
            ..Default::default()
        };
        filter.relations.venue = false;
        assert_eq!(DisplayGraph::build(&model, &filter, None).edges, vec![0, 2]);

        filter.relations = RelationToggles::default();
        filter.edge_mode = EdgeMode::SharedAuthorOnly;
        assert_eq!(DisplayGraph::build(&model, &filter, None).edges, vec![0]);
    }

    #[test]
    fn source_filter_hides_nodes_and_their_edges() {
        let mut a = RawNode::new("a", "A");
        a.source = Some("arXiv".into());
        let mut b = RawNode::new("b", "B");
        b.source = Some("OpenAlex".into());
        let c = RawNode::new("c", "C");
        let edges = vec![RawEdge::new("a", "b"), RawEdge::new("b", "c"), RawEdge::new("a", "c")];
        let model = GraphModel::normalize(&[a, b, c], &edges, GroupingConfig::default());
        let all = model.sources();
        assert_eq!(all.len(), 3);

        let mut filter = DisplayFilter {
            density: Density::Dense,
            ..Default::default()
        };
        filter.toggle_source("OpenAlex", &all);
        let display = DisplayGraph::build(&model, &filter, None);
        assert_eq!(display.node_visible, vec![true, false, true]);
        assert_eq!(display.edges, vec![2]);

        filter.toggle_source("arXiv", &all);
        filter.toggle_source("Unknown", &all);
        assert!(filter.active_sources.is_none());
    }

    #[test]
    fn isolation_restricts_to_given_nodes() {
        let model = ten_edge_model();
        let kept = HashSet::from([0, 1, 2]);
        let filter = DisplayFilter {
            density: Density::Dense,
            ..Default::default()
        };
        let display = DisplayGraph::build(&model, &filter, Some(&kept));
        assert_eq!(display.visible_count(), 3);
        assert_eq!(display.edges, vec![0, 1, 5]);
    }
}
