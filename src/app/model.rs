use std::collections::{BTreeSet, HashMap, HashSet};

use crate::papers::{RawEdge, RawNode};
use crate::util::placeholder_label;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeGroup {
    Core,
    Related,
    Peripheral,
}

impl NodeGroup {
    pub const ALL: [Self; 3] = [Self::Core, Self::Related, Self::Peripheral];

    pub fn label(self) -> &'static str {
        match self {
            Self::Core => "Focus paper",
            Self::Related => "Strongly connected",
            Self::Peripheral => "Peripheral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupingConfig {
    /// Degree percentile at or above which a non-core node is `Related`.
    pub related_percentile: f32,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            related_percentile: 0.7,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClusterMode {
    None,
    #[default]
    Source,
    Venue,
}

impl ClusterMode {
    pub const ALL: [Self; 3] = [Self::Source, Self::Venue, Self::None];

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Source => "By source",
            Self::Venue => "By venue",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Author,
    Venue,
    Year,
}

impl Relation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "author" | "shared_author" => Some(Self::Author),
            "venue" | "same_venue" => Some(Self::Venue),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Venue => "venue",
            Self::Year => "year",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaperMeta {
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub authors: Vec<String>,
    pub source: Option<String>,
    pub url: Option<String>,
}

impl PaperMeta {
    pub fn source_key(&self) -> &str {
        self.source.as_deref().filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_KEY)
    }

    pub fn venue_key(&self) -> &str {
        self.venue.as_deref().filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_KEY)
    }
}

pub const UNKNOWN_KEY: &str = "Unknown";

#[derive(Clone, Debug)]
pub struct PaperNode {
    pub id: String,
    pub label: String,
    pub kind: Option<String>,
    pub degree: usize,
    pub group: NodeGroup,
    pub meta: PaperMeta,
}

impl PaperNode {
    pub fn cluster_key(&self, mode: ClusterMode) -> &str {
        match mode {
            ClusterMode::None => "all",
            ClusterMode::Source => self.meta.source_key(),
            ClusterMode::Venue => self.meta.venue_key(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaperEdge {
    pub source: usize,
    pub target: usize,
    pub weight: Option<f32>,
    /// Relation as supplied, or derived from endpoint metadata.
    pub relation: Option<String>,
}

impl PaperEdge {
    pub fn weight_or_default(&self) -> f32 {
        self.weight.unwrap_or(1.0)
    }

    pub fn relation_kind(&self) -> Option<Relation> {
        self.relation.as_deref().and_then(Relation::parse)
    }

    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added_nodes: usize,
    pub added_edges: usize,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.added_nodes == 0 && self.added_edges == 0
    }
}

/// Normalized paper graph: dangling edges dropped, degree and group computed
/// once from the full edge set, adjacency indexed by node position.
#[derive(Clone, Debug)]
pub struct GraphModel {
    nodes: Vec<PaperNode>,
    edges: Vec<PaperEdge>,
    index_by_id: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    core_index: Option<usize>,
    raw_nodes: Vec<RawNode>,
    raw_edges: Vec<RawEdge>,
    dropped_edges: usize,
    is_fallback: bool,
}

impl GraphModel {
    pub fn normalize(raw_nodes: &[RawNode], raw_edges: &[RawEdge], grouping: GroupingConfig) -> Self {
        if raw_nodes.is_empty() {
            return Self::fallback(grouping);
        }

        Self::build(raw_nodes.to_vec(), raw_edges.to_vec(), grouping, false)
    }

    /// The sample graph shown when the host has no real data yet.
    pub fn fallback(grouping: GroupingConfig) -> Self {
        let nodes = [
            ("n1", "Graph Neural Networks"),
            ("n2", "RAG Pipelines"),
            ("n3", "Topic Modeling"),
            ("n4", "Summarization"),
            ("n5", "Citation Graphs"),
            ("n6", "LLM Alignment"),
        ]
        .into_iter()
        .map(|(id, label)| RawNode::new(id, label))
        .collect();
        let edges = [("n1", "n2"), ("n1", "n4"), ("n1", "n5"), ("n2", "n6"), ("n3", "n4")]
            .into_iter()
            .map(|(from, to)| RawEdge::new(from, to))
            .collect();

        Self::build(nodes, edges, grouping, true)
    }

    fn build(
        raw_nodes: Vec<RawNode>,
        raw_edges: Vec<RawEdge>,
        grouping: GroupingConfig,
        is_fallback: bool,
    ) -> Self {
        let mut index_by_id = HashMap::with_capacity(raw_nodes.len());
        let mut kept_nodes = Vec::with_capacity(raw_nodes.len());
        for raw in &raw_nodes {
            if raw.id.is_empty() || index_by_id.contains_key(&raw.id) {
                continue;
            }
            index_by_id.insert(raw.id.clone(), kept_nodes.len());
            kept_nodes.push(raw);
        }

        let mut edges = Vec::with_capacity(raw_edges.len());
        let mut kept_edges = Vec::with_capacity(raw_edges.len());
        let mut dropped_edges = 0usize;
        for raw in raw_edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&raw.from), index_by_id.get(&raw.to))
            else {
                dropped_edges += 1;
                continue;
            };

            let relation = raw
                .relation
                .clone()
                .filter(|relation| !relation.is_empty())
                .or_else(|| {
                    derive_relation(kept_nodes[source], kept_nodes[target])
                        .map(|relation| relation.label().to_owned())
                });
            edges.push(PaperEdge {
                source,
                target,
                weight: raw.weight,
                relation,
            });
            kept_edges.push(raw);
        }

        let mut degrees = vec![0usize; kept_nodes.len()];
        let mut adjacency = vec![Vec::new(); kept_nodes.len()];
        for edge in &edges {
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
            adjacency[edge.source].push(edge.target);
            adjacency[edge.target].push(edge.source);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        let groups = assign_groups(&kept_nodes, &degrees, grouping);
        let core_index = groups.iter().position(|group| *group == NodeGroup::Core);

        let nodes = kept_nodes
            .iter()
            .zip(degrees.iter())
            .zip(groups.iter())
            .map(|((raw, &degree), &group)| PaperNode {
                id: raw.id.clone(),
                label: if raw.label.trim().is_empty() {
                    raw.id.clone()
                } else {
                    raw.label.clone()
                },
                kind: raw.kind.clone(),
                degree,
                group,
                meta: PaperMeta {
                    year: raw.year,
                    venue: raw.venue.clone(),
                    authors: raw.authors.clone(),
                    source: raw.source.clone(),
                    url: raw.url.clone(),
                },
            })
            .collect::<Vec<_>>();

        if dropped_edges > 0 {
            tracing::debug!(dropped_edges, "dropped edges with unknown endpoints");
        }

        Self {
            nodes,
            edges,
            index_by_id,
            adjacency,
            core_index,
            raw_nodes,
            raw_edges: kept_edges,
            dropped_edges,
            is_fallback,
        }
    }

    /// Additive merge of an expansion batch. Nodes dedupe by id, edges by
    /// `(from, to, relation)`. Endpoints missing from both the model and the
    /// batch receive a placeholder node. Groups are recomputed over the
    /// merged set; an empty outcome leaves the model untouched.
    pub fn merge(
        &mut self,
        nodes: &[RawNode],
        edges: &[RawEdge],
        grouping: GroupingConfig,
    ) -> MergeOutcome {
        let mut known_ids = self
            .raw_nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<HashSet<_>>();
        let mut seen_edges = self
            .raw_edges
            .iter()
            .map(RawEdge::merge_key)
            .collect::<HashSet<_>>();
        let batch_nodes = nodes
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect::<HashMap<_, _>>();

        let mut raw_nodes = self.raw_nodes.clone();
        let mut raw_edges = self.raw_edges.clone();
        let mut outcome = MergeOutcome::default();

        for edge in edges {
            if edge.from.is_empty() || edge.to.is_empty() {
                continue;
            }
            if !seen_edges.insert(edge.merge_key()) {
                continue;
            }

            for id in [edge.from.as_str(), edge.to.as_str()] {
                if known_ids.insert(id.to_owned()) {
                    let node = batch_nodes
                        .get(id)
                        .map(|node| (*node).clone())
                        .unwrap_or_else(|| RawNode::new(id, placeholder_label(id)));
                    raw_nodes.push(node);
                    outcome.added_nodes += 1;
                }
            }

            raw_edges.push(edge.clone());
            outcome.added_edges += 1;
        }

        if outcome.is_empty() {
            return outcome;
        }

        *self = Self::build(raw_nodes, raw_edges, grouping, false);
        tracing::info!(
            added_nodes = outcome.added_nodes,
            added_edges = outcome.added_edges,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "merged neighbor expansion"
        );
        outcome
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[PaperNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&PaperNode> {
        self.nodes.get(index)
    }

    pub fn edges(&self) -> &[PaperEdge] {
        &self.edges
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn core_index(&self) -> Option<usize> {
        self.core_index
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids adjacent to `id` over the full edge set.
    pub fn adjacency(&self, id: &str) -> HashSet<&str> {
        let Some(index) = self.index_of(id) else {
            return HashSet::new();
        };
        self.neighbors(index)
            .iter()
            .map(|&neighbor| self.nodes[neighbor].id.as_str())
            .collect()
    }

    /// Distinct sources present in the model, for the source filter.
    pub fn sources(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .map(|node| node.meta.source_key().to_owned())
            .collect()
    }

    pub fn edge_endpoints(&self, edge: &PaperEdge) -> (&str, &str) {
        (
            self.nodes[edge.source].id.as_str(),
            self.nodes[edge.target].id.as_str(),
        )
    }
}

fn assign_groups(nodes: &[&RawNode], degrees: &[usize], grouping: GroupingConfig) -> Vec<NodeGroup> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let mut sorted = degrees.to_vec();
    sorted.sort_unstable();
    let percentile_index = ((sorted.len() as f32) * grouping.related_percentile.clamp(0.0, 1.0))
        .floor() as usize;
    let related_threshold = sorted[percentile_index.min(sorted.len() - 1)];
    let max_degree = sorted[sorted.len() - 1];

    let kind_contains = |needle: &str| {
        nodes.iter().position(|node| {
            node.kind
                .as_deref()
                .is_some_and(|kind| kind.to_lowercase().contains(needle))
        })
    };
    let core_index = kind_contains("core")
        .or_else(|| kind_contains("seed"))
        .or_else(|| degrees.iter().position(|&degree| degree == max_degree))
        .unwrap_or(0);

    degrees
        .iter()
        .enumerate()
        .map(|(index, &degree)| {
            if index == core_index {
                NodeGroup::Core
            } else if degree >= related_threshold {
                NodeGroup::Related
            } else {
                NodeGroup::Peripheral
            }
        })
        .collect()
}

fn derive_relation(a: &RawNode, b: &RawNode) -> Option<Relation> {
    let a_authors = a
        .authors
        .iter()
        .map(|author| author.trim().to_lowercase())
        .filter(|author| !author.is_empty())
        .collect::<HashSet<_>>();
    if b
        .authors
        .iter()
        .any(|author| a_authors.contains(&author.trim().to_lowercase()))
    {
        return Some(Relation::Author);
    }

    if let (Some(a_venue), Some(b_venue)) = (&a.venue, &b.venue)
        && !a_venue.is_empty()
        && a_venue.to_lowercase() == b_venue.to_lowercase()
    {
        return Some(Relation::Venue);
    }

    if let (Some(a_year), Some(b_year)) = (a.year, b.year)
        && (a_year - b_year).abs() == 1
    {
        return Some(Relation::Year);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_of(model: &GraphModel, id: &str) -> NodeGroup {
        model.node(model.index_of(id).unwrap()).unwrap().group
    }

    #[test]
    fn empty_input_falls_back_to_sample_graph() {
        let model = GraphModel::normalize(&[], &[], GroupingConfig::default());
        assert!(model.is_fallback());
        assert_eq!(model.len(), 6);
        assert_eq!(model.edges().len(), 5);

        let n1 = model.node(model.index_of("n1").unwrap()).unwrap();
        assert_eq!(n1.degree, 3);
        assert_eq!(n1.group, NodeGroup::Core);
        assert_eq!(group_of(&model, "n2"), NodeGroup::Related);
        assert_eq!(group_of(&model, "n4"), NodeGroup::Related);
        assert_eq!(group_of(&model, "n3"), NodeGroup::Peripheral);
        assert_eq!(group_of(&model, "n6"), NodeGroup::Peripheral);
    }

    #[test]
    fn dangling_edges_are_dropped_at_ingestion() {
        let nodes = vec![RawNode::new("a", "A"), RawNode::new("b", "B")];
        let edges = vec![
            RawEdge::new("a", "b"),
            RawEdge::new("a", "ghost"),
            RawEdge::new("ghost", "b"),
        ];
        let model = GraphModel::normalize(&nodes, &edges, GroupingConfig::default());

        assert_eq!(model.edges().len(), 1);
        assert_eq!(model.dropped_edges(), 2);
        for edge in model.edges() {
            assert!(edge.source < model.len());
            assert!(edge.target < model.len());
        }
        assert_eq!(model.node(0).unwrap().degree, 1);
    }

    #[test]
    fn exactly_one_core_per_graph() {
        let nodes = (0..9)
            .map(|i| RawNode::new(format!("p{i}"), format!("Paper {i}")))
            .collect::<Vec<_>>();
        let edges = (1..9)
            .map(|i| RawEdge::new("p0", format!("p{i}")))
            .chain([RawEdge::new("p1", "p2"), RawEdge::new("p3", "p4")])
            .collect::<Vec<_>>();
        let model = GraphModel::normalize(&nodes, &edges, GroupingConfig::default());

        let cores = model
            .nodes()
            .iter()
            .filter(|node| node.group == NodeGroup::Core)
            .count();
        assert_eq!(cores, 1);
        assert_eq!(model.core_index(), Some(0));
    }

    #[test]
    fn explicit_type_wins_over_degree() {
        let nodes = vec![
            RawNode::new("hub", "Hub"),
            RawNode::new("leaf", "Leaf").with_kind("Seed paper"),
            RawNode::new("other", "Other"),
        ];
        let edges = vec![RawEdge::new("hub", "leaf"), RawEdge::new("hub", "other")];
        let model = GraphModel::normalize(&nodes, &edges, GroupingConfig::default());
        assert_eq!(group_of(&model, "leaf"), NodeGroup::Core);
        assert_ne!(group_of(&model, "hub"), NodeGroup::Core);

        let nodes = vec![
            RawNode::new("x", "X").with_kind("seed"),
            RawNode::new("y", "Y").with_kind("CORE"),
        ];
        let model = GraphModel::normalize(&nodes, &[], GroupingConfig::default());
        assert_eq!(group_of(&model, "y"), NodeGroup::Core);
    }

    #[test]
    fn adjacency_is_symmetric() {
        let model = GraphModel::fallback(GroupingConfig::default());
        let n1 = model.adjacency("n1");
        assert_eq!(n1, HashSet::from(["n2", "n4", "n5"]));
        assert!(model.adjacency("n4").contains("n1"));
        assert!(model.adjacency("missing").is_empty());
    }

    #[test]
    fn relations_are_derived_from_metadata() {
        let mut a = RawNode::new("a", "A");
        a.authors = vec!["Ada Lovelace".into()];
        a.venue = Some("ICML".into());
        a.year = Some(2020);
        let mut b = RawNode::new("b", "B");
        b.authors = vec!["ada lovelace".into()];
        let mut c = RawNode::new("c", "C");
        c.venue = Some("icml".into());
        let mut d = RawNode::new("d", "D");
        d.year = Some(2021);
        let e = RawNode::new("e", "E");

        let edges = vec![
            RawEdge::new("a", "b"),
            RawEdge::new("a", "c"),
            RawEdge::new("a", "d"),
            RawEdge::new("a", "e"),
            RawEdge::new("b", "e").with_relation("citation"),
        ];
        let model = GraphModel::normalize(&[a, b, c, d, e], &edges, GroupingConfig::default());
        let relations = model
            .edges()
            .iter()
            .map(|edge| edge.relation.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(
            relations,
            vec![Some("author"), Some("venue"), Some("year"), None, Some("citation")]
        );
        assert_eq!(model.edges()[0].relation_kind(), Some(Relation::Author));
        assert_eq!(model.edges()[4].relation_kind(), None);
    }

    #[test]
    fn merge_is_additive_and_idempotent() {
        let nodes = vec![RawNode::new("x", "X"), RawNode::new("y", "Y")];
        let edges = vec![RawEdge::new("x", "y")];
        let mut model = GraphModel::normalize(&nodes, &edges, GroupingConfig::default());

        let batch_nodes = vec![RawNode::new("z", "Zeta")];
        let batch_edges = vec![
            RawEdge::new("x", "z").with_weight(0.7),
            RawEdge::new("x", "w1234567"),
            RawEdge::new("x", "y"),
        ];

        let first = model.merge(&batch_nodes, &batch_edges, GroupingConfig::default());
        assert_eq!(first, MergeOutcome { added_nodes: 2, added_edges: 2 });
        let counts = (model.len(), model.edges().len());
        assert_eq!(counts, (4, 3));
        let w = model.node(model.index_of("w1234567").unwrap()).unwrap();
        assert_eq!(w.label, "Paper w12345");
        assert_eq!(model.node(model.index_of("z").unwrap()).unwrap().label, "Zeta");

        let second = model.merge(&batch_nodes, &batch_edges, GroupingConfig::default());
        assert!(second.is_empty());
        assert_eq!((model.len(), model.edges().len()), counts);
    }

    #[test]
    fn merge_restores_edges_dropped_at_load() {
        let nodes = vec![RawNode::new("a", "A"), RawNode::new("b", "B")];
        let edges = vec![RawEdge::new("a", "b"), RawEdge::new("a", "z")];
        let mut model = GraphModel::normalize(&nodes, &edges, GroupingConfig::default());
        assert_eq!(model.edges().len(), 1);
        assert!(model.index_of("z").is_none());

        let outcome = model.merge(
            &[RawNode::new("z", "Zeta")],
            &[RawEdge::new("a", "b"), RawEdge::new("a", "z")],
            GroupingConfig::default(),
        );
        assert_eq!(outcome, MergeOutcome { added_nodes: 1, added_edges: 1 });
        assert_eq!(model.node(model.index_of("z").unwrap()).unwrap().label, "Zeta");
        assert_eq!(model.edges().len(), 2);
    }

    #[test]
    fn merge_distinguishes_relations() {
        let nodes = vec![RawNode::new("x", "X"), RawNode::new("y", "Y")];
        let mut model = GraphModel::normalize(&nodes, &[], GroupingConfig::default());
        let outcome = model.merge(
            &[],
            &[
                RawEdge::new("x", "y").with_relation("author"),
                RawEdge::new("x", "y").with_relation("venue"),
                RawEdge::new("x", "y").with_relation("author"),
            ],
            GroupingConfig::default(),
        );
        assert_eq!(outcome.added_edges, 2);
        assert_eq!(model.node(0).unwrap().degree, 2);
    }

    #[test]
    fn groups_are_recomputed_after_merge() {
        let nodes = vec![RawNode::new("a", "A"), RawNode::new("b", "B"), RawNode::new("c", "C")];
        let edges = vec![RawEdge::new("a", "b"), RawEdge::new("a", "c")];
        let mut model = GraphModel::normalize(&nodes, &edges, GroupingConfig::default());
        assert_eq!(group_of(&model, "a"), NodeGroup::Core);

        let extra = (0..4)
            .map(|i| RawEdge::new("c", format!("new{i}")))
            .collect::<Vec<_>>();
        model.merge(&[], &extra, GroupingConfig::default());
        assert_eq!(group_of(&model, "c"), NodeGroup::Core);
        assert_eq!(
            model
                .nodes()
                .iter()
                .filter(|node| node.group == NodeGroup::Core)
                .count(),
            1
        );
    }
}
