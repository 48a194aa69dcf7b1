use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};

use crate::util::placeholder_label;

use super::parse::load_graph_payload;
use super::records::{ExpansionBatch, GraphPayload, RawEdge, RawNode};

/// In-memory stand-in for the paper service: answers neighbor queries over a
/// full node/edge dump, the way the dashboard's `/graph/neighbors` route does.
#[derive(Clone, Debug, Default)]
pub struct PaperCorpus {
    nodes: HashMap<String, RawNode>,
    edges: Vec<RawEdge>,
    incident: HashMap<String, Vec<usize>>,
}

impl PaperCorpus {
    pub fn from_payload(payload: GraphPayload) -> Self {
        let mut nodes = HashMap::with_capacity(payload.nodes.len());
        for node in payload.nodes {
            nodes.entry(node.id.clone()).or_insert(node);
        }

        let mut incident: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, edge) in payload.edges.iter().enumerate() {
            incident.entry(edge.from.clone()).or_default().push(index);
            if edge.to != edge.from {
                incident.entry(edge.to.clone()).or_default().push(index);
            }
        }

        Self {
            nodes,
            edges: payload.edges,
            incident,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Strongest `limit` edges touching `node_id`, heaviest first.
    pub fn neighbors_of(&self, node_id: &str, limit: usize) -> Vec<RawEdge> {
        let Some(indices) = self.incident.get(node_id) else {
            return Vec::new();
        };

        let mut edges = indices
            .iter()
            .filter_map(|&index| self.edges.get(index))
            .cloned()
            .collect::<Vec<_>>();
        edges.sort_by(|a, b| {
            b.weight
                .unwrap_or(1.0)
                .total_cmp(&a.weight.unwrap_or(1.0))
                .then_with(|| a.to.cmp(&b.to))
        });
        edges.truncate(limit);
        edges
    }

    /// Neighbor edges plus a node record for every endpoint, falling back to
    /// a placeholder label for ids the corpus does not describe.
    pub fn expansion_for(&self, node_id: &str, limit: usize) -> ExpansionBatch {
        let edges = self.neighbors_of(node_id, limit);
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();

        for edge in &edges {
            for id in [edge.from.as_str(), edge.to.as_str()] {
                if !seen.insert(id.to_owned()) {
                    continue;
                }
                let node = self
                    .nodes
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| RawNode::new(id, placeholder_label(id)));
                nodes.push(node);
            }
        }

        ExpansionBatch {
            node_id: node_id.to_owned(),
            nodes,
            edges,
        }
    }
}

pub fn load_corpus(path: &Path) -> Result<PaperCorpus> {
    let payload = load_graph_payload(path)
        .with_context(|| format!("failed to load paper corpus from {}", path.display()))?;
    let corpus = PaperCorpus::from_payload(payload);
    tracing::info!(
        nodes = corpus.node_count(),
        edges = corpus.edge_count(),
        path = %path.display(),
        "paper corpus loaded"
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> PaperCorpus {
        PaperCorpus::from_payload(GraphPayload {
            nodes: vec![RawNode::new("a", "Alpha"), RawNode::new("b", "Beta")],
            edges: vec![
                RawEdge::new("a", "b").with_weight(0.4),
                RawEdge::new("a", "c9f81e22").with_weight(0.9),
                RawEdge::new("d", "a"),
                RawEdge::new("b", "d"),
            ],
        })
    }

    #[test]
    fn neighbors_sorted_by_weight_and_limited() {
        let corpus = corpus();
        let edges = corpus.neighbors_of("a", 2);
        assert_eq!(edges.len(), 2);
        // Missing weight counts as 1.
        assert_eq!(edges[0].from, "d");
        assert_eq!(edges[1].to, "c9f81e22");
        assert!(corpus.neighbors_of("unknown", 5).is_empty());
    }

    #[test]
    fn expansion_labels_unknown_endpoints() {
        let corpus = corpus();
        let batch = corpus.expansion_for("a", 10);
        assert_eq!(batch.edges.len(), 3);

        let labels = batch
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.label.as_str()))
            .collect::<HashMap<_, _>>();
        assert_eq!(labels["a"], "Alpha");
        assert_eq!(labels["c9f81e22"], "Paper c9f81e");
        assert_eq!(labels["d"], "Paper d");
        assert_eq!(batch.nodes.len(), 4);
    }
}
