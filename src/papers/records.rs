use std::collections::HashSet;

use serde::Deserialize;

use crate::util::placeholder_label;

/// A paper node as supplied by the host. Accepts both the query-graph shape
/// (`label`, `type`) and the connected-graph shape (`title` plus metadata).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default, alias = "title")]
    pub label: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// A similarity/citation edge. `from`/`to` also accept `source`/`target`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawEdge {
    #[serde(alias = "source")]
    pub from: String,
    #[serde(alias = "target")]
    pub to: String,
    #[serde(default)]
    pub weight: Option<f32>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl RawEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    #[cfg(test)]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Key used to deduplicate edges when neighbor batches are merged.
    pub fn merge_key(&self) -> (String, String, String) {
        (
            self.from.clone(),
            self.to.clone(),
            self.relation.clone().unwrap_or_default(),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl GraphPayload {
    /// Keeps the first `max_nodes` nodes; edges are left for normalization to
    /// filter against the retained node set.
    pub fn truncated(mut self, max_nodes: usize) -> Self {
        self.nodes.truncate(max_nodes);
        self
    }

    /// Describes every edge endpoint missing from `nodes` with a placeholder
    /// record, so a bare edge list still yields a graph.
    pub fn with_endpoint_nodes(mut self) -> Self {
        let mut known = self
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<HashSet<_>>();
        for edge in &self.edges {
            for id in [&edge.from, &edge.to] {
                if known.insert(id.clone()) {
                    self.nodes.push(RawNode::new(id.as_str(), placeholder_label(id)));
                }
            }
        }
        self
    }
}

/// Additional nodes and edges returned for a neighbor expansion request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpansionBatch {
    pub node_id: String,
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_nodes_fill_in_missing_records() {
        let payload = GraphPayload {
            nodes: vec![RawNode::new("a", "Alpha")],
            edges: vec![RawEdge::new("a", "b"), RawEdge::new("b", "c"), RawEdge::new("c", "a")],
        }
        .with_endpoint_nodes();

        let ids = payload.nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(payload.nodes[0].label, "Alpha");
        assert_eq!(payload.nodes[1].label, placeholder_label("b"));
    }

    #[test]
    fn truncation_keeps_leading_nodes() {
        let payload = GraphPayload {
            nodes: (0..5).map(|i| RawNode::new(format!("n{i}"), "")).collect(),
            edges: Vec::new(),
        }
        .truncated(3);
        assert_eq!(payload.nodes.len(), 3);
        assert_eq!(payload.nodes[2].id, "n2");
    }
}
