use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::records::{GraphPayload, RawEdge};

pub fn parse_graph_payload(raw: &str) -> Result<GraphPayload> {
    let parsed: Value = serde_json::from_str(raw).context("invalid graph JSON")?;

    // The neighbors endpoint answers with a bare edge list.
    if parsed.is_array() {
        let edges: Vec<RawEdge> = serde_json::from_value(parsed).context("invalid edge list")?;
        return Ok(GraphPayload {
            nodes: Vec::new(),
            edges,
        });
    }

    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("unexpected JSON type for graph payload"))?;
    if !object.contains_key("nodes") && !object.contains_key("edges") {
        return Err(anyhow!("graph payload has neither `nodes` nor `edges`"));
    }

    serde_json::from_value(parsed).context("invalid graph payload")
}

pub fn load_graph_payload(path: &Path) -> Result<GraphPayload> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    parse_graph_payload(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_graph_shape() {
        let payload = parse_graph_payload(
            r#"{
                "nodes": [{"id": "a", "label": "Alpha", "type": "seed"}, {"id": "b", "label": "Beta"}],
                "edges": [{"from": "a", "to": "b", "weight": 0.8, "relation": "author"}]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.nodes[0].kind.as_deref(), Some("seed"));
        assert_eq!(payload.edges[0].weight, Some(0.8));
        assert_eq!(payload.edges[0].relation.as_deref(), Some("author"));
    }

    #[test]
    fn parses_connected_graph_shape() {
        let payload = parse_graph_payload(
            r#"{
                "nodes": [
                    {"id": "p1", "title": "Diffusion Models", "year": 2021, "venue": "NeurIPS",
                     "authors": ["Ho", "Jain"], "source": "arXiv", "url": null},
                    {"id": "p2", "title": "Score Matching", "authors": null}
                ],
                "edges": [{"source": "p1", "target": "p2", "weight": 0.61, "type": "similarity"}]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.nodes[0].label, "Diffusion Models");
        assert_eq!(payload.nodes[0].authors, vec!["Ho", "Jain"]);
        assert!(payload.nodes[1].authors.is_empty());
        assert_eq!(payload.edges[0].from, "p1");
        assert_eq!(payload.edges[0].to, "p2");
        assert_eq!(payload.edges[0].kind.as_deref(), Some("similarity"));
        assert_eq!(payload.edges[0].relation, None);
    }

    #[test]
    fn parses_bare_edge_list() {
        let payload = parse_graph_payload(r#"[{"from": "x", "to": "y"}]"#).unwrap();
        assert!(payload.nodes.is_empty());
        assert_eq!(payload.edges.len(), 1);
    }

    #[test]
    fn rejects_unrelated_json() {
        assert!(parse_graph_payload(r#"{"version": 2}"#).is_err());
        assert!(parse_graph_payload("42").is_err());
        assert!(parse_graph_payload("{not json").is_err());
    }

    #[test]
    fn loads_payload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, r#"{"nodes": [{"id": "a", "label": "A"}], "edges": []}"#).unwrap();

        let payload = load_graph_payload(&path).unwrap();
        assert_eq!(payload.nodes[0].label, "A");

        let missing = load_graph_payload(&dir.path().join("missing.json"));
        assert!(missing.is_err());
    }
}
