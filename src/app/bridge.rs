/// Hovered node as reported to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverNode {
    pub id: String,
    pub label: String,
    pub degree: usize,
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HoverEdge {
    pub from: String,
    pub to: String,
    pub weight: Option<f32>,
    pub relation: Option<String>,
}

/// Callbacks from the engine to whatever embeds it. Hover callbacks fire only
/// when the hovered item changes.
pub trait HostBridge {
    fn on_hover_node(&mut self, node: Option<HoverNode>);
    fn on_hover_edge(&mut self, edge: Option<HoverEdge>);
    fn on_node_click(&mut self, id: &str, label: Option<&str>);
}

#[derive(Clone, Debug, PartialEq)]
pub enum BridgeEvent {
    HoverNode(Option<HoverNode>),
    HoverEdge(Option<HoverEdge>),
    NodeClick { id: String, label: Option<String> },
}

/// Queues callbacks so the host can act on them after the tick returns.
#[derive(Clone, Debug, Default)]
pub struct BridgeEvents {
    events: Vec<BridgeEvent>,
}

impl BridgeEvents {
    pub fn drain(&mut self) -> std::vec::Drain<'_, BridgeEvent> {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[BridgeEvent] {
        &self.events
    }
}

impl HostBridge for BridgeEvents {
    fn on_hover_node(&mut self, node: Option<HoverNode>) {
        self.events.push(BridgeEvent::HoverNode(node));
    }

    fn on_hover_edge(&mut self, edge: Option<HoverEdge>) {
        self.events.push(BridgeEvent::HoverEdge(edge));
    }

    fn on_node_click(&mut self, id: &str, label: Option<&str>) {
        self.events.push(BridgeEvent::NodeClick {
            id: id.to_owned(),
            label: label.map(str::to_owned),
        });
    }
}
