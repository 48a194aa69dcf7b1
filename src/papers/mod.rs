mod corpus;
mod parse;
mod records;

pub use corpus::{PaperCorpus, load_corpus};
pub use parse::load_graph_payload;
pub use records::{ExpansionBatch, GraphPayload, RawEdge, RawNode};
