use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use crate::papers::{ExpansionBatch, PaperCorpus};

/// Background neighbor lookups against the corpus. At most one request is in
/// flight; a request made meanwhile replaces any earlier queued one.
pub(super) struct ExpansionWorker {
    requests: Sender<String>,
    results: Receiver<ExpansionBatch>,
    in_flight: Option<String>,
    queued: Option<String>,
}

#[derive(Debug, PartialEq)]
pub(super) enum ExpansionPoll {
    Idle,
    Pending,
    Ready(ExpansionBatch),
    Disconnected,
}

impl ExpansionWorker {
    pub(super) fn spawn(corpus: Arc<PaperCorpus>, neighbor_limit: usize) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (result_tx, result_rx) = mpsc::channel();

        thread::spawn(move || {
            for node_id in request_rx {
                let batch = corpus.expansion_for(&node_id, neighbor_limit);
                tracing::debug!(
                    node = %node_id,
                    nodes = batch.nodes.len(),
                    edges = batch.edges.len(),
                    "neighbor expansion fetched"
                );
                if result_tx.send(batch).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: request_tx,
            results: result_rx,
            in_flight: None,
            queued: None,
        }
    }

    pub(super) fn request(&mut self, node_id: &str) {
        if self.in_flight.is_some() {
            self.queued = Some(node_id.to_owned());
            return;
        }
        self.dispatch(node_id.to_owned());
    }

    pub(super) fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    pub(super) fn poll(&mut self) -> ExpansionPoll {
        if self.in_flight.is_none() {
            return ExpansionPoll::Idle;
        }

        match self.results.try_recv() {
            Ok(batch) => {
                self.in_flight = None;
                if let Some(next) = self.queued.take() {
                    self.dispatch(next);
                }
                ExpansionPoll::Ready(batch)
            }
            Err(TryRecvError::Empty) => ExpansionPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = None;
                self.queued = None;
                ExpansionPoll::Disconnected
            }
        }
    }

    fn dispatch(&mut self, node_id: String) {
        match self.requests.send(node_id.clone()) {
            Ok(()) => self.in_flight = Some(node_id),
            Err(error) => {
                tracing::warn!(node = %error.0, "expansion worker is gone; request dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::papers::{GraphPayload, RawEdge, RawNode};

    fn worker() -> ExpansionWorker {
        let corpus = PaperCorpus::from_payload(GraphPayload {
            nodes: vec![RawNode::new("a", "Alpha"), RawNode::new("b", "Beta")],
            edges: vec![RawEdge::new("a", "b"), RawEdge::new("b", "c")],
        });
        ExpansionWorker::spawn(Arc::new(corpus), 20)
    }

    fn wait(worker: &mut ExpansionWorker) -> ExpansionBatch {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match worker.poll() {
                ExpansionPoll::Ready(batch) => return batch,
                ExpansionPoll::Pending => {}
                other => panic!("unexpected poll result {other:?}"),
            }
            assert!(Instant::now() < deadline, "expansion timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn idle_until_requested() {
        let mut worker = worker();
        assert_eq!(worker.poll(), ExpansionPoll::Idle);
        worker.request("a");
        assert_eq!(worker.in_flight(), Some("a"));
        let batch = wait(&mut worker);
        assert_eq!(batch.node_id, "a");
        assert_eq!(batch.edges.len(), 1);
        assert_eq!(worker.poll(), ExpansionPoll::Idle);
    }

    #[test]
    fn queued_request_follows_the_in_flight_one() {
        let mut worker = worker();
        worker.request("a");
        worker.request("x");
        worker.request("b");

        assert_eq!(wait(&mut worker).node_id, "a");
        assert_eq!(worker.in_flight(), Some("b"));
        let second = wait(&mut worker);
        assert_eq!(second.node_id, "b");
        assert_eq!(second.edges.len(), 2);
        assert_eq!(worker.in_flight(), None);
    }
}
