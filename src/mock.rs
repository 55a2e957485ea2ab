use std::cell::RefCell;
use std::collections::vec_deque::VecDeque;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jsonrpc_core as rpc;
use web3::api::SubscriptionId;
use web3::futures::sync::mpsc;
use web3::futures::{future, Future, Stream};
use web3::helpers;
use web3::types::Log;
use web3::{DuplexTransport, Error, RequestId, Transport};

type MockTask<T> = Box<dyn Future<Item = T, Error = Error>>;

type Subscription = mpsc::UnboundedSender<rpc::Value>;

/// Transport double for the tests: RPC calls are answered from a queued
/// response list, subscription notifications are pushed in by hand with
/// `emit_log`. Single-threaded by design, like the reactor the feed runs on.
#[derive(Debug, Clone)]
pub struct MockTransport {
    id: Rc<AtomicUsize>,
    responses: Rc<RefCell<VecDeque<rpc::Value>>>,
    subscriptions: Rc<RefCell<BTreeMap<SubscriptionId, Subscription>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            id: Rc::new(AtomicUsize::new(1)),
            responses: Default::default(),
            subscriptions: Default::default(),
        }
    }

    /// Queues the response returned by the next RPC call.
    pub fn add_rpc_response(&self, response: rpc::Value) {
        self.responses.borrow_mut().push_back(response);
    }

    /// Broadcasts a log notification to every live subscription.
    pub fn emit_log(&self, log: Log) {
        let value = serde_json::to_value(&log).expect("logs always serialize");
        for (id, tx) in self.subscriptions.borrow().iter() {
            if tx.unbounded_send(value.clone()).is_err() {
                warn!("subscription {:?} is gone", id);
            }
        }
    }

    /// Ends every subscription stream, as a dropped connection would.
    pub fn drop_subscriptions(&self) {
        self.subscriptions.borrow_mut().clear();
    }
}

impl Transport for MockTransport {
    type Out = MockTask<rpc::Value>;

    fn prepare(&self, method: &str, params: Vec<rpc::Value>) -> (RequestId, rpc::Call) {
        let id = self.id.fetch_add(1, Ordering::AcqRel);
        let call = helpers::build_request(id, method, params);
        (id, call)
    }

    fn send(&self, _id: RequestId, _request: rpc::Call) -> Self::Out {
        match self.responses.borrow_mut().pop_front() {
            Some(response) => Box::new(future::ok(response)),
            None => Box::new(future::err(Error::Unreachable)),
        }
    }
}

impl DuplexTransport for MockTransport {
    type NotificationStream = Box<dyn Stream<Item = rpc::Value, Error = Error> + Send + 'static>;

    fn subscribe(&self, id: &SubscriptionId) -> Self::NotificationStream {
        let (tx, rx) = mpsc::unbounded();
        if self.subscriptions.borrow_mut().insert(id.clone(), tx).is_some() {
            warn!("replacing subscription with id {:?}", id);
        }
        Box::new(rx.map_err(|()| Error::Transport("subscription dropped".into())))
    }

    fn unsubscribe(&self, id: &SubscriptionId) {
        self.subscriptions.borrow_mut().remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_core::reactor;
    use web3::types::{Bytes, H256};

    fn sample_log() -> Log {
        Log {
            address: "5af8bcc6127afde967279dc04661f599a5c0cafa".parse().unwrap(),
            topics: Vec::new(),
            data: Bytes(Vec::new()),
            block_hash: None,
            block_number: None,
            transaction_hash: Some(H256::zero()),
            transaction_index: None,
            log_index: None,
            transaction_log_index: None,
            log_type: Some("pending".to_string()),
            removed: None,
        }
    }

    #[test]
    fn queued_response_answers_the_next_call() {
        // arrange
        let mut eloop = reactor::Core::new().unwrap();
        let mock = MockTransport::new();
        let response = rpc::Value::String("0x1".into());
        mock.add_rpc_response(response.clone());
        // act
        let answered = eloop
            .run(mock.execute("eth_blockNumber", Vec::new()))
            .unwrap();
        // assert
        assert_eq!(answered, response);
    }

    #[test]
    fn empty_queue_errors_the_call() {
        let mut eloop = reactor::Core::new().unwrap();
        let mock = MockTransport::new();
        let answered = eloop.run(mock.execute("eth_blockNumber", Vec::new()));
        assert!(answered.is_err());
    }

    #[test]
    fn emitted_logs_reach_subscribers_and_deserialize() {
        // arrange
        let mut eloop = reactor::Core::new().unwrap();
        let mock = MockTransport::new();
        let id = SubscriptionId::from("0xa".to_owned());
        let stream = mock.subscribe(&id).collect();
        // act
        mock.emit_log(sample_log());
        mock.drop_subscriptions();
        let notifications = eloop.run(stream).unwrap();
        // assert
        assert_eq!(notifications.len(), 1);
        let log: Log = serde_json::from_value(notifications[0].clone()).unwrap();
        assert_eq!(log.log_type.as_deref(), Some("pending"));
    }

    #[test]
    fn unsubscribe_ends_only_that_stream() {
        let mut eloop = reactor::Core::new().unwrap();
        let mock = MockTransport::new();
        let kept = SubscriptionId::from("0xa".to_owned());
        let dropped = SubscriptionId::from("0xb".to_owned());
        let kept_stream = mock.subscribe(&kept);
        let _dropped_stream = mock.subscribe(&dropped);

        mock.unsubscribe(&dropped);
        mock.emit_log(sample_log());
        mock.drop_subscriptions();

        let notifications = eloop.run(kept_stream.collect()).unwrap();
        assert_eq!(notifications.len(), 1);
    }
}
