use tokio_core::reactor;
use web3::futures::prelude::*;
use web3::types::Log;
use web3::DuplexTransport;

use super::timeout::{Timeout, TimeoutStream};
use super::Feed;
use crate::render::Render;

/// Tails the log subscription and folds each delivered batch into the feed.
///
/// One poll pass drains every log the stream has ready, mirroring the
/// one-callback-per-batch shape of the upstream pubsub API, then applies the
/// whole batch at once so supersession sees the complete picture. Resolves
/// when the subscription ends.
pub struct WatchLogs<T: DuplexTransport + 'static> {
    stream: Option<TimeoutStream<T, Log>>,
    feed: Feed<T>,
    renderer: Box<dyn Render>,
}

impl<T: DuplexTransport + 'static> WatchLogs<T> {
    /// Returns a newly created WatchLogs Future
    ///
    /// # Arguments
    ///
    /// * `feed` - Feed owning the subscription filter and the event lists
    /// * `timeout` - Seconds without a notification before the watchdog fires
    /// * `renderer` - Sink for the combined list after every batch
    /// * `handle` - Handle to create the watchdog timer
    pub fn new(feed: &Feed<T>, timeout: u64, renderer: Box<dyn Render>, handle: &reactor::Handle) -> Self {
        let stream = feed
            .web3
            .eth_subscribe()
            .subscribe_logs(feed.filter())
            .timeout(timeout, handle)
            .map_err(|e| {
                error!("could not arm subscription watchdog: {}", e);
            })
            .ok();
        WatchLogs {
            stream,
            feed: feed.clone(),
            renderer,
        }
    }
}

impl<T: DuplexTransport + 'static> Future for WatchLogs<T> {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        let stream = match self.stream {
            Some(ref mut stream) => stream,
            // Watchdog setup failed at construction; nothing to tail.
            None => return Ok(Async::Ready(())),
        };
        let mut batch: Vec<Log> = Vec::new();
        loop {
            match stream.poll() {
                Ok(Async::Ready(Some(log))) => {
                    trace!("log notification: {:?}", log.transaction_hash);
                    batch.push(log);
                }
                Ok(Async::NotReady) => {
                    self.feed.process(&batch, &*self.renderer);
                    return Ok(Async::NotReady);
                }
                Ok(Async::Ready(None)) => {
                    self.feed.process(&batch, &*self.renderer);
                    info!("log subscription ended");
                    return Ok(Async::Ready(()));
                }
                Err(e) => {
                    // No retry here: drop whatever was drained and keep
                    // tailing, the display just stays as it was.
                    error!("subscription error, dropping update: {}", e);
                    batch.clear();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use web3::Web3;

    use crate::feed::tests::{transfer_log, Recorder};
    use crate::mock::MockTransport;
    use crate::settings;

    fn feed_over(mock: &MockTransport) -> Feed<MockTransport> {
        let conf = settings::Feed {
            ws_uri: "ws://localhost:8546".to_string(),
            contract: "0x5af8bcc6127afde967279dc04661f599a5c0cafa".to_string(),
            from_block: 0,
            limit: 50,
            timeout: 5,
            logging: settings::Logging::Raw,
        };
        Feed::new(Web3::new(mock.clone()), &conf).unwrap()
    }

    #[test]
    fn watch_applies_emitted_logs_and_ends_with_the_subscription() {
        // arrange
        let mut eloop = reactor::Core::new().unwrap();
        let handle = eloop.handle();
        let mock = MockTransport::new();
        mock.add_rpc_response(serde_json::json!("0xf00"));
        let feed = feed_over(&mock);
        let rendered = Rc::new(RefCell::new(Vec::new()));
        let watch = feed.watch(
            Box::new(Recorder {
                rendered: rendered.clone(),
            }),
            &handle,
        );
        // emit once the subscription has had a chance to register
        let emitter = mock.clone();
        let delayed = reactor::Timeout::new(Duration::from_millis(50), &handle)
            .unwrap()
            .map_err(|_| ())
            .and_then(move |_| {
                emitter.emit_log(transfer_log(Some(3), 0, 1));
                emitter.emit_log(transfer_log(None, 0, 2));
                emitter.drop_subscriptions();
                Ok(())
            });
        handle.spawn(delayed);
        // act
        eloop.run(watch).unwrap();
        // assert
        let lists = feed.events();
        let lists = lists.read().unwrap();
        assert_eq!(lists.mined.len(), 1);
        assert_eq!(lists.pending.len(), 1);
        assert!(!rendered.borrow().is_empty());
    }

    #[test]
    fn watch_resolves_cleanly_when_nothing_was_emitted() {
        let mut eloop = reactor::Core::new().unwrap();
        let handle = eloop.handle();
        let mock = MockTransport::new();
        mock.add_rpc_response(serde_json::json!("0xf00"));
        let feed = feed_over(&mock);
        let watch = feed.watch(Box::new(crate::render::LineRender), &handle);

        let closer = mock.clone();
        let delayed = reactor::Timeout::new(Duration::from_millis(50), &handle)
            .unwrap()
            .map_err(|_| ())
            .and_then(move |_| {
                closer.drop_subscriptions();
                Ok(())
            });
        handle.spawn(delayed);

        eloop.run(watch).unwrap();
        assert!(feed.events().read().unwrap().all.is_empty());
    }
}
