use std::time::{Duration, Instant};

use tokio_core::reactor;
use web3::api::{SubscriptionResult, SubscriptionStream};
use web3::futures::prelude::*;
use web3::futures::try_ready;
use web3::DuplexTransport;

/// The two stages of a log subscription: waiting on the eth_subscribe call,
/// then draining the notification stream it returns.
pub enum SubscriptionState<T, I>
where
    T: DuplexTransport + 'static,
    I: serde::de::DeserializeOwned + 'static,
{
    Subscribing(Box<dyn Future<Item = SubscriptionStream<T, I>, Error = web3::Error>>),
    Subscribed(SubscriptionStream<T, I>),
}

/// Watchdog wrapper around a subscription stream. Errors whenever `duration`
/// passes without an item, then re-arms itself so the feed can keep polling
/// after logging the dropped update instead of spinning on a fired timer.
pub struct TimeoutStream<T, I>
where
    T: DuplexTransport + 'static,
    I: serde::de::DeserializeOwned + 'static,
{
    state: SubscriptionState<T, I>,
    duration: Duration,
    timer: reactor::Timeout,
}

impl<T, I> TimeoutStream<T, I>
where
    T: DuplexTransport + 'static,
    I: serde::de::DeserializeOwned + 'static,
{
    pub fn new(
        state: SubscriptionState<T, I>,
        duration: Duration,
        handle: &reactor::Handle,
    ) -> Result<Self, web3::Error> {
        let timer = reactor::Timeout::new(duration, handle)
            .map_err(|e| web3::Error::Transport(format!("could not create timer: {}", e)))?;
        Ok(TimeoutStream {
            state,
            duration,
            timer,
        })
    }

    fn rearm(&mut self) {
        self.timer.reset(Instant::now() + self.duration);
    }
}

impl<T, I> Stream for TimeoutStream<T, I>
where
    T: DuplexTransport + 'static,
    I: serde::de::DeserializeOwned + 'static,
{
    type Item = I;
    type Error = web3::Error;

    fn poll(&mut self) -> Poll<Option<Self::Item>, Self::Error> {
        loop {
            let next = match self.state {
                SubscriptionState::Subscribing(ref mut future) => {
                    let stream = try_ready!(future.poll());
                    Some(SubscriptionState::Subscribed(stream))
                }
                SubscriptionState::Subscribed(ref mut stream) => match stream.poll() {
                    Ok(Async::Ready(Some(item))) => {
                        self.rearm();
                        return Ok(Async::Ready(Some(item)));
                    }
                    Ok(Async::Ready(None)) => {
                        return Ok(Async::Ready(None));
                    }
                    Ok(Async::NotReady) => match self.timer.poll() {
                        Ok(Async::Ready(_)) => {
                            self.rearm();
                            return Err(web3::Error::Transport(
                                "no subscription notifications before timeout".to_string(),
                            ));
                        }
                        Ok(Async::NotReady) => {
                            return Ok(Async::NotReady);
                        }
                        Err(e) => {
                            return Err(web3::Error::Transport(format!("timer failed: {}", e)));
                        }
                    },
                    Err(e) => {
                        return Err(e);
                    }
                },
            };
            if let Some(next_state) = next {
                self.state = next_state;
                self.rearm();
            }
        }
    }
}

/// Adds `timeout()` to the SubscriptionResult returned by eth_subscribe().
pub trait Timeout<T, I>
where
    T: DuplexTransport + 'static,
    I: serde::de::DeserializeOwned + 'static,
{
    fn timeout(self, seconds: u64, handle: &reactor::Handle) -> Result<TimeoutStream<T, I>, web3::Error>;
}

impl<T, I> Timeout<T, I> for SubscriptionResult<T, I>
where
    T: DuplexTransport + 'static,
    I: serde::de::DeserializeOwned + 'static,
{
    fn timeout(self, seconds: u64, handle: &reactor::Handle) -> Result<TimeoutStream<T, I>, web3::Error> {
        TimeoutStream::new(
            SubscriptionState::Subscribing(Box::new(self)),
            Duration::from_secs(seconds),
            handle,
        )
    }
}
