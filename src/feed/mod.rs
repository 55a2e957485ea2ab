mod live;
mod timeout;

pub use self::live::WatchLogs;

use std::sync::{Arc, RwLock};

use tokio_core::reactor;
use web3::types::{Address, BlockNumber, Filter, FilterBuilder, Log};
use web3::{DuplexTransport, Web3};

use crate::contracts::{sale_events, EventDecoder};
use crate::errors::OperationError;
use crate::event::Event;
use crate::reconcile::EventLists;
use crate::render::Render;
use crate::settings;

/// One watched contract: the connection, the ABI decoder and the reconciled
/// event lists. Cheap to clone, clones share the lists.
#[derive(Clone)]
pub struct Feed<T: DuplexTransport + 'static> {
    pub web3: Web3<T>,
    contract: Address,
    from_block: u64,
    limit: usize,
    timeout: u64,
    decoder: EventDecoder,
    events: Arc<RwLock<EventLists>>,
}

impl<T: DuplexTransport + 'static> Feed<T> {
    pub fn new(web3: Web3<T>, conf: &settings::Feed) -> Result<Self, OperationError> {
        let contract = parse_address(&conf.contract)?;
        Ok(Feed {
            web3,
            contract,
            from_block: conf.from_block,
            limit: conf.limit,
            timeout: conf.timeout,
            decoder: EventDecoder::new(sale_events()),
            events: Arc::new(RwLock::new(EventLists::new())),
        })
    }

    /// Everything the contract emitted from the configured start block up to
    /// and including pending transactions.
    pub fn filter(&self) -> Filter {
        FilterBuilder::default()
            .address(vec![self.contract])
            .from_block(BlockNumber::Number(self.from_block.into()))
            .to_block(BlockNumber::Pending)
            .limit(self.limit)
            .build()
    }

    /// Returns a Future that tails the subscription and keeps the lists
    /// reconciled, handing each update to `renderer`.
    ///
    /// # Arguments
    ///
    /// * `renderer` - Sink for the combined list after every applied batch
    /// * `handle` - Handle to create the watchdog timer
    pub fn watch(&self, renderer: Box<dyn Render>, handle: &reactor::Handle) -> WatchLogs<T> {
        WatchLogs::new(self, self.timeout, renderer, handle)
    }

    /// Shared handle on the reconciled lists.
    pub fn events(&self) -> Arc<RwLock<EventLists>> {
        self.events.clone()
    }

    /// Applies one batch of raw logs: decode, reconcile, render. Logs that
    /// cannot be decoded are dropped with a warning; a poisoned lock drops
    /// the whole update so the display just stays unchanged.
    pub fn process(&self, logs: &[Log], renderer: &dyn Render) {
        let mut batch = Vec::with_capacity(logs.len());
        for log in logs {
            match Event::from_log(log, &self.decoder) {
                Ok(event) => batch.push(event),
                Err(e) => warn!("skipping log from {:?}: {}", log.address, e),
            }
        }
        if batch.is_empty() {
            return;
        }
        match self.events.write() {
            Ok(mut lists) => {
                lists.reconcile(&batch);
                renderer.render(&lists.all);
            }
            Err(e) => error!("event lists poisoned, dropping update: {}", e),
        }
    }
}

fn parse_address(address: &str) -> Result<Address, OperationError> {
    clean_0x(address)
        .parse()
        .map_err(|_| OperationError::InvalidAddress(address.to_string()))
}

// From ethereum_types but not reexported by web3
fn clean_0x(s: &str) -> &str {
    if s.starts_with("0x") {
        &s[2..]
    } else {
        s
    }
}
