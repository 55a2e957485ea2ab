use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use ethabi::Token;
use tiny_keccak::keccak256;
use web3::types::{Log, H256, U256};

use crate::contracts::EventDecoder;
use crate::errors::OperationError;

/// Where a log sits in its lifecycle. Parity tags logs from unconfirmed
/// transactions as `pending`; anything with a block position is `mined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    Mined,
    Pending,
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventState::Mined => write!(f, "mined"),
            EventState::Pending => write!(f, "pending"),
        }
    }
}

/// A decoded contract event. Immutable once constructed; reconciliation only
/// ever moves events between lists, it never edits them.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub state: EventState,
    pub block_number: U256,
    pub log_index: U256,
    pub transaction_hash: H256,
    pub transaction_index: U256,
    pub params: BTreeMap<String, Token>,
    pub key: H256,
}

impl Event {
    /// Builds an Event from a raw log, decoding its parameters against the
    /// contract ABI. Fails if the log has no transaction hash or does not
    /// match any known event.
    pub fn from_log(log: &Log, decoder: &EventDecoder) -> Result<Self, OperationError> {
        let transaction_hash = log
            .transaction_hash
            .ok_or(OperationError::MissingTransactionHash)?;
        let (name, params) = decoder.decode(log)?;
        Ok(Event {
            name,
            state: state_of(log),
            block_number: log.block_number.map(|n| U256::from(n.as_u64())).unwrap_or_else(U256::zero),
            log_index: log.log_index.unwrap_or_else(U256::zero),
            transaction_hash,
            transaction_index: log.transaction_index.unwrap_or_else(U256::zero),
            params,
            key: content_key(log)?,
        })
    }

    /// Display ordering comparator, descending by (block number, log index).
    /// Block number is the primary key, log index breaks ties.
    pub fn display_order(a: &Event, b: &Event) -> Ordering {
        b.block_number
            .cmp(&a.block_number)
            .then(b.log_index.cmp(&a.log_index))
    }
}

/// Content hash of the raw log, used to identify the same notification across
/// batches. Pending logs carry no block position, so the hash is over the
/// whole serialized log rather than (block, index).
pub fn content_key(log: &Log) -> Result<H256, OperationError> {
    let bytes = serde_json::to_vec(log).map_err(|_| OperationError::UnserializableLog)?;
    Ok(H256(keccak256(&bytes)))
}

fn state_of(log: &Log) -> EventState {
    // Parity sets log_type on subscription notifications; fall back to the
    // block position for nodes that omit it.
    match log.log_type.as_ref().map(String::as_str) {
        Some("pending") => EventState::Pending,
        Some(_) => EventState::Mined,
        None => {
            if log.block_number.is_some() && log.log_index.is_some() {
                EventState::Mined
            } else {
                EventState::Pending
            }
        }
    }
}
