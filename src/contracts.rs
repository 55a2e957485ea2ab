use std::collections::BTreeMap;

use ethabi::{Event, EventParam, ParamType, RawLog, Token};
use web3::types::Log;

use crate::errors::OperationError;

/// The token sale surface we watch: four events, matched by their topic-0
/// signature and decoded with ethabi.
pub fn sale_events() -> Vec<Event> {
    vec![buyin(), new_tranch(), refund(), transfer()]
}

/// event Buyin(address indexed who, uint256 accounted, uint256 received, uint256 price)
fn buyin() -> Event {
    Event {
        name: "Buyin".to_string(),
        inputs: vec![
            indexed_address("who"),
            uint("accounted"),
            uint("received"),
            uint("price"),
        ],
        anonymous: false,
    }
}

/// event NewTranch(uint256 price)
fn new_tranch() -> Event {
    Event {
        name: "NewTranch".to_string(),
        inputs: vec![uint("price")],
        anonymous: false,
    }
}

/// event Refund(address indexed who, uint256 amount)
fn refund() -> Event {
    Event {
        name: "Refund".to_string(),
        inputs: vec![indexed_address("who"), uint("amount")],
        anonymous: false,
    }
}

/// event Transfer(address indexed from, address indexed to, uint256 value)
fn transfer() -> Event {
    Event {
        name: "Transfer".to_string(),
        inputs: vec![indexed_address("from"), indexed_address("to"), uint("value")],
        anonymous: false,
    }
}

fn indexed_address(name: &str) -> EventParam {
    EventParam {
        name: name.to_string(),
        kind: ParamType::Address,
        indexed: true,
    }
}

fn uint(name: &str) -> EventParam {
    EventParam {
        name: name.to_string(),
        kind: ParamType::Uint(256),
        indexed: false,
    }
}

/// Maps raw logs to (event name, named parameters) by topic-0 signature.
#[derive(Clone)]
pub struct EventDecoder {
    events: Vec<(ethabi::Hash, Event)>,
}

impl EventDecoder {
    pub fn new(events: Vec<Event>) -> Self {
        let events = events
            .into_iter()
            .map(|event| (event.signature(), event))
            .collect();
        EventDecoder { events }
    }

    /// Decodes a log against the ABI. Signatures with no match and parameter
    /// mismatches are reported, not panicked on; the caller decides whether
    /// to drop the log.
    pub fn decode(&self, log: &Log) -> Result<(String, BTreeMap<String, Token>), OperationError> {
        let topic0 = log.topics.first().ok_or(OperationError::UnknownEventSignature)?;
        let (_, event) = self
            .events
            .iter()
            .find(|(signature, _)| signature.0 == topic0.0)
            .ok_or(OperationError::UnknownEventSignature)?;

        let topics = log
            .topics
            .iter()
            .map(|topic| ethabi::Hash::from(topic.0))
            .collect::<Vec<_>>();
        let raw = RawLog::from((topics, log.data.0.clone()));
        let decoded = event
            .parse_log(raw)
            .map_err(|_| OperationError::UndecodableLog(event.name.clone()))?;

        let params = decoded
            .params
            .into_iter()
            .map(|param| (param.name, param.value))
            .collect();
        Ok((event.name.clone(), params))
    }
}
