use std::fmt;

/// # Rationale
/// The feed splits failures into two families so that callers can filter on
/// which "unit" an error arises from: operational errors surface while logs
/// are flowing, configuration errors only ever trigger at startup.

/// OperationError defines errors resulting from decoding and tracking logs
/// delivered by the subscription.
#[derive(Fail, Debug, Clone, PartialEq)]
pub enum OperationError {
    InvalidAddress(String),
    MissingTransactionHash,
    UnknownEventSignature,
    UndecodableLog(String),
    UnserializableLog,
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationError::InvalidAddress(address) => {
                write!(f, "invalid contract address {}", address)
            }
            OperationError::MissingTransactionHash => {
                write!(f, "log carries no transaction hash")
            }
            OperationError::UnknownEventSignature => {
                write!(f, "log topic matches no event in the contract ABI")
            }
            OperationError::UndecodableLog(name) => {
                write!(f, "could not decode parameters of a {} log", name)
            }
            OperationError::UnserializableLog => {
                write!(f, "could not serialize log to derive its key")
            }
        }
    }
}

/// ConfigError defines errors arising from an application misconfiguration,
/// they should *only* be triggered at startup.
#[derive(Fail, Debug, PartialEq, Clone)]
pub enum ConfigError {
    #[fail(display = "invalid config file path")]
    InvalidConfigFilePath,

    #[fail(display = "invalid limit, must be non-zero")]
    InvalidLimit,

    #[fail(display = "invalid timeout, must be non-zero")]
    InvalidTimeout,
}
