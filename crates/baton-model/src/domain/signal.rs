use std::fmt;

use serde::{Deserialize, Serialize};

/// Cause attached to a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Signal {
    /// Interactive interrupt (Ctrl+C, `SIGINT`).
    Interrupt,
    /// Termination request from the OS (`SIGTERM`).
    Terminate,
    /// Programmatic cancellation with a caller-supplied reason.
    Requested(String),
}

impl Signal {
    pub fn requested(reason: impl Into<String>) -> Self {
        Signal::Requested(reason.into())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("interrupt"),
            Signal::Terminate => f.write_str("terminate"),
            Signal::Requested(reason) => write!(f, "requested: {reason}"),
        }
    }
}
