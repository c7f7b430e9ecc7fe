use super::method::ChainMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity of the caller a request was resolved for. Used as the queue
/// ordering group and as the notification audience.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A write or read request on its way to the ledger.
///
/// Fields are fixed at construction; `params` keeps its order end to end.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionRequest {
    method: ChainMethod,
    params: Vec<Value>,
    caller: CallerId,
    force_always: bool,
}

impl TransactionRequest {
    pub fn new(method: ChainMethod, params: Vec<Value>, caller: CallerId) -> Self {
        Self {
            method,
            params,
            caller,
            force_always: false,
        }
    }

    /// Marks the request for resubmission even if an identical payload is
    /// still inside the transport's deduplication window.
    pub fn force_always(mut self, force: bool) -> Self {
        self.force_always = force;
        self
    }

    pub fn method(&self) -> ChainMethod {
        self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn is_forced(&self) -> bool {
        self.force_always
    }
}
