//! Domain model of the dispatch subsystem: requests, canonical params,
//! schemas, outcomes, the queue envelope and the ports to the ledger, the
//! queue transport and event subscribers.

pub mod method;
pub mod outcome;
pub mod params;
pub mod ports;
pub mod queue;
pub mod request;
pub mod schema;
