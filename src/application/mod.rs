//! Application layer containing the dispatch orchestration.
//!
//! `Dispatcher` is the entry point. It validates a request, then either
//! invokes the ledger directly (and notifies subscribers) or hands the write
//! to the `QueueProducer`. Reads always go straight to the `LedgerInvoker`.
//! No state survives between calls.

pub mod dispatcher;
pub mod ledger_invoker;
pub mod notifier;
pub mod queue_producer;
