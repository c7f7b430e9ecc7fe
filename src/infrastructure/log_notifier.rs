use crate::domain::method::ChainMethod;
use crate::domain::ports::EventNotifier;
use crate::domain::request::CallerId;
use crate::error::NotifyError;
use async_trait::async_trait;
use tracing::info;

/// Publishes direct-invoke outcomes as structured log events under the
/// `ledger_dispatch::events` target, for a log shipper to forward to
/// subscribers.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventNotifier for LogNotifier {
    async fn notify_success(
        &self,
        caller: &CallerId,
        method: ChainMethod,
        params: &[String],
    ) -> Result<(), NotifyError> {
        info!(target: "ledger_dispatch::events", %caller, %method, ?params, "transaction committed");
        Ok(())
    }

    async fn notify_error(
        &self,
        caller: &CallerId,
        method: ChainMethod,
        params: &[String],
    ) -> Result<(), NotifyError> {
        info!(target: "ledger_dispatch::events", %caller, %method, ?params, "transaction failed");
        Ok(())
    }
}
