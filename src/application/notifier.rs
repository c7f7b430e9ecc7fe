use crate::domain::method::ChainMethod;
use crate::domain::params::NormalizedParams;
use crate::domain::ports::EventNotifierBox;
use crate::domain::request::CallerId;
use tracing::warn;

/// Fire-and-forget front for the event notifier. Delivery failures are
/// logged and dropped; they never reach the dispatch result.
pub struct Notifier {
    inner: EventNotifierBox,
}

impl Notifier {
    pub fn new(inner: EventNotifierBox) -> Self {
        Self { inner }
    }

    pub async fn success(&self, caller: &CallerId, method: ChainMethod, params: &NormalizedParams) {
        if let Err(e) = self
            .inner
            .notify_success(caller, method, params.as_slice())
            .await
        {
            warn!(%caller, %method, error = %e, "Success notification not delivered");
        }
    }

    pub async fn error(&self, caller: &CallerId, method: ChainMethod, params: &NormalizedParams) {
        if let Err(e) = self
            .inner
            .notify_error(caller, method, params.as_slice())
            .await
        {
            warn!(%caller, %method, error = %e, "Error notification not delivered");
        }
    }
}
