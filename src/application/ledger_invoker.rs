use crate::domain::method::ChainMethod;
use crate::domain::outcome::{DispatchResult, FailureCause, QueryResult};
use crate::domain::params::NormalizedParams;
use crate::domain::ports::LedgerClientBox;
use tracing::{debug, error};

/// Thin wrapper around the ledger client that logs each call and turns
/// client errors into [`FailureCause::LedgerInvocation`].
///
/// Nothing here retries. A failed write may or may not have been applied, so
/// re-invoking it is left to the ledger client or an operator.
pub struct LedgerInvoker {
    client: LedgerClientBox,
    chaincode: String,
}

impl LedgerInvoker {
    pub fn new(client: LedgerClientBox, chaincode: impl Into<String>) -> Self {
        Self {
            client,
            chaincode: chaincode.into(),
        }
    }

    /// Synchronous write. Only used in direct mode.
    pub async fn invoke_direct(
        &self,
        method: ChainMethod,
        params: &NormalizedParams,
    ) -> DispatchResult {
        match self.client.invoke(method.as_str(), params.as_slice()).await {
            Ok(tx_hash) => {
                debug!(
                    chaincode = %self.chaincode,
                    %method,
                    %tx_hash,
                    "Invoke successfully executed"
                );
                DispatchResult::Direct { tx_hash }
            }
            Err(e) => {
                error!(
                    chaincode = %self.chaincode,
                    %method,
                    error = %e,
                    "Invoke failed"
                );
                DispatchResult::failed(FailureCause::LedgerInvocation(e.to_string()))
            }
        }
    }

    /// Read path. Always synchronous, whatever the dispatch mode.
    pub async fn query(&self, method: ChainMethod, params: &NormalizedParams) -> QueryResult {
        match self.client.query(method.as_str(), params.as_slice()).await {
            Ok(response) => {
                debug!(chaincode = %self.chaincode, %method, "Query successfully executed");
                Ok(response)
            }
            Err(e) => {
                error!(
                    chaincode = %self.chaincode,
                    %method,
                    error = %e,
                    "Query failed"
                );
                Err(FailureCause::LedgerInvocation(e.to_string()))
            }
        }
    }
}
