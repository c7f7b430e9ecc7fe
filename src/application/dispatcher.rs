use super::ledger_invoker::LedgerInvoker;
use super::notifier::Notifier;
use super::queue_producer::QueueProducer;
use crate::config::{DispatchConfig, DispatchMode};
use crate::domain::method::{ChainMethod, MethodKind};
use crate::domain::outcome::{DispatchResult, FailureCause, QueryResult};
use crate::domain::params::{NormalizedParams, normalize};
use crate::domain::ports::{EventNotifierBox, LedgerClientBox, QueueTransportBox};
use crate::domain::request::{CallerId, TransactionRequest};
use crate::domain::schema::{BODY_FIELD, FieldError, SchemaRegistry, ValidationOutcome, validate};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Entry point for ledger reads and writes.
///
/// Each call is independent: the dispatcher holds no per-request state, so
/// it can be shared (e.g. behind an `Arc`) and driven from many tasks at
/// once. Ordering between writes is provided only by the queue transport's
/// per-caller FIFO groups in queued mode.
///
/// There are no built-in timeouts or cancellation. Callers that need a
/// deadline should wrap the returned future, e.g. with `tokio::time::timeout`.
pub struct Dispatcher {
    mode: DispatchMode,
    schemas: SchemaRegistry,
    invoker: LedgerInvoker,
    producer: QueueProducer,
    notifier: Notifier,
}

impl Dispatcher {
    /// Wires the dispatcher from its configuration and collaborators.
    ///
    /// # Arguments
    ///
    /// * `config` - Mode, queue name, chaincode and method schemas.
    /// * `ledger` - Client for the ledger's invoke and query paths.
    /// * `transport` - Durable queue used in queued mode.
    /// * `notifier` - Receives direct-invoke outcomes.
    pub fn new(
        config: DispatchConfig,
        ledger: LedgerClientBox,
        transport: QueueTransportBox,
        notifier: EventNotifierBox,
    ) -> Self {
        Self {
            mode: config.mode(),
            invoker: LedgerInvoker::new(ledger, config.chaincode()),
            producer: QueueProducer::new(transport, config.queue_name()),
            notifier: Notifier::new(notifier),
            schemas: config.schemas().clone(),
        }
    }

    /// Dispatches a write request.
    pub async fn dispatch_invoke(
        &self,
        method: ChainMethod,
        params: Vec<Value>,
        caller: CallerId,
        force_always: bool,
    ) -> DispatchResult {
        let request = TransactionRequest::new(method, params, caller).force_always(force_always);
        self.dispatch(&request).await
    }

    /// Runs a write request through validation and then either the direct
    /// or the queued path, depending on the configured mode.
    pub async fn dispatch(&self, request: &TransactionRequest) -> DispatchResult {
        let method = request.method();
        let caller = request.caller();

        if method.kind() != MethodKind::Write {
            return DispatchResult::failed(FailureCause::MethodKindMismatch {
                method,
                expected: MethodKind::Write,
            });
        }

        let params = match self.prepare(method, request.params()) {
            Ok(params) => params,
            Err(cause) => return DispatchResult::failed(cause),
        };

        match self.mode {
            DispatchMode::Direct => {
                let result = self.invoker.invoke_direct(method, &params).await;
                if result.is_failed() {
                    self.notifier.error(caller, method, &params).await;
                } else {
                    self.notifier.success(caller, method, &params).await;
                }
                result
            }
            DispatchMode::Queued if request.is_forced() => {
                self.producer.submit_forced(method, &params, caller).await
            }
            DispatchMode::Queued => self.producer.submit(method, &params, caller).await,
        }
    }

    /// Dispatches a read. Always goes straight to the ledger, regardless of
    /// mode.
    pub async fn dispatch_query(&self, method: ChainMethod, params: &[Value]) -> QueryResult {
        if method.kind() != MethodKind::Read {
            return Err(FailureCause::MethodKindMismatch {
                method,
                expected: MethodKind::Read,
            });
        }
        let params = self.prepare(method, params)?;
        self.invoker.query(method, &params).await
    }

    /// Validates against the method's schema, if any, and normalizes.
    fn prepare(&self, method: ChainMethod, raw: &[Value]) -> Result<NormalizedParams, FailureCause> {
        let Some(schema) = self.schemas.get(method) else {
            return Ok(normalize(raw));
        };

        let declared = schema.fields().len();
        let body = match raw {
            [object @ Value::Object(_)] => object.clone(),
            _ if raw.len() > declared => {
                let errors = vec![FieldError {
                    field: BODY_FIELD.to_string(),
                    reason: format!("has {} params, at most {} expected", raw.len(), declared),
                }];
                error!(%method, ?errors, "Validation failed");
                return Err(FailureCause::Validation(errors));
            }
            _ => Value::Object(
                schema
                    .fields()
                    .iter()
                    .zip(raw)
                    .map(|(spec, value)| (spec.name.clone(), value.clone()))
                    .collect::<Map<String, Value>>(),
            ),
        };

        match validate(schema, &body) {
            ValidationOutcome::Valid(fields) => {
                debug!(%method, fields = fields.len(), "Valid object schema");
                Ok(normalize(&fields.into_params()))
            }
            ValidationOutcome::Invalid(errors) => {
                error!(%method, ?errors, "Validation failed");
                Err(FailureCause::Validation(errors))
            }
        }
    }
}
