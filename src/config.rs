use crate::domain::schema::SchemaRegistry;

pub const DEFAULT_QUEUE_NAME: &str = "transactions.fifo";
pub const DEFAULT_CHAINCODE: &str = "mycc";

/// How write requests reach the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DispatchMode {
    /// Invoke the ledger synchronously and notify subscribers. Suited to
    /// low-volume or test deployments; needs no queue transport.
    Direct,
    /// Hand writes to the durable queue; a consumer applies them later.
    #[default]
    Queued,
}

/// Process configuration, fixed at startup and moved into the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    mode: DispatchMode,
    queue_name: String,
    chaincode: String,
    schemas: SchemaRegistry,
}

impl DispatchConfig {
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            chaincode: DEFAULT_CHAINCODE.to_string(),
            schemas: SchemaRegistry::standard(),
        }
    }

    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }

    pub fn with_chaincode(mut self, chaincode: impl Into<String>) -> Self {
        self.chaincode = chaincode.into();
        self
    }

    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn chaincode(&self) -> &str {
        &self.chaincode
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new(DispatchMode::default())
    }
}
