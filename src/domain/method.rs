use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the method set below. Bumped whenever a method is added,
/// removed or changes kind.
pub const CHAIN_METHODS_VERSION: u32 = 1;

/// Whether a ledger method mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Read,
    Write,
}

/// The closed set of chaincode operations exposed through the dispatcher.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum ChainMethod {
    QueryCar,
    QueryAllCars,
    CreateCar,
    ChangeCarOwner,
    QueryAllAssets,
    CreateAsset,
}

impl ChainMethod {
    pub const ALL: [ChainMethod; 6] = [
        ChainMethod::QueryCar,
        ChainMethod::QueryAllCars,
        ChainMethod::CreateCar,
        ChainMethod::ChangeCarOwner,
        ChainMethod::QueryAllAssets,
        ChainMethod::CreateAsset,
    ];

    pub fn kind(&self) -> MethodKind {
        match self {
            ChainMethod::QueryCar | ChainMethod::QueryAllCars | ChainMethod::QueryAllAssets => {
                MethodKind::Read
            }
            ChainMethod::CreateCar | ChainMethod::ChangeCarOwner | ChainMethod::CreateAsset => {
                MethodKind::Write
            }
        }
    }

    /// Wire name passed to the ledger client.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainMethod::QueryCar => "queryCar",
            ChainMethod::QueryAllCars => "queryAllCars",
            ChainMethod::CreateCar => "createCar",
            ChainMethod::ChangeCarOwner => "changeCarOwner",
            ChainMethod::QueryAllAssets => "queryAllAssets",
            ChainMethod::CreateAsset => "createAsset",
        }
    }
}

impl fmt::Display for ChainMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
