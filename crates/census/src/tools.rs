//! Argument payloads for the tools exposed by the Census MCP server.
//!
//! The server owns these contracts; the types here only mirror what it
//! accepts so callers get a typed builder instead of hand-written JSON.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const FETCH_AGGREGATE_DATA_TOOL: &str = "fetch-aggregate-data";

pub const DEFAULT_YEAR: u32 = 2023;
pub const DEFAULT_DATASET: &str = "acs/acs5";
pub const DEFAULT_GEOGRAPHY_TYPE: &str = "state";
/// Maryland.
pub const DEFAULT_STATE_FIPS: &str = "24";
/// Total population.
pub const DEFAULT_VARIABLE: &str = "B01003_001E";

/// Scope of a Census query, e.g. `{"type": "state", "fips": "24"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Geography {
    #[serde(rename = "type")]
    pub kind: String,
    pub fips: String,
}

impl Geography {
    pub fn new(kind: impl Into<String>, fips: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fips: fips.into(),
        }
    }

    pub fn state(fips: impl Into<String>) -> Self {
        Self::new(DEFAULT_GEOGRAPHY_TYPE, fips)
    }
}

/// Arguments of the `fetch-aggregate-data` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FetchAggregateDataArgs {
    /// Survey vintage.
    pub year: u32,
    /// Dataset identifier such as `acs/acs5`.
    pub dataset: String,
    pub geography: Geography,
    /// Variable codes, returned in the order given.
    pub variables: Vec<String>,
}

impl Default for FetchAggregateDataArgs {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            dataset: DEFAULT_DATASET.to_string(),
            geography: Geography::state(DEFAULT_STATE_FIPS),
            variables: vec![DEFAULT_VARIABLE.to_string()],
        }
    }
}

impl FetchAggregateDataArgs {
    pub fn to_arguments(&self) -> Result<JsonObject, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }

    pub fn from_arguments(arguments: JsonObject) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(arguments))
    }
}
