use serde::{Deserialize, Serialize};

/// A hotel property in the portfolio, from the `Properties.json.gz` sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub code: String,
    pub name: String,
}
