//! Public types for the missed-check sweep API
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct CheckResponse {
    pub message: String,
    pub metrics: BTreeMap<String, i64>,
}
