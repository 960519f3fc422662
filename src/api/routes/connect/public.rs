//! Public types for the phone connect API
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One phone call, as relayed by the telephony integration. `action` is the
/// menu key ("1", "2", "3") or the action name ("check-in", "check-out",
/// "emergency").
#[derive(Serialize, Deserialize)]
pub struct ConnectRequest {
    pub action: String,
    pub caller_number: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub message: String,
    pub action: String,
    pub calling_number: Option<String>,
    pub metrics: BTreeMap<String, i64>,
}
