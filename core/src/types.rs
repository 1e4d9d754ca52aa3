//! Response bodies the client decodes on the caller's behalf.

use serde::{Deserialize, Serialize};

/// Body returned by a POST: the key the server generated for the new child.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushResponse {
    pub name: String,
}
