// Application record (looked up by GUID before packaging)

use serde::{Deserialize, Serialize};

/// Application GUID
pub type AppGuid = String;

/// Application record owning the uploaded bits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub guid: AppGuid,
    pub name: String,
}

impl App {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
        }
    }
}
