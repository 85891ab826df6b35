// App Repository Port

use crate::domain::App;
use crate::error::Result;
use async_trait::async_trait;

/// Lookup of application records
#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Find app by GUID
    async fn find_by_guid(&self, guid: &str) -> Result<Option<App>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory app table that records every lookup
    #[derive(Default)]
    pub struct InMemoryAppRepository {
        apps: HashMap<String, App>,
        lookups: Mutex<Vec<String>>,
    }

    impl InMemoryAppRepository {
        pub fn new(apps: impl IntoIterator<Item = App>) -> Self {
            Self {
                apps: apps.into_iter().map(|a| (a.guid.clone(), a)).collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }

        pub fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AppRepository for InMemoryAppRepository {
        async fn find_by_guid(&self, guid: &str) -> Result<Option<App>> {
            self.lookups.lock().unwrap().push(guid.to_string());
            Ok(self.apps.get(guid).cloned())
        }
    }
}
