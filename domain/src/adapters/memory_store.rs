use std::sync::Mutex;

use crate::{CoreError, LinkList, PropertyStore, StoredLink, WebPartProperties};

/// Simple in-memory property store for tests and demos. Keeps every saved
/// link snapshot so tests can assert on notification history.
pub struct InMemoryStore {
    inner: Mutex<WebPartProperties>,
    history: Mutex<Vec<Vec<StoredLink>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_properties(WebPartProperties::default())
    }

    pub fn with_properties(properties: WebPartProperties) -> Self {
        Self {
            inner: Mutex::new(properties),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every list snapshot passed to `save_links`, oldest first.
    pub fn history(&self) -> Result<Vec<Vec<StoredLink>>, CoreError> {
        let history = self
            .history
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(history.clone())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyStore for InMemoryStore {
    fn load(&self) -> Result<WebPartProperties, CoreError> {
        let props = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(props.clone())
    }

    fn save_links(&self, links: &LinkList) -> Result<(), CoreError> {
        let snapshot = links.to_stored();
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?
            .links = snapshot.clone();
        self.history
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?
            .push(snapshot);
        Ok(())
    }

    fn save_title(&self, title: &str) -> Result<(), CoreError> {
        let mut props = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        props.title = title.to_string();
        Ok(())
    }
}
