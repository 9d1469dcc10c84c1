use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::mangadex::MangaDex;
use super::model::Manga;
use crate::error::{CatalogueError, SourceError};

/// A remote catalogue of manga. Pages are 1-based.
#[async_trait]
pub trait Source: Send + Sync {
    fn id(&self) -> i32;

    fn name(&self) -> &str;

    /// One page of the popularity-ranked list, as stubs.
    async fn popular(&self, page: u32) -> Result<Vec<Manga>, SourceError>;

    async fn search(&self, query: &str, page: u32) -> Result<Vec<Manga>, SourceError>;

    /// Full record for a manga previously listed by this source.
    async fn detail(&self, url: &str) -> Result<Manga, SourceError>;

    /// Page a human can open in a browser.
    fn web_url(&self, url: &str) -> String;
}

pub struct SourceManager {
    sources: HashMap<i32, Arc<dyn Source>>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Manager with every built-in source registered.
    pub fn with_builtin() -> Result<Self, SourceError> {
        let mut manager = Self::new();
        manager.register(Arc::new(MangaDex::new()?));
        Ok(manager)
    }

    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.id(), source);
    }

    pub fn resolve(&self, id: i32) -> Result<Arc<dyn Source>, CatalogueError> {
        self.sources
            .get(&id)
            .cloned()
            .ok_or(CatalogueError::UnknownSource(id))
    }
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new()
    }
}
