//! In-memory stand-ins for the presenter's collaborators.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::view::CatalogueView;
use crate::backend::model::Manga;
use crate::backend::source::Source;
use crate::backend::store::MangaStore;
use crate::error::{SourceError, StoreError};

pub const FAKE_SOURCE_ID: i32 = 9;

pub fn stub(name: &str) -> Manga {
    Manga::stub(FAKE_SOURCE_ID, format!("/m/{}", name), name)
}

pub fn thumb_for(url: &str) -> String {
    format!("https://img{}.jpg", url)
}

#[derive(Default)]
pub struct FakeSource {
    pub popular: HashMap<u32, Vec<Manga>>,
    pub search: HashMap<String, Vec<Manga>>,
    pub list_delay: Duration,
    pub detail_delay: Duration,
    pub failing_detail: Option<String>,
    /// Popular pages that fail once, then load normally.
    pub failing_popular: Mutex<Vec<u32>>,
    pub(crate) journal: Mutex<Vec<String>>,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn note(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl Source for FakeSource {
    fn id(&self) -> i32 {
        FAKE_SOURCE_ID
    }

    fn name(&self) -> &str {
        "Fake"
    }

    async fn popular(&self, page: u32) -> Result<Vec<Manga>, SourceError> {
        self.note(format!("popular:{}", page));
        tokio::time::sleep(self.list_delay).await;
        {
            let mut failing = self.failing_popular.lock().unwrap();
            if let Some(pos) = failing.iter().position(|p| *p == page) {
                failing.remove(pos);
                return Err(SourceError::Payload(format!("popular page {} unavailable", page)));
            }
        }
        Ok(self.popular.get(&page).cloned().unwrap_or_default())
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<Manga>, SourceError> {
        self.note(format!("search:{}:{}", query, page));
        tokio::time::sleep(self.list_delay).await;
        Ok(self.search.get(query).cloned().unwrap_or_default())
    }

    async fn detail(&self, url: &str) -> Result<Manga, SourceError> {
        self.note(format!("start:{}", url));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.detail_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.note(format!("end:{}", url));

        if self.failing_detail.as_deref() == Some(url) {
            return Err(SourceError::Payload(format!("broken {}", url)));
        }
        Ok(Manga {
            url: url.to_string(),
            thumbnail_url: Some(thumb_for(url)),
            author: Some("author".to_string()),
            initialized: true,
            ..Default::default()
        })
    }

    fn web_url(&self, url: &str) -> String {
        format!("https://fake{}", url)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Manga>>,
    upserts: AtomicUsize,
}

impl MemoryStore {
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn row(&self, url: &str) -> Option<Manga> {
        self.rows.lock().unwrap().iter().find(|m| m.url == url).cloned()
    }
}

#[async_trait]
impl MangaStore for MemoryStore {
    async fn get_by_url(&self, url: &str) -> Result<Option<Manga>, StoreError> {
        Ok(self.row(url))
    }

    async fn upsert(&self, manga: &Manga) -> Result<(), StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let next_id = rows.len() as i64 + 1;
        match rows.iter_mut().find(|m| m.url == manga.url) {
            Some(row) => {
                let id = row.id;
                *row = manga.clone();
                row.id = id;
            }
            None => {
                let mut row = manga.clone();
                row.id = Some(next_id);
                rows.push(row);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    SetTitle(String),
    BindAdapter,
    EnablePagination,
    ResetPagination,
    PageFailed,
    Append(Vec<String>),
    Clear,
    RefreshImage(usize, Option<String>),
}

pub struct FakeView {
    pub source_id: i32,
    pub calls: Vec<ViewCall>,
}

impl FakeView {
    pub fn new(source_id: i32) -> Self {
        Self {
            source_id,
            calls: Vec::new(),
        }
    }

    pub fn refreshes(&self) -> Vec<(usize, Option<String>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ViewCall::RefreshImage(index, url) => Some((*index, url.clone())),
                _ => None,
            })
            .collect()
    }
}

impl CatalogueView for FakeView {
    fn launch_source_id(&self) -> i32 {
        self.source_id
    }

    fn set_title(&mut self, title: &str) {
        self.calls.push(ViewCall::SetTitle(title.to_string()));
    }

    fn bind_adapter(&mut self) {
        self.calls.push(ViewCall::BindAdapter);
    }

    fn enable_pagination(&mut self) {
        self.calls.push(ViewCall::EnablePagination);
    }

    fn reset_pagination(&mut self) {
        self.calls.push(ViewCall::ResetPagination);
    }

    fn page_failed(&mut self) {
        self.calls.push(ViewCall::PageFailed);
    }

    fn append_items(&mut self, mangas: &[Manga]) {
        self.calls
            .push(ViewCall::Append(mangas.iter().map(|m| m.title.clone()).collect()));
    }

    fn clear_items(&mut self) {
        self.calls.push(ViewCall::Clear);
    }

    fn refresh_item_image(&mut self, index: usize, thumbnail_url: Option<&str>) {
        self.calls.push(ViewCall::RefreshImage(
            index,
            thumbnail_url.map(str::to_string),
        ));
    }
}
