//! Coordination behind the catalogue screen: paged listing, debounced search
//! and staged detail loading.
//!
//! Network and store work runs on spawned tasks. Results come back as
//! [`PresenterEvent`]s that the UI loop feeds to
//! [`CataloguePresenter::handle_event`]; the displayed list and the view are
//! only touched there.

pub mod operation;
pub mod pipeline;
pub mod search;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backend::model::Manga;
use crate::backend::source::{Source, SourceManager};
use crate::backend::store::MangaStore;
use crate::error::CatalogueError;
use operation::{spawn_cancellable, OperationSlot};
use pipeline::{backfill_details, load_page, ListKind, DEFAULT_DETAIL_BATCH};
use search::{debounce_queries, SearchState, DEFAULT_SEARCH_DEBOUNCE};
use view::CatalogueView;

#[derive(Debug)]
pub enum PresenterEvent {
    PageLoaded {
        kind: ListKind,
        ticket: u64,
        mangas: Vec<Manga>,
    },
    PageFailed {
        kind: ListKind,
        ticket: u64,
    },
    DetailLoaded {
        ticket: u64,
        manga: Manga,
    },
    QueryDebounced {
        ticket: u64,
        query: String,
    },
}

#[derive(Debug, Clone)]
pub struct PresenterSettings {
    pub search_debounce: Duration,
    pub detail_batch_size: usize,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            detail_batch_size: DEFAULT_DETAIL_BATCH,
        }
    }
}

pub struct CataloguePresenter<V: CatalogueView> {
    view: V,
    store: Arc<dyn MangaStore>,
    source: Option<Arc<dyn Source>>,
    settings: PresenterSettings,
    events: mpsc::UnboundedSender<PresenterEvent>,

    root: CancellationToken,
    browse_fetch: OperationSlot,
    search_fetch: OperationSlot,
    detail_fetch: OperationSlot,
    search_debounce: OperationSlot,

    search: SearchState,
    query_tx: Option<mpsc::UnboundedSender<String>>,

    items: Vec<Manga>,
    positions: HashMap<i64, usize>,
}

impl<V: CatalogueView> CataloguePresenter<V> {
    pub fn new(
        view: V,
        store: Arc<dyn MangaStore>,
        settings: PresenterSettings,
        events: mpsc::UnboundedSender<PresenterEvent>,
    ) -> Self {
        Self {
            view,
            store,
            source: None,
            settings,
            events,
            root: CancellationToken::new(),
            browse_fetch: OperationSlot::new("browse fetch"),
            search_fetch: OperationSlot::new("search fetch"),
            detail_fetch: OperationSlot::new("detail backfill"),
            search_debounce: OperationSlot::new("search debounce"),
            search: SearchState::default(),
            query_tx: None,
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Binds the screen to the source it was launched for and loads the
    /// first page of its popular listing.
    pub fn initialize(&mut self, sources: &SourceManager) -> Result<(), CatalogueError> {
        let source = sources.resolve(self.view.launch_source_id())?;
        log::info!("opening catalogue of {} ({})", source.name(), source.id());

        self.view.set_title(source.name());
        self.source = Some(source);

        self.items.clear();
        self.positions.clear();
        self.view.bind_adapter();
        self.view.enable_pagination();

        self.initialize_search();
        self.load_more(1);
        Ok(())
    }

    fn initialize_search(&mut self) {
        self.search = SearchState::default();

        let (query_tx, query_rx) = mpsc::unbounded_channel();
        self.query_tx = Some(query_tx);

        let (ticket, token) = self.search_debounce.replace(&self.root);
        let events = self.events.clone();
        let quiet = self.settings.search_debounce;
        spawn_cancellable(token, self.search_debounce.name(), async move {
            let result = debounce_queries(query_rx, quiet, |query| {
                events.send(PresenterEvent::QueryDebounced { ticket, query })
            })
            .await;
            if let Err(err) = result {
                log::error!(
                    "search pipeline stopped: {} (cause: {:?})",
                    err,
                    std::error::Error::source(&err)
                );
            }
        });
    }

    /// Raw text of the search box, on every edit.
    pub fn on_query_text_change(&self, query: &str) {
        if let Some(query_tx) = &self.query_tx {
            if query_tx.send(query.to_string()).is_err() {
                log::debug!("search pipeline is gone, dropping {:?}", query);
            }
        }
    }

    /// Loads `page` of whatever the list currently shows.
    pub fn load_more(&mut self, page: u32) {
        if self.search.search_mode {
            self.load_list(ListKind::Search, page);
        } else {
            self.load_list(ListKind::Browse, page);
        }
    }

    fn load_list(&mut self, kind: ListKind, page: u32) {
        let Some(source) = self.source.clone() else {
            log::warn!("{} requested before a source was bound", kind.label());
            return;
        };

        let slot = match kind {
            ListKind::Browse => &mut self.browse_fetch,
            ListKind::Search => &mut self.search_fetch,
        };
        let (ticket, token) = slot.replace(&self.root);

        let store = self.store.clone();
        let events = self.events.clone();
        let query = self.search.query.clone();
        log::debug!("{} page {} (query {:?})", kind.label(), page, query);

        spawn_cancellable(token, kind.label(), async move {
            match load_page(source.as_ref(), store.as_ref(), kind, &query, page).await {
                Ok(mangas) => {
                    let _ = events.send(PresenterEvent::PageLoaded {
                        kind,
                        ticket,
                        mangas,
                    });
                }
                Err(err) => {
                    log::error!("{} page {} failed: {}", kind.label(), page, err);
                    let _ = events.send(PresenterEvent::PageFailed { kind, ticket });
                }
            }
        });
    }

    fn start_backfill(&mut self, records: Vec<Manga>) {
        let Some(source) = self.source.clone() else {
            return;
        };

        let (ticket, token) = self.detail_fetch.replace(&self.root);
        let store = self.store.clone();
        let events = self.events.clone();
        let batch_size = self.settings.detail_batch_size;

        spawn_cancellable(token, self.detail_fetch.name(), async move {
            let emit = |manga: Manga| {
                let _ = events.send(PresenterEvent::DetailLoaded { ticket, manga });
            };
            let result =
                backfill_details(source.as_ref(), store.as_ref(), records, batch_size, emit).await;
            if let Err(err) = result {
                log::warn!("detail backfill stopped: {}", err);
            }
        });
    }

    /// Applies a finished background result. Results from runs that have
    /// since been replaced or cancelled are dropped.
    pub fn handle_event(&mut self, event: PresenterEvent) {
        match event {
            PresenterEvent::PageLoaded {
                kind,
                ticket,
                mangas,
            } => {
                if !self.list_slot(kind).is_current(ticket) {
                    log::debug!("dropping stale {} result", kind.label());
                    return;
                }
                self.append(&mangas);
                // An empty page has nothing to fill in; the running backfill keeps going
                if !mangas.is_empty() {
                    self.start_backfill(mangas);
                }
            }
            PresenterEvent::PageFailed { kind, ticket } => {
                if self.list_slot(kind).is_current(ticket) {
                    self.view.page_failed();
                }
            }
            PresenterEvent::DetailLoaded { ticket, manga } => {
                if self.detail_fetch.is_current(ticket) {
                    self.refresh_detail(manga);
                }
            }
            PresenterEvent::QueryDebounced { ticket, query } => {
                if self.search_debounce.is_current(ticket) {
                    self.query_from_search(&query);
                }
            }
        }
    }

    fn list_slot(&self, kind: ListKind) -> &OperationSlot {
        match kind {
            ListKind::Browse => &self.browse_fetch,
            ListKind::Search => &self.search_fetch,
        }
    }

    fn append(&mut self, mangas: &[Manga]) {
        for manga in mangas {
            if let Some(id) = manga.id {
                self.positions.entry(id).or_insert(self.items.len());
            }
            self.items.push(manga.clone());
        }
        self.view.append_items(mangas);
    }

    fn refresh_detail(&mut self, manga: Manga) {
        let Some(index) = manga.id.and_then(|id| self.positions.get(&id).copied()) else {
            log::debug!("{} is no longer listed, dropping its details", manga.url);
            return;
        };

        self.view.update_item(index, &manga);
        self.view
            .refresh_item_image(index, manga.thumbnail_url.as_deref());
        self.items[index] = manga;
    }

    fn query_from_search(&mut self, query: &str) {
        if !self.search.apply(query) {
            return;
        }
        log::info!(
            "query {:?}, {} mode",
            query,
            if self.search.search_mode { "search" } else { "browse" }
        );

        self.browse_fetch.cancel();
        self.search_fetch.cancel();

        self.items.clear();
        self.positions.clear();
        self.view.clear_items();
        self.view.reset_pagination();
        self.load_more(1);
    }

    /// Cancels every background operation this screen started.
    pub fn teardown(&mut self) {
        self.root.cancel();
        self.query_tx = None;
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    #[cfg(test)]
    pub fn items(&self) -> &[Manga] {
        &self.items
    }

    pub fn source(&self) -> Option<&Arc<dyn Source>> {
        self.source.as_ref()
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }
}

impl<V: CatalogueView> Drop for CataloguePresenter<V> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
