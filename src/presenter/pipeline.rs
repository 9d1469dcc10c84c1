use futures::stream::{FuturesUnordered, StreamExt};

use crate::backend::model::Manga;
use crate::backend::source::Source;
use crate::backend::store::MangaStore;
use crate::error::{CatalogueError, StoreError};

pub const DEFAULT_DETAIL_BATCH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Browse,
    Search,
}

impl ListKind {
    pub fn label(self) -> &'static str {
        match self {
            ListKind::Browse => "browse fetch",
            ListKind::Search => "search fetch",
        }
    }
}

/// Local record for a manga seen on the network. Unknown manga are stored
/// first so they carry a store id; known ones come back as stored.
pub async fn reconcile(store: &dyn MangaStore, network: Manga) -> Result<Manga, StoreError> {
    if let Some(local) = store.get_by_url(&network.url).await? {
        return Ok(local);
    }
    store.upsert(&network).await?;
    store
        .get_by_url(&network.url)
        .await?
        .ok_or(StoreError::MissingAfterInsert(network.url))
}

/// Fetches one page of the list and resolves it against the store,
/// keeping network order.
pub async fn load_page(
    source: &dyn Source,
    store: &dyn MangaStore,
    kind: ListKind,
    query: &str,
    page: u32,
) -> Result<Vec<Manga>, CatalogueError> {
    let network = match kind {
        ListKind::Browse => source.popular(page).await?,
        ListKind::Search => source.search(query, page).await?,
    };

    let mut local = Vec::with_capacity(network.len());
    for manga in network {
        local.push(reconcile(store, manga).await?);
    }
    Ok(local)
}

async fn fetch_detail(
    source: &dyn Source,
    store: &dyn MangaStore,
    mut manga: Manga,
) -> Result<Manga, CatalogueError> {
    let network = source.detail(&manga.url).await?;
    manga.copy_from_network(&network);
    store.upsert(&manga).await?;
    Ok(manga)
}

/// Fills in details for every record that is still a list stub.
///
/// Works through the stubs `batch_size` at a time: requests inside a batch
/// run together, and the next batch starts only once the whole batch is
/// done. Each record is handed to `emit` as soon as its own request
/// finishes. The first failure ends the run.
pub async fn backfill_details<F>(
    source: &dyn Source,
    store: &dyn MangaStore,
    records: Vec<Manga>,
    batch_size: usize,
    mut emit: F,
) -> Result<(), CatalogueError>
where
    F: FnMut(Manga),
{
    let stubs: Vec<Manga> = records.into_iter().filter(|m| !m.initialized).collect();

    for batch in stubs.chunks(batch_size.max(1)) {
        let mut in_flight: FuturesUnordered<_> = batch
            .iter()
            .cloned()
            .map(|manga| fetch_detail(source, store, manga))
            .collect();

        while let Some(result) = in_flight.next().await {
            let manga = result?;
            if manga.initialized {
                emit(manga);
            }
        }
    }
    Ok(())
}
