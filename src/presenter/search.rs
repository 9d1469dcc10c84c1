use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Remembered query and whether the list shows search results or the
/// popular listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub search_mode: bool,
}

impl SearchState {
    /// Takes a settled query. Returns false when nothing changes (empty
    /// query following an empty query); otherwise the list must reload.
    pub fn apply(&mut self, query: &str) -> bool {
        match (self.query.is_empty(), query.is_empty()) {
            (true, true) => return false,
            (true, false) => self.search_mode = true,
            (false, true) => self.search_mode = false,
            (false, false) => {}
        }
        self.query = query.to_string();
        true
    }
}

/// Forwards only the latest query once `quiet` has passed without input.
///
/// A value still pending when the input closes is flushed. Stops at the
/// first error from `emit`.
pub async fn debounce_queries<F, E>(
    mut input: mpsc::UnboundedReceiver<String>,
    quiet: Duration,
    mut emit: F,
) -> Result<(), E>
where
    F: FnMut(String) -> Result<(), E>,
{
    let mut pending: Option<String> = None;
    loop {
        match pending.take() {
            None => match input.recv().await {
                Some(query) => pending = Some(query),
                None => return Ok(()),
            },
            Some(latest) => {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(query) => pending = Some(query),
                        None => return emit(latest),
                    },
                    _ = tokio::time::sleep(quiet) => emit(latest)?,
                }
            }
        }
    }
}
