use crate::backend::model::Manga;

/// What the catalogue presenter needs from the screen that shows it.
///
/// Every method is called from the thread that owns the UI loop.
pub trait CatalogueView {
    /// Source id the screen was launched for.
    fn launch_source_id(&self) -> i32;

    fn set_title(&mut self, title: &str);

    /// Attach a fresh, empty list.
    fn bind_adapter(&mut self);

    /// Start asking for more pages when the user nears the end of the list.
    fn enable_pagination(&mut self);

    fn reset_pagination(&mut self);

    /// The last page requested did not load; scrolling may ask for it again.
    fn page_failed(&mut self);

    fn append_items(&mut self, mangas: &[Manga]);

    fn clear_items(&mut self);

    /// The row at `index` has fresher details than what was appended.
    fn update_item(&mut self, _index: usize, _manga: &Manga) {}

    fn refresh_item_image(&mut self, index: usize, thumbnail_url: Option<&str>);
}
