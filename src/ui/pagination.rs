/// Rows left below the selection at which the next page is requested.
pub const LOAD_THRESHOLD: usize = 5;

/// Endless-scroll bookkeeping for the manga list.
///
/// A page request stays outstanding until the list grows or the page is
/// reported failed; a page that adds nothing therefore ends the scrolling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    enabled: bool,
    current_page: u32,
    previous_total: usize,
    loading: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}

impl Pagination {
    pub fn new() -> Self {
        Self {
            enabled: false,
            current_page: 1,
            previous_total: 0,
            loading: true,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Back to page one, waiting for it to arrive.
    pub fn reset(&mut self) {
        self.current_page = 1;
        self.previous_total = 0;
        self.loading = true;
    }

    /// The outstanding page did not arrive; the next scroll asks for it again.
    pub fn failed(&mut self) {
        if self.loading {
            self.current_page = self.current_page.saturating_sub(1);
            self.loading = false;
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Feeds the selected row and list length; returns the page to fetch
    /// when the selection is close enough to the end.
    pub fn on_scrolled(&mut self, selected: usize, total: usize) -> Option<u32> {
        if !self.enabled {
            return None;
        }
        if self.loading && total > self.previous_total {
            self.loading = false;
            self.previous_total = total;
        }
        if !self.loading && total.saturating_sub(selected + 1) <= LOAD_THRESHOLD {
            self.current_page += 1;
            self.loading = true;
            return Some(self.current_page);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> Pagination {
        let mut pagination = Pagination::new();
        pagination.enable();
        pagination
    }

    #[test]
    fn disabled_never_requests() {
        let mut pagination = Pagination::new();
        assert_eq!(pagination.on_scrolled(19, 20), None);
    }

    #[test]
    fn requests_next_page_near_the_end_once() {
        let mut pagination = enabled();
        assert_eq!(pagination.on_scrolled(0, 20), None);
        assert!(!pagination.is_loading());

        assert_eq!(pagination.on_scrolled(15, 20), Some(2));
        assert_eq!(pagination.on_scrolled(16, 20), None);
        assert!(pagination.is_loading());

        // page 2 arrived
        assert_eq!(pagination.on_scrolled(16, 40), None);
        assert_eq!(pagination.on_scrolled(35, 40), Some(3));
    }

    #[test]
    fn empty_page_stops_scrolling() {
        let mut pagination = enabled();
        pagination.on_scrolled(0, 20);
        assert_eq!(pagination.on_scrolled(19, 20), Some(2));
        assert_eq!(pagination.on_scrolled(19, 20), None);
        assert_eq!(pagination.current_page(), 2);
    }

    #[test]
    fn short_page_asks_for_more_on_first_scroll() {
        let mut pagination = enabled();
        assert_eq!(pagination.on_scrolled(0, 3), Some(2));
    }

    #[test]
    fn failed_page_is_requested_again() {
        let mut pagination = enabled();
        pagination.on_scrolled(0, 20);
        assert_eq!(pagination.on_scrolled(15, 20), Some(2));

        pagination.failed();
        assert!(!pagination.is_loading());
        assert_eq!(pagination.current_page(), 1);
        assert_eq!(pagination.on_scrolled(16, 20), Some(2));
    }

    #[test]
    fn failed_first_page_is_requested_on_scroll() {
        let mut pagination = enabled();
        pagination.failed();
        assert_eq!(pagination.on_scrolled(0, 0), Some(1));
        assert_eq!(pagination.on_scrolled(0, 0), None);
    }

    #[test]
    fn reset_waits_for_first_page_again() {
        let mut pagination = enabled();
        pagination.on_scrolled(0, 20);
        pagination.on_scrolled(18, 20);
        pagination.reset();

        assert_eq!(pagination.current_page(), 1);
        assert_eq!(pagination.on_scrolled(0, 0), None);
        assert_eq!(pagination.on_scrolled(0, 20), None);
        assert_eq!(pagination.on_scrolled(17, 20), Some(2));
    }
}
