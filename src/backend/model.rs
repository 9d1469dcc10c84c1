/// A manga as known to this app, either a list stub or a fully detailed record.
///
/// `id` is assigned by the local store; records fresh from the network have none.
/// `url` is the stable key shared by the network and the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manga {
    pub id: Option<i64>,
    pub source: i32,
    pub url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub author: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub initialized: bool,
}

impl Manga {
    pub fn stub(source: i32, url: impl Into<String>, title: impl Into<String>) -> Self {
        Manga {
            source,
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Copies detail fields from a freshly fetched record onto this one.
    /// `id` and `url` stay untouched.
    pub fn copy_from_network(&mut self, network: &Manga) {
        if !network.title.is_empty() {
            self.title = network.title.clone();
        }
        if network.thumbnail_url.is_some() {
            self.thumbnail_url = network.thumbnail_url.clone();
        }
        if network.author.is_some() {
            self.author = network.author.clone();
        }
        if network.artist.is_some() {
            self.artist = network.artist.clone();
        }
        if network.description.is_some() {
            self.description = network.description.clone();
        }
        if network.genre.is_some() {
            self.genre = network.genre.clone();
        }
        if network.status.is_some() {
            self.status = network.status.clone();
        }
        self.initialized = network.initialized;
    }
}
