use async_trait::async_trait;
use image::DynamicImage;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Cursor;

use super::model::Manga;
use super::source::Source;
use crate::error::SourceError;

const BASE_URL: &str = "https://api.mangadex.org";
const COVER_URL: &str = "https://uploads.mangadex.org/covers";
const WEB_URL: &str = "https://mangadex.org/title";
const PAGE_SIZE: u32 = 20;

pub const MANGADEX_ID: i32 = 1;

#[derive(Debug, Deserialize)]
struct MangaListResponse {
    data: Vec<MangaData>,
}

#[derive(Debug, Deserialize)]
struct MangaEntityResponse {
    data: MangaData,
}

#[derive(Debug, Deserialize)]
struct MangaData {
    id: String,
    attributes: MangaAttributes,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
struct MangaAttributes {
    title: HashMap<String, String>,
    status: Option<String>,
    description: Option<HashMap<String, String>>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    attributes: TagAttributes,
}

#[derive(Debug, Deserialize)]
struct TagAttributes {
    name: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    #[serde(rename = "type")]
    rel_type: String,
    attributes: Option<RelationshipAttributes>,
}

#[derive(Debug, Deserialize)]
struct RelationshipAttributes {
    name: Option<String>,
    #[serde(rename = "fileName")]
    file_name: Option<String>,
}

fn localized(map: &HashMap<String, String>) -> Option<String> {
    map.get("en").or_else(|| map.values().next()).cloned()
}

fn manga_path(id: &str) -> String {
    format!("/manga/{}", id)
}

fn parse_stub(m: MangaData) -> Manga {
    let title = localized(&m.attributes.title).unwrap_or_else(|| "Unknown".to_string());
    Manga::stub(MANGADEX_ID, manga_path(&m.id), title)
}

fn parse_detail(m: MangaData) -> Manga {
    let mut author = None;
    let mut artist = None;
    let mut cover_filename = None;

    for rel in &m.relationships {
        let Some(attrs) = &rel.attributes else {
            continue;
        };
        match rel.rel_type.as_str() {
            "author" => author = attrs.name.clone(),
            "artist" => artist = attrs.name.clone(),
            "cover_art" => cover_filename = attrs.file_name.clone(),
            _ => {}
        }
    }

    // Thumbnail size (256px) keeps the list responsive
    let thumbnail_url =
        cover_filename.map(|file| format!("{}/{}/{}.256.jpg", COVER_URL, m.id, file));

    let genre = m
        .attributes
        .tags
        .iter()
        .filter_map(|t| localized(&t.attributes.name))
        .collect::<Vec<_>>()
        .join(", ");

    Manga {
        id: None,
        source: MANGADEX_ID,
        url: manga_path(&m.id),
        title: localized(&m.attributes.title).unwrap_or_else(|| "Unknown".to_string()),
        thumbnail_url,
        author,
        artist,
        description: m.attributes.description.as_ref().and_then(localized),
        genre: (!genre.is_empty()).then_some(genre),
        status: m.attributes.status,
        initialized: true,
    }
}

fn build_client() -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("catalogue-tui/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

pub struct MangaDex {
    client: reqwest::Client,
}

impl MangaDex {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client()?,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Http(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn list(&self, query: &str, page: u32) -> Result<Vec<Manga>, SourceError> {
        let offset = page.saturating_sub(1) * PAGE_SIZE;
        let url = format!(
            "{}/manga?limit={}&offset={}&{}",
            BASE_URL, PAGE_SIZE, offset, query
        );
        let response: MangaListResponse = self.get_json(&url).await?;
        Ok(response.data.into_iter().map(parse_stub).collect())
    }
}

#[async_trait]
impl Source for MangaDex {
    fn id(&self) -> i32 {
        MANGADEX_ID
    }

    fn name(&self) -> &str {
        "MangaDex"
    }

    async fn popular(&self, page: u32) -> Result<Vec<Manga>, SourceError> {
        self.list("order[followedCount]=desc", page).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<Manga>, SourceError> {
        let query = format!(
            "title={}&order[relevance]=desc",
            urlencoding::encode(query)
        );
        self.list(&query, page).await
    }

    async fn detail(&self, url: &str) -> Result<Manga, SourceError> {
        if !url.starts_with("/manga/") {
            return Err(SourceError::Payload(format!("not a MangaDex path: {}", url)));
        }
        let url = format!(
            "{}{}?includes[]=author&includes[]=artist&includes[]=cover_art",
            BASE_URL, url
        );
        let response: MangaEntityResponse = self.get_json(&url).await?;
        Ok(parse_detail(response.data))
    }

    fn web_url(&self, url: &str) -> String {
        format!("{}/{}", WEB_URL, url.trim_start_matches("/manga/"))
    }
}

pub async fn fetch_cover_image(cover_url: &str) -> Option<DynamicImage> {
    if cover_url.is_empty() {
        return None;
    }

    let client = build_client().ok()?;
    let response = client.get(cover_url).send().await.ok()?;
    let bytes = response.bytes().await.ok()?;

    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .decode()
        .ok()
}
