use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{GOOGLE_BOOKS_URL, METADATA_TIMEOUT_SECS};
use crate::error::IsbnError;

const USER_AGENT: &str = concat!("pdfsplit/", env!("CARGO_PKG_VERSION"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISBN13_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{13}$").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    pub parent_title: Option<String>,
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl BookMetadata {
    /// Fill fields that are still empty from `other`.
    pub fn fill_missing(&mut self, other: BookMetadata) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.parent_title, other.parent_title);
        fill(&mut self.isbn, other.isbn);
        fill(&mut self.author, other.author);
        fill(&mut self.publisher, other.publisher);
        fill(&mut self.published_date, other.published_date);
        fill(&mut self.genre, other.genre);
        fill(&mut self.description, other.description);
        fill(&mut self.language, other.language);
    }
}

/// Strip hyphens and spaces and require exactly 13 digits.
pub fn normalize_isbn(raw: &str) -> Result<String, IsbnError> {
    let digits: String = raw.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if ISBN13_PATTERN.is_match(&digits) {
        Ok(digits)
    } else {
        Err(IsbnError::Invalid(raw.to_string()))
    }
}

/// Take the ISBN from a file name such as `978-1493221851_SAP_Analytics_Cloud.pdf`.
///
/// The ISBN is the part of the stem before the first underscore.
pub fn isbn_from_filename(path: &Path) -> Result<String, IsbnError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = stem.split('_').next().unwrap_or_default();
    if prefix.is_empty() {
        return Err(IsbnError::MissingPrefix(stem));
    }
    normalize_isbn(prefix)
}

/// Source of book metadata keyed by ISBN-13.
///
/// Implementations swallow their own failures: `None` means "nothing known".
pub trait MetadataProvider {
    async fn lookup(&self, isbn: &str) -> Option<BookMetadata>;
}

/// Provider for runs without metadata lookup.
pub struct NoMetadata;

impl MetadataProvider for NoMetadata {
    async fn lookup(&self, _isbn: &str) -> Option<BookMetadata> {
        None
    }
}

/// Google Books volumes API.
pub struct GoogleBooks {
    client: Client,
    base_url: String,
}

impl GoogleBooks {
    pub fn new() -> Result<Self> {
        Self::with_base_url(GOOGLE_BOOKS_URL, Duration::from_secs(METADATA_TIMEOUT_SECS))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(GoogleBooks {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, isbn: &str) -> Result<Option<BookMetadata>> {
        let response = self
            .client
            .get(format!("{}/volumes", self.base_url))
            .query(&[("q", format!("isbn:{}", isbn))])
            .send()
            .await?
            .error_for_status()?;
        let body: VolumesResponse = response.json().await?;

        let Some(volume) = body.items.into_iter().next() else {
            return Ok(None);
        };
        let info = volume.volume_info;
        Ok(Some(BookMetadata {
            parent_title: info.title.map(|title| match info.subtitle {
                Some(subtitle) => format!("{}: {}", title, subtitle),
                None => title,
            }),
            isbn: Some(isbn.to_string()),
            author: (!info.authors.is_empty()).then(|| info.authors.join(", ")),
            publisher: info.publisher,
            published_date: info.published_date,
            genre: info.categories.into_iter().next(),
            description: info.description,
            language: info.language,
        }))
    }
}

impl MetadataProvider for GoogleBooks {
    async fn lookup(&self, isbn: &str) -> Option<BookMetadata> {
        match self.fetch(isbn).await {
            Ok(Some(found)) => {
                tracing::info!(isbn, title = ?found.parent_title, "Fetched book metadata");
                Some(found)
            }
            Ok(None) => {
                tracing::warn!(isbn, "No book found for ISBN");
                None
            }
            Err(e) => {
                tracing::warn!(isbn, error = %format!("{:#}", e), "Metadata lookup failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    categories: Vec<String>,
    language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_isbn_from_filename() {
        let isbn = isbn_from_filename(Path::new("978-1493221851_SAP_Analytics_Cloud.pdf"));
        assert_eq!(isbn.unwrap(), "9781493221851");
        let isbn = isbn_from_filename(Path::new("input_pdf/9781493221851.pdf"));
        assert_eq!(isbn.unwrap(), "9781493221851");
    }

    #[test]
    fn test_isbn_from_filename_rejects_bad_prefix() {
        assert_eq!(
            isbn_from_filename(Path::new("978-149322185_Short.pdf")),
            Err(IsbnError::Invalid("978-149322185".to_string()))
        );
        assert!(isbn_from_filename(Path::new("SAP_Analytics_Cloud.pdf")).is_err());
        assert!(isbn_from_filename(Path::new("97814932218X1_Book.pdf")).is_err());
        assert!(matches!(
            isbn_from_filename(Path::new("_Book.pdf")),
            Err(IsbnError::MissingPrefix(_))
        ));
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("978-3-16-148410-0").unwrap(), "9783161484100");
        assert!(normalize_isbn("97831614841000").is_err());
        assert!(normalize_isbn("").is_err());
    }

    #[test]
    fn test_fill_missing_keeps_supplied_values() {
        let mut supplied = BookMetadata {
            author: Some("Me".to_string()),
            ..Default::default()
        };
        supplied.fill_missing(BookMetadata {
            author: Some("Them".to_string()),
            publisher: Some("Press".to_string()),
            ..Default::default()
        });
        assert_eq!(supplied.author.as_deref(), Some("Me"));
        assert_eq!(supplied.publisher.as_deref(), Some("Press"));
    }

    #[tokio::test]
    async fn test_google_books_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .and(query_param("q", "isbn:9781493221851"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalItems": 1,
                "items": [{
                    "volumeInfo": {
                        "title": "SAP Analytics Cloud",
                        "subtitle": "The Comprehensive Guide",
                        "authors": ["Abassin Sidiq", "Ryan Wilson"],
                        "publisher": "Rheinwerk",
                        "publishedDate": "2021-08-26",
                        "description": "All about SAC.",
                        "categories": ["Computers"],
                        "language": "en"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let provider = GoogleBooks::with_base_url(&server.uri(), TEST_TIMEOUT).unwrap();
        let found = provider.lookup("9781493221851").await.unwrap();
        assert_eq!(
            found,
            BookMetadata {
                parent_title: Some("SAP Analytics Cloud: The Comprehensive Guide".to_string()),
                isbn: Some("9781493221851".to_string()),
                author: Some("Abassin Sidiq, Ryan Wilson".to_string()),
                publisher: Some("Rheinwerk".to_string()),
                published_date: Some("2021-08-26".to_string()),
                genre: Some("Computers".to_string()),
                description: Some("All about SAC.".to_string()),
                language: Some("en".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_google_books_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalItems": 0 })))
            .mount(&server)
            .await;

        let provider = GoogleBooks::with_base_url(&server.uri(), TEST_TIMEOUT).unwrap();
        assert_eq!(provider.lookup("9781493221851").await, None);
    }

    #[tokio::test]
    async fn test_google_books_server_error_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let provider = GoogleBooks::with_base_url(&server.uri(), TEST_TIMEOUT).unwrap();
        assert_eq!(provider.lookup("9781493221851").await, None);
    }

    #[tokio::test]
    async fn test_google_books_malformed_body_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let provider = GoogleBooks::with_base_url(&server.uri(), TEST_TIMEOUT).unwrap();
        assert_eq!(provider.lookup("9781493221851").await, None);
    }

    #[tokio::test]
    async fn test_google_books_timeout_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "totalItems": 0 }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let provider = GoogleBooks::with_base_url(&server.uri(), Duration::from_millis(100)).unwrap();
        let started = std::time::Instant::now();
        assert_eq!(provider.lookup("9781493221851").await, None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
