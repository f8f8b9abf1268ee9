//! Production calendar page retrieval
//!
//! Pages come either from the network ([`Fetcher`]) or from a file saved
//! earlier ([`SavedPage`]); both implement [`PageSource`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SourceError};

/// Default page address, `{year}` is substituted
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://www.consultant.ru/law/ref/calendar/proizvodstvennye/{year}/";

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = concat!("prodcal/", env!("CARGO_PKG_VERSION"));

/// Anything that can supply the calendar page for a year
pub trait PageSource {
    /// HTML text of the page for `year`
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the page cannot be obtained.
    fn page(&self, year: i32) -> Result<String>;

    /// Where the page comes from, for logs and messages
    fn describe(&self, year: i32) -> String;
}

/// HTTP settings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchOptions {
    /// Page address with a `{year}` placeholder
    pub url_template: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Substitute `year` into a URL template
#[must_use]
pub fn year_url(template: &str, year: i32) -> String {
    template.replace("{year}", &year.to_string())
}

/// Downloads calendar pages over HTTP
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::blocking::Client,
    options: FetchOptions,
}

impl Fetcher {
    /// Build a fetcher with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Http` if the client cannot be built.
    pub fn new(options: FetchOptions) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|source| SourceError::Http {
                url: options.url_template.clone(),
                source,
            })?;
        Ok(Self { client, options })
    }

    #[must_use]
    pub fn url_for(&self, year: i32) -> String {
        year_url(&self.options.url_template, year)
    }

    /// Download the page for `year`
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Http` on transport failures and
    /// `SourceError::Status` for non-success responses.
    pub fn fetch_year(&self, year: i32) -> Result<String> {
        let url = self.url_for(year);
        log::info!("Fetching {url}");

        let response = self.client.get(&url).send().map_err(|source| {
            log::warn!("Failed to fetch {url}: {source}");
            SourceError::Http {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("HTTP error {status} fetching {url}");
            return Err(SourceError::Status { url, status });
        }

        let body = response
            .text()
            .map_err(|source| SourceError::Http { url: url.clone(), source })?;
        log::debug!("Received {} bytes from {url}", body.len());
        Ok(body)
    }
}

impl PageSource for Fetcher {
    fn page(&self, year: i32) -> Result<String> {
        self.fetch_year(year)
    }

    fn describe(&self, year: i32) -> String {
        self.url_for(year)
    }
}

/// A page saved to disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SavedPage {
    path: PathBuf,
}

impl SavedPage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for SavedPage {
    fn page(&self, _year: i32) -> Result<String> {
        load_file(&self.path)
    }

    fn describe(&self, _year: i32) -> String {
        self.path.display().to_string()
    }
}

/// Read a saved page
///
/// # Errors
///
/// Returns `SourceError::Read` if the file cannot be read as UTF-8 text.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    log::info!("Reading {}", path.display());
    fs::read_to_string(path).map_err(|e| SourceError::read_error(path, e))
}
