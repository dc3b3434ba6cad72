/// # Live train info download
///
/// One blocking-style request per report: given a uniquely matched train,
/// the per-train timetable page is fetched from the journey planner's train
/// info endpoint. Retry and backoff policy is the caller's business; the
/// client only applies a plain request timeout.
use std::time::Duration;

use url::Url;

use crate::{error::LResult, models::TrainSnapshot};

/// Endpoint serving the per-train live timetable pages.
const DEFAULT_BASE_URL: &str = "https://www.rejseplanen.dk/bin/traininfo.exe/mn/";

/// Front-end identifier the live map sends along with every request.
const FRONTEND_ID: &str = "vs_livemap.vs_dsb";

/// Request timeout in seconds.
const TIMEOUT_SECS: u64 = 30;

/// HTTP client for the live train info pages.
#[derive(Debug, Clone)]
pub struct TraininfoClient {
    http: reqwest::Client,
    base_url: String,
}

impl TraininfoClient {
    pub fn new() -> LResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the endpoint (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds the live info URL for one train. The train's opaque id (which
    /// may contain slashes) extends the base path; the reference date and
    /// class bit select the timetable upstream renders.
    pub fn timetable_url(&self, train: &TrainSnapshot) -> LResult<Url> {
        let prodclass = train.class().to_string();
        let url = Url::parse_with_params(
            &format!("{}{}", self.base_url, train.id()),
            [
                ("L", FRONTEND_ID),
                ("date", train.refdate()),
                ("showWithoutHeader", "yes"),
                ("compactView", "yes"),
                ("prodclass", prodclass.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Fetches the live timetable page for one train. The body is decoded
    /// with the charset the response declares.
    pub async fn fetch_timetable_page(&self, train: &TrainSnapshot) -> LResult<String> {
        let url = self.timetable_url(train)?;
        log::info!("Downloading live train info from {url}...");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
