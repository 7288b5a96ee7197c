use crate::api::ReviewRecord;
use crate::review::PatternDraft;
use anyhow::{Context, Result};
use reqwest::blocking::Response;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

// ── Failure taxonomy ──

/// Reviewer-facing classification of a failed HTTP exchange. Pollers retry
/// all of these; one-shot submissions surface the message as an alert and
/// keep the UI state for correction.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFailure {
    NotConnected,
    NotFound,
    ServerError,
    Parse,
    Timeout,
    Aborted,
    Other(String),
}

impl RequestFailure {
    pub fn message(&self) -> String {
        match self {
            RequestFailure::NotConnected => {
                "Not connected. Please check your network connection.".to_string()
            }
            RequestFailure::NotFound => "Page not found (404).".to_string(),
            RequestFailure::ServerError => "Server error (500).".to_string(),
            RequestFailure::Parse => "Could not parse response.".to_string(),
            RequestFailure::Timeout => "Timeout error.".to_string(),
            RequestFailure::Aborted => "Request aborted.".to_string(),
            RequestFailure::Other(body) => format!("Error: {body}"),
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for RequestFailure {}

/// Map an error chain to its reviewer-facing message.
pub fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<RequestFailure>() {
        Some(failure) => failure.message(),
        None => format!("Error: {err}"),
    }
}

fn classify_transport(err: reqwest::Error) -> RequestFailure {
    if err.is_timeout() {
        RequestFailure::Timeout
    } else if err.is_connect() {
        RequestFailure::NotConnected
    } else {
        RequestFailure::Other(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: String) -> RequestFailure {
    match status {
        StatusCode::NOT_FOUND => RequestFailure::NotFound,
        StatusCode::INTERNAL_SERVER_ERROR => RequestFailure::ServerError,
        _ => RequestFailure::Other(body),
    }
}

// ── Client ──

/// Blocking HTTP client for the review service. Cheap to clone; every
/// background worker gets its own handle.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base: String,
}

/// Table data arrives either as a bare row array or wrapped in `{data: []}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableData {
    Wrapped { data: Vec<ReviewRecord> },
    Bare(Vec<ReviewRecord>),
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn read_body(response: Response) -> Result<String> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|_| RequestFailure::Parse)?;
        if !status.is_success() {
            return Err(classify_status(status, body).into());
        }
        Ok(body)
    }

    fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .map_err(classify_transport)?;
        Self::read_body(response)
    }

    fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<String> {
        let response = self
            .http
            .post(self.url(path))
            .form(form)
            .send()
            .map_err(classify_transport)?;
        Self::read_body(response)
    }

    // ── Endpoints ──

    /// Report fragment for a package; polled until the async render is done.
    pub fn fetch_report(&self, package_id: i64) -> Result<String> {
        self.get_text(&format!("/reviews/fetch_report/{package_id}"), &[])
    }

    /// Source excerpt for a file container at a [start, end) range. The
    /// server clamps oversized ranges to the actual file length.
    pub fn fetch_source(&self, file_id: i64, start: usize, end: usize) -> Result<String> {
        self.get_text(
            &format!("/reviews/fetch_source/{file_id}"),
            &[("start", start.to_string()), ("end", end.to_string())],
        )
    }

    /// Mark every line sharing a match hash as ignored within a package.
    pub fn add_ignore(&self, hash: &str, package: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/reviews/add_ignore"))
            .query(&[("hash", hash), ("package", package)])
            .send()
            .map_err(classify_transport)?;
        Self::read_body(response).map(|_| ())
    }

    /// Declassify a snippet as non-license text.
    pub fn snippet_decision(&self, snippet_id: i64) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/snippet/decision/{snippet_id}")))
            .query(&[("mark-non-license", "1")])
            .send()
            .map_err(classify_transport)?;
        Self::read_body(response).map(|_| ())
    }

    /// Submit a new pattern. Returns the redirect target on success;
    /// validation failures come back as the raw response body.
    pub fn create_pattern(&self, draft: &PatternDraft) -> Result<String> {
        self.post_form("/licenses/create_pattern", &draft.form_body())
    }

    /// Kick off a reindex job. Completion is observed by polling the report
    /// endpoint, not through this response.
    pub fn trigger_reindex(&self, package_id: i64) -> Result<()> {
        self.post_form(&format!("/reviews/reindex/{package_id}"), &[])
            .map(|_| ())
    }

    /// Detail fragment for one table row.
    pub fn fetch_detail(&self, review_id: i64) -> Result<String> {
        self.get_text("/reviews/detail_report", &[("id", review_id.to_string())])
    }

    /// Add an ignore glob for a package.
    pub fn add_glob(&self, glob: &str, package: &str) -> Result<()> {
        self.post_form(
            "/reviews/add_glob",
            &[
                ("glob".to_string(), glob.to_string()),
                ("package".to_string(), package.to_string()),
            ],
        )
        .map(|_| ())
    }

    /// Row JSON for the review table.
    pub fn fetch_reviews(&self, path: &str) -> Result<Vec<ReviewRecord>> {
        let body = self.get_text(path, &[])?;
        let data: TableData = serde_json::from_str(&body).map_err(|_| RequestFailure::Parse)?;
        Ok(match data {
            TableData::Wrapped { data } => data,
            TableData::Bare(rows) => rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn failure_messages_match_the_taxonomy() {
        assert_eq!(
            RequestFailure::NotConnected.message(),
            "Not connected. Please check your network connection."
        );
        assert_eq!(RequestFailure::NotFound.message(), "Page not found (404).");
        assert_eq!(RequestFailure::ServerError.message(), "Server error (500).");
        assert_eq!(RequestFailure::Parse.message(), "Could not parse response.");
        assert_eq!(RequestFailure::Timeout.message(), "Timeout error.");
        assert_eq!(RequestFailure::Aborted.message(), "Request aborted.");
        assert_eq!(
            RequestFailure::Other("license name taken".into()).message(),
            "Error: license name taken"
        );
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, String::new()),
            RequestFailure::NotFound
        );
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            RequestFailure::ServerError
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, "bad glob".into()),
            RequestFailure::Other("bad glob".into())
        );
    }

    #[test]
    fn failure_message_falls_back_to_raw_error() {
        let err = anyhow!("split failure");
        assert_eq!(failure_message(&err), "Error: split failure");
        let err: anyhow::Error = RequestFailure::Timeout.into();
        assert_eq!(failure_message(&err), "Timeout error.");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/reviews/fetch_report/1"), "http://localhost:3000/reviews/fetch_report/1");
    }
}
