// src/api/http.rs

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::api::{ApiFuture, HistoryApi};
use crate::collection::FetchFilter;
use crate::content::{ContentRecord, decode_page};
use crate::dag::{JobRecord, decode_jobs};
use crate::errors::SyncError;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl HttpSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// [`HistoryApi`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestHistoryApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ReqwestHistoryApi {
    pub fn new(settings: HttpSettings) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SyncError::network(err.to_string()))?;

        // `Url::join` drops the last path segment unless it ends in '/'.
        let mut base_url = settings.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.base_url
            .join(path)
            .map_err(|err| SyncError::network(format!("invalid endpoint '{path}': {err}")))
    }

    async fn get_bytes(
        &self,
        mut url: Url,
        query: Vec<(&'static str, String)>,
    ) -> Result<Vec<u8>, SyncError> {
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        debug!(%url, "GET");

        let mut request = self.client.get(url);
        if let Some(key) = self.api_key.as_deref() {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(status = status.as_u16(), %message, "server returned an error");
            return Err(SyncError::http_status(status.as_u16(), message));
        }

        Ok(body.to_vec())
    }
}

impl HistoryApi for ReqwestHistoryApi {
    fn fetch_contents(&self, filter: FetchFilter) -> ApiFuture<'_, Vec<ContentRecord>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("api/histories/{}/contents", filter.history_id))?;
            let body = self.get_bytes(url, filter.query_pairs()).await?;
            decode_page(&body)
        })
    }

    fn fetch_jobs(&self, history_id: &str) -> ApiFuture<'_, Vec<JobRecord>> {
        let history_id = history_id.to_string();
        Box::pin(async move {
            let url = self.endpoint("api/jobs")?;
            let body = self.get_bytes(url, vec![("history_id", history_id)]).await?;
            decode_jobs(&body)
        })
    }

    fn supports_abort(&self) -> bool {
        true
    }
}

/// Pull a human-readable message out of an error body.
///
/// The server uses `err_msg`; proxies in front of it tend to use `message`
/// or `detail`. Falls back to the status text.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["err_msg", "message", "detail"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}

fn map_reqwest_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() {
        return SyncError::network(format!("request timed out: {err}"));
    }
    SyncError::network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_server_field() {
        let body = br#"{"err_msg": "History is not accessible", "err_code": 403002}"#;
        let msg = error_message(StatusCode::FORBIDDEN, body);
        assert_eq!(msg, "History is not accessible");

        let msg = error_message(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(msg, "Bad Gateway");
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_its_path() {
        let settings = HttpSettings::new(Url::parse("https://example.org/galaxy").unwrap());
        let api = ReqwestHistoryApi::new(settings).unwrap();
        let url = api.endpoint("api/jobs").unwrap();
        assert_eq!(url.as_str(), "https://example.org/galaxy/api/jobs");
    }
}
