//! reqwest-backed directory client.
//!
//! Upstream layout (relative to the configured base URL):
//! - `GET  members`          -> `[Member, ...]` or `{"members": [Member, ...]}`
//! - `GET  activity/recent`  -> `[Activity, ...]` or `{"activity": [...]}`
//! - `POST presence`         <- `{"name": "..."}`

use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::{Activity, DirectoryClient, Member};
use crate::error::FetchError;

pub struct HttpDirectoryClient {
    base: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDirectoryClient {
    pub fn new(base: &str, timeout: Duration) -> anyhow::Result<Self> {
        // A trailing slash makes Url::join append instead of replacing the last segment.
        let base = if base.ends_with('/') { base.to_string() } else { format!("{}/", base) };
        let base = Url::parse(&base)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self { base, client, timeout })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(|e| FetchError::Transport(format!("bad endpoint {}: {}", path, e)))
    }

    fn classify(&self, op: &'static str, err: reqwest::Error) -> FetchError {
        let fe = if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        };
        match &fe {
            FetchError::Timeout(t) => warn!(target: "rollcall::directory", op, "upstream timed out after {:?}", t),
            _ => warn!(target: "rollcall::directory", op, "upstream unreachable: {}", fe),
        }
        fe
    }

    async fn get_list<T: DeserializeOwned>(&self, op: &'static str, path: &str, wrapper_key: &str) -> Result<Vec<T>, FetchError> {
        let url = self.endpoint(path)?;
        let resp = self.client.get(url).send().await.map_err(|e| self.classify(op, e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.classify(op, e))?;
        if !status.is_success() {
            warn!(target: "rollcall::directory", op, status = status.as_u16(), "upstream rejected request");
            return Err(FetchError::Status { status: status.as_u16(), body: truncate(&body, 256) });
        }
        parse_list(&body, wrapper_key).map_err(|e| {
            warn!(target: "rollcall::directory", op, "upstream response malformed: {}", e);
            e
        })
    }
}

impl DirectoryClient for HttpDirectoryClient {
    fn fetch_roster(&self) -> BoxFuture<'_, Result<Vec<Member>, FetchError>> {
        Box::pin(self.get_list("fetch_roster", "members", "members"))
    }

    fn fetch_recent_activity(&self) -> BoxFuture<'_, Result<Vec<Activity>, FetchError>> {
        Box::pin(self.get_list("fetch_recent_activity", "activity/recent", "activity"))
    }

    fn record_presence<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), FetchError>> {
        Box::pin(async move {
            let url = self.endpoint("presence")?;
            let resp = self.client
                .post(url)
                .json(&serde_json::json!({ "name": name }))
                .send()
                .await
                .map_err(|e| self.classify("record_presence", e))?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                warn!(target: "rollcall::directory", op = "record_presence", status = status.as_u16(), "upstream rejected request");
                return Err(FetchError::Status { status: status.as_u16(), body: truncate(&body, 256) });
            }
            Ok(())
        })
    }
}

/// Accept either a bare JSON array or an object wrapping the array under `wrapper_key`.
fn parse_list<T: DeserializeOwned>(body: &str, wrapper_key: &str) -> Result<Vec<T>, FetchError> {
    let v: serde_json::Value = serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let arr = match v {
        arr @ serde_json::Value::Array(_) => arr,
        serde_json::Value::Object(mut obj) => obj
            .remove(wrapper_key)
            .ok_or_else(|| FetchError::Malformed(format!("missing '{}' field", wrapper_key)))?,
        other => return Err(FetchError::Malformed(format!("expected array, got {}", type_name(&other)))),
    };
    serde_json::from_value(arr).map_err(|e| FetchError::Malformed(e.to_string()))
}

fn type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max { return s.to_string(); }
    let mut end = max;
    while !s.is_char_boundary(end) { end -= 1; }
    format!("{}...", &s[..end])
}
