//! Supabase / PostgREST-backed [`RecordStore`].
//!
//! Talks to `<project>/rest/v1/<table>` with the project's API key. Filters use
//! PostgREST's `column=eq.value` syntax and writes ask for
//! `Prefer: return=representation` so the stored row comes back.

use async_trait::async_trait;
use licensee_shared::{LicenseeError, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::{RecordStore, StoredRow, validate_identifier};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("licensee-enrich/", env!("CARGO_PKG_VERSION"));

/// Header asking PostgREST to echo written rows.
const RETURN_REPRESENTATION: &str = "return=representation";

/// Hosted table store reached over PostgREST.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    rest_url: Url,
}

impl PostgrestStore {
    /// Build a store for the project at `project_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(project_url: &str, api_key: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LicenseeError::config("missing store API key"));
        }

        let rest_url = Url::parse(&format!(
            "{}/rest/v1/",
            project_url.trim().trim_end_matches('/')
        ))
        .map_err(|e| LicenseeError::config(format!("invalid store URL '{project_url}': {e}")))?;

        let invalid_key = |_| LicenseeError::config("invalid store API key");
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key).map_err(invalid_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid_key)?,
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| LicenseeError::Store(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, rest_url })
    }

    /// `<rest>/<table>` with `key=eq.value` appended when a filter is given.
    fn table_url(&self, table: &str, filter: Option<(&str, &str)>) -> Result<Url> {
        validate_identifier("table", table)?;
        let mut url = self
            .rest_url
            .join(table)
            .map_err(|e| LicenseeError::config(format!("invalid table URL: {e}")))?;

        if let Some((key, value)) = filter {
            validate_identifier("column", key)?;
            url.query_pairs_mut()
                .append_pair(key, &format!("eq.{value}"));
        }
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    #[instrument(skip(self))]
    async fn find_by_key(&self, table: &str, key: &str, value: &str) -> Result<Option<StoredRow>> {
        let mut url = self.table_url(table, Some((key, value)))?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("limit", "1");

        let response = self.client.get(url).send().await.map_err(transport_err)?;
        let rows = decode_rows(response).await?;
        debug!(found = !rows.is_empty(), "lookup complete");
        Ok(rows.into_iter().next())
    }

    #[instrument(skip_all, fields(table = %table))]
    async fn insert(&self, table: &str, row: &StoredRow) -> Result<StoredRow> {
        let url = self.table_url(table, None)?;
        let response = self
            .client
            .post(url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(row)
            .send()
            .await
            .map_err(transport_err)?;

        decode_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LicenseeError::Store(format!("insert into {table} returned no rows")))
    }

    #[instrument(skip(self, row))]
    async fn update(
        &self,
        table: &str,
        key: &str,
        value: &str,
        row: &StoredRow,
    ) -> Result<StoredRow> {
        let url = self.table_url(table, Some((key, value)))?;
        let response = self
            .client
            .patch(url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(row)
            .send()
            .await
            .map_err(transport_err)?;

        decode_rows(response).await?.into_iter().next().ok_or_else(|| {
            LicenseeError::Store(format!("no rows in {table} matched {key} = {value}"))
        })
    }
}

fn transport_err(e: reqwest::Error) -> LicenseeError {
    LicenseeError::Store(e.to_string())
}

/// Decode a PostgREST response body into rows, surfacing API errors verbatim.
async fn decode_rows(response: Response) -> Result<Vec<StoredRow>> {
    let status = response.status();
    let body = response.text().await.map_err(transport_err)?;

    if !status.is_success() {
        return Err(LicenseeError::Store(error_message(status, &body)));
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| LicenseeError::Store(format!("malformed store response: {e}")))?;

    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect()),
        Value::Object(row) => Ok(vec![row]),
        _ => Err(LicenseeError::Store(
            "malformed store response: expected rows".into(),
        )),
    }
}

/// PostgREST error bodies carry `message`; fall back to the raw body or status.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match message {
        Some(m) => m,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("HTTP {status}"),
    }
}
