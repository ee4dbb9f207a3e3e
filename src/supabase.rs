//! Thin client for Supabase's PostgREST endpoint (`{url}/rest/v1/{table}`).

use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;

use crate::config::SupabaseArgs;
use crate::types::opterr;
use crate::types::OptiError;
use crate::types::Result;

const SERVICE: &str = "Supabase";
const PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http:     reqwest::Client,
    rest_url: Url,
}

impl SupabaseClient {
    /// Builds the client without touching the network.
    pub fn new(args: &SupabaseArgs) -> Result<Self> {
        let url = args.url();
        let rest_url = Url::parse(&format!("{}/rest/v1/", url.trim_end_matches('/')))
            .map_err(|err| OptiError::config(format!("Bad SUPABASE_URL '{url}': {err}")))?;

        let key = args.key();
        let mut headers = HeaderMap::new();
        let apikey =
            HeaderValue::from_str(&key).map_err(|_| OptiError::config("SUPABASE_KEY is not a valid header value"))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| OptiError::config("SUPABASE_KEY is not a valid header value"))?;
        headers.insert("apikey", apikey);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self { http, rest_url })
    }

    /// Builds the client and verifies the key with a one-row select of `products`.
    #[instrument(level = "debug", skip(args))]
    pub async fn connect(args: &SupabaseArgs) -> Result<Self> {
        let client = Self::new(args)?;
        let response = client
            .request(Method::GET, "products")?
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await
            .map_err(|err| OptiError::auth(SERVICE, format!("{} unreachable: {err}", client.rest_url)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(OptiError::auth(SERVICE, body))
            }
            _ => {
                Self::check(response).await?;
                debug!("Supabase session verified");
                Ok(client)
            }
        }
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.rest_url
            .join(table)
            .map_err(|err| opterr!("Bad table name '{table}': {err}"))
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder> {
        Ok(self.http.request(method, self.table_url(table)?))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        }
        else {
            Err(OptiError::Api {
                service: SERVICE,
                status:  status.as_u16(),
                body:    response.text().await.unwrap_or_default(),
            })
        }
    }

    /// All rows of `table` matching the PostgREST `filters`, fetched page by page.
    #[instrument(level = "debug", skip(self, filters))]
    pub async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        let mut offset = 0usize;

        loop {
            let response = self
                .request(Method::GET, table)?
                .query(&[("select", "*")])
                .query(filters)
                .query(&[("limit", PAGE_SIZE), ("offset", offset)])
                .send()
                .await?;
            let page: Vec<T> = Self::check(response).await?.json().await?;
            let fetched = page.len();
            rows.extend(page);

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(rows)
    }

    /// Exact row count using the `Content-Range` header.
    pub async fn count(&self, table: &str) -> Result<u64> {
        let response = self
            .request(Method::GET, table)?
            .header("Prefer", "count=exact")
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?;
        let response = Self::check(response).await?;

        let range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| opterr!("No Content-Range in count response for '{table}'"))?;

        parse_content_range_total(range).ok_or_else(|| opterr!("Cannot parse Content-Range '{range}' of '{table}'"))
    }

    /// Insert-or-update by the `on_conflict` columns.
    pub async fn upsert<T: Serialize>(&self, table: &str, on_conflict: &str, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let response = self
            .request(Method::POST, table)?
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn insert<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let response = self
            .request(Method::POST, table)?
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Deletes every row. PostgREST refuses unfiltered deletes, hence the always-true filter on `key_column`.
    pub async fn delete_all(&self, table: &str, key_column: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, table)?
            .query(&[(key_column, "not.is.null")])
            .header("Prefer", "return=minimal")
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// `0-24/3573` → 3573, `*/0` → 0.
fn parse_content_range_total(range: &str) -> Option<u64> {
    range.rsplit_once('/').and_then(|(_, total)| total.trim().parse().ok())
}
