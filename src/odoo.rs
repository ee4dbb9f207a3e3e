//! Odoo external API over JSON-RPC.
//!
//! Every call is a `POST {base}/jsonrpc` carrying a `service`/`method`/`args` triple. Model access goes through
//! `object.execute_kw` with the database name, the uid obtained at login and the password.

pub mod domain;
pub mod value;

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::instrument;
use tracing::trace;

pub use domain::Domain;
pub use value::odoo_nullable;
pub use value::Many2One;

use crate::config::OdooArgs;
use crate::types::opterr;
use crate::types::OptiError;
use crate::types::Result;

const SERVICE: &str = "Odoo";

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method:  &'static str,
    params:  RpcParams<'a>,
    id:      u64,
}

#[derive(Serialize)]
struct RpcParams<'a> {
    service: &'a str,
    method:  &'a str,
    args:    Vec<Value>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error:  Option<RpcFault>,
}

#[derive(Deserialize)]
struct RpcFault {
    #[serde(default)]
    code:    i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data:    Option<RpcFaultData>,
}

#[derive(Deserialize)]
struct RpcFaultData {
    #[serde(default)]
    name:    String,
    #[serde(default)]
    message: String,
}

impl From<RpcFault> for OptiError {
    fn from(fault: RpcFault) -> Self {
        let data = fault.data.map(|d| {
            if d.name.is_empty() {
                d.message
            }
            else {
                format!("{}: {}", d.name, d.message)
            }
        });
        OptiError::Rpc {
            code: fault.code,
            message: fault.message,
            data,
        }
    }
}

/// Server identification returned by `common.version`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerVersion {
    pub server_version: String,
    #[serde(default)]
    pub protocol_version: Option<i64>,
}

/// Paging and ordering for `search` and `search_read`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    pub order: Option<String>,
}

impl SearchOptions {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn ordered<S: Into<String>>(mut self, order: S) -> Self {
        self.order = Some(order.into());
        self
    }

    fn apply(&self, kwargs: &mut Map<String, Value>) {
        if let Some(limit) = self.limit {
            kwargs.insert("limit".into(), json!(limit));
        }
        if let Some(order) = &self.order {
            kwargs.insert("order".into(), json!(order));
        }
    }
}

/// An authenticated session.
#[derive(Debug)]
pub struct OdooClient {
    http:       reqwest::Client,
    endpoint:   Url,
    database:   String,
    username:   String,
    password:   String,
    uid:        i64,
    version:    ServerVersion,
    request_id: AtomicU64,
}

impl OdooClient {
    /// Opens a session: checks the server answers `common.version`, then logs in. A rejected login is an
    /// authentication error; no retry is attempted.
    #[instrument(level = "debug", skip(args), fields(db = %args.database(), user = %args.username()))]
    pub async fn connect(args: &OdooArgs) -> Result<Self> {
        let endpoint = args
            .base_url()?
            .join("jsonrpc")
            .map_err(|err| OptiError::config(format!("Cannot build Odoo endpoint: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(args.timeout()))
            .build()?;

        let mut client = Self {
            http,
            endpoint,
            database: args.database(),
            username: args.username(),
            password: args.password(),
            uid: 0,
            version: ServerVersion {
                server_version:   String::new(),
                protocol_version: None,
            },
            request_id: AtomicU64::new(1),
        };

        let version = client
            .call("common", "version", vec![])
            .await
            .map_err(|err| OptiError::auth(SERVICE, format!("server at {} unreachable: {err}", client.endpoint)))?;
        client.version = serde_json::from_value(version)?;

        let uid = client
            .call(
                "common",
                "login",
                vec![
                    json!(client.database),
                    json!(client.username),
                    json!(client.password),
                ],
            )
            .await
            .map_err(|err| OptiError::auth(SERVICE, format!("login rejected: {err}")))?;

        client.uid = match uid {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| OptiError::auth(SERVICE, format!("unexpected uid {n}")))?,
            _ => {
                return Err(OptiError::auth(
                    SERVICE,
                    format!("invalid credentials for '{}' on database '{}'", client.username, client.database),
                ))
            }
        };

        debug!(uid = client.uid, version = %client.version.server_version, "Odoo session opened");
        Ok(client)
    }

    pub fn uid(&self) -> i64 {
        self.uid
    }

    pub fn version(&self) -> &ServerVersion {
        &self.version
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Raw JSON-RPC call.
    pub async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams { service, method, args },
            id,
        };

        trace!(id, service, method, "JSON-RPC call");
        let response = self.http.post(self.endpoint.clone()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OptiError::Api {
                service: SERVICE,
                status:  status.as_u16(),
                body:    response.text().await.unwrap_or_default(),
            });
        }

        let response: RpcResponse = response.json().await?;
        if let Some(fault) = response.error {
            return Err(fault.into());
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// `object.execute_kw` on `model`.
    pub async fn execute_kw(&self, model: &str, method: &str, args: Value, kwargs: Value) -> Result<Value> {
        self.call(
            "object",
            "execute_kw",
            vec![
                json!(self.database),
                json!(self.uid),
                json!(self.password),
                json!(model),
                json!(method),
                args,
                kwargs,
            ],
        )
        .await
    }

    pub async fn search(&self, model: &str, domain: &Domain, options: &SearchOptions) -> Result<Vec<i64>> {
        let mut kwargs = Map::new();
        options.apply(&mut kwargs);
        let ids = self
            .execute_kw(model, "search", json!([domain]), Value::Object(kwargs))
            .await?;
        Ok(serde_json::from_value(ids)?)
    }

    pub async fn search_count(&self, model: &str, domain: &Domain) -> Result<u64> {
        let count = self.execute_kw(model, "search_count", json!([domain]), json!({})).await?;
        count
            .as_u64()
            .ok_or_else(|| opterr!("search_count on {model} returned {count}"))
    }

    #[instrument(level = "debug", skip(self, domain, options))]
    pub async fn search_read<T: DeserializeOwned>(
        &self,
        model: &str,
        domain: &Domain,
        fields: &[&str],
        options: &SearchOptions,
    ) -> Result<Vec<T>> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".into(), json!(fields));
        options.apply(&mut kwargs);
        let records = self
            .execute_kw(model, "search_read", json!([domain]), Value::Object(kwargs))
            .await?;
        Ok(serde_json::from_value(records)?)
    }

    pub async fn read<T: DeserializeOwned>(&self, model: &str, ids: &[i64], fields: &[&str]) -> Result<Vec<T>> {
        let records = self
            .execute_kw(model, "read", json!([ids]), json!({ "fields": fields }))
            .await?;
        Ok(serde_json::from_value(records)?)
    }

    pub async fn create(&self, model: &str, values: Value) -> Result<i64> {
        let id = self.execute_kw(model, "create", json!([values]), json!({})).await?;
        // Newer servers answer with a list of ids even for a single record.
        match &id {
            Value::Number(n) => n.as_i64(),
            Value::Array(ids) => ids.first().and_then(Value::as_i64),
            _ => None,
        }
        .ok_or_else(|| opterr!("create on {model} returned {id}"))
    }

    pub async fn write(&self, model: &str, ids: &[i64], values: Value) -> Result<bool> {
        let done = self.execute_kw(model, "write", json!([ids, values]), json!({})).await?;
        Ok(done.as_bool().unwrap_or(false))
    }

    pub async fn unlink(&self, model: &str, ids: &[i64]) -> Result<bool> {
        let done = self.execute_kw(model, "unlink", json!([ids]), json!({})).await?;
        Ok(done.as_bool().unwrap_or(false))
    }

    /// Calls a public model method on a set of records, e.g. `action_confirm` on `sale.order`.
    pub async fn call_method(&self, model: &str, method: &str, ids: &[i64]) -> Result<Value> {
        self.execute_kw(model, method, json!([ids]), json!({})).await
    }
}
