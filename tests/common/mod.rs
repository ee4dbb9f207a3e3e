//! In-process stand-ins for Odoo's JSON-RPC endpoint and Supabase's REST API.
#![allow(dead_code)]

use std::collections::HashMap;

use optiflow::config::OdooArgs;
use optiflow::config::SupabaseArgs;
use optiflow::progress::ProgressUI;
use serde_json::json;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::path_regex;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::Request;
use wiremock::Respond;
use wiremock::ResponseTemplate;

pub const DB: &str = "optiflow";
pub const USER: &str = "admin";
pub const PASSWORD: &str = "admin";
pub const UID: i64 = 2;
pub const CREATED_ID: i64 = 100;

/// Answers JSON-RPC calls from canned per-model data.
#[derive(Default)]
pub struct FakeOdoo {
    /// `search_read` and `read` results per model.
    pub records:    HashMap<&'static str, Value>,
    /// `search` results per model.
    pub ids:        HashMap<&'static str, Value>,
    /// Models whose every call faults, as if their module wasn't installed.
    pub missing:    Vec<&'static str>,
    pub bad_login:  bool,
}

impl FakeOdoo {
    fn fault(model: &str) -> Value {
        json!({
            "code": 200,
            "message": "Odoo Server Error",
            "data": { "name": "builtins.KeyError", "message": model },
        })
    }

    fn execute_kw(&self, args: &[Value]) -> Result<Value, Value> {
        let model = args.get(3).and_then(Value::as_str).unwrap_or_default();
        let method = args.get(4).and_then(Value::as_str).unwrap_or_default();
        if self.missing.contains(&model) {
            return Err(Self::fault(model));
        }

        Ok(match method {
            "search_read" | "read" => self.records.get(model).cloned().unwrap_or_else(|| json!([])),
            "search" => self.ids.get(model).cloned().unwrap_or_else(|| json!([])),
            "search_count" => json!(self
                .records
                .get(model)
                .and_then(Value::as_array)
                .map_or(0, |rows| rows.len())),
            "create" => json!(CREATED_ID),
            _ => json!(true),
        })
    }
}

impl Respond for FakeOdoo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match request.body_json() {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let params = &body["params"];
        let args = params["args"].as_array().cloned().unwrap_or_default();

        let outcome = match (params["service"].as_str(), params["method"].as_str()) {
            (Some("common"), Some("version")) => Ok(json!({ "server_version": "17.0", "protocol_version": 1 })),
            (Some("common"), Some("login")) if self.bad_login => Ok(json!(false)),
            (Some("common"), Some("login")) => Ok(json!(UID)),
            (Some("object"), Some("execute_kw")) => self.execute_kw(&args),
            _ => Err(Self::fault("unknown service")),
        };

        let reply = match outcome {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": body["id"], "result": result }),
            Err(error) => json!({ "jsonrpc": "2.0", "id": body["id"], "error": error }),
        };
        ResponseTemplate::new(200).set_body_json(reply)
    }
}

pub async fn odoo_server(fake: FakeOdoo) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(fake)
        .mount(&server)
        .await;
    server
}

pub fn odoo_args(server: &MockServer) -> OdooArgs {
    OdooArgs::new(server.uri(), 8069, DB.to_string(), USER.to_string(), PASSWORD.to_string())
}

/// PostgREST that accepts every write and reports `rows` for every count.
pub async fn supabase_server(rows: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/rest/v1/\w+$"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/rest/v1/\w+$"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/rest/v1/\w+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", format!("0-0/{rows}").as_str())
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;
    server
}

pub fn supabase_args(server: &MockServer) -> SupabaseArgs {
    SupabaseArgs::new(server.uri(), "service-role-key".to_string())
}

/// Requests of `method` that reached `/rest/v1/{table}`.
pub async fn requests_to(server: &MockServer, method: &str, table: &str) -> Vec<Request> {
    let wanted = format!("/rest/v1/{table}");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == method && r.url.path() == wanted)
        .collect()
}

pub fn quiet_ui() -> ProgressUI {
    ProgressUI::builder().quiet(true).build().unwrap()
}

/// A small but complete Odoo: two stockable products, two companies, two orders with four lines.
pub fn shop() -> FakeOdoo {
    let mut fake = FakeOdoo::default();
    fake.records.insert(
        "product.product",
        json!([
            {
                "id": 1, "name": "Desk Lamp", "default_code": "ACC-LAMP", "categ_id": [3, "Accessories"],
                "list_price": 45.0, "standard_price": 22.0, "qty_available": 80.0, "virtual_available": 70.0,
                "incoming_qty": 5.0, "outgoing_qty": 15.0, "active": true
            },
            {
                "id": 2, "name": "Meeting Table", "default_code": false, "categ_id": false,
                "list_price": 1150.0, "standard_price": 0.0, "qty_available": 8.0, "virtual_available": 8.0,
                "incoming_qty": 0.0, "outgoing_qty": 0.0, "active": true
            }
        ]),
    );
    fake.records.insert(
        "res.partner",
        json!([
            { "id": 7, "name": "Azure Interior", "email": "azure@example.com", "phone": false, "city": "Fremont", "is_company": true },
            { "id": 9, "name": "Deco Addict", "email": false, "phone": "+1 555 0100", "city": false, "is_company": true }
        ]),
    );
    fake.records.insert(
        "sale.order",
        json!([
            { "id": 50, "name": "S00050", "partner_id": [7, "Azure Interior"], "date_order": "2024-09-16 09:12:00" },
            { "id": 51, "name": "S00051", "partner_id": false, "date_order": "2024-09-18 14:00:00" }
        ]),
    );
    fake.records.insert(
        "sale.order.line",
        json!([
            { "id": 501, "order_id": [50, "S00050"], "product_id": [1, "Desk Lamp"], "product_uom_qty": 4.0, "price_unit": 45.0, "price_subtotal": 180.0 },
            { "id": 502, "order_id": [50, "S00050"], "product_id": [2, "Meeting Table"], "product_uom_qty": 1.0, "price_unit": 1100.0, "price_subtotal": 1100.0 },
            { "id": 503, "order_id": [51, "S00051"], "product_id": [99, "Service"], "product_uom_qty": 2.0, "price_unit": 10.0, "price_subtotal": 20.0 },
            { "id": 504, "order_id": [51, "S00051"], "product_id": false, "product_uom_qty": 1.0, "price_unit": 0.0, "price_subtotal": 0.0 }
        ]),
    );
    fake
}
