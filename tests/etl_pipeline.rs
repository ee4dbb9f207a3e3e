mod common;

use chrono::NaiveDate;
use common::*;
use optiflow::etl::EtlOptions;
use optiflow::etl::Pipeline;
use optiflow::etl::Stage;
use optiflow::loader::RestSink;
use optiflow::odoo::OdooClient;
use optiflow::supabase::SupabaseClient;
use optiflow::types::SyncStatus;
use serde_json::Value;

fn options() -> EtlOptions {
    EtlOptions::builder()
        .today(NaiveDate::from_ymd_opt(2024, 9, 20).unwrap())
        .build()
        .unwrap()
}

async fn body_rows(server: &wiremock::MockServer, table: &str) -> Vec<Value> {
    requests_to(server, "POST", table)
        .await
        .iter()
        .flat_map(|r| r.body_json::<Vec<Value>>().unwrap())
        .collect()
}

#[tokio::test]
async fn etl_copies_odoo_into_supabase() {
    let odoo_server = odoo_server(shop()).await;
    let supabase = supabase_server(7).await;

    let odoo = OdooClient::connect(&odoo_args(&odoo_server)).await.unwrap();
    let sink = RestSink::new(SupabaseClient::new(&supabase_args(&supabase)).unwrap());
    let ui = quiet_ui();

    let summary = Pipeline::new(&odoo, &sink, &ui, options()).run().await.unwrap();

    assert_eq!(summary.failed_stages(), 0);
    assert!(summary.stages.iter().all(|s| s.status == SyncStatus::Success));

    let products = body_rows(&supabase, "products").await;
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["reference"], "ACC-LAMP");
    assert_eq!(products[0]["rotation"], "fast");
    assert_eq!(products[1]["reference"], "REF-2");
    assert_eq!(products[1]["category"], "Uncategorized");
    assert_eq!(products[1]["rotation"], "slow");

    let customers = body_rows(&supabase, "customers").await;
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[1]["email"], Value::Null);

    let stock = body_rows(&supabase, "stock_data").await;
    assert_eq!(stock.len(), 2);
    assert_eq!(stock[0]["recorded_on"], "2024-09-20");
    assert_eq!(stock[0]["movement"], -10);
    let upsert = &requests_to(&supabase, "POST", "stock_data").await[0];
    assert!(upsert
        .url
        .query_pairs()
        .any(|(k, v)| k == "on_conflict" && v == "product_id,recorded_on"));

    // Line 503 refers to a product that wasn't extracted, line 504 has none.
    let sales = body_rows(&supabase, "sales_data").await;
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0]["order_ref"], "S00050");
    assert_eq!(sales[0]["customer_name"], "Azure Interior");
    assert_eq!(sales[0]["margin"], 92.0);
    let sales_stage = summary.stages.iter().find(|s| s.stage == Stage::Sales).unwrap();
    assert_eq!(sales_stage.skipped, 2);

    let log = body_rows(&supabase, "etl_sync_log").await;
    assert_eq!(log.len(), 4);
    assert!(log.iter().all(|row| row.get("id").is_none()));
    assert_eq!(log[0]["sync_type"], "products");
    assert_eq!(log[0]["status"], "success");

    assert!(summary.counts.iter().all(|(_, n)| *n == Some(7)));
}

#[tokio::test]
async fn failing_stage_does_not_stop_the_run() {
    let mut fake = shop();
    fake.missing.push("res.partner");
    let odoo_server = odoo_server(fake).await;
    let supabase = supabase_server(0).await;

    let odoo = OdooClient::connect(&odoo_args(&odoo_server)).await.unwrap();
    let sink = RestSink::new(SupabaseClient::new(&supabase_args(&supabase)).unwrap());
    let ui = quiet_ui();

    let summary = Pipeline::new(&odoo, &sink, &ui, options()).run().await.unwrap();

    assert_eq!(summary.failed_stages(), 1);
    let statuses: Vec<_> = summary.stages.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        [SyncStatus::Success, SyncStatus::Failed, SyncStatus::Success, SyncStatus::Success]
    );

    let log = body_rows(&supabase, "etl_sync_log").await;
    assert_eq!(log[1]["status"], "failed");
    assert!(log[1]["error_message"].as_str().unwrap().contains("res.partner"));
    assert_eq!(body_rows(&supabase, "sales_data").await.len(), 2);
}

#[tokio::test]
async fn clean_run_empties_fact_tables_first() {
    let odoo_server = odoo_server(shop()).await;
    let supabase = supabase_server(0).await;

    let odoo = OdooClient::connect(&odoo_args(&odoo_server)).await.unwrap();
    let sink = RestSink::new(SupabaseClient::new(&supabase_args(&supabase)).unwrap());
    let ui = quiet_ui();
    let options = EtlOptions::builder().clean(true).build().unwrap();

    Pipeline::new(&odoo, &sink, &ui, options).run().await.unwrap();

    let deletes = supabase
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .map(|r| r.url.path().to_string())
        .collect::<Vec<_>>();
    assert_eq!(deletes, ["/rest/v1/sales_data", "/rest/v1/stock_data"]);
}
