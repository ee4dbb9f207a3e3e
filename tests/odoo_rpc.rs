mod common;

use common::*;
use optiflow::app::check;
use optiflow::odoo::Domain;
use optiflow::odoo::OdooClient;
use optiflow::odoo::SearchOptions;
use optiflow::seeder::OdooSeeder;
use optiflow::supabase::SupabaseClient;
use optiflow::types::OptiError;
use serde_json::json;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn session_is_opened() {
    let server = odoo_server(shop()).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();

    assert_eq!(odoo.uid(), UID);
    assert_eq!(odoo.version().server_version, "17.0");
    assert_eq!(odoo.database(), DB);
}

#[tokio::test]
async fn rejected_login_is_an_auth_error() {
    let server = odoo_server(FakeOdoo {
        bad_login: true,
        ..Default::default()
    })
    .await;

    let err = OdooClient::connect(&odoo_args(&server)).await.unwrap_err();
    assert!(matches!(err, OptiError::Auth { service: "Odoo", .. }), "{err}");
    assert!(err.is_connection_failure());
}

#[tokio::test]
async fn unreachable_server_is_a_connection_failure() {
    let server = MockServer::start().await;
    let args = odoo_args(&server);
    drop(server);

    let err = OdooClient::connect(&args).await.unwrap_err();
    assert!(err.is_connection_failure(), "{err}");
}

#[tokio::test]
async fn faults_carry_server_details() {
    let mut fake = shop();
    fake.missing.push("stock.move");
    let server = odoo_server(fake).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();

    let err = odoo.search_count("stock.move", &Domain::new()).await.unwrap_err();
    match err {
        OptiError::Rpc { code, data, .. } => {
            assert_eq!(code, 200);
            assert_eq!(data.as_deref(), Some("builtins.KeyError: stock.move"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn calls_use_execute_kw_with_credentials() {
    let server = odoo_server(shop()).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();

    let rows: Vec<Value> = odoo
        .search_read(
            "res.partner",
            &Domain::new().eq("is_company", true),
            &["id", "name"],
            &SearchOptions::limit(5).ordered("id"),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests.last().unwrap().body_json().unwrap();
    assert_eq!(body["params"]["service"], "object");
    assert_eq!(
        body["params"]["args"],
        json!([
            DB,
            UID,
            PASSWORD,
            "res.partner",
            "search_read",
            [[["is_company", "=", true]]],
            { "fields": ["id", "name"], "limit": 5, "order": "id" }
        ])
    );
}

#[tokio::test]
async fn model_counts_tolerate_missing_modules() {
    let mut fake = shop();
    fake.missing.push("stock.move");
    let server = odoo_server(fake).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();

    let counts = check::model_counts(&odoo).await;
    assert_eq!(counts.len(), check::MODELS.len());
    assert!(counts.contains(&("product.product", Some(2))));
    assert!(counts.contains(&("sale.order.line", Some(4))));
    assert!(counts.contains(&("stock.move", None)));
}

#[tokio::test]
async fn write_check_creates_and_removes() {
    let server = odoo_server(shop()).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();

    assert_eq!(check::write_check(&odoo).await.unwrap(), CREATED_ID);

    let methods: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|r| r.body_json::<Value>().ok())
        .filter_map(|b| b["params"]["args"][4].as_str().map(str::to_string))
        .collect();
    assert_eq!(methods, ["create", "unlink"]);
}

#[tokio::test]
async fn supabase_rejects_bad_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = SupabaseClient::connect(&supabase_args(&server)).await.unwrap_err();
    assert!(matches!(err, OptiError::Auth { service: "Supabase", .. }), "{err}");
}

#[tokio::test]
async fn supabase_sends_key_and_counts() {
    let server = supabase_server(3573).await;
    let client = SupabaseClient::connect(&supabase_args(&server)).await.unwrap();

    assert_eq!(client.count("sales_data").await.unwrap(), 3573);

    let requests = requests_to(&server, "GET", "sales_data").await;
    let headers = &requests[0].headers;
    assert_eq!(headers.get("apikey").unwrap(), "service-role-key");
    assert_eq!(headers.get("authorization").unwrap(), "Bearer service-role-key");
    assert_eq!(headers.get("prefer").unwrap(), "count=exact");
}

#[tokio::test]
async fn seeder_sets_stock_through_inventory_adjustments() {
    let mut fake = shop();
    fake.ids.insert("stock.location", json!([8]));
    let server = odoo_server(fake).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();
    let ui = quiet_ui();

    let mut seeder = OdooSeeder::new(&odoo, &ui);
    seeder.set_quantity(1, 40).await.unwrap();
    assert_eq!(seeder.report().adjustments, 1);

    let calls: Vec<(String, String)> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|r| r.body_json::<Value>().ok())
        .filter(|b| b["params"]["method"] == "execute_kw")
        .map(|b| {
            let args = &b["params"]["args"];
            (args[3].as_str().unwrap().to_string(), args[4].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(
        calls,
        [
            ("stock.location".to_string(), "search".to_string()),
            ("stock.quant".to_string(), "search".to_string()),
            ("stock.quant".to_string(), "create".to_string()),
            ("stock.quant".to_string(), "action_apply_inventory".to_string()),
        ]
    );
}

#[tokio::test]
async fn seeder_fills_up_customers() {
    let server = odoo_server(shop()).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();
    let ui = quiet_ui();

    let mut seeder = OdooSeeder::new(&odoo, &ui);
    let customers = seeder.ensure_customers().await.unwrap();

    assert_eq!(customers.len(), optiflow::seeder::MIN_CUSTOMERS);
    assert_eq!(seeder.report().customers_created, optiflow::seeder::MIN_CUSTOMERS - 2);
    assert!(customers.iter().all(|c| c.is_company));
}

#[tokio::test]
async fn seeder_replays_orders_day_by_day() {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use optiflow::db::entity::Customer;
    use optiflow::generator::demo_catalog;
    use optiflow::generator::Generator;

    let mut fake = shop();
    fake.ids.insert("stock.location", json!([8]));
    fake.records.insert("sale.order", json!([{ "id": CREATED_ID, "picking_ids": [55] }]));
    let server = odoo_server(fake).await;
    let odoo = OdooClient::connect(&odoo_args(&server)).await.unwrap();
    let ui = quiet_ui();

    let customers = vec![
        Customer {
            id:         7,
            name:       "Azure Interior".into(),
            email:      None,
            phone:      None,
            city:       None,
            is_company: true,
        },
        Customer {
            id:         9,
            name:       "Deco Addict".into(),
            email:      None,
            phone:      None,
            city:       None,
            is_company: true,
        },
    ];
    let generator = Generator::builder()
        .start(NaiveDate::from_ymd_opt(2024, 9, 16).unwrap())
        .end(NaiveDate::from_ymd_opt(2024, 9, 18).unwrap())
        .seed(Some(4))
        .build()
        .unwrap();
    let dataset = generator.generate_for(&demo_catalog(), customers, &None).unwrap();

    let mut seeder = OdooSeeder::new(&odoo, &ui);
    let report = seeder.seed(&dataset).await.unwrap();

    let orders: BTreeSet<_> = dataset.sales.iter().map(|s| (s.sold_on, &s.customer_name)).collect();
    assert!(!orders.is_empty());
    assert_eq!(report.orders_created, orders.len());
    assert_eq!(report.orders_failed, 0);
    assert_eq!(report.pickings_validated, orders.len());
    assert_eq!(report.adjustments, dataset.products.len() + dataset.replenishments());
}
