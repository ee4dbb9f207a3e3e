#![cfg(feature = "sqlite")]

use std::sync::Arc;

use chrono::NaiveDate;
use chrono::Utc;
use optiflow::db::driver::sqlite::Sqlite;
use optiflow::db::driver::DatabaseDriver;
use optiflow::db::entity::Product;
use optiflow::db::entity::SalesRecord;
use optiflow::db::entity::StockRecord;
use optiflow::db::entity::SyncLog;
use optiflow::db::entity::SyncLogs;
use optiflow::generator::demo_catalog;
use optiflow::generator::Generator;
use optiflow::loader::load_records;
use optiflow::loader::Sink;
use optiflow::loader::SqlSink;
use optiflow::types::SyncStatus;
use sea_orm::EntityTrait;

async fn sink() -> SqlSink {
    let driver = Sqlite::in_memory().await.unwrap();
    driver.configure().await.unwrap();
    driver.migrate().await.unwrap();
    SqlSink::new(Arc::new(driver))
}

fn sale(id: i64, product_id: i64) -> SalesRecord {
    SalesRecord {
        id,
        sold_on: NaiveDate::from_ymd_opt(2024, 9, 16).unwrap(),
        product_id,
        order_ref: format!("SO{id:05}"),
        customer_name: "Azure Interior".into(),
        quantity: 2,
        unit_price: 15.0,
        total_amount: 30.0,
        margin: 18.0,
    }
}

#[tokio::test]
async fn upsert_overwrites_by_key() {
    let sink = sink().await;
    let mut catalog = demo_catalog();
    sink.upsert(&catalog).await.unwrap();
    assert_eq!(sink.count::<Product>().await.unwrap(), catalog.len() as u64);

    catalog[0].list_price = 999.0;
    sink.upsert(&catalog[..1]).await.unwrap();
    assert_eq!(sink.count::<Product>().await.unwrap(), catalog.len() as u64);

    let stored = sink.fetch_all::<Product>().await.unwrap();
    let first = stored.iter().find(|p| p.id == catalog[0].id).unwrap();
    assert_eq!(first.list_price, 999.0);
}

#[tokio::test]
async fn rejected_batch_is_loaded_record_by_record() {
    let sink = sink().await;
    sink.upsert(&demo_catalog()).await.unwrap();

    // Product 999 does not exist, so its batch trips the foreign key.
    let sales = vec![sale(1, 1), sale(2, 2), sale(3, 999), sale(4, 3), sale(5, 4)];
    let report = load_records(&sink, &sales, 2, &None).await;

    assert_eq!(report.table, "sales_data");
    assert_eq!(report.loaded, 4);
    assert_eq!(report.failed, 1);
    assert_eq!(report.split, 1);
    assert!(report.first_error.is_some());
    assert_eq!(sink.count::<SalesRecord>().await.unwrap(), 4);
}

#[tokio::test]
async fn generated_history_loads_and_clears() {
    let sink = sink().await;
    let (start, end) = Generator::months(2024, 9, 9).unwrap();
    let generator = Generator::builder()
        .start(start)
        .end(end)
        .seed(Some(9))
        .build()
        .unwrap();
    let dataset = generator.generate(&demo_catalog(), &None).unwrap();

    for report in [
        load_records(&sink, &dataset.products, 100, &None).await,
        load_records(&sink, &dataset.customers, 100, &None).await,
        load_records(&sink, &dataset.sales, 100, &None).await,
        load_records(&sink, &dataset.stock, 100, &None).await,
    ] {
        assert!(report.is_clean(), "{report:?}");
    }
    assert_eq!(sink.count::<StockRecord>().await.unwrap(), 30 * 12);
    assert_eq!(sink.count::<SalesRecord>().await.unwrap(), dataset.sales.len() as u64);

    // Re-loading the same rows changes nothing.
    let report = load_records(&sink, &dataset.stock, 100, &None).await;
    assert_eq!(report.loaded, dataset.stock.len());
    assert_eq!(sink.count::<StockRecord>().await.unwrap(), 30 * 12);

    sink.clear::<SalesRecord>().await.unwrap();
    sink.clear::<StockRecord>().await.unwrap();
    assert_eq!(sink.count::<SalesRecord>().await.unwrap(), 0);
    assert_eq!(sink.count::<StockRecord>().await.unwrap(), 0);
    assert_eq!(sink.count::<Product>().await.unwrap(), 12);
}

#[tokio::test]
async fn sync_log_rows_get_ids() {
    let sink = sink().await;
    for (sync_type, status) in [("products", SyncStatus::Success), ("sales", SyncStatus::Failed)] {
        sink.record_sync(SyncLog {
            id: 0,
            sync_type: sync_type.into(),
            status,
            records_processed: 3,
            records_failed: 0,
            error_message: None,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            duration_seconds: 0.5,
        })
        .await
        .unwrap();
    }

    let rows = SyncLogs::find().all(&sink.connection()).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_ne!(rows[0].id, rows[1].id);
    assert_eq!(rows[1].status, SyncStatus::Failed);
}
