//! # optiflow
//!
//! Odoo to Supabase data bridge for the OptiFlow inventory analytics stack.
//!
//! The crate copies business records out of an Odoo ERP instance over JSON-RPC and loads them into a Supabase
//! (PostgREST) or plain SQL store. It can also produce synthetic training histories when real sales data is scarce.
//!
//! # Tools
//!
//! | Binary | Purpose |
//! | ------ | ------- |
//! | `optiflow-setup` | checks `.env`, both connections, migrates the schema, optionally runs everything once |
//! | `optiflow-test-connection` | reports server version, model counts and samples; optional write check |
//! | `optiflow-etl` | products, customers, stock and recent sales from Odoo into the store |
//! | `optiflow-generate-training-data` | seasonal sales/stock history for the stored products |
//! | `optiflow-generate-test-data` | the same history written into Odoo as sale orders and inventory adjustments |
//!
//! All settings come from flags or the environment; a `.env` file is read first when present.
//!
//! # The Generator
//!
//! Each product is profiled by its rotation class (fast, medium or slow, derived from the list price), which fixes
//! a base daily demand, a target stock level and a reorder threshold. Every simulated day the base demand is scaled
//! by a seasonal multiplier (cosine interpolation between mid-month anchors, peaking mid-September and bottoming
//! out mid-August) and a weekday multiplier, then sampled from a noisy Poisson draw. Sales never exceed the stock on
//! hand and stock is topped back up to the target as soon as it drops under the threshold.
//!
//! ```
//! use optiflow::generator::demo_catalog;
//! use optiflow::generator::Generator;
//!
//! let generator = Generator::builder().seed(Some(7)).build().unwrap();
//! let dataset = generator.generate(&demo_catalog(), &None).unwrap();
//! assert!(dataset.stock.iter().all(|s| s.quantity_on_hand >= 0));
//! ```
//!
//! # Loading
//!
//! Loading goes through the [`loader::Sink`] trait with a Supabase REST and a SeaORM implementation. Records are
//! upserted by primary key in batches; a failing batch is retried record by record so that one bad row costs one row.

pub mod app;
pub mod config;
pub mod db;
pub mod etl;
pub mod generator;
pub mod loader;
pub mod odoo;
pub mod progress;
pub mod seeder;
pub mod supabase;
pub mod types;

#[doc(inline)]
pub use generator::Generator;
#[doc(inline)]
pub use types::OptiError;

pub mod prelude {
    pub use crate::db::entity::*;
    pub use crate::generator::Dataset;
    pub use crate::generator::Generator;
    pub use crate::loader::AnySink;
    pub use crate::loader::Sink;
    pub use crate::odoo::Domain;
    pub use crate::odoo::OdooClient;
    pub use crate::supabase::SupabaseClient;
    pub use crate::types::*;
}
