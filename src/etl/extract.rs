//! Read side: typed views of the Odoo models the pipeline copies.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use tracing::instrument;

use crate::odoo::odoo_nullable;
use crate::odoo::Domain;
use crate::odoo::Many2One;
use crate::odoo::OdooClient;
use crate::odoo::SearchOptions;
use crate::types::Result;

/// `search_read` accepts at most this many ids in an `in` leaf per call.
const ID_CHUNK: usize = 500;

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdooProduct {
    pub id:                i64,
    pub name:              String,
    #[serde(default, deserialize_with = "odoo_nullable")]
    pub default_code:      Option<String>,
    #[serde(default, deserialize_with = "odoo_nullable")]
    pub categ_id:          Option<Many2One>,
    #[serde(default)]
    pub list_price:        f64,
    #[serde(default)]
    pub standard_price:    f64,
    #[serde(default)]
    pub qty_available:     f64,
    #[serde(default)]
    pub virtual_available: f64,
    #[serde(default)]
    pub incoming_qty:      f64,
    #[serde(default)]
    pub outgoing_qty:      f64,
    #[serde(default = "yes")]
    pub active:            bool,
}

impl OdooProduct {
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "default_code",
        "categ_id",
        "list_price",
        "standard_price",
        "qty_available",
        "virtual_available",
        "incoming_qty",
        "outgoing_qty",
        "active",
    ];
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdooOrder {
    pub id:         i64,
    pub name:       String,
    #[serde(default, deserialize_with = "odoo_nullable")]
    pub partner_id: Option<Many2One>,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub date_order: String,
}

impl OdooOrder {
    pub const FIELDS: &'static [&'static str] = &["id", "name", "partner_id", "date_order"];
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdooOrderLine {
    pub id:              i64,
    pub order_id:        Many2One,
    #[serde(default, deserialize_with = "odoo_nullable")]
    pub product_id:      Option<Many2One>,
    #[serde(default)]
    pub product_uom_qty: f64,
    #[serde(default)]
    pub price_unit:      f64,
    #[serde(default)]
    pub price_subtotal:  f64,
}

impl OdooOrderLine {
    pub const FIELDS: &'static [&'static str] =
        &["id", "order_id", "product_id", "product_uom_qty", "price_unit", "price_subtotal"];
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdooPartner {
    pub id:         i64,
    pub name:       String,
    #[serde(default, deserialize_with = "odoo_nullable")]
    pub email:      Option<String>,
    #[serde(default, deserialize_with = "odoo_nullable")]
    pub phone:      Option<String>,
    #[serde(default, deserialize_with = "odoo_nullable")]
    pub city:       Option<String>,
    #[serde(default)]
    pub is_company: bool,
}

impl OdooPartner {
    pub const FIELDS: &'static [&'static str] = &["id", "name", "email", "phone", "city", "is_company"];
}

/// Queries against one Odoo session.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    odoo: &'a OdooClient,
}

impl<'a> Extractor<'a> {
    pub fn new(odoo: &'a OdooClient) -> Self {
        Self { odoo }
    }

    /// Products of the given `type`; their stock figures ride along.
    #[instrument(level = "debug", skip(self))]
    pub async fn products(&self, product_type: &str) -> Result<Vec<OdooProduct>> {
        let domain = Domain::new().eq("type", product_type);
        let products: Vec<OdooProduct> = self
            .odoo
            .search_read(
                "product.product",
                &domain,
                OdooProduct::FIELDS,
                &SearchOptions::default().ordered("id"),
            )
            .await?;
        debug!(count = products.len(), "Products extracted");
        Ok(products)
    }

    /// Confirmed or locked orders placed on or after `since`.
    #[instrument(level = "debug", skip(self))]
    pub async fn confirmed_orders(&self, since: NaiveDate) -> Result<Vec<OdooOrder>> {
        let domain = Domain::new()
            .is_in("state", ["sale", "done"])
            .ge("date_order", format!("{} 00:00:00", since.format("%Y-%m-%d")));
        self.odoo
            .search_read(
                "sale.order",
                &domain,
                OdooOrder::FIELDS,
                &SearchOptions::default().ordered("date_order asc"),
            )
            .await
    }

    pub async fn order_lines(&self, order_ids: &[i64]) -> Result<Vec<OdooOrderLine>> {
        let mut lines = Vec::new();
        for chunk in order_ids.chunks(ID_CHUNK) {
            let domain = Domain::new().is_in("order_id", chunk);
            let batch: Vec<OdooOrderLine> = self
                .odoo
                .search_read(
                    "sale.order.line",
                    &domain,
                    OdooOrderLine::FIELDS,
                    &SearchOptions::default().ordered("id"),
                )
                .await?;
            lines.extend(batch);
        }
        Ok(lines)
    }

    pub async fn company_partners(&self) -> Result<Vec<OdooPartner>> {
        let domain = Domain::new().eq("is_company", true);
        self.odoo
            .search_read(
                "res.partner",
                &domain,
                OdooPartner::FIELDS,
                &SearchOptions::default().ordered("id"),
            )
            .await
    }
}
