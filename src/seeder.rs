//! Writes a generated history back into Odoo: customers, stock levels and confirmed sale orders.
//!
//! One sale order is created per customer and day. Stock is set through `stock.quant` inventory adjustments, first
//! to each product's target level and then whenever the simulation replenishes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::db::entity::Customer;
use crate::db::entity::SalesRecord;
use crate::db::entity::StockRecord;
use crate::etl::extract::OdooPartner;
use crate::etl::transform;
use crate::generator::fake_customers;
use crate::generator::Dataset;
use crate::generator::ProductProfile;
use crate::odoo::Domain;
use crate::odoo::OdooClient;
use crate::odoo::SearchOptions;
use crate::progress::MaybeProgress;
use crate::progress::PStyle;
use crate::progress::ProgressUI;
use crate::types::OptiError;
use crate::types::Result;

/// Below this many company partners new ones are invented.
pub const MIN_CUSTOMERS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub customers_created:  usize,
    pub orders_created:     usize,
    pub orders_failed:      usize,
    pub pickings_validated: usize,
    pub adjustments:        usize,
}

#[derive(Deserialize)]
struct PickingRef {
    #[serde(default)]
    picking_ids: Vec<i64>,
}

pub struct OdooSeeder<'a> {
    odoo:     &'a OdooClient,
    ui:       &'a ProgressUI,
    location: Option<i64>,
    report:   SeedReport,
}

impl<'a> OdooSeeder<'a> {
    pub fn new(odoo: &'a OdooClient, ui: &'a ProgressUI) -> Self {
        Self {
            odoo,
            ui,
            location: None,
            report: SeedReport::default(),
        }
    }

    pub fn report(&self) -> &SeedReport {
        &self.report
    }

    /// Company partners to sell to, creating some when there are fewer than [`MIN_CUSTOMERS`].
    #[instrument(level = "debug", skip(self))]
    pub async fn ensure_customers(&mut self) -> Result<Vec<Customer>> {
        let partners: Vec<OdooPartner> = self
            .odoo
            .search_read(
                "res.partner",
                &Domain::new().eq("is_company", true),
                OdooPartner::FIELDS,
                &SearchOptions::limit(50).ordered("id"),
            )
            .await?;
        let mut customers: Vec<Customer> = partners.iter().map(transform::customer).collect();

        if customers.len() < MIN_CUSTOMERS {
            let mut rng = StdRng::from_os_rng();
            for mut customer in fake_customers(&mut rng, MIN_CUSTOMERS - customers.len()) {
                customer.id = self
                    .odoo
                    .create(
                        "res.partner",
                        json!({
                            "name": customer.name,
                            "email": customer.email,
                            "phone": customer.phone,
                            "city": customer.city,
                            "is_company": true,
                            "customer_rank": 1,
                        }),
                    )
                    .await?;
                self.report.customers_created += 1;
                customers.push(customer);
            }
            self.ui
                .report_info(format!("Created {} customers", self.report.customers_created));
        }

        Ok(customers)
    }

    async fn location(&mut self) -> Result<i64> {
        if let Some(location) = self.location {
            return Ok(location);
        }

        let ids = self
            .odoo
            .search(
                "stock.location",
                &Domain::new().eq("usage", "internal"),
                &SearchOptions::limit(1).ordered("id"),
            )
            .await?;
        let location = *ids
            .first()
            .ok_or_else(|| OptiError::config("Odoo has no internal stock location"))?;
        self.location = Some(location);
        Ok(location)
    }

    /// Inventory adjustment of `product_id` to `quantity` in the main internal location.
    pub async fn set_quantity(&mut self, product_id: i64, quantity: i64) -> Result<()> {
        let location = self.location().await?;
        let existing = self
            .odoo
            .search(
                "stock.quant",
                &Domain::new().eq("product_id", product_id).eq("location_id", location),
                &SearchOptions::limit(1),
            )
            .await?;

        let quant = match existing.first() {
            Some(&quant) => {
                self.odoo
                    .write("stock.quant", &[quant], json!({ "inventory_quantity": quantity }))
                    .await?;
                quant
            }
            None => {
                self.odoo
                    .create(
                        "stock.quant",
                        json!({
                            "product_id": product_id,
                            "location_id": location,
                            "inventory_quantity": quantity,
                        }),
                    )
                    .await?
            }
        };

        self.odoo
            .call_method("stock.quant", "action_apply_inventory", &[quant])
            .await?;
        self.report.adjustments += 1;
        Ok(())
    }

    async fn create_order(&mut self, date: NaiveDate, partner_id: i64, lines: &[&SalesRecord]) -> Result<i64> {
        let order_lines: Vec<_> = lines
            .iter()
            .map(|s| {
                json!([0, 0, {
                    "product_id": s.product_id,
                    "product_uom_qty": s.quantity,
                    "price_unit": s.unit_price,
                }])
            })
            .collect();

        let order = self
            .odoo
            .create(
                "sale.order",
                json!({
                    "partner_id": partner_id,
                    "date_order": format!("{} 10:00:00", date.format("%Y-%m-%d")),
                    "order_line": order_lines,
                }),
            )
            .await?;
        self.odoo.call_method("sale.order", "action_confirm", &[order]).await?;
        // Confirmation resets the date on some versions.
        self.odoo
            .write(
                "sale.order",
                &[order],
                json!({ "date_order": format!("{} 10:00:00", date.format("%Y-%m-%d")) }),
            )
            .await?;
        Ok(order)
    }

    /// Delivery validation is best effort: a refusal is logged and the order stays confirmed.
    async fn validate_pickings(&mut self, order: i64) {
        let pickings = match self
            .odoo
            .read::<PickingRef>("sale.order", &[order], &["picking_ids"])
            .await
        {
            Ok(refs) => refs.into_iter().flat_map(|r| r.picking_ids).collect::<Vec<_>>(),
            Err(err) => {
                warn!(order, "Cannot read pickings: {err}");
                return;
            }
        };

        for picking in pickings {
            let validated = async {
                self.odoo.call_method("stock.picking", "action_assign", &[picking]).await?;
                self.odoo.call_method("stock.picking", "button_validate", &[picking]).await
            }
            .await;
            match validated {
                Ok(_) => self.report.pickings_validated += 1,
                Err(err) => debug!(picking, "Picking left open: {err}"),
            }
        }
    }

    /// Replays `dataset` into Odoo day by day.
    #[instrument(level = "info", skip_all, fields(sales = dataset.sales.len()))]
    pub async fn seed(&mut self, dataset: &Dataset) -> Result<SeedReport> {
        let partner_ids: BTreeMap<&str, i64> = dataset.customers.iter().map(|c| (c.name.as_str(), c.id)).collect();

        for product in &dataset.products {
            let target = ProductProfile::from_product(product)?.target_stock();
            self.set_quantity(product.id, target).await?;
        }

        // day -> customer -> lines
        let mut days: BTreeMap<NaiveDate, BTreeMap<&str, Vec<&SalesRecord>>> = BTreeMap::new();
        for sale in &dataset.sales {
            days.entry(sale.sold_on)
                .or_default()
                .entry(sale.customer_name.as_str())
                .or_default()
                .push(sale);
        }
        let mut replenishments: BTreeMap<NaiveDate, Vec<&StockRecord>> = BTreeMap::new();
        for record in dataset.stock.iter().filter(|s| s.replenished > 0) {
            replenishments.entry(record.recorded_on).or_default().push(record);
        }

        let total_days = dataset.date_range().map_or(0, |(a, b)| (b - a).num_days() + 1);
        let pb = self.ui.acquire_progress(PStyle::Main, "orders", total_days as u64);

        if let Some((first, last)) = dataset.date_range() {
            for date in first.iter_days().take_while(|d| *d <= last) {
                if let Some(customers) = days.get(&date) {
                    for (customer, lines) in customers {
                        let Some(&partner_id) = partner_ids.get(customer) else {
                            warn!(customer, "Unknown customer, lines dropped");
                            self.report.orders_failed += 1;
                            continue;
                        };
                        match self.create_order(date, partner_id, lines).await {
                            Ok(order) => {
                                self.report.orders_created += 1;
                                self.validate_pickings(order).await;
                            }
                            Err(err) => {
                                self.report.orders_failed += 1;
                                self.ui.report_warn(format!("Order of {customer} on {date} failed: {err}"));
                            }
                        }
                    }
                }

                for record in replenishments.get(&date).into_iter().flatten() {
                    self.set_quantity(record.product_id, record.quantity_on_hand).await?;
                }

                pb.maybe_set_message(format!("{date}"));
                pb.maybe_inc(1);
            }
        }

        pb.maybe_finish_and_clear();
        self.ui.remove(pb);
        Ok(self.report.clone())
    }
}
