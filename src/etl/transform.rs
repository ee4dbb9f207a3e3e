//! Field mapping from Odoo records to target rows.

use std::collections::HashMap;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use tracing::warn;

use super::extract::OdooOrder;
use super::extract::OdooOrderLine;
use super::extract::OdooPartner;
use super::extract::OdooProduct;
use crate::db::entity::Customer;
use crate::db::entity::Product;
use crate::db::entity::SalesRecord;
use crate::db::entity::StockRecord;
use crate::generator::ProductProfile;
use crate::types::RotationProfile;

pub const UNCATEGORIZED: &str = "Uncategorized";

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn product(src: &OdooProduct) -> Product {
    Product {
        id:             src.id,
        name:           src.name.clone(),
        reference:      src
            .default_code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| format!("REF-{}", src.id)),
        category:       src
            .categ_id
            .as_ref()
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        list_price:     src.list_price,
        standard_price: src.standard_price,
        rotation:       RotationProfile::from_list_price(src.list_price),
        nominal_stock:  src.qty_available.max(0.0).round() as i64,
        is_active:      src.active,
    }
}

/// Stock snapshot of `on`. Planned incoming and outgoing quantities stand in for the day's replenishment and sales.
pub fn stock(src: &OdooProduct, on: NaiveDate) -> StockRecord {
    let target = product(src);
    let reorder_threshold = ProductProfile::from_product(&target)
        .map(|p| p.reorder_threshold())
        .unwrap_or(1);
    let sold = src.outgoing_qty.max(0.0).round() as i64;
    let replenished = src.incoming_qty.max(0.0).round() as i64;

    StockRecord {
        product_id: src.id,
        recorded_on: on,
        quantity_on_hand: src.qty_available.round() as i64,
        movement: replenished - sold,
        sold,
        replenished,
        quantity_forecasted: src.virtual_available.round() as i64,
        reorder_threshold,
    }
}

pub fn customer(src: &OdooPartner) -> Customer {
    Customer {
        id:         src.id,
        name:       src.name.clone(),
        email:      src.email.clone(),
        phone:      src.phone.clone(),
        city:       src.city.clone(),
        is_company: src.is_company,
    }
}

/// Odoo datetimes come as `YYYY-MM-DD HH:MM:SS`; a bare date is tolerated.
pub fn order_date(raw: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Sales rows for the order lines. Lines without a product, referring to a product that wasn't extracted or to an
/// unknown order are skipped; their number is returned alongside.
pub fn sales(lines: &[OdooOrderLine], orders: &[OdooOrder], products: &[Product]) -> (Vec<SalesRecord>, usize) {
    let orders: HashMap<i64, &OdooOrder> = orders.iter().map(|o| (o.id, o)).collect();
    let products: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut skipped = 0;
    let mut records = Vec::with_capacity(lines.len());

    for line in lines {
        let Some(product) = line.product_id.as_ref().and_then(|p| products.get(&p.id())) else {
            skipped += 1;
            continue;
        };
        let Some(order) = orders.get(&line.order_id.id()) else {
            skipped += 1;
            continue;
        };
        let Some(sold_on) = order_date(&order.date_order) else {
            warn!(order = %order.name, date = %order.date_order, "Unparsable order date");
            skipped += 1;
            continue;
        };

        let quantity = line.product_uom_qty.round() as i64;
        let total_amount = if line.price_subtotal > 0.0 {
            line.price_subtotal
        }
        else {
            line.price_unit * line.product_uom_qty
        };

        records.push(SalesRecord {
            id: line.id,
            sold_on,
            product_id: product.id,
            order_ref: order.name.clone(),
            customer_name: order
                .partner_id
                .as_ref()
                .map(|p| p.name().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            quantity,
            unit_price: line.price_unit,
            total_amount: round2(total_amount),
            margin: round2((line.price_unit - product.standard_price) * line.product_uom_qty),
        });
    }

    (records, skipped)
}
