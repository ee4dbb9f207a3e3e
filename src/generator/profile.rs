use fieldx::fxstruct;

use crate::db::entity::Product;
use crate::types::opterr;
use crate::types::Result;
use crate::types::RotationProfile;

/// Demand and stock policy of a single product.
///
/// Derived quantities are fixed at build time:
/// - daily demand: `max(nominal_stock / turnover_days, demand_floor)`
/// - target stock: `max(nominal_stock, ceil(daily_demand * turnover_days))`
/// - reorder threshold: `max(1, ceil(target_stock * reorder_ratio))`
#[derive(Debug, Clone)]
#[fxstruct(no_new, builder(post_build), get(copy))]
pub struct ProductProfile {
    product_id:    i64,
    rotation:      RotationProfile,
    list_price:    f64,
    /// Purchase cost per unit.
    cost:          f64,
    #[fieldx(default(0))]
    nominal_stock: i64,

    #[fieldx(builder(off))]
    daily_demand:      f64,
    #[fieldx(builder(off))]
    target_stock:      i64,
    #[fieldx(builder(off))]
    reorder_threshold: i64,
}

impl ProductProfile {
    fn post_build(mut self) -> Self {
        let params = self.rotation.params();
        let nominal = self.nominal_stock.max(0);

        self.daily_demand = (nominal as f64 / params.turnover_days).max(params.demand_floor);
        self.target_stock = nominal.max((self.daily_demand * params.turnover_days).ceil() as i64);
        self.reorder_threshold = ((self.target_stock as f64 * params.reorder_ratio).ceil() as i64).max(1);
        self
    }

    pub fn from_product(product: &Product) -> Result<Self> {
        Self::builder()
            .product_id(product.id)
            .rotation(product.rotation)
            .list_price(product.list_price)
            .cost(product.effective_cost())
            .nominal_stock(product.nominal_stock)
            .build()
            .map_err(|err| opterr!("Cannot profile {}: {err}", product.name))
    }

    pub fn price_variance(&self) -> f64 {
        self.rotation.params().price_variance
    }
}
