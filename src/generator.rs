//! Synthetic sales and stock history.
//!
//! Every product gets a daily series over the configured period. The expected demand of a day is the product's base
//! daily demand scaled by a yearly seasonal curve and a weekday factor; the actual quantity is a noisy Poisson draw
//! around it. Sales are capped by the stock on hand, and stock that drops below the reorder threshold is replenished
//! to the target level the same day.

pub mod catalog;
pub mod curve;
pub mod customers;
pub mod dataset;
pub mod profile;

use chrono::Datelike;
use chrono::Months;
use chrono::NaiveDate;
use fieldx::fxstruct;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tracing::debug;
use tracing::instrument;

pub use catalog::demo_catalog;
pub use curve::seasonal_multiplier;
pub use curve::weekday_multiplier;
pub use curve::QuantitySampler;
pub use customers::fake_customers;
pub use dataset::Dataset;
pub use profile::ProductProfile;

use crate::db::entity::Customer;
use crate::db::entity::Product;
use crate::db::entity::SalesRecord;
use crate::db::entity::StockRecord;
use crate::progress::MaybeProgress;
use crate::types::OptiError;
use crate::types::Result;

/// How many days of expected demand the forecast looks ahead.
const FORECAST_DAYS: f64 = 7.0;

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 30).unwrap_or_default()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
#[fxstruct(no_new, builder, get(copy))]
pub struct Generator {
    /// First simulated day.
    #[fieldx(default(default_start()))]
    start:              NaiveDate,
    /// Last simulated day, inclusive.
    #[fieldx(default(default_end()))]
    end:                NaiveDate,
    /// Relative standard deviation of the daily demand rate.
    #[fieldx(default(0.2))]
    noise:              f64,
    /// Customers to invent when none are supplied.
    #[fieldx(default(25))]
    customer_count:     usize,
    #[fieldx(default(1000))]
    first_order_number: u32,
    /// Fixed seed for reproducible runs.
    #[fieldx(default(None))]
    seed:               Option<u64>,
}

struct ProductState<'a> {
    product: &'a Product,
    profile: ProductProfile,
    on_hand: i64,
}

impl Generator {
    /// Whole months `first_month..=last_month` of `year`.
    pub fn months(year: i32, first_month: u32, last_month: u32) -> Result<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(year, first_month, 1)
            .ok_or_else(|| OptiError::Generator(format!("invalid start month {year}-{first_month}")))?;
        let end = NaiveDate::from_ymd_opt(year, last_month, 1)
            .and_then(|d| d.checked_add_months(Months::new(1)))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| OptiError::Generator(format!("invalid end month {year}-{last_month}")))?;
        Ok((start, end))
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Generates a dataset with invented customers.
    pub fn generate(&self, products: &[Product], progress: &Option<ProgressBar>) -> Result<Dataset> {
        let mut rng = self.rng();
        let customers = fake_customers(&mut rng, self.customer_count.max(1));
        self.generate_with(&mut rng, products, customers, progress)
    }

    /// Generates a dataset for a known customer base.
    pub fn generate_for(
        &self,
        products: &[Product],
        customers: Vec<Customer>,
        progress: &Option<ProgressBar>,
    ) -> Result<Dataset> {
        let mut rng = self.rng();
        let customers = if customers.is_empty() {
            fake_customers(&mut rng, self.customer_count.max(1))
        }
        else {
            customers
        };
        self.generate_with(&mut rng, products, customers, progress)
    }

    #[instrument(level = "debug", skip_all, fields(start = %self.start, end = %self.end, products = products.len()))]
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        products: &[Product],
        customers: Vec<Customer>,
        progress: &Option<ProgressBar>,
    ) -> Result<Dataset> {
        if products.is_empty() {
            return Err(OptiError::Generator("no products to simulate".into()));
        }
        if self.end < self.start {
            return Err(OptiError::Generator(format!(
                "date range is inverted: {} > {}",
                self.start, self.end
            )));
        }
        if customers.is_empty() {
            return Err(OptiError::Generator("no customers to sell to".into()));
        }

        let sampler =
            QuantitySampler::new(self.noise).map_err(|err| OptiError::Generator(format!("bad noise level: {err}")))?;

        let mut states = products
            .iter()
            .map(|product| {
                let profile = ProductProfile::from_product(product)?;
                Ok(ProductState {
                    product,
                    on_hand: profile.target_stock(),
                    profile,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let days = self.days() as usize;
        let mut sales = Vec::new();
        let mut stock = Vec::with_capacity(days * states.len());
        let mut order_number = self.first_order_number;

        progress.maybe_set_length(days as u64);

        for date in self.start.iter_days().take(days) {
            let day_factor = seasonal_multiplier(date) * weekday_multiplier(date);

            for state in states.iter_mut() {
                let profile = &state.profile;
                let expected = profile.daily_demand() * day_factor;
                let demand = sampler.sample(rng, expected) as i64;
                let sold = demand.min(state.on_hand);
                state.on_hand -= sold;

                if sold > 0 {
                    let variance = profile.price_variance();
                    let unit_price = round2(profile.list_price() * (1.0 + rng.random_range(-variance..=variance)));
                    let customer = &customers[rng.random_range(0..customers.len())];

                    sales.push(SalesRecord {
                        id: sales.len() as i64 + 1,
                        sold_on: date,
                        product_id: state.product.id,
                        order_ref: format!("SO{order_number:05}"),
                        customer_name: customer.name.clone(),
                        quantity: sold,
                        unit_price,
                        total_amount: round2(unit_price * sold as f64),
                        margin: round2((unit_price - profile.cost()) * sold as f64),
                    });
                    order_number += 1;
                }

                let replenished = if state.on_hand < profile.reorder_threshold() {
                    profile.target_stock() - state.on_hand
                }
                else {
                    0
                };
                state.on_hand += replenished;

                let outlook = (profile.daily_demand() * FORECAST_DAYS).round() as i64;
                stock.push(StockRecord {
                    product_id: state.product.id,
                    recorded_on: date,
                    quantity_on_hand: state.on_hand,
                    movement: replenished - sold,
                    sold,
                    replenished,
                    quantity_forecasted: (state.on_hand - outlook).max(0),
                    reorder_threshold: profile.reorder_threshold(),
                });
            }

            if date.day() == 1 {
                debug!(month = %date.format("%Y-%m"), sales = sales.len(), "Simulating");
            }
            progress.maybe_inc(1);
        }

        Ok(Dataset {
            products: products.to_vec(),
            customers,
            sales,
            stock,
        })
    }
}
