use std::io::BufWriter;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use postcard::to_io;
use serde::Deserialize;
use serde::Serialize;

use crate::db::entity::Customer;
use crate::db::entity::Product;
use crate::db::entity::SalesRecord;
use crate::db::entity::StockRecord;
use crate::types::opterr;
use crate::types::Result;

const INNER_ZIP_NAME: &str = "__dataset.postcard";
/// Largest dataset payload `load` accepts.
const MAX_DATASET_BYTES: u64 = 1 << 30;

/// A fully materialized generator run. Sales and stock are ordered by date, then product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub products:  Vec<Product>,
    pub customers: Vec<Customer>,
    pub sales:     Vec<SalesRecord>,
    pub stock:     Vec<StockRecord>,
}

impl Dataset {
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.stock.first()?.recorded_on, self.stock.last()?.recorded_on))
    }

    pub fn units_sold(&self) -> i64 {
        self.sales.iter().map(|s| s.quantity).sum()
    }

    pub fn revenue(&self) -> f64 {
        self.sales.iter().map(|s| s.total_amount).sum()
    }

    pub fn replenishments(&self) -> usize {
        self.stock.iter().filter(|s| s.replenished > 0).count()
    }

    pub fn stock_of(&self, product_id: i64) -> impl Iterator<Item = &StockRecord> {
        self.stock.iter().filter(move |s| s.product_id == product_id)
    }

    pub fn sales_of(&self, product_id: i64) -> impl Iterator<Item = &SalesRecord> {
        self.sales.iter().filter(move |s| s.product_id == product_id)
    }

    /// Writes a zip archive with the postcard encoded dataset inside.
    pub fn save(&self, file: &Path, show_progress: bool) -> Result<()> {
        let out = std::fs::File::create(file)?;
        let mut zip = zip::ZipWriter::new(out);
        zip.start_file(INNER_ZIP_NAME, zip::write::SimpleFileOptions::default())?;
        let pb = if show_progress {
            ProgressBar::no_length()
        }
        else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_spinner()
            .template("[{binary_bytes:.yellow}] {msg}")
            .map_err(|err| opterr!("{err}"))?;
        let pb = pb
            .with_message(format!("Saving dataset to {}", file.display()))
            .with_style(style);

        let mut zip = BufWriter::with_capacity(128 * 1024, zip);
        to_io(self, pb.wrap_write(&mut zip))?;
        pb.finish_with_message("Dataset saved.");
        zip.into_inner()
            .map_err(|err| opterr!("Cannot flush {}: {}", file.display(), err.error()))?
            .finish()?;

        Ok(())
    }

    pub fn load(file: &Path) -> Result<Self> {
        Self::load_limited(file, MAX_DATASET_BYTES)
    }

    fn load_limited(file: &Path, limit: u64) -> Result<Self> {
        let archive = std::fs::File::open(file)?;
        let mut zip = zip::ZipArchive::new(archive)?;
        let zip_file = zip.by_name(INNER_ZIP_NAME)?;

        // The declared entry size is not trusted.
        let mut buf = Vec::new();
        zip_file.take(limit + 1).read_to_end(&mut buf)?;
        if buf.len() as u64 > limit {
            return Err(opterr!("{} holds more than {limit} bytes of data", file.display()));
        }

        Ok(postcard::from_bytes(&buf)?)
    }
}
