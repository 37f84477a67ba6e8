//! CSV output for scraped product cards
//!
//! One file per run: `<dir>/<site>-products-<YYYY-MM-DD_HH-MM-SS>.csv`, a
//! header row, then one row per card in extraction order.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::info;

use super::error::SinkError;
use crate::domain::ProductCard;

const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output file path for `site_key` at time `at`
    pub fn file_path<Tz>(&self, site_key: &str, at: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.output_dir.join(format!(
            "{site_key}-products-{}.csv",
            at.format(FILE_TIMESTAMP_FORMAT)
        ))
    }

    /// Write all cards, creating the output directory when absent
    pub fn write<Tz>(
        &self,
        site_key: &str,
        products: &[ProductCard],
        at: &DateTime<Tz>,
    ) -> Result<PathBuf, SinkError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| SinkError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.file_path(site_key, at);
        let mut writer = csv::Writer::from_path(&path)?;

        writer.write_record(ProductCard::CSV_HEADER)?;
        for product in products {
            writer.write_record(product.csv_record())?;
        }
        writer.flush().map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;

        info!("💾 Wrote {} products to {}", products.len(), path.display());
        Ok(path)
    }
}
