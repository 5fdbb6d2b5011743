//! CSV output for reviews and sales.
//!
//! Both writers run the `csv` crate with `QuoteStyle::Never` and pass every
//! text field through [`csv_safe`], which owns quoting for the whole file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use annie_client::{RevenueBundle, Review};
use annie_core::UnitsBundle;
use csv::{QuoteStyle, Writer, WriterBuilder};

use super::ExportError;

pub(crate) const REVIEW_HEADER: [&str; 7] =
    ["App", "version", "country", "date", "title", "text", "reviewer"];

pub(crate) const SALES_HEADER: [&str; 6] = [
    "date",
    "num_downloads",
    "num_updates",
    "num_refunds",
    "sales",
    "refunds",
];

pub(crate) const SALES_FILE_PREFIX: &str = "Numbers ";
pub(crate) const REVIEWS_FILE_PREFIX: &str = "Reviews ";

/// Escapes a text field for CSV output.
///
/// Absent or empty input gives an empty string. Embedded `"` characters are
/// doubled, and the field is wrapped in quotes when it contains a quote,
/// comma, or line break.
pub(crate) fn csv_safe(value: Option<&str>) -> String {
    let Some(s) = value.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let escaped = s.replace('"', "\"\"");
    if s.contains(['"', ',', '\n', '\r']) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Replaces path separators so a display name can be used as a file name.
fn file_component(name: &str) -> String {
    name.replace(['/', '\\'], "-")
}

/// `Reviews {account_name}.csv` inside `dir`.
pub(crate) fn reviews_file_path(dir: &Path, account_name: &str) -> PathBuf {
    dir.join(format!(
        "{REVIEWS_FILE_PREFIX}{}.csv",
        file_component(account_name)
    ))
}

/// `Numbers {product_title}.csv` inside `dir`.
pub(crate) fn sales_file_path(dir: &Path, product_title: &str) -> PathBuf {
    dir.join(format!(
        "{SALES_FILE_PREFIX}{}.csv",
        file_component(product_title)
    ))
}

/// Whether `file_name` follows the sales naming pattern.
pub(crate) fn is_sales_file_name(file_name: &str) -> bool {
    file_name.starts_with(SALES_FILE_PREFIX)
        && Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn build_writer(file: File) -> Writer<File> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(file)
}

fn opt_to_cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Per-account review file, truncated when opened.
pub(crate) struct ReviewWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl ReviewWriter {
    /// Creates (or truncates) the file at `path` and writes the header row.
    pub(crate) fn create(path: &Path) -> Result<Self, ExportError> {
        let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
        let mut writer = build_writer(file);
        writer
            .write_record(REVIEW_HEADER)
            .map_err(|e| ExportError::csv(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub(crate) fn write_review(&mut self, app_name: &str, review: &Review) -> Result<(), ExportError> {
        let record = [
            csv_safe(Some(app_name)),
            csv_safe(review.version.as_deref()),
            csv_safe(review.country.as_deref()),
            csv_safe(review.date.as_deref()),
            csv_safe(review.title.as_deref()),
            csv_safe(review.text.as_deref()),
            csv_safe(review.reviewer.as_deref()),
        ];
        self.writer
            .write_record(&record)
            .map_err(|e| ExportError::csv(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes the file and returns the number of data rows written.
    pub(crate) fn finish(mut self) -> Result<usize, ExportError> {
        self.writer
            .flush()
            .map_err(|e| ExportError::io(&self.path, e))?;
        Ok(self.rows)
    }
}

/// Per-product sales file, opened for append.
pub(crate) struct SalesWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl SalesWriter {
    /// Opens `path` for append, creating it if needed.
    ///
    /// The header is written only when this is the first write to `path` in
    /// the current run and the opened file is empty. Emptiness is read from
    /// the open handle rather than a separate existence check.
    pub(crate) fn open(path: &Path, first_write_in_run: bool) -> Result<Self, ExportError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ExportError::io(path, e))?;
        let is_empty = file
            .metadata()
            .map_err(|e| ExportError::io(path, e))?
            .len()
            == 0;

        let mut writer = build_writer(file);
        if first_write_in_run && is_empty {
            writer
                .write_record(SALES_HEADER)
                .map_err(|e| ExportError::csv(path, e))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub(crate) fn write_sale(
        &mut self,
        date: &str,
        units: &UnitsBundle,
        revenue: &RevenueBundle,
    ) -> Result<(), ExportError> {
        let record = [
            csv_safe(Some(date)),
            opt_to_cell(units.downloads),
            opt_to_cell(units.updates),
            opt_to_cell(units.refunds),
            opt_to_cell(revenue.downloads),
            opt_to_cell(revenue.refunds),
        ];
        self.writer
            .write_record(&record)
            .map_err(|e| ExportError::csv(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes the file and returns the number of data rows written.
    pub(crate) fn finish(mut self) -> Result<usize, ExportError> {
        self.writer
            .flush()
            .map_err(|e| ExportError::io(&self.path, e))?;
        Ok(self.rows)
    }
}
