//! Export command: accounts → products → reviews and sales → CSV files.
//!
//! Runs strictly in sequence. Any error aborts the whole run; files already
//! written for earlier accounts and products stay on disk.

mod console;
mod csv_out;
mod report;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use annie_client::{Account, AnnieClient, AnnieError, Product};
use annie_core::{AppConfig, CorrectionTable};
use thiserror::Error;

use csv_out::{is_sales_file_name, reviews_file_path, sales_file_path, ReviewWriter, SalesWriter};

/// Fixed pause between products when `ANNIE_ADD_DELAY` is set. Two calls per
/// product keeps a run under the upstream 30-calls-per-minute limit.
pub(crate) const INTER_PRODUCT_DELAY: Duration = Duration::from_secs(4);

#[derive(Debug, Error)]
pub(crate) enum ExportError {
    #[error(transparent)]
    Api(#[from] AnnieError),

    /// A sale day without its units or revenue bundle cannot be exported.
    #[error("sale {date} for product {product_id} has no {bundle} bundle")]
    MissingBundle {
        product_id: String,
        date: String,
        bundle: &'static str,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("account '{0}' not found")]
    UnknownAccount(String),
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Knobs for one export run, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub(crate) struct ExportOptions {
    pub output_dir: PathBuf,
    pub clean: bool,
    pub run_report: bool,
    pub inter_product_delay: Option<Duration>,
    pub account_filter: Option<String>,
}

impl ExportOptions {
    pub(crate) fn from_config(
        config: &AppConfig,
        no_clean: bool,
        no_report: bool,
        account_filter: Option<String>,
    ) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            clean: !no_clean,
            run_report: config.run_report && !no_report,
            inter_product_delay: config.add_delay.then_some(INTER_PRODUCT_DELAY),
            account_filter,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ExportSummary {
    pub files_removed: usize,
    pub accounts: usize,
    pub products_exported: usize,
    pub products_skipped: usize,
    pub review_rows: usize,
    pub sales_rows: usize,
    pub corrections_applied: usize,
}

/// Per-run state threaded through the account and product loops.
struct RunState<'a> {
    client: &'a AnnieClient,
    config: &'a AppConfig,
    corrections: &'a CorrectionTable,
    options: &'a ExportOptions,
    /// Sales files touched so far in this run.
    sales_files: HashSet<PathBuf>,
    fetched_any: bool,
    summary: ExportSummary,
}

/// Deletes every `Numbers *.csv` file in `dir`. Review files are left in
/// place; they are truncated when reopened.
///
/// Returns the number of files removed. A missing directory removes nothing.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the directory cannot be listed or a file
/// cannot be removed.
pub(crate) fn clean_outputs(dir: &Path) -> Result<usize, ExportError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(ExportError::io(dir, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| ExportError::io(dir, e))?;
        let path = entry.path();
        let is_match = entry
            .file_name()
            .to_str()
            .is_some_and(is_sales_file_name);
        if is_match && path.is_file() {
            std::fs::remove_file(&path).map_err(|e| ExportError::io(&path, e))?;
            tracing::debug!(path = %path.display(), "removed stale sales file");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Runs a full export.
///
/// # Errors
///
/// Returns the first API, schema-drift, data-integrity, or file error met;
/// the run stops there.
pub(crate) async fn run_export(
    client: &AnnieClient,
    config: &AppConfig,
    corrections: &CorrectionTable,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let mut state = RunState {
        client,
        config,
        corrections,
        options,
        sales_files: HashSet::new(),
        fetched_any: false,
        summary: ExportSummary::default(),
    };

    if options.clean {
        state.summary.files_removed = clean_outputs(&options.output_dir)?;
        tracing::info!(removed = state.summary.files_removed, "cleaned sales outputs");
    }

    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| ExportError::io(&options.output_dir, e))?;

    let mut accounts = client.list_accounts().await?;
    if let Some(wanted) = &options.account_filter {
        accounts.retain(|a| &a.id == wanted);
        if accounts.is_empty() {
            return Err(ExportError::UnknownAccount(wanted.clone()));
        }
    }

    for account in &accounts {
        export_account(&mut state, account).await?;
        state.summary.accounts += 1;
    }

    if options.run_report {
        report::run_report_generator(&options.output_dir).await;
    }

    Ok(state.summary)
}

async fn export_account(state: &mut RunState<'_>, account: &Account) -> Result<(), ExportError> {
    tracing::info!(account_id = %account.id, account = %account.name, "exporting account");

    let review_path = reviews_file_path(&state.options.output_dir, &account.name);
    let mut reviews_out = ReviewWriter::create(&review_path)?;

    let products = state.client.list_products(&account.id).await?;
    for product in &products {
        if product.is_not_applicable() {
            tracing::debug!(product_id = %product.id, "skipping not-applicable product");
            state.summary.products_skipped += 1;
            continue;
        }
        if state.config.is_skipped(&product.id) {
            tracing::info!(
                product_id = %product.id,
                product = %product.name,
                "skipping configured product"
            );
            state.summary.products_skipped += 1;
            continue;
        }

        if let Some(delay) = state.options.inter_product_delay {
            if state.fetched_any {
                tokio::time::sleep(delay).await;
            }
        }
        state.fetched_any = true;

        export_product(state, account, product, &mut reviews_out).await?;
        state.summary.products_exported += 1;
    }

    state.summary.review_rows += reviews_out.finish()?;
    Ok(())
}

async fn export_product(
    state: &mut RunState<'_>,
    account: &Account,
    product: &Product,
    reviews_out: &mut ReviewWriter,
) -> Result<(), ExportError> {
    console::print_product_header(product);

    let reviews = state.client.fetch_reviews(account, &product.id).await?;
    for (i, review) in reviews.iter().enumerate() {
        reviews_out.write_review(&product.name, review)?;
        if i < console::REVIEW_PREVIEW_COUNT {
            console::print_review(review);
        }
    }

    let page = state.client.fetch_sales(&account.id, &product.id).await?;
    if let Some(next) = &page.next_page {
        println!("more sales pages available, not fetched: {next}");
    }

    let path = sales_file_path(&state.options.output_dir, &product.title());
    let first_write_in_run = state.sales_files.insert(path.clone());
    let mut sales_out = SalesWriter::open(&path, first_write_in_run)?;

    for sale in page.records {
        let mut units = sale.units.ok_or_else(|| ExportError::MissingBundle {
            product_id: product.id.clone(),
            date: sale.date.clone(),
            bundle: "units",
        })?;
        let revenue = sale.revenue.ok_or_else(|| ExportError::MissingBundle {
            product_id: product.id.clone(),
            date: sale.date.clone(),
            bundle: "revenue",
        })?;

        state.summary.corrections_applied +=
            state.corrections.apply(&product.id, &sale.date, &mut units);
        sales_out.write_sale(&sale.date, &units, &revenue)?;
    }

    let rows = sales_out.finish()?;
    state.summary.sales_rows += rows;
    tracing::info!(
        product_id = %product.id,
        reviews = reviews.len(),
        sales = rows,
        path = %path.display(),
        "exported product"
    );
    Ok(())
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
