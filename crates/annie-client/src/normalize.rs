//! Validation of raw API records at the ingestion boundary.
//!
//! A missing identifier means the upstream contract changed; every function
//! here fails with [`AnnieError::SchemaDrift`] naming the absent field rather
//! than letting a half-populated record reach the exporter.

use crate::error::AnnieError;
use crate::types::{Account, Product, RawAccount, RawProduct, RawSale, SaleRecord};

fn drift(record: &str, field: &str) -> AnnieError {
    AnnieError::SchemaDrift {
        record: record.to_string(),
        field: field.to_string(),
    }
}

/// Converts a raw account into an [`Account`].
///
/// # Errors
///
/// Returns [`AnnieError::SchemaDrift`] if `account_id` or `account_name` is absent.
pub(crate) fn normalize_account(raw: RawAccount) -> Result<Account, AnnieError> {
    let id = raw
        .account_id
        .map(crate::types::RawId::into_string)
        .ok_or_else(|| drift("account", "account_id"))?;
    let name = raw
        .account_name
        .ok_or_else(|| drift("account", "account_name"))?;

    Ok(Account {
        id,
        name,
        vertical: raw.vertical.filter(|v| !v.is_empty()),
        market: raw.market.filter(|m| !m.is_empty()),
    })
}

/// Converts a raw product into a [`Product`] owned by `account_id`.
///
/// # Errors
///
/// Returns [`AnnieError::SchemaDrift`] if `product_id` or `product_name` is absent.
pub(crate) fn normalize_product(raw: RawProduct, account_id: &str) -> Result<Product, AnnieError> {
    let id = raw
        .product_id
        .map(crate::types::RawId::into_string)
        .ok_or_else(|| drift("product", "product_id"))?;
    let name = raw
        .product_name
        .ok_or_else(|| drift("product", "product_name"))?;

    Ok(Product {
        id,
        name,
        account_id: account_id.to_string(),
        devices: raw.devices.unwrap_or_default(),
    })
}

/// Converts a raw sale into a [`SaleRecord`]. Missing bundles are kept as
/// `None`; the exporter decides what to do with them.
///
/// # Errors
///
/// Returns [`AnnieError::SchemaDrift`] if `date` is absent.
pub(crate) fn normalize_sale(raw: RawSale) -> Result<SaleRecord, AnnieError> {
    let date = raw.date.ok_or_else(|| drift("sale", "date"))?;
    Ok(SaleRecord {
        date,
        units: raw.units.and_then(|u| u.product),
        revenue: raw.revenue.and_then(|r| r.product),
    })
}
