//! App Annie API response types.
//!
//! The `Raw*` types mirror the wire format with every field optional so that
//! a missing identifier surfaces as a schema-drift error from
//! [`crate::normalize`] instead of a bare serde failure. List keys differ
//! between API versions; serde aliases accept both spellings.

use annie_core::UnitsBundle;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Domain records
// ---------------------------------------------------------------------------

/// An account that owns one or more products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// `apps` for app-store accounts. Present only in the newer API variant.
    pub vertical: Option<String>,
    /// `ios`, `google-play`, ... Present only in the newer API variant.
    pub market: Option<String>,
}

/// A product (app) belonging to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub account_id: String,
    pub devices: Vec<String>,
}

impl Product {
    /// Placeholder name the API uses for products that no longer apply.
    pub const NOT_APPLICABLE: &'static str = "n/a";

    #[must_use]
    pub fn is_not_applicable(&self) -> bool {
        self.name == Self::NOT_APPLICABLE
    }

    /// Display title: `Name (device, device) [id]`, or `Name [id]` with no devices.
    #[must_use]
    pub fn title(&self) -> String {
        if self.devices.is_empty() {
            format!("{} [{}]", self.name, self.id)
        } else {
            format!("{} ({}) [{}]", self.name, self.devices.join(", "), self.id)
        }
    }
}

/// A single store review. Every text field may be absent upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Review {
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reviewer: Option<String>,
    /// Star rating, 0 to 5.
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: u8,
}

/// Revenue amounts for one sale day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RevenueBundle {
    #[serde(default)]
    pub downloads: Option<Decimal>,
    #[serde(default)]
    pub refunds: Option<Decimal>,
}

/// One day of sales for a product. Either bundle may be missing upstream;
/// the exporter treats that as a data-integrity failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRecord {
    pub date: String,
    pub units: Option<UnitsBundle>,
    pub revenue: Option<RevenueBundle>,
}

/// The first page of a sales listing.
#[derive(Debug, Clone)]
pub struct SalesPage {
    pub records: Vec<SaleRecord>,
    /// Set when the API reports further pages. They are not fetched.
    pub next_page: Option<String>,
}

/// Date bounds for a review query. Computed and logged; the reviews endpoint
/// is currently called without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReviewWindow {
    pub const DEFAULT_LOOKBACK_DAYS: u64 = 31;

    /// The `days`-long window ending on `end`.
    #[must_use]
    pub fn ending(end: NaiveDate, days: u64) -> Self {
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Identifiers arrive as JSON numbers in `v1.2` and as strings elsewhere.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Num(i64),
    Str(String),
}

impl RawId {
    pub(crate) fn into_string(self) -> String {
        match self {
            RawId::Num(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAccount {
    #[serde(default)]
    pub account_id: Option<RawId>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub vertical: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProduct {
    #[serde(default, alias = "app_id")]
    pub product_id: Option<RawId>,
    #[serde(default, alias = "app_name")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub devices: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSale {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub units: Option<UnitsEnvelope>,
    #[serde(default)]
    pub revenue: Option<RevenueEnvelope>,
}

/// `units.product` in `v1.2`, `units.app` in the older API.
#[derive(Debug, Deserialize)]
pub(crate) struct UnitsEnvelope {
    #[serde(default, alias = "app")]
    pub product: Option<UnitsBundle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevenueEnvelope {
    #[serde(default, alias = "app")]
    pub product: Option<RevenueBundle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountsResponse {
    #[serde(alias = "accounts")]
    pub account_list: Vec<RawAccount>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsResponse {
    #[serde(alias = "products")]
    pub app_list: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewsResponse {
    #[serde(alias = "reviews")]
    pub review_list: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SalesResponse {
    pub sales_list: Vec<RawSale>,
    #[serde(default)]
    pub next_page: Option<serde_json::Value>,
}

/// Accepts a string, a number, or null. Numbers are rendered as text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Accepts an integer or null; values above 5 are clamped.
fn lenient_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<u64>::deserialize(deserializer)?;
    Ok(value.map_or(0, |v| u8::try_from(v.min(5)).unwrap_or(5)))
}
