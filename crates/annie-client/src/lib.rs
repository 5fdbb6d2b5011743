//! Typed client for the App Annie analytics API.

pub mod client;
pub mod error;
pub(crate) mod normalize;
pub mod types;

pub use client::{AnnieClient, RawResponse};
pub use error::AnnieError;
pub use types::{
    Account, Product, RevenueBundle, Review, ReviewWindow, SaleRecord, SalesPage,
};
