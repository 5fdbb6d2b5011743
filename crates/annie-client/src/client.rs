//! HTTP client for the App Annie REST API.
//!
//! Wraps `reqwest` with bearer-token auth, path composition against a base
//! URL, and typed response decoding. A non-2xx status is logged and the body
//! is still decoded: if it carries the expected list the records are
//! returned, otherwise the status surfaces as [`AnnieError::HttpStatus`].

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::AnnieError;
use crate::normalize::{normalize_account, normalize_product, normalize_sale};
use crate::types::{
    Account, AccountsResponse, Product, ProductsResponse, Review, ReviewWindow, ReviewsResponse,
    SalesPage, SalesResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.appannie.com/v1.2";

/// Longest slice of a non-JSON error body kept in an error message.
const ERROR_SNIPPET_LEN: usize = 200;

/// A decoded response together with the status it arrived with.
#[derive(Debug)]
pub struct RawResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl RawResponse {
    fn has_list(&self, keys: &[&str]) -> bool {
        keys.iter()
            .any(|k| self.body.get(k).is_some_and(serde_json::Value::is_array))
    }

    /// Builds an [`AnnieError::HttpStatus`] using the error payload's message
    /// when there is one.
    fn status_error(&self) -> AnnieError {
        let message = ["error", "message"]
            .iter()
            .find_map(|k| self.body.get(k).and_then(serde_json::Value::as_str))
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("unknown error")
            .to_string();
        AnnieError::HttpStatus {
            url: self.url.clone(),
            status: self.status.as_u16(),
            message,
        }
    }
}

/// Client for the App Annie REST API.
///
/// Use [`AnnieClient::new`] for production or [`AnnieClient::with_base_url`]
/// to point at a mock server in tests.
pub struct AnnieClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl AnnieClient {
    /// Creates a new client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`AnnieError::InvalidConfig`] if `api_key` is empty, or
    /// [`AnnieError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, AnnieError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AnnieError::InvalidConfig`] if `api_key` or `base_url` is
    /// empty or `base_url` does not parse, or [`AnnieError::Http`] if the
    /// `reqwest::Client` cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnnieError> {
        if api_key.trim().is_empty() {
            return Err(AnnieError::InvalidConfig(
                "API key must not be empty".to_string(),
            ));
        }
        if base_url.trim().is_empty() {
            return Err(AnnieError::InvalidConfig(
                "base URL must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("annie/0.1 (app-store-export)")
            .build()?;

        // Exactly one trailing slash, so `Url::join` appends to the version
        // segment instead of replacing it.
        let normalised = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| AnnieError::InvalidConfig(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Lists every account visible to the API key.
    ///
    /// # Errors
    ///
    /// - [`AnnieError::SchemaDrift`] if the list or an account identifier is absent.
    /// - [`AnnieError::HttpStatus`] on a non-2xx status without an account list.
    /// - [`AnnieError::Http`] on network failure.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AnnieError> {
        let raw = self.get_json("accounts").await?;
        let envelope: AccountsResponse = decode(raw, &["account_list", "accounts"], "account")?;
        envelope
            .account_list
            .into_iter()
            .map(normalize_account)
            .collect()
    }

    /// Lists the products owned by `account_id`.
    ///
    /// Placeholder products named `n/a` are returned; callers skip them.
    ///
    /// # Errors
    ///
    /// - [`AnnieError::SchemaDrift`] if the list or a product identifier is absent.
    /// - [`AnnieError::HttpStatus`] on a non-2xx status without a product list.
    /// - [`AnnieError::Http`] on network failure.
    pub async fn list_products(&self, account_id: &str) -> Result<Vec<Product>, AnnieError> {
        let raw = self
            .get_json(&format!("accounts/{account_id}/products"))
            .await?;
        let envelope: ProductsResponse = decode(raw, &["app_list", "products"], "product")?;
        envelope
            .app_list
            .into_iter()
            .map(|p| normalize_product(p, account_id))
            .collect()
    }

    /// Fetches the first page of reviews for a product.
    ///
    /// Accounts that carry vertical and market classifiers use the newer
    /// `{vertical}/{market}/app/{id}/reviews` endpoint.
    ///
    /// # Errors
    ///
    /// - [`AnnieError::SchemaDrift`] if the review list is absent.
    /// - [`AnnieError::HttpStatus`] on a non-2xx status without a review list.
    /// - [`AnnieError::Http`] on network failure.
    pub async fn fetch_reviews(
        &self,
        account: &Account,
        product_id: &str,
    ) -> Result<Vec<Review>, AnnieError> {
        let today = chrono::Local::now().date_naive();
        let window = ReviewWindow::ending(today, ReviewWindow::DEFAULT_LOOKBACK_DAYS);
        tracing::debug!(
            account_id = %account.id,
            product_id,
            start = %window.start,
            end = %window.end,
            "fetching reviews"
        );

        let raw = self.get_json(&reviews_path(account, product_id)).await?;
        let envelope: ReviewsResponse = decode(raw, &["review_list", "reviews"], "review")?;
        Ok(envelope.review_list)
    }

    /// Fetches the first page of daily sales for a product.
    ///
    /// A `next_page` marker is logged and returned but not followed.
    ///
    /// # Errors
    ///
    /// - [`AnnieError::SchemaDrift`] if the sales list or a sale date is absent.
    /// - [`AnnieError::HttpStatus`] on a non-2xx status without a sales list.
    /// - [`AnnieError::Http`] on network failure.
    pub async fn fetch_sales(
        &self,
        account_id: &str,
        product_id: &str,
    ) -> Result<SalesPage, AnnieError> {
        let raw = self
            .get_json(&format!(
                "accounts/{account_id}/products/{product_id}/sales?break_down=date"
            ))
            .await?;
        let envelope: SalesResponse = decode(raw, &["sales_list"], "sale")?;

        let next_page = envelope.next_page.and_then(|v| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        if let Some(next) = &next_page {
            tracing::warn!(
                account_id,
                product_id,
                next_page = %next,
                "sales response has more pages; only the first is exported"
            );
        }

        let records = envelope
            .sales_list
            .into_iter()
            .map(normalize_sale)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SalesPage { records, next_page })
    }

    /// Sends an authenticated GET for `path` and decodes the body as JSON.
    ///
    /// A non-2xx status is logged, not returned as an error, as long as the
    /// body is JSON.
    ///
    /// # Errors
    ///
    /// - [`AnnieError::InvalidRequest`] if `path` is empty.
    /// - [`AnnieError::Http`] on network failure.
    /// - [`AnnieError::HttpStatus`] if the status is non-2xx and the body is not JSON.
    /// - [`AnnieError::Deserialize`] if a 2xx body is not JSON.
    pub async fn get_json(&self, path: &str) -> Result<RawResponse, AnnieError> {
        let url = self.build_url(path)?;

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                "request failed; decoding body anyway"
            );
        }

        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(body) => Ok(RawResponse {
                url: url.to_string(),
                status,
                body,
            }),
            Err(_) if !status.is_success() => Err(AnnieError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                message: text.chars().take(ERROR_SNIPPET_LEN).collect(),
            }),
            Err(e) => Err(AnnieError::Deserialize {
                context: url.to_string(),
                source: e,
            }),
        }
    }

    /// Joins `path` onto the base URL. Leading slashes are ignored so every
    /// path stays relative to the API version segment.
    fn build_url(&self, path: &str) -> Result<Url, AnnieError> {
        let relative = path.trim().trim_start_matches('/');
        if relative.is_empty() {
            return Err(AnnieError::InvalidRequest(
                "request path must not be empty".to_string(),
            ));
        }
        self.base_url
            .join(relative)
            .map_err(|e| AnnieError::InvalidRequest(format!("invalid path '{path}': {e}")))
    }
}

/// Reviews path for `product_id`, using the newer classifier-based endpoint
/// when the account carries both vertical and market.
fn reviews_path(account: &Account, product_id: &str) -> String {
    match (&account.vertical, &account.market) {
        (Some(vertical), Some(market)) => format!("{vertical}/{market}/app/{product_id}/reviews"),
        _ => format!("accounts/{}/products/{product_id}/reviews", account.id),
    }
}

/// Deserializes `raw` into `T` once one of `list_keys` is confirmed present.
fn decode<T: DeserializeOwned>(
    raw: RawResponse,
    list_keys: &[&str],
    record: &str,
) -> Result<T, AnnieError> {
    if !raw.has_list(list_keys) {
        if !raw.status.is_success() {
            return Err(raw.status_error());
        }
        return Err(AnnieError::SchemaDrift {
            record: record.to_string(),
            field: list_keys.first().copied().unwrap_or_default().to_string(),
        });
    }

    let context = format!("{record} list from {}", raw.url);
    serde_json::from_value(raw.body).map_err(|e| AnnieError::Deserialize { context, source: e })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
