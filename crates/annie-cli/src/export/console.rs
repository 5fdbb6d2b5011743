//! Console progress output.

use annie_client::{Product, Review};

/// Number of reviews previewed per product.
pub(crate) const REVIEW_PREVIEW_COUNT: usize = 7;

/// Star glyphs for a 0 to 5 rating: filled stars then hollow ones.
pub(crate) fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "\u{2605}".repeat(filled), "\u{2606}".repeat(5 - filled))
}

pub(crate) fn render_product_header(product: &Product) -> String {
    format!("\n{} [{}]\n==========", product.name, product.id)
}

pub(crate) fn render_review(review: &Review) -> String {
    let field = |v: &Option<String>| v.as_deref().unwrap_or_default().to_string();
    format!(
        "\n{}, {}  {} ({})\n{}\n{}, {}",
        field(&review.version),
        stars(review.rating),
        field(&review.title),
        field(&review.country),
        field(&review.text),
        field(&review.date),
        field(&review.reviewer),
    )
}

pub(crate) fn print_product_header(product: &Product) {
    println!("{}", render_product_header(product));
}

pub(crate) fn print_review(review: &Review) {
    println!("{}", render_review(review));
}
