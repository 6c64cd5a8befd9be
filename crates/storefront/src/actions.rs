//! Handlers behind the storefront's buttons and forms.
//!
//! Each helper wraps a [`SessionStore`] or [`ApiClient`] call, applies page
//! policy (the compare cap, form validation, sign-in checks) and returns the
//! [`Notice`] to show. Network-backed helpers return [`StorefrontError`]; the
//! caller renders `err.notice(..)` and follows `err.route()`.

use tracing::{info, instrument, warn};

use solarmart_core::{
    CalculatorEstimate, CalculatorForm, CalculatorInput, Category, Product, ProductId, Review,
    ReviewDraft, ReviewReceipt,
};

use crate::api::{ApiClient, ApiError, BearerToken};
use crate::catalog::ListingParams;
use crate::error::{Notice, StorefrontError, add_breadcrumb};
use crate::session::SessionStore;
use crate::view::{ProductView, derive_view};

/// Most products the compare table shows side by side.
pub const COMPARE_LIMIT: usize = 4;

/// Related products requested for a product page.
pub const RELATED_LIMIT: u32 = 4;

/// Products suggested alongside a savings estimate.
pub const RECOMMENDATION_LIMIT: usize = 4;

// =============================================================================
// Cart, Wishlist & Compare
// =============================================================================

/// Add to cart from a card, the detail page, the wishlist or the compare table.
pub fn add_to_cart(store: &SessionStore, product: &Product, quantity: u32) -> Notice {
    store.add_to_cart(product, quantity);
    let count = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str()), ("quantity", count.as_str())]),
    );
    Notice::success(format!("{} added to cart!", product.name))
}

/// Heart button on a product card.
pub fn toggle_wishlist(store: &SessionStore, product: &Product) -> Notice {
    let data = [("product_id", product.id.as_str())];
    if store.remove_from_wishlist(&product.id) {
        add_breadcrumb("wishlist", "Removed from wishlist", Some(&data));
        Notice::success("Removed from wishlist")
    } else {
        store.add_to_wishlist(product);
        add_breadcrumb("wishlist", "Added to wishlist", Some(&data));
        Notice::success("Added to wishlist!")
    }
}

/// Compare button on a product card. Adding past [`COMPARE_LIMIT`] is
/// refused and leaves the list unchanged.
pub fn toggle_compare(store: &SessionStore, product: &Product) -> Notice {
    if store.remove_from_compare(&product.id) {
        return Notice::success("Removed from compare");
    }
    if store.compare_len() >= COMPARE_LIMIT {
        return compare_full();
    }
    store.add_to_compare(product);
    add_breadcrumb(
        "compare",
        "Added to compare",
        Some(&[("product_id", product.id.as_str())]),
    );
    Notice::success("Added to compare!")
}

/// "Compare" action on the wishlist page.
pub fn wishlist_to_compare(store: &SessionStore, product: &Product) -> Notice {
    if store.is_in_compare(&product.id) {
        return Notice::info("Product already in compare list");
    }
    if store.compare_len() >= COMPARE_LIMIT {
        return compare_full();
    }
    store.add_to_compare(product);
    Notice::success(format!("{} added to compare!", product.name))
}

/// "Save" action on the compare page.
pub fn compare_to_wishlist(store: &SessionStore, product: &Product) -> Notice {
    if store.add_to_wishlist(product) {
        Notice::success(format!("{} added to wishlist!", product.name))
    } else {
        Notice::info("Product already in wishlist")
    }
}

/// Remove button on the wishlist page.
pub fn remove_from_wishlist(store: &SessionStore, id: &ProductId) -> Notice {
    store.remove_from_wishlist(id);
    Notice::success("Removed from wishlist")
}

/// Remove button on the compare page.
pub fn remove_from_compare(store: &SessionStore, id: &ProductId) -> Notice {
    store.remove_from_compare(id);
    Notice::success("Removed from comparison")
}

pub fn clear_wishlist(store: &SessionStore) -> Notice {
    store.clear_wishlist();
    Notice::success("Wishlist cleared")
}

pub fn clear_compare(store: &SessionStore) -> Notice {
    store.clear_compare();
    Notice::success("Comparison cleared")
}

fn compare_full() -> Notice {
    Notice::info(format!("You can compare up to {COMPARE_LIMIT} products"))
}

// =============================================================================
// Product Page
// =============================================================================

/// Everything the product detail page renders.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub product: Product,
    pub view: ProductView,
    /// Newest first. Empty if reviews could not be loaded.
    pub reviews: Vec<Review>,
    /// Same category, excluding this product.
    pub related: Vec<Product>,
}

/// Load a product page.
///
/// Reviews and related products are best-effort: a failure there is logged and
/// the page renders without them.
///
/// # Errors
///
/// Returns [`StorefrontError::NotFound`] for an unknown ID and
/// [`StorefrontError::ProductUnavailable`] if the product could not be
/// fetched. Both route back to the listing.
#[instrument(skip(client), fields(product_id = %id))]
pub async fn load_product_page(
    client: &ApiClient,
    id: &ProductId,
) -> Result<ProductPage, StorefrontError> {
    add_breadcrumb(
        "navigation",
        "Viewed product page",
        Some(&[("product_id", id.as_str())]),
    );

    let (product, reviews) = tokio::join!(client.get_product(id), client.get_reviews(id));

    let product = product.map_err(|e| match e {
        ApiError::NotFound(_) => StorefrontError::NotFound(id.to_string()),
        other => StorefrontError::ProductUnavailable(other).reported(),
    })?;

    let reviews = reviews.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch reviews");
        Vec::new()
    });

    let related = related_products(client, &product).await;

    Ok(ProductPage {
        view: derive_view(&product),
        product,
        reviews,
        related,
    })
}

async fn related_products(client: &ApiClient, product: &Product) -> Vec<Product> {
    let params = ListingParams {
        category: Some(product.category),
        limit: Some(RELATED_LIMIT),
        ..ListingParams::default()
    };

    match client.list_products(&params).await {
        Ok(products) => products.into_iter().filter(|p| p.id != product.id).collect(),
        Err(e) => {
            warn!(error = %e, "Failed to fetch related products");
            Vec::new()
        }
    }
}

/// Submit a review from the product page.
///
/// The sign-in check comes first, then the draft is validated; neither
/// failure touches the network.
///
/// # Errors
///
/// Returns [`StorefrontError::AuthenticationRequired`] without a credential,
/// [`StorefrontError::Validation`] for an invalid draft, or
/// [`StorefrontError::Api`] if the backend rejects the submission.
#[instrument(skip(client, credential, draft), fields(product_id = %product_id))]
pub async fn submit_review(
    client: &ApiClient,
    credential: Option<&BearerToken>,
    product_id: &ProductId,
    draft: ReviewDraft,
) -> Result<ReviewReceipt, StorefrontError> {
    let credential = credential.ok_or(StorefrontError::AuthenticationRequired)?;
    let submission = draft.into_submission(product_id.clone())?;

    let receipt = client
        .submit_review(credential, &submission)
        .await
        .map_err(|e| StorefrontError::Api(e).reported())?;
    info!(review_id = %receipt.id, "Review submitted");
    add_breadcrumb(
        "review",
        "Submitted review",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(receipt)
}

// =============================================================================
// Calculator
// =============================================================================

/// A savings estimate plus kits sized to match it.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsEstimate {
    pub estimate: CalculatorEstimate,
    pub recommended: Vec<Product>,
}

/// Run the savings calculator.
///
/// Recommendations are best-effort; if the listing cannot be fetched the
/// estimate is returned without them.
///
/// # Errors
///
/// Returns [`StorefrontError::Validation`] for a blank or malformed form
/// before any request is made, or [`StorefrontError::Api`] if the estimate
/// request fails.
#[instrument(skip_all)]
pub async fn estimate_savings(
    client: &ApiClient,
    form: CalculatorForm,
) -> Result<SavingsEstimate, StorefrontError> {
    let input = form.into_input()?;
    let estimate = client
        .calculate(&input)
        .await
        .map_err(|e| StorefrontError::Api(e).reported())?;

    let recommended = match client.list_products(&ListingParams::default()).await {
        Ok(products) => recommend_for(products, &input, &estimate),
        Err(e) => {
            warn!(error = %e, "Could not fetch product recommendations");
            Vec::new()
        }
    };

    Ok(SavingsEstimate {
        estimate,
        recommended,
    })
}

/// Kits between 3 kW under and 5 kW over the recommended size, closest first.
/// Commercial properties only see commercial kits.
#[must_use]
pub fn recommend_for(
    products: Vec<Product>,
    input: &CalculatorInput,
    estimate: &CalculatorEstimate,
) -> Vec<Product> {
    let target = estimate.recommended_size_kw;
    let mut matches: Vec<Product> = products
        .into_iter()
        .filter(|p| p.system_size_kw >= target - 3.0 && p.system_size_kw <= target + 5.0)
        .filter(|p| {
            input.property_type != Category::Commercial || p.category == Category::Commercial
        })
        .collect();

    matches.sort_by(|a, b| {
        (a.system_size_kw - target)
            .abs()
            .total_cmp(&(b.system_size_kw - target).abs())
    });
    matches.truncate(RECOMMENDATION_LIMIT);
    matches
}
