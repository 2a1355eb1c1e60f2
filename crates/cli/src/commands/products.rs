//! Product catalog commands.

use std::path::Path;

use tracing::info;

use cosmica_core::{Product, ProductDraft, ProductId};
use cosmica_storefront::api::{ApiError, ProductService};
use cosmica_storefront::catalog::CatalogError;
use cosmica_storefront::error::AppError;
use cosmica_storefront::listing::{ListingQuery, SortKey};

use super::{client, connect};

/// Print the filtered, sorted listing.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn list(
    retries: u32,
    query: &ListingQuery,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = connect(retries, true).await?;
    let listing = storefront.listing(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&*listing)?);
        return Ok(());
    }

    if let Some(sort) = query.sort {
        println!("Sorted by: {}", sort.label());
    }
    if listing.is_empty() {
        if query.is_filtered() {
            println!("No products match the current filters.");
        } else {
            println!("No products available.");
        }
        return Ok(());
    }

    for product in listing.iter() {
        println!("{}", listing_row(product));
    }
    println!("{} product(s)", listing.len());
    Ok(())
}

/// Print every category with its product count.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn categories(retries: u32) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = connect(retries, true).await?;
    let total = storefront.catalog().products().len();

    println!("{:<24} {total:>4}", "All");
    for entry in storefront.categories().iter() {
        println!("{:<24} {:>4}", entry.category, entry.count);
    }

    let sorts: Vec<&str> = SortKey::ALL.iter().map(|key| key.as_str()).collect();
    println!();
    println!("Sort options: {}", sorts.join(", "));
    Ok(())
}

/// Print the detail view of one product.
///
/// # Errors
///
/// Returns an error if the product does not exist or the service fails.
pub async fn show(retries: u32, id: &ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = connect(retries, false).await?;
    let product = storefront.product_detail(id).await?;

    println!("{} [{}]", product.name, product.id);
    println!("  Brand:     {}", product.brand);
    println!("  Category:  {}", product.category);
    println!("  Price:     {}", product.price);
    println!("  Ages:      {}", product.age_range());
    println!("  Stock:     {}", stock_label(&product));
    if product.free_shipping {
        println!("  Free shipping");
    }
    println!();
    println!("{}", product.short_description);
    println!();
    println!("{}", product.long_description);
    println!();
    println!("{}", product.image_url);
    Ok(())
}

/// Create a product from a YAML or JSON draft file.
///
/// Talks to the product API directly; the catalog list is not fetched.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the draft is
/// invalid, or the service rejects it.
pub async fn create(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let draft = read_draft(path).await?;
    let product = create_product(&client()?, &draft).await?;

    println!("Created product {} ({})", product.id, product.name);
    Ok(())
}

/// Replace a product's fields with a YAML or JSON draft file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the draft is
/// invalid, the product does not exist, or the service rejects it.
pub async fn update(id: &ProductId, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let draft = read_draft(path).await?;
    let product = update_product(&client()?, id, &draft).await?;

    println!("Updated product {} ({})", product.id, product.name);
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns an error if the service call fails.
pub async fn delete(id: &ProductId) -> Result<(), Box<dyn std::error::Error>> {
    delete_product(&client()?, id).await?;

    println!("Deleted product {id}");
    Ok(())
}

async fn create_product<S: ProductService>(
    service: &S,
    draft: &ProductDraft,
) -> Result<Product, AppError> {
    service
        .create_product(draft)
        .await
        .map_err(|e| CatalogError::Create(e).into())
}

async fn update_product<S: ProductService>(
    service: &S,
    id: &ProductId,
    draft: &ProductDraft,
) -> Result<Product, AppError> {
    service
        .update_product(id, draft)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => AppError::NotFound(id.clone()),
            e => CatalogError::Update(e).into(),
        })
}

async fn delete_product<S: ProductService>(service: &S, id: &ProductId) -> Result<(), AppError> {
    service.delete_product(id).await.map_err(|e| match e {
        ApiError::NotFound(_) => AppError::NotFound(id.clone()),
        e => CatalogError::Delete(e).into(),
    })
}

/// Read and check a product draft.
async fn read_draft(path: &Path) -> Result<ProductDraft, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(AppError::BadRequest(format!("File not found: {}", path.display())).into());
    }

    info!(path = %path.display(), "Loading product draft");
    let content = tokio::fs::read_to_string(path).await?;
    // YAML is a superset of JSON, so one parser covers both formats
    let draft: ProductDraft = serde_yaml::from_str(&content)?;
    draft.check().map_err(AppError::from)?;
    Ok(draft)
}

fn listing_row(product: &Product) -> String {
    let shipping = if product.free_shipping {
        "free shipping"
    } else {
        ""
    };
    format!(
        "{:>4}  {:<32} {:<16} {:>10}  {:<12} {shipping}",
        product.id.as_str(),
        product.name,
        product.category,
        product.price.to_string(),
        stock_label(product),
    )
}

fn stock_label(product: &Product) -> String {
    if product.is_in_stock() {
        format!("{} left", product.stock)
    } else {
        "Out of stock".to_string()
    }
}
