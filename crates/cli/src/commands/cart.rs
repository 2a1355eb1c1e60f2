//! Cart preview command.

use tracing::warn;

use cosmica_core::ProductId;
use cosmica_storefront::error::AppError;
use cosmica_storefront::state::CartSummary;

use super::connect;

/// Add each id to a fresh cart and print the priced result.
///
/// Ids that are unknown or out of stock are reported and skipped. Repeating
/// an id adds another unit.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn preview(retries: u32, ids: &[ProductId]) -> Result<(), Box<dyn std::error::Error>> {
    let mut storefront = connect(retries, true).await?;

    for id in ids {
        match storefront.add_to_cart(id) {
            Ok(()) => {}
            Err(e @ (AppError::NotFound(_) | AppError::OutOfStock(_))) => {
                warn!(id = %id, "Skipping product");
                eprintln!("skipped: {}", e.user_message());
            }
            Err(e) => return Err(e.into()),
        }
    }

    print!("{}", render(&storefront.cart_summary()));
    Ok(())
}

fn render(summary: &CartSummary) -> String {
    if summary.lines.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for line in &summary.lines {
        let marker = if line.orphaned { " (no longer sold)" } else { "" };
        out.push_str(&format!(
            "{:>3} x {:<32} {:>10} {:>10}{marker}\n",
            line.quantity,
            line.name,
            line.unit_price.to_string(),
            line.line_total.to_string(),
        ));
    }
    out.push_str(&format!(
        "{} item(s), total {}\n",
        summary.total_items, summary.total_price
    ));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cosmica_core::Price;
    use cosmica_storefront::state::CartLineView;

    #[test]
    fn test_render_empty_cart() {
        let summary = CartSummary {
            lines: Vec::new(),
            total_items: 0,
            total_price: Price::ZERO,
        };
        assert_eq!(render(&summary), "Cart is empty\n");
    }

    #[test]
    fn test_render_lines_and_total() {
        let summary = CartSummary {
            lines: vec![CartLineView {
                id: ProductId::new("1"),
                name: "Robot".to_string(),
                quantity: 2,
                unit_price: Price::from(10_u32),
                line_total: Price::from(20_u32),
                orphaned: true,
            }],
            total_items: 2,
            total_price: Price::from(20_u32),
        };

        let out = render(&summary);
        assert!(out.contains("Robot"));
        assert!(out.contains("$20.00"));
        assert!(out.contains("(no longer sold)"));
        assert!(out.ends_with("2 item(s), total $20.00\n"));
    }
}
