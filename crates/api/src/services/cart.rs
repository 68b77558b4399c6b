//! Cart sanitizing.
//!
//! The cart-replace endpoint accepts whatever the client sends and persists
//! only the lines that survive validation. Dropped lines surface no per-line
//! error; the caller just gets the smaller cart back.

use std::collections::HashSet;

use serde::Deserialize;

use meridian_core::ProductId;

use crate::models::CartLine;

/// A client-supplied product reference.
///
/// Accepts either a raw identifier or an embedded product object carrying
/// one. Anything else deserializes as `Malformed` and is dropped during
/// sanitizing rather than failing the whole request.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    /// A bare product ID: `3`
    Id(i32),
    /// An embedded product object: `{"id": 3, ...}`
    Embedded {
        id: i32,
    },
    /// Anything else. Kept so one bad line cannot fail the request.
    Malformed(serde_json::Value),
}

impl ProductRef {
    /// The canonical product ID, if the reference is well-formed.
    #[must_use]
    pub const fn id(&self) -> Option<ProductId> {
        match self {
            Self::Id(id) | Self::Embedded { id } => Some(ProductId::new(*id)),
            Self::Malformed(_) => None,
        }
    }
}

/// One line of a client-submitted cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineInput {
    /// Product reference. `watch` is the legacy field name.
    #[serde(alias = "watch")]
    pub product: ProductRef,
    /// Requested quantity. Validated to be positive during sanitizing.
    pub quantity: i64,
}

/// Filter a client-submitted cart down to the lines worth persisting.
///
/// A line survives when its product reference is well-formed, the product
/// exists in `catalog`, and the quantity is a positive `i32`. Everything
/// else is dropped silently.
///
/// Returns the surviving lines (input order preserved) and the number of
/// lines dropped.
#[must_use]
pub fn sanitize_cart(
    lines: Vec<CartLineInput>,
    catalog: &HashSet<ProductId>,
) -> (Vec<CartLine>, usize) {
    let submitted = lines.len();
    let valid: Vec<CartLine> = lines
        .into_iter()
        .filter_map(|line| {
            let product = line.product.id()?;
            if !catalog.contains(&product) {
                return None;
            }
            let quantity = i32::try_from(line.quantity).ok().filter(|&q| q > 0)?;
            Some(CartLine { product, quantity })
        })
        .collect();

    let dropped = submitted - valid.len();
    (valid, dropped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog(ids: &[i32]) -> HashSet<ProductId> {
        ids.iter().copied().map(ProductId::new).collect()
    }

    fn parse_lines(json: &str) -> Vec<CartLineInput> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_raw_and_embedded_refs_accepted() {
        let lines = parse_lines(
            r#"[
                {"product": 1, "quantity": 2},
                {"product": {"id": 2, "name": "Tidewatch"}, "quantity": 1}
            ]"#,
        );
        let (valid, dropped) = sanitize_cart(lines, &catalog(&[1, 2]));
        assert_eq!(dropped, 0);
        assert_eq!(
            valid,
            vec![
                CartLine {
                    product: ProductId::new(1),
                    quantity: 2
                },
                CartLine {
                    product: ProductId::new(2),
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn test_legacy_watch_field_accepted() {
        let lines = parse_lines(r#"[{"watch": 1, "quantity": 3}]"#);
        let (valid, dropped) = sanitize_cart(lines, &catalog(&[1]));
        assert_eq!(dropped, 0);
        assert_eq!(valid[0].product, ProductId::new(1));
    }

    #[test]
    fn test_unknown_product_dropped_silently() {
        let lines = parse_lines(
            r#"[
                {"product": 1, "quantity": 1},
                {"product": 99, "quantity": 1}
            ]"#,
        );
        let (valid, dropped) = sanitize_cart(lines, &catalog(&[1]));
        assert_eq!(valid.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_malformed_refs_dropped_silently() {
        let lines = parse_lines(
            r#"[
                {"product": "not-an-id", "quantity": 1},
                {"product": {"handle": "no-id-here"}, "quantity": 1},
                {"product": null, "quantity": 1},
                {"product": 1, "quantity": 1}
            ]"#,
        );
        let (valid, dropped) = sanitize_cart(lines, &catalog(&[1]));
        assert_eq!(valid.len(), 1);
        assert_eq!(dropped, 3);
    }

    #[test]
    fn test_non_positive_quantities_dropped() {
        let lines = parse_lines(
            r#"[
                {"product": 1, "quantity": 0},
                {"product": 1, "quantity": -2},
                {"product": 1, "quantity": 5000000000},
                {"product": 1, "quantity": 2}
            ]"#,
        );
        let (valid, dropped) = sanitize_cart(lines, &catalog(&[1]));
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].quantity, 2);
        assert_eq!(dropped, 3);
    }

    #[test]
    fn test_empty_input_is_empty_cart() {
        let (valid, dropped) = sanitize_cart(Vec::new(), &catalog(&[1]));
        assert!(valid.is_empty());
        assert_eq!(dropped, 0);
    }
}
