//! Read-only sales aggregates for the admin dashboard.
//!
//! Three independent aggregates over all historical purchase line items,
//! each joined against *current* product records (deleted products are
//! already gone from the input rows, which understates historical volume
//! for delisted products). Stateless: plain functions over fetched rows.

use std::collections::HashMap;

use serde::Serialize;

use meridian_core::{Category, ProductId, Sex};

/// One purchase line joined against its product and buyer.
#[derive(Debug, Clone)]
pub struct SalesLineItem {
    pub product: ProductId,
    pub name: String,
    pub category: Category,
    pub quantity: i32,
    pub buyer_sex: Option<Sex>,
}

/// Total units sold for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product: ProductId,
    pub name: String,
    pub total_quantity: i64,
}

/// Total units sold in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub category: Category,
    pub total_quantity: i64,
}

/// Total units sold to buyers of one sex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SexSales {
    pub sex: Sex,
    pub total_quantity: i64,
}

/// How many entries the top-sold aggregate returns.
const TOP_SOLD_LIMIT: usize = 10;

/// Top products by total quantity sold, descending, at most ten entries.
/// Tie order is unspecified.
#[must_use]
pub fn top_sold(items: &[SalesLineItem]) -> Vec<ProductSales> {
    let mut totals: HashMap<ProductId, (String, i64)> = HashMap::new();
    for item in items {
        let entry = totals
            .entry(item.product)
            .or_insert_with(|| (item.name.clone(), 0));
        entry.1 += i64::from(item.quantity);
    }

    let mut ranked: Vec<ProductSales> = totals
        .into_iter()
        .map(|(product, (name, total_quantity))| ProductSales {
            product,
            name,
            total_quantity,
        })
        .collect();
    ranked.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    ranked.truncate(TOP_SOLD_LIMIT);
    ranked
}

/// Total quantity sold per category, descending.
#[must_use]
pub fn sales_by_category(items: &[SalesLineItem]) -> Vec<CategorySales> {
    let mut totals: HashMap<Category, i64> = HashMap::new();
    for item in items {
        *totals.entry(item.category).or_insert(0) += i64::from(item.quantity);
    }

    let mut ranked: Vec<CategorySales> = totals
        .into_iter()
        .map(|(category, total_quantity)| CategorySales {
            category,
            total_quantity,
        })
        .collect();
    ranked.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    ranked
}

/// Total quantity sold per buyer sex, descending.
///
/// Lines whose buyer declined to state a sex are not counted.
#[must_use]
pub fn sales_by_sex(items: &[SalesLineItem]) -> Vec<SexSales> {
    let mut totals: HashMap<Sex, i64> = HashMap::new();
    for item in items {
        if let Some(sex) = item.buyer_sex {
            *totals.entry(sex).or_insert(0) += i64::from(item.quantity);
        }
    }

    let mut ranked: Vec<SexSales> = totals
        .into_iter()
        .map(|(sex, total_quantity)| SexSales {
            sex,
            total_quantity,
        })
        .collect();
    ranked.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(
        id: i32,
        name: &str,
        category: Category,
        quantity: i32,
        buyer_sex: Option<Sex>,
    ) -> SalesLineItem {
        SalesLineItem {
            product: ProductId::new(id),
            name: name.to_string(),
            category,
            quantity,
            buyer_sex,
        }
    }

    #[test]
    fn test_top_sold_and_category_scenario() {
        // [{A qty 3}, {A qty 2}, {B qty 1}], both men-watches
        let items = vec![
            item(1, "A", Category::MenWatches, 3, None),
            item(1, "A", Category::MenWatches, 2, None),
            item(2, "B", Category::MenWatches, 1, None),
        ];

        let top = top_sold(&items);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "A");
        assert_eq!(top[0].total_quantity, 5);
        assert_eq!(top[1].name, "B");
        assert_eq!(top[1].total_quantity, 1);

        let by_category = sales_by_category(&items);
        assert_eq!(
            by_category,
            vec![CategorySales {
                category: Category::MenWatches,
                total_quantity: 6
            }]
        );
    }

    #[test]
    fn test_top_sold_truncates_to_ten() {
        let items: Vec<SalesLineItem> = (1..=15)
            .map(|i| item(i, &format!("P{i}"), Category::SmartWatches, i, None))
            .collect();

        let top = top_sold(&items);
        assert_eq!(top.len(), 10);
        // Highest quantity first
        assert_eq!(top[0].total_quantity, 15);
        assert_eq!(top[9].total_quantity, 6);
    }

    #[test]
    fn test_categories_sorted_descending() {
        let items = vec![
            item(1, "A", Category::MenWatches, 1, None),
            item(2, "B", Category::WomenWatches, 7, None),
            item(3, "C", Category::KidsWatches, 4, None),
        ];

        let by_category = sales_by_category(&items);
        let quantities: Vec<i64> = by_category.iter().map(|c| c.total_quantity).collect();
        assert_eq!(quantities, vec![7, 4, 1]);
    }

    #[test]
    fn test_sales_by_sex_skips_unknown() {
        let items = vec![
            item(1, "A", Category::MenWatches, 3, Some(Sex::Female)),
            item(1, "A", Category::MenWatches, 2, Some(Sex::Male)),
            item(2, "B", Category::MenWatches, 5, Some(Sex::Female)),
            item(3, "C", Category::MenWatches, 9, None),
        ];

        let by_sex = sales_by_sex(&items);
        assert_eq!(
            by_sex,
            vec![
                SexSales {
                    sex: Sex::Female,
                    total_quantity: 8
                },
                SexSales {
                    sex: Sex::Male,
                    total_quantity: 2
                },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(top_sold(&[]).is_empty());
        assert!(sales_by_category(&[]).is_empty());
        assert!(sales_by_sex(&[]).is_empty());
    }
}
