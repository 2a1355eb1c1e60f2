//! Product listing derivation.
//!
//! The listing page shows the catalog filtered by category and search term
//! and optionally sorted. Everything here is a pure function of the product
//! list and a [`ListingQuery`]; [`ListingCache`] memoizes results per catalog
//! generation.
//!
//! # Query parameters
//!
//! | name       | meaning                                            |
//! |------------|----------------------------------------------------|
//! | `search`   | free text, matched against name/descriptions/etc.  |
//! | `category` | exact category, case-insensitive                   |
//! | `sort`     | one of [`SortKey::ALL`], anything else is ignored  |

mod cache;

pub use cache::ListingCache;

use std::cmp::Ordering;
use std::collections::HashMap;

use cosmica_core::Product;

/// Recognized sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    Category,
}

impl SortKey {
    /// Every key, in the order a sort menu lists them.
    pub const ALL: [Self; 5] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Category,
    ];

    /// Query-parameter value for this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Category => "category",
        }
    }

    /// Parse a query-parameter value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name-asc" => Some(Self::NameAsc),
            "name-desc" => Some(Self::NameDesc),
            "price-asc" => Some(Self::PriceAsc),
            "price-desc" => Some(Self::PriceDesc),
            "category" => Some(Self::Category),
            _ => None,
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
            Self::PriceAsc => "Price (low to high)",
            Self::PriceDesc => "Price (high to low)",
            Self::Category => "Category",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::NameAsc => compare_collated(&a.name, &b.name),
            Self::NameDesc => compare_collated(&b.name, &a.name),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::Category => compare_collated(&a.category, &b.category),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three listing inputs that come from the page's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListingQuery {
    pub search: String,
    pub category: String,
    pub sort: Option<SortKey>,
}

impl ListingQuery {
    /// Build a query from raw parameter values.
    #[must_use]
    pub fn new(search: Option<&str>, category: Option<&str>, sort: Option<&str>) -> Self {
        Self {
            search: search.unwrap_or_default().to_string(),
            category: category.unwrap_or_default().to_string(),
            sort: sort.and_then(SortKey::parse),
        }
    }

    /// Build a query from decoded query-string pairs.
    ///
    /// Unrelated parameters are ignored; a repeated parameter keeps its last
    /// value.
    #[must_use]
    pub fn from_params<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut search = None;
        let mut category = None;
        let mut sort = None;
        for (name, value) in params {
            match name {
                "search" => search = Some(value),
                "category" => category = Some(value),
                "sort" => sort = Some(value),
                _ => {}
            }
        }
        Self::new(search, category, sort)
    }

    /// Returns `true` if a category or search filter is active.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        !self.category.is_empty() || self.search_term().is_some()
    }

    /// The normalized search term, if any.
    fn search_term(&self) -> Option<String> {
        let term = self.search.trim();
        (!term.is_empty()).then(|| term.to_lowercase())
    }
}

/// Number of products in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Filter and sort `products` according to `query`.
///
/// Steps run in order: category filter, search filter, sort. The sort is
/// stable, so products that compare equal keep their catalog order.
#[must_use]
pub fn derive_listing(products: &[Product], query: &ListingQuery) -> Vec<Product> {
    let category = (!query.category.is_empty()).then(|| query.category.to_lowercase());
    let term = query.search_term();

    let mut listing: Vec<Product> = products
        .iter()
        .filter(|product| {
            category
                .as_deref()
                .is_none_or(|category| product.category.to_lowercase() == category)
        })
        .filter(|product| term.as_deref().is_none_or(|term| matches_term(product, term)))
        .cloned()
        .collect();

    if let Some(key) = query.sort {
        listing.sort_by(|a, b| key.compare(a, b));
    }

    listing
}

/// Distinct categories of `products` with their counts, ordered by name.
#[must_use]
pub fn category_counts(products: &[Product]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for product in products {
        *counts.entry(product.category.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| compare_collated(&a.category, &b.category));
    counts
}

/// Compare two strings the way a Spanish-language UI would list them.
///
/// Case and accents are ignored first; the raw strings break ties so the
/// order is total.
#[must_use]
pub fn compare_collated(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn matches_term(product: &Product, term: &str) -> bool {
    [
        &product.name,
        &product.short_description,
        &product.long_description,
        &product.category,
        &product.brand,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cosmica_core::{Price, ProductId};

    use super::*;

    fn product(id: &str, name: &str, category: &str, price: u32) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "nombre": name,
            "precio": price,
            "stock": 3,
            "marca": "Generic",
            "categoria": category,
            "descripcionCorta": "A toy",
            "descripcionLarga": "A toy for everyone",
            "envioSinCargo": false,
            "edadDesde": 3,
            "edadHasta": 99,
            "foto": "https://example.com/toy.jpg"
        }))
        .unwrap()
    }

    fn robot_and_doll() -> Vec<Product> {
        vec![
            product("1", "Robot", "Tech", 100),
            product("2", "Doll", "Dolls", 50),
        ]
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_category_filter_is_exact_and_case_insensitive() {
        let products = robot_and_doll();

        let query = ListingQuery::new(None, Some("Tech"), None);
        assert_eq!(ids(&derive_listing(&products, &query)), ["1"]);

        let query = ListingQuery::new(None, Some("tech"), None);
        assert_eq!(ids(&derive_listing(&products, &query)), ["1"]);

        // "Doll" is a prefix of "Dolls" but not an exact match
        let query = ListingQuery::new(None, Some("Doll"), None);
        assert!(derive_listing(&products, &query).is_empty());
    }

    #[test]
    fn test_search_matches_any_field() {
        let products = robot_and_doll();

        let query = ListingQuery::new(Some("do"), None, None);
        assert_eq!(ids(&derive_listing(&products, &query)), ["2"]);

        let query = ListingQuery::new(Some("  TECH "), None, None);
        assert_eq!(ids(&derive_listing(&products, &query)), ["1"]);

        let mut branded = robot_and_doll();
        branded[1].brand = "Mattel".to_string();
        let query = ListingQuery::new(Some("mattel"), None, None);
        assert_eq!(ids(&derive_listing(&branded, &query)), ["2"]);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let products = robot_and_doll();
        let query = ListingQuery::new(Some("   "), None, None);
        assert_eq!(ids(&derive_listing(&products, &query)), ["1", "2"]);
        assert!(!query.is_filtered());
    }

    #[test]
    fn test_category_then_search() {
        let products = vec![
            product("1", "Robot", "Tech", 100),
            product("2", "Robot Dog", "Pets", 80),
            product("3", "Drone", "Tech", 300),
        ];
        let query = ListingQuery::new(Some("robot"), Some("Tech"), None);
        assert_eq!(ids(&derive_listing(&products, &query)), ["1"]);
    }

    #[test]
    fn test_price_sort() {
        let products = robot_and_doll();

        let query = ListingQuery::new(None, None, Some("price-asc"));
        assert_eq!(ids(&derive_listing(&products, &query)), ["2", "1"]);

        let query = ListingQuery::new(None, None, Some("price-desc"));
        assert_eq!(ids(&derive_listing(&products, &query)), ["1", "2"]);
    }

    #[test]
    fn test_name_sort_ignores_case_and_accents() {
        let products = vec![
            product("1", "zeppelin", "Air", 1),
            product("2", "Árbol", "Nature", 1),
            product("3", "Barco", "Sea", 1),
        ];

        let query = ListingQuery::new(None, None, Some("name-asc"));
        assert_eq!(ids(&derive_listing(&products, &query)), ["2", "3", "1"]);

        let query = ListingQuery::new(None, None, Some("name-desc"));
        assert_eq!(ids(&derive_listing(&products, &query)), ["1", "3", "2"]);
    }

    #[test]
    fn test_category_sort_is_stable() {
        let products = vec![
            product("1", "B", "Tech", 1),
            product("2", "A", "Dolls", 1),
            product("3", "C", "Tech", 1),
            product("4", "D", "Dolls", 1),
        ];
        let query = ListingQuery::new(None, None, Some("category"));
        assert_eq!(ids(&derive_listing(&products, &query)), ["2", "4", "1", "3"]);
    }

    #[test]
    fn test_unknown_sort_keeps_input_order() {
        let products = vec![
            product("1", "Zebra", "Tech", 300),
            product("2", "Ant", "Tech", 100),
        ];
        let query = ListingQuery::new(None, None, Some("popularity"));
        assert_eq!(query.sort, None);
        assert_eq!(ids(&derive_listing(&products, &query)), ["1", "2"]);
    }

    #[test]
    fn test_equal_prices_keep_input_order() {
        let products = vec![
            product("a", "First", "Tech", 10),
            product("b", "Second", "Tech", 10),
            product("c", "Cheap", "Tech", 5),
        ];
        let query = ListingQuery::new(None, None, Some("price-asc"));
        assert_eq!(ids(&derive_listing(&products, &query)), ["c", "a", "b"]);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let products = vec![
            product("1", "Robot", "Tech", 100),
            product("2", "Doll", "Dolls", 50),
            product("3", "Rocket", "Tech", 100),
        ];
        let query = ListingQuery::new(Some("r"), None, Some("price-desc"));

        let first = derive_listing(&products, &query);
        let second = derive_listing(&products, &query);
        assert_eq!(first, second);
    }

    #[test]
    fn test_category_counts() {
        let counts = category_counts(&robot_and_doll());
        assert_eq!(
            counts,
            vec![
                CategoryCount {
                    category: "Dolls".to_string(),
                    count: 1
                },
                CategoryCount {
                    category: "Tech".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_category_counts_group_exact_names() {
        let products = vec![
            product("1", "A", "Tech", 1),
            product("2", "B", "Tech", 1),
            product("3", "C", "Educativos", 1),
        ];
        let counts = category_counts(&products);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].category, "Educativos");
        assert_eq!(counts[1].count, 2);
        assert!(category_counts(&[]).is_empty());
    }

    #[test]
    fn test_query_from_params() {
        let query = ListingQuery::from_params([
            ("page", "2"),
            ("search", "robot"),
            ("category", "Tech"),
            ("sort", "name-desc"),
        ]);
        assert_eq!(query.search, "robot");
        assert_eq!(query.category, "Tech");
        assert_eq!(query.sort, Some(SortKey::NameDesc));
        assert!(query.is_filtered());

        assert_eq!(ListingQuery::from_params(std::iter::empty()), ListingQuery::default());
    }

    #[test]
    fn test_sort_key_round_trip_names() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(SortKey::parse(""), None);
    }

    #[test]
    fn test_listing_does_not_touch_prices() {
        let products = robot_and_doll();
        let listing = derive_listing(&products, &ListingQuery::default());
        assert_eq!(listing[0].price, Price::from(100_u32));
        assert_eq!(listing[1].id, ProductId::new("2"));
    }
}
