//! Dashboard statistics.
//!
//! Everything here is computed in memory from already-loaded rows; the route
//! handler is responsible for fetching them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use backoffice_core::Gender;

use crate::models::{Product, User};

/// Users shown in the "Recent Local Users" panel when collapsed.
pub const RECENT_USERS: usize = 4;

/// Categories shown in the category chart.
pub const TOP_CATEGORIES: usize = 8;

/// Products shown in the "Top Products" chart.
pub const TOP_PRODUCTS: usize = 8;

/// Stock below this (and above zero) counts as low.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

const AGE_BUCKETS: [(&str, i32, i32); 6] = [
    ("<18", i32::MIN, 17),
    ("18-24", 18, 24),
    ("25-34", 25, 34),
    ("35-44", 35, 44),
    ("45-54", 45, 54),
    ("55+", 55, i32::MAX),
];

/// A headline number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub title: &'static str,
    pub value: i64,
}

/// One bar or slice of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub count: i64,
    /// Share of the chart total, 0-100 with one decimal.
    pub percent: f64,
}

/// A product point in the "Top Products" chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPoint {
    pub name: String,
    pub full_name: String,
    pub price: Decimal,
    pub stock: i32,
}

/// Stock levels across all products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHealth {
    pub in_stock: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
}

/// A row in the recent users panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub initials: String,
}

/// Everything the dashboard page and `/api/stats` show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub cards: Vec<StatCard>,
    pub gender: Vec<ChartSlice>,
    pub age_buckets: Vec<ChartSlice>,
    pub categories: Vec<ChartSlice>,
    pub stock: StockHealth,
    pub top_products: Vec<ProductPoint>,
    /// Users vs products split for the distribution chart.
    pub distribution: Vec<ChartSlice>,
    pub total_value: Decimal,
    pub total_stock: i64,
    pub recent_users: Vec<RecentUser>,
    pub total_users: usize,
    pub show_all: bool,
}

impl DashboardStats {
    /// Compute the dashboard from loaded rows.
    ///
    /// `product_total` is the full product count; `products` may be a subset
    /// used for the charts.
    #[must_use]
    pub fn compute(
        users: &[User],
        product_total: i64,
        products: &[Product],
        active_sessions: i64,
        show_all: bool,
    ) -> Self {
        let user_total = count(users.len());

        let cards = vec![
            StatCard {
                title: "Local Users",
                value: user_total,
            },
            StatCard {
                title: "API Products",
                value: product_total,
            },
            StatCard {
                title: "Total Records",
                value: user_total + product_total,
            },
            StatCard {
                title: "Active Sessions",
                value: active_sessions,
            },
        ];

        let distribution = slices(vec![
            ("Local Users".to_string(), user_total),
            ("API Products".to_string(), product_total),
        ]);

        Self {
            cards,
            gender: gender_distribution(users),
            age_buckets: age_distribution(users),
            categories: top_categories(products),
            stock: stock_health(products),
            top_products: top_products(products),
            distribution,
            total_value: products.iter().map(|p| p.price.amount()).sum(),
            total_stock: products.iter().map(|p| i64::from(p.stock)).sum(),
            recent_users: recent_users(users, show_all),
            total_users: users.len(),
            show_all,
        }
    }

    /// Whether there are more users than the collapsed panel shows.
    #[must_use]
    pub const fn can_expand(&self) -> bool {
        self.total_users > RECENT_USERS
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

fn slices(counts: Vec<(String, i64)>) -> Vec<ChartSlice> {
    let total: i64 = counts.iter().map(|(_, c)| c).sum();
    counts
        .into_iter()
        .map(|(label, count)| ChartSlice {
            percent: percent(count, total),
            label,
            count,
        })
        .collect()
}

fn gender_distribution(users: &[User]) -> Vec<ChartSlice> {
    slices(
        Gender::ALL
            .iter()
            .map(|g| {
                let n = users.iter().filter(|u| u.gender == *g).count();
                (g.label().to_string(), count(n))
            })
            .collect(),
    )
}

/// Bucket label for an age.
#[must_use]
pub fn age_bucket(age: i32) -> &'static str {
    AGE_BUCKETS
        .iter()
        .find(|(_, lo, hi)| (*lo..=*hi).contains(&age))
        .map_or("55+", |(label, _, _)| label)
}

fn age_distribution(users: &[User]) -> Vec<ChartSlice> {
    slices(
        AGE_BUCKETS
            .iter()
            .map(|(label, _, _)| {
                let n = users.iter().filter(|u| age_bucket(u.age) == *label).count();
                ((*label).to_string(), count(n))
            })
            .collect(),
    )
}

fn top_categories(products: &[Product]) -> Vec<ChartSlice> {
    let mut by_category: BTreeMap<&str, i64> = BTreeMap::new();
    for product in products {
        *by_category.entry(product.category.as_str()).or_default() += 1;
    }

    // BTreeMap iteration is by name, and the sort is stable, so ties stay alphabetical
    let mut counts: Vec<(&str, i64)> = by_category.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = count(products.len());
    counts
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(label, n)| ChartSlice {
            label: label.to_string(),
            count: n,
            percent: percent(n, total),
        })
        .collect()
}

fn stock_health(products: &[Product]) -> StockHealth {
    products
        .iter()
        .fold(StockHealth::default(), |mut acc, p| {
            match p.stock {
                s if s <= 0 => acc.out_of_stock += 1,
                s if s < LOW_STOCK_THRESHOLD => acc.low_stock += 1,
                _ => acc.in_stock += 1,
            }
            acc
        })
}

fn short_name(title: &str) -> String {
    if title.chars().count() > 15 {
        let head: String = title.chars().take(15).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

fn top_products(products: &[Product]) -> Vec<ProductPoint> {
    products
        .iter()
        .take(TOP_PRODUCTS)
        .map(|p| ProductPoint {
            name: short_name(&p.title),
            full_name: p.title.clone(),
            price: p.price.amount(),
            stock: p.stock,
        })
        .collect()
}

fn recent_users(users: &[User], show_all: bool) -> Vec<RecentUser> {
    let mut sorted: Vec<&User> = users.iter().collect();
    sorted.sort_by(|a, b| b.id.cmp(&a.id));

    let take = if show_all { sorted.len() } else { RECENT_USERS };
    sorted
        .into_iter()
        .take(take)
        .map(|u| RecentUser {
            id: u.id.as_i32(),
            name: u.full_name(),
            email: u.email.to_string(),
            initials: [&u.first_name, &u.last_name]
                .iter()
                .map(|s| s.chars().next().unwrap_or('U').to_ascii_uppercase())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use backoffice_core::{Email, Percentage, Price, ProductId, UserId};
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn user(id: i32, age: i32, gender: Gender) -> User {
        User {
            id: UserId::new(id),
            first_name: format!("first{id}"),
            last_name: format!("last{id}"),
            age,
            gender,
            email: Email::parse(&format!("user{id}@example.com")).unwrap(),
            phone: "555-0100".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: i32, title: &str, category: &str, price: i64, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            external_id: None,
            title: title.to_string(),
            category: category.to_string(),
            price: Price::new(Decimal::new(price, 0)).unwrap(),
            discount_percentage: Percentage::default(),
            stock,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_age_bucket_edges() {
        assert_eq!(age_bucket(17), "<18");
        assert_eq!(age_bucket(18), "18-24");
        assert_eq!(age_bucket(24), "18-24");
        assert_eq!(age_bucket(25), "25-34");
        assert_eq!(age_bucket(54), "45-54");
        assert_eq!(age_bucket(55), "55+");
        assert_eq!(age_bucket(120), "55+");
    }

    #[test]
    fn test_cards_and_distribution() {
        let users = vec![user(1, 30, Gender::Male), user(2, 40, Gender::Female)];
        let products = vec![product(1, "Mascara", "beauty", 10, 5)];

        let stats = DashboardStats::compute(&users, 6, &products, 3, false);
        let values: Vec<(&str, i64)> = stats.cards.iter().map(|c| (c.title, c.value)).collect();
        assert_eq!(
            values,
            vec![
                ("Local Users", 2),
                ("API Products", 6),
                ("Total Records", 8),
                ("Active Sessions", 3)
            ]
        );
        assert!((stats.distribution[0].percent - 25.0).abs() < f64::EPSILON);
        assert!((stats.distribution[1].percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gender_percentages_sum_to_hundred() {
        let users = vec![
            user(1, 20, Gender::Male),
            user(2, 20, Gender::Female),
            user(3, 20, Gender::Other),
        ];
        let stats = DashboardStats::compute(&users, 0, &[], 0, false);
        let sum: f64 = stats.gender.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 0.2, "{sum}");
        assert!(stats.gender.iter().all(|s| s.count == 1));
    }

    #[test]
    fn test_empty_inputs_have_zero_percentages() {
        let stats = DashboardStats::compute(&[], 0, &[], 0, false);
        assert!(stats.gender.iter().all(|s| s.percent == 0.0));
        assert!(stats.categories.is_empty());
        assert!(stats.recent_users.is_empty());
        assert_eq!(stats.total_value, Decimal::ZERO);
    }

    #[test]
    fn test_top_categories_ordering() {
        let mut products = Vec::new();
        let mut id = 0;
        for (category, n) in [
            ("groceries", 3),
            ("beauty", 3),
            ("furniture", 5),
            ("a1", 1),
            ("a2", 1),
            ("a3", 1),
            ("a4", 1),
            ("a5", 1),
            ("a6", 1),
        ] {
            for _ in 0..n {
                id += 1;
                products.push(product(id, "Item", category, 1, 20));
            }
        }

        let stats = DashboardStats::compute(&[], count(products.len()), &products, 0, false);
        let labels: Vec<&str> = stats.categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["furniture", "beauty", "groceries", "a1", "a2", "a3", "a4", "a5"]
        );
    }

    #[test]
    fn test_stock_health() {
        let products = vec![
            product(1, "A", "x", 1, 0),
            product(2, "B", "x", 1, 9),
            product(3, "C", "x", 1, 10),
            product(4, "D", "x", 1, 250),
        ];
        let stats = DashboardStats::compute(&[], 4, &products, 0, false);
        assert_eq!(
            stats.stock,
            StockHealth {
                in_stock: 2,
                low_stock: 1,
                out_of_stock: 1
            }
        );
        assert_eq!(stats.total_stock, 269);
        assert_eq!(stats.total_value, Decimal::new(4, 0));
    }

    #[test]
    fn test_recent_users_newest_first() {
        let users: Vec<User> = (1..=6).map(|i| user(i, 30, Gender::Male)).collect();

        let collapsed = DashboardStats::compute(&users, 0, &[], 0, false);
        let ids: Vec<i32> = collapsed.recent_users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![6, 5, 4, 3]);
        assert!(collapsed.can_expand());
        assert_eq!(collapsed.recent_users[0].initials, "FL");

        let expanded = DashboardStats::compute(&users, 0, &[], 0, true);
        assert_eq!(expanded.recent_users.len(), 6);
    }

    #[test]
    fn test_top_products_truncate_long_titles() {
        let products = vec![product(1, "Essence Mascara Lash Princess", "beauty", 10, 5)];
        let stats = DashboardStats::compute(&[], 1, &products, 0, false);
        assert_eq!(stats.top_products[0].name, "Essence Mascara...");
        assert_eq!(stats.top_products[0].full_name, "Essence Mascara Lash Princess");
    }
}
