//! Canonical sample dataset.
//!
//! One source of truth for the raw and 3NF schemas: the raw rows are
//! derived from it (location names inlined, products tagged with an
//! "owner"), the 3NF rows are taken as-is.

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{Customer, Location, NormalizedSale, ProductCategory, SaleRecord};

/// A customer as entered, pointing at a normalized location.
#[derive(Debug, Clone)]
pub struct SeedCustomer {
    pub customer_id: i64,
    pub full_name: String,
    pub location_id: i64,
}

/// A product as entered.
///
/// `owner_id` only exists to reproduce the raw schema's product-to-customer
/// column.
#[derive(Debug, Clone)]
pub struct SeedProduct {
    pub product_id: i64,
    pub product_name: String,
    pub category_id: i64,
    pub price: f64,
    pub cost: f64,
    pub owner_id: i64,
}

/// A sale as entered. Price comes from the product.
#[derive(Debug, Clone)]
pub struct SeedSale {
    pub sale_id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub sold_at: NaiveDateTime,
}

/// Rows for the raw and 3NF schemas.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub locations: Vec<Location>,
    pub categories: Vec<ProductCategory>,
    pub customers: Vec<SeedCustomer>,
    pub products: Vec<SeedProduct>,
    pub sales: Vec<SeedSale>,
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .unwrap_or_default()
}

impl Dataset {
    /// Five buying customers across four cities, six products of which one
    /// never sells, and twelve sales over the first quarter of 2024.
    pub fn sample() -> Self {
        let locations = [
            (1, "Nairobi", "Nairobi", "Kenya"),
            (2, "Mombasa", "Coast", "Kenya"),
            (3, "Kisumu", "Nyanza", "Kenya"),
            (4, "Kampala", "Central", "Uganda"),
        ]
        .into_iter()
        .map(|(location_id, name, region, country)| Location {
            location_id,
            name: name.to_string(),
            region: region.to_string(),
            country: country.to_string(),
        })
        .collect();

        let categories = [(1, "Electronics"), (2, "Furniture"), (3, "Stationery")]
            .into_iter()
            .map(|(category_id, name)| ProductCategory {
                category_id,
                name: name.to_string(),
            })
            .collect();

        let customers = [
            (1, "Amina Wanjiru", 1),
            (2, "Brian Otieno", 3),
            (3, "Cynthia Mwangi", 1),
            (4, "David Kiptoo", 2),
            (5, "Esther Nakato", 4),
            (6, "Felix Ouma", 2),
        ]
        .into_iter()
        .map(|(customer_id, full_name, location_id)| SeedCustomer {
            customer_id,
            full_name: full_name.to_string(),
            location_id,
        })
        .collect();

        let products = [
            (1, "Laptop", 1, 4000.0, 3100.0, 1),
            (2, "Smartphone", 1, 2500.0, 1900.0, 2),
            (3, "Office Chair", 2, 1500.0, 900.0, 3),
            (4, "Standing Desk", 2, 3000.0, 2000.0, 4),
            (5, "Notebook Pack", 3, 500.0, 200.0, 5),
            (6, "Projector", 1, 6000.0, 4500.0, 1),
        ]
        .into_iter()
        .map(
            |(product_id, product_name, category_id, price, cost, owner_id)| SeedProduct {
                product_id,
                product_name: product_name.to_string(),
                category_id,
                price,
                cost,
                owner_id,
            },
        )
        .collect();

        let sales = [
            (1, 1, 1, 2, at(2024, 1, 5, 10)),
            (2, 2, 3, 2, at(2024, 1, 9, 11)),
            (3, 3, 2, 2, at(2024, 1, 15, 9)),
            (4, 1, 4, 3, at(2024, 1, 20, 14)),
            (5, 4, 5, 4, at(2024, 2, 2, 16)),
            (6, 5, 1, 1, at(2024, 2, 10, 12)),
            (7, 3, 4, 4, at(2024, 2, 14, 15)),
            (8, 2, 2, 1, at(2024, 2, 18, 10)),
            (9, 4, 3, 3, at(2024, 3, 1, 13)),
            (10, 5, 5, 2, at(2024, 3, 7, 17)),
            (11, 1, 3, 3, at(2024, 3, 12, 8)),
            (12, 3, 2, 1, at(2024, 3, 25, 18)),
        ]
        .into_iter()
        .map(
            |(sale_id, customer_id, product_id, quantity, sold_at)| SeedSale {
                sale_id,
                customer_id,
                product_id,
                quantity,
                sold_at,
            },
        )
        .collect();

        Self {
            locations,
            categories,
            customers,
            products,
            sales,
        }
    }

    fn product(&self, product_id: i64) -> Option<&SeedProduct> {
        self.products.iter().find(|p| p.product_id == product_id)
    }

    fn price_of(&self, product_id: i64) -> f64 {
        self.product(product_id).map(|p| p.price).unwrap_or(0.0)
    }

    /// `customer_info` rows with the location name inlined.
    pub fn raw_customers(&self) -> Vec<Customer> {
        self.customers
            .iter()
            .map(|c| Customer {
                customer_id: c.customer_id,
                full_name: c.full_name.clone(),
                location: self
                    .locations
                    .iter()
                    .find(|l| l.location_id == c.location_id)
                    .map(|l| l.name.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// `sales` rows with `total_sales` precomputed.
    pub fn raw_sales(&self) -> Vec<SaleRecord> {
        self.sales
            .iter()
            .map(|s| SaleRecord {
                sales_id: s.sale_id,
                customer_id: s.customer_id,
                product_id: s.product_id,
                quantity: s.quantity,
                total_sales: s.quantity as f64 * self.price_of(s.product_id),
            })
            .collect()
    }

    /// `sales_3nf` rows with the unit price captured at sale time.
    pub fn normalized_sales(&self) -> Vec<NormalizedSale> {
        self.sales
            .iter()
            .map(|s| NormalizedSale {
                sale_id: s.sale_id,
                customer_id: s.customer_id,
                product_id: s.product_id,
                quantity: s.quantity,
                unit_price: self.price_of(s.product_id),
                sold_at: s.sold_at,
            })
            .collect()
    }
}
