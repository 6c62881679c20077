//! # Seed Data Generator
//!
//! Populates the database with sample catalog data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p shop-db --bin seed
//!
//! # Specify database path
//! cargo run -p shop-db --bin seed -- --db ./data/shop.db
//! ```
//!
//! Products are spread across a handful of categories with varied prices
//! and stock levels, including a few low-stock rows so the dashboard's
//! low-stock counter has something to show.

use std::env;

use shop_db::repository::product::NewProduct;
use shop_db::{Database, DbConfig};

const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Beverages",
        &[
            ("Coca-Cola 330ml", 150, 48),
            ("Pepsi 330ml", 145, 36),
            ("Orange Juice 1L", 320, 12),
            ("Still Water 500ml", 80, 120),
            ("Iced Tea 500ml", 180, 7),
        ],
    ),
    (
        "Snacks",
        &[
            ("Salted Chips", 199, 40),
            ("Chocolate Bar", 120, 65),
            ("Trail Mix 200g", 350, 9),
            ("Cookies Pack", 275, 22),
        ],
    ),
    (
        "Household",
        &[
            ("Dish Soap", 240, 18),
            ("Paper Towels 2pk", 410, 6),
            ("Sponges 3pk", 160, 30),
        ],
    ),
    (
        "Stationery",
        &[
            ("Ballpoint Pen", 60, 200),
            ("Notebook A5", 220, 45),
            ("Sticky Notes", 130, 3),
        ],
    ),
];

#[tokio::main]
async fn main() {
    let mut db_path = "./data/shop.db".to_string();
    let args: Vec<String> = env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--db" && i + 1 < args.len() {
            db_path = args[i + 1].clone();
        }
    }

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent).expect("create database directory");
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .expect("open database");

    let products = db.products();
    let mut created = 0usize;
    let mut skipped = 0usize;

    for (category, items) in CATALOG {
        for (name, price_cents, stock) in *items {
            let custom_id = format!(
                "{}-{:03}",
                category.chars().take(3).collect::<String>().to_uppercase(),
                created + skipped + 1
            );
            let result = products
                .create(NewProduct {
                    name: (*name).to_string(),
                    price_cents: *price_cents,
                    stock: *stock,
                    category: Some((*category).to_string()),
                    custom_id: Some(custom_id),
                    description: None,
                    image_url: None,
                })
                .await;

            match result {
                Ok(_) => created += 1,
                // re-running the seed hits the unique custom_id
                Err(_) => skipped += 1,
            }
        }
    }

    println!("Seeded {created} products ({skipped} already present) into {db_path}");
}
