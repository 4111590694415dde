//! # Seed Data Generator
//!
//! Populates the database with demo users and products for development.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults
//! cargo run -p bazaar-db --bin seed
//!
//! # Specify database path
//! cargo run -p bazaar-db --bin seed -- --db ./data/bazaar.db
//! ```
//!
//! ## Generated Data
//! - One admin, three sellers, three customers (password for all: `password`
//!   hashed offline; change before exposing the server)
//! - Products across categories, split between the sellers
//! - Roughly a third of products carry an active percentage discount

use chrono::{Duration, Utc};
use std::env;

use bazaar_core::Role;
use bazaar_db::repository::product::{NewProduct, ProductFilter};
use bazaar_db::repository::user::NewUser;
use bazaar_db::{Database, DbConfig};

/// (category, brand, product names)
const CATALOG: &[(&str, &str, &[&str])] = &[
    (
        "outdoor",
        "Summit",
        &[
            "Trail Runner 42L Pack",
            "Ridgeline 2P Tent",
            "Glacier Down Jacket",
            "Switchback Trekking Poles",
            "Basecamp Sleeping Bag",
            "Cascade Water Filter",
        ],
    ),
    (
        "electronics",
        "Voltix",
        &[
            "Aura Wireless Earbuds",
            "Pulse Fitness Band",
            "Nimbus Bluetooth Speaker",
            "Orbit Power Bank 20000",
            "Flux USB-C Hub",
            "Beacon Smart Bulb",
        ],
    ),
    (
        "home",
        "Hearth & Co",
        &[
            "Cast Iron Skillet 12in",
            "French Press 1L",
            "Linen Throw Blanket",
            "Ceramic Pour-Over Set",
            "Oak Cutting Board",
            "Stoneware Mug Set",
        ],
    ),
    (
        "books",
        "Quill Press",
        &[
            "The Cartographer's Daughter",
            "Systems Thinking in Practice",
            "A Field Guide to Night Skies",
            "The Sourdough Companion",
            "Letters from the Alpine Post",
            "Tidewater Stories",
        ],
    ),
];

// Argon2 hash of "password" (demo accounts only).
const DEMO_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2VlZGRlbW9zYWx0$7kD1wOqiH0NBZc5dgPQ0P0sA9e9C1m9M7o6H0z6vQfM";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bazaar_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bazaar Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating users...");

    db.users()
        .create(NewUser {
            user_name: "Admin".to_string(),
            email: "admin@bazaar.test".to_string(),
            phone_number: "5550000000".to_string(),
            password_hash: DEMO_PASSWORD_HASH.to_string(),
            role: Role::Admin,
        })
        .await?;

    let mut seller_ids = Vec::new();
    for n in 1..=3 {
        let seller = db
            .users()
            .create(NewUser {
                user_name: format!("Seller {}", n),
                email: format!("seller{}@bazaar.test", n),
                phone_number: format!("555000010{}", n),
                password_hash: DEMO_PASSWORD_HASH.to_string(),
                role: Role::Seller,
            })
            .await?;
        seller_ids.push(seller.id);
    }

    for n in 1..=3 {
        db.users()
            .create(NewUser {
                user_name: format!("Customer {}", n),
                email: format!("customer{}@bazaar.test", n),
                phone_number: format!("555000020{}", n),
                password_hash: DEMO_PASSWORD_HASH.to_string(),
                role: Role::Customer,
            })
            .await?;
    }

    println!("✓ Created 1 admin, 3 sellers, 3 customers");
    println!();
    println!("Generating products...");

    let now = Utc::now();
    let mut generated = 0usize;
    let start = std::time::Instant::now();

    for (category_idx, (category, brand, names)) in CATALOG.iter().enumerate() {
        for (product_idx, name) in names.iter().enumerate() {
            let seed = category_idx * 100 + product_idx;
            let owner_id = seller_ids[seed % seller_ids.len()];

            // $9.99 - $89.99
            let price_cents = 999 + ((seed * 37) % 8000) as i64;
            let stock = ((seed * 13) % 40) as i64;

            // Every third product gets a discount; half of those windowed.
            let (discount_bps, sale_starts_at, sale_ends_at) = match seed % 3 {
                0 if seed % 6 == 0 => (
                    Some(1000 + ((seed % 4) as i64 * 500)),
                    Some(now - Duration::days(1)),
                    Some(now + Duration::days(14)),
                ),
                0 => (Some(2000), None, None),
                _ => (None, None, None),
            };

            db.products()
                .insert(NewProduct {
                    name: name.to_string(),
                    description: Some(format!("{} by {}", name, brand)),
                    price_cents,
                    discount_bps,
                    sale_starts_at,
                    sale_ends_at,
                    stock,
                    category: category.to_string(),
                    brand: brand.to_string(),
                    image_url: None,
                    owner_id,
                })
                .await?;

            generated += 1;
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("Verifying search...");
    let pack_filter = ProductFilter {
        name: Some("pack".to_string()),
        ..Default::default()
    };
    let hits = db.products().search(&pack_filter, 10).await?;
    println!("  Search 'pack': {} results", hits.len());
    let on_sale = db.products().list_on_sale(now, 50).await?;
    println!("  On sale now: {} products", on_sale.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
