//! # Seed Data Generator
//!
//! Populates the database with a sample product catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p caixa-db --bin seed
//!
//! # Specify database path
//! cargo run -p caixa-db --bin seed -- --db ./data/caixa.db
//! ```
//!
//! Seeding is skipped when the catalog already has products, so the
//! command is safe to run repeatedly.

use chrono::Utc;
use std::env;

use caixa_core::{Product, StoreConfig};
use caixa_db::{Database, DbConfig};

/// Sample catalog: (id, name, price in cents, stock).
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("CAFE-500", "Café Torrado 500g", 1890, 40),
    ("ACUCAR-1KG", "Açúcar Cristal 1kg", 549, 60),
    ("ARROZ-5KG", "Arroz Branco Tipo 1 5kg", 2799, 25),
    ("FEIJAO-1KG", "Feijão Carioca 1kg", 899, 35),
    ("LEITE-1L", "Leite Integral 1L", 599, 48),
    ("OLEO-900", "Óleo de Soja 900ml", 749, 30),
    ("MACARRAO-500", "Macarrão Espaguete 500g", 459, 50),
    ("FARINHA-1KG", "Farinha de Trigo 1kg", 629, 20),
    ("SAL-1KG", "Sal Refinado 1kg", 299, 45),
    ("BISCOITO-200", "Biscoito Recheado 200g", 389, 70),
    ("REFRI-2L", "Refrigerante Cola 2L", 999, 55),
    ("AGUA-500", "Água Mineral 500ml", 250, 120),
    ("SABAO-5UN", "Sabão em Barra 5un", 1190, 15),
    ("DETERGENTE", "Detergente Neutro 500ml", 279, 65),
    ("PAPEL-4UN", "Papel Higiênico 4 rolos", 849, 3),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./caixa_dev.db");

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
                println!("Caixa Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./caixa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Caixa Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

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
    println!("Seeding catalog...");

    let now = Utc::now();
    let mut seeded = 0;

    for &(id, name, price_cents, stock) in PRODUCTS {
        let product = Product {
            id: id.to_string(),
            name: name.to_string(),
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.products().upsert(&product).await {
            eprintln!("Failed to insert {}: {}", id, e);
            continue;
        }

        seeded += 1;
    }

    db.store_config()
        .save(&StoreConfig {
            legal_name: "Mercadinho Boa Vista Ltda".to_string(),
            trade_name: Some("Mercadinho Boa Vista".to_string()),
            tax_id: "12.345.678/0001-90".to_string(),
            address: Some("Rua das Flores, 123 - Centro".to_string()),
            phone: Some("(11) 98765-4321".to_string()),
            tax_regime: Some("Simples Nacional".to_string()),
        })
        .await?;

    println!();
    println!("✓ Seeded {} products", seeded);
    println!("✓ Store configuration saved");

    let low = db
        .products()
        .count_low_stock(caixa_core::LOW_STOCK_THRESHOLD)
        .await?;
    println!("  Products at critical stock: {}", low);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
