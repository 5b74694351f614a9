//! # Seed Data Generator
//!
//! Populates the database with stock lots and staff for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 lots (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! Stationery-shop inventory across categories (paper, pens, office
//! supplies, school gear), each lot with:
//! - Realistic product name and supplier
//! - Cost below customer price, wholesale between the two
//! - Random stock 0-60 (some land below the low-stock threshold)
//!
//! Plus one owner and two employees so the dashboard tile is non-zero.

use chrono::Utc;
use std::env;
use tally_core::{Employee, ProductLot, Role};
use tally_db::{Database, DbConfig};
use uuid::Uuid;

/// Product families with base unit cost in cents.
const PRODUCTS: &[(&str, &[&str], i64)] = &[
    (
        "Paper",
        &[
            "A4 Paper 70gsm",
            "A4 Paper 80gsm",
            "A3 Paper 80gsm",
            "Legal Pad",
            "Carbon Paper",
            "Graph Paper Pad",
            "Sticky Notes",
            "Envelope Pack",
            "Card Stock",
            "Photo Paper",
        ],
        350,
    ),
    (
        "Pens",
        &[
            "Ballpoint Pen Blue",
            "Ballpoint Pen Black",
            "Gel Pen",
            "Marker Permanent",
            "Whiteboard Marker",
            "Highlighter Yellow",
            "Pencil HB",
            "Mechanical Pencil",
            "Fountain Pen",
            "Correction Pen",
        ],
        80,
    ),
    (
        "Office",
        &[
            "Stapler",
            "Staple Pins Box",
            "Paper Clips Box",
            "Binder Clip Pack",
            "Tape Dispenser",
            "Packing Tape",
            "Scissors",
            "Glue Stick",
            "Box File",
            "Ring Binder",
        ],
        250,
    ),
    (
        "School",
        &[
            "Exercise Book",
            "Drawing Book",
            "Geometry Set",
            "School Bag",
            "Lunch Box",
            "Color Pencils Set",
            "Crayons Pack",
            "Eraser Pack",
            "Sharpener",
            "Ruler 30cm",
        ],
        150,
    ),
];

const SUPPLIERS: &[&str] = &[
    "Paper Mills Ltd",
    "Karachi Stationers",
    "Noor Trading Co",
    "Schoolmart Wholesale",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of lots to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Lots: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing lots
    let existing = db.lots().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} lots", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate lots
    println!();
    println!("Generating lots...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (family_idx, (_, names, base_cost)) in PRODUCTS.iter().enumerate() {
        for round in 0.. {
            for (name_idx, name) in names.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = family_idx * 1000 + round * 100 + name_idx;
                let lot = generate_lot(name, *base_cost, seed);
                db.lots().insert(&lot).await?;
                generated += 1;

                if generated % 50 == 0 {
                    println!("  Generated {} lots...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} lots in {:?}", generated, elapsed);

    // Staff
    println!();
    println!("Creating staff...");
    for employee in staff() {
        db.employees().insert(&employee).await?;
        println!("  {} ({:?})", employee.name, employee.role);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single lot with realistic data.
fn generate_lot(name: &str, base_cost: i64, seed: usize) -> ProductLot {
    let now = Utc::now();

    // Cost jitters around the family base; prices derive from cost.
    let purchase_price_cents = base_cost + ((seed * 13) % 120) as i64;
    let customer_price_cents = purchase_price_cents * (130 + (seed % 25) as i64) / 100;
    // Every third lot skips the wholesale price to exercise the fallback.
    let wholesale_price_cents = if seed % 3 == 0 {
        None
    } else {
        Some((purchase_price_cents + customer_price_cents) / 2)
    };

    ProductLot {
        id: Uuid::new_v4().to_string(),
        product_name: name.to_string(),
        quantity: ((seed * 7) % 61) as i64,
        purchase_price_cents,
        customer_price_cents,
        wholesale_price_cents,
        supplier: Some(SUPPLIERS[seed % SUPPLIERS.len()].to_string()),
        purchase_date: now,
        created_at: now,
        updated_at: now,
    }
}

fn staff() -> Vec<Employee> {
    let now = Utc::now();
    let make = |name: &str, email: &str, role: Role, salary: i64| Employee {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        salary_cents: Some(salary),
        phone: None,
        address: None,
        is_active: true,
        joined_at: now,
        last_login: None,
        created_at: now,
        updated_at: now,
    };

    vec![
        make("Imran Malik", "imran@tallypos.local", Role::Owner, 0),
        make("Asha Khan", "asha@tallypos.local", Role::Employee, 4_000_000),
        make("Sana Iqbal", "sana@tallypos.local", Role::Employee, 3_500_000),
    ]
}
