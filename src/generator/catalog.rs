//! Built-in office furniture catalog for seeding a store without an ERP at hand.

use crate::db::entity::Product;
use crate::types::RotationProfile;

// name, reference, category, list price, cost, nominal stock
const DEMO_PRODUCTS: &[(&str, &str, &str, f64, f64, i64)] = &[
    ("Executive Desk", "DESK-EXEC", "Desks", 890.0, 520.0, 12),
    ("Standing Desk", "DESK-STAND", "Desks", 640.0, 380.0, 15),
    ("Meeting Table", "TBL-MEET", "Tables", 1150.0, 690.0, 8),
    ("Ergonomic Chair", "CHR-ERGO", "Seating", 320.0, 190.0, 30),
    ("Visitor Chair", "CHR-VISIT", "Seating", 95.0, 48.0, 60),
    ("Filing Cabinet", "CAB-FILE", "Storage", 210.0, 120.0, 25),
    ("Bookshelf", "CAB-BOOK", "Storage", 150.0, 85.0, 20),
    ("Desk Lamp", "ACC-LAMP", "Accessories", 45.0, 22.0, 80),
    ("Monitor Stand", "ACC-MONI", "Accessories", 60.0, 30.0, 120),
    ("Cable Organizer", "ACC-CABLE", "Accessories", 15.0, 6.0, 200),
    ("Whiteboard", "ACC-BOARD", "Accessories", 85.0, 45.0, 40),
    ("Desk Organizer", "ACC-ORG", "Accessories", 25.0, 11.0, 150),
];

pub fn demo_catalog() -> Vec<Product> {
    DEMO_PRODUCTS
        .iter()
        .enumerate()
        .map(
            |(idx, &(name, reference, category, list_price, standard_price, nominal_stock))| Product {
                id: idx as i64 + 1,
                name: name.to_string(),
                reference: reference.to_string(),
                category: category.to_string(),
                list_price,
                standard_price,
                rotation: RotationProfile::from_list_price(list_price),
                nominal_stock,
                is_active: true,
            },
        )
        .collect()
}
