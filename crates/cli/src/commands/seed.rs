//! Seed the database with demo data.
//!
//! Creates a small catalog across all four categories, one admin and two
//! customer accounts, and prints a bearer token for each account. Intended
//! for development databases; re-running against an already-seeded database
//! fails on the unique constraints.

use rand::{Rng, distr::Alphanumeric};
use rust_decimal::Decimal;
use tracing::info;

use meridian_api::db::{self, ProductRepository, UserRepository};
use meridian_api::models::NewProduct;
use meridian_core::{Category, Email, Sex, SpecialOffer, UserId};

use super::migrate::database_url;

const TOKEN_LENGTH: usize = 32;

/// Generate an opaque bearer token.
fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Seed demo products, users, and tokens.
///
/// # Errors
///
/// Returns an error if the database is unreachable or any insert fails
/// (including unique-constraint conflicts on a non-empty database).
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let products = ProductRepository::new(&pool);
    let catalog = [
        NewProduct {
            name: "Fieldmaster 38".to_string(),
            description: "Hand-wound field watch with a brushed steel case.".to_string(),
            image: None,
            price: Decimal::new(24900, 2),
            inventory: 12,
            category: Category::MenWatches,
            special_offer: None,
        },
        NewProduct {
            name: "Tidewatch Quartz".to_string(),
            description: "Slim quartz dress watch on a leather strap.".to_string(),
            image: None,
            price: Decimal::new(18900, 2),
            inventory: 20,
            category: Category::WomenWatches,
            special_offer: Some(SpecialOffer::new(20, None, None)?),
        },
        NewProduct {
            name: "Playtime Mini".to_string(),
            description: "Shock-resistant kids watch with a silicone band.".to_string(),
            image: None,
            price: Decimal::new(4900, 2),
            inventory: 35,
            category: Category::KidsWatches,
            special_offer: None,
        },
        NewProduct {
            name: "Pulse One".to_string(),
            description: "Fitness smartwatch with a week-long battery.".to_string(),
            image: None,
            price: Decimal::new(32900, 2),
            inventory: 8,
            category: Category::SmartWatches,
            special_offer: None,
        },
    ];

    for new in &catalog {
        let product = products.create(new).await?;
        info!(product = %product.id, name = %product.name, "Seeded product");
    }

    let users = UserRepository::new(&pool);

    let admin = users
        .create(&Email::parse("admin@meridian.example")?, "Site Admin", None, true)
        .await?;
    let alice = users
        .create(
            &Email::parse("alice@example.com")?,
            "Alice",
            Some(Sex::Female),
            false,
        )
        .await?;
    let bob = users
        .create(
            &Email::parse("bob@example.com")?,
            "Bob",
            Some(Sex::Male),
            false,
        )
        .await?;

    for (label, user_id) in [
        ("admin", admin.id),
        ("alice", alice.id),
        ("bob", bob.id),
    ] {
        let token = issue_token(&users, user_id).await?;
        info!(user = label, token, "Seeded user token");
    }

    info!("Seeding complete");
    Ok(())
}

/// Create an admin user and print a bearer token for it.
///
/// # Errors
///
/// Returns an error if the email is invalid, already taken, or the database
/// is unreachable.
pub async fn create_admin(email: &str, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let pool = db::create_pool(&database_url()?).await?;
    let users = UserRepository::new(&pool);

    let admin = users.create(&Email::parse(email)?, name, None, true).await?;
    let token = issue_token(&users, admin.id).await?;

    info!(user = %admin.id, email, token, "Admin created");
    Ok(())
}

async fn issue_token(
    users: &UserRepository<'_>,
    user_id: UserId,
) -> Result<String, Box<dyn std::error::Error>> {
    let token = generate_token();
    users.insert_token(user_id, &token, None).await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
