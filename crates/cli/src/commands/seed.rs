//! Seed the catalog with sample data.
//!
//! Inserts a small set of categories, products, and variations so a fresh
//! database has something to browse. Idempotent: existing slugs are left
//! untouched.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

/// Errors from the seed command.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

struct SeedProduct {
    slug: &'static str,
    name: &'static str,
    base_price: i64,
    featured: bool,
    category: &'static str,
    variations: &'static [(&'static str, &'static str)],
}

const CATEGORIES: &[(&str, &str)] = &[
    ("rings", "Bagues"),
    ("necklaces", "Colliers"),
    ("bracelets", "Bracelets"),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        slug: "bague-solitaire-eclat",
        name: "Bague Solitaire Éclat",
        base_price: 45_000,
        featured: true,
        category: "rings",
        variations: &[("material", "or-blanc"), ("gem", "diamant")],
    },
    SeedProduct {
        slug: "bague-rubis-imperial",
        name: "Bague Rubis Impérial",
        base_price: 38_500,
        featured: false,
        category: "rings",
        variations: &[("material", "or-jaune"), ("gem", "rubis")],
    },
    SeedProduct {
        slug: "collier-riviere-lumiere",
        name: "Collier Rivière de Lumière",
        base_price: 92_000,
        featured: true,
        category: "necklaces",
        variations: &[("material", "or-blanc"), ("gem", "diamant")],
    },
    SeedProduct {
        slug: "collier-perle-aurore",
        name: "Collier Perle d'Aurore",
        base_price: 18_900,
        featured: false,
        category: "necklaces",
        variations: &[("material", "or-rose"), ("gem", "perle")],
    },
    SeedProduct {
        slug: "bracelet-jonc-saphir",
        name: "Bracelet Jonc Saphir",
        base_price: 27_400,
        featured: false,
        category: "bracelets",
        variations: &[("material", "or-jaune"), ("gem", "saphir")],
    },
    SeedProduct {
        slug: "bracelet-maille-royale",
        name: "Bracelet Maille Royale",
        base_price: 15_600,
        featured: true,
        category: "bracelets",
        variations: &[("material", "or-rose")],
    },
];

fn database_url() -> Result<String, SeedError> {
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| SeedError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Seed categories, products, and variations.
///
/// # Errors
///
/// Returns `SeedError` if the database is unreachable or an insert fails.
pub async fn catalog() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(&database_url).await?;

    for (slug, name) in CATEGORIES {
        sqlx::query("INSERT INTO categories (slug, name) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING")
            .bind(slug)
            .bind(name)
            .execute(&pool)
            .await?;
    }
    tracing::info!("Seeded {} categories", CATEGORIES.len());

    for product in PRODUCTS {
        seed_product(&pool, product).await?;
    }
    tracing::info!("Seeded {} products", PRODUCTS.len());

    Ok(())
}

async fn seed_product(pool: &PgPool, product: &SeedProduct) -> Result<(), SeedError> {
    let inserted: Option<(i32,)> = sqlx::query_as(
        r"
        INSERT INTO products (slug, name, base_price, featured, category_id)
        SELECT $1, $2, $3, $4, c.id FROM categories c WHERE c.slug = $5
        ON CONFLICT (slug) DO NOTHING
        RETURNING id
        ",
    )
    .bind(product.slug)
    .bind(product.name)
    .bind(Decimal::from(product.base_price))
    .bind(product.featured)
    .bind(product.category)
    .fetch_optional(pool)
    .await?;

    // Already seeded; leave the existing row and its variations alone.
    let Some((product_id,)) = inserted else {
        return Ok(());
    };

    for (variation_type, variation_value) in product.variations {
        sqlx::query(
            "INSERT INTO product_variations (product_id, variation_type, variation_value) VALUES ($1, $2, $3)",
        )
        .bind(product_id)
        .bind(variation_type)
        .bind(variation_value)
        .execute(pool)
        .await?;
    }

    Ok(())
}
