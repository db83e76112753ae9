use crate::connection::DbPool;
use crate::repositories::RepositoryError;
use sqlx::Executor;

/// Canonical seed listings and their verification contract.
const SEED_LISTINGS: &[SeedListingContract] = &[
    SeedListingContract {
        listing_id: 9001,
        seller_id: 501,
        city: "Ankara",
        district: Some("Kecioren"),
        view_count: 240,
        is_active: true,
        description: "high-traffic Ankara cattle listing",
    },
    SeedListingContract {
        listing_id: 9002,
        seller_id: 501,
        city: "Ankara",
        district: Some("Kecioren"),
        view_count: 35,
        is_active: true,
        description: "second listing from the same seller (diversity penalty)",
    },
    SeedListingContract {
        listing_id: 9003,
        seller_id: 502,
        city: "Ankara",
        district: Some("Cankaya"),
        view_count: 120,
        is_active: true,
        description: "popular Ankara sheep listing",
    },
    SeedListingContract {
        listing_id: 9004,
        seller_id: 503,
        city: "Izmir",
        district: Some("Bornova"),
        view_count: 60,
        is_active: true,
        description: "out-of-city candidate inside the recency window",
    },
    SeedListingContract {
        listing_id: 9005,
        seller_id: 504,
        city: "Izmir",
        district: None,
        view_count: 5,
        is_active: true,
        description: "listing without a district",
    },
    SeedListingContract {
        listing_id: 9006,
        seller_id: 505,
        city: "Bursa",
        district: Some("Nilufer"),
        view_count: 0,
        is_active: true,
        description: "fresh zero-view listing",
    },
    SeedListingContract {
        listing_id: 9007,
        seller_id: 502,
        city: "Ankara",
        district: Some("Cankaya"),
        view_count: 310,
        is_active: false,
        description: "sold listing, must never surface",
    },
];

/// Deterministic marketplace seed dataset for demos and end-to-end tests.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_listings.sql");

    /// Load the seed listings. Idempotent: reloading restores the canonical
    /// rows, including view counts mutated by interaction logging.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        // Raw execution: the fixture file holds multiple statements.
        tx.execute(Self::SQL).await?;
        tx.commit().await?;

        Ok(SeedResult { listings_seeded: SEED_LISTINGS.len() })
    }

    /// Verify that the seeded rows match the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for contract in SEED_LISTINGS {
            let matches: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM listings
                     WHERE id = ?1 AND seller_id = ?2 AND city = ?3
                       AND (district IS ?4) AND view_count = ?5 AND is_active = ?6
                 )",
            )
            .bind(contract.listing_id)
            .bind(contract.seller_id)
            .bind(contract.city)
            .bind(contract.district)
            .bind(contract.view_count)
            .bind(contract.is_active)
            .fetch_one(pool)
            .await?;
            checks.push((contract.description, matches == 1));
        }

        let active_ankara: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM listings
             WHERE id BETWEEN 9001 AND 9007 AND city = 'Ankara' AND is_active = 1",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("three active Ankara listings", active_ankara == 3));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded rows and any interactions logged against them.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM interactions WHERE listing_id BETWEEN 9001 AND 9007")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM listings WHERE id BETWEEN 9001 AND 9007")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedListingContract {
    listing_id: i64,
    seller_id: i64,
    city: &'static str,
    district: Option<&'static str>,
    view_count: i64,
    is_active: bool,
    description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub listings_seeded: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
