use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{DistributionSnapshot, ScoreBucket, SurveyResult};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    // A plausible hourly snapshot for the 0-10 yes/no instrument.
    let buckets = vec![
        (0, 3i64),
        (1, 7),
        (2, 14),
        (3, 22),
        (4, 31),
        (5, 38),
        (6, 29),
        (7, 21),
        (8, 12),
        (9, 6),
        (10, 2),
    ];

    for (score, response_count) in buckets {
        sqlx::query(
            r#"
            INSERT INTO selfcheck.score_distribution
            (version, score, response_count, refreshed_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (version, score) DO UPDATE
            SET response_count = EXCLUDED.response_count,
                refreshed_at = EXCLUDED.refreshed_at
            "#,
        )
        .bind("1.0")
        .bind(score)
        .bind(response_count)
        .execute(pool)
        .await?;
    }

    let results = vec![
        (
            Uuid::parse_str("7c9e6679-7425-40de-944b-e07fc1f90ae7")?,
            "morgan.reyes@example.com",
            6,
            NaiveDate::from_ymd_opt(2026, 8, 18).context("invalid date")?,
        ),
        (
            Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427")?,
            "sam.okafor@example.com",
            3,
            NaiveDate::from_ymd_opt(2026, 8, 21).context("invalid date")?,
        ),
        (
            Uuid::parse_str("f47ac10b-58cc-4372-a567-0e02b2c3d479")?,
            "riley.chen@example.com",
            9,
            NaiveDate::from_ymd_opt(2026, 8, 24).context("invalid date")?,
        ),
    ];

    for (results_token, email, score, completed_at) in results {
        sqlx::query(
            r#"
            INSERT INTO selfcheck.survey_results
            (results_token, email, version, score, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (results_token) DO NOTHING
            "#,
        )
        .bind(results_token)
        .bind(email)
        .bind("1.0")
        .bind(score)
        .bind(completed_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_distribution(
    pool: &PgPool,
    version: &str,
) -> anyhow::Result<DistributionSnapshot> {
    let rows = sqlx::query(
        "SELECT score, response_count, refreshed_at \
         FROM selfcheck.score_distribution \
         WHERE version = $1 \
         ORDER BY score",
    )
    .bind(version)
    .fetch_all(pool)
    .await
    .context("failed to read score distribution")?;

    let mut buckets = Vec::new();
    let mut refreshed_at: Option<DateTime<Utc>> = None;

    for row in rows {
        buckets.push(ScoreBucket {
            score: row.get("score"),
            response_count: row.get("response_count"),
        });
        let bucket_refreshed: DateTime<Utc> = row.get("refreshed_at");
        refreshed_at = Some(match refreshed_at {
            Some(current) => current.max(bucket_refreshed),
            None => bucket_refreshed,
        });
    }

    Ok(DistributionSnapshot {
        version: version.to_string(),
        buckets,
        refreshed_at,
    })
}

pub async fn fetch_result(
    pool: &PgPool,
    results_token: Uuid,
) -> anyhow::Result<Option<SurveyResult>> {
    let row = sqlx::query(
        "SELECT results_token, email, version, score, completed_at \
         FROM selfcheck.survey_results \
         WHERE results_token = $1",
    )
    .bind(results_token)
    .fetch_optional(pool)
    .await
    .context("failed to read survey result")?;

    Ok(row.map(|row| SurveyResult {
        results_token: row.get("results_token"),
        email: row.get("email"),
        version: row.get("version"),
        score: row.get("score"),
        completed_at: row.get("completed_at"),
    }))
}

pub async fn import_distribution(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        version: String,
        score: i32,
        response_count: i64,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut upserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if row.response_count < 0 {
            anyhow::bail!(
                "negative response_count {} for version {} score {}",
                row.response_count,
                row.version,
                row.score
            );
        }

        sqlx::query(
            r#"
            INSERT INTO selfcheck.score_distribution
            (version, score, response_count, refreshed_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (version, score) DO UPDATE
            SET response_count = EXCLUDED.response_count,
                refreshed_at = EXCLUDED.refreshed_at
            "#,
        )
        .bind(&row.version)
        .bind(row.score)
        .bind(row.response_count)
        .execute(pool)
        .await?;

        upserted += 1;
    }

    Ok(upserted)
}
