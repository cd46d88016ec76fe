use crate::config::DatabaseConfig;
use crate::prediction::Prediction;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Stored prediction record.
///
/// Records are write-once: the id is assigned at insert and there is no
/// update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    /// Unique record ID
    pub id: Uuid,
    /// Predicted class label
    pub result: String,
    /// Model confidence score
    pub confidence_score: f64,
    /// Whether the confidence cleared the decision threshold
    pub is_above_threshold: bool,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Public URL of the stored image
    pub image_url: String,
}

/// PostgreSQL-backed store for prediction records
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    /// Create a new record store with connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Insert one prediction record, returning the stored row
    #[instrument(skip(self, prediction), fields(image_url = %image_url))]
    pub async fn insert_prediction(
        &self,
        prediction: &Prediction,
        image_url: &str,
    ) -> Result<PredictionRecord> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO predictions (
                id, result, confidence_score, is_above_threshold,
                created_at, image_url
            ) VALUES (
                $1, $2, $3, $4, $5, $6
            )
            "#,
        )
        .bind(id)
        .bind(&prediction.label)
        .bind(prediction.confidence_score)
        .bind(prediction.is_above_threshold)
        .bind(created_at)
        .bind(image_url)
        .execute(&self.pool)
        .await
        .context("Failed to insert prediction record")?;

        debug!(record_id = %id, "Prediction record created");

        metrics::counter!("predict.records.created").increment(1);

        Ok(PredictionRecord {
            id,
            result: prediction.label.clone(),
            confidence_score: prediction.confidence_score,
            is_above_threshold: prediction.is_above_threshold,
            created_at,
            image_url: image_url.to_string(),
        })
    }

    /// Get a prediction record by ID
    pub async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>> {
        let record = sqlx::query_as::<_, PredictionRecord>(
            r#"
            SELECT id, result, confidence_score, is_above_threshold,
                   created_at, image_url
            FROM predictions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query prediction record")?;

        Ok(record)
    }

    /// Get the connection pool (for health checks)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_camel_case() {
        let record = PredictionRecord {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            result: "Vascular lesion".to_string(),
            confidence_score: 99.67641830444336,
            is_above_threshold: true,
            created_at: Utc::now(),
            image_url: "https://example.com/img.png".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["result"], "Vascular lesion");
        assert_eq!(value["confidenceScore"], 99.67641830444336);
        assert_eq!(value["isAboveThreshold"], true);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("confidence_score").is_none());
    }
}
