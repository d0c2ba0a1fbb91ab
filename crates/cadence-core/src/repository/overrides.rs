use crate::error::CoreError;
use crate::models::{NewOverrideData, OccurrenceOverride, OccurrenceStatus};
use crate::repository::{ScheduleRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

#[async_trait]
impl super::OverrideRepository for SqliteRepository {
    async fn upsert_override(
        &self,
        data: NewOverrideData,
    ) -> Result<OccurrenceOverride, CoreError> {
        // Validate that the rule exists; the occurrence itself is checked by
        // the higher-level operations that know a date must be on-pattern
        self.fetch_rule(data.rule_id).await?;

        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"INSERT INTO occurrence_overrides (rule_id, occurrence_date, status, at_time, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (rule_id, occurrence_date) DO UPDATE SET
                status = COALESCE(excluded.status, occurrence_overrides.status),
                at_time = COALESCE(excluded.at_time, occurrence_overrides.at_time),
                notes = COALESCE(excluded.notes, occurrence_overrides.notes)"#,
        )
        .bind(data.rule_id)
        .bind(data.occurrence_date)
        .bind(data.status)
        .bind(data.at_time)
        .bind(&data.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let stored: OccurrenceOverride = sqlx::query_as(
            "SELECT * FROM occurrence_overrides WHERE rule_id = $1 AND occurrence_date = $2",
        )
        .bind(data.rule_id)
        .bind(data.occurrence_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn find_overrides(&self, rule_id: Uuid) -> Result<Vec<OccurrenceOverride>, CoreError> {
        let overrides = sqlx::query_as(
            "SELECT * FROM occurrence_overrides WHERE rule_id = $1 ORDER BY occurrence_date",
        )
        .bind(rule_id)
        .fetch_all(self.pool())
        .await?;
        Ok(overrides)
    }

    async fn find_override(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<OccurrenceOverride>, CoreError> {
        let found = sqlx::query_as(
            "SELECT * FROM occurrence_overrides WHERE rule_id = $1 AND occurrence_date = $2",
        )
        .bind(rule_id)
        .bind(date)
        .fetch_optional(self.pool())
        .await?;
        Ok(found)
    }

    async fn remove_override(&self, rule_id: Uuid, date: NaiveDate) -> Result<(), CoreError> {
        let result = sqlx::query(
            "DELETE FROM occurrence_overrides WHERE rule_id = $1 AND occurrence_date = $2",
        )
        .bind(rule_id)
        .bind(date)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "No override for rule {} on {}",
                rule_id, date
            )));
        }
        Ok(())
    }

    async fn complete_occurrence(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<OccurrenceOverride, CoreError> {
        self.assert_occurrence_exists(rule_id, date).await?;
        let applied = self
            .upsert_override(NewOverrideData {
                rule_id,
                occurrence_date: date,
                status: Some(OccurrenceStatus::Completed),
                at_time: None,
                notes: None,
            })
            .await?;
        debug!(%rule_id, %date, "occurrence marked completed");
        Ok(applied)
    }

    async fn cancel_occurrence(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<OccurrenceOverride, CoreError> {
        self.assert_occurrence_exists(rule_id, date).await?;
        let applied = self
            .upsert_override(NewOverrideData {
                rule_id,
                occurrence_date: date,
                status: Some(OccurrenceStatus::Cancelled),
                at_time: None,
                notes: None,
            })
            .await?;
        debug!(%rule_id, %date, "occurrence cancelled");
        Ok(applied)
    }

    async fn reschedule_occurrence(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
        at_time: NaiveTime,
    ) -> Result<OccurrenceOverride, CoreError> {
        self.assert_occurrence_exists(rule_id, date).await?;
        self.upsert_override(NewOverrideData {
            rule_id,
            occurrence_date: date,
            status: None,
            at_time: Some(at_time),
            notes: None,
        })
        .await
    }
}

impl SqliteRepository {
    /// Overrides only make sense on dates the rule actually produces.
    async fn assert_occurrence_exists(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), CoreError> {
        let resolver = self.resolver_for_rule(rule_id).await?;
        if !resolver.occurs_on(date) {
            return Err(CoreError::InvalidInput(format!(
                "Rule has no occurrence on {}",
                date
            )));
        }
        Ok(())
    }
}
