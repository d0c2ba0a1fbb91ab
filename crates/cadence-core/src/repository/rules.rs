use crate::error::CoreError;
use crate::models::{Frequency, NewRuleData, RecurrenceRule, Task, UpdateRuleData, WeekdaySet};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, Sqlite, Transaction};
use tracing::debug;
use uuid::Uuid;

/// Raw rule row. The weekly mask is TEXT in the schema and parsed into
/// [`WeekdaySet`] on the way out; a row that fails to parse is corrupt and
/// surfaces as `InvalidRule` rather than panicking.
#[derive(Debug, FromRow)]
struct RuleRow {
    id: Uuid,
    task_id: Uuid,
    frequency: Frequency,
    interval: i64,
    anchor_start: NaiveDate,
    anchor_end: Option<NaiveDate>,
    days_of_week: Option<String>,
    at_time: Option<NaiveTime>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RuleRow> for RecurrenceRule {
    type Error = CoreError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let days_of_week = match row.days_of_week.as_deref() {
            Some(text) if !text.is_empty() => text.parse::<WeekdaySet>().map_err(|e| {
                CoreError::InvalidRule(format!("stored weekday mask is unreadable: {}", e))
            })?,
            _ => WeekdaySet::empty(),
        };
        Ok(RecurrenceRule {
            id: row.id,
            task_id: row.task_id,
            frequency: row.frequency,
            interval: row.interval as u32,
            anchor_start: row.anchor_start,
            anchor_end: row.anchor_end,
            days_of_week,
            at_time: row.at_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl super::RuleRepository for SqliteRepository {
    async fn create_rule(&self, data: NewRuleData) -> Result<RecurrenceRule, CoreError> {
        let mut tx = self.pool().begin().await?;

        let task: Option<Task> =
            sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL")
                .bind(data.task_id)
                .fetch_optional(&mut *tx)
                .await?;
        if task.is_none() {
            return Err(CoreError::NotFound(format!(
                "Task with id {} not found",
                data.task_id
            )));
        }

        let existing: Option<RuleRow> =
            sqlx::query_as("SELECT * FROM recurrence_rules WHERE task_id = $1")
                .bind(data.task_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(CoreError::InvalidInput(
                "Task already has a recurrence rule; edit it instead".to_string(),
            ));
        }

        let rule = RecurrenceRule {
            id: Uuid::now_v7(),
            task_id: data.task_id,
            frequency: data.frequency,
            interval: data.interval,
            anchor_start: data.anchor_start,
            anchor_end: data.anchor_end,
            days_of_week: data.days_of_week,
            at_time: data.at_time,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        rule.validate()?;

        Self::insert_rule_in_transaction(&mut tx, &rule).await?;

        tx.commit().await?;
        debug!(rule_id = %rule.id, task_id = %rule.task_id, "recurrence rule created");
        Ok(rule)
    }

    async fn find_rule_by_id(&self, id: Uuid) -> Result<Option<RecurrenceRule>, CoreError> {
        let row: Option<RuleRow> = sqlx::query_as("SELECT * FROM recurrence_rules WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(RecurrenceRule::try_from).transpose()
    }

    async fn find_rule_for_task(&self, task_id: Uuid) -> Result<Option<RecurrenceRule>, CoreError> {
        let row: Option<RuleRow> =
            sqlx::query_as("SELECT * FROM recurrence_rules WHERE task_id = $1")
                .bind(task_id)
                .fetch_optional(self.pool())
                .await?;
        row.map(RecurrenceRule::try_from).transpose()
    }

    async fn find_rules(&self) -> Result<Vec<RecurrenceRule>, CoreError> {
        let rows: Vec<RuleRow> =
            sqlx::query_as("SELECT * FROM recurrence_rules ORDER BY created_at")
                .fetch_all(self.pool())
                .await?;
        rows.into_iter().map(RecurrenceRule::try_from).collect()
    }

    async fn update_rule(
        &self,
        id: Uuid,
        data: UpdateRuleData,
    ) -> Result<RecurrenceRule, CoreError> {
        let mut tx = self.pool().begin().await?;

        let row: Option<RuleRow> = sqlx::query_as("SELECT * FROM recurrence_rules WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut rule = row
            .map(RecurrenceRule::try_from)
            .transpose()?
            .ok_or_else(|| CoreError::NotFound(format!("Rule with id {} not found", id)))?;

        if let Some(frequency) = data.frequency {
            rule.frequency = frequency;
        }
        if let Some(interval) = data.interval {
            rule.interval = interval;
        }
        if let Some(anchor_start) = data.anchor_start {
            rule.anchor_start = anchor_start;
        }
        if let Some(anchor_end) = data.anchor_end {
            rule.anchor_end = anchor_end;
        }
        if let Some(days_of_week) = data.days_of_week {
            rule.days_of_week = days_of_week;
        }
        if let Some(at_time) = data.at_time {
            rule.at_time = at_time;
        }
        rule.updated_at = Utc::now();

        // The merged rule must still be a valid configuration
        rule.validate()?;

        sqlx::query(
            r#"UPDATE recurrence_rules
            SET frequency = $1, interval = $2, anchor_start = $3, anchor_end = $4,
                days_of_week = $5, at_time = $6, updated_at = $7
            WHERE id = $8"#,
        )
        .bind(&rule.frequency)
        .bind(rule.interval as i64)
        .bind(rule.anchor_start)
        .bind(rule.anchor_end)
        .bind(mask_to_column(&rule.days_of_week))
        .bind(rule.at_time)
        .bind(rule.updated_at)
        .bind(rule.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rule)
    }

    async fn delete_rule(&self, id: Uuid) -> Result<(), CoreError> {
        // Overrides cascade with the rule
        let result = sqlx::query("DELETE FROM recurrence_rules WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Rule with id {} not found", id)));
        }
        Ok(())
    }
}

impl SqliteRepository {
    /// Insert a recurrence rule within an existing transaction
    pub(crate) async fn insert_rule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        rule: &RecurrenceRule,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO recurrence_rules
            (id, task_id, frequency, interval, anchor_start, anchor_end, days_of_week, at_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(rule.id)
        .bind(rule.task_id)
        .bind(&rule.frequency)
        .bind(rule.interval as i64)
        .bind(rule.anchor_start)
        .bind(rule.anchor_end)
        .bind(mask_to_column(&rule.days_of_week))
        .bind(rule.at_time)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Fetch a rule or fail with NotFound
    pub(crate) async fn fetch_rule(&self, id: Uuid) -> Result<RecurrenceRule, CoreError> {
        let row: Option<RuleRow> = sqlx::query_as("SELECT * FROM recurrence_rules WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(RecurrenceRule::try_from)
            .transpose()?
            .ok_or_else(|| CoreError::NotFound(format!("Rule with id {} not found", id)))
    }
}

/// Empty masks are stored as NULL so the column reads naturally in SQL.
fn mask_to_column(mask: &WeekdaySet) -> Option<String> {
    if mask.is_empty() {
        None
    } else {
        Some(mask.to_string())
    }
}
