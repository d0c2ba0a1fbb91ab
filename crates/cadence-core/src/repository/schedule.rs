use crate::error::CoreError;
use crate::models::Task;
use crate::recurrence::{EffectiveOccurrence, OccurrenceResolver};
use crate::repository::{AgendaEntry, OverrideRepository, RuleRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

#[async_trait]
impl super::ScheduleRepository for SqliteRepository {
    async fn agenda_for_date(&self, date: NaiveDate) -> Result<Vec<AgendaEntry>, CoreError> {
        let mut entries = Vec::new();

        // One-off tasks due that calendar day (UTC day of the stored instant)
        let one_off: Vec<Task> = sqlx::query_as(
            r#"SELECT * FROM tasks t
            WHERE t.deleted_at IS NULL
            AND t.due_at IS NOT NULL
            AND date(t.due_at) = $1
            AND NOT EXISTS(SELECT 1 FROM recurrence_rules r WHERE r.task_id = t.id)
            ORDER BY t.due_at"#,
        )
        .bind(date)
        .fetch_all(self.pool())
        .await?;

        for task in one_off {
            entries.push(AgendaEntry {
                task,
                rule_id: None,
                occurrence: None,
            });
        }

        // Each rule resolves independently against the target date
        for rule in self.find_rules().await? {
            let rule_id = rule.id;
            let task_id = rule.task_id;
            let overrides = self.find_overrides(rule_id).await?;
            let resolver = match OccurrenceResolver::new(rule, overrides) {
                Ok(resolver) => resolver,
                Err(e) => {
                    // A rule that fails validation at this point was corrupted
                    // outside the API; skip it rather than sink the whole view
                    warn!(%rule_id, error = %e, "skipping unresolvable rule");
                    continue;
                }
            };

            if let Some(occurrence) = resolver.resolve(date) {
                let task: Option<Task> =
                    sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL")
                        .bind(task_id)
                        .fetch_optional(self.pool())
                        .await?;
                // Trashed tasks keep their rule rows until purged; their
                // occurrences don't appear on the agenda
                if let Some(task) = task {
                    entries.push(AgendaEntry {
                        task,
                        rule_id: Some(rule_id),
                        occurrence: Some(occurrence),
                    });
                }
            }
        }

        entries.sort_by(|a, b| {
            let a_key = agenda_sort_key(a);
            let b_key = agenda_sort_key(b);
            a_key.cmp(&b_key).then_with(|| a.task.name.cmp(&b.task.name))
        });
        Ok(entries)
    }

    async fn preview_rule(
        &self,
        rule_id: Uuid,
        from: NaiveDate,
        count: usize,
    ) -> Result<Vec<EffectiveOccurrence>, CoreError> {
        let resolver = self.resolver_for_rule(rule_id).await?;
        Ok(resolver.preview(from, count))
    }

    async fn resolver_for_rule(&self, rule_id: Uuid) -> Result<OccurrenceResolver, CoreError> {
        let rule = self.fetch_rule(rule_id).await?;
        let overrides = self.find_overrides(rule_id).await?;
        OccurrenceResolver::new(rule, overrides)
    }
}

/// Timed entries first in time order, untimed ones after.
fn agenda_sort_key(entry: &AgendaEntry) -> (bool, chrono::NaiveTime) {
    let time = match &entry.occurrence {
        Some(occ) => occ.at_time,
        None => entry.task.due_at.map(|dt| dt.time()),
    };
    match time {
        Some(t) => (false, t),
        None => (true, chrono::NaiveTime::MIN),
    }
}
