use crate::error::CoreError;
use crate::models::{
    CompletionResult, NewTaskData, Project, RecurrenceRule, Task, TaskFilter, TaskPriority,
    TaskStatus, UpdateTaskData,
};
use crate::repository::{
    OverrideRepository, RuleRepository, ScheduleRepository, SqliteRepository, TaskListing,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::debug;
use uuid::Uuid;

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        let mut tx = self.pool().begin().await?;

        let recurrence = data.recurrence.clone();
        let task = Self::add_task_in_transaction(&mut tx, data).await?;

        if let Some(settings) = recurrence {
            let rule = RecurrenceRule {
                id: Uuid::now_v7(),
                task_id: task.id,
                frequency: settings.frequency,
                interval: settings.interval,
                anchor_start: settings.anchor_start,
                anchor_end: settings.anchor_end,
                days_of_week: settings.days_of_week,
                at_time: settings.at_time,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            // Invalid configurations reject the whole write
            rule.validate()?;
            Self::insert_rule_in_transaction(&mut tx, &rule).await?;
            debug!(task_id = %task.id, rule_id = %rule.id, "created recurring task");
        }

        tx.commit().await?;
        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Task>, CoreError> {
        // Short IDs are hex prefixes of the UUID; match against the stored
        // bytes rather than the hyphenated display form
        let mut pattern = short_id.replace('-', "").to_uppercase();
        pattern.push('%');

        let tasks: Vec<Task> = sqlx::query_as(
            "SELECT * FROM tasks WHERE hex(id) LIKE $1 AND deleted_at IS NULL",
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskListing>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"SELECT
                t.id, t.name, t.description, t.status, t.priority, t.due_at, t.completed_at,
                t.created_at, t.updated_at, t.project_id,
                p.name AS project_name,
                GROUP_CONCAT(tt.tag_name) AS tags,
                EXISTS(SELECT 1 FROM recurrence_rules r WHERE r.task_id = t.id) AS recurring
            FROM tasks t
            LEFT JOIN projects p ON t.project_id = p.id
            LEFT JOIN task_tags tt ON tt.task_id = t.id
            WHERE t.deleted_at IS NULL"#,
        );

        if let Some(status) = &filter.status {
            qb.push(" AND t.status = ");
            qb.push_bind(status.clone());
        } else if !filter.include_closed {
            qb.push(" AND t.status = ");
            qb.push_bind(TaskStatus::Pending);
        }

        if let Some(priority) = &filter.priority {
            qb.push(" AND t.priority = ");
            qb.push_bind(priority.clone());
        }

        if let Some(project) = &filter.project {
            qb.push(" AND p.name = ");
            qb.push_bind(project.clone());
        }

        if let Some(tag) = &filter.tag {
            // The tag join above is aggregated, so filter through a subquery
            qb.push(
                " AND EXISTS(SELECT 1 FROM task_tags x WHERE x.task_id = t.id AND x.tag_name = ",
            );
            qb.push_bind(tag.clone());
            qb.push(")");
        }

        qb.push(
            r#" GROUP BY t.id, t.name, t.description, t.status, t.priority, t.due_at,
                t.completed_at, t.created_at, t.updated_at, t.project_id, p.name
            ORDER BY (t.due_at IS NULL), t.due_at, t.created_at"#,
        );

        let tasks = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        let mut tx = self.pool().begin().await?;

        let _current: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        Self::update_task_fields(&mut tx, id, &data).await?;

        let updated_task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated_task)
    }

    async fn complete_task(
        &self,
        id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<CompletionResult, CoreError> {
        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        match self.find_rule_for_task(id).await? {
            None => {
                if let Some(date) = on {
                    return Err(CoreError::InvalidInput(format!(
                        "'{}' is not recurring; it has no occurrence on {}",
                        task.name, date
                    )));
                }
                let completed_task: Task = sqlx::query_as(
                    r#"UPDATE tasks
                    SET status = $1, completed_at = $2, updated_at = $2
                    WHERE id = $3
                    RETURNING *
                    "#,
                )
                .bind(TaskStatus::Completed)
                .bind(Utc::now())
                .bind(id)
                .fetch_one(self.pool())
                .await?;
                Ok(CompletionResult::Single(completed_task))
            }
            Some(rule) => {
                // Recurring tasks are completed one occurrence at a time;
                // the completion is an override row, never a task update
                let date = on.ok_or_else(|| {
                    CoreError::InvalidInput(format!(
                        "'{}' is recurring; specify which occurrence date to complete",
                        task.name
                    ))
                })?;
                let applied = self.complete_occurrence(rule.id, date).await?;
                let resolver = self.resolver_for_rule(rule.id).await?;
                let next_occurrence = resolver.next_occurrence_after(date);
                debug!(rule_id = %rule.id, %date, "occurrence completed");
                Ok(CompletionResult::Occurrence {
                    task,
                    applied,
                    next_occurrence,
                })
            }
        }
    }

    async fn cancel_task(
        &self,
        id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<CompletionResult, CoreError> {
        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        match self.find_rule_for_task(id).await? {
            None => {
                if let Some(date) = on {
                    return Err(CoreError::InvalidInput(format!(
                        "'{}' is not recurring; it has no occurrence on {}",
                        task.name, date
                    )));
                }
                let cancelled_task: Task = sqlx::query_as(
                    r#"UPDATE tasks
                    SET status = $1, updated_at = $2
                    WHERE id = $3
                    RETURNING *
                    "#,
                )
                .bind(TaskStatus::Cancelled)
                .bind(Utc::now())
                .bind(id)
                .fetch_one(self.pool())
                .await?;
                Ok(CompletionResult::Single(cancelled_task))
            }
            Some(rule) => {
                let date = on.ok_or_else(|| {
                    CoreError::InvalidInput(format!(
                        "'{}' is recurring; specify which occurrence date to cancel",
                        task.name
                    ))
                })?;
                let applied = self.cancel_occurrence(rule.id, date).await?;
                let resolver = self.resolver_for_rule(rule.id).await?;
                let next_occurrence = resolver.next_occurrence_after(date);
                Ok(CompletionResult::Occurrence {
                    task,
                    applied,
                    next_occurrence,
                })
            }
        }
    }

    async fn trash_task(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn restore_task(&self, id: Uuid) -> Result<Task, CoreError> {
        let task: Task = sqlx::query_as(
            r#"UPDATE tasks
            SET deleted_at = NULL, updated_at = $1
            WHERE id = $2 AND deleted_at IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        Ok(task)
    }

    async fn find_trashed_tasks(&self) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as(
            "SELECT * FROM tasks WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn empty_trash(&self) -> Result<u64, CoreError> {
        // Hard delete; rules and overrides go with their tasks via cascade
        let result = sqlx::query("DELETE FROM tasks WHERE deleted_at IS NOT NULL")
            .execute(self.pool())
            .await?;
        debug!(purged = result.rows_affected(), "trash emptied");
        Ok(result.rows_affected())
    }
}

impl SqliteRepository {
    /// Add a task within an existing transaction
    pub(crate) async fn add_task_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        mut data: NewTaskData,
    ) -> Result<Task, CoreError> {
        if data.project_id.is_none() {
            if let Some(project_name) = &data.project_name {
                let project: Option<Project> =
                    sqlx::query_as("SELECT * FROM projects WHERE name = $1")
                        .bind(project_name)
                        .fetch_optional(&mut **tx)
                        .await?;
                data.project_id = Some(
                    project
                        .map(|p| p.id)
                        .ok_or_else(|| CoreError::NotFound(project_name.clone()))?,
                );
            }
        }

        let task = Task {
            id: Uuid::now_v7(),
            name: data.name,
            description: data.description,
            status: TaskStatus::Pending,
            priority: data.priority.unwrap_or(TaskPriority::None),
            due_at: data.due_at,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            project_id: data.project_id,
        };

        sqlx::query(
            r#"INSERT INTO tasks (id, name, description, status, priority, due_at, created_at, updated_at, project_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(&task.status)
        .bind(&task.priority)
        .bind(task.due_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.project_id)
        .execute(&mut **tx)
        .await?;

        let tags = data.tags;
        if !tags.is_empty() {
            let mut query_builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO task_tags (task_id, tag_name) ");
            query_builder.push_values(tags.iter(), |mut b, tag| {
                b.push_bind(task.id).push_bind(tag);
            });
            query_builder.build().execute(&mut **tx).await?;
        }

        Ok(task)
    }

    /// Update task fields within an existing transaction
    pub(crate) async fn update_task_fields<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
        data: &UpdateTaskData,
    ) -> Result<(), CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
        let mut updated = false;

        if let Some(name) = &data.name {
            qb.push("name = ");
            qb.push_bind(name);
            updated = true;
        }

        if let Some(description) = &data.description {
            if updated {
                qb.push(", ");
            }
            qb.push("description = ");
            qb.push_bind(description);
            updated = true;
        }

        if let Some(due_at) = &data.due_at {
            if updated {
                qb.push(", ");
            }
            qb.push("due_at = ");
            qb.push_bind(due_at);
            updated = true;
        }

        if let Some(priority) = &data.priority {
            if updated {
                qb.push(", ");
            }
            qb.push("priority = ");
            qb.push_bind(priority);
            updated = true;
        }

        if let Some(status) = &data.status {
            if updated {
                qb.push(", ");
            }
            qb.push("status = ");
            qb.push_bind(status);
            updated = true;
        }

        if let Some(project_name_option) = &data.project_name {
            let project_id = match project_name_option {
                Some(project_name) => {
                    let project: Option<Project> =
                        sqlx::query_as("SELECT * FROM projects WHERE name = $1")
                            .bind(project_name.clone())
                            .fetch_optional(&mut **tx)
                            .await?;
                    Some(
                        project
                            .map(|p| p.id)
                            .ok_or_else(|| CoreError::NotFound(project_name.clone()))?,
                    )
                }
                None => None,
            };
            if updated {
                qb.push(", ");
            }
            qb.push("project_id = ");
            qb.push_bind(project_id);
            updated = true;
        }

        if let Some(tags_to_add) = &data.add_tags {
            if !tags_to_add.is_empty() {
                let mut query_builder: QueryBuilder<Sqlite> =
                    QueryBuilder::new("INSERT OR IGNORE INTO task_tags (task_id, tag_name) ");
                query_builder.push_values(tags_to_add.iter(), |mut b, tag| {
                    b.push_bind(id).push_bind(tag);
                });
                query_builder.build().execute(&mut **tx).await?;
            }
        }

        if let Some(tags_to_remove) = &data.remove_tags {
            if !tags_to_remove.is_empty() {
                let mut query_builder: QueryBuilder<Sqlite> =
                    QueryBuilder::new("DELETE FROM task_tags WHERE task_id = ");
                query_builder.push_bind(id);
                query_builder.push(" AND tag_name IN (");
                let mut separated = query_builder.separated(", ");
                for tag in tags_to_remove.iter() {
                    separated.push_bind(tag);
                }
                separated.push_unseparated(")");
                query_builder.build().execute(&mut **tx).await?;
            }
        }

        if updated {
            qb.push(", updated_at = ");
            qb.push_bind(Utc::now());
            qb.push(" WHERE id = ");
            qb.push_bind(id);
            qb.build().execute(&mut **tx).await?;
        }

        Ok(())
    }
}
