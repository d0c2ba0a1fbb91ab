use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    CompletionResult, NewOverrideData, NewRuleData, NewTaskData, OccurrenceOverride, Project,
    RecurrenceRule, Task, TaskFilter, TaskPriority, TaskStatus, UpdateRuleData, UpdateTaskData,
};
use crate::recurrence::{EffectiveOccurrence, OccurrenceResolver};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export domain modules
pub mod overrides;
pub mod projects;
pub mod rules;
pub mod schedule;
pub mod tasks;

// Traits are defined in this module and implemented in respective domain modules

/// Flattened task row for listings: joined project name, aggregated tags,
/// and whether a recurrence rule is attached.
#[derive(Debug, Clone, FromRow)]
pub struct TaskListing {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub tags: Option<String>,
    pub recurring: bool,
}

/// One line of a day view: either a one-off task due that day, or a
/// recurring task's resolved occurrence for that day.
#[derive(Debug, Clone)]
pub struct AgendaEntry {
    pub task: Task,
    pub rule_id: Option<Uuid>,
    pub occurrence: Option<EffectiveOccurrence>,
}

/// Domain-specific trait for task operations
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    async fn find_tasks_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Task>, CoreError>;
    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskListing>, CoreError>;
    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError>;
    /// Complete a task, or one occurrence of a recurring task when `on` is
    /// given. Occurrence completion is recorded as an override; the task row
    /// itself is untouched.
    async fn complete_task(
        &self,
        id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<CompletionResult, CoreError>;
    /// Cancel a task, or one occurrence of a recurring task when `on` is given.
    async fn cancel_task(
        &self,
        id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<CompletionResult, CoreError>;
    async fn trash_task(&self, id: Uuid) -> Result<(), CoreError>;
    async fn restore_task(&self, id: Uuid) -> Result<Task, CoreError>;
    async fn find_trashed_tasks(&self) -> Result<Vec<Task>, CoreError>;
    async fn empty_trash(&self) -> Result<u64, CoreError>;
}

/// Domain-specific trait for project operations
#[async_trait]
pub trait ProjectRepository {
    async fn add_project(&self, name: String, description: Option<String>)
        -> Result<Project, CoreError>;
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, CoreError>;
    async fn find_projects(&self) -> Result<Vec<Project>, CoreError>;
    async fn delete_project(&self, name: String) -> Result<(), CoreError>;
}

/// Domain-specific trait for recurrence rule operations
#[async_trait]
pub trait RuleRepository {
    async fn create_rule(&self, data: NewRuleData) -> Result<RecurrenceRule, CoreError>;
    async fn find_rule_by_id(&self, id: Uuid) -> Result<Option<RecurrenceRule>, CoreError>;
    async fn find_rule_for_task(&self, task_id: Uuid) -> Result<Option<RecurrenceRule>, CoreError>;
    async fn find_rules(&self) -> Result<Vec<RecurrenceRule>, CoreError>;
    async fn update_rule(&self, id: Uuid, data: UpdateRuleData)
        -> Result<RecurrenceRule, CoreError>;
    /// Deletes the rule and, through the schema's cascade, its overrides.
    async fn delete_rule(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for occurrence override operations
#[async_trait]
pub trait OverrideRepository {
    /// Insert or fold into the override for `(rule, date)`. Folding keeps
    /// previously overridden fields that the new data leaves unset.
    async fn upsert_override(&self, data: NewOverrideData)
        -> Result<OccurrenceOverride, CoreError>;
    async fn find_overrides(&self, rule_id: Uuid) -> Result<Vec<OccurrenceOverride>, CoreError>;
    async fn find_override(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<OccurrenceOverride>, CoreError>;
    async fn remove_override(&self, rule_id: Uuid, date: NaiveDate) -> Result<(), CoreError>;
    async fn complete_occurrence(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<OccurrenceOverride, CoreError>;
    async fn cancel_occurrence(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<OccurrenceOverride, CoreError>;
    async fn reschedule_occurrence(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
        at_time: NaiveTime,
    ) -> Result<OccurrenceOverride, CoreError>;
}

/// Domain-specific trait for schedule expansion (day views, previews)
#[async_trait]
pub trait ScheduleRepository {
    /// Everything scheduled on one calendar day: one-off tasks due that day
    /// plus each rule's resolved occurrence, if any. Rules are independent;
    /// each is resolved on its own.
    async fn agenda_for_date(&self, date: NaiveDate) -> Result<Vec<AgendaEntry>, CoreError>;
    /// The next `count` occurrences of a rule on or after `from`.
    async fn preview_rule(
        &self,
        rule_id: Uuid,
        from: NaiveDate,
        count: usize,
    ) -> Result<Vec<EffectiveOccurrence>, CoreError>;
    /// A resolver loaded with the rule and its current overrides.
    async fn resolver_for_rule(&self, rule_id: Uuid) -> Result<OccurrenceResolver, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    TaskRepository + ProjectRepository + RuleRepository + OverrideRepository + ScheduleRepository
{
    // This trait automatically composes all domain-specific repositories
    // Individual domain operations are defined in their respective traits
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

// The main Repository trait implementation will automatically be available
// when all domain trait implementations are defined
impl Repository for SqliteRepository {}
