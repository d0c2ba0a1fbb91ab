//! # Cadence Core Library
//!
//! A task management library built around calendar-day recurrence: rules
//! describe how a task repeats, occurrences are derived on demand, and
//! per-occurrence overrides record deviations without touching the template.
//!
//! ## Features
//!
//! - **Pure occurrence resolution**: a recurrence rule plus its overrides
//!   resolve any calendar day to an effective occurrence (or to nothing),
//!   with no I/O and no hidden state
//! - **Lazy overrides**: completing, cancelling or rescheduling a single
//!   occurrence writes one sparse override row; the rule never changes
//! - **Strict rule validation**: invalid configurations are rejected when
//!   written, so evaluation never fails
//! - **Trash with recovery**: deleted tasks are soft-deleted until the trash
//!   is emptied
//! - **SQLite persistence**: repository pattern over sqlx with runtime-checked
//!   queries
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`recurrence`]: The occurrence resolver
//! - [`timezone`]: Timezone validation and calendar-day normalization
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use cadence_core::{
//!     db,
//!     models::{Frequency, NewRecurrence, NewTaskData, WeekdaySet},
//!     repository::{ScheduleRepository, SqliteRepository, TaskRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("cadence.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let task = repo
//!         .add_task(NewTaskData {
//!             name: "Water the plants".to_string(),
//!             recurrence: Some(NewRecurrence {
//!                 frequency: Frequency::Daily,
//!                 interval: 2,
//!                 anchor_start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//!                 anchor_end: None,
//!                 days_of_week: WeekdaySet::empty(),
//!                 at_time: None,
//!             }),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("Created task: {}", task.name);
//!
//!     let agenda = repo
//!         .agenda_for_date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
//!         .await?;
//!     println!("{} item(s) on the agenda", agenda.len());
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod timezone;
