use cadence_core::db::establish_connection;
use cadence_core::error::CoreError;
use cadence_core::models::*;
use cadence_core::repository::{
    OverrideRepository, ProjectRepository, RuleRepository, ScheduleRepository, SqliteRepository,
    TaskRepository,
};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use tempfile::TempDir;

/// Helper function to create a test database
async fn setup_test_db() -> (SqliteRepository, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    (SqliteRepository::new(pool), temp_dir)
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Helper function to create a test project
async fn create_test_project(repo: &SqliteRepository, name: &str) -> Project {
    repo.add_project(name.to_string(), Some(format!("Test project: {}", name)))
        .await
        .expect("Failed to create test project")
}

/// Helper function to create a one-off test task
async fn create_test_task(repo: &SqliteRepository, name: &str) -> Task {
    let task_data = NewTaskData {
        name: name.to_string(),
        description: Some(format!("Test task: {}", name)),
        priority: Some(TaskPriority::Medium),
        due_at: Some(Utc::now() + Duration::hours(24)),
        ..Default::default()
    };

    repo.add_task(task_data)
        .await
        .expect("Failed to create test task")
}

/// Helper to create a recurring task and return it with its rule
async fn create_recurring_task(
    repo: &SqliteRepository,
    name: &str,
    recurrence: NewRecurrence,
) -> (Task, RecurrenceRule) {
    let task = repo
        .add_task(NewTaskData {
            name: name.to_string(),
            recurrence: Some(recurrence),
            ..Default::default()
        })
        .await
        .expect("Failed to create recurring task");
    let rule = repo
        .find_rule_for_task(task.id)
        .await
        .expect("Failed to look up rule")
        .expect("Recurring task has no rule");
    (task, rule)
}

fn daily(anchor: NaiveDate) -> NewRecurrence {
    NewRecurrence {
        frequency: Frequency::Daily,
        interval: 1,
        anchor_start: anchor,
        anchor_end: None,
        days_of_week: WeekdaySet::empty(),
        at_time: None,
    }
}

#[tokio::test]
async fn test_basic_task_crud_workflow() {
    let (repo, _temp_dir) = setup_test_db().await;

    let project = create_test_project(&repo, "Test Project").await;

    let task = repo
        .add_task(NewTaskData {
            name: "Test Task".to_string(),
            priority: Some(TaskPriority::Medium),
            project_name: Some("Test Project".to_string()),
            tags: vec!["home".to_string(), "errand".to_string()],
            ..Default::default()
        })
        .await
        .expect("Failed to create task");

    assert_eq!(task.name, "Test Task");
    assert_eq!(task.project_id, Some(project.id));
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.priority, TaskPriority::Medium);

    // Update the task
    let updated_task = repo
        .update_task(
            task.id,
            UpdateTaskData {
                name: Some("Updated Task".to_string()),
                priority: Some(TaskPriority::High),
                remove_tags: Some(vec!["errand".to_string()]),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task");

    assert_eq!(updated_task.name, "Updated Task");
    assert_eq!(updated_task.priority, TaskPriority::High);

    // Complete the task
    let completion_result = repo
        .complete_task(task.id, None)
        .await
        .expect("Failed to complete task");

    match completion_result {
        CompletionResult::Single(completed_task) => {
            assert_eq!(completed_task.status, TaskStatus::Completed);
            assert!(completed_task.completed_at.is_some());
        }
        _ => panic!("Expected single task completion"),
    }
}

#[tokio::test]
async fn test_task_filtering_workflow() {
    let (repo, _temp_dir) = setup_test_db().await;

    create_test_project(&repo, "Filter Project").await;

    repo.add_task(NewTaskData {
        name: "High in project".to_string(),
        priority: Some(TaskPriority::High),
        project_name: Some("Filter Project".to_string()),
        tags: vec!["deep-work".to_string()],
        ..Default::default()
    })
    .await
    .unwrap();

    let other = repo
        .add_task(NewTaskData {
            name: "Low elsewhere".to_string(),
            priority: Some(TaskPriority::Low),
            ..Default::default()
        })
        .await
        .unwrap();

    repo.complete_task(other.id, None).await.unwrap();

    // Default filter: pending only
    let pending = repo.find_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name, "High in project");
    assert_eq!(pending[0].project_name.as_deref(), Some("Filter Project"));
    assert!(pending[0].tags.as_deref().unwrap().contains("deep-work"));

    // Include closed tasks
    let all = repo
        .find_tasks(&TaskFilter {
            include_closed: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // Tag filter
    let tagged = repo
        .find_tasks(&TaskFilter {
            tag: Some("deep-work".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);

    // Priority filter that matches nothing pending
    let none = repo
        .find_tasks(&TaskFilter {
            priority: Some(TaskPriority::Low),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_recurring_task_creates_rule() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (task, rule) = create_recurring_task(
        &repo,
        "Water plants",
        NewRecurrence {
            frequency: Frequency::Weekly,
            interval: 2,
            anchor_start: ymd(2024, 1, 1),
            anchor_end: Some(ymd(2024, 12, 31)),
            days_of_week: WeekdaySet::single(Weekday::Mon),
            at_time: NaiveTime::from_hms_opt(9, 0, 0),
        },
    )
    .await;

    assert_eq!(rule.task_id, task.id);
    assert_eq!(rule.frequency, Frequency::Weekly);
    assert_eq!(rule.interval, 2);
    assert!(rule.days_of_week.contains(Weekday::Mon));
    assert_eq!(rule.at_time, NaiveTime::from_hms_opt(9, 0, 0));

    // The listing flags the task as recurring
    let listed = repo.find_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].recurring);
}

#[tokio::test]
async fn test_invalid_rule_rejected_at_creation() {
    let (repo, _temp_dir) = setup_test_db().await;

    // Zero interval rejects the whole task write
    let result = repo
        .add_task(NewTaskData {
            name: "Broken".to_string(),
            recurrence: Some(NewRecurrence {
                interval: 0,
                ..daily(ymd(2024, 1, 1))
            }),
            ..Default::default()
        })
        .await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidRule(_)));
    assert!(repo
        .find_tasks(&TaskFilter {
            include_closed: true,
            ..Default::default()
        })
        .await
        .unwrap()
        .is_empty());

    // Weekday mask on a monthly rule via create_rule
    let task = create_test_task(&repo, "Standalone").await;
    let result = repo
        .create_rule(NewRuleData {
            task_id: task.id,
            frequency: Frequency::Monthly,
            interval: 1,
            anchor_start: ymd(2024, 1, 31),
            anchor_end: None,
            days_of_week: WeekdaySet::single(Weekday::Fri),
            at_time: None,
        })
        .await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidRule(_)));

    // End before start via update path
    repo.create_rule(NewRuleData {
        task_id: task.id,
        frequency: Frequency::Monthly,
        interval: 1,
        anchor_start: ymd(2024, 1, 31),
        anchor_end: None,
        days_of_week: WeekdaySet::empty(),
        at_time: None,
    })
    .await
    .unwrap();
    let rule = repo.find_rule_for_task(task.id).await.unwrap().unwrap();
    let result = repo
        .update_rule(
            rule.id,
            UpdateRuleData {
                anchor_end: Some(Some(ymd(2023, 1, 1))),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidRule(_)));
}

#[tokio::test]
async fn test_complete_occurrence_writes_override() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (task, rule) = create_recurring_task(&repo, "Journal", daily(ymd(2024, 3, 1))).await;

    let result = repo
        .complete_task(task.id, Some(ymd(2024, 3, 10)))
        .await
        .unwrap();

    match result {
        CompletionResult::Occurrence {
            task: completed,
            applied,
            next_occurrence,
        } => {
            assert_eq!(completed.id, task.id);
            assert_eq!(applied.status, Some(OccurrenceStatus::Completed));
            assert_eq!(applied.occurrence_date, ymd(2024, 3, 10));
            assert_eq!(next_occurrence, Some(ymd(2024, 3, 11)));
        }
        _ => panic!("Expected occurrence completion"),
    }

    // The task row is untouched; the deviation lives in the override table
    let reloaded = repo.find_task_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, TaskStatus::Pending);

    let overrides = repo.find_overrides(rule.id).await.unwrap();
    assert_eq!(overrides.len(), 1);

    // Completing the same occurrence again folds into the same row
    repo.complete_task(task.id, Some(ymd(2024, 3, 10)))
        .await
        .unwrap();
    assert_eq!(repo.find_overrides(rule.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_completing_recurring_task_requires_date() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (task, _rule) = create_recurring_task(&repo, "Standup", daily(ymd(2024, 1, 1))).await;

    let result = repo.complete_task(task.id, None).await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidInput(_)));

    // Off-pattern dates are rejected too
    let (task2, _) = create_recurring_task(
        &repo,
        "Biweekly",
        NewRecurrence {
            interval: 2,
            ..daily(ymd(2024, 1, 1))
        },
    )
    .await;
    let result = repo.complete_task(task2.id, Some(ymd(2024, 1, 2))).await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_cancel_occurrence_and_next_skips_it() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (task, rule) = create_recurring_task(&repo, "Gym", daily(ymd(2024, 5, 1))).await;

    let result = repo.cancel_task(task.id, Some(ymd(2024, 5, 3))).await.unwrap();
    match result {
        CompletionResult::Occurrence { applied, .. } => {
            assert_eq!(applied.status, Some(OccurrenceStatus::Cancelled));
        }
        _ => panic!("Expected occurrence cancellation"),
    }

    // The cancelled date is stepped over when looking for the next occurrence
    let resolver = repo.resolver_for_rule(rule.id).await.unwrap();
    assert_eq!(resolver.next_occurrence_after(ymd(2024, 5, 2)), Some(ymd(2024, 5, 4)));
}

#[tokio::test]
async fn test_reschedule_occurrence_overrides_time_only() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (_, rule) = create_recurring_task(
        &repo,
        "Review",
        NewRecurrence {
            at_time: NaiveTime::from_hms_opt(9, 0, 0),
            ..daily(ymd(2024, 2, 1))
        },
    )
    .await;

    repo.reschedule_occurrence(rule.id, ymd(2024, 2, 5), NaiveTime::from_hms_opt(16, 0, 0).unwrap())
        .await
        .unwrap();

    let resolver = repo.resolver_for_rule(rule.id).await.unwrap();
    let moved = resolver.resolve(ymd(2024, 2, 5)).unwrap();
    assert_eq!(moved.at_time, NaiveTime::from_hms_opt(16, 0, 0));
    assert_eq!(moved.status, OccurrenceStatus::Scheduled);
    assert!(moved.overridden);

    let normal = resolver.resolve(ymd(2024, 2, 6)).unwrap();
    assert_eq!(normal.at_time, NaiveTime::from_hms_opt(9, 0, 0));
    assert!(!normal.overridden);
}

#[tokio::test]
async fn test_deleting_rule_cascades_overrides() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (_, rule) = create_recurring_task(&repo, "Backup", daily(ymd(2024, 1, 1))).await;

    repo.cancel_occurrence(rule.id, ymd(2024, 1, 2)).await.unwrap();
    assert_eq!(repo.find_overrides(rule.id).await.unwrap().len(), 1);

    // Overrides never block rule deletion
    repo.delete_rule(rule.id).await.unwrap();
    assert!(repo.find_rule_by_id(rule.id).await.unwrap().is_none());
    assert!(repo.find_overrides(rule.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_agenda_for_date() {
    let (repo, _temp_dir) = setup_test_db().await;

    // One-off task due on the target day
    let due = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
    repo.add_task(NewTaskData {
        name: "Dentist".to_string(),
        due_at: Some(due),
        ..Default::default()
    })
    .await
    .unwrap();

    // Weekly rule hitting Mondays; 2024-06-03 is a Monday
    create_recurring_task(
        &repo,
        "Weekly report",
        NewRecurrence {
            frequency: Frequency::Weekly,
            interval: 1,
            anchor_start: ymd(2024, 1, 1),
            anchor_end: None,
            days_of_week: WeekdaySet::single(Weekday::Mon),
            at_time: NaiveTime::from_hms_opt(9, 0, 0),
        },
    )
    .await;

    // A rule that does not hit the target day
    create_recurring_task(&repo, "Monthly bills", {
        NewRecurrence {
            frequency: Frequency::Monthly,
            interval: 1,
            anchor_start: ymd(2024, 1, 31),
            anchor_end: None,
            days_of_week: WeekdaySet::empty(),
            at_time: None,
        }
    })
    .await;

    let agenda = repo.agenda_for_date(ymd(2024, 6, 3)).await.unwrap();
    let names: Vec<&str> = agenda.iter().map(|e| e.task.name.as_str()).collect();
    assert_eq!(names, vec!["Weekly report", "Dentist"]);
    assert!(agenda[0].occurrence.is_some());
    assert!(agenda[1].occurrence.is_none());

    // The monthly day-31 rule produces nothing anywhere in June (30 days)
    let mut date = ymd(2024, 6, 1);
    while date <= ymd(2024, 6, 30) {
        let agenda = repo.agenda_for_date(date).await.unwrap();
        assert!(
            !agenda.iter().any(|e| e.task.name == "Monthly bills"),
            "unexpected occurrence on {date}"
        );
        date = date.succ_opt().unwrap();
    }
}

#[tokio::test]
async fn test_agenda_reflects_occurrence_status() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (_, rule) = create_recurring_task(&repo, "Meds", daily(ymd(2024, 4, 1))).await;
    repo.complete_occurrence(rule.id, ymd(2024, 4, 2)).await.unwrap();

    let agenda = repo.agenda_for_date(ymd(2024, 4, 2)).await.unwrap();
    assert_eq!(agenda.len(), 1);
    let occurrence = agenda[0].occurrence.as_ref().unwrap();
    assert_eq!(occurrence.status, OccurrenceStatus::Completed);

    // Other days keep the template default
    let agenda = repo.agenda_for_date(ymd(2024, 4, 3)).await.unwrap();
    let occurrence = agenda[0].occurrence.as_ref().unwrap();
    assert_eq!(occurrence.status, OccurrenceStatus::Scheduled);
}

#[tokio::test]
async fn test_preview_rule() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (_, rule) = create_recurring_task(
        &repo,
        "Leap day party",
        NewRecurrence {
            frequency: Frequency::Yearly,
            interval: 1,
            anchor_start: ymd(2024, 2, 29),
            anchor_end: None,
            days_of_week: WeekdaySet::empty(),
            at_time: None,
        },
    )
    .await;

    let preview = repo.preview_rule(rule.id, ymd(2024, 1, 1), 3).await.unwrap();
    let dates: Vec<NaiveDate> = preview.iter().map(|o| o.date).collect();
    assert_eq!(dates, vec![ymd(2024, 2, 29), ymd(2028, 2, 29), ymd(2032, 2, 29)]);
}

#[tokio::test]
async fn test_trash_workflow() {
    let (repo, _temp_dir) = setup_test_db().await;

    let task = create_test_task(&repo, "Disposable").await;

    repo.trash_task(task.id).await.unwrap();

    // Trashed tasks disappear from lookups and listings
    assert!(repo.find_task_by_id(task.id).await.unwrap().is_none());
    assert!(repo.find_tasks(&TaskFilter::default()).await.unwrap().is_empty());

    let trashed = repo.find_trashed_tasks().await.unwrap();
    assert_eq!(trashed.len(), 1);
    assert_eq!(trashed[0].id, task.id);

    // Restore brings it back
    let restored = repo.restore_task(task.id).await.unwrap();
    assert_eq!(restored.id, task.id);
    assert!(restored.deleted_at.is_none());
    assert!(repo.find_task_by_id(task.id).await.unwrap().is_some());

    // Empty trash hard-deletes
    repo.trash_task(task.id).await.unwrap();
    let purged = repo.empty_trash().await.unwrap();
    assert_eq!(purged, 1);
    assert!(repo.find_trashed_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_trashed_recurring_task_leaves_agenda() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (task, _) = create_recurring_task(&repo, "Ghost", daily(ymd(2024, 7, 1))).await;

    assert_eq!(repo.agenda_for_date(ymd(2024, 7, 2)).await.unwrap().len(), 1);
    repo.trash_task(task.id).await.unwrap();
    assert!(repo.agenda_for_date(ymd(2024, 7, 2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_project_delete_guard() {
    let (repo, _temp_dir) = setup_test_db().await;

    create_test_project(&repo, "Busy").await;
    repo.add_task(NewTaskData {
        name: "Occupant".to_string(),
        project_name: Some("Busy".to_string()),
        ..Default::default()
    })
    .await
    .unwrap();

    let result = repo.delete_project("Busy".to_string()).await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidInput(_)));

    // Duplicate names are rejected
    let result = repo.add_project("Busy".to_string(), None).await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_short_id_prefix_resolution() {
    let (repo, _temp_dir) = setup_test_db().await;

    let task = create_test_task(&repo, "Findable").await;
    let prefix = &task.id.to_string()[..7];

    let found = repo.find_tasks_by_short_id_prefix(prefix).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, task.id);

    let none = repo.find_tasks_by_short_id_prefix("ffffffff").await.unwrap();
    assert!(none.is_empty() || none[0].id != task.id);
}
