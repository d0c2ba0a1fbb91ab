use cadence_core::models::{OccurrenceStatus, TaskPriority, TaskStatus};
use cadence_core::repository::AgendaEntry;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ViewTask {
    pub id: Uuid,
    pub name: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_at: Option<DateTime<Utc>>,
    pub project_name: Option<String>,
    pub tags: Vec<String>,
    pub recurring: bool,
}

#[derive(Debug, Clone)]
pub struct ViewProject {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn display_tasks(tasks: &[ViewTask]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Status", "Due Date", "Project", "Tags"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(&task.id.to_string()[..7]));

        let mut display_name = String::new();
        if task.recurring {
            display_name.push('↻'); // Recurring symbol
            display_name.push(' ');
        }
        display_name.push_str(&task.name);

        let mut name_cell = Cell::new(display_name);
        match task.status {
            TaskStatus::Completed | TaskStatus::Cancelled => {
                name_cell = name_cell
                    .add_attribute(Attribute::CrossedOut)
                    .fg(Color::DarkGrey);
            }
            TaskStatus::Pending => {
                name_cell = match task.priority {
                    TaskPriority::High => name_cell.fg(Color::Red).add_attribute(Attribute::Bold),
                    TaskPriority::Medium => name_cell.fg(Color::Yellow),
                    TaskPriority::Low => name_cell.fg(Color::Green),
                    TaskPriority::None => name_cell,
                };
            }
        };
        row.add_cell(name_cell);

        let mut status_cell = Cell::new(format!("{:?}", task.status));
        status_cell = match task.status {
            TaskStatus::Completed => status_cell.fg(Color::Green),
            TaskStatus::Cancelled => status_cell.fg(Color::DarkGrey),
            TaskStatus::Pending => status_cell,
        };
        row.add_cell(status_cell);

        let due_date_cell = if let Some(due_at) = task.due_at {
            let now = Utc::now();
            let due_text = due_at.humanize();
            if task.status == TaskStatus::Pending {
                if due_at < now {
                    Cell::new(due_text).fg(Color::Red) // Overdue
                } else if due_at.date_naive() == now.date_naive() {
                    Cell::new(due_text).fg(Color::Yellow) // Due today
                } else {
                    Cell::new(due_text)
                }
            } else {
                Cell::new(due_text)
            }
        } else {
            Cell::new("None")
        };
        row.add_cell(due_date_cell);

        row.add_cell(Cell::new(task.project_name.as_deref().unwrap_or("None")));
        row.add_cell(Cell::new(if task.tags.is_empty() {
            "None".to_string()
        } else {
            task.tags.join(", ")
        }));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_projects(projects: &[ViewProject]) {
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Description", "Created At"]);

    for project in projects {
        let mut row = Row::new();
        row.add_cell(Cell::new(&project.id.to_string()));
        row.add_cell(Cell::new(&project.name));
        row.add_cell(Cell::new(project.description.as_deref().unwrap_or("None")));
        row.add_cell(Cell::new(project.created_at.humanize()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_agenda(date: NaiveDate, entries: &[AgendaEntry]) {
    if entries.is_empty() {
        println!("Nothing scheduled on {}.", date);
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Time", "Name", "Status"]);

    for entry in entries {
        let mut row = Row::new();
        row.add_cell(Cell::new(&entry.task.id.to_string()[..7]));

        let time_text = match &entry.occurrence {
            Some(occ) => occ
                .at_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "—".to_string()),
            None => entry
                .task
                .due_at
                .map(|dt| dt.format("%H:%M").to_string())
                .unwrap_or_else(|| "—".to_string()),
        };
        row.add_cell(Cell::new(time_text));

        let mut display_name = String::new();
        if entry.occurrence.is_some() {
            display_name.push('↻');
            display_name.push(' ');
        }
        display_name.push_str(&entry.task.name);

        let (status_text, struck) = match &entry.occurrence {
            Some(occ) => (
                occ.status.to_string(),
                occ.status == OccurrenceStatus::Cancelled,
            ),
            None => (
                format!("{:?}", entry.task.status).to_lowercase(),
                entry.task.status == TaskStatus::Cancelled,
            ),
        };

        let mut name_cell = Cell::new(display_name);
        if struck {
            name_cell = name_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        }
        row.add_cell(name_cell);

        let status_cell = match status_text.as_str() {
            "completed" => Cell::new(status_text).fg(Color::Green),
            "cancelled" => Cell::new(status_text).fg(Color::DarkGrey),
            _ => Cell::new(status_text),
        };
        row.add_cell(status_cell);

        table.add_row(row);
    }

    println!("Agenda for {}", date);
    println!("{table}");
}
