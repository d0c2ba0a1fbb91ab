use clap::{Parser, Subcommand};

/// A task manager with calendar-day recurring tasks and a recoverable trash
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// List tasks
    List(ListCommand),
    /// Show everything scheduled on one day
    Agenda(AgendaCommand),
    /// Mark a task (or one occurrence of a recurring task) as completed
    Do(DoCommand),
    /// Cancel a task (or one occurrence of a recurring task)
    Cancel(CancelCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Move a task to the trash
    Delete(DeleteCommand),
    /// Manage projects
    Project(ProjectCommand),
    /// Manage the trash
    Trash(TrashCommand),
    /// Manage recurrence of a task
    Recur(RecurCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The name of the task
    pub name: String,
    /// The description of the task
    #[arg(short, long)]
    pub description: Option<String>,
    /// The due date of the task (e.g. 'tomorrow', '2025-03-01')
    #[arg(long)]
    pub due: Option<String>,
    /// The project of the task
    #[arg(short, long)]
    pub project: Option<String>,
    /// Tags to add to the task
    #[arg(short, long, num_args = 1..)]
    pub tag: Vec<String>,
    /// The priority of the task (none|low|medium|high)
    #[arg(long)]
    pub priority: Option<String>,
    /// Recurrence frequency (daily|weekly|monthly|yearly|weekdays|weekends)
    #[arg(long)]
    pub every: Option<String>,
    /// Repeat every N units (default 1)
    #[arg(long, requires = "every")]
    pub interval: Option<u32>,
    /// Days of week for weekly recurrence (e.g. 'mon,wed,fri')
    #[arg(long, requires = "every")]
    pub on: Option<String>,
    /// Time of day for occurrences (e.g. '9:00 AM', '14:30')
    #[arg(long, requires = "every")]
    pub at: Option<String>,
    /// First day of the recurrence (defaults to the due date, or today)
    #[arg(long, requires = "every")]
    pub from: Option<String>,
    /// Last day of the recurrence (inclusive)
    #[arg(long, requires = "every")]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only tasks with this status (pending|completed|cancelled)
    #[arg(long)]
    pub status: Option<String>,
    /// Only tasks with this priority (none|low|medium|high)
    #[arg(long)]
    pub priority: Option<String>,
    /// Only tasks in this project
    #[arg(short, long)]
    pub project: Option<String>,
    /// Only tasks carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Include completed and cancelled tasks
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AgendaCommand {
    /// The day to show (defaults to today in your timezone)
    #[arg(long)]
    pub date: Option<String>,
    /// Timezone used to decide what "today" means (IANA name)
    #[arg(long)]
    pub timezone: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DoCommand {
    /// The ID of the task to mark as completed
    pub id: String,
    /// For recurring tasks: the occurrence date (defaults to today)
    #[arg(long)]
    pub on: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CancelCommand {
    /// The ID of the task to cancel
    pub id: String,
    /// For recurring tasks: the occurrence date (defaults to today)
    #[arg(long)]
    pub on: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the task to edit
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub due: Option<String>,
    #[arg(long, conflicts_with = "due")]
    pub due_clear: bool,

    /// The priority of the task (none|low|medium|high)
    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub project: Option<String>,
    #[arg(long, conflicts_with = "project")]
    pub project_clear: bool,

    /// Add tags to the task
    #[arg(long, num_args = 1..)]
    pub add_tag: Vec<String>,

    /// Remove tags from the task
    #[arg(long, num_args = 1..)]
    pub remove_tag: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the task to move to the trash
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ProjectCommand {
    #[command(subcommand)]
    pub command: ProjectSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectSubcommand {
    /// Add a new project
    Add(ProjectAddCommand),
    /// List projects
    List,
    /// Delete a project (only when it has no tasks)
    Delete(ProjectDeleteCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ProjectAddCommand {
    /// The name of the project
    pub name: String,
    /// The description of the project
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ProjectDeleteCommand {
    /// The name of the project to delete
    pub name: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TrashCommand {
    #[command(subcommand)]
    pub command: TrashSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TrashSubcommand {
    /// List trashed tasks
    List,
    /// Restore a trashed task
    Restore(TrashRestoreCommand),
    /// Permanently delete everything in the trash
    Empty(TrashEmptyCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct TrashRestoreCommand {
    /// The ID of the trashed task to restore
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct TrashEmptyCommand {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurCommand {
    #[command(subcommand)]
    pub command: RecurSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecurSubcommand {
    /// Show a task's recurrence rule and upcoming occurrences
    Info(RecurInfoCommand),
    /// Preview upcoming occurrences
    Preview(RecurPreviewCommand),
    /// Move one occurrence to a different time of day
    Reschedule(RecurRescheduleCommand),
    /// List per-occurrence overrides
    Overrides(RecurOverridesCommand),
    /// Remove the override for one occurrence
    RemoveOverride(RecurRemoveOverrideCommand),
    /// Set or clear the rule's end date
    End(RecurEndCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct RecurInfoCommand {
    /// The ID of the recurring task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurPreviewCommand {
    /// The ID of the recurring task
    pub id: String,
    /// How many occurrences to show
    #[arg(short, long)]
    pub count: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurRescheduleCommand {
    /// The ID of the recurring task
    pub id: String,
    /// The occurrence date to reschedule
    #[arg(long)]
    pub on: String,
    /// The new time of day (e.g. '4:00 PM')
    #[arg(long)]
    pub at: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurOverridesCommand {
    /// The ID of the recurring task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurRemoveOverrideCommand {
    /// The ID of the recurring task
    pub id: String,
    /// The occurrence date whose override should be removed
    #[arg(long)]
    pub on: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurEndCommand {
    /// The ID of the recurring task
    pub id: String,
    /// Last day of the recurrence (inclusive)
    #[arg(long, conflicts_with = "clear")]
    pub until: Option<String>,
    /// Remove the end date so the rule runs forever
    #[arg(long)]
    pub clear: bool,
}
