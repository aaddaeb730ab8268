use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the term codes listed on the account page.
    Terms,
    /// Print courses (with assignments) as JSON.
    Courses(CoursesArgs),
    /// Print one course, or "Course Not Found".
    Course(CourseArgs),
    /// Print the id of a course matched by name and term.
    CourseId(CourseIdArgs),
    /// Print the assignments of one course as JSON.
    Assignments(AssignmentsArgs),
    /// Compute a weighted course grade.
    Grade(GradeArgs),
    /// Write a grading-schema snapshot with placeholder category rules.
    Schema(SchemaArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Account email (default: $GRADESCRAPE_EMAIL).
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Account password (default: $GRADESCRAPE_PASSWORD).
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Gradebook site root.
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Read courses from this snapshot instead of logging in.
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Keep only courses in this term code (e.g. FA24). Repeatable.
    #[arg(long = "term", global = true)]
    pub terms: Vec<String>,

    /// Filter by term even when no --term is given (uses the account's terms).
    #[arg(long, global = true)]
    pub filter_terms_always: bool,

    /// Drop assignment rows that have no assignment id.
    #[arg(long, global = true)]
    pub drop_unlinked_rows: bool,
}

#[derive(Debug, Args)]
pub struct CoursesArgs {
    /// Skip assignment tables.
    #[arg(long)]
    pub no_assignments: bool,

    /// Also write the result as a snapshot file.
    #[arg(long)]
    pub dump: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CourseArgs {
    /// Course id (last path segment of the course URL).
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct CourseIdArgs {
    /// Substring of the course name (spaces removed, e.g. CSE100).
    #[arg(long)]
    pub name: String,

    /// Exact term code (e.g. FA24).
    #[arg(long)]
    pub term: String,
}

#[derive(Debug, Args)]
pub struct AssignmentsArgs {
    #[arg(long)]
    pub course_id: String,
}

#[derive(Debug, Args)]
pub struct GradeArgs {
    #[arg(long)]
    pub course_id: String,

    /// Category weight as LABEL=WEIGHT. Repeatable.
    #[arg(long = "weight")]
    pub weights: Vec<String>,

    /// JSON object of category weights, e.g. {"Homework": 0.4}.
    #[arg(long)]
    pub weights_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Output path for the grading schema JSON.
    #[arg(long, default_value = "grading-schema.json")]
    pub out: PathBuf,
}
