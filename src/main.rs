use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    gradescrape::logging::init().context("init logging")?;

    let cli = gradescrape::cli::Cli::parse();
    tracing::debug!(command = ?cli.command, "parsed cli");

    let source = &cli.source;
    match cli.command {
        gradescrape::cli::Command::Terms => {
            gradescrape::commands::terms(source).context("terms")?;
        }
        gradescrape::cli::Command::Courses(args) => {
            gradescrape::commands::courses(source, args).context("courses")?;
        }
        gradescrape::cli::Command::Course(args) => {
            gradescrape::commands::course(source, args).context("course")?;
        }
        gradescrape::cli::Command::CourseId(args) => {
            gradescrape::commands::course_id(source, args).context("course-id")?;
        }
        gradescrape::cli::Command::Assignments(args) => {
            gradescrape::commands::assignments(source, args).context("assignments")?;
        }
        gradescrape::cli::Command::Grade(args) => {
            gradescrape::commands::grade(source, args).context("grade")?;
        }
        gradescrape::cli::Command::Schema(args) => {
            gradescrape::commands::schema(source, args).context("schema")?;
        }
    }

    Ok(())
}
