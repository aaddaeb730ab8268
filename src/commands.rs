use anyhow::Context as _;

use crate::cli::{
    AssignmentsArgs, CourseArgs, CourseIdArgs, CoursesArgs, GradeArgs, SchemaArgs, SourceArgs,
};
use crate::config::{Credentials, SiteConfig, Weights};
use crate::extract::RowPolicy;
use crate::repository::{CourseRepository, RepositoryOptions, TermPolicy};
use crate::session::Session;

pub const COURSE_NOT_FOUND: &str = "Course Not Found";

/// Logs in, or opens the snapshot when `--snapshot` is given.
pub fn open_repository(args: &SourceArgs) -> anyhow::Result<CourseRepository<Session>> {
    let options = RepositoryOptions {
        terms: args.terms.clone(),
        term_policy: if args.filter_terms_always {
            TermPolicy::Always
        } else {
            TermPolicy::WhenNonEmpty
        },
        row_policy: if args.drop_unlinked_rows {
            RowPolicy::DropUnlinked
        } else {
            RowPolicy::RetainNameOnly
        },
    };

    if let Some(snapshot) = &args.snapshot {
        tracing::info!(snapshot = %snapshot.display(), "offline mode");
        return Ok(CourseRepository::offline(snapshot, options));
    }

    let site = SiteConfig::new(&args.base_url, args.timeout_secs).context("site config")?;
    let credentials =
        Credentials::resolve(args.email.clone(), args.password.clone()).context("credentials")?;
    let session = Session::authenticate(site, &credentials).context("log in")?;
    Ok(CourseRepository::live(session, options))
}

pub fn terms(source: &SourceArgs) -> anyhow::Result<()> {
    let repo = open_repository(source)?;
    for term in repo.list_terms().context("list terms")? {
        println!("{term}");
    }
    Ok(())
}

pub fn courses(source: &SourceArgs, args: CoursesArgs) -> anyhow::Result<()> {
    let repo = open_repository(source)?;
    let courses = repo
        .list_courses(!args.no_assignments)
        .context("list courses")?;

    if let Some(path) = &args.dump {
        repo.dump_snapshot(path, &courses)
            .context("dump snapshot")?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&courses).context("serialize courses")?
    );
    Ok(())
}

pub fn course(source: &SourceArgs, args: CourseArgs) -> anyhow::Result<()> {
    let repo = open_repository(source)?;
    match repo.get_course_info(&args.id).context("course info")? {
        Some(course) => println!(
            "{}",
            serde_json::to_string_pretty(&course).context("serialize course")?
        ),
        None => println!("{COURSE_NOT_FOUND}"),
    }
    Ok(())
}

pub fn course_id(source: &SourceArgs, args: CourseIdArgs) -> anyhow::Result<()> {
    let repo = open_repository(source)?;
    match repo
        .find_course_id(&args.name, &args.term)
        .context("find course id")?
    {
        Some(id) => println!("{id}"),
        None => println!("{COURSE_NOT_FOUND}"),
    }
    Ok(())
}

pub fn assignments(source: &SourceArgs, args: AssignmentsArgs) -> anyhow::Result<()> {
    let repo = open_repository(source)?;
    match repo
        .course_assignments(&args.course_id)
        .context("course assignments")?
    {
        Some(assignments) => println!(
            "{}",
            serde_json::to_string_pretty(&assignments).context("serialize assignments")?
        ),
        None => println!("{COURSE_NOT_FOUND}"),
    }
    Ok(())
}

pub fn grade(source: &SourceArgs, args: GradeArgs) -> anyhow::Result<()> {
    let weights = grade_weights(&args)?;
    let repo = open_repository(source)?;

    let Some(assignments) = repo
        .course_assignments(&args.course_id)
        .context("course assignments")?
    else {
        println!("{COURSE_NOT_FOUND}");
        return Ok(());
    };

    let report = crate::grade::grade_breakdown(&assignments, &weights)
        .with_context(|| format!("grade course {}", args.course_id))?;

    for category in &report.categories {
        let marker = if category.included { "" } else { "\t(no graded work)" };
        println!(
            "{}\t{}\t{}/{}{marker}",
            category.category, category.weight, category.earned, category.possible
        );
    }
    println!("grade\t{:.2}%", report.grade * 100.0);
    Ok(())
}

pub fn schema(source: &SourceArgs, args: SchemaArgs) -> anyhow::Result<()> {
    let repo = open_repository(source)?;
    let courses = repo.list_courses(true).context("list courses")?;
    crate::snapshot::dump_grading_schema(&args.out, &courses).context("write grading schema")?;
    Ok(())
}

fn grade_weights(args: &GradeArgs) -> anyhow::Result<Weights> {
    let mut weights = match &args.weights_file {
        Some(path) => crate::config::load_weights(path).context("load weights")?,
        None => Weights::new(),
    };
    for raw in &args.weights {
        let (label, weight) = crate::config::parse_weight(raw).context("parse --weight")?;
        crate::config::insert_weight(&mut weights, label, weight);
    }
    if weights.is_empty() {
        anyhow::bail!("no category weights given (use --weight LABEL=WEIGHT or --weights-file)");
    }
    Ok(weights)
}
