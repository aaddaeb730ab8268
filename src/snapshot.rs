use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use serde::Serialize as _;

use crate::error::GradeError;
use crate::formats::{CategoryConfig, Course};

/// Categories seeded into a grading schema for courses that carry none.
pub const DEFAULT_SCHEMA_CATEGORIES: [&str; 3] = ["Homework", "Midterm", "Final"];

pub fn load(path: &Path) -> Result<Vec<Course>, GradeError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            GradeError::config(path, "snapshot file was not found")
        } else {
            GradeError::config(path, format!("read snapshot: {err}"))
        }
    })?;
    let courses: Vec<Course> = serde_json::from_str(&raw)
        .map_err(|err| GradeError::config(path, format!("snapshot is not valid JSON: {err}")))?;
    tracing::debug!(path = %path.display(), courses = courses.len(), "loaded snapshot");
    Ok(courses)
}

/// Writes the course list as 2-space indented JSON.
pub fn dump(path: &Path, courses: &[Course]) -> Result<(), GradeError> {
    write_json(path, courses, b"  ")
}

/// Writes a grading-schema snapshot: every course gets placeholder category
/// rules (unless it already has some) and is written with 4-space indent.
pub fn dump_grading_schema(path: &Path, courses: &[Course]) -> Result<(), GradeError> {
    let courses = courses
        .iter()
        .cloned()
        .map(|mut course| {
            if course.categories.is_none() {
                course.categories = Some(
                    DEFAULT_SCHEMA_CATEGORIES
                        .iter()
                        .map(|category| CategoryConfig::placeholder(category))
                        .collect(),
                );
            }
            course
        })
        .collect::<Vec<_>>();
    write_json(path, &courses, b"    ")
}

fn write_json(path: &Path, courses: &[Course], indent: &[u8]) -> Result<(), GradeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            GradeError::config(parent, format!("create snapshot directory: {err}"))
        })?;
    }

    let file = File::create(path)
        .map_err(|err| GradeError::config(path, format!("create snapshot: {err}")))?;
    let mut out = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    courses
        .serialize(&mut serializer)
        .map_err(|err| GradeError::config(path, format!("serialize snapshot: {err}")))?;

    out.write_all(b"\n")
        .and_then(|()| out.flush())
        .map_err(|err| GradeError::config(path, format!("write snapshot: {err}")))?;

    tracing::info!(path = %path.display(), courses = courses.len(), "wrote snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{Assignment, Score, SubmissionStatus};

    fn course(id: &str, term: &str) -> Course {
        Course {
            id: id.to_owned(),
            name: format!("CSE{id}"),
            term: term.to_owned(),
            assignments: None,
            categories: None,
        }
    }

    #[test]
    fn dump_then_load_round_trips() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("data").join("courses.json");
        let courses = vec![course("100", "FA24"), course("0042", "SP23")];

        dump(&path, &courses)?;
        assert_eq!(load(&path)?, courses);

        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.starts_with("[\n  {\n    \"id\": \"100\""), "{raw}");
        assert!(!raw.contains("assignments"));
        Ok(())
    }

    #[test]
    fn assignments_survive_round_trip() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("courses.json");
        let mut with_work = course("7", "WI22");
        with_work.assignments = Some(vec![Assignment {
            id: Some("9".to_owned()),
            name: "Homework 1".to_owned(),
            submission_status: SubmissionStatus::Graded,
            score: Some(Score {
                earned: 8.5,
                possible: 10.0,
            }),
            start_time: crate::extract::parse_timestamp("2022-01-10T08:00:00-08:00"),
            end_time: None,
        }]);

        dump(&path, std::slice::from_ref(&with_work))?;
        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.contains("\"submissionStatus\": \"Graded\""), "{raw}");
        assert!(raw.contains("\"startTime\""), "{raw}");
        assert_eq!(load(&path)?, vec![with_work]);
        Ok(())
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load(Path::new("/definitely/not/here/courses.json")).unwrap_err();
        assert!(matches!(err, GradeError::Config { .. }));
        assert!(err.to_string().contains("was not found"));
    }

    #[test]
    fn invalid_json_is_a_config_error() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("courses.json");
        std::fs::write(&path, "[{\"id\": 1")?;

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
        Ok(())
    }

    #[test]
    fn grading_schema_seeds_placeholder_categories() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("grading-schema.json");

        dump_grading_schema(&path, &[course("1", "FA24")])?;

        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.starts_with("[\n    {\n        \"id\": \"1\""), "{raw}");
        assert!(raw.contains("\"numDropLowest\": 0"));
        assert!(raw.contains("\"redemptionPolicy\": false"));
        assert!(raw.contains("\"pattern\": null"));

        let loaded = load(&path)?;
        let categories = loaded[0].categories.clone().unwrap_or_default();
        let labels = categories.iter().map(|c| c.category.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, DEFAULT_SCHEMA_CATEGORIES);
        assert_eq!(categories[1].contains, "Midterm");
        Ok(())
    }
}
