//! Gradebook markup → records.
//!
//! Every assumption about the site's HTML (class names, attributes, URL
//! shapes) lives in this module. The functions are pure over a parsed
//! [`Html`] document so they can be exercised against fixture pages.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::GradeError;
use crate::formats::{Assignment, Score, SubmissionStatus};

static ASSIGNMENT_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/courses/([0-9]*)/assignments/([0-9]*)/submissions/([0-9]*)$")
        .expect("assignment href pattern compiles")
});

struct Selectors {
    authenticity_token: Selector,
    term: Selector,
    course_box: Selector,
    course_header: Selector,
    heading: Selector,
    header_term: Selector,
    table_body: Selector,
    row: Selector,
    assignment_button: Selector,
    anchor: Selector,
    row_header: Selector,
    score: Selector,
    time: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    authenticity_token: css(r#"input[name="authenticity_token"]"#),
    term: css(".courseList--term"),
    course_box: css("a.courseBox"),
    course_header: css("header.courseHeader"),
    heading: css("h1"),
    header_term: css("h2.courseHeader--term"),
    table_body: css("tbody"),
    row: css(r#"tr[role="row"]"#),
    assignment_button: css("button[data-assignment-id]"),
    anchor: css("a[href]"),
    row_header: css("th"),
    score: css(".submissionStatus--score"),
    time: css("time"),
});

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector parses")
}

/// What to do with assignment rows that expose no assignment id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowPolicy {
    /// Keep the row as a name-only record taken from its header cell.
    #[default]
    RetainNameOnly,
    /// Drop rows without a button or submission link.
    DropUnlinked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRef {
    pub href: String,
    pub course_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseHeader {
    pub name: String,
    pub term: String,
}

/// CSRF token embedded in the login form of the landing page.
pub fn authenticity_token(doc: &Html) -> Option<String> {
    doc.select(&SELECTORS.authenticity_token)
        .find_map(|input| input.value().attr("value"))
        .map(str::to_owned)
}

pub fn extract_terms(doc: &Html) -> Vec<String> {
    doc.select(&SELECTORS.term)
        .map(|term| crate::term::normalize(&element_text(term)))
        .collect()
}

pub fn extract_course_refs(doc: &Html) -> Vec<CourseRef> {
    doc.select(&SELECTORS.course_box)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let course_id = href.trim_end_matches('/').rsplit('/').next()?;
            if course_id.is_empty() {
                return None;
            }
            Some(CourseRef {
                href: href.to_owned(),
                course_id: course_id.to_owned(),
            })
        })
        .collect()
}

/// `None` means the page has no course header, which is how the site renders
/// unknown courses and courses the account cannot see.
pub fn extract_course_header(doc: &Html) -> Option<CourseHeader> {
    let header = doc.select(&SELECTORS.course_header).next()?;
    let heading = header.select(&SELECTORS.heading).next()?;
    let term = header.select(&SELECTORS.header_term).next()?;

    Some(CourseHeader {
        name: element_text(heading).replace(' ', "").trim().to_owned(),
        term: crate::term::normalize(&element_text(term)),
    })
}

pub fn extract_assignments(doc: &Html, policy: RowPolicy) -> Result<Vec<Assignment>, GradeError> {
    let body = doc
        .select(&SELECTORS.table_body)
        .next()
        .ok_or_else(|| GradeError::Parse {
            what: "assignment table body (tbody)".to_owned(),
        })?;

    let mut assignments = Vec::new();
    for row in body.select(&SELECTORS.row) {
        match extract_assignment_row(row, policy) {
            Some(assignment) => assignments.push(assignment),
            None => {
                let text = element_text(row);
                tracing::debug!(
                    row = %text.trim(),
                    ?policy,
                    "skipping assignment row without identity"
                );
            }
        }
    }
    Ok(assignments)
}

fn extract_assignment_row(row: ElementRef<'_>, policy: RowPolicy) -> Option<Assignment> {
    let (id, name) = match row_identity(row) {
        Some((id, name)) => (Some(id), name),
        None if policy == RowPolicy::RetainNameOnly => {
            let header = row.select(&SELECTORS.row_header).next()?;
            (None, element_text(header).trim().to_owned())
        }
        None => return None,
    };

    let mut assignment = Assignment {
        id,
        name,
        submission_status: SubmissionStatus::Unknown,
        score: None,
        start_time: None,
        end_time: None,
    };

    if let Some(score) = row.select(&SELECTORS.score).next() {
        assignment.submission_status = SubmissionStatus::Graded;
        assignment.score = parse_score(&element_text(score));
    } else if has_text_node(row, "Submitted") {
        assignment.submission_status = SubmissionStatus::Submitted;
    } else if has_text_node(row, "No Submission") {
        assignment.submission_status = SubmissionStatus::NotSubmitted;
    }

    let times = row.select(&SELECTORS.time).collect::<Vec<_>>();
    if let [start, end, ..] = times.as_slice() {
        assignment.start_time = start.value().attr("datetime").and_then(parse_timestamp);
        assignment.end_time = end.value().attr("datetime").and_then(parse_timestamp);
    }

    Some(assignment)
}

/// Assignment id and display name from the row's button, else from the last
/// link pointing at a submission.
fn row_identity(row: ElementRef<'_>) -> Option<(String, String)> {
    if let Some(button) = row.select(&SELECTORS.assignment_button).next() {
        let id = button.value().attr("data-assignment-id")?.trim().to_owned();
        return Some((id, element_text(button).trim().to_owned()));
    }

    row.select(&SELECTORS.anchor)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let captures = ASSIGNMENT_HREF.captures(href)?;
            let id = captures.get(2)?.as_str().to_owned();
            Some((id, element_text(anchor).trim().to_owned()))
        })
        .last()
}

/// Parses `"8 / 10"` style score text. Fractional points are allowed.
pub fn parse_score(raw: &str) -> Option<Score> {
    let Some((earned, possible)) = raw.trim().split_once(" / ") else {
        tracing::debug!(raw, "score text has no ' / ' separator");
        return None;
    };
    match (earned.trim().parse::<f64>(), possible.trim().parse::<f64>()) {
        (Ok(earned), Ok(possible)) => Some(Score { earned, possible }),
        _ => {
            tracing::debug!(raw, "score text is not numeric");
            None
        }
    }
}

/// Accepts RFC 3339 and the `2024-01-15 23:59:00 -0800` form the site emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z"))
    {
        Ok(timestamp) => Some(timestamp),
        Err(err) => {
            tracing::debug!(raw, %err, "unparseable datetime attribute");
            None
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn has_text_node(element: ElementRef<'_>, text: &str) -> bool {
    element.text().any(|node| node.trim() == text)
}
