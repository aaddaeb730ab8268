use std::path::{Path, PathBuf};

use scraper::Html;

use crate::error::GradeError;
use crate::extract::{self, RowPolicy};
use crate::formats::{Assignment, Course};
use crate::session::PageSource;

const ACCOUNT_ENDPOINT: &str = "account";

/// Where course data comes from.
#[derive(Debug)]
pub enum CourseSource<P> {
    /// Scrape the gradebook through an authenticated page source.
    Live(P),
    /// Read a previously dumped snapshot; never touches the network.
    Snapshot(PathBuf),
}

/// When the configured term list restricts results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TermPolicy {
    /// Filter only when at least one term was configured.
    #[default]
    WhenNonEmpty,
    /// Always filter; with no configured terms, the account page's term list
    /// is used instead.
    Always,
}

#[derive(Debug, Clone, Default)]
pub struct RepositoryOptions {
    pub terms: Vec<String>,
    pub term_policy: TermPolicy,
    pub row_policy: RowPolicy,
}

#[derive(Debug)]
pub struct CourseRepository<P> {
    source: CourseSource<P>,
    options: RepositoryOptions,
}

impl<P: PageSource> CourseRepository<P> {
    pub fn live(pages: P, options: RepositoryOptions) -> Self {
        Self {
            source: CourseSource::Live(pages),
            options,
        }
    }

    pub fn offline(snapshot: impl Into<PathBuf>, options: RepositoryOptions) -> Self {
        Self {
            source: CourseSource::Snapshot(snapshot.into()),
            options,
        }
    }

    pub fn list_terms(&self) -> Result<Vec<String>, GradeError> {
        match &self.source {
            CourseSource::Live(pages) => {
                let account = pages.fetch_page(ACCOUNT_ENDPOINT)?;
                Ok(extract::extract_terms(&account))
            }
            CourseSource::Snapshot(path) => {
                let mut terms: Vec<String> = Vec::new();
                for course in crate::snapshot::load(path)? {
                    if !terms.contains(&course.term) {
                        terms.push(course.term);
                    }
                }
                Ok(terms)
            }
        }
    }

    /// Every visible course, filtered by term. Courses whose page has no
    /// header are skipped.
    pub fn list_courses(&self, include_assignments: bool) -> Result<Vec<Course>, GradeError> {
        let (courses, filter) = match &self.source {
            CourseSource::Live(pages) => {
                let account = pages.fetch_page(ACCOUNT_ENDPOINT)?;
                let filter = self.term_filter(Some(&account))?;
                let refs = extract::extract_course_refs(&account);
                tracing::info!(courses = refs.len(), "found course links on account page");

                let mut courses = Vec::with_capacity(refs.len());
                for course_ref in refs {
                    match self.scrape_course(pages, &course_ref.course_id, include_assignments)? {
                        Some(course) => courses.push(course),
                        None => tracing::debug!(
                            course_id = %course_ref.course_id,
                            href = %course_ref.href,
                            "course page has no header; skipping"
                        ),
                    }
                }
                (courses, filter)
            }
            CourseSource::Snapshot(path) => {
                let mut courses = crate::snapshot::load(path)?;
                if !include_assignments {
                    for course in &mut courses {
                        course.assignments = None;
                    }
                }
                (courses, self.term_filter(None)?)
            }
        };

        Ok(match filter {
            Some(terms) => courses
                .into_iter()
                .filter(|course| terms.contains(&course.term))
                .collect(),
            None => courses,
        })
    }

    /// `Ok(None)` is "Course Not Found": no header, no such id in the
    /// snapshot, or a term outside the filter.
    pub fn get_course_info(&self, course_id: &str) -> Result<Option<Course>, GradeError> {
        let course = match &self.source {
            CourseSource::Live(pages) => self.scrape_course(pages, course_id, false)?,
            CourseSource::Snapshot(path) => crate::snapshot::load(path)?
                .into_iter()
                .find(|course| course.id == course_id)
                .map(|mut course| {
                    course.assignments = None;
                    course.categories = None;
                    course
                }),
        };

        let Some(course) = course else {
            return Ok(None);
        };
        match self.term_filter(None)? {
            Some(terms) if !terms.contains(&course.term) => {
                tracing::debug!(course_id, term = %course.term, "course term is filtered out");
                Ok(None)
            }
            _ => Ok(Some(course)),
        }
    }

    /// Assignments of one course; `Ok(None)` when the course is not visible.
    pub fn course_assignments(
        &self,
        course_id: &str,
    ) -> Result<Option<Vec<Assignment>>, GradeError> {
        match &self.source {
            CourseSource::Live(pages) => {
                let doc = pages.fetch_page(&course_endpoint(course_id))?;
                if extract::extract_course_header(&doc).is_none() {
                    return Ok(None);
                }
                extract::extract_assignments(&doc, self.options.row_policy).map(Some)
            }
            CourseSource::Snapshot(path) => Ok(crate::snapshot::load(path)?
                .into_iter()
                .find(|course| course.id == course_id)
                .map(|course| course.assignments.unwrap_or_default())),
        }
    }

    /// Id of the first course whose name contains `name` and whose term is
    /// exactly `term`.
    pub fn find_course_id(&self, name: &str, term: &str) -> Result<Option<String>, GradeError> {
        Ok(self
            .list_courses(false)?
            .into_iter()
            .find(|course| course.name.contains(name) && course.term == term)
            .map(|course| course.id))
    }

    pub fn dump_snapshot(&self, path: &Path, courses: &[Course]) -> Result<(), GradeError> {
        crate::snapshot::dump(path, courses)
    }

    fn scrape_course(
        &self,
        pages: &P,
        course_id: &str,
        include_assignments: bool,
    ) -> Result<Option<Course>, GradeError> {
        let doc = pages.fetch_page(&course_endpoint(course_id))?;
        let Some(header) = extract::extract_course_header(&doc) else {
            return Ok(None);
        };

        let assignments = if include_assignments {
            match extract::extract_assignments(&doc, self.options.row_policy) {
                Ok(assignments) => Some(assignments),
                Err(err @ GradeError::Parse { .. }) => {
                    tracing::warn!(course_id, %err, "course page has no assignment table");
                    None
                }
                Err(err) => return Err(err),
            }
        } else {
            None
        };

        Ok(Some(Course {
            id: course_id.to_owned(),
            name: header.name,
            term: header.term,
            assignments,
            categories: None,
        }))
    }

    /// Terms to keep, or `None` for no filtering. `account` is reused when the
    /// caller already fetched the account page.
    fn term_filter(&self, account: Option<&Html>) -> Result<Option<Vec<String>>, GradeError> {
        if !self.options.terms.is_empty() {
            return Ok(Some(self.options.terms.clone()));
        }
        if self.options.term_policy == TermPolicy::WhenNonEmpty {
            return Ok(None);
        }

        match (&self.source, account) {
            (CourseSource::Live(_), Some(account)) => Ok(Some(extract::extract_terms(account))),
            (CourseSource::Live(pages), None) => {
                let account = pages.fetch_page(ACCOUNT_ENDPOINT)?;
                Ok(Some(extract::extract_terms(&account)))
            }
            (CourseSource::Snapshot(_), _) => Ok(None),
        }
    }
}

fn course_endpoint(course_id: &str) -> String {
    format!("courses/{course_id}")
}
