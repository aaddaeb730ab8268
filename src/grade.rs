use serde::Serialize;

use crate::error::GradeError;
use crate::formats::{Assignment, SubmissionStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGrade {
    pub category: String,
    pub weight: f64,
    pub earned: f64,
    pub possible: f64,
    /// False when no graded assignment with possible points matched.
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub grade: f64,
    pub total_weight: f64,
    pub categories: Vec<CategoryGrade>,
}

/// Weighted course grade as a fraction (0.86 for 86%).
pub fn compute_grade(
    assignments: &[Assignment],
    weights: &[(String, f64)],
) -> Result<f64, GradeError> {
    grade_breakdown(assignments, weights).map(|report| report.grade)
}

/// Sums earned/possible per category, where an assignment belongs to every
/// category whose label occurs in its name. Categories without possible
/// points are left out of the weight total.
pub fn grade_breakdown(
    assignments: &[Assignment],
    weights: &[(String, f64)],
) -> Result<GradeReport, GradeError> {
    let mut categories = Vec::with_capacity(weights.len());
    let mut total_weight = 0.0_f64;
    let mut weighted_score = 0.0_f64;

    for (category, weight) in weights {
        let (earned, possible) = assignments
            .iter()
            .filter(|assignment| assignment.submission_status == SubmissionStatus::Graded)
            .filter(|assignment| assignment.name.contains(category.as_str()))
            .filter_map(|assignment| assignment.score)
            .fold((0.0, 0.0), |(earned, possible), score| {
                (earned + score.earned, possible + score.possible)
            });

        let included = possible != 0.0;
        if included {
            total_weight += *weight;
            weighted_score += *weight * earned / possible;
        } else {
            tracing::warn!(
                category = %category,
                weight,
                "no graded assignment matches category; excluding it from the grade"
            );
        }

        categories.push(CategoryGrade {
            category: category.clone(),
            weight: *weight,
            earned,
            possible,
            included,
        });
    }

    if total_weight == 0.0 {
        return Err(GradeError::NoGradableAssignments {
            categories: weights.iter().map(|(category, _)| category.clone()).collect(),
        });
    }

    Ok(GradeReport {
        grade: weighted_score / total_weight,
        total_weight,
        categories,
    })
}
