use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::calc::{self, CalcError, WeightedPart};
use crate::model::{
    AssignmentWithCategory, CourseGradeConfig, CourseGradeSummary, GradeBreakdown,
    GradedAssignment, WhatIfProjection, UNCATEGORIZED_ID,
};

pub fn validate_config(config: &CourseGradeConfig) -> Result<(), CalcError> {
    if config.categories.is_empty() {
        return Err(
            CalcError::new("bad_config", "course config must define at least one category")
                .with_details(json!({ "courseId": config.course_id })),
        );
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for c in &config.categories {
        if c.id == UNCATEGORIZED_ID {
            return Err(CalcError::new(
                "bad_config",
                format!("category id '{}' is reserved", UNCATEGORIZED_ID),
            )
            .with_details(json!({ "courseId": config.course_id, "categoryId": c.id })));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(CalcError::new("bad_config", "duplicate category id")
                .with_details(json!({ "courseId": config.course_id, "categoryId": c.id })));
        }
    }
    Ok(())
}

/// Effective target: an explicit positive percentage, else a known letter.
pub fn resolve_target(config: &CourseGradeConfig) -> Option<f64> {
    if let Some(p) = config.target_percentage {
        if p.is_finite() && p > 0.0 {
            return Some(p);
        }
    }
    let letter = config.target_grade.as_deref()?;
    let resolved = calc::target_percentage_for_letter(letter);
    if resolved.is_none() {
        debug!(course_id = %config.course_id, letter, "target letter not in table; no target");
    }
    resolved
}

pub fn merged_assignments(
    config: &CourseGradeConfig,
    upstream: &[AssignmentWithCategory],
) -> Vec<AssignmentWithCategory> {
    let mut out = Vec::with_capacity(upstream.len() + config.manual_assignments.len());
    out.extend(upstream.iter().cloned());
    out.extend(config.manual_assignments.iter().map(|m| m.to_assignment()));
    out
}

pub fn build_summary(
    config: &CourseGradeConfig,
    upstream: &[AssignmentWithCategory],
) -> Result<CourseGradeSummary, CalcError> {
    validate_config(config)?;
    let merged = merged_assignments(config, upstream);
    Ok(summarize(config, &merged, true))
}

// `log_integrity` is false for passes over data that was already reported.
fn summarize(
    config: &CourseGradeConfig,
    assignments: &[AssignmentWithCategory],
    log_integrity: bool,
) -> CourseGradeSummary {
    let extra_drop = config.policies.drop_lowest_count;
    let mut breakdown: Vec<GradeBreakdown> = Vec::with_capacity(config.categories.len());
    let mut completed_weight = 0.0_f64;
    let mut remaining_weight = 0.0_f64;

    for category in &config.categories {
        let weight = category.effective_weight();
        if log_integrity && weight == 0.0 && category.weight != 0.0 {
            warn!(
                course_id = %config.course_id,
                category_id = %category.id,
                weight = category.weight,
                "invalid category weight treated as 0"
            );
        }

        let members: Vec<&AssignmentWithCategory> = assignments
            .iter()
            .filter(|a| a.category_id == category.id)
            .collect();
        let drop = category.drop_lowest.saturating_add(extra_drop);

        let current = calc::category_average(members.iter().copied(), drop);
        let completed_only =
            calc::category_average(members.iter().copied().filter(|a| a.completed), drop);

        completed_weight += completed_only.percentage * weight / 100.0;
        if !category.extra_credit && members.iter().any(|a| !a.completed) {
            remaining_weight += weight;
        }

        let graded: Vec<GradedAssignment> = members
            .iter()
            .enumerate()
            .map(|(i, a)| GradedAssignment {
                assignment: (*a).clone(),
                percentage: a.percentage(),
                dropped: current.dropped.contains(&i),
            })
            .collect();

        breakdown.push(GradeBreakdown {
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            weight,
            extra_credit: category.extra_credit,
            current_percentage: current.percentage,
            weighted_contribution: current.percentage * weight / 100.0,
            completed_percentage: completed_only.percentage,
            assignments: graded,
            dropped_count: current.dropped.len(),
        });
    }

    let known: HashSet<&str> = config.categories.iter().map(|c| c.id.as_str()).collect();
    let uncategorized: Vec<GradedAssignment> = assignments
        .iter()
        .filter(|a| !known.contains(a.category_id.as_str()))
        .map(|a| GradedAssignment {
            assignment: a.clone(),
            percentage: a.percentage(),
            dropped: false,
        })
        .collect();
    if log_integrity && !uncategorized.is_empty() {
        warn!(
            course_id = %config.course_id,
            count = uncategorized.len(),
            "assignments reference unknown categories; excluded from the course grade"
        );
    }

    let current_grade = calc::course_average(breakdown.iter().map(|b| WeightedPart {
        percentage: b.current_percentage,
        weight: b.weight,
        extra_credit: b.extra_credit,
    }));

    let target_percentage = resolve_target(config);
    let (progress_to_target, needed_grade, target_outlook) = match target_percentage {
        Some(target) => {
            let solution =
                calc::solve_needed_grade(target, current_grade, completed_weight, remaining_weight);
            (
                Some(current_grade / target * 100.0),
                solution.needed_grade,
                Some(solution.outlook),
            )
        }
        None => (None, None, None),
    };

    let assignments_completed = assignments.iter().filter(|a| a.completed).count();
    let assignments_remaining = assignments.len() - assignments_completed;

    debug!(
        course_id = %config.course_id,
        current_grade,
        completed_weight,
        remaining_weight,
        "course grade computed"
    );

    CourseGradeSummary {
        course_id: config.course_id.clone(),
        course_name: config.course_name.clone(),
        current_grade,
        display_grade: calc::round_grade(
            current_grade,
            config.policies.rounding_rule,
            config.policies.rounding_decimals,
        ),
        letter_grade: calc::letter_grade(current_grade),
        target_grade: config.target_grade.clone(),
        target_percentage,
        progress_to_target,
        needed_grade,
        target_outlook,
        breakdown,
        uncategorized,
        assignments_completed,
        assignments_remaining,
    }
}

/// Copies `assignments`, rederiving `points_earned` from the override
/// percentage for every overridden id. Points possible never change.
pub fn apply_overrides(
    assignments: &[AssignmentWithCategory],
    overrides: &HashMap<String, f64>,
) -> Vec<AssignmentWithCategory> {
    assignments
        .iter()
        .map(|a| match overrides.get(&a.id) {
            Some(pct) => {
                let mut projected = a.clone();
                projected.points_earned = pct / 100.0 * a.possible();
                projected
            }
            None => a.clone(),
        })
        .collect()
}

pub fn project_what_if(
    config: &CourseGradeConfig,
    upstream: &[AssignmentWithCategory],
    overrides: &HashMap<String, f64>,
) -> Result<WhatIfProjection, CalcError> {
    validate_config(config)?;
    for (id, pct) in overrides {
        if !pct.is_finite() || *pct < 0.0 {
            return Err(
                CalcError::new("bad_params", "override percentages must be finite and >= 0")
                    .with_details(json!({ "assignmentId": id })),
            );
        }
    }

    let merged = merged_assignments(config, upstream);
    let known: HashSet<&str> = merged.iter().map(|a| a.id.as_str()).collect();
    let mut unknown_overrides: Vec<String> = overrides
        .keys()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect();
    unknown_overrides.sort();
    let overrides_applied = merged.iter().filter(|a| overrides.contains_key(&a.id)).count();

    let base = summarize(config, &merged, true);
    let projected = summarize(config, &apply_overrides(&merged, overrides), false);

    debug!(
        course_id = %config.course_id,
        base = base.current_grade,
        projected = projected.current_grade,
        overrides_applied,
        "what-if projection"
    );

    Ok(WhatIfProjection {
        course_id: config.course_id.clone(),
        base_grade: base.current_grade,
        projected_grade: projected.current_grade,
        delta: projected.current_grade - base.current_grade,
        projected,
        overrides_applied,
        unknown_overrides,
    })
}
