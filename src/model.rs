use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calc;

pub const UNCATEGORIZED_ID: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCategory {
    pub id: String,
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub drop_lowest: usize,
    #[serde(default)]
    pub extra_credit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl GradeCategory {
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentSource {
    #[default]
    Canvas,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentWithCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub points_earned: f64,
    #[serde(default)]
    pub points_possible: f64,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub source: AssignmentSource,
}

impl AssignmentWithCategory {
    pub fn earned(&self) -> f64 {
        calc::sanitize_points(self.points_earned)
    }

    pub fn possible(&self) -> f64 {
        calc::sanitize_points(self.points_possible)
    }

    pub fn percentage(&self) -> f64 {
        calc::percentage(self.points_earned, self.points_possible)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssignment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub points_earned: f64,
    #[serde(default)]
    pub points_possible: f64,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

impl ManualAssignment {
    pub fn to_assignment(&self) -> AssignmentWithCategory {
        AssignmentWithCategory {
            id: self.id.clone(),
            name: self.name.clone(),
            points_earned: self.points_earned,
            points_possible: self.points_possible,
            category_id: self.category_id.clone(),
            due_date: self.due_date,
            completed: self.completed,
            source: AssignmentSource::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingRule {
    #[default]
    None,
    Nearest,
    Up,
    Down,
}

fn default_rounding_decimals() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingPolicies {
    #[serde(default)]
    pub rounding_rule: RoundingRule,
    #[serde(default = "default_rounding_decimals")]
    pub rounding_decimals: u32,
    #[serde(default)]
    pub drop_lowest_count: usize,
}

impl Default for GradingPolicies {
    fn default() -> Self {
        Self {
            rounding_rule: RoundingRule::None,
            rounding_decimals: default_rounding_decimals(),
            drop_lowest_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGradeConfig {
    pub course_id: String,
    pub course_name: String,
    pub categories: Vec<GradeCategory>,
    #[serde(default)]
    pub manual_assignments: Vec<ManualAssignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_percentage: Option<f64>,
    #[serde(default)]
    pub policies: GradingPolicies,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAssignment {
    #[serde(flatten)]
    pub assignment: AssignmentWithCategory,
    pub percentage: f64,
    pub dropped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBreakdown {
    pub category_id: String,
    pub category_name: String,
    pub weight: f64,
    pub extra_credit: bool,
    pub current_percentage: f64,
    pub weighted_contribution: f64,
    pub completed_percentage: f64,
    pub assignments: Vec<GradedAssignment>,
    pub dropped_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetOutlook {
    Secured,
    OnTrack,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGradeSummary {
    pub course_id: String,
    pub course_name: String,
    pub current_grade: f64,
    pub display_grade: f64,
    pub letter_grade: &'static str,
    pub target_grade: Option<String>,
    pub target_percentage: Option<f64>,
    pub progress_to_target: Option<f64>,
    pub needed_grade: Option<f64>,
    pub target_outlook: Option<TargetOutlook>,
    pub breakdown: Vec<GradeBreakdown>,
    pub uncategorized: Vec<GradedAssignment>,
    pub assignments_completed: usize,
    pub assignments_remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfProjection {
    pub course_id: String,
    pub base_grade: f64,
    pub projected_grade: f64,
    pub delta: f64,
    pub projected: CourseGradeSummary,
    pub overrides_applied: usize,
    pub unknown_overrides: Vec<String>,
}
