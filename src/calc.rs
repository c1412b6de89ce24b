use serde::Serialize;
use std::cmp::Ordering;

use crate::model::{AssignmentWithCategory, RoundingRule, TargetOutlook};

pub const LETTER_THRESHOLDS: [(&str, f64); 11] = [
    ("A", 93.0),
    ("A-", 90.0),
    ("B+", 87.0),
    ("B", 83.0),
    ("B-", 80.0),
    ("C+", 77.0),
    ("C", 73.0),
    ("C-", 70.0),
    ("D+", 67.0),
    ("D", 63.0),
    ("D-", 60.0),
];

pub const FAILING_LETTER: &str = "F";

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CalcError {}

pub fn sanitize_points(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

pub fn percentage(points_earned: f64, points_possible: f64) -> f64 {
    let possible = sanitize_points(points_possible);
    if possible <= 0.0 {
        return 0.0;
    }
    100.0 * sanitize_points(points_earned) / possible
}

pub fn letter_grade(percentage: f64) -> &'static str {
    LETTER_THRESHOLDS
        .iter()
        .find(|(_, min)| percentage >= *min)
        .map(|(letter, _)| *letter)
        .unwrap_or(FAILING_LETTER)
}

pub fn target_percentage_for_letter(letter: &str) -> Option<f64> {
    let wanted = letter.trim();
    LETTER_THRESHOLDS
        .iter()
        .find(|(l, _)| l.eq_ignore_ascii_case(wanted))
        .map(|(_, min)| *min)
}

// Absorbs float noise in `x * scale` only: a few ulps of the scaled value.
fn grid_tolerance(scaled: f64) -> f64 {
    scaled.abs().max(1.0) * f64::EPSILON * 8.0
}

pub fn round_grade(x: f64, rule: RoundingRule, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals.min(6) as i32);
    let scaled = x * scale;
    match rule {
        RoundingRule::None => x,
        RoundingRule::Nearest => (scaled + 0.5).floor() / scale,
        RoundingRule::Up => (scaled - grid_tolerance(scaled)).ceil() / scale,
        RoundingRule::Down => (scaled + grid_tolerance(scaled)).floor() / scale,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAverage {
    pub percentage: f64,
    pub counted: usize,
    pub dropped: Vec<usize>,
}

/// Points-weighted category grade after dropping the `drop_lowest` worst scores.
///
/// Completion state is ignored here; callers filter first when they need
/// completed-only grades. An empty remaining set grades as 0.
pub fn category_average<'a, I>(assignments: I, drop_lowest: usize) -> CategoryAverage
where
    I: IntoIterator<Item = &'a AssignmentWithCategory>,
{
    let mut scored: Vec<(usize, &AssignmentWithCategory, f64)> = assignments
        .into_iter()
        .enumerate()
        .map(|(i, a)| (i, a, a.percentage()))
        .collect();
    // Stable sort: equal scores keep input order, so drops are deterministic.
    scored.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));

    let drop = drop_lowest.min(scored.len());
    let dropped: Vec<usize> = scored[..drop].iter().map(|(i, _, _)| *i).collect();
    let kept = &scored[drop..];

    let mut earned = 0.0_f64;
    let mut possible = 0.0_f64;
    for (_, a, _) in kept {
        earned += a.earned();
        possible += a.possible();
    }

    let percentage = if kept.is_empty() || possible <= 0.0 {
        0.0
    } else {
        100.0 * earned / possible
    };

    CategoryAverage {
        percentage,
        counted: kept.len(),
        dropped,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPart {
    pub percentage: f64,
    pub weight: f64,
    pub extra_credit: bool,
}

pub fn course_average<I>(parts: I) -> f64
where
    I: IntoIterator<Item = WeightedPart>,
{
    let mut sum = 0.0_f64;
    let mut denom = 0.0_f64;
    let mut bonus = 0.0_f64;

    for p in parts {
        if !(p.weight.is_finite() && p.weight > 0.0) {
            continue;
        }
        if p.extra_credit {
            bonus += p.percentage * p.weight / 100.0;
        } else {
            sum += p.percentage * p.weight;
            denom += p.weight;
        }
    }

    let base = if denom > 0.0 { sum / denom } else { 0.0 };
    base + bonus
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSolution {
    pub needed_grade: Option<f64>,
    pub outlook: TargetOutlook,
}

/// Minimum average needed on remaining work, assuming every remaining
/// assignment scores the same.
pub fn solve_needed_grade(
    target: f64,
    current_grade: f64,
    completed_weight: f64,
    remaining_weight: f64,
) -> TargetSolution {
    if remaining_weight <= 0.0 {
        return if current_grade >= target {
            TargetSolution {
                needed_grade: None,
                outlook: TargetOutlook::Secured,
            }
        } else {
            TargetSolution {
                needed_grade: Some(target),
                outlook: TargetOutlook::Unreachable,
            }
        };
    }

    let raw = ((target - completed_weight) * 100.0) / remaining_weight;
    let outlook = if raw > 100.0 {
        TargetOutlook::Unreachable
    } else if raw <= 0.0 {
        TargetOutlook::Secured
    } else {
        TargetOutlook::OnTrack
    };

    TargetSolution {
        needed_grade: Some(raw.clamp(0.0, 100.0)),
        outlook,
    }
}
