use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::model::{
    AssignmentSource, AssignmentWithCategory, CourseGradeConfig, GradeCategory, GradingPolicies,
    UNCATEGORIZED_ID,
};

pub const DEFAULT_CATEGORIES: [(&str, f64); 4] = [
    ("Homework", 30.0),
    ("Quizzes", 20.0),
    ("Exams", 40.0),
    ("Participation", 10.0),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMatch {
    Exact(String),
    Partial(String),
    Uncategorized,
}

impl CategoryMatch {
    pub fn category_id(&self) -> &str {
        match self {
            CategoryMatch::Exact(id) | CategoryMatch::Partial(id) => id,
            CategoryMatch::Uncategorized => UNCATEGORIZED_ID,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CategoryMatch::Exact(_) => "exact",
            CategoryMatch::Partial(_) => "partial",
            CategoryMatch::Uncategorized => "uncategorized",
        }
    }
}

const MIN_PREFIX_LEN: usize = 3;

fn words(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn words_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.len() >= MIN_PREFIX_LEN && long.starts_with(short)
}

/// Maps an upstream group name onto a configured category.
///
/// An exact match compares names with case and punctuation removed; the first
/// in config order wins. A partial match needs every word of the shorter name
/// to equal, or be a prefix of at least three characters of, some word in the
/// longer name. Among partial matches the one sharing the most words wins, then
/// the category with fewer words, then config order. Anything else resolves to
/// `Uncategorized`.
pub fn resolve_category(group_name: Option<&str>, categories: &[GradeCategory]) -> CategoryMatch {
    let group = words(group_name.unwrap_or_default());
    if group.is_empty() {
        return CategoryMatch::Uncategorized;
    }
    let joined = group.concat();

    let named: Vec<(Vec<String>, &GradeCategory)> = categories
        .iter()
        .map(|c| (words(&c.name), c))
        .filter(|(w, _)| !w.is_empty())
        .collect();

    if let Some((_, c)) = named.iter().find(|(w, _)| w.concat() == joined) {
        return CategoryMatch::Exact(c.id.clone());
    }

    let mut best: Option<(usize, usize, &GradeCategory)> = None;
    for (name, c) in &named {
        let (short, long) = if name.len() <= group.len() {
            (name, &group)
        } else {
            (&group, name)
        };
        let covered = short
            .iter()
            .all(|w| long.iter().any(|other| words_match(w, other)));
        if !covered {
            continue;
        }
        let better = match best {
            None => true,
            Some((shared, len, _)) => {
                short.len() > shared || (short.len() == shared && name.len() < len)
            }
        };
        if better {
            best = Some((short.len(), name.len(), *c));
        }
    }
    match best {
        Some((_, _, c)) => CategoryMatch::Partial(c.id.clone()),
        None => CategoryMatch::Uncategorized,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamGroup {
    pub name: String,
    #[serde(default)]
    pub group_weight: Option<f64>,
}

fn new_category(name: &str, weight: f64) -> GradeCategory {
    GradeCategory {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        weight,
        drop_lowest: 0,
        extra_credit: false,
        color: None,
    }
}

pub fn default_config(
    course_id: &str,
    course_name: &str,
    groups: &[UpstreamGroup],
) -> CourseGradeConfig {
    let groups: Vec<&UpstreamGroup> = groups
        .iter()
        .filter(|g| !g.name.trim().is_empty())
        .collect();

    let categories: Vec<GradeCategory> = if groups.is_empty() {
        DEFAULT_CATEGORIES
            .iter()
            .map(|(name, weight)| new_category(name, *weight))
            .collect()
    } else {
        let weighted = groups
            .iter()
            .any(|g| g.group_weight.map(|w| w.is_finite() && w > 0.0).unwrap_or(false));
        let equal = 100.0 / groups.len() as f64;
        groups
            .iter()
            .map(|g| {
                let weight = if weighted {
                    g.group_weight.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(0.0)
                } else {
                    equal
                };
                new_category(g.name.trim(), weight)
            })
            .collect()
    };

    debug!(course_id, categories = categories.len(), "default grade config built");

    CourseGradeConfig {
        course_id: course_id.to_string(),
        course_name: course_name.to_string(),
        categories,
        manual_assignments: Vec::new(),
        target_grade: None,
        target_percentage: None,
        policies: GradingPolicies::default(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamAssignment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted: Option<bool>,
}

pub fn map_upstream_assignments(
    records: &[UpstreamAssignment],
    categories: &[GradeCategory],
) -> Vec<AssignmentWithCategory> {
    records
        .iter()
        .map(|r| {
            let matched = resolve_category(r.group_name.as_deref(), categories);
            AssignmentWithCategory {
                id: r.id.clone(),
                name: r.name.clone(),
                points_earned: r.score.unwrap_or(0.0),
                points_possible: r.points_possible.unwrap_or(0.0),
                category_id: matched.category_id().to_string(),
                due_date: r.due_at,
                completed: r.submitted.unwrap_or(r.score.is_some()),
                source: AssignmentSource::Canvas,
            }
        })
        .collect()
}
