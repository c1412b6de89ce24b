use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

use super::{optional_param, required_param};
use crate::calc;
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{AssignmentWithCategory, CourseGradeConfig};
use crate::summary;

const SUMMARIES_MAX_COURSES: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseInput {
    config: CourseGradeConfig,
    #[serde(default)]
    assignments: Vec<AssignmentWithCategory>,
}

fn handle_letter(req: &Request) -> serde_json::Value {
    let percentage: f64 = match required_param(req, "percentage") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({ "percentage": percentage, "letterGrade": calc::letter_grade(percentage) }),
    )
}

fn handle_target_for_letter(req: &Request) -> serde_json::Value {
    let letter: String = match required_param(req, "letter") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "letter": letter,
            "targetPercentage": calc::target_percentage_for_letter(&letter),
        }),
    )
}

fn handle_summary(req: &Request) -> serde_json::Value {
    let config: CourseGradeConfig = match required_param(req, "config") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignments: Vec<AssignmentWithCategory> = match optional_param(req, "assignments") {
        Ok(v) => v.unwrap_or_default(),
        Err(resp) => return resp,
    };
    match summary::build_summary(&config, &assignments) {
        Ok(s) => ok(&req.id, json!(s)),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_summaries(req: &Request) -> serde_json::Value {
    let courses: Vec<CourseInput> = match required_param(req, "courses") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if courses.len() > SUMMARIES_MAX_COURSES {
        return err(
            &req.id,
            "bad_params",
            format!("at most {} courses per request", SUMMARIES_MAX_COURSES),
            Some(json!({ "count": courses.len() })),
        );
    }

    let mut summaries = Vec::with_capacity(courses.len());
    let mut errors = Vec::new();
    for course in &courses {
        match summary::build_summary(&course.config, &course.assignments) {
            Ok(s) => summaries.push(s),
            Err(e) => {
                warn!(course_id = %course.config.course_id, error = %e, "course summary failed");
                errors.push(json!({
                    "courseId": course.config.course_id,
                    "error": e,
                }));
            }
        }
    }
    ok(&req.id, json!({ "summaries": summaries, "errors": errors }))
}

fn handle_what_if(req: &Request) -> serde_json::Value {
    let config: CourseGradeConfig = match required_param(req, "config") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignments: Vec<AssignmentWithCategory> = match optional_param(req, "assignments") {
        Ok(v) => v.unwrap_or_default(),
        Err(resp) => return resp,
    };
    let overrides: HashMap<String, f64> = match required_param(req, "overrides") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match summary::project_what_if(&config, &assignments, &overrides) {
        Ok(p) => ok(&req.id, json!(p)),
        Err(e) => calc_err(&req.id, e),
    }
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.letter" => Some(handle_letter(req)),
        "grades.targetForLetter" => Some(handle_target_for_letter(req)),
        "grades.summary" => Some(handle_summary(req)),
        "grades.summaries" => Some(handle_summaries(req)),
        "grades.whatIf" => Some(handle_what_if(req)),
        _ => None,
    }
}
