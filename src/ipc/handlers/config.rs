use serde_json::json;

use super::{optional_param, required_param};
use crate::categories::{self, UpstreamAssignment, UpstreamGroup};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::model::GradeCategory;

fn handle_default(req: &Request) -> serde_json::Value {
    let course_id: String = match required_param(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_name: String = match optional_param(req, "courseName") {
        Ok(v) => v.unwrap_or_else(|| course_id.clone()),
        Err(resp) => return resp,
    };
    let groups: Vec<UpstreamGroup> = match optional_param(req, "groups") {
        Ok(v) => v.unwrap_or_default(),
        Err(resp) => return resp,
    };
    let config = categories::default_config(&course_id, &course_name, &groups);
    ok(&req.id, json!({ "config": config }))
}

fn handle_resolve(req: &Request) -> serde_json::Value {
    let group_name: Option<String> = match optional_param(req, "groupName") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cats: Vec<GradeCategory> = match required_param(req, "categories") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let matched = categories::resolve_category(group_name.as_deref(), &cats);
    ok(
        &req.id,
        json!({
            "categoryId": matched.category_id(),
            "match": matched.kind(),
        }),
    )
}

fn handle_map_assignments(req: &Request) -> serde_json::Value {
    let records: Vec<UpstreamAssignment> = match required_param(req, "records") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cats: Vec<GradeCategory> = match required_param(req, "categories") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignments = categories::map_upstream_assignments(&records, &cats);
    ok(&req.id, json!({ "assignments": assignments }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "config.default" => Some(handle_default(req)),
        "categories.resolve" => Some(handle_resolve(req)),
        "assignments.map" => Some(handle_map_assignments(req)),
        _ => None,
    }
}
