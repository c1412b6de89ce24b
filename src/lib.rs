//! Course grade engine for the student dashboard: category and course
//! aggregation, target solving, and what-if projection over in-memory course
//! data, plus the JSON-lines sidecar protocol the dashboard drives it with.

pub mod calc;
pub mod categories;
pub mod ipc;
pub mod model;
pub mod settings;
pub mod summary;
