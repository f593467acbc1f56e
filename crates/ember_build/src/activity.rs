//! Derivation of the user-facing activity list.

use std::path::Path;

use ember_common::SourceKind;

/// Turns scheduler job names into the list shown to the user.
///
/// Jobs for compilable sources read `Compile <name>`. Housekeeping jobs,
/// whose names start with `__`, are dropped. Other names pass through.
pub fn activity_list(job_names: &[String]) -> Vec<String> {
    job_names
        .iter()
        .filter_map(|name| {
            if name.starts_with("__") {
                None
            } else if SourceKind::of(Path::new(name)).is_translation_unit() {
                Some(format!("Compile {name}"))
            } else {
                Some(name.clone())
            }
        })
        .collect()
}
