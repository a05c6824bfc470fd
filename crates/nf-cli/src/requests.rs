use std::fs;
use std::path::Path;

use nf_core::{load_records, FilterPrefs, RequestRecord};

pub fn read_records(path: &Path) -> Result<Vec<RequestRecord>, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    load_records(&text)
        .map_err(|e| format!("Failed to load requests from '{}': {}", path.display(), e))
}

pub fn read_prefs(path: Option<&Path>) -> Result<FilterPrefs, String> {
    let Some(path) = path else {
        return Ok(FilterPrefs::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    FilterPrefs::from_json(&text)
        .map_err(|e| format!("Invalid prefs '{}': {}", path.display(), e))
}
