//! Pre-accepting the assistant's trust dialog for the container workspace.
//!
//! The assistant keeps per-project state in `~/.claude.json` under `projects`,
//! keyed by absolute path. Inside the container the project always lives at
//! `/workspace`, so that entry is marked trusted and onboarded before launch.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};

use crate::mounts::CONTAINER_WORKSPACE;

fn ensure_object<'a>(obj: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = obj
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(m) => m,
        _ => unreachable!("entry was just replaced with an object"),
    }
}

/// Set the trust flags for `/workspace` in the assistant state file at `path`.
///
/// Returns `Ok(false)` without touching anything when the file does not exist.
/// A file that is not a JSON object is an `InvalidData` error and is left as is.
pub fn trust_workspace(path: &Path) -> io::Result<bool> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let mut doc: Value =
        serde_json::from_str(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let Some(root) = doc.as_object_mut() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "expected a JSON object at top level",
        ));
    };

    let projects = ensure_object(root, "projects");
    let project = ensure_object(projects, CONTAINER_WORKSPACE);
    project.insert("hasTrustDialogAccepted".to_string(), Value::Bool(true));
    project.insert("hasCompletedProjectOnboarding".to_string(), Value::Bool(true));

    let mut out = serde_json::to_string_pretty(&doc)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    out.push('\n');
    fs::write(path, out)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_flags_and_keeps_other_keys() {
        let td = tempfile::tempdir().expect("tmpdir");
        let p = td.path().join(".claude.json");
        fs::write(
            &p,
            r#"{"numStartups": 4, "projects": {"/workspace": {"allowedTools": ["x"]}, "/other": {}}}"#,
        )
        .unwrap();

        assert!(trust_workspace(&p).expect("trust"));

        let v: Value = serde_json::from_str(&fs::read_to_string(&p).unwrap()).unwrap();
        let ws = &v["projects"]["/workspace"];
        assert_eq!(ws["hasTrustDialogAccepted"], Value::Bool(true));
        assert_eq!(ws["hasCompletedProjectOnboarding"], Value::Bool(true));
        assert_eq!(ws["allowedTools"][0], "x");
        assert_eq!(v["numStartups"], 4);
        assert!(v["projects"]["/other"].is_object());
    }

    #[test]
    fn test_creates_projects_map() {
        let td = tempfile::tempdir().expect("tmpdir");
        let p = td.path().join(".claude.json");
        fs::write(&p, "{}").unwrap();
        assert!(trust_workspace(&p).expect("trust"));
        let v: Value = serde_json::from_str(&fs::read_to_string(&p).unwrap()).unwrap();
        assert_eq!(v["projects"]["/workspace"]["hasTrustDialogAccepted"], true);
    }

    #[test]
    fn test_absent_file_is_untouched() {
        let td = tempfile::tempdir().expect("tmpdir");
        let p = td.path().join(".claude.json");
        assert!(!trust_workspace(&p).expect("absent ok"));
        assert!(!p.exists());
    }

    #[test]
    fn test_malformed_file_is_error_and_unchanged() {
        let td = tempfile::tempdir().expect("tmpdir");
        let p = td.path().join(".claude.json");
        fs::write(&p, "{not json").unwrap();
        let err = trust_workspace(&p).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(fs::read_to_string(&p).unwrap(), "{not json");
    }
}
