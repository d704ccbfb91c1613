// JSON file helpers shared by the spec and history stores.
//
// Writes go to a temporary sibling which is then renamed over the target, so
// a crash mid-write never leaves a truncated file behind. There is no locking.

use crate::error::{DeployError, FileKind, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub(crate) fn read_json<T: DeserializeOwned>(kind: FileKind, path: &Path) -> Result<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DeployError::NotFound {
                kind,
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(DeployError::Io {
                action: "read",
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content).map_err(|e| DeployError::Parse {
        kind,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let io_err = |action: &'static str| {
        move |source: io::Error| DeployError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    };

    let content = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        .map_err(io_err("serialize"))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err("stage a temporary file for"))?;
    tmp.write_all(content.as_bytes())
        .map_err(io_err("write"))?;
    tmp.as_file().sync_all().map_err(io_err("sync"))?;

    // Keep the operator's permissions on files that already exist.
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(io_err("copy permissions onto"))?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .map_err(io_err("replace"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let value = json!({"b": 1, "a": [1, 2, 3]});

        write_json(&path, &value).unwrap();
        let back: Value = read_json(FileKind::Spec, &path).unwrap();
        assert_eq!(back, value);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"b\": 1"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let err = read_json::<Value>(FileKind::History, &path).unwrap_err();
        assert!(matches!(
            err,
            DeployError::NotFound {
                kind: FileKind::History,
                ..
            }
        ));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_json::<Value>(FileKind::Spec, &path).unwrap_err();
        assert!(matches!(err, DeployError::Parse { kind: FileKind::Spec, .. }));
    }

    #[test]
    fn overwrite_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        write_json(&path, &json!({"n": 1})).unwrap();
        write_json(&path, &json!({"n": 2})).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let back: Value = read_json(FileKind::Spec, &path).unwrap();
        assert_eq!(back["n"], 2);
    }
}
