//! Save-target helpers: suggested names and save-path normalization.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, TimeZone};
use xlm_types::SourceFile;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Identity used in generated names when no source folder is known.
const FALLBACK_IDENTITY: &str = "workbook";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// The name proposed to the controller in the save request.
///
/// A non-blank controller-supplied name wins and gets the default extension
/// if it has none. Otherwise a name of the form
/// `<prefix>_<identity>_<timestamp>.<ext>` is generated, where identity is the
/// folder holding the first source file.
pub fn suggested_name<Tz>(
    config: &EngineConfig,
    supplied: Option<&str>,
    files: &[SourceFile],
    now: DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if let Some(name) = supplied.map(str::trim).filter(|n| !n.is_empty()) {
        return with_default_extension(name, config.extension());
    }
    let identity = files
        .first()
        .and_then(|f| f.path().parent())
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_IDENTITY.to_string());
    format!(
        "{}_{}_{}.{}",
        config.suggested_name_prefix,
        identity,
        now.format(TIMESTAMP_FORMAT),
        config.extension()
    )
}

/// Append `.ext` when `name` has no extension.
pub fn with_default_extension(name: &str, ext: &str) -> String {
    if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}.{ext}")
    }
}

/// Turn the controller's reply into an absolute save target.
///
/// Separators are unified, `.` and `..` are collapsed lexically, relative
/// paths are resolved against `cwd`, and `default_ext` is appended when the
/// file name has no extension.
pub fn normalize_save_path(raw: &str, default_ext: &str, cwd: &Path) -> EngineResult<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidSavePath {
            path: raw.to_string(),
            reason: "path is empty".into(),
        });
    }

    let unified: String = trimmed
        .chars()
        .map(|c| if c == '/' || c == '\\' { std::path::MAIN_SEPARATOR } else { c })
        .collect();
    let candidate = Path::new(&unified);
    let absolute = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        cwd.join(candidate)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` above the root stays at the root.
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other),
        }
    }

    let file_name = normalized
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| EngineError::InvalidSavePath {
            path: raw.to_string(),
            reason: "path does not name a file".into(),
        })?;
    if normalized.extension().is_none() {
        normalized.set_file_name(format!("{file_name}.{default_ext}"));
    }
    Ok(normalized)
}

/// Fail unless the directory that will hold `path` exists.
pub fn ensure_parent_exists(path: &Path) -> EngineResult<()> {
    match path.parent() {
        Some(parent) if parent.is_dir() => Ok(()),
        Some(parent) => Err(EngineError::InvalidSavePath {
            path: path.display().to_string(),
            reason: format!("directory {} does not exist", parent.display()),
        }),
        None => Err(EngineError::InvalidSavePath {
            path: path.display().to_string(),
            reason: "path has no parent directory".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 12, 30, 5).unwrap()
    }

    #[test]
    fn generated_name_uses_first_file_folder() {
        let files = vec![
            SourceFile::new("/reports/q1/a.xlsx"),
            SourceFile::new("/other/b.xlsx"),
        ];
        let name = suggested_name(&EngineConfig::default(), None, &files, at_noon());
        assert_eq!(name, "merged_q1_20240102_123005.xlsx");
    }

    #[test]
    fn generated_name_without_folder() {
        let files = vec![SourceFile::new("a.xlsx")];
        let name = suggested_name(&EngineConfig::default(), None, &files, at_noon());
        assert_eq!(name, "merged_workbook_20240102_123005.xlsx");
    }

    #[test]
    fn supplied_name_wins() {
        let config = EngineConfig::default();
        assert_eq!(
            suggested_name(&config, Some("Quarterly"), &[], at_noon()),
            "Quarterly.xlsx"
        );
        assert_eq!(
            suggested_name(&config, Some("Quarterly.xlsm"), &[], at_noon()),
            "Quarterly.xlsm"
        );
        assert_eq!(
            suggested_name(&config, Some("   "), &[], at_noon()),
            "merged_workbook_20240102_123005.xlsx"
        );
    }

    #[cfg(unix)]
    #[test]
    fn normalizes_separators_and_dots() {
        let cwd = Path::new("/home/user");
        let path = normalize_save_path("out\\.\\sub/../merged", "xlsx", cwd).unwrap();
        assert_eq!(path, PathBuf::from("/home/user/out/merged.xlsx"));
    }

    #[cfg(unix)]
    #[test]
    fn absolute_path_keeps_extension() {
        let path = normalize_save_path(" /tmp/a/b.xlsb ", "xlsx", Path::new("/x")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/a/b.xlsb"));
    }

    #[cfg(unix)]
    #[test]
    fn parent_above_root_is_clamped() {
        let path = normalize_save_path("/../../m.xlsx", "xlsx", Path::new("/")).unwrap();
        assert_eq!(path, PathBuf::from("/m.xlsx"));
    }

    #[test]
    fn empty_or_dirless_paths_rejected() {
        let cwd = Path::new("/");
        assert!(matches!(
            normalize_save_path("  ", "xlsx", cwd),
            Err(EngineError::InvalidSavePath { .. })
        ));
        assert!(matches!(
            normalize_save_path("/", "xlsx", cwd),
            Err(EngineError::InvalidSavePath { .. })
        ));
    }

    #[test]
    fn parent_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_parent_exists(&dir.path().join("m.xlsx")).is_ok());
        let err = ensure_parent_exists(&dir.path().join("missing/m.xlsx")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSavePath { .. }));
    }
}
