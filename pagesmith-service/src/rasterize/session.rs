//! Per-call temporary file namespace.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Filesystem namespace for one conversion call.
///
/// Every path is derived from a fresh uuid, so two concurrent sessions can
/// never collide and the cleanup pass of one can never touch another's
/// artifacts.
pub(super) struct TempSession {
    id: String,
    temp_dir: PathBuf,
}

impl TempSession {
    pub(super) fn new(temp_dir: &Path) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            temp_dir: temp_dir.to_path_buf(),
        }
    }

    pub(super) fn id(&self) -> &str {
        &self.id
    }

    /// Path the input document is written to.
    pub(super) fn input_path(&self) -> PathBuf {
        self.temp_dir.join(format!("doc_{}.pdf", self.id))
    }

    /// Output prefix handed to the tool; it appends `-<page>.png`.
    pub(super) fn output_prefix(&self) -> PathBuf {
        self.temp_dir.join(format!("page_{}", self.id))
    }

    /// List this session's output files, ordered by ascending numeric page
    /// suffix. Page 10 must sort after page 2, so the suffix is parsed
    /// rather than compared lexicographically. A suffix that does not parse
    /// is fatal: silently treating it as page 0 would misorder the result
    /// if the tool's naming convention ever changed.
    pub(super) fn discover_outputs(&self) -> ServiceResult<Vec<(u32, PathBuf)>> {
        let marker = format!("page_{}-", self.id);

        let mut pages = Vec::new();
        for entry in fs::read_dir(&self.temp_dir).map_err(ServiceError::Io)? {
            let entry = entry.map_err(ServiceError::Io)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(rest) = name.strip_prefix(&marker) else {
                continue;
            };
            let suffix = rest.strip_suffix(".png").unwrap_or(rest);
            let page_number =
                suffix
                    .parse::<u32>()
                    .map_err(|_| ServiceError::RasterizationFailed {
                        detail: format!("unrecognized page suffix in output file {name}"),
                    })?;
            pages.push((page_number, entry.path()));
        }

        pages.sort_unstable_by_key(|(page_number, _)| *page_number);
        Ok(pages)
    }

    /// Best-effort removal of every artifact this session may have created.
    /// Failures are logged and swallowed so they cannot mask the error that
    /// led here.
    pub(super) fn cleanup(&self) {
        remove_quietly(&self.input_path());

        let marker = format!("page_{}-", self.id);
        let entries = match fs::read_dir(&self.temp_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.temp_dir.display(), error = %e, "Temp directory scan failed during cleanup");
                return;
            }
        };
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().starts_with(&marker) {
                remove_quietly(&entry.path());
            }
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Failed to remove temp artifact");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn paths_are_namespaced_by_session_id() {
        let dir = TempDir::new().unwrap();
        let a = TempSession::new(dir.path());
        let b = TempSession::new(dir.path());

        assert_ne!(a.id(), b.id());
        assert_ne!(a.input_path(), b.input_path());
        assert_ne!(a.output_prefix(), b.output_prefix());
        assert!(
            a.input_path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .contains(a.id())
        );
    }

    #[test]
    fn discovery_sorts_numerically_and_skips_other_sessions() {
        let dir = TempDir::new().unwrap();
        let session = TempSession::new(dir.path());
        let prefix = session.output_prefix();
        let prefix = prefix.to_string_lossy();

        for page in [3, 1, 12] {
            fs::write(format!("{prefix}-{page}.png"), b"x").unwrap();
        }
        fs::write(dir.path().join("page_other-1.png"), b"x").unwrap();

        let pages = session.discover_outputs().unwrap();
        let numbers: Vec<u32> = pages.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 3, 12]);
    }

    #[test]
    fn discovery_handles_zero_padded_suffixes() {
        let dir = TempDir::new().unwrap();
        let session = TempSession::new(dir.path());
        let prefix = session.output_prefix();
        let prefix = prefix.to_string_lossy();

        // pdftoppm zero-pads suffixes on documents with 10+ pages.
        for suffix in ["01", "02", "10"] {
            fs::write(format!("{prefix}-{suffix}.png"), b"x").unwrap();
        }

        let pages = session.discover_outputs().unwrap();
        let numbers: Vec<u32> = pages.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[test]
    fn cleanup_removes_only_own_artifacts() {
        let dir = TempDir::new().unwrap();
        let session = TempSession::new(dir.path());
        let prefix = session.output_prefix();

        fs::write(session.input_path(), b"pdf").unwrap();
        fs::write(format!("{}-1.png", prefix.to_string_lossy()), b"x").unwrap();
        let foreign = dir.path().join("page_other-1.png");
        fs::write(&foreign, b"x").unwrap();

        session.cleanup();

        assert!(!session.input_path().exists());
        assert!(foreign.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let session = TempSession::new(dir.path());

        // Nothing was ever written; both passes are no-ops.
        session.cleanup();
        session.cleanup();
    }
}
