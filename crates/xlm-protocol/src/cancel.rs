use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A cancel-flag file shared by controller and worker.
///
/// The flag's mere existence signals cancellation; its contents are ignored.
/// The controller raises it, the worker only ever checks it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelFlag {
    path: PathBuf,
}

impl CancelFlag {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether cancellation has been requested.
    pub fn is_raised(&self) -> bool {
        self.path.exists()
    }

    /// Request cancellation. Raising an already-raised flag is a no-op.
    pub fn raise(&self) -> io::Result<()> {
        if self.is_raised() {
            return Ok(());
        }
        fs::write(&self.path, b"1")
    }

    /// Remove the flag, if present.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let flag = CancelFlag::new(dir.path().join("cancel.flag"));
        assert!(!flag.is_raised());

        flag.raise().unwrap();
        assert!(flag.is_raised());
        flag.raise().unwrap();

        flag.clear().unwrap();
        assert!(!flag.is_raised());
        flag.clear().unwrap();
    }
}
