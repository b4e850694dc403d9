use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{ExecutionError, ExecutionResult};

/// Append-only audit log of applied renames, one op per line.
///
/// Lines are `<kind>\t<original qualified name>\t<generated name>`, which is
/// enough to build the reverse mapping by hand.
#[derive(Debug, Clone)]
pub struct PlanLog {
    path: PathBuf,
}

impl PlanLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append<I, S>(&self, lines: I) -> ExecutionResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wrap = |source| ExecutionError::File {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(wrap)?;

        let mut buffer = String::new();
        for line in lines {
            buffer.push_str(line.as_ref());
            buffer.push('\n');
        }
        file.write_all(buffer.as_bytes()).map_err(wrap)?;
        file.flush().map_err(wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let log = PlanLog::new(dir.path().join("renames.log"));

        log.append(["table\tpublic.users\ttable_a"]).unwrap();
        log.append(vec!["column\tpublic.users.id\tcolumn1".to_string()])
            .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            "table\tpublic.users\ttable_a\ncolumn\tpublic.users.id\tcolumn1\n"
        );
    }

    #[test]
    fn reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let log = PlanLog::new(dir.path().join("missing").join("renames.log"));
        let err = log.append(["x"]).unwrap_err();
        assert!(matches!(err, ExecutionError::File { .. }));
    }
}
