//! Where the list of packages to fix comes from.

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Packages whose requirements use misnamed python names.
const MISNAMED_REQUIRES_QUERY: &str =
    "SELECT name FROM packages WHERE require_misnamed = 1 ORDER BY name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// A portingdb SQLite database.
    Database(PathBuf),
    /// A text file with one package name per line.
    File(PathBuf),
}

impl CandidateSource {
    pub fn load<R: Runtime>(&self, runtime: &R) -> Result<Vec<String>> {
        let names = match self {
            CandidateSource::Database(path) => load_from_database(path)?,
            CandidateSource::File(path) => {
                let text = runtime
                    .read_to_string(path)
                    .with_context(|| format!("Failed to read package list {:?}", path))?;
                parse_package_list(&text)
            }
        };
        debug!("Loaded {} candidate(s) from {:?}", names.len(), self);
        Ok(names)
    }
}

/// One name per line; blank lines are skipped.
pub fn parse_package_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn load_from_database(path: &Path) -> Result<Vec<String>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open database {:?}", path))?;
    let mut stmt = conn
        .prepare(MISNAMED_REQUIRES_QUERY)
        .context("Failed to query packages with misnamed requires")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_parse_package_list() {
        assert_eq!(
            parse_package_list("foo\n\n  bar  \r\nbaz"),
            vec!["foo", "bar", "baz"]
        );
        assert!(parse_package_list("").is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/tmp/pkgs.txt")))
            .returning(|_| Ok("python-foo\npython-bar\n".to_string()));

        let names = CandidateSource::File(PathBuf::from("/tmp/pkgs.txt"))
            .load(&runtime)
            .unwrap();
        assert_eq!(names, vec!["python-foo", "python-bar"]);
    }

    #[test]
    fn test_load_from_database() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("portingdb.sqlite");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE packages (name TEXT PRIMARY KEY, require_misnamed INTEGER NOT NULL);
             INSERT INTO packages VALUES ('zope', 1), ('attr', 0), ('bottle', 1);",
        )
        .unwrap();
        drop(conn);

        let names = CandidateSource::Database(db).load(&RealRuntime).unwrap();
        assert_eq!(names, vec!["bottle", "zope"]);
    }

    #[test]
    fn test_load_from_missing_database() {
        let dir = tempdir().unwrap();
        let result = CandidateSource::Database(dir.path().join("nope.sqlite")).load(&RealRuntime);
        assert!(result.is_err());
    }
}
