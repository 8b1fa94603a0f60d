//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `fs` - File system operations (read, write, directories, glob)
//! - `process` - Running external programs

mod fs;
mod process;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use process::{Invocation, ProcessOutput};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;

    /// Files directly inside `dir` whose name matches the glob `pattern`,
    /// sorted by path.
    fn glob(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Create a fresh directory under the system temp dir. The directory is
    /// kept after the process exits.
    fn create_temp_dir(&self, prefix: &str) -> Result<PathBuf>;

    // Processes
    /// Run a program to completion and capture its output.
    /// A non-zero exit status is not an error here; only failing to start is.
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn glob(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(dir, pattern)
    }

    fn create_temp_dir(&self, prefix: &str) -> Result<PathBuf> {
        self.create_temp_dir_impl(prefix)
    }

    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.run_impl(invocation)
    }
}
