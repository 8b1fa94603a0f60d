//! Thin wrappers around the external programs the workflow drives.
//!
//! Every call goes through [`Runtime::run`], so tests can script the
//! programs' output with a mock runtime.

pub mod git;
pub mod packaging;

use anyhow::Result;
use log::debug;

use crate::runtime::{Invocation, ProcessOutput, Runtime};

/// An external program exited unsuccessfully.
#[derive(Debug)]
pub struct ToolError {
    pub program: String,
    pub command: String,
    pub code: Option<i32>,
    pub output: String,
}

impl ToolError {
    pub fn new(invocation: &Invocation, output: &ProcessOutput) -> Self {
        Self {
            program: invocation.program.clone(),
            command: invocation.to_string(),
            code: output.code,
            output: output.combined(),
        }
    }

    /// Case-insensitive search in the captured output.
    pub fn output_contains(&self, needle: &str) -> bool {
        self.output.to_lowercase().contains(&needle.to_lowercase())
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "`{}` exited with status {}", self.command, code)?,
            None => write!(f, "`{}` was terminated by a signal", self.command)?,
        }
        let output = self.output.trim();
        if !output.is_empty() {
            write!(f, ": {}", output)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Run a program and turn a non-zero exit into a [`ToolError`].
pub fn run_checked<R: Runtime>(runtime: &R, invocation: &Invocation) -> Result<ProcessOutput> {
    let output = runtime.run(invocation)?;
    if !output.success {
        debug!("{} failed: {}", invocation.program, output.combined());
        return Err(ToolError::new(invocation, &output).into());
    }
    Ok(output)
}
