//! Running external programs.

use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::RealRuntime;

/// A program to run: name, arguments, working directory and optional stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn path_arg(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    /// `None` when the program was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful run printing `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with exit code 1 printing `stderr`.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Both streams, stdout first.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

impl RealRuntime {
    #[tracing::instrument(skip(self, invocation), fields(program = %invocation.program))]
    pub(crate) fn run_impl(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!("Running {}", invocation);

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to start {}", invocation.program))?;

        // The child is always waited on, even when feeding stdin fails.
        let fed = match &invocation.stdin {
            Some(input) => child
                .stdin
                .take()
                .context("Failed to open stdin of child process")
                // Dropping the handle closes the pipe so the child sees EOF.
                .and_then(|mut pipe| pipe.write_all(input.as_bytes()).map_err(Into::into)),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for {}", invocation.program))?;

        if let Err(e) = fed {
            return Err(e.context(format!(
                "Failed to write stdin of {} ({})",
                invocation.program, output.status
            )));
        }

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("git")
            .args(["commit", "-m"])
            .arg("Fix the thing");
        assert_eq!(inv.to_string(), r#"git commit -m "Fix the thing""#);
    }

    #[test]
    fn test_combined_output() {
        let mut out = ProcessOutput::ok("out");
        assert_eq!(out.combined(), "out");
        out.stderr = "err".to_string();
        assert_eq!(out.combined(), "out\nerr");
        assert_eq!(ProcessOutput::failed("boom").combined(), "boom");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_output_and_status() {
        let rt = RealRuntime;
        let out = rt
            .run(&Invocation::new("sh").args(["-c", "echo hi; echo oops >&2; exit 3"]))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_feeds_stdin_and_cwd() {
        let rt = RealRuntime;
        let dir = tempfile::tempdir().unwrap();
        let out = rt
            .run(
                &Invocation::new("sh")
                    .args(["-c", "cat; pwd"])
                    .current_dir(dir.path())
                    .stdin("secret\n"),
            )
            .unwrap();
        assert!(out.success);
        let mut lines = out.stdout.lines();
        assert_eq!(lines.next(), Some("secret"));
        let pwd = std::path::PathBuf::from(lines.next().unwrap());
        assert_eq!(
            pwd.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_waits_for_child_when_stdin_breaks() {
        let rt = RealRuntime;
        let input = "x".repeat(1 << 20);
        let err = rt
            .run(
                &Invocation::new("sh")
                    .args(["-c", "exec 0<&-; exit 3"])
                    .stdin(input),
            )
            .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Failed to write stdin of sh"), "{}", msg);
        assert!(msg.contains("exit status: 3"), "{}", msg);
    }

    #[test]
    fn test_run_missing_program_is_an_error() {
        let rt = RealRuntime;
        let result = rt.run(&Invocation::new("misreq-no-such-program-xyz"));
        assert!(result.is_err());
    }
}
