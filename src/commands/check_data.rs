use anyhow::{Result, bail};
use std::path::Path;

use crate::{
    consistency::{ConsistencyReport, check_data_dir},
    runtime::Runtime,
};

/// Print the consistency report of `data_dir`.
pub fn check_data<R: Runtime>(
    runtime: &R,
    data_dir: &Path,
    fail_on_findings: bool,
) -> Result<ConsistencyReport> {
    let report = check_data_dir(runtime, data_dir)?;
    print!("{}", report);

    if fail_on_findings && !report.is_clean() {
        bail!("{} unknown package name(s) found", report.findings());
    }
    Ok(report)
}
