use std::fmt;

use super::error::WorkflowError;

/// What happened to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Has a long-term branch; left alone.
    Ineligible,
    Failed(WorkflowError),
    Fixed(FixedPackage),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedPackage {
    pub scratch_build: Option<String>,
    pub pull_request: Option<String>,
}

impl FixedPackage {
    /// `pull request <url>, scratch build <url>`, or `None` without links.
    pub fn links(&self) -> Option<String> {
        let links: Vec<String> = [
            ("pull request", &self.pull_request),
            ("scratch build", &self.scratch_build),
        ]
        .into_iter()
        .filter_map(|(label, link)| link.as_ref().map(|url| format!("{} {}", label, url)))
        .collect();
        (!links.is_empty()).then(|| links.join(", "))
    }
}

/// Package names by outcome, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub ineligible: Vec<String>,
    pub failed: Vec<String>,
    pub fixed: Vec<String>,
    /// Links of the fixed packages that have any, by package name.
    pub links: Vec<(String, String)>,
}

impl Report {
    pub fn record(&mut self, package: &str, outcome: &Outcome) {
        let list = match outcome {
            Outcome::Ineligible => &mut self.ineligible,
            Outcome::Failed(_) => &mut self.failed,
            Outcome::Fixed(fixed) => {
                if let Some(links) = fixed.links() {
                    self.links.push((package.to_string(), links));
                }
                &mut self.fixed
            }
        };
        list.push(package.to_string());
    }

    pub fn total(&self) -> usize {
        self.ineligible.len() + self.failed.len() + self.fixed.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} processed: {} fixed, {} failed, {} ineligible",
            self.total(),
            self.fixed.len(),
            self.failed.len(),
            self.ineligible.len()
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Packages that have EPEL branches: {:?}", self.ineligible)?;
        writeln!(f, "Packages that failed: {:?}", self.failed)?;
        writeln!(f, "Packages that were fixed: {:?}", self.fixed)?;
        for (package, links) in &self.links {
            writeln!(f, "  {}: {}", package, links)?;
        }
        write!(f, "{}", self.summary())
    }
}
