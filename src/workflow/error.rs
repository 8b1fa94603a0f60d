/// Why a package, or the whole run, could not be fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The invocation is unusable; aborts the run.
    Configuration(String),
    /// The branch listing could not be obtained.
    Eligibility(String),
    /// Cloning the package failed.
    Acquisition(String),
    /// Rewriting the spec file or adding the changelog entry failed.
    Patch(String),
    /// A test build failed or left misnamed requirements behind.
    Validation(String),
    /// Fork, push or pull request failed.
    Publication(String),
}

impl WorkflowError {
    pub fn eligibility(e: anyhow::Error) -> Self {
        WorkflowError::Eligibility(format!("{:#}", e))
    }

    pub fn acquisition(e: anyhow::Error) -> Self {
        WorkflowError::Acquisition(format!("{:#}", e))
    }

    pub fn patch(e: anyhow::Error) -> Self {
        WorkflowError::Patch(format!("{:#}", e))
    }

    pub fn validation(e: anyhow::Error) -> Self {
        WorkflowError::Validation(format!("{:#}", e))
    }

    pub fn publication(e: anyhow::Error) -> Self {
        WorkflowError::Publication(format!("{:#}", e))
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            WorkflowError::Eligibility(msg) => {
                write!(f, "Could not check the package branches: {}", msg)
            }
            WorkflowError::Acquisition(msg) => write!(f, "Cloning failed: {}", msg),
            WorkflowError::Patch(msg) => write!(f, "Patching the spec file failed: {}", msg),
            WorkflowError::Validation(msg) => write!(f, "Testing changes failed: {}", msg),
            WorkflowError::Publication(msg) => write!(f, "Publishing failed: {}", msg),
        }
    }
}

impl std::error::Error for WorkflowError {}
