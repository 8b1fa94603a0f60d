//! Knobs and fixed texts of the fix workflow.

use std::path::PathBuf;

use crate::retry::RetryPolicy;

use super::error::WorkflowError;

pub const FINALIZING_DOC: &str = "https://fedoraproject.org/wiki/FinalizingFedoraSwitchtoPython3";

/// Commit message, and the expected pull request title.
pub const COMMIT_MESSAGE: &str = "Fix misnamed Python 2 dependencies declarations";

/// Branches whose presence means the spec file may be shared with EPEL.
pub const DEFAULT_LONG_TERM_BRANCHES: &[&str] = &["el6", "epel7"];

pub const DEFAULT_BRANCH: &str = "master";

pub const DEFAULT_MOCK_ROOT: &str = "fedora-rawhide-x86_64";
pub const DEFAULT_KOJI_TARGET: &str = "rawhide";

pub const KERBEROS_REALM: &str = "FEDORAPROJECT.ORG";

pub const PR_DESCRIPTION: &str = "\
This package uses names with ambiguous `python-` prefix in requirements.

According to Fedora Packaging guidelines for Python [0], \
packages must use names with either `python2-` or `python3-` \
prefix in requirements where available.

This PR is part of Fedora's Switch to Python 3 effort [1] \
aiming to fix misnamed dependencies declarations across Python packages.

Note that, although this PR was created automatically, any comments or issues which \
you might find with it during the review will be fixed. \
The PR will remain open for review for a week, and \
if no feedback received will be merged.

[0] https://fedoraproject.org/wiki/Packaging:Python#Dependencies
[1] https://fedoraproject.org/wiki/FinalizingFedoraSwitchtoPython3";

/// Changelog entry added to the spec file.
pub fn changelog_comment() -> String {
    format!("{}\n  (See {})", COMMIT_MESSAGE, FINALIZING_DOC)
}

/// Pull request description, with the scratch build link when there is one.
pub fn pull_request_description(scratch_build: Option<&str>) -> String {
    match scratch_build {
        Some(link) => format!("{}\n\nKoji scratch build: {}", PR_DESCRIPTION, link),
        None => PR_DESCRIPTION.to_string(),
    }
}

/// Where and how test builds run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSettings {
    pub mock_root: String,
    pub mock_result_dir: PathBuf,
    pub koji_target: String,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            mock_root: DEFAULT_MOCK_ROOT.to_string(),
            mock_result_dir: PathBuf::from(format!("/var/lib/mock/{}/result", DEFAULT_MOCK_ROOT)),
            koji_target: DEFAULT_KOJI_TARGET.to_string(),
        }
    }
}

/// Where fixes are pushed and proposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Forge user owning the fork; also the git remote name.
    pub fork_user: String,
    pub branch: String,
    pub push_retry: RetryPolicy,
}

/// Credentials of the upstream identity, used for Kerberos.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub password: String,
}

impl Identity {
    pub fn principal(&self) -> String {
        format!("{}@{}", self.user, KERBEROS_REALM)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

/// Credentials as given on the command line, before they are checked.
#[derive(Clone, Default)]
pub struct Credentials {
    pub pagure_token: Option<String>,
    pub pagure_user: Option<String>,
    pub fas_user: Option<String>,
    pub fas_password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = |secret: &Option<String>| secret.as_ref().map(|_| "********");
        f.debug_struct("Credentials")
            .field("pagure_token", &masked(&self.pagure_token))
            .field("pagure_user", &self.pagure_user)
            .field("fas_user", &self.fas_user)
            .field("fas_password", &masked(&self.fas_password))
            .finish()
    }
}

impl Credentials {
    /// The fork owner, required when publishing.
    pub fn fork_user(&self, publish: bool) -> Result<Option<String>, WorkflowError> {
        if !publish {
            return Ok(None);
        }
        match (&self.pagure_token, &self.pagure_user) {
            (Some(_), Some(user)) => Ok(Some(user.clone())),
            _ => Err(WorkflowError::Configuration(
                "Please provide both pagure user and token".to_string(),
            )),
        }
    }

    /// The upstream identity, if any. Half of it is an error.
    pub fn identity(&self) -> Result<Option<Identity>, WorkflowError> {
        match (&self.fas_user, &self.fas_password) {
            (Some(user), Some(password)) => Ok(Some(Identity {
                user: user.clone(),
                password: password.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(WorkflowError::Configuration(
                "Please provide both FAS username and password".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Packages are cloned into `<work_dir>/<name>`.
    pub work_dir: PathBuf,
    /// Changelog author, `rpmdev-bumpspec` picks one when unset.
    pub changelog_user: Option<String>,
    pub long_term_branches: Vec<String>,
    /// `None` skips test builds.
    pub validation: Option<ValidationSettings>,
    /// `None` skips fork, push and pull request.
    pub publish: Option<PublishSettings>,
}

impl WorkflowOptions {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            changelog_user: None,
            long_term_branches: DEFAULT_LONG_TERM_BRANCHES
                .iter()
                .map(|b| b.to_string())
                .collect(),
            validation: Some(ValidationSettings::default()),
            publish: None,
        }
    }
}
