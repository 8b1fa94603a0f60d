use anyhow::Result;
use clap::Parser;
use misreq::candidates::CandidateSource;
use misreq::commands::{self, FixRequest};
use misreq::consistency::DEFAULT_DATA_DIR;
use misreq::workflow::{Credentials, DEFAULT_BRANCH};
use std::path::PathBuf;

/// The FAS password is only read from the environment, never from a flag.
const FAS_PASSWORD_VAR: &str = "FAS_PASSWORD";

const DEFAULT_DB: &str = "portingdb.sqlite";

/// misreq - fix misnamed Python 2 requirements in Fedora packages
///
/// Rewrites ambiguous `python-` dependency names in spec files to their
/// `python2-` form, tests the result and proposes it as a pull request.
///
/// Examples:
///   misreq fix --no-test                           # Patch packages from portingdb.sqlite
///   misreq rewrite --dry-run foo.spec              # Show the rewritten spec
///   misreq check-data --data-dir data              # Check portingdb data files
#[derive(Parser, Debug)]
#[command(author, version = env!("MISREQ_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Clone, patch, test and publish packages with misnamed requires
    Fix(FixArgs),

    /// Rewrite misnamed requires in spec files
    Rewrite(RewriteArgs),

    /// Report package names in the data files that Fedora does not know
    CheckData(CheckDataArgs),
}

#[derive(clap::Args, Debug)]
pub struct FixArgs {
    /// portingdb SQLite database listing the packages
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DB, conflicts_with = "packages")]
    pub db: PathBuf,

    /// File with one package name per line, used instead of the database
    #[arg(long, value_name = "FILE")]
    pub packages: Option<PathBuf>,

    /// Working directory (defaults to a new temporary directory)
    #[arg(long, value_name = "DIR")]
    pub dirname: Option<PathBuf>,

    /// Empty the working directory first
    #[arg(long)]
    pub cleandir: bool,

    /// Process at most N packages
    #[arg(short = 'n', value_name = "N")]
    pub limit: Option<usize>,

    /// Author of the changelog entry
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Skip the mock and koji test builds
    #[arg(long)]
    pub no_test: bool,

    /// Push the fixes to a fork and open pull requests
    #[arg(long)]
    pub pagure: bool,

    /// Pagure API token (also via PAGURE_TOKEN)
    #[arg(long, env = "PAGURE_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub pagure_token: Option<String>,

    /// Pagure user owning the forks (also via PAGURE_USER)
    #[arg(long, env = "PAGURE_USER", value_name = "USER")]
    pub pagure_user: Option<String>,

    /// FAS user for Kerberos (also via FAS_USER); the password is read from FAS_PASSWORD
    #[arg(long, env = "FAS_USER", value_name = "USER")]
    pub fas_user: Option<String>,

    /// Branch to fix and propose the pull request against
    #[arg(long, value_name = "NAME", default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Pagure instance URL (defaults to https://src.fedoraproject.org)
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RewriteArgs {
    /// Print the rewritten spec instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Spec files to rewrite
    #[arg(value_name = "SPEC", required = true)]
    pub specs: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CheckDataArgs {
    /// Directory holding fedora.json and the YAML datasets
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Exit with an error when anything is reported
    #[arg(long)]
    pub fail_on_findings: bool,
}

impl FixArgs {
    fn into_request(self, fas_password: Option<String>) -> FixRequest {
        let source = match self.packages {
            Some(file) => CandidateSource::File(file),
            None => CandidateSource::Database(self.db),
        };
        FixRequest {
            source,
            dirname: self.dirname,
            cleandir: self.cleandir,
            limit: self.limit,
            changelog_user: self.user,
            no_test: self.no_test,
            pagure: self.pagure,
            branch: self.branch,
            credentials: Credentials {
                pagure_token: self.pagure_token,
                pagure_user: self.pagure_user,
                fas_user: self.fas_user,
                fas_password,
            },
            api_url: self.api_url,
        }
    }
}

fn fas_password_from_env() -> Option<String> {
    std::env::var(FAS_PASSWORD_VAR)
        .ok()
        .filter(|password| !password.is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let runtime = misreq::runtime::RealRuntime;

    match cli.command {
        Commands::Fix(args) => {
            let report = commands::fix(runtime, args.into_request(fas_password_from_env())).await?;
            println!("{}", report);
        }
        Commands::Rewrite(args) => {
            commands::rewrite(&runtime, &args.specs, args.dry_run)?;
        }
        Commands::CheckData(args) => {
            commands::check_data(&runtime, &args.data_dir, args.fail_on_findings)?;
        }
    }
    Ok(())
}
