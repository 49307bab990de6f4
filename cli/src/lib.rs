//! Shared plumbing between the `planner` and `translator` binaries:
//! loading a domain/problem pair off disk through `mimir-pddl`,
//! initialising `tracing-subscriber`, and rendering a lowered
//! domain/problem back to readable PDDL-ish text for `translator`.
//! Pretty-printing lives here, not in a library crate, since it is an
//! external collaborator's job and this crate is that collaborator.

pub mod printer;

use anyhow::{Context, Result};
use mimir_formalism::{Domain, PddlRepositories, Problem};
use mimir_pddl::PddlFrontend;
use std::path::Path;

/// Installs a `tracing-subscriber` reading `RUST_LOG` (default `info`),
/// writing to stderr so stdout stays reserved for `planner`'s plan and
/// `translator`'s dump.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Parses `domain_file`/`problem_file` into a lowered [`Domain`],
/// [`Problem`] and the [`PddlRepositories`] they share.
pub fn load(domain_file: &Path, problem_file: &Path) -> Result<(Domain, Problem, PddlRepositories)> {
    let domain_source = domain_file.display().to_string();
    let problem_source = problem_file.display().to_string();
    let domain_text = std::fs::read_to_string(domain_file).with_context(|| format!("reading domain file {domain_source}"))?;
    let problem_text = std::fs::read_to_string(problem_file).with_context(|| format!("reading problem file {problem_source}"))?;

    let mut frontend = PddlFrontend::new();
    let domain = frontend.parse_domain(&domain_source, &domain_text).with_context(|| format!("parsing domain {domain_source}"))?;
    let problem = frontend.parse_problem(&problem_source, &problem_text).with_context(|| format!("parsing problem {problem_source}"))?;
    Ok((domain, problem, frontend.into_repositories()))
}
