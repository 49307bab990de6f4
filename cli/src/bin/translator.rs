//! `translator <domain-file> <problem-file>`: parses and
//! prints the normalised domain and problem to stdout. A thin wrapper
//! over `mimir-pddl`'s parse/lower pipeline and `mimir-cli`'s printer —
//! the translator pipeline itself (NNF, disjunction/universal-quantifier
//! elimination, flattening, parameter-index encoding) already ran
//! inside `PddlFrontend::parse_*` by the time this binary has a
//! `Domain`/`Problem` to print.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "translator")]
struct Args {
    domain_file: PathBuf,
    problem_file: PathBuf,
}

fn main() -> ExitCode {
    mimir_cli::init_logging();
    let args = Args::parse();

    let (domain, problem, repos) = match mimir_cli::load(&args.domain_file, &args.problem_file) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(1);
        }
    };

    let mut out = String::new();
    mimir_cli::printer::print_domain(&mut out, &domain, &repos);
    out.push('\n');
    mimir_cli::printer::print_problem(&mut out, &problem, &repos);
    print!("{out}");
    ExitCode::from(0)
}
