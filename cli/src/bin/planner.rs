//! `planner <domain-file> <problem-file>`: parses, runs a
//! search over the lowered domain/problem, prints the plan to stdout.
//! Exit codes: 0 SOLVED, 1 usage error, 2 UNSOLVABLE, 3
//! EXHAUSTED, 4 OUT_OF_TIME.

use clap::{Parser, ValueEnum};
use mimir_search::algorithms::{astar, brfs, BlindHeuristic, SearchStatus};
use mimir_search::config::SearchLimits;
use mimir_search::event_handler::DefaultEventHandler;
use mimir_search::state_repository::{RepositoryMode, StateRepository};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum AlgorithmArg {
    Astar,
    Brfs,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum ModeArg {
    Lifted,
    Grounded,
}

/// Mimir: lifted/grounded PDDL planner.
#[derive(Parser, Debug)]
#[command(name = "planner")]
struct Args {
    domain_file: PathBuf,
    problem_file: PathBuf,

    #[arg(long, value_enum, default_value_t = AlgorithmArg::Astar)]
    algorithm: AlgorithmArg,

    #[arg(long, value_enum, default_value_t = ModeArg::Lifted)]
    mode: ModeArg,

    #[arg(long)]
    max_time_ms: Option<u64>,

    #[arg(long)]
    max_num_states: Option<usize>,
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

    let num_objects = repos.objects.len();
    let mode = match args.mode {
        ModeArg::Lifted => RepositoryMode::Lifted,
        ModeArg::Grounded => RepositoryMode::Grounded {
            action_options: Default::default(),
            axiom_options: Default::default(),
        },
    };
    let mut repository = StateRepository::new(domain, repos, &problem, num_objects, mode);

    let limits = SearchLimits {
        max_num_states: args.max_num_states,
        max_time: args.max_time_ms.map(Duration::from_millis),
        stop_if_goal: true,
    };
    let mut handler = DefaultEventHandler;

    let (status, plan) = match args.algorithm {
        AlgorithmArg::Astar => astar::astar(&mut repository, &problem, &limits, &mut BlindHeuristic, &mut handler),
        AlgorithmArg::Brfs => brfs::brfs(&mut repository, &problem, &limits, &mut handler),
    };

    match status {
        SearchStatus::Solved => {
            let plan = plan.expect("SOLVED always carries a plan");
            let mut out = String::new();
            mimir_cli::printer::print_plan(&mut out, &repository, &plan);
            print!("{out}");
            println!("; cost = {}", plan.cost);
            ExitCode::from(0)
        }
        SearchStatus::Unsolvable => {
            eprintln!("unsolvable");
            ExitCode::from(2)
        }
        SearchStatus::Exhausted => {
            eprintln!("exhausted");
            ExitCode::from(3)
        }
        SearchStatus::OutOfTime | SearchStatus::OutOfMemory => {
            eprintln!("out of time");
            ExitCode::from(4)
        }
    }
}
