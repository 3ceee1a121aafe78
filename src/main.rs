//! `uop-sched` command-line tool.
//!
//! ```bash
//! uop-sched solve --input block.json --output schedule.json --time-limit 30 --render
//! uop-sched render --input schedule.json --cycles 12 --ports 0,1,5
//! uop-sched rival --input trace.json
//! uop-sched compare --input results.csv --matrix-size 15
//! uop-sched generate --uops 20 --ports 6 --seed 7 --output block.json
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `uop_schedule=info`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use uop_schedule::compare::{mean_gap, parse_csv, ConfusionMatrix};
use uop_schedule::config::{EngineConfig, SolverConfig};
use uop_schedule::milp::{OptimalScheduler, ScheduleOutcome};
use uop_schedule::models::{Port, Schedule, UopBlock};
use uop_schedule::render::render_ascii;
use uop_schedule::rival::RivalTrace;
use uop_schedule::scheduler::ScheduleKpi;
use uop_schedule::synthetic::SyntheticBlock;

#[derive(Parser)]
#[command(
    name = "uop-sched",
    about = "Optimal micro-op port scheduling for basic blocks",
    version,
    propagate_version = true
)]
struct Cli {
    /// TOML configuration file; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute an optimal schedule for a uop block
    Solve {
        /// Uop block JSON
        #[arg(short, long)]
        input: PathBuf,
        /// Schedule JSON destination (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Solver time budget in seconds
        #[arg(short, long)]
        time_limit: Option<f64>,
        /// Print the port occupancy grid
        #[arg(long)]
        render: bool,
    },
    /// Print the port occupancy grid of a schedule
    Render {
        /// Schedule JSON
        #[arg(short, long)]
        input: PathBuf,
        /// Number of cycles shown
        #[arg(long)]
        cycles: Option<u32>,
        /// Ports shown, comma separated
        #[arg(long, value_delimiter = ',')]
        ports: Option<Vec<Port>>,
    },
    /// Report the first-iteration cycle count of a simulator trace
    Rival {
        /// Trace JSON
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Summarize heuristic-versus-optimal results
    Compare {
        /// CSV with rows `block,heuristic,optimal`
        #[arg(short, long)]
        input: PathBuf,
        /// Confusion matrix side length
        #[arg(long, default_value_t = ConfusionMatrix::DEFAULT_SIZE)]
        matrix_size: usize,
    },
    /// Generate a random uop block
    Generate {
        #[arg(long, default_value_t = 10)]
        uops: usize,
        #[arg(long, default_value_t = 6)]
        ports: u8,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Block JSON destination (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("uop_schedule=info"))?,
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Solve {
            input,
            output,
            time_limit,
            render,
        } => solve(config, &input, output.as_deref(), time_limit, render),
        Commands::Render {
            input,
            cycles,
            ports,
        } => {
            let schedule = Schedule::from_json(&read(&input)?)
                .with_context(|| format!("invalid schedule {}", input.display()))?;
            let cycles = cycles.unwrap_or(config.render.cycles);
            let ports = ports.unwrap_or(config.render.ports);
            print!("{}", render_ascii(&schedule, &ports, cycles));
            Ok(())
        }
        Commands::Rival { input } => {
            let trace = RivalTrace::from_json(&read(&input)?)
                .with_context(|| format!("invalid trace {}", input.display()))?;
            println!("{}", trace.first_iteration_cycles()?);
            Ok(())
        }
        Commands::Compare { input, matrix_size } => {
            let records = parse_csv(&read(&input)?)
                .with_context(|| format!("invalid results {}", input.display()))?;
            let matrix = ConfusionMatrix::from_records(matrix_size, &records);
            println!("blocks: {}", records.len());
            match mean_gap(&records) {
                Some(gap) => println!("mean relative gap: {gap:.4}"),
                None => println!("mean relative gap: n/a"),
            }
            println!("outside matrix: {}", matrix.skipped());
            print!("{}", matrix.to_csv());
            Ok(())
        }
        Commands::Generate {
            uops,
            ports,
            seed,
            output,
        } => {
            if ports == 0 {
                bail!("--ports must be at least 1");
            }
            let block = SyntheticBlock::new(seed)
                .with_uops(uops)
                .with_ports(ports)
                .generate();
            write_or_print(output.as_deref(), &block.to_json()?)
        }
    }
}

fn solve(
    mut config: EngineConfig,
    input: &Path,
    output: Option<&Path>,
    time_limit: Option<f64>,
    render: bool,
) -> anyhow::Result<()> {
    let block = UopBlock::from_json(&read(input)?)
        .with_context(|| format!("invalid uop block {}", input.display()))?;

    config.solver = with_time_limit_flag(config.solver, time_limit)?;

    let outcome = OptimalScheduler::new(config.solver).solve(&block)?;
    let kpi = ScheduleKpi::calculate(&outcome.schedule, &block);
    info!(
        status = %outcome.status,
        makespan = outcome.makespan,
        avg_utilization = kpi.avg_utilization,
        "solve finished"
    );

    let mut report = summary(&outcome);
    if render {
        report.push_str(&render_ascii(
            &outcome.schedule,
            &config.render.ports,
            config.render.cycles,
        ));
    }
    // Stdout carries the schedule JSON when no output file is given.
    if output.is_some() {
        print!("{report}");
    } else {
        eprint!("{report}");
    }

    let json = outcome.schedule.to_json()?;
    write_or_print(output, &json)
}

fn with_time_limit_flag(solver: SolverConfig, secs: Option<f64>) -> anyhow::Result<SolverConfig> {
    let Some(secs) = secs else {
        return Ok(solver);
    };
    let limit =
        Duration::try_from_secs_f64(secs).with_context(|| format!("invalid --time-limit {secs}"))?;
    Ok(solver.with_time_limit(limit))
}

fn summary(outcome: &ScheduleOutcome) -> String {
    format!(
        "status: {}\nmakespan: {}\nlower bounds: critical path {}, port load {}\n",
        outcome.status, outcome.makespan, outcome.critical_path, outcome.port_load
    )
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_or_print(path: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{contents}"),
    }
    Ok(())
}
