use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use puzzle_harness::model::registry::{ReplaySummary, RunSummary, TraceVerdict};
use puzzle_harness::{GameKind, HarnessError, HarnessResult, ProgramSpec, Registry, RunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "puzzle-harness", about = "Run puzzle bots against reference simulators", version)]
struct Args {
    /// Fixture root holding tests/<model>/ and traces/<model>/
    #[arg(long, global = true, default_value = "fixtures")]
    fixtures: PathBuf,

    /// Verbose logging; `run` also echoes program stderr
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the available models
    Models,
    /// List the test cases of a model
    Cases {
        #[arg(short, long)]
        model: GameKind,
    },
    /// Play a test case against one program per player
    Run {
        #[arg(short, long)]
        model: GameKind,
        /// Per-line timeout in milliseconds
        #[arg(short = 't', long, default_value_t = 150)]
        timeout: u64,
        /// Timeout for the first turn, in milliseconds
        #[arg(long)]
        first_turn_timeout: Option<u64>,
        #[arg(long, default_value_t = 500)]
        max_turns: u32,
        /// Command line of one player program; repeat for multi-agent games
        #[arg(long = "player")]
        players: Vec<String>,
        case: String,
        /// Single program and its arguments, after `--`
        #[arg(last = true)]
        program: Vec<String>,
    },
    /// Replay a recorded trace and compare states
    Replay {
        #[arg(short, long)]
        model: GameKind,
        trace: String,
    },
    /// Replay every trace of one model, or of all models
    CheckTraces {
        #[arg(short, long)]
        model: Option<GameKind>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let registry = Registry::new(args.fixtures.clone());
    match dispatch(&registry, args.cmd, args.debug) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::from(2)
        }
    }
}

/// Run one subcommand; `Ok(false)` means it ran but did not pass.
fn dispatch(registry: &Registry, cmd: Cmd, debug: bool) -> HarnessResult<bool> {
    match cmd {
        Cmd::Models => {
            for (name, description) in registry.models() {
                println!("{name:<26} {description}");
            }
            Ok(true)
        }
        Cmd::Cases { model } => {
            let cases = registry.test_cases(model);
            if cases.is_empty() {
                println!("(no test cases for {model} under {})", registry.root().display());
            }
            for (name, title) in cases {
                println!("{name:<24} {title}");
            }
            Ok(true)
        }
        Cmd::Run {
            model,
            timeout,
            first_turn_timeout,
            max_turns,
            players,
            case,
            program,
        } => {
            let programs = program_specs(&players, &program)?;
            let mut config = RunnerConfig::new()
                .with_turn_timeout_ms(timeout)
                .with_max_turns(max_turns)
                .with_echo_stderr(debug);
            if let Some(ms) = first_turn_timeout {
                config = config.with_first_turn_timeout_ms(ms);
            }
            let summary = registry.run(model, &case, &programs, config)?;
            print_run(&summary);
            Ok(summary.status.is_success())
        }
        Cmd::Replay { model, trace } => {
            let summary = registry.replay(model, &trace)?;
            print_replay(&summary);
            Ok(summary.is_ok())
        }
        Cmd::CheckTraces { model } => {
            let kinds = model.map_or_else(|| GameKind::ALL.to_vec(), |kind| vec![kind]);
            let mut passed = 0;
            let mut total = 0;
            for kind in kinds {
                println!("{kind}:");
                let checks = registry.check_traces(kind);
                if checks.is_empty() {
                    println!("  (no traces)");
                }
                for check in checks {
                    total += 1;
                    if check.verdict == TraceVerdict::Ok {
                        passed += 1;
                    }
                    println!("  {}: {}", check.trace, check.verdict);
                }
            }
            println!("{passed}/{total} traces OK");
            Ok(passed == total)
        }
    }
}

fn program_specs(players: &[String], program: &[String]) -> HarnessResult<Vec<ProgramSpec>> {
    match (players.is_empty(), program.is_empty()) {
        (true, true) => Err(HarnessError::EmptyCommand),
        (true, false) => Ok(vec![ProgramSpec::from_words(program)?]),
        (false, true) => players.iter().map(String::as_str).map(ProgramSpec::parse).collect(),
        (false, false) => {
            let mut specs = vec![ProgramSpec::from_words(program)?];
            for line in players {
                specs.push(ProgramSpec::parse(line)?);
            }
            Ok(specs)
        }
    }
}

fn print_run(summary: &RunSummary) {
    println!("Model:  {}", summary.model);
    println!("Case:   {}", summary.case);
    println!("Result: {}", summary.status);
    println!("Turns:  {}", summary.turns);
    if summary.status.is_success() {
        return;
    }

    println!("Final state: {}", summary.final_state);
    if !summary.recent.is_empty() {
        println!("Last {} turns:", summary.recent.len());
        for (turn, state) in &summary.recent {
            println!("  turn {turn}: {state}");
        }
    }
    for (player, lines) in &summary.stderr {
        if lines.is_empty() {
            continue;
        }
        println!("{player} stderr (tail):");
        for line in lines {
            println!("  {line}");
        }
    }
}

fn print_replay(summary: &ReplaySummary) {
    println!("Model:  {}", summary.model);
    println!("Trace:  {} (test case {})", summary.trace, summary.test_case);
    println!("Turns:  {}", summary.turns);
    println!("Result: {}", summary.result);
    println!("Final state: {}", summary.final_state);
    match summary.mismatches.first() {
        None => println!("All turns match"),
        Some(first) => {
            println!("First mismatch at turn {}:", first.turn);
            for diff in &first.diffs {
                println!("  {diff}");
            }
            println!("{} mismatching turn(s) in total", summary.mismatches.len());
        }
    }
}
