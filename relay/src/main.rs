//! Human-in-the-loop command relay.
//!
//! Runs agent-proposed command batches fail-fast (`relay exec`), drives a
//! playbook session with an operator gate on stdin (`relay play`), and renders
//! persisted sessions (`relay show`).

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use relay::coordinator::ExecutionCoordinator;
use relay::core::session::Session;
use relay::core::wire::BatchResponse;
use relay::exit_codes;
use relay::io::config::load_config;
use relay::io::executor::ShellExecutor;
use relay::io::human::{LineGate, format_batch};
use relay::io::init::{InitOptions, RelayPaths, init_relay};
use relay::io::message::{parse_batch_message, render_response};
use relay::io::prompt::render_record;
use relay::io::session_store::{load_session, session_path, write_session};
use relay::looping::{LoopConfig, LoopStop, run_loop};
use relay::playbook::PlaybookPlanner;

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "Relay agent command batches to a human-owned terminal"
)]
struct Cli {
    /// Project root holding `.relay/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.relay/config.toml` and `.relay/sessions/`.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Run one `{"data": ...}` batch fail-fast and print the JSON response.
    Exec {
        /// Message JSON; read from stdin when omitted.
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Drive a session from a playbook, asking the operator before each batch.
    Play {
        /// Playbook TOML file.
        playbook: PathBuf,
    },
    /// Render a persisted session as Markdown.
    Show {
        /// Session id (file name under `.relay/sessions/` without `.json`).
        session_id: String,
    },
}

fn main() {
    relay::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.root, force),
        Command::Exec { message } => cmd_exec(&cli.root, message),
        Command::Play { playbook } => cmd_play(&cli.root, &playbook),
        Command::Show { session_id } => cmd_show(&cli.root, &session_id),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_relay(root, &InitOptions { force })?;
    println!("initialized {}", paths.relay_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_exec(root: &Path, message: Option<String>) -> Result<i32> {
    let paths = RelayPaths::new(root);
    let cfg = load_config(&paths.config_path)?;
    let raw = match message {
        Some(raw) => raw,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("read message from stdin")?;
            buf
        }
    };

    let mut batch = parse_batch_message(&raw)?;
    let flagged = cfg.danger_policy()?.annotate(&mut batch);
    if flagged > 0 {
        warn!(flagged, "batch contains commands flagged dangerous");
        eprintln!("{}", format_batch(0, &batch));
    }

    let cwd = root
        .canonicalize()
        .with_context(|| format!("resolve root {}", root.display()))?;
    let mut executor = ShellExecutor::from_config(&cfg, cwd);
    let coordinator = ExecutionCoordinator::new(cfg.exit_policy());
    let result = coordinator.execute(&mut executor, &batch)?;

    print!("{}", render_response(&BatchResponse::from(&result))?);
    if result.is_success() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::BATCH_FAILED)
    }
}

fn cmd_play(root: &Path, playbook: &Path) -> Result<i32> {
    let paths = RelayPaths::new(root);
    let cfg = load_config(&paths.config_path)?;
    let planner = PlaybookPlanner::load(playbook)?;
    let cwd = root
        .canonicalize()
        .with_context(|| format!("resolve root {}", root.display()))?;

    let mut session = Session::new(planner.goal());
    let session_file = session_path(&paths.sessions_dir, session.id())?;
    let mut executor = ShellExecutor::from_config(&cfg, cwd);
    let coordinator = ExecutionCoordinator::new(cfg.exit_policy());
    let loop_config = LoopConfig {
        max_batches: cfg.max_batches,
        danger: cfg.danger_policy()?,
    };
    let mut gate = LineGate::new(io::stdin().lock(), io::stderr(), cfg.continue_token.clone());
    gate.say(&format!("session {}", session.id()))?;

    loop {
        let outcome = run_loop(
            &mut session,
            &planner,
            &coordinator,
            &mut executor,
            &mut gate,
            &loop_config,
            |s| write_session(&session_file, s),
        )?;
        match outcome.stop {
            LoopStop::Completed { report } => {
                println!("{report}");
                return Ok(exit_codes::OK);
            }
            LoopStop::AwaitingHuman => {
                gate.say("planner is waiting for a human reply")?;
                return Ok(exit_codes::AWAITING_HUMAN);
            }
            LoopStop::MaxBatchesExceeded {
                issued,
                max_batches,
            } => {
                gate.say(&format!(
                    "stopped after {issued} batches (max_batches = {max_batches})"
                ))?;
                return Ok(exit_codes::LIMIT);
            }
            LoopStop::Interrupted { question } => {
                gate.say(&format!("interrupted: {question}"))?;
                if !wait_for_continue(&mut gate, &mut session)? {
                    return Ok(exit_codes::AWAITING_HUMAN);
                }
                write_session(&session_file, &session)?;
            }
        }
    }
}

/// Read replies until the continue token resumes the session; `false` on end of input.
fn wait_for_continue<R: io::BufRead, W: io::Write>(
    gate: &mut LineGate<R, W>,
    session: &mut Session,
) -> Result<bool> {
    let token = gate.continue_token().to_string();
    gate.say(&format!("type `{token}` to resume"))?;
    while let Some(reply) = gate.read_reply()? {
        match session.apply_human_reply(&reply, &token) {
            Ok(_) => return Ok(true),
            Err(err) if err.is_mode_error() => {
                gate.say(&format!("{err}; type `{token}` to resume"))?;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(false)
}

fn cmd_show(root: &Path, session_id: &str) -> Result<i32> {
    let paths = RelayPaths::new(root);
    let path = session_path(&paths.sessions_dir, session_id)?;
    let session = load_session(&path)?;
    print!("{}", render_record(&session.record())?);
    Ok(exit_codes::OK)
}
