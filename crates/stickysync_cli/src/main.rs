//! StickySync command line entry point.
//!
//! # Responsibility
//! - `ping`: verify `stickysync_core` linkage.
//! - `demo`: drive one participant session against a SQLite shared medium
//!   in logical time and print the resulting board.

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use stickysync_core::{
    init_logging, load_or_create_identity, open_db, KvStore, LlmModel, LoggingConfig, NoteColor,
    Point, Session, SessionConfig, SharedMedium, SimulatedMedium, SimulationSettings,
    SqliteMedium, TemplateGenerator, Timestamp,
};

/// Logical time advanced per demo step.
const STEP_MS: Timestamp = 500;

#[derive(Parser, Debug)]
#[clap(name = "stickysync", about, version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage and version.
    Ping,
    /// Run a participant session against a shared SQLite board.
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// SQLite file holding the identity and the shared snapshot.
    #[clap(long, default_value = "stickysync.db")]
    db: PathBuf,

    /// Display name of the local participant.
    #[clap(long, default_value = "Guest")]
    name: String,

    /// Logical seconds to simulate.
    #[clap(long, default_value_t = 10)]
    seconds: u64,

    /// Seed for jitter, latency and simulated peers.
    #[clap(long, default_value_t = 7)]
    seed: u64,

    /// Optional JSON session config.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Directory for rolling log files.
    #[clap(long)]
    log_dir: Option<PathBuf>,

    #[clap(long, default_value_t = stickysync_core::default_log_level().to_string())]
    log_level: String,

    /// Inject simulated peer activity on every fetch.
    #[clap(long)]
    simulate: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Ping => {
            println!("stickysync_core ping={}", stickysync_core::ping());
            println!("stickysync_core version={}", stickysync_core::core_version());
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(args: DemoArgs) -> Result<(), Box<dyn Error>> {
    let log_dir = absolute(
        args.log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("stickysync-logs")),
    )?;
    init_logging(&LoggingConfig::new(&args.log_level, &log_dir)?.mirror_to_stderr(true))?;

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let conn = open_db(&args.db)?;
    let identity = load_or_create_identity(&KvStore::new(&conn), &args.name)?;
    drop(conn);
    info!(
        "event=demo_start module=cli status=start participant_id={} simulate={} seconds={}",
        identity.participant_id, args.simulate, args.seconds
    );
    println!(
        "participant {} ({})",
        identity.display_name, identity.participant_id
    );

    let medium = SqliteMedium::open(&args.db)?;
    let generator = TemplateGenerator::builtin();
    if args.simulate {
        let settings = SimulationSettings {
            canvas: config.canvas,
            ..SimulationSettings::default()
        };
        let simulated = Arc::new(SimulatedMedium::new(medium, settings, args.seed));
        let clock = Arc::clone(&simulated);
        let mut session = Session::new(config, identity, simulated, generator, args.seed);
        drive(&mut session, args.seconds, |now| clock.set_now(now));
    } else {
        let mut session = Session::new(config, identity, medium, generator, args.seed);
        drive(&mut session, args.seconds, |_| {});
    }
    Ok(())
}

/// Scripted activity: type, create a note, drag it, then let time run.
fn drive<M: SharedMedium>(
    session: &mut Session<M, TemplateGenerator>,
    seconds: u64,
    on_step: impl Fn(Timestamp),
) {
    on_step(0);
    let outcome = session.start(0);
    println!("connected: {outcome:?}");

    for _ in 0..4 {
        session.keystroke();
    }
    let created = session.create_note(
        "Demo",
        "Write a haiku about shared whiteboards",
        NoteColor::Blue,
        LlmModel::Claude3Sonnet,
    );
    match created {
        Ok(note) => {
            if let Some(position) = session.store().position(&note.id).cloned() {
                let grab = Point::new(position.x, position.y);
                if session.pointer_down(&note.id, grab).is_ok() {
                    session.pointer_move(Point::new(grab.x + 40.0, grab.y - 25.0));
                    if let Some(clock) = session.pointer_up() {
                        println!("dragged {} and published clock {clock}", note.id);
                    }
                }
            }
        }
        Err(err) => eprintln!("create failed: {err}"),
    }

    let end = seconds.saturating_mul(1_000);
    let mut now = 0;
    while now < end {
        now = (now + STEP_MS).min(end);
        on_step(now);
        session.advance_to(now);
    }

    print_board(session);
    session.stop();
}

fn print_board<M: SharedMedium>(session: &mut Session<M, TemplateGenerator>) {
    println!(
        "t={}ms state={:?} last_published={} highest_observed={}",
        session.now(),
        session.sync_state(),
        session.engine().last_published(),
        session.engine().highest_observed()
    );
    for note in session.store().notes() {
        let position = session
            .store()
            .position(&note.id)
            .map(|p| format!("({:.0},{:.0})", p.x, p.y))
            .unwrap_or_else(|| "-".to_string());
        let response = match session.store().response(&note.id) {
            Some(Some(_)) => "ready",
            _ => "pending",
        };
        println!(
            "  note {} [{} / {}] at {} response={} title={:?}",
            note.id,
            note.color.as_str(),
            note.model.display_name(),
            position,
            response,
            note.title
        );
    }
    for participant in session.participants() {
        println!(
            "  participant {} ({}) typing={}",
            participant.display_name, participant.participant_id, participant.is_typing
        );
    }
}

fn absolute(path: PathBuf) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}
