//! `blockpilot` – run one intent against a small simulated world.
//!
//! ```text
//! blockpilot go_to 10 1 4 sprint
//! blockpilot mine 4 1 0 1
//! blockpilot --schema
//! ```
//!
//! The demo world is a flat floor with a short wall, a pillar, and one dirt
//! block, plus a sheep (entity 7) that wanders back and forth.  With no words
//! the bot idles until `max_ticks` or Ctrl-C.

mod config;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use blockpilot_kernel::{BehaviorEnded, EndReason};
use blockpilot_physics::SimWorld;
use blockpilot_runtime::{AgentLoop, Intent, telemetry};
use blockpilot_types::{BlockPos, EntityId, EntityInfo, Vec3};
use colored::Colorize;
use tracing::{info, warn};

const SHEEP_ID: EntityId = 7;
const SPAWN: Vec3 = Vec3::new(0.5, 1.0, 0.5);

fn main() -> ExitCode {
    let _telemetry = telemetry::init_tracing("blockpilot");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--schema") {
        match serde_json::to_string_pretty(&Intent::schema()) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{}: {}", "Schema error".red(), e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    print_banner();

    let write_config = args.first().map(String::as_str) == Some("--write-config");
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    if write_config {
        return match config::save(&cfg) {
            Ok(()) => {
                println!(
                    "  {} Config saved to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{}: {}", "Error saving config".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    let intent = if args.is_empty() {
        Intent::Idle
    } else {
        match Intent::parse(&args) {
            Ok(intent) => intent,
            Err(e) => {
                eprintln!("{}: {}", "Invalid intent".red().bold(), e);
                return ExitCode::from(2);
            }
        }
    };

    // ── Ctrl-C ────────────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – cancelling behaviors …".yellow().bold());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg, intent, shutdown)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Demo run
// ─────────────────────────────────────────────────────────────────────────────

async fn run(
    cfg: config::Config,
    intent: Intent,
    shutdown: Arc<AtomicBool>,
) -> Result<(), blockpilot_types::BotError> {
    let world = Arc::new(demo_world());
    let mut agent = AgentLoop::with_sim(&cfg.bot, world, SPAWN);

    let action = intent.action();
    let run_id = agent.submit(intent)?;
    println!(
        "  Session {}  running {} (#{})\n",
        agent.session().to_string().dimmed(),
        action.bold().cyan(),
        run_id
    );

    let mut interval = tokio::time::interval(Duration::from_millis(cfg.tick_millis));
    let mut finished = false;
    while agent.current_tick() < cfg.max_ticks {
        interval.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            let cancelled = agent.cancel_all();
            info!(cancelled, "shutdown requested");
            break;
        }

        let entities = [sheep_at(agent.current_tick())];
        agent.tick(&entities);

        while let Some(event) = agent.try_next_event() {
            print_event(&event);
            finished |= event.run_id == run_id;
        }
        if finished {
            break;
        }
    }

    if !finished {
        agent.cancel_all();
        // Let the cancelled tasks post their end events.
        tokio::time::sleep(Duration::from_millis(cfg.tick_millis)).await;
        while let Some(event) = agent.try_next_event() {
            print_event(&event);
        }
    }

    let state = agent.state();
    println!(
        "\n  Stopped after {} ticks at {}",
        agent.current_tick().to_string().bold(),
        state.position.to_string().bold()
    );
    Ok(())
}

fn demo_world() -> SimWorld {
    SimWorld::flat(0)
        .with_fill(BlockPos::new(4, 1, -3), BlockPos::new(4, 2, 3), "stone")
        .with_fill(BlockPos::new(8, 1, -6), BlockPos::new(8, 3, -6), "oak_log")
        .with_block(BlockPos::new(2, 1, 2), "dirt")
}

/// The sheep paces along x between 6 and 10.
fn sheep_at(tick: u64) -> EntityInfo {
    let x = 8.0 + 2.0 * (tick as f64 * 0.05).sin();
    EntityInfo {
        kind: "sheep".to_string(),
        width: 0.9,
        height: 1.3,
        ..EntityInfo::new(SHEEP_ID, Vec3::new(x, 1.0, 4.5))
    }
}

fn print_event(event: &BehaviorEnded) {
    let reason = match event.reason {
        EndReason::Completed => event.reason.to_string().green(),
        EndReason::Cancelled => event.reason.to_string().yellow(),
        EndReason::Preempted => event.reason.to_string().magenta(),
    };
    println!(
        "  {} {} {} {}",
        event
            .ended_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            .dimmed(),
        event.name.bold(),
        format!("#{}", event.run_id).dimmed(),
        reason
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ___  __         __   ___  _ __     __ "#.bold().cyan());
    println!("{}", r#"  / _ )/ /__  ____/ /__/ _ \(_) /__  / /_"#.bold().cyan());
    println!("{}", r#" / _  / / _ \/ __/  '_/ ___/ / / _ \/ __/"#.bold().cyan());
    println!("{}", r#"/____/_/\___/\__/_/\_\/_/  /_/_/\___/\__/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "BlockPilot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Voxel-world agent core demo");
    println!();
}
