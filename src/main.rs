use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use lockstep_player::bridge::{read_launch_params, LaunchParams, PlayerPlugin, TokioLaunchContext};
use lockstep_player::engine::{SimulatedEngineFactory, SimulatedMedia, VideoSize};
use lockstep_player::player::{HostEvent, PlayerHandle, UserCommand};
use lockstep_player::utils::{load_config, Config};

/// Lockstep Player - fullscreen playback controls driven from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media URL to play
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// JSON file with launch parameters (url, title, subtitle, startPosition)
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    launch_file: Option<PathBuf>,

    /// Title shown in the overlay
    #[arg(short, long, default_value = "")]
    title: String,

    /// Subtitle shown under the title
    #[arg(short, long, default_value = "")]
    subtitle: String,

    /// Start position in milliseconds
    #[arg(long, value_name = "MS", default_value = "0")]
    start_position: i64,

    /// Length of the simulated media in milliseconds
    #[arg(long, value_name = "MS", default_value = "120000")]
    duration: u64,

    /// Simulated rendition heights, comma separated
    #[arg(long, value_delimiter = ',', default_value = "1080,720,480")]
    renditions: Vec<u32>,

    /// Make the simulated engine fail at this position
    #[arg(long, value_name = "MS")]
    fail_at: Option<u64>,

    /// Configuration file to use instead of the default locations
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => load_config().context("Failed to load config")?,
    };

    let log_level = if args.debug { "debug" } else { config.general.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting Lockstep Player v{}", env!("CARGO_PKG_VERSION"));

    let params = match &args.launch_file {
        Some(path) => read_launch_params(path)?,
        None => LaunchParams {
            url: args.url.clone(),
            title: args.title.clone(),
            subtitle: args.subtitle.clone(),
            start_position: args.start_position,
        },
    };

    let media = SimulatedMedia {
        duration_ms: args.duration,
        renditions: args
            .renditions
            .iter()
            .map(|&height| VideoSize { width: height * 16 / 9, height })
            .collect(),
        fail_at_ms: args.fail_at,
    };

    let (context, mut handles) =
        TokioLaunchContext::new(config, Arc::new(SimulatedEngineFactory::new(media)));
    let plugin = PlayerPlugin::new(Arc::new(context));

    let pending = match plugin.play(params) {
        Ok(pending) => pending,
        Err(e) => {
            error!("Launch rejected: {}", e);
            return Err(e.into());
        }
    };

    if let Some(handle) = handles.recv().await {
        tokio::spawn(read_commands(handle));
    }

    let outcome = pending.outcome().await?;
    println!("{}", outcome.to_json());
    Ok(())
}

/// Feed stdin lines to the player until the session ends
async fn read_commands(handle: PlayerHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ui = handle.ui_updates();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "status" {
                        print_status(&handle);
                        continue;
                    }
                    match parse_command(line) {
                        Some(command) => {
                            if handle.send(command).is_err() {
                                break;
                            }
                        }
                        None => warn!("Unknown command: {}", line),
                    }
                }
                Ok(None) => {
                    debug!("Stdin closed");
                    let _ = handle.host_event(HostEvent::Destroyed);
                    break;
                }
                Err(e) => {
                    error!("Failed to read command: {}", e);
                    break;
                }
            },
            changed = ui.changed() => {
                if changed.is_err() || ui.borrow().terminated {
                    break;
                }
            }
        }
    }
}

fn print_status(handle: &PlayerHandle) {
    let ui = handle.ui();
    let progress = handle.progress();
    println!(
        "{:?} {} / {} buffered {}% overlay {} panel {:?} locked {} {:?}",
        ui.playback,
        progress.position_label,
        progress.duration_label,
        progress.buffered_percent,
        if ui.visibility.overlay_visible { "shown" } else { "hidden" },
        ui.visibility.open_panel,
        ui.locked,
        ui.resize_mode,
    );
}

/// Map one line of terminal input to a command
fn parse_command(line: &str) -> Option<UserCommand> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        "play" | "pause" => UserCommand::TogglePlayPause,
        "tap" => UserCommand::SurfaceTap,
        "double-tap" => {
            let x = words.next()?.parse().ok()?;
            let surface_width = words.next()?.parse().ok()?;
            UserCommand::SurfaceDoubleTap { x, surface_width }
        }
        "fwd" => UserCommand::SeekForward,
        "rew" => UserCommand::SeekBackward,
        "scrub" => UserCommand::ScrubTo(words.next()?.parse().ok()?),
        "scrub-start" => UserCommand::ScrubStart,
        "scrub-end" => UserCommand::ScrubEnd,
        "speed" => UserCommand::SelectSpeed(words.next()?.trim_end_matches('x').parse().ok()?),
        "quality" => UserCommand::SelectQuality(words.next()?.to_string()),
        "quality-panel" => UserCommand::OpenQuality,
        "speed-panel" => UserCommand::OpenSpeed,
        "settings" => UserCommand::ToggleSettings,
        "close-panel" => UserCommand::ClosePanel,
        "lock" | "unlock" => UserCommand::ToggleLock,
        "fit" | "fill" => UserCommand::ToggleResizeMode,
        "back" => UserCommand::SystemBack,
        "close" => UserCommand::Close,
        "episodes" => UserCommand::ShowRelatedContent,
        _ => return None,
    };
    Some(command)
}
