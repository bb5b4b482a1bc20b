use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info};

use soiree::config::SoireeConfig;
use soiree::controller::ScreenController;
use soiree::effects::ChannelEffects;
use soiree::logging::init_logging;
use soiree::speech::{CommandSpeech, NullSpeech, SpeechBackend, SpeechNarrator};
use soiree::tui::event_handler::TuiEvent;
use soiree::tui::{try_init_tui, App, EventHandler};

/// ~60 FPS max
const MIN_RENDER_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enables debug logging (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with narration muted
    #[arg(long)]
    mute: bool,

    /// Never use a speech synthesizer
    #[arg(long)]
    no_speech: bool,

    /// Speech synthesizer program or path, e.g. espeak-ng
    #[arg(long)]
    speech_command: Option<String>,

    /// Write the effective config to the config path and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (log_path, _log_guard) = init_logging("soiree", cli.debug)?;

    let config = match &cli.config {
        Some(path) => SoireeConfig::load(path),
        None => SoireeConfig::load_or_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    if cli.write_config {
        let path = cli
            .config
            .clone()
            .or_else(SoireeConfig::config_path)
            .ok_or("No config directory available")?;
        config.save(&path)?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }

    let (speech_tx, mut speech_rx) = tokio::sync::mpsc::unbounded_channel();
    let backend: Box<dyn SpeechBackend> = if cli.no_speech || !config.speech.enabled {
        info!("Speech disabled");
        Box::new(NullSpeech)
    } else {
        let preferred = cli
            .speech_command
            .as_deref()
            .or(config.speech.command.as_deref());
        match CommandSpeech::detect(preferred, speech_tx) {
            Some(speech) => Box::new(speech),
            None => Box::new(NullSpeech),
        }
    };
    let narrator = SpeechNarrator::new(
        backend,
        config.speech.narration_settings(&config.timing),
    );
    info!("Narrating with {}", narrator.backend_name());

    let (effects, mut effect_rx) = ChannelEffects::new();
    let controller = ScreenController::new(
        config.controller_options(cli.mute),
        narrator,
        Box::new(effects),
    );

    // Ticks must be at least as fine as the reveal interval
    let tick_rate = config.timing.timing().reveal_interval.min(MIN_RENDER_INTERVAL);

    let mut app = App::new(controller, config.event.clone());
    let mut tui = try_init_tui()?;

    let (event_handler, mut tui_event_rx) = EventHandler::new(tick_rate);
    let event_handler = event_handler.start();

    let mut last_render_time: Option<Instant> = None;

    loop {
        // Draw current UI (only if enough time has passed)
        let now = Instant::now();
        let due = last_render_time
            .map_or(true, |last| now.duration_since(last) >= MIN_RENDER_INTERVAL);
        if due {
            if let Err(e) = tui.draw(&app) {
                error!("Failed to draw: {}", e);
                break;
            }
            last_render_time = Some(now);
        }

        tokio::select! {
            Some(tui_event) = tui_event_rx.recv() => {
                handle_tui_event(&mut app, tui_event);
            }
            Some(speech_event) = speech_rx.recv() => {
                tracing::debug!(target: "tui_main", "Speech event: {:?}", speech_event);
                app.handle_speech_event(speech_event, Instant::now());
            }
            Some(command) = effect_rx.recv() => {
                app.apply_effect(command, Instant::now());
            }
            else => break,
        }

        if app.should_quit {
            break;
        }
    }

    // Explicitly restore terminal before exiting
    drop(tui);
    event_handler.shutdown();

    info!("Shut down cleanly, log at {}", log_path.display());
    Ok(())
}

fn handle_tui_event(app: &mut App, tui_event: TuiEvent) {
    match tui_event {
        TuiEvent::Key(key) => app.handle_key(key, Instant::now()),
        TuiEvent::Quit => {
            info!("Received Ctrl+C signal, shutting down...");
            app.should_quit = true;
        }
        TuiEvent::Tick => app.tick(Instant::now()),
    }
}
