//! Application entry point — city-stories interactive shell.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build the adapters from config: resolver, generator, synthesizer.
//! 4. Open the audio sink (falls back to a silent sink without a device).
//! 5. Spawn the story orchestrator and a periodic tick task.
//! 6. Read commands from stdin until EOF / `quit`.
//!
//! # Shell commands
//!
//! ```text
//! <lat> <lon>        feed a position sample, e.g.  48.8566 2.3522
//! lost [message]     simulate the feed becoming unavailable
//! story              tell me about this city
//! toggle             play / pause the narration
//! template <text>    set the story prompt ({city} placeholder)
//! status             print the current state snapshot
//! quit               exit
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use city_stories::{
    config::AppConfig,
    geo::{Coordinate, LocationEvent},
    geocode::{CityResolver, NominatimResolver},
    narrate::{ApiStoryGenerator, ElevenLabsSynthesizer, SpeechSynthesizer, StoryGenerator},
    pipeline::{new_shared_state, ExplorerCommand, SharedState, StoryOrchestrator},
    playback::{AudioSink, NullSink, PlaybackController, RodioSink},
};

// ---------------------------------------------------------------------------
// Snapshot printing
// ---------------------------------------------------------------------------

/// Render the shared state snapshot for the terminal.
fn print_status(state: &SharedState) {
    let st = state.lock().unwrap();

    let position = st
        .position
        .map(|p| p.to_string())
        .unwrap_or_else(|| "N/A".into());

    println!("position:      {position}");
    println!("current city:  {}", st.current_city_label());
    println!(
        "last arrival:  {}",
        st.detection.last_confirmed.as_deref().unwrap_or("N/A")
    );
    println!(
        "affordance:    {}",
        if st.detection.arrival_pending {
            "tell me about this city"
        } else {
            "-"
        }
    );
    println!("narration:     {}", st.narration.label());
    if let Some(story) = st.narration.story_text() {
        println!("story:         {story}");
    }
    println!("playing:       {}", st.is_playing);
    if let Some(error) = &st.error_message {
        println!("error:         {error}");
    }
}

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

/// Parse one shell line into a command; `None` for anything unrecognised
/// (blanks, `status` and `quit` are handled by the shell loop itself).
fn parse_line(line: &str) -> Option<ExplorerCommand> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("template ") {
        return Some(ExplorerCommand::SetPromptTemplate(rest.trim().to_string()));
    }

    match line {
        "story" => return Some(ExplorerCommand::GenerateStory),
        "toggle" => return Some(ExplorerCommand::TogglePlayback),
        _ => {}
    }

    if line == "lost" || line.starts_with("lost ") {
        let message = line
            .strip_prefix("lost")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("Unable to get your location. Please enable location services.");
        return Some(ExplorerCommand::Location(LocationEvent::Unavailable(
            message.to_string(),
        )));
    }

    // "<lat> <lon>" or "<lat>,<lon>"
    let mut parts = line.split(|c: char| c == ',' || c.is_whitespace());
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lon = parts.find(|p| !p.is_empty())?.trim().parse::<f64>().ok()?;
    Some(ExplorerCommand::Location(LocationEvent::Sample(
        Coordinate::new(lat, lon),
    )))
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("city-stories starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Adapters
    let resolver: Arc<dyn CityResolver> =
        Arc::new(NominatimResolver::from_config(&config.geocoding));
    let generator: Arc<dyn StoryGenerator> =
        Arc::new(ApiStoryGenerator::from_config(&config.story));
    let synthesizer: Arc<dyn SpeechSynthesizer> =
        Arc::new(ElevenLabsSynthesizer::from_config(&config.speech));

    // 4. Audio sink — degrade gracefully when no output device exists.
    let sink: Box<dyn AudioSink> = match RodioSink::new() {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            log::warn!("Audio output unavailable ({e}); narration will be silent");
            Box::new(NullSink::new())
        }
    };
    let playback = PlaybackController::new(sink);

    // 5. Shared state, channel, orchestrator, tick task
    let state = new_shared_state(config);
    let (command_tx, command_rx) = mpsc::channel::<ExplorerCommand>(32);

    let orchestrator = StoryOrchestrator::new(
        Arc::clone(&state),
        resolver,
        generator,
        synthesizer,
        playback,
    );
    let orchestrator_task = tokio::spawn(orchestrator.run(command_rx));

    {
        let tick_tx = command_tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(200));
            loop {
                interval.tick().await;
                if tick_tx.send(ExplorerCommand::Tick).await.is_err() {
                    break;
                }
            }
        });
    }

    // 6. Shell loop — stdin is blocking, so read lines off the runtime.
    let (line_tx, mut line_rx) = mpsc::channel::<String>(8);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break, // EOF
                    Ok(_) => {
                        if line_tx.blocking_send(line.trim_end().to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        })?;

    println!("city-stories shell — `<lat> <lon>` to move, `story`, `toggle`, `status`, `quit`");

    while let Some(line) = line_rx.recv().await {
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "status" => {
                print_status(&state);
                continue;
            }
            other => match parse_line(other) {
                Some(command) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                    // Give the orchestrator a beat, then show what changed.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    print_status(&state);
                }
                None => println!("unrecognised command: {other}"),
            },
        }
    }

    // Closing the command channel shuts the orchestrator down.
    drop(command_tx);
    let _ = orchestrator_task.await;

    log::info!("city-stories shutting down");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
