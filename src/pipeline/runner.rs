//! Story orchestrator — drives the coordinate → city → story → audio loop.
//!
//! [`StoryOrchestrator`] owns the [`SharedState`] and responds to
//! [`ExplorerCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Command flow
//!
//! ```text
//! Location(Sample)
//!   └─▶ resolve city → detector.observe
//!         └─ arrival? → reset narration to Idle, clear playback
//!
//! GenerateStory                       (no-op while a run is in flight)
//!   └─▶ render template → generate    [GeneratingText]
//!         └─▶ synthesize              [GeneratingAudio]
//!               └─▶ load clip, auto-play         [Ready]
//!         └─ either stage fails → [Failed], stage-distinct message
//!
//! TogglePlayback / Tick → playback controller, mirrored into state
//! ```
//!
//! Every command is handled to completion before the next one is taken off
//! the channel, so detection and pipeline transitions never interleave and
//! at most one narration run is ever in flight.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::detect::CityChangeDetector;
use crate::geo::LocationEvent;
use crate::geocode::{CityCandidate, CityResolver};
use crate::narrate::{NarrationState, PromptTemplate, SpeechSynthesizer, StoryGenerator};
use crate::playback::PlaybackController;

use super::state::SharedState;

// ---------------------------------------------------------------------------
// ExplorerCommand
// ---------------------------------------------------------------------------

/// Everything the geolocation feed and the presentation layer can ask of
/// the core.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerCommand {
    /// A feed event: fresh sample or feed failure.
    Location(LocationEvent),

    /// The user pressed "tell me about this city".
    GenerateStory,

    /// The user pressed the play/pause button.
    TogglePlayback,

    /// The user edited the story prompt template.
    SetPromptTemplate(String),

    /// Periodic housekeeping: detect natural end of playback.
    Tick,
}

// ---------------------------------------------------------------------------
// StoryOrchestrator
// ---------------------------------------------------------------------------

/// Drives the complete city-story pipeline.
///
/// Create with [`StoryOrchestrator::new`], then call [`run`](Self::run)
/// inside a tokio task.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use city_stories::config::AppConfig;
/// use city_stories::pipeline::{new_shared_state, StoryOrchestrator};
/// use city_stories::playback::{NullSink, PlaybackController};
///
/// # async fn example() {
/// # use city_stories::geocode::CityResolver;
/// # use city_stories::narrate::{SpeechSynthesizer, StoryGenerator};
/// # fn make_resolver() -> Arc<dyn CityResolver> { unimplemented!() }
/// # fn make_generator() -> Arc<dyn StoryGenerator> { unimplemented!() }
/// # fn make_synthesizer() -> Arc<dyn SpeechSynthesizer> { unimplemented!() }
/// let shared_state = new_shared_state(AppConfig::default());
/// let playback = PlaybackController::new(Box::new(NullSink::new()));
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// let orchestrator = StoryOrchestrator::new(
///     shared_state,
///     make_resolver(),
///     make_generator(),
///     make_synthesizer(),
///     playback,
/// );
/// orchestrator.run(rx).await;
/// # let _ = tx;
/// # }
/// ```
pub struct StoryOrchestrator {
    state: SharedState,
    resolver: Arc<dyn CityResolver>,
    generator: Arc<dyn StoryGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: PlaybackController,
    detector: CityChangeDetector,
}

impl StoryOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `state`       — shared application state (also read by the UI).
    /// * `resolver`    — reverse-geocoding backend (e.g. `NominatimResolver`).
    /// * `generator`   — story backend (e.g. `ApiStoryGenerator`).
    /// * `synthesizer` — TTS backend (e.g. `ElevenLabsSynthesizer`).
    /// * `playback`    — controller wrapping the audio sink.
    pub fn new(
        state: SharedState,
        resolver: Arc<dyn CityResolver>,
        generator: Arc<dyn StoryGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        playback: PlaybackController,
    ) -> Self {
        Self {
            state,
            resolver,
            generator,
            synthesizer,
            playback,
            detector: CityChangeDetector::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until `command_rx` is closed.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`. It never returns while the channel is open.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<ExplorerCommand>) {
        while let Some(command) = command_rx.recv().await {
            match command {
                ExplorerCommand::Location(event) => self.handle_location(event).await,
                ExplorerCommand::GenerateStory => self.handle_generate().await,
                ExplorerCommand::TogglePlayback => self.handle_toggle(),
                ExplorerCommand::SetPromptTemplate(template) => self.set_template(template),
                ExplorerCommand::Tick => self.handle_tick(),
            }
        }

        log::info!("orchestrator: command channel closed, shutting down");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Handle a feed event: resolve the sample, feed the detector, react to
    /// an arrival.
    async fn handle_location(&mut self, event: LocationEvent) {
        let coord = match event {
            LocationEvent::Sample(coord) => coord,
            LocationEvent::Unavailable(message) => {
                log::error!("location feed unavailable: {message}");
                self.set_error(message);
                return;
            }
        };

        {
            let mut st = self.state.lock().unwrap();
            st.position = Some(coord);
        }

        // Every sample triggers a fresh lookup — no cache by design.
        let candidate = match self.resolver.resolve_city(coord).await {
            Ok(candidate) => candidate,
            Err(e) => {
                // Non-fatal: treated as "don't know", city shows as N/A.
                log::warn!("geocoding failed: {e}");
                self.set_error(format!("City lookup failed: {e}"));
                CityCandidate::Unresolved
            }
        };

        let arrival = self.detector.observe(candidate);

        {
            let mut st = self.state.lock().unwrap();
            st.detection = self.detector.state().clone();
        }

        if let Some(arrival) = arrival {
            log::info!("arrived in {}", arrival.city);
            // Stale content from the previous city must never linger.
            self.playback.clear();
            let mut st = self.state.lock().unwrap();
            st.narration = NarrationState::Idle;
            st.is_playing = self.playback.is_playing();
        }
    }

    /// Handle the "tell me about this city" trigger: run the two-stage
    /// narration pipeline to completion.
    async fn handle_generate(&mut self) {
        let (busy, city, template, autoplay) = {
            let st = self.state.lock().unwrap();
            (
                st.narration.is_busy(),
                st.detection.last_confirmed.clone(),
                PromptTemplate::new(st.config.story.prompt_template.clone()),
                st.config.playback.autoplay,
            )
        };

        // At most one run in flight.
        if busy {
            log::debug!("narration already running, ignoring trigger");
            return;
        }

        let Some(city) = city else {
            log::warn!("no confirmed city yet, ignoring narration trigger");
            return;
        };

        // ── 1. Text stage ────────────────────────────────────────────────
        // A fresh run replaces whatever the previous one left behind.
        self.playback.clear();
        {
            let mut st = self.state.lock().unwrap();
            st.narration = NarrationState::GeneratingText;
            st.is_playing = self.playback.is_playing();
            st.error_message = None;
        }

        let prompt = template.render(&city);
        log::debug!("generating story for {city}");

        let story = match self.generator.generate(&prompt).await {
            Ok(story) => story,
            Err(e) => {
                log::error!("story generation failed: {e}");
                self.fail_narration(None, format!("Failed to generate story: {e}"));
                return;
            }
        };

        {
            let mut st = self.state.lock().unwrap();
            st.narration = NarrationState::GeneratingAudio {
                story: story.clone(),
            };
        }

        // ── 2. Audio stage ───────────────────────────────────────────────
        log::debug!("synthesizing narration for {city}");

        let clip = match self.synthesizer.synthesize(&story).await {
            Ok(clip) => clip,
            Err(e) => {
                log::error!("audio generation failed: {e}");
                // The story text survives an audio-stage failure.
                self.fail_narration(Some(story), format!("Failed to generate audio: {e}"));
                return;
            }
        };

        // ── 3. Hand the clip to playback ─────────────────────────────────
        if let Err(e) = self.playback.set_clip(&clip, autoplay) {
            // Narration is still Ready — the user keeps the story text and
            // can retry the toggle, it just cannot sound right now.
            log::warn!("could not start playback: {e}");
            self.set_error(format!("Audio playback failed: {e}"));
        }

        let mut st = self.state.lock().unwrap();
        st.narration = NarrationState::Ready { story, clip };
        st.is_playing = self.playback.is_playing();
    }

    /// Handle the play/pause button.
    fn handle_toggle(&mut self) {
        self.playback.toggle();
        let mut st = self.state.lock().unwrap();
        st.is_playing = self.playback.is_playing();
    }

    /// Periodic poll for the natural end of playback.
    fn handle_tick(&mut self) {
        if self.playback.poll() {
            let mut st = self.state.lock().unwrap();
            st.is_playing = self.playback.is_playing();
        }
    }

    fn set_template(&mut self, template: String) {
        log::debug!("prompt template updated");
        let mut st = self.state.lock().unwrap();
        st.config.story.prompt_template = template;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn fail_narration(&mut self, story: Option<String>, message: String) {
        let mut st = self.state.lock().unwrap();
        st.narration = NarrationState::Failed {
            story,
            message: message.clone(),
        };
        st.is_playing = self.playback.is_playing();
        st.error_message = Some(message);
    }

    fn set_error(&self, message: String) {
        let mut st = self.state.lock().unwrap();
        st.error_message = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::geo::Coordinate;
    use crate::geocode::{GeocodeError, MockResolver};
    use crate::narrate::{AudioClip, SpeechError, StoryError};
    use crate::pipeline::state::new_shared_state;
    use crate::playback::NullSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Mock generator that records prompts and succeeds with a fixed story.
    struct OkStory {
        story: String,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl OkStory {
        fn new(story: &str) -> Self {
            Self {
                story: story.into(),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StoryGenerator for OkStory {
        async fn generate(&self, prompt: &str) -> Result<String, StoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.story.clone())
        }
    }

    /// Mock generator that always fails.
    struct FailStory;

    #[async_trait]
    impl StoryGenerator for FailStory {
        async fn generate(&self, _prompt: &str) -> Result<String, StoryError> {
            Err(StoryError::Timeout)
        }
    }

    /// Mock synthesizer that succeeds with a tiny clip.
    struct OkSpeech;

    #[async_trait]
    impl SpeechSynthesizer for OkSpeech {
        async fn synthesize(&self, _text: &str) -> Result<AudioClip, SpeechError> {
            Ok(AudioClip::new(vec![0xff, 0xfb, 0x90]))
        }
    }

    /// Mock synthesizer that always fails.
    struct FailSpeech;

    #[async_trait]
    impl SpeechSynthesizer for FailSpeech {
        async fn synthesize(&self, _text: &str) -> Result<AudioClip, SpeechError> {
            Err(SpeechError::Status {
                status: 401,
                body: "bad key".into(),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn coord() -> Coordinate {
        Coordinate::new(48.8566, 2.3522)
    }

    fn make_orchestrator(
        resolver: Arc<dyn CityResolver>,
        generator: Arc<dyn StoryGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> (StoryOrchestrator, SharedState) {
        let state = new_shared_state(AppConfig::default());
        let playback = PlaybackController::new(Box::new(NullSink::new()));
        let orc = StoryOrchestrator::new(
            Arc::clone(&state),
            resolver,
            generator,
            synthesizer,
            playback,
        );
        (orc, state)
    }

    async fn drive(orc: StoryOrchestrator, commands: Vec<ExplorerCommand>) {
        let (tx, rx) = mpsc::channel(32);
        for cmd in commands {
            tx.send(cmd).await.unwrap();
        }
        drop(tx); // close channel so run() returns
        orc.run(rx).await;
    }

    fn sample() -> ExplorerCommand {
        ExplorerCommand::Location(LocationEvent::Sample(coord()))
    }

    // -----------------------------------------------------------------------
    // Detection through the orchestrator
    // -----------------------------------------------------------------------

    /// A resolving sample must confirm the city and raise the affordance.
    #[tokio::test]
    async fn sample_confirms_city_and_raises_affordance() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(OkStory::new("story")),
            Arc::new(OkSpeech),
        );

        drive(orc, vec![sample()]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.detection.last_confirmed.as_deref(), Some("Paris"));
        assert_eq!(st.current_city_label(), "Paris");
        assert!(st.detection.arrival_pending);
        assert_eq!(st.position, Some(coord()));
        assert_eq!(st.narration, NarrationState::Idle);
    }

    /// A geocoding failure is non-fatal: city shows N/A, a diagnostic is
    /// surfaced, nothing crashes, no arrival fires.
    #[tokio::test]
    async fn geocoding_failure_is_nonfatal() {
        let resolver = MockResolver::new(vec![Err(GeocodeError::Status {
            status: 503,
            body: "overloaded".into(),
        })]);
        let (orc, state) = make_orchestrator(
            Arc::new(resolver),
            Arc::new(OkStory::new("story")),
            Arc::new(OkSpeech),
        );

        drive(orc, vec![sample()]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.current_city_label(), "N/A");
        assert!(st.detection.last_confirmed.is_none());
        assert!(!st.detection.arrival_pending);
        assert!(st
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("City lookup failed")));
    }

    /// Feed failure surfaces as the latest error without touching detection.
    #[tokio::test]
    async fn feed_unavailable_sets_banner_message() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(OkStory::new("story")),
            Arc::new(OkSpeech),
        );

        drive(
            orc,
            vec![ExplorerCommand::Location(LocationEvent::Unavailable(
                "Unable to get your location. Please enable location services.".into(),
            ))],
        )
        .await;

        let st = state.lock().unwrap();
        assert!(st
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("location services")));
        assert!(st.detection.current.is_none());
    }

    /// Springfield, Springfield again, then Shelbyville: the story from the
    /// first arrival is cleared by the second, and the label ends correct.
    #[tokio::test]
    async fn new_city_resets_story_but_same_city_does_not() {
        let resolver = MockResolver::new(vec![
            Ok(CityCandidate::Resolved("Springfield".into())),
            Ok(CityCandidate::Resolved("Springfield".into())),
            Ok(CityCandidate::Resolved("Shelbyville".into())),
        ]);
        let generator = Arc::new(OkStory::new("tale of Springfield"));
        let (orc, state) = make_orchestrator(
            Arc::new(resolver),
            Arc::clone(&generator) as Arc<dyn StoryGenerator>,
            Arc::new(OkSpeech),
        );

        drive(
            orc,
            vec![
                sample(),
                ExplorerCommand::GenerateStory,
                // Same city again: narration must survive.
                sample(),
                // New city: narration must reset.
                sample(),
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.detection.last_confirmed.as_deref(), Some("Shelbyville"));
        assert_eq!(st.current_city_label(), "Shelbyville");
        assert_eq!(st.narration, NarrationState::Idle, "stale story cleared");
        assert!(!st.is_playing);
        // Only the explicit trigger generated; the repeat sample did not.
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    // -----------------------------------------------------------------------
    // Narration pipeline
    // -----------------------------------------------------------------------

    /// Full happy path: text, audio, ready, auto-playing.
    #[tokio::test]
    async fn happy_path_reaches_ready_and_autoplays() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(OkStory::new("a tale of Paris")),
            Arc::new(OkSpeech),
        );

        drive(orc, vec![sample(), ExplorerCommand::GenerateStory]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.narration.story_text(), Some("a tale of Paris"));
        assert!(st.narration.clip().is_some());
        assert!(st.is_playing, "autoplay on ready");
        assert!(st.error_message.is_none());
    }

    /// The prompt template renders the confirmed city into the exact prompt
    /// sent to the generator.
    #[tokio::test]
    async fn template_renders_city_into_outbound_prompt() {
        let generator = Arc::new(OkStory::new("story"));
        let (orc, _state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::clone(&generator) as Arc<dyn StoryGenerator>,
            Arc::new(OkSpeech),
        );

        drive(
            orc,
            vec![
                sample(),
                ExplorerCommand::SetPromptTemplate("Tell me about {city}".into()),
                ExplorerCommand::GenerateStory,
            ],
        )
        .await;

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.as_slice(), ["Tell me about Paris"]);
    }

    /// Text-stage failure: Failed, no story, text-stage message.
    #[tokio::test]
    async fn text_failure_leaves_no_story() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(FailStory),
            Arc::new(OkSpeech),
        );

        drive(orc, vec![sample(), ExplorerCommand::GenerateStory]).await;

        let st = state.lock().unwrap();
        assert!(st.narration.story_text().is_none());
        assert!(st
            .narration
            .error_message()
            .is_some_and(|m| m.contains("Failed to generate story")));
        assert!(!st.is_playing);
    }

    /// Audio-stage failure after text succeeded: Failed, story preserved,
    /// audio-stage message, not playing.
    #[tokio::test]
    async fn audio_failure_preserves_story() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(OkStory::new("a tale of Paris")),
            Arc::new(FailSpeech),
        );

        drive(orc, vec![sample(), ExplorerCommand::GenerateStory]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.narration.story_text(), Some("a tale of Paris"));
        assert!(st.narration.clip().is_none());
        assert!(st
            .narration
            .error_message()
            .is_some_and(|m| m.contains("Failed to generate audio")));
        assert!(!st.is_playing);
    }

    /// Triggering narration while a run is in flight must not issue a
    /// duplicate outbound call or change state.
    #[tokio::test]
    async fn trigger_while_busy_is_a_noop() {
        let generator = Arc::new(OkStory::new("story"));
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::clone(&generator) as Arc<dyn StoryGenerator>,
            Arc::new(OkSpeech),
        );

        // Simulate an in-flight run observed through shared state.
        {
            let mut st = state.lock().unwrap();
            st.detection.last_confirmed = Some("Paris".into());
            st.narration = NarrationState::GeneratingText;
        }

        drive(orc, vec![ExplorerCommand::GenerateStory]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.narration, NarrationState::GeneratingText);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    /// Triggering narration before any city is confirmed is a no-op.
    #[tokio::test]
    async fn trigger_without_city_is_a_noop() {
        let generator = Arc::new(OkStory::new("story"));
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::clone(&generator) as Arc<dyn StoryGenerator>,
            Arc::new(OkSpeech),
        );

        drive(orc, vec![ExplorerCommand::GenerateStory]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.narration, NarrationState::Idle);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    /// A run may be re-triggered from Failed — that is the only recovery.
    #[tokio::test]
    async fn failed_run_can_be_retriggered() {
        let generator = Arc::new(OkStory::new("second try"));
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::clone(&generator) as Arc<dyn StoryGenerator>,
            Arc::new(OkSpeech),
        );

        {
            let mut st = state.lock().unwrap();
            st.detection.last_confirmed = Some("Paris".into());
            st.narration = NarrationState::Failed {
                story: None,
                message: "Failed to generate story: earlier".into(),
            };
        }

        drive(orc, vec![ExplorerCommand::GenerateStory]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.narration.story_text(), Some("second try"));
        assert!(st.error_message.is_none(), "stale error cleared on retry");
    }

    // -----------------------------------------------------------------------
    // Playback through the orchestrator
    // -----------------------------------------------------------------------

    /// Toggling before any narration exists leaves everything untouched.
    #[tokio::test]
    async fn toggle_without_clip_is_a_noop() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(OkStory::new("story")),
            Arc::new(OkSpeech),
        );

        drive(orc, vec![ExplorerCommand::TogglePlayback]).await;

        let st = state.lock().unwrap();
        assert!(!st.is_playing);
    }

    /// Toggle pauses a narration that is auto-playing.
    #[tokio::test]
    async fn toggle_pauses_playing_narration() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(OkStory::new("story")),
            Arc::new(OkSpeech),
        );

        drive(
            orc,
            vec![
                sample(),
                ExplorerCommand::GenerateStory,
                ExplorerCommand::TogglePlayback, // pause
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert!(st.narration.clip().is_some());
        assert!(!st.is_playing);
    }

    /// The NullSink reports the clip as immediately finished, so a tick
    /// right after ready registers the natural end.
    #[tokio::test]
    async fn tick_detects_natural_end() {
        let (orc, state) = make_orchestrator(
            Arc::new(MockResolver::always("Paris")),
            Arc::new(OkStory::new("story")),
            Arc::new(OkSpeech),
        );

        drive(
            orc,
            vec![sample(), ExplorerCommand::GenerateStory, ExplorerCommand::Tick],
        )
        .await;

        let st = state.lock().unwrap();
        assert!(!st.is_playing);
        // The clip stays available for a manual replay.
        assert!(st.narration.clip().is_some());
    }
}
