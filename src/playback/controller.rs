//! Playback controller — play/pause state for the current narration.
//!
//! Playback state has a lifecycle of its own: generating a new story does
//! not touch it until a fresh clip actually lands, and pausing never touches
//! generation. The only coupling points are [`set_clip`] (a fresh clip
//! resets `is_playing` to the caller-chosen auto-play value) and [`clear`]
//! (a new arrival discards the stale clip).
//!
//! [`set_clip`]: PlaybackController::set_clip
//! [`clear`]: PlaybackController::clear

use crate::narrate::AudioClip;

use super::sink::{AudioSink, PlaybackError};

/// Tracks whether narration audio is currently playing and forwards
/// play/pause transitions to the [`AudioSink`].
pub struct PlaybackController {
    sink: Box<dyn AudioSink>,
    loaded: bool,
    is_playing: bool,
}

impl PlaybackController {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            loaded: false,
            is_playing: false,
        }
    }

    /// `true` while the loaded clip is audibly playing.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// `true` when a clip is loaded (playing or paused).
    pub fn has_clip(&self) -> bool {
        self.loaded
    }

    /// Replace the current clip, discarding the previous one's playback
    /// state. With `autoplay` the clip starts immediately.
    ///
    /// On a load failure nothing is considered loaded and `is_playing`
    /// stays false.
    pub fn set_clip(&mut self, clip: &AudioClip, autoplay: bool) -> Result<(), PlaybackError> {
        self.loaded = false;
        self.is_playing = false;
        self.sink.load(clip)?;
        self.loaded = true;
        if autoplay {
            self.sink.play();
            self.is_playing = true;
        }
        Ok(())
    }

    /// Pause if playing, resume if paused. No-op when no clip is loaded.
    pub fn toggle(&mut self) {
        if !self.loaded {
            log::debug!("playback: toggle ignored, no clip loaded");
            return;
        }
        if self.is_playing {
            self.sink.pause();
            self.is_playing = false;
        } else {
            self.sink.play();
            self.is_playing = true;
        }
    }

    /// The clip played to its natural end.
    pub fn on_natural_end(&mut self) {
        self.is_playing = false;
    }

    /// Check the sink for a natural end; returns `true` when playback just
    /// stopped. Called periodically by the orchestrator.
    pub fn poll(&mut self) -> bool {
        if self.is_playing && self.sink.finished() {
            log::debug!("playback: clip finished");
            self.on_natural_end();
            true
        } else {
            false
        }
    }

    /// Discard the loaded clip (new arrival, stale narration).
    pub fn clear(&mut self) {
        if self.loaded {
            self.sink.stop();
        }
        self.loaded = false;
        self.is_playing = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink that records every call, for asserting side effects.
    #[derive(Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<&'static str>>>,
        finished: bool,
        fail_load: bool,
    }

    impl RecordingSink {
        fn with_log() -> (Self, Arc<Mutex<Vec<&'static str>>>) {
            let sink = Self::default();
            let log = Arc::clone(&sink.calls);
            (sink, log)
        }
    }

    impl AudioSink for RecordingSink {
        fn load(&mut self, _clip: &AudioClip) -> Result<(), PlaybackError> {
            if self.fail_load {
                return Err(PlaybackError::Decode("bad clip".into()));
            }
            self.calls.lock().unwrap().push("load");
            Ok(())
        }
        fn play(&mut self) {
            self.calls.lock().unwrap().push("play");
        }
        fn pause(&mut self) {
            self.calls.lock().unwrap().push("pause");
        }
        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop");
        }
        fn finished(&self) -> bool {
            self.finished
        }
    }

    fn clip() -> AudioClip {
        AudioClip::new(vec![0xff, 0xfb])
    }

    #[test]
    fn toggle_without_clip_is_a_noop() {
        let (sink, log) = RecordingSink::with_log();
        let mut ctl = PlaybackController::new(Box::new(sink));

        ctl.toggle();

        assert!(!ctl.is_playing());
        assert!(log.lock().unwrap().is_empty(), "no sink side effects");
    }

    #[test]
    fn autoplay_starts_immediately() {
        let (sink, log) = RecordingSink::with_log();
        let mut ctl = PlaybackController::new(Box::new(sink));

        ctl.set_clip(&clip(), true).expect("load");

        assert!(ctl.is_playing());
        assert!(ctl.has_clip());
        assert_eq!(*log.lock().unwrap(), vec!["load", "play"]);
    }

    #[test]
    fn set_clip_without_autoplay_stays_paused() {
        let (sink, _log) = RecordingSink::with_log();
        let mut ctl = PlaybackController::new(Box::new(sink));

        ctl.set_clip(&clip(), false).expect("load");

        assert!(ctl.has_clip());
        assert!(!ctl.is_playing());
    }

    #[test]
    fn toggle_alternates_pause_and_resume() {
        let (sink, log) = RecordingSink::with_log();
        let mut ctl = PlaybackController::new(Box::new(sink));
        ctl.set_clip(&clip(), true).expect("load");

        ctl.toggle();
        assert!(!ctl.is_playing());
        ctl.toggle();
        assert!(ctl.is_playing());

        assert_eq!(*log.lock().unwrap(), vec!["load", "play", "pause", "play"]);
    }

    #[test]
    fn failed_load_leaves_nothing_loaded() {
        let sink = RecordingSink {
            fail_load: true,
            ..RecordingSink::default()
        };
        let mut ctl = PlaybackController::new(Box::new(sink));

        assert!(ctl.set_clip(&clip(), true).is_err());
        assert!(!ctl.has_clip());
        assert!(!ctl.is_playing());

        // Guard still applies after the failure.
        ctl.toggle();
        assert!(!ctl.is_playing());
    }

    #[test]
    fn natural_end_stops_playing_but_keeps_clip() {
        let (sink, _log) = RecordingSink::with_log();
        let mut ctl = PlaybackController::new(Box::new(sink));
        ctl.set_clip(&clip(), true).expect("load");

        ctl.on_natural_end();

        assert!(!ctl.is_playing());
        // The clip stays loaded: toggle restarts it.
        ctl.toggle();
        assert!(ctl.is_playing());
    }

    #[test]
    fn poll_detects_finished_sink() {
        let sink = RecordingSink {
            finished: true,
            ..RecordingSink::default()
        };
        let mut ctl = PlaybackController::new(Box::new(sink));
        ctl.set_clip(&clip(), true).expect("load");

        assert!(ctl.poll());
        assert!(!ctl.is_playing());
        // Subsequent polls report nothing new.
        assert!(!ctl.poll());
    }

    #[test]
    fn clear_discards_clip_and_stops() {
        let (sink, log) = RecordingSink::with_log();
        let mut ctl = PlaybackController::new(Box::new(sink));
        ctl.set_clip(&clip(), true).expect("load");

        ctl.clear();

        assert!(!ctl.has_clip());
        assert!(!ctl.is_playing());
        assert_eq!(*log.lock().unwrap(), vec!["load", "play", "stop"]);
    }
}
