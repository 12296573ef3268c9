//! Narration pipeline state machine.
//!
//! [`NarrationState`] drives the two-stage generation pipeline. The
//! presentation layer reads it via the shared app state to render the story
//! card, spinner, and error banner.
//!
//! The state machine transitions are:
//!
//! ```text
//! Idle ──start───────────▶ GeneratingText
//!        ──text ok───────▶ GeneratingAudio   (story carried forward)
//!        ──audio ok──────▶ Ready             (auto-play)
//! GeneratingText  ──err──▶ Failed { story: None }
//! GeneratingAudio ──err──▶ Failed { story: Some(..) }   (text survives)
//! Ready / Failed  ──new arrival──▶ Idle                 (stale story cleared)
//! ```
//!
//! Modelling this as one tagged union makes illegal combinations — a story
//! before text generation finished, audio outside `Ready`, "generating" and
//! "failed" at once — unrepresentable.

use crate::narrate::speech::AudioClip;

/// States of the narration pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NarrationState {
    /// Nothing generated yet, or reset by a new arrival.
    #[default]
    Idle,

    /// The text-generation request is in flight.
    GeneratingText,

    /// Text succeeded; the speech-synthesis request is in flight.
    GeneratingAudio {
        /// The generated story, already displayable.
        story: String,
    },

    /// Both stages succeeded; the clip is loaded into the playback
    /// controller.
    Ready { story: String, clip: AudioClip },

    /// One of the stages failed. `story` is `None` when text generation
    /// failed, `Some` when only the audio stage failed — the user still
    /// gets to read the story.
    Failed {
        story: Option<String>,
        message: String,
    },
}

impl NarrationState {
    /// Returns `true` while a pipeline run is in flight.
    ///
    /// The presentation layer uses this to disable the "tell me about this
    /// city" affordance; the orchestrator uses it as the at-most-one-run
    /// guard.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            NarrationState::GeneratingText | NarrationState::GeneratingAudio { .. }
        )
    }

    /// A short human-readable label for the status line.
    pub fn label(&self) -> &'static str {
        match self {
            NarrationState::Idle => "Idle",
            NarrationState::GeneratingText => "Generating story",
            NarrationState::GeneratingAudio { .. } => "Generating audio",
            NarrationState::Ready { .. } => "Ready",
            NarrationState::Failed { .. } => "Failed",
        }
    }

    /// The story text, present once text generation has succeeded (and
    /// preserved through an audio-stage failure).
    pub fn story_text(&self) -> Option<&str> {
        match self {
            NarrationState::GeneratingAudio { story } | NarrationState::Ready { story, .. } => {
                Some(story)
            }
            NarrationState::Failed {
                story: Some(story), ..
            } => Some(story),
            _ => None,
        }
    }

    /// The synthesized clip, present only in `Ready`.
    pub fn clip(&self) -> Option<&AudioClip> {
        match self {
            NarrationState::Ready { clip, .. } => Some(clip),
            _ => None,
        }
    }

    /// The failure message, present only in `Failed`.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            NarrationState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> NarrationState {
        NarrationState::Ready {
            story: "Once upon a time".into(),
            clip: AudioClip::new(vec![1, 2, 3]),
        }
    }

    // ---- is_busy ---

    #[test]
    fn generating_states_are_busy() {
        assert!(NarrationState::GeneratingText.is_busy());
        assert!(NarrationState::GeneratingAudio {
            story: "s".into()
        }
        .is_busy());
    }

    #[test]
    fn terminal_states_are_not_busy() {
        assert!(!NarrationState::Idle.is_busy());
        assert!(!ready().is_busy());
        assert!(!NarrationState::Failed {
            story: None,
            message: "m".into()
        }
        .is_busy());
    }

    // ---- accessors ---

    #[test]
    fn story_text_absent_until_text_stage_succeeds() {
        assert!(NarrationState::Idle.story_text().is_none());
        assert!(NarrationState::GeneratingText.story_text().is_none());
    }

    #[test]
    fn story_text_present_in_audio_stage_and_ready() {
        let generating = NarrationState::GeneratingAudio {
            story: "tale".into(),
        };
        assert_eq!(generating.story_text(), Some("tale"));
        assert_eq!(ready().story_text(), Some("Once upon a time"));
    }

    #[test]
    fn audio_failure_preserves_story_text() {
        let failed = NarrationState::Failed {
            story: Some("tale".into()),
            message: "tts down".into(),
        };
        assert_eq!(failed.story_text(), Some("tale"));
        assert_eq!(failed.error_message(), Some("tts down"));
    }

    #[test]
    fn text_failure_has_no_story() {
        let failed = NarrationState::Failed {
            story: None,
            message: "llm down".into(),
        };
        assert!(failed.story_text().is_none());
        assert_eq!(failed.error_message(), Some("llm down"));
    }

    #[test]
    fn clip_present_only_in_ready() {
        assert!(ready().clip().is_some());
        assert!(NarrationState::Idle.clip().is_none());
        assert!(NarrationState::GeneratingAudio {
            story: "s".into()
        }
        .clip()
        .is_none());
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(NarrationState::default(), NarrationState::Idle);
    }

    #[test]
    fn labels_are_distinct_per_state() {
        assert_eq!(NarrationState::Idle.label(), "Idle");
        assert_eq!(NarrationState::GeneratingText.label(), "Generating story");
        assert_eq!(ready().label(), "Ready");
    }
}
