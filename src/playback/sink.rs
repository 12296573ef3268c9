//! Audio sink implementations.
//!
//! [`RodioSink`] owns the rodio output stream on a dedicated thread, because
//! the underlying cpal stream is not `Send`. The sink handle communicates
//! with that thread over a std mpsc channel and mirrors "has the clip played
//! out" through an `AtomicBool`, so callers can poll for the natural end.
//!
//! [`NullSink`] is the degrade-gracefully fallback: the app still runs on a
//! machine with no audio device, it just cannot make sound.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use rodio::{Decoder, OutputStreamBuilder, Sink};
use thiserror::Error;

use crate::narrate::AudioClip;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or playing a clip.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No audio output device could be opened.
    #[error("failed to open audio output: {0}")]
    Device(String),

    /// The clip bytes could not be decoded as audio.
    #[error("failed to decode audio clip: {0}")]
    Decode(String),

    /// The playback thread has shut down.
    #[error("playback thread is gone")]
    Closed,
}

// ---------------------------------------------------------------------------
// AudioSink trait
// ---------------------------------------------------------------------------

/// Trait over the audio output device.
///
/// A sink holds at most one clip. Loading a new clip replaces the previous
/// one; its playback position is discarded, not merged.
pub trait AudioSink: Send {
    /// Replace the current clip. The sink is left paused; call
    /// [`play`](Self::play) to start.
    fn load(&mut self, clip: &AudioClip) -> Result<(), PlaybackError>;

    /// Resume (or start) playback of the loaded clip.
    fn play(&mut self);

    /// Pause playback, keeping the position.
    fn pause(&mut self);

    /// Discard the loaded clip entirely.
    fn stop(&mut self);

    /// `true` once the loaded clip has played to its natural end.
    fn finished(&self) -> bool;
}

// ---------------------------------------------------------------------------
// RodioSink
// ---------------------------------------------------------------------------

enum SinkCommand {
    Load(Decoder<Cursor<Vec<u8>>>),
    Play,
    Pause,
    Stop,
}

/// Rodio-backed sink.
///
/// Clips are decoded on the caller's thread (so decode failures surface
/// synchronously from [`load`](AudioSink::load)) and shipped to the playback
/// thread, which owns the `OutputStream` + `Sink` pair for the process
/// lifetime. The thread polls `Sink::empty()` between commands to flip the
/// shared `finished` flag.
pub struct RodioSink {
    tx: mpsc::Sender<SinkCommand>,
    finished: Arc<AtomicBool>,
}

impl RodioSink {
    /// Spawn the playback thread and open the default output device.
    ///
    /// Fails with [`PlaybackError::Device`] when no output device is
    /// available; callers are expected to fall back to [`NullSink`].
    pub fn new() -> Result<Self, PlaybackError> {
        let (tx, rx) = mpsc::channel::<SinkCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), PlaybackError>>();
        let finished = Arc::new(AtomicBool::new(false));
        let finished_thread = Arc::clone(&finished);

        std::thread::Builder::new()
            .name("audio-playback".into())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(PlaybackError::Device(e.to_string())));
                        return;
                    }
                };

                let sink = Sink::connect_new(stream.mixer());
                sink.pause();

                let mut loaded = false;
                loop {
                    match rx.recv_timeout(Duration::from_millis(100)) {
                        Ok(SinkCommand::Load(source)) => {
                            sink.clear(); // clear() leaves the sink paused
                            sink.append(source);
                            loaded = true;
                            finished_thread.store(false, Ordering::SeqCst);
                        }
                        Ok(SinkCommand::Play) => sink.play(),
                        Ok(SinkCommand::Pause) => sink.pause(),
                        Ok(SinkCommand::Stop) => {
                            sink.clear();
                            loaded = false;
                            finished_thread.store(false, Ordering::SeqCst);
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            if loaded && sink.empty() {
                                finished_thread.store(true, Ordering::SeqCst);
                            }
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }

                log::debug!("playback: command channel closed, thread exiting");
            })
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        ready_rx.recv().map_err(|_| PlaybackError::Closed)??;

        Ok(Self { tx, finished })
    }

    fn send(&self, cmd: SinkCommand) {
        if self.tx.send(cmd).is_err() {
            log::warn!("playback: thread gone, command dropped");
        }
    }
}

impl AudioSink for RodioSink {
    fn load(&mut self, clip: &AudioClip) -> Result<(), PlaybackError> {
        let source = Decoder::new(Cursor::new(clip.bytes().to_vec()))
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        self.tx
            .send(SinkCommand::Load(source))
            .map_err(|_| PlaybackError::Closed)
    }

    fn play(&mut self) {
        self.send(SinkCommand::Play);
    }

    fn pause(&mut self) {
        self.send(SinkCommand::Pause);
    }

    fn stop(&mut self) {
        self.send(SinkCommand::Stop);
    }

    fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// NullSink
// ---------------------------------------------------------------------------

/// Inert sink for environments without an audio device (CI, headless boxes)
/// and for tests.
///
/// Reports the clip as immediately finished, so auto-played narrations do
/// not leave the app claiming to play sound it cannot make.
#[derive(Debug, Default)]
pub struct NullSink {
    loaded: bool,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for NullSink {
    fn load(&mut self, _clip: &AudioClip) -> Result<(), PlaybackError> {
        self.loaded = true;
        Ok(())
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn stop(&mut self) {
        self.loaded = false;
    }

    fn finished(&self) -> bool {
        self.loaded
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
