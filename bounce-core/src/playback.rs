//! # Playback Module
//!
//! Replays a recorded note sequence on its original timing. The scheduler
//! runs on a single worker thread that sleeps between events and checks a
//! shared cancellation flag at every step, so stopping is cooperative and
//! no callback fires after the cancellation point.
//!
//! At most one playback is active per player: starting a new one cancels
//! the previous worker and waits for it to terminate before the new one is
//! spawned, so exactly one task ever walks the event log at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::debug;

use crate::error::{CoreError, CoreResult};
use crate::sequence::NoteEvent;

/// Granularity of the cancellation poll while waiting between events.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Schedules note events on their recorded relative timing.
pub struct SequencePlayer {
    cancel: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Default for SequencePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencePlayer {
    /// Creates an idle player.
    pub fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Returns true while a playback worker is delivering events.
    pub fn is_playing(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Starts playing `events`, invoking `on_note` for each one at its
    /// recorded offset from the previous event.
    ///
    /// Any playback already in progress is cancelled and joined first.
    ///
    /// # Errors
    /// [`CoreError::EmptySequence`] when there is nothing to play.
    pub fn play<F>(&mut self, events: Vec<NoteEvent>, mut on_note: F) -> CoreResult<()>
    where
        F: FnMut(NoteEvent) + Send + 'static,
    {
        if events.is_empty() {
            return Err(CoreError::EmptySequence);
        }

        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicBool::new(true));
        self.cancel = Arc::clone(&cancel);
        self.active = Arc::clone(&active);

        debug!("playback started: {} events", events.len());
        self.worker = Some(thread::spawn(move || {
            let mut last_time = 0.0_f32;

            for event in events {
                let wait = event.timestamp - last_time;
                if wait > 0.0 && !sleep_cancellable(Duration::from_secs_f32(wait), &cancel) {
                    break;
                }
                // Cancellation point: nothing fires past a stop request
                if cancel.load(Ordering::SeqCst) {
                    break;
                }

                last_time = event.timestamp;
                on_note(event);
            }

            active.store(false, Ordering::SeqCst);
            debug!("playback worker finished");
        }));

        Ok(())
    }

    /// Channel variant of [`SequencePlayer::play`]: events are delivered on
    /// the returned receiver instead of a callback. The channel disconnects
    /// when playback completes or is stopped.
    pub fn play_channel(&mut self, events: Vec<NoteEvent>) -> CoreResult<Receiver<NoteEvent>> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.play(events, move |event| {
            let _ = sender.send(event);
        })?;
        Ok(receiver)
    }

    /// Requests cancellation and waits for the worker to terminate.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for SequencePlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sleeps for `duration` in small slices, returning false if the cancel
/// flag was raised before the time elapsed.
fn sleep_cancellable(duration: Duration, cancel: &AtomicBool) -> bool {
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let slice = remaining.min(POLL_INTERVAL);
        thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
    !cancel.load(Ordering::SeqCst)
}
