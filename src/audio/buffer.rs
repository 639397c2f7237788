//! Playback jitter buffer
//!
//! Reconstructs a continuous stream from a packet flow with no ordering
//! or delivery guarantee. Frames queue in arrival order; the output side
//! drains from the head at the frame cadence. A full queue evicts the
//! oldest unplayed frame so latency stays bounded; an empty queue repeats
//! the last played frame so playback never drops out.

use crossbeam::queue::ArrayQueue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::frame::AudioFrame;

/// Bounded arrival-order queue between the mesh delivery thread and the
/// audio output thread.
pub struct PlaybackBuffer {
    queue: ArrayQueue<AudioFrame>,
    /// Touched only by the output thread; held for a clone.
    last_played: Mutex<Option<AudioFrame>>,
    enqueued: AtomicU64,
    evicted: AtomicU64,
    underruns: AtomicU64,
}

impl PlaybackBuffer {
    /// Buffer holding at most `capacity` frames (the jitter budget).
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            last_played: Mutex::new(None),
            enqueued: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
        }
    }

    /// Queue a decoded frame at the tail.
    ///
    /// When the buffer is full the oldest queued frame is evicted to admit
    /// the new one (drop-oldest backpressure). Never blocks.
    pub fn enqueue(&self, frame: AudioFrame) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        if self.queue.force_push(frame).is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the next frame to play.
    ///
    /// An empty buffer repeats the most recently played frame (counted as
    /// an underrun). Returns `None` only before any frame has ever been
    /// played; the sink emits silence for that gap.
    pub fn next_frame(&self) -> Option<AudioFrame> {
        match self.queue.pop() {
            Some(frame) => {
                *self.last_played.lock() = Some(frame.clone());
                Some(frame)
            }
            None => {
                let last = self.last_played.lock().clone();
                if last.is_some() {
                    self.underruns.fetch_add(1, Ordering::Relaxed);
                }
                last
            }
        }
    }

    /// Frames currently queued
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Counter snapshot
    pub fn stats(&self) -> PlaybackStats {
        PlaybackStats {
            queued: self.queue.len(),
            capacity: self.queue.capacity(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
        }
    }
}

/// Playback buffer statistics
#[derive(Debug, Clone)]
pub struct PlaybackStats {
    pub queued: usize,
    pub capacity: usize,
    pub enqueued: u64,
    pub evicted: u64,
    pub underruns: u64,
}
