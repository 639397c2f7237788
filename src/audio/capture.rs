//! Audio capture from the default input device
//!
//! Capture runs on a dedicated thread that owns the device stream; the
//! device callback cuts fixed-size mono frames and hands them to the
//! caller without blocking.

use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::device;
use crate::audio::frame::AudioFrame;
use crate::config::StreamConfig;
use crate::error::AudioError;

/// Callback invoked once per complete frame on the capture thread.
///
/// Must not block; a callback that outlives a frame interval costs
/// captured data.
pub type FrameCallback = Box<dyn FnMut(AudioFrame) + Send>;

/// Continuous producer of fixed-size frames.
pub trait FrameSource: Send {
    /// Begin capture, invoking `on_frame` once per complete frame until
    /// [`stop`](FrameSource::stop). Failures surface synchronously from
    /// this call; nothing is retried.
    fn start(&mut self, on_frame: FrameCallback) -> Result<(), AudioError>;

    /// Halt capture. No further `on_frame` invocations occur after this
    /// returns. Idempotent.
    fn stop(&mut self);
}

/// Accumulates channel-0 samples from interleaved device input and cuts
/// exact frames. Whatever is pending when capture stops is discarded.
pub(crate) struct FrameChunker {
    frame_samples: usize,
    channels: usize,
    pending: Vec<f32>,
}

impl FrameChunker {
    pub(crate) fn new(frame_samples: usize, channels: usize) -> Self {
        Self {
            frame_samples,
            channels,
            pending: Vec::with_capacity(frame_samples),
        }
    }

    pub(crate) fn push(&mut self, data: &[f32], mut emit: impl FnMut(AudioFrame)) {
        for sample in data.iter().step_by(self.channels) {
            self.pending.push(*sample);
            if self.pending.len() == self.frame_samples {
                let samples =
                    std::mem::replace(&mut self.pending, Vec::with_capacity(self.frame_samples));
                emit(AudioFrame::new(samples));
            }
        }
    }
}

/// Microphone capture from the default input device.
pub struct MicCapture {
    config: StreamConfig,
    running: Arc<AtomicBool>,
    frames_emitted: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MicCapture {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            frames_emitted: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    /// Frames handed to the callback since the last start
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn reap_thread(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl FrameSource for MicCapture {
    fn start(&mut self, mut on_frame: FrameCallback) -> Result<(), AudioError> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let running = self.running.clone();
        let running_for_loop = self.running.clone();
        let frames_emitted = self.frames_emitted.clone();
        let frame_samples = self.config.frame_samples;
        let sample_rate = self.config.sample_rate;

        self.frames_emitted.store(0, Ordering::SeqCst);
        running.store(true, Ordering::SeqCst);

        // The stream must be built on the capture thread (cpal streams are
        // not Send); the handshake channel carries the build outcome back
        // so start() fails synchronously.
        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

        let handle = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                let device = match device::default_input_device() {
                    Ok(d) => d,
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let stream_config = match device::input_stream_config(&device, sample_rate) {
                    Ok(c) => c,
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let channels = stream_config.channels as usize;

                let running_in_callback = running.clone();
                let mut chunker = FrameChunker::new(frame_samples, channels);

                let stream = device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if !running_in_callback.load(Ordering::Relaxed) {
                            return;
                        }
                        chunker.push(data, |frame| {
                            frames_emitted.fetch_add(1, Ordering::Relaxed);
                            on_frame(frame);
                        });
                    },
                    move |err| {
                        tracing::warn!("capture stream error: {}", err);
                    },
                    None,
                );

                match stream {
                    Ok(stream) => {
                        if let Err(e) = stream.play() {
                            running.store(false, Ordering::SeqCst);
                            let _ = ready_tx.send(Err(AudioError::StreamFailed(e.to_string())));
                            return;
                        }
                        let _ = ready_tx.send(Ok(()));

                        // Keep the thread alive while running; dropping the
                        // stream on exit halts the device callback. A
                        // partial frame pending in the chunker is dropped
                        // with it.
                        while running_for_loop.load(Ordering::Relaxed) {
                            thread::sleep(Duration::from_millis(10));
                        }
                    }
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(AudioError::StreamFailed(e.to_string())));
                    }
                }
            })
            .map_err(|e| AudioError::StreamFailed(e.to_string()))?;

        self.thread_handle = Some(handle);

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.reap_thread();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                self.reap_thread();
                Err(AudioError::StreamFailed(
                    "capture thread exited before start".into(),
                ))
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.reap_thread();
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunker_cuts_exact_frames() {
        let mut chunker = FrameChunker::new(4, 1);
        let mut frames = Vec::new();

        chunker.push(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], |f| {
            frames.push(f)
        });

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].samples, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(frames[1].samples, vec![4.0, 5.0, 6.0, 7.0]);

        // The two pending samples stay uncut until more data arrives
        chunker.push(&[10.0, 11.0], |f| frames.push(f));
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].samples, vec![8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_chunker_partial_frame_never_emitted() {
        let mut chunker = FrameChunker::new(1024, 1);
        let mut emitted = 0;

        chunker.push(&[0.5; 1000], |_| emitted += 1);
        assert_eq!(emitted, 0);
    }

    #[test]
    fn test_chunker_takes_first_channel_of_stereo() {
        let mut chunker = FrameChunker::new(3, 2);
        let mut frames = Vec::new();

        // Interleaved stereo: left 1/2/3, right 9/9/9
        chunker.push(&[1.0, 9.0, 2.0, 9.0, 3.0, 9.0], |f| frames.push(f));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples, vec![1.0, 2.0, 3.0]);
    }
}
