//! Audio playback to the default output device
//!
//! The output stream drains the shared [`PlaybackBuffer`] at the device's
//! cadence, fanning the mono signal out to every native output channel.
//! Underrun policy lives in the buffer: the last played frame repeats
//! rather than going silent. Before the first frame ever arrives the sink
//! emits silence.

use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::buffer::PlaybackBuffer;
use crate::audio::device;
use crate::config::StreamConfig;
use crate::error::AudioError;

/// Continuous consumer of buffered frames.
pub trait OutputSink: Send {
    /// Start continuous playback draining `buffer`. Failures surface
    /// synchronously from this call.
    fn start(&mut self, buffer: Arc<PlaybackBuffer>) -> Result<(), AudioError>;

    /// Halt playback. The output thread is joined before return.
    /// Idempotent.
    fn stop(&mut self);
}

/// Playback through the default output device.
pub struct SpeakerSink {
    config: StreamConfig,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SpeakerSink {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
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

impl OutputSink for SpeakerSink {
    fn start(&mut self, buffer: Arc<PlaybackBuffer>) -> Result<(), AudioError> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let running = self.running.clone();
        let running_for_loop = self.running.clone();
        let sample_rate = self.config.sample_rate;

        running.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

        let handle = thread::Builder::new()
            .name("speaker-sink".into())
            .spawn(move || {
                let device = match device::default_output_device() {
                    Ok(d) => d,
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let stream_config = match device::output_stream_config(&device, sample_rate) {
                    Ok(c) => c,
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let channels = stream_config.channels as usize;

                let running_in_callback = running.clone();
                let mut current: Vec<f32> = Vec::new();
                let mut pos = 0usize;

                let stream = device.build_output_stream(
                    &stream_config,
                    move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        if !running_in_callback.load(Ordering::Relaxed) {
                            out.fill(0.0);
                            return;
                        }
                        for slot in out.chunks_mut(channels) {
                            if pos >= current.len() {
                                match buffer.next_frame() {
                                    Some(frame) if !frame.is_empty() => {
                                        current = frame.samples;
                                        pos = 0;
                                    }
                                    _ => {
                                        for sample in slot.iter_mut() {
                                            *sample = 0.0;
                                        }
                                        continue;
                                    }
                                }
                            }
                            let sample = current[pos];
                            pos += 1;
                            for out_sample in slot.iter_mut() {
                                *out_sample = sample;
                            }
                        }
                    },
                    move |err| {
                        tracing::warn!("output stream error: {}", err);
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
                        // stream on exit halts the device callback.
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
                    "output thread exited before start".into(),
                ))
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.reap_thread();
    }
}

impl Drop for SpeakerSink {
    fn drop(&mut self) {
        self.stop();
    }
}
