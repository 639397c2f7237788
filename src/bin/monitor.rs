//! Local Monitor
//!
//! Wires a transmitter and a receiver through an in-process mesh with a
//! lossy link profile: microphone to speaker with real loss, duplication,
//! and reordering. Useful for hearing what the jitter policy does before
//! a radio transport is attached.

use anyhow::Result;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mesh_radio::{
    config::AppConfig,
    mesh::{LinkProfile, LoopbackMesh, MeshChannel, MeshGroup},
    stream::{Receiver, Transmitter},
};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting mesh radio monitor");

    let config = AppConfig::load()?;
    let group = MeshGroup::from_name(&config.group.name);
    tracing::info!("Group: {}", group);
    tracing::info!(
        "Frames: {} samples at {} Hz ({:.1} ms), jitter budget {} frames",
        config.stream.frame_samples,
        config.stream.sample_rate,
        config.stream.frame_duration() * 1000.0,
        config.stream.jitter_frames,
    );

    // Every 16th packet lost, every 24th duplicated, every 10th reordered
    let profile = LinkProfile {
        drop_every: NonZeroU64::new(16),
        duplicate_every: NonZeroU64::new(24),
        swap_every: NonZeroU64::new(10),
    };
    let mesh = Arc::new(LoopbackMesh::new(profile, config.mesh.send_queue_depth)?);
    mesh.power_on();

    let rx_channel = Arc::new(MeshChannel::new(mesh.clone(), group.clone()));
    let receiver = Receiver::new(config.stream.clone(), rx_channel)?;

    let tx_channel = Arc::new(MeshChannel::new(mesh.clone(), group));
    let mut transmitter = Transmitter::new(config.stream.clone(), tx_channel.clone());
    transmitter.start()?;

    tracing::info!("Broadcasting the default microphone to the local speaker - press Ctrl+C to stop");

    loop {
        thread::sleep(Duration::from_secs(5));

        let mesh_stats = mesh.stats();
        let playback = receiver.playback_stats();
        tracing::info!(
            "{} published, {} queue drops, {} delivered | buffer {}/{}, {} evicted, {} underruns, {} malformed | state {:?}",
            tx_channel.published(),
            mesh_stats.send_dropped,
            mesh_stats.delivered,
            playback.queued,
            playback.capacity,
            playback.evicted,
            playback.underruns,
            receiver.malformed_packets(),
            receiver.state(),
        );
    }
}
