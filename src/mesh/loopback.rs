//! In-process mesh transport
//!
//! Delivers published packets to local subscribers through a bounded send
//! queue and a dedicated delivery thread, with a deterministic link
//! profile for loss, duplication, and reordering. Stands in for a radio
//! mesh during tests and local monitoring; channels and controllers only
//! ever see the [`MeshTransport`] contract.

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use uuid::Uuid;

use crate::error::MeshError;
use crate::mesh::group::MeshGroup;
use crate::mesh::transport::{MeshTransport, PacketHandler, ReadyCallback};

/// Deterministic per-link fault model.
///
/// Counting is 1-based over packets accepted into the send queue:
/// `drop_every = 3` drops packets 3, 6, 9 and so on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkProfile {
    /// Drop every nth packet
    pub drop_every: Option<NonZeroU64>,

    /// Deliver every nth packet twice
    pub duplicate_every: Option<NonZeroU64>,

    /// Hold every nth packet back and deliver it after its successor
    pub swap_every: Option<NonZeroU64>,
}

impl LinkProfile {
    /// Transparent link: every packet delivered exactly once, in order.
    pub fn transparent() -> Self {
        Self::default()
    }
}

struct Delivery {
    group: Uuid,
    packet: Bytes,
}

struct Inner {
    ready: AtomicBool,
    alive: AtomicBool,
    subscribers: DashMap<Uuid, Vec<PacketHandler>>,
    pending_subscribers: Mutex<Vec<(Uuid, PacketHandler)>>,
    ready_callbacks: Mutex<Vec<ReadyCallback>>,
    accepted: AtomicU64,
    send_dropped: AtomicU64,
    processed: AtomicU64,
    delivered: AtomicU64,
}

/// Mesh transport statistics
#[derive(Debug, Clone)]
pub struct MeshStats {
    /// Packets accepted into the send queue
    pub accepted: u64,
    /// Packets rejected because the send queue was full
    pub send_dropped: u64,
    /// Packets the delivery thread has finished with (delivered or lost)
    pub processed: u64,
    /// Packet emissions to local subscribers, duplicates counted
    pub delivered: u64,
}

/// In-process [`MeshTransport`] with a configurable link profile.
pub struct LoopbackMesh {
    node_id: Uuid,
    inner: Arc<Inner>,
    tx: Sender<Delivery>,
    worker: Option<JoinHandle<()>>,
}

impl LoopbackMesh {
    /// Transport with the given link profile and send queue depth. Starts
    /// not ready; call [`power_on`](Self::power_on) to begin moving
    /// traffic.
    pub fn new(profile: LinkProfile, send_queue_depth: usize) -> Result<Self, MeshError> {
        let (tx, rx) = bounded::<Delivery>(send_queue_depth);

        let inner = Arc::new(Inner {
            ready: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            subscribers: DashMap::new(),
            pending_subscribers: Mutex::new(Vec::new()),
            ready_callbacks: Mutex::new(Vec::new()),
            accepted: AtomicU64::new(0),
            send_dropped: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        });

        let worker_inner = inner.clone();
        let worker = thread::Builder::new()
            .name("mesh-delivery".into())
            .spawn(move || run_worker(worker_inner, rx, profile))
            .map_err(|e| MeshError::TransportFailed(e.to_string()))?;

        Ok(Self {
            node_id: Uuid::new_v4(),
            inner,
            tx,
            worker: Some(worker),
        })
    }

    /// This node's identity on the simulated mesh
    pub fn node_id(&self) -> Uuid {
        self.node_id
    }

    /// Power the transport on: fire readiness callbacks and complete
    /// deferred subscriptions. Publishes before this point were rejected;
    /// packets observed before a deferred subscription completed are
    /// never delivered.
    pub fn power_on(&self) {
        if self.inner.ready.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(node = %self.node_id, "mesh transport powered on");

        let pending: Vec<_> = self.inner.pending_subscribers.lock().drain(..).collect();
        for (group, handler) in pending {
            self.inner.subscribers.entry(group).or_default().push(handler);
        }

        let callbacks: Vec<_> = self.inner.ready_callbacks.lock().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Block until every accepted packet has been delivered or lost.
    /// Test support; a real mesh offers no such signal.
    pub fn flush(&self) {
        while self.inner.processed.load(Ordering::SeqCst)
            < self.inner.accepted.load(Ordering::SeqCst)
        {
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Counter snapshot
    pub fn stats(&self) -> MeshStats {
        MeshStats {
            accepted: self.inner.accepted.load(Ordering::Relaxed),
            send_dropped: self.inner.send_dropped.load(Ordering::Relaxed),
            processed: self.inner.processed.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
        }
    }
}

impl MeshTransport for LoopbackMesh {
    fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    fn on_ready(&self, callback: ReadyCallback) {
        if self.is_ready() {
            callback();
            return;
        }
        let mut callbacks = self.inner.ready_callbacks.lock();
        // Re-check under the lock so power_on cannot slip in between.
        if self.inner.ready.load(Ordering::SeqCst) {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(callback);
        }
    }

    fn publish(&self, group: &MeshGroup, packet: Bytes) -> Result<(), MeshError> {
        if !self.is_ready() {
            return Err(MeshError::TransportNotReady);
        }

        let delivery = Delivery {
            group: group.id(),
            packet,
        };
        match self.tx.try_send(delivery) {
            Ok(()) => {
                self.inner.accepted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                // Queue full costs the frame, never blocks the caller.
                self.inner.send_dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Ok(()),
        }
    }

    fn subscribe(&self, group: &MeshGroup, handler: PacketHandler) {
        if self.is_ready() {
            self.inner
                .subscribers
                .entry(group.id())
                .or_default()
                .push(handler);
            return;
        }

        let mut pending = self.inner.pending_subscribers.lock();
        if self.inner.ready.load(Ordering::SeqCst) {
            drop(pending);
            self.inner
                .subscribers
                .entry(group.id())
                .or_default()
                .push(handler);
        } else {
            pending.push((group.id(), handler));
        }
    }
}

impl Drop for LoopbackMesh {
    fn drop(&mut self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(inner: Arc<Inner>, rx: Receiver<Delivery>, profile: LinkProfile) {
    let mut seen: u64 = 0;
    let mut held: Option<Delivery> = None;

    loop {
        let delivery = match rx.recv_timeout(Duration::from_millis(25)) {
            Ok(d) => d,
            Err(RecvTimeoutError::Timeout) => {
                // Nothing followed a held packet; release it.
                if let Some(d) = held.take() {
                    deliver(&inner, &d);
                    inner.processed.fetch_add(1, Ordering::SeqCst);
                }
                if !inner.alive.load(Ordering::SeqCst) {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        seen += 1;

        if hits(profile.drop_every, seen) {
            inner.processed.fetch_add(1, Ordering::SeqCst);
            continue;
        }

        if hits(profile.swap_every, seen) && held.is_none() {
            held = Some(delivery);
            continue;
        }

        deliver(&inner, &delivery);
        if hits(profile.duplicate_every, seen) {
            deliver(&inner, &delivery);
        }
        inner.processed.fetch_add(1, Ordering::SeqCst);

        if let Some(d) = held.take() {
            deliver(&inner, &d);
            inner.processed.fetch_add(1, Ordering::SeqCst);
        }
    }

    // Finish what is still queued so flush() callers are not left hanging.
    while let Ok(d) = rx.try_recv() {
        deliver(&inner, &d);
        inner.processed.fetch_add(1, Ordering::SeqCst);
    }
}

fn hits(every: Option<NonZeroU64>, count: u64) -> bool {
    every.map(|n| count % n.get() == 0).unwrap_or(false)
}

fn deliver(inner: &Inner, delivery: &Delivery) {
    if let Some(handlers) = inner.subscribers.get(&delivery.group) {
        for handler in handlers.iter() {
            handler(delivery.packet.clone());
        }
        if !handlers.is_empty() {
            inner.delivered.fetch_add(1, Ordering::Relaxed);
        }
    }
}
