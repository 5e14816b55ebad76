//! Paced outbound command queue and the device channel abstraction.
//!
//! The device accepts one command at a time and needs a short gap between
//! them. [`DispatchQueue`] buffers serialized commands, enforces the gap, and
//! drops the oldest entry when it overflows. It is the only writer to the
//! [`DeviceChannel`].
//!
//! ```text
//! session ──► DispatchQueue::enqueue ──► [bounded FIFO] ──► poll_send ──► DeviceChannel
//!                                         (drop oldest)     (min gap)
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use thiserror::Error;

use crate::command::DeviceCommand;

/// Errors reported by a device channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The link is down.
    #[error("device channel is closed")]
    Closed,
    /// The link rejected or failed to carry the payload.
    #[error("send failed: {0}")]
    Send(String),
}

/// A link to the device that carries text payloads.
///
/// Implementations wrap the transport (WebSocket, serial, test recorder).
pub trait DeviceChannel {
    /// Whether payloads can currently be sent.
    fn is_open(&self) -> bool;

    /// Sends one payload.
    fn send(&mut self, payload: &str) -> Result<(), ChannelError>;
}

/// Channel that records every payload; for tests and simulation.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    open: bool,
    sent: Vec<String>,
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingChannel {
    /// An open channel with nothing sent.
    pub fn new() -> Self {
        Self {
            open: true,
            sent: Vec::new(),
        }
    }

    /// Opens or closes the channel.
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Payloads sent so far, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Sent payloads parsed back into commands. Unparseable payloads are skipped.
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.sent
            .iter()
            .filter_map(|p| DeviceCommand::from_json(p).ok())
            .collect()
    }

    /// Takes the recorded payloads, leaving the record empty.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl DeviceChannel for RecordingChannel {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, payload: &str) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        self.sent.push(payload.to_string());
        Ok(())
    }
}

/// Counters for queue activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Payloads written to the channel.
    pub sent: u64,
    /// Payloads evicted because the queue was full.
    pub dropped_overflow: u64,
    /// Commands refused because the channel was closed.
    pub dropped_closed: u64,
    /// Payloads the channel failed to carry.
    pub send_errors: u64,
}

/// Bounded FIFO of serialized commands with a minimum inter-send gap.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    pending: VecDeque<String>,
    capacity: usize,
    min_gap: Duration,
    last_send: Option<Duration>,
    stats: DispatchStats,
}

impl DispatchQueue {
    /// Creates a queue. A zero capacity is treated as one.
    pub fn new(capacity: usize, min_gap: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity: capacity.max(1),
            min_gap,
            last_send: None,
            stats: DispatchStats::default(),
        }
    }

    /// Queues a command for sending.
    ///
    /// Dropped (and counted) when `channel_open` is false. When the queue is
    /// full the oldest pending payload is evicted. Returns `true` if queued.
    pub fn enqueue(&mut self, cmd: &DeviceCommand, channel_open: bool) -> bool {
        if !channel_open {
            self.stats.dropped_closed += 1;
            tracing::debug!(cmd = cmd.name(), "channel closed, dropping command");
            return false;
        }
        let payload = match cmd.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(cmd = cmd.name(), error = %e, "failed to serialize command");
                return false;
            }
        };
        if self.pending.len() >= self.capacity {
            self.pending.pop_front();
            self.stats.dropped_overflow += 1;
            tracing::warn!(capacity = self.capacity, "dispatch queue full, dropped oldest");
        }
        self.pending.push_back(payload);
        true
    }

    /// Earliest instant the next payload may be sent, or `None` if empty.
    pub fn next_send_at(&self) -> Option<Duration> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.last_send.map_or(Duration::ZERO, |t| t + self.min_gap))
    }

    /// Sends the front payload if the gap has elapsed.
    ///
    /// A payload the channel rejects is dropped and counted. Returns `true` if
    /// a payload left the queue.
    pub fn poll_send<C: DeviceChannel + ?Sized>(&mut self, channel: &mut C, now: Duration) -> bool {
        match self.next_send_at() {
            Some(at) if at <= now => {}
            _ => return false,
        }
        let Some(payload) = self.pending.pop_front() else {
            return false;
        };
        self.last_send = Some(now);
        match channel.send(&payload) {
            Ok(()) => {
                self.stats.sent += 1;
                tracing::debug!(%payload, "sent");
            }
            Err(e) => {
                self.stats.send_errors += 1;
                tracing::debug!(error = %e, "send failed, dropping payload");
            }
        }
        true
    }

    /// Discards every pending payload. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    /// Pending payloads, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// Number of pending payloads.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Activity counters.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}
