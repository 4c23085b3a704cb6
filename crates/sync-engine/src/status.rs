// crates/sync-engine/src/status.rs
//! Status log polled by the control surface

use crate::error::{EngineError, EngineResult};
use shelfsync_core::{StatusEvent, StatusKind};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Events kept between drains; older ones are discarded first
pub const MAX_STATUS_EVENTS: usize = 256;

struct LogInner {
    events: VecDeque<StatusEvent>,
    next_seq: u64,
    dropped: u64,
}

impl LogInner {
    fn push(&mut self, kind: StatusKind, message: Option<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push_back(StatusEvent::new(seq, kind, message));
        seq
    }
}

/// Append-only status log with a destructive drain
///
/// Drain hands over everything accumulated and resets the log to a single
/// `Idle` sentinel. Only one poller should drain: a second poller sees only
/// what arrived after the first one's drain. Sequence numbers are strictly
/// increasing across drains, so a gap tells a poller it missed events.
pub struct StatusLog {
    inner: Mutex<LogInner>,
    capacity: usize,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_STATUS_EVENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut inner = LogInner {
            events: VecDeque::new(),
            next_seq: 0,
            dropped: 0,
        };
        inner.push(StatusKind::Idle, None);

        Self {
            inner: Mutex::new(inner),
            capacity: capacity.max(1),
        }
    }

    /// Records an event and mirrors it to the log facade
    pub fn append(&self, kind: StatusKind, message: impl Into<String>) -> EngineResult<u64> {
        let message = message.into();
        match kind {
            StatusKind::Error => log::error!("{}", message),
            StatusKind::Active => log::debug!("{}", message),
            StatusKind::Info => log::info!("{}", message),
            StatusKind::Idle => log::trace!("{}", message),
        }

        let mut inner = self.inner.lock().map_err(|_| EngineError::LockPoisoned)?;
        let seq = inner.push(kind, Some(message));
        while inner.events.len() > self.capacity {
            inner.events.pop_front();
            inner.dropped += 1;
        }
        Ok(seq)
    }

    /// Returns all accumulated events and resets to the `Idle` sentinel
    pub fn drain(&self) -> EngineResult<Vec<StatusEvent>> {
        let mut inner = self.inner.lock().map_err(|_| EngineError::LockPoisoned)?;

        if inner.dropped > 0 {
            let notice = format!("{} older status event(s) dropped", inner.dropped);
            inner.push(StatusKind::Info, Some(notice));
            inner.dropped = 0;
        }

        let events: Vec<StatusEvent> = inner.events.drain(..).collect();
        inner.push(StatusKind::Idle, None);
        Ok(events)
    }

    /// Number of events waiting to be drained
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_log_holds_sentinel() {
        let log = StatusLog::new();
        let events = log.drain().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_idle());
    }

    #[test]
    fn test_drain_twice_yields_sentinel_both_times() {
        let log = StatusLog::new();
        log.append(StatusKind::Info, "hello").unwrap();
        let first = log.drain().unwrap();
        assert_eq!(first.len(), 2);

        for _ in 0..2 {
            let events = log.drain().unwrap();
            assert_eq!(events.len(), 1);
            assert!(events[0].is_idle());
        }
    }

    #[test]
    fn test_events_keep_order_and_sequence() {
        let log = StatusLog::new();
        log.append(StatusKind::Info, "one").unwrap();
        log.append(StatusKind::Error, "two").unwrap();
        log.append(StatusKind::Active, "three").unwrap();

        let events = log.drain().unwrap();
        let messages: Vec<_> = events.iter().filter_map(|e| e.message.as_deref()).collect();
        assert_eq!(messages, vec!["one", "two", "three"]);
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[test]
    fn test_sequence_continues_across_drains() {
        let log = StatusLog::new();
        let before = log.append(StatusKind::Info, "a").unwrap();
        log.drain().unwrap();
        let after = log.append(StatusKind::Info, "b").unwrap();
        assert!(after > before + 1);
    }

    #[test]
    fn test_capacity_bounds_growth() {
        let log = StatusLog::with_capacity(3);
        for i in 0..10 {
            log.append(StatusKind::Info, format!("event {}", i)).unwrap();
        }
        assert_eq!(log.len(), 3);

        let events = log.drain().unwrap();
        let last = events.last().and_then(|e| e.message.clone()).unwrap();
        assert_eq!(last, "8 older status event(s) dropped");
        assert_eq!(events[0].message.as_deref(), Some("event 7"));
    }

    #[test]
    fn test_concurrent_appends() {
        let log = Arc::new(StatusLog::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        log.append(StatusKind::Info, format!("{}-{}", t, i)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(log.drain().unwrap().len(), 101);
    }
}
