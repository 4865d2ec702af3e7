//! Age-bounded sliding window over accepted revision events

use crate::stream_core::parser::Event;
use std::collections::VecDeque;

/// FIFO window of recently observed events, bounded by age only. The element
/// count is never capped; eviction always removes from the front, which is
/// sound because `observed_at` is assigned monotonically at append time.
#[derive(Debug)]
pub struct SlidingWindow {
    events: VecDeque<Event>,
    span_secs: i64,
}

impl SlidingWindow {
    pub fn new(span_secs: i64) -> Self {
        Self {
            events: VecDeque::new(),
            span_secs,
        }
    }

    /// Append to the tail. O(1).
    pub fn append(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Drop events older than the window span. O(evicted); a no-op on an
    /// empty window. Afterwards every remaining event satisfies
    /// `now - observed_at <= span_secs`.
    pub fn evict(&mut self, now: i64) {
        while let Some(head) = self.events.front() {
            if now - head.observed_at > self.span_secs {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// Read-only view of the live events, oldest first.
    pub fn snapshot(&self) -> &VecDeque<Event> {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
