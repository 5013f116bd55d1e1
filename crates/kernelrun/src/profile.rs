//! Outstanding-operation tracking and profiling records.

use kernelrun_core::types::EventId;

/// Profiling output for one completed operation, in enqueue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    /// The operation's recorded name (`"unknown"` when none was recorded).
    pub label: String,
    /// Device-reported start timestamp, nanoseconds.
    pub start_ns: u64,
    /// Device-reported end timestamp, nanoseconds.
    pub end_ns: u64,
}

impl ProfileRecord {
    /// Device time spent in the operation.
    pub fn elapsed_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }
}

/// The ordered sequence of operations enqueued since the last barrier.
#[derive(Default)]
pub(crate) struct PendingOps {
    ops: Vec<(Option<&'static str>, EventId)>,
}

impl PendingOps {
    pub(crate) fn push(&mut self, label: &'static str, event: EventId) {
        self.ops.push((Some(label), event));
    }

    pub(crate) fn events(&self) -> Vec<EventId> {
        self.ops.iter().map(|(_, ev)| *ev).collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&'static str, EventId)> + '_ {
        self.ops
            .iter()
            .map(|(label, ev)| (label.unwrap_or("unknown"), *ev))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.ops.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_ops_preserve_enqueue_order() {
        let mut pending = PendingOps::default();
        pending.push("transferToDevice", EventId::new(0));
        pending.push("launch", EventId::new(1));

        let labels: Vec<_> = pending.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["transferToDevice", "launch"]);
        assert_eq!(pending.events(), vec![EventId::new(0), EventId::new(1)]);

        pending.clear();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_record_elapsed() {
        let record = ProfileRecord {
            label: "launch".into(),
            start_ns: 10,
            end_ns: 52,
        };
        assert_eq!(record.elapsed_ns(), 42);
    }
}
