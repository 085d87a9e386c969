use std::sync::{Mutex, MutexGuard};

use crate::domain::risk::events::{RiskEvent, RiskObserver};

/// In-memory observer. Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<RiskEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RiskEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<RiskEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of events of one kind, e.g. `"halted"`.
    pub fn count(&self, kind: &str) -> usize {
        self.lock().iter().filter(|event| event.kind() == kind).count()
    }

    /// `(layer, reason)` for each rejection.
    pub fn rejections(&self) -> Vec<(&'static str, String)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                RiskEvent::Rejected { layer, reason, .. } => Some((*layer, reason.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl RiskObserver for EventLog {
    fn on_event(&self, event: &RiskEvent) {
        self.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_records_in_order_and_filters() {
        let log = EventLog::new();
        log.on_event(&RiskEvent::PeakUpdated { peak: dec!(110) });
        log.on_event(&RiskEvent::Rejected {
            layer: "RateLimit",
            symbol: "BTCUSDT".into(),
            reason: "10 trades approved in the last 60s, limit is 10".into(),
        });
        log.on_event(&RiskEvent::Resumed {
            at: Utc::now(),
            manual: true,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.count("rejected"), 1);
        assert_eq!(log.rejections()[0].0, "RateLimit");
        assert_eq!(log.events()[0], RiskEvent::PeakUpdated { peak: dec!(110) });

        log.clear();
        assert!(log.is_empty());
    }
}
