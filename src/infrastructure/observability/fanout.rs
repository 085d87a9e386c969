use std::sync::Arc;

use crate::domain::risk::events::{RiskEvent, RiskObserver};

/// Delivers each event to several observers, in order.
#[derive(Clone, Default)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn RiskObserver>>,
}

impl FanoutObserver {
    pub fn new(observers: Vec<Arc<dyn RiskObserver>>) -> Self {
        Self { observers }
    }

    pub fn with(mut self, observer: Arc<dyn RiskObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl RiskObserver for FanoutObserver {
    fn on_event(&self, event: &RiskEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
