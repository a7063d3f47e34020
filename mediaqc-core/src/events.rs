//! Progress events emitted while an analysis runs.
//!
//! Interactive callers register an [`EventHandler`] and receive typed
//! events as the pipeline advances instead of polling a queue; the
//! pipeline never blocks on a handler.

use std::sync::Arc;

use crate::report::Category;

#[derive(Debug, Clone)]
pub enum Event {
    AnalysisStarted {
        input: String,
    },

    MetadataResolved {
        fps: f64,
        duration: f64,
        sample_rate: u32,
        channels: u32,
    },

    DetectorStarted {
        category: Category,
        step: usize,
        total: usize,
    },

    /// Per-channel progress inside the mute and peak detectors.
    ChannelProgress {
        category: Category,
        channel: u32,
        total: u32,
    },

    DetectorSkipped {
        category: Category,
        reason: String,
    },

    DetectorCompleted {
        category: Category,
        findings: usize,
    },

    Warning {
        message: String,
    },

    AnalysisComplete {
        total_findings: usize,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl EventHandler for Recorder {
        fn handle(&self, event: &Event) {
            self.0.lock().unwrap().push(format!("{:?}", event));
        }
    }

    #[test]
    fn test_dispatcher_fans_out_to_all_handlers() {
        let first = Arc::new(Recorder(Mutex::new(Vec::new())));
        let second = Arc::new(Recorder(Mutex::new(Vec::new())));

        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_handler(first.clone());
        dispatcher.add_handler(second.clone());

        dispatcher.emit(Event::AnalysisComplete { total_findings: 3 });

        assert_eq!(first.0.lock().unwrap().len(), 1);
        assert_eq!(second.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dispatcher_with_no_handlers_is_silent() {
        let dispatcher = EventDispatcher::new();
        dispatcher.emit(Event::Warning {
            message: "nothing listens".to_string(),
        });
    }
}
