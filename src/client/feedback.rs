//! Sound/haptic feedback as an injected capability service.
//!
//! Cues are dropped until the service has been initialized (on the first
//! user interaction) and while it is disabled.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Upload,
    GenerateStart,
    Success,
    Copy,
    Click,
    Error,
}

/// Where audible cues end up.
pub trait FeedbackSink: Send + Sync {
    fn emit(&self, cue: Cue);
}

pub struct Feedback {
    initialized: AtomicBool,
    enabled: AtomicBool,
    sink: Box<dyn FeedbackSink>,
}

impl Feedback {
    pub fn new(sink: Box<dyn FeedbackSink>) -> Self {
        Self {
            initialized: AtomicBool::new(false),
            enabled: AtomicBool::new(true),
            sink,
        }
    }

    pub fn init(&self) {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("Feedback service initialized");
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn set_enabled(&self, enabled: bool) {
        if enabled {
            self.enable();
        } else {
            self.disable();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn play(&self, cue: Cue) {
        if self.initialized.load(Ordering::SeqCst) && self.is_enabled() {
            self.sink.emit(cue);
        }
    }
}

/// Rings the terminal bell for outcomes; other cues are only logged.
pub struct TerminalBell;

impl FeedbackSink for TerminalBell {
    fn emit(&self, cue: Cue) {
        tracing::debug!("Feedback cue: {:?}", cue);
        if matches!(cue, Cue::Success | Cue::Error) {
            let mut stderr = std::io::stderr();
            if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
                tracing::debug!("Terminal bell unavailable: {}", e);
            }
        }
    }
}

/// Records emitted cues; clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    cues: Arc<Mutex<Vec<Cue>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cues(&self) -> Vec<Cue> {
        self.cues.lock().unwrap().clone()
    }
}

impl FeedbackSink for RecordingSink {
    fn emit(&self, cue: Cue) {
        self.cues.lock().unwrap().push(cue);
    }
}
