//! Notification sink for escalation alerts.
//!
//! The escalation engine reports priority transitions through a
//! `NotificationSink`; delivery is fire-and-forget and a sink that cannot
//! deliver simply drops the message. No error ever reaches the engine.

/// External sink accepting a title and body. Implementations must not fail.
pub trait NotificationSink {
    fn notify(&mut self, title: &str, body: &str);
}

/// Sink that discards everything. Used when notifications are unwanted or
/// unavailable.
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn notify(&mut self, _title: &str, _body: &str) {}
}

/// Sink that prints to stderr, for CLI escalation checks.
pub struct StderrSink;

impl NotificationSink for StderrSink {
    fn notify(&mut self, title: &str, body: &str) {
        eprintln!("{title}: {body}");
    }
}

/// Sink that buffers messages for the caller to drain. The TUI drains into
/// its status line; tests drain to assert on delivery.
#[derive(Default)]
pub struct BufferSink {
    pub messages: Vec<(String, String)>,
}

impl BufferSink {
    pub fn drain(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.messages)
    }
}

impl NotificationSink for BufferSink {
    fn notify(&mut self, title: &str, body: &str) {
        self.messages.push((title.to_string(), body.to_string()));
    }
}
