use std::time::{Duration, Instant};

pub const DEFAULT_DISMISS: Duration = Duration::from_millis(3000);
pub const SESSION_EXPIRED_DISMISS: Duration = Duration::from_millis(1800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismiss {
    After(Duration),
    /// For in-flight operations; the completion handler replaces or clears it.
    Never,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
    pub expires_at: Option<Instant>,
}

/// Single transient message. Setting a new one drops the previous one
/// together with its dismissal deadline.
#[derive(Debug, Default)]
pub struct StatusBar {
    current: Option<StatusMessage>,
}

impl StatusBar {
    pub fn set(&mut self, text: impl Into<String>, severity: Severity, dismiss: Dismiss) {
        self.set_at(Instant::now(), text, severity, dismiss);
    }

    pub fn set_at(
        &mut self,
        now: Instant,
        text: impl Into<String>,
        severity: Severity,
        dismiss: Dismiss,
    ) {
        let expires_at = match dismiss {
            Dismiss::After(d) => Some(now + d),
            Dismiss::Never => None,
        };
        self.current = Some(StatusMessage {
            text: text.into(),
            severity,
            expires_at,
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set(text, Severity::Info, Dismiss::After(DEFAULT_DISMISS));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.set(text, Severity::Error, Dismiss::After(DEFAULT_DISMISS));
    }

    pub fn progress(&mut self, text: impl Into<String>) {
        self.set(text, Severity::Info, Dismiss::Never);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Drop the message once its deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(StatusMessage {
            expires_at: Some(at),
            ..
        }) = &self.current
        {
            if now >= *at {
                self.current = None;
            }
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_expires_after_duration() {
        let now = Instant::now();
        let mut bar = StatusBar::default();
        bar.set_at(now, "hello", Severity::Info, Dismiss::After(Duration::from_secs(3)));

        bar.tick(now + Duration::from_secs(2));
        assert!(bar.current().is_some());
        bar.tick(now + Duration::from_secs(3));
        assert!(bar.current().is_none());
    }

    #[test]
    fn new_message_replaces_pending_dismissal() {
        let now = Instant::now();
        let mut bar = StatusBar::default();
        bar.set_at(now, "short", Severity::Info, Dismiss::After(Duration::from_secs(1)));
        bar.set_at(now, "thinking", Severity::Info, Dismiss::Never);

        bar.tick(now + Duration::from_secs(60));
        assert_eq!(bar.current().unwrap().text, "thinking");

        bar.clear();
        assert!(bar.current().is_none());
    }
}
