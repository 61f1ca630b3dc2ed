//! User-facing notices (the dashboard's toasts).

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Fire-and-forget sink for notices. A silent notifier drops everything.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    /// Notifier plus the receiving end the UI drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Error, message.into());
    }

    fn send(&self, level: NoticeLevel, message: String) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is watching.
            let _ = tx.send(Notice { level, message });
        }
    }
}
