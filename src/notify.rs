use tracing::{info, warn};

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Loading,
    Success,
    Error,
}

/// A message meant for the viewer, not the log
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Notices sharing an id replace each other in the UI
    pub id: Option<&'static str>,
}

impl Notice {
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Loading,
            message: message.into(),
            id: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: &'static str) -> Self {
        self.id = Some(id);
        self
    }
}

/// Surface for notices shown to the viewer (toasts in the web client)
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let id = notice.id.unwrap_or("-");
        match notice.level {
            NoticeLevel::Loading | NoticeLevel::Success => {
                info!("[notice:{}] {}", id, notice.message)
            }
            NoticeLevel::Error => warn!("[notice:{}] {}", id, notice.message),
        }
    }
}
