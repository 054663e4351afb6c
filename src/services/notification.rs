//! Desktop notification delivery

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{app} finished.";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification permission has not been granted")]
    PermissionDenied,

    #[error("failed to launch notifier: {0}")]
    Launch(#[from] std::io::Error),
}

/// Delivers OS-level alerts. Delivery is best effort.
pub trait Notifier: Send + Sync {
    fn permission_granted(&self) -> bool;
    fn set_permission(&self, granted: bool);
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier backed by the freedesktop `notify-send` tool
#[derive(Debug)]
pub struct DesktopNotifier {
    program: String,
    granted: AtomicBool,
}

impl DesktopNotifier {
    pub fn new(granted: bool) -> Self {
        Self {
            program: "notify-send".to_string(),
            granted: AtomicBool::new(granted),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn set_permission(&self, granted: bool) {
        info!("Notification permission {}", if granted { "granted" } else { "revoked" });
        self.granted.store(granted, Ordering::SeqCst);
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        if !self.permission_granted() {
            return Err(NotifyError::PermissionDenied);
        }

        // The child is not awaited; tokio reaps it in the background
        Command::new(&self.program)
            .args(["--app-name", "timer-bell", title, body])
            .kill_on_drop(false)
            .spawn()?;

        debug!("Sent notification '{}': {}", title, body);
        Ok(())
    }
}

/// Fill the `{app}` placeholder, using the default template when empty
pub fn render_message(template: &str, label: &str) -> String {
    let template = template.trim();
    let template = if template.is_empty() {
        DEFAULT_MESSAGE_TEMPLATE
    } else {
        template
    };
    template.replace("{app}", label)
}
