//! User-visible notification side channel

use serde::Serialize;
use tokio::sync::mpsc;

/// Visual weight of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastVariant {
    /// Informational or success
    #[default]
    Default,
    /// Failure
    Destructive,
}

/// Short notification shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Headline
    pub title: String,
    /// Human readable detail
    pub description: String,
    /// Visual weight
    pub variant: ToastVariant,
}

impl Toast {
    /// Success toast
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    /// Failure toast
    #[must_use]
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }

    /// Check for the failure variant
    #[inline]
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }
}

/// Fire-and-forget sink for toasts
pub trait Notifier: Send + Sync {
    /// Show a toast
    fn notify(&self, toast: Toast);
}

/// Notifier that writes toasts to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Default => {
                tracing::info!(title = %toast.title, "{}", toast.description);
            }
            ToastVariant::Destructive => {
                tracing::warn!(title = %toast.title, "{}", toast.description);
            }
        }
    }
}

/// Notifier forwarding toasts to a UI loop over a channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Toast>,
}

impl ChannelNotifier {
    /// Create the notifier and the receiving end
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        // A closed UI loop just drops toasts
        if self.sender.send(toast).is_err() {
            tracing::trace!("toast receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Toast::destructive("Error", "boom"));
        let toast = rx.try_recv().unwrap();
        assert!(toast.is_destructive());
        assert_eq!(toast.description, "boom");

        drop(rx);
        notifier.notify(Toast::success("Success", "ignored"));
    }
}
