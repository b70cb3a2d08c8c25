use tokio::sync::broadcast;

use crate::models::Notification;

const NOTIFICATION_CAPACITY: usize = 64;

/// Notifier
///
/// Fan-out hub for user-facing notifications. Every notification is also
/// written to the log, so nothing is lost when no view is subscribed.
#[derive(Clone, Debug)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self { sender }
    }

    /// A receiver for notifications published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        if notification.is_destructive() {
            tracing::warn!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            );
        } else {
            tracing::info!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            );
        }

        // No subscribers is fine: the log line above is the record.
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_notifications() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.publish(Notification::success("Logged out", "bye"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.title, "Logged out");
        assert!(!received.is_destructive());
    }

    #[test]
    fn publishing_without_subscribers_does_not_fail() {
        let notifier = Notifier::new();
        notifier.publish(Notification::destructive("Login failed", "nope"));
    }
}
