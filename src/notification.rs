//! Notification System
//!
//! Manages notifications for mutations with toast messages and history
//! tracking.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Level of detail for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    /// Minimal: action + record + status icon
    Minimal,
    /// Detailed: action + record + duration
    #[default]
    Detailed,
    /// Verbose: all info including error details
    Verbose,
}

impl DetailLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "verbose" => Self::Verbose,
            _ => Self::Detailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Detailed => "detailed",
            Self::Verbose => "verbose",
        }
    }
}

/// Status of a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Mutation has been dispatched, awaiting the backend
    Pending,
    /// Mutation completed successfully
    Success,
    /// Mutation failed with error message
    Error(String),
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_))
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "↻",
            Self::Success => "✓",
            Self::Error(_) => "✗",
        }
    }
}

/// A single notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    /// Action display name, e.g. "Activate" or "Delete"
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub status: NotificationStatus,
    pub created_at: Instant,
    pub completed_at: Option<Instant>,
}

impl Notification {
    pub fn new(action: String, resource_type: String, resource_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            resource_type,
            resource_id,
            status: NotificationStatus::Pending,
            created_at: Instant::now(),
            completed_at: None,
        }
    }

    /// Mark mutation as successful
    pub fn set_success(&mut self) {
        self.status = NotificationStatus::Success;
        self.completed_at = Some(Instant::now());
    }

    /// Mark mutation as failed
    pub fn set_error(&mut self, error: String) {
        self.status = NotificationStatus::Error(error);
        self.completed_at = Some(Instant::now());
    }

    /// Get duration of the mutation (or elapsed time if still running)
    pub fn duration(&self) -> Duration {
        self.completed_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.created_at)
    }

    /// Format duration for display
    pub fn duration_display(&self) -> String {
        let d = self.duration();
        if d.as_secs() < 1 {
            format!("{}ms", d.as_millis())
        } else if d.as_secs() < 60 {
            format!("{}s", d.as_secs())
        } else {
            format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
        }
    }

    /// Format notification for toast display (short form)
    pub fn toast_message(&self, detail_level: DetailLevel) -> String {
        let icon = self.status.icon();
        let verb = match &self.status {
            NotificationStatus::Pending => &self.action,
            NotificationStatus::Success => &self.action,
            NotificationStatus::Error(_) => "Failed:",
        };

        match detail_level {
            DetailLevel::Minimal => {
                format!("{} {} {}", icon, verb, self.resource_id)
            }
            DetailLevel::Detailed => {
                if self.status.is_terminal() {
                    format!(
                        "{} {} {} ({})",
                        icon,
                        verb,
                        self.resource_id,
                        self.duration_display()
                    )
                } else {
                    format!("{} {} {}...", icon, verb, self.resource_id)
                }
            }
            DetailLevel::Verbose => {
                let base = format!(
                    "{} {} {} [{}]",
                    icon, verb, self.resource_id, self.resource_type
                );
                if let NotificationStatus::Error(ref err) = self.status {
                    format!("{} - {}", base, err)
                } else if self.status.is_terminal() {
                    format!("{} ({})", base, self.duration_display())
                } else {
                    format!("{}...", base)
                }
            }
        }
    }
}

/// Notification manager
pub struct NotificationManager {
    /// All notifications (recent first)
    pub notifications: VecDeque<Notification>,
    /// Maximum notifications to keep in history
    pub max_history: usize,
    /// Toast display duration
    pub toast_duration: Duration,
    /// Detail level for display
    pub detail_level: DetailLevel,
    /// Last toast notification (for display)
    last_toast_time: Option<Instant>,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            notifications: VecDeque::new(),
            max_history: 50,
            toast_duration: Duration::from_secs(5),
            detail_level: DetailLevel::Detailed,
            last_toast_time: None,
        }
    }

    /// Create a new notification for a dispatched mutation
    pub fn create_notification(
        &mut self,
        action: String,
        resource_type: String,
        resource_id: String,
    ) -> Uuid {
        let notification = Notification::new(action, resource_type, resource_id);
        let id = notification.id;
        self.notifications.push_front(notification);
        self.last_toast_time = Some(Instant::now());
        self.trim_history();
        id
    }

    /// Mark a notification as successful
    pub fn mark_success(&mut self, id: Uuid) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_success();
            self.last_toast_time = Some(Instant::now());
        }
    }

    /// Mark a notification as failed
    pub fn mark_error(&mut self, id: Uuid, error: String) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_error(error);
            self.last_toast_time = Some(Instant::now());
        }
    }

    /// Get notification by ID
    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Get the most recent notification if its toast is still visible
    pub fn current_toast(&self) -> Option<&Notification> {
        let last_time = self.last_toast_time?;
        if last_time.elapsed() > self.toast_duration {
            return None;
        }
        self.notifications.front()
    }

    /// Get count of in-progress mutations
    pub fn in_progress_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| !n.status.is_terminal())
            .count()
    }

    /// Clear all notifications
    pub fn clear(&mut self) {
        self.notifications.clear();
        self.last_toast_time = None;
    }

    /// Trim history to max size
    fn trim_history(&mut self) {
        while self.notifications.len() > self.max_history {
            // Remove oldest completed notification
            if let Some(pos) = self
                .notifications
                .iter()
                .rposition(|n| n.status.is_terminal())
            {
                self.notifications.remove(pos);
            } else {
                self.notifications.pop_back();
            }
        }
    }

    /// Check if there are any notifications to show
    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    /// Get count of recent notifications (last 5 minutes)
    pub fn recent_count(&self) -> usize {
        let cutoff = Duration::from_secs(300);
        self.notifications
            .iter()
            .filter(|n| n.created_at.elapsed() < cutoff)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_lifecycle() {
        let mut manager = NotificationManager::new();

        let id = manager.create_notification(
            "Activate".to_string(),
            "vendors".to_string(),
            "v-1".to_string(),
        );

        assert_eq!(manager.notifications.len(), 1);
        assert!(matches!(
            manager.get(id).unwrap().status,
            NotificationStatus::Pending
        ));
        assert_eq!(manager.in_progress_count(), 1);

        manager.mark_success(id);
        assert!(matches!(
            manager.get(id).unwrap().status,
            NotificationStatus::Success
        ));
        assert_eq!(manager.in_progress_count(), 0);
    }

    #[test]
    fn test_toast_message_formats() {
        let mut notif = Notification::new(
            "Publish".to_string(),
            "offers".to_string(),
            "off-3".to_string(),
        );

        let msg = notif.toast_message(DetailLevel::Minimal);
        assert!(msg.contains("Publish"));
        assert!(msg.contains("off-3"));

        notif.set_success();
        let msg = notif.toast_message(DetailLevel::Minimal);
        assert!(msg.contains("✓"));

        notif.set_error("boom".to_string());
        let msg = notif.toast_message(DetailLevel::Verbose);
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_history_trimmed_to_max() {
        let mut manager = NotificationManager::new();
        manager.max_history = 3;
        for i in 0..5 {
            let id = manager.create_notification(
                "Delete".to_string(),
                "products".to_string(),
                format!("p-{}", i),
            );
            manager.mark_success(id);
        }
        assert_eq!(manager.notifications.len(), 3);
        // Most recent kept
        assert_eq!(manager.notifications.front().unwrap().resource_id, "p-4");
    }
}
