use crate::webhooks::github::events::{EventKind, InboundEvent};

/// Decides which deliveries are worth a notification.
#[derive(Debug, Clone)]
pub struct EventFilter {
    enabled_events: Vec<EventKind>,
    pull_request_actions: Vec<&'static str>,
    excluded_actions: Vec<&'static str>,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            enabled_events: vec![
                EventKind::Push,
                EventKind::PullRequest,
                EventKind::PullRequestReview,
                EventKind::CreateRef,
                EventKind::DeleteRef,
            ],
            pull_request_actions: vec!["opened", "reopened"],
            excluded_actions: vec!["synchronize"],
        }
    }
}

impl EventFilter {
    pub fn is_enabled(&self, kind: &EventKind, event: &InboundEvent) -> bool {
        self.accepts(kind, event.action.as_deref())
    }

    fn accepts(&self, kind: &EventKind, action: Option<&str>) -> bool {
        if !self.enabled_events.contains(kind) {
            return false;
        }

        let action = action.unwrap_or_default();
        if *kind == EventKind::PullRequest
            && !self.pull_request_actions.iter().any(|&allowed| allowed == action)
        {
            return false;
        }

        !self.excluded_actions.iter().any(|&excluded| excluded == action)
    }
}
