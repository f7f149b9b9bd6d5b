//! Lazy input subscription.
//!
//! The node only listens to its input while something listens to its
//! output. The host reports the downstream subscriber count whenever it
//! changes and performs whatever [`SubscriptionEvent`] comes back.

use serde::{Deserialize, Serialize};

/// Whether the input subscription currently exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// No input subscription; incoming frames are ignored.
    #[default]
    Inactive,
    /// Subscribed to the input topic.
    Active,
}

/// Action the host must take on the input subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// Create the input subscription.
    Subscribe,
    /// Tear the input subscription down.
    Unsubscribe,
}

/// Two-state machine driven by the downstream subscriber count.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazySubscription {
    state: SubscriptionState,
}

impl LazySubscription {
    /// Start inactive.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SubscriptionState::Inactive,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Returns `true` while subscribed to the input.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SubscriptionState::Active)
    }

    /// Feed the current downstream subscriber count.
    ///
    /// Returns the transition to perform, if any. Repeated counts on the
    /// same side of zero never produce a second event.
    pub const fn on_matched(&mut self, subscriber_count: usize) -> Option<SubscriptionEvent> {
        match (self.state, subscriber_count) {
            (SubscriptionState::Active, 0) => {
                self.state = SubscriptionState::Inactive;
                Some(SubscriptionEvent::Unsubscribe)
            }
            (SubscriptionState::Inactive, n) if n > 0 => {
                self.state = SubscriptionState::Active;
                Some(SubscriptionEvent::Subscribe)
            }
            _ => None,
        }
    }
}
