//! Seam to the external subscription system.

use std::collections::HashSet;

use compass_core::AppConfig;

/// Decides whether a caller gets the paid tier.
pub trait SubscriptionLookup: Send + Sync {
    fn is_subscribed(&self, user_id: Option<&str>) -> bool;
}

/// Treats any caller that presents a user id as subscribed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyUserIsSubscribed;

impl SubscriptionLookup for AnyUserIsSubscribed {
    fn is_subscribed(&self, user_id: Option<&str>) -> bool {
        user_id.is_some()
    }
}

/// A fixed allow-list of subscribed user ids.
#[derive(Debug, Clone, Default)]
pub struct StaticSubscriptions {
    users: HashSet<String>,
}

impl StaticSubscriptions {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
        }
    }
}

impl SubscriptionLookup for StaticSubscriptions {
    fn is_subscribed(&self, user_id: Option<&str>) -> bool {
        user_id.is_some_and(|id| self.users.contains(id))
    }
}

/// `COMPASS_SUBSCRIBED_USERS` unset means any user id is subscribed.
#[must_use]
pub fn from_app_config(config: &AppConfig) -> Box<dyn SubscriptionLookup> {
    match &config.subscribed_users {
        Some(users) => Box::new(StaticSubscriptions::new(users.iter().cloned())),
        None => Box::new(AnyUserIsSubscribed),
    }
}
