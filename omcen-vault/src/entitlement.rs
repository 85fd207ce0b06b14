//! Service entitlement checks.
//!
//! Subscriptions are managed elsewhere; the vault only asks whether a user
//! may use a service before touching any key material.

use crate::types::Service;
use std::collections::HashSet;
use std::sync::RwLock;

/// Answers "is this user subscribed to this service".
pub trait Entitlements: Send + Sync {
    fn is_subscribed(&self, user_id: &str, service: Service) -> bool;
}

/// In-memory entitlement set.
#[derive(Default)]
pub struct StaticEntitlements {
    granted: RwLock<HashSet<(String, Service)>>,
}

impl StaticEntitlements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, user_id: &str, service: Service) {
        self.granted
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((user_id.to_string(), service));
    }

    pub fn revoke(&self, user_id: &str, service: Service) {
        self.granted
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(user_id.to_string(), service));
    }
}

impl Entitlements for StaticEntitlements {
    fn is_subscribed(&self, user_id: &str, service: Service) -> bool {
        self.granted
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(user_id.to_string(), service))
    }
}
