//! Audit event emission.
//!
//! The user-facing operations in [`crate::AuthManager`] emit one of these
//! after each state change commits. The sink is a pluggable seam rather
//! than a stored function pointer, so the lock/notify sequence stays
//! commit-then-publish.

use s3auth_core::UserId;

/// An audit-worthy state change.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// A new user was created.
    UserCreated { user_id: UserId },
    /// A user's mutable attributes were updated.
    UserUpdated { user_id: UserId },
    /// A user was tombstoned.
    UserDeleted { user_id: UserId },
    /// An account was administratively or automatically locked.
    UserBlocked { user_id: UserId },
    /// A lock was cleared.
    UserUnblocked { user_id: UserId },
    /// 2FA was enabled for a user.
    TwoFactorEnabled { user_id: UserId },
    /// 2FA was disabled for a user.
    TwoFactorDisabled { user_id: UserId },
    /// A login attempt failed.
    LoginFailed { username: String },
}

/// Where audit events go. Implementations may log, publish to a queue, or
/// fan out to observers; the manager itself only ever produces events.
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    /// Record one event. Must not block on I/O the caller can't tolerate;
    /// implementations that need to do slow work should hand the event off.
    fn record(&self, event: AuditEvent);
}

/// An [`AuditSink`] that logs each event at `info` level via `tracing` and
/// nothing else. The default when no richer sink is wired up.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match event {
            AuditEvent::UserCreated { user_id } => tracing::info!(%user_id, "user_created"),
            AuditEvent::UserUpdated { user_id } => tracing::info!(%user_id, "user_updated"),
            AuditEvent::UserDeleted { user_id } => tracing::info!(%user_id, "user_deleted"),
            AuditEvent::UserBlocked { user_id } => tracing::info!(%user_id, "user_blocked"),
            AuditEvent::UserUnblocked { user_id } => tracing::info!(%user_id, "user_unblocked"),
            AuditEvent::TwoFactorEnabled { user_id } => tracing::info!(%user_id, "2fa_enabled"),
            AuditEvent::TwoFactorDisabled { user_id } => tracing::info!(%user_id, "2fa_disabled"),
            AuditEvent::LoginFailed { username } => tracing::info!(%username, "login_failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct CollectingSink {
        events: std::sync::Mutex<Vec<String>>,
    }

    impl AuditSink for CollectingSink {
        fn record(&self, event: AuditEvent) {
            let label = match event {
                AuditEvent::UserCreated { .. } => "user_created",
                AuditEvent::UserUpdated { .. } => "user_updated",
                AuditEvent::UserDeleted { .. } => "user_deleted",
                AuditEvent::UserBlocked { .. } => "user_blocked",
                AuditEvent::UserUnblocked { .. } => "user_unblocked",
                AuditEvent::TwoFactorEnabled { .. } => "2fa_enabled",
                AuditEvent::TwoFactorDisabled { .. } => "2fa_disabled",
                AuditEvent::LoginFailed { .. } => "login_failed",
            };
            self.events.lock().unwrap().push(label.to_owned());
        }
    }

    #[test]
    fn test_should_record_event_label() {
        let sink = CollectingSink::default();
        sink.record(AuditEvent::UserCreated { user_id: UserId::new() });
        assert_eq!(sink.events.lock().unwrap().as_slice(), ["user_created"]);
    }
}
