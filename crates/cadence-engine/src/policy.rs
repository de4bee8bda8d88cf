//! Protection policy -- whether a conflict with a given item may be overridden.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conflict::BufferedInterval;

/// Kind of calendar item. Every kind except `Ordinary` is protected time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Meetings, appointments, reminders.
    #[default]
    Ordinary,
    /// Deep-work time reserved by a focus mode.
    FocusBlock,
    PersonalTime,
    OutOfOffice,
}

impl EventType {
    pub fn is_protected_kind(self) -> bool {
        !matches!(self, EventType::Ordinary)
    }
}

/// Why a conflict was allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyReason {
    /// The conflicting item is ordinary; the overlap is informational.
    NotProtected,
    /// The item is protected and the actor may override it.
    OverrideGranted,
    /// The item is protected and the actor may not override it.
    OverrideDenied,
}

impl fmt::Display for PolicyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicyReason::NotProtected => "NOT_PROTECTED",
            PolicyReason::OverrideGranted => "OVERRIDE_GRANTED",
            PolicyReason::OverrideDenied => "OVERRIDE_DENIED",
        };
        f.write_str(s)
    }
}

/// Outcome of evaluating one conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: PolicyReason,
}

/// Decide whether a conflict with `conflict` may proceed.
///
/// An item is protected when its flag is set or its type is a protected kind.
/// Unprotected conflicts are always allowed; the caller may still choose to
/// block them. Protected conflicts are allowed exactly when the actor holds
/// override capability, which is resolved outside the engine.
pub fn evaluate(conflict: &BufferedInterval, actor_can_override: bool) -> Decision {
    if !conflict.is_protected && !conflict.event_type.is_protected_kind() {
        return Decision {
            allowed: true,
            reason: PolicyReason::NotProtected,
        };
    }

    if actor_can_override {
        Decision {
            allowed: true,
            reason: PolicyReason::OverrideGranted,
        }
    } else {
        Decision {
            allowed: false,
            reason: PolicyReason::OverrideDenied,
        }
    }
}
