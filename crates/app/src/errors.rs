//! Failure taxonomy shared by every service error.

use std::fmt;

/// Coarse classification of a failed operation, used by callers to pick a
/// user-facing message and decide whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The design is no longer available for the attempted action.
    Unavailable,

    /// A uniqueness constraint was hit.
    Conflict,

    /// The call did not complete; state is as it was before the call.
    Transient,

    /// The ledger rejected a spend.
    InsufficientBalance,

    /// A two-step sequence stopped half-way and needs reconciliation.
    Inconsistent,

    /// The referenced record does not exist.
    NotFound,

    /// No session, or the session was rejected.
    Unauthenticated,

    /// The request was rejected as invalid.
    Invalid,
}

impl FailureKind {
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Short message safe to show to an end user.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Unavailable => "This design is no longer available.",
            Self::Conflict => "That already exists.",
            Self::Transient => "Something went wrong. Please try again.",
            Self::InsufficientBalance => "You do not have enough points.",
            Self::Inconsistent => {
                "Your request was only partly completed. It will be fixed automatically."
            }
            Self::NotFound => "Not found.",
            Self::Unauthenticated => "Please sign in first.",
            Self::Invalid => "The request was rejected.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}
