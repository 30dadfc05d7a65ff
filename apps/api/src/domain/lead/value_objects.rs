use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a lead
///
/// # Status Transitions
/// ```text
/// Pending -> Calling -> Called
///    |          |-----> Failed -> Pending (reset)
///    |          `-----> Invalid
///    `-----------------> Invalid
/// any non-terminal -----> DoNotCall
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Waiting to be dialled
    Pending,
    /// A call is being placed
    Calling,
    /// The provider accepted the call
    Called,
    /// The call could not be placed; eligible for reset
    Failed,
    /// The number or request was rejected permanently
    Invalid,
    /// Opted out, never dialled again
    DoNotCall,
}

impl LeadStatus {
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        use LeadStatus::*;
        matches!(
            (self, next),
            (Pending, Calling)
                | (Pending, Invalid)
                | (Calling, Called)
                | (Calling, Failed)
                | (Calling, Invalid)
                | (Called, Failed)
                | (Failed, Pending)
                | (Pending, DoNotCall)
                | (Calling, DoNotCall)
                | (Called, DoNotCall)
                | (Failed, DoNotCall)
        )
    }

    /// All statuses, in display order
    pub fn all() -> [LeadStatus; 6] {
        use LeadStatus::*;
        [Pending, Calling, Called, Failed, Invalid, DoNotCall]
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadStatus::Pending => write!(f, "pending"),
            LeadStatus::Calling => write!(f, "calling"),
            LeadStatus::Called => write!(f, "called"),
            LeadStatus::Failed => write!(f, "failed"),
            LeadStatus::Invalid => write!(f, "invalid"),
            LeadStatus::DoNotCall => write!(f, "do_not_call"),
        }
    }
}

/// Email value object
///
/// # Invariants
/// - Contains exactly one '@' with text on both sides
/// - Stored trimmed and lowercased
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// # Example
    /// ```
    /// use dialwave_api::domain::lead::Email;
    ///
    /// let email = Email::new(" Jane@Example.com ").expect("valid email");
    /// assert_eq!(email.as_str(), "jane@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into().trim().to_lowercase();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
