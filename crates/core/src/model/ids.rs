use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for an onboarding record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    /// Wraps an existing identifier, e.g. one read back from storage.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives a fresh identifier for `user_id` created at `at`.
    ///
    /// The shape is `emp_{user_id}_{unix_seconds}`.
    #[must_use]
    pub fn generate(user_id: &UserId, at: DateTime<Utc>) -> Self {
        Self(format!("emp_{}_{}", user_id.as_str(), at.timestamp()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// External chat-platform identity of an employee (unique per record).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the user id from a mention such as `<@U123|alex>`.
    ///
    /// Plain ids are returned as-is; empty input yields `None`.
    #[must_use]
    pub fn from_mention(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let inner = trimmed
            .strip_prefix("<@")
            .and_then(|s| s.strip_suffix('>'))
            .map_or(trimmed, |s| s.split('|').next().unwrap_or(s));
        if inner.is_empty() {
            None
        } else {
            Some(Self::new(inner))
        }
    }
}

impl fmt::Debug for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmployeeId({})", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn employee_id_embeds_user_and_timestamp() {
        let id = EmployeeId::generate(&UserId::new("U42"), fixed_now());
        assert_eq!(id.as_str(), "emp_U42_1700000000");
    }

    #[test]
    fn user_id_parses_mentions() {
        assert_eq!(UserId::from_mention("<@U9|sam>"), Some(UserId::new("U9")));
        assert_eq!(UserId::from_mention("<@U9>"), Some(UserId::new("U9")));
        assert_eq!(UserId::from_mention(" U7 "), Some(UserId::new("U7")));
        assert_eq!(UserId::from_mention("   "), None);
    }

    #[test]
    fn employee_id_displays_verbatim() {
        assert_eq!(EmployeeId::new("emp_U1_5").to_string(), "emp_U1_5");
    }
}
