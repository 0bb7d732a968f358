/// Shared types used across the codebase
///
/// Every enum here is stored as TEXT in Postgres. Models decode them with
/// `#[sqlx(try_from = "String")]` and queries bind `as_str()`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError { kind: $kind, value: s.to_string() }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum! {
    /// Organization role carried by a membership
    Role ("role") {
        Owner => "owner",
        Admin => "admin",
        Member => "member",
    }
}

impl Role {
    /// Owners get the owner dashboard; everyone else is routed as a team member.
    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }

    /// Owners and admins manage organization-wide data through the API.
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

text_enum! {
    MembershipStatus ("membership status") {
        Active => "active",
        Inactive => "inactive",
    }
}

text_enum! {
    ClientStatus ("client status") {
        Active => "active",
        Inactive => "inactive",
    }
}

text_enum! {
    ProjectStatus ("project status") {
        Planning => "planning",
        Active => "active",
        OnHold => "on_hold",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    TaskStatus ("task status") {
        Todo => "todo",
        InProgress => "in_progress",
        Review => "review",
        Done => "done",
    }
}

impl TaskStatus {
    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Done)
    }
}

text_enum! {
    TaskPriority ("task priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

text_enum! {
    PaymentStatus ("payment status") {
        Pending => "pending",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn admin_manages_but_is_not_owner() {
        assert!(Role::Admin.can_manage());
        assert!(!Role::Admin.is_owner());
        assert!(!Role::Member.can_manage());
    }

    #[test]
    fn snake_case_round_trips_through_serde() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!(ProjectStatus::OnHold.as_str(), "on_hold");
    }

    #[test]
    fn try_from_string_reports_kind() {
        let err = PaymentStatus::try_from("refunded".to_string()).unwrap_err();
        assert_eq!(err.kind, "payment status");
        assert_eq!(err.to_string(), "invalid payment status: 'refunded'");
    }
}
