//! Entity tables and the closed value sets stored in them.
//!
//! Both dialects store the same labels: `MySQL` declares them as native
//! `ENUM` columns, `SQLite` stores them as `TEXT` and the application
//! enforces the set through these enums.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoreError};

/// The eight entity tables, in creation order.
pub const ENTITY_TABLES: [&str; 8] = [
    "users",
    "employees",
    "processes",
    "process_scores",
    "innovation_ideas",
    "badges",
    "projects",
    "logs",
];

/// Hire-date column of `employees`; needs quoting in both dialects.
pub const HIRE_DATE_COLUMN: &str = "İşe_Giriş_Tarihi";

/// Soft-delete filter. A `NULL` flag counts as active.
pub const ACTIVE_PREDICATE: &str = "COALESCE(deleted, 0) = 0";

/// Defines a closed set of stored labels as a Rust enum.
macro_rules! define_value_set {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
        default = $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stored label.
            pub fn as_sql(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Parse a stored label (exact match).
            pub fn from_sql(label: &str) -> Result<Self> {
                match label {
                    $($label => Ok(Self::$variant),)+
                    other => Err(StoreError::InvalidValue(format!(
                        "{other:?} is not a valid {}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_sql())
            }
        }

        impl From<$name> for $crate::Value {
            fn from(v: $name) -> Self {
                $crate::Value::Text(v.as_sql().to_string())
            }
        }
    };
}

define_value_set! {
    /// Panel access role of a user account.
    Role {
        /// Administrator.
        Admin => "admin",
        /// Manager.
        Manager => "mudur",
        /// Employee.
        Employee => "calisan",
        /// Senior manager.
        SeniorManager => "gmy",
    }
    default = Employee
}

define_value_set! {
    /// Approval state of a process score.
    ApprovalState {
        /// Awaiting review.
        Pending => "Beklemede",
        /// Approved.
        Approved => "Onaylandı",
        /// Rejected.
        Rejected => "Reddedildi",
    }
    default = Pending
}

define_value_set! {
    /// Review status of an innovation idea.
    IdeaStatus {
        /// Awaiting review.
        Pending => "Beklemede",
        /// Under review.
        UnderReview => "Değerlendiriliyor",
        /// Approved.
        Approved => "Onaylandı",
        /// Rejected.
        Rejected => "Reddedildi",
    }
    default = Pending
}

define_value_set! {
    /// Lifecycle status of a project.
    ProjectStatus {
        /// Not started.
        Planning => "Planning",
        /// Running.
        InProgress => "In Progress",
        /// Finished.
        Completed => "Completed",
        /// Paused.
        OnHold => "On Hold",
        /// Abandoned.
        Cancelled => "Cancelled",
    }
    default = Planning
}

/// Render a value set as a `MySQL` `ENUM(...)` member list: `'a','b'`.
pub fn sql_enum_list(labels: impl IntoIterator<Item = &'static str>) -> String {
    labels
        .into_iter()
        .map(|l| format!("'{}'", l.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(",")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn labels_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_sql(role.as_sql()).unwrap(), *role);
        }
        for status in ProjectStatus::ALL {
            assert_eq!(ProjectStatus::from_sql(status.as_sql()).unwrap(), *status);
        }
    }

    #[test]
    fn unknown_label_is_invalid_value() {
        assert_matches!(Role::from_sql("root"), Err(StoreError::InvalidValue(_)));
        // labels are case-sensitive
        assert_matches!(ApprovalState::from_sql("beklemede"), Err(StoreError::InvalidValue(_)));
    }

    #[test]
    fn defaults_match_column_defaults() {
        assert_eq!(Role::default().as_sql(), "calisan");
        assert_eq!(ApprovalState::default().as_sql(), "Beklemede");
        assert_eq!(IdeaStatus::default().as_sql(), "Beklemede");
        assert_eq!(ProjectStatus::default().as_sql(), "Planning");
    }

    #[test]
    fn serde_uses_stored_labels() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let parsed: IdeaStatus = serde_json::from_str("\"Değerlendiriliyor\"").unwrap();
        assert_eq!(parsed, IdeaStatus::UnderReview);
    }

    #[test]
    fn enum_list_quotes_each_label() {
        let list = sql_enum_list(ApprovalState::ALL.iter().map(|s| s.as_sql()));
        assert_eq!(list, "'Beklemede','Onaylandı','Reddedildi'");
    }

    #[test]
    fn eight_entity_tables() {
        assert_eq!(ENTITY_TABLES.len(), 8);
        assert!(ENTITY_TABLES.contains(&"process_scores"));
    }
}
