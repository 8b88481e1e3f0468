use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Declares a closed set of string-valued column values.
///
/// Each variant maps to exactly one lowercase token, which is what the
/// database stores and what request parameters carry.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $token:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($token => Ok($name::$variant),)+
                    _ => Err(CoreError::Validation(format!("unknown {} '{}'", $kind, s))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse::<$name>()
                    .map_err(|err| FromSqlError::Other(err.to_string().into()))
            }
        }
    };
}

text_enum!(TicketStatus, "status", {
    Open => "open",
    WaitingAdmin => "waiting_admin",
    InProgress => "in_progress",
    WaitingCustomer => "waiting_customer",
    Resolved => "resolved",
    Closed => "closed",
});

text_enum!(TicketPriority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

text_enum!(TicketCategory, "category", {
    Technical => "technical",
    Billing => "billing",
    FeatureRequest => "feature_request",
    BugReport => "bug_report",
    ReminderIssues => "reminder_issues",
    General => "general",
});

text_enum!(SenderType, "sender type", {
    Customer => "customer",
    Admin => "admin",
});

text_enum!(BulkAction, "bulk action", {
    Close => "close",
    Reopen => "reopen",
    MarkResolved => "mark_resolved",
});

impl TicketStatus {
    /// Position in the list view; tickets needing attention come first.
    pub fn rank(&self) -> i64 {
        match self {
            TicketStatus::Open => 1,
            TicketStatus::WaitingAdmin => 2,
            TicketStatus::InProgress => 3,
            TicketStatus::WaitingCustomer => 4,
            TicketStatus::Resolved => 5,
            TicketStatus::Closed => 6,
        }
    }

    /// Human label, e.g. `waiting_customer` -> "Waiting customer".
    pub fn label(&self) -> String {
        let spaced = self.as_str().replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl TicketPriority {
    pub fn rank(&self) -> i64 {
        match self {
            TicketPriority::Low => 1,
            TicketPriority::Medium => 2,
            TicketPriority::High => 3,
            TicketPriority::Urgent => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub subject: String,
    pub name: String,
    pub email: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub created_at: i64,
    pub updated_at: i64,
    pub closed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub sender_type: SenderType,
    pub sender_name: String,
    pub sender_email: String,
    pub message: String,
    pub is_internal: bool,
    pub created_at: i64,
}

impl TicketMessage {
    /// Name shown in the thread; staff replies appear under a shared name.
    pub fn display_name(&self) -> &str {
        match self.sender_type {
            SenderType::Admin => "Support Team",
            SenderType::Customer => &self.sender_name,
        }
    }
}

/// Fields for a message that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub ticket_id: i64,
    pub sender_type: SenderType,
    pub sender_name: String,
    pub sender_email: String,
    pub message: String,
    pub is_internal: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub ticket: Ticket,
    pub message_count: i64,
    pub last_reply_at: i64,
    pub last_sender_type: Option<SenderType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPage {
    pub tickets: Vec<TicketSummary>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketStats {
    pub total: i64,
    pub open: i64,
    pub waiting_admin: i64,
    pub in_progress: i64,
    pub waiting_customer: i64,
    pub resolved: i64,
    pub closed: i64,
    pub urgent: i64,
    pub created_last_24h: i64,
}

/// Identity of the staff member performing an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminContext {
    pub admin_id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyOutcome {
    pub ticket_id: i64,
    pub message_id: i64,
    pub status: TicketStatus,
    pub notification: NotificationOutcome,
}
