use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{TicketCategory, TicketPriority, TicketStatus};

pub const PAGE_SIZE: i64 = 25;

/// Upper bound for requested page numbers; keeps OFFSET within i64.
pub const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

/// Raw list parameters as they arrive from the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<TicketCategory>,
    pub search: Option<String>,
    pub page: i64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            category: None,
            search: None,
            page: 1,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TicketFilter {
    pub fn from_request(request: &ListRequest) -> Result<Self, CoreError> {
        let status: Option<TicketStatus> =
            non_empty(&request.status).map(str::parse).transpose()?;
        let priority: Option<TicketPriority> =
            non_empty(&request.priority).map(str::parse).transpose()?;
        let category: Option<TicketCategory> =
            non_empty(&request.category).map(str::parse).transpose()?;
        let page = non_empty(&request.page)
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(1);
        Ok(Self {
            status,
            priority,
            category,
            search: non_empty(&request.search).map(str::to_string),
            page: page.clamp(1, MAX_PAGE),
        })
    }

    pub fn page(&self) -> i64 {
        self.page.clamp(1, MAX_PAGE)
    }

    pub fn offset(&self) -> i64 {
        self.page().saturating_sub(1).saturating_mul(PAGE_SIZE)
    }
}

pub fn total_pages(total_count: i64) -> i64 {
    let pages = (total_count + PAGE_SIZE - 1) / PAGE_SIZE;
    pages.max(1)
}

/// Unicode lowercase used on both sides of the search comparison.
pub fn fold_case(input: &str) -> String {
    input.to_lowercase()
}

fn rank_case(column: &str, ranks: impl Iterator<Item = (&'static str, i64)>) -> String {
    let mut sql = format!("CASE {}", column);
    for (token, rank) in ranks {
        sql.push_str(&format!(" WHEN '{}' THEN {}", token, rank));
    }
    sql.push_str(" END");
    sql
}

pub(crate) fn order_by_clause() -> String {
    let status_rank = rank_case(
        "t.status",
        TicketStatus::ALL.iter().map(|s| (s.as_str(), s.rank())),
    );
    let priority_rank = rank_case(
        "t.priority",
        TicketPriority::ALL.iter().map(|p| (p.as_str(), p.rank())),
    );
    format!(
        "{} ASC, {} DESC, t.updated_at DESC, t.id DESC",
        status_rank, priority_rank
    )
}

/// Parameterised WHERE clause for the ticket list.
///
/// Every value travels through `params`; the SQL text only ever holds
/// numbered placeholders.
#[derive(Debug, Clone)]
pub struct TicketQuery {
    where_clauses: Vec<String>,
    params: Vec<Value>,
}

impl TicketQuery {
    pub fn from_filter(filter: &TicketFilter) -> Self {
        let mut query = TicketQuery {
            where_clauses: Vec::new(),
            params: Vec::new(),
        };
        if let Some(status) = filter.status {
            query.push_eq("t.status", status.as_str());
        }
        if let Some(priority) = filter.priority {
            query.push_eq("t.priority", priority.as_str());
        }
        if let Some(category) = filter.category {
            query.push_eq("t.category", category.as_str());
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push_search(search);
        }
        query
    }

    fn next_idx(&self) -> usize {
        self.params.len() + 1
    }

    fn push_eq(&mut self, column: &str, value: &str) {
        self.where_clauses
            .push(format!("{} = ?{}", column, self.next_idx()));
        self.params.push(value.to_string().into());
    }

    /// Case-insensitive literal substring match on subject, name and email.
    /// `fold` is registered by `db::register_functions`.
    fn push_search(&mut self, search: &str) {
        let needle_idx = self.next_idx();
        let mut branches = vec![
            format!("instr(fold(t.subject), ?{}) > 0", needle_idx),
            format!("instr(fold(t.name), ?{}) > 0", needle_idx),
            format!("instr(fold(t.email), ?{}) > 0", needle_idx),
        ];
        self.params.push(fold_case(search).into());
        if let Ok(id) = search.parse::<i64>() {
            branches.push(format!("t.id = ?{}", self.next_idx()));
            self.params.push(id.into());
        }
        self.where_clauses
            .push(format!("({})", branches.join(" OR ")));
    }

    pub fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(1) FROM support_tickets t {};",
            self.where_sql()
        )
    }

    /// Page query plus its parameters, LIMIT and OFFSET appended last.
    pub fn page_sql(&self, limit: i64, offset: i64) -> (String, Vec<Value>) {
        let limit_idx = self.next_idx();
        let sql = format!(
            "SELECT t.id, t.subject, t.name, t.email, t.status, t.priority, t.category, \
                    t.created_at, t.updated_at, t.closed_at, \
                    (SELECT COUNT(1) FROM ticket_messages m WHERE m.ticket_id = t.id) AS message_count, \
                    COALESCE((SELECT MAX(m.created_at) FROM ticket_messages m WHERE m.ticket_id = t.id), \
                             t.updated_at) AS last_reply_at, \
                    (SELECT m.sender_type FROM ticket_messages m WHERE m.ticket_id = t.id \
                     ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_sender_type \
             FROM support_tickets t \
             {} \
             ORDER BY {} \
             LIMIT ?{} OFFSET ?{};",
            self.where_sql(),
            order_by_clause(),
            limit_idx,
            limit_idx + 1
        );
        let mut params = self.params.clone();
        params.push(limit.into());
        params.push(offset.into());
        (sql, params)
    }
}
