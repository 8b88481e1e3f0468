use rusqlite::types::Value;
use rusqlite::{params, Connection};

use crate::error::CoreError;
use crate::models::{NewMessage, TicketStatus};

/// What a status write does to `closed_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedAt {
    Keep,
    Set(i64),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: TicketStatus,
    pub updated_at: i64,
    pub closed_at: ClosedAt,
}

impl StatusUpdate {
    fn assignments(&self, first_idx: usize) -> (String, Vec<Value>) {
        let mut sets = vec![
            format!("status = ?{}", first_idx),
            format!("updated_at = ?{}", first_idx + 1),
        ];
        let mut values: Vec<Value> = vec![
            self.status.as_str().to_string().into(),
            self.updated_at.into(),
        ];
        match self.closed_at {
            ClosedAt::Keep => {}
            ClosedAt::Set(ts) => {
                sets.push(format!("closed_at = ?{}", first_idx + 2));
                values.push(ts.into());
            }
            ClosedAt::Clear => sets.push("closed_at = NULL".to_string()),
        }
        (sets.join(", "), values)
    }
}

pub fn insert_message(conn: &Connection, message: &NewMessage) -> Result<i64, CoreError> {
    conn.execute(
        "INSERT INTO ticket_messages \
         (ticket_id, sender_type, sender_name, sender_email, message, is_internal, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            message.ticket_id,
            message.sender_type,
            message.sender_name,
            message.sender_email,
            message.message,
            message.is_internal as i64,
            message.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_ticket_status(
    conn: &Connection,
    ticket_id: i64,
    update: &StatusUpdate,
) -> Result<usize, CoreError> {
    let (sets, mut values) = update.assignments(1);
    let sql = format!(
        "UPDATE support_tickets SET {} WHERE id = ?{};",
        sets,
        values.len() + 1
    );
    values.push(ticket_id.into());
    Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?)
}

/// Applies one update to every listed ticket in a single statement.
///
/// Ids without a row are ignored; the return value counts rows changed.
pub fn bulk_update_status(
    conn: &Connection,
    ticket_ids: &[i64],
    update: &StatusUpdate,
) -> Result<usize, CoreError> {
    if ticket_ids.is_empty() {
        return Ok(0);
    }
    let (sets, mut values) = update.assignments(1);
    let first_id_idx = values.len() + 1;
    let placeholders = (0..ticket_ids.len())
        .map(|offset| format!("?{}", first_id_idx + offset))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE support_tickets SET {} WHERE id IN ({});",
        sets, placeholders
    );
    values.extend(ticket_ids.iter().map(|id| Value::from(*id)));
    Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_cover_closed_at_modes() {
        let mut update = StatusUpdate {
            status: TicketStatus::Closed,
            updated_at: 10,
            closed_at: ClosedAt::Set(10),
        };
        let (sets, values) = update.assignments(1);
        assert_eq!(sets, "status = ?1, updated_at = ?2, closed_at = ?3");
        assert_eq!(values.len(), 3);

        update.closed_at = ClosedAt::Clear;
        let (sets, values) = update.assignments(1);
        assert_eq!(sets, "status = ?1, updated_at = ?2, closed_at = NULL");
        assert_eq!(values.len(), 2);

        update.closed_at = ClosedAt::Keep;
        let (sets, _) = update.assignments(1);
        assert!(!sets.contains("closed_at"));
    }
}
