use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::CoreError;
use crate::filter::{total_pages, TicketFilter, TicketQuery, PAGE_SIZE};
use crate::models::{Ticket, TicketMessage, TicketPage, TicketStats, TicketSummary};

const TICKET_COLUMNS: &str = "id, subject, name, email, status, priority, category, \
                              created_at, updated_at, closed_at";

const MESSAGE_COLUMNS: &str = "id, ticket_id, sender_type, sender_name, sender_email, \
                               message, is_internal, created_at";

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        subject: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        category: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        closed_at: row.get(9)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<TicketMessage> {
    Ok(TicketMessage {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        sender_type: row.get(2)?,
        sender_name: row.get(3)?,
        sender_email: row.get(4)?,
        message: row.get(5)?,
        is_internal: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
    })
}

/// Filtered, sorted page of tickets plus the unpaged match count.
pub fn query_tickets(conn: &Connection, filter: &TicketFilter) -> Result<TicketPage, CoreError> {
    let query = TicketQuery::from_filter(filter);

    let total_count: i64 = conn.query_row(
        &query.count_sql(),
        rusqlite::params_from_iter(query.params().iter()),
        |row| row.get(0),
    )?;

    let (sql, params_vec) = query.page_sql(PAGE_SIZE, filter.offset());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec), |row| {
        Ok(TicketSummary {
            ticket: ticket_from_row(row)?,
            message_count: row.get(10)?,
            last_reply_at: row.get(11)?,
            last_sender_type: row.get(12)?,
        })
    })?;
    let tickets = rows.collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        total_count,
        returned = tickets.len(),
        page = filter.page(),
        "ticket list queried"
    );
    Ok(TicketPage {
        tickets,
        total_count,
        page: filter.page(),
        page_size: PAGE_SIZE,
        total_pages: total_pages(total_count),
    })
}

pub fn get_ticket(conn: &Connection, ticket_id: i64) -> Result<Option<Ticket>, CoreError> {
    conn.query_row(
        &format!("SELECT {} FROM support_tickets WHERE id = ?1;", TICKET_COLUMNS),
        params![ticket_id],
        ticket_from_row,
    )
    .optional()
    .map_err(CoreError::from)
}

/// Thread of a ticket, oldest first. Same-millisecond messages keep insertion order.
pub fn get_messages(conn: &Connection, ticket_id: i64) -> Result<Vec<TicketMessage>, CoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM ticket_messages \
         WHERE ticket_id = ?1 \
         ORDER BY created_at ASC, id ASC;",
        MESSAGE_COLUMNS
    ))?;
    let rows = stmt.query_map(params![ticket_id], message_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn ticket_stats(conn: &Connection, now_ms: i64) -> Result<TicketStats, CoreError> {
    conn.query_row(
        "SELECT COUNT(1), \
                COALESCE(SUM(CASE WHEN status = 'open' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'waiting_admin' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'waiting_customer' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'closed' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN priority = 'urgent' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN created_at >= ?1 THEN 1 ELSE 0 END), 0) \
         FROM support_tickets;",
        params![now_ms - DAY_MS],
        |row| {
            Ok(TicketStats {
                total: row.get(0)?,
                open: row.get(1)?,
                waiting_admin: row.get(2)?,
                in_progress: row.get(3)?,
                waiting_customer: row.get(4)?,
                resolved: row.get(5)?,
                closed: row.get(6)?,
                urgent: row.get(7)?,
                created_last_24h: row.get(8)?,
            })
        },
    )
    .map_err(CoreError::from)
}
