#![allow(dead_code)]

use std::cell::RefCell;

use rusqlite::{params, Connection};
use support_desk_core::db::{apply_migrations, register_functions};
use support_desk_core::models::{AdminContext, TicketCategory, TicketPriority, TicketStatus};
use support_desk_core::notify::{Notifier, NotifyError};

pub fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().expect("memory db");
    register_functions(&conn).expect("functions");
    apply_migrations(&conn).expect("migrate");
    conn
}

pub fn admin() -> AdminContext {
    AdminContext {
        admin_id: 1,
        name: "Support Admin".to_string(),
        email: "support@freereminders.net".to_string(),
        is_admin: true,
    }
}

pub struct TicketSeed<'a> {
    pub id: i64,
    pub subject: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub updated_at: i64,
}

impl<'a> TicketSeed<'a> {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            subject: "General question",
            name: "Casey Customer",
            email: "casey@example.com",
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            category: TicketCategory::General,
            updated_at: 1_000,
        }
    }
}

pub fn insert_ticket(conn: &Connection, seed: &TicketSeed<'_>) {
    conn.execute(
        "INSERT INTO support_tickets \
         (id, subject, name, email, status, priority, category, created_at, updated_at, closed_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            seed.id,
            seed.subject,
            seed.name,
            seed.email,
            seed.status,
            seed.priority,
            seed.category,
            seed.updated_at,
            seed.updated_at,
            (seed.status == TicketStatus::Closed).then_some(seed.updated_at),
        ],
    )
    .unwrap();
}

pub fn insert_customer_message(conn: &Connection, ticket_id: i64, body: &str, created_at: i64) {
    conn.execute(
        "INSERT INTO ticket_messages \
         (ticket_id, sender_type, sender_name, sender_email, message, is_internal, created_at) \
         VALUES (?1, 'customer', 'Casey Customer', 'casey@example.com', ?2, 0, ?3);",
        params![ticket_id, body, created_at],
    )
    .unwrap();
}

pub fn closed_at(conn: &Connection, ticket_id: i64) -> Option<i64> {
    conn.query_row(
        "SELECT closed_at FROM support_tickets WHERE id = ?1;",
        params![ticket_id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn message_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(1) FROM ticket_messages;", [], |row| row.get(0))
        .unwrap()
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<SentEmail>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        self.sent.borrow_mut().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}
