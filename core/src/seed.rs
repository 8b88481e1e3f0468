use rusqlite::{params, Connection};

use crate::error::CoreError;
use crate::models::{SenderType, TicketCategory, TicketPriority, TicketStatus};

const SUBJECTS: &[&str] = &[
    "Reminder emails arrive late",
    "Charged twice this month",
    "Add weekly recurrence option",
    "SMS reminder shows wrong time zone",
    "Cannot reset password",
    "Question about the free plan",
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Alice Martin", "alice@example.com"),
    ("Bruno Silva", "bruno@example.com"),
    ("Chen Wei", "chen@example.com"),
    ("Dana Cohen", "dana@example.com"),
];

/// Inserts `ticket_count` deterministic tickets with short threads.
pub fn seed_demo(conn: &Connection, ticket_count: i64) -> Result<(), CoreError> {
    conn.execute_batch("BEGIN;")?;
    let result = (|| -> Result<(), CoreError> {
        let mut ticket_stmt = conn.prepare(
            "INSERT INTO support_tickets \
             (subject, name, email, status, priority, category, created_at, updated_at, closed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        )?;
        let mut msg_stmt = conn.prepare(
            "INSERT INTO ticket_messages \
             (ticket_id, sender_type, sender_name, sender_email, message, is_internal, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        )?;

        let base_ts = 1_700_000_000_000i64;
        for idx in 0..ticket_count {
            let i = idx as usize;
            let (name, email) = CUSTOMERS[i % CUSTOMERS.len()];
            let subject = SUBJECTS[i % SUBJECTS.len()];
            let status = TicketStatus::ALL[i % TicketStatus::ALL.len()];
            let priority = TicketPriority::ALL[i % TicketPriority::ALL.len()];
            let category = TicketCategory::ALL[i % TicketCategory::ALL.len()];
            let created_at = base_ts + idx * 3_600_000;
            let reply_count = (idx % 3) + 1;
            let updated_at = created_at + reply_count * 60_000;
            let closed_at = (status == TicketStatus::Closed).then_some(updated_at);

            ticket_stmt.execute(params![
                subject, name, email, status, priority, category, created_at, updated_at, closed_at
            ])?;
            let ticket_id = conn.last_insert_rowid();

            for n in 0..reply_count {
                let ts = created_at + (n + 1) * 60_000;
                if n % 2 == 0 {
                    msg_stmt.execute(params![
                        ticket_id,
                        SenderType::Customer,
                        name,
                        email,
                        format!("{} (message {})", subject, n + 1),
                        0i64,
                        ts
                    ])?;
                } else {
                    msg_stmt.execute(params![
                        ticket_id,
                        SenderType::Admin,
                        "Support Admin",
                        "support@freereminders.net",
                        format!("Thanks {}, we are looking into it.", name),
                        (idx % 5 == 4) as i64,
                        ts
                    ])?;
                }
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT;")?;
            tracing::info!(ticket_count, "demo tickets seeded");
            Ok(())
        }
        Err(err) => {
            let _ = conn.execute_batch("ROLLBACK;");
            Err(err)
        }
    }
}
