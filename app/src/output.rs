use chrono::{DateTime, Utc};
use serde::Serialize;
use support_desk_core::models::{
    NotificationOutcome, ReplyOutcome, TicketDetail, TicketPage, TicketStats,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TicketRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Msgs")]
    messages: i64,
    #[tabled(rename = "Last reply")]
    last_reply: String,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Count")]
    count: i64,
}

pub fn format_ts(ts_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts_ms.to_string())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_page(page: &TicketPage) {
    if page.tickets.is_empty() {
        println!("No tickets match.");
    } else {
        let rows: Vec<TicketRow> = page
            .tickets
            .iter()
            .map(|summary| {
                let t = &summary.ticket;
                let waiting_on_us = summary.last_sender_type
                    == Some(support_desk_core::models::SenderType::Customer);
                TicketRow {
                    id: format!("#{}", t.id),
                    status: t.status.label(),
                    priority: t.priority.to_string(),
                    category: t.category.to_string(),
                    subject: truncate(&t.subject, 40),
                    customer: format!("{} <{}>", t.name, t.email),
                    messages: summary.message_count,
                    last_reply: if waiting_on_us {
                        format!("{} *", format_ts(summary.last_reply_at))
                    } else {
                        format_ts(summary.last_reply_at)
                    },
                }
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
    println!(
        "Page {} of {} ({} tickets)",
        page.page, page.total_pages, page.total_count
    );
}

pub fn print_detail(detail: &TicketDetail) {
    let t = &detail.ticket;
    println!("Ticket #{}: {}", t.id, t.subject);
    println!("From:     {} <{}>", t.name, t.email);
    println!(
        "Status:   {}   Priority: {}   Category: {}",
        t.status.label(),
        t.priority,
        t.category
    );
    println!("Created:  {}   Updated: {}", format_ts(t.created_at), format_ts(t.updated_at));
    if let Some(closed) = t.closed_at {
        println!("Closed:   {}", format_ts(closed));
    }
    for message in &detail.messages {
        println!();
        let marker = if message.is_internal { " [internal]" } else { "" };
        println!(
            "--- {} ({}){}",
            message.display_name(),
            format_ts(message.created_at),
            marker
        );
        println!("{}", message.message);
    }
}

pub fn print_reply(outcome: &ReplyOutcome) {
    println!(
        "Reply #{} added to ticket #{}; status is now {}.",
        outcome.message_id,
        outcome.ticket_id,
        outcome.status.label()
    );
    match &outcome.notification {
        NotificationOutcome::Sent => println!("Customer notified by email."),
        NotificationOutcome::Skipped => println!("Internal note; customer not notified."),
        NotificationOutcome::Failed(reason) => {
            println!("Reply saved, but the customer email failed: {}", reason)
        }
    }
}

pub fn print_stats(stats: &TicketStats) {
    let rows = vec![
        StatRow { metric: "Total", count: stats.total },
        StatRow { metric: "Open", count: stats.open },
        StatRow { metric: "Waiting admin", count: stats.waiting_admin },
        StatRow { metric: "In progress", count: stats.in_progress },
        StatRow { metric: "Waiting customer", count: stats.waiting_customer },
        StatRow { metric: "Resolved", count: stats.resolved },
        StatRow { metric: "Closed", count: stats.closed },
        StatRow { metric: "Urgent", count: stats.urgent },
        StatRow { metric: "Created in last 24h", count: stats.created_last_24h },
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));
}
