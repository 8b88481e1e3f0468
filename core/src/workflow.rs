//! Ticket workflow: list, detail, staff replies, and bulk status changes.
//!
//! Every mutating operation runs in one IMMEDIATE transaction so concurrent
//! staff actions on the same ticket serialise instead of losing updates.
//! Customer notification happens only after the transaction has committed.

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::filter::{ListRequest, TicketFilter};
use crate::models::{
    AdminContext, BulkAction, NewMessage, NotificationOutcome, ReplyOutcome, SenderType,
    TicketDetail, TicketPage, TicketStats, TicketStatus,
};
use crate::notify::{render_reply_email, Notifier};
use crate::query::{get_messages, get_ticket, query_tickets, ticket_stats};
use crate::store::{bulk_update_status, insert_message, update_ticket_status, ClosedAt, StatusUpdate};

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Raw reply form as submitted by the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplySubmission {
    pub ticket_id: i64,
    pub reply_message: String,
    #[serde(default)]
    pub is_internal: bool,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub ticket_id: i64,
    pub reply_message: String,
    pub is_internal: bool,
    pub requested_status: Option<TicketStatus>,
}

impl ReplyRequest {
    /// An empty or unrecognised status means "no change".
    pub fn from_submission(submission: &ReplySubmission) -> Self {
        let requested_status = submission
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|raw| match raw.parse::<TicketStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    tracing::warn!(status = raw, "ignoring unrecognised reply status");
                    None
                }
            });
        Self {
            ticket_id: submission.ticket_id,
            reply_message: submission.reply_message.clone(),
            is_internal: submission.is_internal,
            requested_status,
        }
    }
}

/// Raw bulk form: selected ids plus the action name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkSubmission {
    pub ticket_ids: Vec<i64>,
    pub action: String,
}

/// Status after a staff reply.
///
/// An explicit request always wins. Without one, a public reply hands the
/// ticket to the customer and an internal note leaves it where it was.
pub fn resolve_reply_status(
    current: TicketStatus,
    requested: Option<TicketStatus>,
    is_internal: bool,
) -> TicketStatus {
    match (requested, is_internal) {
        (Some(status), _) => status,
        (None, true) => current,
        (None, false) => TicketStatus::WaitingCustomer,
    }
}

/// Leaving `closed` through a reply keeps the old `closed_at`; only bulk reopen clears it.
pub fn reply_status_update(status: TicketStatus, now: i64) -> StatusUpdate {
    StatusUpdate {
        status,
        updated_at: now,
        closed_at: if status == TicketStatus::Closed {
            ClosedAt::Set(now)
        } else {
            ClosedAt::Keep
        },
    }
}

pub fn bulk_status_update(action: BulkAction, now: i64) -> StatusUpdate {
    match action {
        BulkAction::Close => StatusUpdate {
            status: TicketStatus::Closed,
            updated_at: now,
            closed_at: ClosedAt::Set(now),
        },
        BulkAction::Reopen => StatusUpdate {
            status: TicketStatus::Open,
            updated_at: now,
            closed_at: ClosedAt::Clear,
        },
        BulkAction::MarkResolved => StatusUpdate {
            status: TicketStatus::Resolved,
            updated_at: now,
            closed_at: ClosedAt::Keep,
        },
    }
}

fn require_admin(ctx: &AdminContext) -> Result<(), CoreError> {
    if ctx.is_admin {
        Ok(())
    } else {
        tracing::warn!(admin_id = ctx.admin_id, "non-admin access refused");
        Err(CoreError::Unauthorized)
    }
}

pub fn list_tickets(
    conn: &Connection,
    ctx: &AdminContext,
    filter: &TicketFilter,
) -> Result<TicketPage, CoreError> {
    require_admin(ctx)?;
    query_tickets(conn, filter)
}

pub fn list_tickets_from_request(
    conn: &Connection,
    ctx: &AdminContext,
    request: &ListRequest,
) -> Result<TicketPage, CoreError> {
    require_admin(ctx)?;
    let filter = TicketFilter::from_request(request)?;
    list_tickets(conn, ctx, &filter)
}

pub fn ticket_detail(
    conn: &Connection,
    ctx: &AdminContext,
    ticket_id: i64,
) -> Result<TicketDetail, CoreError> {
    require_admin(ctx)?;
    let ticket = get_ticket(conn, ticket_id)?.ok_or(CoreError::NotFound(ticket_id))?;
    let messages = get_messages(conn, ticket_id)?;
    Ok(TicketDetail { ticket, messages })
}

pub fn ticket_overview(conn: &Connection, ctx: &AdminContext) -> Result<TicketStats, CoreError> {
    require_admin(ctx)?;
    ticket_stats(conn, now_ms())
}

/// Appends a staff message, moves the ticket status, then emails the customer
/// for public replies. A failed email is reported in the outcome and never
/// undoes the committed reply.
pub fn submit_reply(
    conn: &mut Connection,
    ctx: &AdminContext,
    request: &ReplyRequest,
    notifier: &dyn Notifier,
) -> Result<ReplyOutcome, CoreError> {
    require_admin(ctx)?;
    let reply = request.reply_message.trim();
    if reply.is_empty() {
        return Err(CoreError::validation("reply message is empty"));
    }

    let now = now_ms();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let ticket = get_ticket(&tx, request.ticket_id)?.ok_or_else(|| {
        CoreError::validation(format!("ticket #{} does not exist", request.ticket_id))
    })?;

    let message_id = insert_message(
        &tx,
        &NewMessage {
            ticket_id: ticket.id,
            sender_type: SenderType::Admin,
            sender_name: ctx.name.clone(),
            sender_email: ctx.email.clone(),
            message: reply.to_string(),
            is_internal: request.is_internal,
            created_at: now,
        },
    )?;
    let status = resolve_reply_status(ticket.status, request.requested_status, request.is_internal);
    update_ticket_status(&tx, ticket.id, &reply_status_update(status, now))?;
    tx.commit()?;

    tracing::info!(
        ticket_id = ticket.id,
        message_id,
        from = %ticket.status,
        to = %status,
        internal = request.is_internal,
        admin_id = ctx.admin_id,
        "reply recorded"
    );

    let notification = if request.is_internal {
        NotificationOutcome::Skipped
    } else {
        let email = render_reply_email(&ticket, reply, status);
        match notifier.send(&ticket.email, &email.subject, &email.html_body) {
            Ok(()) => NotificationOutcome::Sent,
            Err(err) => {
                let err = CoreError::Notification(err.to_string());
                tracing::warn!(ticket_id = ticket.id, error = %err, "customer notification failed");
                NotificationOutcome::Failed(err.to_string())
            }
        }
    };

    Ok(ReplyOutcome {
        ticket_id: ticket.id,
        message_id,
        status,
        notification,
    })
}

pub fn submit_reply_form(
    conn: &mut Connection,
    ctx: &AdminContext,
    submission: &ReplySubmission,
    notifier: &dyn Notifier,
) -> Result<ReplyOutcome, CoreError> {
    submit_reply(conn, ctx, &ReplyRequest::from_submission(submission), notifier)
}

/// Returns how many tickets changed; unknown ids are skipped.
pub fn apply_bulk_action(
    conn: &mut Connection,
    ctx: &AdminContext,
    ticket_ids: &[i64],
    action: BulkAction,
) -> Result<usize, CoreError> {
    require_admin(ctx)?;
    if ticket_ids.is_empty() {
        return Err(CoreError::validation("no tickets selected"));
    }
    let mut ids = ticket_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let affected = bulk_update_status(&tx, &ids, &bulk_status_update(action, now_ms()))?;
    tx.commit()?;

    tracing::info!(
        action = %action,
        requested = ids.len(),
        affected,
        admin_id = ctx.admin_id,
        "bulk action applied"
    );
    Ok(affected)
}

pub fn submit_bulk_form(
    conn: &mut Connection,
    ctx: &AdminContext,
    submission: &BulkSubmission,
) -> Result<usize, CoreError> {
    require_admin(ctx)?;
    if submission.ticket_ids.is_empty() {
        return Err(CoreError::validation("no tickets selected"));
    }
    let action = submission.action.parse::<BulkAction>()?;
    apply_bulk_action(conn, ctx, &submission.ticket_ids, action)
}
