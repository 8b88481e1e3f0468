mod common;

use common::{
    admin, closed_at, insert_customer_message, insert_ticket, message_count, setup_db,
    FailingNotifier, RecordingNotifier, TicketSeed,
};
use support_desk_core::models::{
    AdminContext, BulkAction, NotificationOutcome, SenderType, TicketPriority, TicketStatus,
};
use support_desk_core::query::{get_messages, get_ticket};
use support_desk_core::workflow::{
    apply_bulk_action, submit_bulk_form, submit_reply, submit_reply_form, ticket_detail,
    BulkSubmission, ReplyRequest, ReplySubmission,
};
use support_desk_core::CoreError;

fn reply(ticket_id: i64, text: &str) -> ReplyRequest {
    ReplyRequest {
        ticket_id,
        reply_message: text.to_string(),
        is_internal: false,
        requested_status: None,
    }
}

#[test]
fn public_reply_moves_open_ticket_to_waiting_customer_and_notifies() {
    let mut conn = setup_db();
    insert_ticket(
        &conn,
        &TicketSeed {
            priority: TicketPriority::High,
            email: "owner@example.com",
            subject: "Reminders missing",
            ..TicketSeed::new(42)
        },
    );
    let notifier = RecordingNotifier::default();

    let outcome = submit_reply(&mut conn, &admin(), &reply(42, "We are investigating"), &notifier)
        .expect("reply");

    assert_eq!(outcome.ticket_id, 42);
    assert_eq!(outcome.status, TicketStatus::WaitingCustomer);
    assert_eq!(outcome.notification, NotificationOutcome::Sent);
    let ticket = get_ticket(&conn, 42).expect("get").expect("exists");
    assert_eq!(ticket.status, TicketStatus::WaitingCustomer);
    assert_eq!(ticket.closed_at, None);
    assert!(ticket.updated_at > 1_000);

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "owner@example.com");
    assert!(sent[0].subject.contains("#42"));
    assert!(sent[0].subject.contains("Reminders missing"));
    assert!(sent[0].body.contains("We are investigating"));
    assert!(sent[0].body.contains("Waiting customer"));
}

#[test]
fn internal_note_keeps_status_and_skips_notification() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed { status: TicketStatus::InProgress, ..TicketSeed::new(1) });
    let notifier = RecordingNotifier::default();

    let request = ReplyRequest { is_internal: true, ..reply(1, "checked the logs") };
    let outcome = submit_reply(&mut conn, &admin(), &request, &notifier).expect("reply");

    assert_eq!(outcome.status, TicketStatus::InProgress);
    assert_eq!(outcome.notification, NotificationOutcome::Skipped);
    assert!(notifier.sent.borrow().is_empty());
    let ticket = get_ticket(&conn, 1).expect("get").expect("exists");
    assert!(ticket.updated_at > 1_000);
    let messages = get_messages(&conn, 1).expect("messages");
    assert!(messages[0].is_internal);
}

#[test]
fn explicit_status_overrides_default_rules() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    let notifier = RecordingNotifier::default();

    let request = ReplyRequest { requested_status: Some(TicketStatus::Resolved), ..reply(1, "fixed") };
    let outcome = submit_reply(&mut conn, &admin(), &request, &notifier).expect("reply");
    assert_eq!(outcome.status, TicketStatus::Resolved);

    let request = ReplyRequest {
        is_internal: true,
        requested_status: Some(TicketStatus::InProgress),
        ..reply(1, "reopening for QA")
    };
    let outcome = submit_reply(&mut conn, &admin(), &request, &notifier).expect("reply");
    assert_eq!(outcome.status, TicketStatus::InProgress);
}

#[test]
fn closing_via_reply_sets_closed_at_and_leaving_closed_keeps_it() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    let notifier = RecordingNotifier::default();

    let request = ReplyRequest { requested_status: Some(TicketStatus::Closed), ..reply(1, "closing") };
    submit_reply(&mut conn, &admin(), &request, &notifier).expect("close");
    let first_close = closed_at(&conn, 1).expect("closed_at set");

    let request = ReplyRequest { requested_status: Some(TicketStatus::Open), ..reply(1, "back again") };
    submit_reply(&mut conn, &admin(), &request, &notifier).expect("reopen by reply");
    let ticket = get_ticket(&conn, 1).expect("get").expect("exists");
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.closed_at, Some(first_close));
}

#[test]
fn reply_is_appended_after_existing_thread() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    insert_customer_message(&conn, 1, "help please", 1_000);
    insert_customer_message(&conn, 1, "any news?", 2_000);
    let notifier = RecordingNotifier::default();

    let outcome = submit_reply(&mut conn, &admin(), &reply(1, "  on it  "), &notifier).expect("reply");

    let messages = get_messages(&conn, 1).expect("messages");
    assert_eq!(messages.len(), 3);
    let last = messages.last().expect("last");
    assert_eq!(last.id, outcome.message_id);
    assert_eq!(last.message, "on it");
    assert_eq!(last.sender_type, SenderType::Admin);
    assert_eq!(last.sender_name, "Support Admin");
    assert_eq!(last.display_name(), "Support Team");
}

#[test]
fn duplicate_submissions_create_distinct_messages() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    let notifier = RecordingNotifier::default();

    let first = submit_reply(&mut conn, &admin(), &reply(1, "same text"), &notifier).expect("first");
    let second = submit_reply(&mut conn, &admin(), &reply(1, "same text"), &notifier).expect("second");

    assert_ne!(first.message_id, second.message_id);
    assert_eq!(get_messages(&conn, 1).expect("messages").len(), 2);
    assert_eq!(notifier.sent.borrow().len(), 2);
}

#[test]
fn blank_reply_is_rejected_without_side_effects() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    let notifier = RecordingNotifier::default();

    for text in ["", "   \n\t"] {
        let err = submit_reply(&mut conn, &admin(), &reply(1, text), &notifier).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
    assert_eq!(message_count(&conn), 0);
    assert!(notifier.sent.borrow().is_empty());
    let ticket = get_ticket(&conn, 1).expect("get").expect("exists");
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.updated_at, 1_000);
}

#[test]
fn reply_to_unknown_ticket_is_a_validation_error() {
    let mut conn = setup_db();
    let notifier = RecordingNotifier::default();
    let err = submit_reply(&mut conn, &admin(), &reply(99, "hello"), &notifier).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(message_count(&conn), 0);
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn notifier_failure_does_not_roll_back_reply() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));

    let outcome = submit_reply(&mut conn, &admin(), &reply(1, "answer"), &FailingNotifier).expect("reply");

    match outcome.notification {
        NotificationOutcome::Failed(reason) => assert!(reason.contains("connection refused")),
        other => panic!("unexpected notification outcome: {:?}", other),
    }
    assert_eq!(message_count(&conn), 1);
    let ticket = get_ticket(&conn, 1).expect("get").expect("exists");
    assert_eq!(ticket.status, TicketStatus::WaitingCustomer);
}

#[test]
fn reply_form_treats_blank_or_unknown_status_as_no_change() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    let notifier = RecordingNotifier::default();

    let outcome = submit_reply_form(
        &mut conn,
        &admin(),
        &ReplySubmission {
            ticket_id: 1,
            reply_message: "note".to_string(),
            is_internal: true,
            status: Some("bogus".to_string()),
        },
        &notifier,
    )
    .expect("reply");
    assert_eq!(outcome.status, TicketStatus::Open);

    let outcome = submit_reply_form(
        &mut conn,
        &admin(),
        &ReplySubmission {
            ticket_id: 1,
            reply_message: "done".to_string(),
            is_internal: false,
            status: Some("waiting_admin".to_string()),
        },
        &notifier,
    )
    .expect("reply");
    assert_eq!(outcome.status, TicketStatus::WaitingAdmin);
}

#[test]
fn non_admin_context_is_refused() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    let viewer = AdminContext { is_admin: false, ..admin() };
    let notifier = RecordingNotifier::default();

    assert!(matches!(
        submit_reply(&mut conn, &viewer, &reply(1, "hi"), &notifier),
        Err(CoreError::Unauthorized)
    ));
    assert!(matches!(
        apply_bulk_action(&mut conn, &viewer, &[1], BulkAction::Close),
        Err(CoreError::Unauthorized)
    ));
    assert!(matches!(ticket_detail(&conn, &viewer, 1), Err(CoreError::Unauthorized)));
    assert_eq!(message_count(&conn), 0);
}

#[test]
fn detail_returns_thread_or_not_found() {
    let conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(3));
    insert_customer_message(&conn, 3, "hello", 5);

    let detail = ticket_detail(&conn, &admin(), 3).expect("detail");
    assert_eq!(detail.ticket.id, 3);
    assert_eq!(detail.messages.len(), 1);
    assert_eq!(detail.messages[0].display_name(), "Casey Customer");

    assert!(matches!(ticket_detail(&conn, &admin(), 4), Err(CoreError::NotFound(4))));
}

#[test]
fn bulk_close_skips_missing_ids() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(5));
    insert_ticket(&conn, &TicketSeed::new(14));

    let affected = apply_bulk_action(&mut conn, &admin(), &[5, 9, 14], BulkAction::Close).expect("bulk");

    assert_eq!(affected, 2);
    for id in [5, 14] {
        let ticket = get_ticket(&conn, id).expect("get").expect("exists");
        assert_eq!(ticket.status, TicketStatus::Closed);
        assert!(ticket.closed_at.is_some());
        assert!(ticket.updated_at > 1_000);
    }
    assert!(get_ticket(&conn, 9).expect("get").is_none());
}

#[test]
fn bulk_reopen_clears_closed_at() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));
    apply_bulk_action(&mut conn, &admin(), &[1], BulkAction::Close).expect("close");
    assert!(closed_at(&conn, 1).is_some());

    apply_bulk_action(&mut conn, &admin(), &[1], BulkAction::Reopen).expect("reopen");
    let ticket = get_ticket(&conn, 1).expect("get").expect("exists");
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.closed_at, None);
}

#[test]
fn bulk_mark_resolved_leaves_closed_at_alone() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed { status: TicketStatus::Closed, updated_at: 50, ..TicketSeed::new(1) });
    insert_ticket(&conn, &TicketSeed::new(2));

    let affected = apply_bulk_action(&mut conn, &admin(), &[1, 2, 2], BulkAction::MarkResolved).expect("resolve");
    assert_eq!(affected, 2);
    assert_eq!(closed_at(&conn, 1), Some(50));
    assert_eq!(closed_at(&conn, 2), None);
    assert_eq!(get_ticket(&conn, 2).expect("get").expect("exists").status, TicketStatus::Resolved);
}

#[test]
fn bulk_form_validates_selection_and_action() {
    let mut conn = setup_db();
    insert_ticket(&conn, &TicketSeed::new(1));

    let err = submit_bulk_form(
        &mut conn,
        &admin(),
        &BulkSubmission { ticket_ids: vec![], action: "close".to_string() },
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = submit_bulk_form(
        &mut conn,
        &admin(),
        &BulkSubmission { ticket_ids: vec![1], action: "delete".to_string() },
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(get_ticket(&conn, 1).expect("get").expect("exists").status, TicketStatus::Open);

    let affected = submit_bulk_form(
        &mut conn,
        &admin(),
        &BulkSubmission { ticket_ids: vec![1], action: "close".to_string() },
    )
    .expect("close");
    assert_eq!(affected, 1);
}
