// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use database::DatabaseError;
use evreg_db_storage::admins::{Admin, NewAdmin};
use evreg_db_storage::events::{Event, EventId, NewEvent};
use pretty_assertions::assert_eq;
use test_util::database::{test_date, DatabaseContext};

#[test]
fn events_are_ordered_by_date() {
    let db_ctx = DatabaseContext::new();
    let mut conn = db_ctx.db.get_conn().unwrap();

    for (title, day) in [("Third", 20), ("First", 1), ("Second", 10)] {
        NewEvent {
            title: title.into(),
            description: None,
            date: test_date(12, day),
            capacity: None,
        }
        .insert(&mut conn)
        .unwrap();
    }

    let titles: Vec<_> = Event::get_all_ordered_by_date(&mut conn)
        .unwrap()
        .into_iter()
        .map(|event| event.title)
        .collect();

    assert_eq!(titles, ["First", "Second", "Third"]);
    assert_eq!(Event::count(&mut conn).unwrap(), 3);
}

#[test]
fn pending_counts_per_event() {
    let db_ctx = DatabaseContext::new();
    let busy = db_ctx.create_test_event("Busy", None).unwrap();
    let quiet = db_ctx.create_test_event("Quiet", None).unwrap();

    db_ctx
        .create_test_registration(busy.id, "A", "a@example.org")
        .unwrap();
    db_ctx
        .create_test_registration(busy.id, "B", "b@example.org")
        .unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();
    let counts: Vec<_> = Event::get_all_with_pending_count(&mut conn)
        .unwrap()
        .into_iter()
        .map(|(event, pending)| (event.id, pending))
        .collect();

    assert!(counts.contains(&(busy.id, 2)));
    assert!(counts.contains(&(quiet.id, 0)));
}

#[test]
fn unknown_event_is_not_found() {
    let db_ctx = DatabaseContext::new();
    let mut conn = db_ctx.db.get_conn().unwrap();

    let result = Event::get(&mut conn, EventId::from(4711));

    assert!(matches!(result, Err(DatabaseError::NotFound)));
}

#[test]
fn negative_capacity_is_rejected_by_the_schema() {
    let db_ctx = DatabaseContext::new();
    let mut conn = db_ctx.db.get_conn().unwrap();

    let result = NewEvent {
        title: "Broken".into(),
        description: None,
        date: test_date(1, 1),
        capacity: Some(-1),
    }
    .insert(&mut conn);

    assert!(result.is_err());
}

#[test]
fn admin_upsert_replaces_password() {
    let db_ctx = DatabaseContext::new();
    let mut conn = db_ctx.db.get_conn().unwrap();

    let created = NewAdmin {
        username: "admin".into(),
        password_hash: "first".into(),
    }
    .insert_if_missing(&mut conn)
    .unwrap();
    assert!(created);

    let created_again = NewAdmin {
        username: "admin".into(),
        password_hash: "ignored".into(),
    }
    .insert_if_missing(&mut conn)
    .unwrap();
    assert!(!created_again);

    let updated = NewAdmin {
        username: "admin".into(),
        password_hash: "second".into(),
    }
    .upsert(&mut conn)
    .unwrap();

    let stored = Admin::get_by_username(&mut conn, "admin").unwrap().unwrap();
    assert_eq!(stored.id, updated.id);
    assert_eq!(stored.password_hash, "second");
    assert!(Admin::get_by_username(&mut conn, "root").unwrap().is_none());
}
