// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use chrono::{Duration, Utc};
use database::DbConnection;
use evreg_db_storage::events::EventId;
use evreg_db_storage::registrations::{
    NewRegistration, Registration, RegistrationStatus, UpdateRegistration,
};
use pretty_assertions::assert_eq;
use test_util::database::DatabaseContext;

fn count(conn: &mut DbConnection, event_id: EventId, status: RegistrationStatus) -> i64 {
    Registration::count_for_event_with_status(conn, event_id, status).unwrap()
}

#[test]
fn duplicate_email_for_same_event_is_not_inserted() {
    let db_ctx = DatabaseContext::new();
    let event = db_ctx.create_test_event("Meetup", None).unwrap();
    let mut conn = db_ctx.db.get_conn().unwrap();

    let first = db_ctx
        .create_test_registration(event.id, "Alice", "alice@example.org")
        .unwrap();
    assert_eq!(first.status, RegistrationStatus::Pending);

    let second = NewRegistration {
        event_id: event.id,
        name: "Alice Again".into(),
        email: "alice@example.org".into(),
        phone: Some("123".into()),
        status: RegistrationStatus::Pending,
        created_at: Utc::now().naive_utc(),
    }
    .try_insert(&mut conn)
    .unwrap();

    assert!(second.is_none());
    assert!(Registration::exists_for_event(&mut conn, event.id, "alice@example.org").unwrap());
    assert!(!Registration::exists_for_event(&mut conn, event.id, "Alice@example.org").unwrap());
    assert_eq!(Registration::get_all_for_event(&mut conn, event.id).unwrap().len(), 1);
}

#[test]
fn same_email_may_register_for_different_events() {
    let db_ctx = DatabaseContext::new();
    let talk = db_ctx.create_test_event("Talk", Some(10)).unwrap();
    let hackathon = db_ctx.create_test_event("Hackathon", Some(10)).unwrap();

    db_ctx
        .create_test_registration(talk.id, "Bob", "bob@example.org")
        .unwrap();
    db_ctx
        .create_test_registration(hackathon.id, "Bob", "bob@example.org")
        .unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();
    let found = Registration::get_all_by_email_with_event(&mut conn, "bob@example.org").unwrap();

    // newest first, ties on the timestamp are broken by id
    let titles: Vec<_> = found.iter().map(|(_, event)| event.title.as_str()).collect();
    assert_eq!(titles, ["Hackathon", "Talk"]);

    let none = Registration::get_all_by_email_with_event(&mut conn, "nobody@example.org").unwrap();
    assert!(none.is_empty());
}

#[test]
fn lookup_orders_by_creation_time() {
    let db_ctx = DatabaseContext::new();
    let event = db_ctx.create_test_event("Talk", None).unwrap();
    let mut conn = db_ctx.db.get_conn().unwrap();

    let now = Utc::now().naive_utc();
    for (name, email, age) in [
        ("Old", "old@example.org", 60),
        ("New", "new@example.org", 0),
        ("Middle", "middle@example.org", 30),
    ] {
        NewRegistration {
            event_id: event.id,
            name: name.into(),
            email: email.into(),
            phone: None,
            status: RegistrationStatus::Pending,
            created_at: now - Duration::minutes(age),
        }
        .try_insert(&mut conn)
        .unwrap()
        .unwrap();
    }

    let names: Vec<_> = Registration::get_all_for_event(&mut conn, event.id)
        .unwrap()
        .into_iter()
        .map(|registration| registration.name)
        .collect();

    assert_eq!(names, ["New", "Middle", "Old"]);
}

#[test]
fn status_counts() {
    let db_ctx = DatabaseContext::new();
    let event = db_ctx.create_test_event("Talk", Some(2)).unwrap();
    let a = db_ctx
        .create_test_registration(event.id, "A", "a@example.org")
        .unwrap();
    let b = db_ctx
        .create_test_registration(event.id, "B", "b@example.org")
        .unwrap();
    db_ctx
        .create_test_registration(event.id, "C", "c@example.org")
        .unwrap();

    let mut conn = db_ctx.db.get_conn().unwrap();

    let approved = UpdateRegistration {
        status: RegistrationStatus::Approved,
    }
    .apply(&mut conn, a.id)
    .unwrap();
    assert_eq!(approved.status, RegistrationStatus::Approved);

    UpdateRegistration {
        status: RegistrationStatus::Rejected,
    }
    .apply(&mut conn, b.id)
    .unwrap();

    assert_eq!(count(&mut conn, event.id, RegistrationStatus::Approved), 1);
    assert_eq!(count(&mut conn, event.id, RegistrationStatus::Rejected), 1);
    assert_eq!(count(&mut conn, event.id, RegistrationStatus::Pending), 1);
    assert_eq!(
        Registration::count_with_status(&mut conn, RegistrationStatus::Pending).unwrap(),
        1
    );

    let stored = Registration::get(&mut conn, b.id).unwrap();
    assert_eq!(stored.status, RegistrationStatus::Rejected);
}
