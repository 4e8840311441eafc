use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tj_baas::{MemoryBaas, MessageEvent};
use tj_core::MessageRow;
use tj_inbox::{DEFAULT_LIMIT, Inbox};

fn message(id: &str, job: &str, from: &str, to: &str, minutes_ago: i64) -> MessageRow {
    MessageRow {
        id: id.into(),
        job_id: job.into(),
        from_user_id: from.into(),
        to_user_id: to.into(),
        body: format!("body of {id}"),
        created_at: Utc::now() - TimeDelta::minutes(minutes_ago),
        is_read: false,
    }
}

fn backend() -> Arc<MemoryBaas> {
    let baas = Arc::new(MemoryBaas::new());
    baas.put_profile(json!({ "id": "req", "name": "Rita" }));
    baas.put_profile(json!({ "id": "wrk", "name": "Walt" }));
    baas.add_job("job-a", "Fix fence", "req", Some("wrk"));
    baas.add_job("job-b", "Move couch", "req", Some("wrk"));
    baas.add_job("job-other", "Unrelated", "someone", None);
    baas
}

#[tokio::test]
async fn load_groups_per_job_newest_first() {
    let baas = backend();
    baas.push_message(message("m1", "job-a", "wrk", "req", 30));
    baas.push_message(message("m2", "job-b", "wrk", "req", 10));
    baas.push_message(message("m3", "job-a", "wrk", "req", 5));
    baas.push_message(message("m4", "job-a", "req", "wrk", 1));
    baas.push_message(message("m5", "job-other", "x", "req", 1));

    let mut inbox = Inbox::new(baas.clone(), "req", DEFAULT_LIMIT);
    let entries = inbox.load().await.unwrap();

    let summary: Vec<(&str, &str, usize)> = entries
        .iter()
        .map(|n| (n.job_id.as_str(), n.message_id.as_str(), n.unread))
        .collect();
    assert_eq!(summary, vec![("job-a", "m3", 2), ("job-b", "m2", 1)]);
    assert_eq!(entries[0].sender_name, "Walt");
    assert_eq!(entries[0].job_title, "Fix fence");
    assert_eq!(inbox.unread_count(), 3);
}

#[tokio::test]
async fn user_without_jobs_has_empty_inbox() {
    let baas = backend();
    let mut inbox = Inbox::new(baas.clone(), "stranger", DEFAULT_LIMIT);
    assert!(inbox.load().await.unwrap().is_empty());
    assert_eq!(baas.calls("unread_messages"), 0);
}

#[tokio::test]
async fn feed_inserts_update_and_prepend() {
    let baas = backend();
    baas.push_message(message("m1", "job-a", "wrk", "req", 30));
    let mut inbox = Inbox::new(baas.clone(), "req", DEFAULT_LIMIT);
    inbox.load().await.unwrap();
    let mut feed = inbox.watch();
    assert_eq!(baas.subscriber_count(), 1);

    baas.push_message(message("m2", "job-b", "wrk", "req", 0));
    assert_eq!(inbox.follow(&mut feed).await, Some(true));
    assert_eq!(inbox.entries()[0].job_id, "job-b");
    assert_eq!(inbox.entries()[0].job_title, "Move couch");

    baas.push_message(message("m3", "job-a", "wrk", "req", 0));
    assert_eq!(inbox.follow(&mut feed).await, Some(true));
    assert_eq!(inbox.entries()[0].job_id, "job-a");
    assert_eq!(inbox.entries()[0].unread, 2);
    assert_eq!(inbox.entries()[0].body, "body of m3");
    assert_eq!(inbox.unread_count(), 3);

    drop(feed);
    assert_eq!(baas.subscriber_count(), 0);
}

#[tokio::test]
async fn own_and_foreign_messages_are_ignored() {
    let baas = backend();
    let mut inbox = Inbox::new(baas, "req", DEFAULT_LIMIT);

    let own = MessageEvent::Insert(message("m1", "job-a", "req", "req", 0));
    let foreign = MessageEvent::Insert(message("m2", "job-a", "wrk", "someone", 0));

    assert!(!inbox.apply(&own).await);
    assert!(!inbox.apply(&foreign).await);
    assert!(inbox.entries().is_empty());
}

#[tokio::test]
async fn unknown_sender_and_job_use_defaults() {
    let baas = backend();
    let mut inbox = Inbox::new(baas, "req", DEFAULT_LIMIT);

    let event = MessageEvent::Insert(message("m1", "job-gone", "ghost", "req", 0));
    assert!(inbox.apply(&event).await);

    assert_eq!(inbox.entries()[0].sender_name, "Unknown");
    assert_eq!(inbox.entries()[0].job_title, "Job");
}

#[tokio::test]
async fn insert_keeps_at_most_limit_entries() {
    let baas = backend();
    let mut inbox = Inbox::new(baas, "req", 2);

    for (i, job) in ["j1", "j2", "j3"].iter().enumerate() {
        let event = MessageEvent::Insert(message(&format!("m{i}"), job, "wrk", "req", 0));
        inbox.apply(&event).await;
    }

    let jobs: Vec<&str> = inbox.entries().iter().map(|n| n.job_id.as_str()).collect();
    assert_eq!(jobs, vec!["j3", "j2"]);
}

#[tokio::test]
async fn mark_read_drops_entry_and_updates_rows() {
    let baas = backend();
    baas.push_message(message("m1", "job-a", "wrk", "req", 3));
    baas.push_message(message("m2", "job-b", "wrk", "req", 2));
    let mut inbox = Inbox::new(baas.clone(), "req", DEFAULT_LIMIT);
    inbox.load().await.unwrap();

    inbox.mark_read("job-a").await.unwrap();

    assert_eq!(inbox.entries().len(), 1);
    assert!(
        baas.messages()
            .iter()
            .find(|m| m.id == "m1")
            .is_some_and(|m| m.is_read)
    );
    inbox.load().await.unwrap();
    assert_eq!(inbox.entries().len(), 1);
}

#[tokio::test]
async fn read_updates_from_the_feed_decrement() {
    let baas = backend();
    baas.push_message(message("m1", "job-a", "wrk", "req", 3));
    let mut inbox = Inbox::new(baas.clone(), "req", DEFAULT_LIMIT);
    inbox.load().await.unwrap();

    let mut read = message("m1", "job-a", "wrk", "req", 3);
    read.is_read = true;
    assert!(inbox.apply(&MessageEvent::Update(read)).await);
    assert!(inbox.entries().is_empty());
}

#[tokio::test]
async fn load_failure_is_reported() {
    let baas = backend();
    baas.set_unavailable(true);
    let mut inbox = Inbox::new(baas, "req", DEFAULT_LIMIT);
    assert!(inbox.load().await.is_err());
}
