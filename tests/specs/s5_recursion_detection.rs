//! S5 — recursion detection (spec.md §8): the same filesystem event
//! delivered twice inside the recursion window must launch exactly one
//! child; the second delivery is blocked by the subscription's own
//! `last_execution` stamp from the first.

use crate::support::{echo_leaf, Harness};
use ratio_core::{GlobalSettings, SubscriptionCommon};
use ratio_scheduler::Scheduler;
use ratio_store::{full_path_hash, SubscriptionStore};
use std::sync::Arc;

fn settings() -> GlobalSettings {
    GlobalSettings { enforce_recursion_detection: true, recursion_detection_threshold: 300, ..GlobalSettings::default() }
}

#[tokio::test]
async fn repeated_event_within_window_launches_only_once() {
    let harness = Harness::new().await;
    harness.put_tool("tools/echo.json", &echo_leaf()).await;

    let subscription_store = Arc::new(SubscriptionStore::new());
    let hash = full_path_hash("/watched", "in.txt");
    subscription_store.insert_filesystem(ratio_core::FilesystemSubscription {
        common: SubscriptionCommon {
            subscription_id: ratio_core::SubscriptionId::new(),
            tool_definition: "tools/echo.json".to_string(),
            process_owner: "alice".to_string(),
            expiration: None,
            single_use: false,
            last_execution: None,
            filter_conditions: None,
            execution_working_directory: "/work".to_string(),
        },
        full_path_hash: hash,
        file_path: "/watched/in.txt".to_string(),
        file_type: None,
        file_event_type: Some("created".to_string()),
    });

    let scheduler = Scheduler::new(subscription_store, harness.launcher.clone(), harness.storage.clone());
    let now = chrono::Utc::now();
    let settings = settings();

    let first = scheduler.handle_file_event("/watched/in.txt", "created", None, "alice", &settings, now).await;
    assert_eq!(first.launched.len(), 1);
    assert_eq!(first.recursion_blocked, 0);

    let second = scheduler
        .handle_file_event("/watched/in.txt", "created", None, "alice", &settings, now + chrono::Duration::seconds(60))
        .await;
    assert!(second.launched.is_empty());
    assert_eq!(second.recursion_blocked, 1);
}
