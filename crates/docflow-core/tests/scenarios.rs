//! End-to-end scenarios: graph scheduling properties and whole actions run
//! through `App` against the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::rstest;

use docflow_core::app::{App, AppBuilder};
use docflow_core::config::DocflowConfig;
use docflow_core::domain::{
    ActionError, ActionParams, Criterion, DocumentId, ErrorKind, GraphError, TaskState, Version, WriteTarget,
};
use docflow_core::graph::TaskGraph;
use docflow_core::impls::{InMemoryDocumentStore, RecordingNotifier, ScriptedConfirm, StoreCall, StoredDocument};
use docflow_core::ports::{FixedClock, SystemClock, UlidGenerator};

const LIST: &str = "Wikipedia:Requests for deletion";
const ANCHOR: &str = "<!-- Add new entries to the TOP of the following list -->";
const DISCUSSION: &str = "Wikipedia:Requests for deletion/Requests/2024/Rust";

type Events = Arc<Mutex<Vec<String>>>;

fn record(events: &Events, event: String) {
    events.lock().unwrap().push(event);
}

fn position(events: &[String], event: &str) -> usize {
    events
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("{event} missing from {events:?}"))
}

/// Register a task that records its start and end around `delay_ms` of sleep.
fn timed(graph: &mut TaskGraph<String>, events: &Events, name: &'static str, deps: &[&str], delay_ms: u64) {
    let events = events.clone();
    graph
        .register(name, deps, move |inputs: Vec<String>| async move {
            record(&events, format!("start:{name}"));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            record(&events, format!("end:{name}"));
            Ok(if name == "A" { "id-7".to_string() } else { format!("{name}({})", inputs.join(",")) })
        })
        .unwrap();
}

// ---------------------------------------------------------------------------
// Graph properties
// ---------------------------------------------------------------------------

#[rstest]
#[case::b_slower(30, 10)]
#[case::c_slower(10, 30)]
#[case::same_latency(20, 20)]
#[tokio::test(start_paused = true)]
async fn dependents_see_the_identifier_produced_upstream(#[case] b_ms: u64, #[case] c_ms: u64) {
    let events = Events::default();
    let mut graph = TaskGraph::new();
    timed(&mut graph, &events, "A", &[], 15);
    timed(&mut graph, &events, "B", &["A"], b_ms);
    timed(&mut graph, &events, "C", &["A"], c_ms);

    let run = graph.execute().await.unwrap();

    assert_eq!(run.results["B"], "B(id-7)");
    assert_eq!(run.results["C"], "C(id-7)");
    assert_eq!(run.completed.len(), 3);
    assert!(run.states.values().all(|s| *s == TaskState::Succeeded));

    let events = events.lock().unwrap().clone();
    assert!(position(&events, "end:A") < position(&events, "start:B"));
    assert!(position(&events, "end:A") < position(&events, "start:C"));
    assert_eq!(events.len(), 6, "every task ran exactly once");
}

#[tokio::test(start_paused = true)]
async fn siblings_run_concurrently() {
    let events = Events::default();
    let mut graph = TaskGraph::new();
    timed(&mut graph, &events, "A", &[], 5);
    timed(&mut graph, &events, "B", &["A"], 50);
    timed(&mut graph, &events, "C", &["A"], 50);

    let started = tokio::time::Instant::now();
    graph.execute().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(55));
}

#[tokio::test(start_paused = true)]
async fn failure_upstream_never_invokes_dependents() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let mut graph: TaskGraph<String> = TaskGraph::new();

    graph
        .register("A", &[], |_| async { Err(ActionError::failed("no discussion page")) })
        .unwrap();
    for (name, deps) in [("B", vec!["A"]), ("C", vec!["A"]), ("D", vec!["B", "C"])] {
        let invoked = invoked.clone();
        graph
            .register(name, &deps, move |_| async move {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok(name.to_string())
            })
            .unwrap();
    }

    let err = graph.execute().await.unwrap_err();

    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    let GraphError::TaskFailed {
        task,
        source,
        completed,
        mut cancelled,
        states,
    } = err
    else {
        panic!("expected a task failure");
    };
    assert_eq!(task, "A");
    assert_eq!(source.kind(), ErrorKind::DependencyFailed);
    assert!(completed.is_empty());
    cancelled.sort();
    assert_eq!(cancelled, vec!["B", "C", "D"]);
    assert_eq!(states["A"], TaskState::Failed);
    assert_eq!(states["D"], TaskState::Cancelled);
}

// ---------------------------------------------------------------------------
// Whole actions
// ---------------------------------------------------------------------------

struct Harness {
    store: Arc<InMemoryDocumentStore>,
    confirm: Arc<ScriptedConfirm>,
    notifier: Arc<RecordingNotifier>,
    app: App,
}

fn harness(store: InMemoryDocumentStore, confirm: ScriptedConfirm, config: DocflowConfig) -> Harness {
    let store = Arc::new(store);
    let confirm = Arc::new(confirm);
    let notifier = Arc::new(RecordingNotifier::new());
    let app = AppBuilder::new(store.clone(), confirm.clone())
        .with_notifier(notifier.clone())
        .with_clock(Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())))
        .with_ids(Arc::new(UlidGenerator::new(SystemClock)))
        .with_config(config)
        .register_builtin()
        .unwrap()
        .expect_actions(&["rfd", "qd"])
        .build()
        .unwrap();
    Harness {
        store,
        confirm,
        notifier,
        app,
    }
}

fn wiki() -> InMemoryDocumentStore {
    InMemoryDocumentStore::new()
        .with_document("Rust", StoredDocument::new("Rust is a crab.").created_by("Crab"))
        .with_document(LIST, StoredDocument::new(format!("Intro\n{ANCHOR}\n{{{{Older}}}}")))
}

fn nomination() -> ActionParams {
    ActionParams::new("Rust", "Ferris").with_rationale("not notable")
}

#[tokio::test]
async fn discussion_nomination_touches_every_venue() {
    let h = harness(wiki(), ScriptedConfirm::always(true), DocflowConfig::default());

    let report = h.app.run("rfd", nomination()).await.unwrap();

    assert!(report.succeeded(), "{:?}", report.failure);
    assert_eq!(report.completed.len(), 6);
    assert_eq!(report.saves.len(), 3);
    assert!(h.confirm.prompts().is_empty());

    assert_eq!(
        h.store.text("Rust").await.as_deref(),
        Some("{{RfD|1=not notable}}\nRust is a crab.")
    );
    assert_eq!(
        h.store.text(DISCUSSION).await.as_deref(),
        Some("{{subst:RfD/Preload/Template|deletereason=not notable}}")
    );
    assert_eq!(
        h.store.text(LIST).await.as_deref(),
        Some(format!("Intro\n{ANCHOR}\n{{{{{DISCUSSION}}}}}\n{{{{Older}}}}").as_str())
    );
    assert_eq!(
        h.notifier.sent().await,
        vec![(DocumentId::new("User talk:Crab"), "{{subst:RFDNote|1=Rust|2=Rust}} ~~~~".to_string())]
    );
}

#[tokio::test]
async fn earlier_discussions_get_an_ordinal() {
    let store = wiki().with_document(DISCUSSION, StoredDocument::new("closed: keep"));
    let h = harness(store, ScriptedConfirm::always(true), DocflowConfig::default());

    let report = h.app.run("rfd", nomination()).await.unwrap();

    assert!(report.succeeded());
    let second = format!("{DISCUSSION} (2nd nomination)");
    assert!(h.store.text(second.as_str()).await.is_some());
    assert_eq!(h.store.text(DISCUSSION).await.as_deref(), Some("closed: keep"));
    assert_eq!(
        h.notifier.sent().await,
        vec![(
            DocumentId::new("User talk:Crab"),
            "{{subst:RFDNote|1=Rust|2=Rust|order=&#32; (2nd nomination)}} ~~~~".to_string()
        )]
    );
}

#[tokio::test]
async fn declining_an_existing_tag_abandons_the_nomination() {
    let store = wiki().with_document(
        "Rust",
        StoredDocument::new("{{RfD|1=earlier}}\nRust is a crab.").created_by("Crab"),
    );
    let h = harness(store, ScriptedConfirm::always(false), DocflowConfig::default());

    let report = h.app.run("rfd", nomination()).await.unwrap();

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.task, "tag-document");
    assert_eq!(failure.kind, ErrorKind::UserAborted);
    assert_eq!(h.confirm.prompts().len(), 1);
    assert!(h.store.saves().await.is_empty());
    assert!(report.saves.is_empty());
    assert!(h.notifier.sent().await.is_empty());
    assert_eq!(report.tasks["tag-document"], TaskState::Failed);
    for task in ["list-entry", "discussion-record", "notify-creator"] {
        assert_eq!(report.tasks[task], TaskState::Cancelled, "{task}");
    }
    assert_eq!(h.store.text(DISCUSSION).await, None);
}

#[tokio::test]
async fn missing_target_writes_nothing() {
    let store = InMemoryDocumentStore::new()
        .with_document(LIST, StoredDocument::new(format!("Intro\n{ANCHOR}\n{{{{Older}}}}")));
    let h = harness(store, ScriptedConfirm::always(true), DocflowConfig::default());

    let report = h.app.run("rfd", nomination()).await.unwrap();

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.task, "tag-document");
    assert_eq!(failure.kind, ErrorKind::NotFound);
    assert!(h.store.saves().await.is_empty());
    assert!(report.saves.is_empty());
    assert_eq!(
        h.store.text(LIST).await.as_deref(),
        Some(format!("Intro\n{ANCHOR}\n{{{{Older}}}}").as_str())
    );
}

#[tokio::test(start_paused = true)]
async fn other_venues_wait_for_a_slow_tag() {
    let h = harness(wiki(), ScriptedConfirm::always(true), DocflowConfig::default());
    h.store.set_latency("Rust", Duration::from_millis(200)).await;

    let started = tokio::time::Instant::now();
    let report = h.app.run("rfd", nomination()).await.unwrap();

    assert!(report.succeeded(), "{:?}", report.failure);
    // load and save of the target
    assert!(started.elapsed() >= Duration::from_millis(400));
    let saved: Vec<String> = h
        .store
        .saves()
        .await
        .into_iter()
        .map(|save| save.id.as_str().to_string())
        .collect();
    assert_eq!(saved.len(), 3);
    assert_eq!(saved[0], "Rust");
}

#[tokio::test]
async fn conflicting_edit_is_retried_against_the_new_version() {
    let h = harness(wiki(), ScriptedConfirm::always(true), DocflowConfig::default());
    h.store.set_version("Rust", Version(5)).await;
    h.store.interfere_after_load("Rust", "Rust is a crab. Edited.").await;

    let report = h.app.run("rfd", nomination()).await.unwrap();

    assert!(report.succeeded());
    let expected: Vec<Option<Version>> = h
        .store
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            StoreCall::Save { id, expected, .. } if id.as_str() == "Rust" => Some(expected),
            _ => None,
        })
        .collect();
    assert_eq!(expected, vec![Some(Version(5)), Some(Version(6))]);

    let tag = report.saves.iter().find(|s| s.requested.as_str() == "Rust").unwrap();
    assert_eq!(tag.retries, 1);
    assert_eq!(
        h.store.text("Rust").await.as_deref(),
        Some("{{RfD|1=not notable}}\nRust is a crab. Edited.")
    );
}

#[tokio::test]
async fn missing_list_anchor_fails_the_list_entry() {
    let store = wiki().with_document(LIST, StoredDocument::new("No anchor here"));
    let h = harness(store, ScriptedConfirm::always(true), DocflowConfig::default());

    let report = h.app.run("rfd", nomination()).await.unwrap();

    let failure = report.failure.unwrap();
    assert_eq!(failure.task, "list-entry");
    assert_eq!(failure.kind, ErrorKind::DependencyFailed);
    assert_eq!(h.store.text(LIST).await.as_deref(), Some("No anchor here"));
}

fn quick(codes: &[&str]) -> ActionParams {
    codes
        .iter()
        .fold(ActionParams::new("Rust", "Ferris"), |p, code| p.with_criterion(Criterion::new(*code)))
}

fn logging() -> DocflowConfig {
    let mut config = DocflowConfig::default();
    config.venues.quick_deletion_log = Some("User:Ferris/QD log".to_string());
    config
}

#[tokio::test]
async fn quick_deletion_tags_notifies_and_logs() {
    let h = harness(wiki(), ScriptedConfirm::always(true), logging());

    let report = h.app.run("qd", quick(&["a1"])).await.unwrap();

    assert!(report.succeeded(), "{:?}", report.failure);
    assert_eq!(
        h.store.text("Rust").await.as_deref(),
        Some("{{qd|a1|editor=Ferris|date=~~~~~}}\nRust is a crab.")
    );
    let log = h.store.text("User:Ferris/QD log").await.unwrap();
    assert!(log.starts_with("This is a log of all [[WP:QD|quick deletion]] nominations"));
    assert!(log.ends_with("# [[:Rust]]: [[WP:QD#A1|QD A1]] ({{tl|db-a1}}); notified {{user|1=Crab}} ~~~~~"));
    assert_eq!(
        h.notifier.sent().await,
        vec![(DocumentId::new("User talk:Crab"), "{{subst:QD-notice|page=Rust|cat=a1}} ~~~~".to_string())]
    );
}

#[tokio::test]
async fn declining_a_second_quick_deletion_tag_sends_nothing() {
    let store = wiki().with_document(
        "Rust",
        StoredDocument::new("{{db-g3}}\nRust is a crab.").created_by("Crab"),
    );
    let h = harness(store, ScriptedConfirm::always(false), logging());

    let report = h.app.run("qd", quick(&["a1"])).await.unwrap();

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.task, "tag-document");
    assert_eq!(failure.kind, ErrorKind::UserAborted);
    assert!(h.notifier.sent().await.is_empty());
    assert!(h.store.saves().await.is_empty());
    assert_eq!(report.tasks["notify-creator"], TaskState::Cancelled);
    assert_eq!(report.tasks["log-entry"], TaskState::Cancelled);
}

#[tokio::test]
async fn protected_page_gets_a_talk_page_request() {
    let store = InMemoryDocumentStore::new()
        .with_document("Rust", StoredDocument::new("Rust is a crab.").protected().created_by("Crab"));
    let h = harness(store, ScriptedConfirm::always(true), DocflowConfig::default());

    let report = h.app.run("qd", quick(&["g1"])).await.unwrap();

    assert!(report.succeeded(), "{:?}", report.failure);
    assert_eq!(h.store.saves_to("Rust").await, 0);

    let tag = report.saves.iter().find(|s| s.requested.as_str() == "Rust").unwrap();
    assert_eq!(tag.via, WriteTarget::Fallback);
    assert_eq!(tag.written().as_str(), "Talk:Rust");
    assert_eq!(
        h.store.text("Talk:Rust").await.as_deref(),
        Some(
            "== Rust nominated for QD, request deletion ==\n\
             {{qd|g1|editor=Ferris|date=~~~~~}}\n\nI was unable to tag Rust so please delete it. ~~~~"
        )
    );
    assert_eq!(report.tasks["log-entry"], TaskState::Succeeded);
}

#[tokio::test]
async fn protected_discussion_page_has_nowhere_to_go() {
    let store = InMemoryDocumentStore::new().with_document("Talk:Rust", StoredDocument::new("Chat").protected());
    let h = harness(store, ScriptedConfirm::always(true), DocflowConfig::default());
    let params = ActionParams::new("Talk:Rust", "Ferris").with_criterion(Criterion::new("g1"));

    let report = h.app.run("qd", params).await.unwrap();

    let failure = report.failure.unwrap();
    assert_eq!(failure.task, "tag-document");
    assert_eq!(failure.kind, ErrorKind::NoEditableTarget);
    assert!(h.store.saves().await.is_empty());
}

#[tokio::test]
async fn existing_quick_deletion_tag_asks_once_and_keeps_it() {
    let store = InMemoryDocumentStore::new()
        .with_document("Rust", StoredDocument::new("{{db-g3}}\nRust is a crab.").created_by("Ferris"));
    let h = harness(store, ScriptedConfirm::always(true), DocflowConfig::default());

    let report = h.app.run("qd", quick(&["g1", "a1"])).await.unwrap();

    assert!(report.succeeded(), "{:?}", report.failure);
    assert_eq!(h.confirm.prompts().len(), 1);
    assert_eq!(
        h.store.text("Rust").await.as_deref(),
        Some("{{QD-multiple|G1|A1}}\n{{db-g3}}\nRust is a crab.")
    );
    // the nominator created the page, so nobody is notified
    assert!(h.notifier.sent().await.is_empty());
    assert_eq!(report.tasks["notify-creator"], TaskState::Succeeded);
}
