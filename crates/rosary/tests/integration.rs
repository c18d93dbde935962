//! End-to-end flow tests across config, store and engine
//!
//! A "reload" is modelled as a second engine opened over the same sqlite
//! database file.

use rosary_api::{Node, RevealStep, Screen, SessionStatus};
use rosary_config::{FlowTiming, parse_config};
use rosary_core::{CoreEvent, FlowEngine, Rejection, ResetReason};
use rosary_host_api::{AnimationDriver, MockHaptics, RecordingRenderer, Renderer};
use rosary_store::{KeyValueStore, SqliteStore};
use rosary_util::{DATABASE_FILENAME, EpochMs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const KEY: &str = "anglican_rosary_session_v1";
const T0: EpochMs = 1_700_000_000_000;

fn open(dir: &Path) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open(dir.join(DATABASE_FILENAME)).unwrap())
}

fn engine(store: Arc<SqliteStore>, timing: FlowTiming) -> FlowEngine {
    FlowEngine::new(timing, store, KEY, Arc::new(MockHaptics::new()))
}

#[test]
fn reload_resumes_mid_prayer() {
    let dir = tempdir().unwrap();

    {
        let mut first = engine(open(dir.path()), FlowTiming::default());
        first.hydrate(T0);
        first.start_round(T0);
        first.tick(T0 + 7_140);
        assert_eq!(first.session().node_index, Some(1));
        for i in 1..=3 {
            first.tap(T0 + 7_140 + i);
        }
    }

    let store = open(dir.path());
    let mut second = engine(store, FlowTiming::default());
    let events = second.hydrate(T0 + 60_000);

    assert!(matches!(
        events[0],
        CoreEvent::SessionResumed { node_index: 1, .. }
    ));
    assert_eq!(second.session().status, SessionStatus::InProgress);
    assert_eq!(
        second.session().node_progress[&1].step,
        RevealStep::Stanza { stanza_index: 3 }
    );
}

#[test]
fn persisted_blob_shape() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    let mut flow = engine(store.clone(), FlowTiming::default());
    flow.start_round(T0);

    let json = store.get(KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["status"], "in_progress");
    assert_eq!(value["nodeIndex"], 0);
    assert_eq!(value["startedAtEpochMs"], T0);
    assert_eq!(value["updatedAtEpochMs"], T0);
    assert!(value["activeRoundId"].is_string());
    assert!(value["nodeProgress"].as_object().unwrap().is_empty());
    assert_eq!(value["flowVersion"], "flow-4-38");
}

#[test]
fn full_round_by_taps_and_timers() {
    let timing = FlowTiming {
        load_duration: Duration::from_millis(10),
        dwell: Duration::from_millis(5),
        finale: Duration::ZERO,
        ..FlowTiming::default()
    };
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    let haptics = Arc::new(MockHaptics::new());
    let renderer = RecordingRenderer::new();
    let mut flow = FlowEngine::new(timing, store.clone(), KEY, haptics.clone());

    let mut now = T0;
    let mut entered = 0;
    let mut completed = false;
    let mut events = flow.start_round(now);

    for _ in 0..10_000 {
        entered += events
            .iter()
            .filter(|e| matches!(e, CoreEvent::NodeEntered { .. }))
            .count();
        if events
            .iter()
            .any(|e| matches!(e, CoreEvent::RoundCompleted { .. }))
        {
            completed = true;
            break;
        }

        let frame = flow.frame(now);
        renderer.render(&frame).unwrap();
        renderer.update(&flow.animation(now)).unwrap();

        events = match frame.screen {
            Screen::Prayer { view, .. }
                if view.capabilities.can_progress || view.capabilities.can_advance =>
            {
                flow.tap(now)
            }
            _ => {
                now = flow.next_deadline().unwrap();
                flow.tick(now)
            }
        };
    }

    assert!(completed);
    assert_eq!(entered, flow.timeline().len());

    let frames = renderer.frames();
    assert!(matches!(frames[0].screen, Screen::Load { .. }));
    assert!(frames.iter().all(|f| f.status == SessionStatus::InProgress));
    assert!(frames.iter().any(|f| matches!(
        &f.screen,
        Screen::Prayer { node, .. } if node.title == "Invocation 7 of 7"
    )));
    assert_eq!(renderer.animation_updates().len(), frames.len());
    assert_eq!(haptics.impacts(), 28);
    assert_eq!(flow.session().status, SessionStatus::Start);
    assert!(store.get(KEY).unwrap().is_none());
}

#[test]
fn expired_round_is_discarded_on_reload() {
    let dir = tempdir().unwrap();
    let timing = FlowTiming::default();
    let max_age = timing.max_age_ms();

    let mut first = engine(open(dir.path()), timing);
    first.start_round(T0);
    drop(first);

    let store = open(dir.path());
    let mut second = engine(store.clone(), timing);
    let events = second.hydrate(T0 + max_age + 1);

    assert_eq!(
        events,
        vec![CoreEvent::PersistedRejected {
            reason: Rejection::Expired
        }]
    );
    assert_eq!(second.session().wire_node_index(), -1);
    assert!(store.get(KEY).unwrap().is_none());
}

#[test]
fn malformed_blob_is_discarded() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    store.set(KEY, "definitely not json").unwrap();

    let mut flow = engine(store.clone(), FlowTiming::default());
    let events = flow.hydrate(T0);

    assert_eq!(
        events,
        vec![CoreEvent::PersistedRejected {
            reason: Rejection::Malformed
        }]
    );
    assert_eq!(flow.frame(T0).screen, Screen::Start);
    assert!(store.get(KEY).unwrap().is_none());
}

#[test]
fn expiry_watcher_resets_running_round() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    let mut flow = engine(store.clone(), FlowTiming::default());
    flow.hydrate(T0);
    flow.start_round(T0);
    flow.tick(T0 + 7_140);

    let max_age = flow.timing().max_age_ms();
    let events = flow.tick(T0 + max_age + 1);

    assert!(events.contains(&CoreEvent::SessionReset {
        reason: ResetReason::Expired
    }));
    assert_eq!(flow.session().status, SessionStatus::Start);
    assert!(store.get(KEY).unwrap().is_none());
}

#[test]
fn configured_load_duration_reaches_timeline() {
    let settings = parse_config(
        r#"
        config_version = 1

        [flow]
        load_duration_ms = 2000
        dwell_ms = 800
        "#,
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let mut flow = engine(open(dir.path()), settings.flow);
    assert_eq!(flow.timeline().get(0), Some(&Node::load(2_000)));

    flow.start_round(T0);
    flow.tick(T0 + 2_000);
    assert_eq!(flow.session().node_index, Some(1));
}
