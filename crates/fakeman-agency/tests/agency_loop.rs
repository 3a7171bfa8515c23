//! End-to-end tests of the agency loop over the file mailbox and store.

use std::sync::Arc;
use std::time::Duration;

use fakeman_agency::{
    ActionType, AgencyConfig, AgencyEngine, AgentStore, EchoGenerator, FileMailbox, InboundMessage,
    RunStatus, ThresholdGate, TickOutcome, INBOUND_FILE, OUTBOUND_FILE,
};
use tokio::sync::watch;

fn config() -> AgencyConfig {
    AgencyConfig {
        tick_interval: Duration::from_millis(10),
        ..AgencyConfig::default()
    }
}

fn quiet_gate() -> Box<ThresholdGate> {
    Box::new(ThresholdGate::new(100.0, 0.3))
}

#[tokio::test]
async fn run_answers_input_and_stops_cleanly() {
    let comm = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let mailbox = FileMailbox::open(comm.path()).unwrap();
    let peer = mailbox.clone();
    let store = AgentStore::open(data.path()).unwrap();

    let mut engine =
        AgencyEngine::restore(config(), store, Arc::new(EchoGenerator), quiet_gate(), mailbox).unwrap();
    peer.send_inbound(&InboundMessage::new("hello there", 0.0)).unwrap();

    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        let result = engine.run(stop_rx).await;
        (engine, result)
    });

    let mut answered = None;
    for _ in 0..200 {
        if let Some(out) = peer.read_outbound() {
            answered = Some(out);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let out = answered.expect("no outbound message within 2s");
    assert_eq!(out.action_type, ActionType::Response);
    assert!(out.text.starts_with("(echo)"));

    stop_tx.send(true).unwrap();
    let (engine, result) = handle.await.unwrap();
    result.unwrap();

    assert_eq!(peer.read_status().unwrap().status, RunStatus::Stopped);
    assert_eq!(engine.experiences().len(), 1);
    assert!(data.path().join("agent.json").exists());
    assert!(data.path().join("event_log.json").exists());
    assert!(data.path().join("experiences.json.bak").exists());
    assert!(data.path().join("long_term.json").exists());
    assert_eq!(engine.long_term().len(), 1);
}

#[tokio::test]
async fn dropped_stop_sender_ends_the_loop() {
    let comm = tempfile::tempdir().unwrap();
    let mailbox = FileMailbox::open(comm.path()).unwrap();
    let peer = mailbox.clone();
    let mut engine = AgencyEngine::new(config(), Arc::new(EchoGenerator), quiet_gate(), mailbox);

    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { engine.run(stop_rx).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(stop_tx);

    tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap().unwrap();
    assert_eq!(peer.read_status().unwrap().status, RunStatus::Stopped);
}

#[tokio::test]
async fn malformed_input_is_skipped() {
    let comm = tempfile::tempdir().unwrap();
    let mailbox = FileMailbox::open(comm.path()).unwrap();
    std::fs::write(comm.path().join(INBOUND_FILE), b"not json").unwrap();
    let mut engine = AgencyEngine::new(config(), Arc::new(EchoGenerator), quiet_gate(), mailbox);

    let report = engine.tick_at(1_000.0).await.unwrap();
    assert_eq!(report.outcome, TickOutcome::Waited);
    assert!(!comm.path().join(INBOUND_FILE).exists());
    assert_eq!(engine.log().total_events(), 0);

    // nothing was said; the only outbound is the idle notice
    let out = FileMailbox::open(comm.path()).unwrap().read_outbound().unwrap();
    assert_eq!(out.action_type, ActionType::Idle);
    assert!(out.text.is_empty());
    assert!(comm.path().join(OUTBOUND_FILE).exists());
}

#[tokio::test]
async fn restore_resumes_from_store() {
    let comm = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();

    let desires_after = {
        let mailbox = FileMailbox::open(comm.path()).unwrap();
        mailbox.send_inbound(&InboundMessage::new("tell me about the weather", 5.0)).unwrap();
        let store = AgentStore::open(data.path()).unwrap();
        let mut engine =
            AgencyEngine::restore(config(), store, Arc::new(EchoGenerator), quiet_gate(), mailbox).unwrap();
        let report = engine.tick_at(100.0).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Responded);
        engine.desires().current()
    };

    let mailbox = FileMailbox::open(comm.path()).unwrap();
    let store = AgentStore::open(data.path()).unwrap();
    let engine =
        AgencyEngine::restore(config(), store, Arc::new(EchoGenerator), quiet_gate(), mailbox).unwrap();
    assert_eq!(engine.cycle(), 1);
    assert_eq!(engine.last_action_time(), Some(100.0));
    assert!(engine.desires().current().l1_distance(&desires_after) < 1e-9);
    assert_eq!(engine.experiences().len(), 1);
    assert_eq!(engine.log().total_events(), 1);
    assert_eq!(engine.scenario().situation, "tell me about the weather");
    let memory = &engine.long_term().memories()[0];
    assert_eq!(memory.situation, "tell me about the weather");
    assert!(memory.tags.contains(&"response".to_string()));
    assert_eq!(peer_status(comm.path()).last_action_time, 100.0);
}

fn peer_status(dir: &std::path::Path) -> fakeman_agency::StatusSnapshot {
    FileMailbox::open(dir).unwrap().read_status().unwrap()
}

#[tokio::test]
async fn autonomous_action_after_cooldown() {
    let comm = tempfile::tempdir().unwrap();
    let mailbox = FileMailbox::open(comm.path()).unwrap();
    let peer = mailbox.clone();
    let gate = Box::new(ThresholdGate::new(-1.0, 0.0));
    let mut engine = AgencyEngine::new(config(), Arc::new(EchoGenerator), gate, mailbox);

    let report = engine.tick_at(1_000.0).await.unwrap();
    assert_eq!(report.outcome, TickOutcome::Acted);
    assert_eq!(peer.read_outbound().unwrap().action_type, ActionType::Proactive);

    let report = engine.tick_at(1_001.0).await.unwrap();
    assert_eq!(report.outcome, TickOutcome::Waited);
    assert_eq!(engine.log().total_events(), 1);
}
