//! AgencyEngine: the tick loop that decides, every cycle, whether to act.
//!
//! ```text
//!            ┌──────┐  tick   ┌────────────┐  gate says act  ┌────────┐
//!   ┌──────▶ │ Idle │ ──────▶ │ Evaluating │ ──────────────▶ │ Acting │
//!   │        └──────┘         └─────┬──────┘                 └───┬────┘
//!   │                               │ wait / cooldown            │
//!   └───────────────────────────────┴────────────────────────────┘
//! ```
//!
//! Per tick:
//! 1. inbound input is answered at once and restarts the cooldown;
//! 2. otherwise, once the cooldown has passed, candidates are simulated and
//!    the [`ActionGate`] decides on the best one;
//! 3. acting calls the [`Generator`] under a deadline. Only a complete
//!    response changes desires, memory and history.
//!
//! What an action achieved is measured on the live vector, before and after
//! it is applied: a desire already at 0 cannot be relieved further, however
//! much was predicted.

use std::sync::Arc;

use fakeman_compress::{ThoughtBudgetAllocator, ThoughtFragment};
use fakeman_core::{
    now_secs, text_certainty, CandidateMeans, Desire, DesireDelta, DesireState, ExperienceLog,
    MeansKind, MeansProposal, NewExperience, Outcome, SignalModel, SignalStrengths,
};
use fakeman_fantasy::WeightedFantasyGenerator;
use fakeman_memory::{AtomicEvent, EventCompactionLog, LongTermMemory, NewMemory, Summarizer};
use fakeman_scenario::{MemoryStability, ScenarioSimulator, ScenarioState, Selection};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::AgencyConfig;
use crate::error::AgencyError;
use crate::gate::{ActionGate, GateInput};
use crate::generator::Generator;
use crate::history::TriggerHistory;
use crate::mailbox::{
    ActionType, InboundMessage, Mailbox, OutboundMessage, RunStatus, StatusSnapshot,
};
use crate::prompt;
use crate::store::{AgentState, AgentStore};

/// Default means always available, so the candidate pool is never empty.
const REPERTOIRE: [(&str, MeansKind); 3] = [
    ("ask a question to learn more about the situation", MeansKind::AskQuestion),
    ("share what I think about the situation", MeansKind::MakeStatement),
    ("bring up something new on my own initiative", MeansKind::Proactive),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Evaluating,
    Acting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Inbound input was answered.
    Responded,
    /// An autonomous action was carried out.
    Acted,
    /// Decided not to act this tick.
    Waited,
    /// Decided to act but the generator failed or timed out.
    GeneratorFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub cycle:     u64,
    pub outcome:   TickOutcome,
    pub rationale: String,
    pub urgency:   f64,
    pub dominant:  Desire,
    /// Candidate chosen this tick, when evaluation got that far.
    pub chosen:    Option<CandidateMeans>,
}

pub struct AgencyEngine<M: Mailbox> {
    pub config:       AgencyConfig,
    desires:          DesireState,
    simulator:        ScenarioSimulator,
    fantasies:        WeightedFantasyGenerator,
    log:              EventCompactionLog,
    experiences:      ExperienceLog,
    long_term:        LongTermMemory,
    allocator:        ThoughtBudgetAllocator,
    signals:          SignalModel,
    history:          TriggerHistory,
    generator:        Arc<dyn Generator>,
    gate:             Box<dyn ActionGate>,
    mailbox:          M,
    store:            Option<AgentStore>,
    phase:            LoopPhase,
    cycle:            u64,
    last_action_time: Option<f64>,
    cooldown_from:    f64,
    context:          String,
    /// Whether this quiet spell has already been announced as idle.
    idle_posted:      bool,
}

impl<M: Mailbox> AgencyEngine<M> {
    /// Fresh in-memory agent.
    pub fn new(
        config: AgencyConfig,
        generator: Arc<dyn Generator>,
        gate: Box<dyn ActionGate>,
        mailbox: M,
    ) -> Self {
        let allocator = ThoughtBudgetAllocator::new(config.allocator.clone());
        Self {
            desires:          DesireState::new(config.desire.initial),
            simulator:        ScenarioSimulator::new(config.simulator.clone(), ScenarioState::default()),
            fantasies:        WeightedFantasyGenerator::new(config.fantasy.clone()),
            log:              EventCompactionLog::new(config.compaction.clone()).with_allocator(allocator.clone()),
            experiences:      ExperienceLog::new(config.desire.experience_capacity),
            long_term:        LongTermMemory::new(config.long_term_capacity, config.long_term_text_chars)
                .with_allocator(allocator.clone()),
            history:          TriggerHistory::new(config.success_window),
            signals:          SignalModel::new(config.desire.signal_strength),
            allocator,
            generator,
            gate,
            mailbox,
            store:            None,
            phase:            LoopPhase::Idle,
            cycle:            0,
            last_action_time: None,
            cooldown_from:    f64::NEG_INFINITY,
            context:          String::new(),
            idle_posted:      false,
            config,
        }
    }

    /// Agent backed by `store`, resuming whatever state it holds.
    pub fn restore(
        config: AgencyConfig,
        store: AgentStore,
        generator: Arc<dyn Generator>,
        gate: Box<dyn ActionGate>,
        mailbox: M,
    ) -> Result<Self, AgencyError> {
        let mut engine = Self::new(config, generator, gate, mailbox);

        if let Some(agent) = store.load_agent()? {
            engine.desires = DesireState::new(agent.desires);
            engine.cycle = agent.cycle;
            engine.last_action_time = agent.last_action_time;
            engine.cooldown_from = agent.cooldown_from;
            engine.context = agent.context;
            engine.history = agent.history;
            engine.history.resize(engine.config.success_window);
        }
        if let Some(scenario) = store.load_scenario()? {
            engine.simulator = ScenarioSimulator::new(engine.config.simulator.clone(), scenario);
        }
        engine.log = store
            .load_log(engine.config.compaction.clone())?
            .with_allocator(engine.allocator.clone());
        engine.experiences = store.load_experiences(engine.config.desire.experience_capacity)?;
        engine.long_term = store
            .load_long_term(engine.config.long_term_capacity, engine.config.long_term_text_chars)?
            .with_allocator(engine.allocator.clone());

        info!(
            dir = %store.dir().display(),
            cycle = engine.cycle,
            experiences = engine.experiences.len(),
            events = engine.log.total_events(),
            memories = engine.long_term.len(),
            "agent state restored"
        );
        engine.store = Some(store);
        Ok(engine)
    }

    /// Summarize merged log segments with `summarizer`, keeping the
    /// rule-based fallback for failures and timeouts.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        let log = std::mem::replace(&mut self.log, EventCompactionLog::new(self.config.compaction.clone()));
        self.log = log.with_summarizer(summarizer);
        self
    }

    pub fn desires(&self) -> &DesireState {
        &self.desires
    }

    pub fn log(&self) -> &EventCompactionLog {
        &self.log
    }

    pub fn experiences(&self) -> &ExperienceLog {
        &self.experiences
    }

    pub fn long_term(&self) -> &LongTermMemory {
        &self.long_term
    }

    pub fn scenario(&self) -> &ScenarioState {
        self.simulator.state()
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn last_action_time(&self) -> Option<f64> {
        self.last_action_time
    }

    /// Tick every `tick_interval` until `stop` turns true (or its sender
    /// goes away). A fatal error publishes `error` status and is returned.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<(), AgencyError> {
        self.publish(RunStatus::Initializing);
        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            cooldown_secs = self.config.cooldown_secs,
            "agency loop starting"
        );

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match self.tick_at(now_secs()).await {
                Ok(report) => debug!(
                    cycle = report.cycle,
                    outcome = ?report.outcome,
                    rationale = %report.rationale,
                    "tick"
                ),
                Err(e) if e.is_fatal() => {
                    error!(error = %e, cycle = self.cycle, "fatal error, stopping agency loop");
                    self.publish(RunStatus::Error);
                    self.persist();
                    return Err(e);
                }
                Err(e) => warn!(error = %e, cycle = self.cycle, "tick failed"),
            }
        }

        self.persist();
        self.publish(RunStatus::Stopped);
        info!(cycle = self.cycle, "agency loop stopped");
        Ok(())
    }

    /// Run one tick as of `now` (seconds).
    pub async fn tick_at(&mut self, now: f64) -> Result<TickReport, AgencyError> {
        self.cycle += 1;
        self.phase = LoopPhase::Evaluating;

        let report = match self.mailbox.take_inbound() {
            Some(msg) => self.respond(msg, now).await,
            None => self.deliberate(now).await,
        };

        self.phase = LoopPhase::Idle;
        self.publish(RunStatus::Running);
        report
    }

    // ── Tick paths ───────────────────────────────────────────────────────

    async fn respond(&mut self, msg: InboundMessage, now: f64) -> Result<TickReport, AgencyError> {
        self.cooldown_from = now;
        self.absorb(&msg, now);

        let (dominant, _) = self.desires.dominant();
        let urgency = self.desires.pressure(&self.config.desire.baseline);
        let selection = self.evaluate(now, false)?;
        let rationale = format!("responding to input: {}", selection.best.description);

        info!(cycle = self.cycle, chars = msg.text.len(), "inbound input received");
        self.act(now, ActionType::Response, selection.best, dominant, urgency, rationale, Some(&msg.text))
            .await
    }

    async fn deliberate(&mut self, now: f64) -> Result<TickReport, AgencyError> {
        let (dominant, level) = self.desires.dominant();
        let urgency = self.desires.pressure(&self.config.desire.baseline);

        let since = now - self.cooldown_from;
        if since < self.config.cooldown_secs {
            return Ok(self.waited(
                dominant,
                urgency,
                None,
                format!("cooldown not elapsed ({:.0}s of {:.0}s)", since.max(0.0), self.config.cooldown_secs),
            ));
        }

        let idle = self.simulator.idle_secs(now);
        let selection = self.evaluate(now, idle >= self.config.fantasy_idle_secs)?;
        let best = selection.best;
        let (success_rate, samples) = self.history.success_rate(dominant);

        let input = GateInput {
            dominant,
            dominant_level: level,
            urgency,
            expected_gain: best.total_delta(),
            description: best.description.clone(),
            success_rate,
            samples,
            idle_secs: idle,
        };
        let decision = self.gate.decide(&input).await;
        if !decision.act {
            self.post_idle(now, &best, &decision.rationale);
            return Ok(self.waited(dominant, urgency, Some(best), decision.rationale));
        }

        self.act(now, ActionType::Proactive, best, dominant, urgency, decision.rationale, None)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn act(
        &mut self,
        now: f64,
        action_type: ActionType,
        candidate: CandidateMeans,
        trigger: Desire,
        urgency: f64,
        rationale: String,
        input: Option<&str>,
    ) -> Result<TickReport, AgencyError> {
        self.phase = LoopPhase::Acting;
        let autonomous = action_type == ActionType::Proactive;

        let memory = self
            .log
            .recent(self.config.narrative_segments)
            .iter()
            .map(|s| s.summary.clone().unwrap_or_else(|| s.key_events.join("; ")))
            .collect::<Vec<_>>()
            .join("\n");
        let recalled = self.long_term.recall(trigger, self.config.long_term_recall);
        let prompt = prompt::action_prompt(
            &self.simulator.summary(),
            &memory,
            &recalled,
            &self.desires.current(),
            &candidate,
            input,
        );

        let timeout = self.config.generator_timeout;
        let text = match tokio::time::timeout(timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, cycle = self.cycle, "generator failed, waiting");
                return Ok(self.generator_failed(trigger, urgency, candidate, autonomous, e.to_string()));
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, cycle = self.cycle, "generator timed out, waiting");
                return Ok(self.generator_failed(trigger, urgency, candidate, autonomous, "generator timed out".into()));
            }
        };

        // Predicted relief first, then whatever the reply itself stirs up.
        let before = self.desires.current();
        self.desires.update(&Outcome::Satisfaction(candidate.predicted_delta));
        let reply = SignalStrengths::from_certainty(text_certainty(&text));
        let desires = self.desires.update(&Outcome::Stimulus(self.signals.thought_stimulus(&reply)));
        let realized = DesireDelta::between(&before, &desires);
        let gain = realized.total();
        let success = gain > 0.0;

        let thought = match &candidate.fantasy_condition {
            Some(cond) => format!("{cond}: {}", candidate.description),
            None => candidate.description.clone(),
        };
        self.log
            .append(AtomicEvent {
                timestamp: now,
                thought,
                context:   self.context.clone(),
                action:    self.allocator.truncate(&text, self.config.compaction.summary_char_cap),
                result:    Some(format!("gain {gain:.3} of {:.3} predicted", candidate.total_delta())),
                weight:    (candidate.predicted_delta.magnitude() / 2.0).clamp(0.0, 1.0),
                positive:  success,
            })
            .await?;

        self.experiences.record(NewExperience {
            timestamp:  now,
            context:    self.context.clone(),
            purpose:    format!("relieve {trigger}"),
            means:      candidate.description.clone(),
            kind:       candidate.kind,
            trigger,
            delta:      realized,
            success,
            autonomous,
        });
        if autonomous {
            self.history.record(trigger, success);
        }

        let fragments = self.thought_fragments(&candidate, &rationale, trigger);
        let situation = match self.context.as_str() {
            "" => self.simulator.state().situation.clone(),
            ctx => ctx.to_string(),
        };
        self.long_term.add(NewMemory {
            timestamp:       now,
            cycle:           self.cycle,
            situation,
            action_taken:    candidate.description.clone(),
            dominant_desire: trigger,
            gain,
            tags:            vec![action_type.as_str().to_string(), candidate.kind.as_str().to_string()],
            output_text:     self.allocator.truncate(&text, self.config.compaction.summary_char_cap),
            thoughts:        fragments.clone(),
        });

        self.last_action_time = Some(now);
        self.cooldown_from = now;
        self.idle_posted = false;

        let outbound = OutboundMessage {
            text,
            action_type,
            thought_summary: self.allocator.render(&fragments, self.config.thought_summary_budget, " | "),
            desires,
            timestamp: now,
        };
        if let Err(e) = self.mailbox.post_outbound(&outbound) {
            warn!(error = %e, "cannot post outbound message");
        }
        self.persist();

        info!(
            cycle = self.cycle,
            action = ?action_type,
            gain,
            predicted = candidate.total_delta(),
            fantasy = candidate.is_fantasy,
            "acted"
        );
        Ok(TickReport {
            cycle:     self.cycle,
            outcome:   if autonomous { TickOutcome::Acted } else { TickOutcome::Responded },
            rationale,
            urgency,
            dominant:  trigger,
            chosen:    Some(candidate),
        })
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// Fold an inbound message into the scenario and desires.
    fn absorb(&mut self, msg: &InboundMessage, now: f64) {
        self.context = msg.text.clone();
        self.simulator.update_from_context(&msg.text, true, now);

        let meta = &msg.metadata;
        if let Some(feedback) = meta.get("feedback").and_then(|v| v.as_object()) {
            let mut delta = DesireDelta::default();
            for (name, value) in feedback {
                match (Desire::parse(name), value.as_f64()) {
                    (Some(d), Some(v)) => delta.set(d, v),
                    _ => debug!(key = %name, "ignoring unknown feedback entry"),
                }
            }
            self.desires.update(&Outcome::Stimulus(delta));
        }
        let relief = self.signals.response_relief(&response_signals(msg));
        if relief != DesireDelta::default() {
            self.desires.update(&Outcome::Satisfaction(relief));
        }
        if let (Some(c), Some(i)) = (
            meta.get("certainty").and_then(|v| v.as_f64()),
            meta.get("importance").and_then(|v| v.as_f64()),
        ) {
            self.simulator.add_external_info(msg.text.clone(), c, i);
        }
        if let Some(speaker) = meta.get("speaker").and_then(|v| v.as_str()) {
            let image = meta.get("perceived_image").and_then(|v| v.as_str()).unwrap_or("unknown");
            let importance = meta.get("speaker_importance").and_then(|v| v.as_f64());
            self.simulator.update_interlocutor(speaker, image, importance);
        }
    }

    /// Build, simulate and select this tick's candidates.
    fn evaluate(&mut self, now: f64, with_fantasies: bool) -> Result<Selection, AgencyError> {
        let mut proposals: Vec<MeansProposal> = self
            .experiences
            .retrieve(&self.context, self.config.retrieval_k)
            .into_iter()
            .map(|e| e.to_proposal())
            .collect();
        proposals.extend(
            REPERTOIRE
                .iter()
                .map(|(description, kind)| MeansProposal::fresh(*description, *kind, now)),
        );

        if with_fantasies {
            let fantasies = self.fantasies.generate(
                self.experiences.entries(),
                now,
                self.config.fantasy_count,
                self.config.fantasy_min_magnitude,
            );
            let capability = self.fantasies.capability_fantasies(
                &self.desires.current(),
                &self.config.purpose,
                self.config.capability_fantasies,
                now,
            );
            debug!(summary = %self.fantasies.summary(&fantasies), "fantasizing while idle");
            proposals.extend(fantasies.iter().chain(capability.iter()).map(|f| f.to_proposal()));
        }

        let stability = MemoryStability {
            short_horizon_count:   self.experiences.len(),
            backup_present:        self.experiences.has_backup(),
            long_horizon_segments: self.log.segments().len(),
            positive_fraction:     self.log.positive_fraction(),
        };
        self.simulator
            .evaluate(&proposals, &self.desires.current(), &stability)
            .ok_or_else(|| AgencyError::Internal("empty candidate pool".into()))
    }

    fn thought_fragments(&self, candidate: &CandidateMeans, rationale: &str, trigger: Desire) -> Vec<ThoughtFragment> {
        let mut fragments = vec![
            ThoughtFragment::new(candidate.description.clone(), 0.9, "means").with_desire(candidate.target),
            ThoughtFragment::new(rationale, 0.5, "rationale"),
            ThoughtFragment::new(format!("{trigger} is pressing"), 0.4, "desire").with_desire(trigger),
        ];
        if let Some(cond) = &candidate.fantasy_condition {
            fragments.push(ThoughtFragment::new(cond.clone(), 0.6, "fantasy"));
        }
        fragments
    }

    /// Tell the peer once per quiet spell that the agent chose to stay idle.
    fn post_idle(&mut self, now: f64, best: &CandidateMeans, rationale: &str) {
        if self.idle_posted {
            return;
        }
        let fragments = [
            ThoughtFragment::new(rationale, 0.7, "rationale"),
            ThoughtFragment::new(format!("passed on: {}", best.description), 0.3, "means"),
        ];
        let outbound = OutboundMessage {
            text:            String::new(),
            action_type:     ActionType::Idle,
            thought_summary: self.allocator.render(&fragments, self.config.thought_summary_budget, " | "),
            desires:         self.desires.current(),
            timestamp:       now,
        };
        match self.mailbox.post_outbound(&outbound) {
            Ok(()) => self.idle_posted = true,
            Err(e) => warn!(error = %e, "cannot post idle message"),
        }
    }

    fn waited(
        &self,
        dominant: Desire,
        urgency: f64,
        chosen: Option<CandidateMeans>,
        rationale: String,
    ) -> TickReport {
        debug!(cycle = self.cycle, rationale = %rationale, "waiting");
        TickReport {
            cycle: self.cycle,
            outcome: TickOutcome::Waited,
            rationale,
            urgency,
            dominant,
            chosen,
        }
    }

    fn generator_failed(
        &mut self,
        trigger: Desire,
        urgency: f64,
        candidate: CandidateMeans,
        autonomous: bool,
        reason: String,
    ) -> TickReport {
        if autonomous {
            self.history.record(trigger, false);
        }
        TickReport {
            cycle:     self.cycle,
            outcome:   TickOutcome::GeneratorFailed,
            rationale: reason,
            urgency,
            dominant:  trigger,
            chosen:    Some(candidate),
        }
    }

    fn publish(&mut self, status: RunStatus) {
        let snapshot = StatusSnapshot {
            status,
            cycle:            self.cycle,
            desires:          self.desires.current(),
            context:          self.context.clone(),
            last_action_time: self.last_action_time.unwrap_or(0.0),
        };
        if let Err(e) = self.mailbox.publish_status(&snapshot) {
            warn!(error = %e, "cannot publish status");
        }
    }

    /// Write everything to the store, if any. Failures are logged.
    fn persist(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let agent = AgentState {
            desires:          self.desires.current(),
            cycle:            self.cycle,
            last_action_time: self.last_action_time,
            cooldown_from:    if self.cooldown_from.is_finite() { self.cooldown_from } else { 0.0 },
            context:          self.context.clone(),
            history:          self.history.clone(),
        };
        let results = [
            store.save_agent(&agent),
            store.save_scenario(self.simulator.state()),
            store.save_log(&self.log),
            store.save_experiences(&mut self.experiences),
            store.save_long_term(&self.long_term),
        ];
        for r in results {
            if let Err(e) = r {
                warn!(error = %e, "cannot persist agent state");
            }
        }
    }
}

/// Signals of an inbound message: a `signals` object, else the boolean
/// flags, else a certainty estimate of the text itself.
fn response_signals(msg: &InboundMessage) -> SignalStrengths {
    let meta = &msg.metadata;
    if let Some(s) = meta.get("signals").and_then(SignalStrengths::from_json) {
        return s;
    }
    let flag = |k: &str| meta.get(k).and_then(|v| v.as_bool());
    match (flag("is_threatening"), flag("shows_recognition"), flag("provides_information")) {
        (None, None, None) => SignalStrengths::from_certainty(text_certainty(&msg.text)),
        (t, r, i) => SignalStrengths::from_flags(
            t.unwrap_or(false),
            r.unwrap_or(false),
            i.unwrap_or(false),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use crate::gate::ThresholdGate;
    use crate::mailbox::{ChannelMailbox, ChannelPeer};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self { reply: Some(reply), calls: AtomicUsize::new(0) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: None, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(&self, _: &str) -> Result<String, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| GeneratorError::Failed("scripted failure".into()))
        }
    }

    fn engine(generator: Arc<dyn Generator>, min_gain: f64) -> (AgencyEngine<ChannelMailbox>, ChannelPeer) {
        let config = AgencyConfig { cooldown_secs: 30.0, ..AgencyConfig::default() };
        let (mailbox, peer) = ChannelMailbox::pair();
        let gate = Box::new(ThresholdGate::new(min_gain, config.success_rate_floor));
        (AgencyEngine::new(config, generator, gate, mailbox), peer)
    }

    #[tokio::test]
    async fn inbound_input_is_answered() {
        let (mut e, mut peer) = engine(Scripted::ok("hello back"), 0.05);
        peer.inbound.send(InboundMessage::new("hello", 100.0)).unwrap();

        let report = e.tick_at(100.0).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Responded);
        let out = peer.outbound.try_recv().unwrap();
        assert_eq!(out.text, "hello back");
        assert_eq!(out.action_type, ActionType::Response);
        assert!(!out.thought_summary.is_empty());
        assert_eq!(e.log().total_events(), 1);
        assert_eq!(e.experiences().len(), 1);
        assert_eq!(e.last_action_time(), Some(100.0));
        assert_eq!(e.phase(), LoopPhase::Idle);
    }

    #[tokio::test]
    async fn cooldown_blocks_autonomous_action() {
        let (mut e, mut peer) = engine(Scripted::ok("reply"), -10.0);
        peer.inbound.send(InboundMessage::new("hi", 0.0)).unwrap();
        e.tick_at(1_000.0).await.unwrap();
        let _ = peer.outbound.try_recv();

        let report = e.tick_at(1_010.0).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Waited);
        assert!(report.rationale.contains("cooldown"));
        assert!(peer.outbound.try_recv().is_err());

        let report = e.tick_at(1_031.0).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Acted);
        assert_eq!(peer.outbound.try_recv().unwrap().action_type, ActionType::Proactive);
    }

    #[tokio::test]
    async fn generator_failure_leaves_state_untouched() {
        let generator = Scripted::failing();
        let (mut e, mut peer) = engine(generator.clone(), -10.0);
        let before = e.desires().current();

        let report = e.tick_at(500.0).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::GeneratorFailed);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(e.desires().current(), before);
        assert_eq!(e.log().total_events(), 0);
        assert!(e.experiences().is_empty());
        assert!(peer.outbound.try_recv().is_err());
        assert_eq!(e.last_action_time(), None);

        // the loop carries on
        let report = e.tick_at(501.0).await.unwrap();
        assert_eq!(report.cycle, 2);
    }

    #[tokio::test]
    async fn gate_wait_records_rationale() {
        let (mut e, mut peer) = engine(Scripted::ok("unused"), 100.0);
        let report = e.tick_at(500.0).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Waited);
        assert!(report.rationale.contains("expected gain"));
        assert!(report.chosen.is_some());

        let idle = peer.outbound.try_recv().unwrap();
        assert_eq!(idle.action_type, ActionType::Idle);
        assert!(idle.text.is_empty());
        assert!(idle.thought_summary.contains("expected gain"));

        // announced once per quiet spell
        e.tick_at(501.0).await.unwrap();
        assert!(peer.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn idle_is_announced_again_after_an_action() {
        let (mut e, mut peer) = engine(Scripted::ok("hi"), 100.0);
        e.tick_at(100.0).await.unwrap();
        assert_eq!(peer.outbound.try_recv().unwrap().action_type, ActionType::Idle);

        peer.inbound.send(InboundMessage::new("hello", 0.0)).unwrap();
        e.tick_at(110.0).await.unwrap();
        assert_eq!(peer.outbound.try_recv().unwrap().action_type, ActionType::Response);

        // cooldown waits stay silent
        e.tick_at(120.0).await.unwrap();
        assert!(peer.outbound.try_recv().is_err());

        e.tick_at(141.0).await.unwrap();
        assert_eq!(peer.outbound.try_recv().unwrap().action_type, ActionType::Idle);
    }

    #[tokio::test]
    async fn realized_gain_never_exceeds_what_desires_held() {
        let mut config = AgencyConfig { cooldown_secs: 30.0, ..AgencyConfig::default() };
        config.desire.initial = fakeman_core::DesireVector::new(0.0, 0.0, 0.25, 0.0);
        let (mailbox, _peer) = ChannelMailbox::pair();
        let gate = Box::new(ThresholdGate::new(-10.0, -1.0));
        let mut e = AgencyEngine::new(config, Scripted::ok("ok"), gate, mailbox);

        for i in 0..8 {
            let report = e.tick_at(1_000.0 + 31.0 * f64::from(i)).await.unwrap();
            assert_eq!(report.outcome, TickOutcome::Acted, "tick {i}");
        }

        let entries: Vec<_> = e.experiences().entries().collect();
        assert_eq!(entries.len(), 8);
        assert!(entries[0].success);
        let relieved: f64 = entries.iter().map(|x| x.delta.total()).sum();
        assert!(relieved <= 0.25 + 1e-9, "relieved {relieved}");
        // once understanding is spent, acting on it stops counting as success
        assert!(entries.iter().skip(1).all(|x| x.delta.total() <= 1e-9 && !x.success));
        assert_eq!(e.long_term().len(), 8);
        assert_eq!(e.long_term().stats().positive, 1);
    }

    #[tokio::test]
    async fn default_gate_stops_acting_once_relief_runs_out() {
        let config = AgencyConfig::default();
        let generator: Arc<dyn Generator> = Arc::new(crate::generator::EchoGenerator);
        let gate = crate::gate::build_gate(&config, generator.clone());
        let (mailbox, _peer) = ChannelMailbox::pair();
        let mut e = AgencyEngine::new(config, generator, gate, mailbox);

        let mut reports = Vec::new();
        for i in 0..30 {
            reports.push(e.tick_at(1_000.0 + 31.0 * f64::from(i)).await.unwrap());
        }

        assert!(reports.iter().any(|r| r.outcome == TickOutcome::Acted));
        assert!(reports.iter().all(|r| r.outcome != TickOutcome::GeneratorFailed));
        for r in &reports[25..] {
            assert_eq!(r.outcome, TickOutcome::Waited, "cycle {}", r.cycle);
            assert!(!r.rationale.contains("cooldown"));
        }
        let acted = reports.iter().filter(|r| r.outcome == TickOutcome::Acted).count();
        assert_eq!(e.experiences().len(), acted);
    }

    #[tokio::test]
    async fn response_signals_relieve_desires() {
        let (mut e, _peer) = engine(Scripted::ok("ok"), 0.05);
        let before = e.desires().current();

        let mut msg = InboundMessage::new("well said", 0.0);
        msg.metadata.insert("signals".into(), serde_json::json!({ "recognition": 0.9, "uncertainty": 0.5 }));
        e.absorb(&msg, 1.0);
        let after = e.desires().current();
        assert!((before.understanding - after.understanding - 0.108).abs() < 1e-9);
        assert_eq!(after.information, before.information);

        let mut msg = InboundMessage::new("here is the schedule", 0.0);
        msg.metadata.insert("provides_information".into(), serde_json::json!(true));
        e.absorb(&msg, 2.0);
        assert!((after.information - e.desires().current().information - 0.08).abs() < 1e-9);

        // plain text of neutral certainty leaves desires alone
        let settled = e.desires().current();
        e.absorb(&InboundMessage::new("the sky is blue", 0.0), 3.0);
        assert_eq!(e.desires().current(), settled);
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        struct Slow;

        #[async_trait]
        impl Generator for Slow {
            async fn generate(&self, _: &str) -> Result<String, GeneratorError> {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok("late".into())
            }
        }

        let (mailbox, _peer) = ChannelMailbox::pair();
        let config = AgencyConfig {
            generator_timeout: std::time::Duration::from_millis(20),
            ..AgencyConfig::default()
        };
        let gate = Box::new(ThresholdGate::new(-10.0, 0.0));
        let mut e = AgencyEngine::new(config, Arc::new(Slow), gate, mailbox);
        let report = e.tick_at(500.0).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::GeneratorFailed);
        assert_eq!(report.rationale, "generator timed out");
    }

    #[tokio::test]
    async fn feedback_metadata_moves_desires() {
        let (mut e, peer) = engine(Scripted::ok("ok"), 0.05);
        let mut msg = InboundMessage::new("you were wrong about that", 0.0);
        msg.metadata.insert("feedback".into(), serde_json::json!({ "understanding": 0.5, "bogus": 1 }));
        msg.metadata.insert("speaker".into(), serde_json::json!("ana"));
        msg.metadata.insert("certainty".into(), serde_json::json!(0.4));
        msg.metadata.insert("importance".into(), serde_json::json!(0.8));
        let before = e.desires().current().understanding;
        e.absorb(&msg, 10.0);
        assert!(e.desires().current().understanding > before);
        assert!(e.scenario().interlocutors.contains_key("ana"));
        assert_eq!(e.scenario().external_info.len(), 1);
        assert_eq!(e.scenario().last_external_input, 10.0);
        drop(peer);
    }

    #[tokio::test]
    async fn status_published_every_tick() {
        let (mut e, peer) = engine(Scripted::ok("x"), 100.0);
        e.tick_at(1.0).await.unwrap();
        e.tick_at(2.0).await.unwrap();
        let status = peer.status.borrow().clone().unwrap();
        assert_eq!(status.status, RunStatus::Running);
        assert_eq!(status.cycle, 2);
    }
}
