//! One duel session: catalog + selection + engine + damage overlay + dice. This is the
//! object a presentation layer drives. It forwards intents and reads views; every
//! combat rule lives in [crate::combat].

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::catalog::CardCatalog;
use crate::combat::{
    CombatEngine, CombatEvent, DamageDisplay, MatchState, RollOutcome, RollRejected, Rng,
    MAX_ROLL, MIN_ROLL,
};
use crate::config::TimingConfig;
use crate::overlay::{DamageInstance, DamageOverlay, PresentationPolicy, ShakeProfile};
use crate::selection::{resolve_deep_link, DeepLink, SelectionFlow, SelectionStep};

#[derive(Debug, Clone)]
pub struct Game {
    catalog: Arc<CardCatalog>,
    timing: TimingConfig,
    selection: SelectionFlow,
    engine: Option<CombatEngine>,
    overlay: DamageOverlay,
    rng: Rng,
    roll_override: Option<u8>,
    events: Vec<CombatEvent>,
}

impl Game {
    pub fn new(catalog: Arc<CardCatalog>, timing: TimingConfig, rng: Rng) -> Self {
        Self {
            catalog,
            timing,
            selection: SelectionFlow::new(),
            engine: None,
            overlay: DamageOverlay::default(),
            rng,
            roll_override: None,
            events: Vec::new(),
        }
    }

    /// Start from external `p1`/`p2` parameters: straight into a match when both resolve,
    /// otherwise into selection with whatever resolved pre-selected.
    pub fn from_deep_link(
        catalog: Arc<CardCatalog>,
        timing: TimingConfig,
        rng: Rng,
        p1: Option<&str>,
        p2: Option<&str>,
    ) -> Self {
        let mut game = Self::new(catalog, timing, rng);
        match resolve_deep_link(&game.catalog, p1, p2) {
            DeepLink::Bypass { flow, state } => {
                game.selection = flow;
                game.start_match(state);
            }
            DeepLink::Manual(flow) => game.selection = flow,
        }
        game
    }

    pub fn with_policy(mut self, policy: PresentationPolicy) -> Self {
        self.overlay.set_policy(policy);
        self
    }

    pub fn selection(&self) -> &SelectionFlow {
        &self.selection
    }

    /// The running match's engine. `None` while selection is in progress, even if the
    /// engine of a previous match is still around.
    pub fn engine(&self) -> Option<&CombatEngine> {
        self.engine
            .as_ref()
            .filter(|_| self.selection.step() == SelectionStep::Done)
    }

    pub fn match_state(&self) -> Option<&MatchState> {
        self.engine().map(CombatEngine::state)
    }

    pub fn overlay(&self) -> &DamageOverlay {
        &self.overlay
    }

    pub fn now_ms(&self) -> u64 {
        self.engine.as_ref().map_or(0, CombatEngine::now_ms)
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.engine.as_ref().and_then(CombatEngine::next_due_ms)
    }

    pub fn select(&mut self, card_id: u32) {
        self.selection.select(card_id);
    }

    /// Returns true when the confirm advanced the selection.
    pub fn confirm(&mut self) -> bool {
        let before = self.selection.step();
        if let Some(state) = self.selection.confirm(&self.catalog) {
            self.start_match(state);
        }
        self.selection.step() != before
    }

    pub fn back(&mut self) -> bool {
        self.selection.back()
    }

    /// Fix the die for upcoming rolls (`Some`) or go back to random rolls (`None`).
    /// Out-of-range values are refused.
    pub fn set_roll_override(&mut self, roll: Option<u8>) -> bool {
        if let Some(value) = roll {
            if !(MIN_ROLL..=MAX_ROLL).contains(&value) {
                debug!("roll override {value} refused");
                return false;
            }
        }
        self.roll_override = roll;
        true
    }

    pub fn roll_override(&self) -> Option<u8> {
        self.roll_override
    }

    /// Roll for the active side: the override if one is set, otherwise the die.
    pub fn roll(&mut self) -> RollOutcome {
        if self.selection.step() != SelectionStep::Done {
            return RollOutcome::Rejected(RollRejected::NoMatch);
        }
        let Some(engine) = self.engine.as_mut() else {
            return RollOutcome::Rejected(RollRejected::NoMatch);
        };
        let value = self.roll_override.unwrap_or_else(|| self.rng.roll_die());
        let outcome = engine.roll(value);
        self.collect_events();
        outcome
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.advance(elapsed_ms);
        }
        self.collect_events();
    }

    pub fn advance_to(&mut self, target_ms: u64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.advance_to(target_ms);
        }
        self.collect_events();
    }

    pub fn run_until_settled(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.run_until_settled();
        }
        self.collect_events();
    }

    /// Back to `pick-p1`. Pending actions of the finished match are cancelled before any
    /// new match can be seeded.
    pub fn play_again(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel_pending();
        }
        self.selection.reset();
        self.overlay.clear();
        self.events.clear();
        info!("play again: back to selection");
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn view(&self) -> GameView {
        let engine = self.engine();
        GameView {
            now_ms: self.now_ms(),
            selection: self.selection.clone(),
            match_state: engine.map(|engine| MatchView {
                state: engine.state().clone(),
                progress_percent: engine.progress_percent(),
                damage: engine.damage_display(),
                last_roll: engine.last_roll(),
                shake: engine.last_roll().map(|roll| self.overlay.shake_for(roll)),
            }),
            damage_numbers: self.overlay.active().to_vec(),
            roll_override: self.roll_override,
        }
    }

    fn start_match(&mut self, state: MatchState) {
        self.overlay.clear();
        match self.engine.as_mut() {
            Some(engine) => engine.reset(state),
            None => self.engine = Some(CombatEngine::new(state, self.timing)),
        }
    }

    /// Pull new engine events, mirror each applied hit into the overlay, and expire
    /// damage numbers that have faded by now.
    fn collect_events(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let fresh = engine.take_events();
        for event in &fresh {
            if let CombatEvent::HitApplied {
                at_ms,
                recipient,
                damage,
                ..
            } = *event
            {
                let attack = engine.state().combatant(recipient.opponent()).attack;
                self.overlay.record_hit(recipient, damage, attack, at_ms);
            }
        }
        self.overlay.expire(engine.now_ms());
        self.events.extend(fresh);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub state: MatchState,
    pub progress_percent: f64,
    pub damage: DamageDisplay,
    pub last_roll: Option<u8>,
    pub shake: Option<ShakeProfile>,
}

/// Serializable snapshot for a presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub now_ms: u64,
    pub selection: SelectionFlow,
    pub match_state: Option<MatchView>,
    pub damage_numbers: Vec<DamageInstance>,
    pub roll_override: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Phase, Side};

    fn game() -> Game {
        Game::new(
            Arc::new(CardCatalog::builtin()),
            TimingConfig::default(),
            Rng::new(7),
        )
    }

    #[test]
    fn roll_before_match_is_rejected() {
        let mut game = game();
        assert_eq!(game.roll(), RollOutcome::Rejected(RollRejected::NoMatch));
    }

    #[test]
    fn override_replaces_the_die() {
        let mut game = Game::from_deep_link(
            Arc::new(CardCatalog::builtin()),
            TimingConfig::default(),
            Rng::new(1),
            Some("fang"),
            Some("pearl"),
        );
        assert!(!game.set_roll_override(Some(7)));
        assert!(game.set_roll_override(Some(4)));
        match game.roll() {
            RollOutcome::Accepted { roll, damage, .. } => {
                assert_eq!(roll, 4);
                assert_eq!(damage, 340);
            }
            other => panic!("expected accepted roll, got {other:?}"),
        }
    }

    #[test]
    fn hits_become_damage_numbers() {
        let mut game = Game::from_deep_link(
            Arc::new(CardCatalog::builtin()),
            TimingConfig::default(),
            Rng::new(1),
            Some("larry_lawrie"),
            Some("draco"),
        );
        game.set_roll_override(Some(1));
        game.roll();
        game.advance(200);
        let numbers = game.overlay().active();
        assert_eq!(numbers.len(), 2);
        assert_eq!(numbers[0].stagger_ms, 0);
        assert_eq!(numbers[1].stagger_ms, 120);
        assert!(numbers.iter().all(|n| n.recipient == Side::Enemy && n.value == 700));
    }

    #[test]
    fn play_again_returns_to_selection_and_new_match_is_untouched_by_old_timers() {
        let mut game = Game::from_deep_link(
            Arc::new(CardCatalog::builtin()),
            TimingConfig::default(),
            Rng::new(1),
            Some("fang"),
            Some("pearl"),
        );
        game.set_roll_override(Some(1));
        game.roll();
        game.play_again();
        assert_eq!(game.selection().step(), SelectionStep::PickP1);
        assert!(game.view().match_state.is_none());
        assert_eq!(game.roll(), RollOutcome::Rejected(RollRejected::NoMatch));

        game.select(94);
        assert!(game.confirm());
        game.select(29);
        assert!(game.confirm());
        game.advance(5_000);

        let state = game.match_state().expect("match active");
        assert_eq!(state.enemy().current_hp(), state.enemy().max_hp);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.active_side(), Side::Player);
        assert!(game.drain_events().is_empty());
    }
}
