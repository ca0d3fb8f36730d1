//! Turn resolution for a two-combatant dice duel.
//!
//! A roll starts a resolution: the attacker's hits, the progress indicator and the
//! closing turn switch are queued on one [Scheduler] and applied as the virtual clock
//! advances. Every queued action carries the match generation it was created for and
//! is checked against the current generation and the `Over` latch before it touches
//! [MatchState].

use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::CardDefinition;
use crate::combat::events::CombatEvent;
use crate::combat::scheduler::{Scheduled, Scheduler};
use crate::config::{TimingConfig, MAX_PROGRESS_STEPS};

pub const MIN_ROLL: u8 = 1;
pub const MAX_ROLL: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Enemy => f.write_str("enemy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Resolving,
    Over,
}

/// One side's fighter for the current match. `current_hp` stays within `0..=max_hp`
/// and only the engine's hit step lowers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombatantState {
    pub id: u32,
    pub name: String,
    pub image: String,
    pub max_hp: u32,
    current_hp: u32,
    pub attack: u32,
    pub attacks_per_turn: u32,
}

impl CombatantState {
    pub fn from_definition(card: &CardDefinition) -> Self {
        Self {
            id: card.id,
            name: card.name.clone(),
            image: card.image.clone(),
            max_hp: card.health,
            current_hp: card.health,
            attack: card.attack,
            attacks_per_turn: card.attacks_per_turn.max(1),
        }
    }

    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    /// Clamped subtraction. Returns the remaining health.
    fn take_hit(&mut self, damage: u32) -> u32 {
        self.current_hp = self.current_hp.saturating_sub(damage);
        self.current_hp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchState {
    player: CombatantState,
    enemy: CombatantState,
    active_side: Side,
    phase: Phase,
    winner: Option<Side>,
}

impl MatchState {
    /// Fresh match: both combatants at full health, player to act.
    pub fn new(player: &CardDefinition, enemy: &CardDefinition) -> Self {
        Self {
            player: CombatantState::from_definition(player),
            enemy: CombatantState::from_definition(enemy),
            active_side: Side::Player,
            phase: Phase::Idle,
            winner: None,
        }
    }

    pub fn player(&self) -> &CombatantState {
        &self.player
    }

    pub fn enemy(&self) -> &CombatantState {
        &self.enemy
    }

    pub fn combatant(&self, side: Side) -> &CombatantState {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn combatant_mut(&mut self, side: Side) -> &mut CombatantState {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn active_side(&self) -> Side {
        self.active_side
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }
}

/// `floor(attack / roll)`. Low rolls hit harder: a 1 deals the full attack, a 6 a sixth.
pub fn damage_per_hit(attack: u32, roll: u8) -> u32 {
    attack / u32::from(roll.max(MIN_ROLL))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RollRejected {
    NoMatch,
    Resolving,
    MatchOver,
    CombatantDefeated,
    OutOfRange { roll: u8 },
}

impl fmt::Display for RollRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => f.write_str("no match in progress"),
            Self::Resolving => f.write_str("a resolution is already in flight"),
            Self::MatchOver => f.write_str("match is over"),
            Self::CombatantDefeated => f.write_str("a combatant is already defeated"),
            Self::OutOfRange { roll } => write!(f, "roll {roll} outside {MIN_ROLL}..={MAX_ROLL}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RollOutcome {
    Accepted {
        attacker: Side,
        roll: u8,
        damage: u32,
        hits: u32,
    },
    Rejected(RollRejected),
}

impl RollOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Transient per-turn damage readout, cleared when the resolution closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DamageDisplay {
    pub player: u32,
    pub enemy: u32,
}

impl DamageDisplay {
    fn set(&mut self, side: Side, damage: u32) {
        match side {
            Side::Player => self.player = damage,
            Side::Enemy => self.enemy = damage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Hit {
        attacker: Side,
        damage: u32,
        index: u32,
    },
    Progress {
        step: u64,
        steps: u64,
    },
    EndResolution,
}

#[derive(Debug, Clone)]
pub struct CombatEngine {
    state: MatchState,
    timing: TimingConfig,
    scheduler: Scheduler<Action>,
    generation: u64,
    events: Vec<CombatEvent>,
    last_roll: Option<u8>,
    progress_percent: f64,
    damage_display: DamageDisplay,
}

impl CombatEngine {
    pub fn new(state: MatchState, timing: TimingConfig) -> Self {
        info!(
            "match start: {} ({} hp) vs {} ({} hp)",
            state.player.name, state.player.max_hp, state.enemy.name, state.enemy.max_hp
        );
        Self {
            state,
            timing,
            scheduler: Scheduler::new(),
            generation: 0,
            events: Vec::new(),
            last_roll: None,
            progress_percent: 0.0,
            damage_display: DamageDisplay::default(),
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_roll(&self) -> Option<u8> {
        self.last_roll
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn damage_display(&self) -> DamageDisplay {
        self.damage_display
    }

    pub fn pending_actions(&self) -> usize {
        self.scheduler.len()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Why a roll would be declined right now, if it would be.
    pub fn check_roll(&self, roll: u8) -> Result<(), RollRejected> {
        match self.state.phase {
            Phase::Over => return Err(RollRejected::MatchOver),
            Phase::Resolving => return Err(RollRejected::Resolving),
            Phase::Idle => {}
        }
        if self.state.player.is_defeated() || self.state.enemy.is_defeated() {
            return Err(RollRejected::CombatantDefeated);
        }
        if !(MIN_ROLL..=MAX_ROLL).contains(&roll) {
            return Err(RollRejected::OutOfRange { roll });
        }
        Ok(())
    }

    /// Start a resolution for the active side. Declined rolls change nothing.
    pub fn roll(&mut self, roll: u8) -> RollOutcome {
        if let Err(reason) = self.check_roll(roll) {
            debug!("roll {roll} declined: {reason}");
            return RollOutcome::Rejected(reason);
        }

        let attacker = self.state.active_side;
        let attacker_state = self.state.combatant(attacker);
        let damage = damage_per_hit(attacker_state.attack, roll);
        let hits = attacker_state.attacks_per_turn.max(1);

        self.state.phase = Phase::Resolving;
        self.last_roll = Some(roll);
        self.progress_percent = 0.0;

        let generation = self.generation;
        let interval = self.timing.hit_interval_ms;
        for index in 0..hits {
            self.scheduler.schedule(
                u64::from(index).saturating_mul(interval),
                generation,
                Action::Hit {
                    attacker,
                    damage,
                    index,
                },
            );
        }

        let tick = self.timing.progress_tick_ms.max(1);
        let steps = (self.timing.progress_duration_ms / tick).clamp(1, MAX_PROGRESS_STEPS);
        for step in 1..=steps {
            self.scheduler.schedule(
                step.saturating_mul(tick),
                generation,
                Action::Progress { step, steps },
            );
        }

        // Hits past the resolution delay would otherwise land after the turn switch.
        let last_hit_at = u64::from(hits - 1).saturating_mul(interval);
        let end_at = self.timing.resolution_delay_ms.max(last_hit_at);
        self.scheduler
            .schedule(end_at, generation, Action::EndResolution);

        debug!("{attacker} rolled {roll}: {hits} x {damage}");
        self.events.push(CombatEvent::RollAccepted {
            at_ms: self.scheduler.now(),
            attacker,
            roll,
            damage,
            hits,
        });
        RollOutcome::Accepted {
            attacker,
            roll,
            damage,
            hits,
        }
    }

    /// Fire everything due up to `target_ms`, then move the clock there.
    pub fn advance_to(&mut self, target_ms: u64) {
        while let Some(entry) = self.scheduler.pop_due(target_ms) {
            self.dispatch(entry);
        }
        self.scheduler.advance_clock(target_ms);
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        let target = self.scheduler.now().saturating_add(elapsed_ms);
        self.advance_to(target);
    }

    /// Drain the queue completely, jumping the clock from one due time to the next.
    pub fn run_until_settled(&mut self) {
        while let Some(due) = self.scheduler.next_due() {
            self.advance_to(due);
        }
    }

    /// Invalidate every queued action of the current match.
    pub fn cancel_pending(&mut self) {
        self.generation += 1;
        let dropped = self.scheduler.retain_generation(self.generation);
        if dropped > 0 {
            debug!("generation {}: dropped {dropped} pending actions", self.generation);
        }
    }

    /// Replace the match. Pending actions of the old match are cancelled first, so none of
    /// them can reach the new state.
    pub fn reset(&mut self, state: MatchState) {
        self.cancel_pending();
        info!(
            "match reset: {} vs {} (generation {})",
            state.player.name, state.enemy.name, self.generation
        );
        self.state = state;
        self.last_roll = None;
        self.progress_percent = 0.0;
        self.damage_display = DamageDisplay::default();
    }

    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    fn dispatch(&mut self, entry: Scheduled<Action>) {
        if entry.generation != self.generation {
            debug!(
                "stale action from generation {} ignored (current {})",
                entry.generation, self.generation
            );
            return;
        }
        let at_ms = entry.fire_at;
        match entry.action {
            Action::Hit {
                attacker,
                damage,
                index,
            } => self.apply_hit(at_ms, attacker, damage, index),
            Action::Progress { step, steps } => {
                if self.state.phase != Phase::Over {
                    self.progress_percent = (step as f64 * 100.0 / steps as f64).min(100.0);
                }
            }
            Action::EndResolution => self.end_resolution(at_ms),
        }
    }

    fn apply_hit(&mut self, at_ms: u64, attacker: Side, damage: u32, hit_index: u32) {
        if self.state.phase == Phase::Over {
            debug!("hit {hit_index} from {attacker} skipped: match already over");
            return;
        }
        let recipient = attacker.opponent();
        let remaining_hp = self.state.combatant_mut(recipient).take_hit(damage);
        self.damage_display.set(recipient, damage);
        self.events.push(CombatEvent::HitApplied {
            at_ms,
            recipient,
            damage,
            remaining_hp,
            hit_index,
        });

        if remaining_hp == 0 && self.state.winner.is_none() {
            self.state.phase = Phase::Over;
            self.state.winner = Some(attacker);
            info!("match over at {at_ms} ms: {attacker} wins");
            self.events.push(CombatEvent::MatchOver {
                at_ms,
                winner: attacker,
            });
        }
    }

    fn end_resolution(&mut self, at_ms: u64) {
        if self.state.phase == Phase::Resolving {
            let next = self.state.active_side.opponent();
            self.state.active_side = next;
            self.state.phase = Phase::Idle;
            debug!("turn passes to {next}");
            self.events.push(CombatEvent::TurnSwitched { at_ms, active: next });
        }
        self.progress_percent = 0.0;
        self.damage_display = DamageDisplay::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BodyClass, WeaponType};

    fn card(id: u32, health: u32, attack: u32, attacks_per_turn: u32) -> CardDefinition {
        CardDefinition {
            id,
            name: format!("card-{id}"),
            image: format!("card_{id}.png"),
            health,
            attack,
            attacks_per_turn,
            body_class: BodyClass::Normal,
            weapon_type: WeaponType::Melee,
        }
    }

    fn engine(player: CardDefinition, enemy: CardDefinition) -> CombatEngine {
        CombatEngine::new(MatchState::new(&player, &enemy), TimingConfig::default())
    }

    #[test]
    fn stale_generation_action_is_inert() {
        let mut engine = engine(card(1, 1000, 500, 1), card(2, 1000, 500, 1));
        let stale = engine.generation();
        engine.cancel_pending();
        engine.scheduler.schedule(
            0,
            stale,
            Action::Hit {
                attacker: Side::Player,
                damage: 999,
                index: 0,
            },
        );
        engine.run_until_settled();
        assert_eq!(engine.state().enemy().current_hp(), 1000);
        assert!(engine.take_events().is_empty());
    }

    #[test]
    fn progress_reaches_full_then_resets_on_turn_switch() {
        let mut engine = engine(card(1, 1000, 60, 1), card(2, 1000, 60, 1));
        assert!(engine.roll(3).is_accepted());
        engine.advance(750);
        assert!((engine.progress_percent() - 50.0).abs() < 1e-9);
        engine.advance(749);
        assert!((engine.progress_percent() - 2900.0 / 30.0).abs() < 1e-9);
        assert_eq!(engine.state().phase(), Phase::Resolving);
        engine.advance(1);
        assert_eq!(engine.progress_percent(), 0.0);
        assert_eq!(engine.state().phase(), Phase::Idle);
    }

    #[test]
    fn damage_display_tracks_recipient_until_resolution_closes() {
        let mut engine = engine(card(1, 1000, 600, 1), card(2, 1000, 60, 1));
        engine.roll(2);
        engine.advance(0);
        assert_eq!(
            engine.damage_display(),
            DamageDisplay {
                player: 0,
                enemy: 300
            }
        );
        engine.run_until_settled();
        assert_eq!(engine.damage_display(), DamageDisplay::default());
    }

    #[test]
    fn oversized_timing_is_capped_instead_of_flooding_the_queue() {
        let timing = TimingConfig {
            hit_interval_ms: u64::MAX / 2,
            progress_tick_ms: 1,
            progress_duration_ms: 10_000_000_000,
            resolution_delay_ms: 1500,
        };
        let player = card(1, 1000, 100, 3);
        let enemy = card(2, 1000, 100, 1);
        let mut engine = CombatEngine::new(MatchState::new(&player, &enemy), timing);
        assert!(engine.roll(1).is_accepted());
        assert_eq!(engine.pending_actions(), 3 + MAX_PROGRESS_STEPS as usize + 1);
    }

    #[test]
    fn hits_beyond_resolution_delay_land_before_turn_switch() {
        let mut engine = engine(card(1, 100_000, 100, 10), card(2, 100_000, 100, 1));
        engine.roll(1);
        engine.run_until_settled();
        let events = engine.take_events();
        let hits = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::HitApplied { .. }))
            .count();
        assert_eq!(hits, 10);
        assert!(matches!(
            events.last(),
            Some(CombatEvent::TurnSwitched { at_ms: 1800, active: Side::Enemy })
        ));
    }
}
