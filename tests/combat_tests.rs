use diceduel::catalog::{BodyClass, CardCatalog, CardDefinition, WeaponType};
use diceduel::combat::{
    damage_per_hit, CombatEngine, CombatEvent, MatchState, Phase, Rng, RollOutcome, RollRejected,
    Side,
};
use diceduel::config::TimingConfig;

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

fn engine(player: &CardDefinition, enemy: &CardDefinition) -> CombatEngine {
    CombatEngine::new(MatchState::new(player, enemy), TimingConfig::default())
}

fn count_match_over(events: &[CombatEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, CombatEvent::MatchOver { .. }))
        .count()
}

#[test]
fn damage_is_attack_divided_by_roll() {
    assert_eq!(damage_per_hit(1360, 1), 1360);
    assert_eq!(damage_per_hit(600, 6), 100);
    assert_eq!(damage_per_hit(1090, 4), 272);
}

#[test]
fn damage_never_increases_with_roll() {
    let catalog = CardCatalog::builtin();
    for card in catalog.cards() {
        for roll in 1..6 {
            assert!(damage_per_hit(card.attack, roll) >= damage_per_hit(card.attack, roll + 1));
        }
    }
}

#[test]
fn first_hit_lands_at_roll_time_and_turn_passes_after_delay() {
    let catalog = CardCatalog::builtin();
    let fang = catalog.lookup("fang").expect("fang");
    let pearl = catalog.lookup("pearl").expect("pearl");
    let mut engine = engine(fang, pearl);

    let outcome = engine.roll(1);
    assert_eq!(
        outcome,
        RollOutcome::Accepted {
            attacker: Side::Player,
            roll: 1,
            damage: 1360,
            hits: 1
        }
    );
    assert_eq!(engine.state().phase(), Phase::Resolving);

    engine.advance(0);
    assert_eq!(engine.state().enemy().current_hp(), 2540);
    assert_eq!(engine.state().phase(), Phase::Resolving);

    engine.advance(1499);
    assert_eq!(engine.state().active_side(), Side::Player);

    engine.advance(1);
    assert_eq!(engine.state().phase(), Phase::Idle);
    assert_eq!(engine.state().active_side(), Side::Enemy);
}

#[test]
fn lethal_hit_latches_over_and_blocks_rolls() {
    let mut engine = engine(&card(1, 1000, 1360, 1), &card(2, 100, 500, 1));
    engine.roll(1);
    engine.run_until_settled();

    let state = engine.state();
    assert_eq!(state.enemy().current_hp(), 0);
    assert_eq!(state.phase(), Phase::Over);
    assert_eq!(state.winner(), Some(Side::Player));
    assert_eq!(state.active_side(), Side::Player);

    assert_eq!(engine.roll(3), RollOutcome::Rejected(RollRejected::MatchOver));
    assert_eq!(count_match_over(&engine.take_events()), 1);
}

#[test]
fn progress_stays_put_once_match_is_over() {
    let mut engine = engine(&card(1, 1000, 1360, 1), &card(2, 100, 500, 1));
    assert!(engine.roll(1).is_accepted());
    engine.advance(0);
    assert_eq!(engine.state().phase(), Phase::Over);
    assert_eq!(engine.progress_percent(), 0.0);

    engine.advance(500);
    assert_eq!(engine.progress_percent(), 0.0);
    assert_eq!(engine.state().phase(), Phase::Over);
}

#[test]
fn two_hit_attacker_with_lethal_first_hit_ends_once() {
    let mut engine = engine(&card(1, 1000, 500, 2), &card(2, 300, 100, 1));
    engine.roll(1);
    engine.run_until_settled();

    let events = engine.take_events();
    let hits: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, CombatEvent::HitApplied { .. }))
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(count_match_over(&events), 1);
    assert_eq!(engine.state().enemy().current_hp(), 0);
    assert_eq!(engine.state().phase(), Phase::Over);
}

#[test]
fn multi_hit_attacker_spaces_hits_by_interval() {
    let mut engine = engine(&card(1, 5000, 700, 2), &card(2, 5000, 100, 1));
    engine.roll(2);
    engine.run_until_settled();

    let hit_times: Vec<u64> = engine
        .take_events()
        .iter()
        .filter(|event| matches!(event, CombatEvent::HitApplied { .. }))
        .map(CombatEvent::at_ms)
        .collect();
    assert_eq!(hit_times, vec![0, 200]);
    assert_eq!(engine.state().enemy().current_hp(), 5000 - 2 * 350);
}

#[test]
fn rolls_are_declined_while_resolving_or_out_of_range() {
    let mut engine = engine(&card(1, 1000, 100, 1), &card(2, 1000, 100, 1));
    assert_eq!(
        engine.roll(0),
        RollOutcome::Rejected(RollRejected::OutOfRange { roll: 0 })
    );
    assert_eq!(
        engine.roll(7),
        RollOutcome::Rejected(RollRejected::OutOfRange { roll: 7 })
    );
    assert!(engine.roll(4).is_accepted());
    assert_eq!(engine.roll(4), RollOutcome::Rejected(RollRejected::Resolving));

    engine.run_until_settled();
    assert_eq!(engine.state().enemy().current_hp(), 975);
}

#[test]
fn each_accepted_roll_switches_turn_exactly_once() {
    let mut engine = engine(&card(1, 100_000, 100, 1), &card(2, 100_000, 100, 1));
    let mut expected = Side::Player;
    for roll in [1, 2, 3, 4, 5, 6] {
        assert_eq!(engine.state().active_side(), expected);
        assert!(engine.roll(roll).is_accepted());
        engine.run_until_settled();
        let switches: Vec<Side> = engine
            .take_events()
            .iter()
            .filter_map(|event| match event {
                CombatEvent::TurnSwitched { active, .. } => Some(*active),
                _ => None,
            })
            .collect();
        expected = expected.opponent();
        assert_eq!(switches, vec![expected]);
    }
}

#[test]
fn health_stays_within_bounds_over_random_matches() {
    let catalog = CardCatalog::builtin();
    let cards = catalog.cards();
    let mut rng = Rng::new(2024);
    for (index, player) in cards.iter().enumerate() {
        let enemy = &cards[(index + 3) % cards.len()];
        let mut engine = engine(player, enemy);
        while !engine.state().is_over() {
            assert!(engine.roll(rng.roll_die()).is_accepted());
            engine.run_until_settled();
            for side in [Side::Player, Side::Enemy] {
                let combatant = engine.state().combatant(side);
                assert!(combatant.current_hp() <= combatant.max_hp);
            }
        }
        let events = engine.take_events();
        assert_eq!(count_match_over(&events), 1);
        let loser = engine.state().winner().expect("winner").opponent();
        assert_eq!(engine.state().combatant(loser).current_hp(), 0);
    }
}

#[test]
fn reset_mid_resolution_leaves_new_match_untouched() {
    let catalog = CardCatalog::builtin();
    let fang = catalog.lookup("fang").expect("fang");
    let pearl = catalog.lookup("pearl").expect("pearl");
    let larry = catalog.lookup("71").expect("larry");

    let mut engine = engine(larry, pearl);
    engine.roll(1);
    engine.advance(100);
    assert_eq!(engine.state().enemy().current_hp(), 3200);

    engine.reset(MatchState::new(fang, pearl));
    engine.take_events();
    engine.advance(5_000);

    assert_eq!(engine.state().enemy().current_hp(), 3900);
    assert_eq!(engine.state().phase(), Phase::Idle);
    assert_eq!(engine.state().active_side(), Side::Player);
    assert_eq!(engine.progress_percent(), 0.0);
    assert!(engine.take_events().is_empty());
    assert_eq!(engine.pending_actions(), 0);
}
