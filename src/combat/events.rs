//! Engine -> presentation event surface. Every event is stamped with the virtual time
//! it happened at.

use serde::Serialize;

use crate::combat::engine::Side;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    RollAccepted {
        at_ms: u64,
        attacker: Side,
        roll: u8,
        damage: u32,
        hits: u32,
    },
    HitApplied {
        at_ms: u64,
        recipient: Side,
        damage: u32,
        remaining_hp: u32,
        hit_index: u32,
    },
    TurnSwitched {
        at_ms: u64,
        active: Side,
    },
    MatchOver {
        at_ms: u64,
        winner: Side,
    },
}

impl CombatEvent {
    pub fn at_ms(&self) -> u64 {
        match self {
            Self::RollAccepted { at_ms, .. }
            | Self::HitApplied { at_ms, .. }
            | Self::TurnSwitched { at_ms, .. }
            | Self::MatchOver { at_ms, .. } => *at_ms,
        }
    }
}

pub fn serialize_events_json(events: &[CombatEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let events = vec![
            CombatEvent::HitApplied {
                at_ms: 200,
                recipient: Side::Enemy,
                damage: 350,
                remaining_hp: 2650,
                hit_index: 1,
            },
            CombatEvent::MatchOver {
                at_ms: 200,
                winner: Side::Player,
            },
        ];
        let json = serialize_events_json(&events).expect("events serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value[0]["type"], "hit_applied");
        assert_eq!(value[0]["recipient"], "enemy");
        assert_eq!(value[1]["winner"], "player");
        assert_eq!(events[1].at_ms(), 200);
    }
}
