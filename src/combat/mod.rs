pub mod engine;
pub mod events;
pub mod rng;
pub mod scheduler;

pub use engine::{
    damage_per_hit, CombatEngine, CombatantState, DamageDisplay, MatchState, Phase,
    RollOutcome, RollRejected, Side, MAX_ROLL, MIN_ROLL,
};
pub use events::{serialize_events_json, CombatEvent};
pub use rng::Rng;
pub use scheduler::{Scheduled, Scheduler};
