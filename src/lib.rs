//! diceduel: a two-combatant dice card battle.
//!
//! Cards come from a [catalog::CardCatalog]; a [selection::SelectionFlow] (or a deep link)
//! seeds a [combat::MatchState]; the [combat::CombatEngine] resolves rolls on a virtual
//! clock; [overlay] derives damage numbers and card shake from the same values.
//! [game::Game] ties these together for the CLI and the HTTP server.

pub mod catalog;
pub mod cli;
pub mod combat;
pub mod config;
pub mod game;
pub mod logging;
pub mod overlay;
pub mod parallel;
pub mod realtime;
pub mod selection;
pub mod server;
