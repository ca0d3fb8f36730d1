//! Wall-clock driver: plays a [Game] in real time on tokio, sleeping until each queued
//! action is due. The engine itself never sleeps; this loop only converts its virtual
//! schedule into timer waits.

use std::time::Duration;

use log::{debug, info};
use tokio::time::sleep;

use crate::combat::{CombatEvent, Phase, Side};
use crate::game::Game;

/// Roll automatically whenever the active side is idle, until the match ends or
/// `max_turns` rolls have been made. Returns the winner, if there is one by then.
pub async fn play_realtime<F>(game: &mut Game, max_turns: u32, mut on_event: F) -> Option<Side>
where
    F: FnMut(&CombatEvent),
{
    let mut turns = 0;
    loop {
        let state = game.match_state()?;
        if state.is_over() {
            break;
        }
        if state.phase() == Phase::Idle {
            if turns >= max_turns {
                info!("stopping after {turns} turns without a winner");
                break;
            }
            if !game.roll().is_accepted() {
                break;
            }
            turns += 1;
            emit(game, &mut on_event);
            continue;
        }

        let Some(due) = game.next_due_ms() else {
            break;
        };
        let wait = due.saturating_sub(game.now_ms());
        if wait > 0 {
            sleep(Duration::from_millis(wait)).await;
        }
        game.advance_to(due);
        emit(game, &mut on_event);
    }
    let winner = game.match_state().and_then(|state| state.winner());
    debug!("realtime match finished after {turns} turns, winner {winner:?}");
    winner
}

fn emit<F: FnMut(&CombatEvent)>(game: &mut Game, on_event: &mut F) {
    for event in game.drain_events() {
        on_event(&event);
    }
}
