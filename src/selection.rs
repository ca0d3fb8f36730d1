//! Pre-match combatant selection: `pick-p1 -> pick-p2 -> done`, or skipped entirely by a
//! deep link that resolves both sides.

use log::{debug, info};
use serde::Serialize;

use crate::catalog::{CardCatalog, CardDefinition};
use crate::combat::MatchState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionStep {
    #[serde(rename = "pick-p1")]
    PickP1,
    #[serde(rename = "pick-p2")]
    PickP2,
    #[serde(rename = "done")]
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionFlow {
    step: SelectionStep,
    selected_p1: Option<u32>,
    selected_p2: Option<u32>,
    #[serde(skip)]
    locked_player: Option<CardDefinition>,
}

impl Default for SelectionFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionFlow {
    pub fn new() -> Self {
        Self {
            step: SelectionStep::PickP1,
            selected_p1: None,
            selected_p2: None,
            locked_player: None,
        }
    }

    pub fn step(&self) -> SelectionStep {
        self.step
    }

    pub fn selected_p1(&self) -> Option<u32> {
        self.selected_p1
    }

    pub fn selected_p2(&self) -> Option<u32> {
        self.selected_p2
    }

    /// Candidate for the step currently being picked.
    pub fn active_selection(&self) -> Option<u32> {
        match self.step {
            SelectionStep::PickP1 => self.selected_p1,
            SelectionStep::PickP2 => self.selected_p2,
            SelectionStep::Done => None,
        }
    }

    /// Record a candidate for the current step. Does not advance.
    pub fn select(&mut self, card_id: u32) {
        match self.step {
            SelectionStep::PickP1 => self.selected_p1 = Some(card_id),
            SelectionStep::PickP2 => self.selected_p2 = Some(card_id),
            SelectionStep::Done => debug!("select({card_id}) ignored: selection finished"),
        }
    }

    /// Lock the current candidate. Returns the seeded match when p2 is confirmed; any
    /// confirm without a candidate the catalog knows is a no-op.
    pub fn confirm(&mut self, catalog: &CardCatalog) -> Option<MatchState> {
        match self.step {
            SelectionStep::PickP1 => {
                let chosen = self.selected_p1.and_then(|id| catalog.by_id(id))?;
                self.locked_player = Some(chosen.clone());
                self.step = SelectionStep::PickP2;
                debug!("p1 locked: {}", chosen.name);
                None
            }
            SelectionStep::PickP2 => {
                let enemy = self.selected_p2.and_then(|id| catalog.by_id(id))?;
                let player = self
                    .locked_player
                    .as_ref()
                    .or_else(|| self.selected_p1.and_then(|id| catalog.by_id(id)))
                    .unwrap_or_else(|| catalog.default_player());
                let state = MatchState::new(player, enemy);
                info!("selection done: {} vs {}", player.name, enemy.name);
                self.step = SelectionStep::Done;
                Some(state)
            }
            SelectionStep::Done => None,
        }
    }

    /// Step back from `pick-p2`. The p1 candidate stays selected.
    pub fn back(&mut self) -> bool {
        if self.step != SelectionStep::PickP2 {
            return false;
        }
        self.step = SelectionStep::PickP1;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLink {
    /// Both parameters resolved: selection is skipped.
    Bypass {
        flow: SelectionFlow,
        state: MatchState,
    },
    /// Zero or one parameter resolved; resolved sides are pre-selected.
    Manual(SelectionFlow),
}

/// Interpret external `p1`/`p2` parameters. Unresolvable values are ignored.
pub fn resolve_deep_link(catalog: &CardCatalog, p1: Option<&str>, p2: Option<&str>) -> DeepLink {
    let p1_card = p1.and_then(|key| catalog.lookup(key));
    let p2_card = p2.and_then(|key| catalog.lookup(key));

    let mut flow = SelectionFlow::new();
    flow.selected_p1 = p1_card.map(|card| card.id);
    flow.selected_p2 = p2_card.map(|card| card.id);

    match (p1_card, p2_card) {
        (Some(player), Some(enemy)) => {
            info!("deep link: {} vs {}", player.name, enemy.name);
            flow.locked_player = Some(player.clone());
            flow.step = SelectionStep::Done;
            DeepLink::Bypass {
                flow,
                state: MatchState::new(player, enemy),
            }
        }
        _ => {
            if p1.is_some() || p2.is_some() {
                debug!("deep link incomplete (p1={p1:?}, p2={p2:?}); selection required");
            }
            DeepLink::Manual(flow)
        }
    }
}
