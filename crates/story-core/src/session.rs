use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use contracts::{Decision, GameState};
use uuid::Uuid;

use crate::catalog::Catalog;

pub const FIRST_CHAPTER: u32 = 1;

/// Result of applying a decision to a session's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionEffect {
    Applied,
    /// The character id matched nobody; state is untouched.
    UnknownCharacter,
}

impl DecisionEffect {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

pub fn new_game_state(
    session_id: impl Into<String>,
    catalog: &Catalog,
    created_at: DateTime<Utc>,
) -> GameState {
    let characters = catalog
        .characters()
        .iter()
        .cloned()
        .map(|mut character| {
            character.insurance_choice = None;
            character
        })
        .collect();

    GameState {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.into(),
        current_chapter: FIRST_CHAPTER,
        characters,
        completed_decisions: BTreeMap::new(),
        created_at,
    }
}

/// Sets the character's choice and mirrors it into `completed_decisions`.
/// The option id is stored as given; resolution happens at calculation time.
pub fn record_decision(state: &mut GameState, decision: &Decision) -> DecisionEffect {
    let Some(character) = state
        .characters
        .iter_mut()
        .find(|character| character.id == decision.character_id)
    else {
        return DecisionEffect::UnknownCharacter;
    };

    character.insurance_choice = Some(decision.insurance_option_id.clone());
    state.completed_decisions.insert(
        decision.character_id.clone(),
        decision.insurance_option_id.clone(),
    );
    DecisionEffect::Applied
}

/// Every decision key names a known character whose choice agrees with it.
pub fn decisions_consistent(state: &GameState) -> bool {
    state.completed_decisions.iter().all(|(character_id, option_id)| {
        state
            .characters
            .iter()
            .find(|character| &character.id == character_id)
            .and_then(|character| character.insurance_choice.as_ref())
            == Some(option_id)
    })
}
