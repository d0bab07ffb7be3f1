//! Reference catalog, session decision rules, and the out-of-pocket cost calculator.

pub mod catalog;
pub mod comparison;
pub mod outcome;
pub mod session;

pub use catalog::{Catalog, CatalogError};
pub use comparison::compare_plans;
pub use outcome::{compute_all_outcomes, compute_outcome, outcome_for_character, ImpactThresholds};
pub use session::{decisions_consistent, new_game_state, record_decision, DecisionEffect};
