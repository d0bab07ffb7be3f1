//! Cost policy: what a character pays out of pocket for a scenario under a plan.

use contracts::{
    Character, CharacterOutcome, CostBreakdown, FinancialImpact, GameState, InsuranceOption,
    Scenario,
};

use indexmap::IndexMap;

use crate::catalog::Catalog;

pub const DEFAULT_MEDIUM_IMPACT_FROM: f64 = 2_000.0;
pub const DEFAULT_HIGH_IMPACT_FROM: f64 = 10_000.0;

/// Lower bounds of the Medium and High tiers. A value equal to a bound
/// belongs to the higher tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactThresholds {
    pub medium_from: f64,
    pub high_from: f64,
}

impl ImpactThresholds {
    pub fn new(medium_from: f64, high_from: f64) -> Option<Self> {
        if medium_from.is_finite() && high_from.is_finite() && medium_from <= high_from {
            Some(Self {
                medium_from,
                high_from,
            })
        } else {
            None
        }
    }

    pub fn classify(&self, out_of_pocket: f64) -> FinancialImpact {
        if out_of_pocket < self.medium_from {
            FinancialImpact::Low
        } else if out_of_pocket < self.high_from {
            FinancialImpact::Medium
        } else {
            FinancialImpact::High
        }
    }
}

impl Default for ImpactThresholds {
    fn default() -> Self {
        Self {
            medium_from: DEFAULT_MEDIUM_IMPACT_FROM,
            high_from: DEFAULT_HIGH_IMPACT_FROM,
        }
    }
}

pub fn compute_outcome(
    option: &InsuranceOption,
    scenario: &Scenario,
    thresholds: &ImpactThresholds,
) -> CostBreakdown {
    let treatment = scenario.treatment_cost;
    let deductible = option.annual_deductible;
    let limit = option.coverage_limit;

    let deductible_cost = deductible.min(treatment);
    // Copayment only applies to the part of the bill the plan is willing to cover.
    let eligible_cost = treatment.min(limit);
    let remaining_cost = (eligible_cost - deductible).max(0.0);
    let copayment_cost = remaining_cost * (option.copayment_percentage / 100.0);
    let excess_cost = (treatment - limit.max(deductible_cost)).max(0.0);

    let out_of_pocket_cost = deductible_cost + copayment_cost + excess_cost;

    CostBreakdown {
        insurance_plan: option.name.clone(),
        total_treatment_cost: treatment,
        deductible_cost,
        copayment_cost,
        excess_cost,
        out_of_pocket_cost,
        insurance_covered: treatment - out_of_pocket_cost,
        financial_impact: thresholds.classify(out_of_pocket_cost),
        monthly_premium: option.monthly_premium,
        annual_premium: option.annual_premium(),
    }
}

/// `None` when the character has not chosen, or chose an option the catalog does not know.
pub fn outcome_for_character(
    catalog: &Catalog,
    character: &Character,
    scenario: &Scenario,
    thresholds: &ImpactThresholds,
) -> Option<CharacterOutcome> {
    let option_id = character.insurance_choice.as_deref()?;
    let option = catalog.insurance_option(option_id)?;

    Some(CharacterOutcome {
        character_name: character.name.clone(),
        breakdown: compute_outcome(option, scenario, thresholds),
    })
}

/// Follows the stored character order, not id order.
pub fn compute_all_outcomes(
    catalog: &Catalog,
    state: &GameState,
    scenario: &Scenario,
    thresholds: &ImpactThresholds,
) -> IndexMap<String, CharacterOutcome> {
    state
        .characters
        .iter()
        .filter_map(|character| {
            outcome_for_character(catalog, character, scenario, thresholds)
                .map(|outcome| (character.id.clone(), outcome))
        })
        .collect()
}
