use std::collections::HashSet;

use contracts::{Character, InsuranceOption, PlanClass, Scenario, UrgencyLevel};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("insurance option {id} has non-positive or non-finite coverage limit {limit}")]
    CoverageLimit { id: String, limit: f64 },
    #[error("insurance option {id} has copayment percentage {percentage} outside 0..=100")]
    CopaymentPercentage { id: String, percentage: f64 },
    #[error("insurance option {id} has negative or non-finite {field}: {value}")]
    NegativeAmount {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("scenario {id} has non-positive or non-finite treatment cost {cost}")]
    TreatmentCost { id: String, cost: f64 },
    #[error("character {id} has zero age")]
    CharacterAge { id: String },
}

/// Read-only reference data. Order of every collection is data-entry order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    insurance_options: Vec<InsuranceOption>,
    characters: Vec<Character>,
    scenarios: Vec<Scenario>,
}

impl Catalog {
    pub fn new(
        insurance_options: Vec<InsuranceOption>,
        characters: Vec<Character>,
        scenarios: Vec<Scenario>,
    ) -> Result<Self, CatalogError> {
        validate_options(&insurance_options)?;
        validate_characters(&characters)?;
        validate_scenarios(&scenarios)?;

        Ok(Self {
            insurance_options,
            characters,
            scenarios,
        })
    }

    pub fn builtin() -> Self {
        Self {
            insurance_options: builtin_insurance_options(),
            characters: builtin_characters(),
            scenarios: builtin_scenarios(),
        }
    }

    pub fn insurance_options(&self) -> &[InsuranceOption] {
        &self.insurance_options
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn insurance_option(&self, option_id: &str) -> Option<&InsuranceOption> {
        self.insurance_options
            .iter()
            .find(|option| option.id == option_id)
    }

    pub fn scenario(&self, scenario_id: &str) -> Option<&Scenario> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.id == scenario_id)
    }

    /// Samples without replacement; a non-positive count yields nothing.
    pub fn pick_random_scenarios(&self, count: i64) -> Vec<Scenario> {
        self.pick_random_scenarios_with(count, &mut rand::thread_rng())
    }

    pub fn pick_random_scenarios_with<R: Rng + ?Sized>(
        &self,
        count: i64,
        rng: &mut R,
    ) -> Vec<Scenario> {
        let Ok(count) = usize::try_from(count) else {
            return Vec::new();
        };

        self.scenarios
            .choose_multiple(rng, count.min(self.scenarios.len()))
            .cloned()
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_options(options: &[InsuranceOption]) -> Result<(), CatalogError> {
    ensure_unique("insurance option", options.iter().map(|option| option.id.as_str()))?;

    for option in options {
        if !(option.coverage_limit > 0.0 && option.coverage_limit.is_finite()) {
            return Err(CatalogError::CoverageLimit {
                id: option.id.clone(),
                limit: option.coverage_limit,
            });
        }
        if !(0.0..=100.0).contains(&option.copayment_percentage) {
            return Err(CatalogError::CopaymentPercentage {
                id: option.id.clone(),
                percentage: option.copayment_percentage,
            });
        }
        for (field, value) in [
            ("monthly premium", option.monthly_premium),
            ("annual deductible", option.annual_deductible),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(CatalogError::NegativeAmount {
                    id: option.id.clone(),
                    field,
                    value,
                });
            }
        }
    }

    Ok(())
}

fn validate_characters(characters: &[Character]) -> Result<(), CatalogError> {
    ensure_unique("character", characters.iter().map(|c| c.id.as_str()))?;

    match characters.iter().find(|character| character.age == 0) {
        Some(character) => Err(CatalogError::CharacterAge {
            id: character.id.clone(),
        }),
        None => Ok(()),
    }
}

fn validate_scenarios(scenarios: &[Scenario]) -> Result<(), CatalogError> {
    ensure_unique("scenario", scenarios.iter().map(|s| s.id.as_str()))?;

    for scenario in scenarios {
        if !(scenario.treatment_cost > 0.0 && scenario.treatment_cost.is_finite()) {
            return Err(CatalogError::TreatmentCost {
                id: scenario.id.clone(),
                cost: scenario.treatment_cost,
            });
        }
    }

    Ok(())
}

fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn benefits(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn builtin_insurance_options() -> Vec<InsuranceOption> {
    vec![
        InsuranceOption {
            id: "medishield_basic".to_string(),
            name: "MediShield Life (Basic)".to_string(),
            plan_class: PlanClass::Basic,
            monthly_premium: 150.0,
            annual_deductible: 3000.0,
            copayment_percentage: 10.0,
            coverage_limit: 150_000.0,
            key_benefits: benefits(&[
                "Basic hospital coverage",
                "Subsidized ward coverage",
                "Emergency treatment",
                "Day surgery procedures",
            ]),
        },
        InsuranceOption {
            id: "integrated_shield".to_string(),
            name: "Integrated Shield Plan".to_string(),
            plan_class: PlanClass::Enhanced,
            monthly_premium: 450.0,
            annual_deductible: 1000.0,
            copayment_percentage: 5.0,
            coverage_limit: 1_000_000.0,
            key_benefits: benefits(&[
                "Private hospital coverage",
                "Specialist consultations",
                "Advanced treatments",
                "Overseas emergency coverage",
                "Cancer treatment coverage",
            ]),
        },
    ]
}

fn builtin_characters() -> Vec<Character> {
    vec![
        Character {
            id: "alex".to_string(),
            name: "Alex".to_string(),
            age: 25,
            occupation: "Software Developer".to_string(),
            current_health_status: "Generally healthy, occasional stress".to_string(),
            lifestyle: "Long hours at the desk, weekend gaming, irregular meals".to_string(),
            insurance_choice: None,
        },
        Character {
            id: "jamie".to_string(),
            name: "Jamie".to_string(),
            age: 28,
            occupation: "Marketing Executive".to_string(),
            current_health_status: "Active lifestyle, family history of diabetes".to_string(),
            lifestyle: "Runs three times a week, frequent client dinners and travel".to_string(),
            insurance_choice: None,
        },
    ]
}

fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "appendix_surgery".to_string(),
            title: "Emergency Appendectomy".to_string(),
            description: "Sudden severe abdominal pain requiring immediate surgery".to_string(),
            medical_situation: "Emergency appendix removal with 3 days hospital stay".to_string(),
            treatment_cost: 25_000.0,
            urgency_level: UrgencyLevel::High,
            category: "emergency".to_string(),
            age_relevance: "all_ages".to_string(),
        },
        Scenario {
            id: "cancer_diagnosis".to_string(),
            title: "Cancer Diagnosis".to_string(),
            description: "Routine check-up reveals early stage cancer requiring treatment"
                .to_string(),
            medical_situation: "Cancer treatment including chemotherapy and specialist care"
                .to_string(),
            treatment_cost: 180_000.0,
            urgency_level: UrgencyLevel::High,
            category: "critical_illness".to_string(),
            age_relevance: "adults".to_string(),
        },
        Scenario {
            id: "broken_arm".to_string(),
            title: "Broken Arm".to_string(),
            description: "Accident results in fractured arm requiring surgery and physiotherapy"
                .to_string(),
            medical_situation: "Orthopedic surgery with follow-up treatment".to_string(),
            treatment_cost: 15_000.0,
            urgency_level: UrgencyLevel::Medium,
            category: "accident".to_string(),
            age_relevance: "young_adults".to_string(),
        },
    ]
}
