//! Cross-boundary contracts shared by the calculator, the session store, and the HTTP API.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const API_MESSAGE: &str = "MediShield Story Game API";
pub const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlanClass {
    Basic,
    Enhanced,
}

impl PlanClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Enhanced => "enhanced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceOption {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub plan_class: PlanClass,
    pub monthly_premium: f64,
    pub annual_deductible: f64,
    pub copayment_percentage: f64,
    pub coverage_limit: f64,
    #[serde(default)]
    pub key_benefits: Vec<String>,
}

impl InsuranceOption {
    pub fn annual_premium(&self) -> f64 {
        self.monthly_premium * MONTHS_PER_YEAR
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub occupation: String,
    pub current_health_status: String,
    #[serde(default)]
    pub lifestyle: String,
    #[serde(default)]
    pub insurance_choice: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub medical_situation: String,
    pub treatment_cost: f64,
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub age_relevance: String,
}

/// One player's game, persisted as a single document keyed by `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub id: String,
    pub session_id: String,
    pub current_chapter: u32,
    pub characters: Vec<Character>,
    #[serde(default)]
    pub completed_decisions: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub character_id: String,
    pub insurance_option_id: String,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl Decision {
    pub fn new(character_id: impl Into<String>, insurance_option_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            insurance_option_id: insurance_option_id.into(),
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FinancialImpact {
    Low,
    Medium,
    High,
}

impl fmt::Display for FinancialImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

/// Itemized result of applying one plan to one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub insurance_plan: String,
    pub total_treatment_cost: f64,
    pub deductible_cost: f64,
    pub copayment_cost: f64,
    pub excess_cost: f64,
    pub out_of_pocket_cost: f64,
    pub insurance_covered: f64,
    pub financial_impact: FinancialImpact,
    pub monthly_premium: f64,
    pub annual_premium: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterOutcome {
    pub character_name: String,
    #[serde(flatten)]
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeReport {
    pub scenario: Scenario,
    /// Keyed by character id, in the session's character order.
    pub outcomes: IndexMap<String, CharacterOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanCost {
    pub id: String,
    pub name: String,
    pub monthly_cost: f64,
    pub annual_cost: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostDifference {
    pub monthly: f64,
    pub annual: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanComparison {
    pub basic_plan: PlanCost,
    pub enhanced_plan: PlanCost,
    pub cost_difference: CostDifference,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartGameRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionRequest {
    pub session_id: String,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionAck {
    pub message: String,
    pub applied: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SessionNotFound,
    ScenarioNotFound,
    NotFound,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
            details,
        }
    }
}
