//! Rule-based diabetes risk estimation.
//!
//! Despite the product naming this is a plain threshold table, not a model:
//! each input contributes a fixed number of points and the total maps onto
//! three risk bands.

use serde::{Deserialize, Serialize};

/// Incoming assessment request. The four numeric fields are optional at the
/// wire level so missing values can be rejected with a client error instead
/// of a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRequest {
    pub age: Option<f64>,
    pub bmi: Option<f64>,
    pub fasting_sugar: Option<f64>,
    pub post_meal_sugar: Option<f64>,
    #[serde(default)]
    pub family_history: bool,
    #[serde(default)]
    pub physical_activity: Option<String>,
}

/// Validated inputs for one assessment.
#[derive(Debug, Clone, Copy)]
pub struct RiskFactors {
    pub age: f64,
    pub bmi: f64,
    pub fasting_sugar: f64,
    pub post_meal_sugar: f64,
    pub family_history: bool,
    pub activity: ActivityBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityBand {
    Low,
    Moderate,
    /// High activity or an unrecognized value: contributes no points.
    Other,
}

impl ActivityBand {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_lowercase).as_deref() {
            Some("low") => Self::Low,
            Some("moderate") => Self::Moderate,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

/// Assessment result in the public wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub message: String,
    pub recommendations: Vec<String>,
}

impl RiskRequest {
    /// Validate that all four numeric fields are present.
    pub fn validate(&self) -> Result<RiskFactors, String> {
        if self.age.is_none()
            || self.bmi.is_none()
            || self.fasting_sugar.is_none()
            || self.post_meal_sugar.is_none()
        {
            return Err("Missing required health parameters".to_string());
        }

        Ok(RiskFactors {
            age: self.age.unwrap_or_default(),
            bmi: self.bmi.unwrap_or_default(),
            fasting_sugar: self.fasting_sugar.unwrap_or_default(),
            post_meal_sugar: self.post_meal_sugar.unwrap_or_default(),
            family_history: self.family_history,
            activity: ActivityBand::parse(self.physical_activity.as_deref()),
        })
    }
}

/// Point table. Age ≥45 → 2 (≥30 → 1), BMI ≥30 → 3 (≥25 → 2),
/// fasting sugar ≥126 → 4 (≥100 → 2), post-meal ≥200 → 4 (≥140 → 2),
/// family history → 2, low activity → 2 (moderate → 1).
pub fn risk_score(factors: &RiskFactors) -> u32 {
    let mut score = 0;

    if factors.age >= 45.0 {
        score += 2;
    } else if factors.age >= 30.0 {
        score += 1;
    }

    if factors.bmi >= 30.0 {
        score += 3;
    } else if factors.bmi >= 25.0 {
        score += 2;
    }

    if factors.fasting_sugar >= 126.0 {
        score += 4;
    } else if factors.fasting_sugar >= 100.0 {
        score += 2;
    }

    if factors.post_meal_sugar >= 200.0 {
        score += 4;
    } else if factors.post_meal_sugar >= 140.0 {
        score += 2;
    }

    if factors.family_history {
        score += 2;
    }

    match factors.activity {
        ActivityBand::Low => score += 2,
        ActivityBand::Moderate => score += 1,
        ActivityBand::Other => {}
    }

    score
}

/// Band mapping: ≥10 High, ≥6 Moderate, else Low.
pub fn risk_level(score: u32) -> RiskLevel {
    if score >= 10 {
        RiskLevel::High
    } else if score >= 6 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// Run a full assessment.
pub fn assess(factors: &RiskFactors) -> RiskAssessment {
    let score = risk_score(factors);

    RiskAssessment {
        risk_level: risk_level(score),
        risk_score: score,
        message: "This is an AI-assisted risk estimation, not a medical diagnosis.".to_string(),
        recommendations: vec![
            "Maintain a healthy diet".to_string(),
            "Exercise at least 30 minutes daily".to_string(),
            "Monitor blood sugar regularly".to_string(),
            "Consult a doctor for clinical confirmation".to_string(),
        ],
    }
}
