//! Rule-based test recommendations.
//!
//! A deterministic decision table keyed on age and an optional focus-area
//! string. No model runs behind this; scores are fixed per rule.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Query parameters / request body for the recommendations endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendQuery {
    pub age: Option<f64>,
    /// Free-form focus area, e.g. "diabetes" or "thyroid". Matched by
    /// case-insensitive substring.
    pub focus: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

/// One recommended test card.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub test: String,
    pub priority: Priority,
    /// Cheapest catalog offering for the test; absent when no hospital in
    /// the directory carries it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
    /// Match percentage shown on the card. Fixed per rule.
    pub score: u32,
    pub reason: String,
}

struct Rule {
    test: &'static str,
    priority: Priority,
    score: u32,
    reason: &'static str,
}

const AGE_SCREENING_THRESHOLD: f64 = 40.0;

const AGE_RULES: &[Rule] = &[
    Rule {
        test: "Lipid Profile",
        priority: Priority::Medium,
        score: 74,
        reason: "Routine cholesterol screening is recommended from age 40",
    },
    Rule {
        test: "Blood Sugar (Fasting)",
        priority: Priority::Medium,
        score: 72,
        reason: "Annual blood sugar screening is recommended from age 40",
    },
    Rule {
        test: "Liver Function Test",
        priority: Priority::Medium,
        score: 68,
        reason: "Baseline liver panel is recommended from age 40",
    },
];

const DIABETES_RULES: &[Rule] = &[
    Rule {
        test: "HbA1c Test",
        priority: Priority::High,
        score: 90,
        reason: "Tracks three-month average blood sugar for diabetes care",
    },
    Rule {
        test: "Kidney Function Test",
        priority: Priority::High,
        score: 84,
        reason: "Diabetes raises kidney risk; periodic screening advised",
    },
];

const THYROID_RULES: &[Rule] = &[Rule {
    test: "Thyroid Panel",
    priority: Priority::High,
    score: 88,
    reason: "Matches your thyroid focus area",
}];

/// Evaluate the decision table against a query.
///
/// Duplicate tests are removed with the first firing rule winning.
pub fn recommend(query: &RecommendQuery, catalog: &Catalog) -> Vec<Recommendation> {
    let mut fired: Vec<&Rule> = Vec::new();

    if query.age.is_some_and(|age| age >= AGE_SCREENING_THRESHOLD) {
        fired.extend(AGE_RULES);
    }

    let focus = query.focus.as_deref().unwrap_or("").to_lowercase();
    if focus.contains("diabetes") {
        fired.extend(DIABETES_RULES);
    }
    if focus.contains("thyroid") {
        fired.extend(THYROID_RULES);
    }

    let mut seen: Vec<&str> = Vec::new();
    fired
        .into_iter()
        .filter(|rule| {
            if seen.contains(&rule.test) {
                false
            } else {
                seen.push(rule.test);
                true
            }
        })
        .map(|rule| Recommendation {
            test: rule.test.to_string(),
            priority: rule.priority,
            price: catalog.cheapest_price(rule.test),
            score: rule.score,
            reason: rule.reason.to_string(),
        })
        .collect()
}
