use serde::Serialize;

use crate::catalog::{HospitalRecord, PricedHospital};

/// Reference price ceiling used by the price sub-score (currency units).
pub const MAX_PRICE: f64 = 1000.0;
/// Reference distance ceiling used by the distance sub-score (km).
pub const MAX_DISTANCE_KM: f64 = 10.0;
/// Rating scale upper bound.
pub const MAX_RATING: f64 = 5.0;

const PRICE_WEIGHT: f64 = 50.0;
const DISTANCE_WEIGHT: f64 = 30.0;
const RATING_WEIGHT: f64 = 20.0;

/// Simulated insured/negotiated rate: the patient pays 30% of the list price.
pub const INSURED_RATE: f64 = 0.3;

/// A hospital annotated with the pricing and ranking fields for one search.
///
/// Field names follow the public API wire format.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    #[serde(flatten)]
    pub hospital: HospitalRecord,
    #[serde(rename = "basePrice")]
    pub base_price: u32,
    #[serde(rename = "outOfPocket")]
    pub out_of_pocket: u32,
    pub savings: u32,
    #[serde(rename = "overallScore")]
    pub overall_score: u32,
}

/// Aggregate statistics over one ranked result set.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    #[serde(rename = "bestScore")]
    pub best_score: u32,
    #[serde(rename = "lowestOutOfPocket")]
    pub lowest_out_of_pocket: u32,
    #[serde(rename = "highestOutOfPocket")]
    pub highest_out_of_pocket: u32,
    /// Spread between the costliest and cheapest out-of-pocket option.
    #[serde(rename = "maxSavings")]
    pub max_savings: u32,
}

/// Compute the 0-100 ranking score for one hospital offering.
///
/// Three weighted sub-scores: price (weight 50, linear against a 1000-unit
/// ceiling), distance (weight 30, 10 km ceiling) and rating (weight 20, out
/// of 5). Each sub-score is clamped to `[0, weight]` so the sum stays in
/// `[0, 100]` even for out-of-range inputs.
pub fn overall_score(price: f64, distance_km: f64, rating: f64) -> u32 {
    let price_score = ((MAX_PRICE - price) / MAX_PRICE * PRICE_WEIGHT).clamp(0.0, PRICE_WEIGHT);
    let distance_score = ((MAX_DISTANCE_KM - distance_km) / MAX_DISTANCE_KM * DISTANCE_WEIGHT)
        .clamp(0.0, DISTANCE_WEIGHT);
    let rating_score = (rating / MAX_RATING * RATING_WEIGHT).clamp(0.0, RATING_WEIGHT);

    (price_score + distance_score + rating_score).round() as u32
}

/// Simulated patient payment after the assumed insurance/negotiated discount.
pub fn out_of_pocket(base_price: u32) -> u32 {
    (f64::from(base_price) * INSURED_RATE).round() as u32
}

/// Score every offering and order the results best-first.
///
/// The sort is stable and keys on `overall_score` alone, so offerings with
/// equal scores keep their input order.
pub fn rank(offerings: Vec<PricedHospital>) -> Vec<Comparison> {
    let mut results: Vec<Comparison> = offerings
        .into_iter()
        .map(|offering| {
            let base_price = offering.price;
            let paid = out_of_pocket(base_price);
            Comparison {
                overall_score: overall_score(
                    f64::from(base_price),
                    offering.hospital.distance_km,
                    offering.hospital.rating,
                ),
                base_price,
                out_of_pocket: paid,
                savings: base_price - paid,
                hospital: offering.hospital,
            }
        })
        .collect();

    results.sort_by(|a, b| b.overall_score.cmp(&a.overall_score));
    results
}

/// Summarize a ranked result set. Returns `None` for an empty set.
pub fn summarize(results: &[Comparison]) -> Option<Summary> {
    let first = results.first()?;

    let lowest = results.iter().map(|r| r.out_of_pocket).min()?;
    let highest = results.iter().map(|r| r.out_of_pocket).max()?;

    Some(Summary {
        best_score: first.overall_score,
        lowest_out_of_pocket: lowest,
        highest_out_of_pocket: highest,
        max_savings: highest - lowest,
    })
}
