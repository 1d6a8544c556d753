//! Lead scoring and qualification.
//!
//! A lead's score is the sum of five bounded sub-scores:
//!
//! | sub-score        | range  |
//! |------------------|--------|
//! | rating           | 0..=25 |
//! | review volume    | 0..=20 |
//! | digital presence | 0..=30 |
//! | category value   | 0..=15 |
//! | location         | 0..=10 |
//!
//! so the total always lands in `0..=100`. Temperature and conversion
//! probability are pure functions of the lead and its score.

use serde::{Deserialize, Serialize};

use crate::models::{
    LeadStats, QualifiedLead, QualityFlags, RawLead, Temperature, TemperatureBreakdown,
};

/// Category substrings worth the full category sub-score.
const HIGH_VALUE_CATEGORIES: &[&str] = &[
    "restaurante",
    "pizzaria",
    "hamburgueria",
    "lanchonete",
    "padaria",
    "cafeteria",
    "clínica",
    "clinica",
    "odonto",
    "dentista",
    "academia",
    "escola",
    "curso",
    "salão",
    "salao",
    "barbearia",
    "estética",
    "pet shop",
    "imobiliária",
];

pub const HOT_THRESHOLD: u8 = 70;
pub const WARM_THRESHOLD: u8 = 45;

/// The five sub-scores behind a lead's total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub rating: u8,
    pub reviews: u8,
    pub digital_presence: u8,
    pub category: u8,
    pub location: u8,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        self.rating + self.reviews + self.digital_presence + self.category + self.location
    }
}

pub fn rating_score(rating: Option<f64>) -> u8 {
    match rating {
        None => 0,
        Some(r) if r >= 4.5 => 25,
        Some(r) if r >= 4.0 => 20,
        Some(r) if r >= 3.5 => 15,
        Some(r) if r >= 3.0 => 10,
        Some(_) => 5,
    }
}

pub fn review_score(reviews: Option<u32>) -> u8 {
    match reviews {
        None => 0,
        Some(n) if n >= 500 => 20,
        Some(n) if n >= 200 => 18,
        Some(n) if n >= 100 => 15,
        Some(n) if n >= 50 => 12,
        Some(n) if n >= 20 => 8,
        Some(_) => 5,
    }
}

pub fn digital_presence_score(lead: &RawLead) -> u8 {
    let mut score = 0u8;
    if lead.has_website() {
        score += 12;
    }
    if lead.has_whatsapp() {
        score += 10;
    }
    if lead.has_instagram() {
        score += 8;
    }
    score.min(30)
}

pub fn is_high_value_category(category: &str) -> bool {
    let lowered = category.to_lowercase();
    HIGH_VALUE_CATEGORIES.iter().any(|c| lowered.contains(c))
}

pub fn category_score(category: &str) -> u8 {
    if is_high_value_category(category) {
        15
    } else {
        8
    }
}

pub fn location_score(lead: &RawLead) -> u8 {
    if lead.has_neighborhood() {
        10
    } else {
        5
    }
}

pub fn score_breakdown(lead: &RawLead) -> ScoreBreakdown {
    ScoreBreakdown {
        rating: rating_score(lead.rating),
        reviews: review_score(lead.review_count),
        digital_presence: digital_presence_score(lead),
        category: category_score(&lead.category),
        location: location_score(lead),
    }
}

/// Total score for one lead, always within `0..=100`.
pub fn calculate_score(lead: &RawLead) -> u8 {
    score_breakdown(lead).total()
}

pub fn classify_temperature(score: u8) -> Temperature {
    if score >= HOT_THRESHOLD {
        Temperature::Hot
    } else if score >= WARM_THRESHOLD {
        Temperature::Warm
    } else {
        Temperature::Cold
    }
}

/// Conversion probability, clamped to `0..=100`.
pub fn conversion_probability(lead: &RawLead, score: u8) -> u8 {
    let mut probability = i32::from(score);

    let strong_reputation = lead.rating.is_some_and(|r| r >= 4.5)
        && lead.review_count.is_some_and(|n| n >= 100);
    if strong_reputation {
        probability += 10;
    }
    if !lead.has_digital_presence() {
        probability -= 15;
    }
    if lead.has_whatsapp() {
        probability += 5;
    }

    probability.clamp(0, 100) as u8
}

pub fn quality_flags(lead: &RawLead) -> QualityFlags {
    QualityFlags {
        digital_presence: lead.has_digital_presence(),
        high_rating: lead.rating.is_some_and(|r| r >= 4.5),
        good_review_volume: lead.review_count.is_some_and(|n| n >= 100),
        has_whatsapp: lead.has_whatsapp(),
        has_website: lead.has_website(),
        has_instagram: lead.has_instagram(),
    }
}

/// Scores and classifies a single lead. `priority_rank` is left unset.
pub fn qualify_lead(lead: &RawLead) -> QualifiedLead {
    let score = calculate_score(lead);
    QualifiedLead {
        lead: lead.clone(),
        score,
        temperature: classify_temperature(score),
        quality: quality_flags(lead),
        conversion_probability: conversion_probability(lead, score),
        priority_rank: None,
    }
}

/// Qualifies a batch: score every lead, sort by score descending and assign
/// ranks `1..=n`. The sort is stable, so equal scores keep input order.
pub fn qualify_leads(leads: &[RawLead]) -> Vec<QualifiedLead> {
    let mut qualified: Vec<QualifiedLead> = leads.iter().map(qualify_lead).collect();
    qualified.sort_by(|a, b| b.score.cmp(&a.score));
    for (idx, lead) in qualified.iter_mut().enumerate() {
        lead.priority_rank = Some(idx + 1);
    }

    tracing::debug!("Qualified {} leads", qualified.len());
    qualified
}

pub fn temperature_breakdown(leads: &[QualifiedLead]) -> TemperatureBreakdown {
    leads
        .iter()
        .fold(TemperatureBreakdown::default(), |mut acc, lead| {
            match lead.temperature {
                Temperature::Hot => acc.hot += 1,
                Temperature::Warm => acc.warm += 1,
                Temperature::Cold => acc.cold += 1,
            }
            acc
        })
}

pub fn compute_stats(leads: &[QualifiedLead]) -> LeadStats {
    let total = leads.len();
    let average_score = if total == 0 {
        0.0
    } else {
        leads.iter().map(|l| f64::from(l.score)).sum::<f64>() / total as f64
    };

    LeadStats {
        total,
        breakdown: temperature_breakdown(leads),
        with_website: leads.iter().filter(|l| l.quality.has_website).count(),
        with_whatsapp: leads.iter().filter(|l| l.quality.has_whatsapp).count(),
        with_instagram: leads.iter().filter(|l| l.quality.has_instagram).count(),
        average_score,
        top_score: leads.iter().map(|l| l.score).max().unwrap_or(0),
    }
}
