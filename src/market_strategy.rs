//! Regional market analysis over a lead collection.
//!
//! All functions accept any slice whose items expose a `RawLead`
//! (raw or qualified leads alike).

use crate::models::{
    CategorySaturation, CategoryShare, CityOpportunity, CompetitionDensity, MarketAnalysis,
    RawLead, SaturationLevel,
};

const TOP_CATEGORY_LIMIT: usize = 10;
const WEBSITE_GAP_THRESHOLD: f64 = 50.0;
const WHATSAPP_GAP_THRESHOLD: f64 = 60.0;
const LOW_RATING_THRESHOLD: f64 = 4.0;

pub fn competition_density(lead_count: usize) -> CompetitionDensity {
    match lead_count {
        n if n >= 50 => CompetitionDensity::Saturated,
        n if n >= 30 => CompetitionDensity::High,
        n if n >= 15 => CompetitionDensity::Medium,
        _ => CompetitionDensity::Low,
    }
}

fn raw<L: AsRef<RawLead>>(lead: &L) -> &RawLead {
    lead.as_ref()
}

/// Exact match against the city or the neighborhood.
fn in_region(lead: &RawLead, region: &str) -> bool {
    lead.city == region || lead.neighborhood.as_deref() == Some(region)
}

/// Mean over the present values only; `0.0` when none is present.
fn mean_of_present(values: impl Iterator<Item = Option<f64>>) -> (f64, usize) {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        (0.0, 0)
    } else {
        (sum / count as f64, count)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Group-count by exact category, descending by count. Equal counts keep
/// first-seen order.
fn count_categories<'a>(leads: impl Iterator<Item = &'a RawLead>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for lead in leads {
        match counts.iter_mut().find(|(c, _)| *c == lead.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((lead.category.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn analyze_market_by_region<L: AsRef<RawLead>>(leads: &[L], region: &str) -> MarketAnalysis {
    let regional: Vec<&RawLead> = leads
        .iter()
        .map(raw)
        .filter(|l| in_region(l, region))
        .collect();
    let total = regional.len();
    let density = competition_density(total);

    let (average_rating, rated) = mean_of_present(regional.iter().map(|l| l.rating));
    let (average_reviews, _) =
        mean_of_present(regional.iter().map(|l| l.review_count.map(f64::from)));

    let top_categories: Vec<CategoryShare> = count_categories(regional.iter().copied())
        .into_iter()
        .take(TOP_CATEGORY_LIMIT)
        .map(|(category, count)| CategoryShare {
            category,
            count,
            percentage: percent(count, total).round() as u32,
        })
        .collect();

    let mut opportunities = Vec::new();
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();

    if total == 0 {
        warnings.push(format!("Nenhum lead encontrado para a região {}", region));
    }

    match density {
        CompetitionDensity::Low => {
            if total > 0 {
                opportunities.push(format!(
                    "Baixa concorrência em {}: espaço para se posicionar como referência",
                    region
                ));
            }
        }
        CompetitionDensity::Medium => {
            recommendations.push(
                "Concorrência moderada: diferencie a oferta por nicho ou qualidade de atendimento"
                    .to_string(),
            );
        }
        CompetitionDensity::High => {
            warnings.push(format!(
                "Alta concorrência em {}: a proposta de valor precisa ser muito clara",
                region
            ));
            recommendations
                .push("Foque nos leads quentes e em categorias menos exploradas".to_string());
        }
        CompetitionDensity::Saturated => {
            warnings.push(format!(
                "Mercado saturado em {} ({} negócios mapeados)",
                region, total
            ));
            recommendations.push(
                "Evite entrada direta: explore bairros vizinhos ou nichos específicos".to_string(),
            );
        }
    }

    if rated > 0 && average_rating < LOW_RATING_THRESHOLD {
        opportunities.push(format!(
            "Avaliação média baixa ({:.1}): ofereça gestão de reputação e atendimento",
            average_rating
        ));
        recommendations
            .push("Use a melhoria de avaliações como argumento principal de venda".to_string());
    }

    let without_website = percent(regional.iter().filter(|l| !l.has_website()).count(), total);
    if without_website > WEBSITE_GAP_THRESHOLD {
        opportunities.push(format!(
            "{:.0}% dos negócios não têm site: alta demanda por presença digital",
            without_website
        ));
        recommendations.push("Priorize a oferta de site profissional".to_string());
    }

    let without_whatsapp = percent(regional.iter().filter(|l| !l.has_whatsapp()).count(), total);
    if without_whatsapp > WHATSAPP_GAP_THRESHOLD {
        opportunities.push(format!(
            "{:.0}% dos negócios não usam WhatsApp: ofereça automação de atendimento",
            without_whatsapp
        ));
    }

    if recommendations.is_empty() {
        recommendations.push("Mantenha a prospecção priorizando os leads quentes".to_string());
    }

    tracing::debug!(
        "Market analysis for '{}': {} leads, density {:?}",
        region,
        total,
        density
    );

    MarketAnalysis {
        region: region.to_string(),
        total_leads: total,
        competition_density: density,
        average_rating,
        average_reviews,
        top_categories,
        opportunities,
        warnings,
        recommendations,
    }
}

fn density_points(density: CompetitionDensity) -> u32 {
    match density {
        CompetitionDensity::Low => 40,
        CompetitionDensity::Medium => 30,
        CompetitionDensity::High => 20,
        CompetitionDensity::Saturated => 10,
    }
}

/// Ranks distinct cities by a weighted opportunity score and returns the best
/// `top_n`. Equal scores keep first-seen city order.
pub fn rank_cities_by_opportunity<L: AsRef<RawLead>>(
    leads: &[L],
    top_n: usize,
) -> Vec<CityOpportunity> {
    let mut cities: Vec<&str> = Vec::new();
    for lead in leads.iter().map(raw) {
        let city = lead.city.as_str();
        if !city.trim().is_empty() && !cities.contains(&city) {
            cities.push(city);
        }
    }

    let mut ranked: Vec<CityOpportunity> = cities
        .into_iter()
        .map(|city| {
            let analysis = analyze_market_by_region(leads, city);
            let mut score = density_points(analysis.competition_density);
            let mut reasoning = vec![format!(
                "Concorrência {} ({} negócios)",
                analysis.competition_density.label(),
                analysis.total_leads
            )];

            let has_ratings = leads
                .iter()
                .map(raw)
                .any(|l| in_region(l, city) && l.rating.is_some());
            if has_ratings && analysis.average_rating < LOW_RATING_THRESHOLD {
                score += 20;
                reasoning.push(format!(
                    "Avaliação média baixa ({:.1}) abre espaço para melhoria",
                    analysis.average_rating
                ));
            }

            let regional: Vec<&RawLead> = leads
                .iter()
                .map(raw)
                .filter(|l| in_region(l, city))
                .collect();
            let website_gap = percent(
                regional.iter().filter(|l| !l.has_website()).count(),
                regional.len(),
            );
            if website_gap > WEBSITE_GAP_THRESHOLD {
                score += 25;
                reasoning.push(format!("{:.0}% sem site próprio", website_gap));
            }

            if analysis.total_leads > 20 {
                score += 15;
                reasoning.push("Volume de leads suficiente para campanha".to_string());
            }

            CityOpportunity {
                city: city.to_string(),
                score,
                lead_count: analysis.total_leads,
                competition_density: analysis.competition_density,
                reasoning,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(top_n);
    ranked
}

/// Buckets every category into a saturation tier, most crowded first.
pub fn analyze_category_saturation<L: AsRef<RawLead>>(leads: &[L]) -> Vec<CategorySaturation> {
    count_categories(leads.iter().map(raw))
        .into_iter()
        .map(|(category, count)| {
            let (level, recommendation) = match count {
                n if n >= 30 => (
                    SaturationLevel::High,
                    "Evite entrada direta: categoria saturada",
                ),
                n if n >= 15 => (
                    SaturationLevel::Medium,
                    "Entre com diferenciação clara de oferta",
                ),
                _ => (
                    SaturationLevel::Low,
                    "Melhor oportunidade de entrada: pouca concorrência",
                ),
            };
            CategorySaturation {
                category,
                count,
                level,
                recommendation: recommendation.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_buckets() {
        assert_eq!(competition_density(0), CompetitionDensity::Low);
        assert_eq!(competition_density(14), CompetitionDensity::Low);
        assert_eq!(competition_density(15), CompetitionDensity::Medium);
        assert_eq!(competition_density(30), CompetitionDensity::High);
        assert_eq!(competition_density(50), CompetitionDensity::Saturated);
    }

    #[test]
    fn averages_skip_missing_values() {
        let leads = vec![
            RawLead::new("1", "A", "Bar", "Recife").with_rating(4.0),
            RawLead::new("2", "B", "Bar", "Recife").with_rating(5.0).with_reviews(10),
            RawLead::new("3", "C", "Bar", "Recife"),
        ];
        let analysis = analyze_market_by_region(&leads, "Recife");
        assert_eq!(analysis.average_rating, 4.5);
        assert_eq!(analysis.average_reviews, 10.0);
    }

    #[test]
    fn region_matches_neighborhood_exactly() {
        let leads = vec![
            RawLead::new("1", "A", "Bar", "Recife").with_neighborhood("Boa Viagem"),
            RawLead::new("2", "B", "Bar", "Recife").with_neighborhood("boa viagem"),
        ];
        assert_eq!(analyze_market_by_region(&leads, "Boa Viagem").total_leads, 1);
        assert_eq!(analyze_market_by_region(&leads, "Recif").total_leads, 0);
    }

    #[test]
    fn empty_region_warns() {
        let leads: Vec<RawLead> = Vec::new();
        let analysis = analyze_market_by_region(&leads, "Natal");
        assert_eq!(analysis.total_leads, 0);
        assert!(analysis.top_categories.is_empty());
        assert!(analysis.warnings[0].contains("Natal"));
    }

    #[test]
    fn saturation_tiers() {
        let mut leads = Vec::new();
        for i in 0..30 {
            leads.push(RawLead::new(i.to_string(), "X", "Pizzaria", "A"));
        }
        for i in 0..15 {
            leads.push(RawLead::new(format!("b{}", i), "Y", "Academia", "A"));
        }
        leads.push(RawLead::new("c", "Z", "Floricultura", "A"));

        let tiers = analyze_category_saturation(&leads);
        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[0].level, SaturationLevel::High);
        assert_eq!(tiers[1].level, SaturationLevel::Medium);
        assert_eq!(tiers[2].level, SaturationLevel::Low);
        assert_eq!(tiers[2].category, "Floricultura");
    }
}
