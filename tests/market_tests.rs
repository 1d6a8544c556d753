/// Tests for regional market analysis, city ranking and category saturation
use leadmaps_api::market_strategy::{
    analyze_category_saturation, analyze_market_by_region, rank_cities_by_opportunity,
};
use leadmaps_api::models::{CompetitionDensity, RawLead};
use leadmaps_api::scoring::qualify_leads;

fn fixture() -> Vec<RawLead> {
    vec![
        RawLead::new("1", "Pizza Roma", "Pizzaria", "São Paulo").with_rating(4.6),
        RawLead::new("2", "Forno Bravo", "Pizzaria", "São Paulo").with_rating(3.9),
        RawLead::new("3", "Pizza Nostra", "Pizzaria", "São Paulo"),
        RawLead::new("4", "Academia Fit", "Academia", "Campinas"),
        RawLead::new("5", "Pet Feliz", "Pet Shop", "Santos"),
    ]
}

#[test]
fn region_analysis_counts_only_matching_leads() {
    let analysis = analyze_market_by_region(&fixture(), "São Paulo");

    assert_eq!(analysis.total_leads, 3);
    assert_eq!(analysis.competition_density, CompetitionDensity::Low);
    assert_eq!(analysis.top_categories.len(), 1);
    assert_eq!(analysis.top_categories[0].category, "Pizzaria");
    assert_eq!(analysis.top_categories[0].count, 3);
    assert_eq!(analysis.top_categories[0].percentage, 100);
    assert!((analysis.average_rating - 4.25).abs() < 1e-9);
}

#[test]
fn region_analysis_accepts_qualified_leads() {
    let qualified = qualify_leads(&fixture());
    let analysis = analyze_market_by_region(&qualified, "São Paulo");
    assert_eq!(analysis.total_leads, 3);
}

#[test]
fn digital_gaps_become_opportunities() {
    let analysis = analyze_market_by_region(&fixture(), "São Paulo");
    assert!(analysis.opportunities.iter().any(|o| o.contains("não têm site")));
    assert!(analysis.opportunities.iter().any(|o| o.contains("WhatsApp")));
    assert!(!analysis.recommendations.is_empty());
}

#[test]
fn saturated_region_warns() {
    let leads: Vec<RawLead> = (0..50)
        .map(|i| {
            RawLead::new(i.to_string(), "Bar", "Bar", "Rio de Janeiro")
                .with_website("https://bar.com")
                .with_whatsapp("21987654321")
        })
        .collect();
    let analysis = analyze_market_by_region(&leads, "Rio de Janeiro");
    assert_eq!(analysis.competition_density, CompetitionDensity::Saturated);
    assert!(analysis.warnings.iter().any(|w| w.contains("saturado")));
    assert!(analysis.opportunities.is_empty());
}

#[test]
fn top_categories_are_capped_at_ten() {
    let leads: Vec<RawLead> = (0..12)
        .map(|i| RawLead::new(i.to_string(), "X", format!("Categoria {}", i), "Recife"))
        .collect();
    let analysis = analyze_market_by_region(&leads, "Recife");
    assert_eq!(analysis.top_categories.len(), 10);
    assert_eq!(analysis.top_categories[0].percentage, 8);
}

#[test]
fn city_ranking_rewards_gaps_and_volume() {
    let mut leads: Vec<RawLead> = (0..21)
        .map(|i| RawLead::new(format!("c{}", i), "Loja", "Loja", "Curitiba").with_rating(3.5))
        .collect();
    leads.push(
        RawLead::new("f1", "Loja", "Loja", "Florianópolis")
            .with_rating(4.8)
            .with_website("https://loja.com"),
    );

    let ranked = rank_cities_by_opportunity(&leads, 5);
    assert_eq!(ranked.len(), 2);
    // Curitiba: medium (30) + low rating (20) + no sites (25) + volume (15)
    assert_eq!(ranked[0].city, "Curitiba");
    assert_eq!(ranked[0].score, 90);
    assert_eq!(ranked[0].reasoning.len(), 4);
    // Florianópolis: low density only
    assert_eq!(ranked[1].city, "Florianópolis");
    assert_eq!(ranked[1].score, 40);
}

#[test]
fn city_ranking_respects_limit_and_tie_order() {
    let ranked = rank_cities_by_opportunity(&fixture(), 2);
    assert_eq!(ranked.len(), 2);
    // All three cities tie on low density plus missing sites; first seen wins.
    assert_eq!(ranked[0].city, "São Paulo");
    assert_eq!(ranked[1].city, "Campinas");
}

#[test]
fn saturation_lists_every_category() {
    let tiers = analyze_category_saturation(&fixture());
    assert_eq!(tiers.len(), 3);
    assert_eq!(tiers[0].category, "Pizzaria");
    assert!(tiers
        .iter()
        .all(|t| t.recommendation.contains("Melhor oportunidade")));
}
