/// Property-based tests using proptest
/// Tests invariants of scoring, classification and batch qualification
use leadmaps_api::models::{RawLead, Temperature};
use leadmaps_api::scoring::{
    calculate_score, classify_temperature, conversion_probability, qualify_leads,
    score_breakdown,
};
use proptest::prelude::*;

fn optional_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("  ".to_string())),
        "[a-z0-9@./:]{1,20}".prop_map(Some),
    ]
}

prop_compose! {
    fn arb_lead()(
        id in "[a-z0-9]{1,8}",
        category in prop::sample::select(vec![
            "Pizzaria", "Restaurante Japonês", "Loja de Roupas", "Academia", "Oficina", "ACADEMIA CROSSFIT", "",
        ]),
        neighborhood in optional_text(),
        website in optional_text(),
        whatsapp in optional_text(),
        instagram in optional_text(),
        rating in prop::option::of(0.0f64..=5.0),
        reviews in prop::option::of(0u32..5000),
    ) -> RawLead {
        let mut lead = RawLead::new(id, "Negócio", category, "Campinas");
        lead.neighborhood = neighborhood;
        lead.website = website;
        lead.whatsapp = whatsapp;
        lead.instagram = instagram;
        lead.rating = rating;
        lead.review_count = reviews;
        lead
    }
}

proptest! {
    #[test]
    fn score_is_bounded_sum_of_sub_scores(lead in arb_lead()) {
        let b = score_breakdown(&lead);
        prop_assert!(b.rating <= 25);
        prop_assert!(b.reviews <= 20);
        prop_assert!(b.digital_presence <= 30);
        prop_assert!(b.category == 8 || b.category == 15);
        prop_assert!(b.location == 5 || b.location == 10);

        let score = calculate_score(&lead);
        prop_assert_eq!(u32::from(score),
            u32::from(b.rating) + u32::from(b.reviews) + u32::from(b.digital_presence)
                + u32::from(b.category) + u32::from(b.location));
        prop_assert!(score <= 100);
    }

    #[test]
    fn scoring_is_deterministic(lead in arb_lead()) {
        prop_assert_eq!(calculate_score(&lead), calculate_score(&lead.clone()));
    }

    #[test]
    fn conversion_probability_is_clamped(lead in arb_lead(), score in 0u8..=100) {
        let p = conversion_probability(&lead, score);
        prop_assert!(p <= 100);
    }

    #[test]
    fn temperature_depends_only_on_score(score in 0u8..=100) {
        let expected = if score >= 70 {
            Temperature::Hot
        } else if score >= 45 {
            Temperature::Warm
        } else {
            Temperature::Cold
        };
        prop_assert_eq!(classify_temperature(score), expected);
    }

    #[test]
    fn top_reputation_always_adds_45(lead in arb_lead(), rating in 4.5f64..=5.0, reviews in 500u32..10_000) {
        let mut lead = lead;
        lead.rating = Some(rating);
        lead.review_count = Some(reviews);
        let b = score_breakdown(&lead);
        prop_assert_eq!(b.rating + b.reviews, 45);
    }

    #[test]
    fn qualification_preserves_length_and_ranks(leads in prop::collection::vec(arb_lead(), 0..40)) {
        let qualified = qualify_leads(&leads);
        prop_assert_eq!(qualified.len(), leads.len());

        for (idx, lead) in qualified.iter().enumerate() {
            prop_assert_eq!(lead.priority_rank, Some(idx + 1));
        }
        for pair in qualified.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn requalifying_sorted_output_keeps_order(leads in prop::collection::vec(arb_lead(), 0..40)) {
        let first = qualify_leads(&leads);
        let raw: Vec<RawLead> = first.iter().map(|q| q.lead.clone()).collect();
        let second = qualify_leads(&raw);

        let first_ids: Vec<&str> = first.iter().map(|q| q.lead.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|q| q.lead.id.as_str()).collect();
        prop_assert_eq!(first_ids, second_ids);
    }
}
