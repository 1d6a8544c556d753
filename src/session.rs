//! Per-session memory of ingested batches and what was derived from them.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    ExtractionSummary, LeadStats, MarketAnalysis, QualifiedLead, RawLead, SessionSnapshot,
    SummaryComparison,
};
use crate::scoring::{compute_stats, qualify_leads};

/// How many leads an `ExtractionSummary` carries.
pub const SUMMARY_TOP_LEADS: usize = 10;

/// Context the dispatcher reads and updates between requests.
///
/// Grows for the lifetime of the session; `reset` is the only way to shrink it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub current_leads: Vec<RawLead>,
    pub qualified_leads: Vec<QualifiedLead>,
    pub extraction_history: Vec<ExtractionSummary>,
    pub last_extraction: Option<ExtractionSummary>,
    pub market_analyses: Vec<MarketAnalysis>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once any batch, even an empty one, has been ingested.
    pub fn has_ingested(&self) -> bool {
        !self.extraction_history.is_empty()
    }

    pub fn stats(&self) -> LeadStats {
        compute_stats(&self.qualified_leads)
    }

    /// Qualifies a new batch, records its summary and makes it current.
    pub fn ingest(&mut self, leads: Vec<RawLead>) -> ExtractionSummary {
        let qualified = qualify_leads(&leads);
        let stats = compute_stats(&qualified);

        let comparison_with_previous = self.last_extraction.as_ref().map(|prev| SummaryComparison {
            previous_id: prev.id,
            total_delta: stats.total as i64 - prev.total_leads as i64,
            top_score_delta: i64::from(stats.top_score) - i64::from(prev.top_score),
        });

        let mut insights = summary_insights(&stats);
        if let Some(cmp) = &comparison_with_previous {
            insights.push(format!(
                "Comparado à extração anterior: {:+} leads, score máximo {:+}",
                cmp.total_delta, cmp.top_score_delta
            ));
        }

        let summary = ExtractionSummary {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            total_leads: stats.total,
            qualified_leads: stats.breakdown,
            top_score: stats.top_score,
            top_leads: qualified.iter().take(SUMMARY_TOP_LEADS).cloned().collect(),
            insights,
            next_actions: next_actions(),
            comparison_with_previous,
        };

        tracing::info!(
            "Ingested {} leads ({} hot, {} warm, {} cold)",
            summary.total_leads,
            summary.qualified_leads.hot,
            summary.qualified_leads.warm,
            summary.qualified_leads.cold
        );

        self.current_leads = leads;
        self.qualified_leads = qualified;
        self.extraction_history.push(summary.clone());
        self.last_extraction = Some(summary.clone());

        summary
    }

    /// Looks up a past summary by id, newest first.
    pub fn extraction(&self, id: Uuid) -> Option<&ExtractionSummary> {
        self.extraction_history.iter().rev().find(|s| s.id == id)
    }

    pub fn reset(&mut self) {
        tracing::info!(
            "Resetting session ({} extractions discarded)",
            self.extraction_history.len()
        );
        *self = Self::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_leads: self.current_leads.len(),
            qualified_leads: self.qualified_leads.len(),
            extractions: self.extraction_history.len(),
            last_extraction: self.last_extraction.clone(),
            market_analyses: self.market_analyses.clone(),
        }
    }
}

fn share(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as u32
    }
}

fn summary_insights(stats: &LeadStats) -> Vec<String> {
    let b = stats.breakdown;
    vec![
        format!(
            "{} leads extraídos: {} quentes, {} mornos e {} frios",
            stats.total, b.hot, b.warm, b.cold
        ),
        format!(
            "{}% dos leads são quentes e prontos para abordagem",
            share(b.hot, stats.total)
        ),
        format!(
            "Score médio de {:.1} (máximo {})",
            stats.average_score, stats.top_score
        ),
        format!(
            "{} leads sem site: oportunidade direta de venda",
            stats.total - stats.with_website
        ),
        format!(
            "{} leads com WhatsApp ({}%) podem ser abordados hoje",
            stats.with_whatsapp,
            share(stats.with_whatsapp, stats.total)
        ),
    ]
}

fn next_actions() -> Vec<String> {
    vec![
        "Abordar primeiro os leads quentes pelo WhatsApp".to_string(),
        "Gerar roteiros personalizados para os 10 melhores leads".to_string(),
        "Analisar a concorrência por cidade antes de expandir".to_string(),
    ]
}
