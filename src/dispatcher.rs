//! Routes free-text assistant requests to a pipeline stage and hands the
//! result to the completion service for the final prose.

use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::completion_client::CompletionClient;
use crate::contacts::normalize_instagram;
use crate::copywriting::generate_top_scripts;
use crate::market_strategy::{analyze_market_by_region, rank_cities_by_opportunity};
use crate::models::{
    AssistantResponse, Channel, ChatMessage, QualifiedLead, RequestCategory, Temperature,
};
use crate::session::SessionContext;

pub const STANDBY_MESSAGE: &str = "Olá! Sou o assistente do LeadMaps. Ainda não recebi nenhuma extração de leads.\n\n\
Assim que você extrair leads eu posso:\n\
- Qualificar e priorizar os leads por temperatura (quente, morno, frio)\n\
- Criar roteiros de abordagem para WhatsApp, ligação e e-mail\n\
- Filtrar leads por categoria, contato ou temperatura\n\
- Analisar a concorrência e indicar as melhores cidades\n\
- Resumir e comparar extrações\n\n\
Faça uma extração e me diga como posso ajudar!";

const INSTRUCTION_TEMPLATE: &str = "Você é o assistente comercial do LeadMaps, especialista em prospecção de pequenos negócios locais no Brasil.\n\
Responda sempre em português, de forma objetiva e prática, usando apenas os dados abaixo.\n\
Não invente leads, números ou contatos que não aparecem no contexto.\n\n\
{context}";

const QUALIFICATION_LIMIT: usize = 20;
const SCRIPT_LIMIT: usize = 10;
const CITY_LIMIT: usize = 5;
const CONTEXT_TOP_LEADS: usize = 5;

/// Keyword sets in priority order; the first set with a hit wins.
const ROUTES: &[(RequestCategory, &[&str])] = &[
    (
        RequestCategory::Qualification,
        &["qualifi", "classifi", "pontua", "score", "temperatura", "priorid", "melhores leads"],
    ),
    (
        RequestCategory::Copywriting,
        &["script", "roteiro", "mensage", "copy", "abordage", "pitch", "texto"],
    ),
    (
        RequestCategory::Filtering,
        &["separe", "filtr", "apenas", "somente", "só ", "mostre só", "liste só"],
    ),
    (
        RequestCategory::MarketStrategy,
        &["mercado", "regiã", "regiao", "cidade", "concorr", "satura", "estratégi", "estrategi", "expandir"],
    ),
    (
        RequestCategory::Summary,
        &["resumo", "resuma", "sumário", "sumario", "relatório", "relatorio", "visão geral"],
    ),
    (
        RequestCategory::Comparison,
        &["compar", "anterior", "evoluç", "evoluc", "diferença"],
    ),
];

pub fn classify_request(text: &str) -> RequestCategory {
    let lowered = text.to_lowercase();
    ROUTES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(RequestCategory::General)
}

/// Constraints extracted from a filtering request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub whatsapp: Option<bool>,
    pub website: Option<bool>,
    pub instagram: Option<bool>,
    pub temperature: Option<Temperature>,
    /// Lowercased category stem, matched as a substring.
    pub category: Option<String>,
}

fn category_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:apenas|somente|só)\s+(?:as\s+|os\s+|leads\s+de\s+)?([\p{L}-]+)")
            .expect("category pattern is valid")
    })
}

/// Words that may follow "apenas" without naming a category.
const NON_CATEGORY_WORDS: &[&str] = &[
    "leads", "lead", "com", "sem", "quentes", "quente", "mornos", "morno", "frios", "frio", "os",
    "as", "que", "de",
];

/// Word patterns for WhatsApp, website and Instagram, in that order.
const CONTACT_PATTERNS: [&str; 3] = [r"whats(?:app)?|zap", r"(?:web)?sites?", r"insta(?:gram)?"];

/// (negated, mentioned) regex pair per contact pattern.
fn contact_regexes() -> &'static [(Regex, Regex)] {
    static RE: OnceLock<Vec<(Regex, Regex)>> = OnceLock::new();
    RE.get_or_init(|| {
        CONTACT_PATTERNS
            .iter()
            .map(|pattern| {
                (
                    Regex::new(&format!(r"\bsem\s+(?:\w+\s+)?(?:{})\b", pattern))
                        .expect("negated contact pattern is valid"),
                    Regex::new(&format!(r"\b(?:{})\b", pattern))
                        .expect("contact pattern is valid"),
                )
            })
            .collect()
    })
}

/// `Some(false)` for "sem site" / "sem o website", `Some(true)` when the
/// contact is mentioned otherwise, `None` when it is not mentioned.
fn presence(text: &str, index: usize) -> Option<bool> {
    let (negated, mentioned) = &contact_regexes()[index];
    if negated.is_match(text) {
        Some(false)
    } else if mentioned.is_match(text) {
        Some(true)
    } else {
        None
    }
}

impl LeadFilter {
    pub fn parse(text: &str) -> Self {
        let lowered = text.to_lowercase();

        let temperature = if lowered.contains("quente") {
            Some(Temperature::Hot)
        } else if lowered.contains("morno") || lowered.contains("morna") {
            Some(Temperature::Warm)
        } else if lowered.contains("frio") || lowered.contains("fria") {
            Some(Temperature::Cold)
        } else {
            None
        };

        let category = category_regex()
            .captures(&lowered)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|word| !NON_CATEGORY_WORDS.contains(word))
            .map(|word| {
                if word.len() > 3 {
                    word.strip_suffix('s').unwrap_or(word).to_string()
                } else {
                    word.to_string()
                }
            });

        Self {
            whatsapp: presence(&lowered, 0),
            website: presence(&lowered, 1),
            instagram: presence(&lowered, 2),
            temperature,
            category,
        }
    }

    pub fn matches(&self, lead: &QualifiedLead) -> bool {
        self.whatsapp.map_or(true, |want| lead.quality.has_whatsapp == want)
            && self.website.map_or(true, |want| lead.quality.has_website == want)
            && self.instagram.map_or(true, |want| lead.quality.has_instagram == want)
            && self.temperature.map_or(true, |t| lead.temperature == t)
            && self
                .category
                .as_deref()
                .map_or(true, |c| lead.lead.category.to_lowercase().contains(c))
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(c) = &self.category {
            parts.push(format!("categoria contendo \"{}\"", c));
        }
        for (label, flag) in [
            ("WhatsApp", self.whatsapp),
            ("site", self.website),
            ("Instagram", self.instagram),
        ] {
            match flag {
                Some(true) => parts.push(format!("com {}", label)),
                Some(false) => parts.push(format!("sem {}", label)),
                None => {}
            }
        }
        if let Some(t) = self.temperature {
            parts.push(format!("temperatura {}", t.label()));
        }
        if parts.is_empty() {
            "sem critérios reconhecidos".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Runs the stage for `category` over the current context.
fn run_stage(ctx: &mut SessionContext, category: RequestCategory, text: &str) -> AssistantResponse {
    let mut out = AssistantResponse::empty(category);
    let stats = ctx.stats();

    match category {
        RequestCategory::Qualification => {
            out.leads = ctx
                .qualified_leads
                .iter()
                .take(QUALIFICATION_LIMIT)
                .cloned()
                .collect();
            out.insights = vec![
                format!(
                    "{} leads quentes prontos para abordagem imediata",
                    stats.breakdown.hot
                ),
                format!(
                    "{} leads mornos para nutrir com conteúdo e follow-up",
                    stats.breakdown.warm
                ),
                format!(
                    "{} leads frios com baixa prioridade no momento",
                    stats.breakdown.cold
                ),
            ];
        }
        RequestCategory::Copywriting => {
            out.scripts = generate_top_scripts(&ctx.qualified_leads, Channel::Chat, SCRIPT_LIMIT);
            out.recommendations = vec![
                "Personalize a saudação com o nome do responsável antes de enviar".to_string(),
                "Envie as mensagens em horário comercial, de preferência entre 9h e 11h"
                    .to_string(),
            ];
        }
        RequestCategory::Filtering => {
            let filter = LeadFilter::parse(text);
            out.leads = ctx
                .qualified_leads
                .iter()
                .filter(|l| filter.matches(l))
                .cloned()
                .collect();
            out.insights = vec![format!(
                "{} de {} leads atendem ao filtro ({})",
                out.leads.len(),
                stats.total,
                filter.describe()
            )];
            if !out.leads.is_empty() {
                out.recommendations
                    .push("Peça roteiros de abordagem para os leads filtrados".to_string());
            }
        }
        RequestCategory::MarketStrategy => {
            out.opportunities = rank_cities_by_opportunity(&ctx.current_leads, CITY_LIMIT);
            let mut analyses = Vec::with_capacity(out.opportunities.len());
            for city in &out.opportunities {
                out.insights.push(format!(
                    "{}: {} pontos. {}",
                    city.city,
                    city.score,
                    city.reasoning.join("; ")
                ));
                analyses.push(analyze_market_by_region(&ctx.current_leads, &city.city));
            }
            // Ranked order: the first analysis belongs to the best city.
            match (out.opportunities.first(), analyses.first()) {
                (Some(best), Some(analysis)) => {
                    out.recommendations
                        .push(format!("Comece a prospecção por {}", best.city));
                    out.recommendations
                        .extend(analysis.recommendations.iter().cloned());
                }
                _ => out
                    .insights
                    .push("Nenhuma cidade identificada nos leads atuais".to_string()),
            }
            ctx.market_analyses.extend(analyses);
        }
        RequestCategory::Summary => {
            if let Some(summary) = &ctx.last_extraction {
                out.insights = summary.insights.clone();
                out.recommendations = summary.next_actions.clone();
                out.summary = Some(summary.clone());
            }
        }
        RequestCategory::Comparison => {
            match ctx
                .last_extraction
                .as_ref()
                .and_then(|s| s.comparison_with_previous.as_ref())
            {
                Some(cmp) => out.insights = vec![
                    format!("Variação no total de leads: {:+}", cmp.total_delta),
                    format!("Variação no score máximo: {:+}", cmp.top_score_delta),
                ],
                None => out
                    .insights
                    .push("Ainda não há extração anterior para comparar".to_string()),
            }
            out.summary = ctx.last_extraction.clone();
        }
        RequestCategory::General => {
            out.insights = vec![format!(
                "{} leads na sessão, score médio {:.1}",
                stats.total, stats.average_score
            )];
        }
    }

    out
}

/// Textual description of the current statistics, the top leads and the
/// stage result, embedded into the completion instruction.
pub fn build_context_dump(ctx: &SessionContext, stage: &AssistantResponse) -> String {
    let stats = ctx.stats();
    let mut dump = String::new();

    let _ = writeln!(dump, "ESTATÍSTICAS ATUAIS:");
    let _ = writeln!(dump, "- Total de leads: {}", stats.total);
    let _ = writeln!(
        dump,
        "- Quentes: {} | Mornos: {} | Frios: {}",
        stats.breakdown.hot, stats.breakdown.warm, stats.breakdown.cold
    );
    let _ = writeln!(
        dump,
        "- Score médio: {:.1} (máximo {})",
        stats.average_score, stats.top_score
    );
    let _ = writeln!(
        dump,
        "- Com site: {} | Com WhatsApp: {} | Com Instagram: {}",
        stats.with_website, stats.with_whatsapp, stats.with_instagram
    );

    let _ = writeln!(dump, "\nTOP {} LEADS:", CONTEXT_TOP_LEADS);
    for (idx, lead) in ctx
        .qualified_leads
        .iter()
        .take(CONTEXT_TOP_LEADS)
        .enumerate()
    {
        let raw = &lead.lead;
        let rating = match (raw.rating, raw.review_count) {
            (Some(r), Some(n)) => format!("nota {} ({} avaliações)", r, n),
            (Some(r), None) => format!("nota {}", r),
            _ => "sem avaliação".to_string(),
        };
        let instagram = raw
            .instagram
            .as_deref()
            .and_then(normalize_instagram)
            .unwrap_or_else(|| "não".to_string());
        let _ = writeln!(
            dump,
            "{}. {} ({}, {}) - score {}, {}, {}, WhatsApp: {}, site: {}, Instagram: {}",
            idx + 1,
            raw.name,
            raw.category,
            raw.city,
            lead.score,
            lead.temperature.label(),
            rating,
            if lead.quality.has_whatsapp { "sim" } else { "não" },
            if lead.quality.has_website { "sim" } else { "não" },
            instagram
        );
    }

    let _ = writeln!(dump, "\nANÁLISE DESTA SOLICITAÇÃO ({:?}):", stage.category);
    for insight in &stage.insights {
        let _ = writeln!(dump, "- {}", insight);
    }
    for rec in &stage.recommendations {
        let _ = writeln!(dump, "- Recomendação: {}", rec);
    }

    dump
}

/// Answers a free-text request against the session.
///
/// Never fails: when the completion service is unavailable the returned
/// response has an empty `message` and the reason in `error`.
pub async fn respond(
    ctx: &mut SessionContext,
    client: &CompletionClient,
    message: &str,
    history: &[ChatMessage],
) -> AssistantResponse {
    if !ctx.has_ingested() {
        tracing::debug!("No extraction yet, answering with standby message");
        let mut standby = AssistantResponse::empty(RequestCategory::General);
        standby.message = STANDBY_MESSAGE.to_string();
        return standby;
    }

    let category = classify_request(message);
    tracing::info!("Assistant request routed to {:?}", category);

    let mut response = run_stage(ctx, category, message);
    let instruction = INSTRUCTION_TEMPLATE.replace("{context}", &build_context_dump(ctx, &response));

    match client.complete(&instruction, history, message).await {
        Ok(text) => response.message = text,
        Err(e) => {
            tracing::warn!("Assistant completion failed: {}", e);
            response.error = Some(e.to_string());
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_in_priority_order() {
        assert_eq!(
            classify_request("Qualifique os leads"),
            RequestCategory::Qualification
        );
        assert_eq!(
            classify_request("Crie um roteiro de ligação"),
            RequestCategory::Copywriting
        );
        assert_eq!(
            classify_request("Qual cidade tem menos concorrência?"),
            RequestCategory::MarketStrategy
        );
        assert_eq!(classify_request("Me dê um resumo"), RequestCategory::Summary);
        assert_eq!(
            classify_request("Compare com a extração anterior"),
            RequestCategory::Comparison
        );
        assert_eq!(classify_request("Oi, tudo bem?"), RequestCategory::General);
        // Qualification outranks filtering when both match.
        assert_eq!(
            classify_request("Separe os leads por temperatura"),
            RequestCategory::Qualification
        );
    }

    #[test]
    fn filter_parses_category_and_channels() {
        let filter = LeadFilter::parse("Separe apenas pizzarias com WhatsApp");
        assert_eq!(filter.category.as_deref(), Some("pizzaria"));
        assert_eq!(filter.whatsapp, Some(true));
        assert_eq!(filter.website, None);
        assert_eq!(filter.temperature, None);
    }

    #[test]
    fn filter_negation_allows_words_between() {
        let filter = LeadFilter::parse("Separe apenas pizzarias sem website");
        assert_eq!(filter.website, Some(false));
        assert_eq!(filter.category.as_deref(), Some("pizzaria"));

        assert_eq!(LeadFilter::parse("leads sem o site").website, Some(false));
        assert_eq!(LeadFilter::parse("quem está sem ter site").website, Some(false));
        assert_eq!(LeadFilter::parse("somente bares sem o WhatsApp").whatsapp, Some(false));
        assert_eq!(LeadFilter::parse("leads com website").website, Some(true));
    }

    #[test]
    fn filter_ignores_contact_words_inside_other_words() {
        let filter = LeadFilter::parse("separe os leads de instalação que visitem clientes");
        assert_eq!(filter.website, None);
        assert_eq!(filter.whatsapp, None);
        assert_eq!(filter.instagram, None);
    }

    #[test]
    fn filter_understands_absence_and_temperature() {
        let filter = LeadFilter::parse("somente leads quentes sem site");
        assert_eq!(filter.category, None);
        assert_eq!(filter.website, Some(false));
        assert_eq!(filter.temperature, Some(Temperature::Hot));
    }
}
