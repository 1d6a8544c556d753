//! Outreach script generation.
//!
//! Each channel has its own builder; all of them share the pain points and
//! value proposition derived from what the lead is missing.

use crate::contacts::{validate_br_phone, whatsapp_link};
use crate::models::{Channel, ChannelRecommendation, ProspectingScript, QualifiedLead, RawLead};

const HIGH_RATING: f64 = 4.5;
const LOW_RATING: f64 = 4.0;
const FEW_REVIEWS: u32 = 20;

/// Ordered list of problems the outreach can address. Only rules that apply
/// contribute.
pub fn identify_pain_points(lead: &RawLead) -> Vec<String> {
    let mut pains = Vec::new();

    if !lead.has_website() {
        pains.push("Não possui site próprio para receber pedidos e contatos diretos".to_string());
        pains.push("Depende de aplicativos e plataformas de terceiros que cobram taxas".to_string());
    }
    if !lead.has_whatsapp() {
        pains.push("Não tem WhatsApp comercial divulgado".to_string());
        pains.push("Perde clientes que preferem atendimento rápido por mensagem".to_string());
    }
    if !lead.has_instagram() {
        pains.push("Não tem presença ativa no Instagram".to_string());
        pains.push("Baixa visibilidade para novos clientes da região".to_string());
    }
    if lead.rating.is_some_and(|r| r < LOW_RATING) {
        pains.push("Avaliação abaixo de 4.0 afasta novos clientes".to_string());
    }
    if lead.review_count.is_some_and(|n| n < FEW_REVIEWS) {
        pains.push("Poucas avaliações no Google reduzem a confiança".to_string());
    }

    pains
}

pub fn value_proposition(lead: &RawLead) -> String {
    let mut benefits: Vec<String> = Vec::new();

    if !lead.has_website() {
        benefits.push("site profissional para receber pedidos diretos".to_string());
    }
    if !lead.has_whatsapp() {
        benefits.push("automação de atendimento 24/7 no WhatsApp".to_string());
    }
    if !lead.has_instagram() {
        benefits.push("gestão profissional das redes sociais".to_string());
    }
    if let Some(rating) = lead.rating.filter(|r| *r >= HIGH_RATING) {
        benefits.push(format!(
            "aproveitar a reputação de {} estrelas para atrair mais clientes",
            rating
        ));
    }

    if benefits.is_empty() {
        "otimização da presença digital para crescer ainda mais".to_string()
    } else {
        benefits.join(", ")
    }
}

fn call_to_action(channel: Channel) -> &'static str {
    match channel {
        Channel::Chat => "Posso te mandar um exemplo rápido de como ficaria para vocês?",
        Channel::Call => "Agendar uma conversa de 15 minutos ainda esta semana",
        Channel::Email => "Responda este e-mail para agendarmos uma conversa de 15 minutos",
    }
}

fn rating_text(lead: &RawLead) -> Option<String> {
    lead.rating.map(|r| r.to_string())
}

fn first_pain(pains: &[String]) -> String {
    pains
        .first()
        .map(|p| p.to_lowercase())
        .unwrap_or_else(|| "há espaço para crescer ainda mais no digital".to_string())
}

fn chat_script(lead: &QualifiedLead, pains: &[String], value: &str) -> String {
    let raw = &lead.lead;
    let mut lines = vec![format!("Olá, tudo bem? Falo com o responsável pela {}?", raw.name)];

    match rating_text(raw) {
        Some(rating) => lines.push(format!(
            "Vi que vocês têm nota {} no Google, parabéns pelo trabalho com {}!",
            rating,
            raw.category.to_lowercase()
        )),
        None => lines.push(format!(
            "Encontrei vocês pesquisando por {} na região.",
            raw.category.to_lowercase()
        )),
    }

    lines.push(format!("Notei um ponto: {}.", first_pain(pains)));
    if !raw.has_website() {
        lines.push(
            "Com um site próprio vocês recebem pedidos direto, sem depender de aplicativos de delivery e das taxas deles."
                .to_string(),
        );
    }
    lines.push(format!("Trabalhamos com {}.", value));
    lines.push(call_to_action(Channel::Chat).to_string());

    lines.join("\n\n")
}

fn call_script(lead: &QualifiedLead, pains: &[String], value: &str) -> String {
    let raw = &lead.lead;
    let reputation = match rating_text(raw) {
        Some(rating) => format!("Vi a nota {} de vocês no Google.", rating),
        None => "Encontrei vocês no Google Maps.".to_string(),
    };
    let pain_list = if pains.is_empty() {
        "- Entender os objetivos de crescimento".to_string()
    } else {
        pains
            .iter()
            .take(3)
            .map(|p| format!("- {}", p))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "ABERTURA:\nBom dia! Meu nome é [seu nome], falo com o responsável pela {name}? {reputation}\n\n\
         CONTEXTO:\nAjudamos negócios de {category} a atrair mais clientes pelo digital.\n\n\
         PONTOS DE DOR:\n{pain_list}\n\n\
         PROPOSTA:\nOferecemos {value}.\n\n\
         OBJEÇÃO \"não tenho tempo\":\nEntendo! Por isso a conversa é de só 15 minutos e eu mostro tudo pronto.\n\n\
         FECHAMENTO:\n{cta}",
        name = raw.name,
        category = raw.category.to_lowercase(),
        reputation = reputation,
        pain_list = pain_list,
        value = value,
        cta = call_to_action(Channel::Call),
    )
}

fn email_script(lead: &QualifiedLead, pains: &[String], value: &str) -> String {
    let raw = &lead.lead;
    let reputation = match rating_text(raw) {
        Some(rating) => format!(
            "Acompanhei a reputação de vocês no Google (nota {}) e ",
            rating
        ),
        None => String::new(),
    };

    format!(
        "Assunto: {name}: mais clientes com presença digital\n\n\
         Prezados da {name},\n\n\
         {reputation}identifiquei uma oportunidade para o segmento de {category}: {pain}.\n\n\
         Nossa proposta inclui {value}.\n\n\
         {cta}.\n\n\
         Atenciosamente,\n[seu nome]",
        name = raw.name,
        reputation = reputation,
        category = raw.category.to_lowercase(),
        pain = first_pain(pains),
        value = value,
        cta = call_to_action(Channel::Email),
    )
}

fn personalization_factors(lead: &QualifiedLead) -> Vec<String> {
    let raw = &lead.lead;
    [
        ("Nome", raw.name.clone()),
        ("Categoria", raw.category.clone()),
        ("Avaliação", rating_text(raw).unwrap_or_default()),
        (
            "Avaliações",
            raw.review_count.map(|n| n.to_string()).unwrap_or_default(),
        ),
        ("Temperatura", lead.temperature.label().to_string()),
        ("Score", lead.score.to_string()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(label, value)| format!("{}: {}", label, value))
    .collect()
}

pub fn generate_script(lead: &QualifiedLead, channel: Channel) -> ProspectingScript {
    let pains = identify_pain_points(&lead.lead);
    let value = value_proposition(&lead.lead);

    let mut script = match channel {
        Channel::Chat => chat_script(lead, &pains, &value),
        Channel::Call => call_script(lead, &pains, &value),
        Channel::Email => email_script(lead, &pains, &value),
    };
    if channel == Channel::Chat {
        if let Some(link) = whatsapp_link(&lead.lead) {
            script = format!("{}\n\n[{}]", script, link);
        }
    }

    ProspectingScript {
        lead_id: lead.lead.id.clone(),
        lead_name: lead.lead.name.clone(),
        channel,
        script,
        pain_points: pains,
        value_proposition: value,
        call_to_action: call_to_action(channel).to_string(),
        personalization_factors: personalization_factors(lead),
    }
}

pub fn generate_bulk_scripts(leads: &[QualifiedLead], channel: Channel) -> Vec<ProspectingScript> {
    leads.iter().map(|l| generate_script(l, channel)).collect()
}

/// Scripts for the `n` best-scored leads.
pub fn generate_top_scripts(
    leads: &[QualifiedLead],
    channel: Channel,
    n: usize,
) -> Vec<ProspectingScript> {
    let mut sorted: Vec<&QualifiedLead> = leads.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted
        .into_iter()
        .take(n)
        .map(|l| generate_script(l, channel))
        .collect()
}

pub fn recommend_channel(lead: &RawLead) -> ChannelRecommendation {
    if lead.has_whatsapp() {
        ChannelRecommendation {
            channel: Channel::Chat,
            reasoning: "Possui WhatsApp: canal de maior taxa de resposta para pequenos negócios"
                .to_string(),
            fallbacks: vec![Channel::Call, Channel::Email],
            contact: whatsapp_link(lead),
        }
    } else if lead.has_phone() {
        ChannelRecommendation {
            channel: Channel::Call,
            reasoning: "Sem WhatsApp, mas com telefone: ligação direta para o responsável"
                .to_string(),
            fallbacks: vec![Channel::Email],
            contact: lead
                .phone
                .as_deref()
                .map(validate_br_phone)
                .and_then(|(valid, e164)| valid.then_some(e164)),
        }
    } else {
        ChannelRecommendation {
            channel: Channel::Email,
            reasoning: "Sem telefone ou WhatsApp: use e-mail ou contato pelo site".to_string(),
            fallbacks: Vec::new(),
            contact: None,
        }
    }
}
