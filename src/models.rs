use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contacts::has_text;

// ============ Lead Models ============

/// Geographic position reported by the map scraper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A business record as extracted from the map search.
///
/// Immutable once ingested. Every attribute the scraper may fail to find is an
/// `Option`; blank strings are treated as absent by the presence helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLead {
    /// Identifier assigned by the extractor.
    pub id: String,
    /// Business name.
    #[serde(alias = "nome")]
    pub name: String,
    /// Category as shown on the listing (e.g., "Pizzaria").
    #[serde(alias = "categoria")]
    pub category: String,
    /// Street address.
    #[serde(alias = "endereco", default)]
    pub address: String,
    /// Neighborhood, when the listing exposes one.
    #[serde(alias = "bairro", default)]
    pub neighborhood: Option<String>,
    /// City name.
    #[serde(alias = "cidade", default)]
    pub city: String,
    /// State abbreviation.
    #[serde(alias = "estado", default)]
    pub state: String,
    /// Landline or mobile phone.
    #[serde(alias = "telefone", default)]
    pub phone: Option<String>,
    /// WhatsApp number or handle.
    #[serde(default)]
    pub whatsapp: Option<String>,
    /// Instagram handle or profile URL.
    #[serde(default)]
    pub instagram: Option<String>,
    /// Website URL.
    #[serde(alias = "site", default)]
    pub website: Option<String>,
    /// Average rating, 0 to 5.
    #[serde(alias = "avaliacao", default)]
    pub rating: Option<f64>,
    /// Number of reviews behind the rating.
    #[serde(alias = "numeroAvaliacoes", alias = "totalAvaliacoes", default)]
    pub review_count: Option<u32>,
    /// Search keyword that produced this record.
    #[serde(alias = "palavraChave", default)]
    pub source_keyword: String,
    /// Extraction timestamp.
    #[serde(alias = "dataExtracao", default = "Utc::now")]
    pub extracted_at: DateTime<Utc>,
    /// Map coordinates.
    #[serde(alias = "coordenadas", default)]
    pub coordinates: Option<Coordinates>,
}

impl RawLead {
    /// Creates a lead with the mandatory fields and every optional attribute absent.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            address: String::new(),
            neighborhood: None,
            city: city.into(),
            state: String::new(),
            phone: None,
            whatsapp: None,
            instagram: None,
            website: None,
            rating: None,
            review_count: None,
            source_keyword: String::new(),
            extracted_at: Utc::now(),
            coordinates: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_reviews(mut self, count: u32) -> Self {
        self.review_count = Some(count);
        self
    }

    pub fn with_website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn with_whatsapp(mut self, number: impl Into<String>) -> Self {
        self.whatsapp = Some(number.into());
        self
    }

    pub fn with_instagram(mut self, handle: impl Into<String>) -> Self {
        self.instagram = Some(handle.into());
        self
    }

    pub fn with_phone(mut self, number: impl Into<String>) -> Self {
        self.phone = Some(number.into());
        self
    }

    pub fn with_neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        self.neighborhood = Some(neighborhood.into());
        self
    }

    pub fn has_website(&self) -> bool {
        has_text(self.website.as_deref())
    }

    pub fn has_whatsapp(&self) -> bool {
        has_text(self.whatsapp.as_deref())
    }

    pub fn has_instagram(&self) -> bool {
        has_text(self.instagram.as_deref())
    }

    pub fn has_phone(&self) -> bool {
        has_text(self.phone.as_deref())
    }

    pub fn has_neighborhood(&self) -> bool {
        has_text(self.neighborhood.as_deref())
    }

    /// True when at least one of website, WhatsApp or Instagram is present.
    pub fn has_digital_presence(&self) -> bool {
        self.has_website() || self.has_whatsapp() || self.has_instagram()
    }
}

impl AsRef<RawLead> for RawLead {
    fn as_ref(&self) -> &RawLead {
        self
    }
}

/// Lead temperature bucket derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

impl Temperature {
    /// Portuguese label used in generated text.
    pub fn label(&self) -> &'static str {
        match self {
            Temperature::Hot => "quente",
            Temperature::Warm => "morno",
            Temperature::Cold => "frio",
        }
    }
}

/// Fixed set of quality flags computed during qualification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityFlags {
    pub digital_presence: bool,
    pub high_rating: bool,
    pub good_review_volume: bool,
    pub has_whatsapp: bool,
    pub has_website: bool,
    pub has_instagram: bool,
}

/// A `RawLead` plus everything derived from it by the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedLead {
    #[serde(flatten)]
    pub lead: RawLead,
    /// Total score, 0 to 100.
    pub score: u8,
    pub temperature: Temperature,
    pub quality: QualityFlags,
    /// Estimated conversion probability, 0 to 100.
    pub conversion_probability: u8,
    /// 1-based position after sorting the batch by score.
    #[serde(default)]
    pub priority_rank: Option<usize>,
}

impl AsRef<RawLead> for QualifiedLead {
    fn as_ref(&self) -> &RawLead {
        &self.lead
    }
}

// ============ Prospecting ============

/// Outreach channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[serde(alias = "whatsapp")]
    Chat,
    #[serde(alias = "phone", alias = "ligacao")]
    Call,
    Email,
}

impl Channel {
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Chat => "WhatsApp",
            Channel::Call => "Ligação",
            Channel::Email => "E-mail",
        }
    }
}

/// Generated outreach text for one lead on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectingScript {
    pub lead_id: String,
    pub lead_name: String,
    pub channel: Channel,
    pub script: String,
    pub pain_points: Vec<String>,
    pub value_proposition: String,
    pub call_to_action: String,
    pub personalization_factors: Vec<String>,
}

/// Which channel to use first for a lead, and what to fall back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecommendation {
    pub channel: Channel,
    pub reasoning: String,
    pub fallbacks: Vec<Channel>,
    /// Normalized contact for the chosen channel (wa.me link or E.164 phone).
    pub contact: Option<String>,
}

// ============ Market ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionDensity {
    Low,
    Medium,
    High,
    Saturated,
}

impl CompetitionDensity {
    pub fn label(&self) -> &'static str {
        match self {
            CompetitionDensity::Low => "baixa",
            CompetitionDensity::Medium => "média",
            CompetitionDensity::High => "alta",
            CompetitionDensity::Saturated => "saturada",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    /// Share of the region's leads, rounded to a whole percent.
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub region: String,
    pub total_leads: usize,
    pub competition_density: CompetitionDensity,
    pub average_rating: f64,
    pub average_reviews: f64,
    pub top_categories: Vec<CategoryShare>,
    pub opportunities: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityOpportunity {
    pub city: String,
    pub score: u32,
    pub lead_count: usize,
    pub competition_density: CompetitionDensity,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySaturation {
    pub category: String,
    pub count: usize,
    pub level: SaturationLevel,
    pub recommendation: String,
}

// ============ Session ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureBreakdown {
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
}

/// Aggregate numbers over a qualified batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total: usize,
    pub breakdown: TemperatureBreakdown,
    pub with_website: usize,
    pub with_whatsapp: usize,
    pub with_instagram: usize,
    pub average_score: f64,
    pub top_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryComparison {
    pub previous_id: Uuid,
    pub total_delta: i64,
    pub top_score_delta: i64,
}

/// One per ingested batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total_leads: usize,
    pub qualified_leads: TemperatureBreakdown,
    pub top_score: u8,
    pub top_leads: Vec<QualifiedLead>,
    pub insights: Vec<String>,
    pub next_actions: Vec<String>,
    pub comparison_with_previous: Option<SummaryComparison>,
}

// ============ Assistant ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Handling strategy selected for a free-text request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    Qualification,
    Copywriting,
    Filtering,
    MarketStrategy,
    Summary,
    Comparison,
    General,
}

/// Reply of the assistant. Callers must check `error`: on failure `message`
/// is empty while the locally computed data is still filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    pub message: String,
    pub error: Option<String>,
    pub category: RequestCategory,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub leads: Vec<QualifiedLead>,
    pub scripts: Vec<ProspectingScript>,
    pub opportunities: Vec<CityOpportunity>,
    pub summary: Option<ExtractionSummary>,
}

impl AssistantResponse {
    pub fn empty(category: RequestCategory) -> Self {
        Self {
            message: String::new(),
            error: None,
            category,
            insights: Vec::new(),
            recommendations: Vec::new(),
            leads: Vec::new(),
            scripts: Vec::new(),
            opportunities: Vec::new(),
            summary: None,
        }
    }
}

// ============ API Request/Response Models ============

#[derive(Debug, Deserialize)]
pub struct LeadBatchRequest {
    pub leads: Vec<RawLead>,
}

#[derive(Debug, Deserialize)]
pub struct ScriptRequest {
    pub leads: Vec<QualifiedLead>,
    pub channel: Channel,
    /// When set, only the top `limit` leads by score get a script.
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRequest {
    pub leads: Vec<RawLead>,
    #[serde(alias = "regiao")]
    pub region: String,
}

#[derive(Debug, Deserialize)]
pub struct CityRankingRequest {
    pub leads: Vec<RawLead>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Read-only view of the session context.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current_leads: usize,
    pub qualified_leads: usize,
    pub extractions: usize,
    pub last_extraction: Option<ExtractionSummary>,
    pub market_analyses: Vec<MarketAnalysis>,
}
