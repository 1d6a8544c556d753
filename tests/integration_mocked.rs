/// Integration tests with a mocked completion service
/// Tests the assistant workflow without hitting the real API
use leadmaps_api::completion_client::CompletionClient;
use leadmaps_api::dispatcher::{respond, STANDBY_MESSAGE};
use leadmaps_api::errors::AppError;
use leadmaps_api::models::{ChatMessage, ChatRole, RawLead, RequestCategory};
use leadmaps_api::session::SessionContext;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a client pointing at the mock server
fn create_test_client(base_url: String, api_key: Option<&str>) -> CompletionClient {
    CompletionClient::new(
        base_url,
        api_key.map(str::to_string),
        "test-model".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn completion_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            {"message": {"role": "assistant", "content": text}}
        ]
    })
}

fn sample_leads() -> Vec<RawLead> {
    vec![
        RawLead::new("1", "Cantina Bella", "Pizzaria", "São Paulo")
            .with_rating(4.8)
            .with_reviews(230)
            .with_whatsapp("11987654321"),
        RawLead::new("2", "Forno Bravo", "Pizzaria", "São Paulo").with_rating(3.9),
        RawLead::new("3", "Studio Fit", "Academia", "Campinas")
            .with_website("https://studiofit.com.br")
            .with_instagram("https://instagram.com/studiofit"),
    ]
}

#[tokio::test]
async fn test_completion_successful_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test_key"))
        .and(body_partial_json(serde_json::json!({"model": "test-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Olá!")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let history = vec![ChatMessage::new(ChatRole::User, "oi")];
    let result = client.complete("instrução", &history, "tudo bem?").await;

    assert_eq!(result.unwrap(), "Olá!");
}

#[tokio::test]
async fn test_completion_sends_instruction_history_and_message_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                {"role": "system", "content": "sistema"},
                {"role": "user", "content": "primeira"},
                {"role": "assistant", "content": "resposta"},
                {"role": "user", "content": "segunda"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("k"));
    let history = vec![
        ChatMessage::new(ChatRole::User, "primeira"),
        ChatMessage::new(ChatRole::Assistant, "resposta"),
    ];
    let result = client.complete("sistema", &history, "segunda").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_completion_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let result = client.complete("x", &[], "y").await;

    match result {
        Err(AppError::ExternalApiError(msg)) => assert!(msg.contains("500")),
        other => panic!("Expected ExternalApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_completion_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let err = client.complete("x", &[], "y").await.unwrap_err();

    assert!(err.to_string().starts_with("Failed to parse completion response"));
    assert!(matches!(err.root(), AppError::InternalError(_)));
}

#[tokio::test]
async fn test_completion_empty_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let result = client.complete("x", &[], "y").await;
    assert!(matches!(result, Err(AppError::ExternalApiError(_))));
}

#[tokio::test]
async fn test_completion_without_key_never_calls_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("x")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    let result = client.complete("x", &[], "y").await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn test_respond_before_ingest_returns_standby() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("x")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let mut ctx = SessionContext::new();
    let response = respond(&mut ctx, &client, "Qualifique meus leads", &[]).await;

    assert_eq!(response.message, STANDBY_MESSAGE);
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_respond_qualification_merges_local_insights() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("Seus melhores leads são...")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let mut ctx = SessionContext::new();
    ctx.ingest(sample_leads());

    let response = respond(&mut ctx, &client, "Qualifique os leads", &[]).await;

    assert_eq!(response.category, RequestCategory::Qualification);
    assert_eq!(response.message, "Seus melhores leads são...");
    assert!(response.error.is_none());
    assert_eq!(response.leads.len(), 3);
    assert_eq!(response.insights.len(), 3);
    assert_eq!(response.leads[0].lead.id, "1");
}

#[tokio::test]
async fn test_respond_copywriting_generates_whatsapp_scripts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Aqui estão")))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let mut ctx = SessionContext::new();
    ctx.ingest(sample_leads());

    let response = respond(&mut ctx, &client, "Crie um roteiro de abordagem", &[]).await;

    assert_eq!(response.category, RequestCategory::Copywriting);
    assert_eq!(response.scripts.len(), 3);
    assert_eq!(response.recommendations.len(), 2);
}

#[tokio::test]
async fn test_respond_market_strategy_records_analyses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Mercado")))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let mut ctx = SessionContext::new();
    ctx.ingest(sample_leads());

    let response = respond(&mut ctx, &client, "Qual a melhor cidade para expandir?", &[]).await;

    assert_eq!(response.category, RequestCategory::MarketStrategy);
    assert_eq!(response.opportunities.len(), 2);
    assert_eq!(ctx.market_analyses.len(), 2);
    assert!(response.recommendations[0].starts_with("Comece a prospecção por"));
}

#[tokio::test]
async fn test_respond_market_strategy_uses_best_city_analysis() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Mercado")))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let mut leads: Vec<RawLead> = (0..21)
        .map(|i| RawLead::new(format!("c{}", i), "Loja", "Loja", "Curitiba").with_rating(3.5))
        .collect();
    leads.push(
        RawLead::new("f1", "Loja", "Loja", "Florianópolis")
            .with_rating(4.8)
            .with_website("https://loja.com"),
    );
    let mut ctx = SessionContext::new();
    ctx.ingest(leads);

    let response = respond(&mut ctx, &client, "Qual cidade tem menos concorrência?", &[]).await;

    assert_eq!(response.opportunities[0].city, "Curitiba");
    assert_eq!(
        response.recommendations,
        vec![
            "Comece a prospecção por Curitiba".to_string(),
            "Concorrência moderada: diferencie a oferta por nicho ou qualidade de atendimento"
                .to_string(),
            "Use a melhoria de avaliações como argumento principal de venda".to_string(),
            "Priorize a oferta de site profissional".to_string(),
        ]
    );
    // Analyses are stored in ranked order
    assert_eq!(ctx.market_analyses.len(), 2);
    assert_eq!(ctx.market_analyses[0].region, "Curitiba");
    assert_eq!(ctx.market_analyses[1].region, "Florianópolis");
}

#[tokio::test]
async fn test_respond_completion_failure_is_reported_not_thrown() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("test_key"));
    let mut ctx = SessionContext::new();
    ctx.ingest(sample_leads());

    let response = respond(&mut ctx, &client, "Me dê um resumo", &[]).await;

    assert_eq!(response.category, RequestCategory::Summary);
    assert!(response.message.is_empty());
    assert!(response.error.as_deref().unwrap().contains("503"));
    // Local results survive the failure
    assert!(response.summary.is_some());
    assert!(!response.insights.is_empty());
}

#[tokio::test]
async fn test_respond_missing_key_reports_error() {
    let client = create_test_client("http://127.0.0.1:9".to_string(), None);
    let mut ctx = SessionContext::new();
    ctx.ingest(sample_leads());

    let response = respond(&mut ctx, &client, "Separe apenas pizzarias com WhatsApp", &[]).await;

    assert_eq!(response.category, RequestCategory::Filtering);
    assert!(response.message.is_empty());
    assert!(response.error.is_some());
    assert_eq!(response.leads.len(), 1);
    assert_eq!(response.leads[0].lead.name, "Cantina Bella");
}
