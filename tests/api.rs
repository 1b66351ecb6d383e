use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use asistente_ia::config::{
    AssistantConfig, BridgeConfig, Config, DatabaseConfig, LLMConfig, SearchConfig, ServerConfig,
};
use asistente_ia::llm::LLMAdapter;
use asistente_ia::types::{AppError, AppResult, ImageGenerationRequest, LLMRequest, LLMResponse, TokenUsage};
use asistente_ia::{create_router, AppState};

/// Always answers with the same content and records the requests it sees.
struct StubLLM {
    reply: String,
    image_error: Option<String>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl StubLLM {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            image_error: None,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LLMAdapter for StubLLM {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(LLMResponse {
            content: self.reply.clone(),
            finish_reason: "stop".to_string(),
            usage: TokenUsage::default(),
        })
    }

    async fn generate_images(&self, request: &ImageGenerationRequest) -> AppResult<Vec<String>> {
        if let Some(message) = &self.image_error {
            return Err(AppError::LLMApi(message.clone()));
        }
        Ok((0..request.n).map(|i| format!("https://img.example/{i}.png")).collect())
    }
}

fn test_config(cse_url: &str) -> Config {
    Config {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            log_dir: None,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
            connect_timeout_secs: 1,
        },
        llm: LLMConfig {
            openai_api_key: "test".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            default_model: "gpt-4o".to_string(),
            consult_model: "gpt-4-turbo".to_string(),
        },
        search: SearchConfig {
            google_api_key: "gkey".to_string(),
            google_cse_id: "cx".to_string(),
            google_cse_url: cse_url.to_string(),
            news_rss_url: "http://127.0.0.1:9/rss".to_string(),
        },
        bridge: BridgeConfig {
            file_serve_url: None,
            api_secret_key: None,
        },
        assistant: AssistantConfig {
            org_name: "Ashotel".to_string(),
            default_tenant_id: 1,
            rag_token_budget: 3000,
            rag_max_documents: 5,
            extraction_timeout_secs: 5,
        },
    }
}

fn app(llm: Option<Arc<StubLLM>>, cse_url: &str) -> Router {
    create_router(AppState {
        pool: None,
        config: test_config(cse_url),
        llm: llm.map(|l| l as Arc<dyn LLMAdapter>),
        http: reqwest::Client::new(),
    })
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(filename: &str, content_type: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--XBOUNDARY\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {content}\r\n\
         --XBOUNDARY\r\n\
         Content-Disposition: form-data; name=\"especializacion\"\r\n\r\n\
         legal\r\n\
         --XBOUNDARY--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/analizar-documento")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_reports_disabled_database() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(None, "http://127.0.0.1:9"), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "disabled");
}

#[tokio::test]
async fn consulta_without_llm_is_503() {
    let (status, body) = send(
        app(None, "http://127.0.0.1:9"),
        json_request("/consulta", json!({"mensaje": "hola"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Servicio IA no configurado.");
}

#[tokio::test]
async fn consulta_returns_respuesta() {
    let llm = StubLLM::new("<p>Abrimos a las 9.</p>");
    let (status, body) = send(
        app(Some(llm.clone()), "http://127.0.0.1:9"),
        json_request("/consulta", json!({"mensaje": "¿Horario?", "especializacion": "Direccion"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["respuesta"], "<p>Abrimos a las 9.</p>");
    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4-turbo");
}

#[tokio::test]
async fn analizar_documento_text_report() {
    let llm = StubLLM::new("Informe sin etiquetas");
    let (status, body) = send(
        app(Some(llm.clone()), "http://127.0.0.1:9"),
        multipart_request("acta.txt", "text/plain", "Acta de la junta directiva"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["informe"], "<p>Informe sin etiquetas</p>");
    let requests = llm.requests.lock().unwrap();
    let user = requests[0].messages[1].content.as_text().unwrap();
    assert!(user.contains("Acta de la junta directiva"));
}

#[tokio::test]
async fn analizar_documento_rejects_unknown_type() {
    let (status, body) = send(
        app(Some(StubLLM::new("x")), "http://127.0.0.1:9"),
        multipart_request("datos.zip", "application/zip", "PK"),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["detail"], "Tipo archivo no soportado: application/zip.");
}

#[tokio::test]
async fn search_chat_validates_num_results() {
    let (status, _) = send(
        app(Some(StubLLM::new("x")), "http://127.0.0.1:9"),
        json_request("/agenteiademo/search-chat", json!({"message": "hola", "num_results": 6})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn search_chat_cse_error_is_502() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .match_query(mockito::Matcher::Any)
        .with_status(403)
        .with_body("daily limit exceeded")
        .create_async()
        .await;

    let (status, body) = send(
        app(Some(StubLLM::new("consulta refinada")), &server.url()),
        json_request("/agenteiademo/search-chat", json!({"message": "hola"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].as_str().unwrap().contains("daily limit exceeded"));
}

#[tokio::test]
async fn generate_image_returns_urls_and_maps_provider_errors() {
    let (status, body) = send(
        app(Some(StubLLM::new("x")), "http://127.0.0.1:9"),
        json_request("/generate-image", json!({"prompt": "un hotel", "n": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"], json!(["https://img.example/0.png", "https://img.example/1.png"]));

    let failing = Arc::new(StubLLM {
        reply: String::new(),
        image_error: Some("content policy".to_string()),
        requests: Mutex::new(Vec::new()),
    });
    let (status, body) = send(
        app(Some(failing), "http://127.0.0.1:9"),
        json_request("/generate-image", json!({"prompt": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["detail"], "Error generando imagen: content policy");
}

#[tokio::test]
async fn documents_process_requires_database() {
    let (status, _) = send(
        app(Some(StubLLM::new("x")), "http://127.0.0.1:9"),
        json_request("/documents/process", json!({"user_id": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
