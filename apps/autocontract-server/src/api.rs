//! API handlers for the autocontract server
//!
//! Provides REST endpoints for:
//! - Variable detection in a contract text
//! - The guided data-collection chat
//! - Substitution of collected values into the template
//! - Typst export of the completed contract

use std::time::Duration;

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use contract_engine::{export, SubstitutionEngine};
use contract_types::{CollectedValues, SubstitutionOutcome, SubstitutionReport, VariableCatalog};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::llm::{parse_json_response, ChatMessage, CompletionRequest};
use crate::prompts;
use crate::AppState;

/// Contracts shorter than this (after trimming) are rejected by `/api/analyze`.
pub const MIN_CONTRACT_CHARS: usize = 50;

const DEFAULT_ANALYSIS_NOTES: &str = "Análisis completado.";
const DEFAULT_CHAT_REPLY: &str = "¿Podría repetir ese dato?";
const EXPORT_CONTENT_TYPE: &str = "text/x-typst; charset=utf-8";
const EXPORT_DISPOSITION: &str = "attachment; filename=\"contrato_alquiler.typ\"";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "autocontract-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct InfoResponse {
    pub provider: String,
    pub model: String,
}

/// Handler: GET /api/info
pub async fn handle_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        provider: state.llm.provider_name().to_string(),
        model: state.llm.model_name().to_string(),
    })
}

/// Handler: GET /
///
/// Serves the frontend's `index.html` when one is configured and present.
pub async fn handle_root(State(state): State<AppState>) -> Result<Response, ServerError> {
    if let Some(dir) = &state.frontend_dir {
        match tokio::fs::read_to_string(dir.join("index.html")).await {
            Ok(page) => return Ok(Html(page).into_response()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No index.html in {}", dir.display())
            }
            Err(e) => {
                return Err(ServerError::Internal(format!(
                    "cannot read frontend index: {}",
                    e
                )))
            }
        }
    }

    Ok(Json(serde_json::json!({
        "message": "AutoContract API activa",
        "provider": state.llm.provider_name(),
    }))
    .into_response())
}

/// Run one LLM completion under the request timeout and parse its JSON reply.
async fn complete_json(state: &AppState, request: CompletionRequest) -> Result<Value, ServerError> {
    let limit = Duration::from_millis(state.timeout_ms);
    let raw = tokio::time::timeout(limit, state.llm.complete(request))
        .await
        .map_err(|_| ServerError::Timeout(state.timeout_ms))??;

    debug!("LLM reply: {} chars", raw.len());
    Ok(parse_json_response(&raw)?)
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub contract_text: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub variables: VariableCatalog,
    pub analysis_notes: String,
}

/// Handler: POST /api/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    if req.contract_text.trim().chars().count() < MIN_CONTRACT_CHARS {
        return Err(ServerError::InvalidRequest(
            "El texto del contrato es demasiado corto.".to_string(),
        ));
    }

    info!("Analyze request: {} chars", req.contract_text.len());

    let result = complete_json(
        &state,
        CompletionRequest {
            system_prompt: prompts::ANALYZE_SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::user(prompts::analyze_user_message(
                &req.contract_text,
            ))],
            json_mode: true,
            temperature: prompts::ANALYZE_TEMPERATURE,
        },
    )
    .await?;

    let variables = result
        .get("variables")
        .and_then(Value::as_array)
        .map(|detected| VariableCatalog::from_detected(detected))
        .unwrap_or_default();

    let analysis_notes = result
        .get("analysis_notes")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ANALYSIS_NOTES)
        .to_string();

    info!("Detected {} variables", variables.len());

    Ok(Json(AnalyzeResponse {
        variables,
        analysis_notes,
    }))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub variables: VariableCatalog,
    #[serde(default)]
    pub collected_data: CollectedValues,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub collected_data: CollectedValues,
    pub is_complete: bool,
    pub next_variable: Option<String>,
}

/// Handler: POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let ChatRequest {
        mut messages,
        variables,
        mut collected_data,
    } = req;

    info!(
        "Chat request: {} messages, {} of {} variables pending",
        messages.len(),
        variables.pending(&collected_data).len(),
        variables.len()
    );

    if messages.is_empty() {
        messages.push(ChatMessage::user(prompts::CHAT_OPENING_MESSAGE));
    }

    let result = complete_json(
        &state,
        CompletionRequest {
            system_prompt: prompts::chat_system_prompt(&variables, &collected_data),
            messages,
            json_mode: true,
            temperature: prompts::CHAT_TEMPERATURE,
        },
    )
    .await?;

    let extracted = match result.get("extracted_data") {
        Some(data) => serde_json::from_value::<CollectedValues>(data.clone()).unwrap_or_else(|e| {
            warn!("Ignoring unreadable extracted_data: {}", e);
            CollectedValues::default()
        }),
        None => CollectedValues::default(),
    };
    let updated = collected_data.merge(extracted);
    debug!("Merged {} extracted values", updated);

    let pending = variables.pending(&collected_data);
    let is_complete = pending.is_empty();

    let next_variable = if is_complete {
        None
    } else {
        result
            .get("next_variable_key")
            .and_then(Value::as_str)
            .filter(|key| pending.iter().any(|v| v.key == *key))
            .or_else(|| pending.first().map(|v| v.key.as_str()))
            .map(str::to_string)
    };

    let reply = result
        .get("reply")
        .and_then(Value::as_str)
        .filter(|reply| !reply.trim().is_empty())
        .unwrap_or(DEFAULT_CHAT_REPLY)
        .to_string();

    Ok(Json(ChatResponse {
        reply,
        collected_data,
        is_complete,
        next_variable,
    }))
}

/// Body shared by `/api/generate` and `/api/export`
#[derive(Deserialize)]
pub struct GenerateRequest {
    #[serde(alias = "template")]
    pub contract_template: String,
    #[serde(default)]
    pub variables: VariableCatalog,
    #[serde(default)]
    pub collected_data: CollectedValues,
}

impl GenerateRequest {
    fn substitute(&self) -> SubstitutionReport {
        SubstitutionEngine::new().substitute(
            &self.contract_template,
            &self.variables,
            &self.collected_data,
        )
    }
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub contract_preview: String,
    pub variables_applied: usize,
    pub unmatched_variables: Vec<String>,
    pub outcomes: Vec<SubstitutionOutcome>,
}

impl From<SubstitutionReport> for GenerateResponse {
    fn from(report: SubstitutionReport) -> Self {
        Self {
            contract_preview: report.document,
            variables_applied: report.applied_count,
            unmatched_variables: report.unmatched,
            outcomes: report.outcomes,
        }
    }
}

/// Handler: POST /api/generate
pub async fn handle_generate(Json(req): Json<GenerateRequest>) -> Json<GenerateResponse> {
    info!(
        "Generate request: {} variables, {} values",
        req.variables.len(),
        req.collected_data.len()
    );

    Json(req.substitute().into())
}

/// Handler: POST /api/export
pub async fn handle_export(Json(req): Json<GenerateRequest>) -> impl IntoResponse {
    let report = req.substitute();
    let layout = export::layout(&report.document);

    info!(
        "Export request: {} paragraphs, {} titles",
        layout.paragraphs.len(),
        layout.titles().count()
    );

    (
        [
            (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, EXPORT_DISPOSITION),
        ],
        export::to_typst(&layout),
    )
}
