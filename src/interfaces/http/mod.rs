use crate::application::ReportIngestionUseCase;
use crate::domain::error::AppError;
use crate::domain::report::UploadedDocument;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{
    dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder, ResponseError,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub ingestion: Arc<ReportIngestionUseCase>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub started_at: Instant,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadReportRequest {
    #[validate(range(min = 1))]
    pub user_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub mime_type: String,
    #[validate(length(min = 1))]
    pub content_base64: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub uptime_secs: u64,
    pub ts: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    kind: &'a str,
    /// Model output that could not be normalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<&'a str>,
}

fn raw_output(err: &AppError) -> Option<&str> {
    match err {
        AppError::MalformedExtraction { raw, .. } => Some(raw.as_str()),
        _ => None,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ExtractionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MalformedExtraction { .. } | AppError::LLMError(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_)
            | AppError::ConfigError(_)
            | AppError::DatabaseError(_)
            | AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            raw: raw_output(self),
        })
    }
}

#[post("/report")]
async fn upload_report(
    data: web::Data<HttpState>,
    req: web::Json<UploadReportRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    add_log(
        &data.logs,
        "INFO",
        "Pipeline",
        &format!(
            "Report upload: user={} file={} mime={}",
            req.user_id, req.file_name, req.mime_type
        ),
    );

    let bytes = STANDARD
        .decode(req.content_base64.trim())
        .map_err(|e| AppError::ValidationError(format!("contentBase64 is not valid base64: {}", e)))?;
    let document = UploadedDocument::new(bytes, req.mime_type, req.file_name);

    match data.ingestion.process(req.user_id, document).await {
        Ok(processed) => {
            add_log(
                &data.logs,
                "INFO",
                "Pipeline",
                &format!(
                    "Processed report: subjects={} weaknesses={:?} rows={}",
                    processed.report.subjects.len(),
                    processed.analysis.weaknesses,
                    processed.records.len()
                ),
            );
            for violation in &processed.violations {
                add_log(
                    &data.logs,
                    "WARN",
                    "Pipeline",
                    &format!("Weakness not found in report: {}", violation.subject),
                );
            }
            Ok(HttpResponse::Ok().json(processed))
        }
        Err(e) => {
            let message = match raw_output(&e) {
                Some(raw) => format!("Report processing failed: {} (model output: {})", e, raw),
                None => format!("Report processing failed: {}", e),
            };
            add_log(&data.logs, "ERROR", "Pipeline", &message);
            Err(e)
        }
    }
}

#[get("/users/{user_id}/performance")]
async fn user_performance(
    data: web::Data<HttpState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let records = data.ingestion.history(user_id).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[get("/health")]
async fn health(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        uptime_secs: data.started_at.elapsed().as_secs(),
        ts: Utc::now().to_rfc3339(),
    })
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    match data.logs.lock() {
        Ok(logs) => HttpResponse::Ok().json(&*logs),
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry);
        if logs.len() > 100 {
            logs.remove(0);
        }
    }
}

/// Routes under `/api`, shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(upload_report)
            .service(user_performance)
            .service(health)
            .service(get_logs),
    );
}

pub fn start_server(
    state: HttpState,
    host: &str,
    port: u16,
    max_body_bytes: usize,
) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(max_body_bytes))
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
