use crate::config::{ApiConfig, GeminiSettings};
use crate::gemini::GeminiModel;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::json;
use solar_core::{
    fallback_installation, pack_panels, render_faults_svg, render_installation_svg, section_roof,
    synthesize_faults, validate_external_regions, AnalysisConfig, Analyzer, FaultReport,
    ImageFormat, ImageInput, InstallationResult, LayoutError, PackRequest, PanelRegion, RoofOverrides,
    RoofSectioning, RoofType, UnavailableModel, ValidatedRegions, ValidationRequest, VisionModel,
    ZoomLevel,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// Uploaded images travel base64-encoded inside JSON
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

pub struct AppState {
    pub analysis: AnalysisConfig,
    pub gemini: Option<GeminiSettings>,
}

impl From<ApiConfig> for AppState {
    fn from(config: ApiConfig) -> Self {
        Self {
            analysis: config.analysis,
            gemini: config.gemini,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/roof/sections", post(roof_sections))
        .route("/api/roof/pack", post(pack))
        .route("/api/installation/fallback", post(installation_fallback))
        .route("/api/installation/validate", post(validate_regions))
        .route("/api/faults/synthesize", post(faults_synthesize))
        .route("/api/analyze/installation", post(analyze_installation))
        .route("/api/analyze/faults", post(analyze_faults))
        .route("/api/render/installation", post(render_installation))
        .route("/api/render/faults", post(render_faults))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug, Deserialize)]
pub struct SectionsRequest {
    pub roof_type: RoofType,
    pub total_area_sq_ft: f64,
}

#[derive(Debug, Deserialize)]
pub struct FallbackRequest {
    pub roof_type: RoofType,
    pub total_area_sq_ft: f64,
    #[serde(default)]
    pub zoom_level: Option<ZoomLevel>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub panel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    /// Base64 data, optionally as a `data:` URL
    pub image: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeInstallationRequest {
    #[serde(flatten)]
    pub image: ImagePayload,
    #[serde(default)]
    pub overrides: RoofOverrides,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeFaultsRequest {
    #[serde(flatten)]
    pub image: ImagePayload,
    #[serde(default)]
    pub panel_id: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RenderInstallationRequest {
    pub result: InstallationResult,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

#[derive(Debug, Deserialize)]
pub struct RenderFaultsRequest {
    pub report: FaultReport,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_width() -> f64 {
    1024.0
}

fn default_height() -> f64 {
    768.0
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "solar-layout-api",
        "version": env!("CARGO_PKG_VERSION"),
        "vision_model": state.gemini.as_ref().map(|g| g.model.as_str()),
    }))
}

async fn roof_sections(Json(request): Json<SectionsRequest>) -> Result<Json<RoofSectioning>, AppError> {
    info!(
        "Sectioning {} roof of {} sq ft",
        request.roof_type, request.total_area_sq_ft
    );
    Ok(Json(section_roof(request.roof_type, request.total_area_sq_ft)?))
}

async fn pack(Json(request): Json<PackRequest>) -> Result<Json<Vec<PanelRegion>>, AppError> {
    let regions = pack_panels(
        request.roof_type,
        &request.sections,
        request.total_panel_count,
        request.zoom_level,
    )?;
    info!(
        "Packed {} of {} requested panels",
        regions.len(),
        request.total_panel_count
    );
    Ok(Json(regions))
}

async fn installation_fallback(
    Json(request): Json<FallbackRequest>,
) -> Result<Json<InstallationResult>, AppError> {
    let zoom = request.zoom_level.unwrap_or(ZoomLevel::Aerial);
    let result = fallback_installation(request.roof_type, request.total_area_sq_ft, zoom)?;

    info!(
        "Fallback layout: {} panels, {:.2} kW",
        result.total_panels, result.power_output_kw
    );
    Ok(Json(result))
}

async fn validate_regions(
    Json(request): Json<ValidationRequest>,
) -> Result<Json<ValidatedRegions>, AppError> {
    info!("Validating {} candidate regions", request.candidates.len());
    Ok(Json(validate_external_regions(&request)?))
}

async fn faults_synthesize(Json(request): Json<SynthesizeRequest>) -> Json<FaultReport> {
    let mut rng = rng_for(request.seed);
    Json(synthesize_faults(&mut rng, request.panel_id.as_deref()))
}

async fn analyze_installation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeInstallationRequest>,
) -> Result<Json<InstallationResult>, AppError> {
    let image = decode_image(&request.image)?;
    info!(
        "Analyzing {} byte {} rooftop image",
        image.bytes.len(),
        image.format.mime_type()
    );

    let result = tokio::task::spawn_blocking(move || {
        let analyzer = Analyzer::new(state.analysis.clone());
        with_model(state.gemini.as_ref(), |model| {
            analyzer.analyze_installation(model, &image, &request.overrides)
        })
    })
    .await??;

    info!(
        "Installation analysis ({:?}): {} panels, {}% confidence",
        result.source, result.total_panels, result.confidence_percent
    );
    Ok(Json(result))
}

async fn analyze_faults(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeFaultsRequest>,
) -> Result<Json<FaultReport>, AppError> {
    let image = decode_image(&request.image)?;
    let mut rng = rng_for(request.seed);

    let report = tokio::task::spawn_blocking(move || {
        let analyzer = Analyzer::new(state.analysis.clone());
        with_model(state.gemini.as_ref(), |model| {
            analyzer.analyze_faults(model, &image, request.panel_id.as_deref(), &mut rng)
        })
    })
    .await?;

    info!(
        "Fault analysis ({:?}): {} faults, health {}",
        report.source,
        report.faults.len(),
        report.overall_health
    );
    Ok(Json(report))
}

async fn render_installation(
    Json(request): Json<RenderInstallationRequest>,
) -> Result<Response, AppError> {
    let svg = render_installation_svg(&request.result, request.width, request.height)?;
    Ok(svg_response(svg))
}

async fn render_faults(Json(request): Json<RenderFaultsRequest>) -> Result<Response, AppError> {
    let svg = render_faults_svg(&request.report, request.width, request.height)?;
    Ok(svg_response(svg))
}

fn svg_response(svg: String) -> Response {
    (StatusCode::OK, [("Content-Type", "image/svg+xml")], svg).into_response()
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Runs `f` against Gemini when configured, otherwise against a model that
/// always reports itself unavailable. Must be called on a blocking thread.
fn with_model<T>(
    settings: Option<&GeminiSettings>,
    f: impl FnOnce(&dyn VisionModel) -> T,
) -> T {
    match settings.map(|s| GeminiModel::new(s.clone())) {
        Some(Ok(model)) => f(&model),
        Some(Err(err)) => {
            warn!("Gemini client unavailable: {}", err);
            f(&UnavailableModel)
        }
        None => f(&UnavailableModel),
    }
}

fn decode_image(payload: &ImagePayload) -> Result<ImageInput, AppError> {
    let (data_url_mime, data) = match payload.image.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                AppError::bad_request("Image data URL is missing its payload")
            })?;
            (header.split(';').next().map(str::to_string), data)
        }
        None => (None, payload.image.as_str()),
    };

    let bytes = general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::bad_request(format!("Failed to decode base64 image: {}", e)))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request("Image is empty"));
    }

    let format = payload
        .mime_type
        .as_deref()
        .or(data_url_mime.as_deref())
        .map(ImageFormat::from_mime)
        .unwrap_or_default();
    Ok(ImageInput::new(bytes, format))
}

/// Application error type
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!(message.into()),
        }
    }
}

impl From<LayoutError> for AppError {
    fn from(err: LayoutError) -> Self {
        let status = match err {
            LayoutError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LayoutError::AllPanelsRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            error: err.into(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request error: {}", self.error);
        } else {
            warn!("Rejected request: {}", self.error);
        }

        (
            self.status,
            Json(json!({
                "error": self.error.to_string(),
            })),
        )
            .into_response()
    }
}
