use super::AppState;
use super::form::UploadForm;
use super::staging::StagingArea;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use serde::Serialize;
use serde_json::{Value, json};
use simana::analysis::error::AnalysisError;
use simana::core::io::load;
use simana::core::io::pdb::PdbFile;
use simana::core::io::traits::MolecularFile;
use simana::workflows;
use thiserror::Error;
use tracing::{info, warn};

const STRUCTURE_FIELD: &str = "pdb_file";
const TRAJECTORY_FIELDS: &[&str] = &["trajectory_file", "xtc_file"];

/// Anything that can go wrong between receiving a request and producing its report.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Converts an outcome to the response body: the report itself, or `{ "error": ... }`.
fn respond<T: Serialize>(endpoint: &str, outcome: Result<T, RequestError>) -> Json<Value> {
    match outcome.and_then(|report| Ok(serde_json::to_value(report)?)) {
        Ok(value) => {
            info!(endpoint, "Request completed.");
            Json(value)
        }
        Err(e) => {
            warn!(endpoint, error = %e, "Request failed.");
            Json(json!({ "error": e.to_string() }))
        }
    }
}

async fn read_form(mut multipart: Multipart, staging: &StagingArea) -> Result<UploadForm, RequestError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match field.file_name().map(str::to_owned) {
            Some(file_name) => {
                let contents = field.bytes().await?;
                let path = staging.stage(&name, &file_name, &contents).await?;
                form.insert_file(name, path);
            }
            None => {
                let value = field.text().await?;
                form.insert_field(name, value);
            }
        }
    }
    Ok(form)
}

/// Stages the upload, then runs `job` on the blocking pool.
///
/// The staging directory moves into the blocking task and is removed when it finishes,
/// whatever the outcome.
async fn analyze<T, F>(state: AppState, multipart: Multipart, job: F) -> Result<T, RequestError>
where
    T: Send + 'static,
    F: FnOnce(&AppState, &UploadForm) -> Result<T, AnalysisError> + Send + 'static,
{
    let staging = StagingArea::new(state.config.staging_dir.as_deref())?;
    let form = read_form(multipart, &staging).await?;

    let report = tokio::task::spawn_blocking(move || {
        let outcome = job(&state, &form);
        drop(staging);
        outcome
    })
    .await??;
    Ok(report)
}

pub async fn contact_map(State(state): State<AppState>, multipart: Multipart) -> Json<Value> {
    let outcome = analyze(state, multipart, |state, form| {
        let config = form.contact_map_config(&state.config.analysis)?;
        let (system, _) = PdbFile::read_from_path(form.require_file(STRUCTURE_FIELD)?)?;
        workflows::contact_map::run(
            &system,
            &config,
            state.renderer.as_ref(),
            state.capabilities.as_ref(),
        )
    })
    .await;
    respond("contact_map", outcome)
}

pub async fn dccm(State(state): State<AppState>, multipart: Multipart) -> Json<Value> {
    let outcome = analyze(state, multipart, |state, form| {
        let config = form.dccm_config(&state.config.analysis)?;
        let structure = form.require_file(STRUCTURE_FIELD)?;
        let trajectory = form.file(TRAJECTORY_FIELDS);
        let (system, trajectory) = load(structure, trajectory.map(|p| p.as_path()))?;
        workflows::dccm::run(
            &system,
            trajectory,
            &config,
            state.renderer.as_ref(),
            state.capabilities.as_ref(),
        )
    })
    .await;
    respond("dccm", outcome)
}

pub async fn bfactor(State(state): State<AppState>, multipart: Multipart) -> Json<Value> {
    let outcome = analyze(state, multipart, |state, form| {
        let config = form.bfactor_config(&state.config.analysis)?;
        let (system, _) = PdbFile::read_from_path(form.require_file(STRUCTURE_FIELD)?)?;
        workflows::bfactor::run(
            &system,
            &config,
            state.renderer.as_ref(),
            state.capabilities.as_ref(),
        )
    })
    .await;
    respond("bfactor", outcome)
}

pub async fn ramachandran(State(state): State<AppState>, multipart: Multipart) -> Json<Value> {
    let outcome = analyze(state, multipart, |state, form| {
        let config = form.ramachandran_config(&state.config.analysis)?;
        let (system, models) = load(form.require_file(STRUCTURE_FIELD)?, None)?;
        workflows::ramachandran::run(
            &system,
            &models,
            &config,
            state.renderer.as_ref(),
            state.capabilities.as_ref(),
        )
    })
    .await;
    respond("ramachandran", outcome)
}
