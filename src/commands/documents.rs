//! Document selection and processing commands

use crate::app_state::{AppState, IndexStatus};
use crate::gemini::GeminiClient;
use crate::ingest::{IngestReport, PROCESSING_COMPLETE_MESSAGE, PROCESSING_FAILED_MESSAGE};
use serde::Serialize;
use std::path::PathBuf;
use tauri::State;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub message: String,
    pub report: IngestReport,
}

#[tauri::command]
pub async fn process_documents(state: State<'_, AppState>, paths: Vec<String>) -> Result<ProcessOutcome, String> {
    let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
    let client = GeminiClient::from_settings()
        .map_err(|e| format!("{} {}", PROCESSING_FAILED_MESSAGE, e))?;

    match state.process(&paths, &client).await {
        Ok(report) => Ok(ProcessOutcome { message: PROCESSING_COMPLETE_MESSAGE.to_string(), report }),
        Err(e) => {
            tracing::error!("[Ingest] Processing failed: {}", e);
            Err(format!("{} {}", PROCESSING_FAILED_MESSAGE, e))
        }
    }
}

#[tauri::command]
pub fn get_index_status(state: State<'_, AppState>) -> IndexStatus {
    state.index_status()
}
