//! Settings-related Tauri commands

use crate::settings;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStatus {
    pub has_key: bool,
    pub masked_key: Option<String>,
    pub source: String, // "env", "settings", or "none"
}

#[tauri::command]
pub fn get_api_key_status() -> ApiKeyStatus {
    ApiKeyStatus {
        has_key: settings::has_api_key(),
        masked_key: settings::get_masked_api_key(),
        source: settings::api_key_source().to_string(),
    }
}

#[tauri::command]
pub fn save_api_key(key: String) -> Result<(), String> {
    settings::set_api_key(key.trim().to_string()).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn clear_api_key() -> Result<(), String> {
    settings::set_api_key(String::new()).map_err(|e| e.to_string())
}
