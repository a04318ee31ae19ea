//! Question and chat history commands

use crate::app_state::AppState;
use crate::gemini::GeminiClient;
use crate::session::{ChatMessage, ChatReply};
use tauri::State;

#[tauri::command]
pub async fn ask_question(state: State<'_, AppState>, query: String) -> Result<ChatReply, String> {
    state
        .ask_connecting(&query, &mut None, GeminiClient::from_settings)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_chat_history(state: State<'_, AppState>) -> Result<Vec<ChatMessage>, String> {
    state
        .session
        .read()
        .map(|s| s.history().to_vec())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn clear_chat_history(state: State<'_, AppState>) -> Result<(), String> {
    state
        .session
        .write()
        .map(|mut s| s.clear_history())
        .map_err(|e| e.to_string())
}
