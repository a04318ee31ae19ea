pub mod app_state;
pub mod chunking;
pub mod error;
pub mod gemini;
pub mod ingest;
pub mod logging;
pub mod pdf;
pub mod qa;
pub mod session;
pub mod settings;
pub mod similarity;
pub mod ui;
pub mod vector_store;

#[cfg(feature = "gui")]
mod commands;

pub use error::{Error, Result};

#[cfg(feature = "gui")]
use commands::{
    // Page
    on_click,
    // Documents
    process_documents, get_index_status,
    // Chat
    ask_question, get_chat_history, clear_chat_history,
    // API key
    get_api_key_status, save_api_key, clear_api_key,
};

#[cfg(feature = "gui")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    logging::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_data_dir = app
                .path()
                .app_data_dir()
                .unwrap_or_else(|_| std::path::PathBuf::from("."));
            std::fs::create_dir_all(&app_data_dir).ok();
            tracing::info!("Using app data directory: {:?}", app_data_dir);

            settings::init(app_data_dir);
            app.manage(app_state::AppState::restore(settings::index_path()));

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Page
            on_click,
            // Documents
            process_documents,
            get_index_status,
            // Chat
            ask_question,
            get_chat_history,
            clear_chat_history,
            // API key
            get_api_key_status,
            save_api_key,
            clear_api_key,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
