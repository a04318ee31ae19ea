//! pdfchat CLI - process PDFs and ask questions about them from the terminal
//!
//! Usage: pdfchat-cli [OPTIONS] <COMMAND>
//!
//! `process` builds the index, `ask` and `chat` query it. The index lives in
//! the app data directory so both can run in separate invocations.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use pdfchat_lib::app_state::AppState;
use pdfchat_lib::gemini::GeminiClient;
use pdfchat_lib::ingest::{PROCESSING_COMPLETE_MESSAGE, PROCESSING_FAILED_MESSAGE};
use pdfchat_lib::session::ReplyKind;
use pdfchat_lib::ui::{element, Bindings, SelectedFile, TerminalPage, UiEffect};
use pdfchat_lib::vector_store::VectorStore;
use pdfchat_lib::{logging, settings};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfchat-cli")]
#[command(version, about = "Chat with your PDF documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// App data directory (settings and index)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk and embed PDF files, replacing the current index
    Process {
        /// PDF files to process
        files: Vec<PathBuf>,
    },
    /// Ask a single question about the processed documents
    Ask {
        /// The question
        question: Option<String>,
    },
    /// Interactive question loop (type "exit" to leave)
    Chat,
    /// Show what is currently indexed
    Status,
    /// Delete the saved index
    Reset,
    /// Configuration settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all settings
    List,
    /// Get a setting value
    Get {
        /// Setting key
        key: String,
    },
    /// Set a setting value
    Set {
        /// Setting key
        key: String,
        /// Setting value
        value: String,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<(), String> {
    // Handle completions first (no settings needed)
    if let Commands::Completions { shell } = &cli.command {
        generate(*shell, &mut Cli::command(), "pdfchat-cli", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(settings::default_data_dir);
    settings::init(data_dir);

    let bindings = Bindings::standard();

    match cli.command {
        Commands::Process { files } => handle_process(&bindings, files, cli.json).await,
        Commands::Ask { question } => handle_ask(&bindings, question.unwrap_or_default(), cli.json).await,
        Commands::Chat => handle_chat(&bindings).await,
        Commands::Status => handle_status(cli.json),
        Commands::Reset => VectorStore::delete(&settings::index_path()).map_err(|e| e.to_string()),
        Commands::Config { cmd } => handle_config(cmd, cli.json),
        Commands::Completions { .. } => unreachable!(),
    }
}

/// True when the query button accepted the typed question
fn click_query(bindings: &Bindings, query: &str) -> bool {
    let mut page = TerminalPage::stdio();
    page.type_query(query);
    matches!(
        bindings.click(&mut page, element::QUERY_BUTTON),
        Some(UiEffect::SetOutput { .. })
    )
}

async fn handle_process(bindings: &Bindings, files: Vec<PathBuf>, json: bool) -> Result<(), String> {
    let mut page = TerminalPage::stdio();
    page.select(files.iter().cloned().map(SelectedFile::new).collect());
    bindings.click(&mut page, element::PROCESS_BUTTON);

    if files.is_empty() {
        return Ok(());
    }

    let client = GeminiClient::from_settings()
        .map_err(|e| format!("{} {}", PROCESSING_FAILED_MESSAGE, e))?;
    let state = AppState::new(settings::index_path());

    let report = state
        .process(&files, &client)
        .await
        .map_err(|e| format!("{} {}", PROCESSING_FAILED_MESSAGE, e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?);
    } else {
        println!("{}", report.summary());
        println!("{}", PROCESSING_COMPLETE_MESSAGE);
    }
    Ok(())
}

async fn handle_ask(bindings: &Bindings, question: String, json: bool) -> Result<(), String> {
    if !click_query(bindings, &question) {
        return Ok(());
    }

    let state = AppState::restore(settings::index_path());
    let reply = state
        .ask_connecting(&question, &mut None, GeminiClient::from_settings)
        .await
        .map_err(|e| e.to_string())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply).map_err(|e| e.to_string())?);
    } else {
        println!("{}", reply.content);
    }

    if reply.kind == ReplyKind::Error {
        return Err("question could not be answered".to_string());
    }
    Ok(())
}

async fn handle_chat(bindings: &Bindings) -> Result<(), String> {
    let state = AppState::restore(settings::index_path());
    // Built on the first question that needs it
    let mut client: Option<GeminiClient> = None;

    if !state.index_status().ready {
        eprintln!("No documents processed yet. Run `pdfchat-cli process <FILES>` first.");
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush().map_err(|e| e.to_string())?;

        let Some(line) = lines.next() else { break };
        let line = line.map_err(|e| e.to_string())?;
        let query = line.as_str();
        if matches!(query.trim(), "exit" | "quit") {
            break;
        }

        if !click_query(bindings, query) {
            continue;
        }

        let reply = state
            .ask_connecting(query, &mut client, GeminiClient::from_settings)
            .await
            .map_err(|e| e.to_string())?;
        println!("\n{}\n", reply.content);
    }
    Ok(())
}

fn handle_status(json: bool) -> Result<(), String> {
    let state = AppState::restore(settings::index_path());
    let status = state.index_status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status).map_err(|e| e.to_string())?);
        return Ok(());
    }

    if !status.ready {
        println!("No documents processed.");
        return Ok(());
    }
    println!("Index:     {}", state.index_path.display());
    println!("Created:   {}", status.created_at.as_deref().unwrap_or("unknown"));
    println!("Chunks:    {}", status.chunk_count);
    println!("Documents:");
    for name in &status.documents {
        println!("  {}", name);
    }
    Ok(())
}

fn handle_config(cmd: ConfigCommands, json: bool) -> Result<(), String> {
    match cmd {
        ConfigCommands::List => {
            let s = settings::get();
            let masked = settings::get_masked_api_key();
            if json {
                let value = serde_json::json!({
                    "google_api_key": masked,
                    "google_api_key_source": settings::api_key_source(),
                    "chat_model": s.chat_model,
                    "embedding_model": s.embedding_model,
                    "temperature": s.temperature,
                    "chunk_size": s.chunk_size,
                    "chunk_overlap": s.chunk_overlap,
                    "top_k": s.top_k,
                });
                println!("{}", serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?);
            } else {
                println!(
                    "google-api-key:  {} ({})",
                    masked.as_deref().unwrap_or("not set"),
                    settings::api_key_source()
                );
                println!("chat-model:      {}", s.chat_model);
                println!("embedding-model: {}", s.embedding_model);
                println!("temperature:     {:.2}", s.temperature);
                println!("chunk-size:      {}", s.chunk_size);
                println!("chunk-overlap:   {}", s.chunk_overlap);
                println!("top-k:           {}", s.top_k);
                println!("data-dir:        {}", settings::data_dir().display());
            }
        }
        ConfigCommands::Get { key } => {
            let s = settings::get();
            let value = match key.as_str() {
                "google-api-key" => settings::get_masked_api_key().unwrap_or_else(|| "not set".to_string()),
                "chat-model" => s.chat_model,
                "embedding-model" => s.embedding_model,
                "temperature" => s.temperature.to_string(),
                "chunk-size" => s.chunk_size.to_string(),
                "chunk-overlap" => s.chunk_overlap.to_string(),
                "top-k" => s.top_k.to_string(),
                _ => return Err(format!("Unknown config key: {}", key)),
            };
            println!("{}", value);
        }
        ConfigCommands::Set { key, value } => {
            settings::update(|s| s.set_value(&key, &value)).map_err(|e| e.to_string())?;
            println!("{} updated", key);
        }
    }
    Ok(())
}
