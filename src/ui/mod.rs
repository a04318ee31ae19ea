//! Page-level event handling
//!
//! Two triggers live on the page: the process button (acknowledges the
//! selected PDFs) and the query button (acknowledges the typed question).
//! The decision logic in [`handlers`] is pure; everything that touches the
//! page goes through the [`Page`] port so the GUI, the CLI and tests can
//! each supply their own surface.

pub mod handlers;
pub mod page;
pub mod terminal;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use page::{dispatch, Bindings, Page, SnapshotPage};
pub use terminal::TerminalPage;

/// Element ids the frontend is built around
pub mod element {
    pub const PROCESS_BUTTON: &str = "process-button";
    pub const PDF_UPLOAD: &str = "pdf-upload";
    pub const QUERY_BUTTON: &str = "query-button";
    pub const QUERY_INPUT: &str = "query-input";
    pub const RESPONSE_TEXT: &str = "response-text";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Process,
    Query,
}

/// One entry of the file-selection input. Handlers never look inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }
}

/// What a handler asks the page to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UiEffect {
    /// Blocking notification the user must dismiss
    Notify { message: String },
    /// Replace the text of the response region
    SetOutput { text: String },
}

impl UiEffect {
    pub fn notify(message: impl Into<String>) -> Self {
        Self::Notify { message: message.into() }
    }

    pub fn set_output(text: impl Into<String>) -> Self {
        Self::SetOutput { text: text.into() }
    }

    /// Push the effect onto a page
    pub fn apply<P: Page + ?Sized>(&self, page: &mut P) {
        match self {
            UiEffect::Notify { message } => page.notify(message),
            UiEffect::SetOutput { text } => page.set_response_text(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_serializes_with_kind_tag() {
        let json = serde_json::to_value(UiEffect::notify("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "notify", "message": "hi"}));

        let json = serde_json::to_value(UiEffect::set_output("x")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "setOutput", "text": "x"}));
    }

    #[test]
    fn test_selected_file_name() {
        assert_eq!(SelectedFile::new("/tmp/docs/report.pdf").name(), "report.pdf");
    }
}
