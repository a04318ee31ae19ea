//! Click handlers as pure functions of the current input snapshot

use super::{SelectedFile, UiEffect};

pub const EMPTY_SELECTION_MESSAGE: &str = "Please select one or more PDF files.";
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a question.";

/// Process button: acknowledge how many PDFs are selected.
pub fn on_process_click(selection: &[SelectedFile]) -> UiEffect {
    if selection.is_empty() {
        return UiEffect::notify(EMPTY_SELECTION_MESSAGE);
    }
    UiEffect::notify(format!("{} PDF(s) selected for processing.", selection.len()))
}

/// Query button: echo the question into the response region.
///
/// The text is plain text; quotes or markup in the query are kept verbatim.
pub fn on_query_click(query: &str) -> UiEffect {
    if query.is_empty() {
        return UiEffect::notify(EMPTY_QUERY_MESSAGE);
    }
    UiEffect::set_output(fetching_message(query))
}

pub fn fetching_message(query: &str) -> String {
    format!("Fetching response for: \"{}\"", query)
}
