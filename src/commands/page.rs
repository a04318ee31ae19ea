//! Page clicks routed through the element binding table

use crate::app_state::AppState;
use crate::ui::{SelectedFile, SnapshotPage, UiEffect};
use tauri::State;

/// Click on `element_id` with the page's current inputs.
///
/// Returns the effect for the webview to apply, or `None` for an unbound element.
#[tauri::command]
pub fn on_click(
    state: State<'_, AppState>,
    element_id: String,
    paths: Vec<String>,
    query: String,
) -> Option<UiEffect> {
    let mut page = SnapshotPage {
        selection: paths.into_iter().map(SelectedFile::new).collect(),
        query,
        ..SnapshotPage::default()
    };
    state.bindings.click(&mut page, &element_id)
}
