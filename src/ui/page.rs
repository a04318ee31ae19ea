//! The page port and trigger bindings

use super::{element, handlers, SelectedFile, Trigger, UiEffect};

/// Everything the handlers need from the surface they run on
pub trait Page {
    /// Current contents of the file-selection input
    fn selected_files(&self) -> Vec<SelectedFile>;
    /// Current value of the query input
    fn query_value(&self) -> String;
    /// Blocking notification
    fn notify(&mut self, message: &str);
    /// Plain-text assignment to the response region
    fn set_response_text(&mut self, text: &str);
}

/// Run the handler for `trigger` against `page` and return what it did.
pub fn dispatch<P: Page + ?Sized>(page: &mut P, trigger: Trigger) -> UiEffect {
    let effect = match trigger {
        Trigger::Process => handlers::on_process_click(&page.selected_files()),
        Trigger::Query => handlers::on_query_click(&page.query_value()),
    };
    tracing::debug!("[UI] {:?} -> {:?}", trigger, effect);
    effect.apply(page);
    effect
}

/// Element id -> trigger table, filled once at startup
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    table: Vec<(String, Trigger)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two buttons of the standard page
    pub fn standard() -> Self {
        let mut bindings = Self::new();
        bindings.bind(element::PROCESS_BUTTON, Trigger::Process);
        bindings.bind(element::QUERY_BUTTON, Trigger::Query);
        bindings
    }

    /// Bind an element id; rebinding replaces the previous trigger
    pub fn bind(&mut self, element_id: impl Into<String>, trigger: Trigger) {
        let element_id = element_id.into();
        self.table.retain(|(id, _)| *id != element_id);
        self.table.push((element_id, trigger));
    }

    pub fn trigger_for(&self, element_id: &str) -> Option<Trigger> {
        self.table
            .iter()
            .find(|(id, _)| id == element_id)
            .map(|(_, t)| *t)
    }

    /// Simulate a click on `element_id`. Unbound elements do nothing.
    pub fn click<P: Page + ?Sized>(&self, page: &mut P, element_id: &str) -> Option<UiEffect> {
        let trigger = self.trigger_for(element_id)?;
        Some(dispatch(page, trigger))
    }
}

/// A page built from a one-off input snapshot that records what the handlers did.
///
/// Used by the GUI commands (the webview applies the recorded effects) and by tests.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPage {
    pub selection: Vec<SelectedFile>,
    pub query: String,
    pub notifications: Vec<String>,
    pub response_text: Option<String>,
}

impl Page for SnapshotPage {
    fn selected_files(&self) -> Vec<SelectedFile> {
        self.selection.clone()
    }

    fn query_value(&self) -> String {
        self.query.clone()
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }

    fn set_response_text(&mut self, text: &str) {
        self.response_text = Some(text.to_string());
    }
}
