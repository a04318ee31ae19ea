//! Page backed by a terminal: notifications on stderr, the response region on stdout

use super::{Page, SelectedFile};
use std::io::{self, Stderr, Stdout, Write};

pub struct TerminalPage<O: Write, E: Write> {
    selection: Vec<SelectedFile>,
    query: String,
    out: O,
    err: E,
}

impl TerminalPage<Stdout, Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalPage<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { selection: Vec::new(), query: String::new(), out, err }
    }

    pub fn select(&mut self, selection: Vec<SelectedFile>) {
        self.selection = selection;
    }

    pub fn type_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> Page for TerminalPage<O, E> {
    fn selected_files(&self) -> Vec<SelectedFile> {
        self.selection.clone()
    }

    fn query_value(&self) -> String {
        self.query.clone()
    }

    fn notify(&mut self, message: &str) {
        let _ = writeln!(self.err, "[!] {}", message);
        let _ = self.err.flush();
    }

    fn set_response_text(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{element, Bindings};

    #[test]
    fn test_notifications_go_to_err_output_to_out() {
        let bindings = Bindings::standard();
        let mut page = TerminalPage::new(Vec::new(), Vec::new());
        bindings.click(&mut page, element::PROCESS_BUTTON);
        page.type_query("weather");
        bindings.click(&mut page, element::QUERY_BUTTON);

        let (out, err) = page.into_writers();
        assert_eq!(String::from_utf8(out).unwrap(), "Fetching response for: \"weather\"\n");
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "[!] Please select one or more PDF files.\n"
        );
    }
}
