//! Mutually exclusive pop-up panels plus the sidebar flag.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Attach,
    Options,
    Emoji,
}

/// At most one panel is open at a time; the type makes any other state
/// unrepresentable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    open: Option<Panel>,
    sidebar_open: bool,
}

impl MenuState {
    pub fn open_panel(&self) -> Option<Panel> {
        self.open
    }

    pub fn is_open(&self, panel: Panel) -> bool {
        self.open == Some(panel)
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    /// Open `panel`, closing whichever other panel was open.
    pub fn open(&mut self, panel: Panel) {
        self.open = Some(panel);
    }

    pub fn close(&mut self, panel: Panel) {
        if self.open == Some(panel) {
            self.open = None;
        }
    }

    /// Flip `panel`; opening it closes the others.
    pub fn toggle(&mut self, panel: Panel) {
        if self.is_open(panel) {
            self.open = None;
        } else {
            self.open = Some(panel);
        }
    }

    pub fn set_sidebar(&mut self, open: bool) {
        self.sidebar_open = open;
    }

    /// Outside click or navigation: everything closes.
    pub fn close_all(&mut self) {
        self.open = None;
        self.sidebar_open = false;
    }
}
