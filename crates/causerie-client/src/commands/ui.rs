//! Panels, sidebar, composer toggles and the notice slot.

use crate::client::ChatClient;
use crate::error::Result;
use crate::events::ClientEvent;
use crate::menus::{MenuState, Panel};

impl ChatClient {
    pub fn toggle_menu(&self, panel: Panel) -> Result<()> {
        self.update_menus(|m| m.toggle(panel))
    }

    pub fn open_menu(&self, panel: Panel) -> Result<()> {
        self.update_menus(|m| m.open(panel))
    }

    pub fn close_menu(&self, panel: Panel) -> Result<()> {
        self.update_menus(|m| m.close(panel))
    }

    /// Outside click: every panel and the sidebar close.
    pub fn close_all_menus(&self) -> Result<()> {
        self.update_menus(MenuState::close_all)
    }

    pub fn set_sidebar(&self, open: bool) -> Result<()> {
        self.update_menus(|m| m.set_sidebar(open))
    }

    pub fn toggle_sidebar(&self) -> Result<()> {
        self.update_menus(|m| {
            let open = m.sidebar_open();
            m.set_sidebar(!open)
        })
    }

    /// Flip the web-search flag sent with every chat request. Closes the
    /// options panel.
    pub fn toggle_web_search(&self) -> Result<bool> {
        let active = {
            let mut state = self.lock()?;
            state.web_search_active = !state.web_search_active;
            state.web_search_active
        };
        tracing::debug!(active, "web search toggled");
        self.close_menu(Panel::Options)?;
        Ok(active)
    }

    pub fn dismiss_notice(&self) {
        self.inner.notifier.dismiss();
    }

    fn update_menus(&self, change: impl FnOnce(&mut MenuState)) -> Result<()> {
        let (before, after) = {
            let mut state = self.lock()?;
            let before = state.menus;
            change(&mut state.menus);
            (before, state.menus)
        };
        if before != after {
            self.emit(ClientEvent::MenusChanged {
                open: after.open_panel(),
                sidebar_open: after.sidebar_open(),
            });
        }
        Ok(())
    }
}
