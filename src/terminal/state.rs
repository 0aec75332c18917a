use std::collections::HashSet;

use ratatui::widgets::ListState;

use crate::dashboard::Dashboard;
use crate::domain::chat::{ChatMessage, Role};
use crate::domain::email::EmailId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Search,
    Body,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    History,
    UserCenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    ApiBase,
    UserId,
    Password,
}

impl LoginField {
    pub fn next(self) -> Self {
        match self {
            LoginField::ApiBase => LoginField::UserId,
            LoginField::UserId => LoginField::Password,
            LoginField::Password => LoginField::ApiBase,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub api_base: String,
    pub user_id: String,
    pub password: String,
    pub field: LoginField,
}

impl LoginForm {
    pub fn active_mut(&mut self) -> &mut String {
        match self.field {
            LoginField::ApiBase => &mut self.api_base,
            LoginField::UserId => &mut self.user_id,
            LoginField::Password => &mut self.password,
        }
    }
}

/// Terminal-only state: cursor positions, inputs and overlays. Everything
/// the backend knows about lives in [`Dashboard`].
pub struct AppState {
    pub login: LoginForm,
    pub list_state: ListState,
    pub body_scroll: u16,
    pub chat_scroll: u16,
    pub chat_input: String,
    pub search_input: String,
    pub focus: Focus,
    pub overlay: Option<Overlay>,
    pub overlay_state: ListState,
    /// Indices of chat messages whose citations are unfolded.
    pub expanded_sources: HashSet<usize>,
    /// Answer that Ctrl-O acts on; `None` means the newest cited one.
    pub cited_cursor: Option<usize>,
}

impl AppState {
    pub fn new(dash: &Dashboard) -> Self {
        let mut s = Self {
            login: LoginForm {
                api_base: dash.session().api_base().to_string(),
                ..LoginForm::default()
            },
            list_state: ListState::default(),
            body_scroll: 0,
            chat_scroll: 0,
            chat_input: String::new(),
            search_input: String::new(),
            focus: Focus::List,
            overlay: None,
            overlay_state: ListState::default(),
            expanded_sources: HashSet::new(),
            cited_cursor: None,
        };
        s.list_state.select(Some(0));
        s
    }

    /// Id of the highlighted row among the filtered items.
    pub fn current_selected_id(&self, dash: &Dashboard) -> Option<EmailId> {
        let idx = self.list_state.selected()?;
        dash.emails().visible().get(idx).map(|e| e.id)
    }

    pub fn move_selection(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        self.list_state.select(Some(next));
    }

    /// Keep the cursor inside the list after it was replaced or filtered.
    pub fn clamp_selection(&mut self, len: usize) {
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn move_overlay(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.overlay_state.select(None);
            return;
        }
        let cur = self.overlay_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        self.overlay_state.select(Some(next));
    }

    pub fn open_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
        self.overlay_state.select(Some(0));
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::List | Focus::Search => Focus::Body,
            Focus::Body => Focus::Chat,
            Focus::Chat => Focus::List,
        };
    }

    pub fn scroll_body(&mut self, delta: i32) {
        self.body_scroll = scroll(self.body_scroll, delta);
    }

    pub fn scroll_chat(&mut self, delta: i32) {
        self.chat_scroll = scroll(self.chat_scroll, delta);
    }

    pub fn toggle_sources(&mut self, index: usize) {
        if !self.expanded_sources.remove(&index) {
            self.expanded_sources.insert(index);
        }
    }

    /// Answer the citation keys act on.
    pub fn cited_target(&self, messages: &[ChatMessage]) -> Option<usize> {
        let cited = cited_answers(messages);
        match self.cited_cursor {
            Some(i) if cited.contains(&i) => Some(i),
            _ => cited.last().copied(),
        }
    }

    /// Step the cursor to an older (`-1`) or newer (`1`) cited answer.
    pub fn move_cited(&mut self, delta: i32, messages: &[ChatMessage]) {
        let cited = cited_answers(messages);
        let Some(current) = self.cited_target(messages) else {
            return;
        };
        let pos = cited.iter().position(|&i| i == current).unwrap_or(0) as i32;
        let next = (pos + delta).clamp(0, cited.len() as i32 - 1) as usize;
        self.cited_cursor = Some(cited[next]);
    }

    pub fn toggle_cited(&mut self, messages: &[ChatMessage]) {
        if let Some(i) = self.cited_target(messages) {
            self.toggle_sources(i);
        }
    }

    /// Forget per-conversation UI state when the message log is replaced.
    pub fn reset_chat_view(&mut self) {
        self.expanded_sources.clear();
        self.cited_cursor = None;
        self.chat_scroll = 0;
    }
}

fn cited_answers(messages: &[ChatMessage]) -> Vec<usize> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == Role::Bot && !m.sources.is_empty())
        .map(|(i, _)| i)
        .collect()
}

fn scroll(pos: u16, delta: i32) -> u16 {
    if delta < 0 {
        pos.saturating_sub(delta.unsigned_abs() as u16)
    } else {
        pos.saturating_add(delta as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::chat::Source;
    use crate::store::MemoryKvStore;

    #[test]
    fn selection_is_clamped_to_list() {
        let dash = Dashboard::new(Box::new(MemoryKvStore::new()), &Config::default());
        let mut state = AppState::new(&dash);
        state.move_selection(5, 3);
        assert_eq!(state.list_state.selected(), Some(2));
        state.move_selection(-10, 3);
        assert_eq!(state.list_state.selected(), Some(0));
        state.move_selection(1, 0);
        assert_eq!(state.list_state.selected(), None);
        state.clamp_selection(2);
        assert_eq!(state.list_state.selected(), Some(0));
    }

    #[test]
    fn citations_of_older_answers_can_be_opened() {
        let dash = Dashboard::new(Box::new(MemoryKvStore::new()), &Config::default());
        let mut state = AppState::new(&dash);
        let cited = |text: &str| ChatMessage::bot(text, vec![Source::default()]);
        let messages = vec![
            ChatMessage::user("q1"),
            cited("a1"),
            ChatMessage::user("q2"),
            ChatMessage::bot("a2", vec![]),
            ChatMessage::user("q3"),
            cited("a3"),
        ];

        assert_eq!(state.cited_target(&messages), Some(5));
        state.move_cited(-1, &messages);
        assert_eq!(state.cited_target(&messages), Some(1));
        state.move_cited(-1, &messages);
        assert_eq!(state.cited_target(&messages), Some(1));

        state.toggle_cited(&messages);
        assert!(state.expanded_sources.contains(&1));
        assert!(!state.expanded_sources.contains(&5));

        state.move_cited(1, &messages);
        state.toggle_cited(&messages);
        assert!(state.expanded_sources.contains(&5));

        state.reset_chat_view();
        assert!(state.expanded_sources.is_empty());
        assert_eq!(state.cited_target(&[]), None);
    }

    #[test]
    fn focus_cycles_through_panes() {
        let dash = Dashboard::new(Box::new(MemoryKvStore::new()), &Config::default());
        let mut state = AppState::new(&dash);
        state.toggle_focus();
        assert_eq!(state.focus, Focus::Body);
        state.toggle_focus();
        assert_eq!(state.focus, Focus::Chat);
        state.toggle_focus();
        assert_eq!(state.focus, Focus::List);
    }
}
