use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::dashboard::{Command, Dashboard, View};
use crate::terminal::state::{AppState, Focus, Overlay};

pub enum Flow {
    Continue(Vec<Command>),
    Quit,
}

fn done() -> Flow {
    Flow::Continue(vec![])
}

pub fn handle_key(key: KeyEvent, state: &mut AppState, dash: &mut Dashboard) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }
    match dash.view() {
        View::Login => handle_login_keys(key, state, dash),
        View::Inbox => {
            if let Some(overlay) = state.overlay {
                return handle_overlay_keys(key, overlay, state, dash);
            }
            match state.focus {
                Focus::Search => handle_search_keys(key, state, dash),
                Focus::Chat => handle_chat_keys(key, state, dash),
                Focus::List | Focus::Body => handle_inbox_keys(key, state, dash),
            }
        }
    }
}

fn handle_login_keys(key: KeyEvent, state: &mut AppState, dash: &mut Dashboard) -> Flow {
    match key.code {
        KeyCode::Esc => return Flow::Quit,
        KeyCode::Tab | KeyCode::Down => state.login.field = state.login.field.next(),
        KeyCode::Backspace => {
            state.login.active_mut().pop();
        }
        KeyCode::F(2) => dash.set_language(dash.lang().next()),
        KeyCode::Enter => {
            dash.set_api_base(&state.login.api_base);
            let cmds = dash.login(&state.login.user_id, &state.login.password);
            if !cmds.is_empty() {
                state.login.password.clear();
            }
            return Flow::Continue(cmds);
        }
        KeyCode::Char(c) => state.login.active_mut().push(c),
        _ => {}
    }
    done()
}

fn handle_inbox_keys(key: KeyEvent, state: &mut AppState, dash: &mut Dashboard) -> Flow {
    let cmds = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Tab => {
            state.toggle_focus();
            vec![]
        }
        KeyCode::Char('/') => {
            state.focus = Focus::Search;
            vec![]
        }
        KeyCode::Char('r') => dash.refresh(),
        KeyCode::Char('g') => {
            dash.toggle_grouped();
            state.clamp_selection(dash.emails().visible().len());
            vec![]
        }
        KeyCode::Char('t') => {
            dash.cycle_kind_filter();
            state.clamp_selection(dash.emails().visible().len());
            vec![]
        }
        KeyCode::Char('n') | KeyCode::Right => {
            let cmds = dash.next_page();
            if !cmds.is_empty() {
                state.list_state.select(Some(0));
            }
            cmds
        }
        KeyCode::Char('p') | KeyCode::Left => {
            let cmds = dash.prev_page();
            if !cmds.is_empty() {
                state.list_state.select(Some(0));
            }
            cmds
        }
        KeyCode::Char('h') => {
            state.open_overlay(Overlay::History);
            dash.open_history()
        }
        KeyCode::Char('u') => {
            state.open_overlay(Overlay::UserCenter);
            dash.refresh_mailboxes()
        }
        KeyCode::Char('N') => {
            state.reset_chat_view();
            dash.new_chat()
        }
        KeyCode::Char('C') => {
            state.reset_chat_view();
            dash.clear_chat()
        }
        KeyCode::Char('L') => {
            dash.set_language(dash.lang().next());
            vec![]
        }
        KeyCode::Char('o') => dash.logout(),
        _ if state.focus == Focus::List => handle_list_keys(key, state, dash),
        _ => {
            handle_body_keys(key, state);
            vec![]
        }
    };
    Flow::Continue(cmds)
}

fn handle_list_keys(key: KeyEvent, state: &mut AppState, dash: &mut Dashboard) -> Vec<Command> {
    let len = dash.emails().visible().len();
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(1, len),
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(-1, len),
        KeyCode::Home => state.list_state.select(Some(0)),
        KeyCode::End => {
            if len > 0 {
                state.list_state.select(Some(len - 1));
            }
        }
        KeyCode::Enter => {
            if let Some(id) = state.current_selected_id(dash) {
                state.body_scroll = 0;
                return dash.select_email(id);
            }
        }
        _ => {}
    }
    vec![]
}

fn handle_body_keys(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.scroll_body(1),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_body(-1),
        KeyCode::PageDown => state.scroll_body(10),
        KeyCode::PageUp => state.scroll_body(-10),
        KeyCode::Home => state.body_scroll = 0,
        _ => {}
    }
}

fn handle_search_keys(key: KeyEvent, state: &mut AppState, dash: &mut Dashboard) -> Flow {
    match key.code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Tab => state.focus = Focus::List,
        KeyCode::Backspace => {
            state.search_input.pop();
        }
        KeyCode::Char(c) => state.search_input.push(c),
        _ => return done(),
    }
    dash.set_query(&state.search_input);
    state.clamp_selection(dash.emails().visible().len());
    done()
}

fn handle_chat_keys(key: KeyEvent, state: &mut AppState, dash: &mut Dashboard) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        let messages = dash.chat().messages();
        match key.code {
            KeyCode::Char('o') => state.toggle_cited(messages),
            KeyCode::Char('p') => state.move_cited(-1, messages),
            KeyCode::Char('n') => state.move_cited(1, messages),
            _ => {}
        }
        return done();
    }
    match key.code {
        KeyCode::Esc => state.focus = Focus::List,
        KeyCode::Tab => state.toggle_focus(),
        KeyCode::Up => state.scroll_chat(-1),
        KeyCode::Down => state.scroll_chat(1),
        KeyCode::Backspace => {
            state.chat_input.pop();
        }
        KeyCode::Enter => {
            let cmds = dash.send(&state.chat_input);
            if !cmds.is_empty() {
                state.chat_input.clear();
            }
            return Flow::Continue(cmds);
        }
        KeyCode::Char(c) => state.chat_input.push(c),
        _ => {}
    }
    done()
}

fn handle_overlay_keys(
    key: KeyEvent,
    overlay: Overlay,
    state: &mut AppState,
    dash: &mut Dashboard,
) -> Flow {
    let len = match overlay {
        Overlay::History => dash.chat().sessions().len(),
        Overlay::UserCenter => dash.linker().mailboxes().len(),
    };
    let cmds = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.overlay = None;
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.move_overlay(1, len);
            vec![]
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.move_overlay(-1, len);
            vec![]
        }
        KeyCode::Enter if overlay == Overlay::History => {
            let picked = state
                .overlay_state
                .selected()
                .and_then(|i| dash.chat().sessions().get(i))
                .map(|s| s.chat_id.clone());
            match picked {
                Some(chat_id) => {
                    state.overlay = None;
                    state.reset_chat_view();
                    dash.switch_session(&chat_id)
                }
                None => vec![],
            }
        }
        KeyCode::Char('c') if overlay == Overlay::UserCenter => dash.connect_gmail(),
        KeyCode::Char('s') if overlay == Overlay::UserCenter => {
            let picked = state
                .overlay_state
                .selected()
                .and_then(|i| dash.linker().mailboxes().get(i))
                .map(|m| m.provider.clone());
            match picked {
                Some(email) => dash.sync_mailbox(&email),
                None => vec![],
            }
        }
        KeyCode::Char('v') if overlay == Overlay::UserCenter => {
            dash.toggle_layout();
            vec![]
        }
        KeyCode::Char('r') if overlay == Overlay::UserCenter => dash.refresh_mailboxes(),
        KeyCode::Char('L') => {
            dash.set_language(dash.lang().next());
            vec![]
        }
        _ => vec![],
    };
    Flow::Continue(cmds)
}
