use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::dashboard::emails::KindFilter;
use crate::dashboard::status::Severity;
use crate::dashboard::{Dashboard, ProfileLayout, View};
use crate::domain::chat::Role;
use crate::domain::email::{Quadrant, group_by_quadrant};
use crate::domain::format_timestamp;
use crate::i18n::{Lang, tui};
use crate::markdown;
use crate::terminal::state::{AppState, Focus, LoginField, Overlay};

fn border(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn render(f: &mut Frame, state: &mut AppState, dash: &Dashboard) {
    let [main, status, footer] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    match dash.view() {
        View::Login => render_login(f, main, state, dash),
        View::Inbox => {
            render_inbox(f, main, state, dash);
            match state.overlay {
                Some(Overlay::History) => render_history(f, state, dash),
                Some(Overlay::UserCenter) => render_user_center(f, state, dash),
                None => {}
            }
        }
    }
    render_status(f, status, dash);
    render_footer(f, footer, state, dash);
}

fn quadrant_label(q: Quadrant, lang: Lang) -> &'static str {
    match q {
        Quadrant::UrgentImportant => tui::quadrant_do_first(lang),
        Quadrant::NotUrgentImportant => tui::quadrant_schedule(lang),
        Quadrant::UrgentNotImportant => tui::quadrant_delegate(lang),
        Quadrant::NotUrgentNotImportant => tui::quadrant_later(lang),
    }
}

fn quadrant_color(q: Quadrant) -> Color {
    match q {
        Quadrant::UrgentImportant => Color::Red,
        Quadrant::NotUrgentImportant => Color::Blue,
        Quadrant::UrgentNotImportant => Color::LightYellow,
        Quadrant::NotUrgentNotImportant => Color::Gray,
    }
}

fn kind_label(kind: KindFilter, lang: Lang) -> &'static str {
    match kind {
        KindFilter::All => tui::kind_all(lang),
        KindFilter::Primary => tui::kind_primary(lang),
        KindFilter::Promotions => tui::kind_promotions(lang),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn render_login(f: &mut Frame, area: Rect, state: &AppState, dash: &Dashboard) {
    let lang = dash.lang();
    let area = centered(area, 60.min(area.width), 11.min(area.height));
    let block = Block::default()
        .title(format!(" {} ", tui::sign_in_title(lang)))
        .borders(Borders::ALL)
        .border_style(border(true));

    let form = &state.login;
    let masked = "•".repeat(form.password.chars().count());
    let field = |label: &str, value: &str, which: LoginField| {
        let active = form.field == which;
        let cursor = if active { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:>10}: "), if active { bold() } else { dim() }),
            Span::raw(format!("{value}{cursor}")),
        ])
    };

    let mut lines = vec![
        Line::default(),
        field(tui::api_base(lang), &form.api_base, LoginField::ApiBase),
        Line::default(),
        field(tui::user_id(lang), &form.user_id, LoginField::UserId),
        Line::default(),
        field(tui::password(lang), &masked, LoginField::Password),
        Line::default(),
    ];
    if dash.session().login_pending() {
        lines.push(Line::styled(format!("  {}", tui::signing_in(lang)), dim()));
    }

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_inbox(f: &mut Frame, area: Rect, state: &mut AppState, dash: &Dashboard) {
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
            .margin(1)
            .areas(area);
    let [search, list] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(left);
    let [body, chat] =
        Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(right);

    render_search(f, search, state, dash.lang());
    render_list(f, list, state, dash);
    render_detail(f, body, state, dash);
    render_chat(f, chat, state, dash);
}

fn render_search(f: &mut Frame, area: Rect, state: &AppState, lang: Lang) {
    let active = state.focus == Focus::Search;
    let text = if state.search_input.is_empty() && !active {
        Span::styled(tui::search_hint(lang), dim())
    } else {
        Span::raw(format!("{}{}", state.search_input, if active { "▏" } else { "" }))
    };
    let p = Paragraph::new(Line::from(text)).block(
        Block::default()
            .title(format!(" {} ", tui::search_title(lang)))
            .borders(Borders::ALL)
            .border_style(border(active)),
    );
    f.render_widget(p, area);
}

fn render_list(f: &mut Frame, area: Rect, state: &mut AppState, dash: &Dashboard) {
    let lang = dash.lang();
    let emails = dash.emails();
    let arrow = |enabled: bool, s: &'static str| {
        Span::styled(s, if enabled { bold() } else { Style::default().fg(Color::DarkGray) })
    };
    let mut title = vec![
        Span::raw(format!(" {} ", tui::inbox_title(lang))),
        arrow(emails.has_prev(), "◀"),
        Span::raw(format!(" {}/{} ", emails.page(), emails.total_pages())),
        arrow(emails.has_next(), "▶"),
        Span::raw(if emails.is_loading() { " … " } else { " " }),
    ];
    if emails.kind() != KindFilter::All {
        title.push(Span::styled(
            format!("[{}] ", kind_label(emails.kind(), lang)),
            Style::default().fg(Color::Magenta),
        ));
    }

    let visible = emails.visible();
    let mut block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(border(state.focus == Focus::List));
    if emails.is_grouped() {
        let mut counts = vec![Span::raw(" ")];
        for (q, group) in group_by_quadrant(visible.iter().copied()) {
            counts.push(Span::styled(
                format!("{} {}", quadrant_label(q, lang), group.len()),
                Style::default().fg(quadrant_color(q)),
            ));
            counts.push(Span::raw(" "));
        }
        block = block.title_bottom(Line::from(counts));
    }

    state.clamp_selection(visible.len());
    let selected = dash.detail().selected_id();

    let items: Vec<ListItem> = visible
        .iter()
        .map(|e| {
            let mut head = vec![];
            if emails.is_grouped() {
                let q = e.priority();
                head.push(Span::styled("▌", Style::default().fg(quadrant_color(q))));
            }
            head.push(Span::styled(e.sender.clone(), bold()));
            if e.is_promotion {
                head.push(Span::styled(
                    format!(" [{}]", tui::promo_tag(lang)),
                    Style::default().fg(Color::Magenta),
                ));
            }
            if selected == Some(e.id) {
                head.push(Span::styled(" ●", Style::default().fg(Color::Cyan)));
            }
            let when = e.timestamp.as_deref().map(format_timestamp).unwrap_or_default();
            ListItem::new(Text::from(vec![
                Line::from(head),
                Line::from(e.subject.clone()),
                Line::styled(when, dim()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));

    f.render_stateful_widget(list, area, &mut state.list_state);
}

fn render_detail(f: &mut Frame, area: Rect, state: &AppState, dash: &Dashboard) {
    let lang = dash.lang();
    let block = Block::default()
        .title(format!(" {} ", tui::email_title(lang)))
        .borders(Borders::ALL)
        .border_style(border(state.focus == Focus::Body));

    let Some(d) = dash.detail().current() else {
        let hint = if dash.emails().items().is_empty() {
            tui::no_emails_hint(lang)
        } else {
            tui::select_hint(lang)
        };
        f.render_widget(Paragraph::new(hint).style(dim()).block(block), area);
        return;
    };

    let s = &d.summary;
    let mut lines = vec![
        Line::styled(s.subject.clone(), bold()),
        Line::from(vec![
            Span::styled(format!("{}: ", tui::from(lang)), dim()),
            Span::raw(s.sender.clone()),
        ]),
    ];
    if let Some(ts) = &s.timestamp {
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", tui::time(lang)), dim()),
            Span::raw(format_timestamp(ts)),
        ]));
    }
    if !d.recipients.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", tui::to(lang)), dim()),
            Span::raw(d.recipients.join(", ")),
        ]));
    }

    let mut chips = vec![Span::styled(
        format!("{} {:.2}", tui::importance(lang), s.importance_score),
        Style::default().fg(Color::Cyan),
    )];
    if s.quadrant.is_some() {
        let q = s.priority();
        chips.push(Span::raw("  "));
        chips.push(Span::styled(quadrant_label(q, lang), Style::default().fg(quadrant_color(q))));
    }
    if s.is_promotion {
        chips.push(Span::raw("  "));
        chips.push(Span::styled(tui::promotion(lang), Style::default().fg(Color::Magenta)));
    }
    lines.push(Line::from(chips));

    let ids: Vec<String> = [("thread", &d.thread_id), ("id", &d.external_id)]
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k} {v}")))
        .collect();
    if !ids.is_empty() {
        lines.push(Line::styled(ids.join("  "), Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::default());

    if d.loading {
        lines.push(Line::styled(tui::loading(lang), dim()));
    } else {
        if let Some(err) = &d.error {
            lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
        }
        lines.extend(d.body().lines().map(|l| Line::from(l.to_string())));
    }

    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.body_scroll, 0));
    f.render_widget(p, area);
}

fn render_chat(f: &mut Frame, area: Rect, state: &AppState, dash: &Dashboard) {
    let [log, input] = Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);
    let lang = dash.lang();
    let chat = dash.chat();
    let active = state.focus == Focus::Chat;
    let target = state.cited_target(chat.messages());

    let mut lines: Vec<Line> = vec![];
    for (i, m) in chat.messages().iter().enumerate() {
        match m.role {
            Role::User => {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}: ", tui::you(lang)),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(m.content.clone()),
                ]));
            }
            Role::Bot => {
                lines.push(Line::styled(
                    "AI:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
                lines.extend(markdown::render(&m.content).lines);
                if m.sources.is_empty() {
                    lines.push(Line::default());
                    continue;
                }
                let toggle_style = if active && target == Some(i) {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    dim()
                };
                if state.expanded_sources.contains(&i) {
                    lines.push(Line::styled(format!("▾ {}", tui::sources(lang)), toggle_style));
                    for src in &m.sources {
                        lines.push(Line::from(vec![
                            Span::raw("  · "),
                            Span::styled(src.subject.clone(), bold()),
                            Span::styled(format!(" · {}", src.sender), dim()),
                        ]));
                        if !src.snippet.is_empty() {
                            lines.push(Line::styled(format!("    {}", src.snippet), dim()));
                        }
                    }
                } else {
                    lines.push(Line::styled(
                        format!("▸ {} {} (Ctrl-O)", m.sources.len(), tui::sources(lang)),
                        toggle_style,
                    ));
                }
            }
        }
        lines.push(Line::default());
    }
    if chat.is_thinking() || chat.is_loading_history() {
        lines.push(Line::styled("…", dim()));
    }

    let title = format!(" {} · {} ", tui::assistant_title(lang), chat.chat_id());
    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border(active)),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.chat_scroll, 0));
    f.render_widget(p, log);

    let prompt = if chat.is_thinking() {
        Span::styled(tui::waiting_for_answer(lang), dim())
    } else {
        Span::raw(format!("{}{}", state.chat_input, if active { "▏" } else { "" }))
    };
    f.render_widget(
        Paragraph::new(Line::from(prompt)).block(
            Block::default()
                .title(format!(" {} ", tui::ask_title(lang)))
                .borders(Borders::ALL)
                .border_style(border(active)),
        ),
        input,
    );
}

fn popup(f: &mut Frame, title: &str) -> Rect {
    let area = f.area();
    let area = centered(area, (area.width * 3 / 4).max(20), (area.height * 3 / 4).max(8));
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border(true));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

fn render_history(f: &mut Frame, state: &mut AppState, dash: &Dashboard) {
    let lang = dash.lang();
    let area = popup(f, tui::history_title(lang));
    let chat = dash.chat();
    if chat.sessions().is_empty() {
        let text = if chat.sessions_loading() {
            tui::loading(lang)
        } else {
            tui::no_sessions(lang)
        };
        f.render_widget(Paragraph::new(text).style(dim()), area);
        return;
    }
    let items: Vec<ListItem> = chat
        .sessions()
        .iter()
        .map(|s| {
            let title = s.title.clone().filter(|t| !t.is_empty()).unwrap_or_else(|| s.chat_id.clone());
            let mut meta = s.chat_id.clone();
            if let Some(at) = &s.created_at {
                meta.push_str(&format!("  {}", format_timestamp(at)));
            }
            let marker = if s.chat_id == chat.chat_id() { " ●" } else { "" };
            ListItem::new(Text::from(vec![
                Line::from(vec![Span::styled(title, bold()), Span::raw(marker)]),
                Line::styled(meta, dim()),
            ]))
        })
        .collect();
    let list = List::new(items)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));
    f.render_stateful_widget(list, area, &mut state.overlay_state);
}

fn render_user_center(f: &mut Frame, state: &mut AppState, dash: &Dashboard) {
    let lang = dash.lang();
    let area = popup(f, tui::user_center_title(lang));
    let [head, list_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let user = dash.session().user_id().unwrap_or("-").to_string();
    let head_lines = vec![
        Line::from(vec![
            Span::styled(format!("{}: ", tui::user(lang)), dim()),
            Span::styled(user, bold()),
        ]),
        Line::from(vec![
            Span::styled("API: ", dim()),
            Span::raw(dash.session().api_base().to_string()),
        ]),
        Line::styled(tui::linked_mailboxes(lang), bold()),
    ];
    f.render_widget(Paragraph::new(head_lines), head);

    let linker = dash.linker();
    if linker.mailboxes().is_empty() {
        let text = if linker.is_loading() {
            tui::loading(lang)
        } else {
            tui::no_mailboxes(lang)
        };
        f.render_widget(Paragraph::new(text).style(dim()), list_area);
        return;
    }

    let stamp = |v: &Option<String>| v.as_deref().map(format_timestamp).unwrap_or_else(|| "-".into());
    let items: Vec<ListItem> = linker
        .mailboxes()
        .iter()
        .map(|m| match dash.layout() {
            ProfileLayout::Classic => ListItem::new(Text::from(vec![
                Line::from(vec![
                    Span::styled(m.provider.clone(), bold()),
                    Span::styled(format!("  ({})", m.provider_type), dim()),
                ]),
                Line::styled(
                    format!("  {}: {}", tui::last_sync(lang), stamp(&m.last_synced_at)),
                    dim(),
                ),
                Line::styled(
                    format!("  {}: {}", tui::linked_at(lang), stamp(&m.created_at)),
                    dim(),
                ),
            ])),
            ProfileLayout::Compact => ListItem::new(Line::from(vec![
                Span::styled(m.provider.clone(), bold()),
                Span::styled(
                    format!("  {} {}", tui::synced_at(lang), stamp(&m.last_synced_at)),
                    dim(),
                ),
            ])),
        })
        .collect();
    let list = List::new(items)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));
    f.render_stateful_widget(list, list_area, &mut state.overlay_state);
}

fn render_status(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let Some(msg) = dash.status().current() else {
        return;
    };
    let color = match msg.severity {
        Severity::Info => Color::Cyan,
        Severity::Error => Color::Red,
    };
    f.render_widget(
        Paragraph::new(Line::styled(format!(" {}", msg.text), Style::default().fg(color))),
        area,
    );
}

fn render_footer(f: &mut Frame, area: Rect, state: &AppState, dash: &Dashboard) {
    let lang = dash.lang();
    let keys: Vec<(&str, &str)> = match (dash.view(), state.overlay, state.focus) {
        (View::Login, _, _) => vec![
            ("Tab", tui::hint_field(lang)),
            ("Enter", tui::hint_sign_in(lang)),
            ("F2", tui::hint_language(lang)),
            ("Esc", tui::hint_quit(lang)),
        ],
        (_, Some(Overlay::History), _) => vec![
            ("j/k", tui::hint_move(lang)),
            ("Enter", tui::hint_open(lang)),
            ("Esc", tui::hint_close(lang)),
        ],
        (_, Some(Overlay::UserCenter), _) => vec![
            ("c", tui::hint_connect(lang)),
            ("s", tui::hint_sync(lang)),
            ("r", tui::hint_reload(lang)),
            ("v", tui::hint_layout(lang)),
            ("Esc", tui::hint_close(lang)),
        ],
        (_, None, Focus::Chat) => vec![
            ("Enter", tui::hint_send(lang)),
            ("Ctrl-O", tui::hint_sources(lang)),
            ("Ctrl-P/N", tui::hint_pick_answer(lang)),
            ("↑/↓", tui::hint_scroll(lang)),
            ("Esc", tui::hint_back(lang)),
        ],
        (_, None, Focus::Search) => vec![("Enter", tui::hint_done(lang))],
        (_, None, _) => vec![
            ("j/k", tui::hint_move(lang)),
            ("Enter", tui::hint_open(lang)),
            ("Tab", tui::hint_focus(lang)),
            ("n/p", tui::hint_page(lang)),
            ("r", tui::hint_refresh(lang)),
            ("/", tui::hint_search(lang)),
            ("g", tui::hint_group(lang)),
            ("t", tui::hint_kind(lang)),
            ("h", tui::hint_history(lang)),
            ("N", tui::hint_new_chat(lang)),
            ("u", tui::hint_user(lang)),
            ("L", tui::hint_language(lang)),
            ("o", tui::hint_logout(lang)),
            ("q", tui::hint_quit(lang)),
        ],
    };
    let mut spans = vec![];
    for (k, what) in keys {
        spans.push(Span::styled(k, bold()));
        spans.push(Span::raw(format!(" {what}  ")));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
