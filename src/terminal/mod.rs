pub mod events;
pub mod state;
pub mod ui;

use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use ratatui::DefaultTerminal;

use crate::dashboard::{Dashboard, Event};
use crate::runtime::Executor;
use events::Flow;
use state::AppState;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run_tui(mut dash: Dashboard, mut exec: Executor, rx: Receiver<Event>) -> Result<()> {
    color_eyre::install()?;

    let terminal = ratatui::init();
    let startup = dash.startup();
    exec.dispatch_all(startup);
    let result = run(terminal, &mut dash, &mut exec, &rx);

    ratatui::restore();

    result
}

fn run(
    mut terminal: DefaultTerminal,
    dash: &mut Dashboard,
    exec: &mut Executor,
    rx: &Receiver<Event>,
) -> Result<()> {
    let mut state = AppState::new(dash);
    loop {
        while let Ok(ev) = rx.try_recv() {
            let history_changed = matches!(ev, Event::ChatMessagesLoaded { .. });
            let cmds = dash.apply(ev);
            if history_changed {
                state.reset_chat_view();
            }
            exec.dispatch_all(cmds);
        }
        dash.tick(Instant::now());

        terminal.draw(|f| ui::render(f, &mut state, dash))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let TermEvent::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match events::handle_key(key, &mut state, dash) {
                Flow::Quit => break,
                Flow::Continue(cmds) => exec.dispatch_all(cmds),
            }
        }
    }
    Ok(())
}
