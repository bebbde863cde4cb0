//! Board TUI entry point and terminal setup.

use std::io;

use chrono::Local;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::db::TaskStore;
use crate::locale::Locale;
use crate::service::TaskService;
use crate::tui::app::BoardApp;

/// Initialise the terminal, run the board until the user quits, then restore
/// the terminal.
pub fn run_board<S: TaskStore>(service: &mut TaskService<S>, locale: Locale) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = BoardApp::new(service, locale, Local::now()).run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
