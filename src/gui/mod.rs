//! The terminal front end: a device selector and the live dashboard.

mod dashboard;
mod device_selector;
mod error;

pub use dashboard::{run_dashboard, Connector, DashboardSink};
pub use device_selector::device_selector;
pub use error::DashGuiError;

use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Runs `f` on the alternate screen, and puts the terminal back the way it
/// was afterwards even if `f` fails.
fn with_terminal<T, F>(f: F) -> Result<T, DashGuiError>
where
    F: FnOnce(&mut Term) -> Result<T, DashGuiError>,
{
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let res = Terminal::new(CrosstermBackend::new(stdout()))
        .map_err(DashGuiError::from)
        .and_then(|mut terminal| {
            terminal.clear()?;
            let res = f(&mut terminal);
            terminal.show_cursor()?;
            res
        });

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    res
}
