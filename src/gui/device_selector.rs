use std::{path::PathBuf, time::Duration};

use crate::gui::{error::DashGuiError, with_terminal};
use crate::transport::TransportError;

use crossterm::event::{self, KeyCode, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
};

/// Lets the user pick one of `available_ports`. Returns `None` if they quit
/// without choosing.
pub fn device_selector(
    mut available_ports: Vec<PathBuf>,
) -> Result<Option<PathBuf>, DashGuiError> {
    if available_ports.is_empty() {
        return Err(TransportError::NoPorts.into());
    }
    let n_ports = available_ports.len();

    let selected_port = with_terminal(|terminal| {
        let mut list_state = ListState::default().with_selected(Some(0));

        loop {
            let title = Title::from(" Select Wearable ".magenta().bold());
            let instructions = Title::from(Line::from(vec![
                " Navigate ".into(),
                "<Up>/<Down>".magenta().bold(),
                " Select ".into(),
                "<Enter>".magenta().bold(),
                " Quit ".into(),
                "<Q> ".magenta().bold(),
            ]));
            let block = Block::default()
                .title(title.alignment(Alignment::Center))
                .title(
                    instructions
                        .alignment(Alignment::Center)
                        .position(Position::Bottom),
                )
                .borders(Borders::ALL);
            let port_names = available_ports.iter().map(|p| p.to_string_lossy());
            let list = List::new(port_names)
                .style(Style::default().fg(Color::White))
                .highlight_symbol(">>")
                .highlight_style(Style::default().fg(Color::Magenta))
                .block(block);

            terminal.draw(|frame| {
                let area = frame.size();
                frame.render_stateful_widget(list, area, &mut list_state);
            })?;

            if !event::poll(Duration::from_millis(16))? {
                continue;
            }
            if let event::Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let cursor = list_state.selected().unwrap_or(0);
                match key.code {
                    KeyCode::Down => list_state.select(Some((cursor + 1) % n_ports)),
                    KeyCode::Up => list_state.select(Some((cursor + n_ports - 1) % n_ports)),
                    KeyCode::Enter => return Ok(Some(cursor)),
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(None),
                    _ => {}
                }
            }
        }
    })?;

    Ok(selected_port.map(|i| available_ports.swap_remove(i)))
}
