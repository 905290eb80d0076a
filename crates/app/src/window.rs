use std::{io, time::Duration};

use ratatui::{
    crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        execute,
        terminal::SetTitle,
    },
    DefaultTerminal,
};
use talking_ghosties_core::{RenderGraph, Result, Rgba, SceneFrame};

/// Terminal-backed window: alternate screen, raw input, and a title.
///
/// The terminal is restored when the window is closed or dropped.
pub struct Window {
    terminal: DefaultTerminal,
    close_requested: bool,
}

impl Window {
    pub fn open(title: &str) -> Result<Self> {
        let window = Self {
            terminal: ratatui::try_init()?,
            close_requested: false,
        };
        // From here on dropping `window` restores the terminal.
        set_title(&mut io::stdout(), title)?;
        tracing::info!(title, "window opened");
        Ok(window)
    }

    /// Drains pending input without blocking. Esc, `q` and Ctrl-C close the
    /// window.
    pub fn should_close(&mut self) -> Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if is_close_key(&key) {
                    self.close_requested = true;
                }
            }
        }
        Ok(self.close_requested)
    }

    /// Rasterises `scene` into `graph` and presents it. The first frame and
    /// every resize start from a black screen.
    pub fn draw(&mut self, graph: &mut RenderGraph, scene: &SceneFrame) -> Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area();
            if graph.resize_to_area(area) {
                graph.clear(Rgba::BLACK);
            }
            graph.submit(&scene.commands);
            frame.render_widget(graph.widget(), area);
        })?;
        Ok(())
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        ratatui::restore();
        tracing::info!("window closed");
    }
}

fn set_title<W: io::Write>(out: &mut W, title: &str) -> io::Result<()> {
    execute!(out, SetTitle(title))
}

fn is_close_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn title_write_failure_is_reported() {
        let err = set_title(&mut BrokenPipe, "talking ghosties").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn title_is_written_as_escape_sequence() {
        let mut out = Vec::new();
        set_title(&mut out, "talking ghosties").unwrap();
        assert!(String::from_utf8(out).unwrap().contains("talking ghosties"));
    }

    #[test]
    fn escape_and_q_close() {
        assert!(is_close_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_close_key(&KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE
        )));
    }

    #[test]
    fn ctrl_c_closes_but_plain_c_does_not() {
        assert!(is_close_key(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_close_key(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::NONE
        )));
    }
}
