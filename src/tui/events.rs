//! TUI event handling.
//!
//! Terminal input is polled on a dedicated thread. Finished API requests are
//! sent into the same channel from tokio tasks, so the loop consumes a single
//! ordered stream of [`Event`]s and owns all state.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};

use crate::cache::FetchOutcome;
use crate::model::{RootResponse, SearchResponse};

/// Application events.
#[derive(Debug, Clone)]
pub enum Event {
    /// Terminal tick.
    Tick,
    /// Key press event.
    Key(KeyEvent),
    /// Terminal resize.
    Resize(u16, u16),
    /// The root request finished.
    RootLoaded(Result<RootResponse, String>),
    /// A page of children finished loading.
    Fetched(FetchOutcome),
    /// A search page finished loading.
    SearchLoaded {
        /// Search generation the request was issued for.
        generation: u64,
        /// The page, or the failure message.
        result: Result<SearchResponse, String>,
    },
}

/// Event handler using channels.
pub struct EventHandler {
    /// Event receiver.
    rx: mpsc::Receiver<Event>,
    /// Sender handed to background tasks.
    tx: mpsc::Sender<Event>,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let event_tx = tx.clone();

        thread::spawn(move || loop {
            if event::poll(tick_rate).unwrap_or(false) {
                let event = match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Some(Event::Key(key))
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                    _ => None,
                };
                if let Some(event) = event {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }

            if event_tx.send(Event::Tick).is_err() {
                break;
            }
        });

        Self { rx, tx }
    }

    /// A sender for delivering results from background tasks.
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }

    /// Get the next event.
    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }

    /// Try to get the next event without blocking.
    pub fn try_next(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

/// Key binding configuration.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Quit keys.
    pub quit: Vec<KeyEvent>,
    /// Navigation up.
    pub up: Vec<KeyEvent>,
    /// Navigation down.
    pub down: Vec<KeyEvent>,
    /// Collapse, or move to the parent.
    pub left: Vec<KeyEvent>,
    /// Activate the row under the cursor.
    pub activate: Vec<KeyEvent>,
    /// Collapse the whole tree.
    pub collapse_all: Vec<KeyEvent>,
    /// Enter search mode.
    pub search: Vec<KeyEvent>,
    /// Retry a failed fetch.
    pub retry: Vec<KeyEvent>,
    /// Cycle themes.
    pub theme: Vec<KeyEvent>,
    /// Toggle help.
    pub help: Vec<KeyEvent>,
    /// Back/cancel.
    pub back: Vec<KeyEvent>,
    /// Page up.
    pub page_up: Vec<KeyEvent>,
    /// Page down.
    pub page_down: Vec<KeyEvent>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

        Self {
            quit: vec![
                key(KeyCode::Char('q')),
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            ],
            up: vec![key(KeyCode::Up), key(KeyCode::Char('k'))],
            down: vec![key(KeyCode::Down), key(KeyCode::Char('j'))],
            left: vec![key(KeyCode::Left), key(KeyCode::Char('h'))],
            activate: vec![
                key(KeyCode::Enter),
                key(KeyCode::Right),
                key(KeyCode::Char('l')),
            ],
            collapse_all: vec![key(KeyCode::Char('c'))],
            search: vec![key(KeyCode::Char('/'))],
            retry: vec![key(KeyCode::Char('r'))],
            theme: vec![key(KeyCode::Char('t'))],
            help: vec![
                key(KeyCode::Char('?')),
                KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT),
            ],
            back: vec![key(KeyCode::Esc)],
            page_up: vec![key(KeyCode::PageUp)],
            page_down: vec![key(KeyCode::PageDown)],
        }
    }
}

fn matches_any(bindings: &[KeyEvent], key: &KeyEvent) -> bool {
    bindings
        .iter()
        .any(|k| k.code == key.code && k.modifiers == key.modifiers)
}

impl KeyBindings {
    /// Resolve a key press to a tree-mode command.
    pub fn command(&self, key: &KeyEvent) -> Option<Command> {
        let table = [
            (&self.quit, Command::Quit),
            (&self.up, Command::Up),
            (&self.down, Command::Down),
            (&self.left, Command::Left),
            (&self.activate, Command::Activate),
            (&self.collapse_all, Command::CollapseAll),
            (&self.search, Command::Search),
            (&self.retry, Command::Retry),
            (&self.theme, Command::CycleTheme),
            (&self.help, Command::Help),
            (&self.back, Command::Back),
            (&self.page_up, Command::PageUp),
            (&self.page_down, Command::PageDown),
        ];
        table
            .into_iter()
            .find(|(bindings, _)| matches_any(bindings, key))
            .map(|(_, command)| command)
    }
}

/// Tree-mode commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Quit the application.
    Quit,
    /// Move the cursor up.
    Up,
    /// Move the cursor down.
    Down,
    /// Collapse the node, or jump to its parent.
    Left,
    /// Activate the row under the cursor.
    Activate,
    /// Collapse every node.
    CollapseAll,
    /// Enter search mode.
    Search,
    /// Retry the failed fetch under the cursor.
    Retry,
    /// Switch to the next theme.
    CycleTheme,
    /// Toggle the help overlay.
    Help,
    /// Close overlays.
    Back,
    /// Move the cursor a page up.
    PageUp,
    /// Move the cursor a page down.
    PageDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_resolve() {
        let bindings = KeyBindings::default();
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(bindings.command(&press(KeyCode::Char('j'))), Some(Command::Down));
        assert_eq!(bindings.command(&press(KeyCode::Right)), Some(Command::Activate));
        assert_eq!(bindings.command(&press(KeyCode::Enter)), Some(Command::Activate));
        assert_eq!(bindings.command(&press(KeyCode::Char('c'))), Some(Command::CollapseAll));
        assert_eq!(bindings.command(&press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_ctrl_c_quits_but_plain_c_collapses() {
        let bindings = KeyBindings::default();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(bindings.command(&ctrl_c), Some(Command::Quit));
        assert_ne!(
            bindings.command(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)),
            Some(Command::Quit)
        );
    }
}
