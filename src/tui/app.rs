//! TUI application main loop.

use std::io;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;

use crate::cache::{run_fetch, ChildPageCache, ChildSource, PageStatus};
use crate::client::ApiClient;
use crate::error::{ExplorerError, Result};
use crate::explorer::Explorer;
use crate::util::{format_count, format_optional_size, format_size};

use super::components::{centered_rect, root_line, tree_line, SizeBar, StatusBar};
use super::events::{Command, Event, EventHandler, KeyBindings};
use super::state::{AppState, Effect, Mode};
use super::theme::{available_themes, Theme};
use super::TuiOptions;

/// Rows taken by the status bar, the tree pane borders and the root header.
const TREE_CHROME_HEIGHT: u16 = 4;

/// Run the TUI application.
pub fn run(options: TuiOptions) -> Result<()> {
    let TuiOptions {
        config,
        theme,
        ascii,
        reveal,
    } = options;

    let client = Arc::new(ApiClient::from_config(&config.api)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ExplorerError::io("Failed to build async runtime", e))?;

    let theme = Theme::from_name(&theme).unwrap_or_else(|| {
        tracing::warn!(
            theme = %theme,
            available = ?available_themes(),
            "unknown theme, using dark"
        );
        Theme::default()
    });
    let cache = ChildPageCache::from_config(&config.cache, config.api.page_size);
    let mut app = AppState::new(
        Explorer::new(cache),
        theme,
        ascii,
        config.display.show_sizes,
        config.api.search_page_size,
    )
    .with_reveal(reveal);

    // Setup terminal
    enable_raw_mode().map_err(|e| {
        ExplorerError::io(
            "Cannot launch TUI - no interactive terminal available. \
             The TUI requires a terminal with keyboard input support",
            e,
        )
    })?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| ExplorerError::io("Failed to enter alternate screen", e))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| ExplorerError::io("Failed to create terminal", e))?;

    let spawner = Spawner {
        handle: runtime.handle().clone(),
        client,
    };

    // Main loop
    let result = run_loop(&mut terminal, &mut app, &spawner);

    // Restore terminal
    disable_raw_mode().map_err(|e| ExplorerError::io("Failed to disable raw mode", e))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| ExplorerError::io("Failed to leave alternate screen", e))?;
    terminal
        .show_cursor()
        .map_err(|e| ExplorerError::io("Failed to show cursor", e))?;

    runtime.shutdown_background();
    result
}

/// Starts API requests on the runtime and reports results as events.
struct Spawner {
    handle: Handle,
    client: Arc<ApiClient>,
}

impl Spawner {
    fn spawn_all(&self, effects: Vec<Effect>, tx: &mpsc::Sender<Event>) {
        for effect in effects {
            self.spawn(effect, tx.clone());
        }
    }

    fn spawn(&self, effect: Effect, tx: mpsc::Sender<Event>) {
        let client = Arc::clone(&self.client);
        match effect {
            Effect::LoadRoot => {
                self.handle.spawn(async move {
                    let result = client.root().await.map_err(|e| e.to_string());
                    // The receiver is gone only when the UI has exited.
                    let _ = tx.send(Event::RootLoaded(result));
                });
            }
            Effect::Fetch(request) => {
                let source: Arc<dyn ChildSource> = client;
                self.handle.spawn(async move {
                    let outcome = run_fetch(source, request).await;
                    let _ = tx.send(Event::Fetched(outcome));
                });
            }
            Effect::Search {
                query,
                offset,
                limit,
                generation,
            } => {
                self.handle.spawn(async move {
                    let result = client
                        .search(&query, limit, offset)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(Event::SearchLoaded { generation, result });
                });
            }
        }
    }
}

/// Main event loop using EventHandler.
fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    spawner: &Spawner,
) -> Result<()> {
    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();
    let bindings = KeyBindings::default();

    spawner.spawn_all(app.start(), &tx);

    loop {
        let size = terminal
            .size()
            .map_err(|e| ExplorerError::io("Failed to read terminal size", e))?;
        app.set_viewport_height(size.height.saturating_sub(TREE_CHROME_HEIGHT) as usize);

        terminal
            .draw(|f| draw_ui(f, app))
            .map_err(|e| ExplorerError::io("Failed to draw TUI", e))?;

        let event = events.next().map_err(|_| ExplorerError::TuiError {
            message: "event channel closed".to_string(),
        })?;
        spawner.spawn_all(handle_event(app, event, &bindings), &tx);

        // Apply everything already queued before drawing again.
        while let Some(event) = events.try_next() {
            spawner.spawn_all(handle_event(app, event, &bindings), &tx);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_event(app: &mut AppState, event: Event, bindings: &KeyBindings) -> Vec<Effect> {
    match event {
        Event::Tick => Vec::new(),
        Event::Resize(width, height) => {
            tracing::debug!(width, height, "terminal resized");
            Vec::new()
        }
        Event::Key(key) => handle_key(app, key, bindings),
        Event::RootLoaded(result) => app.on_root_loaded(result),
        Event::Fetched(outcome) => app.on_fetched(outcome),
        Event::SearchLoaded { generation, result } => {
            app.on_search_loaded(generation, result);
            Vec::new()
        }
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent, bindings: &KeyBindings) -> Vec<Effect> {
    // Clear status message on any key press
    app.status_message = None;

    match app.mode {
        Mode::Search => handle_search_key(app, key),
        Mode::Help => {
            match bindings.command(&key) {
                Some(Command::Quit) => app.should_quit = true,
                Some(Command::Help | Command::Back) => app.toggle_help(),
                _ => {}
            }
            Vec::new()
        }
        Mode::Tree => {
            let Some(command) = bindings.command(&key) else {
                return Vec::new();
            };
            match command {
                Command::Quit => app.should_quit = true,
                Command::Up => app.previous(),
                Command::Down => app.next(),
                Command::PageUp => app.page_up(),
                Command::PageDown => app.page_down(),
                Command::Activate => return app.activate(),
                Command::Left => return app.left(),
                Command::CollapseAll => return app.collapse_all(),
                Command::Retry => return app.retry(),
                Command::Search => app.enter_search(),
                Command::CycleTheme => app.cycle_theme(),
                Command::Help => app.toggle_help(),
                Command::Back => {}
            }
            Vec::new()
        }
    }
}

fn handle_search_key(app: &mut AppState, key: KeyEvent) -> Vec<Effect> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => app.should_quit = true,
        (_, KeyCode::Esc) => app.exit_search(),
        (_, KeyCode::Enter) => return app.search_enter(),
        (_, KeyCode::PageDown) => return app.search_next_page(),
        (_, KeyCode::PageUp) => return app.search_prev_page(),
        (_, KeyCode::Down) => app.search_down(),
        (_, KeyCode::Up) => app.search_up(),
        (_, KeyCode::Backspace) => app.search_backspace(),
        (KeyModifiers::NONE, KeyCode::Char(c)) | (KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            app.search_input(c);
        }
        _ => {}
    }
    Vec::new()
}

/// Draw the UI.
fn draw_ui(f: &mut Frame, app: &AppState) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[0]);

    draw_tree_panel(f, app, chunks[0]);
    if app.mode == Mode::Search {
        draw_search_panel(f, app, chunks[1]);
    } else {
        draw_detail_panel(f, app, chunks[1]);
    }

    draw_status_bar(f, app, main_chunks[1]);

    if app.mode == Mode::Help {
        draw_help_overlay(f, app);
    }
}

/// Draw the tree panel.
fn draw_tree_panel(f: &mut Frame, app: &AppState, area: Rect) {
    let border_style = if app.mode == Mode::Tree {
        app.theme.border_focused_style()
    } else {
        app.theme.border_style()
    };
    let block = Block::default()
        .title(" Taxonomy ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let Some(root) = app.explorer.root() else {
        let text = match &app.root_error {
            Some(message) => vec![
                Line::from(Span::styled(
                    format!("Failed to load root: {message}"),
                    app.theme.error_style(),
                )),
                Line::from(""),
                Line::from(Span::styled("Press r to retry, q to quit", app.theme.muted_style())),
            ],
            None => vec![Line::from(Span::styled("Loading taxonomy...", app.theme.muted_style()))],
        };
        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
        return;
    };

    let mut items = vec![ListItem::new(root_line(
        &root.name,
        root.size,
        &app.theme,
        app.show_sizes,
    ))];
    items.extend(
        app.rows
            .iter()
            .enumerate()
            .skip(app.tree_scroll)
            .take(app.viewport_height)
            .map(|(i, row)| {
                let line = tree_line(row, &app.theme, &app.glyphs, app.show_sizes);
                let is_selected = row
                    .node()
                    .is_some_and(|view| {
                        Some(view.path.as_str()) == app.explorer.selection().selected()
                    });
                let style = if i == app.cursor {
                    app.theme.selection_style()
                } else if is_selected {
                    Style::default().add_modifier(Modifier::UNDERLINED)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            }),
    );

    f.render_widget(List::new(items).block(block), area);
}

/// Draw the detail panel for the selected node (or the root).
fn draw_detail_panel(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let selected = app
        .explorer
        .selection()
        .selected()
        .or_else(|| app.explorer.root().map(|root| root.path.as_str()));
    let Some(selected) = selected else {
        return;
    };
    let detail = app.explorer.detail(selected);
    let cache = app.explorer.cache();

    let breadcrumbs = detail.breadcrumbs.join(app.glyphs.separator);
    let mut lines = vec![
        Line::from(Span::styled(detail.name.clone(), app.theme.header_style())),
        Line::from(Span::styled(breadcrumbs, app.theme.muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::raw("Descendants: "),
            Span::styled(format_optional_size(detail.size), Style::default().fg(app.theme.primary)),
            Span::styled(
                detail
                    .size
                    .map(|size| format!(" ({})", format_count(size)))
                    .unwrap_or_default(),
                app.theme.muted_style(),
            ),
        ]),
        Line::from(format!("Depth: {}", detail.depth)),
    ];

    let children_line = match (cache.status(selected), cache.total(selected)) {
        (PageStatus::Failed(message), _) => Some(Span::styled(
            format!("Children: failed ({message})"),
            app.theme.error_style(),
        )),
        (PageStatus::Loading, _) => {
            Some(Span::styled("Children: loading...", app.theme.muted_style()))
        }
        (_, Some(total)) => Some(Span::raw(format!(
            "Children: {} of {} loaded",
            format_count(cache.children(selected).len() as u64),
            format_count(total as u64)
        ))),
        _ => None,
    };
    if let Some(span) = children_line {
        lines.push(Line::from(span));
    }
    if app.explorer.expansion().is_suppressed(selected) {
        lines.push(Line::from(Span::styled(
            "Revealed by navigation; siblings not loaded",
            app.theme.placeholder_style(),
        )));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[0]);
    SizeBar::new(detail.percent_of_root, &app.theme).render(f, chunks[1]);
}

/// Draw the search panel: query input and one page of results.
fn draw_search_panel(f: &mut Frame, app: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let search = &app.search;
    let input_style = if search.editing {
        app.theme.header_style()
    } else {
        Style::default().fg(app.theme.foreground)
    };
    let cursor = if search.editing { app.glyphs.cursor } else { "" };
    let input = Paragraph::new(format!("/{}{cursor}", search.query))
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.border_focused_style())
                .title(" Search (Enter to submit, Esc to close) "),
        );
    f.render_widget(input, chunks[0]);

    let title = match (search.loading, search.page_label()) {
        (true, _) => " Searching... ".to_string(),
        (false, Some(label)) => format!(" {label} (PgUp/PgDn) "),
        (false, None) => " Results ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(app.theme.border_style());

    if let Some(message) = &search.error {
        let paragraph = Paragraph::new(Span::styled(
            format!("Search failed: {message}"),
            app.theme.error_style(),
        ))
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = search
        .response
        .iter()
        .flat_map(|response| response.results.iter())
        .enumerate()
        .map(|(i, row)| {
            let line = Line::from(vec![
                Span::styled(format!("{:>7}  ", format_size(row.size)), app.theme.muted_style()),
                Span::raw(row.path.clone()),
            ]);
            let style = if i == search.selected && !search.editing {
                app.theme.selection_style()
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    f.render_widget(List::new(items).block(block), chunks[1]);
}

/// Draw the status bar.
fn draw_status_bar(f: &mut Frame, app: &AppState, area: Rect) {
    let mode = match app.mode {
        Mode::Tree => "TREE",
        Mode::Search => "SEARCH",
        Mode::Help => "HELP",
    };

    let brand = Span::styled(" taxo ", app.theme.header_style());
    let left_content = if let Some(ref msg) = app.status_message {
        vec![brand, Span::raw("│ "), Span::styled(msg.as_str(), app.theme.warning_style())]
    } else {
        vec![
            brand,
            Span::raw("│ "),
            Span::styled(mode, app.theme.warning_style()),
            Span::raw(" │ "),
            Span::styled(app.theme.name.as_str(), Style::default().fg(app.theme.secondary)),
        ]
    };

    let stats = app.explorer.cache().stats();
    let mut right_content = Vec::new();
    if app.is_loading_root() {
        right_content.push(Span::styled("connecting ", app.theme.muted_style()));
        right_content.push(Span::raw("│ "));
    }
    right_content.push(Span::raw(format!("{} rows ", format_count(stats.row_count as u64))));
    right_content.push(Span::styled(
        format!(
            "│ {}/{} nodes ({:.0}%) ",
            stats.entry_count,
            stats.max_entries,
            stats.usage_percent()
        ),
        app.theme.muted_style(),
    ));
    if stats.in_flight > 0 {
        right_content.push(Span::raw("│ "));
        right_content.push(Span::styled(
            format!("{} loading ", stats.in_flight),
            app.theme.muted_style(),
        ));
    }
    right_content.push(Span::raw("│ ? for help "));

    StatusBar::new(&app.theme)
        .left(left_content)
        .right(right_content)
        .render(f, area);
}

/// Draw help overlay.
fn draw_help_overlay(f: &mut Frame, app: &AppState) {
    let area = centered_rect(60, 70, f.area());

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Tree:"),
        Line::from("  j/↓         Move down"),
        Line::from("  k/↑         Move up"),
        Line::from("  PgUp/PgDn   Move a page"),
        Line::from("  Enter/l/→   Select and expand/collapse; run Load / Load more"),
        Line::from("  h/←         Collapse, or go to parent"),
        Line::from("  c           Collapse all"),
        Line::from("  r           Retry failed load"),
        Line::from(""),
        Line::from("Search:"),
        Line::from("  /           Open search"),
        Line::from("  Enter       Submit query / go to result"),
        Line::from("  ↑/↓         Choose result"),
        Line::from("  PgUp/PgDn   Previous/next page of results"),
        Line::from("  Esc         Close search"),
        Line::from(""),
        Line::from("Other:"),
        Line::from("  t           Cycle theme"),
        Line::from("  ?           Toggle help"),
        Line::from("  q/Ctrl+C    Quit"),
    ];

    let paragraph = Paragraph::new(help_text).block(
        Block::default()
            .title(" Help (Esc to close) ")
            .borders(Borders::ALL)
            .border_style(app.theme.border_focused_style()),
    );

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}
