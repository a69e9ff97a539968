//! Terminal grid editor.
//!
//! `TuiApp` is a thin host around [`Grid`]: it maps terminal input to grid
//! operations and draws the grid state. It never talks to the network; the
//! effects it returns go to the [`worker::Worker`] and the events that come
//! back are fed in through [`TuiApp::apply_event`].

pub mod prompt;
pub mod worker;

use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use stockgrid_api_client::CatalogClient;
use stockgrid_core::{
    format_value, CatalogQuery, CellKey, Direction, Grid, GridCursor, GridEffect, GridEvent,
    SearchField, SearchMode, TextBuffer,
};

use crate::util::{self, Align};
use prompt::{Prompt, PromptOutcome};
use worker::Worker;

const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const WHEEL_ROWS: isize = 3;

struct Areas {
    title: Rect,
    banner: Option<Rect>,
    grid: Rect,
    prompt: Option<Rect>,
    status: Rect,
}

struct TuiApp {
    grid: Grid,
    api_base: String,
    prompt: Option<Prompt>,
    /// Last search, to pre-fill the prompt
    last_search: (String, SearchField, SearchMode),
    /// First scrolled column; column 0 (the item code) is always shown
    scroll_col: usize,
    /// Grid area from the last layout, for mouse hit-testing
    grid_area: Rect,
    last_click: Option<(GridCursor, Instant)>,
    should_quit: bool,
    show_help: bool,
}

impl TuiApp {
    fn new(grid: Grid, api_base: String) -> Self {
        Self {
            grid,
            api_base,
            prompt: None,
            last_search: (String::new(), SearchField::default(), SearchMode::default()),
            scroll_col: 1,
            grid_area: Rect::default(),
            last_click: None,
            should_quit: false,
            show_help: false,
        }
    }

    fn areas(&self, area: Rect) -> Areas {
        let has_banner = self.grid.error().is_some();
        let has_prompt = self.prompt.is_some();

        let mut constraints = vec![Constraint::Length(1)];
        if has_banner {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(2));
        if has_prompt {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1));

        let chunks = Layout::vertical(constraints).split(area);
        let mut next = chunks.iter().copied();
        let title = next.next().unwrap_or_default();
        let banner = if has_banner { next.next() } else { None };
        let grid = next.next().unwrap_or_default();
        let prompt = if has_prompt { next.next() } else { None };
        let status = next.next().unwrap_or_default();
        Areas { title, banner, grid, prompt, status }
    }

    /// Lay out for a terminal of `area` and tell the grid how many rows fit.
    fn resize(&mut self, area: Rect) -> Vec<GridEffect> {
        self.grid_area = self.areas(area).grid;
        let rows = self.grid_area.height.saturating_sub(1) as usize;
        let effects = if rows != self.grid.viewport_height() {
            self.grid.set_viewport(rows)
        } else {
            Vec::new()
        };
        self.sync_scroll_col();
        effects
    }

    fn apply_event(&mut self, event: GridEvent) -> Vec<GridEffect> {
        let effects = self.grid.apply_event(event);
        self.sync_scroll_col();
        effects
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Vec<GridEffect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        let effects = self.dispatch_key(key);
        self.sync_scroll_col();
        effects
    }

    fn dispatch_key(&mut self, key: KeyEvent) -> Vec<GridEffect> {
        if self.show_help {
            // Any key dismisses help
            self.show_help = false;
            return Vec::new();
        }

        if let Some(prompt) = self.prompt.as_mut() {
            return match prompt.handle_key(key) {
                PromptOutcome::Pending => Vec::new(),
                PromptOutcome::Cancelled => {
                    self.prompt = None;
                    Vec::new()
                }
                PromptOutcome::Search(query) => {
                    if let Some(p) = self.prompt.take() {
                        self.last_search = (p.buffer.as_str().to_string(), p.field, p.mode);
                    }
                    log::info!("search: {:?}", query);
                    self.grid.reload(query)
                }
                PromptOutcome::Filter(text) => {
                    self.prompt = None;
                    self.grid.set_filter(&text)
                }
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
            self.should_quit = true;
            return self.grid.blur();
        }

        if self.grid.is_editing() {
            return match cell_key(&key) {
                Some(k) => self.grid.handle_key(k),
                None => Vec::new(),
            };
        }

        match key.code {
            KeyCode::Char('f') if ctrl => {
                let (term, field, mode) = &self.last_search;
                self.prompt = Some(Prompt::search(term, *field, *mode));
                Vec::new()
            }
            KeyCode::Char('l') if ctrl => {
                self.prompt = Some(Prompt::filter(self.grid.filter()));
                Vec::new()
            }
            KeyCode::Char('s') if ctrl => self.grid.toggle_sort(),
            KeyCode::Char('r') if ctrl => self.grid.refresh_selected().into_iter().collect(),
            KeyCode::Char('e') if ctrl => {
                self.grid.begin_status_edit();
                Vec::new()
            }
            KeyCode::F(1) => {
                self.show_help = true;
                Vec::new()
            }
            KeyCode::Esc => {
                self.grid.dismiss_error();
                Vec::new()
            }
            KeyCode::F(2) => self.grid.handle_key(CellKey::Enter),
            KeyCode::PageUp => self.page(Direction::Up),
            KeyCode::PageDown => self.page(Direction::Down),
            KeyCode::Home => {
                let col = self.grid.cursor().col;
                self.grid.set_cursor(GridCursor::new(0, col))
            }
            KeyCode::End => {
                let cursor = self.grid.cursor();
                let last = self.grid.record_count().saturating_sub(1);
                let mut effects = self.grid.set_cursor(GridCursor::new(last, cursor.col));
                // step once more so reaching the end prefetches
                effects.extend(self.grid.move_cursor(Direction::Down));
                effects
            }
            _ => match cell_key(&key) {
                Some(k) => self.grid.handle_key(k),
                None => Vec::new(),
            },
        }
    }

    fn page(&mut self, direction: Direction) -> Vec<GridEffect> {
        let rows = self.grid.viewport_height().saturating_sub(1).max(1);
        let mut effects = Vec::new();
        for _ in 0..rows {
            effects.extend(self.grid.move_cursor(direction));
        }
        effects
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Vec<GridEffect> {
        if self.show_help || self.prompt.is_some() {
            return Vec::new();
        }
        let effects = match mouse.kind {
            MouseEventKind::ScrollDown => self.grid.scroll_by(WHEEL_ROWS),
            MouseEventKind::ScrollUp => self.grid.scroll_by(-WHEEL_ROWS),
            MouseEventKind::Down(MouseButton::Left) => match self.hit_test(mouse.column, mouse.row) {
                Some(cursor) => {
                    let double = matches!(
                        self.last_click,
                        Some((last, at)) if last == cursor && now.duration_since(at) <= DOUBLE_CLICK
                    );
                    self.last_click = if double { None } else { Some((cursor, now)) };
                    self.grid.click(cursor, double)
                }
                None => self.grid.blur(),
            },
            _ => Vec::new(),
        };
        self.sync_scroll_col();
        effects
    }

    /// Map a terminal position to a grid cell (header and empty rows miss).
    fn hit_test(&self, x: u16, y: u16) -> Option<GridCursor> {
        let area = self.grid_area;
        if x < area.x || x >= area.x + area.width || y <= area.y || y >= area.y + area.height {
            return None;
        }
        let row = self.grid.scroll_top() + (y - area.y - 1) as usize;
        if row >= self.grid.record_count() {
            return None;
        }

        let mut left = area.x as usize;
        for c in self.visible_columns(area.width as usize) {
            let w = self.grid.columns()[c].width as usize + 1;
            if (x as usize) < left + w {
                return Some(GridCursor::new(row, c));
            }
            left += w;
        }
        None
    }

    // ------------------------------------------------------------------------
    // Horizontal scrolling
    // ------------------------------------------------------------------------

    fn visible_columns(&self, available: usize) -> Vec<usize> {
        let columns = self.grid.columns();
        let Some(first) = columns.first() else {
            return Vec::new();
        };
        let mut cols = vec![0];
        let mut used = first.width as usize + 1;
        for c in self.scroll_col.max(1)..columns.len() {
            let w = columns[c].width as usize + 1;
            if used + w > available && cols.len() > 1 {
                break;
            }
            used += w;
            cols.push(c);
        }
        cols
    }

    fn sync_scroll_col(&mut self) {
        let col = self.grid.cursor().col;
        if col == 0 {
            return;
        }
        if col < self.scroll_col {
            self.scroll_col = col;
            return;
        }
        let available = self.grid_area.width as usize;
        while self.scroll_col < col && !self.visible_columns(available).contains(&col) {
            self.scroll_col += 1;
        }
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let areas = self.areas(area);

        self.draw_title(frame, areas.title);
        if let Some(banner) = areas.banner {
            self.draw_banner(frame, banner);
        }
        self.draw_grid(frame, areas.grid);
        if let Some(prompt_area) = areas.prompt {
            self.draw_prompt(frame, prompt_area);
        }
        self.draw_status(frame, areas.status);

        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let loaded = self.grid.loaded_count();
        let count = if !self.grid.filter().is_empty() {
            format!("{}/{} shown (filter {:?})", self.grid.record_count(), loaded, self.grid.filter())
        } else if let Some(total) = self.grid.total_items() {
            format!("{} of {} items", loaded, total)
        } else {
            format!("{} items", loaded)
        };

        let query = match self.grid.query() {
            CatalogQuery::All => "all products".to_string(),
            CatalogQuery::Search { term, field, mode } => {
                format!("{} {} {:?}", field.label(), mode.as_param(), term)
            }
        };

        let mut title = format!(
            " stockgrid: {} | {} | {} | sort {}",
            self.api_base,
            query,
            count,
            self.grid.sort().as_str()
        );
        if self.grid.is_loading() {
            title.push_str(" | loading...");
        }
        if self.grid.pending_edits() > 0 {
            title.push_str(&format!(" | saving {}", self.grid.pending_edits()));
        }
        title.push(' ');

        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_banner(&self, frame: &mut Frame, area: Rect) {
        let message = self.grid.error().unwrap_or_default();
        let text = format!(" ✗ {}  (Esc to dismiss) ", message);
        let para = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )))
        .style(Style::default().bg(Color::Red));
        frame.render_widget(para, area);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let columns = self.grid.columns();
        let cursor = self.grid.cursor();
        let vis_cols = self.visible_columns(area.width as usize);

        let mut header_spans = Vec::with_capacity(vis_cols.len());
        for &c in &vis_cols {
            let column = &columns[c];
            let w = column.width as usize;
            let display = if column.is_numeric() {
                util::fit(&column.header, w, Align::Right)
            } else {
                util::fit(&column.header, w, Align::Left)
            };
            let style = if c == cursor.col {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            };
            header_spans.push(Span::styled(format!("{} ", display), style));
        }

        let visible_rows = area.height.saturating_sub(1) as usize;
        let mut lines: Vec<Line> = Vec::with_capacity(visible_rows + 1);
        lines.push(Line::from(header_spans));

        let window = self.grid.window();
        let top = self.grid.scroll_top().max(window.start_index);
        let end = (self.grid.scroll_top() + visible_rows).min(window.end_index);

        for r in top..end {
            let Some(record) = self.grid.record_at(r) else {
                continue;
            };
            let is_cursor_row = r == cursor.row;
            let mut spans = Vec::new();

            for &c in &vis_cols {
                let column = &columns[c];
                let w = column.width as usize;
                let is_cursor_cell = is_cursor_row && c == cursor.col;

                if is_cursor_cell && self.grid.editor().is_editing() {
                    let style = Style::default().fg(Color::Black).bg(Color::Yellow);
                    spans.extend(caret_spans(self.grid.editor().buffer(), w, style));
                    spans.push(Span::raw(" "));
                    continue;
                }

                let text = format_value(&record.get(column.field), column);
                let display = if column.is_numeric() {
                    util::fit(&text, w, Align::Right)
                } else {
                    util::fit(&text, w, Align::Left)
                };
                let style = if is_cursor_cell {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else if is_cursor_row {
                    Style::default().fg(Color::White)
                } else if c == 0 {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::Gray)
                };
                spans.push(Span::styled(format!("{} ", display), style));
            }
            lines.push(Line::from(spans));
        }

        if lines.len() <= visible_rows {
            if self.grid.is_loading() {
                lines.push(Line::from(Span::styled(
                    " loading...",
                    Style::default().fg(Color::DarkGray),
                )));
            } else if self.grid.record_count() == 0 {
                lines.push(Line::from(Span::styled(
                    " (no products)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect) {
        let Some(prompt) = &self.prompt else {
            return;
        };
        let label = prompt.label();
        let budget = (area.width as usize).saturating_sub(util::display_width(&label));
        let mut spans = vec![Span::styled(
            label,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )];
        spans.extend(caret_spans(&prompt.buffer, budget, Style::default().fg(Color::White)));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let bar = Style::default().fg(Color::Black).bg(Color::DarkGray);

        if let Some(buffer) = self.grid.status_buffer() {
            let label = " Nome: ";
            let budget = (area.width as usize).saturating_sub(label.len() + 1);
            let mut spans = vec![Span::styled(label, bar.add_modifier(Modifier::BOLD))];
            spans.extend(caret_spans(buffer, budget, Style::default().fg(Color::Black).bg(Color::Yellow)));
            let para = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
            frame.render_widget(para, area);
            return;
        }

        let cursor = self.grid.cursor();
        let left = match (self.grid.selected_record(), self.grid.columns().get(cursor.col)) {
            (Some(record), Some(column)) => format!(
                " {} {} | {} = {}",
                record.item_id,
                util::clip(&record.description, 30),
                column.header,
                format_value(&record.get(column.field), column)
            ),
            _ => String::new(),
        };
        let row = if self.grid.record_count() == 0 { 0 } else { cursor.row + 1 };
        let right = format!("Row {}/{}  F1: help ", row, self.grid.record_count());

        let padding = (area.width as usize)
            .saturating_sub(util::display_width(&left) + util::display_width(&right));
        let status = format!("{}{:pad$}{}", left, "", right, pad = padding);

        let para = Paragraph::new(Line::from(vec![Span::styled(status, bar)]))
            .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Navigation",
            "  ----------",
            "  arrows            Move cursor",
            "  Tab / Shift+Tab   Next/prev editable cell",
            "  PgUp / PgDn       Page up/down",
            "  Home / End        First/last row",
            "  wheel             Scroll",
            "",
            "  Editing",
            "  -------",
            "  Enter / F2        Edit cell (Enter saves)",
            "  any character     Start editing with it",
            "  double-click      Edit cell",
            "  Esc               Cancel edit",
            "  Ctrl+E            Edit name in status bar",
            "",
            "  Catalog",
            "  -------",
            "  Ctrl+F            Search (Tab field, Ctrl+O mode)",
            "  Ctrl+L            Filter loaded rows",
            "  Ctrl+S            Toggle sort",
            "  Ctrl+R            Reload selected row",
            "",
            "  General",
            "  -------",
            "  Esc               Dismiss error",
            "  F1                Toggle this help",
            "  Ctrl+Q            Quit",
            "",
        ];
        let help_width: u16 = 52;
        let help_height: u16 = help_lines.len() as u16 + 2;

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(
            area.x + x,
            area.y + y,
            help_width.min(area.width),
            help_height.min(area.height),
        );

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Terminal key to editor key. Control and Alt chords are not text.
fn cell_key(key: &KeyEvent) -> Option<CellKey> {
    let chord = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    Some(match key.code {
        KeyCode::Enter => CellKey::Enter,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => CellKey::BackTab,
        KeyCode::Tab => CellKey::Tab,
        KeyCode::BackTab => CellKey::BackTab,
        KeyCode::Esc => CellKey::Escape,
        KeyCode::Char(c) if !chord => CellKey::Char(c),
        KeyCode::Backspace => CellKey::Backspace,
        KeyCode::Delete => CellKey::Delete,
        KeyCode::Left => CellKey::Left,
        KeyCode::Right => CellKey::Right,
        KeyCode::Home => CellKey::Home,
        KeyCode::End => CellKey::End,
        KeyCode::Up => CellKey::Up,
        KeyCode::Down => CellKey::Down,
        _ => return None,
    })
}

/// Buffer text fitted to `width` cells, with the caret shown reversed.
fn caret_spans(buffer: &TextBuffer, width: usize, style: Style) -> Vec<Span<'static>> {
    if width == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = buffer.as_str().chars().collect();
    let caret = buffer.caret().min(chars.len());
    let skip = (caret + 1).saturating_sub(width);

    let before: String = chars[skip..caret].iter().collect();
    let at = chars.get(caret).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
    let used = util::display_width(&before) + util::display_width(&at);
    let after: String = chars
        .iter()
        .skip(caret + 1)
        .take(width.saturating_sub(used))
        .collect();
    let pad = width.saturating_sub(used + util::display_width(&after));

    vec![
        Span::styled(before, style),
        Span::styled(at, style.add_modifier(Modifier::REVERSED)),
        Span::styled(format!("{}{}", after, " ".repeat(pad)), style),
    ]
}

/// How long quitting waits for queued saves to reach the server.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Run the grid editor until the user quits.
pub fn run(grid: Grid, client: CatalogClient, initial: CatalogQuery) -> Result<(), String> {
    let mut app = TuiApp::new(grid, client.api_base().to_string());
    if let CatalogQuery::Search { term, field, mode } = &initial {
        app.last_search = (term.clone(), *field, *mode);
    }
    let worker = Worker::spawn(client);
    worker.submit(app.grid.reload(initial));

    let result = event_loop(&mut app, &worker);

    // The terminal is restored by now, so stderr reaches the user.
    let queued = app.grid.pending_edits();
    if queued > 0 {
        eprintln!("Saving {} pending edit(s)...", queued);
    }
    for event in worker.shutdown(SHUTDOWN_GRACE) {
        if let GridEvent::PersistFailed { message, .. } = &event {
            eprintln!("error: save failed: {}", message);
        }
        app.apply_event(event);
    }
    let unsaved = app.grid.pending_edits();
    if unsaved > 0 {
        log::warn!("quitting with {} unconfirmed edits", unsaved);
        eprintln!("warning: {} edit(s) were not confirmed by the server", unsaved);
    }
    app.grid.detach();
    result
}

fn event_loop(app: &mut TuiApp, worker: &Worker) -> Result<(), String> {
    terminal::enable_raw_mode()
        .map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;
    stdout()
        .execute(EnableMouseCapture)
        .map_err(|e| format!("failed to enable mouse capture: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(DisableMouseCapture);
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        for event in worker.drain() {
            worker.submit(app.apply_event(event));
        }

        let term_size = terminal
            .size()
            .map(|s| Rect::new(0, 0, s.width, s.height))
            .unwrap_or_default();
        worker.submit(app.resize(term_size));

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(Duration::from_millis(50))
            .map_err(|e| format!("event poll error: {}", e))?
        {
            match event::read().map_err(|e| format!("event read error: {}", e))? {
                Event::Key(key) => worker.submit(app.handle_key(key)),
                Event::Mouse(mouse) => worker.submit(app.handle_mouse(mouse, Instant::now())),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
