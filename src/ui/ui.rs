use image::DynamicImage;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use ratatui_image::{Resize, StatefulImage, picker::Picker, protocol::StatefulProtocol};
use std::collections::HashMap;

use super::pagination::Pagination;
use crate::backend::model::Manga;
use crate::presenter::view::CatalogueView;

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    List,
    Search,
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Loading,
    Ready,
}

pub struct App {
    pub state: AppState,
    pub focus: Focus,
    pub title: String,
    pub search_query: String,
    pub search_mode: bool,
    pub status: Option<String>,
    pub items: Vec<Manga>,
    pub list_state: ListState,
    pub pagination: Pagination,
    source_id: i32,
    picker: Option<Picker>,
    image_states: HashMap<String, StatefulProtocol>,
    cover_requests: Vec<String>,
    page_request: Option<u32>,
}

impl App {
    pub fn new(source_id: i32) -> Self {
        Self::with_picker(source_id, Picker::from_query_stdio().ok())
    }

    fn with_picker(source_id: i32, picker: Option<Picker>) -> Self {
        Self {
            state: AppState::Loading,
            focus: Focus::List,
            title: "Catalogue".to_string(),
            search_query: String::new(),
            search_mode: false,
            status: None,
            items: Vec::new(),
            list_state: ListState::default(),
            pagination: Pagination::new(),
            source_id,
            picker,
            image_states: HashMap::new(),
            cover_requests: Vec::new(),
            page_request: None,
        }
    }

    pub fn selected_manga(&self) -> Option<&Manga> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            let next = match self.list_state.selected() {
                Some(i) => (i + 1).min(self.items.len() - 1),
                None => 0,
            };
            self.list_state.select(Some(next));
        }
        // Also runs on an empty list so a failed first page can be retried
        self.check_pagination();
    }

    pub fn select_prev(&mut self) {
        let prev = self.list_state.selected().unwrap_or(0).saturating_sub(1);
        if !self.items.is_empty() {
            self.list_state.select(Some(prev));
        }
    }

    fn check_pagination(&mut self) {
        let selected = self.list_state.selected().unwrap_or(0);
        if let Some(page) = self.pagination.on_scrolled(selected, self.items.len()) {
            self.page_request = Some(page);
        }
    }

    /// Page the list wants loaded next, if any.
    pub fn take_page_request(&mut self) -> Option<u32> {
        self.page_request.take()
    }

    /// Cover URLs that need downloading.
    pub fn take_cover_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.cover_requests)
    }

    pub fn add_cover_image(&mut self, url: &str, image: DynamicImage) {
        if let Some(ref picker) = self.picker {
            let protocol = picker.new_resize_protocol(image);
            self.image_states.insert(url.to_string(), protocol);
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}

impl CatalogueView for App {
    fn launch_source_id(&self) -> i32 {
        self.source_id
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn bind_adapter(&mut self) {
        self.items.clear();
        self.list_state.select(None);
    }

    fn enable_pagination(&mut self) {
        self.pagination.enable();
    }

    fn reset_pagination(&mut self) {
        self.pagination.reset();
        self.page_request = None;
    }

    fn page_failed(&mut self) {
        self.pagination.failed();
        self.page_request = None;
        self.state = AppState::Ready;
        self.set_status("Could not load the list, scroll down to retry");
    }

    fn append_items(&mut self, mangas: &[Manga]) {
        self.items.extend_from_slice(mangas);
        if self.list_state.selected().is_none() && !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
        self.state = AppState::Ready;
    }

    fn clear_items(&mut self) {
        self.items.clear();
        self.list_state.select(None);
        self.state = AppState::Loading;
    }

    fn update_item(&mut self, index: usize, manga: &Manga) {
        if let Some(item) = self.items.get_mut(index) {
            *item = manga.clone();
        }
    }

    fn refresh_item_image(&mut self, index: usize, thumbnail_url: Option<&str>) {
        let Some(url) = thumbnail_url else {
            return;
        };
        if let Some(item) = self.items.get_mut(index) {
            item.thumbnail_url = Some(url.to_string());
        }
        if !self.image_states.contains_key(url) && !self.cover_requests.iter().any(|u| u == url) {
            self.cover_requests.push(url.to_string());
        }
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search bar
            Constraint::Min(10),   // list + detail
            Constraint::Length(3), // footer
        ])
        .split(area);

    draw_search_bar(f, root[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(root[1]);

    match app.state {
        AppState::Loading if app.items.is_empty() => draw_loading(f, body[0], app),
        _ => draw_list(f, body[0], app),
    }
    draw_detail(f, body[1], app);
    draw_footer(f, root[2], app);
}

fn draw_search_bar(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Search;
    let mode = if app.search_mode { "Search" } else { "Popular" };
    let loading = if app.pagination.is_loading() { " …" } else { "" };

    let mut spans = vec![
        Span::styled(" / ", Style::default().fg(Color::Yellow)),
        Span::raw(app.search_query.as_str()),
    ];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            "{} · {} · page {}{}",
            app.title,
            mode,
            app.pagination.current_page().max(1),
            loading
        ))
        .border_style(focus_style(focused, Color::Cyan));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_loading(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Manga")
        .border_style(focus_style(app.focus == Focus::List, Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let spinner_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let frame_idx = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| (d.as_millis() / 100) as usize)
        .unwrap_or(0)
        % spinner_frames.len();

    let text = Line::from(vec![
        Span::styled(
            format!(" {} ", spinner_frames[frame_idx]),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled("Loading...", Style::default().fg(Color::White)),
    ]);

    let center = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Percentage(45),
        ])
        .split(inner);
    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), center[1]);
}

fn draw_list(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Manga ({})", app.items.len()))
        .border_style(focus_style(app.focus == Focus::List, Color::White));

    if app.items.is_empty() {
        let empty = Paragraph::new("No manga found")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let rows: Vec<ListItem> = app
        .items
        .iter()
        .map(|manga| {
            let marker = if manga.initialized { "●" } else { "○" };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", marker), Style::default().fg(Color::Magenta)),
                Span::raw(truncate_text(&manga.title, width.saturating_sub(2))),
            ]))
        })
        .collect();

    let list = List::new(rows)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_detail(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(manga) = app.list_state.selected().and_then(|i| app.items.get(i)) else {
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(55), // cover
            Constraint::Min(4),         // metadata
        ])
        .split(inner);

    let image_state = manga
        .thumbnail_url
        .as_ref()
        .and_then(|url| app.image_states.get_mut(url));
    if let Some(state) = image_state {
        let image_widget = StatefulImage::new().resize(Resize::Scale(None));
        f.render_stateful_widget(image_widget, layout[0], state);
    } else {
        let placeholder = if manga.initialized {
            "No cover"
        } else {
            "Loading..."
        };
        let content = vec![
            Line::from(""),
            Line::from(Span::styled("📚", Style::default().fg(Color::Magenta))),
            Line::from(Span::styled(placeholder, Style::default().fg(Color::DarkGray))),
        ];
        f.render_widget(
            Paragraph::new(content).alignment(Alignment::Center),
            layout[0],
        );
    }

    let mut lines = vec![Line::from(Span::styled(
        manga.title.as_str(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))];
    for (label, value) in [
        ("Author", &manga.author),
        ("Artist", &manga.artist),
        ("Status", &manga.status),
        ("Genre", &manga.genre),
    ] {
        if let Some(value) = value {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", label), Style::default().fg(Color::Cyan)),
                Span::raw(value.as_str()),
            ]));
        }
    }
    if let Some(description) = &manga.description {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            description.as_str(),
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), layout[1]);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let text = match &app.status {
        Some(status) => Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(vec![
            Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
            Span::raw(": move  "),
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(": search  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(": back to list  "),
            Span::styled("o", Style::default().fg(Color::Yellow)),
            Span::raw(": open in browser  "),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(": quit"),
        ]),
    };

    let p = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Center);
    f.render_widget(p, area);
}

fn focus_style(focused: bool, idle: Color) -> Style {
    if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(idle)
    }
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        format!(
            "{}...",
            text.chars()
                .take(max_len.saturating_sub(3))
                .collect::<String>()
        )
    }
}
