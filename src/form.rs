use crate::error::Result;
use crate::export::{ExportFormat, ExportTarget, retarget_path};
use crate::preview::{MAX_PREVIEW, Preview};
use crate::request::{FormFields, QrRequest};
use crate::session::{RequestSource, Status, StatusSink, generate_action, preview_action};
use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use image::imageops::FilterType;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
};
use std::io::{self, Stdout};
use tui_textarea::{CursorMove, Input, TextArea};

const FILL_CHOICES: [(&str, &str); 3] = [("black", "Black"), ("white", "White"), ("custom", "Custom")];
const FILL_CUSTOM: usize = 2;

const BACKGROUND_CHOICES: [(&str, &str); 4] = [
    ("white", "White"),
    ("black", "Black"),
    ("custom", "Custom"),
    ("transparent", "Transparent"),
];
const BACKGROUND_CUSTOM: usize = 2;

/// Runs the interactive form until the user quits.
pub fn run() -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode().context("Could not enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Could not enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Could not create terminal")?;

    let mut app = App::default();
    let res = run_app_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("Form exited with an error")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Text,
    Fill,
    CustomFill,
    Background,
    CustomBackground,
    Format,
    ModuleSize,
    Border,
    Path,
}

const FIELDS: [Field; 9] = [
    Field::Text,
    Field::Fill,
    Field::CustomFill,
    Field::Background,
    Field::CustomBackground,
    Field::Format,
    Field::ModuleSize,
    Field::Border,
    Field::Path,
];

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Text => "Text / URL",
            Field::Fill => "Fill Color",
            Field::CustomFill => "Custom Fill",
            Field::Background => "Background",
            Field::CustomBackground => "Custom Background",
            Field::Format => "Format",
            Field::ModuleSize => "Module Size (px)",
            Field::Border => "Border (px)",
            Field::Path => "Output File",
        }
    }

    fn index(self) -> usize {
        FIELDS.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Field {
        FIELDS[(self.index() + 1) % FIELDS.len()]
    }

    fn prev(self) -> Field {
        FIELDS[(self.index() + FIELDS.len() - 1) % FIELDS.len()]
    }
}

fn single_line<'a>(value: &str) -> TextArea<'a> {
    let mut textarea = TextArea::new(vec![value.to_string()]);
    textarea.set_cursor_line_style(Style::new());
    textarea.move_cursor(CursorMove::End);
    textarea
}

fn value(textarea: &TextArea) -> String {
    textarea.lines().join("\n")
}

fn cycle(index: usize, len: usize, step: isize) -> usize {
    (index as isize + step).rem_euclid(len as isize) as usize
}

// Left/Right and Space move between the options of a choice field.
fn choice_step(key: &KeyEvent) -> Option<isize> {
    match key.code {
        KeyCode::Left => Some(-1),
        KeyCode::Right | KeyCode::Char(' ') => Some(1),
        _ => None,
    }
}

/// The editable state of the form.
struct FormState<'a> {
    focus: Field,

    text: TextArea<'a>,
    custom_fill: TextArea<'a>,
    custom_background: TextArea<'a>,
    module_size: TextArea<'a>,
    border: TextArea<'a>,
    path: TextArea<'a>,

    fill_choice: usize,
    background_choice: usize,
    format: ExportFormat,
}

impl<'a> Default for FormState<'a> {
    fn default() -> FormState<'a> {
        let defaults = FormFields::default();

        let mut text = single_line("");
        text.set_placeholder_text("https://example.com");

        let mut path = single_line("");
        path.set_placeholder_text(
            ExportTarget::default_path(ExportFormat::default())
                .to_string_lossy()
                .into_owned(),
        );

        FormState {
            focus: Field::Text,

            text,
            custom_fill: single_line(&defaults.custom_fill),
            custom_background: single_line(&defaults.custom_background),
            module_size: single_line(&defaults.module_size),
            border: single_line(&defaults.border),
            path,

            fill_choice: 0,
            background_choice: 0,
            format: ExportFormat::default(),
        }
    }
}

impl<'a> FormState<'a> {
    fn fields(&self) -> FormFields {
        FormFields {
            text: value(&self.text),
            fill_choice: FILL_CHOICES[self.fill_choice].0.to_string(),
            custom_fill: value(&self.custom_fill),
            background_choice: BACKGROUND_CHOICES[self.background_choice].0.to_string(),
            custom_background: value(&self.custom_background),
            module_size: value(&self.module_size),
            border: value(&self.border),
        }
    }

    fn textarea_mut(&mut self, field: Field) -> Option<&mut TextArea<'a>> {
        match field {
            Field::Text => Some(&mut self.text),
            Field::CustomFill => Some(&mut self.custom_fill),
            Field::CustomBackground => Some(&mut self.custom_background),
            Field::ModuleSize => Some(&mut self.module_size),
            Field::Border => Some(&mut self.border),
            Field::Path => Some(&mut self.path),
            Field::Fill | Field::Background | Field::Format => None,
        }
    }

    // Option labels and the selected index for choice fields.
    fn choice(&self, field: Field) -> Option<(Vec<&'static str>, usize)> {
        match field {
            Field::Fill => Some((FILL_CHOICES.iter().map(|c| c.1).collect(), self.fill_choice)),
            Field::Background => Some((
                BACKGROUND_CHOICES.iter().map(|c| c.1).collect(),
                self.background_choice,
            )),
            Field::Format => Some((
                ExportFormat::ALL.iter().map(|f| f.extension()).collect(),
                self.format_index(),
            )),
            _ => None,
        }
    }

    fn format_index(&self) -> usize {
        ExportFormat::ALL
            .iter()
            .position(|f| *f == self.format)
            .unwrap_or(0)
    }

    // Changing the format also moves the output path to the new extension.
    fn set_format(&mut self, format: ExportFormat) {
        self.format = format;
        let path = retarget_path(&value(&self.path), format);
        let placeholder = self.path.placeholder_text().to_string();
        self.path = single_line(&path);
        self.path.set_placeholder_text(placeholder);
    }

    fn input(&mut self, key: KeyEvent) {
        match self.focus {
            Field::Fill => {
                if let Some(step) = choice_step(&key) {
                    self.fill_choice = cycle(self.fill_choice, FILL_CHOICES.len(), step);
                }
            }
            Field::Background => {
                if let Some(step) = choice_step(&key) {
                    self.background_choice =
                        cycle(self.background_choice, BACKGROUND_CHOICES.len(), step);
                }
            }
            Field::Format => {
                if let Some(step) = choice_step(&key) {
                    let index = cycle(self.format_index(), ExportFormat::ALL.len(), step);
                    self.set_format(ExportFormat::ALL[index]);
                }
            }
            field => {
                let Some(textarea) = self.textarea_mut(field) else {
                    return;
                };

                // Editing a custom color selects it.
                if textarea.input(Input::from(Event::Key(key))) {
                    match field {
                        Field::CustomFill => self.fill_choice = FILL_CUSTOM,
                        Field::CustomBackground => self.background_choice = BACKGROUND_CUSTOM,
                        _ => {}
                    }
                }
            }
        }
    }
}

impl<'a> RequestSource for FormState<'a> {
    fn qr_request(&self) -> Result<QrRequest> {
        self.fields().to_request()
    }

    fn export_target(&self) -> Result<ExportTarget> {
        Ok(ExportTarget::parse(
            &value(&self.path),
            self.format.extension(),
        )?)
    }
}

/// The last preview and status message.
#[derive(Default)]
struct OutputPane {
    preview: Option<Preview>,
    status: Option<Status>,
}

impl StatusSink for OutputPane {
    fn show_preview(&mut self, preview: Preview) {
        self.preview = Some(preview);
        self.status = None;
    }

    fn report(&mut self, status: Status) {
        self.status = Some(status);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Default)]
struct App<'a> {
    form: FormState<'a>,
    output: OutputPane,
}

impl<'a> App<'a> {
    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('q') if ctrl => return Flow::Quit,
            KeyCode::Char('p') if ctrl => preview_action(&self.form, &mut self.output, MAX_PREVIEW),
            KeyCode::Char('g') if ctrl => generate_action(&self.form, &mut self.output),
            KeyCode::Enter => preview_action(&self.form, &mut self.output, MAX_PREVIEW),
            KeyCode::Tab => self.form.focus = self.form.focus.next(),
            KeyCode::BackTab => self.form.focus = self.form.focus.prev(),
            _ => self.form.input(key),
        }

        Flow::Continue
    }
}

fn run_app_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw_ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.handle_key(key) == Flow::Quit
        {
            return Ok(());
        }
    }
}

// Draw the UI.
fn draw_ui(f: &mut ratatui::Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Spacer
            Constraint::Min(17),   // Form and preview
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help
        ])
        .horizontal_margin(2)
        .vertical_margin(1)
        .split(f.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(64), Constraint::Min(20)])
        .spacing(2)
        .split(chunks[1]);

    draw_form(f, app, body[0]);
    draw_preview(f, app, body[1]);
    draw_status(f, app, chunks[3]);
    draw_help(f, chunks[4]);
}

// Add a line for help text below.
fn draw_help(f: &mut ratatui::Frame, area: Rect) {
    let muted = Style::new().fg(Color::DarkGray);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            "Cycle Focus ".into(),
            Span::styled("Tab", muted),
            " ".repeat(3).into(),
            "Change ".into(),
            Span::styled("←/→", muted),
            " ".repeat(3).into(),
            "Preview ".into(),
            Span::styled("Enter", muted),
            " ".repeat(3).into(),
            "Generate ".into(),
            Span::styled("Ctrl + g", muted),
            " ".repeat(3).into(),
            "Exit ".into(),
            Span::styled("Ctrl + q", muted),
        ])),
        area,
    );
}

fn draw_status(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let Some(status) = &app.output.status else {
        return;
    };

    let color = match status {
        Status::Saved(_) => Color::Green,
        Status::Failed { .. } => Color::Red,
    };

    f.render_widget(Paragraph::new(status.to_string()).fg(color), area);
}

fn choice_line(labels: &[&'static str], selected: usize) -> Line<'static> {
    let mut spans = vec![];
    for (index, label) in labels.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("  "));
        }

        if index == selected {
            spans.push(Span::styled(format!("(•) {}", label), Style::new().bold()));
        } else {
            spans.push(Span::styled(
                format!("( ) {}", label),
                Style::new().fg(Color::DarkGray),
            ));
        }
    }

    Line::from(spans)
}

fn draw_form(f: &mut ratatui::Frame, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(FIELDS.map(|_| Constraint::Length(1)))
        .spacing(1)
        .split(area);

    let field_base = Block::default()
        .borders(Borders::LEFT)
        .border_type(BorderType::Thick)
        .border_style(Style::new().fg(Color::DarkGray))
        .padding(Padding::horizontal(1));

    let field_active = field_base
        .clone()
        .border_style(Style::new().fg(Color::Blue));

    let cursor_active = Style::new().bg(Color::White).fg(Color::Black);

    for (field, row) in FIELDS.iter().zip(rows.iter()) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(20), Constraint::Min(10)])
            .split(*row);

        let focused = app.form.focus == *field;

        let mut label = Paragraph::new(field.label());
        if !focused {
            label = label.fg(Color::DarkGray);
        }
        f.render_widget(label, columns[0]);

        let block = if focused {
            field_active.clone()
        } else {
            field_base.clone()
        };

        if let Some((labels, selected)) = app.form.choice(*field) {
            f.render_widget(
                Paragraph::new(choice_line(&labels, selected)).block(block),
                columns[1],
            );
        } else if let Some(textarea) = app.form.textarea_mut(*field) {
            textarea.set_block(block);
            textarea.set_cursor_style(if focused {
                cursor_active
            } else {
                Style::new().hidden()
            });
            f.render_widget(&*textarea, columns[1]);
        }
    }
}

fn draw_preview(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let label = match &app.output.preview {
        Some(preview) => preview.label(),
        None => "– × – px".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(Color::DarkGray))
        .title(label);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(preview) = &app.output.preview else {
        f.render_widget(
            Paragraph::new("Press Enter to preview")
                .fg(Color::DarkGray)
                .alignment(Alignment::Center),
            inner,
        );
        return;
    };

    // Each cell shows two pixels stacked vertically.
    let fitted = Preview::fitted(
        &preview.thumbnail,
        inner.width as u32,
        inner.height as u32 * 2,
        FilterType::Nearest,
    );

    f.render_widget(
        Paragraph::new(half_block_lines(&fitted.thumbnail)).alignment(Alignment::Center),
        inner,
    );
}

// Transparent and missing pixels show the terminal background.
fn pixel_color(image: &RgbaImage, x: u32, y: u32) -> Option<Color> {
    match image.get_pixel_checked(x, y) {
        Some(pixel) if pixel.0[3] > 0 => Some(Color::Rgb(pixel.0[0], pixel.0[1], pixel.0[2])),
        _ => None,
    }
}

fn half_block_lines(image: &RgbaImage) -> Vec<Line<'static>> {
    (0..image.height())
        .step_by(2)
        .map(|y| {
            let spans = (0..image.width())
                .map(|x| {
                    match (pixel_color(image, x, y), pixel_color(image, x, y + 1)) {
                        (Some(top), Some(bottom)) => {
                            Span::styled("▀", Style::new().fg(top).bg(bottom))
                        }
                        (Some(top), None) => Span::styled("▀", Style::new().fg(top)),
                        (None, Some(bottom)) => Span::styled("▄", Style::new().fg(bottom)),
                        (None, None) => Span::raw(" "),
                    }
                })
                .collect::<Vec<_>>();

            Line::from(spans)
        })
        .collect()
}
