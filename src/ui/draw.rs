use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::RgbColor;
use crate::slot::Slot;

use super::app::{App, Focus};
use super::edit::{ContactForm, FormField};

const LIST_HELP: &str = "j/k: nav  /: search  a: add  e: edit  d: delete  i: import  q: quit";
const SEARCH_HELP: &str = "Type to filter by name or phone  Enter/Esc: back to list";
const FORM_HELP: &str = "Tab: switch field  Enter: save  Esc: cancel";
const CONFIRM_HELP: &str = "y/Enter: confirm  n/Esc: cancel";
const IMPORT_HELP: &str = "Path to .doc/.docx  Enter: import  Esc: cancel";

pub fn render<B: Backend, S: Slot>(terminal: &mut Terminal<B>, app: &mut App<S>) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame<S: Slot>(frame: &mut Frame<'_>, app: &mut App<S>) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_search(frame, layout[1], app);
    draw_table(frame, layout[2], app);
    draw_footer(frame, layout[3], app);
    draw_form_modal(frame, size, app);
    draw_import_modal(frame, size, app);
    draw_confirm_modal(frame, size, app);
}

fn draw_header<S: Slot>(frame: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let shown = app.rows.len();
    let total = app.total_contacts();
    let count = if shown == total {
        format!("{total} contacts")
    } else {
        format!("{shown} of {total} contacts")
    };
    let line = Line::from(vec![
        Span::styled("AGENDA", header_text_style(app).add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled(count, header_text_style(app)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_search<S: Slot>(frame: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let active = app.focus == Focus::Search
        && app.form.is_none()
        && app.import_modal.is_none()
        && app.confirm_modal.is_none();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, active));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let label = "SEARCH: ";
    let value_style = if active {
        selection_style(app)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(label, header_text_style(app)),
        Span::styled(app.search_input.value().to_string(), value_style),
    ]);
    frame.render_widget(Paragraph::new(line), inner);

    if active {
        let column = Span::raw(label).width() + app.search_input.visual_cursor();
        frame.set_cursor_position((inner.x.saturating_add(column as u16), inner.y));
    }
}

fn draw_table<S: Slot>(frame: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, app.focus == Focus::List));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    if app.rows.is_empty() {
        let message = if app.search_input.value().trim().is_empty() {
            "No contacts yet. Press `a` to add one or `i` to import."
        } else {
            "No contacts match the search."
        };
        render_centered_words(frame, inner, message);
        return;
    }

    let header = Row::new(vec![
        Cell::from("NAME").style(header_text_style(app)),
        Cell::from("PHONE").style(header_text_style(app)),
    ]);
    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|contact| Row::new(vec![contact.name.clone(), contact.phone.clone()]))
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .header(header)
        .highlight_style(selection_style(app))
        .highlight_symbol(" ");

    let mut state = TableState::default();
    state.select(app.selected);
    frame.render_stateful_widget(table, inner, &mut state);
}

fn draw_footer<S: Slot>(frame: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let help = if app.confirm_modal.is_some() {
        CONFIRM_HELP
    } else if app.import_modal.is_some() {
        IMPORT_HELP
    } else if app.form.is_some() {
        FORM_HELP
    } else if app.focus == Focus::Search {
        SEARCH_HELP
    } else {
        LIST_HELP
    };
    let message = app.status.as_deref().unwrap_or(help);
    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));
    frame.render_widget(Paragraph::new(Line::from(message.to_string())).style(style), area);
}

fn draw_form_modal<S: Slot>(frame: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let modal_area = centered_rect(area, 50, 6);
    frame.render_widget(Clear, modal_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, true))
        .title(Span::styled(form.title(), header_text_style(app)));
    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    if inner.height < 2 {
        return;
    }

    let label_width = FormField::Phone.label().len() + 2;
    let fields = [FormField::Name, FormField::Phone];
    let lines: Vec<Line> = fields
        .iter()
        .map(|field| form_line(app, form, *field, label_width))
        .collect();
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);

    let row = match form.focus {
        FormField::Name => 0,
        FormField::Phone => 1,
    };
    let x = inner
        .x
        .saturating_add((label_width + form.visual_cursor()) as u16);
    frame.set_cursor_position((x, inner.y.saturating_add(row)));
}

fn form_line<S: Slot>(
    app: &App<S>,
    form: &ContactForm,
    field: FormField,
    label_width: usize,
) -> Line<'static> {
    let focused = form.focus == field;
    let label = format!("{:width$}", format!("{}:", field.label()), width = label_width);
    let value_style = if focused {
        selection_style(app)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(label, header_text_style(app)),
        Span::styled(form.value(field).to_string(), value_style),
    ])
}

fn draw_import_modal<S: Slot>(frame: &mut Frame<'_>, area: Rect, app: &App<S>) {
    let Some(modal) = app.import_modal.as_ref() else {
        return;
    };

    let modal_area = centered_rect(area, 60, 3);
    frame.render_widget(Clear, modal_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, true))
        .title(Span::styled("IMPORT DOCUMENT", header_text_style(app)));
    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let label = "FILE: ";
    let line = Line::from(vec![
        Span::styled(label, header_text_style(app)),
        Span::raw(modal.input.value().to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), inner);

    let x = inner
        .x
        .saturating_add((label.len() + modal.input.visual_cursor()) as u16);
    frame.set_cursor_position((x, inner.y));
}

fn draw_confirm_modal<S: Slot>(frame: &mut Frame<'_>, area: Rect, app: &mut App<S>) {
    let Some(modal) = app.confirm_modal.as_ref() else {
        return;
    };

    let body_text = Text::from(vec![
        Line::from(modal.message.clone()),
        Line::from(String::new()),
        Line::from(CONFIRM_HELP.to_string()),
    ]);
    let title_line = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

/// Rect of `width_percent` of the area and a fixed inner height, centered.
fn centered_rect(area: Rect, width_percent: u16, inner_height: u16) -> Rect {
    let width = (area.width.saturating_mul(width_percent) / 100)
        .max(30)
        .min(area.width);
    let height = inner_height.saturating_add(2).min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn render_centered_words(frame: &mut Frame<'_>, area: Rect, text: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let y = area.y + area.height / 2;
    let line_area = Rect::new(area.x, y, area.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(text.to_string())).alignment(Alignment::Center),
        line_area,
    );
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn selection_style<S: Slot>(app: &App<S>) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style<S: Slot>(app: &App<S>, active: bool) -> Style {
    let colors = app.ui_colors();
    let style = Style::default().fg(color(colors.border));
    if active {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn header_text_style<S: Slot>(app: &App<S>) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.header))
}
