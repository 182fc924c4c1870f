use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use veneer::admin::SHORTCUTS;
use veneer::dom::{Document, Node, NodeId};

use crate::app::{App, Popup};
use crate::theme::Theme;

static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(4),    // Page tree
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_page_tree(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Confirm => draw_confirm_popup(f, app),
        Popup::Alert => draw_alert_popup(f, app),
        Popup::Edit => draw_edit_popup(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > clock
    let line = if let Some(ref status) = app.status_message {
        Line::from(vec![Span::styled(status, Style::default().fg(warning()))])
    } else {
        let page = &app.page;
        let clock_color = if app.paused { warning() } else { accent() };
        let mut spans = vec![
            Span::styled("󰔟 ", Style::default().fg(clock_color)),
            Span::styled(
                format!("{:.2}s", page.now().as_secs_f64()),
                Style::default().fg(clock_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(text_dim())),
            Span::styled(format!("{} timers", page.pending_tasks()), Style::default().fg(text())),
        ];
        if let Some(due) = page.next_due() {
            let wait = due.saturating_sub(page.now());
            spans.push(Span::styled(
                format!(" (next in {}ms)", wait.as_millis()),
                Style::default().fg(text_dim()),
            ));
        }
        spans.push(Span::styled(" │ ", Style::default().fg(text_dim())));
        spans.push(Span::styled(
            format!("{} submissions", page.submissions().len()),
            Style::default().fg(if page.submissions().is_empty() { text_dim() } else { success() }),
        ));
        if app.paused {
            spans.push(Span::styled(" │ paused", Style::default().fg(warning())));
        }
        Line::from(spans)
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

/// `tag.class#id` label for a node
fn node_label(node: &Node) -> String {
    let mut label = node.tag.clone();
    for class in &node.classes {
        label.push('.');
        label.push_str(class);
    }
    if let Some(id) = node.id() {
        label.push('#');
        label.push_str(id);
    }
    label
}

/// Terminal style approximating the node's inline style
fn node_style(node: &Node) -> Style {
    let mut style = Style::default().fg(text());

    if let Some(color) = node.style("border-color").and_then(|c| theme().css_color(c)) {
        style = style.fg(color);
    }
    if let Some(opacity) = node.style("opacity").and_then(|o| o.parse::<f32>().ok()) {
        if opacity <= 0.0 {
            style = style.fg(inactive());
        } else if opacity < 1.0 {
            style = style.add_modifier(Modifier::DIM);
        }
    }
    if matches!(node.style("font-weight"), Some("bold") | Some("600") | Some("700")) {
        style = style.add_modifier(Modifier::BOLD);
    }
    if node.style("text-decoration") == Some("underline") {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if node.disabled {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    style
}

fn node_line<'a>(doc: &Document, id: NodeId, depth: usize, app: &App) -> Line<'a> {
    let node = doc.node(id);
    let style = node_style(node);
    let mut spans = vec![
        Span::raw("  ".repeat(depth)),
        Span::styled(format!("<{}>", node_label(node)), Style::default().fg(header())),
    ];

    if node.is("input") && node.attr("type") == Some("checkbox") {
        spans.push(Span::styled(if node.checked { " [x]" } else { " [ ]" }, style));
    } else if node.is("input") || node.is("textarea") {
        let shown = if node.value.is_empty() {
            node.attr("placeholder").unwrap_or("").to_string()
        } else {
            node.value.clone()
        };
        spans.push(Span::styled(format!(" [{}]", shown), style));
    }
    if !node.text.is_empty() {
        spans.push(Span::styled(format!(" {}", node.text), style));
    }

    // Transforms have no terminal equivalent; show them
    if let Some(transform) = node.style("transform") {
        if transform != "scale(1)" && transform != "translateY(0)" {
            spans.push(Span::styled(format!("  ⟨{}⟩", transform), Style::default().fg(text_dim())));
        }
    }
    if app.is_hoverable(id) && app.hovered == Some(id) {
        spans.push(Span::styled("  ◂ hover", Style::default().fg(accent())));
    }

    Line::from(spans)
}

fn draw_page_tree(f: &mut Frame, app: &App, area: Rect) {
    let doc = app.page.document();
    let selected = app.selected_node();

    let lines = app.tree_lines();
    let items: Vec<ListItem> = lines
        .iter()
        .map(|&(id, depth)| {
            let item = ListItem::new(node_line(doc, id, depth, app));
            if Some(id) == selected {
                item.style(Style::default().bg(bg_selected()))
            } else {
                item
            }
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Page ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let mut state = ListState::default();
    state.select(lines.iter().position(|&(id, _)| Some(id) == selected));

    f.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.popup {
        Popup::Edit => vec![("Enter", "save"), ("Esc", "cancel")],
        Popup::Confirm => vec![("y", "yes"), ("n", "no")],
        _ => vec![
            ("↑/↓", "move"),
            ("Space", "click"),
            ("s", "submit form"),
            ("p", "pause clock"),
            ("^/", "shortcuts"),
            ("?", "help"),
            ("q", "quit"),
        ],
    };

    let mut spans = Vec::new();
    for (i, (key, what)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
        }
        spans.push(Span::styled(*key, Style::default().fg(accent())));
        spans.push(Span::styled(format!(" {}", what), Style::default().fg(text_dim())));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(app.confirm_message.as_str(), Style::default().fg(warning()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes   "),
            Span::styled("n", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(warning())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(warning())),
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(confirm, popup_area);
}

fn draw_alert_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let alert = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(app.alert_message.as_str(), Style::default().fg(danger()))),
        Line::from(""),
        Line::from(Span::styled("Enter to dismiss", Style::default().fg(text_dim()))),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Alert ", Style::default().fg(danger())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(danger())),
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(alert, popup_area);
}

fn draw_edit_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, popup_area);

    let title = app
        .editing
        .map(|id| format!(" Edit <{}> ", node_label(app.page.document().node(id))))
        .unwrap_or_else(|| " Edit ".to_string());

    let input = Paragraph::new(format!("{}_", app.input_buffer))
        .style(Style::default().fg(text()))
        .block(
            Block::default()
                .title(Span::styled(title, Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(input, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 40 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let mut help_text = vec![
        section("═══ Previewer ═══"),
        entry("↑/↓ j/k", "Move between interactive elements (pointer follows)"),
        entry("Space", "Click, toggle checkbox or edit a field"),
        entry("s", "Submit the form around the selection"),
        entry("p", "Pause/resume the page clock"),
        Line::from(""),
        section("═══ Page shortcuts ═══"),
    ];
    for (combo, description) in SHORTCUTS {
        help_text.push(entry(combo, description));
    }
    help_text.push(Line::from(""));
    help_text.push(Line::from(vec![
        Span::styled("  Press ", Style::default().fg(text_dim())),
        Span::styled("?", Style::default().fg(accent())),
        Span::styled("/", Style::default().fg(text_dim())),
        Span::styled("Esc", Style::default().fg(accent())),
        Span::styled(" to close", Style::default().fg(text_dim())),
    ]));

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 veneer Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_style_follows_inline_style() {
        let mut node = Node::new("input");
        node.style.insert("border-color".to_string(), "red".to_string());
        node.style.insert("opacity".to_string(), "0.5".to_string());
        let style = node_style(&node);
        assert_eq!(style.fg, Some(danger()));
        assert!(style.add_modifier.contains(Modifier::DIM));

        let mut link = Node::new("a");
        link.style.insert("font-weight".to_string(), "bold".to_string());
        link.style.insert("text-decoration".to_string(), "underline".to_string());
        let style = node_style(&link);
        assert!(style.add_modifier.contains(Modifier::BOLD | Modifier::UNDERLINED));
    }

    #[test]
    fn test_node_label() {
        let mut node = Node::new("button");
        node.classes.push("btn-admin-danger".to_string());
        node.attrs.insert("id".to_string(), "del-3".to_string());
        assert_eq!(node_label(&node), "button.btn-admin-danger#del-3");
    }
}
