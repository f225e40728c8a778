use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame,
};
use studybible_core::{ChapterView, RelatedPanel};

use crate::app::{verse_label, App, FocusPane, NavLevel};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Study Bible ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}]", app.service_url),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    if let Some(message) = &app.status_message {
        let line = Line::from(vec![
            Span::styled(" ! ", Style::default().bg(Color::Red).fg(Color::White)),
            Span::styled(format!(" {} ", message), Style::default().fg(Color::Red)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut hints = match app.focus {
        FocusPane::Navigation => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" select ", label_style),
            Span::styled(" h ", key_style),
            Span::styled(" back ", label_style),
        ],
        FocusPane::Content => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" verse ", label_style),
            Span::styled(" Space ", key_style),
            Span::styled(" related ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" clear ", label_style),
        ],
        FocusPane::Related => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
        ],
    };
    hints.extend(vec![
        Span::styled(" [/] ", key_style),
        Span::styled(" chapter ", label_style),
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
        Span::styled(" q ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    let [nav_area, content_area, related_area] = Layout::horizontal([
        Constraint::Length(24),
        Constraint::Min(30),
        Constraint::Percentage(35),
    ])
    .areas(area);

    // Store areas for mouse hit-testing
    app.nav_area = Some(nav_area);
    app.content_area = Some(content_area);
    app.related_area = Some(related_area);

    render_navigation(app, frame, nav_area);
    render_content(app, frame, content_area);
    render_related(app, frame, related_area);
}

fn border_style(focused: bool) -> Style {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Style::default().fg(color)
}

fn render_navigation(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Navigation))
        .title(format!(" {} ", app.nav_title()));

    let items: Vec<ListItem> = match app.nav_level {
        NavLevel::Book => app
            .session
            .books()
            .iter()
            .map(|b| ListItem::new(format!(" {} ", b.name)))
            .collect(),
        NavLevel::Chapter => app
            .session
            .chapter_range()
            .map(|c| ListItem::new(format!(" Chapter {} ", c)))
            .collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let state = match app.nav_level {
        NavLevel::Book => &mut app.book_state,
        NavLevel::Chapter => &mut app.chapter_state,
    };

    frame.render_stateful_widget(list, area, state);
}

fn render_content(app: &mut App, frame: &mut Frame, area: Rect) {
    let content_focused = app.focus == FocusPane::Content;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(content_focused))
        .title(format!(" {} ", app.content_title()));

    let inner_area = block.inner(area);
    app.content_height = inner_area.height;

    if let ChapterView::Failed(message) = app.session.chapter_view() {
        let alert = Paragraph::new(vec![
            Line::from(Span::styled("Error", Style::default().fg(Color::Red).bold())),
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
        ])
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(alert, area);
        app.verse_lines.clear();
        return;
    }

    app.layout_verses(inner_area.width);

    let mut lines: Vec<Line> = Vec::new();
    for row in app.session.verse_rows() {
        let is_cursor = content_focused && app.verse_cursor == Some(row.number);

        let verse_num_style = if is_cursor {
            Style::default().fg(Color::Black).bg(Color::Yellow).bold()
        } else if row.flags.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Yellow).bold()
        };

        let verse_text_style = if row.flags.selected {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else if row.flags.hovered {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };

        lines.push(Line::from(vec![
            Span::styled(verse_label(row.number), verse_num_style),
            Span::styled(row.text, verse_text_style),
        ]));
        lines.push(Line::default()); // Empty line between verses
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.content_scroll, 0));

    frame.render_widget(paragraph, area);
    render_scrollbar(frame, area, app.total_content_lines, app.content_height, app.content_scroll);
}

fn render_related(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Related))
        .title(format!(" {} ", app.related_title()));

    let panel = app.session.related_panel();
    let paragraph = match panel {
        RelatedPanel::Results(related) => {
            let mut lines: Vec<Line> = Vec::new();
            for verse in related {
                lines.push(Line::from(Span::styled(
                    verse.reference.clone(),
                    Style::default().fg(Color::Cyan).bold(),
                )));
                lines.push(Line::from(verse.text.clone()));
                lines.push(Line::default());
            }
            Paragraph::new(lines).scroll((app.related_scroll, 0))
        }
        RelatedPanel::Error(message) => Paragraph::new(vec![
            Line::from(Span::styled("Error", Style::default().fg(Color::Red).bold())),
            Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        ]),
        RelatedPanel::Loading => {
            // Animate the trailing dots
            let dots = ".".repeat(app.animation_frame as usize + 1);
            Paragraph::new(Span::styled(
                format!("Loading related verses{}", dots),
                Style::default().fg(Color::Yellow),
            ))
        }
        RelatedPanel::Prompt | RelatedPanel::Empty => Paragraph::new(Span::styled(
            panel.placeholder().unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        )),
    };

    frame.render_widget(paragraph.wrap(Wrap { trim: true }).block(block), area);
}

fn render_scrollbar(frame: &mut Frame, area: Rect, total: u16, height: u16, position: u16) {
    if total <= height {
        return;
    }

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("^"))
        .end_symbol(Some("v"));
    let mut scrollbar_state = ScrollbarState::new(total as usize).position(position as usize);

    frame.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}
