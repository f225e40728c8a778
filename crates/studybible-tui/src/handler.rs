use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, NavLevel};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Navigation => app.nav_down(),
            FocusPane::Content => app.cursor_down(),
            FocusPane::Related => app.related_scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Navigation => app.nav_up(),
            FocusPane::Content => app.cursor_up(),
            FocusPane::Related => app.related_scroll_up(),
        },
        KeyCode::Char('g') => match app.focus {
            FocusPane::Navigation => app.nav_first(),
            FocusPane::Content => app.cursor_first(),
            FocusPane::Related => app.related_scroll = 0,
        },
        KeyCode::Char('G') => match app.focus {
            FocusPane::Navigation => app.nav_last(),
            FocusPane::Content => app.cursor_last(),
            FocusPane::Related => {}
        },

        // Enter/Select
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => match app.focus {
            FocusPane::Navigation => app.nav_enter(),
            FocusPane::Content => app.activate_cursor(),
            FocusPane::Related => {}
        },
        KeyCode::Char(' ') if app.focus == FocusPane::Content => app.activate_cursor(),
        KeyCode::Esc => app.clear_selection(),

        // Back
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => match app.focus {
            FocusPane::Navigation => app.nav_back(),
            FocusPane::Content | FocusPane::Related => app.focus = FocusPane::Navigation,
        },

        KeyCode::Char(']') => app.next_chapter(),
        KeyCode::Char('[') => app.prev_chapter(),

        KeyCode::Tab => match app.focus {
            FocusPane::Navigation => app.focus_content(),
            FocusPane::Content => app.focus = FocusPane::Related,
            FocusPane::Related => app.focus = FocusPane::Navigation,
        },
        KeyCode::BackTab => match app.focus {
            FocusPane::Navigation => app.focus = FocusPane::Related,
            FocusPane::Content => app.focus = FocusPane::Navigation,
            FocusPane::Related => app.focus_content(),
        },

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_nav = app.nav_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_content = app.content_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_related = app.related_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Moved => match app.verse_at(x, y) {
            Some(verse) => app.session.hover(verse),
            None => {
                if app.session.selection().hovered().is_some() {
                    app.session.unhover();
                }
            }
        },
        MouseEventKind::Down(MouseButton::Left) => {
            if in_content {
                app.focus = FocusPane::Content;
                if let Some(verse) = app.verse_at(x, y) {
                    app.verse_cursor = Some(verse);
                    app.click_verse(verse);
                }
            } else if in_nav {
                app.focus = FocusPane::Navigation;
                if let Some(idx) = nav_row_at(app, y) {
                    match app.nav_level {
                        NavLevel::Book => app.open_book(idx),
                        NavLevel::Chapter => app.go_to_chapter(idx),
                    }
                }
            } else if in_related {
                app.focus = FocusPane::Related;
            }
        }
        MouseEventKind::ScrollDown => {
            if in_content {
                app.scroll_down();
                app.scroll_down();
                app.scroll_down();
            } else if in_nav {
                app.nav_down();
            } else if in_related {
                app.related_scroll_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_content {
                app.scroll_up();
                app.scroll_up();
                app.scroll_up();
            } else if in_nav {
                app.nav_up();
            } else if in_related {
                app.related_scroll_up();
            }
        }
        _ => {}
    }
}

/// List index under row `y` of the navigation pane, accounting for the
/// border and the list's scroll offset.
fn nav_row_at(app: &App, y: u16) -> Option<usize> {
    let area = app.nav_area?;
    if y <= area.y || y >= area.y + area.height.saturating_sub(1) {
        return None;
    }
    let (offset, len) = match app.nav_level {
        NavLevel::Book => (app.book_state.offset(), app.book_count()),
        NavLevel::Chapter => (app.chapter_state.offset(), app.chapter_count()),
    };
    let idx = offset + (y - area.y - 1) as usize;
    (idx < len).then_some(idx)
}
