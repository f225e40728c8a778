use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{ListState, Paragraph, Wrap};
use studybible_core::{
    ClickOutcome, Corpus, CorpusAccessor, Reconciled, RelatedPanel, StudyResult, StudySession,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLevel {
    Book,
    Chapter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Navigation,
    Content,
    Related,
}

/// Verse number gutter drawn in front of each verse.
pub fn verse_label(number: u32) -> String {
    format!("{}  ", number)
}

/// Screen rows occupied by one verse in the content pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseLines {
    pub start: u16,
    pub height: u16,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub status_message: Option<String>,

    // Navigation state
    pub nav_level: NavLevel,
    pub book_state: ListState,
    pub chapter_state: ListState,

    // Content state
    pub verse_cursor: Option<u32>,
    pub content_scroll: u16,
    pub content_height: u16,
    pub total_content_lines: u16,
    pub verse_lines: Vec<VerseLines>,

    // Related passages
    pub related_scroll: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub nav_area: Option<Rect>,
    pub content_area: Option<Rect>,
    pub related_area: Option<Rect>,

    // Data
    pub session: StudySession<Corpus>,
    pub service_url: String,
}

impl App {
    pub fn new(session: StudySession<Corpus>, service_url: String) -> Self {
        let mut book_state = ListState::default();
        book_state.select(Some(0));

        Self {
            should_quit: false,
            focus: FocusPane::Navigation,
            status_message: None,

            nav_level: NavLevel::Book,
            book_state,
            chapter_state: ListState::default(),

            verse_cursor: None,
            content_scroll: 0,
            content_height: 0,
            total_content_lines: 0,
            verse_lines: Vec::new(),

            related_scroll: 0,
            animation_frame: 0,

            nav_area: None,
            content_area: None,
            related_area: None,

            session,
            service_url,
        }
    }

    pub fn book_count(&self) -> usize {
        self.session.books().len()
    }

    pub fn chapter_count(&self) -> usize {
        self.session.chapter_range().count()
    }

    // Navigation actions
    pub fn nav_down(&mut self) {
        match self.nav_level {
            NavLevel::Book => {
                let len = self.book_count();
                if len > 0 {
                    let i = self.book_state.selected().unwrap_or(0);
                    self.book_state.select(Some((i + 1).min(len - 1)));
                }
            }
            NavLevel::Chapter => {
                let len = self.chapter_count();
                if len > 0 {
                    let i = self.chapter_state.selected().unwrap_or(0);
                    self.go_to_chapter((i + 1).min(len - 1));
                }
            }
        }
    }

    pub fn nav_up(&mut self) {
        match self.nav_level {
            NavLevel::Book => {
                let i = self.book_state.selected().unwrap_or(0);
                self.book_state.select(Some(i.saturating_sub(1)));
            }
            NavLevel::Chapter => {
                let i = self.chapter_state.selected().unwrap_or(0);
                self.go_to_chapter(i.saturating_sub(1));
            }
        }
    }

    pub fn nav_first(&mut self) {
        match self.nav_level {
            NavLevel::Book => self.book_state.select(Some(0)),
            NavLevel::Chapter => self.go_to_chapter(0),
        }
    }

    pub fn nav_last(&mut self) {
        match self.nav_level {
            NavLevel::Book => {
                let len = self.book_count();
                if len > 0 {
                    self.book_state.select(Some(len - 1));
                }
            }
            NavLevel::Chapter => {
                let len = self.chapter_count();
                if len > 0 {
                    self.go_to_chapter(len - 1);
                }
            }
        }
    }

    pub fn nav_enter(&mut self) {
        match self.nav_level {
            NavLevel::Book => {
                if let Some(i) = self.book_state.selected() {
                    self.open_book(i);
                }
            }
            NavLevel::Chapter => {
                // At chapter level, Enter focuses the content pane
                self.focus_content();
            }
        }
    }

    pub fn nav_back(&mut self) {
        if self.nav_level == NavLevel::Chapter {
            self.nav_level = NavLevel::Book;
        }
    }

    /// Select the book at list index `idx` and show its chapter list.
    pub fn open_book(&mut self, idx: usize) {
        let Some(key) = self.session.books().get(idx).map(|b| b.key.clone()) else {
            return;
        };
        self.book_state.select(Some(idx));
        let result = self.session.select_book(&key);
        self.record(result);
        self.reset_content();

        self.nav_level = NavLevel::Chapter;
        self.chapter_state.select(Some(0));
    }

    /// Select the chapter at list index `idx` (chapter `idx + 1`).
    pub fn go_to_chapter(&mut self, idx: usize) {
        let chapter = idx as u32 + 1;
        if chapter == self.session.navigation().chapter {
            self.chapter_state.select(Some(idx));
            return;
        }
        let result = self.session.select_chapter(chapter);
        if result.is_ok() {
            self.chapter_state.select(Some(idx));
            self.reset_content();
        }
        self.record(result);
    }

    pub fn next_chapter(&mut self) {
        let current = self.session.navigation().chapter as usize;
        if current < self.chapter_count() {
            self.go_to_chapter(current);
        }
    }

    pub fn prev_chapter(&mut self) {
        let current = self.session.navigation().chapter as usize;
        if current > 1 {
            self.go_to_chapter(current - 2);
        }
    }

    fn reset_content(&mut self) {
        self.verse_cursor = None;
        self.content_scroll = 0;
        self.related_scroll = 0;
    }

    fn record<T>(&mut self, result: StudyResult<T>) {
        match result {
            Ok(_) => self.status_message = None,
            Err(err) => {
                tracing::warn!(error = %err, "navigation failed");
                self.status_message = Some(err.to_string());
            }
        }
    }

    // Verse cursor and selection
    pub fn focus_content(&mut self) {
        self.focus = FocusPane::Content;
        if self.verse_cursor.is_none() && !self.session.verses().is_empty() {
            self.move_cursor_to(1);
        }
    }

    pub fn cursor_down(&mut self) {
        let len = self.session.verses().len() as u32;
        if len > 0 {
            let next = self.verse_cursor.map_or(1, |v| (v + 1).min(len));
            self.move_cursor_to(next);
        }
    }

    pub fn cursor_up(&mut self) {
        if let Some(current) = self.verse_cursor {
            self.move_cursor_to(current.saturating_sub(1).max(1));
        } else if !self.session.verses().is_empty() {
            self.move_cursor_to(1);
        }
    }

    pub fn cursor_first(&mut self) {
        if !self.session.verses().is_empty() {
            self.move_cursor_to(1);
        }
    }

    pub fn cursor_last(&mut self) {
        let len = self.session.verses().len() as u32;
        if len > 0 {
            self.move_cursor_to(len);
        }
    }

    fn move_cursor_to(&mut self, verse: u32) {
        self.verse_cursor = Some(verse);
        self.session.hover(verse);
        self.scroll_to_verse(verse);
    }

    /// Click the verse under the keyboard cursor.
    pub fn activate_cursor(&mut self) {
        if let Some(verse) = self.verse_cursor {
            self.click_verse(verse);
        }
    }

    pub fn click_verse(&mut self, verse: u32) {
        let result = self.session.click_verse(verse);
        if let Ok(ClickOutcome::Selected(_)) = &result {
            self.related_scroll = 0;
        }
        self.record(result);
    }

    /// Toggle off the current selection, if any.
    pub fn clear_selection(&mut self) {
        if let Some(verse) = self.session.selection().selected().map(|s| s.verse) {
            self.click_verse(verse);
        }
    }

    pub fn on_retrieval(&mut self, outcome: Reconciled) {
        if outcome == Reconciled::Applied {
            self.related_scroll = 0;
        }
    }

    /// Apply retrievals that finished while the last event was handled.
    pub fn apply_finished_retrievals(&mut self) {
        if self.session.drain_retrievals() > 0 {
            self.related_scroll = 0;
        }
    }

    // Content layout and scrolling
    /// Recompute where each verse lands for a pane `width` columns wide.
    /// Each verse is followed by one blank line.
    pub fn layout_verses(&mut self, width: u16) {
        let width = width.max(1);
        self.verse_lines.clear();

        let mut line: u16 = 0;
        for row in self.session.verse_rows() {
            // Word wrapping must match the content pane exactly
            let rendered = Line::from(vec![Span::raw(verse_label(row.number)), Span::raw(row.text)]);
            let height = Paragraph::new(rendered)
                .wrap(Wrap { trim: true })
                .line_count(width)
                .max(1) as u16;
            self.verse_lines.push(VerseLines {
                start: line,
                height,
            });
            line = line.saturating_add(height + 1);
        }
        self.total_content_lines = line;
    }

    /// The verse drawn at terminal cell (`x`, `y`), if any.
    pub fn verse_at(&self, x: u16, y: u16) -> Option<u32> {
        let area = self.content_area?;
        if x <= area.x || x >= area.x + area.width.saturating_sub(1) {
            return None;
        }
        if y <= area.y || y >= area.y + area.height.saturating_sub(1) {
            return None;
        }

        let line = y - area.y - 1 + self.content_scroll;
        self.verse_lines
            .iter()
            .position(|l| line >= l.start && line < l.start + l.height)
            .map(|idx| idx as u32 + 1)
    }

    pub fn scroll_down(&mut self) {
        if self.content_scroll < self.total_content_lines.saturating_sub(self.content_height) {
            self.content_scroll = self.content_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.content_scroll = self.content_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.content_height / 2;
        let max_scroll = self.total_content_lines.saturating_sub(self.content_height);
        self.content_scroll = (self.content_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.content_height / 2;
        self.content_scroll = self.content_scroll.saturating_sub(half_page);
    }

    fn scroll_to_verse(&mut self, verse: u32) {
        let Some(lines) = self.verse_lines.get(verse as usize - 1).copied() else {
            return;
        };
        let end = lines.start + lines.height;
        if lines.start < self.content_scroll {
            self.content_scroll = lines.start;
        } else if end > self.content_scroll + self.content_height {
            // Scroll so verse bottom is at viewport bottom
            self.content_scroll = end.saturating_sub(self.content_height);
        }
    }

    pub fn related_scroll_down(&mut self) {
        if let RelatedPanel::Results(_) = self.session.related_panel() {
            self.related_scroll = self.related_scroll.saturating_add(1);
        }
    }

    pub fn related_scroll_up(&mut self) {
        self.related_scroll = self.related_scroll.saturating_sub(1);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.related_panel() == RelatedPanel::Loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Title helpers
    pub fn nav_title(&self) -> String {
        match self.nav_level {
            NavLevel::Book => "Books".to_string(),
            NavLevel::Chapter => self
                .session
                .current_book()
                .map(|b| b.name.clone())
                .unwrap_or_else(|| self.session.navigation().book_key.clone()),
        }
    }

    pub fn content_title(&self) -> String {
        let nav = self.session.navigation();
        let name = self
            .session
            .corpus()
            .book(&nav.book_key)
            .map(|b| b.name.as_str())
            .unwrap_or(nav.book_key.as_str());
        format!("{} {}", name, nav.chapter)
    }

    pub fn related_title(&self) -> String {
        match self.session.selection().selected() {
            Some(selected) => {
                let nav = self.session.navigation();
                let name = self
                    .session
                    .current_book()
                    .map(|b| b.name.as_str())
                    .unwrap_or(nav.book_key.as_str());
                format!("Related to {} {}:{}", name, nav.chapter, selected.verse)
            }
            None => "Related Verses".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use std::sync::Arc;
    use studybible_core::{
        Book, Citation, RelatedVerse, RetrievalOptions, SearchError, SimilaritySearch,
    };

    struct Echo;

    impl SimilaritySearch for Echo {
        fn fetch_related(
            &self,
            citation: Citation,
        ) -> BoxFuture<'static, Result<Vec<RelatedVerse>, SearchError>> {
            Box::pin(async move {
                Ok(vec![RelatedVerse {
                    reference: citation.to_string(),
                    text: "echo".into(),
                }])
            })
        }
    }

    fn app() -> App {
        let corpus = Corpus::from_books(vec![
            Book {
                key: "gn".into(),
                abbreviation: "gn".into(),
                name: "Genesis".into(),
                chapters: vec![
                    vec!["In the beginning".into(), "The earth was formless".into()],
                    vec!["Thus the heavens".into()],
                ],
            },
            Book {
                key: "ex".into(),
                abbreviation: "ex".into(),
                name: "Exodus".into(),
                chapters: vec![vec!["Now these are the names".into()]],
            },
        ]);
        let session = StudySession::new(corpus, Arc::new(Echo), RetrievalOptions::default())
            .expect("session");
        App::new(session, "http://localhost:5000".into())
    }

    #[test]
    fn test_open_book_moves_to_chapter_list() {
        let mut app = app();
        app.nav_down();
        app.nav_enter();
        assert_eq!(app.nav_level, NavLevel::Chapter);
        assert_eq!(app.session.navigation().book_key, "ex");
        assert_eq!(app.chapter_state.selected(), Some(0));
        assert_eq!(app.nav_title(), "Exodus");
    }

    #[test]
    fn test_chapter_list_navigation_changes_chapter() {
        let mut app = app();
        app.nav_enter();
        app.nav_down();
        assert_eq!(app.session.navigation().chapter, 2);
        app.nav_down();
        assert_eq!(app.session.navigation().chapter, 2);
        app.prev_chapter();
        assert_eq!(app.session.navigation().chapter, 1);
        app.next_chapter();
        assert_eq!(app.content_title(), "Genesis 2");
    }

    #[test]
    fn test_cursor_hovers_verse() {
        let mut app = app();
        app.focus_content();
        assert_eq!(app.verse_cursor, Some(1));
        app.cursor_down();
        assert_eq!(app.session.selection().hovered(), Some(2));
        app.cursor_down();
        assert_eq!(app.verse_cursor, Some(2));
        app.cursor_up();
        assert_eq!(app.verse_cursor, Some(1));
    }

    #[tokio::test]
    async fn test_activate_and_clear_selection() {
        let mut app = app();
        app.focus_content();
        app.activate_cursor();
        assert_eq!(app.related_title(), "Related to Genesis 1:1");

        let outcome = app.session.next_retrieval().await.unwrap();
        app.on_retrieval(outcome);
        match app.session.related_panel() {
            RelatedPanel::Results(related) => assert_eq!(related[0].reference, "Genesis 1:1"),
            other => panic!("expected results, got {:?}", other),
        }

        app.clear_selection();
        assert_eq!(app.session.related_panel(), RelatedPanel::Prompt);
        assert_eq!(app.related_title(), "Related Verses");
    }

    #[tokio::test]
    async fn test_finished_retrievals_applied_before_drawing() {
        let mut app = app();
        app.focus_content();
        app.activate_cursor();
        app.related_scroll = 4;

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        app.apply_finished_retrievals();
        assert_eq!(app.related_scroll, 0);
        assert!(matches!(
            app.session.related_panel(),
            RelatedPanel::Results(_)
        ));
    }

    #[test]
    fn test_verse_hit_testing() {
        let mut app = app();
        app.content_area = Some(Rect::new(10, 0, 22, 10));
        app.layout_verses(20);
        // "2  The earth was formless" wraps after "was".
        assert_eq!(app.verse_lines[0], VerseLines { start: 0, height: 1 });
        assert_eq!(app.verse_lines[1], VerseLines { start: 2, height: 2 });
        assert_eq!(app.total_content_lines, 5);

        assert_eq!(app.verse_at(12, 1), Some(1));
        assert_eq!(app.verse_at(12, 2), None);
        assert_eq!(app.verse_at(12, 4), Some(2));
        assert_eq!(app.verse_at(10, 1), None);
    }

    #[test]
    fn test_invalid_click_sets_status() {
        let mut app = app();
        app.click_verse(9);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Verse 9 is out of range (1-2)")
        );
    }
}
