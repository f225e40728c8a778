//! The study session: one owner for navigation, selection, chapter text and
//! related-passage retrieval, so that every navigation change resets the
//! rest in one place.

use crate::corpus::{Book, CorpusAccessor, Verse};
use crate::error::{CorpusLookupError, StudyError, StudyResult};
use crate::navigation::{NavigationSelection, NavigationState};
use crate::retrieval::{Reconciled, RetrievalCoordinator, RetrievalOptions, RetrievalStatus};
use crate::search::{Citation, RelatedVerse, SimilaritySearch};
use crate::selection::{ClickOutcome, SelectionState, VerseFlags};
use std::ops::RangeInclusive;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterView {
    Loaded(Vec<Verse>),
    Failed(String),
}

/// What the related-passages panel should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedPanel<'a> {
    Prompt,
    Loading,
    Results(&'a [RelatedVerse]),
    Empty,
    Error(&'a StudyError),
}

impl RelatedPanel<'_> {
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            RelatedPanel::Prompt => Some("Click a verse to see related passages"),
            RelatedPanel::Loading => Some("Loading related verses..."),
            RelatedPanel::Empty => Some("No related verses found."),
            RelatedPanel::Results(_) | RelatedPanel::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRow<'a> {
    pub number: u32,
    pub text: &'a str,
    pub flags: VerseFlags,
}

pub struct StudySession<C> {
    corpus: C,
    navigation: NavigationState,
    selection: SelectionState,
    retrieval: RetrievalCoordinator,
    chapter: ChapterView,
}

impl<C: CorpusAccessor> StudySession<C> {
    /// Open the session on the first book of the corpus, chapter 1.
    pub fn new(
        corpus: C,
        search: Arc<dyn SimilaritySearch>,
        options: RetrievalOptions,
    ) -> StudyResult<Self> {
        let first = corpus
            .first_book()
            .map(|book| book.key.clone())
            .ok_or(CorpusLookupError::Empty)?;

        let mut session = Self {
            navigation: NavigationState::new(&first),
            selection: SelectionState::new(),
            retrieval: RetrievalCoordinator::new(search, options),
            chapter: ChapterView::Loaded(Vec::new()),
            corpus,
        };
        session.load_chapter()?;
        Ok(session)
    }

    pub fn corpus(&self) -> &C {
        &self.corpus
    }

    pub fn books(&self) -> &[Book] {
        self.corpus.books()
    }

    pub fn navigation(&self) -> &NavigationSelection {
        self.navigation.current()
    }

    pub fn current_book(&self) -> Option<&Book> {
        self.corpus.book(self.navigation.book_key()).ok()
    }

    pub fn chapter_range(&self) -> RangeInclusive<u32> {
        self.navigation.chapter_range(&self.corpus)
    }

    pub fn chapter_view(&self) -> &ChapterView {
        &self.chapter
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn retrieval_status(&self) -> &RetrievalStatus {
        self.retrieval.status()
    }

    pub fn requests_sent(&self) -> u64 {
        self.retrieval.requests_sent()
    }

    /// Switch to `book_key`, chapter 1. Selection, hover and related
    /// passages are cleared even when the book is unknown; in that case the
    /// chapter view holds the lookup error, which is also returned.
    pub fn select_book(&mut self, book_key: &str) -> StudyResult<()> {
        self.navigation.select_book(book_key);
        self.reset_for_navigation();
        self.load_chapter()
    }

    /// Move to chapter `n` of the current book. Out-of-range numbers are
    /// rejected and leave everything untouched.
    pub fn select_chapter(&mut self, chapter: u32) -> StudyResult<()> {
        if self.navigation.select_chapter(&self.corpus, chapter)? {
            self.reset_for_navigation();
            self.load_chapter()?;
        }
        Ok(())
    }

    pub fn hover(&mut self, verse: u32) {
        self.selection.hover(verse);
    }

    pub fn unhover(&mut self) {
        self.selection.unhover();
    }

    /// Click verse `n` of the displayed chapter. A new selection sends one
    /// related-passages request; clicking the selected verse clears it.
    pub fn click_verse(&mut self, verse: u32) -> StudyResult<ClickOutcome> {
        let text = {
            let verses = self.verses();
            let max = verses.len() as u32;
            verse
                .checked_sub(1)
                .and_then(|idx| verses.get(idx as usize))
                .cloned()
                .ok_or(StudyError::InvalidVerse { verse, max })?
        };

        let outcome = self.selection.click(verse, &text);
        match &outcome {
            ClickOutcome::Selected(selection) => {
                let book = self
                    .current_book()
                    .map(|book| book.name.clone())
                    .unwrap_or_else(|| self.navigation.book_key().to_string());
                self.retrieval.start(Citation {
                    book,
                    chapter: self.navigation.chapter(),
                    verse: selection.verse,
                });
            }
            ClickOutcome::Deselected => self.retrieval.reset(),
        }
        Ok(outcome)
    }

    /// Wait for the next retrieval to finish and apply it if it is still
    /// current.
    pub async fn next_retrieval(&mut self) -> Option<Reconciled> {
        let completion = self.retrieval.next_completion().await?;
        Some(self.retrieval.reconcile(completion))
    }

    /// Apply every retrieval that has already finished without waiting.
    /// Returns how many were applied.
    pub fn drain_retrievals(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.retrieval.try_next_completion() {
            if self.retrieval.reconcile(completion) == Reconciled::Applied {
                applied += 1;
            }
        }
        applied
    }

    pub fn verses(&self) -> &[Verse] {
        match &self.chapter {
            ChapterView::Loaded(verses) => verses,
            ChapterView::Failed(_) => &[],
        }
    }

    pub fn verse_rows(&self) -> impl Iterator<Item = VerseRow<'_>> {
        self.verses().iter().enumerate().map(move |(idx, text)| {
            let number = idx as u32 + 1;
            VerseRow {
                number,
                text,
                flags: self.selection.flags(number),
            }
        })
    }

    pub fn related_panel(&self) -> RelatedPanel<'_> {
        match self.retrieval.status() {
            RetrievalStatus::Loading => RelatedPanel::Loading,
            RetrievalStatus::Failed(err) => RelatedPanel::Error(err),
            _ if self.selection.selected().is_none() => RelatedPanel::Prompt,
            RetrievalStatus::Loaded(related) if !related.is_empty() => {
                RelatedPanel::Results(related)
            }
            _ => RelatedPanel::Empty,
        }
    }

    fn reset_for_navigation(&mut self) {
        self.selection.clear();
        self.retrieval.reset();
    }

    fn load_chapter(&mut self) -> StudyResult<()> {
        let nav = self.navigation.current();
        match self.corpus.chapter(&nav.book_key, nav.chapter) {
            Ok(verses) => {
                self.chapter = ChapterView::Loaded(verses.to_vec());
                Ok(())
            }
            Err(err) => {
                tracing::warn!(book = %nav.book_key, chapter = nav.chapter, error = %err, "chapter lookup failed");
                self.chapter = ChapterView::Failed(err.to_string());
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::search::SearchError;
    use futures_util::future::BoxFuture;

    struct NoResults;

    impl SimilaritySearch for NoResults {
        fn fetch_related(
            &self,
            _citation: Citation,
        ) -> BoxFuture<'static, Result<Vec<RelatedVerse>, SearchError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    fn session() -> StudySession<Corpus> {
        let corpus = Corpus::from_books(vec![Book {
            key: "gn".into(),
            abbreviation: "gn".into(),
            name: "Genesis".into(),
            chapters: vec![vec!["one".into(), "two".into()]],
        }]);
        StudySession::new(corpus, Arc::new(NoResults), RetrievalOptions::default()).unwrap()
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let result = StudySession::new(
            Corpus::default(),
            Arc::new(NoResults),
            RetrievalOptions::default(),
        );
        assert!(matches!(
            result,
            Err(StudyError::CorpusLookup(CorpusLookupError::Empty))
        ));
    }

    #[test]
    fn test_verse_rows_number_from_one() {
        let session = session();
        let numbers: Vec<u32> = session.verse_rows().map(|row| row.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(session.related_panel(), RelatedPanel::Prompt);
    }

    #[test]
    fn test_click_out_of_range_verse() {
        let mut session = session();
        assert_eq!(
            session.click_verse(3),
            Err(StudyError::InvalidVerse { verse: 3, max: 2 })
        );
        assert_eq!(
            session.click_verse(0),
            Err(StudyError::InvalidVerse { verse: 0, max: 2 })
        );
        assert_eq!(session.requests_sent(), 0);
    }

    #[tokio::test]
    async fn test_empty_results_show_empty_panel() {
        let mut session = session();
        session.click_verse(1).unwrap();
        assert_eq!(session.related_panel(), RelatedPanel::Loading);

        assert_eq!(session.next_retrieval().await, Some(Reconciled::Applied));
        assert_eq!(session.related_panel(), RelatedPanel::Empty);
        assert_eq!(
            session.related_panel().placeholder(),
            Some("No related verses found.")
        );
    }

    #[test]
    fn test_panel_placeholders() {
        assert_eq!(
            RelatedPanel::Prompt.placeholder(),
            Some("Click a verse to see related passages")
        );
        assert_eq!(
            RelatedPanel::Loading.placeholder(),
            Some("Loading related verses...")
        );
        let err = StudyError::RetrievalFailed("boom".into());
        assert_eq!(RelatedPanel::Error(&err).placeholder(), None);
    }
}
