use crate::corpus::CorpusAccessor;
use crate::error::{StudyError, StudyResult};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSelection {
    pub book_key: String,
    pub chapter: u32,
}

/// Current book and chapter. Only ever holds a chapter within the book's
/// range, except after selecting a book the corpus does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    current: NavigationSelection,
}

impl NavigationState {
    pub fn new(book_key: &str) -> Self {
        Self {
            current: NavigationSelection {
                book_key: book_key.to_string(),
                chapter: 1,
            },
        }
    }

    pub fn current(&self) -> &NavigationSelection {
        &self.current
    }

    pub fn book_key(&self) -> &str {
        &self.current.book_key
    }

    pub fn chapter(&self) -> u32 {
        self.current.chapter
    }

    /// Switch books. The chapter always goes back to 1.
    pub fn select_book(&mut self, book_key: &str) {
        tracing::debug!(from = %self.current.book_key, to = %book_key, "select book");
        self.current = NavigationSelection {
            book_key: book_key.to_string(),
            chapter: 1,
        };
    }

    /// Move to `chapter` within the current book. Returns `Ok(false)` when
    /// that chapter is already current.
    pub fn select_chapter(
        &mut self,
        corpus: &impl CorpusAccessor,
        chapter: u32,
    ) -> StudyResult<bool> {
        let book = corpus.book(&self.current.book_key)?;
        let max = book.chapter_count();
        if chapter == 0 || chapter > max {
            return Err(StudyError::InvalidChapter {
                book: book.name.clone(),
                chapter,
                max,
            });
        }
        if chapter == self.current.chapter {
            return Ok(false);
        }

        tracing::debug!(book = %self.current.book_key, from = self.current.chapter, to = chapter, "select chapter");
        self.current.chapter = chapter;
        Ok(true)
    }

    /// Valid chapter numbers for the current book; empty when the book is
    /// unknown.
    #[allow(clippy::reversed_empty_ranges)]
    pub fn chapter_range(&self, corpus: &impl CorpusAccessor) -> RangeInclusive<u32> {
        match corpus.chapter_count(&self.current.book_key) {
            Ok(count) => 1..=count,
            Err(_) => 1..=0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Book, Corpus};

    fn corpus() -> Corpus {
        Corpus::from_books(vec![
            Book {
                key: "gn".into(),
                abbreviation: "gn".into(),
                name: "Genesis".into(),
                chapters: vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]],
            },
            Book {
                key: "ex".into(),
                abbreviation: "ex".into(),
                name: "Exodus".into(),
                chapters: vec![vec!["d".into()]],
            },
        ])
    }

    #[test]
    fn test_select_book_resets_chapter() {
        let corpus = corpus();
        let mut nav = NavigationState::new("gn");
        nav.select_chapter(&corpus, 3).unwrap();
        nav.select_book("ex");
        assert_eq!(nav.current(), &NavigationSelection { book_key: "ex".into(), chapter: 1 });
    }

    #[test]
    fn test_select_chapter_rejects_out_of_range() {
        let corpus = corpus();
        let mut nav = NavigationState::new("gn");
        for bad in [0, 4] {
            assert_eq!(
                nav.select_chapter(&corpus, bad),
                Err(StudyError::InvalidChapter { book: "Genesis".into(), chapter: bad, max: 3 })
            );
        }
        assert_eq!(nav.chapter(), 1);
    }

    #[test]
    fn test_select_same_chapter_is_not_a_change() {
        let corpus = corpus();
        let mut nav = NavigationState::new("gn");
        assert_eq!(nav.select_chapter(&corpus, 1), Ok(false));
        assert_eq!(nav.select_chapter(&corpus, 2), Ok(true));
    }

    #[test]
    fn test_chapter_range_follows_book() {
        let corpus = corpus();
        let mut nav = NavigationState::new("gn");
        assert_eq!(nav.chapter_range(&corpus), 1..=3);
        nav.select_book("ex");
        assert_eq!(nav.chapter_range(&corpus), 1..=1);
        nav.select_book("nope");
        assert!(nav.chapter_range(&corpus).is_empty());
    }
}
