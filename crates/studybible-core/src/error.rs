//! Error kinds surfaced by navigation, selection, and retrieval.

use thiserror::Error;

/// A corpus lookup that found nothing. Never retried; the chapter pane shows
/// the message in place of verse text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorpusLookupError {
    #[error("Book \"{0}\" not found")]
    UnknownBook(String),

    #[error("Chapter {chapter} not found in {book}")]
    MissingChapter { book: String, chapter: u32 },

    #[error("Corpus contains no books")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudyError {
    #[error(transparent)]
    CorpusLookup(#[from] CorpusLookupError),

    #[error("Chapter {chapter} is out of range for {book} (1-{max})")]
    InvalidChapter { book: String, chapter: u32, max: u32 },

    #[error("Verse {verse} is out of range (1-{max})")]
    InvalidVerse { verse: u32, max: u32 },

    #[error("{0}")]
    RetrievalFailed(String),
}

pub type StudyResult<T> = Result<T, StudyError>;
