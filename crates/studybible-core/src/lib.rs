//! UI-agnostic core of the study bible.
//!
//! Browsing a corpus by book and chapter, selecting a verse, and fetching
//! related passages for it from a similarity-search service. Front-ends own a
//! [`StudySession`] and feed it user events; it owns all state.

pub mod config;
pub mod corpus;
pub mod error;
pub mod navigation;
pub mod retrieval;
pub mod search;
pub mod selection;
pub mod study;

// Re-export main types for convenience
pub use config::Config;
pub use corpus::{Book, Corpus, CorpusAccessor, Verse};
pub use error::{CorpusLookupError, StudyError, StudyResult};
pub use navigation::{NavigationSelection, NavigationState};
pub use retrieval::{
    Completion, Reconciled, RequestEpoch, RetrievalCoordinator, RetrievalOptions, RetrievalStatus,
};
pub use search::{Citation, RelatedVerse, SearchError, SimilarityClient, SimilaritySearch};
pub use selection::{ClickOutcome, SelectionState, VerseFlags, VerseSelection};
pub use study::{ChapterView, RelatedPanel, StudySession, VerseRow};
