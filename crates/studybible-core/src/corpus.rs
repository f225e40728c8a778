use crate::error::CorpusLookupError;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

pub type Verse = String;

/// One book of the corpus. Chapters and verses are stored 0-based; every
/// public accessor takes 1-based numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub key: String,
    pub abbreviation: String,
    pub name: String,
    pub chapters: Vec<Vec<Verse>>,
}

impl Book {
    pub fn chapter_count(&self) -> u32 {
        self.chapters.len() as u32
    }

    pub fn chapter(&self, chapter: u32) -> Option<&[Verse]> {
        let idx = chapter.checked_sub(1)? as usize;
        self.chapters.get(idx).map(Vec::as_slice)
    }
}

/// Read-only lookups over a fully loaded corpus.
pub trait CorpusAccessor {
    /// Books in canonical order.
    fn books(&self) -> &[Book];

    fn book(&self, key: &str) -> Result<&Book, CorpusLookupError>;

    fn chapter(&self, key: &str, chapter: u32) -> Result<&[Verse], CorpusLookupError> {
        let book = self.book(key)?;
        book.chapter(chapter)
            .ok_or_else(|| CorpusLookupError::MissingChapter {
                book: book.name.clone(),
                chapter,
            })
    }

    fn chapter_count(&self, key: &str) -> Result<u32, CorpusLookupError> {
        self.book(key).map(Book::chapter_count)
    }

    /// Where a fresh session opens.
    fn first_book(&self) -> Option<&Book> {
        self.books().first()
    }
}

#[derive(Deserialize)]
struct RawBook {
    #[serde(default, alias = "abbr")]
    abbrev: String,
    #[serde(default)]
    name: Option<String>,
    chapters: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    books: Vec<Book>,
    index: HashMap<String, usize>,
}

impl Corpus {
    pub fn from_books(books: Vec<Book>) -> Self {
        let index = books
            .iter()
            .enumerate()
            .map(|(i, book)| (book.key.clone(), i))
            .collect();
        Self { books, index }
    }

    /// Parse a corpus file. Two layouts are accepted: an object keyed by book
    /// key (key order is canonical order), or an array of books keyed by
    /// their abbreviation.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let content = content.trim_start_matches('\u{feff}');
        let value: Value = serde_json::from_str(content)?;

        let books = match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let raw: RawBook = serde_json::from_value(value)
                        .map_err(|e| anyhow!("Invalid book \"{}\": {}", key, e))?;
                    Ok(raw.into_book(key))
                })
                .collect::<Result<Vec<_>>>()?,
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let raw: RawBook = serde_json::from_value(value)
                        .map_err(|e| anyhow!("Invalid book at index {}: {}", i, e))?;
                    let key = raw.abbrev.clone();
                    if key.is_empty() {
                        return Err(anyhow!("Book at index {} has no abbreviation", i));
                    }
                    Ok(raw.into_book(key))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(anyhow!("Corpus must be a JSON object or array of books")),
        };

        Ok(Self::from_books(books))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read corpus {:?}: {}", path, e))?;
        let corpus = Self::from_json_str(&content)?;

        tracing::info!(
            path = %path.display(),
            books = corpus.books.len(),
            "corpus loaded"
        );

        Ok(corpus)
    }
}

impl RawBook {
    fn into_book(self, key: String) -> Book {
        Book {
            name: self.name.unwrap_or_else(|| key.clone()),
            abbreviation: self.abbrev,
            chapters: self.chapters,
            key,
        }
    }
}

impl CorpusAccessor for Corpus {
    fn books(&self) -> &[Book] {
        &self.books
    }

    fn book(&self, key: &str) -> Result<&Book, CorpusLookupError> {
        self.index
            .get(key)
            .and_then(|&i| self.books.get(i))
            .ok_or_else(|| CorpusLookupError::UnknownBook(key.to_string()))
    }
}
