//! Ordered, key-unique collection of books produced by one fetch

use crate::error::{CoreError, CoreResult};
use crate::types::book::{Book, BookKey};
use crate::types::platform::Platform;
use serde::{Deserialize, Serialize};

/// Mapping key -> book, in fetch/parse order
///
/// Keys are unique within a set. Currently-reading shelves are small, so a
/// linear scan over a `Vec` keeps ordering trivially stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSet {
    books: Vec<Book>,
}

impl BookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from books in order, failing on the first duplicate key
    pub fn from_books(books: Vec<Book>) -> CoreResult<Self> {
        let mut set = Self::new();
        for book in books {
            set.insert(book)?;
        }
        Ok(set)
    }

    /// Appends a book, rejecting a key that is already present
    pub fn insert(&mut self, book: Book) -> CoreResult<()> {
        if self.contains(&book.key) {
            return Err(CoreError::DuplicateKey(book.key.to_string()));
        }
        self.books.push(book);
        Ok(())
    }

    pub fn get(&self, key: &BookKey) -> Option<&Book> {
        self.books.iter().find(|b| &b.key == key)
    }

    pub fn contains(&self, key: &BookKey) -> bool {
        self.get(key).is_some()
    }

    /// First book in fetch order
    pub fn first(&self) -> Option<&Book> {
        self.books.first()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Book> {
        self.books.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BookKey> {
        self.books.iter().map(|b| &b.key)
    }

    /// Platform the books were fetched from, if the set is non-empty
    pub fn platform(&self) -> Option<Platform> {
        self.books.first().map(|b| b.platform)
    }
}

impl<'a> IntoIterator for &'a BookSet {
    type Item = &'a Book;
    type IntoIter = std::slice::Iter<'a, Book>;

    fn into_iter(self) -> Self::IntoIter {
        self.books.iter()
    }
}
