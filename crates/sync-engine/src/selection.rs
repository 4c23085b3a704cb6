// crates/sync-engine/src/selection.rs
//! Sticky current-book selection

use crate::error::{EngineError, EngineResult};
use shelfsync_core::{Book, BookKey, BookSet};

/// What a reconcile did to the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The previous selection is still in the set
    Kept(BookKey),
    /// The previous selection was missing; the first book was chosen and
    /// should be persisted
    Defaulted(BookKey),
    /// The set was empty; nothing is selected
    Empty,
}

/// Known books plus the user's chosen one
///
/// Books and selection change together so the current key always refers to
/// a member of the set it was chosen from.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    books: BookSet,
    preferred: Option<BookKey>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a remembered key; it takes effect once a set contains it
    pub fn with_preferred(key: Option<BookKey>) -> Self {
        Self {
            books: BookSet::new(),
            preferred: key,
        }
    }

    /// Replaces the book set, keeping the selection when it is still present
    ///
    /// Calling this twice with the same set leaves the selection unchanged.
    pub fn reconcile(&mut self, books: BookSet) -> Reconciled {
        self.books = books;

        if let Some(key) = &self.preferred {
            if self.books.contains(key) {
                return Reconciled::Kept(key.clone());
            }
        }

        match self.books.first().map(|b| b.key.clone()) {
            Some(first) => {
                self.preferred = Some(first.clone());
                Reconciled::Defaulted(first)
            }
            None => Reconciled::Empty,
        }
    }

    /// Chooses a book from the current set
    pub fn select(&mut self, key: &BookKey) -> EngineResult<&Book> {
        if !self.books.contains(key) {
            return Err(EngineError::InvalidKey(key.to_string()));
        }
        self.preferred = Some(key.clone());
        self.books
            .get(key)
            .ok_or_else(|| EngineError::InvalidKey(key.to_string()))
    }

    /// Current key, only when it belongs to the current set
    pub fn current_key(&self) -> Option<&BookKey> {
        self.preferred.as_ref().filter(|k| self.books.contains(k))
    }

    pub fn current(&self) -> Option<&Book> {
        self.current_key().and_then(|k| self.books.get(k))
    }

    pub fn books(&self) -> &BookSet {
        &self.books
    }
}
