//! Live text buffers for open documents.
//!
//! A [`TextBuffer`] is the shared container an editor binds to a document
//! on open. The editor and the workspace both hold handles; the workspace
//! side is the authoritative copy for analysis.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::document::EditError;
use crate::document::TextChange;
use crate::document::TextDocument;

#[derive(Clone, Debug)]
pub struct TextBuffer {
    inner: Arc<RwLock<TextDocument>>,
}

impl TextBuffer {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TextDocument::new(content, 0))),
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.read().content().to_string()
    }

    #[must_use]
    pub fn version(&self) -> i32 {
        self.read().version()
    }

    /// Apply edits and return the new version.
    pub fn apply(&self, changes: &[TextChange]) -> Result<i32, EditError> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(changes)
    }

    /// Copy of the current document state.
    #[must_use]
    pub fn snapshot(&self) -> TextDocument {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, TextDocument> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}
