use std::sync::{Arc, Mutex, MutexGuard};

/// One harvested title/body pair: the story metadata or a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub body: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Ordered, in-memory accumulation of harvested entries.
///
/// Cloning shares the same underlying list. Appends happen under the lock as
/// whole entries, so `snapshot` never sees a half-written one.
#[derive(Debug, Clone, Default)]
pub struct StoryStore {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl StoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Appends an entry and returns its index.
    pub fn push(&self, entry: Entry) -> usize {
        let mut entries = self.lock();
        entries.push(entry);
        entries.len() - 1
    }

    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        // Entries are only ever pushed whole, so a poisoned list is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
