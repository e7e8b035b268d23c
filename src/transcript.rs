//! Visible messages of a session.

use crate::render::{MessageRole, SafeMarkup};

pub type EntryId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub role: MessageRole,
    pub content: String,
    pub markup: SafeMarkup,
    /// Set while the entry is an in-progress assistant reply.
    pub streaming: bool,
}

/// Ordered list of visible messages. Entry ids are unique for the lifetime of
/// the transcript and never reused, even across [`Transcript::clear`].
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: EntryId,
    welcome: Option<EntryId>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
        markup: SafeMarkup,
        streaming: bool,
    ) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(TranscriptEntry {
            id,
            role,
            content: content.into(),
            markup,
            streaming,
        });
        id
    }

    /// Push an entry that survives [`Transcript::clear`].
    pub fn push_welcome(&mut self, content: impl Into<String>, markup: SafeMarkup) -> EntryId {
        let id = self.push(MessageRole::Assistant, content, markup, false);
        self.welcome = Some(id);
        id
    }

    pub fn welcome(&self) -> Option<&TranscriptEntry> {
        self.welcome.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: EntryId) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Replace an entry's content and markup.
    pub fn update(
        &mut self,
        id: EntryId,
        content: &str,
        markup: SafeMarkup,
    ) -> Option<&TranscriptEntry> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        entry.content.clear();
        entry.content.push_str(content);
        entry.markup = markup;
        Some(&*entry)
    }

    /// Mark a streaming entry as complete.
    pub fn finalize(&mut self, id: EntryId) -> Option<&TranscriptEntry> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        entry.streaming = false;
        Some(&*entry)
    }

    pub fn remove(&mut self, id: EntryId) -> Option<TranscriptEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        if self.welcome == Some(id) {
            self.welcome = None;
        }
        Some(self.entries.remove(index))
    }

    /// Drop every entry except the welcome message.
    pub fn clear(&mut self) {
        let welcome = self.welcome;
        self.entries.retain(|entry| Some(entry.id) == welcome);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn streaming_entry(&self) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|entry| entry.streaming)
    }
}
