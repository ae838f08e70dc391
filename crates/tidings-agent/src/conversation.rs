// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversations and the process-scoped conversation store.
//!
//! The store lock is never held across a collaborator call. Readers take
//! cloned snapshots; the generation task writes back through the narrow
//! mutation methods below.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tidings_core::types::{ImageRef, Message, Role};
use tidings_core::{DocumentSource, TidingsError};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Name given to new conversations until auto-naming replaces it.
pub const DEFAULT_NAME: &str = "New conversation";

/// Suffix appended to the name of a forked conversation.
pub const FORK_SUFFIX: &str = " (copy)";

/// A document bound to a conversation as a context source.
#[derive(Clone)]
pub struct DocumentBinding {
    /// Display label, usually the file name.
    pub label: String,
    pub source: Arc<dyn DocumentSource>,
}

impl fmt::Debug for DocumentBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentBinding")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// One conversation: messages, attachments and the rolling summary.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub document: Option<DocumentBinding>,
    pub images: Vec<ImageRef>,
    pub messages: Vec<Message>,
    pub summary: Option<String>,
    /// Set by an explicit rename; auto-naming leaves the name alone afterwards.
    pub user_named: bool,
}

impl Conversation {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: DEFAULT_NAME.to_string(),
            created_at: now,
            updated_at: now,
            document: None,
            images: Vec::new(),
            messages: Vec::new(),
            summary: None,
            user_named: false,
        }
    }

    /// Completed user/assistant pairs.
    pub fn total_turns(&self) -> usize {
        self.messages.len() / 2
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    fn summary_view(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            document: self.document.as_ref().map(|d| d.label.clone()),
            image_count: self.images.len(),
            message_count: self.messages.len(),
            summary: self.summary.clone(),
        }
    }
}

/// Listing entry for a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub document: Option<String>,
    pub image_count: usize,
    pub message_count: usize,
    pub summary: Option<String>,
}

#[derive(Default)]
struct StoreInner {
    conversations: HashMap<String, Conversation>,
    current: Option<String>,
}

impl StoreInner {
    fn create(&mut self) -> &Conversation {
        let conversation = Conversation::new();
        let id = conversation.id.clone();
        if self.current.is_none() {
            self.current = Some(id.clone());
        }
        info!(conversation_id = %id, "conversation created");
        self.conversations.entry(id).or_insert(conversation)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Conversation, TidingsError> {
        self.conversations
            .get_mut(id)
            .ok_or_else(|| TidingsError::ConversationNotFound(id.to_string()))
    }

    fn most_recent(&self) -> Option<String> {
        self.conversations
            .values()
            .max_by_key(|c| c.updated_at)
            .map(|c| c.id.clone())
    }
}

/// Process-scoped conversation store with a "current" pointer.
#[derive(Default)]
pub struct ConversationStore {
    inner: RwLock<StoreInner>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a conversation. It becomes current only if none is.
    pub async fn create(&self) -> Conversation {
        self.inner.write().await.create().clone()
    }

    /// Returns the current conversation, creating one if none exists.
    pub async fn current(&self) -> Conversation {
        let mut inner = self.inner.write().await;
        if let Some(id) = inner.current.clone()
            && let Some(conversation) = inner.conversations.get(&id)
        {
            return conversation.clone();
        }
        inner.current = None;
        inner.create().clone()
    }

    pub async fn current_id(&self) -> Option<String> {
        self.inner.read().await.current.clone()
    }

    /// Snapshot of one conversation.
    pub async fn get(&self, id: &str) -> Result<Conversation, TidingsError> {
        self.inner
            .read()
            .await
            .conversations
            .get(id)
            .cloned()
            .ok_or_else(|| TidingsError::ConversationNotFound(id.to_string()))
    }

    /// All conversations, most recently updated first.
    pub async fn list(&self) -> Vec<ConversationSummary> {
        let inner = self.inner.read().await;
        let mut list: Vec<ConversationSummary> =
            inner.conversations.values().map(Conversation::summary_view).collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    pub async fn switch(&self, id: &str) -> Result<(), TidingsError> {
        let mut inner = self.inner.write().await;
        if !inner.conversations.contains_key(id) {
            return Err(TidingsError::ConversationNotFound(id.to_string()));
        }
        inner.current = Some(id.to_string());
        debug!(conversation_id = %id, "switched conversation");
        Ok(())
    }

    /// Deletes a conversation. If it was current, the most recently updated
    /// remaining conversation becomes current, or a fresh one is created.
    pub async fn delete(&self, id: &str) -> Result<(), TidingsError> {
        let mut inner = self.inner.write().await;
        if inner.conversations.remove(id).is_none() {
            return Err(TidingsError::ConversationNotFound(id.to_string()));
        }
        info!(conversation_id = %id, "conversation deleted");

        if inner.current.as_deref() == Some(id) {
            inner.current = inner.most_recent();
            if inner.current.is_none() {
                inner.create();
            }
        }
        Ok(())
    }

    /// Copies a conversation under a new id and makes the copy current.
    pub async fn fork(&self, id: &str) -> Result<Conversation, TidingsError> {
        let mut inner = self.inner.write().await;
        let source = inner
            .conversations
            .get(id)
            .ok_or_else(|| TidingsError::ConversationNotFound(id.to_string()))?;

        let mut fork = Conversation::new();
        fork.name = format!("{}{FORK_SUFFIX}", source.name);
        fork.document = source.document.clone();
        fork.images = source.images.clone();
        fork.messages = source.messages.clone();
        fork.summary = source.summary.clone();
        fork.user_named = source.user_named;

        let fork_id = fork.id.clone();
        info!(source = %id, conversation_id = %fork_id, "conversation forked");
        inner.current = Some(fork_id.clone());
        inner.conversations.insert(fork_id, fork.clone());
        Ok(fork)
    }

    pub async fn messages(&self, id: &str) -> Result<Vec<Message>, TidingsError> {
        Ok(self.get(id).await?.messages)
    }

    /// Renames a conversation and stops auto-naming from overwriting it.
    pub async fn rename(&self, id: &str, name: &str) -> Result<(), TidingsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TidingsError::InvalidRequest(
                "conversation name must not be empty".into(),
            ));
        }
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        conversation.name = name.to_string();
        conversation.user_named = true;
        conversation.touch();
        Ok(())
    }

    /// Sets a generated name unless the user has renamed the conversation.
    /// Returns whether the name changed.
    pub async fn set_auto_name(&self, id: &str, name: String) -> Result<bool, TidingsError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        if conversation.user_named || conversation.name == name {
            return Ok(false);
        }
        conversation.name = name;
        Ok(true)
    }

    /// Attaches base64-encoded image bytes. Names follow `image_<n>`.
    pub async fn attach_image(
        &self,
        id: &str,
        media_type: &str,
        bytes: &[u8],
    ) -> Result<ImageRef, TidingsError> {
        if bytes.is_empty() {
            return Err(TidingsError::InvalidRequest("image is empty".into()));
        }
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        let image = ImageRef {
            name: format!("image_{}", conversation.images.len() + 1),
            media_type: media_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        };
        conversation.images.push(image.clone());
        conversation.touch();
        debug!(conversation_id = %id, image = %image.name, "image attached");
        Ok(image)
    }

    /// Removes the image at `index`. An out-of-range index is an error.
    /// The rolling summary is kept.
    pub async fn remove_image(&self, id: &str, index: usize) -> Result<ImageRef, TidingsError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        if index >= conversation.images.len() {
            return Err(TidingsError::InvalidRequest(format!(
                "invalid image index {index}"
            )));
        }
        let removed = conversation.images.remove(index);
        conversation.touch();
        Ok(removed)
    }

    /// Removes every image. The rolling summary is kept.
    pub async fn clear_images(&self, id: &str) -> Result<(), TidingsError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        conversation.images.clear();
        conversation.touch();
        Ok(())
    }

    /// Binds a document context source, replacing any previous one.
    /// The rolling summary is kept.
    pub async fn bind_document(
        &self,
        id: &str,
        label: &str,
        source: Arc<dyn DocumentSource>,
    ) -> Result<(), TidingsError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        conversation.document = Some(DocumentBinding {
            label: label.to_string(),
            source,
        });
        conversation.touch();
        info!(conversation_id = %id, document = %label, "document bound");
        Ok(())
    }

    /// Removes the document binding. The rolling summary is kept.
    pub async fn unbind_document(&self, id: &str) -> Result<(), TidingsError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        conversation.document = None;
        conversation.touch();
        Ok(())
    }

    /// Appends a completed user/assistant pair.
    pub(crate) async fn append_turn(
        &self,
        id: &str,
        query: &str,
        images: Vec<ImageRef>,
        answer: &str,
    ) -> Result<(), TidingsError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        conversation
            .messages
            .push(Message::new(Role::User, query).with_images(images));
        conversation
            .messages
            .push(Message::new(Role::Assistant, answer));
        conversation.touch();
        Ok(())
    }

    /// Stores `summary` unless one is already cached. Returns whether it was stored.
    pub(crate) async fn set_summary_if_absent(
        &self,
        id: &str,
        summary: String,
    ) -> Result<bool, TidingsError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.get_mut(id)?;
        if conversation.summary.is_some() {
            return Ok(false);
        }
        conversation.summary = Some(summary);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidings_core::types::Passage;

    struct NoDocs;

    #[async_trait::async_trait]
    impl DocumentSource for NoDocs {
        async fn similarity_search(&self, _: &str, _: usize) -> Result<Vec<Passage>, TidingsError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn current_creates_on_first_access() {
        let store = ConversationStore::new();
        assert!(store.current_id().await.is_none());

        let first = store.current().await;
        assert_eq!(first.name, DEFAULT_NAME);
        assert_eq!(store.current_id().await.as_deref(), Some(first.id.as_str()));
        assert_eq!(store.current().await.id, first.id);
    }

    #[tokio::test]
    async fn create_does_not_steal_current() {
        let store = ConversationStore::new();
        let first = store.create().await;
        let second = store.create().await;
        assert_eq!(store.current_id().await, Some(first.id.clone()));
        assert_ne!(first.id, second.id);
        assert_eq!(store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn delete_current_reassigns_to_most_recent() {
        let store = ConversationStore::new();
        let a = store.create().await;
        let b = store.create().await;
        let c = store.create().await;
        store.append_turn(&b.id, "q", Vec::new(), "a").await.unwrap();

        store.delete(&a.id).await.unwrap();
        assert_eq!(store.current_id().await, Some(b.id.clone()));

        store.delete(&b.id).await.unwrap();
        assert_eq!(store.current_id().await, Some(c.id.clone()));
    }

    #[tokio::test]
    async fn deleting_last_conversation_creates_fresh_one() {
        let store = ConversationStore::new();
        let only = store.current().await;
        store.delete(&only.id).await.unwrap();

        let list = store.list().await;
        assert_eq!(list.len(), 1);
        assert_ne!(list[0].id, only.id);
        assert_eq!(store.current_id().await, Some(list[0].id.clone()));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let store = ConversationStore::new();
        let err = store.delete("nope").await.unwrap_err();
        assert!(matches!(err, TidingsError::ConversationNotFound(_)));
    }

    #[tokio::test]
    async fn fork_copies_state_and_becomes_current() {
        let store = ConversationStore::new();
        let source = store.current().await;
        store.append_turn(&source.id, "hi", Vec::new(), "hello").await.unwrap();
        store.set_summary_if_absent(&source.id, "greeting".into()).await.unwrap();
        store.attach_image(&source.id, "image/png", b"png").await.unwrap();
        store.bind_document(&source.id, "notes.pdf", Arc::new(NoDocs)).await.unwrap();

        let fork = store.fork(&source.id).await.unwrap();
        assert_eq!(fork.name, format!("{DEFAULT_NAME}{FORK_SUFFIX}"));
        assert_eq!(fork.messages.len(), 2);
        assert_eq!(fork.summary.as_deref(), Some("greeting"));
        assert_eq!(fork.images.len(), 1);
        assert_eq!(fork.document.as_ref().unwrap().label, "notes.pdf");
        assert_eq!(store.current_id().await, Some(fork.id.clone()));

        store.append_turn(&fork.id, "more", Vec::new(), "sure").await.unwrap();
        assert_eq!(store.messages(&source.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_is_sorted_by_recent_update() {
        let store = ConversationStore::new();
        let old = store.create().await;
        let new = store.create().await;
        store.append_turn(&old.id, "bump", Vec::new(), "ok").await.unwrap();

        let list = store.list().await;
        assert_eq!(list[0].id, old.id);
        assert_eq!(list[1].id, new.id);
        assert_eq!(list[0].message_count, 2);
    }

    #[tokio::test]
    async fn images_are_named_in_sequence_and_removable() {
        let store = ConversationStore::new();
        let id = store.current().await.id;

        let first = store.attach_image(&id, "image/jpeg", b"one").await.unwrap();
        let second = store.attach_image(&id, "image/jpeg", b"two").await.unwrap();
        assert_eq!(first.name, "image_1");
        assert_eq!(second.name, "image_2");
        assert_eq!(first.data, "b25l");

        assert!(store.remove_image(&id, 5).await.is_err());
        let removed = store.remove_image(&id, 0).await.unwrap();
        assert_eq!(removed.name, "image_1");
        assert_eq!(store.get(&id).await.unwrap().images[0].name, "image_2");

        store.clear_images(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().images.is_empty());
    }

    #[tokio::test]
    async fn rename_blocks_auto_naming() {
        let store = ConversationStore::new();
        let id = store.current().await.id;

        assert!(store.set_auto_name(&id, "Auto".into()).await.unwrap());
        store.rename(&id, "  Mine  ").await.unwrap();
        assert!(!store.set_auto_name(&id, "Auto again".into()).await.unwrap());

        let conversation = store.get(&id).await.unwrap();
        assert_eq!(conversation.name, "Mine");
        assert!(conversation.user_named);
        assert!(store.rename(&id, "   ").await.is_err());
    }

    #[tokio::test]
    async fn summary_is_set_at_most_once() {
        let store = ConversationStore::new();
        let id = store.current().await.id;
        assert!(store.set_summary_if_absent(&id, "first".into()).await.unwrap());
        assert!(!store.set_summary_if_absent(&id, "second".into()).await.unwrap());
        assert_eq!(store.get(&id).await.unwrap().summary.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn document_swap_keeps_stale_summary() {
        let store = ConversationStore::new();
        let id = store.current().await.id;
        store.set_summary_if_absent(&id, "about doc A".into()).await.unwrap();

        store.bind_document(&id, "a.pdf", Arc::new(NoDocs)).await.unwrap();
        store.unbind_document(&id).await.unwrap();
        store.bind_document(&id, "b.pdf", Arc::new(NoDocs)).await.unwrap();
        store.clear_images(&id).await.unwrap();

        let conversation = store.get(&id).await.unwrap();
        assert_eq!(conversation.summary.as_deref(), Some("about doc A"));
        assert_eq!(conversation.document.unwrap().label, "b.pdf");
    }

    #[tokio::test]
    async fn image_removal_keeps_stale_summary() {
        let store = ConversationStore::new();
        let id = store.current().await.id;
        store.attach_image(&id, "image/png", b"cat").await.unwrap();
        store.attach_image(&id, "image/png", b"dog").await.unwrap();
        store.set_summary_if_absent(&id, "about the cat".into()).await.unwrap();

        store.remove_image(&id, 0).await.unwrap();
        let conversation = store.get(&id).await.unwrap();
        assert_eq!(conversation.images.len(), 1);
        assert_eq!(conversation.summary.as_deref(), Some("about the cat"));

        store.clear_images(&id).await.unwrap();
        let conversation = store.get(&id).await.unwrap();
        assert!(conversation.images.is_empty());
        assert_eq!(conversation.summary.as_deref(), Some("about the cat"));
    }

    #[tokio::test]
    async fn updated_at_never_precedes_created_at() {
        let store = ConversationStore::new();
        let id = store.current().await.id;
        store.append_turn(&id, "q", Vec::new(), "a").await.unwrap();
        let conversation = store.get(&id).await.unwrap();
        assert!(conversation.updated_at >= conversation.created_at);
        assert_eq!(conversation.total_turns(), 1);
    }
}
