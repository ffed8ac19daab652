use crate::models::{Message, Role};
use crate::providers::{ProviderError, TextGenerator};
use crate::services::markdown::MarkupRenderer;
use crate::services::session_store::{SessionError, SessionStore};
use crate::services::storage::KeyValueStore;

/// Shown in place of the assistant reply when generation fails.
pub const GENERATION_ERROR_MESSAGE: &str =
    "A critical error occurred in my processing core. Please try again.";

/// Identifies one send, so its reply lands in the right place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Waiting for the generator.
    Pending,
    Rendered,
    /// Shows [`GENERATION_ERROR_MESSAGE`]; never persisted.
    Failed,
}

/// One row of the visible message log.
#[derive(Debug, Clone)]
pub struct LogEntry<M> {
    pub role: Role,
    pub text: String,
    pub content: Option<M>,
    pub state: EntryState,
    pub token: Option<RequestToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub token: RequestToken,
    pub conversation_id: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: String,
    pub title: String,
    pub active: bool,
}

/// Toolkit-independent chat window state: the session store, the rendered
/// log of the active conversation and the prompt entry.
pub struct ChatView<S, R: MarkupRenderer> {
    store: SessionStore<S>,
    renderer: R,
    log: Vec<LogEntry<R::Output>>,
    input: String,
    next_token: u64,
    in_flight: Vec<PendingRequest>,
    scroll_target: Option<usize>,
}

impl<S: KeyValueStore, R: MarkupRenderer> ChatView<S, R> {
    pub fn new(store: SessionStore<S>, renderer: R) -> Self {
        let mut view = Self {
            store,
            renderer,
            log: Vec::new(),
            input: String::new(),
            next_token: 0,
            in_flight: Vec::new(),
            scroll_target: None,
        };
        view.render_conversation();
        view
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn log(&self) -> &[LogEntry<R::Output>] {
        &self.log
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Index of the log entry the view should scroll to.
    pub fn scroll_target(&self) -> Option<usize> {
        self.scroll_target
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn show_welcome(&self) -> bool {
        self.log.is_empty()
    }

    /// Record the user's message and add a pending assistant placeholder.
    /// Blank input is ignored and yields `None`.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingRequest> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return None;
        }

        let conversation_id = self.store.active_id().to_string();
        if let Err(e) = self
            .store
            .append_message(&conversation_id, Message::user(prompt))
        {
            tracing::error!("Failed to record user message: {}", e);
            return None;
        }
        self.log.push(self.rendered_entry(Role::User, prompt));

        let token = RequestToken(self.next_token);
        self.next_token += 1;
        self.log.push(Self::pending_entry(token));
        self.scroll_to_end();

        let request = PendingRequest {
            token,
            conversation_id,
            prompt: prompt.to_string(),
        };
        self.in_flight.push(request.clone());
        Some(request)
    }

    /// Reconcile a finished request. Successful replies are committed to the
    /// conversation that issued them; failures only touch the log.
    pub fn finish_send(&mut self, request: PendingRequest, outcome: Result<String, ProviderError>) {
        self.input.clear();

        let Some(index) = self.in_flight.iter().position(|r| r.token == request.token) else {
            tracing::warn!("Ignoring reply for unknown request {:?}", request.token);
            return;
        };
        let request = self.in_flight.remove(index);
        let placeholder = self.log.iter().position(|e| e.token == Some(request.token));

        match outcome {
            Ok(text) => {
                match self
                    .store
                    .append_message(&request.conversation_id, Message::assistant(text.as_str()))
                {
                    Ok(()) => {}
                    Err(SessionError::NotFound(id)) => {
                        tracing::debug!("Conversation {} was deleted before its reply arrived", id);
                    }
                    Err(e) => tracing::error!("Failed to record reply: {}", e),
                }

                let entry = self.rendered_entry(Role::Assistant, &text);
                match placeholder {
                    Some(i) => self.log[i] = entry,
                    None if request.conversation_id == self.store.active_id() => {
                        self.log.push(entry)
                    }
                    None => {}
                }
            }
            Err(e) => {
                tracing::warn!("Generation failed: {}", e);
                if let Some(i) = placeholder {
                    let mut entry = self.rendered_entry(Role::Assistant, GENERATION_ERROR_MESSAGE);
                    entry.state = EntryState::Failed;
                    self.log[i] = entry;
                }
            }
        }
        self.scroll_to_end();
    }

    /// Send `text` through `generator` and reconcile the reply. Returns
    /// whether anything was sent.
    pub async fn send_prompt(&mut self, text: &str, generator: &dyn TextGenerator) -> bool {
        let Some(request) = self.begin_send(text) else {
            return false;
        };
        let outcome = generator.generate(&request.prompt).await;
        self.finish_send(request, outcome);
        true
    }

    /// Rebuild the log from the active conversation's stored messages.
    pub fn render_conversation(&mut self) {
        let active = self.store.active();
        let mut log: Vec<_> = active
            .messages
            .iter()
            .map(|m| self.rendered_entry(m.sender, &m.text))
            .collect();
        log.extend(
            self.in_flight
                .iter()
                .filter(|r| r.conversation_id == active.id)
                .map(|r| Self::pending_entry(r.token)),
        );
        self.log = log;
        self.scroll_to_end();
    }

    pub fn new_chat(&mut self) -> String {
        let id = self.store.create_conversation();
        self.render_conversation();
        id
    }

    pub fn switch_chat(&mut self, id: &str) -> Result<(), SessionError> {
        self.store.switch_active(id)?;
        self.render_conversation();
        Ok(())
    }

    pub fn delete_chat(&mut self, id: &str) -> Result<(), SessionError> {
        self.store.delete_conversation(id)?;
        self.render_conversation();
        Ok(())
    }

    pub fn rename_chat(&mut self, id: &str, title: &str) -> Result<(), SessionError> {
        self.store.rename_conversation(id, title)
    }

    /// Sidebar entries in store order.
    pub fn history(&self) -> Vec<HistoryItem> {
        let active = self.store.active_id();
        self.store
            .conversations()
            .iter()
            .map(|c| HistoryItem {
                id: c.id.clone(),
                title: c.title.clone(),
                active: c.id == active,
            })
            .collect()
    }

    fn rendered_entry(&self, role: Role, text: &str) -> LogEntry<R::Output> {
        LogEntry {
            role,
            text: text.to_string(),
            content: Some(self.renderer.render(text)),
            state: EntryState::Rendered,
            token: None,
        }
    }

    fn pending_entry(token: RequestToken) -> LogEntry<R::Output> {
        LogEntry {
            role: Role::Assistant,
            text: String::new(),
            content: None,
            state: EntryState::Pending,
            token: Some(token),
        }
    }

    fn scroll_to_end(&mut self) {
        self.scroll_target = self.log.len().checked_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::services::markdown::{parse_markdown, MarkdownRenderer};
    use crate::services::session_store::restore;
    use crate::services::storage::MemoryStore;

    struct Scripted {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| ProviderError::RequestFailed("HTTP 500: Failed to generate content".to_string()))
        }
    }

    fn view_over(storage: &MemoryStore) -> ChatView<MemoryStore, MarkdownRenderer> {
        ChatView::new(SessionStore::open(storage.clone()), MarkdownRenderer)
    }

    #[tokio::test]
    async fn test_successful_send_renders_reply() {
        let storage = MemoryStore::new();
        let mut view = view_over(&storage);
        let generator = Scripted::replying("A binary search tree is...");

        view.set_input("What is a binary search tree?");
        let input = view.input().to_string();
        assert!(view.send_prompt(&input, &generator).await);

        let log = view.log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, Role::User);
        assert_eq!(log[1].role, Role::Assistant);
        assert_eq!(log[1].state, EntryState::Rendered);
        assert_eq!(
            log[1].content.as_ref(),
            Some(&parse_markdown("A binary search tree is..."))
        );
        assert_eq!(view.input(), "");
        assert_eq!(view.scroll_target(), Some(1));
        assert!(!view.is_busy());

        let stored = restore(&storage);
        assert_eq!(
            stored[0].messages,
            vec![
                Message::user("What is a binary search tree?"),
                Message::assistant("A binary search tree is..."),
            ]
        );
        assert_eq!(stored[0].title, "What is a binary search t...");
    }

    #[tokio::test]
    async fn test_failed_send_shows_error_and_persists_only_user_message() {
        let storage = MemoryStore::new();
        let mut view = view_over(&storage);
        let generator = Scripted::failing();

        view.set_input("Explain heaps");
        assert!(view.send_prompt("Explain heaps", &generator).await);

        let log = view.log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].text, GENERATION_ERROR_MESSAGE);
        assert_eq!(log[1].state, EntryState::Failed);
        assert_eq!(view.input(), "");

        let stored = restore(&storage);
        assert_eq!(stored[0].messages, vec![Message::user("Explain heaps")]);
    }

    #[tokio::test]
    async fn test_blank_input_sends_nothing() {
        let storage = MemoryStore::new();
        let mut view = view_over(&storage);
        let generator = Scripted::replying("unused");

        assert!(!view.send_prompt("   \n\t", &generator).await);
        assert_eq!(generator.calls(), 0);
        assert!(view.log().is_empty());
        assert!(view.show_welcome());
        assert!(view.store().active().messages.is_empty());
    }

    #[test]
    fn test_begin_send_trims_and_adds_placeholder() {
        let mut view = view_over(&MemoryStore::new());
        let request = view.begin_send("  Dijkstra  ").unwrap();

        assert_eq!(request.prompt, "Dijkstra");
        assert_eq!(request.conversation_id, view.store().active_id());
        assert_eq!(view.log().len(), 2);
        assert_eq!(view.log()[1].state, EntryState::Pending);
        assert!(view.is_busy());
        assert!(!view.show_welcome());
    }

    #[test]
    fn test_reply_commits_to_originating_conversation() {
        let mut view = view_over(&MemoryStore::new());
        let first = view.store().active_id().to_string();
        let request = view.begin_send("Quicksort pivot?").unwrap();

        let second = view.new_chat();
        assert!(view.log().is_empty());

        view.finish_send(request, Ok("Pick the median of three.".to_string()));
        assert!(view.log().is_empty());
        assert!(view.store().get(&second).unwrap().messages.is_empty());
        assert_eq!(view.store().get(&first).unwrap().messages.len(), 2);

        view.switch_chat(&first).unwrap();
        assert_eq!(view.log().len(), 2);
        assert_eq!(view.log()[1].text, "Pick the median of three.");
    }

    #[test]
    fn test_switching_back_restores_pending_placeholder() {
        let mut view = view_over(&MemoryStore::new());
        let first = view.store().active_id().to_string();
        let request = view.begin_send("BFS vs DFS").unwrap();

        view.new_chat();
        view.switch_chat(&first).unwrap();
        assert_eq!(view.log().len(), 2);
        assert_eq!(view.log()[1].token, Some(request.token));

        view.finish_send(request, Ok("BFS uses a queue.".to_string()));
        assert_eq!(view.log().len(), 2);
        assert_eq!(view.log()[1].state, EntryState::Rendered);
    }

    #[test]
    fn test_multiline_prompt_keeps_its_newlines() {
        let mut view = view_over(&MemoryStore::new());
        let prompt = "Why does this loop forever?\n\n```\nwhile lo < hi {\n    mid = lo + hi;\n}\n```";
        let request = view.begin_send(&format!("{}\n", prompt)).unwrap();

        assert_eq!(request.prompt, prompt);
        assert_eq!(view.store().active().messages[0].text, prompt);
    }

    #[test]
    fn test_stale_reply_is_ignored() {
        let mut view = view_over(&MemoryStore::new());
        let request = view.begin_send("Tries").unwrap();

        view.finish_send(request.clone(), Ok("A trie is a prefix tree.".to_string()));
        view.finish_send(request, Ok("duplicate".to_string()));

        assert_eq!(view.store().active().messages.len(), 2);
        assert_eq!(view.log().len(), 2);
    }

    #[test]
    fn test_reply_for_deleted_conversation_is_dropped() {
        let mut view = view_over(&MemoryStore::new());
        let doomed = view.store().active_id().to_string();
        let request = view.begin_send("Linked lists").unwrap();

        view.delete_chat(&doomed).unwrap();
        view.finish_send(request, Ok("Nodes and pointers.".to_string()));

        assert!(view.store().get(&doomed).is_none());
        assert!(view.store().active().messages.is_empty());
        assert!(view.log().is_empty());
        assert!(!view.is_busy());
    }

    #[test]
    fn test_history_marks_active_entry() {
        let mut view = view_over(&MemoryStore::new());
        let older = view.store().active_id().to_string();
        let newer = view.new_chat();
        view.rename_chat(&older, "Graphs").unwrap();

        let history = view.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, newer);
        assert!(history[0].active);
        assert_eq!(history[1].title, "Graphs");
        assert!(!history[1].active);

        assert!(view.switch_chat("chat-unknown").is_err());
        assert_eq!(view.store().active_id(), newer);
    }
}
