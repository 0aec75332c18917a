//! Chat with the inbox assistant, scoped by a chat id.

use crate::api::{ApiResult, AskRequest, AskResponse, ChatMessageRecord};
use crate::dashboard::emails::Outcome;
use crate::domain::chat::{ChatMessage, ChatSession, Role, generate_chat_id};
use crate::store::{self, KvStore, keys};

pub const SESSION_LIST_LIMIT: u32 = 200;
pub const MESSAGE_HISTORY_LIMIT: u32 = 200;

#[derive(Debug)]
pub struct ChatController {
    chat_id: String,
    messages: Vec<ChatMessage>,
    /// Set while an answer is outstanding; blocks further sends.
    thinking: bool,
    /// Bumped whenever the active session changes so late answers and
    /// history loads for a previous session can be recognised.
    epoch: u64,
    history_loading: bool,
    sessions: Vec<ChatSession>,
    sessions_loading: bool,
    /// Latest session listing issued; older replies are dropped.
    sessions_request: u64,
}

impl ChatController {
    /// Resume the persisted chat id, or start a new one and persist it.
    pub fn load(store: &dyn KvStore, now_millis: i64) -> Self {
        let chat_id = match store::load(store, keys::CHAT_ID).filter(|c| !c.is_empty()) {
            Some(id) => id,
            None => {
                let id = generate_chat_id(now_millis, None);
                store::save(store, keys::CHAT_ID, &id);
                id
            }
        };
        Self {
            chat_id,
            messages: vec![],
            thinking: false,
            epoch: 0,
            history_loading: false,
            sessions: vec![],
            sessions_loading: false,
            sessions_request: 0,
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    pub fn is_loading_history(&self) -> bool {
        self.history_loading
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn sessions_loading(&self) -> bool {
        self.sessions_loading
    }

    /// Append the question and build the request. Blank input, or a send
    /// while an answer is outstanding, does nothing.
    pub fn send(&mut self, question: &str, current_thread_id: Option<String>) -> Option<(u64, AskRequest)> {
        let question = question.trim();
        if question.is_empty() || self.thinking {
            return None;
        }
        self.messages.push(ChatMessage::user(question));
        self.thinking = true;
        Some((
            self.epoch,
            AskRequest {
                question: question.to_string(),
                current_thread_id,
                chat_id: self.chat_id.clone(),
            },
        ))
    }

    /// Append the answer, or the error text in its place.
    pub fn apply_answer(
        &mut self,
        epoch: u64,
        result: ApiResult<AskResponse>,
        empty_answer: &str,
    ) -> Outcome {
        if epoch != self.epoch {
            log::debug!("discarding answer for a previous chat session");
            return Outcome::Stale;
        }
        self.thinking = false;
        match result {
            Ok(resp) => {
                let answer = resp
                    .answer
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| empty_answer.to_string());
                self.messages.push(ChatMessage::bot(answer, resp.sources));
                Outcome::Applied
            }
            Err(e) => {
                self.messages.push(ChatMessage::bot(e.to_string(), vec![]));
                Outcome::Failed(e)
            }
        }
    }

    fn begin_session(&mut self, store: &dyn KvStore, chat_id: String) {
        store::save(store, keys::CHAT_ID, &chat_id);
        self.chat_id = chat_id;
        self.messages.clear();
        self.thinking = false;
        self.epoch += 1;
    }

    /// Make `chat_id` active and return the history load to issue.
    pub fn switch_session(&mut self, store: &dyn KvStore, chat_id: &str) -> (u64, String) {
        self.begin_session(store, chat_id.to_string());
        self.history_loading = true;
        (self.epoch, self.chat_id.clone())
    }

    /// Replace the message sequence with the backend's history.
    pub fn apply_history(
        &mut self,
        epoch: u64,
        result: ApiResult<Vec<ChatMessageRecord>>,
    ) -> Outcome {
        if epoch != self.epoch {
            log::debug!("discarding history for a previous chat session");
            return Outcome::Stale;
        }
        self.history_loading = false;
        match result {
            Ok(records) => {
                self.messages = records
                    .into_iter()
                    .map(|m| ChatMessage {
                        role: Role::from_backend(&m.role),
                        content: m.content,
                        sources: m.sources,
                    })
                    .collect();
                Outcome::Applied
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    /// Empty the conversation and move to `new_id`, or to a freshly
    /// generated id that differs from the current one.
    pub fn reset(&mut self, store: &dyn KvStore, new_id: Option<String>, now_millis: i64) -> &str {
        let id = new_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_chat_id(now_millis, Some(&self.chat_id)));
        self.begin_session(store, id);
        self.history_loading = false;
        &self.chat_id
    }

    /// Drop everything held for the signed-out user. The next login reloads
    /// the chat id from storage.
    pub fn forget(&mut self) {
        self.messages.clear();
        self.sessions.clear();
        self.thinking = false;
        self.history_loading = false;
        self.sessions_loading = false;
        self.sessions_request += 1;
        self.epoch += 1;
    }

    pub fn request_sessions(&mut self) -> u64 {
        self.sessions_request += 1;
        self.sessions_loading = true;
        self.sessions_request
    }

    /// Sessions are kept in backend order.
    pub fn apply_sessions(&mut self, request: u64, result: ApiResult<Vec<ChatSession>>) -> Outcome {
        if request != self.sessions_request {
            log::debug!("discarding session list {request}, want {}", self.sessions_request);
            return Outcome::Stale;
        }
        self.sessions_loading = false;
        match result {
            Ok(sessions) => {
                self.sessions = sessions;
                Outcome::Applied
            }
            Err(e) => Outcome::Failed(e),
        }
    }
}
