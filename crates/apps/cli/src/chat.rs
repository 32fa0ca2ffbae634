use streaming::source::ArgoSource;
use tracing::warn;

pub const GREETING: &str =
    "Ask me about ARGO data (e.g., \"Show temperature profiles near Mumbai\")";
pub const NO_RESPONSE: &str = "No response";
pub const CONTACT_ERROR: &str = "Error contacting server.";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub author: Author,
    pub text: String,
}

/// Message history of the conversational query box.
///
/// Failures never surface as errors: they become an assistant message.
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    pub fn new() -> Self {
        let mut log = Self {
            messages: Vec::new(),
            next_id: 1,
        };
        log.push(Author::Assistant, GREETING);
        log
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Records `input` and the backend's answer to it.
    ///
    /// Blank input is ignored and returns `None`; otherwise returns the
    /// assistant's reply.
    pub async fn send(&mut self, source: &dyn ArgoSource, input: &str) -> Option<&ChatMessage> {
        if input.trim().is_empty() {
            return None;
        }
        self.push(Author::User, input);

        let reply = match source.chat(input).await {
            Ok(reply) => reply
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| NO_RESPONSE.to_string()),
            Err(err) => {
                warn!("chat query via {} failed: {err}", source.name());
                CONTACT_ERROR.to_string()
            }
        };
        self.push(Author::Assistant, reply);
        self.messages.last()
    }

    fn push(&mut self, author: Author, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            id: self.next_id,
            author,
            text: text.into(),
        });
        self.next_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{Author, ChatLog, GREETING, NO_RESPONSE};
    use streaming::source::{CALLS_CHAT, MemorySource};

    #[test]
    fn starts_with_greeting() {
        let log = ChatLog::new();
        assert_eq!(log.messages().len(), 1);
        assert_eq!(log.messages()[0].author, Author::Assistant);
        assert_eq!(log.messages()[0].text, GREETING);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let source = MemorySource::new(vec![]);
        let mut log = ChatLog::new();
        assert!(log.send(&source, "   ").await.is_none());
        assert_eq!(log.messages().len(), 1);
        assert_eq!(source.calls(CALLS_CHAT), 0);
    }

    #[tokio::test]
    async fn reply_is_appended_after_question() {
        let source = MemorySource::new(vec![]).with_chat_reply("Found 12 profiles near Mumbai.");
        let mut log = ChatLog::new();
        let reply = log.send(&source, "Show temperature profiles near Mumbai").await.cloned();
        assert_eq!(reply.map(|m| m.text), Some("Found 12 profiles near Mumbai.".to_string()));

        let authors: Vec<Author> = log.messages().iter().map(|m| m.author).collect();
        assert_eq!(authors, vec![Author::Assistant, Author::User, Author::Assistant]);
        assert_eq!(log.messages()[1].text, "Show temperature profiles near Mumbai");
    }

    #[tokio::test]
    async fn missing_reply_text_becomes_placeholder() {
        let source = MemorySource::new(vec![]);
        let mut log = ChatLog::new();
        let reply = log.send(&source, "hello").await.map(|m| m.text.clone());
        assert_eq!(reply.as_deref(), Some(NO_RESPONSE));
    }
}
