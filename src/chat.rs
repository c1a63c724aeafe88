use std::time::SystemTime;

/// Lifecycle of one question/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatItemStatus {
    #[default]
    Pending,
    Streaming,
    Complete,
}

/// One conversation record. The caller owns it; the interaction client only
/// mutates `answer`, `is_multiline` and `status`.
#[derive(Debug, Clone)]
pub struct ChatItem {
    pub question: String,
    pub answer: String,
    pub is_multiline: bool,
    pub model: String,
    pub timestamp: SystemTime,
    pub status: ChatItemStatus,
}

impl ChatItem {
    pub fn new(question: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: String::new(),
            is_multiline: false,
            model: model.into(),
            timestamp: SystemTime::now(),
            status: ChatItemStatus::Pending,
        }
    }
}

/// True when the answer spans more than one line (LF or CRLF).
pub fn is_multiline(answer: &str) -> bool {
    answer.contains('\n')
}
