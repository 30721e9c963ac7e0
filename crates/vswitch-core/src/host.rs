//! User-facing messages emitted by the manager.

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

/// Where status lines, warnings and error dialogs go
pub trait Reporter {
    /// Transient status line
    fn status(&self, message: &str);

    /// Something was skipped or ignored
    fn warning(&self, message: &str);

    /// An operation failed
    fn error(&self, message: &str);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn status(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Kind of a recorded message
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Status,
    Warning,
    Error,
}

/// Keeps every message; clones share the same log
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    messages: Rc<RefCell<Vec<(MessageKind, String)>>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.messages.borrow().clone()
    }

    /// Messages of one kind, in order
    pub fn of_kind(&self, kind: MessageKind) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, kind: MessageKind, message: &str) {
        self.messages.borrow_mut().push((kind, message.to_string()));
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn status(&self, message: &str) {
        self.push(MessageKind::Status, message);
    }

    fn warning(&self, message: &str) {
        self.push(MessageKind::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(MessageKind::Error, message);
    }
}
