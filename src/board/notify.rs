// Transient user messages (the toast channel)

use std::cell::{Cell, RefCell};

/// Fire-and-forget sink for messages shown to the user.
/// Queuing, dismissal and stacking are the sink's business.
pub trait Notifier {
    fn notify_error(&self, message: &str);
}

/// Prints messages to stderr the way the CLI reports user errors
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    errors: Cell<usize>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of error messages shown so far
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }
}

impl Notifier for ConsoleNotifier {
    fn notify_error(&self, message: &str) {
        self.errors.set(self.errors.get() + 1);
        eprintln!("Error: {}", message);
    }
}

/// Keeps messages in memory, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: RefCell<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify_error(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
