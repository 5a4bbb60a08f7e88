pub mod command;
pub mod stack;

pub use command::HistoryEntry;
pub use stack::HistoryManager;
