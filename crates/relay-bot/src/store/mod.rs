//! Message log: SQLite storage behind an ordered writer task

mod log;
mod sqlite;

pub use log::MessageLog;
pub use sqlite::SqliteMessageStore;
