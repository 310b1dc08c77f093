//! 本地持久化存储
//!
//! 键值存储抽象与两种实现（内存 / SQLite），
//! 所有写入携带单调修订号与来源标记，供跨上下文同步使用。

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use store::*;
