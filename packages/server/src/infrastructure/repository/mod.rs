//! Repository パターンの実装
//!
//! Concrete implementations of the domain `MessageRepository` trait. The
//! usecase layer depends on the trait only (dependency inversion).

pub mod inmemory;
pub mod sqlite;

pub use inmemory::InMemoryMessageRepository;
pub use sqlite::SqliteMessageRepository;
