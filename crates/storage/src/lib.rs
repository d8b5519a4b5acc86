#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    ClearedRecords, InMemoryRepository, ProgressEdit, ProgressRepository, ProgressUpdate,
    QuizAttemptRecord, QuizAttemptRepository, Storage, StorageError,
};
