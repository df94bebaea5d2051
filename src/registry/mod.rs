//! Student records and the in-memory store that owns them.

mod store;
pub mod types;

pub use store::Registry;
pub use types::{Student, StudentDraft, StudentId, StudentPatch};
