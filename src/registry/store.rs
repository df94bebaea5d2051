//! Lock-guarded id → record map with a monotonic id counter.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::types::{Student, StudentDraft, StudentId, StudentPatch};

const FIRST_STUDENT_ID: StudentId = 1;

/// In-memory student store shared by every request handler.
///
/// The map and the id counter sit behind one lock, so creation, update and removal are atomic
/// and identifiers are strictly increasing even under concurrent writers. Identifiers are never
/// reused after deletion.
pub struct Registry {
    state: RwLock<RegistryState>,
}

struct RegistryState {
    students: BTreeMap<StudentId, Student>,
    next_id: StudentId,
}

impl RegistryState {
    fn allocate_id(&mut self) -> StudentId {
        let id = self.next_id;
        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("student id counter overflow");
        id
    }
}

impl Registry {
    /// Create an empty registry whose first assigned id is 1.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                students: BTreeMap::new(),
                next_id: FIRST_STUDENT_ID,
            }),
        }
    }

    /// Store a new record under the next id and return it.
    pub async fn insert(&self, draft: StudentDraft) -> Student {
        let mut state = self.state.write().await;
        let id = state.allocate_id();
        let student = Student::from_draft(id, draft);
        state.students.insert(id, student.clone());
        student
    }

    /// Snapshot every stored record, ordered by id.
    pub async fn list(&self) -> Vec<Student> {
        self.state.read().await.students.values().cloned().collect()
    }

    /// Look up a record by id.
    pub async fn get(&self, id: StudentId) -> Option<Student> {
        self.state.read().await.students.get(&id).cloned()
    }

    /// Merge `patch` into the record stored under `id`, returning the updated record.
    pub async fn update(&self, id: StudentId, patch: StudentPatch) -> Option<Student> {
        let mut state = self.state.write().await;
        let student = state.students.get_mut(&id)?;
        student.apply(patch);
        Some(student.clone())
    }

    /// Remove and return the record stored under `id`.
    pub async fn remove(&self, id: StudentId) -> Option<Student> {
        self.state.write().await.students.remove(&id)
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.state.read().await.students.len()
    }

    /// Whether the registry holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
