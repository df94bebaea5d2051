//! Record types exchanged with HTTP clients.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned to a student on creation.
pub type StudentId = u64;

/// A stored student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier, equal to the record's registry key.
    pub id: StudentId,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: i64,
    /// Contact email address.
    pub email: String,
}

/// Fields accepted when creating a student.
///
/// Absent and `null` fields decode to their zero value; an `id` in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudentDraft {
    /// Display name.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Age in years.
    #[serde(deserialize_with = "null_as_default")]
    pub age: i64,
    /// Contact email address.
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update applied to an existing student.
///
/// Absent or `null` fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StudentPatch {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement age.
    #[serde(default)]
    pub age: Option<i64>,
    /// Replacement email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl Student {
    /// Materialize a draft under the given identifier.
    pub fn from_draft(id: StudentId, draft: StudentDraft) -> Self {
        let StudentDraft { name, age, email } = draft;
        Self {
            id,
            name,
            age,
            email,
        }
    }

    /// Overwrite the fields present in `patch`. The identifier never changes.
    pub fn apply(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
    }
}
