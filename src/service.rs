//! Student registry service shared by the HTTP surface.

use crate::{
    config::Config,
    generation::{GenerationRequest, GeneratorClient, GeneratorError, OllamaGeneratorClient},
    metrics::{MetricsSnapshot, RegistryMetrics},
    registry::{Registry, Student, StudentDraft, StudentId, StudentPatch},
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by registry operations.
#[derive(Debug, Error)]
pub enum StudentError {
    /// Request body could not be decoded into student fields.
    #[error("Invalid input")]
    InvalidInput,
    /// No student exists under the requested identifier.
    #[error("Student not found")]
    NotFound,
    /// The generator could not be reached or rejected the request.
    #[error("{0}")]
    Upstream(GeneratorError),
    /// The generator stream completed without producing any text.
    #[error("No summary found in generator response")]
    EmptyUpstreamResult,
}

impl From<GeneratorError> for StudentError {
    fn from(error: GeneratorError) -> Self {
        match error {
            GeneratorError::EmptyResult => Self::EmptyUpstreamResult,
            other => Self::Upstream(other),
        }
    }
}

/// Operations exposed by the registry to external surfaces.
#[async_trait]
pub trait StudentApi: Send + Sync {
    /// Store a new student and return it with its assigned id.
    async fn create(&self, draft: StudentDraft) -> Result<Student, StudentError>;

    /// Return every stored student.
    async fn list(&self) -> Vec<Student>;

    /// Look up a single student.
    async fn get(&self, id: StudentId) -> Result<Student, StudentError>;

    /// Merge `patch` into an existing student.
    async fn update(&self, id: StudentId, patch: StudentPatch) -> Result<Student, StudentError>;

    /// Remove a student.
    async fn delete(&self, id: StudentId) -> Result<(), StudentError>;

    /// Ask the generator for a natural-language summary of a student.
    async fn summarize(&self, id: StudentId) -> Result<String, StudentError>;

    /// Current activity counters and registry size.
    async fn metrics(&self) -> (MetricsSnapshot, usize);
}

/// Registry service backed by an in-memory store and a generator client.
///
/// Construct it once at startup and share it through an `Arc`.
pub struct StudentService {
    registry: Registry,
    generator: Box<dyn GeneratorClient>,
    summary_model: String,
    metrics: RegistryMetrics,
}

impl StudentService {
    /// Build a service using the generator settings from `config`.
    pub fn from_config(config: &Config) -> Result<Self, GeneratorError> {
        let generator = OllamaGeneratorClient::from_config(config)?;
        tracing::info!(
            ollama_url = %config.ollama_url,
            model = %config.summary_model,
            "Generator client initialized"
        );
        Ok(Self::with_generator(
            Box::new(generator),
            config.summary_model.clone(),
        ))
    }

    /// Build a service around an arbitrary generator client.
    pub fn with_generator(
        generator: Box<dyn GeneratorClient>,
        summary_model: impl Into<String>,
    ) -> Self {
        Self {
            registry: Registry::new(),
            generator,
            summary_model: summary_model.into(),
            metrics: RegistryMetrics::new(),
        }
    }
}

/// Prompt sent to the generator for `student`.
pub fn summary_prompt(student: &Student) -> String {
    format!(
        "Generate a summary for the student: Name: {}, Age: {}, Email: {}",
        student.name, student.age, student.email
    )
}

#[async_trait]
impl StudentApi for StudentService {
    async fn create(&self, draft: StudentDraft) -> Result<Student, StudentError> {
        let student = self.registry.insert(draft).await;
        self.metrics.record_created();
        tracing::info!(id = student.id, "Student created");
        Ok(student)
    }

    async fn list(&self) -> Vec<Student> {
        self.registry.list().await
    }

    async fn get(&self, id: StudentId) -> Result<Student, StudentError> {
        self.registry.get(id).await.ok_or(StudentError::NotFound)
    }

    async fn update(&self, id: StudentId, patch: StudentPatch) -> Result<Student, StudentError> {
        let student = self
            .registry
            .update(id, patch)
            .await
            .ok_or(StudentError::NotFound)?;
        self.metrics.record_updated();
        tracing::info!(id, "Student updated");
        Ok(student)
    }

    async fn delete(&self, id: StudentId) -> Result<(), StudentError> {
        self.registry
            .remove(id)
            .await
            .ok_or(StudentError::NotFound)?;
        self.metrics.record_deleted();
        tracing::info!(id, "Student deleted");
        Ok(())
    }

    async fn summarize(&self, id: StudentId) -> Result<String, StudentError> {
        let student = self.get(id).await?;
        let request = GenerationRequest {
            model: self.summary_model.clone(),
            prompt: summary_prompt(&student),
        };

        tracing::debug!(id, model = %request.model, "Requesting student summary");
        match self.generator.generate(request).await {
            Ok(summary) => {
                self.metrics.record_summary(true);
                tracing::info!(id, chars = summary.len(), "Summary generated");
                Ok(summary)
            }
            Err(error) => {
                self.metrics.record_summary(false);
                tracing::error!(id, error = %error, "Summary generation failed");
                Err(error.into())
            }
        }
    }

    async fn metrics(&self) -> (MetricsSnapshot, usize) {
        (self.metrics.snapshot(), self.registry.len().await)
    }
}
