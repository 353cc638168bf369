//! Remote generation service seam.

use async_trait::async_trait;
use melody_core::completion::Outcome;
use melody_core::job::JobParams;
use melody_core::types::TaskId;
use melody_suno::{SunoApi, SunoApiError};

/// Operations the pipeline needs from the generation service.
///
/// Implemented by [`SunoApi`]; tests substitute an in-memory fake.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submit a job and return its task identifier.
    async fn submit(&self, params: &JobParams, callback_url: &str)
        -> Result<TaskId, SunoApiError>;

    /// Query the current state of a task.
    async fn query_status(&self, task_id: &str) -> Result<Outcome, SunoApiError>;

    /// Download a produced track.
    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, SunoApiError>;
}

#[async_trait]
impl GenerationBackend for SunoApi {
    async fn submit(
        &self,
        params: &JobParams,
        callback_url: &str,
    ) -> Result<TaskId, SunoApiError> {
        self.submit_generation(params, callback_url).await
    }

    async fn query_status(&self, task_id: &str) -> Result<Outcome, SunoApiError> {
        self.query_outcome(task_id).await
    }

    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, SunoApiError> {
        SunoApi::fetch_audio(self, url).await
    }
}
