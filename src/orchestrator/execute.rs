use std::collections::HashMap;

use tracing::instrument;

use crate::domain::{SnapshotStatus, SnapshotType};
use crate::error::Result;
use crate::gateway::StatementResult;

use super::{Orchestrator, extract_job_id, substitute_env};

/// Whether `ExecuteMany` aborts on the first failing statement or collects
/// every outcome and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    Continue,
    Stop,
}

/// Parameters for [`Orchestrator::execute_sql`].
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub job_name: Option<String>,
    pub tags: Vec<String>,
    pub on_error: Option<OnError>,
    pub env: HashMap<String, String>,
    pub strict_env: bool,
    pub keep_session: bool,
}

/// Outcome of `ExecuteSQL`: per-statement results plus any `jobId` the
/// batch surfaced.
#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    pub statements: Vec<StatementResult>,
    pub job_id: Option<String>,
    pub all_succeeded: bool,
}

impl Orchestrator {
    /// Run `sql_text` (already split into statements by the gateway client)
    /// against a fresh session. If the batch surfaces a `jobId` and the
    /// caller supplied `job_name`, records a `JOB_START` snapshot row
    /// carrying the SQL, so the job becomes pausable/resumable later.
    #[instrument(skip(self, sql_text, options))]
    pub async fn execute_sql(
        &self,
        sql_text: &str,
        options: ExecuteOptions,
    ) -> Result<ExecuteOutcome> {
        let sql_text = if options.strict_env {
            substitute_env(sql_text, &options.env)?
        } else {
            sql_text.to_string()
        };

        let session = self.gateway.create_session(HashMap::new()).await?;
        let continue_on_error = options.on_error != Some(OnError::Stop);

        let statements = self
            .gateway
            .execute_many(&session, &sql_text, continue_on_error)
            .await;

        let all_succeeded = statements.iter().all(StatementResult::is_success);
        let job_id = extract_job_id(&statements);

        if let (Some(job_id), Some(job_name)) = (&job_id, &options.job_name) {
            let metadata = serde_json::json!({ "tags": options.tags });
            self.store
                .record_snapshot(
                    job_id,
                    Some(job_name.as_str()),
                    SnapshotType::JobStart,
                    SnapshotStatus::Completed,
                    crate::domain::RUNNING_JOB_PLACEHOLDER,
                    Some(&sql_text),
                    &metadata,
                )
                .await?;
        }

        if !options.keep_session {
            self.gateway.close_session(&session).await?;
        }

        Ok(ExecuteOutcome {
            statements,
            job_id,
            all_succeeded,
        })
    }
}
