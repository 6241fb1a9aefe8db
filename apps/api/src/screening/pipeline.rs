//! Screening pipeline — drives the five stages in order against a `ScreeningBackend`.
//!
//! Flow: ingest → parse job description → parse resumes → score → rank.
//!
//! Each stage's raw output is cached by stage index as soon as it returns, so
//! an observer can inspect completed stages while later ones run or after the
//! run fails. The first stage-level failure ends the run; item-level failures
//! live inside the batch outputs and never reach this module as errors.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{BackendError, PipelineError};
use crate::screening::backend::ScreeningBackend;
use crate::screening::models::{
    IngestRequest, JobDescriptionInput, JobRequirements, RankedCandidate, ResumeFile,
};

// ────────────────────────────────────────────────────────────────────────────
// Stages and run state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    ParseJobDescription,
    ParseResumes,
    ScoreCandidates,
    Rank,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Ingest,
        Stage::ParseJobDescription,
        Stage::ParseResumes,
        Stage::ScoreCandidates,
        Stage::Rank,
    ];

    /// Cache key and cursor position, 0-based.
    pub fn index(self) -> usize {
        self as usize
    }

    /// 1-based, for operator-facing messages.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn from_index(index: usize) -> Option<Stage> {
        Stage::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Ingest => "Ingest inputs",
            Stage::ParseJobDescription => "Parse job description",
            Stage::ParseResumes => "Parse resumes",
            Stage::ScoreCandidates => "Score candidates",
            Stage::Rank => "Rank candidates",
        }
    }
}

/// Cursor value once every stage has completed.
pub const COMPLETE_CURSOR: usize = Stage::ALL.len();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Complete,
    Failed,
    /// Cancelled between stages, or its driver was dropped mid-run.
    Abandoned,
}

/// One screening attempt. Replaced wholesale when a new run starts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineRun {
    pub run_id: Option<Uuid>,
    pub status: RunStatus,
    /// N means stages 0..N-1 have completed.
    pub current_stage: usize,
    pub stages: Vec<Stage>,
    /// Raw stage outputs keyed by stage index.
    pub outputs: BTreeMap<usize, Value>,
    /// Populated only when `status == Complete`.
    pub results: Vec<RankedCandidate>,
    pub error: Option<String>,
    /// Stage the run stopped at when it failed or was abandoned.
    pub failed_stage: Option<Stage>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    fn started(run_id: Uuid) -> Self {
        Self {
            run_id: Some(run_id),
            status: RunStatus::Running,
            current_stage: 0,
            stages: Stage::ALL.to_vec(),
            outputs: BTreeMap::new(),
            results: Vec::new(),
            error: None,
            failed_stage: None,
            started_at: Some(Utc::now()),
            finished_at: None,
        }
    }

    pub fn get_output(&self, stage_index: usize) -> Option<&Value> {
        self.outputs.get(&stage_index)
    }

    pub fn has_output(&self, stage_index: usize) -> bool {
        self.outputs.contains_key(&stage_index)
    }

    fn record(&mut self, stage: Stage, output: Value) {
        debug_assert_eq!(stage.index(), self.current_stage);
        if self.status != RunStatus::Running {
            return;
        }
        self.outputs.insert(stage.index(), output);
        self.current_stage = stage.index() + 1;
    }

    fn complete(&mut self, results: Vec<RankedCandidate>) {
        self.status = RunStatus::Complete;
        self.results = results;
        self.finished_at = Some(Utc::now());
    }

    fn fail(&mut self, error: &PipelineError) {
        self.status = match error {
            PipelineError::Cancelled { .. } => RunStatus::Abandoned,
            _ => RunStatus::Failed,
        };
        self.results.clear();
        self.error = Some(error.to_string());
        self.failed_stage = error.stage();
        self.finished_at = Some(Utc::now());
    }

    /// The driver went away mid-run; the stage at the cursor never finished.
    fn abandon(&mut self) {
        self.status = RunStatus::Abandoned;
        self.results.clear();
        self.failed_stage = Stage::from_index(self.current_stage);
        self.error = Some(match self.failed_stage {
            Some(stage) => format!(
                "Run stopped during stage {} ({}) before it completed",
                stage.number(),
                stage.label()
            ),
            None => "Run stopped before it completed".to_string(),
        });
        self.finished_at = Some(Utc::now());
    }
}

/// Marks the run abandoned if `run_pipeline` is dropped before reaching a
/// terminal state (client disconnect, caller timeout).
struct AbandonOnDrop<'a> {
    run: &'a RwLock<PipelineRun>,
    run_id: Uuid,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        let mut run = self.run.write();
        if run.run_id == Some(self.run_id) && run.status == RunStatus::Running {
            run.abandon();
            warn!(
                "Screening run {} dropped before completion at stage index {}",
                self.run_id, run.current_stage
            );
        }
    }
}

/// Operator input for one screening run.
#[derive(Debug, Clone, Deserialize)]
pub struct ScreeningInput {
    /// Job description text, or a URL to fetch it from.
    pub job_description: String,
    pub resume_files: Vec<ResumeFile>,
}

impl ScreeningInput {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.job_description.trim().is_empty() {
            return Err(PipelineError::Validation(
                "A job description or job posting URL is required".to_string(),
            ));
        }
        if self.resume_files.is_empty() {
            return Err(PipelineError::Validation(
                "At least one resume file is required".to_string(),
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Runs screening pipelines one at a time and exposes the current run.
pub struct Screener {
    backend: Arc<dyn ScreeningBackend>,
    run: RwLock<PipelineRun>,
    /// Held for the whole of a run; a second run waits here.
    gate: tokio::sync::Mutex<()>,
    cancel: Mutex<CancellationToken>,
}

impl Screener {
    pub fn new(backend: Arc<dyn ScreeningBackend>) -> Self {
        Self {
            backend,
            run: RwLock::new(PipelineRun::default()),
            gate: tokio::sync::Mutex::new(()),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ScreeningBackend> {
        &self.backend
    }

    /// Runs all five stages and returns the ranked candidates.
    ///
    /// Input is validated before anything else; an invalid request leaves the
    /// previous run's state untouched. A run already in progress is waited for.
    pub async fn run_pipeline(
        &self,
        input: ScreeningInput,
    ) -> Result<Vec<RankedCandidate>, PipelineError> {
        input.validate()?;

        let _gate = self.gate.lock().await;

        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();

        let run_id = Uuid::new_v4();
        *self.run.write() = PipelineRun::started(run_id);
        // Declared after `_gate`, so it runs before the gate is released.
        let _abandon = AbandonOnDrop {
            run: &self.run,
            run_id,
        };
        info!(
            "Screening run {run_id} started with {} resume(s)",
            input.resume_files.len()
        );

        match self.execute(input, &token).await {
            Ok(ranked) => {
                self.run.write().complete(ranked.clone());
                info!(
                    "Screening run {run_id} complete: {} candidate(s) ranked",
                    ranked.len()
                );
                Ok(ranked)
            }
            Err(e) => {
                self.run.write().fail(&e);
                match e.stage() {
                    Some(stage) => warn!(
                        "Screening run {run_id} stopped at stage {} ({}): {e}",
                        stage.number(),
                        stage.label()
                    ),
                    None => warn!("Screening run {run_id} stopped: {e}"),
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        input: ScreeningInput,
        token: &CancellationToken,
    ) -> Result<Vec<RankedCandidate>, PipelineError> {
        let backend = self.backend.as_ref();

        let request = IngestRequest {
            job_description: JobDescriptionInput {
                text: input.job_description,
            },
            resume_files: input.resume_files,
        };
        let ingestion = self
            .run_stage(Stage::Ingest, token, backend.ingest(&request))
            .await?;

        let requirements = self
            .run_stage(
                Stage::ParseJobDescription,
                token,
                backend.parse_job_description(&ingestion.job_description),
            )
            .await?;

        let parsed = self
            .run_stage(
                Stage::ParseResumes,
                token,
                backend.parse_resumes(&ingestion.resumes),
            )
            .await?;
        let failed = parsed.parsed_resumes.iter().filter(|e| e.is_error()).count();
        if failed > 0 {
            warn!(
                "{failed} of {} resume(s) could not be parsed",
                parsed.parsed_resumes.len()
            );
        }

        let scores = self
            .run_stage(
                Stage::ScoreCandidates,
                token,
                backend.score_candidates(&requirements, &parsed),
            )
            .await?;

        self.run_stage(Stage::Rank, token, backend.rank_candidates(&scores))
            .await
    }

    /// Issues one stage call, caches its output and advances the cursor.
    /// Cancellation is checked before the call, never during it.
    async fn run_stage<T, F>(
        &self,
        stage: Stage,
        token: &CancellationToken,
        call: F,
    ) -> Result<T, PipelineError>
    where
        T: Serialize,
        F: Future<Output = Result<T, BackendError>>,
    {
        if token.is_cancelled() {
            return Err(PipelineError::Cancelled { stage });
        }

        info!("Stage {} ({}) started", stage.number(), stage.label());
        let output = call.await.map_err(|e| PipelineError::at_stage(stage, e))?;

        let value = serde_json::to_value(&output).map_err(|e| PipelineError::MalformedResponse {
            stage,
            message: format!("output is not JSON-serializable: {e}"),
        })?;
        self.run.write().record(stage, value);
        info!("Stage {} ({}) complete", stage.number(), stage.label());

        Ok(output)
    }

    /// Asks the active run to stop at the next stage boundary.
    /// Returns false when nothing is running.
    pub fn cancel(&self) -> bool {
        if self.run.read().status != RunStatus::Running {
            return false;
        }
        self.cancel.lock().cancel();
        info!("Cancellation requested for the active screening run");
        true
    }

    /// A copy of the current (or last) run for progress display.
    pub fn snapshot(&self) -> PipelineRun {
        self.run.read().clone()
    }

    /// Ranked candidates of the last completed run; empty otherwise.
    pub fn ranked_results(&self) -> Vec<RankedCandidate> {
        self.run.read().results.clone()
    }

    pub fn get_output(&self, stage_index: usize) -> Option<Value> {
        self.run.read().get_output(stage_index).cloned()
    }

    pub fn has_output(&self, stage_index: usize) -> bool {
        self.run.read().has_output(stage_index)
    }

    /// The parsed job description cached by stage 2, if it has completed.
    pub fn job_requirements(&self) -> Option<JobRequirements> {
        self.get_output(Stage::ParseJobDescription.index())
            .and_then(|v| serde_json::from_value(v).ok())
    }
}
