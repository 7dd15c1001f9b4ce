//! Pipeline orchestrator.
//!
//! The only component that mutates run status. Every operation follows the
//! same shape: resolve the run, check the state machine (a pure precondition
//! test, before any paid model call), load inputs, run the engine, persist the
//! artifact atomically, then persist the status edge. A failed model call
//! writes nothing, so RunMeta and existing artifacts stay exactly as they
//! were.
//!
//! Retry policy lives here and nowhere else: one retry on transient model
//! failures (timeout, provider error), never on schema-invalid output.

use std::future::Future;
use std::path::PathBuf;

use crate::brief::{self, RawBrief};
use crate::errors::{GenerationError, PipelineError};
use crate::llm::LmProvider;
use crate::models::{Brief, ClarificationResult, ContentCore, Draft, PatchRecord, Platform, RunMeta};
use crate::patch;
use crate::registry::{RunFilter, RunRegistry};
use crate::render;
use crate::resources::ResourceResolver;
use crate::state::{Operation, StageEvent};
use crate::store::ArtifactStore;
use crate::synthesis;

pub const BRIEF_ARTIFACT: &str = "brief.json";
pub const CORE_ARTIFACT: &str = "core.json";
pub const CLARIFICATION_ARTIFACT: &str = "clarification.json";

pub fn draft_artifact(platform: Platform) -> String {
    format!("{platform}.md")
}

pub fn draft_backup_artifact(platform: Platform, version: u32) -> String {
    format!("{platform}_v{version}.md")
}

pub fn changelog_artifact(platform: Platform) -> String {
    format!("{platform}_changelog.json")
}

/// Result of a core-generation request.
#[derive(Debug)]
pub enum CoreOutcome {
    Generated { core: ContentCore, meta: RunMeta },
    /// The model judged the brief's context insufficient. No core was
    /// written; the run is waiting for an answer.
    NeedsClarification {
        questions: Vec<String>,
        meta: RunMeta,
    },
}

#[derive(Debug)]
pub struct RenderReport {
    pub draft: Draft,
    pub warnings: Vec<String>,
    pub meta: RunMeta,
}

#[derive(Debug)]
pub struct PatchReport {
    pub draft: Draft,
    pub record: PatchRecord,
    pub warnings: Vec<String>,
    pub meta: RunMeta,
}

pub struct Orchestrator {
    store: ArtifactStore,
    registry: RunRegistry,
    resources: ResourceResolver,
}

impl Orchestrator {
    pub fn new(runs_dir: impl Into<PathBuf>, resources: ResourceResolver) -> Self {
        let store = ArtifactStore::new(runs_dir);
        let registry = RunRegistry::new(store.clone());
        Self {
            store,
            registry,
            resources,
        }
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Normalize a raw brief, allocate a run, and persist brief + meta.
    /// The run leaves this function in `brief_saved`.
    pub fn create_run(&self, raw: RawBrief) -> Result<RunMeta, PipelineError> {
        let normalized = brief::normalize(raw)?;
        let mut meta = self.registry.create(&normalized)?;
        tracing::info!(run_id = %meta.run_id, "run created");
        self.store
            .put_json(&meta.run_id, BRIEF_ARTIFACT, &normalized)?;
        let next_status = meta.status.after(StageEvent::BriefPersisted);
        self.registry.update_status(&mut meta, next_status)?;
        Ok(meta)
    }

    pub fn list_runs(&self, filter: &RunFilter) -> Result<Vec<RunMeta>, PipelineError> {
        self.registry.list(filter)
    }

    /// State-machine precondition for an operation, without performing it.
    /// Lets callers reject early, before they construct a model provider.
    pub fn check_operation(
        &self,
        run_ref: &str,
        operation: Operation,
    ) -> Result<RunMeta, PipelineError> {
        let run_id = self.registry.resolve(run_ref)?;
        let meta = self.registry.get_meta(&run_id)?;
        self.ensure_permitted(&meta, operation)?;
        Ok(meta)
    }

    /// Synthesize (or re-synthesize) the content core for a run.
    pub async fn generate_core(
        &self,
        run_ref: &str,
        provider: &dyn LmProvider,
        skip_clarify: bool,
    ) -> Result<CoreOutcome, PipelineError> {
        let run_id = self.registry.resolve(run_ref)?;
        let mut meta = self.registry.get_meta(&run_id)?;
        self.ensure_permitted(&meta, Operation::GenerateCore)?;

        let brief: Brief = self.store.get_json(&run_id, BRIEF_ARTIFACT)?;
        let style = self.resources.style_profile()?;

        if !skip_clarify {
            let template = self.resources.read_text("prompts/clarify.txt")?;
            let verdict = retry_transient(|| {
                synthesis::evaluate_clarity(provider, &template, &brief)
            })
            .await
            .map_err(|source| self.generation_error(&run_id, Operation::GenerateCore, source))?;

            if verdict.needs_clarification {
                tracing::info!(run_id, questions = verdict.questions.len(), "clarification needed");
                self.store
                    .put_json(&run_id, CLARIFICATION_ARTIFACT, &verdict)?;
                let next_status = meta.status.after(StageEvent::ClarificationRequested);
                self.registry.update_status(&mut meta, next_status)?;
                return Ok(CoreOutcome::NeedsClarification {
                    questions: verdict.questions,
                    meta,
                });
            }
        }

        let template = self.resources.read_text("prompts/core_synth.txt")?;
        let outcome = retry_transient(|| synthesis::synthesize(provider, &template, &style, &brief))
            .await
            .map_err(|source| self.generation_error(&run_id, Operation::GenerateCore, source))?;

        self.store.put_json(&run_id, CORE_ARTIFACT, &outcome.core)?;
        self.store
            .put_text(&run_id, "prompts/core_synth.txt", &outcome.system_prompt)?;
        meta.model = Some(provider.model_name().to_string());
        let next_status = meta.status.after(StageEvent::CoreSynthesized);
        self.registry.update_status(&mut meta, next_status)?;
        tracing::info!(run_id, "content core written");
        Ok(CoreOutcome::Generated {
            core: outcome.core,
            meta,
        })
    }

    /// Append a clarification answer to the brief's context notes.
    /// The run stays in `awaiting_clarification` until synthesis succeeds.
    pub fn apply_clarification(
        &self,
        run_ref: &str,
        answer: &str,
    ) -> Result<RunMeta, PipelineError> {
        if answer.trim().is_empty() {
            return Err(PipelineError::Validation {
                field: "answer".into(),
                message: "clarification answer must be non-empty".into(),
            });
        }
        let run_id = self.registry.resolve(run_ref)?;
        let mut meta = self.registry.get_meta(&run_id)?;
        self.ensure_permitted(&meta, Operation::Clarify)?;

        let mut brief: Brief = self.store.get_json(&run_id, BRIEF_ARTIFACT)?;
        brief.append_context(answer.trim());
        self.store.put_json(&run_id, BRIEF_ARTIFACT, &brief)?;
        // Self-edge: refresh updated_at without leaving the clarification loop.
        let current_status = meta.status;
        self.registry.update_status(&mut meta, current_status)?;
        tracing::info!(run_id, "clarification answer appended to brief");
        Ok(meta)
    }

    /// Questions pending for a run, if a clarification request was recorded.
    pub fn pending_questions(&self, run_id: &str) -> Option<ClarificationResult> {
        self.store.get_json(run_id, CLARIFICATION_ARTIFACT).ok()
    }

    /// Render a version-1 draft for one of the run's target platforms.
    pub async fn render_platform(
        &self,
        run_ref: &str,
        provider: &dyn LmProvider,
        platform: Platform,
    ) -> Result<RenderReport, PipelineError> {
        let run_id = self.registry.resolve(run_ref)?;
        let mut meta = self.registry.get_meta(&run_id)?;
        self.ensure_permitted(&meta, Operation::Render)?;
        self.ensure_target(&meta, platform)?;

        let brief: Brief = self.store.get_json(&run_id, BRIEF_ARTIFACT)?;
        let core: ContentCore = self.store.get_json(&run_id, CORE_ARTIFACT)?;
        let style = self.resources.style_profile()?;
        let spec = self.resources.platform_spec(platform)?;
        let template = self.resources.render_prompt(platform)?;

        let outcome = retry_transient(|| {
            render::render(provider, &template, &style, &spec, &brief, &core, platform)
        })
        .await
        .map_err(|source| self.generation_error(&run_id, Operation::Render, source))?;

        for warning in &outcome.warnings {
            tracing::warn!(run_id, %platform, warning, "platform spec violation");
        }

        self.store.put_text(
            &run_id,
            &draft_artifact(platform),
            &format!("{}\n", outcome.draft.body),
        )?;
        self.store.put_text(
            &run_id,
            &format!("prompts/{platform}_render.txt"),
            &outcome.system_prompt,
        )?;
        meta.model = Some(provider.model_name().to_string());
        let next_status = meta.status.after(StageEvent::DraftRendered);
        self.registry.update_status(&mut meta, next_status)?;
        tracing::info!(run_id, %platform, "draft rendered");
        Ok(RenderReport {
            draft: outcome.draft,
            warnings: outcome.warnings,
            meta,
        })
    }

    /// Apply a directive to the current draft of a platform, producing the
    /// next version. The prior version is retained as an immutable backup and
    /// a record is appended to the platform changelog.
    pub async fn apply_patch(
        &self,
        run_ref: &str,
        provider: &dyn LmProvider,
        platform: Platform,
        directive: &str,
    ) -> Result<PatchReport, PipelineError> {
        if directive.trim().is_empty() {
            return Err(PipelineError::Validation {
                field: "directive".into(),
                message: "patch directive must be non-empty".into(),
            });
        }
        let run_id = self.registry.resolve(run_ref)?;
        let mut meta = self.registry.get_meta(&run_id)?;
        self.ensure_permitted(&meta, Operation::Patch)?;
        self.ensure_target(&meta, platform)?;

        let current_body = match self.store.get_text(&run_id, &draft_artifact(platform)) {
            Ok(body) => body,
            Err(PipelineError::ArtifactNotFound { .. }) => {
                return Err(PipelineError::NoCurrentDraft { run_id, platform });
            }
            Err(e) => return Err(e),
        };
        let current_version = self.current_draft_version(&run_id, platform)?;

        let style = self.resources.style_profile()?;
        let template = self.resources.read_text("prompts/patch.txt")?;

        let outcome = retry_transient(|| {
            patch::apply(provider, &template, &style, &current_body, directive)
        })
        .await
        .map_err(|source| self.generation_error(&run_id, Operation::Patch, source))?;

        for warning in &outcome.warnings {
            tracing::warn!(run_id, %platform, warning, "patch output warning");
        }

        // Persist order: backup the old version first so the version chain is
        // never missing a link, then the new current, then the changelog.
        let new_version = current_version + 1;
        self.store.put_text(
            &run_id,
            &draft_backup_artifact(platform, current_version),
            &current_body,
        )?;
        self.store.put_text(
            &run_id,
            &draft_artifact(platform),
            &format!("{}\n", outcome.body),
        )?;

        let record = PatchRecord {
            from_version: current_version,
            to_version: new_version,
            directive: directive.trim().to_string(),
            model: provider.model_name().to_string(),
            changelog: outcome.changelog,
            created_at: chrono::Utc::now(),
        };
        let mut changelog: Vec<PatchRecord> = match self
            .store
            .get_json(&run_id, &changelog_artifact(platform))
        {
            Ok(records) => records,
            Err(PipelineError::ArtifactNotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        changelog.push(record.clone());
        self.store
            .put_json(&run_id, &changelog_artifact(platform), &changelog)?;

        self.store.put_text(
            &run_id,
            &format!("prompts/patch_{:03}_{platform}.txt", current_version),
            &outcome.system_prompt,
        )?;

        meta.model = Some(provider.model_name().to_string());
        let next_status = meta.status.after(StageEvent::DraftPatched);
        self.registry.update_status(&mut meta, next_status)?;
        tracing::info!(run_id, %platform, version = new_version, "patch applied");
        Ok(PatchReport {
            draft: Draft {
                platform,
                body: outcome.body,
                version: new_version,
            },
            record,
            warnings: outcome.warnings,
            meta,
        })
    }

    /// Version of the current draft: 1 plus the number of retained backups.
    /// Backups are never deleted, so the chain stays contiguous from 1.
    pub fn current_draft_version(
        &self,
        run_id: &str,
        platform: Platform,
    ) -> Result<u32, PipelineError> {
        let prefix = format!("{platform}_v");
        let backups = self
            .store
            .list(run_id)?
            .into_iter()
            .filter(|name| name.starts_with(&prefix) && name.ends_with(".md"))
            .count();
        Ok(backups as u32 + 1)
    }

    /// Resolve a user-facing artifact name (`meta`, `core`, `linkedin`,
    /// `linkedin_v1`, ...) to its stored file and return the content.
    pub fn show_artifact(
        &self,
        run_ref: &str,
        name: &str,
    ) -> Result<(String, String), PipelineError> {
        let run_id = self.registry.resolve(run_ref)?;
        for candidate in artifact_candidates(name) {
            if self.store.exists(&run_id, &candidate) {
                let content = self.store.get_text(&run_id, &candidate)?;
                return Ok((candidate, content));
            }
        }
        Err(PipelineError::ArtifactNotFound {
            run_id,
            name: name.to_string(),
        })
    }

    fn ensure_permitted(&self, meta: &RunMeta, operation: Operation) -> Result<(), PipelineError> {
        if crate::state::permitted(meta.status, operation) {
            Ok(())
        } else {
            Err(PipelineError::OperationNotPermitted {
                run_id: meta.run_id.clone(),
                operation,
                status: meta.status,
            })
        }
    }

    fn ensure_target(&self, meta: &RunMeta, platform: Platform) -> Result<(), PipelineError> {
        if meta.platform_targets.contains(&platform) {
            Ok(())
        } else {
            Err(PipelineError::Validation {
                field: "platform".into(),
                message: format!(
                    "{platform} is not among this run's targets ({})",
                    meta.platform_targets
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
        }
    }

    fn generation_error(
        &self,
        run_id: &str,
        operation: Operation,
        source: GenerationError,
    ) -> PipelineError {
        PipelineError::Generation {
            run_id: run_id.to_string(),
            operation,
            source,
        }
    }
}

/// Candidate stored file names for a user-facing artifact name, in priority
/// order.
fn artifact_candidates(name: &str) -> Vec<String> {
    match name {
        "meta" => vec!["meta.json".into()],
        "brief" => vec![BRIEF_ARTIFACT.into()],
        "core" => vec![CORE_ARTIFACT.into()],
        "clarification" => vec![CLARIFICATION_ARTIFACT.into()],
        other => vec![
            other.to_string(),
            format!("{other}.md"),
            format!("{other}.json"),
        ],
    }
}

/// Run a model-backed step, retrying once on transient failures.
async fn retry_transient<T, Fut>(make: impl Fn() -> Fut) -> Result<T, GenerationError>
where
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let first = make().await;
    match first {
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "transient model failure, retrying once");
            make().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::state::RunStatus;
    use tempfile::TempDir;

    const VALID_CORE: &str = r#"{
        "thesis": "Most A/B tests fail before they start",
        "angle": "test design, not statistics",
        "points": [{"claim": "Sample sizes are set after launch", "support": ["audit of 40 tests"]}]
    }"#;

    const NO_CLARIFY: &str = r#"{"needs_clarification": false, "questions": []}"#;
    const NEEDS_CLARIFY: &str =
        r#"{"needs_clarification": true, "questions": ["What experiments have you run?"]}"#;

    fn orchestrator() -> (TempDir, Orchestrator) {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(dir.path().join("runs"), ResourceResolver::default());
        (dir, orchestrator)
    }

    fn raw_brief() -> RawBrief {
        RawBrief {
            topic: Some("Why most A/B tests fail".into()),
            platform_targets: Some(vec!["blog".into(), "linkedin".into(), "x".into()]),
            ..Default::default()
        }
    }

    fn created_run(orchestrator: &Orchestrator) -> RunMeta {
        orchestrator.create_run(raw_brief()).unwrap()
    }

    async fn run_with_core(orchestrator: &Orchestrator) -> RunMeta {
        let meta = created_run(orchestrator);
        let provider = ScriptedProvider::new(vec![
            Ok(NO_CLARIFY.to_string()),
            Ok(VALID_CORE.to_string()),
        ]);
        match orchestrator
            .generate_core(&meta.run_id, &provider, false)
            .await
            .unwrap()
        {
            CoreOutcome::Generated { meta, .. } => meta,
            other => panic!("expected core, got {other:?}"),
        }
    }

    // Scenario: create + synthesize with a valid stub.
    #[tokio::test]
    async fn create_then_synthesize_reaches_core_generated() {
        let (_guard, orchestrator) = orchestrator();
        let meta = created_run(&orchestrator);
        assert_eq!(meta.status, RunStatus::BriefSaved);
        assert!(orchestrator.store().exists(&meta.run_id, BRIEF_ARTIFACT));

        let provider = ScriptedProvider::new(vec![
            Ok(NO_CLARIFY.to_string()),
            Ok(VALID_CORE.to_string()),
        ]);
        let outcome = orchestrator
            .generate_core(&meta.run_id, &provider, false)
            .await
            .unwrap();
        let CoreOutcome::Generated { core, meta } = outcome else {
            panic!("expected a generated core");
        };
        assert_eq!(meta.status, RunStatus::CoreGenerated);
        assert!(!core.thesis.is_empty());
        let stored: ContentCore = orchestrator
            .store()
            .get_json(&meta.run_id, CORE_ARTIFACT)
            .unwrap();
        assert_eq!(stored, core);
        assert_eq!(meta.model.as_deref(), Some("scripted-stub"));
    }

    // Scenario: render before any core exists is rejected without a model call.
    #[tokio::test]
    async fn render_before_core_is_invalid_transition_and_writes_nothing() {
        let (_guard, orchestrator) = orchestrator();
        let meta = created_run(&orchestrator);
        let provider = ScriptedProvider::always("should never be called");

        let err = orchestrator
            .render_platform(&meta.run_id, &provider, Platform::Linkedin)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::OperationNotPermitted { .. }));
        assert_eq!(provider.call_count(), 0);
        assert!(
            !orchestrator
                .store()
                .exists(&meta.run_id, &draft_artifact(Platform::Linkedin))
        );
        let on_disk = orchestrator.registry().get_meta(&meta.run_id).unwrap();
        assert_eq!(on_disk.status, RunStatus::BriefSaved);
    }

    // Scenario: render -> patch produces v2 current, v1 backup, one record.
    #[tokio::test]
    async fn render_then_patch_versions_and_changelog() {
        let (_guard, orchestrator) = orchestrator();
        let meta = run_with_core(&orchestrator).await;

        let provider = ScriptedProvider::always("The first LinkedIn draft body.");
        let report = orchestrator
            .render_platform(&meta.run_id, &provider, Platform::Linkedin)
            .await
            .unwrap();
        assert_eq!(report.draft.version, 1);
        assert_eq!(report.meta.status, RunStatus::Rendered);

        let provider = ScriptedProvider::always(
            "The shortened draft body.\n---CHANGELOG---\ncut the intro in half",
        );
        let report = orchestrator
            .apply_patch(&meta.run_id, &provider, Platform::Linkedin, "shorten intro")
            .await
            .unwrap();
        assert_eq!(report.draft.version, 2);
        assert_eq!(report.meta.status, RunStatus::Patched);

        let store = orchestrator.store();
        assert_eq!(
            store
                .get_text(&meta.run_id, &draft_artifact(Platform::Linkedin))
                .unwrap(),
            "The shortened draft body.\n"
        );
        assert_eq!(
            store
                .get_text(&meta.run_id, &draft_backup_artifact(Platform::Linkedin, 1))
                .unwrap(),
            "The first LinkedIn draft body.\n"
        );
        let changelog: Vec<PatchRecord> = store
            .get_json(&meta.run_id, &changelog_artifact(Platform::Linkedin))
            .unwrap();
        assert_eq!(changelog.len(), 1);
        assert_eq!(changelog[0].from_version, 1);
        assert_eq!(changelog[0].to_version, 2);
        assert_eq!(changelog[0].directive, "shorten intro");
        assert_eq!(changelog[0].changelog, "cut the intro in half");
    }

    // Versions stay contiguous across repeated patches.
    #[tokio::test]
    async fn repeated_patches_keep_versions_contiguous() {
        let (_guard, orchestrator) = orchestrator();
        let meta = run_with_core(&orchestrator).await;

        let provider = ScriptedProvider::always("Draft v1 body.");
        orchestrator
            .render_platform(&meta.run_id, &provider, Platform::X)
            .await
            .unwrap();

        for n in 2..=4u32 {
            let provider =
                ScriptedProvider::always(&format!("Draft v{n} body.\n---CHANGELOG---\nedit {n}"));
            let report = orchestrator
                .apply_patch(&meta.run_id, &provider, Platform::X, "tighten")
                .await
                .unwrap();
            assert_eq!(report.draft.version, n);
        }

        let store = orchestrator.store();
        for v in 1..=3u32 {
            assert_eq!(
                store
                    .get_text(&meta.run_id, &draft_backup_artifact(Platform::X, v))
                    .unwrap(),
                format!("Draft v{v} body.\n")
            );
        }
        assert_eq!(
            store
                .get_text(&meta.run_id, &draft_artifact(Platform::X))
                .unwrap(),
            "Draft v4 body.\n"
        );
        let changelog: Vec<PatchRecord> = store
            .get_json(&meta.run_id, &changelog_artifact(Platform::X))
            .unwrap();
        assert_eq!(changelog.len(), 3);
        assert!(
            changelog
                .windows(2)
                .all(|w| w[1].from_version == w[0].to_version)
        );
    }

    // Scenario: the clarification loop, there and back again.
    #[tokio::test]
    async fn clarification_loop_blocks_then_completes() {
        let (_guard, orchestrator) = orchestrator();
        let meta = created_run(&orchestrator);

        let provider = ScriptedProvider::always(NEEDS_CLARIFY);
        let outcome = orchestrator
            .generate_core(&meta.run_id, &provider, false)
            .await
            .unwrap();
        let CoreOutcome::NeedsClarification { questions, meta } = outcome else {
            panic!("expected clarification request");
        };
        assert_eq!(questions, vec!["What experiments have you run?".to_string()]);
        assert_eq!(meta.status, RunStatus::AwaitingClarification);
        assert!(!orchestrator.store().exists(&meta.run_id, CORE_ARTIFACT));
        assert!(
            orchestrator
                .pending_questions(&meta.run_id)
                .is_some_and(|p| p.needs_clarification)
        );

        // Answer lands in context_notes; status stays in the loop.
        let meta = orchestrator
            .apply_clarification(&meta.run_id, "We ran 40 tests, 31 were underpowered.")
            .unwrap();
        assert_eq!(meta.status, RunStatus::AwaitingClarification);
        let brief: Brief = orchestrator
            .store()
            .get_json(&meta.run_id, BRIEF_ARTIFACT)
            .unwrap();
        assert!(
            brief
                .context_notes
                .as_deref()
                .unwrap()
                .contains("40 tests")
        );

        // Retry with a now-satisfied stub completes the loop.
        let provider = ScriptedProvider::new(vec![
            Ok(NO_CLARIFY.to_string()),
            Ok(VALID_CORE.to_string()),
        ]);
        let outcome = orchestrator
            .generate_core(&meta.run_id, &provider, false)
            .await
            .unwrap();
        let CoreOutcome::Generated { meta, .. } = outcome else {
            panic!("expected a generated core after clarification");
        };
        assert_eq!(meta.status, RunStatus::CoreGenerated);
    }

    // Clarification answers are rejected outside the loop.
    #[tokio::test]
    async fn clarify_outside_awaiting_is_rejected() {
        let (_guard, orchestrator) = orchestrator();
        let meta = created_run(&orchestrator);
        let err = orchestrator
            .apply_clarification(&meta.run_id, "unsolicited context")
            .unwrap_err();
        assert!(matches!(err, PipelineError::OperationNotPermitted { .. }));
    }

    // Scenario: a timed-out model call changes nothing.
    #[tokio::test]
    async fn timeout_leaves_status_and_artifacts_unchanged() {
        let (_guard, orchestrator) = orchestrator();
        let meta = created_run(&orchestrator);
        let before_meta = orchestrator.registry().get_meta(&meta.run_id).unwrap();
        let before_files = orchestrator.store().list(&meta.run_id).unwrap();

        // Both the first attempt and the single retry time out.
        let provider = ScriptedProvider::new(vec![
            Err(GenerationError::Timeout { seconds: 30 }),
            Err(GenerationError::Timeout { seconds: 30 }),
        ]);
        let err = orchestrator
            .generate_core(&meta.run_id, &provider, true)
            .await
            .unwrap_err();
        match err {
            PipelineError::Generation { source, .. } => {
                assert!(matches!(source, GenerationError::Timeout { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.call_count(), 2);

        assert_eq!(
            orchestrator.registry().get_meta(&meta.run_id).unwrap(),
            before_meta
        );
        assert_eq!(orchestrator.store().list(&meta.run_id).unwrap(), before_files);
    }

    // Transient failures get exactly one retry; schema defects get none.
    #[tokio::test]
    async fn retry_policy_distinguishes_transient_from_schema_errors() {
        let (_guard, orchestrator) = orchestrator();
        let meta = created_run(&orchestrator);

        let provider = ScriptedProvider::new(vec![
            Err(GenerationError::Provider("502 bad gateway".into())),
            Ok(VALID_CORE.to_string()),
        ]);
        let outcome = orchestrator
            .generate_core(&meta.run_id, &provider, true)
            .await
            .unwrap();
        assert!(matches!(outcome, CoreOutcome::Generated { .. }));
        assert_eq!(provider.call_count(), 2);

        let meta = created_run(&orchestrator);
        let provider = ScriptedProvider::always("not json at all");
        let err = orchestrator
            .generate_core(&meta.run_id, &provider, true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Generation {
                source: GenerationError::InvalidSchema(_),
                ..
            }
        ));
        assert_eq!(provider.call_count(), 1);
    }

    // Patch with no draft on disk fails typed, not with a raw IO error.
    #[tokio::test]
    async fn patch_without_draft_reports_no_current_draft() {
        let (_guard, orchestrator) = orchestrator();
        let meta = run_with_core(&orchestrator).await;

        // Force the status forward so the state check passes but the blog
        // draft itself is missing.
        let provider = ScriptedProvider::always("Only the X draft exists.");
        orchestrator
            .render_platform(&meta.run_id, &provider, Platform::X)
            .await
            .unwrap();

        let provider = ScriptedProvider::always("unused");
        let err = orchestrator
            .apply_patch(&meta.run_id, &provider, Platform::Blog, "shorten")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NoCurrentDraft {
                platform: Platform::Blog,
                ..
            }
        ));
        assert_eq!(provider.call_count(), 0);
    }

    // Re-running core on a rendered run overwrites the artifact in place.
    #[tokio::test]
    async fn regenerating_core_keeps_later_status() {
        let (_guard, orchestrator) = orchestrator();
        let meta = run_with_core(&orchestrator).await;
        let provider = ScriptedProvider::always("Rendered body.");
        orchestrator
            .render_platform(&meta.run_id, &provider, Platform::Blog)
            .await
            .unwrap();

        let provider = ScriptedProvider::new(vec![
            Ok(NO_CLARIFY.to_string()),
            Ok(VALID_CORE.to_string()),
        ]);
        let outcome = orchestrator
            .generate_core(&meta.run_id, &provider, false)
            .await
            .unwrap();
        let CoreOutcome::Generated { meta, .. } = outcome else {
            panic!("expected regenerated core");
        };
        assert_eq!(meta.status, RunStatus::Rendered);
    }

    // Rendering a platform outside the brief's targets is a validation error.
    #[tokio::test]
    async fn render_requires_platform_in_targets() {
        let (_guard, orchestrator) = orchestrator();
        let raw = RawBrief {
            topic: Some("Narrow targets".into()),
            platform_targets: Some(vec!["linkedin".into()]),
            ..Default::default()
        };
        let meta = orchestrator.create_run(raw).unwrap();
        let provider = ScriptedProvider::new(vec![
            Ok(NO_CLARIFY.to_string()),
            Ok(VALID_CORE.to_string()),
        ]);
        orchestrator
            .generate_core(&meta.run_id, &provider, false)
            .await
            .unwrap();

        let provider = ScriptedProvider::always("unused");
        let err = orchestrator
            .render_platform(&meta.run_id, &provider, Platform::Blog)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn show_artifact_resolves_friendly_names() {
        let (_guard, orchestrator) = orchestrator();
        let meta = run_with_core(&orchestrator).await;
        let (file, content) = orchestrator.show_artifact(&meta.run_id, "core").unwrap();
        assert_eq!(file, CORE_ARTIFACT);
        assert!(content.contains("thesis"));

        let err = orchestrator
            .show_artifact(&meta.run_id, "linkedin")
            .unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactNotFound { .. }));
    }
}
