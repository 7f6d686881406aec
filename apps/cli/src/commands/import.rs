//! `billwise import [file] [--client-id ID] [--resolution CHOICE] [--no-input]`
//!
//! ```text
//! file (payload or draft) ──► engagements ──► for each:
//!     DraftStore.save ──► prepare ──► resolve ──(prompt?)──► commit ──► DraftStore.clear
//! no file ──► DraftStore.load (resume the interrupted one)
//! ```
//!
//! Projects of one document belong to one client: once the first is saved,
//! the others are checked against that client only, whatever resolution was
//! picked for the first.
//!
//! A failure leaves the engagement that failed in the draft store, so the
//! next `billwise import` without a file picks it up again.

use std::path::{Path, PathBuf};

use billwise_core::reconciliation::ClientContext;
use billwise_core::{DuplicateAction, DuplicateCheck, EngagementDraft, ResolutionChoice, ResolutionPrompt};
use billwise_db::{DraftStore, RecordStore};
use inquire::{Confirm, Select};
use tracing::{info, warn};

use crate::commands::extract::engagements_from;
use crate::commands::read_value;
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::flow::{ProjectFlow, SaveOutcome};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// `None` resumes the pending draft.
    pub file: Option<PathBuf>,
    pub resolution: Option<ResolutionChoice>,
    /// Ask on the terminal when a decision is needed.
    pub interactive: bool,
}

/// Asks the user to settle a duplicate.
pub trait Prompter {
    fn choose(&self, prompt: ResolutionPrompt, check: &DuplicateCheck) -> ApiResult<ResolutionChoice>;

    fn confirm_replace(&self, project_name: &str) -> ApiResult<bool>;
}

/// Terminal prompts.
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn choose(&self, prompt: ResolutionPrompt, check: &DuplicateCheck) -> ApiResult<ResolutionChoice> {
        let message = match check {
            DuplicateCheck::ClientMatch { client } => {
                format!("Client \"{}\" already exists. What should happen?", client.name)
            }
            DuplicateCheck::ProjectCollision { client, project } => format!(
                "\"{}\" already has a project named \"{}\". What should happen?",
                client.name, project.name
            ),
            DuplicateCheck::NoDuplicate => prompt.to_string(),
        };

        Ok(Select::new(&message, prompt.choices().to_vec()).prompt()?)
    }

    fn confirm_replace(&self, project_name: &str) -> ApiResult<bool> {
        let message = format!("Delete \"{}\" and its milestones?", project_name);
        Ok(Confirm::new(&message).with_default(false).prompt()?)
    }
}

pub async fn run<S, D, P>(
    flow: &ProjectFlow<S>,
    drafts: &D,
    config: &AppConfig,
    options: &ImportOptions,
    prompter: &P,
) -> ApiResult<()>
where
    S: RecordStore,
    D: DraftStore,
    P: Prompter,
{
    let outcomes = import_all(flow, drafts, config, options, prompter).await?;
    for outcome in &outcomes {
        println!("✅ {}", describe(outcome));
    }
    Ok(())
}

/// Imports every engagement in order, stopping at the first failure.
pub async fn import_all<S, D, P>(
    flow: &ProjectFlow<S>,
    drafts: &D,
    config: &AppConfig,
    options: &ImportOptions,
    prompter: &P,
) -> ApiResult<Vec<SaveOutcome>>
where
    S: RecordStore,
    D: DraftStore,
    P: Prompter,
{
    let engagements = pending_engagements(drafts, config, options.file.as_deref())?;
    info!(count = engagements.len(), "Importing engagements");

    let mut outcomes: Vec<SaveOutcome> = Vec::with_capacity(engagements.len());
    let mut document_client: Option<String> = None;
    for draft in &engagements {
        let joined = document_client
            .as_deref()
            .filter(|_| draft.client == engagements[0].client);
        let outcome = import_one(flow, drafts, draft, options, prompter, joined).await?;
        if document_client.is_none() {
            document_client = Some(outcome.project.project.client_id.clone());
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

fn pending_engagements<D: DraftStore>(
    drafts: &D,
    config: &AppConfig,
    file: Option<&Path>,
) -> ApiResult<Vec<EngagementDraft>> {
    match file {
        Some(path) => {
            let engagements = engagements_from(read_value(path)?, config)?;
            if engagements.is_empty() {
                return Err(ApiError::invalid_input(format!(
                    "No client or project found in {}",
                    path.display()
                )));
            }
            if drafts.load()?.is_some() {
                warn!("Replacing the pending draft");
            }
            Ok(engagements)
        }
        None => match drafts.load()? {
            Some(draft) => {
                info!(project = %draft.project.name, "Resuming pending draft");
                Ok(vec![draft])
            }
            None => Err(ApiError::invalid_input(
                "No pending draft to resume; pass a file to import",
            )),
        },
    }
}

async fn import_one<S, D, P>(
    flow: &ProjectFlow<S>,
    drafts: &D,
    draft: &EngagementDraft,
    options: &ImportOptions,
    prompter: &P,
    document_client: Option<&str>,
) -> ApiResult<SaveOutcome>
where
    S: RecordStore,
    D: DraftStore,
    P: Prompter,
{
    drafts.save(draft)?;

    let context = match document_client {
        Some(id) => ClientContext::Known(id.to_string()),
        None => flow.context().clone(),
    };

    let prepared = flow.prepare_in(&context, draft).await?;
    for issue in prepared.report.warnings() {
        println!("⚠️  {}", issue.message);
    }

    // The resolution given for the document's first project does not apply
    // to joining its client.
    let choice = match (&prepared.check, document_client) {
        (DuplicateCheck::ClientMatch { .. }, Some(_)) => Some(ResolutionChoice::AddToClient),
        _ => options.resolution,
    };

    let (action, prompted) = match flow.resolve_in(&context, &prepared.check, choice) {
        Ok(action) => (action, false),
        Err(err) if err.code == ErrorCode::ChoiceRequired && options.interactive => {
            let prompt = prepared
                .check
                .prompt()
                .ok_or_else(|| ApiError::internal("a decision was requested without a duplicate"))?;
            let picked = prompter.choose(prompt, &prepared.check)?;
            (flow.resolve_in(&context, &prepared.check, Some(picked))?, true)
        }
        Err(err) => return Err(err),
    };

    if prompted && action == DuplicateAction::ReplaceProject {
        let name = prepared.check.project().map(|p| p.name.as_str()).unwrap_or_default();
        if !prompter.confirm_replace(name)? {
            return Err(ApiError::new(ErrorCode::Cancelled, "Replacement cancelled; the draft is kept"));
        }
    }

    let outcome = flow.commit(draft, &prepared.check, action).await?;
    drafts.clear()?;
    Ok(outcome)
}

/// One-line summary of what a save did.
pub fn describe(outcome: &SaveOutcome) -> String {
    let verb = match outcome.action {
        DuplicateAction::CreateNew => "Created",
        DuplicateAction::MergeClient => "Added to existing client:",
        DuplicateAction::UpdateProject => "Updated",
        DuplicateAction::CreateVersion => "Created new version",
        DuplicateAction::ReplaceProject => "Replaced",
    };
    let project = &outcome.project.project;
    format!(
        "{} \"{}\" ({} milestones, budget {} {}) [{}]",
        verb,
        project.name,
        outcome.project.milestones.len(),
        project.currency,
        project.total_budget,
        project.id
    )
}
