//! # Duplicate Reconciliation
//!
//! Decides whether a client/project being saved already exists, and what to
//! do about it.
//!
//! ## Two-Phase Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Phase 1 (record store, fuzzy)     Phase 2 (THIS MODULE, exact)        │
//! │                                                                         │
//! │  search("John Smith")              trim + lowercase name equality       │
//! │    → John Smith          ─────►      OR non-empty email equality        │
//! │    → Johnny Smithson                                                    │
//! │                                    → John Smith                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store search may return near misses; only the exact filter here
//! decides what counts as a duplicate.
//!
//! ## Resolution State Machine
//! ```text
//!                      ┌──────────────────────┐
//!                      │  client duplicate?   │
//!                      └──────────┬───────────┘
//!                    no           │          yes
//!             ┌───────────────────┴────────────────────┐
//!             ▼                                        ▼
//!        CreateNew                           ┌──────────────────────┐
//!                                            │  project collision?  │
//!                                            └──────────┬───────────┘
//!                                     no                │            yes
//!                      ┌────────────────────────────────┴─────────────┐
//!                      ▼                                              ▼
//!            Prompt: ClientMatch                        Prompt: ProjectCollision
//!            ├── AddToClient     → MergeClient          ├── UpdateExisting   → UpdateProject
//!            └── CreateNewClient → CreateNew            ├── CreateVersion    → CreateVersion
//!                                                       └── DeleteAndReplace → ReplaceProject
//! ```
//!
//! In a known client context the ClientMatch prompt is skipped and
//! `AddToClient` is implied (see [`ClientContext::implied_choice`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{ClientSummary, ProjectSummary};

// =============================================================================
// Matching
// =============================================================================

/// Case- and whitespace-insensitive key used for every identity comparison.
fn identity_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Returns the first candidate that is the same client as `name`/`email`.
///
/// A candidate matches when its trimmed, lowercased name equals `name`, or
/// when `email` is non-empty and equals the candidate's email the same way.
///
/// ## Example
/// ```rust
/// use billwise_core::reconciliation::find_duplicate_client;
/// use billwise_core::types::ClientSummary;
///
/// let candidates = vec![
///     ClientSummary { id: "c1".into(), name: "Johnny Smithson".into(), email: "js@x.io".into(), company: None },
///     ClientSummary { id: "c2".into(), name: "John Smith".into(), email: "john@y.io".into(), company: None },
/// ];
///
/// let found = find_duplicate_client("John Smith", "", &candidates);
/// assert_eq!(found.map(|c| c.id.as_str()), Some("c2"));
/// ```
pub fn find_duplicate_client<'a>(
    name: &str,
    email: &str,
    candidates: &'a [ClientSummary],
) -> Option<&'a ClientSummary> {
    let name_key = identity_key(name);
    let email_key = identity_key(email);

    candidates.iter().find(|candidate| {
        identity_key(&candidate.name) == name_key
            || (!email_key.is_empty() && identity_key(&candidate.email) == email_key)
    })
}

/// Returns the client's existing project whose name equals `name`
/// (trimmed, case-insensitive).
pub fn find_project_collision<'a>(
    name: &str,
    projects: &'a [ProjectSummary],
) -> Option<&'a ProjectSummary> {
    let key = identity_key(name);
    projects.iter().find(|project| identity_key(&project.name) == key)
}

/// Name for the project created by "Create as Version 2".
///
/// Suffixes never chain: a name already carrying a version marker gets
/// `" (New)"` instead of a second `" (V2)"`.
///
/// ```rust
/// use billwise_core::reconciliation::versioned_project_name;
///
/// assert_eq!(versioned_project_name("Website Redesign"), "Website Redesign (V2)");
/// assert_eq!(versioned_project_name("Website Redesign (V2)"), "Website Redesign (V2) (New)");
/// ```
pub fn versioned_project_name(name: &str) -> String {
    if name.contains("(V") {
        format!("{} (New)", name)
    } else {
        format!("{} (V2)", name)
    }
}

/// Outcome of the duplicate check for one engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
#[ts(export)]
pub enum DuplicateCheck {
    NoDuplicate,
    ClientMatch {
        client: ClientSummary,
    },
    ProjectCollision {
        client: ClientSummary,
        project: ProjectSummary,
    },
}

impl DuplicateCheck {
    pub fn has_client_duplicate(&self) -> bool {
        !matches!(self, DuplicateCheck::NoDuplicate)
    }

    pub fn has_project_collision(&self) -> bool {
        matches!(self, DuplicateCheck::ProjectCollision { .. })
    }

    /// The prompt the user must answer, if any.
    pub fn prompt(&self) -> Option<ResolutionPrompt> {
        match self {
            DuplicateCheck::NoDuplicate => None,
            DuplicateCheck::ClientMatch { .. } => Some(ResolutionPrompt::ClientMatch),
            DuplicateCheck::ProjectCollision { .. } => Some(ResolutionPrompt::ProjectCollision),
        }
    }

    /// The matched existing client.
    pub fn client(&self) -> Option<&ClientSummary> {
        match self {
            DuplicateCheck::NoDuplicate => None,
            DuplicateCheck::ClientMatch { client } | DuplicateCheck::ProjectCollision { client, .. } => {
                Some(client)
            }
        }
    }

    /// The colliding existing project.
    pub fn project(&self) -> Option<&ProjectSummary> {
        match self {
            DuplicateCheck::ProjectCollision { project, .. } => Some(project),
            _ => None,
        }
    }
}

/// Whether the flow already knows which client the project belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClientContext {
    /// Client details were typed in or extracted; they may match someone.
    #[default]
    Unknown,
    /// Started from an existing client's page.
    Known(String),
}

impl ClientContext {
    /// A choice the context answers on the user's behalf.
    ///
    /// A known client answers the ClientMatch prompt with `AddToClient`.
    /// A project collision always needs the user.
    pub fn implied_choice(&self, check: &DuplicateCheck) -> Option<ResolutionChoice> {
        match (self, check) {
            (ClientContext::Known(_), DuplicateCheck::ClientMatch { .. }) => {
                Some(ResolutionChoice::AddToClient)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// A question shown to the user when a duplicate is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ResolutionPrompt {
    /// "Client already exists."
    ClientMatch,
    /// "This client already has a project with this name."
    ProjectCollision,
}

impl ResolutionPrompt {
    /// Choices that answer this prompt, in the order they are offered.
    pub const fn choices(&self) -> &'static [ResolutionChoice] {
        match self {
            ResolutionPrompt::ClientMatch => {
                &[ResolutionChoice::AddToClient, ResolutionChoice::CreateNewClient]
            }
            ResolutionPrompt::ProjectCollision => &[
                ResolutionChoice::UpdateExisting,
                ResolutionChoice::CreateVersion,
                ResolutionChoice::DeleteAndReplace,
            ],
        }
    }

    pub fn accepts(&self, choice: ResolutionChoice) -> bool {
        self.choices().contains(&choice)
    }
}

impl fmt::Display for ResolutionPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionPrompt::ClientMatch => f.write_str("Client already exists"),
            ResolutionPrompt::ProjectCollision => {
                f.write_str("This client already has a project with this name")
            }
        }
    }
}

/// An answer to a [`ResolutionPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ResolutionChoice {
    AddToClient,
    CreateNewClient,
    UpdateExisting,
    CreateVersion,
    DeleteAndReplace,
}

impl ResolutionChoice {
    pub const ALL: &'static [ResolutionChoice] = &[
        ResolutionChoice::AddToClient,
        ResolutionChoice::CreateNewClient,
        ResolutionChoice::UpdateExisting,
        ResolutionChoice::CreateVersion,
        ResolutionChoice::DeleteAndReplace,
    ];

    /// Command-line spelling, e.g. `update-existing`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResolutionChoice::AddToClient => "add-to-client",
            ResolutionChoice::CreateNewClient => "create-new-client",
            ResolutionChoice::UpdateExisting => "update-existing",
            ResolutionChoice::CreateVersion => "create-version",
            ResolutionChoice::DeleteAndReplace => "delete-and-replace",
        }
    }
}

/// Button label.
impl fmt::Display for ResolutionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolutionChoice::AddToClient => "Add Project to Client",
            ResolutionChoice::CreateNewClient => "Create as New Client",
            ResolutionChoice::UpdateExisting => "Update Existing",
            ResolutionChoice::CreateVersion => "Create as Version 2",
            ResolutionChoice::DeleteAndReplace => "Delete Old & Replace",
        };
        f.write_str(label)
    }
}

impl FromStr for ResolutionChoice {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        ResolutionChoice::ALL
            .iter()
            .copied()
            .find(|choice| choice.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "resolution".to_string(),
                allowed: ResolutionChoice::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

/// What the persistence layer should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum DuplicateAction {
    /// Create a fresh client and the project.
    CreateNew,
    /// Create the project under the existing client.
    MergeClient,
    /// Patch the colliding project in place.
    UpdateProject,
    /// Create the project under the existing client with a versioned name.
    CreateVersion,
    /// Delete the colliding project, then create the new one.
    ReplaceProject,
}

/// Maps the duplicate state and the user's choice to an action.
///
/// ## Errors
/// - [`CoreError::ChoiceRequired`] when a duplicate exists and no choice
///   was given
/// - [`CoreError::InvalidChoice`] when the choice answers a different prompt
///
/// A choice supplied when there is no duplicate is ignored.
///
/// ```rust
/// use billwise_core::reconciliation::{resolve_duplicate_action, DuplicateAction, ResolutionChoice};
///
/// let action = resolve_duplicate_action(true, true, Some(ResolutionChoice::CreateVersion)).unwrap();
/// assert_eq!(action, DuplicateAction::CreateVersion);
/// assert!(resolve_duplicate_action(true, false, None).is_err());
/// ```
pub fn resolve_duplicate_action(
    has_client_dup: bool,
    has_project_collision: bool,
    choice: Option<ResolutionChoice>,
) -> CoreResult<DuplicateAction> {
    if !has_client_dup {
        return Ok(DuplicateAction::CreateNew);
    }

    let prompt = if has_project_collision {
        ResolutionPrompt::ProjectCollision
    } else {
        ResolutionPrompt::ClientMatch
    };

    let choice = choice.ok_or(CoreError::ChoiceRequired(prompt))?;

    match (prompt, choice) {
        (ResolutionPrompt::ClientMatch, ResolutionChoice::AddToClient) => Ok(DuplicateAction::MergeClient),
        (ResolutionPrompt::ClientMatch, ResolutionChoice::CreateNewClient) => Ok(DuplicateAction::CreateNew),
        (ResolutionPrompt::ProjectCollision, ResolutionChoice::UpdateExisting) => {
            Ok(DuplicateAction::UpdateProject)
        }
        (ResolutionPrompt::ProjectCollision, ResolutionChoice::CreateVersion) => {
            Ok(DuplicateAction::CreateVersion)
        }
        (ResolutionPrompt::ProjectCollision, ResolutionChoice::DeleteAndReplace) => {
            Ok(DuplicateAction::ReplaceProject)
        }
        (prompt, choice) => Err(CoreError::InvalidChoice { choice, prompt }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str, name: &str, email: &str) -> ClientSummary {
        ClientSummary {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            company: None,
        }
    }

    fn project(id: &str, name: &str) -> ProjectSummary {
        ProjectSummary {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_client_match_ignores_case_and_whitespace() {
        let candidates = [client("c1", "acme corp", "billing@acme.io")];
        let found = find_duplicate_client(" Acme Corp ", "", &candidates);
        assert_eq!(found.map(|c| c.id.as_str()), Some("c1"));
    }

    #[test]
    fn test_exact_filter_discards_fuzzy_hits() {
        let candidates = [
            client("c1", "Johnny Smithson", "johnny@x.io"),
            client("c2", "John Smith", "john@x.io"),
        ];
        let found = find_duplicate_client("John Smith", "", &candidates);
        assert_eq!(found.map(|c| c.id.as_str()), Some("c2"));

        let only_fuzzy = [client("c1", "Johnny Smithson", "johnny@x.io")];
        assert!(find_duplicate_client("John Smith", "", &only_fuzzy).is_none());
    }

    #[test]
    fn test_email_match_requires_nonempty_email() {
        let candidates = [client("c1", "Someone Else", "")];
        assert!(find_duplicate_client("Different", "", &candidates).is_none());

        let candidates = [client("c1", "Someone Else", "Ops@Acme.io ")];
        let found = find_duplicate_client("Different", "ops@acme.io", &candidates);
        assert_eq!(found.map(|c| c.id.as_str()), Some("c1"));
    }

    #[test]
    fn test_first_match_wins() {
        let candidates = [client("c1", "Acme", "a@x.io"), client("c2", "acme", "b@x.io")];
        assert_eq!(find_duplicate_client("ACME", "", &candidates).map(|c| c.id.as_str()), Some("c1"));
    }

    #[test]
    fn test_project_collision() {
        let projects = [project("p1", "Website Redesign"), project("p2", "SEO")];
        assert_eq!(
            find_project_collision("  website redesign", &projects).map(|p| p.id.as_str()),
            Some("p1")
        );
        assert!(find_project_collision("Website", &projects).is_none());
    }

    #[test]
    fn test_versioned_name_does_not_chain() {
        assert_eq!(versioned_project_name("Portal"), "Portal (V2)");
        assert_eq!(versioned_project_name("Website Redesign (V2)"), "Website Redesign (V2) (New)");
        assert_eq!(versioned_project_name("App (V3) beta"), "App (V3) beta (New)");
    }

    #[test]
    fn test_resolve_without_duplicate_is_create_new() {
        assert_eq!(resolve_duplicate_action(false, false, None).unwrap(), DuplicateAction::CreateNew);
        assert_eq!(
            resolve_duplicate_action(false, true, Some(ResolutionChoice::UpdateExisting)).unwrap(),
            DuplicateAction::CreateNew
        );
    }

    #[test]
    fn test_resolve_client_match() {
        assert_eq!(
            resolve_duplicate_action(true, false, Some(ResolutionChoice::AddToClient)).unwrap(),
            DuplicateAction::MergeClient
        );
        assert_eq!(
            resolve_duplicate_action(true, false, Some(ResolutionChoice::CreateNewClient)).unwrap(),
            DuplicateAction::CreateNew
        );
    }

    #[test]
    fn test_resolve_project_collision() {
        let cases = [
            (ResolutionChoice::UpdateExisting, DuplicateAction::UpdateProject),
            (ResolutionChoice::CreateVersion, DuplicateAction::CreateVersion),
            (ResolutionChoice::DeleteAndReplace, DuplicateAction::ReplaceProject),
        ];
        for (choice, expected) in cases {
            assert_eq!(resolve_duplicate_action(true, true, Some(choice)).unwrap(), expected);
        }
    }

    #[test]
    fn test_resolve_requires_choice() {
        let err = resolve_duplicate_action(true, true, None).unwrap_err();
        assert!(matches!(err, CoreError::ChoiceRequired(ResolutionPrompt::ProjectCollision)));
    }

    #[test]
    fn test_resolve_rejects_mismatched_choice() {
        let err = resolve_duplicate_action(true, true, Some(ResolutionChoice::AddToClient)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidChoice { .. }));

        let err = resolve_duplicate_action(true, false, Some(ResolutionChoice::CreateVersion)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidChoice { .. }));
    }

    #[test]
    fn test_known_context_implies_add_to_client() {
        let matched = DuplicateCheck::ClientMatch {
            client: client("c1", "Acme", ""),
        };
        let collided = DuplicateCheck::ProjectCollision {
            client: client("c1", "Acme", ""),
            project: project("p1", "Site"),
        };
        let known = ClientContext::Known("c1".into());

        assert_eq!(known.implied_choice(&matched), Some(ResolutionChoice::AddToClient));
        assert_eq!(known.implied_choice(&collided), None);
        assert_eq!(ClientContext::Unknown.implied_choice(&matched), None);
    }

    #[test]
    fn test_choice_parsing_and_labels() {
        assert_eq!("update_existing".parse::<ResolutionChoice>().unwrap(), ResolutionChoice::UpdateExisting);
        assert_eq!("Create Version".parse::<ResolutionChoice>().unwrap(), ResolutionChoice::CreateVersion);
        assert!("merge".parse::<ResolutionChoice>().is_err());
        assert_eq!(ResolutionChoice::DeleteAndReplace.to_string(), "Delete Old & Replace");
        assert!(ResolutionPrompt::ClientMatch.accepts(ResolutionChoice::CreateNewClient));
        assert!(!ResolutionPrompt::ClientMatch.accepts(ResolutionChoice::UpdateExisting));
    }
}
