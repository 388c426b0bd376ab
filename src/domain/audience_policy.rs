//! Who may post which kind of item, and to whom.
//!
//! Pure rules: the same inputs always produce the same decision, with no
//! storage or identity lookups behind them.

use thiserror::Error;

use super::{Audience, FeedKind, Role, ViewerContext};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Invalid kind '{0}'. Allowed: General, System, DocumentUpload, RepositoryUpdate, SchedulerUpdate, ScheduleUpdate")]
    InvalidKind(String),

    #[error("Invalid audience '{0}'. Allowed: All, Students, Staff, ModuleStudents")]
    InvalidAudience(String),

    #[error("Only admins can post System items")]
    AdminOnlyKind,

    #[error("A module must be selected for this post")]
    ModuleRequired,

    #[error("You are not assigned as lecturer for module {0}")]
    NotAssignedToModule(i64),
}

impl PolicyError {
    /// Malformed input, as opposed to an authorization failure.
    pub fn is_client_input(&self) -> bool {
        matches!(self, PolicyError::InvalidKind(_) | PolicyError::InvalidAudience(_))
    }
}

/// The requested targeting, exactly as the caller sent it.
#[derive(Debug, Clone, Copy)]
pub struct AudienceRequest<'a> {
    pub kind: &'a str,
    pub audience: Option<&'a str>,
    pub module_id: Option<i64>,
}

/// The targeting the item is stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub kind: FeedKind,
    pub audience: Audience,
    pub module_id: Option<i64>,
}

pub fn resolve_audience(
    creator: &ViewerContext,
    request: AudienceRequest<'_>,
) -> Result<Resolution, PolicyError> {
    let kind = FeedKind::parse(request.kind)
        .ok_or_else(|| PolicyError::InvalidKind(request.kind.to_string()))?;

    let mut audience = match request.audience.map(str::trim).filter(|a| !a.is_empty()) {
        Some(requested) => Audience::parse(requested)
            .ok_or_else(|| PolicyError::InvalidAudience(requested.to_string()))?,
        None => Audience::All,
    };

    let roles = creator.roles;
    let module_id = request.module_id;

    if kind == FeedKind::System && !roles.is_admin() {
        return Err(PolicyError::AdminOnlyKind);
    }

    if kind == FeedKind::DocumentUpload && module_id.is_some() {
        audience = Audience::ModuleStudents;
    }

    if roles.contains(Role::Lecturer) && !roles.has_elevated_rights() {
        let module_id = module_id.ok_or(PolicyError::ModuleRequired)?;
        if !creator.lectures(module_id) {
            return Err(PolicyError::NotAssignedToModule(module_id));
        }
        audience = Audience::ModuleStudents;
    }

    if audience == Audience::ModuleStudents && module_id.is_none() {
        return Err(PolicyError::ModuleRequired);
    }

    Ok(Resolution { kind, audience, module_id })
}
