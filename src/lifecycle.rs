use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Account;

/// Role
///
/// The three-tier access model. `Lurker` is a freshly registered, read-only
/// account awaiting admin validation; `User` may create restaurants and reviews;
/// `Admin` owns account administration and may edit anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Lurker,
    User,
    Admin,
}

impl Role {
    /// Parses the stored/requested string form. Unknown values are rejected so a
    /// malformed request can never write an out-of-model role.
    pub fn parse(s: &str) -> Result<Self, LifecycleError> {
        match s {
            "lurker" => Ok(Role::Lurker),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(LifecycleError::InvalidRoleValue),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Lurker => "lurker",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Whether this role may author restaurants and reviews.
    pub fn may_contribute(&self) -> bool {
        matches!(self, Role::User | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LifecycleError
///
/// Guard violations of the account state machine. All are local validation
/// errors: a rejected transition leaves the account's role untouched, because
/// planning is pure and persistence only happens after a successful plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("invalid role value")]
    InvalidRoleValue,
    #[error("the default admin account cannot be modified")]
    ProtectedAccount,
    #[error("you cannot demote your own account")]
    SelfDemotionForbidden,
    #[error("you cannot delete your own account")]
    SelfDeletionForbidden,
    #[error("email confirmation is required to promote an administrator")]
    ConfirmationRequired,
    #[error("the confirmation email does not match")]
    ConfirmationMismatch,
}

/// ProtectedAccountPredicate
///
/// Capability deciding whether an account is shielded from demotion and
/// deletion. Injected into the lifecycle functions so the protection rule stays
/// centralized and independently testable instead of string comparisons
/// scattered across call sites.
pub trait ProtectedAccountPredicate: Send + Sync {
    fn is_protected(&self, account: &Account) -> bool;
}

/// SeedAdminGuard
///
/// The standard predicate: exactly one bootstrap administrator is identified by
/// a reserved email value and can never be demoted or deleted.
#[derive(Debug, Clone)]
pub struct SeedAdminGuard {
    reserved_email: String,
}

impl SeedAdminGuard {
    pub fn new(reserved_email: &str) -> Self {
        Self {
            reserved_email: reserved_email.to_lowercase(),
        }
    }
}

impl ProtectedAccountPredicate for SeedAdminGuard {
    fn is_protected(&self, account: &Account) -> bool {
        account.email.to_lowercase() == self.reserved_email
    }
}

/// RoleChange
///
/// A successfully planned transition: the role to persist plus the
/// direction-specific message to surface. Derived purely from (old, new).
#[derive(Debug, Clone, PartialEq)]
pub struct RoleChange {
    pub old_role: Role,
    pub new_role: Role,
    pub message: String,
}

/// transition_message
///
/// Human-readable summary of a transition's semantic direction: validation
/// (lurker to user), promotion into admin, demotion out of admin, or a generic
/// lateral change.
fn transition_message(name: &str, old_role: Role, new_role: Role) -> String {
    match (old_role, new_role) {
        (Role::Lurker, Role::User) => format!("{name} has been validated as a user"),
        (_, Role::Admin) => format!("{name} is now an administrator"),
        (Role::Admin, Role::User) => format!("{name} has been demoted to a standard user"),
        (old, new) => format!("Role of {name} changed from {old} to {new}"),
    }
}

/// plan_role_change
///
/// Validates a role transition requested by an admin actor against the target
/// account. Guards, in order:
/// - the requested role must parse;
/// - protected accounts are immutable;
/// - an actor may only change their own role to `admin` (a no-op) — anything
///   else is self-demotion;
/// - promoting a non-admin into admin requires a confirmation value equal to
///   the target's email, compared case-insensitively. This is deliberate
///   friction against one-click privilege escalation.
///
/// On success returns the change to persist; nothing is mutated here.
pub fn plan_role_change(
    actor_id: Uuid,
    target: &Account,
    requested_role: &str,
    email_confirmation: Option<&str>,
    guard: &dyn ProtectedAccountPredicate,
) -> Result<RoleChange, LifecycleError> {
    let new_role = Role::parse(requested_role)?;
    let old_role = Role::parse(&target.role)?;

    if guard.is_protected(target) {
        return Err(LifecycleError::ProtectedAccount);
    }

    if target.id == actor_id && new_role != Role::Admin {
        return Err(LifecycleError::SelfDemotionForbidden);
    }

    if new_role == Role::Admin && old_role != Role::Admin {
        let confirmation = email_confirmation
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(LifecycleError::ConfirmationRequired)?;

        if confirmation.to_lowercase() != target.email.to_lowercase() {
            return Err(LifecycleError::ConfirmationMismatch);
        }
    }

    Ok(RoleChange {
        old_role,
        new_role,
        message: transition_message(&target.name, old_role, new_role),
    })
}

/// authorize_account_deletion
///
/// Validates an admin-initiated account deletion: the seed admin is never
/// deletable and an actor cannot delete their own account.
pub fn authorize_account_deletion(
    actor_id: Uuid,
    target: &Account,
    guard: &dyn ProtectedAccountPredicate,
) -> Result<(), LifecycleError> {
    if guard.is_protected(target) {
        return Err(LifecycleError::ProtectedAccount);
    }
    if target.id == actor_id {
        return Err(LifecycleError::SelfDeletionForbidden);
    }
    Ok(())
}
