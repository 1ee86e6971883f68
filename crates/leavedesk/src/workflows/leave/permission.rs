use std::collections::BTreeSet;

use super::domain::{ApplicationStatus, LeaveApplication, Person, PersonId, Role};

/// The authenticated person performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub person: PersonId,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(person: PersonId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            person,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_active(&self) -> bool {
        !self.has_role(Role::Inactive)
    }

    pub fn is_boss(&self) -> bool {
        self.has_role(Role::Boss)
    }

    pub fn is_office(&self) -> bool {
        self.has_role(Role::Office)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is(&self, person: &PersonId) -> bool {
        &self.person == person
    }
}

impl From<&Person> for Actor {
    fn from(person: &Person) -> Self {
        Self {
            person: person.id.clone(),
            roles: person.roles.clone(),
        }
    }
}

/// Operations that need a role check.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    Apply { on_behalf_of: &'a PersonId },
    Allow,
    Reject,
    Cancel { application: &'a LeaveApplication },
    Refer,
    Remind { application: &'a LeaveApplication },
    View { owner: &'a PersonId },
    ViewAccount { owner: &'a PersonId },
    ListApplications,
    ViewStatistics,
    ManagePersons,
    ManageAccounts,
}

impl Action<'_> {
    pub const fn label(&self) -> &'static str {
        match self {
            Action::Apply { .. } => "apply",
            Action::Allow => "allow",
            Action::Reject => "reject",
            Action::Cancel { .. } => "cancel",
            Action::Refer => "refer",
            Action::Remind { .. } => "remind",
            Action::View { .. } => "view",
            Action::ViewAccount { .. } => "view_account",
            Action::ListApplications => "list_applications",
            Action::ViewStatistics => "view_statistics",
            Action::ManagePersons => "manage_persons",
            Action::ManageAccounts => "manage_accounts",
        }
    }
}

/// Whether the comment accompanying an authorized action may be left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRequirement {
    Optional,
    Mandatory,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{actor} is not allowed to {action}")]
pub struct PermissionDenied {
    pub actor: PersonId,
    pub action: &'static str,
}

/// Checks `action` against the actor's roles and reports the comment rule that applies.
///
/// Inactive actors are refused everything. Rejecting requires a comment, and so does a
/// cancellation the office performs for someone else.
pub fn authorize(actor: &Actor, action: Action<'_>) -> Result<CommentRequirement, PermissionDenied> {
    let denied = || PermissionDenied {
        actor: actor.person.clone(),
        action: action.label(),
    };

    if !actor.is_active() {
        return Err(denied());
    }

    let granted = match action {
        Action::Apply { on_behalf_of } => {
            (actor.is(on_behalf_of) || actor.is_office()).then_some(CommentRequirement::Optional)
        }
        Action::Allow | Action::Refer => actor.is_boss().then_some(CommentRequirement::Optional),
        Action::Reject => actor.is_boss().then_some(CommentRequirement::Mandatory),
        Action::Cancel { application } => {
            if actor.is(&application.person)
                && application.has_status(ApplicationStatus::Waiting)
            {
                Some(CommentRequirement::Optional)
            } else if actor.is_office() {
                Some(CommentRequirement::Mandatory)
            } else {
                None
            }
        }
        Action::Remind { application } => (actor.is(&application.person)
            || actor.is(&application.applier))
        .then_some(CommentRequirement::Optional),
        Action::View { owner } | Action::ViewAccount { owner } => {
            (actor.is(owner) || actor.is_boss() || actor.is_office())
                .then_some(CommentRequirement::Optional)
        }
        Action::ListApplications => {
            (actor.is_boss() || actor.is_office()).then_some(CommentRequirement::Optional)
        }
        Action::ViewStatistics | Action::ManageAccounts => {
            actor.is_office().then_some(CommentRequirement::Optional)
        }
        Action::ManagePersons => {
            (actor.is_admin() || actor.is_office()).then_some(CommentRequirement::Optional)
        }
    };

    granted.ok_or_else(denied)
}
