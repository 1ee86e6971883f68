use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{MailNotification, Person, PersonId, Role};
use super::keys::{KeyPair, KeyPairGenerator};
use super::permission::{authorize, Action, Actor};
use super::repository::{
    Notification, NotificationTemplate, Notifier, PersonRepository, RepositoryError,
};
use super::service::LeaveServiceError;
use super::validation::Rejection;

/// Identity data of a person as delivered by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub login: String,
    pub name: String,
    pub email: Option<String>,
}

/// Lookups and administrative changes on persons.
pub struct PersonDirectory<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    keys: Arc<dyn KeyPairGenerator>,
}

impl<S, N> PersonDirectory<S, N>
where
    S: PersonRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, keys: Arc<dyn KeyPairGenerator>) -> Self {
        Self {
            store,
            notifier,
            keys,
        }
    }

    pub fn get(&self, id: &PersonId) -> Result<Person, LeaveServiceError> {
        let person = self
            .store
            .fetch_person(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(person)
    }

    pub fn by_login(&self, login: &str) -> Result<Option<Person>, LeaveServiceError> {
        Ok(self.store.fetch_person_by_login(login)?)
    }

    pub fn active(&self) -> Result<Vec<Person>, LeaveServiceError> {
        self.filtered(Person::is_active)
    }

    pub fn active_except(&self, id: &PersonId) -> Result<Vec<Person>, LeaveServiceError> {
        self.filtered(|person| person.is_active() && &person.id != id)
    }

    pub fn inactive(&self) -> Result<Vec<Person>, LeaveServiceError> {
        self.filtered(|person| !person.is_active())
    }

    /// Active persons holding `role`.
    pub fn with_role(&self, role: Role) -> Result<Vec<Person>, LeaveServiceError> {
        self.filtered(|person| person.is_active() && person.has_role(role))
    }

    /// Active persons subscribed to `notification`.
    pub fn with_notification(
        &self,
        notification: MailNotification,
    ) -> Result<Vec<Person>, LeaveServiceError> {
        self.filtered(|person| person.is_active() && person.has_notification(notification))
    }

    /// Resolves an authenticated login. Unknown logins become new users; the very first
    /// person of an empty directory is made office so someone can administer the rest.
    pub fn sign_in(&self, identity: NewPerson) -> Result<Person, LeaveServiceError> {
        if let Some(person) = self.store.fetch_person_by_login(&identity.login)? {
            if !person.is_active() {
                warn!(login = %person.login, "sign-in refused for inactive person");
                return Err(Rejection::InactivePerson(person.id).into());
            }
            debug!(login = %person.login, "known person signed in");
            return Ok(person);
        }

        let roles = if self.active()?.is_empty() {
            BTreeSet::from([Role::User, Role::Office])
        } else {
            BTreeSet::from([Role::User])
        };
        let person = self.register(identity, roles)?;
        info!(
            login = %person.login,
            person = %person.id,
            office = person.has_role(Role::Office),
            "person created at first sign-in"
        );
        Ok(person)
    }

    pub fn create_person(
        &self,
        actor: &Actor,
        identity: NewPerson,
        roles: BTreeSet<Role>,
    ) -> Result<Person, LeaveServiceError> {
        authorize(actor, Action::ManagePersons)?;
        if self.store.fetch_person_by_login(&identity.login)?.is_some() {
            return Err(Rejection::LoginTaken(identity.login).into());
        }

        let person = self.register(identity, roles)?;
        info!(
            login = %person.login,
            person = %person.id,
            created_by = %actor.person,
            "person created"
        );
        Ok(person)
    }

    pub fn update_roles(
        &self,
        actor: &Actor,
        id: &PersonId,
        roles: BTreeSet<Role>,
    ) -> Result<Person, LeaveServiceError> {
        authorize(actor, Action::ManagePersons)?;
        let mut person = self.get(id)?;
        person.roles = roles;
        let person = self.store.save_person(person)?;
        info!(
            person = %person.id,
            roles = ?person.roles.iter().map(|role| role.label()).collect::<Vec<_>>(),
            "roles updated"
        );
        Ok(person)
    }

    /// Persons are never removed; deactivation replaces all roles with INACTIVE.
    pub fn deactivate(&self, actor: &Actor, id: &PersonId) -> Result<Person, LeaveServiceError> {
        self.update_roles(actor, id, BTreeSet::from([Role::Inactive]))
    }

    /// Persons may change their own subscriptions; changing others' needs management rights.
    pub fn update_notifications(
        &self,
        actor: &Actor,
        id: &PersonId,
        notifications: BTreeSet<MailNotification>,
    ) -> Result<Person, LeaveServiceError> {
        if !actor.is(id) {
            authorize(actor, Action::ManagePersons)?;
        }
        let mut person = self.get(id)?;
        person.notifications = notifications;
        Ok(self.store.save_person(person)?)
    }

    fn filtered(&self, keep: impl Fn(&Person) -> bool) -> Result<Vec<Person>, LeaveServiceError> {
        let persons = self.store.all_persons()?;
        Ok(persons.into_iter().filter(|person| keep(person)).collect())
    }

    fn register(
        &self,
        identity: NewPerson,
        roles: BTreeSet<Role>,
    ) -> Result<Person, LeaveServiceError> {
        let keys = self.generate_keys(&identity.login);
        let key_failure = keys.is_none();

        let person = self.store.save_person(Person {
            id: self.store.next_person_id()?,
            login: identity.login,
            name: identity.name,
            email: identity.email,
            roles,
            notifications: BTreeSet::new(),
            keys,
        })?;

        if key_failure {
            let office = self
                .with_role(Role::Office)?
                .into_iter()
                .map(|person| person.id)
                .collect();
            let notification = Notification::new(NotificationTemplate::KeyGenerationError, office)
                .detail("login", person.login.clone());
            if let Err(err) = self.notifier.send(notification) {
                warn!(error = %err, login = %person.login, "key generation alert not delivered");
            }
        }

        Ok(person)
    }

    fn generate_keys(&self, login: &str) -> Option<KeyPair> {
        match self.keys.generate() {
            Ok(keys) => Some(keys),
            Err(err) => {
                warn!(error = %err, login, "key pair generation failed");
                None
            }
        }
    }
}
