use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::calendar::{PublicHoliday, WorkingTime};
use super::domain::{
    Account, ApplicationId, Comment, DateRange, LeaveApplication, Person, PersonId,
};

/// Storage for persons; ids are handed out by the store.
pub trait PersonRepository: Send + Sync {
    fn next_person_id(&self) -> Result<PersonId, RepositoryError>;
    fn save_person(&self, person: Person) -> Result<Person, RepositoryError>;
    fn fetch_person(&self, id: &PersonId) -> Result<Option<Person>, RepositoryError>;
    fn fetch_person_by_login(&self, login: &str) -> Result<Option<Person>, RepositoryError>;
    fn all_persons(&self) -> Result<Vec<Person>, RepositoryError>;
}

/// Storage for yearly holidays accounts, keyed by (year, person).
pub trait AccountRepository: Send + Sync {
    fn save_account(&self, account: Account) -> Result<(), RepositoryError>;
    fn fetch_account(
        &self,
        year: i32,
        person: &PersonId,
    ) -> Result<Option<Account>, RepositoryError>;
}

pub trait ApplicationRepository: Send + Sync {
    fn next_application_id(&self) -> Result<ApplicationId, RepositoryError>;
    fn insert(&self, application: LeaveApplication) -> Result<LeaveApplication, RepositoryError>;
    fn update(&self, application: LeaveApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError>;
    fn for_person(&self, person: &PersonId) -> Result<Vec<LeaveApplication>, RepositoryError>;
    /// Applications of any person sharing at least one day with `period`.
    fn in_period(&self, period: &DateRange) -> Result<Vec<LeaveApplication>, RepositoryError>;
}

/// Append-only comment log.
pub trait CommentRepository: Send + Sync {
    fn append(&self, comment: Comment) -> Result<(), RepositoryError>;
    fn for_application(&self, id: &ApplicationId) -> Result<Vec<Comment>, RepositoryError>;
}

/// Working times and public holidays feeding the day count.
pub trait CalendarRepository: Send + Sync {
    fn working_times(&self, person: &PersonId) -> Result<Vec<WorkingTime>, RepositoryError>;
    fn public_holidays(&self, period: &DateRange) -> Result<Vec<PublicHoliday>, RepositoryError>;
}

/// Everything the application service reads and writes.
pub trait LeaveStore:
    PersonRepository
    + AccountRepository
    + ApplicationRepository
    + CommentRepository
    + CalendarRepository
{
}

impl<T> LeaveStore for T where
    T: PersonRepository
        + AccountRepository
        + ApplicationRepository
        + CommentRepository
        + CalendarRepository
{
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (mail adapters live outside this crate).
pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// Confirmation to the person the application was filed for.
    Applied,
    /// Notice to bosses that a decision is pending.
    NewApplication,
    Allowed,
    Rejected,
    Cancelled,
    Remind,
    Refer,
    KeyGenerationError,
}

impl NotificationTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationTemplate::Applied => "applied",
            NotificationTemplate::NewApplication => "new_application",
            NotificationTemplate::Allowed => "allowed",
            NotificationTemplate::Rejected => "rejected",
            NotificationTemplate::Cancelled => "cancelled",
            NotificationTemplate::Remind => "remind",
            NotificationTemplate::Refer => "refer",
            NotificationTemplate::KeyGenerationError => "key_generation_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub recipients: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(template: NotificationTemplate, recipients: Vec<PersonId>) -> Self {
        Self {
            template,
            recipients,
            application_id: None,
            details: BTreeMap::new(),
        }
    }

    pub fn for_application(mut self, id: &ApplicationId) -> Self {
        self.application_id = Some(id.clone());
        self
    }

    pub fn detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
