use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::workflows::leave::calendar::WorkingTime;
use crate::workflows::leave::clock::Clock;
use crate::workflows::leave::domain::{
    Account, ApplicationId, Comment, DayLength, LeaveApplication, MailNotification, Person,
    PersonId, Role, VacationType,
};
use crate::workflows::leave::keys::{KeyGenerationError, KeyPair, KeyPairGenerator};
use crate::workflows::leave::memory::InMemoryLeaveStore;
use crate::workflows::leave::permission::Actor;
use crate::workflows::leave::repository::{
    AccountRepository, ApplicationRepository, CommentRepository, Notification,
    NotificationError, NotificationTemplate, Notifier, PersonRepository,
};
use crate::workflows::leave::validation::ApplicationForm;
use crate::workflows::leave::{LeaveApplicationService, LeavePolicy};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Monday 4 May 2026.
pub(super) fn today() -> NaiveDate {
    date(2026, 5, 4)
}

pub(super) fn office_id() -> PersonId {
    PersonId("olga".to_string())
}

pub(super) fn boss_id() -> PersonId {
    PersonId("bert".to_string())
}

pub(super) fn user_id() -> PersonId {
    PersonId("ursula".to_string())
}

pub(super) fn person(
    login: &str,
    roles: &[Role],
    notifications: &[MailNotification],
) -> Person {
    Person {
        id: PersonId(login.to_string()),
        login: login.to_string(),
        name: login.to_uppercase(),
        email: Some(format!("{login}@example.org")),
        roles: roles.iter().copied().collect(),
        notifications: notifications.iter().copied().collect(),
        keys: None,
    }
}

pub(super) fn account(person: &PersonId, year: i32, vacation_days: i64) -> Account {
    Account {
        person: person.clone(),
        year,
        annual_vacation_days: Decimal::from(vacation_days),
        vacation_days: Decimal::from(vacation_days),
        remaining_vacation_days: Decimal::ZERO,
        remaining_vacation_days_expire: true,
    }
}

pub(super) fn actor(store: &MemoryStore, id: &PersonId) -> Actor {
    let person = store
        .fetch_person(id)
        .expect("fetch succeeds")
        .expect("person seeded");
    Actor::from(&person)
}

pub(super) fn holiday_form(person: &PersonId, start: NaiveDate, end: NaiveDate) -> ApplicationForm {
    ApplicationForm {
        person: person.clone(),
        start,
        end,
        day_length: DayLength::Full,
        vacation_type: VacationType::Holiday,
        reason: None,
        comment: None,
    }
}

/// Office, two bosses and a user, all on a Monday-to-Friday week with 30 days for 2026.
pub(super) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::default());
    let persons = [
        person("olga", &[Role::User, Role::Office], &[MailNotification::Office]),
        person("bert", &[Role::User, Role::Boss], &[MailNotification::Boss]),
        person("bianca", &[Role::User, Role::Boss], &[]),
        person("ursula", &[Role::User], &[]),
    ];

    for person in persons {
        store
            .add_working_time(WorkingTime::standard(person.id.clone(), date(2020, 1, 1)))
            .expect("working time saved");
        store
            .save_account(account(&person.id, 2026, 30))
            .expect("account saved");
        store.save_person(person).expect("person saved");
    }

    store
}

pub(super) fn build_service() -> (
    LeaveApplicationService<MemoryStore, MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
    Arc<SettableClock>,
) {
    let store = seeded_store();
    let notifier = Arc::new(MemoryNotifier::default());
    let clock = Arc::new(SettableClock::new(today()));
    let service = LeaveApplicationService::new(
        store.clone(),
        notifier.clone(),
        clock.clone(),
        LeavePolicy::default(),
    );
    (service, store, notifier, clock)
}

pub(super) type MemoryStore = InMemoryLeaveStore;

pub(super) trait StoreExt {
    fn stored(&self, id: &ApplicationId) -> LeaveApplication;
    fn comments_for(&self, id: &ApplicationId) -> Vec<Comment>;
    fn application_count(&self) -> usize;
}

impl StoreExt for MemoryStore {
    fn stored(&self, id: &ApplicationId) -> LeaveApplication {
        self.fetch(id)
            .expect("fetch succeeds")
            .expect("application stored")
    }

    fn comments_for(&self, id: &ApplicationId) -> Vec<Comment> {
        self.for_application(id).expect("comments readable")
    }

    fn application_count(&self) -> usize {
        self.snapshot().expect("snapshot").applications.len()
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn with_template(&self, template: NotificationTemplate) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|notification| notification.template == template)
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct OfflineNotifier;

impl Notifier for OfflineNotifier {
    fn send(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct FailingKeys;

impl KeyPairGenerator for FailingKeys {
    fn generate(&self) -> Result<KeyPair, KeyGenerationError> {
        Err(KeyGenerationError("entropy source unavailable".to_string()))
    }
}

pub(super) struct StaticKeys;

impl KeyPairGenerator for StaticKeys {
    fn generate(&self) -> Result<KeyPair, KeyGenerationError> {
        Ok(KeyPair {
            public_key: vec![1; 32],
            private_key: vec![2; 32],
        })
    }
}

pub(super) struct SettableClock {
    today: Mutex<NaiveDate>,
}

impl SettableClock {
    pub(super) fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub(super) fn set(&self, today: NaiveDate) {
        *self.today.lock().expect("clock mutex poisoned") = today;
    }
}

impl Clock for SettableClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn roles(roles: &[Role]) -> BTreeSet<Role> {
    roles.iter().copied().collect()
}
