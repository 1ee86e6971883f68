//! Mutex-guarded store backing the command line and integration tests.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::calendar::{PublicHoliday, WorkingTime};
use super::domain::{
    Account, ApplicationId, Comment, DateRange, LeaveApplication, Person, PersonId,
};
use super::repository::{
    AccountRepository, ApplicationRepository, CalendarRepository, CommentRepository,
    PersonRepository, RepositoryError,
};

/// Serializable contents of a leave ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveLedger {
    /// Last id handed out for persons and applications.
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub applications: Vec<LeaveApplication>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub working_times: Vec<WorkingTime>,
    #[serde(default)]
    pub public_holidays: Vec<PublicHoliday>,
}

#[derive(Debug, Default)]
pub struct InMemoryLeaveStore {
    ledger: Mutex<LeaveLedger>,
}

impl InMemoryLeaveStore {
    pub fn from_ledger(ledger: LeaveLedger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }

    pub fn snapshot(&self) -> Result<LeaveLedger, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    pub fn add_working_time(&self, working_time: WorkingTime) -> Result<(), RepositoryError> {
        self.lock()?.working_times.push(working_time);
        Ok(())
    }

    pub fn add_public_holiday(&self, holiday: PublicHoliday) -> Result<(), RepositoryError> {
        let mut ledger = self.lock()?;
        ledger.public_holidays.retain(|known| known.date != holiday.date);
        ledger.public_holidays.push(holiday);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LeaveLedger>, RepositoryError> {
        self.ledger
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ledger lock poisoned".to_string()))
    }

    fn next_sequence(&self) -> Result<u64, RepositoryError> {
        let mut ledger = self.lock()?;
        ledger.sequence += 1;
        Ok(ledger.sequence)
    }
}

impl PersonRepository for InMemoryLeaveStore {
    fn next_person_id(&self) -> Result<PersonId, RepositoryError> {
        Ok(PersonId(format!("person-{:06}", self.next_sequence()?)))
    }

    fn save_person(&self, person: Person) -> Result<Person, RepositoryError> {
        let mut ledger = self.lock()?;
        match ledger.persons.iter_mut().find(|known| known.id == person.id) {
            Some(slot) => *slot = person.clone(),
            None => ledger.persons.push(person.clone()),
        }
        Ok(person)
    }

    fn fetch_person(&self, id: &PersonId) -> Result<Option<Person>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger.persons.iter().find(|person| &person.id == id).cloned())
    }

    fn fetch_person_by_login(&self, login: &str) -> Result<Option<Person>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .persons
            .iter()
            .find(|person| person.login == login)
            .cloned())
    }

    fn all_persons(&self) -> Result<Vec<Person>, RepositoryError> {
        Ok(self.lock()?.persons.clone())
    }
}

impl AccountRepository for InMemoryLeaveStore {
    fn save_account(&self, account: Account) -> Result<(), RepositoryError> {
        let mut ledger = self.lock()?;
        match ledger
            .accounts
            .iter_mut()
            .find(|known| known.year == account.year && known.person == account.person)
        {
            Some(slot) => *slot = account,
            None => ledger.accounts.push(account),
        }
        Ok(())
    }

    fn fetch_account(
        &self,
        year: i32,
        person: &PersonId,
    ) -> Result<Option<Account>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .accounts
            .iter()
            .find(|account| account.year == year && &account.person == person)
            .cloned())
    }
}

impl ApplicationRepository for InMemoryLeaveStore {
    fn next_application_id(&self) -> Result<ApplicationId, RepositoryError> {
        Ok(ApplicationId(format!("leave-{:06}", self.next_sequence()?)))
    }

    fn insert(&self, application: LeaveApplication) -> Result<LeaveApplication, RepositoryError> {
        let mut ledger = self.lock()?;
        if ledger
            .applications
            .iter()
            .any(|known| known.id == application.id)
        {
            return Err(RepositoryError::Conflict);
        }
        ledger.applications.push(application.clone());
        Ok(application)
    }

    fn update(&self, application: LeaveApplication) -> Result<(), RepositoryError> {
        let mut ledger = self.lock()?;
        let slot = ledger
            .applications
            .iter_mut()
            .find(|known| known.id == application.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = application;
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .applications
            .iter()
            .find(|application| &application.id == id)
            .cloned())
    }

    fn for_person(&self, person: &PersonId) -> Result<Vec<LeaveApplication>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .applications
            .iter()
            .filter(|application| &application.person == person)
            .cloned()
            .collect())
    }

    fn in_period(&self, period: &DateRange) -> Result<Vec<LeaveApplication>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .applications
            .iter()
            .filter(|application| application.period.overlaps(period))
            .cloned()
            .collect())
    }
}

impl CommentRepository for InMemoryLeaveStore {
    fn append(&self, comment: Comment) -> Result<(), RepositoryError> {
        self.lock()?.comments.push(comment);
        Ok(())
    }

    fn for_application(&self, id: &ApplicationId) -> Result<Vec<Comment>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .comments
            .iter()
            .filter(|comment| &comment.application == id)
            .cloned()
            .collect())
    }
}

impl CalendarRepository for InMemoryLeaveStore {
    fn working_times(&self, person: &PersonId) -> Result<Vec<WorkingTime>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .working_times
            .iter()
            .filter(|working_time| &working_time.person == person)
            .cloned()
            .collect())
    }

    fn public_holidays(&self, period: &DateRange) -> Result<Vec<PublicHoliday>, RepositoryError> {
        let ledger = self.lock()?;
        Ok(ledger
            .public_holidays
            .iter()
            .filter(|holiday| period.contains(holiday.date))
            .cloned()
            .collect())
    }
}
