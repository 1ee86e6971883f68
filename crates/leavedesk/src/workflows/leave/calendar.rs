//! Working-day arithmetic: which part of each calendar day counts as a vacation day.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{DateRange, DayLength, PersonId};
use super::repository::{CalendarRepository, RepositoryError};

/// Weekly working pattern of a person, effective from `valid_from` until superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTime {
    pub person: PersonId,
    pub valid_from: NaiveDate,
    /// Indexed Monday..Sunday.
    pub weekdays: [DayLength; 7],
}

impl WorkingTime {
    /// Monday to Friday, full days.
    pub fn standard(person: PersonId, valid_from: NaiveDate) -> Self {
        use DayLength::{Full, Zero};
        Self {
            person,
            valid_from,
            weekdays: [Full, Full, Full, Full, Full, Zero, Zero],
        }
    }

    pub fn day_length(&self, weekday: Weekday) -> DayLength {
        self.weekdays[weekday.num_days_from_monday() as usize]
    }
}

/// A public holiday; `day_length` is the portion of the day that is off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    pub date: NaiveDate,
    pub day_length: DayLength,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("no valid working time found for {person} on {date}")]
    NoValidWorkingTime { person: PersonId, date: NaiveDate },
}

/// Working times of one person plus the public holidays of the period in question.
#[derive(Debug, Clone)]
pub struct WorkCalendar {
    person: PersonId,
    working_times: Vec<WorkingTime>,
    holidays: BTreeMap<NaiveDate, DayLength>,
}

impl WorkCalendar {
    pub fn new(
        person: PersonId,
        working_times: Vec<WorkingTime>,
        holidays: impl IntoIterator<Item = PublicHoliday>,
    ) -> Self {
        let mut working_times: Vec<WorkingTime> = working_times
            .into_iter()
            .filter(|working_time| working_time.person == person)
            .collect();
        working_times.sort_by_key(|working_time| working_time.valid_from);

        let holidays = holidays
            .into_iter()
            .map(|holiday| (holiday.date, holiday.day_length))
            .collect();

        Self {
            person,
            working_times,
            holidays,
        }
    }

    /// Loads the person's working times and the public holidays of `years`, padded by a
    /// year on each side so applications crossing New Year can be split.
    pub fn load<C>(
        store: &C,
        person: &PersonId,
        years: std::ops::RangeInclusive<i32>,
    ) -> Result<Self, RepositoryError>
    where
        C: CalendarRepository + ?Sized,
    {
        let working_times = store.working_times(person)?;
        let span = DateRange::year(years.start().saturating_sub(1))
            .zip(DateRange::year(years.end().saturating_add(1)))
            .map(|(first, last)| DateRange {
                start: first.start,
                end: last.end,
            });
        let holidays = match span {
            Some(span) => store.public_holidays(&span)?,
            None => Vec::new(),
        };

        Ok(Self::new(person.clone(), working_times, holidays))
    }

    /// The most recent working time that is already in force on `date`.
    pub fn working_time_on(&self, date: NaiveDate) -> Option<&WorkingTime> {
        self.working_times
            .iter()
            .rev()
            .find(|working_time| working_time.valid_from <= date)
    }

    /// Vacation days needed to be absent for `period`.
    ///
    /// Each date contributes the worked fraction of its weekday, reduced by any public
    /// holiday on that date and scaled by the requested day length.
    pub fn vacation_days(
        &self,
        period: &DateRange,
        day_length: DayLength,
    ) -> Result<Decimal, CalendarError> {
        let mut total = Decimal::ZERO;

        for date in period.dates() {
            let working_time =
                self.working_time_on(date)
                    .ok_or_else(|| CalendarError::NoValidWorkingTime {
                        person: self.person.clone(),
                        date,
                    })?;

            let worked = working_time.day_length(date.weekday()).fraction();
            let off = self
                .holidays
                .get(&date)
                .map(|holiday| holiday.fraction())
                .unwrap_or(Decimal::ZERO);

            total += worked * (Decimal::ONE - off);
        }

        Ok(total * day_length.fraction())
    }
}
