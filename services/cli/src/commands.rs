use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use clap::Args;
use leavedesk::config::AppConfig;
use leavedesk::error::AppError;
use leavedesk::workflows::leave::{
    authorize, AccountSetup, Action, Actor, ApplicationForm, ApplicationId, ApplicationStatus,
    Clock, DayLength, Ed25519KeyGenerator, InMemoryLeaveStore, LeaveApplicationService,
    NewPerson, Person, PersonDirectory, PersonId, PersonStatistics, PublicHoliday, Role,
    SystemClock, VacationType, WorkingTime,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::infra::{
    load_ledger, parse_date, parse_day_length, parse_decimal, parse_role, parse_status,
    parse_vacation_type, parse_week, save_ledger, LoggingNotifier,
};

#[derive(Args, Debug)]
pub(crate) struct ActorArgs {
    /// Login of the person performing the command
    #[arg(id = "actor", long = "as", value_name = "LOGIN")]
    pub(crate) login: String,
}

#[derive(Args, Debug)]
pub(crate) struct SignInArgs {
    /// Login delivered by the identity provider
    #[arg(long)]
    pub(crate) login: String,
    /// Display name (defaults to the login)
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) email: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct RolesArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    /// Login of the person whose roles are replaced
    #[arg(long)]
    pub(crate) login: String,
    /// Role to grant; repeat for several (user, boss, office, admin, inactive)
    #[arg(long = "role", required = true, value_parser = parse_role)]
    pub(crate) roles: Vec<Role>,
}

#[derive(Args, Debug)]
pub(crate) struct PersonArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    pub(crate) login: String,
}

#[derive(Args, Debug)]
pub(crate) struct AccountSetupArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    #[arg(long)]
    pub(crate) login: String,
    #[arg(long)]
    pub(crate) year: i32,
    /// Yearly entitlement in a full year
    #[arg(long, value_parser = parse_decimal)]
    pub(crate) annual: Decimal,
    /// Entitlement for this year (defaults to the annual figure)
    #[arg(long, value_parser = parse_decimal)]
    pub(crate) days: Option<Decimal>,
    /// Days carried over from the previous year
    #[arg(long, default_value = "0", value_parser = parse_decimal)]
    pub(crate) remaining: Decimal,
    /// Keep carried-over days usable after the cut-off date
    #[arg(long)]
    pub(crate) keep_remaining: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RolloverArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    #[arg(long)]
    pub(crate) login: String,
    /// Year to open
    #[arg(long)]
    pub(crate) year: i32,
}

#[derive(Args, Debug)]
pub(crate) struct YearArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    /// Login of the account owner (defaults to the acting person)
    #[arg(long)]
    pub(crate) login: Option<String>,
    /// Account year (defaults to the current year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
}

#[derive(Args, Debug)]
pub(crate) struct WorkingTimeArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    #[arg(long)]
    pub(crate) login: String,
    /// First day the pattern applies (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) from: NaiveDate,
    /// Day lengths Monday to Sunday, e.g. full,full,full,full,morning,zero,zero
    #[arg(long, value_parser = parse_week)]
    pub(crate) week: Option<[DayLength; 7]>,
}

#[derive(Args, Debug)]
pub(crate) struct HolidayArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: NaiveDate,
    #[arg(long)]
    pub(crate) name: String,
    /// Portion of the day that is off (full, morning or noon)
    #[arg(long, default_value = "full", value_parser = parse_day_length)]
    pub(crate) day_length: DayLength,
}

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    /// Apply on behalf of this login (office only)
    #[arg(long)]
    pub(crate) person: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: NaiveDate,
    /// full, morning or noon
    #[arg(long, default_value = "full", value_parser = parse_day_length)]
    pub(crate) day_length: DayLength,
    /// holiday, special_leave, unpaid_leave or overtime
    #[arg(long = "type", default_value = "holiday", value_parser = parse_vacation_type)]
    pub(crate) vacation_type: VacationType,
    #[arg(long)]
    pub(crate) reason: Option<String>,
    #[arg(long)]
    pub(crate) comment: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DecisionArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    /// Application id
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) comment: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ReferArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    /// Application id
    pub(crate) id: String,
    /// Login of the boss receiving the application
    #[arg(long)]
    pub(crate) to: String,
}

#[derive(Args, Debug)]
pub(crate) struct ShowArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    /// Application id
    pub(crate) id: String,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    /// Defaults to the current year
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// waiting, allowed, rejected or cancelled (formerly allowed only)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<ApplicationStatus>,
    /// Write CSV instead of JSON
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug)]
pub(crate) struct StatisticsArgs {
    #[command(flatten)]
    pub(crate) actor: ActorArgs,
    #[arg(long, value_parser = parse_date)]
    pub(crate) from: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    pub(crate) to: NaiveDate,
    /// Write CSV instead of JSON
    #[arg(long)]
    pub(crate) csv: bool,
}

/// Person without key material, for printing.
#[derive(Debug, Serialize)]
struct PersonView<'a> {
    id: &'a PersonId,
    login: &'a str,
    name: &'a str,
    roles: Vec<&'static str>,
    has_keys: bool,
}

impl<'a> From<&'a Person> for PersonView<'a> {
    fn from(person: &'a Person) -> Self {
        Self {
            id: &person.id,
            login: &person.login,
            name: &person.name,
            roles: person.roles.iter().map(|role| role.label()).collect(),
            has_keys: person.keys.is_some(),
        }
    }
}

/// Flat statistics record; empty `left_vacation_days` when the year has no account.
#[derive(Debug, Serialize)]
struct StatisticsRow {
    login: String,
    name: String,
    waiting_days: Decimal,
    allowed_days: Decimal,
    left_vacation_days: Option<Decimal>,
}

impl From<PersonStatistics> for StatisticsRow {
    fn from(statistics: PersonStatistics) -> Self {
        Self {
            login: statistics.login,
            name: statistics.name,
            waiting_days: statistics.waiting_days,
            allowed_days: statistics.allowed_days,
            left_vacation_days: statistics.left_vacation_days,
        }
    }
}

/// A ledger file opened for one command; mutations are written back before returning.
pub(crate) struct Workspace {
    path: PathBuf,
    store: Arc<InMemoryLeaveStore>,
    service: LeaveApplicationService<InMemoryLeaveStore, LoggingNotifier>,
    directory: PersonDirectory<InMemoryLeaveStore, LoggingNotifier>,
}

impl Workspace {
    pub(crate) fn open(path: PathBuf, config: &AppConfig) -> Result<Self, AppError> {
        let ledger = load_ledger(&path)?;
        debug!(
            path = %path.display(),
            persons = ledger.persons.len(),
            applications = ledger.applications.len(),
            "ledger loaded"
        );

        let store = Arc::new(InMemoryLeaveStore::from_ledger(ledger));
        let notifier = Arc::new(LoggingNotifier::default());
        let service = LeaveApplicationService::new(
            store.clone(),
            notifier.clone(),
            Arc::new(SystemClock),
            config.leave.clone(),
        );
        let directory =
            PersonDirectory::new(store.clone(), notifier, Arc::new(Ed25519KeyGenerator));

        Ok(Self {
            path,
            store,
            service,
            directory,
        })
    }

    pub(crate) fn sign_in(self, args: SignInArgs) -> Result<(), AppError> {
        let SignInArgs { login, name, email } = args;
        let person = self.directory.sign_in(NewPerson {
            name: name.unwrap_or_else(|| login.clone()),
            login,
            email,
        })?;
        self.persist()?;
        print_json(&PersonView::from(&person))
    }

    pub(crate) fn update_roles(self, args: RolesArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let target = self.person_id(&args.login)?;
        let roles: BTreeSet<Role> = args.roles.into_iter().collect();
        let person = self.directory.update_roles(&actor, &target, roles)?;
        self.persist()?;
        print_json(&PersonView::from(&person))
    }

    pub(crate) fn deactivate(self, args: PersonArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let target = self.person_id(&args.login)?;
        let person = self.directory.deactivate(&actor, &target)?;
        self.persist()?;
        print_json(&PersonView::from(&person))
    }

    pub(crate) fn setup_account(self, args: AccountSetupArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let person = self.person_id(&args.login)?;
        let account = self.service.ledger().setup_account(
            &actor,
            &person,
            args.year,
            AccountSetup {
                annual_vacation_days: args.annual,
                vacation_days: args.days.unwrap_or(args.annual),
                remaining_vacation_days: args.remaining,
                remaining_vacation_days_expire: !args.keep_remaining,
            },
        )?;
        self.persist()?;
        print_json(&account)
    }

    pub(crate) fn rollover(self, args: RolloverArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let person = self.person_id(&args.login)?;
        let account = self.service.ledger().rollover(&actor, &person, args.year)?;
        self.persist()?;
        print_json(&account)
    }

    pub(crate) fn balance(self, args: YearArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let person = match args.login {
            Some(login) => self.person_id(&login)?,
            None => actor.person.clone(),
        };
        let year = args.year.unwrap_or_else(current_year);
        let balance = self.service.account_summary(&actor, &person, year)?;
        print_json(&balance)
    }

    pub(crate) fn working_time(self, args: WorkingTimeArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        authorize(&actor, Action::ManageAccounts)?;
        let person = self.person_id(&args.login)?;

        let mut working_time = WorkingTime::standard(person, args.from);
        if let Some(week) = args.week {
            working_time.weekdays = week;
        }
        self.store.add_working_time(working_time.clone())?;
        self.persist()?;
        print_json(&working_time)
    }

    pub(crate) fn public_holiday(self, args: HolidayArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        authorize(&actor, Action::ManageAccounts)?;

        let holiday = PublicHoliday {
            date: args.date,
            day_length: args.day_length,
            name: args.name,
        };
        self.store.add_public_holiday(holiday.clone())?;
        self.persist()?;
        print_json(&holiday)
    }

    pub(crate) fn apply(self, args: ApplyArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let person = match args.person.as_deref() {
            Some(login) => self.person_id(login)?,
            None => actor.person.clone(),
        };
        let application = self.service.apply(
            &actor,
            ApplicationForm {
                person,
                start: args.start,
                end: args.end,
                day_length: args.day_length,
                vacation_type: args.vacation_type,
                reason: args.reason,
                comment: args.comment,
            },
        )?;
        self.persist()?;
        print_json(&application.status_view())
    }

    pub(crate) fn allow(self, args: DecisionArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let application =
            self.service
                .allow(&actor, &ApplicationId(args.id), args.comment.as_deref())?;
        self.persist()?;
        print_json(&application.status_view())
    }

    pub(crate) fn reject(self, args: DecisionArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let application =
            self.service
                .reject(&actor, &ApplicationId(args.id), args.comment.as_deref())?;
        self.persist()?;
        print_json(&application.status_view())
    }

    pub(crate) fn cancel(self, args: DecisionArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let application =
            self.service
                .cancel(&actor, &ApplicationId(args.id), args.comment.as_deref())?;
        self.persist()?;
        print_json(&application.status_view())
    }

    pub(crate) fn refer(self, args: ReferArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let id = ApplicationId(args.id);
        self.service.refer(&actor, &id, &args.to)?;
        self.persist()?;
        println!("{id} referred to {}", args.to);
        Ok(())
    }

    pub(crate) fn remind(self, args: ShowArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let application = self.service.remind(&actor, &ApplicationId(args.id))?;
        self.persist()?;
        print_json(&application.status_view())
    }

    pub(crate) fn show(self, args: ShowArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let detail = self.service.detail(&actor, &ApplicationId(args.id))?;
        print_json(&detail)
    }

    pub(crate) fn list(self, args: ListArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let year = args.year.unwrap_or_else(current_year);
        let views: Vec<_> = self
            .service
            .list(&actor, year, args.status)?
            .iter()
            .map(|application| application.status_view())
            .collect();

        if args.csv {
            write_csv(views)
        } else {
            print_json(&views)
        }
    }

    pub(crate) fn statistics(self, args: StatisticsArgs) -> Result<(), AppError> {
        let actor = self.actor(&args.actor.login)?;
        let rows: Vec<StatisticsRow> = self
            .service
            .statistics(&actor, args.from, args.to)?
            .into_iter()
            .map(StatisticsRow::from)
            .collect();

        if args.csv {
            write_csv(rows)
        } else {
            print_json(&rows)
        }
    }

    fn actor(&self, login: &str) -> Result<Actor, AppError> {
        let person = self
            .directory
            .by_login(login)?
            .ok_or_else(|| AppError::UnknownLogin(login.to_string()))?;
        Ok(Actor::from(&person))
    }

    fn person_id(&self, login: &str) -> Result<PersonId, AppError> {
        self.actor(login).map(|actor| actor.person)
    }

    fn persist(&self) -> Result<(), AppError> {
        save_ledger(&self.path, &self.store.snapshot()?)
    }
}

fn current_year() -> i32 {
    SystemClock.today().year()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for row in rows {
        writer.serialize(row).map_err(io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavedesk::config::{AppEnvironment, LedgerConfig, LogFormat, TelemetryConfig};
    use leavedesk::workflows::leave::LeavePolicy;

    fn config(path: &std::path::Path) -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            telemetry: TelemetryConfig {
                log_level: "warn".to_string(),
                log_format: LogFormat::Compact,
            },
            ledger: LedgerConfig {
                path: path.to_path_buf(),
            },
            leave: LeavePolicy::default(),
        }
    }

    fn actor(login: &str) -> ActorArgs {
        ActorArgs {
            login: login.to_string(),
        }
    }

    #[test]
    fn commands_share_state_through_the_ledger_file() {
        let path = std::env::temp_dir().join(format!(
            "leavedesk-cli-workspace-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let config = config(&path);
        let open = || Workspace::open(path.clone(), &config).expect("ledger opens");

        for login in ["olga", "ursula"] {
            open()
                .sign_in(SignInArgs {
                    login: login.to_string(),
                    name: None,
                    email: None,
                })
                .expect("sign-in succeeds");
        }

        open()
            .setup_account(AccountSetupArgs {
                actor: actor("olga"),
                login: "ursula".to_string(),
                year: 2026,
                annual: Decimal::from(30),
                days: None,
                remaining: Decimal::ZERO,
                keep_remaining: false,
            })
            .expect("office opens the account");

        match open().setup_account(AccountSetupArgs {
            actor: actor("ursula"),
            login: "ursula".to_string(),
            year: 2027,
            annual: Decimal::from(99),
            days: None,
            remaining: Decimal::ZERO,
            keep_remaining: false,
        }) {
            Err(err) => assert_eq!(err.exit_code(), 2),
            Ok(()) => panic!("a plain user must not set up accounts"),
        }

        match open().apply(ApplyArgs {
            actor: actor("nobody"),
            person: None,
            start: NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2026, 6, 5).expect("valid date"),
            day_length: DayLength::Full,
            vacation_type: VacationType::Holiday,
            reason: None,
            comment: None,
        }) {
            Err(AppError::UnknownLogin(login)) => assert_eq!(login, "nobody"),
            other => panic!("expected unknown login, got {other:?}"),
        }

        let ledger = load_ledger(&path).expect("ledger readable");
        assert_eq!(ledger.persons.len(), 2);
        assert_eq!(ledger.accounts.len(), 1);
        assert!(ledger
            .persons
            .iter()
            .any(|person| person.login == "olga" && person.has_role(Role::Office)));

        let _ = std::fs::remove_file(&path);
    }
}
