use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use leavedesk::config::AppConfig;
use leavedesk::error::AppError;
use leavedesk::workflows::leave::{
    AccountSetup, Actor, ApplicationForm, DayLength, Ed25519KeyGenerator, FixedClock,
    InMemoryLeaveStore, LeaveApplicationService, NewPerson, PersonDirectory, Role, VacationType,
    WorkingTime,
};
use rust_decimal::Decimal;

use crate::infra::LoggingNotifier;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reference date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Annual vacation days granted to every demo person.
    #[arg(long, value_parser = crate::infra::parse_decimal)]
    pub(crate) vacation_days: Option<Decimal>,
}

struct DemoTeam {
    office: Actor,
    boss: Actor,
    employee: Actor,
}

pub(crate) fn run_demo(args: DemoArgs, config: &AppConfig) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let vacation_days = args.vacation_days.unwrap_or_else(|| Decimal::from(30));

    let store = Arc::new(InMemoryLeaveStore::default());
    let notifier = Arc::new(LoggingNotifier::default());
    let directory =
        PersonDirectory::new(store.clone(), notifier.clone(), Arc::new(Ed25519KeyGenerator));
    let service = LeaveApplicationService::new(
        store.clone(),
        notifier.clone(),
        Arc::new(FixedClock(today)),
        config.leave.clone(),
    );

    println!("Leave workflow demo (reference date {today})");
    let team = sign_in_team(&directory)?;
    println!(
        "- Signed in office {}, boss {} and employee {}",
        team.office.person, team.boss.person, team.employee.person
    );

    // Monday two weeks ahead, through Friday
    let start = today + Duration::days(14 - i64::from(today.weekday().num_days_from_monday()));
    let end = start + Duration::days(4);

    for actor in [&team.office, &team.boss, &team.employee] {
        store.add_working_time(WorkingTime::standard(actor.person.clone(), today))?;
        for year in BTreeSet::from([start.year(), end.year()]) {
            service.ledger().setup_account(
                &team.office,
                &actor.person,
                year,
                AccountSetup {
                    annual_vacation_days: vacation_days,
                    vacation_days,
                    remaining_vacation_days: Decimal::ZERO,
                    remaining_vacation_days_expire: true,
                },
            )?;
        }
    }
    println!("- Opened accounts with {vacation_days} days for {}", start.year());

    let form = |start: NaiveDate, end: NaiveDate| ApplicationForm {
        person: team.employee.person.clone(),
        start,
        end,
        day_length: DayLength::Full,
        vacation_type: VacationType::Holiday,
        reason: Some("summer trip".to_string()),
        comment: None,
    };

    let application = service.apply(&team.employee, form(start, end))?;
    println!(
        "\nApplication {} for {}: {} days -> {}",
        application.id,
        application.period,
        application.days,
        application.status.label()
    );

    let application = service.allow(&team.boss, &application.id, Some("enjoy"))?;
    println!("- Boss decision -> {}", application.status.label());

    let balance = service.account_summary(&team.employee, &team.employee.person, start.year())?;
    println!(
        "- Left vacation days {}: {} (carry-over left {})",
        balance.year, balance.left_vacation_days, balance.left_remaining_vacation_days
    );

    match service.apply(&team.employee, form(start + Duration::days(1), end)) {
        Ok(second) => println!("- Unexpectedly accepted overlapping request {}", second.id),
        Err(err) => println!("- Overlapping request refused: {err}"),
    }

    let application = service.cancel(
        &team.office,
        &application.id,
        Some("project deadline moved"),
    )?;
    println!(
        "- Office cancelled {} (formerly allowed: {})",
        application.id, application.formerly_allowed
    );

    println!("\nStatistics {}..={}", start, end);
    for row in service.statistics(&team.office, start, end)? {
        println!(
            "  - {}: {} waiting | {} allowed | {} left",
            row.login,
            row.waiting_days,
            row.allowed_days,
            row.left_vacation_days
                .map(|days| days.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    let sent = notifier.sent();
    println!("\nNotifications sent: {}", sent.len());
    for notification in sent {
        println!(
            "  - {} -> {} recipient(s)",
            notification.template.label(),
            notification.recipients.len()
        );
    }

    Ok(())
}

fn sign_in_team(
    directory: &PersonDirectory<InMemoryLeaveStore, LoggingNotifier>,
) -> Result<DemoTeam, AppError> {
    let sign_in = |login: &str, name: &str| {
        directory.sign_in(NewPerson {
            login: login.to_string(),
            name: name.to_string(),
            email: Some(format!("{login}@example.org")),
        })
    };

    let office = Actor::from(&sign_in("olga", "Olga Office")?);
    let boss = sign_in("bert", "Bert Boss")?;
    let employee = Actor::from(&sign_in("ursula", "Ursula User")?);
    let boss = Actor::from(&directory.update_roles(
        &office,
        &boss.id,
        BTreeSet::from([Role::User, Role::Boss]),
    )?);

    Ok(DemoTeam {
        office,
        boss,
        employee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavedesk::config::{AppEnvironment, LedgerConfig, LogFormat, TelemetryConfig};
    use leavedesk::workflows::leave::LeavePolicy;

    #[test]
    fn demo_runs_end_to_end() {
        let config = AppConfig {
            environment: AppEnvironment::Test,
            telemetry: TelemetryConfig {
                log_level: "warn".to_string(),
                log_format: LogFormat::Compact,
            },
            ledger: LedgerConfig {
                path: std::path::PathBuf::from("unused.json"),
            },
            leave: LeavePolicy::default(),
        };
        let args = DemoArgs {
            today: Some(NaiveDate::from_ymd_opt(2026, 12, 16).expect("valid date")),
            vacation_days: None,
        };
        run_demo(args, &config).expect("demo completes");
    }
}
