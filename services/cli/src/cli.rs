use std::path::PathBuf;

use crate::commands::{
    AccountSetupArgs, ApplyArgs, DecisionArgs, HolidayArgs, ListArgs, PersonArgs,
    ReferArgs, RolesArgs, RolloverArgs, ShowArgs, SignInArgs, StatisticsArgs, WorkingTimeArgs,
    Workspace, YearArgs,
};
use crate::demo::{run_demo, DemoArgs};
use clap::{Parser, Subcommand};
use leavedesk::config::AppConfig;
use leavedesk::error::AppError;
use leavedesk::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "leavedesk",
    about = "Apply for leave, decide on applications and track vacation balances",
    version
)]
struct Cli {
    /// Ledger file to read and update (overrides LEAVE_LEDGER_PATH)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted walkthrough against an in-memory ledger (default command)
    Demo(DemoArgs),
    /// Resolve a login, registering it on first use
    SignIn(SignInArgs),
    /// Manage persons and their roles
    Person {
        #[command(subcommand)]
        command: PersonCommand,
    },
    /// Manage yearly holidays accounts
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Maintain working times and public holidays
    Calendar {
        #[command(subcommand)]
        command: CalendarCommand,
    },
    /// Submit an application for leave
    Apply(ApplyArgs),
    /// Allow a waiting application
    Allow(DecisionArgs),
    /// Reject a waiting application (comment required)
    Reject(DecisionArgs),
    /// Cancel a waiting or allowed application
    Cancel(DecisionArgs),
    /// Hand a waiting application to another boss
    Refer(ReferArgs),
    /// Remind the bosses about a waiting application
    Remind(ShowArgs),
    /// Show an application with its comments and the owner's balance
    Show(ShowArgs),
    /// List applications of a year
    List(ListArgs),
    /// Waiting and allowed days per person for a period
    Statistics(StatisticsArgs),
}

#[derive(Subcommand, Debug)]
enum PersonCommand {
    /// Replace the roles of a person
    Roles(RolesArgs),
    /// Deactivate a person; their history is kept
    Deactivate(PersonArgs),
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Create or overwrite the account of a person for a year
    Setup(AccountSetupArgs),
    /// Open the next year carrying over what is left
    Rollover(RolloverArgs),
    /// Show the balance of a person for a year
    Show(YearArgs),
}

#[derive(Subcommand, Debug)]
enum CalendarCommand {
    /// Record a weekly working pattern for a person
    WorkingTime(WorkingTimeArgs),
    /// Record a public holiday
    Holiday(HolidayArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));
    let path = cli.ledger.unwrap_or_else(|| config.ledger.path.clone());
    let open = || Workspace::open(path.clone(), &config);

    match command {
        Command::Demo(args) => run_demo(args, &config),
        Command::SignIn(args) => open()?.sign_in(args),
        Command::Person { command } => match command {
            PersonCommand::Roles(args) => open()?.update_roles(args),
            PersonCommand::Deactivate(args) => open()?.deactivate(args),
        },
        Command::Account { command } => match command {
            AccountCommand::Setup(args) => open()?.setup_account(args),
            AccountCommand::Rollover(args) => open()?.rollover(args),
            AccountCommand::Show(args) => open()?.balance(args),
        },
        Command::Calendar { command } => match command {
            CalendarCommand::WorkingTime(args) => open()?.working_time(args),
            CalendarCommand::Holiday(args) => open()?.public_holiday(args),
        },
        Command::Apply(args) => open()?.apply(args),
        Command::Allow(args) => open()?.allow(args),
        Command::Reject(args) => open()?.reject(args),
        Command::Cancel(args) => open()?.cancel(args),
        Command::Refer(args) => open()?.refer(args),
        Command::Remind(args) => open()?.remind(args),
        Command::Show(args) => open()?.show(args),
        Command::List(args) => open()?.list(args),
        Command::Statistics(args) => open()?.statistics(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_an_application() {
        let cli = Cli::try_parse_from([
            "leavedesk",
            "--ledger",
            "team.json",
            "apply",
            "--as",
            "ursula",
            "--start",
            "2026-06-01",
            "--end",
            "2026-06-05",
            "--type",
            "holiday",
        ])
        .expect("arguments parse");
        assert_eq!(cli.ledger, Some(PathBuf::from("team.json")));
        match cli.command {
            Some(Command::Apply(args)) => {
                assert_eq!(args.actor.login, "ursula");
                assert!(args.person.is_none());
            }
            other => panic!("expected apply command, got {other:?}"),
        }
    }

    #[test]
    fn reject_accepts_a_comment() {
        let cli = Cli::try_parse_from([
            "leavedesk",
            "reject",
            "--as",
            "bert",
            "leave-000003",
            "--comment",
            "team offsite",
        ])
        .expect("arguments parse");
        match cli.command {
            Some(Command::Reject(args)) => {
                assert_eq!(args.id, "leave-000003");
                assert_eq!(args.comment.as_deref(), Some("team offsite"));
            }
            other => panic!("expected reject command, got {other:?}"),
        }
    }
}
