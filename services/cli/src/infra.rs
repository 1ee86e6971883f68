use std::fs;
use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDate;
use leavedesk::error::AppError;
use leavedesk::workflows::leave::{
    ApplicationStatus, DayLength, LeaveLedger, Notification, NotificationError, Notifier, Role,
    VacationType,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Read the ledger file; a missing file is an empty ledger.
pub(crate) fn load_ledger(path: &Path) -> Result<LeaveLedger, AppError> {
    if !path.exists() {
        debug!(path = %path.display(), "ledger file missing, starting empty");
        return Ok(LeaveLedger::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn save_ledger(path: &Path, ledger: &LeaveLedger) -> Result<(), AppError> {
    let raw = serde_json::to_string_pretty(ledger)?;
    fs::write(path, raw)?;
    debug!(
        path = %path.display(),
        applications = ledger.applications.len(),
        "ledger saved"
    );
    Ok(())
}

/// Writes notifications to the log instead of a mail server and keeps them for reporting.
#[derive(Default)]
pub(crate) struct LoggingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl LoggingNotifier {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl Notifier for LoggingNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            template = notification.template.label(),
            recipients = ?notification.recipients,
            application = ?notification.application_id,
            "notification queued"
        );
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("notifier mutex poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|err| format!("failed to parse '{raw}' as a number of days ({err})"))
}

pub(crate) fn parse_role(raw: &str) -> Result<Role, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "user" => Ok(Role::User),
        "boss" => Ok(Role::Boss),
        "office" => Ok(Role::Office),
        "admin" => Ok(Role::Admin),
        "inactive" => Ok(Role::Inactive),
        other => Err(format!(
            "unknown role '{other}' (expected user, boss, office, admin or inactive)"
        )),
    }
}

pub(crate) fn parse_day_length(raw: &str) -> Result<DayLength, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "full" => Ok(DayLength::Full),
        "morning" => Ok(DayLength::Morning),
        "noon" => Ok(DayLength::Noon),
        "zero" | "off" => Ok(DayLength::Zero),
        other => Err(format!(
            "unknown day length '{other}' (expected full, morning, noon or zero)"
        )),
    }
}

/// Seven comma-separated day lengths, Monday first.
pub(crate) fn parse_week(raw: &str) -> Result<[DayLength; 7], String> {
    let days = raw
        .split(',')
        .map(parse_day_length)
        .collect::<Result<Vec<_>, _>>()?;
    let count = days.len();
    days.try_into()
        .map_err(|_| format!("expected 7 day lengths (Monday to Sunday), got {count}"))
}

pub(crate) fn parse_vacation_type(raw: &str) -> Result<VacationType, String> {
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    [
        VacationType::Holiday,
        VacationType::SpecialLeave,
        VacationType::UnpaidLeave,
        VacationType::Overtime,
    ]
    .into_iter()
    .find(|kind| kind.label() == normalized)
    .ok_or_else(|| format!("unknown vacation type '{raw}'"))
}

pub(crate) fn parse_status(raw: &str) -> Result<ApplicationStatus, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    [
        ApplicationStatus::Waiting,
        ApplicationStatus::Allowed,
        ApplicationStatus::Rejected,
        ApplicationStatus::Cancelled,
    ]
    .into_iter()
    .find(|status| status.label() == normalized)
    .ok_or_else(|| format!("unknown application status '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavedesk::workflows::leave::NotificationTemplate;

    #[test]
    fn parses_cli_values() {
        assert_eq!(
            parse_date(" 2026-06-01 "),
            Ok(NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date"))
        );
        assert!(parse_date("01.06.2026").is_err());
        assert_eq!(parse_decimal("2.5"), Ok(Decimal::new(25, 1)));
        assert_eq!(parse_role("BOSS"), Ok(Role::Boss));
        assert_eq!(parse_day_length("noon"), Ok(DayLength::Noon));
        assert_eq!(
            parse_week("full,full,full,full,morning,zero,zero").map(|week| week[4]),
            Ok(DayLength::Morning)
        );
        assert!(parse_week("full,full").is_err());
        assert_eq!(
            parse_vacation_type("special-leave"),
            Ok(VacationType::SpecialLeave)
        );
        assert_eq!(parse_status("cancelled"), Ok(ApplicationStatus::Cancelled));
        assert!(parse_status("pending").is_err());
    }

    #[test]
    fn missing_ledger_file_is_empty() {
        let path = std::env::temp_dir().join("leavedesk-cli-missing-ledger.json");
        let _ = fs::remove_file(&path);
        let ledger = load_ledger(&path).expect("missing file is fine");
        assert_eq!(ledger, LeaveLedger::default());
    }

    #[test]
    fn ledger_survives_a_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "leavedesk-cli-ledger-{}.json",
            std::process::id()
        ));
        let ledger = LeaveLedger {
            sequence: 7,
            ..LeaveLedger::default()
        };
        save_ledger(&path, &ledger).expect("ledger written");
        assert_eq!(load_ledger(&path).expect("ledger read"), ledger);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn logging_notifier_keeps_what_it_sent() {
        let notifier = LoggingNotifier::default();
        notifier
            .send(Notification::new(NotificationTemplate::Remind, Vec::new()))
            .expect("send succeeds");
        assert_eq!(notifier.sent().len(), 1);
    }
}
