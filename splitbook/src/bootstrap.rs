use crate::cli::{Cli, CliError, Command};
use clap::Parser;
use splitbook_application::{ExpenseDraft, LedgerError, LedgerService};
use splitbook_domain::{ExpenseRecord, MemberRoster, RosterError};
use splitbook_infrastructure::CsvRecordStore;
use splitbook_presentation::{MembersPresenter, ReportPresenter};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no members configured; set SPLITBOOK_MEMBERS or pass --members")]
    MissingMembers,
    #[error("member list is invalid: {0}")]
    InvalidMembers(#[from] splitbook_parser::ParseError),
    #[error("member list is invalid: {0}")]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Cli(#[from] CliError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Application configuration, resolved once at startup from flags, the
/// environment and `.env`.
#[derive(Debug)]
pub struct AppConfig {
    pub ledger_path: PathBuf,
    pub roster: MemberRoster,
    pub append_retries: u32,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        let members = cli
            .members
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(AppError::MissingMembers)?;
        let names = splitbook_parser::parse_member_list(members)?;
        let roster = MemberRoster::try_from_names(names)?;

        Ok(Self {
            ledger_path: cli.ledger.clone(),
            roster,
            append_retries: cli.append_retries,
        })
    }
}

/// Installs the global subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Records a draft, re-reading the ledger version and trying again whenever
/// another writer got there first.
pub fn record_with_retries(
    service: LedgerService<'_>,
    draft: &ExpenseDraft,
    roster: &MemberRoster,
    retries: u32,
) -> Result<ExpenseRecord, LedgerError> {
    let mut attempt = 0;
    loop {
        match service.record_expense(draft, roster) {
            Err(err) if err.is_conflict() && attempt < retries => {
                attempt += 1;
                tracing::warn!(attempt, retries, %err, "ledger changed underneath, retrying");
            }
            result => return result,
        }
    }
}

pub fn run() -> Result<(), AppError> {
    init_logging();

    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli)?;
    let command = cli.command;
    tracing::debug!(ledger = %config.ledger_path.display(), ?command, "starting");

    let store = CsvRecordStore::new(&config.ledger_path);
    let service = LedgerService::new(&store);

    match command {
        Command::Add(args) => {
            let today = chrono::Local::now().date_naive();
            let draft = args.into_draft(&config.roster, today)?;
            let record = record_with_retries(service, &draft, &config.roster, config.append_retries)?;
            println!("{}", splitbook_i18n::recorded(&record.description, record.total));
        }
        Command::Report => {
            let report = service.build_report(&config.roster)?;
            print!("{}", ReportPresenter::render(&report));
        }
        Command::Members => {
            print!("{}", MembersPresenter::render(&config.roster));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use splitbook_application::{LoadedRecords, RecordStore, StoreError, StoreVersion};
    use splitbook_domain::{Member, Money, SplitSelection};
    use std::sync::Mutex;

    fn cli(args: &[&str]) -> Cli {
        let argv = ["splitbook"]
            .into_iter()
            .chain(args.iter().copied())
            .chain(["members"]);
        Cli::try_parse_from(argv).expect("flags parse")
    }

    #[test]
    fn config_defaults_apply() {
        let config =
            AppConfig::from_cli(&cli(&["--members", "Mom, Dad, 我"])).expect("config loads");

        assert_eq!(config.ledger_path, PathBuf::from("splitbook.csv"));
        assert_eq!(config.append_retries, 3);
        let names: Vec<&str> = config.roster.iter().map(Member::name).collect();
        assert_eq!(names, vec!["Mom", "Dad", "我"]);
    }

    #[test]
    fn config_reads_overrides() {
        let config = AppConfig::from_cli(&cli(&[
            "--members=A,B",
            "--ledger=/tmp/trip.csv",
            "--append-retries=0",
        ]))
        .expect("config loads");

        assert_eq!(config.ledger_path, PathBuf::from("/tmp/trip.csv"));
        assert_eq!(config.append_retries, 0);
    }

    #[rstest]
    #[case::missing_members(&[], "MissingMembers")]
    #[case::blank_members(&["--members=  "], "MissingMembers")]
    #[case::duplicate_member(&["--members=A, A"], "Roster")]
    #[case::bad_member_list(&["--members=A;B"], "InvalidMembers")]
    fn config_rejects(#[case] args: &[&str], #[case] expected: &str) {
        let err = AppConfig::from_cli(&cli(args)).expect_err("config must fail");
        let kind = match err {
            AppError::MissingMembers => "MissingMembers",
            AppError::Roster(_) => "Roster",
            AppError::InvalidMembers(_) => "InvalidMembers",
            other => panic!("unexpected error: {other}"),
        };
        assert_eq!(kind, expected);
    }

    /// Reports a conflict for the first `conflicts` appends.
    struct ContendedStore {
        conflicts: Mutex<u32>,
        appended: Mutex<u32>,
    }

    impl RecordStore for ContendedStore {
        fn load_records(&self) -> Result<LoadedRecords, StoreError> {
            Ok(LoadedRecords::default())
        }

        fn append_record(
            &self,
            _record: &ExpenseRecord,
            expected: StoreVersion,
        ) -> Result<StoreVersion, StoreError> {
            let mut conflicts = self.conflicts.lock().expect("lock");
            if *conflicts > 0 {
                *conflicts -= 1;
                return Err(StoreError::Conflict {
                    expected,
                    actual: StoreVersion { rows: 1, digest: 1 },
                });
            }
            *self.appended.lock().expect("lock") += 1;
            Ok(StoreVersion { rows: 1, digest: 2 })
        }
    }

    fn draft() -> ExpenseDraft {
        let payer = Member::new("A").expect("valid name");
        ExpenseDraft {
            date: NaiveDate::from_ymd_opt(2024, 8, 8).expect("valid date"),
            description: "fuel".to_owned(),
            total: Some(Money::from_i64(40)),
            payer: payer.clone(),
            selection: SplitSelection::Equal(vec![payer]),
        }
    }

    #[rstest]
    #[case::succeeds_after_retries(2, 3, true)]
    #[case::gives_up(4, 3, false)]
    #[case::no_retries(1, 0, false)]
    fn conflicts_are_retried_up_to_the_limit(
        #[case] conflicts: u32,
        #[case] retries: u32,
        #[case] succeeds: bool,
    ) {
        let store = ContendedStore {
            conflicts: Mutex::new(conflicts),
            appended: Mutex::new(0),
        };
        let roster = MemberRoster::try_from_names(["A"]).expect("valid roster");

        let result = record_with_retries(LedgerService::new(&store), &draft(), &roster, retries);

        assert_eq!(result.is_ok(), succeeds);
        if !succeeds {
            assert!(result.is_err_and(|err| err.is_conflict()));
        }
        assert_eq!(*store.appended.lock().expect("lock"), u32::from(succeeds));
    }
}
