use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use splitbook_application::ExpenseDraft;
use splitbook_domain::{Member, MemberRoster, Money, RosterError, SplitSelection};
use splitbook_parser::ParseError;
use thiserror::Error;

/// Shared expense ledger with greedy settlement
#[derive(Debug, Parser)]
#[command(name = "splitbook", version, arg_required_else_help = true)]
pub struct Cli {
    /// Ledger CSV file
    #[arg(long, env = "SPLITBOOK_LEDGER", default_value = "splitbook.csv")]
    pub ledger: PathBuf,

    /// Registered members in order, separated by `,`, `，` or `、`
    #[arg(long, env = "SPLITBOOK_MEMBERS")]
    pub members: Option<String>,

    /// How many times to retry an append after another writer changed the ledger
    #[arg(long, env = "SPLITBOOK_APPEND_RETRIES", default_value_t = 3)]
    pub append_retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Record an expense. Without --with or --manual the total is split
    /// equally among all members.
    Add(AddArgs),
    /// Show history, balances and the transfers that settle them
    Report,
    /// List registered members
    Members,
}

#[derive(Debug, Default, PartialEq, Eq, Args)]
pub struct AddArgs {
    #[arg(short, long)]
    pub description: Option<String>,
    /// Amount paid, optionally prefixed with a currency sign
    #[arg(short, long, allow_hyphen_values = true)]
    pub total: Option<String>,
    #[arg(short, long)]
    pub payer: String,
    /// YYYY-MM-DD, YYYY/M/D or YYYY年M月D日; defaults to today
    #[arg(long)]
    pub date: Option<String>,
    /// Members sharing the total equally
    #[arg(long, conflicts_with = "manual")]
    pub with: Option<String>,
    /// Explicit shares such as `A=30,B=20`
    #[arg(long)]
    pub manual: Option<String>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{flag}: {source}")]
    InvalidValue {
        flag: &'static str,
        #[source]
        source: ParseError,
    },
    #[error("--date: '{0}' is not a calendar date")]
    InvalidDate(String),
    #[error("--with and --manual cannot be combined")]
    ConflictingSplit,
    #[error(transparent)]
    Member(#[from] RosterError),
}

impl AddArgs {
    /// Turns the raw options into a draft. Business validation (blank
    /// description, missing total, share sums) is left to the ledger service.
    pub fn into_draft(
        self,
        roster: &MemberRoster,
        today: NaiveDate,
    ) -> Result<ExpenseDraft, CliError> {
        let payer = Member::new(&self.payer)?;

        let total = self
            .total
            .as_deref()
            .map(|literal| {
                splitbook_parser::parse_amount(literal)
                    .map(Money::from_decimal)
                    .map_err(|source| CliError::InvalidValue {
                        flag: "--total",
                        source,
                    })
            })
            .transpose()?;

        let date = match self.date.as_deref() {
            Some(literal) => {
                let parts = splitbook_parser::parse_date(literal).map_err(|source| {
                    CliError::InvalidValue {
                        flag: "--date",
                        source,
                    }
                })?;
                NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)
                    .ok_or_else(|| CliError::InvalidDate(literal.to_owned()))?
            }
            None => today,
        };

        let selection = match (self.with.as_deref(), self.manual.as_deref()) {
            (Some(_), Some(_)) => return Err(CliError::ConflictingSplit),
            (Some(list), None) => {
                let names = splitbook_parser::parse_member_list(list).map_err(|source| {
                    CliError::InvalidValue {
                        flag: "--with",
                        source,
                    }
                })?;
                SplitSelection::Equal(
                    names
                        .into_iter()
                        .map(Member::new)
                        .collect::<Result<_, _>>()?,
                )
            }
            (None, Some(list)) => {
                let entries = splitbook_parser::parse_manual_shares(list).map_err(|source| {
                    CliError::InvalidValue {
                        flag: "--manual",
                        source,
                    }
                })?;
                SplitSelection::Manual(
                    entries
                        .into_iter()
                        .map(|entry| {
                            Ok((Member::new(entry.name)?, Money::from_decimal(entry.amount)))
                        })
                        .collect::<Result<_, RosterError>>()?,
                )
            }
            (None, None) => SplitSelection::Equal(roster.iter().cloned().collect()),
        };

        Ok(ExpenseDraft {
            date,
            description: self.description.unwrap_or_default(),
            total,
            payer,
            selection,
        })
    }
}
