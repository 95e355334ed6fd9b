use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitbook_application::RecordDecodeError;
use splitbook_domain::{ExpenseRecord, Member, Money, Shares};
use thiserror::Error;

pub const HEADER: [&str; 5] = ["date", "description", "total", "payer", "shares"];
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const SHARE_CELL_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ShareCellError {
    #[error("unsupported share cell version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid amount '{amount}' for member '{member}'")]
    InvalidAmount { member: String, amount: String },
    #[error("empty member name in share cell")]
    EmptyMember,
    #[error("unrecognized share cell: {0}")]
    Unrecognized(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct ShareCell {
    v: u32,
    shares: Vec<ShareCellEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ShareCellEntry {
    member: String,
    amount: String,
}

fn parse_decimal(literal: &str) -> Option<Decimal> {
    let literal = literal.trim();
    if literal.contains(['e', 'E']) {
        Decimal::from_scientific(literal).ok()
    } else {
        Decimal::from_str(literal).ok()
    }
}

fn member(name: &str) -> Result<Member, ShareCellError> {
    Member::new(name).map_err(|_| ShareCellError::EmptyMember)
}

/// Encodes shares as `{"v":1,"shares":[{"member":"A","amount":"30"}]}`.
///
/// Amounts are decimal strings so no precision is lost through JSON numbers.
pub fn encode_shares(shares: &Shares) -> Result<String, ShareCellError> {
    let cell = ShareCell {
        v: SHARE_CELL_VERSION,
        shares: shares
            .iter()
            .map(|(member, amount)| ShareCellEntry {
                member: member.name().to_owned(),
                amount: amount.as_decimal().normalize().to_string(),
            })
            .collect(),
    };
    Ok(serde_json::to_string(&cell)?)
}

/// Decodes a share cell in the current JSON layout, falling back to the
/// dictionary literal layout (`{'A': 30.0}`) found in older ledgers.
pub fn decode_shares(cell: &str) -> Result<Shares, ShareCellError> {
    match serde_json::from_str::<ShareCell>(cell) {
        Ok(cell) => decode_share_cell(cell),
        Err(json_err) => match splitbook_parser::parse_legacy_shares(cell) {
            Ok(entries) => {
                tracing::trace!(entries = entries.len(), "decoded legacy share cell");
                entries
                    .into_iter()
                    .map(|(name, amount)| Ok((member(&name)?, Money::from_decimal(amount))))
                    .collect()
            }
            Err(legacy_err) => {
                tracing::trace!(%json_err, %legacy_err, "share cell matched no known layout");
                Err(ShareCellError::Unrecognized(legacy_err.to_string()))
            }
        },
    }
}

fn decode_share_cell(cell: ShareCell) -> Result<Shares, ShareCellError> {
    if cell.v != SHARE_CELL_VERSION {
        return Err(ShareCellError::UnsupportedVersion(cell.v));
    }
    cell.shares
        .into_iter()
        .map(|entry| {
            let Some(amount) = parse_decimal(&entry.amount) else {
                return Err(ShareCellError::InvalidAmount {
                    member: entry.member,
                    amount: entry.amount,
                });
            };
            Ok((member(&entry.member)?, Money::from_decimal(amount)))
        })
        .collect()
}

/// Turns one CSV data row into a record. `row` is 1-based, header excluded.
pub fn decode_row(row: usize, fields: &csv::StringRecord) -> Result<ExpenseRecord, RecordDecodeError> {
    let fail = |reason: String| RecordDecodeError { row, reason };
    let field = |index: usize| {
        fields
            .get(index)
            .ok_or_else(|| fail(format!("missing '{}' column", HEADER[index])))
    };

    let date_field = field(0)?;
    let date = NaiveDate::parse_from_str(date_field.trim(), DATE_FORMAT)
        .map_err(|err| fail(format!("invalid date '{date_field}': {err}")))?;
    let description = field(1)?.to_owned();
    let total_field = field(2)?;
    let total = parse_decimal(total_field)
        .map(Money::from_decimal)
        .ok_or_else(|| fail(format!("invalid total '{total_field}'")))?;
    let payer = Member::new(field(3)?).map_err(|err| fail(format!("invalid payer: {err}")))?;
    let shares = decode_shares(field(4)?).map_err(|err| fail(err.to_string()))?;

    Ok(ExpenseRecord {
        date,
        description,
        total,
        payer,
        shares,
    })
}

pub fn encode_row(record: &ExpenseRecord) -> Result<[String; 5], ShareCellError> {
    Ok([
        record.date.format(DATE_FORMAT).to_string(),
        record.description.clone(),
        record.total.as_decimal().normalize().to_string(),
        record.payer.name().to_owned(),
        encode_shares(&record.shares)?,
    ])
}
