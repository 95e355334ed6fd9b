#![warn(clippy::uninlined_format_args)]

mod i18n;

use std::str::FromStr;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{map_res, opt, recognize},
    error::{Error as NomError, ErrorKind},
    multi::{many_m_n, separated_list1},
    sequence::{delimited, preceded},
};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{detail}")]
    SyntaxError { detail: String },
    #[error("{detail}")]
    InvalidNumber { literal: String, detail: String },
}

impl ParseError {
    fn syntax(error: impl std::fmt::Display) -> Self {
        Self::SyntaxError {
            detail: i18n::syntax_error_detail(error),
        }
    }

    fn unparsed(rest: &str) -> Self {
        Self::SyntaxError {
            detail: i18n::syntax_error_unparsed_detail(rest),
        }
    }

    fn invalid_number(literal: &str) -> Self {
        Self::InvalidNumber {
            literal: literal.to_owned(),
            detail: i18n::invalid_number_detail(literal),
        }
    }
}

/// A calendar date as written, not yet checked against the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// One `name = amount` entry of a manual split, amount still unconverted.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareEntry<'a> {
    pub name: &'a str,
    pub amount: Decimal,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\'' | '·')
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char).parse(input)
}

fn sp(input: &str) -> IResult<&str, &str> {
    fn fullwidth_space(input: &str) -> IResult<&str, &str> {
        take_while1(|c: char| c == '\u{3000}').parse(input)
    }

    recognize((multispace0, opt(fullwidth_space), multispace0)).parse(input)
}

fn list_separator(input: &str) -> IResult<&str, &str> {
    delimited(sp, alt((tag(","), tag("，"), tag("、"))), sp).parse(input)
}

fn assignment(input: &str) -> IResult<&str, &str> {
    delimited(sp, alt((tag("="), tag(":"), tag("："))), sp).parse(input)
}

fn unsigned_literal(input: &str) -> IResult<&str, &str> {
    recognize((digit1, opt((char('.'), digit1)))).parse(input)
}

// 12, 12.5, $12.50, ¥1200
fn amount_literal(input: &str) -> IResult<&str, &str> {
    preceded(opt(one_of("$¥￥")), unsigned_literal).parse(input)
}

// Python float repr: -3.5, 30.0, 1e-05, 33.333333333333336
fn float_literal(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(one_of("+-")),
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

fn quoted_string(input: &str) -> IResult<&str, String> {
    let (rest, quote) = one_of("'\"").parse(input)?;
    let mut value = String::new();
    let mut chars = rest.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            c if c == quote => return Ok((&rest[idx + c.len_utf8()..], value)),
            c => value.push(c),
        }
    }
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)))
}

fn manual_entry(input: &str) -> IResult<&str, (&str, &str)> {
    (name, assignment, amount_literal)
        .map(|(name, _, amount)| (name, amount))
        .parse(input)
}

fn legacy_entry(input: &str) -> IResult<&str, (String, &str)> {
    (quoted_string, assignment, float_literal)
        .map(|(name, _, amount)| (name, amount))
        .parse(input)
}

fn legacy_dict(input: &str) -> IResult<&str, Vec<(String, &str)>> {
    delimited(
        (char('{'), sp),
        opt((
            separated_list1(list_separator, legacy_entry),
            opt(list_separator),
        ))
        .map(|entries| entries.map(|(entries, _)| entries).unwrap_or_default()),
        (sp, char('}')),
    )
    .parse(input)
}

fn fixed_digits<T: FromStr>(min: usize, max: usize) -> impl FnMut(&str) -> IResult<&str, T> {
    move |input| {
        map_res(
            recognize(many_m_n(min, max, satisfy(|c| c.is_ascii_digit()))),
            str::parse::<T>,
        )
        .parse(input)
    }
}

// 2024-03-09, 2024/3/9, 2024.03.09, 2024年3月9日
fn date_literal(input: &str) -> IResult<&str, DateParts> {
    alt((
        (
            fixed_digits::<i32>(4, 4),
            one_of("-/."),
            fixed_digits::<u32>(1, 2),
            one_of("-/."),
            fixed_digits::<u32>(1, 2),
        )
            .map(|(year, _, month, _, day)| DateParts { year, month, day }),
        (
            fixed_digits::<i32>(4, 4),
            char('年'),
            fixed_digits::<u32>(1, 2),
            char('月'),
            fixed_digits::<u32>(1, 2),
            opt(char('日')),
        )
            .map(|(year, _, month, _, day, _)| DateParts { year, month, day }),
    ))
    .parse(input)
}

fn finish<'a, T>(result: IResult<&'a str, T>) -> Result<T, ParseError> {
    match result {
        Ok((rest, value)) => {
            let rest = rest.trim();
            if rest.is_empty() {
                Ok(value)
            } else {
                Err(ParseError::unparsed(rest))
            }
        }
        Err(err) => Err(ParseError::syntax(err)),
    }
}

fn to_decimal(literal: &str) -> Result<Decimal, ParseError> {
    let digits = literal.trim_start_matches(['$', '¥', '￥']);
    let parsed = if digits.contains(['e', 'E']) {
        Decimal::from_scientific(digits)
    } else {
        Decimal::from_str(digits)
    };
    parsed.map_err(|_| ParseError::invalid_number(literal))
}

/// Parses a separated list of member names: `Mom, Dad, 我`.
pub fn parse_member_list(input: &str) -> Result<Vec<&str>, ParseError> {
    finish(delimited(sp, separated_list1(list_separator, name), sp).parse(input))
}

/// Parses a non-negative amount, optionally prefixed by a currency sign.
pub fn parse_amount(input: &str) -> Result<Decimal, ParseError> {
    let literal = finish(delimited(sp, amount_literal, sp).parse(input))?;
    to_decimal(literal)
}

/// Parses a year-month-day date. Calendar validity is left to the caller.
pub fn parse_date(input: &str) -> Result<DateParts, ParseError> {
    finish(delimited(sp, date_literal, sp).parse(input))
}

/// Parses manual shares: `A=30, B=12.5` (also `A:30`).
pub fn parse_manual_shares(input: &str) -> Result<Vec<ShareEntry<'_>>, ParseError> {
    let entries =
        finish(delimited(sp, separated_list1(list_separator, manual_entry), sp).parse(input))?;
    entries
        .into_iter()
        .map(|(name, literal)| {
            Ok(ShareEntry {
                name,
                amount: to_decimal(literal)?,
            })
        })
        .collect()
}

/// Parses a share cell written as a dictionary literal of names to floats:
/// `{'A': 30.0, "B": 12.5}`.
///
/// Only quoted keys and numeric values are accepted; nothing is evaluated.
pub fn parse_legacy_shares(input: &str) -> Result<Vec<(String, Decimal)>, ParseError> {
    let entries = finish(delimited(sp, legacy_dict, sp).parse(input))?;
    entries
        .into_iter()
        .map(|(name, literal)| Ok((name, to_decimal(literal)?)))
        .collect()
}
