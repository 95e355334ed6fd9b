use crate::text_table::{Alignment, TextTableBuilder};
use splitbook_application::{LedgerReport, SettlementStatus};
use splitbook_domain::{AggregationIssue, ExpenseRecord, MemberBalances, SettlementPlan};
use splitbook_i18n as i18n;
use std::{borrow::Cow, fmt::Write as _};

pub struct ReportPresenter;

impl ReportPresenter {
    /// Renders history cards, the balance table, the settlement section and
    /// any warnings, separated by blank lines.
    pub fn render(report: &LedgerReport) -> String {
        let mut sections: Vec<String> = Vec::with_capacity(4);

        if !report.history.is_empty() {
            sections.push(Self::build_history(&report.history));
        }
        if !report.balances.is_empty() {
            sections.push(Self::build_balance_table(&report.balances));
        }
        sections.push(match report.status {
            SettlementStatus::NoData => i18n::NO_DATA.to_owned(),
            SettlementStatus::Settled => i18n::SETTLED.to_owned(),
            SettlementStatus::Pending if report.plan.is_empty() => i18n::NO_TRANSFERS.to_owned(),
            SettlementStatus::Pending => Self::build_transfer_lines(&report.plan),
        });
        if let Some(warnings) = Self::build_warnings(report) {
            sections.push(warnings);
        }

        let mut out = sections.join("\n");
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    pub fn build_history(history: &[ExpenseRecord]) -> String {
        let mut out = String::with_capacity(128 * history.len());
        let _ = writeln!(&mut out, "{}", i18n::HISTORY);
        for record in history {
            let _ = writeln!(
                &mut out,
                "{} - {} ({})",
                record.date.format("%Y-%m-%d"),
                record.description,
                record.total
            );
            let _ = writeln!(&mut out, "  {}: {}", i18n::PAYER, record.payer);
            let shares = record
                .shares
                .active()
                .map(|(member, amount)| format!("{member} {amount}"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(&mut out, "  {}: {shares}", i18n::SHARES);
        }
        out
    }

    pub fn build_balance_table(balances: &MemberBalances) -> String {
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Right])
            .headers(&[Cow::Borrowed(i18n::MEMBER), Cow::Borrowed(i18n::BALANCE)]);

        for (member, balance) in balances {
            let sign = if balance.round_cents().is_positive() {
                "+"
            } else {
                ""
            };
            builder = builder.row([
                Cow::Borrowed(member.name()),
                Cow::Owned(format!("{sign}{balance}")),
            ]);
        }

        format!("{}\n{}", i18n::BALANCES, builder.build())
    }

    pub fn build_transfer_lines(plan: &SettlementPlan) -> String {
        let mut out = String::with_capacity(32 * (plan.len() + 1));
        let _ = writeln!(&mut out, "{}", i18n::TRANSFERS);
        for transfer in plan.transfers() {
            let _ = writeln!(
                &mut out,
                "{} -> {} : {}",
                transfer.from, transfer.to, transfer.amount
            );
        }
        out
    }

    fn build_warnings(report: &LedgerReport) -> Option<String> {
        if report.undecodable.is_empty() && report.issues.is_empty() {
            return None;
        }

        let mut out = String::new();
        let _ = writeln!(&mut out, "{}", i18n::WARNINGS);
        for skipped in &report.undecodable {
            let _ = writeln!(&mut out, "- {}", i18n::skipped_row(skipped.row, &skipped.reason));
        }
        for issue in &report.issues {
            let message = match issue {
                AggregationIssue::UnknownPayer { payer, .. } => i18n::unknown_payer(payer),
                AggregationIssue::DroppedShare { member, amount, .. } => {
                    i18n::dropped_share(member, amount)
                }
                AggregationIssue::Overflow { total, .. } => i18n::overflowed(total),
            };
            let _ = writeln!(&mut out, "- {message}");
        }
        Some(out)
    }
}
