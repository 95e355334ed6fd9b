use crate::{error::RecordDecodeError, ports::StoreVersion};
use chrono::NaiveDate;
use splitbook_domain::{
    AggregationIssue, ExpenseRecord, Member, MemberBalances, Money, SettlementPlan, SplitSelection,
};

/// Unvalidated input for one expense, as entered by a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub date: NaiveDate,
    pub description: String,
    pub total: Option<Money>,
    pub payer: Member,
    pub selection: SplitSelection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementStatus {
    /// The store holds no rows at all.
    NoData,
    /// Every balance is within epsilon of zero.
    Settled,
    /// Someone still owes money.
    Pending,
}

#[derive(Debug)]
pub struct LedgerReport {
    /// Decoded records, newest first.
    pub history: Vec<ExpenseRecord>,
    pub balances: MemberBalances,
    pub plan: SettlementPlan,
    pub status: SettlementStatus,
    pub undecodable: Vec<RecordDecodeError>,
    pub issues: Vec<AggregationIssue>,
    /// Store version the report was computed from.
    pub version: StoreVersion,
}
