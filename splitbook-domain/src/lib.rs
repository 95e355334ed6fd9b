#![warn(clippy::uninlined_format_args)]

pub mod model;
pub mod services;

pub use model::{
    ExpenseRecord, Member, MemberBalances, MemberRoster, Money, RosterError, SettlementPlan,
    Shares, Transfer, total_balance,
};
pub use services::{
    Aggregation, AggregationIssue, LedgerAggregator, SettlementPlanner, ShareCalculator,
    ShareError, SplitMode, SplitSelection,
};
