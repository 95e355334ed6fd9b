pub mod ledger_aggregator;
pub mod settlement_planner;
pub mod share_calculator;

pub use ledger_aggregator::{Aggregation, AggregationIssue, LedgerAggregator};
pub use settlement_planner::SettlementPlanner;
pub use share_calculator::{ShareCalculator, ShareError, SplitMode, SplitSelection};
