use crate::{
    error::{LedgerError, RecordDecodeError},
    model::{ExpenseDraft, LedgerReport, SettlementStatus},
    ports::{LoadedRecords, RecordStore, StoreVersion},
};
use splitbook_domain::{
    ExpenseRecord, LedgerAggregator, MemberRoster, SettlementPlanner, ShareCalculator,
    SplitSelection,
};

#[derive(Clone, Copy)]
pub struct LedgerService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> LedgerService<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Validates a draft into a record without touching the store.
    pub fn prepare_record(
        draft: &ExpenseDraft,
        roster: &MemberRoster,
    ) -> Result<ExpenseRecord, LedgerError> {
        let description = draft.description.trim();
        let Some(total) = draft.total else {
            return Err(LedgerError::IncompleteDraft);
        };
        if description.is_empty() {
            return Err(LedgerError::IncompleteDraft);
        }
        if total.is_negative() {
            return Err(LedgerError::NegativeAmount(total));
        }
        if let SplitSelection::Manual(amounts) = &draft.selection
            && let Some((_, amount)) = amounts.iter().find(|(_, amount)| amount.is_negative())
        {
            return Err(LedgerError::NegativeAmount(*amount));
        }
        let Some(payer) = roster.resolve(draft.payer.name()) else {
            return Err(LedgerError::UnknownPayer(draft.payer.clone()));
        };

        let calculator = ShareCalculator;
        let shares = calculator.compute(total, &draft.selection, roster)?;
        calculator.validate(total, &shares)?;

        Ok(ExpenseRecord {
            date: draft.date,
            description: description.to_owned(),
            total,
            payer: payer.clone(),
            shares,
        })
    }

    /// Validates and appends a draft against the store's current version.
    ///
    /// A concurrent writer surfaces as [`LedgerError::Conflict`]; nothing is
    /// retried here.
    pub fn record_expense(
        &self,
        draft: &ExpenseDraft,
        roster: &MemberRoster,
    ) -> Result<ExpenseRecord, LedgerError> {
        let record = Self::prepare_record(draft, roster)?;
        let expected = self.store.version()?;
        self.append(record, expected)
    }

    /// Like [`LedgerService::record_expense`], but only succeeds if the store
    /// is still at `expected` (typically the version of the report the user
    /// was looking at).
    pub fn record_expense_at(
        &self,
        draft: &ExpenseDraft,
        roster: &MemberRoster,
        expected: StoreVersion,
    ) -> Result<ExpenseRecord, LedgerError> {
        let record = Self::prepare_record(draft, roster)?;
        self.append(record, expected)
    }

    fn append(
        &self,
        record: ExpenseRecord,
        expected: StoreVersion,
    ) -> Result<ExpenseRecord, LedgerError> {
        let version = self.store.append_record(&record, expected)?;
        tracing::info!(
            description = %record.description,
            total = %record.total,
            payer = %record.payer,
            %version,
            "recorded expense"
        );
        Ok(record)
    }

    /// Recomputes balances and the settlement plan from every stored row.
    pub fn build_report(&self, roster: &MemberRoster) -> Result<LedgerReport, LedgerError> {
        let LoadedRecords { version, rows } = self.store.load_records()?;
        let has_rows = !rows.is_empty();

        let mut records = Vec::with_capacity(rows.len());
        let mut undecodable: Vec<RecordDecodeError> = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(row = err.row, reason = %err.reason, "skipping undecodable row");
                    undecodable.push(err);
                }
            }
        }

        let aggregation = LedgerAggregator.aggregate_with_report(&records, roster);
        let plan = SettlementPlanner.plan(&aggregation.balances);
        let status = if !has_rows {
            SettlementStatus::NoData
        } else if aggregation.balances.values().all(|balance| balance.is_settled()) {
            SettlementStatus::Settled
        } else {
            SettlementStatus::Pending
        };

        records.reverse();

        Ok(LedgerReport {
            history: records,
            balances: aggregation.balances,
            plan,
            status,
            undecodable,
            issues: aggregation.issues,
            version,
        })
    }
}
