use crate::model::{ExpenseRecord, Member, MemberBalances, MemberRoster, Money};

/// A record (or part of one) that did not contribute to the balances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregationIssue {
    /// The payer is not in the roster; the whole record was skipped.
    UnknownPayer { index: usize, payer: Member },
    /// The share belongs to a member no longer in the roster and was ignored.
    DroppedShare {
        index: usize,
        member: Member,
        amount: Money,
    },
    /// Applying the record would overflow a balance; the whole record was skipped.
    Overflow { index: usize, total: Money },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    pub balances: MemberBalances,
    pub issues: Vec<AggregationIssue>,
}

/// Balance aggregation service
pub struct LedgerAggregator;

impl LedgerAggregator {
    /// Folds records into one balance per roster member.
    ///
    /// # Arguments
    /// * `records` - Expense records in storage order (order does not change the result)
    /// * `roster` - Current members; their order becomes the balance order
    pub fn aggregate<'r, I>(&self, records: I, roster: &MemberRoster) -> MemberBalances
    where
        I: IntoIterator<Item = &'r ExpenseRecord>,
    {
        self.aggregate_with_report(records, roster).balances
    }

    /// Same as [`LedgerAggregator::aggregate`], also reporting what was skipped.
    pub fn aggregate_with_report<'r, I>(&self, records: I, roster: &MemberRoster) -> Aggregation
    where
        I: IntoIterator<Item = &'r ExpenseRecord>,
    {
        let mut balances: MemberBalances = roster
            .iter()
            .map(|member| (member.clone(), Money::ZERO))
            .collect();
        let mut issues = Vec::new();
        let mut applied = 0usize;

        for (index, record) in records.into_iter().enumerate() {
            let Some(payer_slot) = balances.get_index_of(record.payer.name()) else {
                tracing::warn!(
                    index,
                    payer = %record.payer,
                    description = %record.description,
                    "skipping record paid by an unknown member"
                );
                issues.push(AggregationIssue::UnknownPayer {
                    index,
                    payer: record.payer.clone(),
                });
                continue;
            };

            match Self::stage(&balances, payer_slot, index, record) {
                Some((staged, dropped)) => {
                    for (slot, balance) in staged {
                        balances[slot] = balance;
                    }
                    issues.extend(dropped);
                    applied += 1;
                }
                None => {
                    tracing::warn!(
                        index,
                        total = %record.total,
                        description = %record.description,
                        "skipping record that overflows the balances"
                    );
                    issues.push(AggregationIssue::Overflow {
                        index,
                        total: record.total,
                    });
                }
            }
        }

        tracing::debug!(applied, skipped = issues.len(), "aggregated balances");

        Aggregation { balances, issues }
    }

    /// New balances for every slot the record touches, in application order,
    /// or `None` if any of them leaves the decimal range.
    fn stage(
        balances: &MemberBalances,
        payer_slot: usize,
        index: usize,
        record: &ExpenseRecord,
    ) -> Option<(Vec<(usize, Money)>, Vec<AggregationIssue>)> {
        let mut staged = Vec::with_capacity(record.shares.len() + 1);
        let mut dropped = Vec::new();
        staged.push((payer_slot, balances[payer_slot].checked_add(record.total)?));

        for (member, amount) in record.shares.iter() {
            if let Some(slot) = balances.get_index_of(member.name()) {
                let current = staged
                    .iter()
                    .rev()
                    .find(|(staged_slot, _)| *staged_slot == slot)
                    .map_or(balances[slot], |(_, balance)| *balance);
                staged.push((slot, current.checked_sub(amount)?));
            } else if !amount.is_zero() {
                tracing::warn!(
                    index,
                    %member,
                    %amount,
                    "ignoring share of a member no longer in the roster"
                );
                dropped.push(AggregationIssue::DroppedShare {
                    index,
                    member: member.clone(),
                    amount,
                });
            }
        }

        Some((staged, dropped))
    }
}
