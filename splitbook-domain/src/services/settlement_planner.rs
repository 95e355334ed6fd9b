use crate::model::{Member, MemberBalances, Money, SettlementPlan, Transfer};

/// Greedy settlement planning service
///
/// Debtors are matched against creditors in balance-map order. The result is
/// deterministic but makes no attempt to minimise the number of transfers.
pub struct SettlementPlanner;

impl SettlementPlanner {
    /// Plans transfers that bring every balance within [`Money::EPSILON`] of zero.
    ///
    /// Members already inside the epsilon band take no part. An empty plan
    /// means the ledger is fully settled.
    pub fn plan(&self, balances: &MemberBalances) -> SettlementPlan {
        let mut debtors: Vec<(&Member, Money)> = Vec::new();
        let mut creditors: Vec<(&Member, Money)> = Vec::new();
        for (member, balance) in balances {
            if *balance < -Money::EPSILON {
                debtors.push((member, balance.abs()));
            } else if *balance > Money::EPSILON {
                creditors.push((member, *balance));
            }
        }

        let mut transfers = Vec::with_capacity(debtors.len() + creditors.len());
        for (debtor, debt) in &mut debtors {
            for (creditor, credit) in &mut creditors {
                if *debt <= Money::ZERO {
                    break;
                }
                if *credit <= Money::ZERO {
                    continue;
                }

                let amount = (*debt).min(*credit);
                *debt -= amount;
                *credit -= amount;

                // Residue of decimal division; would render as 0.00.
                if amount < Money::DUST {
                    tracing::trace!(from = %debtor, to = %creditor, %amount, "dropping dust transfer");
                    continue;
                }

                transfers.push(Transfer {
                    from: (*debtor).clone(),
                    to: (*creditor).clone(),
                    amount,
                });
            }
        }

        tracing::debug!(
            debtors = debtors.len(),
            creditors = creditors.len(),
            transfers = transfers.len(),
            "planned settlement"
        );

        SettlementPlan::new(transfers)
    }
}
