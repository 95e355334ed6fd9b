use crate::model::{Member, MemberRoster, Money, Shares};
use fxhash::{FxHashMap, FxHashSet};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitMode {
    Equal,
    Manual,
}

/// How one expense is divided, together with the input that mode needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitSelection {
    /// Divide the total evenly among these participants.
    Equal(Vec<Member>),
    /// Explicit amounts; members left out owe nothing.
    Manual(Vec<(Member, Money)>),
}

impl SplitSelection {
    pub fn mode(&self) -> SplitMode {
        match self {
            Self::Equal(_) => SplitMode::Equal,
            Self::Manual(_) => SplitMode::Manual,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("an equal split needs at least one participant")]
    InvalidSplit,
    #[error("shares sum to {actual} but the total is {expected}")]
    ShareMismatch { expected: Money, actual: Money },
    #[error("'{0}' is not a registered member")]
    UnknownMember(Member),
    #[error("shares are too large to add up")]
    Overflow,
}

/// Share calculation service
pub struct ShareCalculator;

impl ShareCalculator {
    /// Builds the share mapping for one expense.
    ///
    /// The result covers every roster member in roster order; members outside
    /// the selection get a zero share. Manual amounts are reported as given,
    /// so callers must run [`ShareCalculator::validate`] before storing.
    pub fn compute(
        &self,
        total: Money,
        selection: &SplitSelection,
        roster: &MemberRoster,
    ) -> Result<Shares, ShareError> {
        let shares = match selection {
            SplitSelection::Equal(participants) => Self::equal(total, participants, roster)?,
            SplitSelection::Manual(amounts) => Self::manual(amounts, roster)?,
        };
        tracing::debug!(
            mode = ?selection.mode(),
            %total,
            share_total = ?shares.checked_total(),
            "computed shares"
        );
        Ok(shares)
    }

    /// Rejects shares that do not add up to `total` within [`Money::EPSILON`].
    pub fn validate(&self, total: Money, shares: &Shares) -> Result<(), ShareError> {
        let actual = shares.checked_total().ok_or(ShareError::Overflow)?;
        if actual.approx_eq(total) {
            Ok(())
        } else {
            Err(ShareError::ShareMismatch {
                expected: total,
                actual,
            })
        }
    }

    fn equal(
        total: Money,
        participants: &[Member],
        roster: &MemberRoster,
    ) -> Result<Shares, ShareError> {
        let mut selected: FxHashSet<&str> = FxHashSet::default();
        for participant in participants {
            if !roster.contains(participant.name()) {
                return Err(ShareError::UnknownMember(participant.clone()));
            }
            selected.insert(participant.name());
        }
        if selected.is_empty() {
            return Err(ShareError::InvalidSplit);
        }

        let per_person = total.split(selected.len());
        Ok(roster
            .iter()
            .map(|member| {
                let share = if selected.contains(member.name()) {
                    per_person
                } else {
                    Money::ZERO
                };
                (member.clone(), share)
            })
            .collect())
    }

    fn manual(amounts: &[(Member, Money)], roster: &MemberRoster) -> Result<Shares, ShareError> {
        let mut supplied: FxHashMap<&str, Money> = FxHashMap::default();
        for (member, amount) in amounts {
            if !roster.contains(member.name()) {
                return Err(ShareError::UnknownMember(member.clone()));
            }
            supplied.insert(member.name(), *amount);
        }

        Ok(roster
            .iter()
            .map(|member| {
                let share = supplied.get(member.name()).copied().unwrap_or(Money::ZERO);
                (member.clone(), share)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn calculator() -> ShareCalculator {
        ShareCalculator
    }

    #[fixture]
    fn roster() -> MemberRoster {
        MemberRoster::try_from_names(["A", "B", "C"]).expect("valid roster")
    }

    fn member(name: &str) -> Member {
        Member::new(name).expect("valid name")
    }

    fn amounts(shares: &Shares) -> Vec<(String, Money)> {
        shares
            .iter()
            .map(|(member, amount)| (member.name().to_owned(), amount))
            .collect()
    }

    #[rstest]
    #[case::everyone(
        Money::from_i64(90),
        vec!["A", "B", "C"],
        vec![("A", 30), ("B", 30), ("C", 30)]
    )]
    #[case::subset(
        Money::from_i64(50),
        vec!["C", "A"],
        vec![("A", 25), ("B", 0), ("C", 25)]
    )]
    #[case::duplicate_participant_counted_once(
        Money::from_i64(40),
        vec!["B", "B", "C"],
        vec![("A", 0), ("B", 20), ("C", 20)]
    )]
    fn equal_split_cases(
        calculator: ShareCalculator,
        roster: MemberRoster,
        #[case] total: Money,
        #[case] participants: Vec<&str>,
        #[case] expected: Vec<(&str, i64)>,
    ) {
        let selection = SplitSelection::Equal(participants.into_iter().map(member).collect());

        let shares = calculator
            .compute(total, &selection, &roster)
            .expect("equal split should succeed");

        let expected: Vec<(String, Money)> = expected
            .into_iter()
            .map(|(name, amount)| (name.to_owned(), Money::from_i64(amount)))
            .collect();
        assert_eq!(amounts(&shares), expected);
        assert!(calculator.validate(total, &shares).is_ok());
    }

    #[rstest]
    fn equal_split_without_participants_is_invalid(
        calculator: ShareCalculator,
        roster: MemberRoster,
    ) {
        let result = calculator.compute(Money::from_i64(10), &SplitSelection::Equal(vec![]), &roster);
        assert_eq!(result, Err(ShareError::InvalidSplit));
    }

    #[rstest]
    fn equal_split_of_a_third_stays_within_epsilon(
        calculator: ShareCalculator,
        roster: MemberRoster,
    ) {
        let total = Money::from_i64(100);
        let selection = SplitSelection::Equal(vec![member("A"), member("B"), member("C")]);

        let shares = calculator
            .compute(total, &selection, &roster)
            .expect("equal split should succeed");

        assert_eq!(shares.get("A"), shares.get("C"));
        assert!(calculator.validate(total, &shares).is_ok());
    }

    #[rstest]
    fn manual_split_defaults_missing_members_to_zero(
        calculator: ShareCalculator,
        roster: MemberRoster,
    ) {
        let selection = SplitSelection::Manual(vec![
            (member("C"), Money::new(1250, 2)),
            (member("A"), Money::new(750, 2)),
        ]);

        let shares = calculator
            .compute(Money::from_i64(20), &selection, &roster)
            .expect("manual split should succeed");

        assert_eq!(
            amounts(&shares),
            vec![
                ("A".to_owned(), Money::new(750, 2)),
                ("B".to_owned(), Money::ZERO),
                ("C".to_owned(), Money::new(1250, 2)),
            ]
        );
    }

    #[rstest]
    #[case::short(Money::new(1998, 2))]
    #[case::over(Money::new(2002, 2))]
    fn manual_split_mismatch_is_rejected(
        calculator: ShareCalculator,
        roster: MemberRoster,
        #[case] declared_total: Money,
    ) {
        let selection = SplitSelection::Manual(vec![(member("A"), Money::from_i64(20))]);
        let shares = calculator
            .compute(declared_total, &selection, &roster)
            .expect("manual split never fails on sums");

        assert_eq!(
            calculator.validate(declared_total, &shares),
            Err(ShareError::ShareMismatch {
                expected: declared_total,
                actual: Money::from_i64(20),
            })
        );
    }

    #[rstest]
    fn manual_split_that_overflows_is_rejected(calculator: ShareCalculator, roster: MemberRoster) {
        let max = Money::from_decimal(rust_decimal::Decimal::MAX);
        let selection = SplitSelection::Manual(vec![(member("A"), max), (member("B"), max)]);
        let shares = calculator
            .compute(max, &selection, &roster)
            .expect("manual split never fails on sums");

        assert_eq!(calculator.validate(max, &shares), Err(ShareError::Overflow));
    }

    #[rstest]
    #[case::equal(SplitSelection::Equal(vec![member("A"), member("Z")]))]
    #[case::manual(SplitSelection::Manual(vec![(member("Z"), Money::from_i64(5))]))]
    fn unknown_members_are_rejected(
        calculator: ShareCalculator,
        roster: MemberRoster,
        #[case] selection: SplitSelection,
    ) {
        let result = calculator.compute(Money::from_i64(5), &selection, &roster);
        assert_eq!(result, Err(ShareError::UnknownMember(member("Z"))));
    }
}
