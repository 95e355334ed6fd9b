use std::{
    borrow::Borrow,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use arcstr::ArcStr;
use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);
    /// Tolerance (0.01) applied to every equality check on monetary sums.
    pub const EPSILON: Self = Self(Decimal::from_parts(1, 0, 0, false, 2));
    /// Half a cent; anything smaller renders as `0.00`.
    pub const DUST: Self = Self(Decimal::from_parts(5, 0, 0, false, 3));

    pub fn new(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// `None` when the sum leaves the representable decimal range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// `true` when `self` and `other` differ by at most [`Money::EPSILON`].
    pub fn approx_eq(self, other: Self) -> bool {
        self.checked_sub(other)
            .is_some_and(|diff| diff.abs() <= Self::EPSILON)
    }

    /// `true` when the amount lies inside the epsilon band around zero.
    pub fn is_settled(self) -> bool {
        self.abs() <= Self::EPSILON
    }

    /// Splits the amount into `parts` equal portions without further rounding.
    ///
    /// `parts` must be non-zero.
    pub fn split(self, parts: usize) -> Self {
        debug_assert!(parts > 0);
        Self(self.0 / Decimal::from(parts))
    }

    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cents = self.round_cents().0;
        if cents.is_zero() {
            cents = Decimal::ZERO;
        }
        cents.rescale(2);
        write!(f, "{cents}")
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("member name must not be empty")]
    EmptyName,
    #[error("member '{0}' is already registered")]
    Duplicate(Member),
}

/// A ledger participant, identified by a trimmed, non-empty name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Member(ArcStr);

impl Member {
    pub fn new(name: &str) -> Result<Self, RosterError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RosterError::EmptyName);
        }
        Ok(Self(ArcStr::from(trimmed)))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Member {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered members in registration order.
///
/// The roster is owned by the caller and passed explicitly into every engine
/// operation. Removing a member never rewrites historical records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberRoster {
    members: IndexSet<Member>,
}

impl MemberRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_from_names<I, S>(names: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roster = Self::new();
        for name in names {
            roster.add(name.as_ref())?;
        }
        Ok(roster)
    }

    pub fn add(&mut self, name: &str) -> Result<Member, RosterError> {
        let member = Member::new(name)?;
        if self.members.contains(member.name()) {
            return Err(RosterError::Duplicate(member));
        }
        self.members.insert(member.clone());
        Ok(member)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.members.shift_remove(name.trim())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn resolve(&self, name: &str) -> Option<&Member> {
        self.members.get(name.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> + '_ {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Per-member portion of one expense, in roster order at creation time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Shares {
    entries: IndexMap<Member, Money>,
}

impl Shares {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, member: Member, amount: Money) {
        self.entries.insert(member, amount);
    }

    pub fn get(&self, name: &str) -> Option<Money> {
        self.entries.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Member, Money)> + '_ {
        self.entries.iter().map(|(member, amount)| (member, *amount))
    }

    /// Entries with a strictly positive amount.
    pub fn active(&self) -> impl Iterator<Item = (&Member, Money)> + '_ {
        self.iter().filter(|(_, amount)| amount.is_positive())
    }

    /// Sum of every entry, or `None` if it overflows.
    pub fn checked_total(&self) -> Option<Money> {
        self.entries
            .values()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Member, Money)> for Shares {
    fn from_iter<T: IntoIterator<Item = (Member, Money)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub description: String,
    pub total: Money,
    pub payer: Member,
    pub shares: Shares,
}

/// Net position per member: positive is owed by the group, negative owes it.
pub type MemberBalances = IndexMap<Member, Money>;

pub fn total_balance(balances: &MemberBalances) -> Money {
    balances.values().sum()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: Member,
    pub to: Member,
    pub amount: Money,
}

/// Ordered transfers that bring a balance snapshot back to zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettlementPlan {
    transfers: Vec<Transfer>,
}

impl SettlementPlan {
    pub fn new(transfers: Vec<Transfer>) -> Self {
        Self { transfers }
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn total(&self) -> Money {
        self.transfers.iter().map(|transfer| transfer.amount).sum()
    }

    /// Balances after every transfer has been paid.
    pub fn apply_to(&self, balances: &MemberBalances) -> MemberBalances {
        let mut settled = balances.clone();
        for transfer in &self.transfers {
            *settled.entry(transfer.from.clone()).or_insert(Money::ZERO) += transfer.amount;
            *settled.entry(transfer.to.clone()).or_insert(Money::ZERO) -= transfer.amount;
        }
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::whole(Money::from_i64(30), "30.00")]
    #[case::rounds_half_away(Money::new(12345, 3), "12.35")]
    #[case::negative(Money::new(-505, 2), "-5.05")]
    #[case::negative_dust_is_zero(Money::new(-1, 4), "0.00")]
    fn money_display_uses_cents(#[case] money: Money, #[case] expected: &str) {
        assert_eq!(money.to_string(), expected);
    }

    #[rstest]
    #[case(Money::new(100, 2), Money::new(101, 2), true)]
    #[case(Money::new(100, 2), Money::new(102, 2), false)]
    #[case(Money::ZERO, Money::new(-1, 2), true)]
    fn approx_eq_uses_epsilon(#[case] lhs: Money, #[case] rhs: Money, #[case] expected: bool) {
        assert_eq!(lhs.approx_eq(rhs), expected);
    }

    #[test]
    fn approx_eq_is_false_when_the_difference_overflows() {
        let max = Money::from_decimal(Decimal::MAX);
        let min = Money::from_decimal(Decimal::MIN);

        assert!(!max.approx_eq(min));
        assert!(max.approx_eq(max));
    }

    #[rstest]
    #[case::add_overflows(Money::from_decimal(Decimal::MAX).checked_add(Money::from_i64(1)), None)]
    #[case::sub_overflows(Money::from_decimal(Decimal::MIN).checked_sub(Money::from_i64(1)), None)]
    #[case::add_in_range(Money::from_i64(2).checked_add(Money::new(50, 2)), Some(Money::new(250, 2)))]
    fn checked_arithmetic(#[case] result: Option<Money>, #[case] expected: Option<Money>) {
        assert_eq!(result, expected);
    }

    #[test]
    fn shares_total_reports_overflow() {
        let shares: Shares = ["A", "B"]
            .into_iter()
            .map(|name| (Member::new(name).expect("name"), Money::from_decimal(Decimal::MAX)))
            .collect();

        assert_eq!(shares.checked_total(), None);
    }

    #[test]
    fn roster_keeps_registration_order() {
        let roster = MemberRoster::try_from_names(["Mom", "Dad", "Me"]).expect("valid roster");
        let names: Vec<_> = roster.iter().map(Member::name).collect();
        assert_eq!(names, vec!["Mom", "Dad", "Me"]);
    }

    #[rstest]
    #[case::blank("   ", RosterError::EmptyName)]
    #[case::duplicate(" A ", RosterError::Duplicate(Member::new("A").expect("name")))]
    fn roster_rejects_invalid_names(#[case] name: &str, #[case] expected: RosterError) {
        let mut roster = MemberRoster::try_from_names(["A"]).expect("valid roster");
        assert_eq!(roster.add(name), Err(expected));
    }

    #[test]
    fn roster_remove_preserves_remaining_order() {
        let mut roster = MemberRoster::try_from_names(["A", "B", "C"]).expect("valid roster");
        assert!(roster.remove("B"));
        assert!(!roster.remove("B"));
        let names: Vec<_> = roster.iter().map(Member::name).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn plan_apply_moves_money_from_debtor_to_creditor() {
        let a = Member::new("A").expect("name");
        let b = Member::new("B").expect("name");
        let balances = MemberBalances::from_iter([
            (a.clone(), Money::from_i64(30)),
            (b.clone(), Money::from_i64(-30)),
        ]);
        let plan = SettlementPlan::new(vec![Transfer {
            from: b.clone(),
            to: a.clone(),
            amount: Money::from_i64(30),
        }]);

        let settled = plan.apply_to(&balances);

        assert_eq!(settled.get(&a), Some(&Money::ZERO));
        assert_eq!(settled.get(&b), Some(&Money::ZERO));
        assert_eq!(plan.total(), Money::from_i64(30));
    }
}
