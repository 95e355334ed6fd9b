#[cfg(all(feature = "zh", feature = "en"))]
compile_error!("Cannot enable both 'zh' and 'en' features at the same time");

#[cfg(feature = "zh")]
pub mod strings {
    pub const HISTORY: &str = "账单记录";
    pub const PAYER: &str = "付款人";
    pub const SHARES: &str = "分摊";
    pub const BALANCES: &str = "当前余额";
    pub const MEMBER: &str = "成员";
    pub const BALANCE: &str = "余额";
    pub const TRANSFERS: &str = "结算方案";
    pub const MEMBERS: &str = "成员列表";
    pub const WARNINGS: &str = "警告";
    pub const SETTLED: &str = "所有账目已结清！";
    pub const NO_DATA: &str = "还没有任何账单记录。";
    pub const NO_TRANSFERS: &str = "剩余余额只是舍入误差，无需转账。";
}

#[cfg(not(feature = "zh"))]
pub mod strings {
    pub const HISTORY: &str = "History";
    pub const PAYER: &str = "Paid by";
    pub const SHARES: &str = "Shares";
    pub const BALANCES: &str = "Balances";
    pub const MEMBER: &str = "Member";
    pub const BALANCE: &str = "Balance";
    pub const TRANSFERS: &str = "Settlement";
    pub const MEMBERS: &str = "Members";
    pub const WARNINGS: &str = "Warnings";
    pub const SETTLED: &str = "Everyone is settled up!";
    pub const NO_DATA: &str = "No expenses recorded yet.";
    pub const NO_TRANSFERS: &str = "Remaining balances are rounding residue; no transfers needed.";
}

pub use strings::*;

#[cfg(feature = "zh")]
pub fn skipped_row(row: usize, reason: impl std::fmt::Display) -> String {
    format!("第 {row} 行无法读取，已跳过: {reason}")
}

#[cfg(feature = "zh")]
pub fn unknown_payer(payer: impl std::fmt::Display) -> String {
    format!("付款人 '{payer}' 已不在成员列表中，该账单未计入")
}

#[cfg(feature = "zh")]
pub fn dropped_share(member: impl std::fmt::Display, amount: impl std::fmt::Display) -> String {
    format!("'{member}' 已不在成员列表中，其分摊 {amount} 未计入")
}

#[cfg(feature = "zh")]
pub fn overflowed(total: impl std::fmt::Display) -> String {
    format!("金额为 {total} 的账单超出可计算范围，该账单未计入")
}

#[cfg(feature = "zh")]
pub fn recorded(description: impl std::fmt::Display, total: impl std::fmt::Display) -> String {
    format!("已记录: {description} ({total})")
}

#[cfg(not(feature = "zh"))]
pub fn skipped_row(row: usize, reason: impl std::fmt::Display) -> String {
    format!("Skipped unreadable row {row}: {reason}")
}

#[cfg(not(feature = "zh"))]
pub fn unknown_payer(payer: impl std::fmt::Display) -> String {
    format!("Payer '{payer}' is no longer a member; expense not counted")
}

#[cfg(not(feature = "zh"))]
pub fn dropped_share(member: impl std::fmt::Display, amount: impl std::fmt::Display) -> String {
    format!("'{member}' is no longer a member; share of {amount} not counted")
}

#[cfg(not(feature = "zh"))]
pub fn overflowed(total: impl std::fmt::Display) -> String {
    format!("An expense of {total} is too large to add to the balances; expense not counted")
}

#[cfg(not(feature = "zh"))]
pub fn recorded(description: impl std::fmt::Display, total: impl std::fmt::Display) -> String {
    format!("Recorded: {description} ({total})")
}
