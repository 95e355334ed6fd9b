#[cfg(all(feature = "zh", feature = "en"))]
compile_error!("Cannot enable both 'zh' and 'en' features at the same time");

#[cfg(feature = "zh")]
pub fn syntax_error_detail(error: impl std::fmt::Display) -> String {
    format!("语法错误 - {error}")
}

#[cfg(feature = "zh")]
pub fn syntax_error_unparsed_detail(input: impl std::fmt::Display) -> String {
    format!("语法错误 - 无法解析的输入: {input}")
}

#[cfg(feature = "zh")]
pub fn invalid_number_detail(literal: impl std::fmt::Display) -> String {
    format!("无效的金额: {literal}")
}

#[cfg(not(feature = "zh"))]
pub fn syntax_error_detail(error: impl std::fmt::Display) -> String {
    format!("Syntax error - {error}")
}

#[cfg(not(feature = "zh"))]
pub fn syntax_error_unparsed_detail(input: impl std::fmt::Display) -> String {
    format!("Syntax error - Unparsed input: {input}")
}

#[cfg(not(feature = "zh"))]
pub fn invalid_number_detail(literal: impl std::fmt::Display) -> String {
    format!("Invalid amount: {literal}")
}
