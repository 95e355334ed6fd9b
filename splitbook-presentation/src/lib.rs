#![warn(clippy::uninlined_format_args)]

pub mod members_presenter;
pub mod report_presenter;
pub mod text_table;

pub use members_presenter::MembersPresenter;
pub use report_presenter::ReportPresenter;
pub use text_table::{Alignment, TextTableBuilder, display_width};
