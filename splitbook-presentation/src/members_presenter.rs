use std::fmt::Write as _;

use splitbook_domain::MemberRoster;
use splitbook_i18n as i18n;

pub struct MembersPresenter;

impl MembersPresenter {
    pub fn render(roster: &MemberRoster) -> String {
        let mut reply = String::with_capacity(16 * (roster.len() + 1));
        let _ = writeln!(&mut reply, "{} ({})", i18n::MEMBERS, roster.len());
        for (position, member) in roster.iter().enumerate() {
            let _ = writeln!(&mut reply, "{}. {member}", position + 1);
        }
        reply
    }
}
