//! Reportability rules and notification text.

use crate::model::FinalizedBattleReport;
use crate::roles::CreepRole;

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// Replay links point a few ticks before the first blow lands.
const LINK_LEAD_TICKS: u64 = 5;

/// Whether a battle is worth a notification.
///
/// It takes two engaged sides: a participant counts as engaged when it is
/// the room owner (defending with structures is engagement enough) or when
/// it fielded at least one combat-capable creep. A lone player shredding
/// someone's idle haulers in neutral territory is not a battle.
pub fn is_reportable(report: &FinalizedBattleReport) -> bool {
    if report.player_count() < 2 {
        return false;
    }
    let engaged = report
        .player_creep_counts
        .iter()
        .filter(|(player, roles)| {
            report.owner.as_deref() == Some(player.as_str())
                || roles.keys().any(|label| {
                    label != CreepRole::Civilian.label() && label != CreepRole::Scout.label()
                })
        })
        .count();
    engaged >= 2
}

/// Render the notification text for a finalized battle.
pub fn format_message(report: &FinalizedBattleReport) -> String {
    let room = report.room.as_str();
    let link_tick = report
        .earliest_hostilities_detected
        .saturating_sub(LINK_LEAD_TICKS);

    let room_part = match &report.owner {
        Some(owner) => format!(" ({}, {})", owner, report.rcl),
        None => String::new(),
    };

    let mut sides: Vec<_> = report.player_creep_counts.iter().collect();
    sides.sort_by(|(a_name, a_roles), (b_name, b_roles)| {
        let a_total: u32 = a_roles.values().sum();
        let b_total: u32 = b_roles.values().sum();
        b_total.cmp(&a_total).then_with(|| a_name.cmp(b_name))
    });

    let battle_part = sides
        .iter()
        .map(|(name, roles)| describe_side(report, name, roles))
        .collect::<Vec<_>>()
        .join(" vs. ");

    let mut message = format!(
        "Battle in <https://screeps.com/a/#!/history/{}?t={}|{}>{}: {} - {}",
        room,
        link_tick,
        room,
        room_part,
        battle_part,
        pluralize(report.duration, "tick"),
    );
    if report.battle_still_ongoing {
        message.push_str(" and ongoing");
    }
    message
}

fn describe_side(
    report: &FinalizedBattleReport,
    name: &str,
    roles: &std::collections::BTreeMap<String, u32>,
) -> String {
    let tag_part = match report.alliances.get(name) {
        Some(Some(tag)) => format!(" [{}]", tag),
        _ => String::new(),
    };
    let role_part = roles
        .iter()
        .map(|(label, count)| pluralize(u64::from(*count), label))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}{} ({})", name, tag_part, role_part)
}

fn pluralize(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
