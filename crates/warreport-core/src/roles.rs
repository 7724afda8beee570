//! Creep role classification.
//!
//! A creep's body composition determines its role in a battle summary.
//! Classification is a pure function over part types; part counts matter
//! only for the dismantler rule, and hit points never matter.

use screeps_api::PartType;
use std::fmt;

#[cfg(test)]
#[path = "roles_tests.rs"]
mod tests;

/// Minimum number of work parts for a dismantler archetype.
const DISMANTLER_WORK_PARTS: usize = 9;

/// Role of a creep, derived from its body.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CreepRole {
    MeleeAttacker,
    RangedAttacker,
    Healer,
    DismantlingAttacker,
    GeneralAttacker,
    ToughAttacker,
    Civilian,
    WorkAndCarryAttacker,
    Scout,
    /// Fallback: no rule matched. Carries the distinct part initials of
    /// the body, in body order.
    Unrecognized(String),
}

impl CreepRole {
    /// Label used in counts, reports, and stored state.
    pub fn label(&self) -> &str {
        match self {
            Self::MeleeAttacker => "melee_attacker",
            Self::RangedAttacker => "ranged_attacker",
            Self::Healer => "healer",
            Self::DismantlingAttacker => "dismantling_attacker",
            Self::GeneralAttacker => "general_attacker",
            Self::ToughAttacker => "tough_attacker",
            Self::Civilian => "civilian",
            Self::WorkAndCarryAttacker => "work_and_carry_attacker",
            Self::Scout => "scout",
            Self::Unrecognized(initials) => initials,
        }
    }

    /// Roles that never count toward hostile participation.
    pub fn is_noncombatant(&self) -> bool {
        matches!(self, Self::Civilian | Self::Scout)
    }
}

impl fmt::Display for CreepRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify a creep body into a role. First matching rule wins.
pub fn classify(body: &[PartType]) -> CreepRole {
    let has = |part: PartType| body.contains(&part);
    let attack = has(PartType::Attack);
    let ranged = has(PartType::RangedAttack);
    let heal = has(PartType::Heal);
    let carry = has(PartType::Carry);
    let work_parts = body.iter().filter(|p| **p == PartType::Work).count();

    if ranged && !attack {
        return CreepRole::RangedAttacker;
    }
    if attack && !ranged {
        return CreepRole::MeleeAttacker;
    }
    if heal && !ranged && !attack {
        return CreepRole::Healer;
    }
    if work_parts >= DISMANTLER_WORK_PARTS && !carry {
        return CreepRole::DismantlingAttacker;
    }
    if (ranged || heal || attack) && !carry {
        return CreepRole::GeneralAttacker;
    }
    if has(PartType::Tough)
        && body
            .iter()
            .all(|p| matches!(p, PartType::Move | PartType::Tough))
    {
        return CreepRole::ToughAttacker;
    }
    if work_parts > 0 || carry || has(PartType::Claim) {
        if attack || ranged || heal {
            return CreepRole::WorkAndCarryAttacker;
        }
        return CreepRole::Civilian;
    }
    if !body.is_empty() && body.iter().all(|p| *p == PartType::Move) {
        return CreepRole::Scout;
    }

    CreepRole::Unrecognized(part_initials(body))
}

/// Distinct part initials in body order, e.g. `MCA` for move/carry/attack.
fn part_initials(body: &[PartType]) -> String {
    let mut seen = Vec::new();
    let mut initials = String::new();
    for part in body {
        if !seen.contains(part) {
            seen.push(*part);
            initials.push(part.initial());
        }
    }
    initials
}
