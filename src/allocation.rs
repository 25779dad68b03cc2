//! Scheduling metadata derived from a mail item, and the order the pool keeps.

use std::cmp::Ordering;

use crate::config::WeightPolicy;
use crate::error::ItemTooHeavy;
use crate::types::{Floor, MailItem};

/// Number of robots needed to carry an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TeamSize {
    Single,
    Pair,
    Triple,
}

impl TeamSize {
    /// Classify a weight against the policy tiers.
    pub fn for_weight(weight: u32, policy: &WeightPolicy) -> Option<Self> {
        if weight <= policy.individual_max {
            Some(TeamSize::Single)
        } else if weight <= policy.pair_max {
            Some(TeamSize::Pair)
        } else if weight <= policy.triple_max {
            Some(TeamSize::Triple)
        } else {
            None
        }
    }

    pub fn robots(self) -> usize {
        match self {
            TeamSize::Single => 1,
            TeamSize::Pair => 2,
            TeamSize::Triple => 3,
        }
    }
}

/// A mail item admitted to the pool, with its derived ranking and team size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationRecord {
    priority: u32,
    destination: Floor,
    team_size: TeamSize,
    mail: MailItem,
}

impl AllocationRecord {
    /// Derive the record, failing when no team is strong enough.
    pub fn new(mail: MailItem, policy: &WeightPolicy) -> Result<Self, ItemTooHeavy> {
        let team_size = TeamSize::for_weight(mail.weight, policy).ok_or(ItemTooHeavy {
            mail_id: mail.id,
            weight: mail.weight,
            max_weight: policy.triple_max,
        })?;
        Ok(Self {
            priority: mail.effective_priority(),
            destination: mail.destination_floor,
            team_size,
            mail,
        })
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn destination(&self) -> Floor {
        self.destination
    }

    pub fn required_robots(&self) -> usize {
        self.team_size.robots()
    }

    /// Heavy items need a team and never share a robot with a tube item.
    pub fn is_heavy(&self) -> bool {
        self.team_size != TeamSize::Single
    }

    pub fn mail(&self) -> &MailItem {
        &self.mail
    }

    pub fn into_mail(self) -> MailItem {
        self.mail
    }
}

/// Rank order: higher priority first, then higher destination floor.
///
/// Equal records compare `Equal`; arrival order among them is kept by the
/// container, never by this function.
pub fn rank(a: &AllocationRecord, b: &AllocationRecord) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.destination.cmp(&a.destination))
}
