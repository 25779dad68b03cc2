//! Shared identifiers and the mail item model used across the system.

use std::fmt;

/// Unique identifier for a mail item.
pub type MailId = u64;
/// Unique identifier for a delivery robot.
pub type RobotId = u64;
/// Building floor number.
pub type Floor = u32;

/// Priority assigned to items that arrive without an explicit level.
pub const DEFAULT_PRIORITY: u32 = 1;

/// Unit of work carried by robots. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailItem {
    /// Stable item identifier for logging and validation.
    pub id: MailId,
    /// Floor the item must be delivered to.
    pub destination_floor: Floor,
    /// Item weight in grams.
    pub weight: u32,
    /// Explicit priority level; `None` for ordinary mail.
    pub priority_level: Option<u32>,
}

impl MailItem {
    /// Construct an ordinary (non-priority) mail item.
    pub fn new(id: MailId, destination_floor: Floor, weight: u32) -> Self {
        Self {
            id,
            destination_floor,
            weight,
            priority_level: None,
        }
    }

    /// Construct a priority mail item.
    pub fn priority(id: MailId, destination_floor: Floor, weight: u32, level: u32) -> Self {
        Self {
            id,
            destination_floor,
            weight,
            priority_level: Some(level),
        }
    }

    /// Effective priority used for ordering.
    pub fn effective_priority(&self) -> u32 {
        self.priority_level.unwrap_or(DEFAULT_PRIORITY)
    }
}

impl fmt::Display for MailItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mail Item:: ID: {:>6} | Destination: {:>2} | Weight: {:>4}",
            self.id, self.destination_floor, self.weight
        )?;
        if let Some(level) = self.priority_level {
            write!(f, " | Priority: {level:>3}")?;
        }
        Ok(())
    }
}
