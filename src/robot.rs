//! What the pool needs from a delivery robot, plus a plain slot-holding robot.

use std::fmt;

use tracing::{debug, warn};

use crate::types::{MailItem, RobotId};

/// Operations the mail pool performs on a robot it is loading.
///
/// The pool owns a robot from registration until dispatch and hands it back
/// to the caller afterwards.
pub trait RobotHandle: fmt::Debug {
    fn id(&self) -> RobotId;

    /// True when both the hand and the tube are free.
    fn is_empty(&self) -> bool;

    /// Load the primary slot. Always filled before the tube.
    fn set_hand(&mut self, item: MailItem);

    /// Load the secondary slot; only used alongside a light hand item.
    fn set_tube(&mut self, item: MailItem);

    /// Start delivery of the current load.
    fn dispatch(&mut self);
}

/// Lifecycle of a [`Carrier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarrierState {
    Waiting,
    Dispatched,
}

/// Robot with one hand and one tube and no movement of its own.
#[derive(Clone, Debug)]
pub struct Carrier {
    id: RobotId,
    hand: Option<MailItem>,
    tube: Option<MailItem>,
    state: CarrierState,
    dispatch_count: u64,
}

impl Carrier {
    pub fn new(id: RobotId) -> Self {
        Self {
            id,
            hand: None,
            tube: None,
            state: CarrierState::Waiting,
            dispatch_count: 0,
        }
    }

    pub fn hand(&self) -> Option<&MailItem> {
        self.hand.as_ref()
    }

    pub fn tube(&self) -> Option<&MailItem> {
        self.tube.as_ref()
    }

    pub fn state(&self) -> CarrierState {
        self.state
    }

    /// Number of loads this robot has been sent out with.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// Hand over everything carried and return to waiting.
    pub fn unload(&mut self) -> Vec<MailItem> {
        self.state = CarrierState::Waiting;
        self.hand.take().into_iter().chain(self.tube.take()).collect()
    }
}

impl RobotHandle for Carrier {
    fn id(&self) -> RobotId {
        self.id
    }

    fn is_empty(&self) -> bool {
        self.hand.is_none() && self.tube.is_none()
    }

    fn set_hand(&mut self, item: MailItem) {
        debug_assert!(self.hand.is_none(), "hand already loaded on robot {}", self.id);
        self.hand = Some(item);
    }

    fn set_tube(&mut self, item: MailItem) {
        debug_assert!(self.tube.is_none(), "tube already loaded on robot {}", self.id);
        self.tube = Some(item);
    }

    fn dispatch(&mut self) {
        if self.state == CarrierState::Dispatched {
            warn!(robot_id = self.id, "dispatch ignored: robot already out");
            return;
        }
        self.state = CarrierState::Dispatched;
        self.dispatch_count += 1;
        debug!(
            robot_id = self.id,
            hand = ?self.hand.as_ref().map(|m| m.id),
            tube = ?self.tube.as_ref().map(|m| m.id),
            "robot dispatched"
        );
    }
}
