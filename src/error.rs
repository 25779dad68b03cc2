//! Error taxonomy for admission, registration and allocation.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{MailId, RobotId};

/// Raised when an item is heavier than the largest team can carry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mail item {mail_id} too heavy: weight {weight} exceeds team maximum {max_weight}")]
pub struct ItemTooHeavy {
    pub mail_id: MailId,
    pub weight: u32,
    pub max_weight: u32,
}

/// Invariant violations while forming a team.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The same robot was offered twice to one team.
    #[error("robot {robot_id} is already on the team for mail item {mail_id}")]
    DuplicateRobot { mail_id: MailId, robot_id: RobotId },

    /// The team already holds every robot it needs.
    #[error("team for mail item {mail_id} already has {required} robots; robot {robot_id} rejected")]
    OverAllocation {
        mail_id: MailId,
        robot_id: RobotId,
        required: usize,
    },
}

/// Why a robot could not join the idle queue.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("robot {0} still carries mail")]
    NotEmpty(RobotId),

    #[error("robot {0} is already registered with the pool")]
    AlreadyRegistered(RobotId),
}

/// A refused registration; hands the robot back so the caller keeps ownership.
#[derive(Error, Debug)]
#[error("registration rejected: {reason}")]
pub struct Rejected<R: std::fmt::Debug> {
    pub robot: R,
    pub reason: RegistrationError,
}

impl<R: std::fmt::Debug> Rejected<R> {
    /// Recover the robot that was refused.
    pub fn into_robot(self) -> R {
        self.robot
    }
}

/// Configuration loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(
        "weight thresholds must be strictly increasing: individual={individual_max} pair={pair_max} triple={triple_max}"
    )]
    InvalidThresholds {
        individual_max: u32,
        pair_max: u32,
        triple_max: u32,
    },

    #[error("invalid simulation setting: {0}")]
    InvalidSimulation(String),
}
