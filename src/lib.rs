//! Mail allocation engine for a fleet of delivery robots.
//!
//! - **types**: mail items and identifiers
//! - **config**: weight thresholds and simulation settings
//! - **allocation**: per-item scheduling record and rank order
//! - **robot**: the robot contract the pool drives
//! - **mail_pool**: backlog, idle robots, team formation and `step`
//! - **sim**: tick-driven driver used by the binary

pub mod allocation;
pub mod config;
pub mod error;
pub mod logging;
pub mod mail_pool;
pub mod robot;
pub mod sim;
pub mod types;

pub use allocation::{AllocationRecord, TeamSize};
pub use config::{AutomailConfig, SimulationConfig, WeightPolicy};
pub use error::{AllocationError, ConfigError, ItemTooHeavy, Rejected, RegistrationError};
pub use mail_pool::{MailPool, StepReport, TeamProgress};
pub use robot::{Carrier, CarrierState, RobotHandle};
pub use types::{Floor, MailId, MailItem, RobotId};
