//! The allocation engine: ordered backlog, idle robot FIFO and team formation.
//!
//! The pool is driven once per tick through [`MailPool::step`]. Each waiting
//! robot is considered exactly once per step, in registration order, and
//! either joins the team currently being formed, starts a new allocation from
//! the head of the backlog, or stays waiting when there is nothing to carry.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::mem;

use tracing::{debug, info, warn};

use crate::allocation::{AllocationRecord, rank};
use crate::config::WeightPolicy;
use crate::error::{AllocationError, ItemTooHeavy, Rejected, RegistrationError};
use crate::robot::RobotHandle;
use crate::types::{MailId, MailItem, RobotId};

/// Snapshot of the team currently being assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeamProgress {
    pub mail_id: MailId,
    pub acquired: usize,
    pub required: usize,
}

/// Robots gathered for one heavy item. Always holds at least one member and
/// fewer than the item requires; a complete team is dispatched immediately.
#[derive(Debug)]
struct Team<R> {
    record: AllocationRecord,
    members: Vec<R>,
}

impl<R: RobotHandle> Team<R> {
    fn start(record: AllocationRecord, founder: R) -> Self {
        Self {
            record,
            members: vec![founder],
        }
    }

    fn check_join(&self, robot_id: RobotId) -> Result<(), AllocationError> {
        let mail_id = self.record.mail().id;
        if self.members.iter().any(|member| member.id() == robot_id) {
            return Err(AllocationError::DuplicateRobot { mail_id, robot_id });
        }
        let required = self.record.required_robots();
        if self.members.len() >= required {
            return Err(AllocationError::OverAllocation {
                mail_id,
                robot_id,
                required,
            });
        }
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.members.len() == self.record.required_robots()
    }

    fn progress(&self) -> TeamProgress {
        TeamProgress {
            mail_id: self.record.mail().id,
            acquired: self.members.len(),
            required: self.record.required_robots(),
        }
    }

    /// Dispatch every member in joining order and release them.
    fn dispatch(self) -> Vec<R> {
        let mut members = self.members;
        for member in members.iter_mut() {
            member.dispatch();
        }
        members
    }
}

#[derive(Debug)]
enum TeamState<R> {
    Idle,
    Forming(Team<R>),
}

impl<R> Default for TeamState<R> {
    fn default() -> Self {
        TeamState::Idle
    }
}

/// Outcome of one [`MailPool::step`].
#[derive(Debug)]
pub struct StepReport<R> {
    /// Robots dispatched during this step, in dispatch order.
    pub dispatched: Vec<R>,
    /// Heavy-item teams dispatched during this step, partial ones included.
    pub teams_dispatched: usize,
    /// Allocation failures; each one affected a single robot only.
    pub errors: Vec<AllocationError>,
}

impl<R> Default for StepReport<R> {
    fn default() -> Self {
        Self {
            dispatched: Vec::new(),
            teams_dispatched: 0,
            errors: Vec::new(),
        }
    }
}

impl<R> StepReport<R> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn push_team(&mut self, members: Vec<R>) {
        self.teams_dispatched += 1;
        self.dispatched.extend(members);
    }
}

/// Ordered mail backlog and the robots waiting to carry it.
#[derive(Debug)]
pub struct MailPool<R> {
    policy: WeightPolicy,
    backlog: VecDeque<AllocationRecord>,
    idle: VecDeque<R>,
    team: TeamState<R>,
}

impl<R: RobotHandle> MailPool<R> {
    pub fn new(policy: WeightPolicy) -> Self {
        Self {
            policy,
            backlog: VecDeque::new(),
            idle: VecDeque::new(),
            team: TeamState::Idle,
        }
    }

    /// Admit a mail item into the backlog at its rank.
    ///
    /// Items ranking equal to queued ones go behind them, so arrival order
    /// breaks ties.
    pub fn add_to_pool(&mut self, mail: MailItem) -> Result<(), ItemTooHeavy> {
        let record = match AllocationRecord::new(mail, &self.policy) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    mail_id = err.mail_id,
                    weight = err.weight,
                    max_weight = err.max_weight,
                    "mail item rejected: too heavy for any team"
                );
                return Err(err);
            }
        };
        let at = self
            .backlog
            .partition_point(|queued| rank(queued, &record) != Ordering::Greater);
        debug!(
            mail_id = record.mail().id,
            priority = record.priority(),
            destination = record.destination(),
            required_robots = record.required_robots(),
            position = at,
            "mail item added to pool"
        );
        self.backlog.insert(at, record);
        Ok(())
    }

    /// Queue an empty robot for loading. The robot is handed back when it
    /// still carries mail or is already known to the pool.
    pub fn register_waiting(&mut self, robot: R) -> Result<(), Rejected<R>> {
        let robot_id = robot.id();
        let refusal = if !robot.is_empty() {
            Some(RegistrationError::NotEmpty(robot_id))
        } else if self.is_registered(robot_id) {
            Some(RegistrationError::AlreadyRegistered(robot_id))
        } else {
            None
        };
        if let Some(reason) = refusal {
            warn!(robot_id, %reason, "robot registration rejected");
            return Err(Rejected { robot, reason });
        }
        debug!(robot_id, "robot waiting for mail");
        self.idle.push_back(robot);
        Ok(())
    }

    /// Match every waiting robot once, in registration order.
    ///
    /// Robots that are dispatched come back to the caller in the report.
    /// A failed allocation is recorded and the pass moves on to the next
    /// robot.
    pub fn step(&mut self) -> StepReport<R> {
        let mut report = StepReport::default();
        let waiting = mem::take(&mut self.idle);
        for robot in waiting {
            if let Some(robot) = self.load_robot(robot, &mut report) {
                self.idle.push_back(robot);
            }
        }
        report
    }

    /// Returns the robot when it is still waiting after this attempt.
    fn load_robot(&mut self, robot: R, report: &mut StepReport<R>) -> Option<R> {
        match mem::take(&mut self.team) {
            TeamState::Forming(team) => self.join_team(team, robot, report),
            TeamState::Idle => self.start_allocation(robot, report),
        }
    }

    fn join_team(
        &mut self,
        mut team: Team<R>,
        mut robot: R,
        report: &mut StepReport<R>,
    ) -> Option<R> {
        let robot_id = robot.id();
        if let Err(err) = team.check_join(robot_id) {
            warn!(%err, "team allocation failed, dispatching the partial team");
            report.push_team(team.dispatch());
            report.errors.push(err);
            return Some(robot);
        }

        robot.set_hand(team.record.mail().clone());
        team.members.push(robot);
        let progress = team.progress();
        info!(
            robot_id,
            mail_id = progress.mail_id,
            acquired = progress.acquired,
            required = progress.required,
            "robot joins the team"
        );

        if team.is_complete() {
            info!(mail_id = progress.mail_id, "heavy item has its team, dispatching");
            report.push_team(team.dispatch());
        } else {
            info!(
                mail_id = progress.mail_id,
                still_needed = progress.required - progress.acquired,
                "heavy item still needs robots"
            );
            self.team = TeamState::Forming(team);
        }
        None
    }

    fn start_allocation(&mut self, mut robot: R, report: &mut StepReport<R>) -> Option<R> {
        let Some(record) = self.backlog.pop_front() else {
            return Some(robot);
        };
        let robot_id = robot.id();

        // Hand first: the higher-ranked item is the one always carried.
        robot.set_hand(record.mail().clone());
        if !record.is_heavy() {
            if let Some(companion) = self.take_light_record() {
                debug!(robot_id, mail_id = companion.mail().id, "tube loaded");
                robot.set_tube(companion.into_mail());
            }
        }

        if record.is_heavy() {
            let team = Team::start(record, robot);
            let progress = team.progress();
            info!(
                robot_id,
                mail = %team.record.mail(),
                mail_id = progress.mail_id,
                acquired = progress.acquired,
                required = progress.required,
                "robot starts a team for heavy item"
            );
            self.team = TeamState::Forming(team);
        } else {
            debug!(robot_id, mail_id = record.mail().id, "hand loaded, dispatching");
            robot.dispatch();
            report.dispatched.push(robot);
        }
        None
    }

    /// Remove the highest-ranked light record, skipping heavy ones.
    fn take_light_record(&mut self) -> Option<AllocationRecord> {
        let index = self.backlog.iter().position(|record| !record.is_heavy())?;
        self.backlog.remove(index)
    }

    fn is_registered(&self, robot_id: RobotId) -> bool {
        let idle = self.idle.iter().any(|robot| robot.id() == robot_id);
        let on_team = match &self.team {
            TeamState::Forming(team) => team.members.iter().any(|robot| robot.id() == robot_id),
            TeamState::Idle => false,
        };
        idle || on_team
    }

    /// Queued records in rank order.
    pub fn backlog(&self) -> impl Iterator<Item = &AllocationRecord> {
        self.backlog.iter()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    pub fn pending_team(&self) -> Option<TeamProgress> {
        match &self.team {
            TeamState::Forming(team) => Some(team.progress()),
            TeamState::Idle => None,
        }
    }

    /// Nothing queued and no team waiting for members.
    pub fn is_drained(&self) -> bool {
        self.backlog.is_empty() && matches!(self.team, TeamState::Idle)
    }
}
