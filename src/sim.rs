//! Tick-driven simulation, benchmark and stress runners around the mail pool.
//!
//! Everything here stands in for the building: mail arrives on a generated
//! schedule, dispatched robots take a fixed round trip to their furthest
//! floor, and come back to register with the pool again.

use std::collections::HashSet;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info_span, warn};

use crate::config::{AutomailConfig, SimulationConfig, WeightPolicy};
use crate::error::ConfigError;
use crate::mail_pool::MailPool;
use crate::robot::Carrier;
use crate::types::{MailId, MailItem};

// Priority levels handed to priority mail, as in the building's mail room.
const PRIORITY_LEVELS: [u32; 2] = [10, 100];
// Lightest generated item.
const MIN_WEIGHT: u32 = 200;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data; all-zero is a valid value.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// A mail item and the tick it reaches the mail room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arrival {
    pub tick: u64,
    pub mail: MailItem,
}

/// Deterministic arrival schedule, sorted by tick.
///
/// A share of heavy items is generated above the three-robot limit so the
/// rejection path is exercised as well.
pub fn generate_mail(sim: &SimulationConfig, policy: &WeightPolicy) -> Vec<Arrival> {
    let mut rng = StdRng::seed_from_u64(sim.seed);
    let overweight_max = policy
        .triple_max
        .saturating_add((policy.triple_max - policy.pair_max) / 2);
    let mut arrivals: Vec<Arrival> = (0..sim.mail_items)
        .map(|index| {
            let id = index as MailId + 1;
            let tick = rng.gen_range(0..sim.arrival_window);
            let floor = rng.gen_range(1..=sim.floors);
            let weight = if rng.gen_bool(sim.heavy_ratio) {
                rng.gen_range(policy.individual_max + 1..=overweight_max)
            } else {
                rng.gen_range(MIN_WEIGHT.min(policy.individual_max)..=policy.individual_max)
            };
            let mail = if rng.gen_bool(sim.priority_ratio) {
                let level = PRIORITY_LEVELS[rng.gen_range(0..PRIORITY_LEVELS.len())];
                MailItem::priority(id, floor, weight, level)
            } else {
                MailItem::new(id, floor, weight)
            };
            Arrival { tick, mail }
        })
        .collect();
    arrivals.sort_by_key(|arrival| arrival.tick);
    arrivals
}

/// A robot out on delivery.
struct Trip {
    robot: Carrier,
    remaining: u64,
}

impl Trip {
    /// Up to the furthest floor carried and back down again.
    fn start(robot: Carrier) -> Self {
        let furthest = robot
            .hand()
            .into_iter()
            .chain(robot.tube())
            .map(|mail| mail.destination_floor)
            .max()
            .unwrap_or(0);
        Self {
            robot,
            remaining: 2 * u64::from(furthest.max(1)),
        }
    }
}

/// Aggregated counters from one simulation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimSummary {
    pub robots: usize,
    pub items_generated: usize,
    pub items_admitted: usize,
    pub items_rejected: usize,
    pub items_delivered: usize,
    pub robot_dispatches: usize,
    pub team_dispatches: usize,
    pub allocation_errors: usize,
    pub ticks: u64,
    /// Every admitted item delivered before `max_ticks` ran out.
    pub completed: bool,
}

/// Run the tick loop until every admitted item is delivered.
pub fn simulate(sim: &SimulationConfig, policy: &WeightPolicy) -> SimSummary {
    let arrivals = generate_mail(sim, policy);
    let mut summary = SimSummary {
        robots: sim.robots,
        items_generated: arrivals.len(),
        ..SimSummary::default()
    };

    let mut pool: MailPool<Carrier> = MailPool::new(*policy);
    for id in 0..sim.robots {
        if let Err(rejected) = pool.register_waiting(Carrier::new(id as u64 + 1)) {
            warn!(%rejected, "initial robot registration failed");
        }
    }

    let mut next_arrival = 0usize;
    let mut trips: Vec<Trip> = Vec::new();
    let mut delivered: HashSet<MailId> = HashSet::new();

    for tick in 0..sim.max_ticks {
        let _span = info_span!("tick", t = tick).entered();
        summary.ticks = tick + 1;

        while let Some(arrival) = arrivals.get(next_arrival).filter(|a| a.tick <= tick) {
            match pool.add_to_pool(arrival.mail.clone()) {
                Ok(()) => summary.items_admitted += 1,
                Err(_) => summary.items_rejected += 1,
            }
            next_arrival += 1;
        }

        let mut still_out = Vec::with_capacity(trips.len());
        for mut trip in trips.drain(..) {
            trip.remaining = trip.remaining.saturating_sub(1);
            if trip.remaining > 0 {
                still_out.push(trip);
                continue;
            }
            let mut robot = trip.robot;
            for mail in robot.unload() {
                delivered.insert(mail.id);
            }
            if let Err(rejected) = pool.register_waiting(robot) {
                warn!(%rejected, "robot could not rejoin the pool");
            }
        }
        trips = still_out;

        let report = pool.step();
        summary.team_dispatches += report.teams_dispatched;
        summary.allocation_errors += report.errors.len();
        summary.robot_dispatches += report.dispatched.len();
        trips.extend(report.dispatched.into_iter().map(Trip::start));

        if next_arrival == arrivals.len() && pool.is_drained() && trips.is_empty() {
            summary.completed = true;
            break;
        }
    }

    summary.items_delivered = delivered.len();
    debug!(?summary, "simulation finished");
    summary
}

/// Run the default demo and print a summary block.
pub fn run_demo(config: &AutomailConfig) {
    let start = Instant::now();
    let summary = simulate(&config.simulation, &config.weights);
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "demo done");

    println!("DEMO SUMMARY");
    println!(
        "robots={} items_generated={}",
        summary.robots, summary.items_generated
    );
    println!("items_admitted={}", summary.items_admitted);
    println!("items_rejected={}", summary.items_rejected);
    println!("items_delivered={}", summary.items_delivered);
    println!("robot_dispatches={}", summary.robot_dispatches);
    println!("team_dispatches={}", summary.team_dispatches);
    println!("allocation_errors={}", summary.allocation_errors);
    println!("ticks={}", summary.ticks);
    println!("completed={}", summary.completed);
}

/// Aggregated metrics from a single benchmark run.
struct BenchResult {
    summary: SimSummary,
    elapsed_ms: f64,
    throughput: f64,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
}

fn benchmark_once(sim: &SimulationConfig, policy: &WeightPolicy) -> BenchResult {
    let cpu_start = cpu_times_seconds();
    let start = Instant::now();
    let summary = simulate(sim, policy);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let throughput = if elapsed_ms > 0.0 {
        summary.items_delivered as f64 / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };
    BenchResult {
        summary,
        elapsed_ms,
        throughput,
        cpu_user_s,
        cpu_sys_s,
    }
}

const CSV_HEADER: &str = "robots,items,admitted,rejected,delivered,team_dispatches,allocation_errors,ticks,elapsed_ms,throughput_items_per_s,cpu_user_s,cpu_sys_s,completed";

fn print_row(result: &BenchResult) {
    let cpu_user = result
        .cpu_user_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    let cpu_sys = result
        .cpu_sys_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    let s = &result.summary;
    println!(
        "{},{},{},{},{},{},{},{},{:.2},{:.2},{},{},{}",
        s.robots,
        s.items_generated,
        s.items_admitted,
        s.items_rejected,
        s.items_delivered,
        s.team_dispatches,
        s.allocation_errors,
        s.ticks,
        result.elapsed_ms,
        result.throughput,
        cpu_user,
        cpu_sys,
        s.completed
    );
    if !s.completed {
        eprintln!("# warning,undelivered_items,{}", s.items_admitted - s.items_delivered);
    }
}

/// Run a single benchmark and print one CSV row.
pub fn run_benchmark(config: &AutomailConfig) {
    println!("{CSV_HEADER}");
    print_row(&benchmark_once(&config.simulation, &config.weights));
}

/// Sweep robot and item counts and print CSV output.
pub fn run_stress(
    config: &AutomailConfig,
    robot_sets: &[usize],
    item_sets: &[usize],
) -> Result<(), ConfigError> {
    let robot_sets: Vec<usize> = robot_sets.iter().copied().filter(|&r| r > 0).collect();
    if robot_sets.is_empty() {
        return Err(ConfigError::InvalidSimulation(
            "robot_sets must be > 0".into(),
        ));
    }

    println!("{CSV_HEADER}");
    for &robots in &robot_sets {
        for &mail_items in item_sets {
            let sim = SimulationConfig {
                robots,
                mail_items,
                ..config.simulation.clone()
            };
            print_row(&benchmark_once(&sim, &config.weights));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::RobotHandle;

    fn small_sim() -> SimulationConfig {
        SimulationConfig {
            robots: 3,
            mail_items: 30,
            heavy_ratio: 0.3,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let policy = WeightPolicy::default();
        let a = generate_mail(&small_sim(), &policy);
        let b = generate_mail(&small_sim(), &policy);
        assert_eq!(a, b);
        assert_eq!(a.len(), 30);
        assert!(a.windows(2).all(|w| w[0].tick <= w[1].tick));
    }

    #[test]
    fn generated_mail_respects_floors() {
        let sim = small_sim();
        let arrivals = generate_mail(&sim, &WeightPolicy::default());
        assert!(
            arrivals
                .iter()
                .all(|a| (1..=sim.floors).contains(&a.mail.destination_floor))
        );
    }

    #[test]
    fn every_admitted_item_is_delivered() {
        let summary = simulate(&small_sim(), &WeightPolicy::default());
        assert!(summary.completed);
        assert_eq!(summary.allocation_errors, 0);
        assert_eq!(
            summary.items_admitted + summary.items_rejected,
            summary.items_generated
        );
        assert_eq!(summary.items_delivered, summary.items_admitted);
    }

    #[test]
    fn single_robot_never_completes_heavy_mail() {
        let sim = SimulationConfig {
            robots: 1,
            mail_items: 20,
            heavy_ratio: 1.0,
            max_ticks: 200,
            ..SimulationConfig::default()
        };
        let summary = simulate(&sim, &WeightPolicy::default());
        assert!(!summary.completed);
        assert_eq!(summary.team_dispatches, 0);
    }

    #[test]
    fn thresholds_near_u32_max_still_generate() {
        let policy = WeightPolicy::new(1000, 2_000_000_000, 4_000_000_000).expect("increasing");
        let sim = SimulationConfig {
            heavy_ratio: 1.0,
            ..small_sim()
        };
        let arrivals = generate_mail(&sim, &policy);
        assert_eq!(arrivals.len(), 30);
        assert!(arrivals.iter().all(|a| a.mail.weight > policy.individual_max));
    }

    #[test]
    fn stress_without_robots_is_an_error() {
        let result = run_stress(&AutomailConfig::default(), &[0, 0], &[10]);
        assert!(matches!(result, Err(ConfigError::InvalidSimulation(_))));
    }

    #[test]
    fn trip_length_follows_furthest_floor() {
        let mut robot = Carrier::new(1);
        robot.set_hand(MailItem::new(1, 3, 100));
        robot.set_tube(MailItem::new(2, 7, 100));
        assert_eq!(Trip::start(robot).remaining, 14);
    }
}
