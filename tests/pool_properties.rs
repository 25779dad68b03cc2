//! Property tests for ordering, team sizing and dispatch invariants.

use std::collections::{HashMap, HashSet};

use automail::{Carrier, MailItem, MailPool, RobotHandle, TeamSize, WeightPolicy};
use proptest::prelude::*;

const INDIVIDUAL_MAX: u32 = 2000;
const PAIR_MAX: u32 = 2600;
const TRIPLE_MAX: u32 = 3000;

fn mail_strategy() -> impl Strategy<Value = (u32, u32, Option<u32>)> {
    (
        1u32..=14,
        prop_oneof![
            3 => 1u32..=INDIVIDUAL_MAX,
            1 => INDIVIDUAL_MAX + 1..=TRIPLE_MAX,
        ],
        prop::option::weighted(0.3, 1u32..=5),
    )
}

fn build_mail(index: usize, (floor, weight, priority): (u32, u32, Option<u32>)) -> MailItem {
    let id = index as u64 + 1;
    match priority {
        Some(level) => MailItem::priority(id, floor, weight, level),
        None => MailItem::new(id, floor, weight),
    }
}

proptest! {
    #[test]
    fn backlog_stays_ranked_and_stable(specs in prop::collection::vec(mail_strategy(), 0..40)) {
        let mut pool: MailPool<Carrier> = MailPool::new(WeightPolicy::default());
        for (index, spec) in specs.into_iter().enumerate() {
            pool.add_to_pool(build_mail(index, spec)).expect("within limits");
        }
        let records: Vec<_> = pool.backlog().collect();
        for pair in records.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let key_a = (a.priority(), a.destination());
            let key_b = (b.priority(), b.destination());
            prop_assert!(key_a >= key_b);
            if key_a == key_b {
                // Ids follow arrival order.
                prop_assert!(a.mail().id < b.mail().id);
            }
        }
    }

    #[test]
    fn weight_tiers_partition_weights(weight in 0u32..4000) {
        let policy = WeightPolicy::default();
        let expected = if weight <= INDIVIDUAL_MAX {
            Some(TeamSize::Single)
        } else if weight <= PAIR_MAX {
            Some(TeamSize::Pair)
        } else if weight <= TRIPLE_MAX {
            Some(TeamSize::Triple)
        } else {
            None
        };
        prop_assert_eq!(TeamSize::for_weight(weight, &policy), expected);

        let mut pool: MailPool<Carrier> = MailPool::new(policy);
        let admitted = pool.add_to_pool(MailItem::new(1, 1, weight)).is_ok();
        prop_assert_eq!(admitted, expected.is_some());
    }

    #[test]
    fn dispatches_respect_team_and_tube_rules(
        specs in prop::collection::vec(mail_strategy(), 1..30),
        arrivals in prop::collection::vec(1usize..4, 1..12),
    ) {
        let policy = WeightPolicy::default();
        let mut pool: MailPool<Carrier> = MailPool::new(policy);
        let mut weights = HashMap::new();
        for (index, spec) in specs.into_iter().enumerate() {
            let mail = build_mail(index, spec);
            weights.insert(mail.id, mail.weight);
            pool.add_to_pool(mail).expect("within limits");
        }

        let mut next_robot = 1u64;
        let mut carriers_by_item: HashMap<u64, usize> = HashMap::new();
        let mut delivered_light: HashSet<u64> = HashSet::new();
        for batch in arrivals {
            for _ in 0..batch {
                pool.register_waiting(Carrier::new(next_robot)).expect("fresh robot");
                next_robot += 1;
            }
            let report = pool.step();
            prop_assert!(report.is_clean());

            let mut seen_robots = HashSet::new();
            for robot in &report.dispatched {
                prop_assert!(seen_robots.insert(robot.id()), "robot dispatched twice in one step");
                prop_assert_eq!(robot.dispatch_count(), 1);
                let hand = robot.hand().expect("dispatched robots carry mail");
                if hand.weight > INDIVIDUAL_MAX {
                    prop_assert!(robot.tube().is_none(), "heavy hand item with tube companion");
                    *carriers_by_item.entry(hand.id).or_default() += 1;
                } else {
                    prop_assert!(delivered_light.insert(hand.id));
                }
                if let Some(tube) = robot.tube() {
                    prop_assert!(tube.weight <= INDIVIDUAL_MAX);
                    prop_assert!(delivered_light.insert(tube.id));
                }
            }
        }

        for (mail_id, carriers) in carriers_by_item {
            let weight = weights[&mail_id];
            let required = if weight <= PAIR_MAX { 2 } else { 3 };
            prop_assert_eq!(carriers, required, "team size mismatch for mail {}", mail_id);
        }
    }
}
