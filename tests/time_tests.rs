use std::time::Duration;

use meridian::search::time::{SearchLimit, TimeManager};

#[test]
fn fixed_depth_never_times_out() {
    let tm = TimeManager::new(SearchLimit::Depth(12));
    assert_eq!(tm.depth_limit, 12);
    assert!(tm.soft_deadline().is_none());
    assert!(tm.hard_deadline().is_none());
    assert!(!tm.should_stop_soft());
    assert!(!tm.should_stop_hard());
}

#[test]
fn movetime_keeps_a_safety_margin() {
    let tm = TimeManager::new(SearchLimit::MoveTime(Duration::from_millis(1000)));
    assert_eq!(tm.soft_deadline(), Some(Duration::from_millis(975)));
    assert_eq!(tm.soft_deadline(), tm.hard_deadline());
}

#[test]
fn tiny_movetime_clamps_to_zero_not_underflow() {
    let tm = TimeManager::new(SearchLimit::MoveTime(Duration::from_millis(5)));
    assert_eq!(tm.soft_deadline(), Some(Duration::ZERO));
    assert!(tm.should_stop_hard());
}

#[test]
fn clock_without_movestogo_plans_for_forty_moves() {
    let tm = TimeManager::new(SearchLimit::Clock {
        remaining: Duration::from_secs(120),
        increment: Duration::ZERO,
        moves_to_go: None,
    });
    // base = 120/40 = 3s; soft = 2.4s; hard = 3s
    assert_eq!(tm.soft_deadline(), Some(Duration::from_millis(2400)));
    assert_eq!(tm.hard_deadline(), Some(Duration::from_secs(3)));
}

#[test]
fn increment_extends_the_budget() {
    let without = TimeManager::new(SearchLimit::Clock {
        remaining: Duration::from_secs(60),
        increment: Duration::ZERO,
        moves_to_go: None,
    });
    let with = TimeManager::new(SearchLimit::Clock {
        remaining: Duration::from_secs(60),
        increment: Duration::from_secs(2),
        moves_to_go: None,
    });
    assert!(with.hard_deadline().unwrap() > without.hard_deadline().unwrap());
}

#[test]
fn movestogo_divides_the_remaining_time() {
    let tm = TimeManager::new(SearchLimit::Clock {
        remaining: Duration::from_secs(30),
        increment: Duration::ZERO,
        moves_to_go: Some(10),
    });
    assert_eq!(tm.hard_deadline(), Some(Duration::from_secs(3)));
}

#[test]
fn hard_deadline_never_exceeds_the_clock() {
    let tm = TimeManager::new(SearchLimit::Clock {
        remaining: Duration::from_millis(100),
        increment: Duration::from_secs(10),
        moves_to_go: Some(1),
    });
    // a huge increment cannot promise more than the clock holds
    assert!(tm.hard_deadline().unwrap() <= Duration::from_millis(75));
    assert!(tm.soft_deadline().unwrap() <= tm.hard_deadline().unwrap());
}

#[test]
fn node_budget_is_independent_of_wall_clock() {
    let tm = TimeManager::new(SearchLimit::Nodes(1_000_000));
    assert_eq!(tm.node_limit, Some(1_000_000));
    assert!(tm.hard_deadline().is_none());
}
