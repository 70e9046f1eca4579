//! Search budgets. A `SearchLimit` describes what the host asked for; the
//! `TimeManager` turns the clock variants into a soft deadline (checked
//! between iterations) and a hard deadline (polled inside the tree).

use std::time::{Duration, Instant};

use crate::MAX_PLY;

/// Kept off the clock so a hard stop still leaves time to report.
const SAFETY_MARGIN: Duration = Duration::from_millis(25);

/// Assumed game length when the host gives no moves-to-go.
const DEFAULT_MOVES_TO_GO: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Depth(u32),
    Nodes(u64),
    MoveTime(Duration),
    Infinite,
    Clock {
        remaining: Duration,
        increment: Duration,
        moves_to_go: Option<u32>,
    },
}

#[derive(Debug)]
pub struct TimeManager {
    start: Instant,
    soft: Option<Duration>,
    hard: Option<Duration>,
    pub depth_limit: u32,
    pub node_limit: Option<u64>,
}

impl TimeManager {
    pub fn new(limit: SearchLimit) -> Self {
        let mut tm = TimeManager {
            start: Instant::now(),
            soft: None,
            hard: None,
            depth_limit: MAX_PLY as u32 - 1,
            node_limit: None,
        };

        match limit {
            SearchLimit::Depth(d) => {
                tm.depth_limit = d.clamp(1, MAX_PLY as u32 - 1);
            }
            SearchLimit::Nodes(n) => {
                tm.node_limit = Some(n.max(1));
            }
            SearchLimit::Infinite => {}
            SearchLimit::MoveTime(t) => {
                let t = t.saturating_sub(SAFETY_MARGIN);
                tm.soft = Some(t);
                tm.hard = Some(t);
            }
            SearchLimit::Clock {
                remaining,
                increment,
                moves_to_go,
            } => {
                let divisor = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
                let base = remaining / divisor + increment.mul_f64(0.8);
                let soft = base.mul_f64(0.8);
                let hard = base.min(remaining.saturating_sub(SAFETY_MARGIN));
                tm.soft = Some(soft.min(hard));
                tm.hard = Some(hard);
            }
        }

        tm
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Honored between iterations: not worth starting another depth.
    #[inline]
    pub fn should_stop_soft(&self) -> bool {
        matches!(self.soft, Some(limit) if self.start.elapsed() >= limit)
    }

    /// Polled inside the tree: abandon the iteration outright.
    #[inline]
    pub fn should_stop_hard(&self) -> bool {
        matches!(self.hard, Some(limit) if self.start.elapsed() >= limit)
    }

    pub fn soft_deadline(&self) -> Option<Duration> {
        self.soft
    }

    pub fn hard_deadline(&self) -> Option<Duration> {
        self.hard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_and_infinite_have_no_deadlines() {
        let tm = TimeManager::new(SearchLimit::Depth(7));
        assert_eq!(tm.depth_limit, 7);
        assert!(tm.soft_deadline().is_none() && tm.hard_deadline().is_none());

        let tm = TimeManager::new(SearchLimit::Infinite);
        assert!(tm.soft_deadline().is_none() && tm.hard_deadline().is_none());
        assert!(!tm.should_stop_soft() && !tm.should_stop_hard());
    }

    #[test]
    fn movetime_sets_both_deadlines_with_margin() {
        let tm = TimeManager::new(SearchLimit::MoveTime(Duration::from_millis(500)));
        let soft = tm.soft_deadline().unwrap();
        assert_eq!(soft, tm.hard_deadline().unwrap());
        assert_eq!(soft, Duration::from_millis(475));
    }

    #[test]
    fn clock_allocation_shape() {
        let tm = TimeManager::new(SearchLimit::Clock {
            remaining: Duration::from_secs(60),
            increment: Duration::from_secs(1),
            moves_to_go: None,
        });
        let soft = tm.soft_deadline().unwrap();
        let hard = tm.hard_deadline().unwrap();
        // base = 60/40 + 0.8 = 2.3s
        assert_eq!(hard, Duration::from_millis(2300));
        assert_eq!(soft, Duration::from_millis(1840));
        assert!(soft <= hard);
    }

    #[test]
    fn clock_respects_moves_to_go_and_low_time() {
        let tm = TimeManager::new(SearchLimit::Clock {
            remaining: Duration::from_millis(200),
            increment: Duration::ZERO,
            moves_to_go: Some(1),
        });
        // hard never exceeds remaining minus the safety margin
        assert_eq!(tm.hard_deadline().unwrap(), Duration::from_millis(175));
    }

    #[test]
    fn node_limit_is_recorded() {
        let tm = TimeManager::new(SearchLimit::Nodes(12345));
        assert_eq!(tm.node_limit, Some(12345));
    }
}
