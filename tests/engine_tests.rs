use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use meridian::engine::{Engine, EngineError, EngineOptions, Score};
use meridian::search::time::SearchLimit;

#[test]
fn set_position_accepts_startpos_and_history() {
    let mut engine = Engine::new();
    engine
        .set_position("startpos", &["e2e4".into(), "e7e5".into(), "g1f3".into()])
        .unwrap();
    assert_eq!(
        engine.position().to_fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
    );
}

#[test]
fn set_position_surfaces_structured_errors() {
    let mut engine = Engine::new();

    let err = engine.set_position("not a fen", &[]).unwrap_err();
    assert!(matches!(err, EngineError::Fen(_)));

    let err = engine
        .set_position("startpos", &["e2e4".into(), "e2e4".into()])
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::IllegalMove {
            mv: "e2e4".into(),
            index: 1
        }
    );

    // a failed setup leaves the previous position intact
    assert_eq!(engine.position().to_fen().split(' ').count(), 6);
}

#[test]
fn chess960_style_castling_is_accepted_in_history() {
    let mut engine = Engine::new();
    engine
        .set_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", &["e1h1".into()])
        .unwrap();
    // normalized to the king's two-square move
    assert!(engine.position().to_fen().starts_with("r3k2r/8/8/8/8/8/8/R4RK1"));
}

#[test]
fn events_arrive_in_order_and_bestmove_is_final() {
    let mut engine = Engine::new();
    engine.set_position("startpos", &[]).unwrap();

    let mut seen_depths = Vec::new();
    let best = engine.analyze(SearchLimit::Depth(5), |info| {
        seen_depths.push(info.depth);
        assert_eq!(info.multipv, 1);
        assert!(info.nodes > 0);
    });

    assert!(!seen_depths.is_empty());
    for pair in seen_depths.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    assert!(best.best.is_some());
    // ponder, when present, is the second PV entry and thus a reply
    if let (Some(b), Some(p)) = (best.best, best.ponder) {
        assert_ne!(b, p);
    }
}

#[test]
fn stop_aborts_an_infinite_analysis_quickly() {
    let mut engine = Engine::new();
    engine.set_position("startpos", &[]).unwrap();
    let stop = engine.stop_handle();

    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let best = engine.analyze(SearchLimit::Infinite, |_| {});
        tx.send(Instant::now()).unwrap();
        best
    });

    // let the search spin up, then pull the plug
    thread::sleep(Duration::from_millis(150));
    let stop_sent = Instant::now();
    stop.stop();

    let finished = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("search must terminate after stop");
    let latency = finished.duration_since(stop_sent);
    assert!(
        latency < Duration::from_millis(500),
        "stop latency too high: {latency:?}"
    );

    let best = handle.join().unwrap();
    assert!(best.best.is_some(), "a legal best move is reported on stop");
}

#[test]
fn movetime_limit_actually_limits() {
    let mut engine = Engine::new();
    engine.set_position("startpos", &[]).unwrap();
    let start = Instant::now();
    let best = engine.analyze(SearchLimit::MoveTime(Duration::from_millis(200)), |_| {});
    assert!(start.elapsed() < Duration::from_secs(3));
    assert!(best.best.is_some());
}

#[test]
fn multipv_reports_distinct_lines() {
    let mut engine = Engine::with_options(EngineOptions {
        multi_pv: 3,
        ..EngineOptions::default()
    })
    .unwrap();
    engine.set_position("startpos", &[]).unwrap();

    let mut lines_seen = std::collections::BTreeSet::new();
    let mut heads = std::collections::BTreeMap::new();
    let best = engine.analyze(SearchLimit::Depth(4), |info| {
        lines_seen.insert(info.multipv);
        if let Some(head) = info.pv.first() {
            heads.insert(info.multipv, head.to_uci());
        }
    });

    assert_eq!(lines_seen.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    let unique: std::collections::BTreeSet<_> = heads.values().collect();
    assert_eq!(unique.len(), 3, "multi-PV lines must differ: {heads:?}");
    assert!(best.best.is_some());
}

#[test]
fn new_game_resets_learned_state_but_not_determinism() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
    let mut engine = Engine::new();

    engine.set_position(fen, &[]).unwrap();
    let first = engine.analyze(SearchLimit::Depth(5), |_| {});

    // polluted state may search differently; after new_game the original
    // run must reproduce exactly
    engine.set_position("startpos", &[]).unwrap();
    let _ = engine.analyze(SearchLimit::Depth(4), |_| {});

    engine.new_game();
    engine.set_position(fen, &[]).unwrap();
    let second = engine.analyze(SearchLimit::Depth(5), |_| {});

    assert_eq!(first.best, second.best);
    assert_eq!(first.score, second.score);
}

#[test]
fn mate_score_is_reported_in_plies() {
    let mut engine = Engine::new();
    engine
        .set_position("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1", &[])
        .unwrap();
    let mut final_score = None;
    let best = engine.analyze(SearchLimit::Depth(4), |info| final_score = Some(info.score));
    assert_eq!(best.score, Score::Mate(1));
    assert_eq!(final_score, Some(Score::Mate(1)));
}
