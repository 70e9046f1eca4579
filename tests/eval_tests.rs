use std::str::FromStr;

use meridian::board::Board;
use meridian::moves::magic::magic_tables;
use meridian::search::eval::{evaluate, game_phase};
use meridian::search::pawns::PawnHashTable;

fn eval_fen(fen: &str) -> i32 {
    let board = Board::from_str(fen).unwrap();
    evaluate(&board, magic_tables(), &mut PawnHashTable::new())
}

const SAMPLE_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 2 3",
    "4k3/8/8/8/8/8/8/3QK3 w - - 0 1",
];

/// Flipping only the side to move negates the score: the evaluator has no
/// tempo term.
#[test]
fn side_to_move_antisymmetry() {
    for fen in SAMPLE_FENS {
        let mut board = Board::from_str(fen).unwrap();
        let ours = evaluate(&board, magic_tables(), &mut PawnHashTable::new());
        board.side_to_move = board.side_to_move.opposite();
        board.en_passant = None; // a stray ep square would desync the hash
        board.refresh_keys();
        let theirs = evaluate(&board, magic_tables(), &mut PawnHashTable::new());
        assert_eq!(ours + theirs, 0, "tempo leak in {fen}");
    }
}

/// A full color mirror (ranks flipped, colors and castling rights
/// swapped) describes the same game; the side-to-move score must not
/// move.
#[test]
fn color_mirror_invariance() {
    for fen in SAMPLE_FENS {
        let board = Board::from_str(fen).unwrap();
        let mirrored = board.color_flipped();
        let a = evaluate(&board, magic_tables(), &mut PawnHashTable::new());
        let b = evaluate(&mirrored, magic_tables(), &mut PawnHashTable::new());
        assert_eq!(a, b, "mirror asymmetry in {fen}");
    }
}

#[test]
fn startpos_scores_zero() {
    assert_eq!(eval_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), 0);
}

#[test]
fn material_dominates() {
    assert!(eval_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1") > 600);
    assert!(eval_fen("3qk3/8/8/8/8/8/8/4K3 w - - 0 1") < -600);
    // a rook for a knight is clearly better
    assert!(eval_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1") > eval_fen("4k3/8/8/8/8/8/8/N3K3 w - - 0 1"));
}

#[test]
fn phase_tracks_remaining_material() {
    let opening = Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    assert_eq!(game_phase(&opening), 0);

    let ending = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
    assert_eq!(game_phase(&ending), 24);

    let middlegame =
        Board::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let phase = game_phase(&middlegame);
    assert!(phase > 0 && phase < 24);
}

#[test]
fn passed_pawn_is_worth_more_near_promotion() {
    let seventh = eval_fen("4k3/8/8/8/8/8/p7/4K3 b - - 0 1");
    let fourth = eval_fen("4k3/8/8/8/p7/8/8/4K3 b - - 0 1");
    assert!(
        seventh > fourth,
        "7th-rank passer ({seventh}) should beat 4th-rank passer ({fourth})"
    );
}

#[test]
fn doubled_isolated_pawns_cost_something() {
    // Equal material; white's pawns are stacked and cut off.
    let crippled = eval_fen("4k3/2pp4/8/8/8/3P4/3P4/4K3 w - - 0 1");
    let healthy = eval_fen("4k3/2pp4/8/8/8/8/2PP4/4K3 w - - 0 1");
    assert!(crippled < healthy);
}

#[test]
fn mobility_rewards_open_pieces() {
    // Same material; white's bishop is entombed behind its own pawns in
    // the first position and centralized in the second.
    let buried = eval_fen("4k3/8/8/8/8/8/PPP5/BK6 w - - 0 1");
    let free = eval_fen("4k3/8/8/3B4/8/8/PPP5/1K6 w - - 0 1");
    assert!(free > buried);
}
