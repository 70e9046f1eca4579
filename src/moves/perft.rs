use crate::board::Board;
use crate::moves::{
    execute::{generate_legal, make_move, undo_move},
    magic::MagicTables,
    square_control::in_check,
    types::Move,
};
use tracing::{debug, instrument};

const MAX_PERFT_DEPTH: usize = 20;

#[derive(Debug, Default)]
pub struct PerftCounters {
    pub nodes: u64,
    pub captures: u64,
    pub ep_captures: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

// Per-ply reusable buffers so the recursion never allocates.
fn create_buffers() -> ([Vec<Move>; MAX_PERFT_DEPTH], [Vec<Move>; MAX_PERFT_DEPTH]) {
    (
        std::array::from_fn(|_| Vec::with_capacity(64)),
        std::array::from_fn(|_| Vec::with_capacity(256)),
    )
}

fn perft_recursive(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    ply: usize,
    move_buffers: &mut [Vec<Move>],
    scratch_buffers: &mut [Vec<Move>],
) -> u64 {
    if depth == 0 {
        return 1;
    }

    {
        let (moves, scratch) = (&mut move_buffers[ply], &mut scratch_buffers[ply]);
        generate_legal(board, tables, moves, scratch);
    }

    if depth == 1 {
        return move_buffers[ply].len() as u64;
    }

    let move_count = move_buffers[ply].len();
    let mut nodes = 0;
    for i in 0..move_count {
        let mv = move_buffers[ply][i];
        let undo = make_move(board, mv);
        nodes += perft_recursive(board, tables, depth - 1, ply + 1, move_buffers, scratch_buffers);
        undo_move(board, mv, undo);
    }
    nodes
}

/// Leaf count of the legal game tree to `depth`. Pure in (position, depth).
#[instrument(skip(board, tables))]
pub fn perft(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    assert!(
        (depth as usize) <= MAX_PERFT_DEPTH,
        "depth {} exceeds MAX_PERFT_DEPTH {}",
        depth,
        MAX_PERFT_DEPTH
    );
    let (mut move_buffers, mut scratch_buffers) = create_buffers();
    perft_recursive(board, tables, depth, 0, &mut move_buffers, &mut scratch_buffers)
}

/// Per-root-move node counts, the classic movegen debugging view.
#[instrument(skip(board, tables))]
pub fn perft_divide(board: &mut Board, tables: &MagicTables, depth: u32) -> Vec<(Move, u64)> {
    assert!(depth >= 1 && (depth as usize) <= MAX_PERFT_DEPTH);
    let (mut move_buffers, mut scratch_buffers) = create_buffers();

    {
        let (moves, scratch) = (&mut move_buffers[0], &mut scratch_buffers[0]);
        generate_legal(board, tables, moves, scratch);
    }

    let move_count = move_buffers[0].len();
    let mut rows = Vec::with_capacity(move_count);
    for i in 0..move_count {
        let mv = move_buffers[0][i];
        let undo = make_move(board, mv);
        let nodes = perft_recursive(
            board,
            tables,
            depth - 1,
            1,
            &mut move_buffers,
            &mut scratch_buffers,
        );
        undo_move(board, mv, undo);
        debug!(%mv, nodes, "divide");
        rows.push((mv, nodes));
    }
    rows
}

fn perft_count_recursive(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    ply: usize,
    out: &mut PerftCounters,
    move_buffers: &mut [Vec<Move>],
    scratch_buffers: &mut [Vec<Move>],
) {
    if depth == 0 {
        out.nodes += 1;
        let side_in_check = in_check(board, board.side_to_move, tables);
        if side_in_check {
            out.checks += 1;
            let (moves, scratch) = (&mut move_buffers[ply], &mut scratch_buffers[ply]);
            generate_legal(board, tables, moves, scratch);
            if moves.is_empty() {
                out.checkmates += 1;
            }
        }
        return;
    }

    {
        let (moves, scratch) = (&mut move_buffers[ply], &mut scratch_buffers[ply]);
        generate_legal(board, tables, moves, scratch);
    }

    let move_count = move_buffers[ply].len();
    for i in 0..move_count {
        let mv = move_buffers[ply][i];
        // kind counters follow the convention of tagging leaf edges only
        if depth == 1 {
            if mv.is_capture() {
                out.captures += 1;
                if mv.is_en_passant() {
                    out.ep_captures += 1;
                }
            }
            if mv.is_castling() {
                out.castles += 1;
            }
            if mv.is_promotion() {
                out.promotions += 1;
            }
        }

        let undo = make_move(board, mv);
        perft_count_recursive(
            board,
            tables,
            depth - 1,
            ply + 1,
            out,
            move_buffers,
            scratch_buffers,
        );
        undo_move(board, mv, undo);
    }
}

/// Perft with an edge-tagged breakdown of move kinds.
pub fn perft_with_breakdown(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    out: &mut PerftCounters,
) {
    assert!((depth as usize) <= MAX_PERFT_DEPTH);
    let (mut move_buffers, mut scratch_buffers) = create_buffers();
    perft_count_recursive(
        board,
        tables,
        depth,
        0,
        out,
        &mut move_buffers,
        &mut scratch_buffers,
    );
}
