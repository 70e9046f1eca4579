//! Wire vocabulary shared by the engine's hosts (network relay, browser
//! binding) plus the UCI move codec. The core works in the typed forms;
//! serde keeps them byte-compatible with the JSON the hosts speak.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::board::{Board, Piece};
use crate::engine::{BestMove, Engine, EngineError, EngineOptions, Score, SearchInfo};
use crate::moves::execute::generate_legal;
use crate::moves::magic::MagicTables;
use crate::moves::types::{Move, MoveList};
use crate::search::time::SearchLimit;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LimitMsg {
    Depth { depth: u32 },
    Nodes { nodes: u64 },
    #[serde(rename_all = "camelCase")]
    Time { move_time_ms: u64 },
    Infinite,
}

impl From<LimitMsg> for SearchLimit {
    fn from(msg: LimitMsg) -> Self {
        match msg {
            LimitMsg::Depth { depth } => SearchLimit::Depth(depth),
            LimitMsg::Nodes { nodes } => SearchLimit::Nodes(nodes),
            LimitMsg::Time { move_time_ms } => {
                SearchLimit::MoveTime(Duration::from_millis(move_time_ms))
            }
            LimitMsg::Infinite => SearchLimit::Infinite,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionsMsg {
    #[serde(
        default,
        rename = "hashSizeMB",
        skip_serializing_if = "Option::is_none"
    )]
    pub hash_size_mb: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    #[serde(default, rename = "multiPV", skip_serializing_if = "Option::is_none")]
    pub multi_pv: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub id: String,
    /// A FEN string or the literal "startpos".
    pub fen: String,
    #[serde(default)]
    pub moves: Vec<String>,
    pub limit: LimitMsg,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionsMsg>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StopRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScoreMsg {
    Cp { value: i32 },
    Mate { plies: i32 },
}

impl From<Score> for ScoreMsg {
    fn from(score: Score) -> Self {
        match score {
            Score::Cp(value) => ScoreMsg::Cp { value },
            Score::Mate(plies) => ScoreMsg::Mate { plies },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchInfoMsg {
    pub id: String,
    pub depth: u32,
    pub seldepth: u32,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub score: ScoreMsg,
    pub pv: Vec<String>,
    pub hashfull: u32,
    pub tb_hits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BestMoveMsg {
    pub id: String,
    /// "0000" when the position has no legal move.
    pub best: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMsg {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    SearchInfo(SearchInfoMsg),
    BestMove(BestMoveMsg),
    Error(ErrorMsg),
}

/// Parse a UCI move against the current position. Castling is accepted
/// both as the king's two-square move ("e1g1") and as king-captures-own-
/// rook ("e1h1"), which is normalized before matching.
pub fn parse_uci_move(board: &mut Board, tables: &MagicTables, text: &str) -> Option<Move> {
    let bytes = text.as_bytes();
    if !(4..=5).contains(&bytes.len()) {
        return None;
    }

    let from_file = bytes[0].wrapping_sub(b'a');
    let from_rank = bytes[1].wrapping_sub(b'1');
    let to_file = bytes[2].wrapping_sub(b'a');
    let to_rank = bytes[3].wrapping_sub(b'1');
    if from_file > 7 || from_rank > 7 || to_file > 7 || to_rank > 7 {
        return None;
    }

    let from = crate::square::Square::from_coords(from_rank, from_file);
    let mut to = crate::square::Square::from_coords(to_rank, to_file);

    let promotion = if bytes.len() == 5 {
        match bytes[4] {
            b'q' => Some(Piece::Queen),
            b'r' => Some(Piece::Rook),
            b'b' => Some(Piece::Bishop),
            b'n' => Some(Piece::Knight),
            _ => return None,
        }
    } else {
        None
    };

    // Chess960-style castling input: the king "captures" its own rook.
    if let (Some((kc, Piece::King)), Some((rc, Piece::Rook))) =
        (board.piece_at(from), board.piece_at(to))
        && kc == rc
    {
        let file = if to.file() > from.file() { 6 } else { 2 };
        to = crate::square::Square::from_coords(from.rank(), file);
    }

    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, tables, &mut moves, &mut scratch);

    moves
        .iter()
        .copied()
        .find(|m| m.from() == from && m.to() == to && m.promotion() == promotion)
}

/// Apply one analyze request end to end: position setup, search, events.
/// Exactly one of BestMove / Error terminates the stream.
pub fn dispatch(engine: &mut Engine, request: AnalyzeRequest, mut sink: impl FnMut(EngineEvent)) {
    let id = request.id.clone();

    if let Some(opts) = &request.options {
        let current = engine.options();
        let merged = EngineOptions {
            hash_size_mb: opts.hash_size_mb.unwrap_or(current.hash_size_mb),
            threads: opts.threads.unwrap_or(current.threads),
            multi_pv: opts.multi_pv.unwrap_or(current.multi_pv),
        };
        if let Err(err) = engine.set_options(merged) {
            sink(error_event(&id, &err));
            return;
        }
    }

    if let Err(err) = engine.set_position(&request.fen, &request.moves) {
        sink(error_event(&id, &err));
        return;
    }

    let limit: SearchLimit = request.limit.into();
    let best = engine.analyze(limit, |info: SearchInfo| {
        sink(EngineEvent::SearchInfo(to_info_msg(&id, &info)));
    });
    sink(EngineEvent::BestMove(to_best_msg(&id, &best)));
}

pub fn to_info_msg(id: &str, info: &SearchInfo) -> SearchInfoMsg {
    SearchInfoMsg {
        id: id.to_string(),
        depth: info.depth,
        seldepth: info.seldepth,
        nodes: info.nodes,
        nps: info.nps,
        time_ms: info.time_ms,
        score: info.score.into(),
        pv: info.pv.iter().map(|m| m.to_uci()).collect(),
        hashfull: info.hashfull,
        tb_hits: info.tb_hits,
    }
}

pub fn to_best_msg(id: &str, best: &BestMove) -> BestMoveMsg {
    BestMoveMsg {
        id: id.to_string(),
        best: best
            .best
            .map(|m| m.to_uci())
            .unwrap_or_else(|| "0000".to_string()),
        ponder: best.ponder.map(|m| m.to_uci()),
    }
}

pub fn error_event(id: &str, err: &EngineError) -> EngineEvent {
    EngineEvent::Error(ErrorMsg {
        id: id.to_string(),
        message: err.to_string(),
    })
}
