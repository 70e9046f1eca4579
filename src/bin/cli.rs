//! UCI-style driver plus a perft self-check mode:
//!
//!   meridian                  interactive UCI loop on stdin
//!   meridian perft-check      validate the canonical perft vector,
//!                             exit 0 on match / 1 on mismatch
//!   meridian perft-check deep include the expensive depths

use std::io::{self, BufRead};
use std::str::FromStr;
use std::time::Duration;

use meridian::board::{Board, Color};
use meridian::engine::{Engine, Score, SearchInfo};
use meridian::logger::init_logging;
use meridian::moves::magic::magic_tables;
use meridian::moves::perft::perft;
use meridian::search::time::SearchLimit;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("perft-check") {
        let deep = args.iter().any(|a| a == "deep");
        std::process::exit(run_perft_check(deep));
    }

    init_logging("logs/meridian.log", "meridian=info");

    let mut engine = Engine::new();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts[0] {
            "uci" => {
                println!("id name Meridian 0.9");
                println!("id author Meridian developers");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => engine.new_game(),
            "position" => {
                if let Some((fen, moves)) = parse_position_command(&parts)
                    && let Err(e) = engine.set_position(&fen, &moves)
                {
                    eprintln!("info string position rejected: {}", e);
                }
            }
            "go" => handle_go(&parts, &mut engine),
            "fen" => println!("{}", engine.position().to_fen()),
            "d" | "display" => println!("{}", engine.position()),
            "quit" => break,
            _ => {}
        }
    }
}

/// "position startpos [moves ...]" | "position fen <6 fields> [moves ...]"
fn parse_position_command(parts: &[&str]) -> Option<(String, Vec<String>)> {
    if parts.len() < 2 {
        return None;
    }

    let moves_idx = parts.iter().position(|&p| p == "moves");
    let moves: Vec<String> = moves_idx
        .map(|i| parts[i + 1..].iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let fen = if parts[1] == "startpos" {
        "startpos".to_string()
    } else if parts[1] == "fen" {
        let end = moves_idx.unwrap_or(parts.len());
        parts[2..end].join(" ")
    } else {
        return None;
    };

    Some((fen, moves))
}

fn handle_go(parts: &[&str], engine: &mut Engine) {
    let mut depth: Option<u32> = None;
    let mut movetime: Option<u64> = None;
    let mut nodes: Option<u64> = None;
    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: u64 = 0;
    let mut binc: u64 = 0;
    let mut movestogo: Option<u32> = None;
    let mut infinite = false;

    let mut i = 1;
    while i < parts.len() {
        let value = parts.get(i + 1).and_then(|v| v.parse::<u64>().ok());
        match parts[i] {
            "depth" => {
                depth = value.map(|v| v as u32);
                i += 2;
            }
            "movetime" => {
                movetime = value;
                i += 2;
            }
            "nodes" => {
                nodes = value;
                i += 2;
            }
            "wtime" => {
                wtime = value;
                i += 2;
            }
            "btime" => {
                btime = value;
                i += 2;
            }
            "winc" => {
                winc = value.unwrap_or(0);
                i += 2;
            }
            "binc" => {
                binc = value.unwrap_or(0);
                i += 2;
            }
            "movestogo" => {
                movestogo = value.map(|v| v as u32);
                i += 2;
            }
            "infinite" => {
                infinite = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    let limit = if let Some(d) = depth {
        SearchLimit::Depth(d)
    } else if let Some(n) = nodes {
        SearchLimit::Nodes(n)
    } else if let Some(ms) = movetime {
        SearchLimit::MoveTime(Duration::from_millis(ms))
    } else if infinite {
        // the blocking loop cannot deliver a stop, so cap the depth
        SearchLimit::Depth(64)
    } else {
        let (my_time, my_inc) = match engine.position().side_to_move {
            Color::White => (wtime, winc),
            Color::Black => (btime, binc),
        };
        match my_time {
            Some(t) => SearchLimit::Clock {
                remaining: Duration::from_millis(t),
                increment: Duration::from_millis(my_inc),
                moves_to_go: movestogo,
            },
            None => SearchLimit::Depth(8),
        }
    };

    let best = engine.analyze(limit, print_info);
    match best.best {
        Some(mv) => match best.ponder {
            Some(p) => println!("bestmove {} ponder {}", mv.to_uci(), p.to_uci()),
            None => println!("bestmove {}", mv.to_uci()),
        },
        None => println!("bestmove 0000"),
    }
}

fn print_info(info: SearchInfo) {
    let score = match info.score {
        Score::Cp(v) => format!("cp {}", v),
        // UCI reports mate in moves, not plies
        Score::Mate(p) => format!("mate {}", (p + p.signum()) / 2),
    };
    let pv: Vec<String> = info.pv.iter().map(|m| m.to_uci()).collect();
    println!(
        "info depth {} seldepth {} score {} nodes {} nps {} hashfull {} time {} pv {}",
        info.depth,
        info.seldepth,
        score,
        info.nodes,
        info.nps,
        info.hashfull,
        info.time_ms,
        pv.join(" ")
    );
}

const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const KIWIPETE_FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn run_perft_check(deep: bool) -> i32 {
    let tables = magic_tables();
    let mut failures = 0;

    let startpos: &[(u32, u64)] = if deep {
        &[
            (1, 20),
            (2, 400),
            (3, 8_902),
            (4, 197_281),
            (5, 4_865_609),
            (6, 119_060_324),
        ]
    } else {
        &[(1, 20), (2, 400), (3, 8_902), (4, 197_281), (5, 4_865_609)]
    };
    let kiwipete: &[(u32, u64)] = if deep {
        &[(1, 48), (2, 2_039), (3, 97_862), (4, 4_085_603)]
    } else {
        &[(1, 48), (2, 2_039), (3, 97_862)]
    };

    for (name, fen, vector) in [
        ("startpos", STARTPOS_FEN, startpos),
        ("kiwipete", KIWIPETE_FEN, kiwipete),
    ] {
        let mut board = Board::from_str(fen).expect("canonical FEN parses");
        for &(depth, expected) in vector {
            let start = std::time::Instant::now();
            let nodes = perft(&mut board, tables, depth);
            let elapsed = start.elapsed().as_secs_f64().max(1e-9);
            let status = if nodes == expected { "ok" } else { "MISMATCH" };
            println!(
                "{name} d{depth}: {nodes} (expected {expected}) {status}  [{:.0} knps]",
                nodes as f64 / elapsed / 1000.0
            );
            if nodes != expected {
                failures += 1;
            }
        }
    }

    if failures == 0 { 0 } else { 1 }
}
