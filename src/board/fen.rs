//! Forsyth-Edwards Notation codec. `set_fen` and `to_fen` are exact
//! inverses for any legal position.

use super::fen_tables::{CHAR_TO_PC, piece_char};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 6 space-separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid piece character '{0}' in placement field")]
    InvalidPieceChar(char),
    #[error("rank {0} does not describe exactly 8 files")]
    BadRankWidth(u8),
    #[error("expected 8 ranks in placement field, found {0}")]
    BadRankCount(usize),
    #[error("invalid side-to-move token '{0}'")]
    BadSideToMove(String),
    #[error("invalid castling token '{0}'")]
    BadCastling(String),
    #[error("invalid en-passant token '{0}'")]
    BadEnPassant(String),
    #[error("unparseable {name} clock '{value}'")]
    BadClock { name: &'static str, value: String },
    #[error("side {0:?} has {1} kings, expected exactly one")]
    KingCount(Color, u32),
}

impl Board {
    /// Replace the whole position from a FEN string. On error the board is
    /// left unspecified; callers reparse or rebuild.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }

        *self = Board::new_empty();

        // Field 1: piece placement, rank 8 first.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount(ranks.len()));
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(FenError::InvalidPieceChar(c));
                    }
                    file += skip as u8;
                } else {
                    let (piece, color) = CHAR_TO_PC
                        .get(c as usize)
                        .copied()
                        .flatten()
                        .ok_or(FenError::InvalidPieceChar(c))?;
                    if file > 7 {
                        return Err(FenError::BadRankWidth(rank + 1));
                    }
                    let sq = Square::from_coords(rank, file);
                    let bb = self.bb(color, piece) | sq.bb();
                    self.set_bb(color, piece, bb);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BadRankWidth(rank + 1));
            }
        }

        // Field 2: side to move.
        self.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::BadSideToMove(other.to_string())),
        };

        // Field 3: castling rights.
        self.castling_rights = 0;
        if fields[2] != "-" {
            for c in fields[2].chars() {
                self.castling_rights |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(FenError::BadCastling(fields[2].to_string())),
                };
            }
        }

        // Field 4: en-passant target. Its rank must match the side to move's
        // capturing opportunity (rank 6 for white to move, rank 3 for black).
        self.en_passant = if fields[3] == "-" {
            None
        } else {
            let sq: Square = fields[3]
                .parse()
                .map_err(|_| FenError::BadEnPassant(fields[3].to_string()))?;
            let expected_rank = match self.side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            if sq.rank() != expected_rank {
                return Err(FenError::BadEnPassant(fields[3].to_string()));
            }
            Some(sq)
        };

        // Fields 5-6: clocks.
        self.halfmove_clock = fields[4].parse().map_err(|_| FenError::BadClock {
            name: "halfmove",
            value: fields[4].to_string(),
        })?;
        self.fullmove_number = fields[5].parse().map_err(|_| FenError::BadClock {
            name: "fullmove",
            value: fields[5].to_string(),
        })?;

        for &color in &[Color::White, Color::Black] {
            let kings = self.bb(color, Piece::King).count_ones();
            if kings != 1 {
                return Err(FenError::KingCount(color, kings));
            }
        }

        self.history.clear();
        self.refresh_keys();
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for row in 0..8 {
            let rank = 7 - row;
            let mut empty_run = 0;
            for file in 0..8 {
                let sq = Square::from_coords(rank, file);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            fen.push(char::from_digit(empty_run, 10).unwrap());
                            empty_run = 0;
                        }
                        fen.push(piece_char(piece, color));
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push(char::from_digit(empty_run, 10).unwrap());
            }
            if row != 7 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            if self.castling_rights & CASTLE_WK != 0 {
                fen.push('K');
            }
            if self.castling_rights & CASTLE_WQ != 0 {
                fen.push('Q');
            }
            if self.castling_rights & CASTLE_BK != 0 {
                fen.push('k');
            }
            if self.castling_rights & CASTLE_BQ != 0 {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}
