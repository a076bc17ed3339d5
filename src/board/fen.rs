//! Forsyth-Edwards notation, both directions.

use super::fen_tables::{piece_char, CHAR_TO_PC};
use super::{Board, Color, Piece, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::error::FenError;
use crate::square::Square;
use std::str::FromStr;

impl Board {
    /// Load a position from a FEN string. On success the zobrist key,
    /// checkers bitboard, and key history are (re)derived; on failure the
    /// board is left in a valid but unspecified state and the error is
    /// returned, so callers should parse into a scratch board first.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::TooFewFields {
                found: fields.len(),
            });
        }

        // Field 1: piece placement, rank 8 first.
        let mut placement: [[u64; 6]; 2] = [[0; 6]; 2];
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount { ranks: ranks.len() });
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                } else {
                    let (piece, color) = CHAR_TO_PC
                        .get(ch as usize)
                        .copied()
                        .flatten()
                        .ok_or(FenError::InvalidPiece { ch })?;
                    if file > 7 {
                        return Err(FenError::BadRankWidth { rank, files: file + 1 });
                    }
                    placement[color as usize][piece as usize] |= 1u64 << (rank * 8 + file);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BadRankWidth { rank, files: file });
            }
        }

        // Field 2: side to move.
        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        // Field 3: castling rights.
        let mut rights = 0u8;
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(FenError::InvalidCastling { ch }),
                };
            }
        }

        // Field 4: en passant target.
        let en_passant = if fields[3] == "-" {
            None
        } else {
            Some(
                Square::from_str(fields[3]).map_err(|_| FenError::InvalidEnPassant {
                    found: fields[3].to_string(),
                })?,
            )
        };

        // Fields 5-6: clocks, defaulting when absent.
        let halfmove = match fields.get(4) {
            Some(s) => s.parse::<u32>().map_err(|_| FenError::InvalidCounter {
                found: s.to_string(),
            })?,
            None => 0,
        };
        let fullmove = match fields.get(5) {
            Some(s) => s.parse::<u32>().map_err(|_| FenError::InvalidCounter {
                found: s.to_string(),
            })?,
            None => 1,
        };

        // Validation passed; now mutate.
        for (ci, per_color) in placement.iter().enumerate() {
            for (pi, &bb) in per_color.iter().enumerate() {
                self.set_bb(Color::from_u8(ci as u8), Piece::from_u8(pi as u8), bb);
            }
        }
        self.side_to_move = side;
        self.castling_rights = rights;
        self.en_passant = en_passant;
        self.halfmove_clock = halfmove;
        self.fullmove_number = fullmove;

        self.refresh_zobrist();
        self.checkers = crate::moves::square_control::compute_checkers(self);
        self.key_history.clear();
        self.key_history.push(self.zobrist);
        Ok(())
    }

    /// Emit the current position as a six-field FEN string.
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);

        for rank in (0..8).rev() {
            let mut empties = 0;
            for file in 0..8 {
                let sq = Square::from_rank_file(rank, file);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empties > 0 {
                            out.push(char::from_digit(empties, 10).unwrap());
                            empties = 0;
                        }
                        out.push(piece_char(piece, color));
                    }
                    None => empties += 1,
                }
            }
            if empties > 0 {
                out.push(char::from_digit(empties, 10).unwrap());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling_rights == 0 {
            out.push('-');
        } else {
            if self.castling_rights & CASTLE_WK != 0 {
                out.push('K');
            }
            if self.castling_rights & CASTLE_WQ != 0 {
                out.push('Q');
            }
            if self.castling_rights & CASTLE_BK != 0 {
                out.push('k');
            }
            if self.castling_rights & CASTLE_BQ != 0 {
                out.push('q');
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}
