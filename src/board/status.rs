//! Game-status probes: check, checkmate, stalemate.
//!
//! The in-check test reads the board directly; the mate and stalemate
//! probes re-enter the search in enumerate mode and trial-apply every
//! candidate, restoring the engine afterwards.

use super::geometry::{
    kind, side_bits, BISHOP, KING, KNIGHT, OFF_BOARD, PAWN_DOWN, PAWN_UP, QUEEN, ROOK, WHITE,
};
use super::search::MAX_MOVES;
use super::state::Engine;
use super::types::{Color, Move};

// Orthogonals first, then diagonals.
const RAYS: [i8; 8] = [1, -1, 16, -16, 15, -15, 17, -17];
const KNIGHT_JUMPS: [i8; 8] = [14, 18, 31, 33, -14, -18, -31, -33];

impl Engine {
    /// Whether `color`'s king is attacked.
    #[must_use]
    pub fn in_check(&self, color: Color) -> bool {
        let own = side_bits(color);
        let enemy = side_bits(color.opponent());

        let Some(king_square) = self.find_king(own) else {
            return false;
        };

        // Sliders: rook or queen on an orthogonal, bishop or queen on a
        // diagonal; the first occupied cell settles each ray.
        for (ray_index, ray) in RAYS.iter().enumerate() {
            let mut square = king_square;
            loop {
                square = square.wrapping_add(*ray as u8);
                if square & OFF_BOARD != 0 {
                    break;
                }
                let cell = self.board[square as usize];
                if cell == 0 {
                    continue;
                }
                if cell & enemy != 0 {
                    let attacker = kind(cell);
                    if ray_index < 4 && (attacker == ROOK || attacker == QUEEN) {
                        return true;
                    }
                    if ray_index >= 4 && (attacker == BISHOP || attacker == QUEEN) {
                        return true;
                    }
                }
                break;
            }
        }

        for jump in KNIGHT_JUMPS {
            let square = king_square.wrapping_add(jump as u8);
            if square & OFF_BOARD == 0 {
                let cell = self.board[square as usize];
                if cell & enemy != 0 && kind(cell) == KNIGHT {
                    return true;
                }
            }
        }

        // Pawns attack diagonally toward the enemy back rank.
        let forward: i8 = if own == WHITE { -16 } else { 16 };
        let attacker = if own == WHITE { PAWN_DOWN } else { PAWN_UP };
        for lateral in [-1i8, 1] {
            let square = king_square.wrapping_add((forward + lateral) as u8);
            if square & OFF_BOARD == 0 {
                let cell = self.board[square as usize];
                if cell & enemy != 0 && kind(cell) == attacker {
                    return true;
                }
            }
        }

        // Enemy king contact.
        for ray in RAYS {
            let square = king_square.wrapping_add(ray as u8);
            if square & OFF_BOARD == 0 {
                let cell = self.board[square as usize];
                if cell & enemy != 0 && kind(cell) == KING {
                    return true;
                }
            }
        }

        false
    }

    /// In check with no legal reply.
    #[must_use]
    pub fn is_checkmate(&mut self, color: Color) -> bool {
        self.in_check(color) && !self.has_legal_reply(color)
    }

    /// Not in check, yet no legal reply.
    #[must_use]
    pub fn is_stalemate(&mut self, color: Color) -> bool {
        !self.in_check(color) && !self.has_legal_reply(color)
    }

    fn find_king(&self, own: u8) -> Option<u8> {
        for row in 0..8u8 {
            for file in 0..8u8 {
                let square = row * 16 + file;
                let cell = self.board[square as usize];
                if cell & own != 0 && kind(cell) == KING {
                    return Some(square);
                }
            }
        }
        None
    }

    // Trial-apply every candidate and keep the first that leaves the king
    // safe; the engine state is restored in all paths.
    fn has_legal_reply(&mut self, color: Color) -> bool {
        let saved = self.snapshot();
        self.side = side_bits(color);

        let mut buf = [Move::null(); MAX_MOVES];
        let count = self.enumerate_moves(&mut buf).min(MAX_MOVES);

        let mut found = false;
        for &mv in &buf[..count] {
            let trial = self.snapshot();
            if self.play_move(mv) && !self.in_check(color) {
                found = true;
            }
            self.restore(trial);
            if found {
                break;
            }
        }

        self.restore(saved);
        found
    }
}
