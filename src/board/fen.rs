//! FEN position read and write.

use super::geometry::{self, has_moved, BLACK, INVALID, MOVED, OFF_BOARD, WHITE};
use super::state::Engine;
use super::types::{Color, Square};

// Home squares carrying the castling has-moved bits.
const WHITE_KING_HOME: usize = 0x74;
const WHITE_ROOK_KINGSIDE: usize = 0x77;
const WHITE_ROOK_QUEENSIDE: usize = 0x70;
const BLACK_KING_HOME: usize = 0x04;
const BLACK_ROOK_KINGSIDE: usize = 0x07;
const BLACK_ROOK_QUEENSIDE: usize = 0x00;

impl Engine {
    /// Reset and load a position from a FEN string.
    ///
    /// Parsing is lenient: unrecognized characters are skipped and fields
    /// beyond the en-passant target are ignored. Every placed piece
    /// carries the has-moved flag; the castling-rights field clears it on
    /// the matching king and rook home squares.
    pub fn set_position(&mut self, fen: &str) {
        self.reset();

        let mut field = 0usize;
        let mut cursor: u8 = 0;

        for c in fen.chars() {
            if c == ' ' {
                if field < 4 {
                    field += 1;
                }
                continue;
            }

            match field {
                0 => {
                    if cursor < INVALID {
                        match c {
                            '1'..='8' => {
                                for _ in 0..(c as u8 - b'0') {
                                    cursor = self.put_cell(cursor, geometry::EMPTY);
                                }
                            }
                            '/' => cursor = (cursor & 0xf0) + 0x10,
                            _ => {
                                if let Some(piece) = super::types::Piece::from_char(c) {
                                    let color = if c.is_uppercase() {
                                        Color::White
                                    } else {
                                        Color::Black
                                    };
                                    cursor = self.put_cell(cursor, geometry::encode(color, piece));
                                }
                            }
                        }
                    }
                }
                1 => match c {
                    'w' => self.side = WHITE,
                    'b' => self.side = BLACK,
                    _ => {}
                },
                2 => match c {
                    'K' => {
                        self.board[WHITE_KING_HOME] &= !MOVED;
                        self.board[WHITE_ROOK_KINGSIDE] &= !MOVED;
                    }
                    'Q' => {
                        self.board[WHITE_KING_HOME] &= !MOVED;
                        self.board[WHITE_ROOK_QUEENSIDE] &= !MOVED;
                    }
                    'k' => {
                        self.board[BLACK_KING_HOME] &= !MOVED;
                        self.board[BLACK_ROOK_KINGSIDE] &= !MOVED;
                    }
                    'q' => {
                        self.board[BLACK_KING_HOME] &= !MOVED;
                        self.board[BLACK_ROOK_QUEENSIDE] &= !MOVED;
                    }
                    _ => {}
                },
                3 => match c {
                    'a'..='h' => {
                        self.en_passant = (self.en_passant & 0x7f) | (c as u8 - b'a');
                    }
                    '1'..='8' => {
                        self.en_passant = (self.en_passant & 0x7f) | (16 * (b'8' - c as u8));
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    // Place one cell and advance; off-board cursors stay put, which makes
    // over-long ranks harmless.
    fn put_cell(&mut self, cursor: u8, cell: u8) -> u8 {
        if cursor & OFF_BOARD != 0 {
            return cursor;
        }
        self.board[cursor as usize] = if cell != 0 { cell | MOVED } else { cell };
        cursor + 1
    }

    /// Export the position as a six-field FEN string.
    ///
    /// Castling rights are reconstructed from the has-moved bits on the
    /// home squares. The half-move clock and full-move counter are not
    /// tracked and emit as `0 1`.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut rows: Vec<String> = Vec::new();
        for row in 0..8 {
            let mut out = String::new();
            let mut empty = 0;
            for file in 0..8 {
                if let Some((color, piece)) = geometry::decode(self.board[(row << 4) | file]) {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push(piece.to_fen_char(color));
                } else {
                    empty += 1;
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            rows.push(out);
        }

        let active = if self.side == WHITE { "w" } else { "b" };

        let mut castling = String::new();
        if !has_moved(self.board[WHITE_KING_HOME]) && !has_moved(self.board[WHITE_ROOK_KINGSIDE]) {
            castling.push('K');
        }
        if !has_moved(self.board[WHITE_KING_HOME]) && !has_moved(self.board[WHITE_ROOK_QUEENSIDE]) {
            castling.push('Q');
        }
        if !has_moved(self.board[BLACK_KING_HOME]) && !has_moved(self.board[BLACK_ROOK_KINGSIDE]) {
            castling.push('k');
        }
        if !has_moved(self.board[BLACK_KING_HOME]) && !has_moved(self.board[BLACK_ROOK_QUEENSIDE]) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = Square::from_raw(self.en_passant)
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!("{} {} {} {} 0 1", rows.join("/"), active, castling, en_passant)
    }
}
