//! Engine state and lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::geometry::{self, BACK_RANK, BLACK, INVALID, PAWN_DOWN, PAWN_UP, WHITE};
use super::types::{Color, Piece, Square};

/// Callback invoked on every node expansion during search. Install a
/// [`StopHandle`] inside the closure to cancel a running search.
pub(crate) type NodeCallback = Box<dyn FnMut()>;

/// Clonable handle that stops a running search cooperatively.
///
/// The search checks the flag at every iterative-deepening step; the ply
/// in flight completes before the search unwinds with its best-so-far.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// The chess engine: one owned value holding the board, the side to move,
/// the running evaluation, and the bookkeeping that couples searches to
/// their caller.
///
/// The 0x88 board keeps piece cells in the left half of each rank and a
/// positional-weight table in the right half; index `0x80` is a scratch
/// cell that absorbs writes routed through the invalid-square sentinel.
pub struct Engine {
    pub(crate) board: [u8; 0x81],
    pub(crate) side: u8,
    pub(crate) score: i32,
    pub(crate) en_passant: u8,
    pub(crate) non_pawn_material: i32,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) callback: Option<NodeCallback>,
    #[cfg(feature = "hashing")]
    pub(crate) hash: super::hash::HashState,
}

/// Saved engine state for the trial-move scaffolding of the status probes.
pub(crate) struct Snapshot {
    board: [u8; 0x81],
    side: u8,
    score: i32,
    en_passant: u8,
    non_pawn_material: i32,
    #[cfg(feature = "hashing")]
    keys: (u32, u32),
}

impl Engine {
    /// Create an engine at the standard start position, White to move.
    #[must_use]
    pub fn new() -> Self {
        let mut engine = Engine {
            board: [0; 0x81],
            side: WHITE,
            score: 0,
            en_passant: INVALID,
            non_pawn_material: 0,
            stop: Arc::new(AtomicBool::new(false)),
            callback: None,
            #[cfg(feature = "hashing")]
            hash: super::hash::HashState::new(),
        };
        engine.reset();
        engine
    }

    /// Reset to the standard start position. The callback installation
    /// survives a reset.
    pub fn reset(&mut self) {
        for file in 0..8 {
            self.board[file] = BLACK | BACK_RANK[file];
            self.board[0x10 + file] = BLACK | PAWN_DOWN;
            for row in 2..6 {
                self.board[0x10 * row + file] = geometry::EMPTY;
            }
            self.board[0x60 + file] = WHITE | PAWN_UP;
            self.board[0x70 + file] = WHITE | BACK_RANK[file];

            for row in 0..8 {
                self.board[0x10 * row + file + 8] = geometry::weight(row, file);
            }
        }
        self.board[0x80] = 0;

        self.side = WHITE;
        self.score = 0;
        self.en_passant = INVALID;
        self.non_pawn_material = 0;

        #[cfg(feature = "hashing")]
        self.hash.reset();
    }

    /// The side to move.
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        if self.side == WHITE {
            Color::White
        } else {
            Color::Black
        }
    }

    /// The piece on a square, `None` when empty.
    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<(Color, Piece)> {
        geometry::decode(self.board[square.index() as usize])
    }

    /// Install the per-node callback. It runs on every node expansion and
    /// may stop the search through a [`StopHandle`].
    pub fn set_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Handle for cancelling searches, safe to move into the callback.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Stop the current search at the next deepening step.
    pub fn stop_search(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board,
            side: self.side,
            score: self.score,
            en_passant: self.en_passant,
            non_pawn_material: self.non_pawn_material,
            #[cfg(feature = "hashing")]
            keys: self.hash.keys(),
        }
    }

    pub(crate) fn restore(&mut self, saved: Snapshot) {
        self.board = saved.board;
        self.side = saved.side;
        self.score = saved.score;
        self.en_passant = saved.en_passant;
        self.non_pawn_material = saved.non_pawn_material;
        #[cfg(feature = "hashing")]
        self.hash.set_keys(saved.keys);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for row in 0..8 {
            write!(f, "{} |", 8 - row)?;
            for file in 0..8 {
                let symbol = match geometry::decode(self.board[(row << 4) | file]) {
                    Some((color, piece)) => piece.to_fen_char(color),
                    None => '.',
                };
                write!(f, " {symbol}")?;
            }
            writeln!(f, " |")?;
        }
        writeln!(f, "  +-----------------+")?;
        write!(f, "    a b c d e f g h")
    }
}
