//! Optional transposition accelerator.
//!
//! A 24-bit-indexed table keyed by two incremental hashes. Keys mutate on
//! every move application through a scrambled four-byte window indexed by
//! square and piece, and are restored on undo. The table is advisory: a
//! miss or collision only costs a redo.

use once_cell::sync::Lazy;
use rand::prelude::*;

use super::geometry::INVALID;
use super::search::DEPTH_MAX;
use super::state::Engine;

const SCRAMBLE_LEN: usize = 1035;
const TABLE_SIZE: usize = 1 << 24;

// Seeded once so hash keys are reproducible across runs.
static SCRAMBLE: Lazy<[u8; SCRAMBLE_LEN]> = Lazy::new(|| {
    let mut table = [0u8; SCRAMBLE_LEN];
    let mut rng = StdRng::seed_from_u64(1);
    for byte in table.iter_mut() {
        *byte = rng.gen();
    }
    table
});

#[derive(Clone, Copy, Default)]
pub(crate) struct HashEntry {
    pub(crate) key2: u32,
    pub(crate) score: i32,
    pub(crate) square_from: u8,
    pub(crate) square_to: u8,
    pub(crate) depth: u8,
}

pub(crate) struct HashState {
    pub(crate) key: u32,
    pub(crate) key2: u32,
    table: Vec<HashEntry>,
}

impl HashState {
    pub(crate) fn new() -> Self {
        HashState {
            key: 0,
            key2: 0,
            table: vec![HashEntry::default(); TABLE_SIZE],
        }
    }

    pub(crate) fn reset(&mut self) {
        self.key = 0;
        self.key2 = 0;
        self.table.fill(HashEntry::default());
    }

    pub(crate) fn keys(&self) -> (u32, u32) {
        (self.key, self.key2)
    }

    pub(crate) fn set_keys(&mut self, keys: (u32, u32)) {
        self.key = keys.0;
        self.key2 = keys.1;
    }

    // The side and en-passant square fold into the bucket choice so those
    // state bits need no key material of their own.
    pub(crate) fn entry_index(&self, side: u8, en_passant: u8) -> usize {
        (self
            .key
            .wrapping_add(u32::from(side).wrapping_mul(u32::from(en_passant)))
            as usize)
            & (TABLE_SIZE - 1)
    }

    pub(crate) fn entry(&self, index: usize) -> HashEntry {
        self.table[index]
    }

    /// Store an iteration result unless the slot is locked as game
    /// history. The bound type rides in the from-byte: 0x08 when the
    /// score exceeded alpha, 0x80 when it stayed below beta.
    pub(crate) fn store(
        &mut self,
        index: usize,
        alpha: i32,
        beta: i32,
        depth: u8,
        score: i32,
        square_from: u8,
        square_to: u8,
    ) {
        let key2 = self.key2;
        let entry = &mut self.table[index];
        if entry.depth < DEPTH_MAX {
            entry.key2 = key2;
            entry.score = score;
            entry.depth = depth;
            entry.square_from = square_from
                | if score > alpha { 0x08 } else { 0 }
                | if score < beta { INVALID } else { 0 };
            entry.square_to = square_to;
        }
    }

    /// Lock the committed game position as a draw so later searches do
    /// not steer back into it.
    pub(crate) fn lock_draw(&mut self, index: usize) {
        let entry = &mut self.table[index];
        entry.depth = DEPTH_MAX;
        entry.score = 0;
    }
}

impl Engine {
    // Incremental key update for a move already applied to the board.
    pub(crate) fn hash_apply(
        &mut self,
        square_from: u8,
        square_to: u8,
        capture_square: u8,
        scan_piece: u8,
        capture_piece: u8,
        castling_rook: u8,
    ) {
        let moved_cell = self.board[square_to as usize];
        let delta = |offset: usize| {
            scramble32(square_to as usize + offset, moved_cell)
                .wrapping_sub(scramble32(square_from as usize + offset, scan_piece))
                .wrapping_sub(scramble32(capture_square as usize + offset, capture_piece))
        };
        self.hash.key = self.hash.key.wrapping_add(delta(0));
        self.hash.key2 = self
            .hash
            .key2
            .wrapping_add(delta(8))
            .wrapping_add((i32::from(castling_rook) - i32::from(INVALID)) as u32);
    }
}

fn scramble32(at: usize, piece: u8) -> u32 {
    let index = at + usize::from(piece & 0x08) + usize::from(INVALID) * usize::from(piece & 0b111);
    let window = &SCRAMBLE[index..index + 4];
    u32::from_ne_bytes([window[0], window[1], window[2], window[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scramble_is_deterministic() {
        assert_eq!(scramble32(0, 0), scramble32(0, 0));
        assert_ne!(scramble32(0, 1), scramble32(0, 2));
    }

    #[test]
    fn test_scramble_window_stays_in_bounds() {
        // Largest reachable index: square 0x77 + offset 8, both piece
        // bit groups saturated.
        let _ = scramble32(0x77 + 8, 0xff);
    }

    #[test]
    fn test_store_respects_draw_lock() {
        let mut state = HashState {
            key: 0,
            key2: 7,
            table: vec![HashEntry::default(); 4],
        };
        state.lock_draw(1);
        state.store(1, -10, 10, 5, 42, 0x34, 0x44);
        assert_eq!(state.entry(1).score, 0);
        assert_eq!(state.entry(1).depth, DEPTH_MAX);

        state.store(2, -10, 10, 5, 42, 0x34, 0x44);
        assert_eq!(state.entry(2).score, 42);
        assert_eq!(state.entry(2).key2, 7);
    }
}
