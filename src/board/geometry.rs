//! Packed-cell encoding and move geometry tables.
//!
//! Each board cell is one byte: piece kind in bits 0-2, side flags in
//! bits 3-4, the has-moved flag in bit 5. Bits 6-7 stay clear on placed
//! pieces but take part in capture-value arithmetic once a promotion has
//! rewritten the cell.

use super::types::{Color, Piece};

/// White side flag.
pub(crate) const WHITE: u8 = 0x08;
/// Black side flag.
pub(crate) const BLACK: u8 = 0x10;
/// Both side flags; XOR toggles the side to move.
pub(crate) const SIDE_MASK: u8 = 0x18;
/// Has-moved flag: joint castling-right and pawn-double-step tracker.
pub(crate) const MOVED: u8 = 0x20;
/// Piece kind bits.
pub(crate) const KIND_MASK: u8 = 0b111;
/// Off-board test mask for 0x88 squares.
pub(crate) const OFF_BOARD: u8 = 0x88;
/// Invalid-square sentinel; doubles as the scratch-cell index.
pub(crate) const INVALID: u8 = 0x80;

// Piece kinds (bits 0-2). Pawns come in two kinds, one per push
// direction.
pub(crate) const EMPTY: u8 = 0;
pub(crate) const PAWN_UP: u8 = 1;
pub(crate) const PAWN_DOWN: u8 = 2;
pub(crate) const KNIGHT: u8 = 3;
pub(crate) const KING: u8 = 4;
pub(crate) const BISHOP: u8 = 5;
pub(crate) const ROOK: u8 = 6;
pub(crate) const QUEEN: u8 = 7;

/// Capture values per piece kind. Scaled by 37 during search, so material
/// dominates the positional terms. The king's negative entry is the
/// capture-detection sentinel.
pub(crate) const CAPTURE_VALUES: [i8; 8] = [0, 2, 2, 7, -1, 8, 12, 23];

/// Step vectors grouped by piece kind, zero-terminated per group. Sliders
/// negate the vector on odd visits so one entry covers both half-rays;
/// the up-pawn and down-pawn share one group through that negation.
pub(crate) const STEP_VECTORS: [i8; 17] = [
    // Upstream pawn
    -16, -15, -17, 0,
    // Rook
    1, 16, 0,
    // King, queen
    1, 16, 15, 17, 0,
    // Knight
    14, 18, 31, 33, 0,
];

/// First step-vector index per piece kind, pre-incremented before use.
pub(crate) const STEP_INDICES: [i8; 8] = [0, 7, -1, 11, 6, 8, 3, 6];

/// Back-rank piece order for the standard start.
pub(crate) const BACK_RANK: [u8; 8] = [ROOK, KNIGHT, BISHOP, QUEEN, KING, BISHOP, KNIGHT, ROOK];

/// Positional weight of a cell; smaller is closer to the center.
pub(crate) const fn weight(row: usize, file: usize) -> u8 {
    let x = file as i32 - 4;
    let y = row as i32;
    (x * x + (y - 4) * (y - 3)) as u8
}

/// Piece kind bits of a cell.
#[inline]
pub(crate) const fn kind(cell: u8) -> u8 {
    cell & KIND_MASK
}

#[inline]
pub(crate) const fn has_moved(cell: u8) -> bool {
    cell & MOVED != 0
}

/// Side flag bits for a color.
#[inline]
pub(crate) const fn side_bits(color: Color) -> u8 {
    match color {
        Color::White => WHITE,
        Color::Black => BLACK,
    }
}

/// Decode a cell into its color and piece, `None` when empty.
pub(crate) fn decode(cell: u8) -> Option<(Color, Piece)> {
    let color = if cell & WHITE != 0 {
        Color::White
    } else if cell & BLACK != 0 {
        Color::Black
    } else {
        return None;
    };
    let piece = match kind(cell) {
        PAWN_UP | PAWN_DOWN => Piece::Pawn,
        KNIGHT => Piece::Knight,
        KING => Piece::King,
        BISHOP => Piece::Bishop,
        ROOK => Piece::Rook,
        QUEEN => Piece::Queen,
        _ => return None,
    };
    Some((color, piece))
}

/// Encode a color and piece into a cell without the has-moved flag.
/// White pawns push up the board, black pawns down.
pub(crate) const fn encode(color: Color, piece: Piece) -> u8 {
    let kind = match piece {
        Piece::Pawn => match color {
            Color::White => PAWN_UP,
            Color::Black => PAWN_DOWN,
        },
        Piece::Knight => KNIGHT,
        Piece::King => KING,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
    };
    kind | side_bits(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_favors_center() {
        // Corners carry the largest weight, the extended center the least.
        assert_eq!(weight(0, 0), 28);
        assert_eq!(weight(7, 7), 21);
        assert_eq!(weight(3, 4), 0);
        assert_eq!(weight(4, 4), 0);
        assert!(weight(4, 3) < weight(4, 0));
    }

    #[test]
    fn test_step_vector_groups_terminate() {
        for kind in 1..8usize {
            let mut index = STEP_INDICES[kind] as i32;
            let mut steps = 0;
            loop {
                index += 1;
                if STEP_VECTORS[index as usize] == 0 {
                    break;
                }
                steps += 1;
                assert!(steps <= 4, "vector group for kind {kind} runs long");
            }
            assert!(steps >= 2);
        }
    }

    #[test]
    fn test_encode_decode() {
        for color in [Color::White, Color::Black] {
            for piece in [
                Piece::Pawn,
                Piece::Knight,
                Piece::Bishop,
                Piece::Rook,
                Piece::Queen,
                Piece::King,
            ] {
                let cell = encode(color, piece);
                assert_eq!(decode(cell), Some((color, piece)));
                assert_eq!(decode(cell | MOVED), Some((color, piece)));
                assert!(!has_moved(cell));
                assert!(has_moved(cell | MOVED));
            }
        }
        assert_eq!(decode(EMPTY), None);
    }

    #[test]
    fn test_king_capture_sentinel() {
        assert!(CAPTURE_VALUES[KING as usize] < 0);
        assert!(CAPTURE_VALUES[QUEEN as usize] > CAPTURE_VALUES[ROOK as usize]);
    }
}
