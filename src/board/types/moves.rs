//! Move type and coordinate notation.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::error::MoveParseError;

use super::square::Square;

/// A move as a from/to square pair.
///
/// Promotion carries no piece choice: a pawn reaching the last rank always
/// becomes a queen. A trailing `q` in coordinate notation is accepted and
/// ignored for compatibility.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    from: Square,
    to: Square,
}

impl Move {
    #[inline]
    #[must_use]
    pub const fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }

    /// Create a degenerate placeholder move (used for buffer initialization)
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Move {
            from: Square::new(0, 0),
            to: Square::new(0, 0),
        }
    }

    #[inline]
    #[must_use]
    pub const fn from(self) -> Square {
        self.from
    }

    #[inline]
    #[must_use]
    pub const fn to(self) -> Square {
        self.to
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() < 4 || chars.len() > 5 {
            return Err(MoveParseError::InvalidLength { len: chars.len() });
        }

        let square = |pair: &[char]| -> Result<Square, MoveParseError> {
            pair.iter()
                .collect::<String>()
                .parse()
                .map_err(|_| MoveParseError::InvalidSquare {
                    notation: s.to_string(),
                })
        };
        let from = square(&chars[0..2])?;
        let to = square(&chars[2..4])?;

        if let Some(&c) = chars.get(4) {
            if c != 'q' && c != 'Q' {
                return Err(MoveParseError::InvalidPromotion { char: c });
            }
        }

        Ok(Move::new(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_roundtrip() {
        let mv: Move = "e2e4".parse().unwrap();
        assert_eq!(mv.from().to_string(), "e2");
        assert_eq!(mv.to().to_string(), "e4");
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn test_move_promotion_suffix() {
        let mv: Move = "e7e8q".parse().unwrap();
        assert_eq!(mv.to_string(), "e7e8");
        assert!("e7e8n".parse::<Move>().is_err());
    }

    #[test]
    fn test_move_parse_errors() {
        assert!("e2".parse::<Move>().is_err());
        assert!("e2e4e5".parse::<Move>().is_err());
        assert!("z2e4".parse::<Move>().is_err());
    }
}
