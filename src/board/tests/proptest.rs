//! Property-based tests using proptest.

use proptest::prelude::*;
use rand::prelude::*;
use rand::Rng as _;

use crate::board::{Color, Engine, Move, MAX_MOVES};

/// Strategy to generate a random playout length
fn ply_count_strategy() -> impl Strategy<Value = usize> {
    1..=12usize
}

/// Strategy to generate a random seed for move selection
fn seed_strategy() -> impl Strategy<Value = u64> {
    any::<u64>()
}

// Drive a random playout; returns false once no candidate remains.
fn play_random_move(engine: &mut Engine, rng: &mut StdRng) -> bool {
    let mut buf = [Move::null(); MAX_MOVES];
    let count = engine.enumerate_moves(&mut buf).min(MAX_MOVES);
    if count == 0 {
        return false;
    }
    let mv = buf[rng.gen_range(0..count)];
    assert!(engine.play_move(mv), "enumerated move {mv} must apply");
    true
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: enumeration leaves the position untouched and every
    /// randomly chosen candidate applies; different seeds walk different
    /// branches of the game tree.
    #[test]
    fn prop_enumerated_moves_apply(seed in seed_strategy(), plies in ply_count_strategy()) {
        let mut engine = Engine::new();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..plies {
            let before = engine.to_fen();
            let mut buf = [Move::null(); MAX_MOVES];
            let count = engine.enumerate_moves(&mut buf).min(MAX_MOVES);
            prop_assert_eq!(engine.to_fen(), before.clone());
            if count == 0 {
                break;
            }

            let mv = buf[rng.gen_range(0..count)];
            prop_assert!(engine.play_move(mv), "candidate {} failed from {}", mv, before);
        }
    }

    /// Property: FEN round-trips through arbitrary reachable positions.
    #[test]
    fn prop_fen_roundtrip(seed in seed_strategy(), plies in ply_count_strategy()) {
        let mut engine = Engine::new();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..plies {
            if !play_random_move(&mut engine, &mut rng) {
                break;
            }
            let fen = engine.to_fen();
            let mut restored = Engine::new();
            restored.set_position(&fen);
            prop_assert_eq!(restored.to_fen(), fen);
        }
    }

    /// Property: enumeration is a pure function of the position.
    #[test]
    fn prop_enumeration_deterministic(seed in seed_strategy(), plies in ply_count_strategy()) {
        let mut engine = Engine::new();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..plies {
            if !play_random_move(&mut engine, &mut rng) {
                break;
            }
        }

        let mut first = [Move::null(); MAX_MOVES];
        let mut second = [Move::null(); MAX_MOVES];
        let count_first = engine.enumerate_moves(&mut first);
        let count_second = engine.enumerate_moves(&mut second);
        prop_assert_eq!(count_first, count_second);
        prop_assert_eq!(&first[..], &second[..]);
    }

    /// Property: the status probes never disturb the position, and their
    /// implications hold: mate implies check, stalemate implies no check.
    #[test]
    fn prop_status_probes_are_pure(seed in seed_strategy(), plies in ply_count_strategy()) {
        let mut engine = Engine::new();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..plies {
            if !play_random_move(&mut engine, &mut rng) {
                break;
            }
        }

        let before = engine.to_fen();
        for color in [Color::White, Color::Black] {
            let mate = engine.is_checkmate(color);
            let stale = engine.is_stalemate(color);
            let check = engine.in_check(color);
            prop_assert!(!(mate && stale));
            if mate {
                prop_assert!(check);
            }
            if stale {
                prop_assert!(!check);
            }
        }
        prop_assert_eq!(engine.to_fen(), before);
    }
}
