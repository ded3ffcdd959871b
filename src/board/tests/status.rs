//! Check, checkmate and stalemate probe tests.

use crate::board::{Color, Engine};

fn engine_at(fen: &str) -> Engine {
    let mut engine = Engine::new();
    engine.set_position(fen);
    engine
}

#[test]
fn test_rook_gives_check() {
    let engine = engine_at("4k3/4R3/8/8/8/8/8/4K3 b - - 0 1");
    assert!(engine.in_check(Color::Black));
    assert!(!engine.in_check(Color::White));
}

#[test]
fn test_queen_gives_check() {
    let engine = engine_at("4k3/4Q3/8/8/8/8/8/4K3 b - - 0 1");
    assert!(engine.in_check(Color::Black));
}

#[test]
fn test_bishop_gives_check() {
    let engine = engine_at("6k1/8/8/3B4/8/8/8/4K3 b - - 0 1");
    assert!(engine.in_check(Color::Black));
}

#[test]
fn test_knight_gives_check() {
    let engine = engine_at("4k3/8/5N2/8/8/8/8/4K3 b - - 0 1");
    assert!(engine.in_check(Color::Black));
}

#[test]
fn test_pawn_gives_check() {
    let engine = engine_at("2k5/3P4/8/8/8/8/8/4K3 b - - 0 1");
    assert!(engine.in_check(Color::Black));
}

#[test]
fn test_king_contact_gives_check() {
    let engine = engine_at("4k3/3K4/8/8/8/8/8/8 b - - 0 1");
    assert!(engine.in_check(Color::Black));
}

#[test]
fn test_blocked_ray_is_no_check() {
    let engine = engine_at("4k3/4n3/4R3/8/8/8/8/4K3 b - - 0 1");
    assert!(!engine.in_check(Color::Black));
}

#[test]
fn test_checkmate_in_corner() {
    let mut engine = engine_at("7k/5KQ1/8/8/8/8/8/8 b - - 0 1");
    assert!(engine.is_checkmate(Color::Black));
    assert!(!engine.is_stalemate(Color::Black));
}

#[test]
fn test_stalemate_in_corner() {
    let mut engine = engine_at("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    assert!(engine.is_stalemate(Color::Black));
    assert!(!engine.is_checkmate(Color::Black));
}

#[test]
fn test_check_with_escape_is_not_mate() {
    let mut engine = engine_at("4k3/4R3/8/8/8/8/8/4K3 b - - 0 1");
    assert!(engine.in_check(Color::Black));
    assert!(!engine.is_checkmate(Color::Black));
}

#[test]
fn test_start_position_is_quiet() {
    let mut engine = Engine::new();
    assert!(!engine.in_check(Color::White));
    assert!(!engine.in_check(Color::Black));
    assert!(!engine.is_checkmate(Color::White));
    assert!(!engine.is_stalemate(Color::White));
}

#[test]
fn test_probes_preserve_state() {
    let mut engine = engine_at("7k/5KQ1/8/8/8/8/8/8 b - - 0 1");
    let before = engine.to_fen();
    engine.is_checkmate(Color::Black);
    engine.is_stalemate(Color::White);
    assert_eq!(engine.to_fen(), before);
}

#[test]
fn test_back_rank_mate() {
    let mut engine = engine_at("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1");
    assert!(engine.play_move("e1e8".parse().unwrap()));
    assert!(engine.is_checkmate(Color::Black));
}
