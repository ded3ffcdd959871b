//! Recursive search core.
//!
//! One procedure drives every caller intent: enumerating candidate moves,
//! finding a best move under node and depth budgets, and applying a
//! specific move. Move generation, evaluation and alpha-beta pruning are
//! interleaved in the recursion; the board is mutated in place on the way
//! down and restored before every return, so the engine state is
//! byte-identical across a search.

use std::sync::atomic::Ordering;

use super::geometry::{
    CAPTURE_VALUES, INVALID, KING, MOVED, OFF_BOARD, SIDE_MASK, STEP_INDICES, STEP_VECTORS,
};
use super::state::Engine;
use super::types::{Move, Square};

/// Internal score bound; king captures and committed moves signal through
/// it.
pub(crate) const SCORE_MAX: i32 = 8000;

/// Depth ceiling; a king capture forces the iteration counter next to it
/// to end the deepening loop.
pub(crate) const DEPTH_MAX: u8 = 99;

/// Upper bound on the candidate moves of any legal position.
pub const MAX_MOVES: usize = 256;

/// Caller intent for one entry into the search.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Recursion below the root.
    Internal,
    /// Record every root candidate at iterative depth 3.
    Enumerate,
    /// Deepen until the budget runs out, then commit the best move found.
    FindBest,
    /// Force the caller's move and commit it if it survives.
    Apply,
}

/// Per-search bookkeeping: the in-out move slots coupling the caller to
/// the recursion, the node budget, and the enumeration sink.
pub(crate) struct SearchRun<'a> {
    target_from: u8,
    target_to: u8,
    node_count: u32,
    node_max: u32,
    depth_max: u32,
    sink: MoveSink<'a>,
}

struct MoveSink<'a> {
    buf: &'a mut [Move],
    count: usize,
}

impl MoveSink<'_> {
    // Count every candidate but write only up to capacity, so callers can
    // size-probe with an empty buffer.
    fn push(&mut self, mv: Move) {
        if self.count < self.buf.len() {
            self.buf[self.count] = mv;
        }
        self.count += 1;
    }
}

impl Engine {
    /// Enumerate the candidate moves of the side to move.
    ///
    /// At most `buf.len()` entries are written, but counting continues,
    /// so the returned count may exceed the buffer and an empty buffer
    /// yields a pure count.
    pub fn enumerate_moves(&mut self, buf: &mut [Move]) -> usize {
        let mut run = SearchRun {
            target_from: INVALID,
            target_to: INVALID,
            node_count: 0,
            node_max: 0,
            depth_max: 0,
            sink: MoveSink { buf, count: 0 },
        };
        self.start_search(&mut run, Mode::Enumerate);
        run.sink.count
    }

    /// Search for the best move under the given node and depth budgets.
    ///
    /// Returns `None` when no legal move exists; the caller distinguishes
    /// checkmate from stalemate through the status probes.
    pub fn find_best_move(&mut self, node_max: u32, depth_max: u32) -> Option<Move> {
        let mut run = SearchRun {
            target_from: INVALID,
            target_to: INVALID,
            node_count: 0,
            node_max,
            depth_max: depth_max.saturating_add(3),
            sink: MoveSink { buf: &mut [], count: 0 },
        };
        let score = self.start_search(&mut run, Mode::FindBest);

        let best = if score == SCORE_MAX {
            Some(Move::new(
                Square::from_raw(run.target_from)?,
                Square::from_raw(run.target_to)?,
            ))
        } else {
            None
        };
        log::debug!(
            "search finished: best {:?}, {} nodes",
            best.map(|mv| mv.to_string()),
            run.node_count
        );
        best
    }

    /// Apply a move if it is legal under the pseudo-legal plus king-safe
    /// criterion. Returns `false` and leaves the position unchanged
    /// otherwise.
    pub fn play_move(&mut self, mv: Move) -> bool {
        let mut run = SearchRun {
            target_from: mv.from().index(),
            target_to: mv.to().index(),
            node_count: 0,
            node_max: 0,
            depth_max: 0,
            sink: MoveSink { buf: &mut [], count: 0 },
        };
        self.start_search(&mut run, Mode::Apply) == SCORE_MAX
    }

    fn start_search(&mut self, run: &mut SearchRun<'_>, mode: Mode) -> i32 {
        self.stop.store(false, Ordering::SeqCst);
        self.search(
            run,
            -SCORE_MAX,
            SCORE_MAX,
            self.score,
            self.en_passant,
            3,
            mode,
        )
    }

    // The recursive core. `(alpha, beta)` is the search window, `score`
    // the running evaluation from the side to move's perspective,
    // `en_passant` the square skipped by the previous move. Returns the
    // node score; `beta` doubles as the committed-move signal for the
    // apply and find-best modes.
    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    fn search(
        &mut self,
        run: &mut SearchRun<'_>,
        mut alpha: i32,
        mut beta: i32,
        score: i32,
        en_passant: u8,
        depth: u8,
        mode: Mode,
    ) -> i32 {
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }

        // Delay bonus: shrink the window by one point so later opponent
        // mates and earlier own mates win ties.
        alpha -= i32::from(alpha < score);
        beta -= i32::from(beta <= score);

        let mut iter_depth: u8 = 0;
        let mut iter_score: i32 = 0;
        let mut iter_from: u8 = 0;
        let mut iter_to: u8 = 0;

        #[cfg(feature = "hashing")]
        let saved_keys = self.hash.keys();
        #[cfg(feature = "hashing")]
        let entry_index = self.hash.entry_index(self.side, en_passant);
        #[cfg(feature = "hashing")]
        {
            let entry = self.hash.entry(entry_index);
            iter_depth = entry.depth;
            iter_score = entry.score;
            iter_from = entry.square_from;
            iter_to = entry.square_to;

            // Resume at the stored depth only on a same-position internal
            // hit whose bound is compatible with the window.
            if entry.key2 != saved_keys.1
                || mode != Mode::Internal
                || !((iter_score <= alpha || iter_from & 0x8 != 0)
                    && (iter_score >= beta || iter_from & INVALID != 0))
            {
                iter_depth = 0;
                iter_to = 0;
            }

            // The surviving from-byte is only a scan-start hint.
            iter_from &= !OFF_BOARD;
        }

        // Iterative deepening, at least two iterations. A non-internal
        // root keeps deepening until a budget runs out or a stop comes
        // in, then commits the best move found and replays one final
        // pass to act on it.
        loop {
            let deepen = iter_depth < depth;
            iter_depth = iter_depth.wrapping_add(1);
            let stopped = self.stop.load(Ordering::SeqCst);
            let proceed = deepen
                || iter_depth < 3
                || (mode != Mode::Internal
                    && run.target_from == INVALID
                    && if run.node_count < run.node_max
                        && u32::from(iter_depth) <= run.depth_max
                        && !stopped
                    {
                        true
                    } else {
                        run.target_from = iter_from;
                        run.target_to = iter_to & !OFF_BOARD;
                        iter_depth = 3;
                        true
                    });
            if !proceed {
                break;
            }
            // A stop unwinds the recursion at once; the committed root
            // pass still runs so the best-so-far move gets returned.
            if stopped && (mode == Mode::Internal || run.target_from == INVALID) {
                break;
            }

            // The scan starts at the previous iteration's best square;
            // enumeration always scans from the top for a stable order.
            let square_start = if mode == Mode::Enumerate { 0 } else { iter_from };
            let mut square_from = square_start;

            // Replay the previous best move first, unless its to-slot
            // carries the castling/double-step marker.
            let mut replay_move: u8 = iter_to & INVALID;

            // Null move: hand the opponent a free tempo at reduced depth.
            self.side ^= SIDE_MASK;
            let null_score = if iter_depth > 2 && beta != -SCORE_MAX {
                self.search(
                    run,
                    -beta,
                    1 - beta,
                    -score,
                    INVALID,
                    iter_depth - 3,
                    Mode::Internal,
                )
            } else {
                SCORE_MAX
            };
            self.side ^= SIDE_MASK;

            // A null-move fail high prunes the iteration by seeding it
            // with the proven bound; endgames skip the shortcut entirely.
            iter_score = if -null_score < beta || self.non_pawn_material > 35 {
                if iter_depth == 2 {
                    score
                } else {
                    -SCORE_MAX
                }
            } else {
                -null_score
            };

            run.node_count += 1;

            'scan: loop {
                let scan_piece = self.board[square_from as usize];

                if scan_piece & self.side != 0 {
                    let scan_kind = scan_piece & 0b111;
                    let mut vector_index = i32::from(STEP_INDICES[scan_kind as usize]);
                    let mut step: i8 = scan_kind as i8;

                    // Walk the step vectors; sliders revisit each entry
                    // negated to cover both half-rays.
                    loop {
                        step = if scan_kind > 2 && step < 0 {
                            -step
                        } else {
                            vector_index += 1;
                            -STEP_VECTORS[vector_index as usize]
                        };
                        if step == 0 {
                            break;
                        }

                        // One pass per ray, re-entered once after the
                        // replayed best move has been examined.
                        'ray: loop {
                            let mut square_to = square_from;
                            let mut castling_skip = INVALID;
                            let mut castling_rook = INVALID;

                            loop {
                                square_to = if replay_move != 0 {
                                    iter_to ^ replay_move
                                } else {
                                    square_to.wrapping_add(step as u8)
                                };
                                let mut capture_square = square_to;

                                if square_to & OFF_BOARD != 0 {
                                    break;
                                }

                                // A reply landing on or beside the square a
                                // rook just castled onto refutes the
                                // castling: it passed through attack.
                                if en_passant != INVALID
                                    && self.board[en_passant as usize] != 0
                                    && (i32::from(square_to) - i32::from(en_passant)).abs() < 2
                                {
                                    iter_score = SCORE_MAX;
                                }

                                // En passant: the captured pawn stands one
                                // rank off the destination.
                                if scan_kind < 3 && square_to == en_passant {
                                    capture_square ^= 16;
                                }
                                let mut capture_piece = self.board[capture_square as usize];

                                // Own piece blocks; pawns push straight
                                // only onto empty squares and capture
                                // diagonally only.
                                if capture_piece & self.side != 0
                                    || (scan_kind < 3
                                        && ((square_to.wrapping_sub(square_from) & 0b111 == 0)
                                            != (capture_piece == 0)))
                                {
                                    break;
                                }

                                let mut capture_value = 37
                                    * i32::from(CAPTURE_VALUES[(capture_piece & 0b111) as usize])
                                    + i32::from(capture_piece & 0xc0);

                                if capture_value < 0 {
                                    // King capture: the parent move was
                                    // illegal. Score the node out and wind
                                    // the deepening loop down.
                                    iter_score = SCORE_MAX;
                                    iter_depth = DEPTH_MAX - 1;
                                }

                                if iter_score >= beta && iter_depth > 1 {
                                    break 'scan;
                                }

                                // MVV/LVA stands in for the score at the
                                // quiescence horizon.
                                let mut step_score = if iter_depth == 1 {
                                    capture_value - i32::from(scan_kind)
                                } else {
                                    score
                                };

                                // Expand the move unless the horizon only
                                // admits captures.
                                if i32::from(iter_depth) - i32::from(capture_piece == 0) > 1 {
                                    // Positional delta from the weight
                                    // shadow; queens move on value alone.
                                    step_score = if scan_kind < 6 {
                                        i32::from(self.board[(square_from + 8) as usize])
                                            - i32::from(self.board[(square_to + 8) as usize])
                                    } else {
                                        0
                                    };

                                    // Apply in place; the scratch cell
                                    // absorbs the invalid-square writes.
                                    self.board[castling_rook as usize] = 0;
                                    self.board[capture_square as usize] = 0;
                                    self.board[square_from as usize] = 0;
                                    self.board[square_to as usize] = scan_piece | MOVED;

                                    if castling_rook & OFF_BOARD == 0 {
                                        self.board[castling_skip as usize] = self.side + 6;
                                        step_score += 50;
                                    }

                                    // Keep the king home until the endgame.
                                    if scan_kind == KING && self.non_pawn_material <= 30 {
                                        step_score -= 20;
                                    }

                                    if scan_kind < 3 {
                                        // Pawn structure: isolated and
                                        // doubled pawns pay, clinging to
                                        // the own king pays off, and pushes
                                        // gain as material comes off.
                                        let left = square_from.wrapping_sub(2);
                                        let right = square_from.wrapping_add(2);
                                        let lonely_left = left & OFF_BOARD != 0
                                            || self.board[left as usize] != scan_piece;
                                        let lonely_right = right & OFF_BOARD != 0
                                            || self.board[right as usize] != scan_piece;
                                        let king_magnet = self.board[(square_from ^ 0x10) as usize]
                                            == self.side + 36;
                                        step_score -= 9
                                            * (i32::from(lonely_left) + i32::from(lonely_right)
                                                - 1
                                                + i32::from(king_magnet))
                                            - (self.non_pawn_material >> 2);

                                        // Promotion turns the pawn cell
                                        // into a queen cell; short of the
                                        // last rank a passer bonus applies.
                                        let pawn_bonus = if square_to
                                            .wrapping_add(step as u8)
                                            .wrapping_add(1)
                                            & INVALID
                                            != 0
                                        {
                                            647 - i32::from(scan_kind)
                                        } else {
                                            2 * i32::from(
                                                scan_piece
                                                    & square_to.wrapping_add(0x10)
                                                    & MOVED,
                                            )
                                        };
                                        capture_value += pawn_bonus;
                                        self.board[square_to as usize] = self.board
                                            [square_to as usize]
                                            .wrapping_add(pawn_bonus as u8);
                                    }

                                    #[cfg(feature = "hashing")]
                                    self.hash_apply(
                                        square_from,
                                        square_to,
                                        capture_square,
                                        scan_piece,
                                        capture_piece,
                                        castling_rook,
                                    );

                                    step_score += score + capture_value;
                                    // Enumerate and apply classify moves
                                    // rather than order them, so their
                                    // children get the full window: a
                                    // narrowed reply search could fail
                                    // high before meeting the king capture
                                    // that proves a move illegal. The raw
                                    // bound keeps the child's beta at the
                                    // sentinel so a found king capture
                                    // still cuts its scan short.
                                    let step_alpha = if mode == Mode::Enumerate || mode == Mode::Apply
                                    {
                                        -SCORE_MAX
                                    } else if iter_score > alpha {
                                        iter_score
                                    } else {
                                        alpha
                                    };

                                    // Late move reduction for deep quiet
                                    // slider moves outside the replay.
                                    let mut step_depth = iter_depth
                                        - 1
                                        - u8::from(
                                            iter_depth > 5
                                                && scan_kind > 2
                                                && capture_piece == 0
                                                && replay_move == 0,
                                        );

                                    // Check extension.
                                    if !(self.non_pawn_material > 30
                                        || null_score != SCORE_MAX
                                        || iter_depth < 3
                                        || (capture_piece != 0 && scan_kind != KING))
                                    {
                                        step_depth = iter_depth;
                                    }

                                    // Futility: shallow quiet moves below
                                    // alpha stand on their static score;
                                    // anything that beats alpha re-searches
                                    // at full depth.
                                    // Enumerate and apply always verify
                                    // through the recursion: both must
                                    // reject moves that leave the own king
                                    // capturable.
                                    let mut step_score_new;
                                    loop {
                                        self.side ^= SIDE_MASK;
                                        step_score_new = if mode == Mode::Enumerate
                                            || mode == Mode::Apply
                                            || step_depth > 2
                                            || step_score > step_alpha
                                        {
                                            -self.search(
                                                run,
                                                -beta,
                                                -step_alpha,
                                                -step_score,
                                                castling_skip,
                                                step_depth,
                                                Mode::Internal,
                                            )
                                        } else {
                                            step_score
                                        };
                                        self.side ^= SIDE_MASK;

                                        if step_score_new > alpha {
                                            step_depth += 1;
                                            if step_depth < iter_depth {
                                                continue;
                                            }
                                        }
                                        break;
                                    }
                                    step_score = step_score_new;

                                    if mode == Mode::Apply
                                        && step_score != -SCORE_MAX
                                        && square_from == run.target_from
                                        && square_to == run.target_to
                                    {
                                        // Commit: the move stays on the
                                        // board and the game advances.
                                        self.score = -score - capture_value;
                                        self.en_passant = castling_skip;
                                        #[cfg(feature = "hashing")]
                                        self.hash.lock_draw(entry_index);
                                        self.non_pawn_material += capture_value >> 7;
                                        self.side ^= SIDE_MASK;
                                        return beta;
                                    }

                                    #[cfg(feature = "hashing")]
                                    self.hash.set_keys(saved_keys);

                                    // Undo the three touched squares.
                                    self.board[castling_rook as usize] = self.side + 6;
                                    self.board[castling_skip as usize] = 0;
                                    self.board[square_to as usize] = 0;
                                    self.board[square_from as usize] = scan_piece;
                                    self.board[capture_square as usize] = capture_piece;

                                    if mode == Mode::FindBest
                                        && step_score != -SCORE_MAX
                                        && square_from == run.target_from
                                        && square_to == run.target_to
                                    {
                                        // The committed best move has been
                                        // re-found on the final pass.
                                        return beta;
                                    }

                                    if mode == Mode::Enumerate
                                        && step_score != -SCORE_MAX
                                        && run.target_from == INVALID
                                        && iter_depth == 3
                                        && replay_move == 0
                                    {
                                        run.sink.push(Move::new(
                                            Square::from_index(square_from),
                                            Square::from_index(square_to),
                                        ));
                                    }
                                }

                                if step_score > iter_score {
                                    iter_score = step_score;
                                    iter_from = square_from;
                                    // The high bit marks a plain move; it
                                    // is clear for castling/double-step so
                                    // the replay hint skips those.
                                    iter_to = square_to | (castling_skip & INVALID);
                                }

                                if replay_move != 0 {
                                    // The stored best is done; rerun this
                                    // ray with normal stepping.
                                    replay_move = 0;
                                    continue 'ray;
                                }

                                // First step of an unmoved piece: record
                                // pawn double-step eligibility, or probe
                                // the corner rook on the king's lateral
                                // step for castling.
                                let castle_ok = scan_kind == KING && vector_index == 7 && {
                                    castling_rook = square_from.wrapping_add(3)
                                        ^ (((i32::from(step) >> 1) & 0b111) as u8);
                                    i32::from(self.board[castling_rook as usize])
                                        - i32::from(self.side)
                                        - 6
                                        == 0
                                        && self.board[(castling_rook ^ 1) as usize] == 0
                                        && self.board[(castling_rook ^ 2) as usize] == 0
                                };
                                if square_from.wrapping_add(step as u8) != square_to
                                    || scan_piece & MOVED != 0
                                    || (scan_kind > 2 && !castle_ok)
                                {
                                    // Synthetic capture ends the ray for
                                    // non-sliders.
                                    capture_piece =
                                        capture_piece.wrapping_add(u8::from(scan_kind < 5));
                                } else {
                                    castling_skip = square_to;
                                }

                                if capture_piece != 0 {
                                    break;
                                }
                            }

                            break 'ray;
                        }
                    }
                }

                // Next square, +9 stride wrapping through the 0x88 layout.
                square_from = square_from.wrapping_add(9) & !OFF_BOARD;
                if square_from == square_start {
                    break;
                }
            }

            // No move survived and the null probe kept its king: the side
            // to move is mated or stalemated, scored as a draw here and
            // disambiguated by the status probes.
            if iter_score == -SCORE_MAX && null_score != SCORE_MAX {
                iter_score = 0;
            }

            #[cfg(feature = "hashing")]
            self.hash
                .store(entry_index, alpha, beta, iter_depth, iter_score, iter_from, iter_to);

            if mode != Mode::Internal {
                if let (Some(from), Some(to)) = (
                    Square::from_raw(iter_from),
                    Square::from_raw(iter_to & !OFF_BOARD),
                ) {
                    log::trace!(
                        "depth {} score {} nodes {} best {}{}",
                        i32::from(iter_depth) - 2,
                        iter_score,
                        run.node_count,
                        from,
                        to,
                    );
                }
            }
        }

        iter_score + i32::from(iter_score < score)
    }
}
