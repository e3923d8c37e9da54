//! Per-player simulation engine
//!
//! One [`PlayerEngine`] owns a board, the piece bag, scoring, and the attack
//! queue for a single player. Gravity steps and commands mutate it in place;
//! every observable consequence goes out through the shared [`EventBus`] and
//! the refillable [`GameSnapshot`].
//!
//! A piece locks in a fixed order: write cells, apply item effects, clear
//! rows, check all-clear, generate the outgoing attack, merge incoming
//! garbage, spawn the next piece. A blocked spawn or garbage shoved past the
//! top of the field ends the game.

use std::sync::Arc;

use log::{debug, info};

use crate::core::attack::{AttackQueue, PendingAttack};
use crate::core::board::Board;
use crate::core::piece::{Piece, PieceKind};
use crate::core::rng::PieceBag;
use crate::core::scoring::Scoring;
use crate::core::shape;
use crate::core::state::{GamePhase, GameSnapshot};
use crate::events::{EventBus, GameEvent};
use crate::types::{
    epoch_ms, Command, GameConfig, PlayerId, BOARD_BORDER, BOARD_HEIGHT, BOARD_WIDTH,
    GRAVITY_DELAY_TABLE, MARKER_BOX_CLEAR, MARKER_ONE_LINE, MARKER_SCORE_DOUBLE, MARKER_WEIGHT,
    SPEED_LEVELS,
};

pub struct PlayerEngine {
    player: PlayerId,
    config: GameConfig,
    board: Board,
    bag: PieceBag,
    current: Option<Piece>,
    next: Option<PieceKind>,
    scoring: Scoring,
    attacks: AttackQueue,
    /// Attack generated by the most recent lock, awaiting pickup
    outgoing: Option<PendingAttack>,
    phase: GamePhase,
    bus: Arc<EventBus>,
    tick: u64,
    gravity_accum_ms: u32,
    flashing_rows: Vec<i16>,
    box_clear_flash: bool,
    all_clear_flash: bool,
}

impl PlayerEngine {
    pub fn new(player: PlayerId, config: GameConfig, bus: Arc<EventBus>) -> Self {
        Self {
            player,
            board: Board::new(),
            bag: PieceBag::new(config.seed),
            current: None,
            next: None,
            scoring: Scoring::new(),
            attacks: AttackQueue::new(),
            outgoing: None,
            phase: GamePhase::Ready,
            bus,
            tick: 0,
            gravity_accum_ms: 0,
            flashing_rows: Vec::new(),
            box_clear_flash: false,
            all_clear_flash: false,
            config,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.scoring.score
    }

    pub fn lines(&self) -> u32 {
        self.scoring.lines
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current speed level: start level plus earned levels, capped at the
    /// top of the gravity table.
    pub fn speed_level(&self) -> usize {
        ((self.config.start_level as u32 + self.scoring.level()) as usize).min(SPEED_LEVELS - 1)
    }

    /// Gravity delay for this player's difficulty and speed level
    pub fn gravity_delay_ms(&self) -> u32 {
        GRAVITY_DELAY_TABLE[self.config.difficulty.index()][self.speed_level()]
    }

    /// Leave Ready, draw the opening pieces, and start play.
    pub fn start(&mut self) -> GameSnapshot {
        if self.phase == GamePhase::Ready {
            info!("player {} starting (seed {})", self.player, self.bag.seed());
            self.phase = GamePhase::Playing;
            self.next = Some(self.bag.draw());
            self.spawn_next();
        }
        self.snapshot()
    }

    /// Advance by elapsed wall time. Gravity fires only when the
    /// accumulated time crosses the current gravity delay, so the caller may
    /// hand over raw frame deltas or one full interval per scheduler tick.
    /// Does nothing outside of Playing.
    pub fn step(&mut self, elapsed_ms: u32) -> GameSnapshot {
        if self.phase == GamePhase::Playing {
            self.gravity_accum_ms += elapsed_ms;
            // the delay can shorten mid-loop when a clear raises the level
            while self.phase == GamePhase::Playing
                && self.gravity_accum_ms >= self.gravity_delay_ms()
            {
                self.gravity_accum_ms -= self.gravity_delay_ms();
                self.apply_gravity();
            }
        }
        self.snapshot()
    }

    fn apply_gravity(&mut self) {
        self.flashing_rows.clear();
        self.box_clear_flash = false;
        self.all_clear_flash = false;
        self.tick += 1;
        let locked = match self.current.as_mut() {
            Some(piece) => !shape::move_down(&self.board, piece),
            None => false,
        };
        if locked {
            self.lock_current();
        }
    }

    /// Apply a player command against the current state.
    pub fn command(&mut self, cmd: Command) -> GameSnapshot {
        match cmd {
            Command::Pause => {
                match self.phase {
                    GamePhase::Playing => self.phase = GamePhase::Paused,
                    GamePhase::Paused => self.phase = GamePhase::Playing,
                    _ => {}
                }
                return self.snapshot();
            }
            Command::Reset => {
                self.reset();
                return self.snapshot();
            }
            _ => {}
        }
        if self.phase != GamePhase::Playing {
            return self.snapshot();
        }

        let mut moved = false;
        let mut lock = false;
        if let Some(piece) = self.current.as_mut() {
            match cmd {
                Command::Left => moved = shape::move_left(&self.board, piece),
                Command::Right => moved = shape::move_right(&self.board, piece),
                Command::Rotate => moved = shape::try_rotate(&self.board, piece),
                Command::SoftDrop => {
                    if shape::move_down(&self.board, piece) {
                        self.scoring.award_soft_drop(1);
                        moved = true;
                    } else {
                        lock = true;
                    }
                }
                Command::HardDrop => {
                    let dist = shape::hard_drop(&self.board, piece);
                    self.scoring.award_hard_drop(dist as u32);
                    moved = dist > 0;
                    lock = true;
                }
                Command::Pause | Command::Reset => {}
            }
        }
        if moved {
            self.bus.publish(&GameEvent::PieceMoved {
                player: self.player,
                command: cmd,
            });
        }
        if lock {
            self.lock_current();
        }
        self.snapshot()
    }

    /// Buffer garbage from a peer; it lands at this player's next lock.
    pub fn receive_attack(&mut self, attack: &PendingAttack) {
        debug!(
            "player {} queues {} attack lines from {}",
            self.player, attack.lines, attack.sender
        );
        self.attacks.push(attack);
        self.bus.publish(&GameEvent::AttackReceived {
            player: self.player,
            lines: attack.lines,
        });
    }

    /// Attack produced by the most recent lock, if any. Consuming it is the
    /// caller's job; it is not re-delivered.
    pub fn take_outgoing_attack(&mut self) -> Option<PendingAttack> {
        self.outgoing.take()
    }

    pub fn pending_attack_preview(&self) -> Vec<&PendingAttack> {
        self.attacks.preview()
    }

    fn reset(&mut self) {
        info!("player {} reset", self.player);
        self.board = Board::new();
        self.bag = PieceBag::new(self.config.seed);
        self.current = None;
        self.next = None;
        self.scoring = Scoring::new();
        self.attacks = AttackQueue::new();
        self.outgoing = None;
        self.phase = GamePhase::Ready;
        self.tick = 0;
        self.gravity_accum_ms = 0;
        self.flashing_rows.clear();
        self.box_clear_flash = false;
        self.all_clear_flash = false;
    }

    fn spawn_next(&mut self) {
        let kind = match self.next.take() {
            Some(k) => k,
            None => self.bag.draw(),
        };
        self.next = Some(self.bag.draw());
        let piece = Piece::spawn(kind, self.config.colorblind);
        if shape::collides(&self.board, &piece.grid, piece.x, piece.y, 0, 0) {
            self.current = None;
            self.game_over();
            return;
        }
        self.current = Some(piece);
        self.bus.publish(&GameEvent::PieceSpawned {
            player: self.player,
            kind,
        });
    }

    fn game_over(&mut self) {
        info!(
            "player {} game over at {} points",
            self.player, self.scoring.score
        );
        self.phase = GamePhase::GameOver;
        self.current = None;
        self.bus.publish(&GameEvent::GameOver {
            player: self.player,
        });
    }

    /// The lock pipeline. Order matters: items fire before row detection so
    /// a OneLineClear row counts toward the clear, and incoming garbage
    /// lands after attack generation so it cannot contaminate the pattern.
    fn lock_current(&mut self) {
        let piece = match self.current.take() {
            Some(p) => p,
            None => return,
        };

        for (row, col, value) in piece.grid.occupied() {
            self.board
                .set_cell_colored(piece.x + col, piece.y + row, value, piece.color);
        }
        self.bus.publish(&GameEvent::PieceLocked {
            player: self.player,
            kind: piece.kind,
        });

        if piece.kind.is_item() {
            self.bus.publish(&GameEvent::ItemActivated {
                player: self.player,
                kind: piece.kind,
            });
        }
        let forced_rows = self.apply_item_effects(&piece);

        let mut rows: Vec<i16> = self.board.full_rows().to_vec();
        for row in forced_rows {
            if !rows.contains(&row) {
                rows.push(row);
            }
        }
        rows.sort_unstable();

        if !rows.is_empty() {
            // capture the attack pattern before compaction destroys it
            let pattern = self.attack_pattern(&piece, &rows);
            self.flashing_rows = rows.clone();
            self.board.clear_rows(&rows);

            let all_clear = self.board.is_playfield_empty();
            self.all_clear_flash = all_clear;
            let level_before = self.scoring.level();
            self.scoring.award_clear(rows.len(), all_clear);
            self.bus.publish(&GameEvent::LinesCleared {
                player: self.player,
                rows: rows.clone(),
            });
            if all_clear {
                self.bus.publish(&GameEvent::AllClear {
                    player: self.player,
                });
            }
            self.bus.publish(&GameEvent::ScoreChanged {
                player: self.player,
                score: self.scoring.score,
            });
            if self.scoring.level() > level_before {
                self.bus.publish(&GameEvent::LevelUp {
                    player: self.player,
                    level: self.scoring.level(),
                });
            }

            if rows.len() >= 2 {
                let attack = PendingAttack {
                    lines: (rows.len() - 1) as u8,
                    pattern,
                    offset: piece.x,
                    sender: self.player,
                    timestamp: epoch_ms(),
                };
                self.bus.publish(&GameEvent::AttackSent {
                    attack: attack.clone(),
                });
                self.outgoing = Some(attack);
            }
        }

        self.merge_incoming_attacks();
        if self.phase == GamePhase::Playing {
            self.spawn_next();
        }
    }

    /// Resolve marker cells left on the board by an item piece. Returns rows
    /// that must clear even if not complete.
    fn apply_item_effects(&mut self, piece: &Piece) -> Vec<i16> {
        let mut forced = Vec::new();
        match piece.kind {
            PieceKind::ScoreDouble => {
                self.scoring.double_next_clear = true;
                self.replace_markers(piece, MARKER_SCORE_DOUBLE);
            }
            PieceKind::OneLineClear => {
                for (row, col, value) in piece.grid.occupied() {
                    if value == MARKER_ONE_LINE {
                        forced.push(piece.y + row);
                        self.board
                            .set_cell(piece.x + col, piece.y + row, piece.kind.cell_value());
                    }
                }
            }
            PieceKind::BoxClear => {
                for (row, col, value) in piece.grid.occupied() {
                    if value == MARKER_BOX_CLEAR {
                        let cleared = self.board.clear_box(piece.x + col, piece.y + row);
                        self.box_clear_flash = true;
                        debug!("player {} box clear took {} cells", self.player, cleared);
                    }
                }
            }
            PieceKind::Weight => self.crush_with_weight(piece),
            _ => {}
        }
        forced
    }

    fn replace_markers(&mut self, piece: &Piece, marker: u8) {
        for (row, col, value) in piece.grid.occupied() {
            if value == marker {
                self.board
                    .set_cell(piece.x + col, piece.y + row, piece.kind.cell_value());
            }
        }
    }

    /// The Weight destroys everything beneath its columns and settles on the
    /// floor as immovable slab cells.
    fn crush_with_weight(&mut self, piece: &Piece) {
        let bottom = piece.y + piece.grid.rows() - 1;
        let mut crushed = 0;
        for col in 0..piece.grid.cols() {
            if (0..piece.grid.rows()).any(|r| piece.grid.cell(r, col) != 0) {
                crushed += self
                    .board
                    .clear_column_range(piece.x + col, bottom + 1, BOARD_HEIGHT - 1);
            }
        }
        debug!("player {} weight crushed {} cells", self.player, crushed);

        // relocate the slab to the floor
        for (row, col, _) in piece.grid.occupied() {
            self.board.clear_cell(piece.x + col, piece.y + row);
        }
        let floor_y = BOARD_HEIGHT - piece.grid.rows();
        for (row, col, _) in piece.grid.occupied() {
            self.board
                .set_cell_colored(piece.x + col, floor_y + row, MARKER_WEIGHT, piece.color);
        }
    }

    /// Pattern rows for an outgoing attack: the topmost `n - 1` cleared rows
    /// as they stood before compaction, with the locking piece's own cells
    /// turned into holes.
    fn attack_pattern(&self, piece: &Piece, rows: &[i16]) -> Vec<Vec<u8>> {
        let piece_cells: Vec<(i16, i16)> = piece
            .grid
            .occupied()
            .map(|(row, col, _)| (piece.x + col, piece.y + row))
            .collect();

        let take = rows.len().saturating_sub(1);
        rows.iter()
            .take(take)
            .map(|&y| {
                (0..BOARD_WIDTH)
                    .map(|x| {
                        if piece_cells.contains(&(x, y)) {
                            0
                        } else {
                            u8::from(self.board.cell(x, y) != 0)
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn merge_incoming_attacks(&mut self) {
        if self.attacks.is_empty() {
            return;
        }
        for attack in self.attacks.drain() {
            debug!(
                "player {} absorbs {} lines from {}",
                self.player, attack.lines, attack.sender
            );
            self.board.insert_attack_rows(
                &attack.pattern,
                attack.offset,
                crate::types::Rgb(96, 96, 96),
            );
        }
        // garbage shoved past the top of the field tops the player out
        let overflow = (-BOARD_BORDER..0)
            .any(|y| (0..BOARD_WIDTH).any(|x| self.board.cell(x, y) != 0));
        if overflow {
            self.game_over();
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut builder = GameSnapshot::builder(self.player)
            .phase(self.phase)
            .score(self.scoring.score)
            .lines(self.scoring.lines)
            .level(self.scoring.level())
            .next(self.next)
            .pending_attack_lines(self.attacks.total_lines())
            .flashing_rows(&self.flashing_rows)
            .flashes(self.box_clear_flash, self.all_clear_flash, self.flash_phase())
            .tick(self.tick)
            .board(&self.board);
        if let Some(piece) = &self.current {
            builder = builder.active_piece(piece);
        }
        builder.build()
    }

    /// Refill `out` from current state without reallocating its planes.
    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.player = self.player;
        out.phase = self.phase;
        out.score = self.scoring.score;
        out.lines = self.scoring.lines;
        out.level = self.scoring.level();
        out.next = self.next;
        out.pending_attack_lines = self.attacks.total_lines();
        out.flashing_rows.clear();
        out.flashing_rows.extend_from_slice(&self.flashing_rows);
        out.box_clear_flash = self.box_clear_flash;
        out.all_clear_flash = self.all_clear_flash;
        out.flash_phase = self.flash_phase();
        out.tick = self.tick;

        out.fill_board(&self.board);
        if let Some(piece) = &self.current {
            out.compose_piece(piece);
        }
    }

    fn flash_phase(&self) -> bool {
        (self.tick % 2 == 0)
            && (!self.flashing_rows.is_empty() || self.box_clear_flash || self.all_clear_flash)
    }
}
