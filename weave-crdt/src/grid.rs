//! Crossword grid CRDT: `(row, col) -> Cell`, last-writer-wins per cell
//! on Lamport timestamp order, plus a local-only word table.

use crate::error::CrdtError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use weave_types::{LamportClock, LamportTimestamp, ReplicaId};

/// One cell of the grid. `is_black = true` implies `letter = None` and
/// `number = None` (spec invariant); nothing else enforces that implication
/// besides the constructors in this module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub letter: Option<char>,
    pub is_black: bool,
    pub number: Option<u32>,
    pub author: Option<String>,
}

/// Horizontal or vertical word placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// A placed word. Purely local bookkeeping — `number` is never part of
/// the convergent cell state and is not required to agree across replicas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub number: u32,
    pub clue: String,
    pub answer: String,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub author: String,
}

/// A single applied (or attempted) write to one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridOp {
    pub row: usize,
    pub col: usize,
    pub cell: Cell,
    pub timestamp: LamportTimestamp,
    pub author: String,
}

/// Read-only snapshot of the whole grid, suitable for handing to an editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Vec<Cell>>,
    pub words: Vec<Word>,
}

/// One populated cell in a full-state sync payload. A flat list rather
/// than a `(row,col) -> ...` map, since a tuple key has no natural
/// text-encoded wire representation; the object-keyed shape in spec §4.4
/// is an equivalent encoding of the same entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCellEntry {
    pub row: usize,
    pub col: usize,
    pub cell: Cell,
    pub timestamp: LamportTimestamp,
}

/// Full-state digest for grid sync: every populated cell plus the
/// Lamport timestamp of its last-accepted write, so a receiving replica
/// can apply the same per-cell LWW rule as the delta path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridStateDigest {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<GridCellEntry>,
}

pub struct GridCrdt {
    rows: usize,
    cols: usize,
    clock: LamportClock,
    cells: HashMap<(usize, usize), (Cell, LamportTimestamp)>,
    op_log: Vec<GridOp>,
    seen: HashSet<(ReplicaId, u64)>,
    words: HashMap<u32, Word>,
    next_word_number: u32,
}

impl GridCrdt {
    #[must_use]
    pub fn new(rows: usize, cols: usize, replica_id: ReplicaId) -> Self {
        Self {
            rows,
            cols,
            clock: LamportClock::new(replica_id),
            cells: HashMap::new(),
            op_log: Vec::new(),
            seen: HashSet::new(),
            words: HashMap::new(),
            next_word_number: 1,
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), CrdtError> {
        if self.in_bounds(row, col) {
            Ok(())
        } else {
            Err(CrdtError::InvalidArgument(format!(
                "({row},{col}) is outside the {}x{} grid",
                self.rows, self.cols
            )))
        }
    }

    /// Current cell at a position, if anything has been written there.
    #[must_use]
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col)).map(|(cell, _)| cell)
    }

    fn cell_or_default(&self, row: usize, col: usize) -> Cell {
        self.get_cell(row, col).cloned().unwrap_or_default()
    }

    /// Writes (or clears, if `letter` is `None`) the letter at `(row, col)`.
    /// Refuses black cells and out-of-bounds coordinates before minting a
    /// timestamp — no op is generated on failure.
    pub fn set_letter(
        &mut self,
        row: usize,
        col: usize,
        letter: Option<char>,
        author: &str,
    ) -> Result<GridOp, CrdtError> {
        self.check_bounds(row, col)?;
        let current = self.cell_or_default(row, col);
        if current.is_black {
            return Err(CrdtError::PreconditionFailed(format!(
                "cell ({row},{col}) is black"
            )));
        }
        let cell = Cell {
            letter: letter.map(|c| c.to_ascii_uppercase()),
            is_black: false,
            number: current.number,
            author: Some(author.to_string()),
        };
        Ok(self.apply_local(row, col, cell, author))
    }

    /// Marks a cell black, clearing its letter and number.
    pub fn set_black(&mut self, row: usize, col: usize, author: &str) -> Result<GridOp, CrdtError> {
        self.check_bounds(row, col)?;
        let cell = Cell {
            letter: None,
            is_black: true,
            number: None,
            author: Some(author.to_string()),
        };
        Ok(self.apply_local(row, col, cell, author))
    }

    /// Places a word: pre-flight bounds/black-cell check, then one
    /// `set_letter` per character plus a start-cell number stamp. The
    /// returned number is a local-only UI identifier — never compared
    /// across replicas.
    pub fn add_word(
        &mut self,
        clue: &str,
        answer: &str,
        row: usize,
        col: usize,
        direction: Direction,
        author: &str,
    ) -> Result<u32, CrdtError> {
        let answer: String = answer
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if answer.is_empty() {
            return Err(CrdtError::InvalidArgument("answer must not be empty".into()));
        }
        self.check_word_fits(&answer, row, col, direction)?;

        let number = self.next_word_number;
        self.next_word_number += 1;

        let word = Word {
            number,
            clue: clue.to_string(),
            answer: answer.clone(),
            row,
            col,
            direction,
            author: author.to_string(),
        };
        self.words.insert(number, word);

        let existing_start = self.cell_or_default(row, col);
        let start_cell = Cell {
            number: Some(number),
            ..existing_start
        };
        self.apply_local(row, col, start_cell, author);

        for (i, letter) in answer.chars().enumerate() {
            let (r, c) = match direction {
                Direction::Horizontal => (row, col + i),
                Direction::Vertical => (row + i, col),
            };
            self.set_letter(r, c, Some(letter), author)?;
        }

        Ok(number)
    }

    fn check_word_fits(
        &self,
        answer: &str,
        row: usize,
        col: usize,
        direction: Direction,
    ) -> Result<(), CrdtError> {
        let len = answer.chars().count();
        match direction {
            Direction::Horizontal => {
                if col + len > self.cols {
                    return Err(CrdtError::PreconditionFailed(
                        "word does not fit within the grid's columns".into(),
                    ));
                }
                for i in 0..len {
                    if self.cell_or_default(row, col + i).is_black {
                        return Err(CrdtError::PreconditionFailed(
                            "word placement crosses a black cell".into(),
                        ));
                    }
                }
            }
            Direction::Vertical => {
                if row + len > self.rows {
                    return Err(CrdtError::PreconditionFailed(
                        "word does not fit within the grid's rows".into(),
                    ));
                }
                for i in 0..len {
                    if self.cell_or_default(row + i, col).is_black {
                        return Err(CrdtError::PreconditionFailed(
                            "word placement crosses a black cell".into(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Full-word table, local-only (never synced).
    #[must_use]
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.words.values()
    }

    fn apply_local(&mut self, row: usize, col: usize, cell: Cell, author: &str) -> GridOp {
        let timestamp = self.clock.tick();
        let op = GridOp {
            row,
            col,
            cell,
            timestamp,
            author: author.to_string(),
        };
        self.apply(op.clone());
        op
    }

    /// Applies a remote op using the single merge rule from spec §4.2:
    /// unconditional accept on an unseen key, otherwise accept iff the
    /// incoming timestamp strictly exceeds the stored one. Returns whether
    /// the op was accepted (mutated state); `false` also covers duplicate
    /// delivery of an op already present in the log and an op whose
    /// coordinates fall outside this grid's dimensions (spec §4.4: skip
    /// ops that dereference impossible coordinates, apply the rest).
    /// Out-of-bounds ops are dropped before touching the dedup set or the
    /// op log — they never happened as far as this replica is concerned.
    pub fn apply_remote_op(&mut self, op: GridOp) -> bool {
        if !self.in_bounds(op.row, op.col) {
            return false;
        }
        self.clock.observe(op.timestamp);
        self.apply(op)
    }

    fn apply(&mut self, op: GridOp) -> bool {
        if !self.seen.insert((op.timestamp.replica_id(), op.timestamp.counter())) {
            return false;
        }
        let key = (op.row, op.col);
        let accept = match self.cells.get(&key) {
            None => true,
            Some((_, last)) => op.timestamp > *last,
        };
        if accept {
            self.cells.insert(key, (op.cell.clone(), op.timestamp));
        }
        self.op_log.push(op);
        accept
    }

    /// The highest Lamport timestamp across every op this replica has
    /// ever applied (accepted or rejected by LWW) — a convenient
    /// high-water mark for a peer session's next `since` bookmark.
    #[must_use]
    pub fn latest_timestamp(&self) -> Option<LamportTimestamp> {
        self.op_log.iter().map(|op| op.timestamp).max()
    }

    /// All log entries with a timestamp strictly greater than `since`, or
    /// the entire log if `since` is `None`.
    #[must_use]
    pub fn ops_since(&self, since: Option<LamportTimestamp>) -> Vec<GridOp> {
        match since {
            None => self.op_log.clone(),
            Some(t0) => self
                .op_log
                .iter()
                .filter(|op| op.timestamp > t0)
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn get_snapshot(&self) -> GridSnapshot {
        let cells = (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.cell_or_default(r, c)).collect())
            .collect();
        GridSnapshot {
            rows: self.rows,
            cols: self.cols,
            cells,
            words: self.words.values().cloned().collect(),
        }
    }

    /// Builds the full-state digest this replica would send for a state
    /// sync. Only populated cells are included; the word table is local
    /// bookkeeping and never part of the synced state (spec §3).
    #[must_use]
    pub fn state_digest(&self) -> GridStateDigest {
        let cells = self
            .cells
            .iter()
            .map(|(&(row, col), (cell, timestamp))| GridCellEntry {
                row,
                col,
                cell: cell.clone(),
                timestamp: *timestamp,
            })
            .collect();
        GridStateDigest {
            rows: self.rows,
            cols: self.cols,
            cells,
        }
    }

    /// Merges a remote full-state digest, applying the same per-cell LWW
    /// rule as [`Self::apply_remote_op`] (unlike chat's weaker wall-clock
    /// path, every grid cell already carries a real Lamport timestamp, so
    /// no placeholder is needed). Entries outside this grid's dimensions
    /// are skipped rather than rejecting the whole payload (spec §4.4).
    /// Does not touch the op log or `seen` set — this is a state merge,
    /// not an ops replay, and must stay idempotent under repeated calls.
    pub fn merge_state(&mut self, remote: &GridStateDigest) -> bool {
        let mut changed = false;
        for entry in &remote.cells {
            if !self.in_bounds(entry.row, entry.col) {
                continue;
            }
            let key = (entry.row, entry.col);
            let accept = match self.cells.get(&key) {
                None => true,
                Some((_, last)) => entry.timestamp > *last,
            };
            if accept {
                self.cells.insert(key, (entry.cell.clone(), entry.timestamp));
                changed = true;
            }
        }
        changed
    }
}
