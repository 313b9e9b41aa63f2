//! Connect-Four board with incremental chain tracking.
//!
//! Discs live in an arena. Every disc links to its same-colour neighbours in
//! the eight compass directions and records, per undirected axis, the length
//! of the contiguous run passing through it. Dropping a disc joins the runs
//! on either side and rewrites the joined run only, so a move costs
//! O(run length) rather than a board scan.

use strum::{Display, EnumIter, IntoEnumIterator};

pub const COLUMNS: usize = 7;
pub const ROWS: usize = 6;

/// Run length that wins.
pub const CONNECT: u8 = 4;

/// `(dx, dy)` per direction, `y` growing upwards. Direction `i` and
/// `(i + 4) % 8` are opposite; both lie on axis `i % 4`.
const DIRECTIONS: [(i32, i32); 8] = [(1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1), (0, 1), (1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Axis {
    Horizontal,
    FallingDiagonal,
    Vertical,
    RisingDiagonal,
}

impl Axis {
    fn index(self) -> usize {
        self as usize
    }

    /// The two opposite directions spanning this axis.
    fn directions(self) -> (usize, usize) {
        (self.index(), self.index() + 4)
    }
}

/// Seat owning a disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disc {
    First,
    Second,
}

impl Disc {
    pub fn seat(self) -> usize {
        match self {
            Disc::First => 0,
            Disc::Second => 1,
        }
    }

    pub fn from_seat(seat: usize) -> Self {
        if seat == 0 {
            Disc::First
        } else {
            Disc::Second
        }
    }

    pub fn other(self) -> Self {
        match self {
            Disc::First => Disc::Second,
            Disc::Second => Disc::First,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub disc: Disc,
    pub col: usize,
    pub row: usize,
    neighbours: [Option<usize>; 8],
    chain_lens: [u8; 4],
    pub winning: bool,
}

impl Node {
    pub fn chain_len(&self, axis: Axis) -> u8 {
        self.chain_lens[axis.index()]
    }

    pub fn chain_lens(&self) -> [u8; 4] {
        self.chain_lens
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Win {
    pub axis: Axis,
    /// `(col, row)` of every disc in the winning run.
    pub cells: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOutcome {
    pub row: usize,
    pub win: Option<Win>,
    pub full: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    nodes: Vec<Node>,
    grid: [[Option<usize>; ROWS]; COLUMNS],
    heights: [usize; COLUMNS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Node> {
        let index = (*self.grid.get(col)?.get(row)?)?;
        self.nodes.get(index)
    }

    fn index_at(&self, col: i32, row: i32) -> Option<usize> {
        let col = usize::try_from(col).ok()?;
        let row = usize::try_from(row).ok()?;
        *self.grid.get(col)?.get(row)?
    }

    pub fn height(&self, col: usize) -> usize {
        self.heights.get(col).copied().unwrap_or(ROWS)
    }

    pub fn is_column_full(&self, col: usize) -> bool {
        self.height(col) >= ROWS
    }

    pub fn is_full(&self) -> bool {
        (0..COLUMNS).all(|col| self.is_column_full(col))
    }

    pub fn discs(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Drops `disc` into `col`. `None` when the column is full or out of range.
    pub fn drop_disc(&mut self, col: usize, disc: Disc) -> Option<DropOutcome> {
        if col >= COLUMNS || self.is_column_full(col) {
            return None;
        }

        let row = self.heights[col];
        let index = self.nodes.len();
        self.nodes.push(Node {
            disc,
            col,
            row,
            neighbours: [None; 8],
            chain_lens: [1; 4],
            winning: false,
        });
        self.grid[col][row] = Some(index);
        self.heights[col] += 1;

        self.link(index);

        let mut win = None;
        for axis in Axis::iter() {
            let len = self.join(index, axis);
            if win.is_none() && len >= CONNECT {
                win = Some(self.mark_winning(index, axis));
            }
        }

        Some(DropOutcome {
            row,
            win,
            full: self.is_full(),
        })
    }

    fn link(&mut self, index: usize) {
        let (col, row, disc) = {
            let node = &self.nodes[index];
            (node.col as i32, node.row as i32, node.disc)
        };

        for (dir, (dx, dy)) in DIRECTIONS.iter().enumerate() {
            let Some(other) = self.index_at(col + dx, row + dy) else {
                continue;
            };
            if self.nodes[other].disc != disc {
                continue;
            }
            self.nodes[index].neighbours[dir] = Some(other);
            self.nodes[other].neighbours[(dir + 4) % 8] = Some(index);
        }
    }

    /// Merges the runs on both sides of `index` along `axis` and writes the
    /// joined length to every disc in it.
    fn join(&mut self, index: usize, axis: Axis) -> u8 {
        let (forward, backward) = axis.directions();
        let side = |dir: usize| {
            self.nodes[index].neighbours[dir]
                .map(|n| self.nodes[n].chain_lens[axis.index()])
                .unwrap_or(0)
        };
        let len = side(forward) + side(backward) + 1;

        for dir in [forward, backward] {
            let mut cursor = self.nodes[index].neighbours[dir];
            while let Some(n) = cursor {
                self.nodes[n].chain_lens[axis.index()] = len;
                cursor = self.nodes[n].neighbours[dir];
            }
        }
        self.nodes[index].chain_lens[axis.index()] = len;
        len
    }

    fn run(&self, index: usize, axis: Axis) -> Vec<usize> {
        let (forward, backward) = axis.directions();
        let mut run = vec![index];
        for dir in [forward, backward] {
            let mut cursor = self.nodes[index].neighbours[dir];
            while let Some(n) = cursor {
                run.push(n);
                cursor = self.nodes[n].neighbours[dir];
            }
        }
        run
    }

    fn mark_winning(&mut self, index: usize, axis: Axis) -> Win {
        let run = self.run(index, axis);
        let mut cells = Vec::with_capacity(run.len());
        for n in run {
            let node = &mut self.nodes[n];
            node.winning = true;
            cells.push((node.col, node.row));
        }
        cells.sort_unstable();
        Win { axis, cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Run lengths by scanning the grid, ignoring the links entirely.
    fn scanned_lens(board: &Board, col: usize, row: usize) -> [u8; 4] {
        let disc = board.cell(col, row).unwrap().disc;
        let mut lens = [0u8; 4];
        for axis in Axis::iter() {
            let (forward, backward) = axis.directions();
            let mut len = 1;
            for dir in [forward, backward] {
                let (dx, dy) = DIRECTIONS[dir];
                let (mut c, mut r) = (col as i32 + dx, row as i32 + dy);
                while board
                    .index_at(c, r)
                    .is_some_and(|i| board.nodes[i].disc == disc)
                {
                    len += 1;
                    c += dx;
                    r += dy;
                }
            }
            lens[axis.index()] = len;
        }
        lens
    }

    fn play(board: &mut Board, moves: &[(usize, Disc)]) -> Option<DropOutcome> {
        let mut last = None;
        for &(col, disc) in moves {
            last = board.drop_disc(col, disc);
        }
        last
    }

    #[test]
    fn test_horizontal_win() {
        use Disc::*;
        let mut board = Board::new();
        let outcome = play(
            &mut board,
            &[(0, First), (0, Second), (1, First), (1, Second), (2, First), (2, Second), (3, First)],
        )
        .unwrap();
        let win = outcome.win.unwrap();
        assert_eq!(win.axis, Axis::Horizontal);
        assert_eq!(win.cells, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert!(board.cell(2, 0).unwrap().winning);
        assert!(!board.cell(2, 1).unwrap().winning);
    }

    #[test]
    fn test_vertical_win() {
        use Disc::*;
        let mut board = Board::new();
        let outcome = play(
            &mut board,
            &[(4, First), (5, Second), (4, First), (5, Second), (4, First), (6, Second), (4, First)],
        )
        .unwrap();
        assert_eq!(outcome.win.unwrap().axis, Axis::Vertical);
    }

    #[test]
    fn test_rising_diagonal_win() {
        use Disc::*;
        let mut board = Board::new();
        let outcome = play(
            &mut board,
            &[
                (0, First),
                (1, Second),
                (1, First),
                (2, Second),
                (2, Second),
                (2, First),
                (3, Second),
                (3, Second),
                (3, Second),
                (3, First),
            ],
        )
        .unwrap();
        let win = outcome.win.unwrap();
        assert_eq!(win.axis, Axis::RisingDiagonal);
        assert_eq!(win.cells, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_falling_diagonal_win_joins_both_sides() {
        use Disc::*;
        let mut board = Board::new();
        // stack columns so First sits at (0,3) (1,2) (3,0), then fill (2,1)
        play(
            &mut board,
            &[
                (0, Second),
                (0, Second),
                (0, First),
                (0, First),
                (1, Second),
                (1, First),
                (1, First),
                (3, First),
                (2, Second),
            ],
        );
        let outcome = board.drop_disc(2, First).unwrap();
        let win = outcome.win.unwrap();
        assert_eq!(win.axis, Axis::FallingDiagonal);
        assert_eq!(win.cells, vec![(0, 3), (1, 2), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_blocked_three_is_no_win() {
        use Disc::*;
        let mut board = Board::new();
        let outcome = play(
            &mut board,
            &[(0, First), (6, Second), (1, First), (6, Second), (2, First), (3, Second)],
        )
        .unwrap();
        assert!(outcome.win.is_none());
        assert_eq!(board.cell(0, 0).unwrap().chain_len(Axis::Horizontal), 3);
        assert_eq!(board.cell(3, 0).unwrap().chain_len(Axis::Horizontal), 1);
    }

    #[test]
    fn test_full_column_rejects_drop() {
        let mut board = Board::new();
        for i in 0..ROWS {
            assert_eq!(board.drop_disc(3, Disc::from_seat(i % 2)).unwrap().row, i);
        }
        assert!(board.is_column_full(3));
        assert!(board.drop_disc(3, Disc::First).is_none());
        assert!(board.drop_disc(COLUMNS, Disc::First).is_none());
        assert_eq!(board.discs(), ROWS);
    }

    #[test]
    fn test_chain_lens_match_full_scan_after_every_move() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut board = Board::new();
            let mut disc = Disc::First;
            while !board.is_full() {
                let col = rng.gen_range(0..COLUMNS);
                if board.drop_disc(col, disc).is_none() {
                    continue;
                }
                for node in board.nodes() {
                    assert_eq!(node.chain_lens(), scanned_lens(&board, node.col, node.row));
                }
                disc = disc.other();
            }
        }
    }

    #[test]
    fn test_draw_reports_full_board() {
        // colours alternate per row and flip every two columns, so no run reaches four
        let mut board = Board::new();
        let mut last = None;
        for col in 0..COLUMNS {
            for row in 0..ROWS {
                last = board.drop_disc(col, Disc::from_seat((row + col / 2) % 2));
                assert!(last.as_ref().unwrap().win.is_none(), "unexpected win at {col},{row}");
            }
        }
        assert!(last.unwrap().full);
    }
}
