use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Error for direction words an input collaborator failed to recognize.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized direction: {0:?} (expected left/right/up/down)")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// Outcome of applying one directional move to a board.
///
/// `score` is the sum of the tile values created by merges during the move;
/// `changed` is exact board inequality. A move with `changed == false` must
/// not be followed by a spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub board: Board,
    pub score: u32,
    pub changed: bool,
}

type BoardRaw = u64;
type Line = u16;

/// Packed 4x4 2048 board: 16 4-bit exponents in a `u64`, row-major, with
/// cell (0,0) in the most significant nibble. Exponent 0 is an empty cell,
/// exponent `e >= 1` is tile value `2^e`.
///
/// The engine is stateless: every operation takes a board and returns a new
/// one, so the caller (a session object or UI layer) owns all game state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board(raw)
    }

    /// The raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(self) -> BoardRaw {
        self.0
    }

    /// Start a new game: two tiles spawned onto an empty board.
    ///
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use twenty48::engine::Board;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let b = Board::new_game(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn new_game<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Board::EMPTY.spawn_tile(rng).spawn_tile(rng)
    }

    /// Place a 2 (90%) or 4 (10%) into an empty cell chosen uniformly at
    /// random. A full board is returned unchanged.
    pub fn spawn_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let slot = rng.gen_range(0..empty) as usize;
        let exp: u64 = if rng.gen_range(0..10) < 9 { 1 } else { 2 };
        match (0..16).filter(|&idx| self.exponent(idx) == 0).nth(slot) {
            Some(idx) => Board(self.0 | (exp << (60 - 4 * idx))),
            None => self,
        }
    }

    /// Slide and merge tiles in `direction`: compress, one non-overlapping
    /// merge pass from the leading edge, compress again. Never spawns a
    /// tile; spawn timing belongs to the caller.
    ///
    /// ```
    /// use twenty48::engine::{Board, Direction};
    ///
    /// let b = Board::from_grid([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// let r = b.apply_move(Direction::Left);
    /// assert_eq!(r.board, Board::from_grid([[4, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
    /// assert_eq!(r.score, 4);
    /// assert!(r.changed);
    /// ```
    pub fn apply_move(self, direction: Direction) -> MoveResult {
        let t = tables();
        let (board, score) = match direction {
            Direction::Left => slide_rows(self, &t.left, &t.gain),
            Direction::Right => slide_rows(self, &t.right, &t.gain),
            Direction::Up => {
                let (b, s) = slide_rows(Board(transpose(self.0)), &t.left, &t.gain);
                (Board(transpose(b.0)), s)
            }
            Direction::Down => {
                let (b, s) = slide_rows(Board(transpose(self.0)), &t.right, &t.gain);
                (Board(transpose(b.0)), s)
            }
        };
        MoveResult {
            board,
            score,
            changed: board != self,
        }
    }

    /// Terminal-state predicate: true iff an empty cell exists or some
    /// horizontally/vertically adjacent pair holds equal tiles. False means
    /// no direction can change the board.
    pub fn has_moves(self) -> bool {
        if self.count_empty() > 0 {
            return true;
        }
        for row in 0..4 {
            for col in 0..3 {
                if self.exponent(row * 4 + col) == self.exponent(row * 4 + col + 1) {
                    return true;
                }
            }
        }
        for col in 0..4 {
            for row in 0..3 {
                if self.exponent(row * 4 + col) == self.exponent((row + 1) * 4 + col) {
                    return true;
                }
            }
        }
        false
    }

    /// The value at `(row, col)`, 0 for an empty cell.
    #[inline]
    pub fn tile(self, row: usize, col: usize) -> u32 {
        match self.exponent(row * 4 + col) {
            0 => 0,
            e => 1 << e,
        }
    }

    /// Count the empty cells.
    // Nibble-wise zero count, https://stackoverflow.com/questions/38225571
    #[inline]
    pub fn count_empty(self) -> u32 {
        let mut x = self.0;
        x |= x >> 1;
        x |= x >> 2;
        x &= 0x1111_1111_1111_1111;
        16 - x.count_ones()
    }

    /// The highest tile value on the board, 0 if the board is empty.
    pub fn highest_tile(self) -> u32 {
        match (0..16).map(|idx| self.exponent(idx)).max().unwrap_or(0) {
            0 => 0,
            e => 1 << e,
        }
    }

    /// Build a board from a grid of tile values. Cells must be 0 or a power
    /// of two; anything else is a caller contract violation.
    pub fn from_grid(grid: [[u32; 4]; 4]) -> Self {
        let mut raw = 0u64;
        for (row, cells) in grid.iter().enumerate() {
            for (col, &val) in cells.iter().enumerate() {
                debug_assert!(val == 0 || val.is_power_of_two());
                let exp = if val == 0 { 0 } else { val.trailing_zeros() as u64 };
                raw |= exp << (60 - 4 * (row * 4 + col));
            }
        }
        Board(raw)
    }

    /// The board as a row-major grid of tile values, for renderers and
    /// session stores.
    pub fn to_grid(self) -> [[u32; 4]; 4] {
        let mut grid = [[0u32; 4]; 4];
        for (row, cells) in grid.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = self.tile(row, col);
            }
        }
        grid
    }

    #[inline]
    fn exponent(self, idx: usize) -> u8 {
        ((self.0 >> (60 - 4 * idx)) & 0xf) as u8
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            for col in 0..4 {
                match self.tile(row, col) {
                    0 => write!(f, "{:>7}", ".")?,
                    v => write!(f, "{:>7}", v)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board {
    fn from(v: BoardRaw) -> Self {
        Board::from_raw(v)
    }
}

impl From<Board> for BoardRaw {
    fn from(b: Board) -> Self {
        b.raw()
    }
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

struct Tables {
    left: Box<[Line]>,
    right: Box<[Line]>,
    // Merge gain is the same sliding left or right: reversing a line
    // reverses which member of an equal run pairs first, not the pairs.
    gain: Box<[u32]>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

#[inline]
fn tables() -> &'static Tables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> Tables {
    // Heap-allocated to avoid large stack frames
    let mut left = vec![0u16; LINE_TABLE_SIZE];
    let mut right = vec![0u16; LINE_TABLE_SIZE];
    let mut gain = vec![0u32; LINE_TABLE_SIZE];

    for line in 0..LINE_TABLE_SIZE {
        let (slid, gained) = slide_line_left(unpack_line(line as Line));
        left[line] = pack_line(slid);
        let (rev_slid, _) = slide_line_left(unpack_line(reverse_line(line as Line)));
        right[line] = reverse_line(pack_line(rev_slid));
        gain[line] = gained;
    }

    Tables {
        left: left.into_boxed_slice(),
        right: right.into_boxed_slice(),
        gain: gain.into_boxed_slice(),
    }
}

/// Slide a single line of exponents toward index 0: compress, merge each
/// adjacent equal pair at most once scanning from the leading edge, compress
/// again. Returns the new line and the summed value of merge-created tiles.
fn slide_line_left(cells: [u8; 4]) -> ([u8; 4], u32) {
    let mut compressed = [0u8; 4];
    let mut n = 0;
    for v in cells {
        if v != 0 {
            compressed[n] = v;
            n += 1;
        }
    }

    let mut gained = 0u32;
    let mut i = 0;
    while i + 1 < n {
        // Exponent 15 saturates the nibble; leave such pairs unmerged.
        if compressed[i] == compressed[i + 1] && compressed[i] < 15 {
            compressed[i] += 1;
            compressed[i + 1] = 0;
            gained += 1 << compressed[i];
            i += 2;
        } else {
            i += 1;
        }
    }

    let mut out = [0u8; 4];
    let mut m = 0;
    for v in compressed {
        if v != 0 {
            out[m] = v;
            m += 1;
        }
    }
    (out, gained)
}

#[inline]
fn unpack_line(line: Line) -> [u8; 4] {
    [
        ((line >> 12) & 0xf) as u8,
        ((line >> 8) & 0xf) as u8,
        ((line >> 4) & 0xf) as u8,
        (line & 0xf) as u8,
    ]
}

#[inline]
fn pack_line(cells: [u8; 4]) -> Line {
    (cells[0] as Line) << 12 | (cells[1] as Line) << 8 | (cells[2] as Line) << 4 | cells[3] as Line
}

#[inline]
fn reverse_line(line: Line) -> Line {
    (line >> 12) | ((line >> 4) & 0x00f0) | ((line << 4) & 0x0f00) | (line << 12)
}

fn slide_rows(board: Board, table: &[Line], gain: &[u32]) -> (Board, u32) {
    let mut raw = 0u64;
    let mut score = 0u32;
    for row in 0..4 {
        let line = ((board.0 >> (48 - 16 * row)) & 0xffff) as usize;
        raw |= (table[line] as u64) << (48 - 16 * row);
        score += gain[line];
    }
    (Board(raw), score)
}

// Credit to Nneonneo
fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}
