//! Arena geometry: cells, edges and flanks.
//!
//! The playable arena is a diamond inscribed in a square of side
//! [`ArenaGeometry::size`]. The lower half (`y < half`) belongs to us, the
//! upper half to the opponent. Mobile units are deployed on one of our two
//! bottom edges and walk toward the diagonally opposite top edge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer grid coordinate.
///
/// Serialized as an `(x, y)` tuple so layout files stay compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row, 0 at our back line.
    pub y: i32,
}

impl Cell {
    /// Create a new cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another cell.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Orthogonal neighbours in engine order: up, down, right, left.
    ///
    /// Bounds are not checked.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x, self.y + 1),
            Self::new(self.x, self.y - 1),
            Self::new(self.x + 1, self.y),
            Self::new(self.x - 1, self.y),
        ]
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Cell> for (i32, i32) {
    fn from(cell: Cell) -> Self {
        (cell.x, cell.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four diagonal edges of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Opponent's right edge (our scouts from the bottom-left end here).
    TopRight,
    /// Opponent's left edge.
    TopLeft,
    /// Our left deployment edge.
    BottomLeft,
    /// Our right deployment edge.
    BottomRight,
}

impl Edge {
    /// All edges, in engine order.
    pub const ALL: [Self; 4] = [
        Self::TopRight,
        Self::TopLeft,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Unit step toward this edge as `(dx, dy)`.
    #[must_use]
    pub const fn direction(self) -> (i32, i32) {
        match self {
            Self::TopRight => (1, 1),
            Self::TopLeft => (-1, 1),
            Self::BottomLeft => (-1, -1),
            Self::BottomRight => (1, -1),
        }
    }

    /// True for the two edges we deploy from.
    #[must_use]
    pub const fn is_friendly(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight)
    }
}

/// Left or right half of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flank {
    /// Columns `x < half`.
    Left,
    /// Columns `x >= half`.
    Right,
}

impl Flank {
    /// The other flank.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Flank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Dimensions of the diamond arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArenaGeometry {
    size: i32,
}

impl ArenaGeometry {
    /// Arena side length used by the live game.
    pub const STANDARD_SIZE: i32 = 28;

    /// Create an arena geometry.
    ///
    /// # Panics
    ///
    /// Panics if `size` is not a positive even number.
    #[must_use]
    pub fn new(size: i32) -> Self {
        assert!(
            size > 0 && size % 2 == 0,
            "Arena size must be a positive even number"
        );
        Self { size }
    }

    /// Side length of the bounding square.
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// Half the side length; first row of the opponent's territory.
    #[must_use]
    pub const fn half(&self) -> i32 {
        self.size / 2
    }

    /// Check if a cell lies inside the diamond.
    #[must_use]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        if cell.y < 0 || cell.y >= self.size {
            return false;
        }
        let half = self.half();
        let row_size = if cell.y < half {
            cell.y + 1
        } else {
            self.size - cell.y
        };
        let start_x = half - row_size;
        let end_x = start_x + 2 * row_size - 1;
        cell.x >= start_x && cell.x <= end_x
    }

    /// Check if a cell is on our side of the arena.
    #[must_use]
    pub fn is_friendly_territory(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && cell.y < self.half()
    }

    /// Which flank a cell falls on.
    #[must_use]
    pub fn flank_of(&self, cell: Cell) -> Flank {
        if cell.x < self.half() {
            Flank::Left
        } else {
            Flank::Right
        }
    }

    /// Cells along an edge, ordered from the arena's vertical midline outward.
    #[must_use]
    pub fn edge_cells(&self, edge: Edge) -> Vec<Cell> {
        let half = self.half();
        let top = self.size - 1;
        (0..half)
            .map(|i| match edge {
                Edge::TopRight => Cell::new(half + i, top - i),
                Edge::TopLeft => Cell::new(half - 1 - i, top - i),
                Edge::BottomLeft => Cell::new(half - 1 - i, i),
                Edge::BottomRight => Cell::new(half + i, i),
            })
            .collect()
    }

    /// Check if a cell lies on the given edge.
    #[must_use]
    pub fn is_on_edge(&self, cell: Cell, edge: Edge) -> bool {
        let half = self.half();
        let top = self.size - 1;
        match edge {
            Edge::TopRight => cell.x >= half && cell.y >= half && cell.x - half == top - cell.y,
            Edge::TopLeft => cell.x < half && cell.y >= half && half - 1 - cell.x == top - cell.y,
            Edge::BottomLeft => cell.x < half && cell.y < half && half - 1 - cell.x == cell.y,
            Edge::BottomRight => cell.x >= half && cell.y < half && cell.x - half == cell.y,
        }
    }

    /// Edge a mobile unit starting at `cell` walks toward.
    #[must_use]
    pub fn target_edge(&self, cell: Cell) -> Edge {
        let left = cell.x < self.half();
        let bottom = cell.y < self.half();
        match (left, bottom) {
            (true, true) => Edge::TopRight,
            (true, false) => Edge::BottomRight,
            (false, true) => Edge::TopLeft,
            (false, false) => Edge::BottomLeft,
        }
    }

    /// Our two deployment edges, left first.
    #[must_use]
    pub fn deployment_cells(&self) -> Vec<Cell> {
        let mut cells = self.edge_cells(Edge::BottomLeft);
        cells.extend(self.edge_cells(Edge::BottomRight));
        cells
    }
}

impl Default for ArenaGeometry {
    fn default() -> Self {
        Self::new(Self::STANDARD_SIZE)
    }
}
