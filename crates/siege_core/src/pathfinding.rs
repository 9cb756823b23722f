//! Edge-to-edge path prediction for mobile units.
//!
//! Mobile units do not path to a single goal: they head for the arena edge
//! diagonally opposite their spawn. When that edge is reachable they take a
//! shortest route to it; when the defenders have sealed it off they walk to
//! the most advanced reachable cell instead and self-destruct there.
//!
//! The search runs in three deterministic passes:
//!
//! 1. **Idealness search** - breadth-first from the start, remembering the
//!    most "ideal" cell seen (any target-edge cell beats everything else;
//!    otherwise the cell furthest toward the target edge, then toward its
//!    side).
//! 2. **Validation** - reverse breadth-first from the ideal endpoint(s),
//!    assigning every reachable cell its distance to the goal.
//! 3. **Walk** - from the start, step to the neighbour with the lowest
//!    distance. Ties prefer switching axis, then moving toward the edge.

use std::collections::VecDeque;

use crate::grid::{ArenaGeometry, Cell, Edge};

/// Axis of the previous step while walking a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    None,
    Horizontal,
    Vertical,
}

/// Walkability snapshot of the arena.
///
/// Stored as a dense square; cells outside the diamond are never walkable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavGrid {
    arena: ArenaGeometry,
    blocked: Vec<bool>,
}

impl NavGrid {
    /// Create a grid with every in-bounds cell walkable.
    #[must_use]
    pub fn new(arena: ArenaGeometry) -> Self {
        let side = arena.size() as usize;
        Self {
            arena,
            blocked: vec![false; side * side],
        }
    }

    /// Create a grid, marking cells for which `is_blocked` returns true.
    #[must_use]
    pub fn from_fn(arena: ArenaGeometry, mut is_blocked: impl FnMut(Cell) -> bool) -> Self {
        let mut grid = Self::new(arena);
        for y in 0..arena.size() {
            for x in 0..arena.size() {
                let cell = Cell::new(x, y);
                if arena.in_bounds(cell) && is_blocked(cell) {
                    grid.set_blocked(cell, true);
                }
            }
        }
        grid
    }

    /// Arena this grid covers.
    #[must_use]
    pub const fn arena(&self) -> ArenaGeometry {
        self.arena
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if !self.arena.in_bounds(cell) {
            return None;
        }
        Some(cell.y as usize * self.arena.size() as usize + cell.x as usize)
    }

    /// Mark or clear a blocking structure.
    /// Returns `false` if the cell is out of bounds.
    pub fn set_blocked(&mut self, cell: Cell, blocked: bool) -> bool {
        match self.index(cell) {
            Some(index) => {
                self.blocked[index] = blocked;
                true
            }
            None => false,
        }
    }

    /// Check if a unit could stand on this cell.
    #[must_use]
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|index| !self.blocked[index])
    }
}

/// Per-cell scratch state for one search.
struct SearchField {
    side: usize,
    visited: Vec<bool>,
    distance: Vec<Option<u32>>,
}

impl SearchField {
    fn new(arena: ArenaGeometry) -> Self {
        let side = arena.size() as usize;
        Self {
            side,
            visited: vec![false; side * side],
            distance: vec![None; side * side],
        }
    }

    #[inline]
    fn slot(&self, cell: Cell) -> usize {
        cell.y as usize * self.side + cell.x as usize
    }
}

/// Predict the path a mobile unit spawned at `start` would walk.
///
/// Returns `None` if `start` is out of bounds or occupied by a structure.
/// The returned path always begins with `start`; it ends on `target` when
/// the edge is reachable, otherwise on the most advanced reachable cell.
#[must_use]
pub fn find_path_to_edge(grid: &NavGrid, start: Cell, target: Edge) -> Option<Vec<Cell>> {
    if !grid.is_walkable(start) {
        return None;
    }

    let arena = grid.arena();
    let end_points = arena.edge_cells(target);
    let mut field = SearchField::new(arena);

    let ideal = idealness_search(grid, &mut field, start, target, &end_points);
    validate(grid, &mut field, ideal, &end_points);
    walk(grid, &field, start, target)
}

/// How desirable it is to end a walk on `cell`.
fn idealness(arena: ArenaGeometry, cell: Cell, target: Edge, end_points: &[Cell]) -> i64 {
    if end_points.contains(&cell) {
        return i64::MAX;
    }
    let size = i64::from(arena.size());
    let top = size - 1;
    let (dir_x, dir_y) = target.direction();
    let (x, y) = (i64::from(cell.x), i64::from(cell.y));

    let vertical = if dir_y == 1 { size * y } else { size * (top - y) };
    let horizontal = if dir_x == 1 { x } else { top - x };
    vertical + horizontal
}

fn idealness_search(
    grid: &NavGrid,
    field: &mut SearchField,
    start: Cell,
    target: Edge,
    end_points: &[Cell],
) -> Cell {
    let arena = grid.arena();
    let mut queue = VecDeque::from([start]);
    let mut best = idealness(arena, start, target, end_points);
    let mut most_ideal = start;
    let start_slot = field.slot(start);
    field.visited[start_slot] = true;

    while let Some(current) = queue.pop_front() {
        for neighbor in current.neighbors() {
            if !grid.is_walkable(neighbor) {
                continue;
            }
            let score = idealness(arena, neighbor, target, end_points);
            if score > best {
                best = score;
                most_ideal = neighbor;
            }
            let slot = field.slot(neighbor);
            if !field.visited[slot] {
                field.visited[slot] = true;
                queue.push_back(neighbor);
            }
        }
    }

    most_ideal
}

fn validate(grid: &NavGrid, field: &mut SearchField, ideal: Cell, end_points: &[Cell]) {
    let mut queue = VecDeque::new();
    let seeds: Vec<Cell> = if end_points.contains(&ideal) {
        end_points.to_vec()
    } else {
        vec![ideal]
    };
    let mut seen = vec![false; field.visited.len()];

    for seed in seeds {
        let slot = field.slot(seed);
        field.distance[slot] = Some(0);
        seen[slot] = true;
        queue.push_back(seed);
    }

    while let Some(current) = queue.pop_front() {
        // Blocked edge cells are seeded but never expanded.
        if !grid.is_walkable(current) {
            continue;
        }
        let Some(current_distance) = field.distance[field.slot(current)] else {
            continue;
        };
        for neighbor in current.neighbors() {
            if !grid.is_walkable(neighbor) {
                continue;
            }
            let slot = field.slot(neighbor);
            if !seen[slot] {
                seen[slot] = true;
                field.distance[slot] = Some(current_distance + 1);
                queue.push_back(neighbor);
            }
        }
    }
}

fn walk(grid: &NavGrid, field: &SearchField, start: Cell, target: Edge) -> Option<Vec<Cell>> {
    let mut path = vec![start];
    let mut current = start;
    let mut axis = Axis::None;
    let max_steps = field.distance.len();

    loop {
        let distance = field.distance[field.slot(current)]?;
        if distance == 0 {
            return Some(path);
        }
        if path.len() > max_steps {
            return None;
        }

        let next = choose_next_move(grid, field, current, axis, target);
        if next == current {
            return None;
        }
        axis = if next.x == current.x {
            Axis::Vertical
        } else {
            Axis::Horizontal
        };
        path.push(next);
        current = next;
    }
}

fn choose_next_move(
    grid: &NavGrid,
    field: &SearchField,
    current: Cell,
    previous: Axis,
    target: Edge,
) -> Cell {
    let mut best_cell = current;
    let mut best_distance = field.distance[field.slot(current)].unwrap_or(u32::MAX);

    for neighbor in current.neighbors() {
        if !grid.is_walkable(neighbor) {
            continue;
        }
        let Some(distance) = field.distance[field.slot(neighbor)] else {
            continue;
        };
        if distance > best_distance {
            continue;
        }
        let strictly_better = distance < best_distance;
        if !strictly_better && !better_direction(current, neighbor, best_cell, previous, target) {
            continue;
        }
        best_cell = neighbor;
        best_distance = distance;
    }

    best_cell
}

/// Tie-break between two equally short moves from `from`.
fn better_direction(from: Cell, candidate: Cell, best: Cell, previous: Axis, target: Edge) -> bool {
    match previous {
        Axis::Horizontal if candidate.x != best.x => return from.y != candidate.y,
        Axis::Vertical if candidate.y != best.y => return from.x != candidate.x,
        Axis::None => return from.y != candidate.y,
        _ => {}
    }

    let (dir_x, dir_y) = target.direction();
    if candidate.y == best.y {
        return (dir_x == 1 && candidate.x > best.x) || (dir_x == -1 && candidate.x < best.x);
    }
    if candidate.x == best.x {
        return (dir_y == 1 && candidate.y > best.y) || (dir_y == -1 && candidate.y < best.y);
    }
    true
}
