use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{constants::HEURISTIC_WEIGHT, grid::Grid, rooms::GridPos};

// East, north, west, south.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

// ============================================================================
// Search Node
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    index: usize,
    f_score: f32,
    g_score: u32,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on f; deeper nodes win ties
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| other.index.cmp(&self.index))
    }
}

#[must_use]
pub fn heuristic(from: GridPos, to: GridPos) -> f32 {
    from.manhattan(to) as f32 * HEURISTIC_WEIGHT
}

// Walkable 4-neighbours of a cell, each with unit cost.
#[must_use]
pub fn walkable_neighbors(grid: &Grid, pos: GridPos) -> Vec<(GridPos, u32)> {
    NEIGHBOR_OFFSETS
        .iter()
        .map(|&(dx, dz)| pos.offset(dx, dz))
        .filter(|&next| grid.is_walkable(next))
        .map(|next| (next, 1))
        .collect()
}

// ============================================================================
// A*
// ============================================================================

#[must_use]
pub fn find_path(grid: &Grid, start: GridPos, goal: GridPos) -> Option<Vec<GridPos>> {
    find_path_filtered(grid, start, goal, |_| true)
}

// Like `find_path`, but intermediate cells must also satisfy `passable`.
// The goal only has to be walkable.
pub fn find_path_filtered<F>(grid: &Grid, start: GridPos, goal: GridPos, passable: F) -> Option<Vec<GridPos>>
where
    F: Fn(GridPos) -> bool,
{
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let start_index = grid.index(start)?;
    let goal_index = grid.index(goal)?;
    let cell_count = grid.cell_count();

    let mut g_score = vec![u32::MAX; cell_count];
    let mut came_from: Vec<Option<usize>> = vec![None; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open = BinaryHeap::new();

    g_score[start_index] = 0;
    open.push(OpenNode {
        index: start_index,
        f_score: heuristic(start, goal),
        g_score: 0,
    });

    // Each cell is expanded at most once
    let mut expanded = 0;
    while let Some(node) = open.pop() {
        if closed[node.index] {
            continue;
        }
        if node.index == goal_index {
            return Some(reconstruct(grid, &came_from, goal_index));
        }
        closed[node.index] = true;
        expanded += 1;
        if expanded > cell_count {
            break;
        }

        let current = grid.pos_of(node.index);
        for (next, cost) in walkable_neighbors(grid, current) {
            let Some(next_index) = grid.index(next) else {
                continue;
            };
            if closed[next_index] || (next_index != goal_index && !passable(next)) {
                continue;
            }
            let tentative = node.g_score + cost;
            if tentative < g_score[next_index] {
                g_score[next_index] = tentative;
                came_from[next_index] = Some(node.index);
                open.push(OpenNode {
                    index: next_index,
                    f_score: tentative as f32 + heuristic(next, goal),
                    g_score: tentative,
                });
            }
        }
    }

    None
}

fn reconstruct(grid: &Grid, came_from: &[Option<usize>], goal_index: usize) -> Vec<GridPos> {
    let mut path = vec![grid.pos_of(goal_index)];
    let mut current = goal_index;
    while let Some(prev) = came_from[current] {
        path.push(grid.pos_of(prev));
        current = prev;
    }
    path.reverse();
    path
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Parses rows of '.' (floor) and '#' (wall).
    fn grid_from(rows: &[&str]) -> Grid {
        let mut grid = Grid::new(rows[0].len() as i32, rows.len() as i32, 1.0).unwrap();
        for (z, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '.' {
                    grid.cell_mut(GridPos::new(x as i32, z as i32)).unwrap().make_floor();
                }
            }
        }
        grid
    }

    fn assert_contiguous(grid: &Grid, path: &[GridPos]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "step {} -> {}", pair[0], pair[1]);
        }
        assert!(path.iter().all(|&p| grid.is_walkable(p)));
    }

    #[test]
    fn start_equals_goal_returns_single_cell() {
        let grid = grid_from(&["..", ".."]);
        let at = GridPos::new(1, 1);
        assert_eq!(find_path(&grid, at, at), Some(vec![at]));
    }

    #[test]
    fn open_room_path_is_shortest() {
        let grid = grid_from(&["......", "......", "......", "......", "......", "......"]);
        let start = GridPos::new(0, 0);
        let goal = GridPos::new(5, 5);
        let path = find_path(&grid, start, goal).unwrap();
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(path.len(), 11);
        assert_contiguous(&grid, &path);
    }

    #[test]
    fn path_routes_around_walls() {
        let grid = grid_from(&[
            ".....", //
            "####.", //
            ".....", //
            ".####", //
            ".....",
        ]);
        let path = find_path(&grid, GridPos::new(0, 0), GridPos::new(4, 4)).unwrap();
        assert_contiguous(&grid, &path);
        assert_eq!(path.len(), 17);
    }

    #[test]
    fn unreachable_goal_returns_none() {
        let grid = grid_from(&["..#..", "..#..", "..#.."]);
        assert_eq!(find_path(&grid, GridPos::new(0, 0), GridPos::new(4, 2)), None);
    }

    #[test]
    fn wall_or_out_of_bounds_goal_returns_none() {
        let grid = grid_from(&["..#", "..."]);
        assert_eq!(find_path(&grid, GridPos::new(0, 0), GridPos::new(2, 0)), None);
        assert_eq!(find_path(&grid, GridPos::new(0, 0), GridPos::new(9, 9)), None);
        assert_eq!(find_path(&grid, GridPos::new(-1, 0), GridPos::new(1, 1)), None);
    }

    #[test]
    fn filter_blocks_intermediate_cells_but_not_goal() {
        let grid = grid_from(&["...", "...", "..."]);
        let blocked = GridPos::new(1, 1);
        let path = find_path_filtered(&grid, GridPos::new(0, 1), GridPos::new(2, 1), |p| p != blocked).unwrap();
        assert!(!path.contains(&blocked));
        assert_eq!(path.len(), 5);

        let to_blocked = find_path_filtered(&grid, GridPos::new(0, 1), blocked, |p| p != blocked).unwrap();
        assert_eq!(to_blocked.last(), Some(&blocked));
    }

    #[test]
    fn neighbors_skip_walls_and_edges() {
        let grid = grid_from(&[".#", ".."]);
        let mut neighbors = walkable_neighbors(&grid, GridPos::new(0, 0));
        neighbors.sort();
        assert_eq!(neighbors, vec![(GridPos::new(0, 1), 1)]);
    }
}
