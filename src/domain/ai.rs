/// Frog AI: A* pathfinding over the tile grid.
///
/// The search graph is rebuilt on every query, one node per cell. An edge
/// u→v exists when v is the destination itself (occupied by the quarry) or
/// when v is walkable by the mover and nobody stands on it.
///
/// Uniform step cost, Euclidean heuristic. Duplicate heap entries are allowed;
/// a node is expanded only on its first (cheapest) pop.
///
/// Unreachable targets give an empty path, never an error.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use super::entity::{ActorId, ActorTag};
use super::grid::Grid;

pub type Path = VecDeque<(usize, usize)>;

const UNREACHED: u32 = u32::MAX;

struct Node {
    edges: Vec<usize>,
    cost: u32,
    back: Option<usize>,
    closed: bool,
}

#[derive(Clone, Copy, PartialEq)]
struct Open {
    estimate: f64,
    idx: usize,
}

impl Eq for Open {}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; lowest estimate must come out first.
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn euclid(a: (usize, usize), b: (usize, usize)) -> f64 {
    let dx = a.0 as f64 - b.0 as f64;
    let dy = a.1 as f64 - b.1 as f64;
    (dx * dx + dy * dy).sqrt()
}

fn build_graph(grid: &Grid, dest: (usize, usize), mover: ActorTag) -> Vec<Node> {
    let w = grid.width();
    grid.tiles()
        .map(|tile| {
            let edges = grid
                .adjacent(tile.x(), tile.y())
                .into_iter()
                .filter(|&(nx, ny)| {
                    (nx, ny) == dest
                        || grid.get(nx, ny).map_or(false, |t| {
                            t.kind().walkable_by(mover) && !t.is_occupied()
                        })
                })
                .map(|(nx, ny)| ny * w + nx)
                .collect();
            Node { edges, cost: UNREACHED, back: None, closed: false }
        })
        .collect()
}

/// Shortest route from `start` to `dest` for a `mover`. The result begins
/// with the step after `start` and ends at `dest`.
pub fn find_path(grid: &Grid, start: (usize, usize), dest: (usize, usize), mover: ActorTag) -> Path {
    if start == dest || !grid.in_bounds(start.0, start.1) || !grid.in_bounds(dest.0, dest.1) {
        return Path::new();
    }

    let w = grid.width();
    let pos = |idx: usize| (idx % w, idx / w);
    let start_idx = start.1 * w + start.0;
    let dest_idx = dest.1 * w + dest.0;

    let mut nodes = build_graph(grid, dest, mover);
    let mut open = BinaryHeap::new();
    nodes[start_idx].cost = 0;
    open.push(Open { estimate: euclid(start, dest), idx: start_idx });

    while let Some(Open { idx, .. }) = open.pop() {
        if nodes[idx].closed {
            continue;
        }
        nodes[idx].closed = true;
        if idx == dest_idx {
            break;
        }
        let next_cost = nodes[idx].cost + 1;
        for e in 0..nodes[idx].edges.len() {
            let v = nodes[idx].edges[e];
            if nodes[v].closed || next_cost >= nodes[v].cost {
                continue;
            }
            nodes[v].cost = next_cost;
            nodes[v].back = Some(idx);
            open.push(Open { estimate: next_cost as f64 + euclid(pos(v), dest), idx: v });
        }
    }

    if nodes[dest_idx].cost == UNREACHED {
        return Path::new();
    }

    let mut path = Path::new();
    let mut cur = dest_idx;
    while cur != start_idx {
        path.push_front(pos(cur));
        match nodes[cur].back {
            Some(prev) => cur = prev,
            None => return Path::new(),
        }
    }
    path
}

/// A cached path is stale once an interior waypoint is blocked or the last
/// waypoint no longer holds the quarry.
pub fn path_still_valid(grid: &Grid, path: &Path, target: ActorId, mover: ActorTag) -> bool {
    let Some(&last) = path.back() else {
        return false;
    };
    if grid.occupant_at(last.0, last.1) != Some(target) {
        return false;
    }
    path.iter().take(path.len() - 1).all(|&(x, y)| {
        grid.get(x, y)
            .map_or(false, |t| t.kind().walkable_by(mover) && !t.is_occupied())
    })
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileKind;

    /// Legend: '#'=Wall  ':'=Dirt  anything else=Path
    fn grid_from(rows: &[&str]) -> Grid {
        let height = rows.len();
        let width = rows[0].len();
        let kinds: Vec<TileKind> = rows
            .iter()
            .flat_map(|r| r.chars())
            .map(|c| match c {
                '#' => TileKind::Wall,
                ':' => TileKind::Dirt,
                _ => TileKind::Path,
            })
            .collect();
        Grid::from_kinds(width, height, &kinds)
    }

    #[test]
    fn open_field_path_length_is_manhattan() {
        let mut g = grid_from(&["......", "......", "......", "......"]);
        g.set_occupant(5, 3, Some(ActorId(1))).unwrap();
        let p = find_path(&g, (0, 0), (5, 3), ActorTag::Frog);
        assert_eq!(p.len(), 8);
        assert_eq!(p.back(), Some(&(5, 3)));
        for w in p.iter().zip(p.iter().skip(1)) {
            assert_eq!(w.0 .0.abs_diff(w.1 .0) + w.0 .1.abs_diff(w.1 .1), 1);
        }
    }

    #[test]
    fn first_waypoint_is_next_to_start() {
        let mut g = grid_from(&["....."]);
        g.set_occupant(4, 0, Some(ActorId(1))).unwrap();
        let p = find_path(&g, (0, 0), (4, 0), ActorTag::Frog);
        assert_eq!(p, Path::from(vec![(1, 0), (2, 0), (3, 0), (4, 0)]));
    }

    #[test]
    fn enclosed_target_gives_empty_path() {
        let mut g = grid_from(&[
            ".....",
            "..#..",
            ".#.#.",
            "..#..",
        ]);
        g.set_occupant(2, 2, Some(ActorId(1))).unwrap();
        assert!(find_path(&g, (0, 0), (2, 2), ActorTag::Frog).is_empty());
    }

    #[test]
    fn routes_around_walls() {
        let mut g = grid_from(&[
            "....",
            "###.",
            "....",
        ]);
        g.set_occupant(0, 2, Some(ActorId(1))).unwrap();
        let p = find_path(&g, (0, 0), (0, 2), ActorTag::Frog);
        assert_eq!(p.len(), 8);
        assert!(p.contains(&(3, 1)));
    }

    #[test]
    fn frogs_do_not_tunnel_through_dirt() {
        let mut g = grid_from(&["..:.."]);
        g.set_occupant(4, 0, Some(ActorId(1))).unwrap();
        assert!(find_path(&g, (0, 0), (4, 0), ActorTag::Frog).is_empty());
        assert_eq!(find_path(&g, (0, 0), (4, 0), ActorTag::Player).len(), 4);
    }

    #[test]
    fn occupied_cells_are_impassable() {
        let mut g = grid_from(&["....."]);
        g.set_occupant(2, 0, Some(ActorId(7))).unwrap();
        g.set_occupant(4, 0, Some(ActorId(1))).unwrap();
        assert!(find_path(&g, (0, 0), (4, 0), ActorTag::Frog).is_empty());
    }

    #[test]
    fn validity_tracks_target_and_blockers() {
        let mut g = grid_from(&["....."]);
        g.set_occupant(4, 0, Some(ActorId(1))).unwrap();
        let p = find_path(&g, (0, 0), (4, 0), ActorTag::Frog);
        assert!(path_still_valid(&g, &p, ActorId(1), ActorTag::Frog));

        g.set_occupant(2, 0, Some(ActorId(9))).unwrap();
        assert!(!path_still_valid(&g, &p, ActorId(1), ActorTag::Frog));
        g.set_occupant(2, 0, None).unwrap();

        g.set_occupant(4, 0, None).unwrap();
        g.set_occupant(3, 0, Some(ActorId(1))).unwrap();
        assert!(!path_still_valid(&g, &p, ActorId(1), ActorTag::Frog));
        assert!(!path_still_valid(&g, &Path::new(), ActorId(1), ActorTag::Frog));
    }
}
