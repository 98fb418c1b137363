use eframe::egui::{Vec2, vec2};

const CELL_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

// Square region addressed by center and half side length.
#[derive(Clone, Copy)]
struct Region {
    center: Vec2,
    half: f32,
}

impl Region {
    fn around(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half: span * 0.5 + 1.0,
        })
    }

    fn covers(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half && (point.y - self.center.y).abs() <= self.half
    }

    fn side(self) -> f32 {
        self.half * 2.0
    }

    // Quadrant bit layout: bit 0 = east, bit 1 = south.
    fn quadrant(self, point: Vec2) -> usize {
        ((point.x >= self.center.x) as usize) | (((point.y >= self.center.y) as usize) << 1)
    }

    fn shrink_to(self, quadrant: usize) -> Self {
        let quarter = self.half * 0.5;
        let step_x = if quadrant & 1 == 0 { -quarter } else { quarter };
        let step_y = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(step_x, step_y),
            half: quarter,
        }
    }
}

struct Cell {
    region: Region,
    center_of_mass: Vec2,
    mass: f32,
    // Point indices; populated for leaves only.
    members: Vec<usize>,
    children: [Option<usize>; 4],
}

impl Cell {
    fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }
}

// Cells live in one arena vector; children are arena indices, the root is
// cell 0.
pub(super) struct Quadtree {
    cells: Vec<Cell>,
}

struct PendingCell {
    // Parent arena index and quadrant to wire this cell into, None for root.
    slot: Option<(usize, usize)>,
    region: Region,
    members: Vec<usize>,
    depth: usize,
}

impl Quadtree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let root = Region::around(positions)?;
        let mut cells: Vec<Cell> = Vec::new();
        let mut pending = vec![PendingCell {
            slot: None,
            region: root,
            members: (0..positions.len()).collect(),
            depth: 0,
        }];

        while let Some(task) = pending.pop() {
            let mut center_of_mass = Vec2::ZERO;
            for &member in &task.members {
                center_of_mass += positions[member];
            }
            let mass = task.members.len() as f32;
            if mass > 0.0 {
                center_of_mass /= mass;
            }

            let cell_index = cells.len();
            if let Some((parent, quadrant)) = task.slot {
                cells[parent].children[quadrant] = Some(cell_index);
            }

            // Coincident points would subdivide forever; a bucket split that
            // leaves everything in one quadrant stays a leaf instead.
            let mut split: Option<[Vec<usize>; 4]> = None;
            if task.depth < MAX_DEPTH && task.members.len() > CELL_CAPACITY {
                let mut buckets: [Vec<usize>; 4] = Default::default();
                for &member in &task.members {
                    buckets[task.region.quadrant(positions[member])].push(member);
                }
                if buckets.iter().filter(|bucket| !bucket.is_empty()).count() > 1 {
                    split = Some(buckets);
                }
            }

            match split {
                Some(buckets) => {
                    cells.push(Cell {
                        region: task.region,
                        center_of_mass,
                        mass,
                        members: Vec::new(),
                        children: [None; 4],
                    });
                    for (quadrant, bucket) in buckets.into_iter().enumerate() {
                        if !bucket.is_empty() {
                            pending.push(PendingCell {
                                slot: Some((cell_index, quadrant)),
                                region: task.region.shrink_to(quadrant),
                                members: bucket,
                                depth: task.depth + 1,
                            });
                        }
                    }
                }
                None => cells.push(Cell {
                    region: task.region,
                    center_of_mass,
                    mass,
                    members: task.members,
                    children: [None; 4],
                }),
            }
        }

        Some(Self { cells })
    }

    #[cfg(test)]
    fn root(&self) -> &Cell {
        &self.cells[0]
    }

    // Barnes-Hut traversal: a cell far enough away (side/distance below
    // theta) acts as a single body at its center of mass; near cells are
    // descended into and their leaf members summed exactly.
    pub(super) fn repulsion_at(
        &self,
        index: usize,
        positions: &[Vec2],
        strength: f32,
        softening: f32,
        theta: f32,
    ) -> Vec2 {
        let point = positions[index];
        let mut force = Vec2::ZERO;
        let mut stack = vec![0usize];

        while let Some(cell_index) = stack.pop() {
            let cell = &self.cells[cell_index];
            if cell.mass <= 0.0 {
                continue;
            }

            if cell.is_leaf() {
                for &member in &cell.members {
                    if member != index {
                        force += point_repulsion(point, positions[member], strength, softening);
                    }
                }
                continue;
            }

            let delta = point - cell.center_of_mass;
            let distance_sq = delta.length_sq().max(0.0001);
            let distance = distance_sq.sqrt();
            if !cell.region.covers(point)
                && (cell.region.side() / distance) < theta
                && cell.mass > 1.0
            {
                force += (delta / distance) * ((strength * cell.mass) / (distance_sq + softening));
                continue;
            }

            stack.extend(cell.children.into_iter().flatten());
        }

        force
    }
}

fn point_repulsion(at: Vec2, from: Vec2, strength: f32, softening: f32) -> Vec2 {
    let delta = at - from;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (strength / (distance_sq + softening))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_subdivided_tree_over_spread_points() {
        let positions = (0..40)
            .map(|index| vec2((index % 8) as f32 * 50.0, (index / 8) as f32 * 50.0))
            .collect::<Vec<_>>();
        let tree = Quadtree::build(&positions).unwrap();
        assert!(!tree.root().is_leaf());
        assert_eq!(tree.root().mass, 40.0);
    }

    #[test]
    fn empty_input_has_no_tree() {
        assert!(Quadtree::build(&[]).is_none());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 64];
        let tree = Quadtree::build(&positions).unwrap();
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().members.len(), 64);
    }

    #[test]
    fn repulsion_pushes_points_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = Quadtree::build(&positions).unwrap();
        let force = tree.repulsion_at(0, &positions, 1000.0, 1.0, 0.8);
        assert!(force.x < 0.0);
        assert!(force.y.abs() < f32::EPSILON);
    }

    #[test]
    fn far_cluster_approximation_tracks_the_exact_sum() {
        // One probe far west of a tight cluster; the approximated pull must
        // stay close to the pairwise sum.
        let mut positions = vec![vec2(-4000.0, 0.0)];
        for index in 0..30 {
            positions.push(vec2(
                4000.0 + (index % 6) as f32 * 3.0,
                (index / 6) as f32 * 3.0,
            ));
        }
        let tree = Quadtree::build(&positions).unwrap();

        let approximate = tree.repulsion_at(0, &positions, 50_000.0, 1.0, 0.9);
        let exact: Vec2 = positions[1..]
            .iter()
            .map(|other| point_repulsion(positions[0], *other, 50_000.0, 1.0))
            .fold(Vec2::ZERO, |acc, force| acc + force);

        assert!((approximate - exact).length() <= exact.length() * 0.05 + 1e-6);
    }
}
