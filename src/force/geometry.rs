use eframe::egui::{Vec2, vec2};

// Lower hull then upper hull (monotone chain), counter-clockwise order.
fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup_by(|a, b| (*a - *b).length_sq() < f32::EPSILON);

    if sorted.len() < 3 {
        return sorted;
    }

    fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    let mut lower: Vec<Vec2> = Vec::new();
    for &point in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], point) <= 0.0
        {
            lower.pop();
        }
        lower.push(point);
    }

    let mut upper: Vec<Vec2> = Vec::new();
    for &point in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], point) <= 0.0
        {
            upper.pop();
        }
        upper.push(point);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

// Centroid of the convex hull of the point set, not the simple average:
// stable under outliers and matches the perceived shape center for sparse
// selections. Degenerate hulls (fewer than three distinct points, or zero
// area) fall back to the vertex average.
pub fn hull_centroid(points: &[Vec2]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }

    let hull = convex_hull(points);
    if hull.len() < 3 {
        let sum = hull.iter().fold(Vec2::ZERO, |acc, point| acc + *point);
        return Some(sum / hull.len() as f32);
    }

    let mut area = 0.0_f32;
    let mut centroid = Vec2::ZERO;
    for index in 0..hull.len() {
        let a = hull[index];
        let b = hull[(index + 1) % hull.len()];
        let cross = (a.x * b.y) - (b.x * a.y);
        area += cross;
        centroid += (a + b) * cross;
    }

    if area.abs() < f32::EPSILON {
        let sum = hull.iter().fold(Vec2::ZERO, |acc, point| acc + *point);
        return Some(sum / hull.len() as f32);
    }

    Some(centroid / (3.0 * area))
}

pub fn rotate_point(point: Vec2, pivot: Vec2, degrees: f32) -> Vec2 {
    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();
    let offset = point - pivot;
    pivot
        + vec2(
            offset.x * cos - offset.y * sin,
            offset.x * sin + offset.y * cos,
        )
}

pub fn scale_point(point: Vec2, pivot: Vec2, factor: f32) -> Vec2 {
    pivot + (point - pivot) * factor
}

pub fn rotate_points(points: &mut [Vec2], pivot: Vec2, degrees: f32) {
    for point in points {
        *point = rotate_point(*point, pivot, degrees);
    }
}

pub fn scale_points(points: &mut [Vec2], pivot: Vec2, factor: f32) {
    for point in points {
        *point = scale_point(*point, pivot, factor);
    }
}

pub fn translate_points(points: &mut [Vec2], delta: Vec2) {
    for point in points {
        *point += delta;
    }
}

// Axis-aligned brush rectangle in local (post-pan/zoom) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min: Vec2,
    pub max: Vec2,
}

impl Extent {
    // Corners arrive in whatever order the gesture produced them.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: vec2(a.x.min(b.x), a.y.min(b.y)),
            max: vec2(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    // Half-open on both axes: the min edge is in, the max edge is out.
    pub fn contains(&self, point: Vec2) -> bool {
        self.min.x <= point.x && point.x < self.max.x && self.min.y <= point.y && point.y < self.max.y
    }
}
