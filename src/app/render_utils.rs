use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

const GROUP_PALETTE: [Color32; 8] = [
    Color32::from_rgb(96, 165, 250),
    Color32::from_rgb(248, 150, 86),
    Color32::from_rgb(94, 200, 130),
    Color32::from_rgb(222, 108, 120),
    Color32::from_rgb(162, 130, 240),
    Color32::from_rgb(120, 200, 220),
    Color32::from_rgb(230, 190, 96),
    Color32::from_rgb(180, 180, 188),
];

pub(super) fn group_color(group: Option<u32>) -> Color32 {
    match group {
        Some(group) => GROUP_PALETTE[group as usize % GROUP_PALETTE.len()],
        None => GROUP_PALETTE[7],
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.left_top() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

// The graph's local space is the layout's own [0, width] x [0, height]
// coordinate system; pan/zoom map it onto the panel rect.
pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.left_top() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.left_top() - pan) / zoom
}

pub(super) fn segment_distance_sq(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let span = end - start;
    let length_sq = span.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length_sq();
    }

    let t = ((point - start).dot(span) / length_sq).clamp(0.0, 1.0);
    let nearest = start + span * t;
    (point - nearest).length_sq()
}

pub(super) fn node_radius(degree: usize, zoom: f32) -> f32 {
    let base = 6.0 + ((degree as f32 + 1.0).ln() * 3.2);
    (base * zoom.powf(0.40)).clamp(2.5, 46.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn screen_world_round_trip() {
        let rect = Rect::from_min_size(pos2(100.0, 50.0), vec2(800.0, 600.0));
        let pan = vec2(12.0, -8.0);
        let zoom = 1.7;
        let world = vec2(480.0, 300.0);

        let screen = world_to_screen(rect, pan, zoom, world);
        let back = screen_to_world(rect, pan, zoom, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn segment_distance_handles_endpoints_and_interior() {
        let start = pos2(0.0, 0.0);
        let end = pos2(10.0, 0.0);
        assert_eq!(segment_distance_sq(pos2(5.0, 3.0), start, end), 9.0);
        assert_eq!(segment_distance_sq(pos2(-4.0, 0.0), start, end), 16.0);
        assert_eq!(segment_distance_sq(pos2(13.0, 4.0), start, end), 25.0);
    }
}
