use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

// Two independent pin flags: the interaction layer holds nodes in place
// while it is moving them (system), the user toggles a sticky pin (user).
// Releasing the system flag must never drop a user pin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinState {
    by_system: bool,
    by_user: bool,
}

impl PinState {
    pub fn user(on: bool) -> Self {
        Self {
            by_system: false,
            by_user: on,
        }
    }

    pub fn pinned(self) -> bool {
        self.by_system || self.by_user
    }

    pub fn pinned_by_user(self) -> bool {
        self.by_user
    }

    pub fn hold(&mut self) {
        self.by_system = true;
    }

    pub fn release(&mut self) {
        self.by_system = false;
    }

    pub fn set_user(&mut self, on: bool) {
        self.by_user = on;
    }
}

#[derive(Clone, Debug)]
pub struct SimNode {
    pub key: String,
    pub pos: Vec2,
    pub vel: Vec2,
    // Provisional position written by interaction. Pinned nodes stay glued
    // to it across ticks; unpinned nodes carry it along with `pos`.
    pub target: Vec2,
    pub pin: PinState,
}

impl SimNode {
    pub fn seeded(key: String, pos: Vec2, user_pinned: bool) -> Self {
        Self {
            key,
            pos,
            vel: Vec2::ZERO,
            target: pos,
            pin: PinState::user(user_pinned),
        }
    }

    pub fn place(&mut self, pos: Vec2) {
        self.target = pos;
        self.pos = pos;
        self.vel = Vec2::ZERO;
    }

    pub fn shift(&mut self, delta: Vec2) {
        self.place(self.target + delta);
    }
}

// Endpoint indices address the simulation's current node collection and are
// re-resolved through the commit map whenever the node set changes.
#[derive(Clone, Debug)]
pub struct SimLink {
    pub key: String,
    pub source_key: String,
    pub target_key: String,
    pub source: usize,
    pub target: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub gravity: f32,
    pub friction: f32,
    pub charge: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub theta: f32,
    pub size: [f32; 2],
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            gravity: 0.1,
            friction: 0.9,
            charge: -30.0,
            link_distance: 20.0,
            link_strength: 1.0,
            theta: 0.8,
            size: [960.0, 600.0],
        }
    }
}

impl LayoutOptions {
    pub fn center(&self) -> Vec2 {
        vec2(self.size[0] * 0.5, self.size[1] * 0.5)
    }
}

// The integrator boundary. The binder and controller only ever talk to this
// surface; the embedding loop drives `step` while `is_active` and pushes the
// results through the tick broadcaster.
pub trait Simulation {
    fn nodes(&self) -> &[SimNode];
    fn nodes_mut(&mut self) -> &mut [SimNode];
    fn set_nodes(&mut self, nodes: Vec<SimNode>);
    fn links(&self) -> &[SimLink];
    fn set_links(&mut self, links: Vec<SimLink>);
    fn options(&self) -> LayoutOptions;
    fn set_options(&mut self, options: LayoutOptions);
    // Full reheat after a structural or parameter change.
    fn start(&mut self);
    // Warm nudge; idempotent, callable once per gesture event.
    fn resume(&mut self);
    // One integration tick; returns whether anything is still moving.
    fn step(&mut self, dt: f32) -> bool;
    fn is_active(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_preserves_user_pin() {
        let mut pin = PinState::user(true);
        pin.hold();
        assert!(pin.pinned());
        pin.release();
        assert!(pin.pinned());
        assert!(pin.pinned_by_user());

        let mut pin = PinState::default();
        pin.hold();
        pin.release();
        assert!(!pin.pinned());
    }

    #[test]
    fn shift_moves_pos_and_target_together() {
        let mut node = SimNode::seeded("a".to_owned(), vec2(1.0, 1.0), false);
        node.vel = vec2(3.0, 0.0);
        node.shift(vec2(0.0, 1.0));
        assert_eq!(node.pos, vec2(1.0, 2.0));
        assert_eq!(node.target, vec2(1.0, 2.0));
        assert_eq!(node.vel, Vec2::ZERO);
    }

    #[test]
    fn options_equality_is_by_value() {
        let a = LayoutOptions::default();
        let mut b = LayoutOptions::default();
        assert_eq!(a, b);
        b.charge = -31.0;
        assert_ne!(a, b);
    }
}
