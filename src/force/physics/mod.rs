mod quadtree;

use eframe::egui::Vec2;

use super::sim::{LayoutOptions, SimLink, SimNode, Simulation};
use quadtree::Quadtree;

// Cooling follows the d3 force layout: alpha starts warm, decays per tick,
// and the loop self-deactivates below ALPHA_MIN.
const START_ALPHA: f32 = 0.1;
const ALPHA_MIN: f32 = 0.005;
const ALPHA_DECAY: f32 = 0.99;

const CHARGE_SCALE: f32 = 24_000.0;
const SPRING_SCALE: f32 = 0.16;
const GRAVITY_SCALE: f32 = 0.11;
const SOFTENING: f32 = 620.0;
const FORCE_TO_VELOCITY: f32 = 0.055;

#[derive(Default)]
struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
}

pub struct ForceSim {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    options: LayoutOptions,
    alpha: f32,
    scratch: PhysicsScratch,
}

impl ForceSim {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            options,
            alpha: 0.0,
            scratch: PhysicsScratch::default(),
        }
    }

    fn integrate(&mut self, time_scale: f32) -> bool {
        let node_count = self.nodes.len();
        let scratch = &mut self.scratch;
        scratch.forces.resize(node_count, Vec2::ZERO);
        scratch.forces.fill(Vec2::ZERO);
        scratch.positions.clear();
        scratch
            .positions
            .extend(self.nodes.iter().map(|node| node.pos));

        let forces = &mut scratch.forces;
        let positions = &scratch.positions;

        let repulsion = -self.options.charge * self.alpha * CHARGE_SCALE;
        if repulsion.abs() > f32::EPSILON
            && let Some(tree) = Quadtree::build(positions)
        {
            for (index, force) in forces.iter_mut().enumerate() {
                *force +=
                    tree.repulsion_at(index, positions, repulsion, SOFTENING, self.options.theta);
            }
        }

        let spring = self.options.link_strength * self.alpha * SPRING_SCALE;
        for link in &self.links {
            if link.source >= node_count || link.target >= node_count || link.source == link.target
            {
                continue;
            }

            let delta = positions[link.source] - positions[link.target];
            let distance_sq = delta.length_sq();
            if distance_sq <= 0.0001 * 0.0001 {
                continue;
            }
            let distance = distance_sq.sqrt();
            let direction = delta / distance;
            let correction = direction * ((distance - self.options.link_distance) * spring);

            forces[link.source] -= correction;
            forces[link.target] += correction;
        }

        let center = self.options.center();
        let center_pull = self.options.gravity * self.alpha * GRAVITY_SCALE;
        for (index, force) in forces.iter_mut().enumerate().take(node_count) {
            *force += (center - positions[index]) * center_pull;
        }

        let damping_factor = self
            .options
            .friction
            .clamp(0.0, 1.0)
            .powf(time_scale);
        let min_sleep_speed_sq = 0.02 * 0.02;
        let mut any_motion = false;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.pin.pinned() {
                // Held nodes track their provisional position exactly.
                node.pos = node.target;
                node.vel = Vec2::ZERO;
                continue;
            }

            let mut velocity =
                (node.vel + (forces[index] * (FORCE_TO_VELOCITY * time_scale))) * damping_factor;
            if velocity.length_sq() < min_sleep_speed_sq {
                velocity = Vec2::ZERO;
            }

            node.vel = velocity;
            node.pos += velocity * time_scale;
            node.target = node.pos;
            if velocity.length_sq() > 0.000_001 {
                any_motion = true;
            }
        }

        any_motion
    }
}

impl Simulation for ForceSim {
    fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut [SimNode] {
        &mut self.nodes
    }

    fn set_nodes(&mut self, nodes: Vec<SimNode>) {
        self.nodes = nodes;
    }

    fn links(&self) -> &[SimLink] {
        &self.links
    }

    fn set_links(&mut self, links: Vec<SimLink>) {
        self.links = links;
    }

    fn options(&self) -> LayoutOptions {
        self.options
    }

    fn set_options(&mut self, options: LayoutOptions) {
        self.options = options;
    }

    fn start(&mut self) {
        self.alpha = START_ALPHA;
    }

    fn resume(&mut self) {
        if self.alpha < START_ALPHA {
            self.alpha = START_ALPHA;
        }
    }

    fn step(&mut self, dt: f32) -> bool {
        if self.alpha < ALPHA_MIN {
            self.alpha = 0.0;
            return false;
        }

        let time_scale = (dt * 60.0).clamp(0.25, 3.0);
        let moving = self.integrate(time_scale);

        // Cooling plus the kinetic-energy cutoff: once every node sleeps,
        // the loop deactivates without waiting out the alpha decay.
        self.alpha *= ALPHA_DECAY.powf(time_scale);
        if !moving || self.alpha < ALPHA_MIN {
            self.alpha = 0.0;
        }
        self.is_active()
    }

    fn is_active(&self) -> bool {
        self.alpha >= ALPHA_MIN
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn sim_with_nodes(nodes: Vec<SimNode>) -> ForceSim {
        let mut sim = ForceSim::new(LayoutOptions::default());
        sim.set_nodes(nodes);
        sim.start();
        sim
    }

    #[test]
    fn pinned_node_stays_at_its_provisional_position() {
        let mut held = SimNode::seeded("held".to_owned(), vec2(100.0, 100.0), false);
        held.pin.hold();
        let free = SimNode::seeded("free".to_owned(), vec2(110.0, 100.0), false);
        let mut sim = sim_with_nodes(vec![held, free]);

        for _ in 0..20 {
            sim.step(DT);
        }

        assert_eq!(sim.nodes()[0].pos, vec2(100.0, 100.0));
        assert_ne!(sim.nodes()[1].pos, vec2(110.0, 100.0));
    }

    #[test]
    fn repulsion_separates_close_nodes() {
        let a = SimNode::seeded("a".to_owned(), vec2(480.0, 300.0), false);
        let b = SimNode::seeded("b".to_owned(), vec2(484.0, 300.0), false);
        let mut sim = sim_with_nodes(vec![a, b]);

        let before = (sim.nodes()[0].pos - sim.nodes()[1].pos).length();
        for _ in 0..10 {
            sim.step(DT);
        }
        let after = (sim.nodes()[0].pos - sim.nodes()[1].pos).length();
        assert!(after > before);
    }

    #[test]
    fn gravity_pulls_a_lone_node_toward_center() {
        let node = SimNode::seeded("a".to_owned(), vec2(900.0, 580.0), false);
        let mut sim = sim_with_nodes(vec![node]);
        let center = sim.options().center();

        let before = (sim.nodes()[0].pos - center).length();
        for _ in 0..40 {
            sim.step(DT);
        }
        let after = (sim.nodes()[0].pos - center).length();
        assert!(after < before);
    }

    #[test]
    fn cooling_deactivates_the_loop() {
        let a = SimNode::seeded("a".to_owned(), vec2(400.0, 300.0), false);
        let b = SimNode::seeded("b".to_owned(), vec2(500.0, 300.0), false);
        let mut sim = sim_with_nodes(vec![a, b]);

        let mut steps = 0;
        while sim.step(DT) {
            steps += 1;
            assert!(steps < 2000, "simulation never converged");
        }
        assert!(!sim.is_active());
        assert!(!sim.step(DT));
    }

    #[test]
    fn resume_is_idempotent_and_warm() {
        let node = SimNode::seeded("a".to_owned(), vec2(10.0, 10.0), false);
        let mut sim = sim_with_nodes(vec![node]);
        sim.step(DT);
        let position = sim.nodes()[0].pos;

        sim.resume();
        sim.resume();
        assert!(sim.is_active());
        // A resume never teleports nodes back to a cold-start state.
        assert_eq!(sim.nodes()[0].pos, position);
    }
}
