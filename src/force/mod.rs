pub mod binder;
pub mod broadcast;
pub mod controller;
pub mod diff;
pub mod geometry;
pub mod physics;
pub mod sim;

// Instrumented Simulation double shared by the engine tests: no forces, no
// cooling, just collections plus call counters.
#[cfg(test)]
pub(crate) mod testing {
    use super::sim::{LayoutOptions, SimLink, SimNode, Simulation};

    pub struct TestSim {
        nodes: Vec<SimNode>,
        links: Vec<SimLink>,
        options: LayoutOptions,
        active: bool,
        pub start_calls: usize,
        pub resume_calls: usize,
    }

    impl TestSim {
        pub fn new() -> Self {
            Self {
                nodes: Vec::new(),
                links: Vec::new(),
                options: LayoutOptions::default(),
                active: false,
                start_calls: 0,
                resume_calls: 0,
            }
        }
    }

    impl Simulation for TestSim {
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
            self.start_calls += 1;
            self.active = true;
        }

        fn resume(&mut self) {
            self.resume_calls += 1;
            self.active = true;
        }

        fn step(&mut self, _dt: f32) -> bool {
            self.active = false;
            false
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }
}
