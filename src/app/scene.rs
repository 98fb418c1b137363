use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use eframe::egui::Vec2;

use crate::force::broadcast::{LinkEnds, LinkVisual, NodeVisual};

// Last-broadcast positions, written only through the visual handles below.
// The painter reads this buffer and never touches simulation internals.
#[derive(Default)]
pub(in crate::app) struct Scene {
    pub nodes: HashMap<String, Vec2>,
    pub links: HashMap<String, LinkEnds>,
}

pub(in crate::app) type SharedScene = Rc<RefCell<Scene>>;

pub(in crate::app) struct SceneNodeHandle {
    scene: SharedScene,
    key: String,
}

impl SceneNodeHandle {
    pub(in crate::app) fn new(scene: SharedScene, key: &str) -> Self {
        Self {
            scene,
            key: key.to_owned(),
        }
    }
}

impl NodeVisual for SceneNodeHandle {
    fn update_position(&mut self, pos: Vec2) {
        self.scene.borrow_mut().nodes.insert(self.key.clone(), pos);
    }
}

impl Drop for SceneNodeHandle {
    // A deregistered handle erases its projection, so removed entities
    // leave no ghost behind.
    fn drop(&mut self) {
        self.scene.borrow_mut().nodes.remove(&self.key);
    }
}

pub(in crate::app) struct SceneLinkHandle {
    scene: SharedScene,
    key: String,
}

impl SceneLinkHandle {
    pub(in crate::app) fn new(scene: SharedScene, key: &str) -> Self {
        Self {
            scene,
            key: key.to_owned(),
        }
    }
}

impl LinkVisual for SceneLinkHandle {
    fn update_position(&mut self, ends: LinkEnds) {
        self.scene.borrow_mut().links.insert(self.key.clone(), ends);
    }
}

impl Drop for SceneLinkHandle {
    fn drop(&mut self) {
        self.scene.borrow_mut().links.remove(&self.key);
    }
}
