use std::collections::HashMap;
use std::rc::Rc;

use crate::driver::Driver;
use crate::uuid::{self, Uuid};

use super::{ContextProperties, RenderContext};

/// Owns every [`RenderContext`] living on one driver.
pub struct ContextManager {
    driver: Rc<dyn Driver>,
    contexts: HashMap<Uuid, RenderContext>,
}

impl ContextManager {
    pub fn new(driver: Rc<dyn Driver>) -> Self {
        Self {
            driver,
            contexts: HashMap::new(),
        }
    }

    pub fn driver(&self) -> &Rc<dyn Driver> {
        &self.driver
    }

    /// Creates a context and makes it current.
    pub fn create_context(&mut self, properties: ContextProperties) -> Uuid {
        let id = uuid::generate();
        let context = RenderContext::new(id, Rc::clone(&self.driver), properties);
        context.bind();
        log::info!(
            "context {id} created (\"{}\", {}x{})",
            context.properties().window.title,
            context.properties().window.width,
            context.properties().window.height
        );
        self.contexts.insert(id, context);
        id
    }

    pub fn get_context(&self, id: Uuid) -> Option<&RenderContext> {
        self.contexts.get(&id)
    }

    pub fn get_context_mut(&mut self, id: Uuid) -> Option<&mut RenderContext> {
        self.contexts.get_mut(&id)
    }

    /// Destroys the context and its assets. Unknown ids are ignored.
    pub fn destroy_context(&mut self, id: Uuid) -> bool {
        self.contexts.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn contexts(&self) -> impl Iterator<Item = &RenderContext> {
        self.contexts.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Shader, ShaderSource, VertexBuffer};
    use crate::assets::testing::WGSL;
    use crate::color::Color;
    use crate::driver::{FrameStatus, HeadlessDriver};

    fn manager() -> (Rc<HeadlessDriver>, ContextManager) {
        let headless = Rc::new(HeadlessDriver::new());
        let driver: Rc<dyn Driver> = headless.clone();
        (headless, ContextManager::new(driver))
    }

    #[test]
    fn created_context_is_current_and_reachable() {
        let (headless, mut mgr) = manager();
        let id = mgr.create_context(ContextProperties::default());

        assert!(id.is_valid());
        assert_eq!(headless.current(), Some(id));
        let ctx = mgr.get_context(id).unwrap();
        assert_eq!(ctx.uuid(), id);
        assert_eq!(ctx.assets().context(), id);
        assert_eq!(ctx.clear_color(), Color::black());
    }

    #[test]
    fn context_ids_come_from_the_shared_generator() {
        let (_, mut mgr) = manager();
        let a = mgr.create_context(ContextProperties::default());
        let b = mgr.create_context(ContextProperties::default());
        assert_ne!(a, b);
        assert!(uuid::exists(a) && uuid::exists(b));
        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.contexts().count(), 2);
    }

    #[test]
    fn destroying_releases_assets_and_detaches() {
        let (headless, mut mgr) = manager();
        let id = mgr.create_context(ContextProperties::default());
        let ctx = mgr.get_context_mut(id).unwrap();
        ctx.assets_mut().create::<Shader>(ShaderSource::wgsl(WGSL)).unwrap();
        ctx.assets_mut().create_vertex_array_from_vertices(vec![]).unwrap();
        assert_eq!(headless.live_objects(), 3);

        assert!(mgr.destroy_context(id));
        assert_eq!(headless.live_objects(), 0);
        assert!(headless.is_detached(id));
        assert!(mgr.get_context(id).is_none());

        // Unknown ids are ignored.
        assert!(!mgr.destroy_context(id));
        assert!(mgr.is_empty());
    }

    #[test]
    fn assets_are_created_on_their_own_context() {
        let (headless, mut mgr) = manager();
        let a = mgr.create_context(ContextProperties::default());
        let b = mgr.create_context(ContextProperties::default());
        assert_eq!(headless.current(), Some(b));

        let ctx_a = mgr.get_context_mut(a).unwrap();
        let id = ctx_a.assets_mut().create::<VertexBuffer>(vec![]).unwrap();
        let vb = ctx_a.assets().get::<VertexBuffer>(id).unwrap();
        assert_eq!(headless.owner(vb.raw_handle()), Some(a));
        assert!(ctx_a.is_current());

        // Registries are per context.
        assert!(mgr.get_context(b).unwrap().assets().get::<VertexBuffer>(id).is_none());
    }

    #[test]
    fn frames_clear_with_the_context_color() {
        let (headless, mut mgr) = manager();
        let id = mgr.create_context(ContextProperties::default());
        let ctx = mgr.get_context_mut(id).unwrap();
        ctx.set_clear_color(Color::rgb(10, 20, 30));

        assert_eq!(ctx.begin_frame(), Ok(FrameStatus::Ready));
        assert_eq!(headless.open_frame(id), Some(Color::rgb(10, 20, 30)));
        ctx.end_frame().unwrap();
        assert_eq!(headless.frames_presented(), 1);
    }
}
