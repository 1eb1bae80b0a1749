use std::rc::Rc;

use crate::assets::AssetRegistry;
use crate::color::Color;
use crate::driver::{Driver, DriverError, FrameStatus};
use crate::render::Renderer;
use crate::uuid::Uuid;

use super::{ContextBinding, ContextProperties};

/// One render target with its own assets and renderer.
///
/// Created by [`ContextManager::create_context`](super::ContextManager::create_context).
/// Dropping the context releases its assets (with the context current) and then detaches
/// it from the driver.
pub struct RenderContext {
    uuid: Uuid,
    binding: ContextBinding,
    properties: ContextProperties,
    clear_color: Color,
    assets: AssetRegistry,
    renderer: Renderer,
}

impl RenderContext {
    pub(crate) fn new(uuid: Uuid, driver: Rc<dyn Driver>, properties: ContextProperties) -> Self {
        let binding = ContextBinding::new(uuid, driver);
        Self {
            uuid,
            clear_color: properties.clear_color,
            assets: AssetRegistry::new(binding.clone()),
            binding,
            properties,
            renderer: Renderer::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Properties the context was created with.
    pub fn properties(&self) -> &ContextProperties {
        &self.properties
    }

    /// Makes this context the driver's current one.
    pub fn bind(&self) {
        self.binding.bind();
    }

    pub fn is_current(&self) -> bool {
        self.binding.is_current()
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetRegistry {
        &mut self.assets
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) -> &mut Self {
        self.clear_color = color;
        self
    }

    /// Opens a frame and clears it to [`clear_color`](Self::clear_color).
    pub fn begin_frame(&self) -> Result<FrameStatus, DriverError> {
        self.bind();
        self.binding
            .driver()
            .begin_frame(self.uuid, self.clear_color)
    }

    /// Presents the frame opened by [`begin_frame`](Self::begin_frame).
    pub fn end_frame(&self) -> Result<(), DriverError> {
        self.binding.driver().end_frame(self.uuid)
    }

    /// Draws a registered vertex array with a registered shader.
    ///
    /// Unknown ids are logged and nothing is drawn.
    pub fn render(&mut self, vertex_array: Uuid, shader: Uuid) -> Result<(), DriverError> {
        self.renderer.render(&self.assets, vertex_array, shader)
    }

    /// Like [`render`](Self::render), binding `textures` in order.
    pub fn render_textured(
        &mut self,
        vertex_array: Uuid,
        shader: Uuid,
        textures: &[Uuid],
    ) -> Result<(), DriverError> {
        self.renderer
            .render_textured(&self.assets, vertex_array, shader, textures)
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        self.bind();
        self.renderer.invalidate();
        self.assets.clear();
        self.binding.driver().detach(self.uuid);
        log::debug!("context {} destroyed", self.uuid);
    }
}
