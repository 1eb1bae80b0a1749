use std::rc::Rc;

use crate::assets::{Asset, AssetRegistry, AssetType, Shader, Texture2d, VertexArray};
use crate::driver::{DrawCall, DriverError, RawHandle};
use crate::uuid::Uuid;

/// Per-context draw front end.
///
/// Keeps the last vertex array and shader it resolved so repeated draws of the same
/// pair skip the registry lookup.
#[derive(Default)]
pub struct Renderer {
    cached_array: Option<Rc<VertexArray>>,
    cached_shader: Option<Rc<Shader>>,
}

/// Re-resolves `id` unless the cached handle already names a live entry.
fn resolve<K: AssetType>(cache: &mut Option<Rc<K>>, assets: &AssetRegistry, id: Uuid) -> Option<Rc<K>> {
    let fresh = cache
        .as_ref()
        .is_some_and(|cached| cached.uuid() == id && assets.contains(id));
    if !fresh {
        *cache = assets.get::<K>(id);
    }
    cache.clone()
}

fn draw_count(count: usize) -> Result<u32, DriverError> {
    u32::try_from(count)
        .map_err(|_| DriverError::InvalidDraw(format!("{count} elements do not fit in one draw")))
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `vertex_array` with `shader`, both looked up in `assets`.
    ///
    /// Unknown ids are logged and nothing is drawn.
    pub fn render(
        &mut self,
        assets: &AssetRegistry,
        vertex_array: Uuid,
        shader: Uuid,
    ) -> Result<(), DriverError> {
        self.render_textured(assets, vertex_array, shader, &[])
    }

    pub fn render_textured(
        &mut self,
        assets: &AssetRegistry,
        vertex_array: Uuid,
        shader: Uuid,
        textures: &[Uuid],
    ) -> Result<(), DriverError> {
        let array = resolve(&mut self.cached_array, assets, vertex_array);
        let program = resolve(&mut self.cached_shader, assets, shader);
        let (Some(array), Some(program)) = (array, program) else {
            log::error!("invalid asset uuid given (vertex array {vertex_array}, shader {shader})");
            return Ok(());
        };

        let mut texture_handles: Vec<RawHandle> = Vec::with_capacity(textures.len());
        for &id in textures {
            match assets.get::<Texture2d>(id) {
                Some(texture) => texture_handles.push(texture.raw_handle()),
                None => {
                    log::error!("invalid texture uuid given ({id})");
                    return Ok(());
                }
            }
        }

        let binding = assets.binding();
        binding.bind();

        let (index_buffer, count) = if array.has_indices() {
            (Some(array.indices().raw_handle()), array.num_indices())
        } else {
            (None, array.num_vertices())
        };
        let count = draw_count(count)?;
        let uniforms = program.uniform_bytes();

        binding.driver().draw(&DrawCall {
            shader: program.raw_handle(),
            vertex_buffer: array.vertices().raw_handle(),
            index_buffer,
            count,
            uniforms: &uniforms,
            textures: &texture_handles,
        })
    }

    /// Forgets the cached handles.
    pub fn invalidate(&mut self) {
        self.cached_array = None;
        self.cached_shader = None;
    }
}
