use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::context::ContextBinding;
use crate::uuid::{self, Uuid};

use super::{
    AssetCtx, AssetError, AssetKind, AssetType, IndexBuffer, Vertex, VertexArray,
    VertexArrayParts, VertexBuffer,
};

struct Entry {
    kind: AssetKind,
    asset: Rc<dyn Any>,
}

/// Per-context table of assets keyed by [`Uuid`].
///
/// Every creation makes the owning context current first, so driver objects always
/// land on the right device. Lookups hand out shared handles; an asset outlives its
/// entry for as long as a handle to it is held.
pub struct AssetRegistry {
    binding: ContextBinding,
    assets: HashMap<Uuid, Entry>,
}

impl AssetRegistry {
    pub(crate) fn new(binding: ContextBinding) -> Self {
        Self {
            binding,
            assets: HashMap::new(),
        }
    }

    /// Owning context.
    pub fn context(&self) -> Uuid {
        self.binding.context()
    }

    pub(crate) fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    /// Constructs a `K` from `desc` and registers it under a fresh identifier.
    ///
    /// Nothing is inserted when construction fails.
    pub fn create<K: AssetType>(&mut self, desc: K::Desc) -> Result<Uuid, AssetError> {
        self.binding.bind();
        self.insert_new::<K>(desc).map(|(id, _)| id)
    }

    /// Registers a vertex buffer, an index buffer and a vertex array over both.
    ///
    /// Returns the vertex array's id; the buffers are separate entries reachable through
    /// [`VertexArray::vertex_buffer`] and [`VertexArray::index_buffer`].
    pub fn create_vertex_array(
        &mut self,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
    ) -> Result<Uuid, AssetError> {
        self.binding.bind();

        let (vb_id, vertices) = self.insert_new::<VertexBuffer>(vertices)?;
        let (ib_id, indices) = match self.insert_new::<IndexBuffer>(indices) {
            Ok(created) => created,
            Err(err) => {
                self.assets.remove(&vb_id);
                return Err(err);
            }
        };

        match self.insert_new::<VertexArray>(VertexArrayParts { vertices, indices }) {
            Ok((id, _)) => Ok(id),
            Err(err) => {
                self.assets.remove(&vb_id);
                self.assets.remove(&ib_id);
                Err(err)
            }
        }
    }

    /// Non-indexed variant of [`create_vertex_array`](Self::create_vertex_array).
    pub fn create_vertex_array_from_vertices(
        &mut self,
        vertices: Vec<Vertex>,
    ) -> Result<Uuid, AssetError> {
        self.create_vertex_array(vertices, Vec::new())
    }

    fn insert_new<K: AssetType>(&mut self, desc: K::Desc) -> Result<(Uuid, Rc<K>), AssetError> {
        let id = uuid::generate();
        let ctx = AssetCtx::new(id, self.binding.context(), self.binding.driver());
        let asset = Rc::new(K::construct(ctx, desc)?);

        self.assets.insert(
            id,
            Entry {
                kind: K::KIND,
                asset: Rc::clone(&asset) as Rc<dyn Any>,
            },
        );
        log::debug!("registered {} {id} on context {}", K::KIND, self.context());
        Ok((id, asset))
    }

    /// Shared handle to the asset, or `None` when absent or of another kind.
    pub fn get<K: AssetType>(&self, id: Uuid) -> Option<Rc<K>> {
        let entry = self.assets.get(&id)?;
        if entry.kind != K::KIND {
            log::trace!("asset {id} is a {}, not a {}", entry.kind, K::KIND);
            return None;
        }
        Rc::clone(&entry.asset).downcast::<K>().ok()
    }

    /// Removes the entry. Missing ids are ignored.
    ///
    /// Handles obtained earlier stay valid; the driver object goes away with the last of
    /// them. Deleting a vertex array leaves its buffers registered.
    pub fn delete(&mut self, id: Uuid) -> bool {
        match self.assets.remove(&id) {
            Some(entry) => {
                log::debug!("deleted {} {id}", entry.kind);
                true
            }
            None => {
                log::trace!("delete of unknown asset {id} ignored");
                false
            }
        }
    }

    pub fn kind_of(&self, id: Uuid) -> Option<AssetKind> {
        self.assets.get(&id).map(|e| e.kind)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.assets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.assets.keys().copied()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.assets.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::assets::testing::WGSL;
    use crate::assets::{Asset, Shader, ShaderSource, Texture2d, TextureSource};
    use crate::color::Color;
    use crate::driver::{
        BufferDesc, DrawCall, Driver, DriverError, FrameStatus, HeadlessDriver, RawHandle,
        SamplerDesc, ShaderDesc, TextureDesc,
    };

    fn registry() -> (Rc<HeadlessDriver>, AssetRegistry) {
        let headless = Rc::new(HeadlessDriver::new());
        let driver: Rc<dyn Driver> = headless.clone();
        let binding = ContextBinding::new(uuid::generate(), driver);
        (headless, AssetRegistry::new(binding))
    }

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::new([-0.5, -0.5, 0.0]),
            Vertex::new([0.5, -0.5, 0.0]),
            Vertex::new([0.0, 0.5, 0.0]),
        ]
    }

    #[test]
    fn created_vertex_buffer_round_trips() {
        let (_, mut reg) = registry();
        let id = reg.create::<VertexBuffer>(triangle()).unwrap();

        let vb = reg.get::<VertexBuffer>(id).unwrap();
        assert_eq!(vb.len(), 3);
        assert_eq!(vb.uuid(), id);
        assert_eq!(reg.kind_of(id), Some(AssetKind::VertexBuffer));
    }

    #[test]
    fn each_create_binds_the_owning_context_once() {
        let (headless, mut reg) = registry();
        let other = uuid::generate();
        headless.make_current(other);

        let before = headless.bind_count();
        reg.create::<IndexBuffer>(vec![0, 1, 2]).unwrap();
        assert_eq!(headless.bind_count(), before + 1);
        assert_eq!(headless.current(), Some(reg.context()));

        let before = headless.bind_count();
        reg.create_vertex_array(triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(headless.bind_count(), before + 1);
    }

    #[test]
    fn ids_are_unique_and_never_invalid() {
        let (_, mut reg) = registry();
        let a = reg.create::<IndexBuffer>(vec![]).unwrap();
        let b = reg.create::<IndexBuffer>(vec![]).unwrap();
        assert_ne!(a, b);
        assert!(a.is_valid() && b.is_valid());
        assert!(uuid::exists(a));
    }

    #[test]
    fn get_with_wrong_kind_is_absent() {
        let (_, mut reg) = registry();
        let id = reg.create::<IndexBuffer>(vec![1]).unwrap();
        assert!(reg.get::<VertexBuffer>(id).is_none());
        assert!(reg.get::<IndexBuffer>(id).is_some());
    }

    #[test]
    fn never_created_and_invalid_ids_are_absent() {
        let (_, reg) = registry();
        assert!(reg.get::<VertexBuffer>(Uuid::INVALID).is_none());
        assert!(reg.get::<Shader>(uuid::generate()).is_none());
        assert!(!reg.contains(Uuid::INVALID));
    }

    #[test]
    fn deleted_assets_are_absent_and_double_delete_is_noop() {
        let (_, mut reg) = registry();
        let id = reg.create::<VertexBuffer>(triangle()).unwrap();

        assert!(reg.delete(id));
        assert!(reg.get::<VertexBuffer>(id).is_none());
        assert!(!reg.delete(id));
        assert!(!reg.delete(Uuid::INVALID));
        assert!(reg.is_empty());
    }

    #[test]
    fn vertex_array_registers_three_independent_entries() {
        let (headless, mut reg) = registry();
        let va_id = reg.create_vertex_array(triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(reg.len(), 3);

        let va = reg.get::<VertexArray>(va_id).unwrap();
        let (vb_id, ib_id) = (va.vertex_buffer(), va.index_buffer());
        assert!(vb_id != ib_id && vb_id != va_id && ib_id != va_id);
        assert_eq!(reg.get::<VertexBuffer>(vb_id).unwrap().len(), 3);
        assert_eq!(reg.get::<IndexBuffer>(ib_id).unwrap().len(), 3);

        let vb_handle = va.vertices().raw_handle();

        // Composite deletion does not cascade.
        reg.delete(va_id);
        assert!(reg.contains(vb_id) && reg.contains(ib_id));

        // The handle still keeps everything alive after the buffers go too.
        reg.delete(vb_id);
        reg.delete(ib_id);
        assert_eq!(va.num_vertices(), 3);
        assert!(headless.is_live(vb_handle));

        drop(va);
        assert!(!headless.is_live(vb_handle));
        assert_eq!(headless.live_objects(), 0);
    }

    #[test]
    fn vertices_only_array_has_empty_index_buffer() {
        let (_, mut reg) = registry();
        let id = reg.create_vertex_array_from_vertices(triangle()).unwrap();
        let va = reg.get::<VertexArray>(id).unwrap();
        assert!(!va.has_indices());
        assert!(reg.get::<IndexBuffer>(va.index_buffer()).unwrap().is_empty());
    }

    #[test]
    fn failed_construction_inserts_nothing() {
        let (headless, mut reg) = registry();
        let err = reg
            .create::<Shader>(ShaderSource::wgsl("not a shader"))
            .unwrap_err();
        assert!(matches!(err, AssetError::Construction { kind: AssetKind::Shader, .. }));
        assert!(reg.is_empty());

        let err = reg
            .create::<Texture2d>(
                TextureSource::Rgba8 {
                    width: 0,
                    height: 0,
                    pixels: vec![],
                }
                .into(),
            )
            .unwrap_err();
        assert!(matches!(err, AssetError::Construction { .. }));
        assert!(reg.is_empty());
        assert_eq!(headless.live_objects(), 0);
    }

    #[test]
    fn dropping_the_registry_releases_driver_objects() {
        let (headless, mut reg) = registry();
        reg.create::<Shader>(ShaderSource::wgsl(WGSL)).unwrap();
        reg.create_vertex_array(triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(headless.live_objects(), 3);

        drop(reg);
        assert_eq!(headless.live_objects(), 0);
    }

    #[test]
    fn objects_land_on_the_owning_context() {
        let (headless, mut reg) = registry();
        let id = reg.create::<VertexBuffer>(triangle()).unwrap();
        let vb = reg.get::<VertexBuffer>(id).unwrap();
        assert_eq!(headless.owner(vb.raw_handle()), Some(reg.context()));
    }

    /// Headless driver whose `create_buffer` fails once `budget` buffers exist.
    struct BufferBudget {
        inner: HeadlessDriver,
        budget: Cell<usize>,
    }

    impl Driver for BufferBudget {
        fn make_current(&self, context: Uuid) {
            self.inner.make_current(context)
        }

        fn current(&self) -> Option<Uuid> {
            self.inner.current()
        }

        fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<RawHandle, DriverError> {
            match self.budget.get() {
                0 => Err(DriverError::NoCurrentContext),
                n => {
                    self.budget.set(n - 1);
                    self.inner.create_buffer(desc)
                }
            }
        }

        fn write_buffer(&self, handle: RawHandle, contents: &[u8]) -> Result<(), DriverError> {
            self.inner.write_buffer(handle, contents)
        }

        fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<RawHandle, DriverError> {
            self.inner.create_shader(desc)
        }

        fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<RawHandle, DriverError> {
            self.inner.create_texture(desc)
        }

        fn set_sampler(&self, handle: RawHandle, sampler: SamplerDesc) -> Result<(), DriverError> {
            self.inner.set_sampler(handle, sampler)
        }

        fn release(&self, handle: RawHandle) {
            self.inner.release(handle)
        }

        fn begin_frame(&self, context: Uuid, clear: Color) -> Result<FrameStatus, DriverError> {
            self.inner.begin_frame(context, clear)
        }

        fn draw(&self, call: &DrawCall<'_>) -> Result<(), DriverError> {
            self.inner.draw(call)
        }

        fn end_frame(&self, context: Uuid) -> Result<(), DriverError> {
            self.inner.end_frame(context)
        }
    }

    #[test]
    fn failed_index_buffer_rolls_back_the_vertex_buffer() {
        let driver = Rc::new(BufferBudget {
            inner: HeadlessDriver::new(),
            budget: Cell::new(1),
        });
        let binding = ContextBinding::new(uuid::generate(), driver.clone() as Rc<dyn Driver>);
        let mut reg = AssetRegistry::new(binding);

        let err = reg.create_vertex_array(triangle(), vec![0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            AssetError::Construction {
                kind: AssetKind::IndexBuffer,
                ..
            }
        ));
        assert_eq!(reg.len(), 0);
        assert_eq!(driver.inner.live_objects(), 0);

        // Nothing leaked into the registry, so a retry with room succeeds cleanly.
        driver.budget.set(2);
        let id = reg.create_vertex_array(triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get::<VertexArray>(id).unwrap().num_indices(), 3);
    }
}
