use std::cell::{Ref, RefCell};
use std::rc::Rc;

use bytemuck::Pod;

use crate::driver::{BufferDesc, BufferUsage, Driver, DriverError, RawHandle};
use crate::uuid::Uuid;

use super::{Asset, AssetCtx, AssetError, AssetKind, AssetType, Vertex};

/// CPU copy of a buffer plus the driver object mirroring it.
struct Storage<T: Pod> {
    driver: Rc<dyn Driver>,
    handle: RawHandle,
    data: RefCell<Vec<T>>,
}

impl<T: Pod> Storage<T> {
    fn new(
        ctx: &AssetCtx<'_>,
        kind: AssetKind,
        usage: BufferUsage,
        data: Vec<T>,
    ) -> Result<Self, AssetError> {
        let label = format!("{kind} {}", ctx.uuid());
        let handle = ctx
            .driver()
            .create_buffer(&BufferDesc {
                label: Some(&label),
                usage,
                contents: bytemuck::cast_slice(&data),
            })
            .map_err(AssetError::construction(kind))?;

        Ok(Self {
            driver: Rc::clone(ctx.driver()),
            handle,
            data: RefCell::new(data),
        })
    }

    fn get(&self) -> Ref<'_, [T]> {
        Ref::map(self.data.borrow(), Vec::as_slice)
    }

    fn len(&self) -> usize {
        self.data.borrow().len()
    }

    fn set(&self, data: Vec<T>) {
        *self.data.borrow_mut() = data;
    }

    fn sync(&self) -> Result<(), DriverError> {
        self.driver
            .write_buffer(self.handle, bytemuck::cast_slice(&self.data.borrow()))
    }
}

impl<T: Pod> Drop for Storage<T> {
    fn drop(&mut self) {
        self.driver.release(self.handle);
    }
}

/// Vertex data on the GPU.
///
/// `set_vertices` only touches the CPU copy; call [`sync`](Self::sync) to upload.
pub struct VertexBuffer {
    uuid: Uuid,
    storage: Storage<Vertex>,
}

impl VertexBuffer {
    pub fn vertices(&self) -> Ref<'_, [Vertex]> {
        self.storage.get()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_vertices(&self, vertices: Vec<Vertex>) {
        self.storage.set(vertices);
    }

    pub fn sync(&self) -> Result<(), DriverError> {
        self.storage.sync()
    }

    pub fn raw_handle(&self) -> RawHandle {
        self.storage.handle
    }
}

impl Asset for VertexBuffer {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> AssetKind {
        Self::KIND
    }
}

impl AssetType for VertexBuffer {
    const KIND: AssetKind = AssetKind::VertexBuffer;
    type Desc = Vec<Vertex>;

    fn construct(ctx: AssetCtx<'_>, vertices: Vec<Vertex>) -> Result<Self, AssetError> {
        Ok(Self {
            uuid: ctx.uuid(),
            storage: Storage::new(&ctx, Self::KIND, BufferUsage::Vertex, vertices)?,
        })
    }
}

/// 32-bit index data on the GPU.
pub struct IndexBuffer {
    uuid: Uuid,
    storage: Storage<u32>,
}

impl IndexBuffer {
    pub fn indices(&self) -> Ref<'_, [u32]> {
        self.storage.get()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_indices(&self, indices: Vec<u32>) {
        self.storage.set(indices);
    }

    pub fn sync(&self) -> Result<(), DriverError> {
        self.storage.sync()
    }

    pub fn raw_handle(&self) -> RawHandle {
        self.storage.handle
    }
}

impl Asset for IndexBuffer {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> AssetKind {
        Self::KIND
    }
}

impl AssetType for IndexBuffer {
    const KIND: AssetKind = AssetKind::IndexBuffer;
    type Desc = Vec<u32>;

    fn construct(ctx: AssetCtx<'_>, indices: Vec<u32>) -> Result<Self, AssetError> {
        Ok(Self {
            uuid: ctx.uuid(),
            storage: Storage::new(&ctx, Self::KIND, BufferUsage::Index, indices)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::testing::bound_driver;
    use crate::driver::HeadlessDriver;

    #[test]
    fn upload_happens_on_construction_and_sync() {
        let (headless, driver, context) = bound_driver();
        let id = crate::uuid::generate();
        let ib = IndexBuffer::construct(AssetCtx::new(id, context, &driver), vec![0, 1, 2]).unwrap();

        let uploaded = headless.buffer_contents(ib.raw_handle()).unwrap();
        assert_eq!(uploaded, bytemuck::cast_slice::<u32, u8>(&[0, 1, 2]));

        ib.set_indices(vec![7]);
        assert_eq!(&*ib.indices(), &[7]);
        // CPU side only until synced.
        assert_eq!(headless.buffer_contents(ib.raw_handle()).unwrap().len(), 12);

        ib.sync().unwrap();
        assert_eq!(headless.buffer_contents(ib.raw_handle()).unwrap(), 7u32.to_ne_bytes());
    }

    #[test]
    fn dropping_releases_driver_object() {
        let (headless, driver, context) = bound_driver();
        let vb = VertexBuffer::construct(
            AssetCtx::new(crate::uuid::generate(), context, &driver),
            vec![Vertex::default(); 3],
        )
        .unwrap();
        let handle = vb.raw_handle();
        assert_eq!(vb.len(), 3);
        assert!(headless.is_live(handle));

        drop(vb);
        assert!(!headless.is_live(handle));
    }

    #[test]
    fn construction_without_current_context_fails() {
        let headless = Rc::new(HeadlessDriver::new());
        let driver: Rc<dyn Driver> = headless;
        let ctx = AssetCtx::new(crate::uuid::generate(), crate::uuid::generate(), &driver);
        let err = VertexBuffer::construct(ctx, vec![])
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AssetError::Construction {
                kind: AssetKind::VertexBuffer,
                source: DriverError::NoCurrentContext
            }
        ));
    }
}
