use std::rc::Rc;

use crate::driver::DriverError;
use crate::uuid::Uuid;

use super::{Asset, AssetCtx, AssetError, AssetKind, AssetType, IndexBuffer, Vertex, VertexBuffer};

/// Buffers a vertex array is assembled from.
pub struct VertexArrayParts {
    pub vertices: Rc<VertexBuffer>,
    pub indices: Rc<IndexBuffer>,
}

/// A drawable pairing of one vertex buffer and one (possibly empty) index buffer.
///
/// Both buffers are separate registry entries; the array keeps them alive through
/// shared handles for as long as it exists.
pub struct VertexArray {
    uuid: Uuid,
    vertices: Rc<VertexBuffer>,
    indices: Rc<IndexBuffer>,
}

impl VertexArray {
    /// Registry id of the vertex buffer.
    pub fn vertex_buffer(&self) -> Uuid {
        self.vertices.uuid()
    }

    /// Registry id of the index buffer.
    pub fn index_buffer(&self) -> Uuid {
        self.indices.uuid()
    }

    pub fn vertices(&self) -> &Rc<VertexBuffer> {
        &self.vertices
    }

    pub fn indices(&self) -> &Rc<IndexBuffer> {
        &self.indices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    /// Whether draws go through the index buffer.
    pub fn has_indices(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn set_vertices(&self, vertices: Vec<Vertex>) {
        self.vertices.set_vertices(vertices);
    }

    pub fn set_indices(&self, indices: Vec<u32>) {
        self.indices.set_indices(indices);
    }

    /// Uploads both buffers.
    pub fn sync(&self) -> Result<(), DriverError> {
        self.vertices.sync()?;
        self.indices.sync()
    }
}

impl Asset for VertexArray {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> AssetKind {
        Self::KIND
    }
}

impl AssetType for VertexArray {
    const KIND: AssetKind = AssetKind::VertexArray;
    type Desc = VertexArrayParts;

    fn construct(ctx: AssetCtx<'_>, parts: VertexArrayParts) -> Result<Self, AssetError> {
        Ok(Self {
            uuid: ctx.uuid(),
            vertices: parts.vertices,
            indices: parts.indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::testing::bound_driver;

    #[test]
    fn counts_follow_the_buffers() {
        let (headless, driver, context) = bound_driver();
        let ctx = || AssetCtx::new(crate::uuid::generate(), context, &driver);

        let vertices = Rc::new(VertexBuffer::construct(ctx(), vec![Vertex::default(); 4]).unwrap());
        let indices = Rc::new(IndexBuffer::construct(ctx(), vec![]).unwrap());
        let va = VertexArray::construct(
            ctx(),
            VertexArrayParts {
                vertices: Rc::clone(&vertices),
                indices: Rc::clone(&indices),
            },
        )
        .unwrap();

        assert_eq!(va.vertex_buffer(), vertices.uuid());
        assert_eq!(va.index_buffer(), indices.uuid());
        assert_eq!(va.num_vertices(), 4);
        assert!(!va.has_indices());

        va.set_indices(vec![0, 1, 2, 2, 3, 0]);
        assert!(va.has_indices());
        assert_eq!(indices.len(), 6);

        va.sync().unwrap();
        assert_eq!(headless.buffer_contents(indices.raw_handle()).unwrap().len(), 24);
    }
}
