use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::driver::Driver;
use crate::uuid::Uuid;

use super::AssetError;

/// Tag identifying the concrete type behind a registry entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AssetKind {
    VertexBuffer,
    IndexBuffer,
    VertexArray,
    Shader,
    Texture2d,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VertexBuffer => "vertex buffer",
            Self::IndexBuffer => "index buffer",
            Self::VertexArray => "vertex array",
            Self::Shader => "shader",
            Self::Texture2d => "texture",
        };
        f.write_str(name)
    }
}

/// Anything the registry can own.
///
/// The identifier is fixed at construction; the rest of an asset's state may change
/// through `&self` methods.
pub trait Asset: Any {
    fn uuid(&self) -> Uuid;
    fn kind(&self) -> AssetKind;
}

/// A concrete asset type constructible by [`AssetRegistry::create`].
///
/// [`AssetRegistry::create`]: super::AssetRegistry::create
pub trait AssetType: Asset + Sized {
    const KIND: AssetKind;

    /// Caller-supplied arguments.
    type Desc;

    fn construct(ctx: AssetCtx<'_>, desc: Self::Desc) -> Result<Self, AssetError>;
}

/// Construction capability handed out by the registry.
///
/// Only the registry can build one, which keeps asset creation (and identifier
/// assignment) behind [`AssetRegistry::create`](super::AssetRegistry::create).
pub struct AssetCtx<'a> {
    uuid: Uuid,
    context: Uuid,
    driver: &'a Rc<dyn Driver>,
}

impl<'a> AssetCtx<'a> {
    pub(super) fn new(uuid: Uuid, context: Uuid, driver: &'a Rc<dyn Driver>) -> Self {
        Self {
            uuid,
            context,
            driver,
        }
    }

    /// Identifier reserved for the asset under construction.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Owning context.
    pub fn context(&self) -> Uuid {
        self.context
    }

    /// Driver of the owning context. The context is current during construction.
    pub fn driver(&self) -> &'a Rc<dyn Driver> {
        self.driver
    }
}
