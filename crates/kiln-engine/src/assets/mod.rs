//! UUID-keyed GPU assets.
//!
//! Every asset lives in the [`AssetRegistry`] of the context it was created on and is
//! handed out as a shared `Rc`. Driver objects are released when the last handle drops.

mod asset;
mod buffer;
mod error;
mod registry;
mod shader;
mod texture;
mod vertex;
mod vertex_array;

pub use asset::{Asset, AssetCtx, AssetKind, AssetType};
pub use buffer::{IndexBuffer, VertexBuffer};
pub use error::AssetError;
pub use registry::AssetRegistry;
pub use shader::{Shader, ShaderSource, UniformValue};
pub use texture::{Texture2d, Texture2dDesc, TextureSource};
pub use vertex::Vertex;
pub use vertex_array::{VertexArray, VertexArrayParts};
