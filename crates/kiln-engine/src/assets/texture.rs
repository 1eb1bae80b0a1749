use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::driver::{Driver, DriverError, FilterMode, RawHandle, SamplerDesc, TextureDesc, WrapMode};
use crate::uuid::Uuid;

use super::{Asset, AssetCtx, AssetError, AssetKind, AssetType};

/// Pixel data for a [`Texture2d`].
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Image file in any format `image` was built with (PNG, JPEG, BMP, TGA).
    File(PathBuf),
    /// Tightly packed RGBA8 rows, top row first.
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

impl TextureSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    fn decode(self) -> Result<(u32, u32, Vec<u8>), AssetError> {
        match self {
            Self::Rgba8 {
                width,
                height,
                pixels,
            } => Ok((width, height, pixels)),
            Self::File(path) => {
                let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
                    path: path.clone(),
                    source,
                })?;
                let image = image::load_from_memory(&bytes)
                    .map_err(|source| AssetError::Decode { path, source })?
                    .to_rgba8();
                let (width, height) = image.dimensions();
                Ok((width, height, image.into_raw()))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Texture2dDesc {
    pub source: TextureSource,
    pub sampler: SamplerDesc,
}

impl Texture2dDesc {
    pub fn new(source: TextureSource) -> Self {
        Self {
            source,
            sampler: SamplerDesc::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerDesc) -> Self {
        self.sampler = sampler;
        self
    }
}

impl From<TextureSource> for Texture2dDesc {
    fn from(source: TextureSource) -> Self {
        Self::new(source)
    }
}

/// Sampled 2D RGBA texture.
pub struct Texture2d {
    uuid: Uuid,
    driver: Rc<dyn Driver>,
    handle: RawHandle,
    width: u32,
    height: u32,
    sampler: Cell<SamplerDesc>,
}

impl Texture2d {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sampler(&self) -> SamplerDesc {
        self.sampler.get()
    }

    pub fn set_sampler(&self, sampler: SamplerDesc) -> Result<(), DriverError> {
        self.driver.set_sampler(self.handle, sampler)?;
        self.sampler.set(sampler);
        Ok(())
    }

    pub fn set_min_filter(&self, filter: FilterMode) -> Result<(), DriverError> {
        self.set_sampler(SamplerDesc {
            min_filter: filter,
            ..self.sampler()
        })
    }

    pub fn set_mag_filter(&self, filter: FilterMode) -> Result<(), DriverError> {
        self.set_sampler(SamplerDesc {
            mag_filter: filter,
            ..self.sampler()
        })
    }

    pub fn set_wrap_s(&self, wrap: WrapMode) -> Result<(), DriverError> {
        self.set_sampler(SamplerDesc {
            wrap_s: wrap,
            ..self.sampler()
        })
    }

    pub fn set_wrap_t(&self, wrap: WrapMode) -> Result<(), DriverError> {
        self.set_sampler(SamplerDesc {
            wrap_t: wrap,
            ..self.sampler()
        })
    }

    pub fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl Drop for Texture2d {
    fn drop(&mut self) {
        self.driver.release(self.handle);
    }
}

impl Asset for Texture2d {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> AssetKind {
        Self::KIND
    }
}

impl AssetType for Texture2d {
    const KIND: AssetKind = AssetKind::Texture2d;
    type Desc = Texture2dDesc;

    fn construct(ctx: AssetCtx<'_>, desc: Texture2dDesc) -> Result<Self, AssetError> {
        let (width, height, pixels) = desc.source.decode()?;

        let label = format!("texture {}", ctx.uuid());
        let handle = ctx
            .driver()
            .create_texture(&TextureDesc {
                label: Some(&label),
                width,
                height,
                pixels: &pixels,
                sampler: desc.sampler,
            })
            .map_err(AssetError::construction(Self::KIND))?;

        Ok(Self {
            uuid: ctx.uuid(),
            driver: Rc::clone(ctx.driver()),
            handle,
            width,
            height,
            sampler: Cell::new(desc.sampler),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::testing::bound_driver;
    use crate::driver::HeadlessObject;

    fn checker() -> TextureSource {
        TextureSource::Rgba8 {
            width: 2,
            height: 2,
            pixels: vec![255; 16],
        }
    }

    #[test]
    fn sampler_updates_reach_the_driver() {
        let (headless, driver, context) = bound_driver();
        let ctx = AssetCtx::new(crate::uuid::generate(), context, &driver);
        let tex = Texture2d::construct(ctx, checker().into()).unwrap();
        assert_eq!((tex.width(), tex.height()), (2, 2));

        tex.set_min_filter(FilterMode::Nearest).unwrap();
        tex.set_wrap_t(WrapMode::ClampToEdge).unwrap();

        let expected = SamplerDesc {
            min_filter: FilterMode::Nearest,
            wrap_t: WrapMode::ClampToEdge,
            ..SamplerDesc::default()
        };
        assert_eq!(tex.sampler(), expected);
        assert_eq!(
            headless.object(tex.raw_handle()),
            Some(HeadlessObject::Texture {
                width: 2,
                height: 2,
                sampler: expected
            })
        );
    }

    #[test]
    fn short_pixel_data_is_a_construction_error() {
        let (_, driver, context) = bound_driver();
        let ctx = AssetCtx::new(crate::uuid::generate(), context, &driver);
        let source = TextureSource::Rgba8 {
            width: 4,
            height: 4,
            pixels: vec![0; 8],
        };
        let err = Texture2d::construct(ctx, source.into()).err().unwrap();
        assert!(matches!(
            err,
            AssetError::Construction {
                kind: AssetKind::Texture2d,
                source: DriverError::InvalidTexture(_)
            }
        ));
    }

    #[test]
    fn encoded_images_are_decoded() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(3, 1, image::Rgba([1, 2, 3, 4]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let path = std::env::temp_dir().join(format!("kiln-{}.png", crate::uuid::generate()));
        std::fs::write(&path, &png).unwrap();

        let (_, driver, context) = bound_driver();
        let ctx = AssetCtx::new(crate::uuid::generate(), context, &driver);
        let tex = Texture2d::construct(ctx, TextureSource::file(&path).into()).unwrap();
        assert_eq!((tex.width(), tex.height()), (3, 1));

        let _ = std::fs::remove_file(path);
    }
}
