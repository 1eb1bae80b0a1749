//! wgpu-backed [`Driver`].
//!
//! Every attached window gets its own adapter, device and surface ("slot"). Objects
//! live on the device of the context that was current when they were created.

mod init;
mod pipeline;
mod slot;
mod surface;

pub use init::GpuInit;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::color::Color;
use crate::uuid::Uuid;

use super::handle::HandleAllocator;
use super::{
    BufferDesc, BufferUsage, DrawCall, Driver, DriverError, FrameStatus, RawHandle, SamplerDesc,
    ShaderBindings, ShaderDesc, TextureDesc,
};
use slot::GpuSlot;

enum GpuObject {
    Buffer {
        buffer: wgpu::Buffer,
        usage: BufferUsage,
    },
    Shader {
        module: wgpu::ShaderModule,
        pipeline: Option<wgpu::RenderPipeline>,
        bindings: ShaderBindings,
    },
    Texture {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
        sampler: wgpu::Sampler,
    },
}

impl GpuObject {
    fn name(&self) -> &'static str {
        match self {
            Self::Buffer { .. } => "buffer",
            Self::Shader { .. } => "shader",
            Self::Texture { .. } => "texture",
        }
    }
}

struct Owned {
    context: Uuid,
    object: GpuObject,
}

pub struct WgpuDriver {
    instance: wgpu::Instance,
    init: GpuInit,
    current: Cell<Option<Uuid>>,
    slots: RefCell<HashMap<Uuid, GpuSlot>>,
    objects: RefCell<HashMap<RawHandle, Owned>>,
    handles: RefCell<HandleAllocator>,
}

impl WgpuDriver {
    pub fn new(init: GpuInit) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        Self {
            instance,
            init,
            current: Cell::new(None),
            slots: RefCell::new(HashMap::new()),
            objects: RefCell::new(HashMap::new()),
            handles: RefCell::new(HandleAllocator::default()),
        }
    }

    /// Creates the device and surface backing `context`.
    ///
    /// Adapter and device acquisition is asynchronous under wgpu; this blocks on it.
    pub fn attach_window(&self, context: Uuid, window: Arc<Window>) -> Result<()> {
        let slot = pollster::block_on(GpuSlot::new(&self.instance, window, &self.init))?;
        log::debug!("context {context} attached ({:?})", slot.format());
        self.slots.borrow_mut().insert(context, slot);
        Ok(())
    }

    pub fn resize(&self, context: Uuid, size: PhysicalSize<u32>) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(&context) {
            slot.resize(size);
        }
    }

    fn require_current(&self) -> Result<Uuid, DriverError> {
        self.current.get().ok_or(DriverError::NoCurrentContext)
    }

    fn insert(&self, context: Uuid, object: GpuObject) -> RawHandle {
        let handle = self.handles.borrow_mut().next();
        log::trace!("{} {handle} created on context {context}", object.name());
        self.objects
            .borrow_mut()
            .insert(handle, Owned { context, object });
        handle
    }
}

/// Copies `contents` into a buffer-sized allocation when wgpu's 4-byte copy
/// alignment is not met.
fn padded(contents: &[u8]) -> std::borrow::Cow<'_, [u8]> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    let len = contents.len().max(align).next_multiple_of(align);
    if len == contents.len() {
        contents.into()
    } else {
        let mut v = contents.to_vec();
        v.resize(len, 0);
        v.into()
    }
}

fn buffer_usages(usage: BufferUsage) -> wgpu::BufferUsages {
    let bind = match usage {
        BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        BufferUsage::Index => wgpu::BufferUsages::INDEX,
    };
    bind | wgpu::BufferUsages::COPY_DST
}

fn lookup<'a>(
    objects: &'a HashMap<RawHandle, Owned>,
    context: Uuid,
    handle: RawHandle,
) -> Result<&'a GpuObject, DriverError> {
    let owned = objects
        .get(&handle)
        .ok_or(DriverError::UnknownHandle(handle))?;
    if owned.context != context {
        return Err(DriverError::ForeignHandle(handle));
    }
    Ok(&owned.object)
}

impl Driver for WgpuDriver {
    fn make_current(&self, context: Uuid) {
        self.current.set(Some(context));
    }

    fn current(&self) -> Option<Uuid> {
        self.current.get()
    }

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<RawHandle, DriverError> {
        let context = self.require_current()?;
        let buffer = {
            let slots = self.slots.borrow();
            let slot = slots
                .get(&context)
                .ok_or(DriverError::UnknownContext(context))?;
            slot.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: desc.label,
                    contents: &padded(desc.contents),
                    usage: buffer_usages(desc.usage),
                })
        };

        Ok(self.insert(
            context,
            GpuObject::Buffer {
                buffer,
                usage: desc.usage,
            },
        ))
    }

    fn write_buffer(&self, handle: RawHandle, contents: &[u8]) -> Result<(), DriverError> {
        let mut objects = self.objects.borrow_mut();
        let owned = objects
            .get_mut(&handle)
            .ok_or(DriverError::UnknownHandle(handle))?;
        let GpuObject::Buffer { buffer, usage } = &mut owned.object else {
            return Err(DriverError::WrongObject(handle, "buffer"));
        };

        let slots = self.slots.borrow();
        let slot = slots
            .get(&owned.context)
            .ok_or(DriverError::UnknownContext(owned.context))?;

        let data = padded(contents);
        if data.len() as u64 > buffer.size() {
            *buffer = slot
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("kiln resized buffer"),
                    contents: &data,
                    usage: buffer_usages(*usage),
                });
        } else {
            slot.queue.write_buffer(buffer, 0, &data);
        }
        Ok(())
    }

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<RawHandle, DriverError> {
        let context = self.require_current()?;

        let source = desc.module_source().into_owned();
        let bindings = ShaderBindings::scan(&source);

        let module = {
            let slots = self.slots.borrow();
            let slot = slots
                .get(&context)
                .ok_or(DriverError::UnknownContext(context))?;

            let scope = slot.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = slot
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: desc.label,
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });
            if let Some(err) = pollster::block_on(scope.pop()) {
                return Err(DriverError::ShaderCompilation(err.to_string()));
            }
            module
        };

        Ok(self.insert(
            context,
            GpuObject::Shader {
                module,
                pipeline: None,
                bindings,
            },
        ))
    }

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<RawHandle, DriverError> {
        let context = self.require_current()?;
        desc.validate()?;

        let object = {
            let slots = self.slots.borrow();
            let slot = slots
                .get(&context)
                .ok_or(DriverError::UnknownContext(context))?;

            let size = wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            };
            let texture = slot.device.create_texture(&wgpu::TextureDescriptor {
                label: desc.label,
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            slot.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                desc.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * desc.width),
                    rows_per_image: Some(desc.height),
                },
                size,
            );

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = slot
                .device
                .create_sampler(&pipeline::sampler_descriptor(desc.sampler));
            GpuObject::Texture {
                texture,
                view,
                sampler,
            }
        };

        Ok(self.insert(context, object))
    }

    fn set_sampler(&self, handle: RawHandle, desc: SamplerDesc) -> Result<(), DriverError> {
        let mut objects = self.objects.borrow_mut();
        let owned = objects
            .get_mut(&handle)
            .ok_or(DriverError::UnknownHandle(handle))?;
        let GpuObject::Texture { sampler, .. } = &mut owned.object else {
            return Err(DriverError::WrongObject(handle, "texture"));
        };

        let slots = self.slots.borrow();
        let slot = slots
            .get(&owned.context)
            .ok_or(DriverError::UnknownContext(owned.context))?;
        *sampler = slot
            .device
            .create_sampler(&pipeline::sampler_descriptor(desc));
        Ok(())
    }

    fn release(&self, handle: RawHandle) {
        if let Some(owned) = self.objects.borrow_mut().remove(&handle) {
            if let GpuObject::Texture { texture, .. } = &owned.object {
                texture.destroy();
            }
            log::trace!("released {} {handle}", owned.object.name());
        }
    }

    fn begin_frame(&self, context: Uuid, clear: Color) -> Result<FrameStatus, DriverError> {
        let mut slots = self.slots.borrow_mut();
        let slot = slots
            .get_mut(&context)
            .ok_or(DriverError::UnknownContext(context))?;
        slot.begin_frame(clear)
    }

    fn draw(&self, call: &DrawCall<'_>) -> Result<(), DriverError> {
        let context = self.require_current()?;
        let mut slots = self.slots.borrow_mut();
        let slot = slots
            .get_mut(&context)
            .ok_or(DriverError::UnknownContext(context))?;
        let format = slot.format();

        let mut objects = self.objects.borrow_mut();

        // Build the pipeline on first use; the surface format never changes for a slot.
        match objects.get_mut(&call.shader) {
            Some(Owned {
                context: owner,
                object: GpuObject::Shader { module, pipeline, .. },
            }) if *owner == context => {
                if pipeline.is_none() {
                    *pipeline = Some(pipeline::build_pipeline(&slot.device, module, format));
                }
            }
            Some(Owned { context: owner, .. }) if *owner != context => {
                return Err(DriverError::ForeignHandle(call.shader));
            }
            Some(_) => return Err(DriverError::WrongObject(call.shader, "shader")),
            None => return Err(DriverError::UnknownHandle(call.shader)),
        }

        let objects = &*objects;
        let Some(GpuObject::Shader {
            pipeline: Some(pipeline),
            bindings,
            ..
        }) = objects.get(&call.shader).map(|o| &o.object)
        else {
            return Err(DriverError::WrongObject(call.shader, "shader"));
        };
        // An unbound group is only reported by wgpu when the frame is submitted.
        bindings.check(call)?;

        let GpuObject::Buffer {
            buffer: vertex_buffer,
            ..
        } = lookup(objects, context, call.vertex_buffer)?
        else {
            return Err(DriverError::WrongObject(call.vertex_buffer, "buffer"));
        };

        let index_buffer = match call.index_buffer {
            Some(h) => match lookup(objects, context, h)? {
                GpuObject::Buffer { buffer, .. } => Some(buffer),
                _ => return Err(DriverError::WrongObject(h, "buffer")),
            },
            None => None,
        };

        let mut texture_entries = Vec::with_capacity(call.textures.len() * 2);
        for (i, &h) in call.textures.iter().enumerate() {
            let GpuObject::Texture { view, sampler, .. } = lookup(objects, context, h)? else {
                return Err(DriverError::WrongObject(h, "texture"));
            };
            texture_entries.push(wgpu::BindGroupEntry {
                binding: 2 * i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
            texture_entries.push(wgpu::BindGroupEntry {
                binding: 2 * i as u32 + 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        let Some(frame) = slot.frame.as_mut() else {
            return Err(DriverError::NoFrame(context));
        };
        if call.count == 0 {
            return Ok(());
        }

        // Catches errors raised while recording; pass-level mismatches surface at
        // `end_frame`.
        let scope = slot.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_group = (!call.uniforms.is_empty()).then(|| {
            let ubo = slot
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("kiln uniform block"),
                    contents: call.uniforms,
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            slot.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("kiln uniform bind group"),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            })
        });

        let texture_group = (!texture_entries.is_empty()).then(|| {
            slot.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("kiln texture bind group"),
                layout: &pipeline.get_bind_group_layout(1),
                entries: &texture_entries,
            })
        });

        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kiln draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(pipeline);
            if let Some(group) = &uniform_group {
                pass.set_bind_group(0, group, &[]);
            }
            if let Some(group) = &texture_group {
                pass.set_bind_group(1, group, &[]);
            }
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));

            match index_buffer {
                Some(ibo) => {
                    pass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..call.count, 0, 0..1);
                }
                None => pass.draw(0..call.count, 0..1),
            }
        }

        match pollster::block_on(scope.pop()) {
            Some(err) => Err(DriverError::InvalidDraw(err.to_string())),
            None => Ok(()),
        }
    }

    fn end_frame(&self, context: Uuid) -> Result<(), DriverError> {
        let mut slots = self.slots.borrow_mut();
        let slot = slots
            .get_mut(&context)
            .ok_or(DriverError::UnknownContext(context))?;
        slot.end_frame(context)
    }

    fn detach(&self, context: Uuid) {
        // Objects of a destroyed context die with its device.
        self.objects
            .borrow_mut()
            .retain(|_, owned| owned.context != context);
        if self.slots.borrow_mut().remove(&context).is_some() {
            log::debug!("context {context} detached");
        }
        if self.current.get() == Some(context) {
            self.current.set(None);
        }
    }
}
