use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::color::Color;
use crate::driver::{DriverError, FrameStatus};
use crate::uuid::Uuid;

use super::GpuInit;
use super::surface::{self, SurfaceErrorAction};

/// An acquired swapchain image with its command encoder.
///
/// Holding the surface texture prevents acquisition of subsequent frames, so a
/// frame lives only between `begin_frame` and `end_frame`.
pub(super) struct GpuFrame {
    pub(super) surface_texture: wgpu::SurfaceTexture,
    pub(super) view: wgpu::TextureView,
    pub(super) encoder: wgpu::CommandEncoder,
}

/// Device, queue and surface owned by one context.
pub(super) struct GpuSlot {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    pub(super) device: wgpu::Device,
    pub(super) queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    pub(super) frame: Option<GpuFrame>,
}

impl GpuSlot {
    pub(super) async fn new(
        instance: &wgpu::Instance,
        window: Arc<Window>,
        init: &GpuInit,
    ) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        // The surface holds its own `Arc` to the window, hence `'static`.
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        log::info!("gpu adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kiln-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        // Errors outside a scope would otherwise abort the process.
        device.on_uncaptured_error(Arc::new(|e| {
            log::error!("uncaptured wgpu error: {e}");
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            frame: None,
        })
    }

    pub(super) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(super) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Acquires the next swapchain image and clears it.
    pub(super) fn begin_frame(&mut self, clear: Color) -> Result<FrameStatus, DriverError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Ok(FrameStatus::Skipped);
        }

        // A frame that was never ended is discarded with its surface texture.
        self.frame = None;

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                let action = surface::map_surface_error(
                    &self.surface,
                    &self.device,
                    &self.config,
                    self.size,
                    &err,
                );
                return match action {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        log::debug!("skipping frame: {err}");
                        Ok(FrameStatus::Skipped)
                    }
                    SurfaceErrorAction::Fatal => Err(DriverError::Surface(err.to_string())),
                };
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kiln frame encoder"),
            });

        let [r, g, b, a] = clear.normalized();
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kiln clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.frame = Some(GpuFrame {
            surface_texture,
            view,
            encoder,
        });
        Ok(FrameStatus::Ready)
    }

    /// Submits the recorded commands and presents the image.
    ///
    /// Render pass validation is deferred by wgpu until the encoder is finished, so
    /// binding mismatches in this frame's draws are reported here.
    pub(super) fn end_frame(&mut self, context: Uuid) -> Result<(), DriverError> {
        let frame = self.frame.take().ok_or(DriverError::NoFrame(context))?;
        self.window.pre_present_notify();

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        let error = pollster::block_on(scope.pop());

        // The image goes back to the swapchain either way.
        frame.surface_texture.present();

        submission_result(error)
    }
}

fn submission_result(error: Option<wgpu::Error>) -> Result<(), DriverError> {
    match error {
        Some(err) => {
            log::error!("frame submission failed: {err}");
            Err(DriverError::InvalidDraw(err.to_string()))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_validation_errors_become_driver_errors() {
        assert_eq!(submission_result(None), Ok(()));

        let source: Box<dyn std::error::Error + Send + Sync> = "missing bind group".into();
        let err = wgpu::Error::Validation {
            source,
            description: "bind group at index 0 is not set".to_string(),
        };
        let Err(DriverError::InvalidDraw(message)) = submission_result(Some(err)) else {
            panic!("expected an invalid draw");
        };
        assert!(message.contains("bind group at index 0"));
    }
}
