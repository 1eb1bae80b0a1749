use kiln_engine::assets::{Shader, ShaderSource, Texture2d, Texture2dDesc, TextureSource, Vertex};
use kiln_engine::color::Color;
use kiln_engine::context::{ContextProperties, RenderContext, WindowProperties};
use kiln_engine::core::{App, AppControl, FrameCtx};
use kiln_engine::driver::{FilterMode, GpuInit, SamplerDesc};
use kiln_engine::input::KeyCode;
use kiln_engine::logging::{LoggingConfig, init_logging};
use kiln_engine::uuid::Uuid;
use kiln_engine::window::Runtime;

const CHECKER_SIZE: u32 = 8;

/// Handles registered in one window's context.
struct Scene {
    context: Uuid,
    triangle: Uuid,
    quad: Uuid,
    flat: Uuid,
    textured: Uuid,
    checker: Uuid,
    elapsed: f32,
}

#[derive(Default)]
struct Studio {
    scenes: Vec<Scene>,
}

impl App for Studio {
    fn on_start(&mut self, context: &mut RenderContext) -> anyhow::Result<()> {
        let assets = context.assets_mut();

        let triangle = assets.create_vertex_array(
            vec![
                Vertex::new([-0.5, -0.5, 0.0]).with_tex_coords([0.0, 0.0]),
                Vertex::new([0.5, -0.5, 0.0]).with_tex_coords([1.0, 0.0]),
                Vertex::new([0.0, 0.5, 0.0]).with_tex_coords([0.5, 1.0]),
            ],
            vec![0, 1, 2],
        )?;

        let quad = assets.create_vertex_array(
            vec![
                Vertex::new([-1.0, -1.0, 0.0]).with_tex_coords([0.0, 1.0]),
                Vertex::new([1.0, -1.0, 0.0]).with_tex_coords([1.0, 1.0]),
                Vertex::new([1.0, 1.0, 0.0]).with_tex_coords([1.0, 0.0]),
                Vertex::new([-1.0, 1.0, 0.0]).with_tex_coords([0.0, 0.0]),
            ],
            vec![0, 1, 2, 2, 3, 0],
        )?;

        let flat = assets.create::<Shader>(ShaderSource::wgsl(include_str!("shaders/triangle.wgsl")))?;
        let textured =
            assets.create::<Shader>(ShaderSource::wgsl(include_str!("shaders/textured.wgsl")))?;

        let checker = assets.create::<Texture2d>(
            Texture2dDesc::new(checkerboard(CHECKER_SIZE)).with_sampler(SamplerDesc {
                min_filter: FilterMode::Nearest,
                mag_filter: FilterMode::Nearest,
                ..SamplerDesc::default()
            }),
        )?;

        if let Some(shader) = assets.get::<Shader>(textured) {
            shader.set_uniform("u_tint", Color::white());
        }

        log::info!("scene ready on context {}", context.uuid());
        self.scenes.push(Scene {
            context: context.uuid(),
            triangle,
            quad,
            flat,
            textured,
            checker,
            elapsed: 0.0,
        });
        Ok(())
    }

    fn on_stop(&mut self, context: &mut RenderContext) {
        self.scenes.retain(|s| s.context != context.uuid());
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        if ctx.input.is_key_pressed(KeyCode::Escape) {
            return AppControl::Exit;
        }
        if ctx.input.is_key_pressed(KeyCode::N) {
            ctx.runtime.create_window(ContextProperties::new(
                WindowProperties::new("kiln studio (extra)", 640, 480),
                Color::rgb(40, 20, 60),
            ));
        }

        let context = ctx.context.uuid();
        let Some(scene) = self.scenes.iter_mut().find(|s| s.context == context) else {
            return AppControl::Continue;
        };
        // Each window animates on its own clock.
        scene.elapsed += ctx.time.delta.as_seconds();

        let hue = (scene.elapsed.sin() * 0.5 + 0.5) * 255.0;
        if let Some(shader) = ctx.context.assets().get::<Shader>(scene.flat) {
            shader
                .set_uniform("u_color", Color::rgb(255, hue as u8, 64))
                .set_uniform("u_time", scene.elapsed);
        }

        let (triangle, flat) = (scene.triangle, scene.flat);
        let (quad, textured, checker) = (scene.quad, scene.textured, scene.checker);

        if let Err(e) = ctx.render(triangle, flat) {
            log::error!("triangle draw failed: {e}");
        }
        if let Err(e) = ctx.render_textured(quad, textured, &[checker]) {
            log::error!("quad draw failed: {e}");
        }

        AppControl::Continue
    }
}

fn checkerboard(size: u32) -> TextureSource {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let c = if (x + y) % 2 == 0 { 230 } else { 40 };
            pixels.extend_from_slice(&[c, c, c, 255]);
        }
    }
    TextureSource::Rgba8 {
        width: size,
        height: size,
        pixels,
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let properties = ContextProperties::new(
        WindowProperties::new("kiln studio", 960, 540),
        Color::rgb(18, 18, 24),
    );

    Runtime::run(properties, GpuInit::default(), Studio::default())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use kiln_engine::context::ContextManager;
    use kiln_engine::driver::{Driver, HeadlessDriver};

    use super::*;

    #[test]
    fn closing_a_window_drops_only_its_scene() {
        let mut contexts = ContextManager::new(Rc::new(HeadlessDriver::new()) as Rc<dyn Driver>);
        let first = contexts.create_context(ContextProperties::default());
        let second = contexts.create_context(ContextProperties::default());

        let mut studio = Studio::default();
        for id in [first, second] {
            let context = contexts.get_context_mut(id).unwrap();
            studio.on_start(context).unwrap();
        }
        assert_eq!(studio.scenes.len(), 2);

        studio.on_stop(contexts.get_context_mut(first).unwrap());
        assert_eq!(studio.scenes.len(), 1);
        assert_eq!(studio.scenes[0].context, second);
        assert_eq!(studio.scenes[0].elapsed, 0.0);
    }
}
