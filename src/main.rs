//! mothership-dock: floating tool panels over the Mothership companion view.
//!
//! A GPU-rendered window hosting the dockable panels. Keys 1-4 toggle the
//! dice roller, character sheet, ship manifest and GM chat; drag a header to
//! move a panel; Escape quits.
//!
//! Uses vello/wgpu for rendering and winit for the window and input.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use vello::kurbo::{Affine, Rect as KurboRect};
use vello::peniko::Fill;
use vello::util::{RenderContext, RenderSurface};
use vello::{AaConfig, Renderer, RendererOptions, Scene};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window};

use vello::wgpu;

use mothership_dock::config_watcher::{self, ThemeWatcher};
use mothership_dock::paths::DockPaths;
use mothership_dock::storage::FileLayoutStore;
use mothership_dock::theme::{MAX_MARGIN, PanelTheme, color};
use mothership_dock::{Desk, PanelId, PanelRegistry, Point, Size, logging};

/// Dockable floating panels for the Mothership companion
#[derive(Parser, Debug)]
#[command(name = "mothership-dock", version, about = "Dockable floating panels")]
struct Args {
    /// Start in windowed mode instead of fullscreen
    #[arg(short, long)]
    windowed: bool,

    /// Panels to open at startup, in order (repeatable)
    #[arg(short, long = "open", value_enum)]
    open: Vec<PanelId>,

    /// Directory for persisted panel layouts
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Reset every panel to its default layout before starting
    #[arg(long)]
    reset_layout: bool,

    /// Override the theme's viewport margin (px)
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=MAX_MARGIN as i64))]
    margin: Option<i32>,
}

/// Wake-ups sent to the event loop from other threads.
#[derive(Debug, Clone, Copy)]
enum DockEvent {
    ThemeChanged,
}

const WINDOWED_SIZE: Size = Size::new(1280, 800);

#[derive(Debug)]
enum RenderState {
    Active {
        surface: Box<RenderSurface<'static>>,
        valid_surface: bool,
        window: Arc<Window>,
    },
    Suspended(Option<Arc<Window>>),
}

struct App {
    context: RenderContext,
    renderers: Vec<Option<Renderer>>,
    state: RenderState,
    scene: Scene,
    panels: Scene,
    desk: Desk,
    watcher: Option<ThemeWatcher>,
    margin_override: Option<i32>,
    /// Last cursor position in logical pixels.
    cursor: Point,
    windowed: bool,
}

impl App {
    fn apply_theme(&mut self, mut theme: PanelTheme) {
        if let Some(margin) = self.margin_override {
            theme.set_margin(margin);
        }
        self.desk.apply_theme(theme);
    }
}

fn logical_size(window: &Window) -> Size {
    let size = window.inner_size().to_logical::<f64>(window.scale_factor());
    Size::new(size.width.round() as i32, size.height.round() as i32)
}

fn panel_for_key(key: &str) -> Option<PanelId> {
    match key {
        "1" => Some(PanelId::DiceRoller),
        "2" => Some(PanelId::CharacterSheet),
        "3" => Some(PanelId::ShipManifest),
        "4" => Some(PanelId::GmChat),
        _ => None,
    }
}

impl ApplicationHandler<DockEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let RenderState::Suspended(cached_window) = &mut self.state else {
            return;
        };

        let window = match cached_window.take() {
            Some(window) => window,
            None => match create_window(event_loop, self.windowed) {
                Ok(window) => window,
                Err(e) => {
                    warn!("failed to create window: {e:#}");
                    event_loop.exit();
                    return;
                }
            },
        };

        let size = window.inner_size();
        let surface_future = self.context.create_surface(
            window.clone(),
            size.width,
            size.height,
            wgpu::PresentMode::AutoVsync,
        );
        let surface = pollster::block_on(surface_future).expect("Error creating surface");

        self.renderers
            .resize_with(self.context.devices.len(), || None);
        self.renderers[surface.dev_id]
            .get_or_insert_with(|| create_renderer(&self.context, &surface));

        self.desk.resize(logical_size(&window));
        window.request_redraw();

        self.state = RenderState::Active {
            surface: Box::new(surface),
            valid_surface: true,
            window,
        };
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let RenderState::Active { window, .. } = &self.state {
            self.state = RenderState::Suspended(Some(window.clone()));
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: DockEvent) {
        match event {
            DockEvent::ThemeChanged => {
                let Some(theme) = self.watcher.as_ref().and_then(ThemeWatcher::poll) else {
                    return;
                };
                self.apply_theme(theme);
                if let RenderState::Active { window, .. } = &self.state {
                    window.request_redraw();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (surface, valid_surface, window) = match &mut self.state {
            RenderState::Active {
                surface,
                valid_surface,
                window,
            } if window.id() == window_id => (surface, valid_surface, window.clone()),
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            // The release may land outside the window; losing focus ends the drag.
            WindowEvent::Focused(false) => {
                self.desk.pointer_up();
                window.request_redraw();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Character(ref c),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(id) = panel_for_key(c.as_str()) {
                    self.desk.registry_mut().toggle_open(id);
                    window.request_redraw();
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(window.scale_factor());
                self.cursor = Point::from_f64(logical.x, logical.y);
                if self.desk.is_dragging() {
                    self.desk.pointer_move(self.cursor);
                    window.request_redraw();
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        self.desk.pointer_down(self.cursor);
                    }
                    ElementState::Released => self.desk.pointer_up(),
                }
                window.request_redraw();
            }

            WindowEvent::Resized(size) => {
                if size.width != 0 && size.height != 0 {
                    self.context
                        .resize_surface(surface, size.width, size.height);
                    *valid_surface = true;
                    self.desk.resize(logical_size(&window));
                } else {
                    *valid_surface = false;
                }
                window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                if !*valid_surface {
                    return;
                }

                self.desk.layout();

                let width = surface.config.width;
                let height = surface.config.height;
                let scale = window.scale_factor();

                self.panels.reset();
                self.desk.render(&mut self.panels);

                self.scene.reset();
                let background = color(self.desk.theme().colors.background);
                let full = KurboRect::new(0.0, 0.0, width as f64, height as f64);
                self.scene
                    .fill(Fill::NonZero, Affine::IDENTITY, background, None, &full);
                self.scene.append(&self.panels, Some(Affine::scale(scale)));

                let device_handle = &self.context.devices[surface.dev_id];
                let Some(renderer) = self.renderers[surface.dev_id].as_mut() else {
                    return;
                };

                if let Err(e) = renderer.render_to_texture(
                    &device_handle.device,
                    &device_handle.queue,
                    &self.scene,
                    &surface.target_view,
                    &vello::RenderParams {
                        base_color: background,
                        width,
                        height,
                        antialiasing_method: AaConfig::Msaa16,
                    },
                ) {
                    warn!("failed to render frame: {e}");
                    return;
                }

                let surface_texture = match surface.surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(e) => {
                        warn!("failed to get surface texture: {e}");
                        return;
                    }
                };

                let mut encoder =
                    device_handle
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Surface Blit"),
                        });
                surface.blitter.copy(
                    &device_handle.device,
                    &mut encoder,
                    &surface.target_view,
                    &surface_texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default()),
                );
                device_handle.queue.submit([encoder.finish()]);
                surface_texture.present();
                let _ = device_handle.device.poll(wgpu::PollType::Poll);
            }

            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut paths = DockPaths::resolve().context("HOME is not set")?;
    if let Some(dir) = &args.data_dir {
        paths = paths.with_data_dir(dir);
    }
    let _log_guard = logging::init(&paths.logs);
    paths.ensure()?;

    info!("mothership-dock v{}", env!("CARGO_PKG_VERSION"));

    let theme_path = paths.theme_file();
    if let Err(e) = config_watcher::ensure_default_theme(&theme_path) {
        warn!("{e:#}");
    }
    let mut theme = config_watcher::load_theme(&theme_path).unwrap_or_else(|e| {
        warn!("using default theme: {e:#}");
        PanelTheme::default()
    });
    if let Some(margin) = args.margin {
        theme.set_margin(margin);
    }

    let store = FileLayoutStore::new(&paths.layout);
    info!("layout store: {}", store.dir().display());
    let mut registry = PanelRegistry::new(Box::new(store), WINDOWED_SIZE);
    if args.reset_layout {
        for id in PanelId::ALL {
            registry.reset_layout(id);
        }
    }
    registry.subscribe_open_panels(Box::new(|open| {
        let tools_active = open.iter().any(|id| id.is_tool());
        info!(target: "nav", ?open, tools_active, "open panels changed");
    }));
    for &id in &args.open {
        registry.open(id);
    }

    let event_loop = EventLoop::<DockEvent>::with_user_event().build()?;
    let proxy = event_loop.create_proxy();
    let watcher = match ThemeWatcher::start(theme_path, move || {
        let _ = proxy.send_event(DockEvent::ThemeChanged);
    }) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("theme hot reload disabled: {e:#}");
            None
        }
    };

    let mut app = App {
        context: RenderContext::new(),
        renderers: vec![],
        state: RenderState::Suspended(None),
        scene: Scene::new(),
        panels: Scene::new(),
        desk: Desk::new(registry, theme, WINDOWED_SIZE),
        watcher,
        margin_override: args.margin,
        cursor: Point::ORIGIN,
        windowed: args.windowed,
    };

    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    Ok(())
}

fn create_window(event_loop: &ActiveEventLoop, windowed: bool) -> Result<Arc<Window>> {
    let mut attr = Window::default_attributes().with_title("Mothership | Panels");

    if !windowed {
        attr = attr.with_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        attr = attr.with_inner_size(winit::dpi::LogicalSize::new(
            WINDOWED_SIZE.width,
            WINDOWED_SIZE.height,
        ));
    }

    Ok(Arc::new(event_loop.create_window(attr)?))
}

fn create_renderer(render_cx: &RenderContext, surface: &RenderSurface<'_>) -> Renderer {
    Renderer::new(
        &render_cx.devices[surface.dev_id].device,
        RendererOptions::default(),
    )
    .expect("Couldn't create renderer")
}
