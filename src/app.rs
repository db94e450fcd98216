use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;

pub mod carousel;
pub mod controls;
pub mod lifecycle;
pub mod scene;

use carousel::Carousel;
use controls::{ActiveCaption, ActiveCard, NavigationControls};
use lifecycle::CarouselHandle;

/// Item list and optional config, fetched once at startup.
pub const MANIFEST_PATH: &str = "assets/carousel.json";
pub const CANVAS_ID: &str = "carousel-canvas";

/// The one `Carousel`, shared by the overlay buttons, the DOM listeners and
/// the render loop. All of them run on the browser's main thread and never
/// hold the borrow across an await or a frame.
pub type SharedCarousel = Rc<RefCell<Carousel>>;

// ---------------------------------------------------------------------------
// App root
// ---------------------------------------------------------------------------
#[component]
pub fn App(
    carousel: SharedCarousel,
    active: RwSignal<Option<ActiveCard>>,
    handle: CarouselHandle,
) -> impl IntoView {
    let aspect_ratio = carousel.borrow().config().aspect_ratio;

    let on_prev: Rc<dyn Fn()> = Rc::new({
        let carousel = carousel.clone();
        move || carousel.borrow_mut().step_prev()
    });
    let on_next: Rc<dyn Fn()> = Rc::new({
        let carousel = carousel.clone();
        move || carousel.borrow_mut().step_next()
    });

    on_cleanup(move || handle.stop());

    view! {
        <div
            class="carousel"
            style=format!(
                "position: relative; width: 100%; aspect-ratio: {aspect_ratio}; touch-action: pan-y; cursor: grab;"
            )
        >
            <canvas id=CANVAS_ID style="display: block; width: 100%; height: 100%;" />
            <ActiveCaption active=active />
            <NavigationControls on_prev=on_prev on_next=on_next />
        </div>
    }
}

// ---------------------------------------------------------------------------
// three-d renderer + Leptos mount
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use leptos::mount::mount_to;
    use leptos::prelude::*;
    use leptos::wasm_bindgen::JsCast;
    use leptos::web_sys::{Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, WheelEvent};
    use three_d::CpuTexture;

    use super::carousel::error::{CarouselError, CarouselResult};
    use super::carousel::label::{CanvasLabelRasterizer, LabelCache};
    use super::carousel::textures::TextureInbox;
    use super::carousel::{Carousel, CarouselManifest};
    use super::controls::ActiveCard;
    use super::lifecycle::{CarouselHandle, FrameLoop, ListenerGuard, ResizeDebounce};
    use super::scene::{CarouselScene, prepare_card_texture};
    use super::{App, CANVAS_ID, SharedCarousel};

    /// Fetch a file with gloo-net (three-d-asset's own loader does not work
    /// on wasm).
    async fn fetch_bytes(path: &str) -> CarouselResult<Vec<u8>> {
        let response = gloo_net::http::Request::get(path)
            .send()
            .await
            .map_err(|e| CarouselError::fetch(format!("{}: {}", path, e)))?;
        if !response.ok() {
            return Err(CarouselError::fetch(format!(
                "{}: HTTP status {}",
                path,
                response.status()
            )));
        }
        response
            .binary()
            .await
            .map_err(|e| CarouselError::fetch(format!("{}: {}", path, e)))
    }

    pub async fn load_manifest(path: &str) -> CarouselResult<CarouselManifest> {
        let bytes = fetch_bytes(path).await?;
        let json = String::from_utf8(bytes).map_err(|e| CarouselError::decode(format!("{}: {}", path, e)))?;
        CarouselManifest::from_json(&json)
    }

    async fn load_card_texture(url: &str) -> CarouselResult<CpuTexture> {
        let bytes = fetch_bytes(url).await?;
        let mut raw = three_d_asset::io::RawAssets::new();
        raw.insert(url, bytes);
        let texture = raw
            .deserialize::<CpuTexture>(url)
            .map_err(|e| CarouselError::decode(format!("{}: {}", url, e)))?;
        Ok(prepare_card_texture(texture))
    }

    /// Start one load per distinct image URL for the inbox's new generation.
    /// Padded repeats share the load of their source item.
    fn load_textures(carousel: &Carousel, inbox: &TextureInbox<Rc<CpuTexture>>) {
        let generation = inbox.next_generation();
        let mut by_url: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, ring_item) in carousel.items().iter().enumerate() {
            by_url.entry(ring_item.item.image.clone()).or_default().push(index);
        }
        log::info!(
            "carousel: loading {} images for {} cards",
            by_url.len(),
            carousel.items().len()
        );
        for (url, indices) in by_url {
            let inbox = inbox.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let texture = load_card_texture(&url).await.map(Rc::new);
                for index in indices {
                    inbox.deliver(generation, index, texture.clone());
                }
            });
        }
    }

    fn now_ms() -> f64 {
        leptos::web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }

    fn client_x(ev: &Event) -> Option<f32> {
        ev.dyn_ref::<MouseEvent>().map(|ev| ev.client_x() as f32)
    }

    /// The canvas fills its container; winit pins the canvas' own CSS size,
    /// so the container is what gets measured.
    fn container_size(canvas: &HtmlCanvasElement) -> winit::dpi::LogicalSize<f64> {
        let (width, height) = canvas
            .parent_element()
            .map(|parent| (parent.client_width(), parent.client_height()))
            .unwrap_or((canvas.client_width(), canvas.client_height()));
        winit::dpi::LogicalSize::new(width.max(1) as f64, height.max(1) as f64)
    }

    /// Normalized device coordinates of a mouse event over the canvas, and
    /// the canvas' aspect ratio.
    fn click_ndc(canvas: &HtmlCanvasElement, ev: &Event) -> Option<([f32; 2], f32)> {
        let ev = ev.dyn_ref::<MouseEvent>()?;
        let rect = canvas.get_bounding_client_rect();
        let (width, height) = (rect.width(), rect.height());
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let x = (f64::from(ev.client_x()) - rect.left()) / width * 2.0 - 1.0;
        let y = 1.0 - (f64::from(ev.client_y()) - rect.top()) / height * 2.0;
        Some(([x as f32, y as f32], (width / height) as f32))
    }

    fn listen_for_input(
        listeners: &mut ListenerGuard,
        canvas: &HtmlCanvasElement,
        carousel: &SharedCarousel,
        resize: &Rc<RefCell<ResizeDebounce>>,
    ) {
        let target: &EventTarget = canvas.as_ref();
        {
            let carousel = carousel.clone();
            listeners.listen(target, "pointerdown", move |ev| {
                if let Some(x) = client_x(&ev) {
                    carousel.borrow_mut().pointer_down(x);
                }
            });
        }
        {
            let carousel = carousel.clone();
            listeners.listen(target, "pointermove", move |ev| {
                if let Some(x) = client_x(&ev) {
                    carousel.borrow_mut().pointer_move(x);
                }
            });
        }
        for event in ["pointerup", "pointerleave"] {
            let carousel = carousel.clone();
            listeners.listen(target, event, move |_| carousel.borrow_mut().pointer_up());
        }
        {
            let carousel = carousel.clone();
            let canvas = canvas.clone();
            listeners.listen(target, "click", move |ev| {
                let Some((ndc, aspect)) = click_ndc(&canvas, &ev) else {
                    return;
                };
                if let Some(index) = carousel.borrow_mut().select_at(ndc, aspect) {
                    log::debug!("carousel: clicked card {}", index);
                }
            });
        }
        if carousel.borrow().config().enable_wheel {
            let carousel = carousel.clone();
            listeners.listen(target, "wheel", move |ev| {
                if let Some(wheel) = ev.dyn_ref::<WheelEvent>() {
                    wheel.prevent_default();
                    carousel.borrow_mut().wheel(wheel.delta_y() as f32);
                }
            });
        }
        if let Some(browser_window) = leptos::web_sys::window() {
            let resize = resize.clone();
            listeners.listen(browser_window.as_ref(), "resize", move |_| {
                resize.borrow_mut().request(now_ms());
            });
        }
    }

    /// Mounts `App` for the lifetime of the page. The mount handle is
    /// forgotten, so `App`'s `on_cleanup` (and with it `CarouselHandle::stop`)
    /// only runs when `App` is rendered inside a parent view that later
    /// unmounts it.
    pub fn mount_app(carousel: SharedCarousel, handle: CarouselHandle) -> CarouselResult<()> {
        let leptos_root = leptos::tachys::dom::document()
            .get_element_by_id("leptos-app")
            .ok_or_else(|| CarouselError::canvas("#leptos-app not found"))?
            .unchecked_into::<HtmlElement>();

        let active = RwSignal::new(carousel.borrow().active_item().map(ActiveCard::from));
        carousel
            .borrow_mut()
            .set_on_slide_change(move |_, card| active.set(Some(ActiveCard::from(card))));

        mount_to(leptos_root, move || {
            view! { <App carousel=carousel.clone() active=active handle=handle.clone() /> }
        })
        .forget();
        Ok(())
    }

    pub fn run_three_d(
        carousel: SharedCarousel,
        handle: CarouselHandle,
        event_loop: winit::event_loop::EventLoop<()>,
    ) -> CarouselResult<()> {
        use three_d::*;
        use winit::event::{Event, WindowEvent};
        use winit::event_loop::ControlFlow;
        use winit::platform::web::WindowBuilderExtWebSys;
        use winit::window::WindowBuilder;

        let canvas = leptos::tachys::dom::document()
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| CarouselError::canvas(format!("#{} not found", CANVAS_ID)))?
            .unchecked_into::<HtmlCanvasElement>();

        let window = WindowBuilder::new()
            .with_title("Carousel".to_string())
            .with_canvas(Some(canvas.clone()))
            .with_inner_size(container_size(&canvas))
            .with_prevent_default(false)
            .build(&event_loop)
            .map_err(|e| CarouselError::canvas(format!("window: {}", e)))?;

        let surface_settings = SurfaceSettings::default();
        let gl = WindowedContext::from_winit_window(&window, surface_settings)
            .or_else(|_| {
                let mut fallback = surface_settings;
                fallback.multisamples = 0;
                WindowedContext::from_winit_window(&window, fallback)
            })
            .map_err(|e| CarouselError::canvas(format!("WebGL context: {:?}", e)))?;

        let mut frame_input_generator = FrameInputGenerator::from_winit_window(&window);

        let fov = carousel.borrow().config().camera_fov;
        let mut camera = Camera::new_perspective(
            Viewport::new_at_origo(canvas.width().max(1), canvas.height().max(1)),
            vec3(0.0, 0.0, 0.0),
            vec3(0.0, 0.0, 1.0),
            vec3(0.0, 1.0, 0.0),
            degrees(fov),
            0.1,
            1000.0,
        );

        let rasterizer = CanvasLabelRasterizer::new()
            .map_err(|e| log::warn!("labels disabled: {}", e))
            .ok();
        let mut labels = LabelCache::new(rasterizer);
        let inbox: TextureInbox<Rc<CpuTexture>> = TextureInbox::default();
        let mut scene: Option<CarouselScene> = None;

        let resize = Rc::new(RefCell::new(ResizeDebounce::default()));
        let mut listeners = ListenerGuard::default();
        listen_for_input(&mut listeners, &canvas, &carousel, &resize);

        let proxy = event_loop.create_proxy();
        let frame_handle = handle.clone();
        let frames = FrameLoop::start(move || {
            let _ = proxy.send_event(());
            !frame_handle.is_stopped()
        });
        let mut mounted = Some((listeners, frames));
        log::info!("carousel: render loop started");

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Wait;
            match &event {
                Event::UserEvent(()) => {
                    if handle.is_stopped() {
                        if mounted.take().is_some() {
                            inbox.close();
                            log::info!("carousel: render loop stopped");
                        }
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    window.request_redraw();
                }
                Event::RedrawRequested(_) => {
                    if resize.borrow_mut().poll(now_ms()) {
                        let size = container_size(&canvas);
                        log::debug!("carousel: resized to {}x{}", size.width, size.height);
                        window.set_inner_size(size);
                        gl.resize(window.inner_size());
                    }

                    let frame = carousel.borrow_mut().tick();
                    if scene.as_ref().map(CarouselScene::revision) != Some(frame.revision) {
                        let carousel = carousel.borrow();
                        scene = Some(CarouselScene::build(&gl, &carousel, &mut labels));
                        load_textures(&carousel, &inbox);
                    }
                    let Some(current) = scene.as_mut() else {
                        return;
                    };
                    current.apply_textures(&gl, inbox.drain());
                    current.update(&gl, &frame);

                    let frame_input = frame_input_generator.generate(&gl);
                    camera.set_viewport(Viewport::new_at_origo(canvas.width().max(1), canvas.height().max(1)));
                    frame_input
                        .screen()
                        .clear(ClearState::color_and_depth(0.0, 0.0, 0.0, 0.0, 1.0))
                        .render(&camera, current.objects(), &[]);

                    let _ = gl.swap_buffers();
                }
                Event::WindowEvent { event, .. } => {
                    frame_input_generator.handle_winit_window_event(event);
                    match event {
                        WindowEvent::Resized(physical_size) => {
                            gl.resize(*physical_size);
                        }
                        WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                            gl.resize(**new_inner_size);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        });
    }
}

pub fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        use carousel::CarouselManifest;

        let event_loop = winit::event_loop::EventLoop::new();
        wasm_bindgen_futures::spawn_local(async move {
            let manifest = match web::load_manifest(MANIFEST_PATH).await {
                Ok(manifest) => {
                    log::info!("loaded {} ({} items)", MANIFEST_PATH, manifest.items.len());
                    manifest
                }
                Err(e) => {
                    log::error!("could not load {}: {}", MANIFEST_PATH, e);
                    CarouselManifest::default()
                }
            };
            let carousel: SharedCarousel = Rc::new(RefCell::new(Carousel::new(
                &manifest.items,
                manifest.checked_config(),
            )));
            let handle = CarouselHandle::default();

            if let Err(e) = web::mount_app(carousel.clone(), handle.clone()) {
                log::error!("could not mount overlay: {}", e);
                return;
            }
            if let Err(e) = web::run_three_d(carousel, handle, event_loop) {
                log::error!("could not start renderer: {}", e);
            }
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    log::error!("the carousel renders into a browser canvas; build for wasm32 and serve it with trunk");
}
