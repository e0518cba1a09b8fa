use std::cell::{Cell, RefCell};
use std::f64::consts::{PI, TAU};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent, WheelEvent};

use trajview_shared::LatLon;

use crate::colors::rgba_css;
use crate::render::MapSurface;
use crate::render_loop::RenderScheduler;
use crate::viewport::{Viewport, project, unproject};

const BACKGROUND: &str = "#0c0e17";
const PATH_WIDTH: f64 = 3.0;
const POINT_RADIUS: f64 = 3.5;
const GRATICULE_MIN_SPACING_PX: f64 = 80.0;
const GRATICULE_STEPS: [f64; 16] = [
    0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 45.0,
];
const MAX_GRID_LINES: usize = 512;
const ARROW_SPACING_PX: f64 = 100.0;
const ARROW_SIZE_PX: f64 = 10.0;
/// Half of the chevron's opening angle, in radians (65 degrees total).
const ARROW_HALF_ANGLE: f64 = 65.0 * PI / 360.0;
const ARROW_LINE_WIDTH: f64 = 2.0;
const MAX_ARROWS: usize = 1024;
/// Pointer travel below which a press counts as a click instead of a drag.
const CLICK_SLOP_PX: f64 = 4.0;

struct ScenePath {
    color: String,
    /// Projected world coordinates.
    world: Vec<(f64, f64)>,
}

/// Everything the canvas paints. The graticule is derived from the viewport and is
/// therefore never affected by path clears.
#[derive(Default)]
struct MapScene {
    paths: Vec<ScenePath>,
    viewport: Viewport,
    needs_fit: bool,
    fitted: bool,
}

impl MapScene {
    fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.paths.iter().flat_map(|path| path.world.iter());
        let &(x, y) = points.next()?;
        Some(points.fold((x, y, x, y), |(min_x, min_y, max_x, max_y), &(x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        }))
    }
}

/// Shared handle to the map scene and its repaint scheduler.
#[derive(Clone, Default)]
pub struct MapHandle {
    scene: Rc<RefCell<MapScene>>,
    scheduler: Rc<RefCell<Option<RenderScheduler>>>,
}

impl MapHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach(&self, canvas: HtmlCanvasElement) {
        let scene = Rc::clone(&self.scene);
        let scheduler = RenderScheduler::new(move || {
            paint(&canvas, &mut scene.borrow_mut());
        });
        *self.scheduler.borrow_mut() = Some(scheduler);
        self.request_repaint();
    }

    pub fn request_repaint(&self) {
        if let Some(scheduler) = self.scheduler.borrow().as_ref() {
            scheduler.mark_dirty();
        }
    }

    /// Zoom to the drawn paths on the next frame.
    pub fn refit(&self) {
        self.scene.borrow_mut().needs_fit = true;
        self.request_repaint();
    }

    /// Geographic position under a canvas pixel.
    pub fn lat_lon_at(&self, x: f64, y: f64) -> (f64, f64) {
        let (world_x, world_y) = self.scene.borrow().viewport.screen_to_world(x, y);
        unproject(world_x, world_y)
    }

    pub fn update_viewport(&self, f: impl FnOnce(&mut Viewport)) {
        f(&mut self.scene.borrow_mut().viewport);
        self.request_repaint();
    }
}

/// [`MapSurface`] backed by the canvas scene.
pub struct CanvasMap {
    handle: MapHandle,
}

impl CanvasMap {
    pub fn new(handle: MapHandle) -> Self {
        Self { handle }
    }
}

impl MapSurface for CanvasMap {
    fn clear_paths(&mut self) {
        self.handle.scene.borrow_mut().paths.clear();
    }

    fn draw_path(&mut self, points: &[LatLon], color: &str) {
        let world = points.iter().map(|p| project(p.lat, p.lon)).collect();
        self.handle.scene.borrow_mut().paths.push(ScenePath {
            color: color.to_string(),
            world,
        });
    }

    fn paths_updated(&mut self) {
        {
            let mut scene = self.handle.scene.borrow_mut();
            // Fit once per appearance of data so playback does not keep re-zooming.
            if scene.paths.is_empty() {
                scene.fitted = false;
            } else if !scene.fitted {
                scene.fitted = true;
                scene.needs_fit = true;
            }
        }
        self.handle.request_repaint();
    }
}

fn format_click_position(lat: f64, lon: f64) -> String {
    format!("{lat:.5}, {lon:.5}")
}

/// Coarsest-first search for the finest graticule step that keeps lines apart.
fn graticule_step(degrees_per_pixel: f64) -> f64 {
    let min_step = degrees_per_pixel * GRATICULE_MIN_SPACING_PX;
    GRATICULE_STEPS
        .into_iter()
        .find(|step| *step >= min_step)
        .unwrap_or(GRATICULE_STEPS[GRATICULE_STEPS.len() - 1])
}

fn paint(canvas: &HtmlCanvasElement, scene: &mut MapScene) {
    let Some(parent) = canvas.parent_element() else {
        return;
    };
    let w = parent.client_width() as f64;
    let h = parent.client_height() as f64;
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let dpr = web_sys::window()
        .map(|window| window.device_pixel_ratio())
        .unwrap_or(1.0);
    let pixel_w = (w * dpr).round().max(1.0) as u32;
    let pixel_h = (h * dpr).round().max(1.0) as u32;
    if canvas.width() != pixel_w || canvas.height() != pixel_h {
        canvas.set_width(pixel_w);
        canvas.set_height(pixel_h);
    }

    let Some(ctx) = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        return;
    };
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();

    if scene.needs_fit {
        scene.needs_fit = false;
        if let Some((min_x, min_y, max_x, max_y)) = scene.bounds() {
            scene.viewport.fit_bounds(min_x, min_y, max_x, max_y, w, h);
        }
    }

    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, w, h);
    draw_graticule(&ctx, &scene.viewport, w, h);

    ctx.set_line_join("round");
    ctx.set_line_cap("round");
    for path in &scene.paths {
        draw_scene_path(&ctx, &scene.viewport, path);
    }
}

fn draw_graticule(ctx: &CanvasRenderingContext2d, vp: &Viewport, w: f64, h: f64) {
    let step = graticule_step(vp.degrees_per_pixel());
    let (top_left_x, top_left_y) = vp.screen_to_world(0.0, 0.0);
    let (bottom_right_x, bottom_right_y) = vp.screen_to_world(w, h);
    let (lat_top, lon_left) = unproject(top_left_x, top_left_y);
    let (lat_bottom, lon_right) = unproject(bottom_right_x, bottom_right_y);

    ctx.set_stroke_style_str(&rgba_css(255, 255, 255, 0.07));
    ctx.set_line_width(1.0);
    ctx.begin_path();

    let mut lon = (lon_left.max(-180.0) / step).floor() * step;
    for _ in 0..MAX_GRID_LINES {
        if lon > lon_right.min(180.0) {
            break;
        }
        let (x, _) = vp.world_to_screen(project(0.0, lon).0, 0.0);
        let x = x.round() + 0.5;
        ctx.move_to(x, 0.0);
        ctx.line_to(x, h);
        lon += step;
    }

    let mut lat = (lat_bottom.max(-85.0) / step).floor() * step;
    for _ in 0..MAX_GRID_LINES {
        if lat > lat_top.min(85.0) {
            break;
        }
        let (_, y) = vp.world_to_screen(0.0, project(lat, 0.0).1);
        let y = y.round() + 0.5;
        ctx.move_to(0.0, y);
        ctx.line_to(w, y);
        lat += step;
    }
    ctx.stroke();
}

fn draw_scene_path(ctx: &CanvasRenderingContext2d, vp: &Viewport, path: &ScenePath) {
    let screen: Vec<(f64, f64)> = path.world.iter().map(|&(x, y)| vp.world_to_screen(x, y)).collect();
    let Some(&(x0, y0)) = screen.first() else {
        return;
    };

    if screen.len() == 1 {
        ctx.set_fill_style_str(&path.color);
        ctx.begin_path();
        ctx.arc(x0, y0, POINT_RADIUS, 0.0, TAU).ok();
        ctx.fill();
        return;
    }

    ctx.set_stroke_style_str(&path.color);
    ctx.set_line_width(PATH_WIDTH);
    ctx.begin_path();
    ctx.move_to(x0, y0);
    for &(x, y) in &screen[1..] {
        ctx.line_to(x, y);
    }
    ctx.stroke();

    ctx.set_line_width(ARROW_LINE_WIDTH);
    ctx.begin_path();
    for (x, y, heading) in arrow_marks(&screen, ARROW_SPACING_PX) {
        for side in [-ARROW_HALF_ANGLE, ARROW_HALF_ANGLE] {
            let back = heading + PI + side;
            ctx.move_to(x, y);
            ctx.line_to(x + ARROW_SIZE_PX * back.cos(), y + ARROW_SIZE_PX * back.sin());
        }
    }
    ctx.stroke();
}

/// Direction markers along a screen-space polyline: `(x, y, heading)` at the start
/// and then every `spacing` pixels of path length. Zero-length segments are skipped.
fn arrow_marks(screen: &[(f64, f64)], spacing: f64) -> Vec<(f64, f64, f64)> {
    let mut marks = Vec::new();
    let mut next_at = 0.0;
    let mut travelled = 0.0;
    for pair in screen.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = dx.hypot(dy);
        if len <= f64::EPSILON {
            continue;
        }
        let heading = dy.atan2(dx);
        while next_at <= travelled + len && marks.len() < MAX_ARROWS {
            let t = (next_at - travelled) / len;
            marks.push((x0 + dx * t, y0 + dy * t, heading));
            next_at += spacing;
        }
        travelled += len;
    }
    marks
}

/// Canvas map with wheel zoom, drag pan and a click-for-coordinates popup.
#[component]
pub fn MapCanvas(map: MapHandle) -> impl IntoView {
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let drag: Rc<Cell<Option<(f64, f64)>>> = Rc::new(Cell::new(None));
    let press: Rc<Cell<Option<(f64, f64)>>> = Rc::new(Cell::new(None));
    // (lat, lon, x, y) of the last click, in canvas pixels.
    let popup = RwSignal::new(None::<(f64, f64, f64, f64)>);

    let attach_map = map.clone();
    Effect::new(move || {
        if let Some(canvas) = canvas_ref.get() {
            let canvas: &HtmlCanvasElement = &canvas;
            attach_map.attach(canvas.clone());
        }
    });

    let on_wheel = {
        let map = map.clone();
        move |e: WheelEvent| {
            e.prevent_default();
            let delta = e.delta_y();
            let x = e.offset_x() as f64;
            let y = e.offset_y() as f64;
            map.update_viewport(|vp| vp.zoom_at(delta, x, y));
        }
    };

    let on_pointer_down = {
        let drag = drag.clone();
        let press = press.clone();
        move |e: PointerEvent| {
            drag.set(Some((e.client_x() as f64, e.client_y() as f64)));
            press.set(Some((e.client_x() as f64, e.client_y() as f64)));
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let drag = drag.clone();
        let map = map.clone();
        move |e: PointerEvent| {
            let Some((last_x, last_y)) = drag.get() else {
                return;
            };
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            drag.set(Some((x, y)));
            map.update_viewport(|vp| vp.pan(x - last_x, y - last_y));
        }
    };

    let on_pointer_up = {
        let map = map.clone();
        move |e: PointerEvent| {
            drag.set(None);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }

            let Some((down_x, down_y)) = press.take() else {
                return;
            };
            let moved = (e.client_x() as f64 - down_x).hypot(e.client_y() as f64 - down_y);
            if moved > CLICK_SLOP_PX {
                popup.set(None);
                return;
            }
            let (x, y) = (e.offset_x() as f64, e.offset_y() as f64);
            let (lat, lon) = map.lat_lon_at(x, y);
            popup.set(Some((lat, lon, x, y)));
        }
    };

    view! {
        <div
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
            {move || popup.get().map(|(lat, lon, x, y)| view! {
                <div style={format!(
                    "position: absolute; left: {x}px; top: {y}px; transform: translate(-50%, calc(-100% - 8px)); pointer-events: none; background: #1a1d2a; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 4px; padding: 4px 8px; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; white-space: nowrap;"
                )}>
                    {format_click_position(lat, lon)}
                </div>
            })}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> LatLon {
        LatLon::new(lat, lon)
    }

    #[test]
    fn graticule_step_widens_when_zoomed_out() {
        assert_eq!(graticule_step(0.00001), 0.001);
        assert_eq!(graticule_step(0.001), 0.1);
        assert_eq!(graticule_step(1.0), 45.0);
    }

    #[test]
    fn arrows_start_at_the_first_point_and_repeat_along_the_path() {
        let marks = arrow_marks(&[(0.0, 0.0), (150.0, 0.0), (150.0, 150.0)], 100.0);
        assert_eq!(marks.len(), 4);
        assert_eq!((marks[0].0, marks[0].1), (0.0, 0.0));
        assert_eq!(marks[0].2, 0.0);
        assert_eq!((marks[1].0, marks[1].1), (100.0, 0.0));
        // Third mark lies 50px into the downward segment.
        assert_eq!(marks[2].0, 150.0);
        assert!((marks[2].1 - 50.0).abs() < 1e-9);
        assert!((marks[2].2 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!((marks[3].0, marks[3].1), (150.0, 150.0));
    }

    #[test]
    fn arrows_skip_repeated_points() {
        assert!(arrow_marks(&[(5.0, 5.0), (5.0, 5.0)], 100.0).is_empty());
        assert!(arrow_marks(&[(5.0, 5.0)], 100.0).is_empty());
        let marks = arrow_marks(&[(0.0, 0.0), (0.0, 0.0), (0.0, -30.0)], 100.0);
        assert_eq!(marks.len(), 1);
        assert!((marks[0].2 + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn click_position_round_trips_through_the_viewport() {
        let handle = MapHandle::new();
        let (world_x, world_y) = project(56.0, 10.0);
        let (x, y) = handle.scene.borrow().viewport.world_to_screen(world_x, world_y);
        let (lat, lon) = handle.lat_lon_at(x, y);
        assert!((lat - 56.0).abs() < 1e-6 && (lon - 10.0).abs() < 1e-6);
        assert_eq!(format_click_position(lat, lon), "56.00000, 10.00000");
    }

    #[test]
    fn first_data_requests_a_fit_and_later_updates_do_not() {
        let handle = MapHandle::new();
        let mut map = CanvasMap::new(handle.clone());

        map.clear_paths();
        map.draw_path(&[point(56.0, 10.0), point(56.1, 10.1)], "#ff0000");
        map.paths_updated();
        assert!(handle.scene.borrow().needs_fit);
        handle.scene.borrow_mut().needs_fit = false;

        map.clear_paths();
        map.draw_path(&[point(56.2, 10.2)], "#ff0000");
        map.paths_updated();
        assert!(!handle.scene.borrow().needs_fit);
        assert_eq!(handle.scene.borrow().paths.len(), 1);
    }

    #[test]
    fn emptied_map_fits_again_on_next_data() {
        let handle = MapHandle::new();
        let mut map = CanvasMap::new(handle.clone());
        map.draw_path(&[point(1.0, 1.0)], "#fff");
        map.paths_updated();
        handle.scene.borrow_mut().needs_fit = false;

        map.clear_paths();
        map.paths_updated();
        map.draw_path(&[point(2.0, 2.0)], "#fff");
        map.paths_updated();
        assert!(handle.scene.borrow().needs_fit);
    }

    #[test]
    fn scene_bounds_cover_every_path() {
        let handle = MapHandle::new();
        let mut map = CanvasMap::new(handle.clone());
        map.draw_path(&[point(56.0, 10.0)], "#fff");
        map.draw_path(&[point(57.0, 11.0), point(55.0, 9.0)], "#fff");
        let (min_x, min_y, max_x, max_y) = handle.scene.borrow().bounds().expect("bounds");
        let (west, north) = project(57.0, 9.0);
        let (east, south) = project(55.0, 11.0);
        assert!((min_x - west).abs() < 1e-9 && (max_x - east).abs() < 1e-9);
        assert!((min_y - north).abs() < 1e-9 && (max_y - south).abs() < 1e-9);
    }
}
