use super::fixtures::scribble;
use docsign::application::{
    Bounds, DrawingSurface, PenStyle, Point, PointerInput, PointerPhase, SurfaceError,
};
use image::Rgba;

#[test]
fn test_surface_starts_empty() {
    let surface = DrawingSurface::new(200, 100);
    assert!(surface.is_empty());
    assert!(!surface.is_stroke_open());
}

#[test]
fn test_stroke_marks_surface_non_empty_until_clear() {
    let mut surface = DrawingSurface::new(200, 100);
    scribble(&mut surface);
    assert!(!surface.is_empty());

    // More strokes and open/close cycles keep it non-empty
    surface.begin(Point::new(5.0, 5.0));
    surface.end();
    scribble(&mut surface);
    assert!(!surface.is_empty());

    surface.clear();
    assert!(surface.is_empty());
}

#[test]
fn test_clear_resets_regardless_of_stroke_count() {
    let mut surface = DrawingSurface::new(200, 100);
    for _ in 0..5 {
        scribble(&mut surface);
    }
    surface.clear();
    assert!(surface.is_empty());
    assert!(surface.raster().pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_extend_without_begin_is_noop() {
    let mut surface = DrawingSurface::new(200, 100);
    surface.extend(Point::new(10.0, 10.0));
    surface.extend(Point::new(90.0, 90.0));
    assert!(surface.is_empty());
}

#[test]
fn test_begin_while_stroke_open_is_ignored() {
    let mut surface = DrawingSurface::new(200, 100);
    surface.begin(Point::new(10.0, 10.0));
    surface.begin(Point::new(150.0, 90.0));
    surface.extend(Point::new(30.0, 10.0));

    // Ink runs from the first begin point, not the second
    let ink = surface.pen().color;
    assert_eq!(*surface.raster().get_pixel(20, 10), ink);
    assert_eq!(surface.raster().get_pixel(150, 90).0[3], 0);
}

#[test]
fn test_end_keeps_raster() {
    let mut surface = DrawingSurface::new(200, 100);
    surface.begin(Point::new(10.0, 10.0));
    surface.extend(Point::new(30.0, 10.0));
    surface.end();
    assert!(!surface.is_stroke_open());
    assert!(!surface.is_empty());
}

#[test]
fn test_export_of_empty_surface_is_rejected() {
    let surface = DrawingSurface::new(200, 100);
    assert!(matches!(surface.export(), Err(SurfaceError::Empty)));
}

#[test]
fn test_export_produces_png_of_surface_size() {
    let mut surface = DrawingSurface::new(200, 100);
    scribble(&mut surface);

    let signature = surface.export().unwrap();
    assert!(signature.as_data_uri().starts_with("data:image/png;base64,"));

    let decoded = image::load_from_memory(&signature.bytes()).unwrap();
    assert_eq!(decoded.width(), 200);
    assert_eq!(decoded.height(), 100);
}

#[test]
fn test_touch_tracks_first_point_and_suppresses_scrolling() {
    let mut surface = DrawingSurface::with_bounds(Bounds {
        left: 10.0,
        top: 20.0,
        width: 200,
        height: 100,
    });

    let down = surface.handle_input(&PointerInput::Touch {
        phase: PointerPhase::Down,
        touches: vec![Point::new(30.0, 70.0), Point::new(180.0, 100.0)],
    });
    assert!(!down.suppress_default);

    let moved = surface.handle_input(&PointerInput::Touch {
        phase: PointerPhase::Move,
        touches: vec![Point::new(90.0, 70.0), Point::new(185.0, 110.0)],
    });
    assert!(moved.suppress_default);

    surface.handle_input(&PointerInput::Touch {
        phase: PointerPhase::Up,
        touches: Vec::new(),
    });

    // First touch went from local (20, 50) to (80, 50)
    let ink = surface.pen().color;
    assert_eq!(*surface.raster().get_pixel(50, 50), ink);
    assert_eq!(surface.raster().get_pixel(175, 85).0[3], 0);
    assert!(!surface.is_stroke_open());
}

#[test]
fn test_mouse_leave_closes_stroke() {
    let mut surface = DrawingSurface::new(200, 100);
    surface.handle_input(&PointerInput::Mouse { phase: PointerPhase::Down, x: 10.0, y: 10.0 });
    surface.handle_input(&PointerInput::Mouse { phase: PointerPhase::Leave, x: 250.0, y: 10.0 });
    assert!(!surface.is_stroke_open());

    let response =
        surface.handle_input(&PointerInput::Mouse { phase: PointerPhase::Move, x: 50.0, y: 50.0 });
    assert!(!response.suppress_default);
    assert!(surface.is_empty());
}

#[test]
fn test_resize_keeps_pen_style_and_overlapping_ink() {
    let mut surface = DrawingSurface::new(200, 100);
    let pen = PenStyle {
        color: Rgba([0, 0, 0, 255]),
        width: 5.0,
    };
    surface.set_pen(pen);
    scribble(&mut surface);

    surface.resize(Bounds::at_origin(300, 150));
    assert_eq!(surface.width(), 300);
    assert_eq!(surface.pen(), pen);
    assert!(!surface.is_empty());
    assert_eq!(*surface.raster().get_pixel(20, 50), pen.color);
}

#[test]
fn test_shrinking_past_all_ink_leaves_surface_empty() {
    let mut surface = DrawingSurface::new(200, 100);
    surface.begin(Point::new(150.0, 80.0));
    surface.extend(Point::new(190.0, 90.0));
    surface.end();

    surface.resize(Bounds::at_origin(50, 30));
    assert!(surface.is_empty());
    assert!(matches!(surface.export(), Err(SurfaceError::Empty)));
}

#[test]
fn test_moving_surface_updates_origin_only() {
    let mut surface = DrawingSurface::new(200, 100);
    scribble(&mut surface);
    surface.resize(Bounds {
        left: 40.0,
        top: 40.0,
        width: 200,
        height: 100,
    });
    assert!(!surface.is_empty());
    assert_eq!(surface.bounds().left, 40.0);
}
