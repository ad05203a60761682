use geoanchor::core::{GeoCoordinate, OrientationClass, OrientationSample, ScreenOrientation};
use geoanchor::platform::{MockGeolocation, MockOrientation, MockPrompt, MockScene, OrientationEventKind, UserPrompt};
use geoanchor::{
    AnchorRegistry, AnchorTracker, CompassRotation, ConfigurationManager, Diagnostics, PathBinder, SceneGraph,
    SessionConfig,
};
use serde::Serialize;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Frame period of the scripted host loop
const FRAME_MS: u64 = 100;

#[derive(Serialize)]
struct SessionSummary {
    zero_anchor: Option<GeoCoordinate>,
    camera_position: Option<geoanchor::LocalPoint>,
    heading: Option<f64>,
    rig_yaw_degrees: Option<f64>,
    binder: geoanchor::BinderStatus,
    mesh: Option<MeshSummary>,
    diagnostics: geoanchor::validation::DiagnosticSummary,
}

#[derive(Serialize)]
struct MeshSummary {
    vertices: usize,
    triangles: usize,
    half_width: f64,
    opacity: f64,
    first_vertex: [f64; 3],
    last_vertex: [f64; 3],
}

/// Sample road path used when the config has none
fn default_path() -> Vec<GeoCoordinate> {
    vec![
        GeoCoordinate::new(21.046306, 105.7937535),
        GeoCoordinate::new(21.046296, 105.7940615),
        GeoCoordinate::new(21.046309, 105.794953),
    ]
}

fn load_config(args: &[String]) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut manager = match args.get(1) {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    if manager.config().path.points.is_empty() {
        let mut config = manager.config().clone();
        config.path.points = default_path();
        manager.update_config(config)?;
    }
    Ok(manager.config().clone())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() == 2 && args[1] == "--print-default-config" {
        println!("{}", serde_json::to_string_pretty(&SessionConfig::default())?);
        return Ok(());
    }

    if args.len() > 2 {
        eprintln!("Usage: {} [config.json]", args[0]);
        eprintln!("   or: {} --print-default-config", args[0]);
        std::process::exit(1);
    }

    let config = load_config(&args)?;
    let diagnostics = Diagnostics::new();

    // Scene: a camera with look controls and an entity carrying the road
    let mut scene = MockScene::new();
    let camera = scene.add_node(&["a-camera"]);
    scene.attach_look_rig(camera, 0.0);
    let road = scene.add_node(&["a-entity", "[road]"]);

    let mut geolocation = MockGeolocation::new();
    let mut orientation = MockOrientation::new(OrientationClass::from_screen_size(390, 844));
    let prompt = Rc::new(MockPrompt::new());
    let mut registry = AnchorRegistry::new();

    let mut tracker = AnchorTracker::new(camera, &config, diagnostics.clone());
    tracker.register(&mut registry);
    tracker.start(&mut geolocation);

    let mut compass = CompassRotation::new(camera, &config.compass, diagnostics.clone());
    let user_prompt: Rc<dyn UserPrompt> = prompt.clone();
    compass.start(&mut orientation, &scene, user_prompt);

    let mut binder = PathBinder::new(road, &config.path, diagnostics.clone());

    // Walk east along the road, one fix every 500 ms; the first fix is too
    // imprecise to anchor on
    let start = config.path.points[0];
    for frame in 0..40u64 {
        let now = frame * FRAME_MS;

        if frame % 5 == 0 {
            let step = (frame / 5) as f64;
            let accuracy = if frame == 0 { 250.0 } else { 6.0 };
            geolocation.push_position(
                GeoCoordinate::new(start.latitude, start.longitude + step * 0.00002).with_accuracy(accuracy),
            );
        }

        if frame % 3 == 0 {
            let alpha = (frame as f64 * 2.0) % 360.0;
            orientation.emit_reading(
                OrientationEventKind::Absolute,
                OrientationSample::euler(alpha, 80.0, 5.0),
                Some(ScreenOrientation::PortraitPrimary),
                now,
            );
        }

        if frame == 20 {
            orientation.emit_calibration();
        }

        tracker.update(&mut scene);
        compass.tick(now, &mut scene);
        binder.update(now, &mut scene, &registry);
    }

    tracker.teardown(&mut geolocation);
    compass.teardown(&mut orientation);

    let mesh = scene.mesh(road).map(|m| {
        let first = m.vertices.first().map_or([0.0; 3], |v| [v.x, v.y, v.z]);
        let last = m.vertices.last().map_or([0.0; 3], |v| [v.x, v.y, v.z]);
        MeshSummary {
            vertices: m.vertex_count(),
            triangles: m.triangle_count(),
            half_width: m.half_width,
            opacity: m.material.opacity,
            first_vertex: first,
            last_vertex: last,
        }
    });

    let anchor = tracker.anchor().borrow();
    let summary = SessionSummary {
        zero_anchor: anchor.zero_anchor().map(|z| *z.coordinate()),
        camera_position: scene.position(camera),
        heading: compass.heading().map(|h| h.heading),
        rig_yaw_degrees: scene.look_yaw(camera).map(f64::to_degrees),
        binder: binder.status(),
        mesh,
        diagnostics: diagnostics.summary(),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if !prompt.messages().is_empty() {
        eprintln!("prompts shown: {:?}", prompt.messages());
    }

    Ok(())
}
