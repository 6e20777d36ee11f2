use std::fs;
use std::io::BufReader;
use std::time;

use log::{info, warn};
use obj::{load_obj, Obj};
use image::RgbImage;
use show_image::{create_window, event, ImageInfo, ImageView, WindowOptions};
use threadpool::ThreadPool;

use zbuffer::{Camera, Light, Mesh, RenderError, RenderStats, Scene, Shape};

/// Degrees turned per arrow key press.
const ORBIT_STEP: f32 = 5.0;

pub struct Params {
    pub width: u32,
    pub height: u32,
    pub print_fps: bool,
    pub asset_path: String,
    pub output_path: Option<String>, // Render once into this file instead of opening a window.
    pub show_depth: bool,            // Z-buffer instead of colors.
    pub camera: Camera,
    pub threads: usize,
}

/// Reads an obj file into a single shaped mesh. Files without normals are
/// loaded by positions only and get derived normals.
fn load_mesh(path: &str) -> Result<Mesh, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let shape = match load_obj::<obj::Vertex, _, u32>(BufReader::new(&bytes[..])) {
        Ok(model) => {
            let positions = model.vertices.iter().flat_map(|v| v.position).collect();
            let normals = model.vertices.iter().flat_map(|v| v.normal).collect();
            Shape::new(model_name(&model.name, path), positions, normals, model.indices)?
        }
        Err(err) => {
            warn!("Loading {} with normals failed ({}), deriving them instead", path, err);
            let model: Obj<obj::Position, u32> = load_obj(BufReader::new(&bytes[..]))?;
            let positions = model.vertices.iter().flat_map(|v| v.position).collect();
            Shape::new(model_name(&model.name, path), positions, vec![], model.indices)?
        }
    };
    let mesh = Mesh::new(vec![shape]);
    mesh.log_summary();
    return Ok(mesh);
}

fn model_name(name: &Option<String>, path: &str) -> String {
    return name.clone().unwrap_or_else(|| String::from(path));
}

/// Draws one frame, on the pool when there is one.
fn draw(
    scene: &mut Scene,
    pool: Option<&ThreadPool>,
    mesh: &Mesh,
    camera: &Camera,
    light: &Light,
) -> Result<RenderStats, RenderError> {
    let transform = camera.transform(scene.aspect())?;
    return match pool {
        Some(pool) => scene.render_tiled(pool, mesh, &transform, Some(light)),
        None => scene.render(mesh, &transform, Some(light)),
    };
}

/// Frame data to present, colors or the z-buffer as grey levels.
fn frame_data(scene: &Scene, show_depth: bool) -> Vec<u8> {
    return match show_depth {
        true => scene.frame_buffer().as_depth_data(),
        false => scene.as_render_data().to_vec(),
    };
}

/// Applies a key press to the camera. Returns true on exit request.
fn handle_key(camera: &mut Camera, key: event::VirtualKeyCode) -> bool {
    match key {
        event::VirtualKeyCode::Left => camera.orbit(-ORBIT_STEP, 0.0),
        event::VirtualKeyCode::Right => camera.orbit(ORBIT_STEP, 0.0),
        event::VirtualKeyCode::Up => camera.orbit(0.0, -ORBIT_STEP),
        event::VirtualKeyCode::Down => camera.orbit(0.0, ORBIT_STEP),
        event::VirtualKeyCode::W => camera.zoom(1.0),
        event::VirtualKeyCode::S => camera.zoom(-1.0),
        event::VirtualKeyCode::Escape => return true,
        _ => (),
    }
    return false;
}

/// Loads the model and either writes a single frame to the output file or
/// launches the window, showing a frame per loop iteration.
pub fn run(params: Params) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(&params.asset_path)?;
    let mut scene = Scene::new(params.width, params.height);
    let mut camera = params.camera;
    let light = Light::default();
    let pool = match params.threads > 1 {
        true => Some(ThreadPool::new(params.threads)),
        false => None,
    };

    if let Some(output_path) = &params.output_path {
        let stats = draw(&mut scene, pool.as_ref(), &mesh, &camera, &light)?;
        info!(
            "Rendered {} of {} triangles, {} fragments written",
            stats.projection.kept(),
            stats.projection.total,
            stats.written
        );
        let image = RgbImage::from_raw(params.width, params.height, frame_data(&scene, params.show_depth))
            .ok_or("frame data does not match image size")?;
        image.save(output_path)?;
        info!("Saved frame to {}", output_path);
        return Ok(());
    }

    let window_options: WindowOptions = WindowOptions {
        size: Some([params.width, params.height]),
        ..Default::default()
    };
    let window = create_window("zbuffer", window_options)?;
    let event_channel = window.event_channel()?;

    let mut exit = false;
    let mut frame_counter_time_begin = time::Instant::now();
    let mut frame_counter: u32 = 0;
    while !exit {
        draw(&mut scene, pool.as_ref(), &mesh, &camera, &light)?;

        let data = frame_data(&scene, params.show_depth);
        let image_data = ImageView::new(ImageInfo::rgb8(params.width, params.height), &data);
        window.set_image("image", image_data)?;

        // Draining events piled up during the frame.
        for window_event in event_channel.try_iter() {
            if let event::WindowEvent::KeyboardInput(event) = window_event {
                if !event.input.state.is_pressed() {
                    continue;
                }
                if let Some(key) = event.input.key_code {
                    exit |= handle_key(&mut camera, key);
                }
            }
        }

        if params.print_fps {
            frame_counter += 1;
            if frame_counter_time_begin.elapsed().as_secs_f32() > 1.0 {
                info!("FPS --- {}", frame_counter);
                frame_counter_time_begin = time::Instant::now();
                frame_counter = 0;
            }
        }
    }

    return Ok(());
}
