mod app;

use std::env;

use zbuffer::Camera;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 800;

/// Value following a flag, parsed into the expected type.
fn flag_value<T: std::str::FromStr>(args: &[String], i: usize) -> Result<T, Box<dyn std::error::Error>> {
    let flag = &args[i];
    let value = args.get(i + 1).ok_or_else(|| format!("missing value after {}", flag))?;
    return value
        .parse::<T>()
        .map_err(|_| format!("invalid value '{}' for {}", value, flag).into());
}

#[show_image::main]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Default values.
    let mut asset_path = None;
    let mut output_path = None;
    let mut width = WIDTH;
    let mut height = HEIGHT;
    let mut camera = Camera::default();
    let mut threads = 1;
    let mut print_fps = false;
    let mut show_depth = false;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-p" => { asset_path = Some(flag_value::<String>(&args, i)?); i += 1; }
            "-o" => { output_path = Some(flag_value::<String>(&args, i)?); i += 1; }
            "-W" => { width = flag_value(&args, i)?; i += 1; }
            "-H" => { height = flag_value(&args, i)?; i += 1; }
            "-d" => { camera.distance = flag_value(&args, i)?; i += 1; }
            "-x" => { camera.pitch = flag_value(&args, i)?; i += 1; }
            "-y" => { camera.yaw = flag_value(&args, i)?; i += 1; }
            "-t" => { threads = flag_value(&args, i)?; i += 1; }
            "-z" => { show_depth = true; }
            "--fps" => { print_fps = true; }
            other => { log::warn!("Ignoring unknown argument {}", other); }
        }
        i += 1;
    }

    let Some(asset_path) = asset_path else {
        eprintln!("Usage: zbuffer -p <file.obj> [-o out.png] [-W width] [-H height] [-d distance] [-x pitch] [-y yaw] [-t threads] [-z] [--fps]");
        return Ok(());
    };
    if width == 0 || height == 0 {
        return Err("image size must be positive".into());
    }

    let params = app::Params {
        width,
        height,
        print_fps,
        asset_path,
        output_path,
        show_depth,
        camera,
        threads: threads.max(1),
    };

    app::run(params)?;

    return Ok(());
}
