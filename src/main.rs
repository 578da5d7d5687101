use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use glimmer::camera::{Camera, Sampling};
use glimmer::consts::{DEFAULT_AA_DEPTH, DEFAULT_AA_SAMPLES, DEFAULT_THREADS};
use glimmer::error::BuildError;
use glimmer::parallel::parallel_render;
use glimmer::scene;
use glimmer::tracer::RayTracer;

#[derive(Parser)]
#[clap(author, version, about = "A Whitted-style recursive ray tracer")]
struct Args {
    /// Scene description file (JSON)
    scene: PathBuf,

    /// Output image path (plain-text PPM)
    #[clap(short, long, default_value = "out.ppm")]
    output: PathBuf,

    /// Number of render threads
    #[clap(short = 'j', long, default_value_t = DEFAULT_THREADS)]
    threads: usize,

    /// Override the scene's anti-aliasing: none, jitter[:samples] or
    /// adaptive[:depth]
    #[clap(long)]
    aa: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        log::error!("{}", err);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), BuildError> {
    let (scene, mut settings) = scene::load(&args.scene)?;
    if let Some(aa) = &args.aa {
        settings.sampling = parse_aa(aa)?;
    }
    let camera = Camera::new(settings)?;

    let start = Instant::now();
    let canvas = if args.threads <= 1 {
        let tracer = RayTracer::new(&scene);
        let mut rng = SmallRng::from_entropy();
        camera.render(&tracer, &mut rng)
    } else {
        parallel_render(Arc::new(scene), Arc::new(camera), args.threads)
    };
    log::info!("rendered in {:.2?}", start.elapsed());

    canvas.save(&args.output)?;
    Ok(())
}

fn parse_aa(aa: &str) -> Result<Sampling, BuildError> {
    let (mode, arg) = match aa.split_once(':') {
        Some((mode, arg)) => (mode, Some(arg)),
        None => (aa, None),
    };

    let unknown = || BuildError::UnknownType {
        what: "sampling mode",
        ty: aa.to_string(),
    };

    match mode {
        "none" => Ok(Sampling::Single),
        "jitter" => Ok(Sampling::Jittered {
            samples: match arg {
                None => DEFAULT_AA_SAMPLES,
                Some(n) => n.parse().map_err(|_| unknown())?,
            },
        }),
        "adaptive" => Ok(Sampling::Adaptive {
            depth: match arg {
                None => DEFAULT_AA_DEPTH,
                Some(d) => d.parse().map_err(|_| unknown())?,
            },
        }),
        _ => Err(unknown()),
    }
}
