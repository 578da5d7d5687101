use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::scene::Scene;
use crate::tracer::RayTracer;

enum Message {
    Row(usize),
    Terminate,
}

struct Worker {
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(
        receiver: Arc<Mutex<Receiver<Message>>>,
        scene: Arc<Scene>,
        camera: Arc<Camera>,
        canvas: Arc<Mutex<Canvas>>,
    ) -> Worker {
        let thread = thread::spawn(move || {
            let tracer = RayTracer::new(&scene);
            let mut rng = SmallRng::from_entropy();

            loop {
                let message = receiver.lock().unwrap().recv().unwrap();
                match message {
                    Message::Row(row) => {
                        let colors = camera.render_row(&tracer, row, &mut rng);
                        let mut canvas = canvas.lock().unwrap();
                        for (col, color) in colors.into_iter().enumerate() {
                            canvas.write_pixel(col, row, color);
                        }
                    }
                    Message::Terminate => break,
                }
            }
        });

        Worker {
            thread: Some(thread),
        }
    }
}

/// A fixed pool of render workers pulling image rows off a shared queue.
/// Dropping the pool terminates and joins every worker.
struct RenderPool {
    workers: Vec<Worker>,
    sender: Sender<Message>,
}

impl RenderPool {
    fn new(
        size: usize,
        scene: Arc<Scene>,
        camera: Arc<Camera>,
        canvas: Arc<Mutex<Canvas>>,
    ) -> RenderPool {
        assert!(size > 0);

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|_| {
                Worker::new(
                    Arc::clone(&receiver),
                    Arc::clone(&scene),
                    Arc::clone(&camera),
                    Arc::clone(&canvas),
                )
            })
            .collect();

        RenderPool { workers, sender }
    }

    fn execute(&self, message: Message) {
        self.sender.send(message).unwrap();
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        for _ in &self.workers {
            self.sender.send(Message::Terminate).unwrap();
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                thread.join().unwrap();
            }
        }
    }
}

/// Renders the scene across `threads` worker threads, one image row per
/// work item.
pub fn parallel_render(scene: Arc<Scene>, camera: Arc<Camera>, threads: usize) -> Canvas {
    let rows = camera.image_height();
    let canvas = Arc::new(Mutex::new(Canvas::new(camera.image_width(), rows)));

    log::info!("rendering {} rows on {} threads", rows, threads);
    {
        let pool = RenderPool::new(threads, scene, camera, Arc::clone(&canvas));
        for row in 0..rows {
            pool.execute(Message::Row(row));
        }
        // RenderPool::drop waits for every queued row to finish.
    }

    let canvas = canvas.lock().unwrap();
    canvas.clone()
}

/* Tests */

#[cfg(test)]
use crate::camera::{CameraSettings, Sampling};
#[cfg(test)]
use crate::color::Color;
#[cfg(test)]
use crate::light::Light;
#[cfg(test)]
use crate::material::Material;
#[cfg(test)]
use crate::shape::Shape;
#[cfg(test)]
use crate::tuple::{Point, Vector};

#[test]
fn parallel_render_matches_sequential() {
    let scene = Scene::new()
        .with_background(Color::rgb(0.1, 0.1, 0.1))
        .with_shape(
            Shape::sphere(Point::new(0.0, 0.0, -5.0), 1.5)
                .unwrap()
                .with_material(Material::new().with_kd(0.6).with_ks(0.3).with_shininess(20)),
        )
        .with_light(Light::directional(
            Color::white(),
            Vector::new(0.0, -1.0, -1.0),
        ));
    let camera = Camera::new(CameraSettings {
        position: Point::ORIGIN,
        to: Vector::new(0.0, 0.0, -1.0),
        up: Vector::new(0.0, 1.0, 0.0),
        width: 4.0,
        height: 4.0,
        distance: 2.0,
        image_width: 8,
        image_height: 8,
        sampling: Sampling::Single,
    })
    .unwrap();

    let tracer = RayTracer::new(&scene);
    let mut rng = SmallRng::seed_from_u64(7);
    let sequential = camera.render(&tracer, &mut rng);

    let parallel = parallel_render(Arc::new(scene), Arc::new(camera), 3);

    for row in 0..8 {
        for col in 0..8 {
            assert_eq!(parallel.read_pixel(col, row), sequential.read_pixel(col, row));
        }
    }
}
