//! Poll a simulated Loomo and write sensor rows as CSV to stdout.
//!
//! Usage: cargo run --example poll_csv
//! Tuning: LOOMO_POLL_INTERVAL_MS, LOOMO_CSV_DELIMITER, LOOMO_CSV_HEADER

use loomo_telemetry::*;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Drives in a slow circle; the ultrasonic sensor drops out now and then.
struct SimulatedLoomo {
    step: AtomicU64,
}

impl SimulatedLoomo {
    fn t(&self) -> f32 {
        self.step.load(Ordering::Relaxed) as f32 * 0.01
    }
}

impl SensorSource for SimulatedLoomo {
    fn read_surroundings(&self) -> Result<Surroundings> {
        let n = self.step.fetch_add(1, Ordering::Relaxed);
        if n % 50 == 49 {
            return Err(LoomoError::SensorUnavailable(SensorKind::Surroundings));
        }
        Ok(Surroundings {
            infrared_left: 900 + (n % 7) as i32,
            infrared_right: 880 + (n % 5) as i32,
            ultrasonic: 400 + (n % 300) as i32,
        })
    }
    fn read_wheel_speed(&self) -> Result<WheelSpeed> {
        Ok(WheelSpeed {
            speed_left: 0.3,
            speed_right: 0.35,
        })
    }
    fn read_head_pose_world(&self) -> Result<HeadPoseWorld> {
        Ok(HeadPoseWorld {
            pitch: 0.1,
            roll: 0.0,
            yaw: 0.0,
        })
    }
    fn read_head_pose_joint(&self) -> Result<HeadPoseJoint> {
        Ok(HeadPoseJoint {
            pitch: 0.1,
            roll: 0.0,
            yaw: self.t().sin() * 0.5,
        })
    }
    fn read_base_imu(&self) -> Result<BaseImu> {
        Ok(BaseImu {
            pitch: 0.02,
            roll: 0.0,
            yaw: self.t() * 0.2,
        })
    }
    fn read_base_tick(&self) -> Result<BaseTick> {
        let t = self.t();
        Ok(BaseTick {
            left: (t * 30.0) as i32,
            right: (t * 35.0) as i32,
        })
    }
    fn read_pose_2d(&self) -> Result<Pose2D> {
        let t = self.t();
        Ok(Pose2D {
            x: 1000.0 * (t * 0.2).cos(),
            y: 1000.0 * (t * 0.2).sin(),
            theta: t * 0.2,
            linear_velocity: 0.32,
            angular_velocity: 0.2,
        })
    }
}

fn main() {
    env_logger::init();

    let (binding, listener) = Binding::new("Sensor");
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        listener.on_bind();
    });

    let policy = RetryPolicy::from_env();
    if let Err(e) = policy.run("Sensor bind", |_| binding.wait_bound(Duration::from_millis(100))) {
        eprintln!("Sensor service never bound: {}", e);
        std::process::exit(1);
    }

    let source = SimulatedLoomo {
        step: AtomicU64::new(0),
    };
    let poller = match SensorPoller::start(source, PollConfig::from_env()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to start poller: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = RowWriter::from_env(io::BufWriter::new(stdout.lock()));

    while out.rows() < 200 {
        match poller.recv_timeout(Duration::from_secs(2)) {
            Ok(sensors) => {
                if out.rows() % 50 == 0 {
                    eprintln!("{}", sensors);
                }
                if let Err(e) = out.write(&sensors) {
                    eprintln!("Error: {}", e);
                    break;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    let _ = out.flush();
    eprintln!(
        "{} rows written, {} failed captures",
        out.rows(),
        poller.failures()
    );
}
