//! Snapshot capture and the flat row layout used for export.
//!
//! Row layout (positional, must stay in sync with [`AllSensors::to_row`]):
//!
//! | Columns | Source |
//! |---------|--------|
//! | 0       | capture timestamp (epoch ms) |
//! | 1..4    | surroundings: IR left, IR right, ultrasonic |
//! | 4..9    | pose2D: x, y, theta, linear velocity, angular velocity |
//! | 9..11   | baseTick: left, right |
//! | 11..13  | wheelSpeed: left, right |
//! | 13..22  | headPoseWorld, headPoseJoint, baseImu: roll, pitch, yaw each |
//!
//! Attitude records are stored pitch/roll/yaw but exported roll/pitch/yaw.
//!
//! Floats render with Rust's shortest round-trip `Display` (`0.1f32` is `"0.1"`,
//! `1.0f32` is `"1"`); integers render in decimal.

use crate::source::SensorSource;
use crate::types::AllSensors;
use crate::Result;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of columns in [`AllSensors::header`] and [`AllSensors::to_row`].
pub const COLUMN_COUNT: usize = 22;

static HEADER: [&str; COLUMN_COUNT] = [
    "timeStamp",
    "surroundings_IR_Left",
    "surroundings_IR_Right",
    "surroundings_UltraSonic",
    "pose2D_x",
    "pose2D_y",
    "pose2D_theta",
    "pose2D_linearVelocity",
    "pose2D_angularVelocity",
    "baseTick_left",
    "baseTick_right",
    "wheelSpeed_SpeedLeft",
    "wheelSpeed_SpeedRight",
    "headPoseWorld_roll",
    "headPoseWorld_pitch",
    "headPoseWorld_yaw",
    "headPoseJoint_roll",
    "headPoseJoint_pitch",
    "headPoseJoint_yaw",
    "baseImu_roll",
    "baseImu_pitch",
    "baseImu_yaw",
];

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl AllSensors {
    /// Read every sensor once and stamp the snapshot with the current time.
    ///
    /// Reads run in the order surroundings, pose2D, baseTick, wheelSpeed,
    /// headPoseWorld, headPoseJoint, baseImu. The first failing read aborts the
    /// capture and its error is returned unchanged.
    pub fn capture<S: SensorSource + ?Sized>(source: &S) -> Result<AllSensors> {
        Self::read_all(source, epoch_millis)
    }

    /// Like [`capture`](Self::capture) but with a caller-supplied timestamp.
    pub fn capture_at<S: SensorSource + ?Sized>(source: &S, timestamp_ms: i64) -> Result<AllSensors> {
        Self::read_all(source, || timestamp_ms)
    }

    fn read_all<S, F>(source: &S, clock: F) -> Result<AllSensors>
    where
        S: SensorSource + ?Sized,
        F: FnOnce() -> i64,
    {
        let surroundings = source.read_surroundings()?;
        let pose_2d = source.read_pose_2d()?;
        let base_tick = source.read_base_tick()?;
        let wheel_speed = source.read_wheel_speed()?;
        let head_pose_world = source.read_head_pose_world()?;
        let head_pose_joint = source.read_head_pose_joint()?;
        let base_imu = source.read_base_imu()?;

        Ok(AllSensors {
            surroundings,
            pose_2d,
            base_tick,
            wheel_speed,
            head_pose_world,
            head_pose_joint,
            base_imu,
            timestamp_ms: clock(),
        })
    }

    /// Column names, in row order.
    pub fn header() -> &'static [&'static str; COLUMN_COUNT] {
        &HEADER
    }

    /// Stringified values, in [`header`](Self::header) order.
    pub fn to_row(&self) -> [String; COLUMN_COUNT] {
        let s = &self.surroundings;
        let p = &self.pose_2d;
        let hw = &self.head_pose_world;
        let hj = &self.head_pose_joint;
        let imu = &self.base_imu;
        [
            self.timestamp_ms.to_string(),
            s.infrared_left.to_string(),
            s.infrared_right.to_string(),
            s.ultrasonic.to_string(),
            p.x.to_string(),
            p.y.to_string(),
            p.theta.to_string(),
            p.linear_velocity.to_string(),
            p.angular_velocity.to_string(),
            self.base_tick.left.to_string(),
            self.base_tick.right.to_string(),
            self.wheel_speed.speed_left.to_string(),
            self.wheel_speed.speed_right.to_string(),
            hw.roll.to_string(),
            hw.pitch.to_string(),
            hw.yaw.to_string(),
            hj.roll.to_string(),
            hj.pitch.to_string(),
            hj.yaw.to_string(),
            imu.roll.to_string(),
            imu.pitch.to_string(),
            imu.yaw.to_string(),
        ]
    }

    /// Short status lines: pose and velocity, wheel ticks, obstacle sensors.
    pub fn readout(&self) -> [String; 3] {
        let p = &self.pose_2d;
        let s = &self.surroundings;
        [
            format!(
                "Pose2D: ({}, {}, {})\nVel: {} m/s, {} rad/s",
                p.x, p.y, p.theta, p.linear_velocity, p.angular_velocity
            ),
            format!(
                "Left tick: {}, right tick: {}",
                self.base_tick.left, self.base_tick.right
            ),
            format!(
                "IR_L: {}, Ultrasound: {}, IR_R: {}",
                s.infrared_left, s.ultrasonic, s.infrared_right
            ),
        ]
    }
}

impl fmt::Display for AllSensors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "All sensors:")?;
        writeln!(f, "{}", self.surroundings)?;
        writeln!(f, "{}", self.pose_2d)?;
        writeln!(f, "{}", self.base_tick)?;
        writeln!(f, "{}", self.wheel_speed)?;
        writeln!(f, "{}", self.head_pose_world)?;
        writeln!(f, "{}", self.head_pose_joint)?;
        writeln!(f, "{}", self.base_imu)?;
        write!(f, "Timestamp = {}", self.timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use crate::LoomoError;
    use std::sync::Mutex;

    /// Returns fixed readings and records which sensors were read.
    struct FixedSource {
        fail_on: Option<SensorKind>,
        calls: Mutex<Vec<SensorKind>>,
    }

    impl FixedSource {
        fn new() -> Self {
            Self {
                fail_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(kind: SensorKind) -> Self {
            Self {
                fail_on: Some(kind),
                ..Self::new()
            }
        }

        fn hit(&self, kind: SensorKind) -> crate::Result<()> {
            self.calls.lock().unwrap().push(kind);
            if self.fail_on == Some(kind) {
                return Err(LoomoError::SensorUnavailable(kind));
            }
            Ok(())
        }
    }

    impl SensorSource for FixedSource {
        fn read_surroundings(&self) -> crate::Result<Surroundings> {
            self.hit(SensorKind::Surroundings)?;
            Ok(Surroundings {
                infrared_left: 1,
                infrared_right: 2,
                ultrasonic: 3,
            })
        }
        fn read_wheel_speed(&self) -> crate::Result<WheelSpeed> {
            self.hit(SensorKind::WheelSpeed)?;
            Ok(WheelSpeed {
                speed_left: 1.5,
                speed_right: 1.6,
            })
        }
        fn read_head_pose_world(&self) -> crate::Result<HeadPoseWorld> {
            self.hit(SensorKind::HeadPoseWorld)?;
            Ok(HeadPoseWorld {
                pitch: 0.01,
                roll: 0.02,
                yaw: 0.03,
            })
        }
        fn read_head_pose_joint(&self) -> crate::Result<HeadPoseJoint> {
            self.hit(SensorKind::HeadPoseJoint)?;
            Ok(HeadPoseJoint {
                pitch: 0.04,
                roll: 0.05,
                yaw: 0.06,
            })
        }
        fn read_base_imu(&self) -> crate::Result<BaseImu> {
            self.hit(SensorKind::BaseImu)?;
            Ok(BaseImu {
                pitch: 0.07,
                roll: 0.08,
                yaw: 0.09,
            })
        }
        fn read_base_tick(&self) -> crate::Result<BaseTick> {
            self.hit(SensorKind::BaseTick)?;
            Ok(BaseTick { left: 10, right: 20 })
        }
        fn read_pose_2d(&self) -> crate::Result<Pose2D> {
            self.hit(SensorKind::Pose2D)?;
            Ok(Pose2D {
                x: 0.1,
                y: 0.2,
                theta: 0.3,
                linear_velocity: 0.4,
                angular_velocity: 0.5,
            })
        }
    }

    #[test]
    fn test_row_matches_fixed_readings() {
        let sensors = AllSensors::capture_at(&FixedSource::new(), 1000).unwrap();
        let expected = [
            "1000", "1", "2", "3", "0.1", "0.2", "0.3", "0.4", "0.5", "10", "20", "1.5", "1.6",
            "0.02", "0.01", "0.03", "0.05", "0.04", "0.06", "0.08", "0.07", "0.09",
        ];
        assert_eq!(sensors.to_row(), expected.map(String::from));
    }

    #[test]
    fn test_header_and_row_lengths_agree() {
        let sensors = AllSensors::capture_at(&FixedSource::new(), 7).unwrap();
        assert_eq!(AllSensors::header().len(), COLUMN_COUNT);
        assert_eq!(sensors.to_row().len(), COLUMN_COUNT);
        assert_eq!(AllSensors::header(), AllSensors::header());
        assert_eq!(AllSensors::header()[0], "timeStamp");
        assert_eq!(AllSensors::header()[21], "baseImu_yaw");
    }

    #[test]
    fn test_reads_in_fixed_order() {
        let source = FixedSource::new();
        AllSensors::capture(&source).unwrap();
        assert_eq!(*source.calls.lock().unwrap(), SensorKind::ALL.to_vec());
    }

    #[test]
    fn test_capture_stamps_current_time() {
        let before = epoch_millis();
        let sensors = AllSensors::capture(&FixedSource::new()).unwrap();
        assert!(sensors.timestamp_ms >= before);
        assert!(sensors.timestamp_ms <= epoch_millis());
    }

    #[test]
    fn test_failing_read_aborts_capture() {
        for (i, kind) in SensorKind::ALL.into_iter().enumerate() {
            let source = FixedSource::failing(kind);
            let err = AllSensors::capture_at(&source, 1000).unwrap_err();
            assert!(matches!(err, LoomoError::SensorUnavailable(k) if k == kind));
            // Nothing after the failing read is queried.
            assert_eq!(*source.calls.lock().unwrap(), SensorKind::ALL[..=i].to_vec());
        }
    }

    #[test]
    fn test_display_lists_records_in_order() {
        let sensors = AllSensors::capture_at(&FixedSource::new(), 1000).unwrap();
        let text = sensors.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "All sensors:");
        assert_eq!(lines[1], sensors.surroundings.to_string());
        assert_eq!(lines[2], sensors.pose_2d.to_string());
        assert_eq!(lines[3], "BaseTick(left=10, right=20)");
        assert_eq!(lines[4], sensors.wheel_speed.to_string());
        assert_eq!(lines[5], "HeadPoseWorld(pitch=0.01, roll=0.02, yaw=0.03)");
        assert_eq!(lines[6], sensors.head_pose_joint.to_string());
        assert_eq!(lines[7], sensors.base_imu.to_string());
        assert_eq!(lines[8], "Timestamp = 1000");
    }

    #[test]
    fn test_readout_lines() {
        let sensors = AllSensors::capture_at(&FixedSource::new(), 1000).unwrap();
        let [pose, ticks, obstacles] = sensors.readout();
        assert_eq!(pose, "Pose2D: (0.1, 0.2, 0.3)\nVel: 0.4 m/s, 0.5 rad/s");
        assert_eq!(ticks, "Left tick: 10, right tick: 20");
        assert_eq!(obstacles, "IR_L: 1, Ultrasound: 3, IR_R: 2");
    }
}
