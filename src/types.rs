//! Sensor records reported by the Loomo base and head.
//!
//! Units follow the vendor SDK: distances in millimeters, angles in radians,
//! linear velocity in m/s, angular velocity in rad/s. One odometer tick equals
//! one centimeter of wheel travel when the tires are properly inflated.

use std::fmt;

/// Closest distance the ultrasonic sensor reports reliably, in millimeters.
/// Readings below this are a known sensor artifact.
pub const ULTRASONIC_MIN_RANGE_MM: i32 = 250;
/// Farthest useful ultrasonic distance, in millimeters.
pub const ULTRASONIC_MAX_RANGE_MM: i32 = 1500;
/// Ultrasonic field of view in degrees.
pub const ULTRASONIC_FOV_DEG: f32 = 40.0;

/// Closest infrared range, in the raw units the vendor SDK reports.
pub const INFRARED_MIN_RANGE: f32 = 40.0;
/// Farthest infrared range, in raw vendor units.
pub const INFRARED_MAX_RANGE: f32 = 40.0;
/// Infrared field of view in degrees.
pub const INFRARED_FOV_DEG: f32 = 40.0;

/// Meters of wheel travel per odometer tick.
pub const METERS_PER_TICK: f64 = 0.01;

/// Identifies one leaf sensor read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Surroundings,
    Pose2D,
    BaseTick,
    WheelSpeed,
    HeadPoseWorld,
    HeadPoseJoint,
    BaseImu,
}

impl SensorKind {
    /// Read order used when aggregating a full snapshot.
    pub const ALL: [SensorKind; 7] = [
        SensorKind::Surroundings,
        SensorKind::Pose2D,
        SensorKind::BaseTick,
        SensorKind::WheelSpeed,
        SensorKind::HeadPoseWorld,
        SensorKind::HeadPoseJoint,
        SensorKind::BaseImu,
    ];

    /// Column prefix used in exported rows.
    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Surroundings => "surroundings",
            SensorKind::Pose2D => "pose2D",
            SensorKind::BaseTick => "baseTick",
            SensorKind::WheelSpeed => "wheelSpeed",
            SensorKind::HeadPoseWorld => "headPoseWorld",
            SensorKind::HeadPoseJoint => "headPoseJoint",
            SensorKind::BaseImu => "baseImu",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Infrared and ultrasonic obstacle readings, in raw sensor units.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Surroundings {
    pub infrared_left: i32,
    pub infrared_right: i32,
    pub ultrasonic: i32,
}

impl Surroundings {
    /// Ultrasonic distance, or `None` when the reading is below the reliable range.
    pub fn ultrasonic_mm(&self) -> Option<i32> {
        (self.ultrasonic >= ULTRASONIC_MIN_RANGE_MM).then_some(self.ultrasonic)
    }
}

impl fmt::Display for Surroundings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Surroundings(infrared_left={}, infrared_right={}, ultrasonic={})",
            self.infrared_left, self.infrared_right, self.ultrasonic
        )
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeed {
    pub speed_left: f32,
    pub speed_right: f32,
}

impl fmt::Display for WheelSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WheelSpeed(speed_left={}, speed_right={})",
            self.speed_left, self.speed_right
        )
    }
}

macro_rules! attitude {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct $name {
            pub pitch: f32,
            pub roll: f32,
            pub yaw: f32,
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "(pitch={}, roll={}, yaw={})"),
                    self.pitch, self.roll, self.yaw
                )
            }
        }
    };
}

attitude!(
    /// Head orientation in the world frame. `yaw` is always 0 on current hardware.
    HeadPoseWorld
);
attitude!(
    /// Head orientation from the joint encoders.
    HeadPoseJoint
);
attitude!(
    /// Base orientation from the base IMU.
    BaseImu
);

/// Wheel odometer counters. Counters may wrap per hardware.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseTick {
    pub left: i32,
    pub right: i32,
}

impl BaseTick {
    pub fn left_distance_m(&self) -> f64 {
        self.left as f64 * METERS_PER_TICK
    }

    pub fn right_distance_m(&self) -> f64 {
        self.right as f64 * METERS_PER_TICK
    }
}

impl fmt::Display for BaseTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BaseTick(left={}, right={})", self.left, self.right)
    }
}

/// Planar robot pose plus instantaneous velocities.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2D {
    /// X position in millimeters.
    pub x: f32,
    /// Y position in millimeters.
    pub y: f32,
    /// Heading in radians.
    pub theta: f32,
    /// m/s
    pub linear_velocity: f32,
    /// rad/s
    pub angular_velocity: f32,
}

impl fmt::Display for Pose2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose2D(x={}, y={}, theta={}, linear_velocity={}, angular_velocity={})",
            self.x, self.y, self.theta, self.linear_velocity, self.angular_velocity
        )
    }
}

/// One consistent snapshot of every tracked sensor.
///
/// Built fresh on each poll by [`AllSensors::capture`](crate::AllSensors::capture);
/// `timestamp_ms` is the capture time of the whole snapshot in epoch milliseconds.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AllSensors {
    pub surroundings: Surroundings,
    pub pose_2d: Pose2D,
    pub base_tick: BaseTick,
    pub wheel_speed: WheelSpeed,
    pub head_pose_world: HeadPoseWorld,
    pub head_pose_joint: HeadPoseJoint,
    pub base_imu: BaseImu,
    pub timestamp_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ultrasonic_below_min_range_is_invalid() {
        let near = Surroundings {
            ultrasonic: 120,
            ..Default::default()
        };
        assert_eq!(near.ultrasonic_mm(), None);

        let edge = Surroundings {
            ultrasonic: ULTRASONIC_MIN_RANGE_MM,
            ..Default::default()
        };
        assert_eq!(edge.ultrasonic_mm(), Some(250));
    }

    #[test]
    fn test_attitude_display() {
        let imu = BaseImu {
            pitch: 0.5,
            roll: -0.25,
            yaw: 0.0,
        };
        assert_eq!(imu.to_string(), "BaseImu(pitch=0.5, roll=-0.25, yaw=0)");
    }

    #[test]
    fn test_tick_distance() {
        let ticks = BaseTick { left: 150, right: -20 };
        assert!((ticks.left_distance_m() - 1.5).abs() < 1e-12);
        assert!((ticks.right_distance_m() + 0.2).abs() < 1e-12);
    }
}
