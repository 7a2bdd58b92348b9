use crate::types::{
    BaseImu, BaseTick, HeadPoseJoint, HeadPoseWorld, Pose2D, Surroundings, WheelSpeed,
};
use crate::Result;
use std::sync::Arc;

/// Access to the robot's sensor service.
///
/// Each read queries the hardware once and may fail with
/// [`LoomoError::SensorUnavailable`](crate::LoomoError::SensorUnavailable) when the
/// service is not bound or the query fails.
///
/// Reads must be reentrant if the same source is shared between threads, e.g. a
/// [`SensorPoller`](crate::SensorPoller) and a UI thread capturing on demand.
pub trait SensorSource {
    fn read_surroundings(&self) -> Result<Surroundings>;
    fn read_wheel_speed(&self) -> Result<WheelSpeed>;
    fn read_head_pose_world(&self) -> Result<HeadPoseWorld>;
    fn read_head_pose_joint(&self) -> Result<HeadPoseJoint>;
    fn read_base_imu(&self) -> Result<BaseImu>;
    fn read_base_tick(&self) -> Result<BaseTick>;
    fn read_pose_2d(&self) -> Result<Pose2D>;
}

macro_rules! forward_source {
    ($($ty:ty),*) => {$(
        impl<S: SensorSource + ?Sized> SensorSource for $ty {
            fn read_surroundings(&self) -> Result<Surroundings> {
                (**self).read_surroundings()
            }
            fn read_wheel_speed(&self) -> Result<WheelSpeed> {
                (**self).read_wheel_speed()
            }
            fn read_head_pose_world(&self) -> Result<HeadPoseWorld> {
                (**self).read_head_pose_world()
            }
            fn read_head_pose_joint(&self) -> Result<HeadPoseJoint> {
                (**self).read_head_pose_joint()
            }
            fn read_base_imu(&self) -> Result<BaseImu> {
                (**self).read_base_imu()
            }
            fn read_base_tick(&self) -> Result<BaseTick> {
                (**self).read_base_tick()
            }
            fn read_pose_2d(&self) -> Result<Pose2D> {
                (**self).read_pose_2d()
            }
        }
    )*};
}

forward_source!(&S, Box<S>, Arc<S>);
