//! Camera streams from the Loomo's RealSense module.
//!
//! The vendor Vision service delivers frames through a per-stream callback.
//! [`FrameStream`] turns that callback into a bounded channel the caller reads
//! at its own pace, and stops listening when dropped or when the Vision
//! service unbinds.

use crate::binding::Binding;
use crate::{LoomoError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Frames buffered per stream before new ones are dropped.
pub const FRAME_CHANNEL_CAPACITY: usize = 4;

/// One of the three RealSense streams.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// 640x480 ARGB_8888.
    Color = 1,
    /// 320x240 RGB_565.
    Depth = 2,
    /// 640x480 ALPHA_8.
    FishEye = 256,
}

impl StreamType {
    pub const ALL: [StreamType; 3] = [StreamType::Color, StreamType::FishEye, StreamType::Depth];

    /// Stream id used by the vendor SDK.
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn width(self) -> u32 {
        match self {
            StreamType::Color | StreamType::FishEye => 640,
            StreamType::Depth => 320,
        }
    }

    pub fn height(self) -> u32 {
        match self {
            StreamType::Color | StreamType::FishEye => 480,
            StreamType::Depth => 240,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            StreamType::Color => 4,
            StreamType::FishEye => 1,
            StreamType::Depth => 2,
        }
    }

    /// Byte length of one frame.
    pub fn frame_len(self) -> usize {
        self.width() as usize * self.height() as usize * self.bytes_per_pixel()
    }

    /// Base file name used for snapshots of this stream.
    pub fn snapshot_name(self) -> &'static str {
        match self {
            StreamType::Color => "colorImg",
            StreamType::FishEye => "fishEyeImg",
            StreamType::Depth => "depthImg",
        }
    }

    fn flag(self) -> CameraStreams {
        match self {
            StreamType::Color => CameraStreams::COLOR,
            StreamType::Depth => CameraStreams::DEPTH,
            StreamType::FishEye => CameraStreams::FISH_EYE,
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamType::Color => "COLOR",
            StreamType::Depth => "DEPTH",
            StreamType::FishEye => "FISH_EYE",
        };
        write!(f, "{}({})", name, self.id())
    }
}

bitflags::bitflags! {
    /// Set of camera streams, using the vendor stream ids as bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct CameraStreams: u32 {
        const COLOR    = 1;
        const DEPTH    = 1 << 1;
        const FISH_EYE = 1 << 8;
    }
}

impl CameraStreams {
    /// Selected streams in start order: color, fisheye, depth.
    pub fn streams(self) -> impl Iterator<Item = StreamType> {
        StreamType::ALL
            .into_iter()
            .filter(move |s| self.contains(s.flag()))
    }
}

/// A single camera frame as delivered by the Vision service.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub stream: StreamType,
    pub width: u32,
    pub height: u32,
    /// Raw pixels in the stream's native format.
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(stream: StreamType, data: Vec<u8>) -> Self {
        Self {
            stream,
            width: stream.width(),
            height: stream.height(),
            data,
        }
    }

    /// Check that the pixel buffer has the size the stream geometry requires.
    pub fn validate(&self) -> Result<()> {
        let expected =
            self.width as usize * self.height as usize * self.stream.bytes_per_pixel();
        if self.data.len() != expected {
            return Err(LoomoError::FrameSize {
                stream: self.stream,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Callback the Vision service invokes for each frame of a stream.
pub type FrameCallback = Box<dyn FnMut(Frame) + Send + 'static>;

/// Access to the robot's Vision service.
pub trait CameraSource {
    /// Begin delivering frames of `stream` to `callback`.
    ///
    /// Fails with [`LoomoError::AlreadyStreaming`] if the stream already has a listener.
    fn start_listen(&self, stream: StreamType, callback: FrameCallback) -> Result<()>;

    /// Stop delivering frames of `stream`. Stopping an idle stream is not an error.
    fn stop_listen(&self, stream: StreamType) -> Result<()>;
}

/// State shared between a stream handle, its frame callback and unbind hook.
struct StreamState {
    active: AtomicBool,
    /// Taken on stop so the receiver disconnects even if the source keeps the callback.
    sender: Mutex<Option<Sender<Frame>>>,
}

/// Stop `stream` once; later calls are no-ops.
fn halt<C: CameraSource + ?Sized>(
    source: &C,
    stream: StreamType,
    state: &StreamState,
) -> Result<()> {
    if !state.active.swap(false, Ordering::AcqRel) {
        return Ok(());
    }
    if let Ok(mut sender) = state.sender.lock() {
        sender.take();
    }
    source.stop_listen(stream)?;
    log::info!("{} camera stopped", stream);
    Ok(())
}

/// Handle to an active camera stream.
pub struct FrameStream<C: CameraSource> {
    source: Arc<C>,
    stream: StreamType,
    receiver: Receiver<Frame>,
    state: Arc<StreamState>,
}

impl<C: CameraSource> FrameStream<C> {
    /// Start listening to `stream` on `source`.
    pub fn start(source: Arc<C>, stream: StreamType) -> Result<FrameStream<C>> {
        let (sender, receiver) = crossbeam_channel::bounded(FRAME_CHANNEL_CAPACITY);
        let state = Arc::new(StreamState {
            active: AtomicBool::new(true),
            sender: Mutex::new(Some(sender)),
        });

        let shared = state.clone();
        let callback: FrameCallback = Box::new(move |frame: Frame| {
            let Ok(guard) = shared.sender.lock() else {
                return;
            };
            let Some(sender) = guard.as_ref() else {
                log::trace!("{} stopped, dropping frame", stream);
                return;
            };
            if let Err(e) = sender.try_send(frame) {
                match e {
                    crossbeam_channel::TrySendError::Full(_) => {
                        log::trace!("{} channel full, dropping frame", stream);
                    }
                    crossbeam_channel::TrySendError::Disconnected(_) => {
                        log::trace!("{} channel disconnected, dropping frame", stream);
                    }
                }
            }
        });

        source.start_listen(stream, callback)?;
        log::info!("{} camera started", stream);

        Ok(FrameStream {
            source,
            stream,
            receiver,
            state,
        })
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream
    }

    /// False once the stream was stopped, by the caller or by an unbind.
    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::Acquire)
    }

    /// Stop this stream when `binding` reports an unbind.
    ///
    /// Buffered frames can still be received; after that `recv` returns
    /// [`LoomoError::StreamStopped`].
    pub fn stop_on_unbind(&self, binding: &Binding)
    where
        C: Send + Sync + 'static,
    {
        let source = self.source.clone();
        let stream = self.stream;
        let state = Arc::downgrade(&self.state);
        binding.watch_unbind(Box::new(move |reason| {
            if let Some(state) = state.upgrade() {
                log::info!("Vision unbound ({}), stopping {} camera", reason, stream);
                if let Err(e) = halt(&*source, stream, &state) {
                    log::warn!("Failed to stop {} camera: {}", stream, e);
                }
            }
            false
        }));
    }

    /// Receive the next frame (blocks until available).
    pub fn recv(&self) -> Result<Frame> {
        self.receiver.recv().map_err(|_| LoomoError::StreamStopped)
    }

    /// Try to receive a frame without blocking.
    pub fn try_recv(&self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// Receive a frame with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Frame> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => LoomoError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => LoomoError::StreamStopped,
        })
    }

    /// Drain the channel and return the newest buffered frame, if any.
    pub fn latest(&self) -> Option<Frame> {
        self.receiver.try_iter().last()
    }

    /// Stop listening and release the stream.
    pub fn stop(self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&self) -> Result<()> {
        halt(&*self.source, self.stream, &self.state)
    }
}

impl<C: CameraSource> Drop for FrameStream<C> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("Failed to stop {} camera: {}", self.stream, e);
        }
    }
}

/// Wait for the Vision service to bind, then start every selected stream.
///
/// Streams already being listened to are stopped and restarted so the
/// returned handles own their listeners. All returned streams stop when the
/// service unbinds.
pub fn start_cameras<C: CameraSource + Send + Sync + 'static>(
    source: &Arc<C>,
    binding: &Binding,
    streams: CameraStreams,
    bind_timeout: Duration,
) -> Result<Vec<FrameStream<C>>> {
    if !binding.is_bound() {
        log::info!(
            "Waiting for {} service to bind before starting cameras",
            binding.name()
        );
    }
    binding.wait_bound(bind_timeout)?;

    let mut started = Vec::new();
    for stream in streams.streams() {
        let handle = match FrameStream::start(source.clone(), stream) {
            Err(LoomoError::AlreadyStreaming(_)) => {
                log::warn!("Already listening to {}, restarting it", stream);
                source.stop_listen(stream)?;
                FrameStream::start(source.clone(), stream)?
            }
            other => other?,
        };
        handle.stop_on_unbind(binding);
        started.push(handle);
    }
    Ok(started)
}
