//! VRLink: device tracking and compositor plumbing for the stereo viewer.
//!
//! - `runtime`: the trait a VR runtime backend implements (pose queries,
//!   event queue, async model loaders, compositor submit).
//! - `session`: runtime lifetime; open before rendering, shut down on drop.
//! - `registry`: slot -> role mapping plus the controller asset loader
//!   state machine (pending model, pending texture, ready, failed; all
//!   polling is bounded).
//! - `pose`: row-major rigid-transform conversion and per-slot retention.
//! - `frame`: per-eye / mirror view math and the audio pulse transforms.
//! - `sim`: a deterministic in-process runtime (1 HMD + 2 controllers).

pub mod frame;
pub mod pose;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod sim;
pub mod types;

pub use registry::{ControllerAsset, DeviceRegistry};
pub use runtime::VrRuntime;
pub use session::Session;
pub use types::{
    DeviceEvent, DeviceRole, DeviceSlot, Eye, EyeFrame, LoadPoll, ModelVertex, RenderModel,
    TextureMap, TrackedPose,
};

use thiserror::Error;

/// Fatal: the runtime could not be brought up. No rendering may start.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("VR runtime unreachable: {0}")]
    Unreachable(String),
    #[error("VR runtime reports zero device slots")]
    NoDeviceSlots,
}

/// Per-slot, non-fatal: the slot keeps tracking but draws nothing.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("slot {0}: no render model name property")]
    MissingModelName(DeviceSlot),
    #[error("slot {0}: render model load failed")]
    Model(DeviceSlot),
    #[error("slot {0}: diffuse texture load failed")]
    Texture(DeviceSlot),
    #[error("slot {0}: asset load timed out")]
    TimedOut(DeviceSlot),
}

/// Per-eye, per-frame, non-fatal: logged and retried next frame.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("compositor rejected {eye:?} frame: {reason}")]
    Rejected { eye: Eye, reason: String },
}
