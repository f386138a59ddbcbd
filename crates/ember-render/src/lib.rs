// SPDX-License-Identifier: CEPL-1.0
//! Frame-presentation core: swap-chain ownership, frames in flight, and
//! per-object draw emission on top of an abstract GPU device.
//!
//! Everything here talks to the GPU through [`GpuDevice`] and to the window
//! through [`WindowSurface`]; the Vulkan implementation lives in
//! `ember-render-vk`.

pub mod device;
pub mod draw_pass;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod object;
pub mod surface;
pub mod window;

#[cfg(test)]
mod mock;

pub use device::{
    AcquireResult, ClearValues, ColorSpace, DepthFormat, GpuDevice, PixelFormat, PresentMode,
    SurfaceCapabilities, SurfaceExtent, SurfaceFormat, SwapStatus, SwapchainDesc,
};
pub use draw_pass::{DrawPass, DrawPushConstants, DEFAULT_ROTATION_STEP};
pub use error::{DeviceError, RenderError};
pub use frame::{Frame, FrameController, FrameControllerConfig};
pub use geometry::{GeometryBuffer, Vertex};
pub use object::{DrawableObject, ObjectId, Scene, Transform2D};
pub use surface::{
    PresentModePreference, PresentationSurface, RenderTargetDescription, SurfacePreferences,
    SurfaceSnapshot, SurfaceState, FRAMES_IN_FLIGHT,
};
pub use window::WindowSurface;
