// SPDX-License-Identifier: CEPL-1.0
use thiserror::Error;

use crate::device::{DepthFormat, SurfaceFormat};

/// Failures reported by a [`GpuDevice`](crate::GpuDevice) implementation.
///
/// Out-of-date and suboptimal surfaces are not errors; they travel as
/// [`SwapStatus`](crate::SwapStatus) / [`AcquireResult`](crate::AcquireResult).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("out of device memory")]
    OutOfDeviceMemory,
    #[error("device lost")]
    DeviceLost,
    #[error("surface lost")]
    SurfaceLost,
    #[error("no memory type satisfies the requested properties")]
    NoSuitableMemoryType,
    #[error("{op} failed (code {code})")]
    Backend { op: &'static str, code: i32 },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("geometry needs at least 3 vertices, got {count}")]
    InvalidGeometry { count: usize },
    #[error("none of the candidate depth formats is supported by the device")]
    NoSupportedDepthFormat,
    #[error("surface advertises no formats")]
    NoSurfaceFormats,
    #[error("swap chain formats changed across rebuild ({before:?} -> {after:?})")]
    FormatChanged {
        before: (SurfaceFormat, DepthFormat),
        after: (SurfaceFormat, DepthFormat),
    },
    #[error("begin_frame called while a frame is already in progress")]
    FrameInProgress,
    #[error("no frame in progress")]
    NoFrameInProgress,
    #[error("frame does not belong to the frame slot in progress")]
    ForeignFrame,
    #[error("no render pass is active on this frame")]
    RenderPassNotActive,
    #[error("render pass is still active on this frame")]
    RenderPassActive,
    #[error("draw issued without binding this geometry first")]
    UnboundGeometry,
    #[error("presentation surface is stale and must be rebuilt")]
    SurfaceStale,
    #[error(transparent)]
    Device(#[from] DeviceError),
}
