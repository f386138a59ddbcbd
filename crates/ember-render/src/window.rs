// SPDX-License-Identifier: CEPL-1.0
use crate::device::SurfaceExtent;

/// Window-side collaborator of the frame controller.
pub trait WindowSurface {
    /// Current framebuffer size; zero in either dimension while minimised.
    fn extent(&self) -> SurfaceExtent;

    /// Returns whether a resize happened since the last call, and clears the flag.
    fn take_resized(&mut self) -> bool;

    /// Blocks until the window system has something new to report.
    fn wait_events(&mut self);
}
