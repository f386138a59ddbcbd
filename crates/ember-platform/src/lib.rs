// SPDX-License-Identifier: CEPL-1.0
//! Window-system side of the engine: re-exports `winit` and adapts a winit
//! window to [`ember_render::WindowSurface`].

use std::sync::Arc;
use std::time::Duration;

use ember_render::{SurfaceExtent, WindowSurface};
use tracing::debug;
use winit::window::Window;

pub use winit;

// How long `wait_events` parks before the extent is queried again.
const MINIMISED_POLL: Duration = Duration::from_millis(16);

/// A winit window as seen by the frame controller.
///
/// The event loop owns event delivery, so the application forwards
/// `WindowEvent::Resized` through [`mark_resized`](Self::mark_resized).
pub struct WinitSurface {
    window: Arc<Window>,
    resized: bool,
}

impl WinitSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            resized: false,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn mark_resized(&mut self) {
        self.resized = true;
    }
}

impl WindowSurface for WinitSurface {
    fn extent(&self) -> SurfaceExtent {
        let size = self.window.inner_size();
        SurfaceExtent::new(size.width, size.height)
    }

    fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    // winit 0.30 cannot pump events from inside a handler; park briefly and
    // let the caller re-query the size. The app stops drawing while the
    // window is zero-sized, so this only runs on a racing minimise.
    //
    // Limit: nothing is pumped here. Where `inner_size` only changes when the
    // event loop delivers a configure (Wayland), a window that stays 0x0
    // keeps this loop parked until the handler returns, which it never does.
    // Callers must not draw while the app sees a zero-sized window.
    fn wait_events(&mut self) {
        debug!("window minimised, parking {:?}", MINIMISED_POLL);
        std::thread::sleep(MINIMISED_POLL);
    }
}
