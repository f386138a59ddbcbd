// SPDX-License-Identifier: CEPL-1.0
//! Begin/end-frame protocol over a [`PresentationSurface`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::{AcquireResult, ClearValues, GpuDevice, SurfaceExtent, SwapStatus};
use crate::error::RenderError;
use crate::surface::{
    PresentationSurface, RenderTargetDescription, SurfacePreferences, FRAMES_IN_FLIGHT,
};
use crate::window::WindowSurface;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameControllerConfig {
    pub clear_color: [f32; 4],
    pub preferences: SurfacePreferences,
}

impl Default for FrameControllerConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.1, 0.1, 0.1, 1.0],
            preferences: SurfacePreferences::default(),
        }
    }
}

/// The recording context of the frame in progress.
///
/// Returned by [`FrameController::begin_frame`] and handed back to
/// [`FrameController::end_frame`].
pub struct Frame<D: GpuDevice> {
    pub(crate) command_buffer: D::CommandBuffer,
    pub(crate) frame_index: usize,
    pub(crate) image_index: u32,
    pub(crate) extent: SurfaceExtent,
    pub(crate) render_pass_active: bool,
    pub(crate) bound_geometry: Option<u64>,
}

impl<D: GpuDevice> Frame<D> {
    pub fn command_buffer(&self) -> D::CommandBuffer {
        self.command_buffer
    }

    /// Frame slot, always in `0..FRAMES_IN_FLIGHT`.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Swapchain image this frame renders into.
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    pub fn extent(&self) -> SurfaceExtent {
        self.extent
    }

    pub fn is_render_pass_active(&self) -> bool {
        self.render_pass_active
    }
}

pub struct FrameController<D: GpuDevice, W: WindowSurface> {
    device: Arc<D>,
    window: W,
    config: FrameControllerConfig,
    surface: PresentationSurface<D>,
    command_buffers: Vec<D::CommandBuffer>,

    frame_index: usize,
    image_index: u32,
    frame_started: bool,
    rebuilds: u64,
}

impl<D: GpuDevice, W: WindowSurface> FrameController<D, W> {
    pub fn new(
        device: Arc<D>,
        mut window: W,
        config: FrameControllerConfig,
    ) -> Result<Self, RenderError> {
        let extent = wait_for_extent(device.as_ref(), &mut window)?;
        let surface =
            PresentationSurface::new(Arc::clone(&device), extent, None, &config.preferences)?;

        let mut controller = Self {
            device,
            window,
            config,
            surface,
            command_buffers: Vec::new(),
            frame_index: 0,
            image_index: 0,
            frame_started: false,
            rebuilds: 0,
        };
        controller.ensure_command_buffers()?;
        Ok(controller)
    }

    pub fn is_frame_in_progress(&self) -> bool {
        self.frame_started
    }

    /// Slot the next (or current) frame records into.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn surface(&self) -> &PresentationSurface<D> {
        &self.surface
    }

    pub fn render_pass(&self) -> &D::RenderPass {
        self.surface.render_pass()
    }

    pub fn render_target_description(&self) -> RenderTargetDescription {
        self.surface.render_target_description()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface.extent().aspect_ratio()
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    /// Acquires the next image and starts recording into this slot's command
    /// buffer. `Ok(None)` means the surface was rebuilt and the frame should
    /// be skipped.
    pub fn begin_frame(&mut self) -> Result<Option<Frame<D>>, RenderError> {
        if self.frame_started {
            return Err(RenderError::FrameInProgress);
        }

        let image_index = match self.surface.acquire_next_image(self.frame_index)? {
            AcquireResult::OutOfDate => {
                self.rebuild()?;
                return Ok(None);
            }
            AcquireResult::Image { index, .. } => index,
        };

        let command_buffer = self.command_buffers[self.frame_index];
        self.device.begin_commands(command_buffer)?;

        self.image_index = image_index;
        self.frame_started = true;

        Ok(Some(Frame {
            command_buffer,
            frame_index: self.frame_index,
            image_index,
            extent: self.surface.extent(),
            render_pass_active: false,
            bound_geometry: None,
        }))
    }

    /// Finishes recording, submits and presents. Rebuilds the surface when it
    /// went stale or suboptimal, or when the window was resized. The frame
    /// slot advances either way.
    pub fn end_frame(&mut self, frame: Frame<D>) -> Result<(), RenderError> {
        self.check_current(&frame)?;
        if frame.render_pass_active {
            return Err(RenderError::RenderPassActive);
        }

        self.device.end_commands(frame.command_buffer)?;
        let status = self.surface.submit_and_present(
            self.frame_index,
            frame.command_buffer,
            self.image_index,
        )?;
        let resized = self.window.take_resized();

        self.frame_started = false;
        self.frame_index = (self.frame_index + 1) % FRAMES_IN_FLIGHT;

        if status != SwapStatus::Optimal || resized {
            debug!(?status, resized, "end_frame: rebuilding surface");
            self.rebuild()?;
        }
        Ok(())
    }

    /// Begins the swapchain render pass on the frame's image, clearing color
    /// and depth.
    pub fn begin_render_pass(&self, frame: &mut Frame<D>) -> Result<(), RenderError> {
        self.check_current(frame)?;
        if frame.render_pass_active {
            return Err(RenderError::RenderPassActive);
        }

        let clear = ClearValues {
            color: self.config.clear_color,
            depth: 1.0,
            stencil: 0,
        };
        self.device.cmd_begin_render_pass(
            frame.command_buffer,
            self.surface.render_pass(),
            self.surface.framebuffer(frame.image_index),
            self.surface.extent(),
            clear,
        );
        frame.render_pass_active = true;
        Ok(())
    }

    pub fn end_render_pass(&self, frame: &mut Frame<D>) -> Result<(), RenderError> {
        self.check_current(frame)?;
        if !frame.render_pass_active {
            return Err(RenderError::RenderPassNotActive);
        }
        self.device.cmd_end_render_pass(frame.command_buffer);
        frame.render_pass_active = false;
        Ok(())
    }

    fn check_current(&self, frame: &Frame<D>) -> Result<(), RenderError> {
        if !self.frame_started {
            return Err(RenderError::NoFrameInProgress);
        }
        if frame.frame_index != self.frame_index
            || frame.command_buffer != self.command_buffers[self.frame_index]
        {
            return Err(RenderError::ForeignFrame);
        }
        Ok(())
    }

    // STRICT ORDER:
    // 1) wait until both the window and the surface report a non-zero extent
    //    (minimised windows cannot present)
    // 2) device idle, so nothing still reads the old surface
    // 3) build the new surface against the old one
    // 4) refuse a format drift; pipelines were built for the old formats
    // 5) drop the old surface, then fit the command buffers
    fn rebuild(&mut self) -> Result<(), RenderError> {
        let extent = wait_for_extent(self.device.as_ref(), &mut self.window)?;
        self.device.wait_idle()?;

        let next = PresentationSurface::new(
            Arc::clone(&self.device),
            extent,
            Some(&self.surface),
            &self.config.preferences,
        )?;
        if !self.surface.is_format_compatible(&next) {
            let before = self.surface.snapshot();
            let after = next.snapshot();
            return Err(RenderError::FormatChanged {
                before: (before.color, before.depth),
                after: (after.color, after.depth),
            });
        }

        drop(std::mem::replace(&mut self.surface, next));
        self.ensure_command_buffers()?;
        self.rebuilds += 1;

        info!(
            "surface rebuilt ({}x{}, {} images, rebuild #{})",
            extent.width,
            extent.height,
            self.surface.image_count(),
            self.rebuilds
        );
        Ok(())
    }

    // One command buffer per frame slot; only (re)allocated when the count
    // is off, never per frame.
    fn ensure_command_buffers(&mut self) -> Result<(), RenderError> {
        if self.command_buffers.len() == FRAMES_IN_FLIGHT {
            return Ok(());
        }
        if !self.command_buffers.is_empty() {
            self.device.free_command_buffers(&self.command_buffers);
            self.command_buffers.clear();
        }
        self.command_buffers = self.device.allocate_command_buffers(FRAMES_IN_FLIGHT)?;
        debug!(count = FRAMES_IN_FLIGHT, "command buffers allocated");
        Ok(())
    }
}

impl<D: GpuDevice, W: WindowSurface> Drop for FrameController<D, W> {
    fn drop(&mut self) {
        let _ = self.device.wait_idle();
        if !self.command_buffers.is_empty() {
            self.device.free_command_buffers(&self.command_buffers);
        }
    }
}

// The surface may still report 0x0 for a moment after the window came back
// (or the other way round); neither may be built into a swapchain.
fn wait_for_extent<D: GpuDevice, W: WindowSurface>(
    device: &D,
    window: &mut W,
) -> Result<SurfaceExtent, RenderError> {
    let mut warned = false;
    loop {
        let extent = window.extent();
        if !extent.is_zero() {
            let caps = device.surface_capabilities()?;
            if !caps.current_extent.is_some_and(|e| e.is_zero()) {
                return Ok(extent);
            }
        }
        if !warned {
            warn!("surface extent is 0x0, waiting for it to be restored");
            warned = true;
        }
        window.wait_events();
    }
}
