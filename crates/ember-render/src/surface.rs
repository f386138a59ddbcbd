// SPDX-License-Identifier: CEPL-1.0
//! Swap-chain resource manager: presentable images, depth images, render pass,
//! framebuffers and the per-slot synchronization objects.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::{
    AcquireResult, ColorSpace, DepthFormat, GpuDevice, PixelFormat, PresentMode,
    SurfaceCapabilities, SurfaceExtent, SurfaceFormat, SwapStatus, SwapchainDesc,
};
use crate::error::RenderError;

/// Number of frame slots whose GPU work may overlap.
pub const FRAMES_IN_FLIGHT: usize = 2;

const PREFERRED_FORMAT: SurfaceFormat = SurfaceFormat {
    format: PixelFormat::B8G8R8A8Srgb,
    color_space: ColorSpace::SrgbNonlinear,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PresentModePreference {
    /// Mailbox when offered, FIFO otherwise.
    #[default]
    LowLatency,
    /// Always FIFO.
    Vsync,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SurfacePreferences {
    pub present_mode: PresentModePreference,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    Live,
    /// The presentation engine reported the swapchain out of date.
    Stale,
}

/// Immutable summary of the choices a surface was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub color: SurfaceFormat,
    pub depth: DepthFormat,
    pub present_mode: PresentMode,
}

impl SurfaceSnapshot {
    /// Color and depth formats match; present mode may differ.
    pub fn is_format_compatible(&self, other: &SurfaceSnapshot) -> bool {
        self.color.format == other.color.format && self.depth == other.depth
    }
}

/// What a pipeline has to be compatible with to draw into this surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTargetDescription {
    pub color_format: PixelFormat,
    pub depth_format: DepthFormat,
    pub extent: SurfaceExtent,
    pub image_count: usize,
}

pub struct PresentationSurface<D: GpuDevice> {
    device: Arc<D>,
    snapshot: SurfaceSnapshot,
    extent: SurfaceExtent,
    state: SurfaceState,

    swapchain: Option<D::Swapchain>,
    depth_images: Vec<D::DepthImage>,
    render_pass: Option<D::RenderPass>,
    framebuffers: Vec<D::Framebuffer>,

    image_available: Vec<D::Semaphore>,
    render_finished: Vec<D::Semaphore>,
    in_flight: Vec<D::Fence>,
    // Fence of the slot that last rendered into each image.
    images_in_flight: Vec<Option<D::Fence>>,
}

impl<D: GpuDevice> PresentationSurface<D> {
    /// Builds every presentation resource for `requested` pixels.
    ///
    /// When `previous` is given its formats are preferred, and its swapchain
    /// is handed to the backend as the one being retired. The caller must make
    /// sure `previous` is idle before dropping it.
    pub fn new(
        device: Arc<D>,
        requested: SurfaceExtent,
        previous: Option<&PresentationSurface<D>>,
        preferences: &SurfacePreferences,
    ) -> Result<Self, RenderError> {
        let caps = device.surface_capabilities()?;
        let prior = previous.map(|p| p.snapshot);

        let color = choose_surface_format(&caps.formats, prior.map(|s| s.color))?;
        let present_mode = choose_present_mode(&caps.present_modes, preferences.present_mode);
        let extent = choose_extent(&caps, requested);
        let image_count = choose_image_count(&caps);
        let depth = choose_depth_format(device.as_ref(), prior.map(|s| s.depth))?;

        info!(
            "surface: format {:?} / {:?}, depth {:?}, present_mode {:?}, extent {}x{}, images(min={} → requested={})",
            color.format,
            color.color_space,
            depth,
            present_mode,
            extent.width,
            extent.height,
            caps.min_image_count,
            image_count,
        );

        // Partially built surfaces are torn down by Drop.
        let mut surface = Self {
            device: Arc::clone(&device),
            snapshot: SurfaceSnapshot {
                color,
                depth,
                present_mode,
            },
            extent,
            state: SurfaceState::Live,
            swapchain: None,
            depth_images: Vec::new(),
            render_pass: None,
            framebuffers: Vec::new(),
            image_available: Vec::with_capacity(FRAMES_IN_FLIGHT),
            render_finished: Vec::with_capacity(FRAMES_IN_FLIGHT),
            in_flight: Vec::with_capacity(FRAMES_IN_FLIGHT),
            images_in_flight: Vec::new(),
        };

        let desc = SwapchainDesc {
            image_count,
            format: color,
            present_mode,
            extent,
        };
        let retired = previous.and_then(|p| p.swapchain.as_ref());
        let swapchain = device.create_swapchain(&desc, retired)?;
        let images = device.swapchain_image_count(&swapchain);
        let swapchain = surface.swapchain.insert(swapchain);

        for _ in 0..images {
            surface
                .depth_images
                .push(device.create_depth_image(depth, extent)?);
        }

        let render_pass = surface
            .render_pass
            .insert(device.create_render_pass(color.format, depth)?);

        for (i, depth_image) in surface.depth_images.iter().enumerate() {
            let framebuffer =
                device.create_framebuffer(render_pass, swapchain, i, depth_image, extent)?;
            surface.framebuffers.push(framebuffer);
        }

        for _ in 0..FRAMES_IN_FLIGHT {
            surface.image_available.push(device.create_semaphore()?);
            surface.render_finished.push(device.create_semaphore()?);
            surface.in_flight.push(device.create_fence(true)?);
        }
        surface.images_in_flight = vec![None; images];

        debug!(images, "presentation surface ready");
        Ok(surface)
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.snapshot
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == SurfaceState::Live
    }

    pub fn extent(&self) -> SurfaceExtent {
        self.extent
    }

    pub fn image_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn render_pass(&self) -> &D::RenderPass {
        self.render_pass
            .as_ref()
            .expect("render pass exists on a constructed surface")
    }

    pub fn framebuffer(&self, image_index: u32) -> &D::Framebuffer {
        &self.framebuffers[image_index as usize]
    }

    pub fn render_target_description(&self) -> RenderTargetDescription {
        RenderTargetDescription {
            color_format: self.snapshot.color.format,
            depth_format: self.snapshot.depth,
            extent: self.extent,
            image_count: self.image_count(),
        }
    }

    /// True iff color and depth formats match `other`.
    pub fn is_format_compatible(&self, other: &PresentationSurface<D>) -> bool {
        self.snapshot.is_format_compatible(&other.snapshot)
    }

    /// Waits until the GPU is done with `slot`'s previous frame, then asks for
    /// the next image, signalling the slot's image-available semaphore.
    pub fn acquire_next_image(&mut self, slot: usize) -> Result<AcquireResult, RenderError> {
        if self.state == SurfaceState::Stale {
            return Err(RenderError::SurfaceStale);
        }

        // The fence stays signaled until submit resets it, so an out-of-date
        // acquire never leaves the slot waiting on work that was never sent.
        self.device.wait_for_fence(self.in_flight[slot])?;

        let result = self
            .device
            .acquire_next_image(self.swapchain(), self.image_available[slot])?;
        match result {
            AcquireResult::OutOfDate => {
                info!(slot, "acquire: surface out of date");
                self.state = SurfaceState::Stale;
            }
            AcquireResult::Image {
                suboptimal: true,
                index,
            } => warn!(slot, index, "acquire: surface suboptimal"),
            AcquireResult::Image { .. } => {}
        }
        Ok(result)
    }

    /// Submits `commands` for `slot` and presents `image_index` once rendering
    /// has finished.
    pub fn submit_and_present(
        &mut self,
        slot: usize,
        commands: D::CommandBuffer,
        image_index: u32,
    ) -> Result<SwapStatus, RenderError> {
        let image = image_index as usize;
        let fence = self.in_flight[slot];

        // Images can come back out of slot order; another slot may still be
        // rendering into this one.
        if let Some(previous) = self.images_in_flight[image] {
            if previous != fence {
                self.device.wait_for_fence(previous)?;
            }
        }

        self.device.reset_fence(fence)?;
        if let Err(e) = self.device.submit(
            commands,
            self.image_available[slot],
            self.render_finished[slot],
            fence,
        ) {
            self.replace_unsubmitted_fence(slot)?;
            return Err(e.into());
        }
        self.images_in_flight[image] = Some(fence);

        let status = self
            .device
            .present(self.swapchain(), image_index, self.render_finished[slot])?;
        match status {
            SwapStatus::OutOfDate => {
                info!(slot, image_index, "present: surface out of date");
                self.state = SurfaceState::Stale;
            }
            SwapStatus::Suboptimal => warn!(slot, image_index, "present: surface suboptimal"),
            SwapStatus::Optimal => {}
        }
        Ok(status)
    }

    // A reset fence whose submit failed would never signal again, and the
    // next acquire on the slot waits on it. Swap in a signaled one.
    fn replace_unsubmitted_fence(&mut self, slot: usize) -> Result<(), RenderError> {
        let fresh = self.device.create_fence(true)?;
        let stale = std::mem::replace(&mut self.in_flight[slot], fresh);
        for owner in &mut self.images_in_flight {
            if *owner == Some(stale) {
                *owner = None;
            }
        }
        self.device.destroy_fence(stale);
        warn!(slot, "submit failed, frame fence replaced");
        Ok(())
    }

    fn swapchain(&self) -> &D::Swapchain {
        self.swapchain
            .as_ref()
            .expect("swapchain exists on a constructed surface")
    }
}

impl<D: GpuDevice> Drop for PresentationSurface<D> {
    fn drop(&mut self) {
        let d = &self.device;
        let _ = d.wait_idle();

        for fb in &self.framebuffers {
            d.destroy_framebuffer(fb);
        }
        if let Some(pass) = &self.render_pass {
            d.destroy_render_pass(pass);
        }
        for depth in &self.depth_images {
            d.destroy_depth_image(depth);
        }
        if let Some(swapchain) = &self.swapchain {
            d.destroy_swapchain(swapchain);
        }
        for &s in self.image_available.iter().chain(&self.render_finished) {
            d.destroy_semaphore(s);
        }
        for &f in &self.in_flight {
            d.destroy_fence(f);
        }
    }
}

/// The predecessor's format if still offered, then B8G8R8A8_SRGB with an
/// sRGB non-linear color space, then whatever the surface lists first.
pub fn choose_surface_format(
    formats: &[SurfaceFormat],
    previous: Option<SurfaceFormat>,
) -> Result<SurfaceFormat, RenderError> {
    if let Some(prev) = previous.filter(|p| formats.contains(p)) {
        return Ok(prev);
    }
    if formats.contains(&PREFERRED_FORMAT) {
        return Ok(PREFERRED_FORMAT);
    }
    formats.first().copied().ok_or(RenderError::NoSurfaceFormats)
}

pub fn choose_present_mode(
    modes: &[PresentMode],
    preference: PresentModePreference,
) -> PresentMode {
    match preference {
        PresentModePreference::LowLatency if modes.contains(&PresentMode::Mailbox) => {
            PresentMode::Mailbox
        }
        _ => PresentMode::Fifo,
    }
}

pub fn choose_extent(caps: &SurfaceCapabilities, requested: SurfaceExtent) -> SurfaceExtent {
    if let Some(current) = caps.current_extent {
        return current;
    }
    SurfaceExtent {
        width: requested
            .width
            .clamp(caps.min_extent.width, caps.max_extent.width),
        height: requested
            .height
            .clamp(caps.min_extent.height, caps.max_extent.height),
    }
}

/// One more than the minimum so acquire rarely waits on the driver, capped
/// by the maximum (0 meaning unbounded).
pub fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let wanted = caps.min_image_count + 1;
    if caps.max_image_count == 0 {
        wanted
    } else {
        wanted.min(caps.max_image_count)
    }
}

pub fn choose_depth_format<D: GpuDevice>(
    device: &D,
    previous: Option<DepthFormat>,
) -> Result<DepthFormat, RenderError> {
    previous
        .into_iter()
        .chain(DepthFormat::CANDIDATES)
        .find(|&f| device.supports_depth_format(f))
        .ok_or(RenderError::NoSupportedDepthFormat)
}
