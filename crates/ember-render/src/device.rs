// SPDX-License-Identifier: CEPL-1.0
//! The GPU collaborator seen from the presentation core.
//!
//! Device selection, memory-type lookup and shader loading stay with the
//! backend; the core only asks for the handles below and records into them.

use std::fmt;

use crate::error::DeviceError;

/// Framebuffer size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SurfaceExtent {
    pub width: u32,
    pub height: u32,
}

impl SurfaceExtent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    B8G8R8A8Srgb,
    B8G8R8A8Unorm,
    R8G8B8A8Srgb,
    R8G8B8A8Unorm,
    A2B10G10R10Unorm,
    R16G16B16A16Sfloat,
    /// Anything else the surface reports, kept by raw backend value.
    Other(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    ExtendedSrgbLinear,
    Hdr10St2084,
    Other(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: PixelFormat,
    pub color_space: ColorSpace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    Fifo,
    FifoRelaxed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthFormat {
    D32Sfloat,
    D32SfloatS8Uint,
    D24UnormS8Uint,
}

impl DepthFormat {
    /// Probe order used when picking a depth attachment format.
    pub const CANDIDATES: [DepthFormat; 3] = [
        DepthFormat::D32Sfloat,
        DepthFormat::D32SfloatS8Uint,
        DepthFormat::D24UnormS8Uint,
    ];
}

/// What the surface currently allows.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means "no upper bound".
    pub max_image_count: u32,
    /// `None` when the surface lets the swapchain pick its own size.
    pub current_extent: Option<SurfaceExtent>,
    pub min_extent: SurfaceExtent,
    pub max_extent: SurfaceExtent,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

/// Everything the backend needs to build a swapchain; all choices are
/// already made by [`PresentationSurface`](crate::PresentationSurface).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwapchainDesc {
    pub image_count: u32,
    pub format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: SurfaceExtent,
}

/// Outcome of asking the presentation engine for the next image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireResult {
    Image { index: u32, suboptimal: bool },
    OutOfDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapStatus {
    Optimal,
    Suboptimal,
    OutOfDate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearValues {
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: u32,
}

/// Logical device plus graphics/present queue, as consumed by the core.
///
/// Destroy calls must only be issued once the GPU no longer references the
/// handle; owners in this crate wait for [`GpuDevice::wait_idle`] first.
pub trait GpuDevice {
    /// Swapchain together with its images and their views.
    type Swapchain;
    /// Depth image, its memory and its view.
    type DepthImage;
    type RenderPass;
    type Framebuffer;
    type Semaphore: Copy;
    type Fence: Copy + PartialEq + fmt::Debug;
    type CommandBuffer: Copy + PartialEq + fmt::Debug;
    /// Buffer with its bound memory.
    type Buffer;
    type Pipeline;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities, DeviceError>;
    /// True if `format` is usable as an optimally tiled depth-stencil attachment.
    fn supports_depth_format(&self, format: DepthFormat) -> bool;

    /// `retired` is the swapchain being replaced, if any. It stays owned by
    /// the caller and is destroyed separately.
    fn create_swapchain(
        &self,
        desc: &SwapchainDesc,
        retired: Option<&Self::Swapchain>,
    ) -> Result<Self::Swapchain, DeviceError>;
    fn swapchain_image_count(&self, swapchain: &Self::Swapchain) -> usize;
    fn destroy_swapchain(&self, swapchain: &Self::Swapchain);

    fn create_depth_image(
        &self,
        format: DepthFormat,
        extent: SurfaceExtent,
    ) -> Result<Self::DepthImage, DeviceError>;
    fn destroy_depth_image(&self, image: &Self::DepthImage);

    fn create_render_pass(
        &self,
        color: PixelFormat,
        depth: DepthFormat,
    ) -> Result<Self::RenderPass, DeviceError>;
    fn destroy_render_pass(&self, pass: &Self::RenderPass);

    fn create_framebuffer(
        &self,
        pass: &Self::RenderPass,
        swapchain: &Self::Swapchain,
        image_index: usize,
        depth: &Self::DepthImage,
        extent: SurfaceExtent,
    ) -> Result<Self::Framebuffer, DeviceError>;
    fn destroy_framebuffer(&self, framebuffer: &Self::Framebuffer);

    fn create_semaphore(&self) -> Result<Self::Semaphore, DeviceError>;
    fn destroy_semaphore(&self, semaphore: Self::Semaphore);
    fn create_fence(&self, signaled: bool) -> Result<Self::Fence, DeviceError>;
    fn destroy_fence(&self, fence: Self::Fence);
    /// Blocks until `fence` is signaled. No timeout is layered on top.
    fn wait_for_fence(&self, fence: Self::Fence) -> Result<(), DeviceError>;
    fn reset_fence(&self, fence: Self::Fence) -> Result<(), DeviceError>;

    fn acquire_next_image(
        &self,
        swapchain: &Self::Swapchain,
        signal: Self::Semaphore,
    ) -> Result<AcquireResult, DeviceError>;
    fn submit(
        &self,
        commands: Self::CommandBuffer,
        wait: Self::Semaphore,
        signal: Self::Semaphore,
        fence: Self::Fence,
    ) -> Result<(), DeviceError>;
    fn present(
        &self,
        swapchain: &Self::Swapchain,
        image_index: u32,
        wait: Self::Semaphore,
    ) -> Result<SwapStatus, DeviceError>;
    /// Waits for every queue of the device to drain.
    fn wait_idle(&self) -> Result<(), DeviceError>;

    fn allocate_command_buffers(
        &self,
        count: usize,
    ) -> Result<Vec<Self::CommandBuffer>, DeviceError>;
    fn free_command_buffers(&self, buffers: &[Self::CommandBuffer]);
    fn begin_commands(&self, commands: Self::CommandBuffer) -> Result<(), DeviceError>;
    fn end_commands(&self, commands: Self::CommandBuffer) -> Result<(), DeviceError>;

    /// Begins `pass` on `framebuffer` and sets a full-extent viewport and scissor.
    fn cmd_begin_render_pass(
        &self,
        commands: Self::CommandBuffer,
        pass: &Self::RenderPass,
        framebuffer: &Self::Framebuffer,
        extent: SurfaceExtent,
        clear: ClearValues,
    );
    fn cmd_end_render_pass(&self, commands: Self::CommandBuffer);
    fn cmd_bind_pipeline(&self, commands: Self::CommandBuffer, pipeline: &Self::Pipeline);
    fn cmd_push_constants(
        &self,
        commands: Self::CommandBuffer,
        pipeline: &Self::Pipeline,
        data: &[u8],
    );
    fn cmd_bind_vertex_buffer(&self, commands: Self::CommandBuffer, buffer: &Self::Buffer);
    fn cmd_draw(&self, commands: Self::CommandBuffer, vertex_count: u32);

    /// Host-visible, host-coherent vertex buffer of exactly `size` bytes.
    fn create_vertex_buffer(&self, size: u64) -> Result<Self::Buffer, DeviceError>;
    /// Maps the buffer, copies `data` to offset 0 and unmaps.
    fn write_buffer(&self, buffer: &Self::Buffer, data: &[u8]) -> Result<(), DeviceError>;
    fn destroy_buffer(&self, buffer: &Self::Buffer);

    fn destroy_pipeline(&self, pipeline: &Self::Pipeline);
}
