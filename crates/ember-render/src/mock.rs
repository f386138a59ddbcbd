// SPDX-License-Identifier: CEPL-1.0
//! GPU-less collaborators for unit tests.
//!
//! `MockDevice` hands out integer handles, keeps an event log of everything
//! recorded, and tracks fence state the way a driver would. It also collects
//! violations: submitting into an image whose last fence is still pending,
//! waiting on a fence nobody will signal, or destroying anything while GPU
//! work is outstanding.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::device::{
    AcquireResult, ClearValues, ColorSpace, DepthFormat, GpuDevice, PixelFormat, PresentMode,
    SurfaceCapabilities, SurfaceExtent, SurfaceFormat, SwapStatus, SwapchainDesc,
};
use crate::error::DeviceError;
use crate::window::WindowSurface;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MockSwapchain {
    pub id: u64,
    pub image_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MockEvent {
    CreateSwapchain {
        id: u64,
        retired: Option<u64>,
        desc: SwapchainDesc,
    },
    WaitFence(u64),
    ResetFence(u64),
    Acquire {
        swapchain: u64,
        image: Option<u32>,
    },
    Submit {
        commands: u64,
        fence: u64,
    },
    Present {
        swapchain: u64,
        image: u32,
    },
    WaitIdle,
    AllocateCommandBuffers(usize),
    FreeCommandBuffers(usize),
    BeginCommands(u64),
    EndCommands(u64),
    BeginRenderPass {
        framebuffer: u64,
        extent: SurfaceExtent,
        clear: ClearValues,
    },
    EndRenderPass,
    BindPipeline(u64),
    PushConstants(Vec<u8>),
    BindVertexBuffer(u64),
    Draw {
        vertex_count: u32,
    },
    WriteBuffer {
        bytes: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FenceState {
    Signaled,
    Unsignaled,
    Pending,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LiveCounts {
    pub swapchains: usize,
    pub depth_images: usize,
    pub render_passes: usize,
    pub framebuffers: usize,
    pub semaphores: usize,
    pub fences: usize,
    pub command_buffers: usize,
    pub buffers: usize,
    pub pipelines: usize,
}

impl LiveCounts {
    pub fn is_empty(&self) -> bool {
        *self == LiveCounts::default()
    }
}

struct MockState {
    caps: SurfaceCapabilities,
    supported_depth: Vec<DepthFormat>,
    next_handle: u64,
    live: LiveCounts,
    buffers: HashMap<u64, u64>,
    fences: HashMap<u64, FenceState>,

    acquire_script: VecDeque<AcquireResult>,
    present_script: VecDeque<SwapStatus>,
    current_extent_script: VecDeque<Option<SurfaceExtent>>,
    acquire_counter: u32,
    last_acquired: Option<(u64, u32)>,
    image_owner: HashMap<(u64, u32), u64>,

    fail_buffer_write: bool,
    fail_submit: bool,
    framebuffer_budget: Option<usize>,

    events: Vec<MockEvent>,
    violations: Vec<String>,
}

impl MockState {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check_idle(&mut self, what: &str) {
        if self.fences.values().any(|&s| s == FenceState::Pending) {
            self.violations
                .push(format!("{what} destroyed while GPU work is pending"));
        }
    }
}

pub(crate) struct MockDevice {
    state: Mutex<MockState>,
}

fn default_capabilities() -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 4,
        current_extent: None,
        min_extent: SurfaceExtent::new(1, 1),
        max_extent: SurfaceExtent::new(4096, 4096),
        formats: vec![
            SurfaceFormat {
                format: PixelFormat::B8G8R8A8Srgb,
                color_space: ColorSpace::SrgbNonlinear,
            },
            SurfaceFormat {
                format: PixelFormat::R8G8B8A8Unorm,
                color_space: ColorSpace::SrgbNonlinear,
            },
        ],
        present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
    }
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                caps: default_capabilities(),
                supported_depth: DepthFormat::CANDIDATES.to_vec(),
                next_handle: 0,
                live: LiveCounts::default(),
                buffers: HashMap::new(),
                fences: HashMap::new(),
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                current_extent_script: VecDeque::new(),
                acquire_counter: 0,
                last_acquired: None,
                image_owner: HashMap::new(),
                fail_buffer_write: false,
                fail_submit: false,
                framebuffer_budget: None,
                events: Vec::new(),
                violations: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_capabilities(&self, caps: SurfaceCapabilities) {
        self.state().caps = caps;
    }

    pub fn update_capabilities(&self, f: impl FnOnce(&mut SurfaceCapabilities)) {
        f(&mut self.state().caps);
    }

    pub fn set_supported_depth(&self, formats: &[DepthFormat]) {
        self.state().supported_depth = formats.to_vec();
    }

    /// Outcomes returned by the next acquires, before falling back to
    /// round-robin image indices.
    pub fn script_acquire(&self, results: impl IntoIterator<Item = AcquireResult>) {
        self.state().acquire_script.extend(results);
    }

    pub fn script_present(&self, results: impl IntoIterator<Item = SwapStatus>) {
        self.state().present_script.extend(results);
    }

    /// `current_extent` reported by the next capability queries, one per
    /// query; the last value sticks.
    pub fn script_current_extent(
        &self,
        extents: impl IntoIterator<Item = Option<SurfaceExtent>>,
    ) {
        self.state().current_extent_script.extend(extents);
    }

    pub fn fail_next_submit(&self) {
        self.state().fail_submit = true;
    }

    pub fn fail_next_buffer_write(&self) {
        self.state().fail_buffer_write = true;
    }

    /// Lets `n` more framebuffers be created, then fails.
    pub fn fail_after_framebuffers(&self, n: usize) {
        self.state().framebuffer_budget = Some(n);
    }

    /// Stands in for the backend's pipeline factory.
    pub fn create_pipeline(&self) -> u64 {
        let mut s = self.state();
        s.live.pipelines += 1;
        s.handle()
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    pub fn violations(&self) -> Vec<String> {
        self.state().violations.clone()
    }

    pub fn live_counts(&self) -> LiveCounts {
        self.state().live
    }

    pub fn live_buffers(&self) -> usize {
        self.state().live.buffers
    }

    pub fn buffer_sizes(&self) -> Vec<u64> {
        let mut sizes: Vec<_> = self.state().buffers.values().copied().collect();
        sizes.sort_unstable();
        sizes
    }
}

impl GpuDevice for MockDevice {
    type Swapchain = MockSwapchain;
    type DepthImage = u64;
    type RenderPass = u64;
    type Framebuffer = u64;
    type Semaphore = u64;
    type Fence = u64;
    type CommandBuffer = u64;
    type Buffer = u64;
    type Pipeline = u64;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities, DeviceError> {
        let mut s = self.state();
        if let Some(current) = s.current_extent_script.pop_front() {
            s.caps.current_extent = current;
        }
        Ok(s.caps.clone())
    }

    fn supports_depth_format(&self, format: DepthFormat) -> bool {
        self.state().supported_depth.contains(&format)
    }

    fn create_swapchain(
        &self,
        desc: &SwapchainDesc,
        retired: Option<&MockSwapchain>,
    ) -> Result<MockSwapchain, DeviceError> {
        let mut s = self.state();
        let id = s.handle();
        s.live.swapchains += 1;
        s.events.push(MockEvent::CreateSwapchain {
            id,
            retired: retired.map(|r| r.id),
            desc: *desc,
        });
        Ok(MockSwapchain {
            id,
            image_count: desc.image_count as usize,
        })
    }

    fn swapchain_image_count(&self, swapchain: &MockSwapchain) -> usize {
        swapchain.image_count
    }

    fn destroy_swapchain(&self, swapchain: &MockSwapchain) {
        let mut s = self.state();
        s.check_idle("swapchain");
        s.live.swapchains -= 1;
        let id = swapchain.id;
        s.image_owner.retain(|(sc, _), _| *sc != id);
    }

    fn create_depth_image(
        &self,
        _format: DepthFormat,
        _extent: SurfaceExtent,
    ) -> Result<u64, DeviceError> {
        let mut s = self.state();
        s.live.depth_images += 1;
        Ok(s.handle())
    }

    fn destroy_depth_image(&self, _image: &u64) {
        let mut s = self.state();
        s.check_idle("depth image");
        s.live.depth_images -= 1;
    }

    fn create_render_pass(
        &self,
        _color: PixelFormat,
        _depth: DepthFormat,
    ) -> Result<u64, DeviceError> {
        let mut s = self.state();
        s.live.render_passes += 1;
        Ok(s.handle())
    }

    fn destroy_render_pass(&self, _pass: &u64) {
        let mut s = self.state();
        s.check_idle("render pass");
        s.live.render_passes -= 1;
    }

    fn create_framebuffer(
        &self,
        _pass: &u64,
        _swapchain: &MockSwapchain,
        _image_index: usize,
        _depth: &u64,
        _extent: SurfaceExtent,
    ) -> Result<u64, DeviceError> {
        let mut s = self.state();
        match s.framebuffer_budget {
            Some(0) => {
                return Err(DeviceError::OutOfDeviceMemory);
            }
            Some(n) => s.framebuffer_budget = Some(n - 1),
            None => {}
        }
        s.live.framebuffers += 1;
        Ok(s.handle())
    }

    fn destroy_framebuffer(&self, _framebuffer: &u64) {
        let mut s = self.state();
        s.check_idle("framebuffer");
        s.live.framebuffers -= 1;
    }

    fn create_semaphore(&self) -> Result<u64, DeviceError> {
        let mut s = self.state();
        s.live.semaphores += 1;
        Ok(s.handle())
    }

    fn destroy_semaphore(&self, _semaphore: u64) {
        let mut s = self.state();
        s.check_idle("semaphore");
        s.live.semaphores -= 1;
    }

    fn create_fence(&self, signaled: bool) -> Result<u64, DeviceError> {
        let mut s = self.state();
        let fence = s.handle();
        let state = if signaled {
            FenceState::Signaled
        } else {
            FenceState::Unsignaled
        };
        s.fences.insert(fence, state);
        s.live.fences += 1;
        Ok(fence)
    }

    fn destroy_fence(&self, fence: u64) {
        let mut s = self.state();
        s.check_idle("fence");
        s.fences.remove(&fence);
        s.live.fences -= 1;
    }

    fn wait_for_fence(&self, fence: u64) -> Result<(), DeviceError> {
        let mut s = self.state();
        s.events.push(MockEvent::WaitFence(fence));
        match s.fences.get(&fence).copied() {
            Some(FenceState::Pending) => {
                // The simulated GPU finishes the work the moment someone waits.
                s.fences.insert(fence, FenceState::Signaled);
            }
            Some(FenceState::Signaled) => {}
            Some(FenceState::Unsignaled) => s
                .violations
                .push(format!("wait on fence {fence} that nothing will signal")),
            None => s.violations.push(format!("wait on unknown fence {fence}")),
        }
        Ok(())
    }

    fn reset_fence(&self, fence: u64) -> Result<(), DeviceError> {
        let mut s = self.state();
        s.events.push(MockEvent::ResetFence(fence));
        if s.fences.get(&fence) == Some(&FenceState::Pending) {
            s.violations
                .push(format!("reset of fence {fence} while its work is pending"));
        }
        s.fences.insert(fence, FenceState::Unsignaled);
        Ok(())
    }

    fn acquire_next_image(
        &self,
        swapchain: &MockSwapchain,
        _signal: u64,
    ) -> Result<AcquireResult, DeviceError> {
        let mut s = self.state();
        let result = match s.acquire_script.pop_front() {
            Some(scripted) => scripted,
            None => {
                let index = s.acquire_counter % swapchain.image_count as u32;
                s.acquire_counter += 1;
                AcquireResult::Image {
                    index,
                    suboptimal: false,
                }
            }
        };
        let image = match result {
            AcquireResult::Image { index, .. } => Some(index),
            AcquireResult::OutOfDate => None,
        };
        s.last_acquired = image.map(|i| (swapchain.id, i));
        s.events.push(MockEvent::Acquire {
            swapchain: swapchain.id,
            image,
        });
        Ok(result)
    }

    fn submit(
        &self,
        commands: u64,
        _wait: u64,
        _signal: u64,
        fence: u64,
    ) -> Result<(), DeviceError> {
        let mut s = self.state();
        if std::mem::take(&mut s.fail_submit) {
            return Err(DeviceError::DeviceLost);
        }
        s.events.push(MockEvent::Submit { commands, fence });

        if s.fences.get(&fence) != Some(&FenceState::Unsignaled) {
            s.violations
                .push(format!("submit with fence {fence} that was not reset"));
        }
        if let Some(target) = s.last_acquired.take() {
            if let Some(&owner) = s.image_owner.get(&target) {
                if owner != fence && s.fences.get(&owner) == Some(&FenceState::Pending) {
                    s.violations.push(format!(
                        "image {} submitted while fence {owner} still renders into it",
                        target.1
                    ));
                }
            }
            s.image_owner.insert(target, fence);
        }
        s.fences.insert(fence, FenceState::Pending);
        Ok(())
    }

    fn present(
        &self,
        swapchain: &MockSwapchain,
        image_index: u32,
        _wait: u64,
    ) -> Result<SwapStatus, DeviceError> {
        let mut s = self.state();
        s.events.push(MockEvent::Present {
            swapchain: swapchain.id,
            image: image_index,
        });
        Ok(s.present_script.pop_front().unwrap_or(SwapStatus::Optimal))
    }

    fn wait_idle(&self) -> Result<(), DeviceError> {
        let mut s = self.state();
        s.events.push(MockEvent::WaitIdle);
        for state in s.fences.values_mut() {
            if *state == FenceState::Pending {
                *state = FenceState::Signaled;
            }
        }
        Ok(())
    }

    fn allocate_command_buffers(&self, count: usize) -> Result<Vec<u64>, DeviceError> {
        let mut s = self.state();
        s.events.push(MockEvent::AllocateCommandBuffers(count));
        s.live.command_buffers += count;
        Ok((0..count).map(|_| s.handle()).collect())
    }

    fn free_command_buffers(&self, buffers: &[u64]) {
        let mut s = self.state();
        s.check_idle("command buffers");
        s.events.push(MockEvent::FreeCommandBuffers(buffers.len()));
        s.live.command_buffers -= buffers.len();
    }

    fn begin_commands(&self, commands: u64) -> Result<(), DeviceError> {
        self.state().events.push(MockEvent::BeginCommands(commands));
        Ok(())
    }

    fn end_commands(&self, commands: u64) -> Result<(), DeviceError> {
        self.state().events.push(MockEvent::EndCommands(commands));
        Ok(())
    }

    fn cmd_begin_render_pass(
        &self,
        _commands: u64,
        _pass: &u64,
        framebuffer: &u64,
        extent: SurfaceExtent,
        clear: ClearValues,
    ) {
        self.state().events.push(MockEvent::BeginRenderPass {
            framebuffer: *framebuffer,
            extent,
            clear,
        });
    }

    fn cmd_end_render_pass(&self, _commands: u64) {
        self.state().events.push(MockEvent::EndRenderPass);
    }

    fn cmd_bind_pipeline(&self, _commands: u64, pipeline: &u64) {
        self.state().events.push(MockEvent::BindPipeline(*pipeline));
    }

    fn cmd_push_constants(&self, _commands: u64, _pipeline: &u64, data: &[u8]) {
        self.state()
            .events
            .push(MockEvent::PushConstants(data.to_vec()));
    }

    fn cmd_bind_vertex_buffer(&self, _commands: u64, buffer: &u64) {
        self.state().events.push(MockEvent::BindVertexBuffer(*buffer));
    }

    fn cmd_draw(&self, _commands: u64, vertex_count: u32) {
        self.state().events.push(MockEvent::Draw { vertex_count });
    }

    fn create_vertex_buffer(&self, size: u64) -> Result<u64, DeviceError> {
        let mut s = self.state();
        let buffer = s.handle();
        s.buffers.insert(buffer, size);
        s.live.buffers += 1;
        Ok(buffer)
    }

    fn write_buffer(&self, _buffer: &u64, data: &[u8]) -> Result<(), DeviceError> {
        let mut s = self.state();
        if std::mem::take(&mut s.fail_buffer_write) {
            return Err(DeviceError::Backend {
                op: "map_memory",
                code: -1,
            });
        }
        s.events.push(MockEvent::WriteBuffer { bytes: data.len() });
        Ok(())
    }

    fn destroy_buffer(&self, buffer: &u64) {
        let mut s = self.state();
        s.check_idle("buffer");
        s.buffers.remove(buffer);
        s.live.buffers -= 1;
    }

    fn destroy_pipeline(&self, _pipeline: &u64) {
        let mut s = self.state();
        s.check_idle("pipeline");
        s.live.pipelines -= 1;
    }
}

/// Window whose extent changes only when the test says so, or when
/// `wait_events` drains the next queued extent.
pub(crate) struct MockWindow {
    extent: SurfaceExtent,
    queued: VecDeque<SurfaceExtent>,
    resized: bool,
    waits: usize,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: SurfaceExtent::new(width, height),
            queued: VecDeque::new(),
            resized: false,
            waits: 0,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.extent = SurfaceExtent::new(width, height);
        self.resized = true;
    }

    /// Extents reported one by one on successive `wait_events` calls.
    pub fn queue_extents(&mut self, extents: impl IntoIterator<Item = SurfaceExtent>) {
        self.queued.extend(extents);
    }

    pub fn waits(&self) -> usize {
        self.waits
    }
}

impl WindowSurface for MockWindow {
    fn extent(&self) -> SurfaceExtent {
        self.extent
    }

    fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    fn wait_events(&mut self) {
        self.waits += 1;
        match self.queued.pop_front() {
            Some(next) => self.extent = next,
            None => panic!("wait_events would block forever: no queued extent"),
        }
    }
}
