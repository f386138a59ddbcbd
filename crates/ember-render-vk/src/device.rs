// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use ember_render::{
    AcquireResult, ClearValues, DepthFormat, DeviceError, GpuDevice, PixelFormat,
    SurfaceCapabilities, SurfaceExtent, SwapStatus, SwapchainDesc,
};
use tracing::debug;

use crate::conv::{self, device_error};
use crate::VulkanDevice;

pub struct VkSwapchain {
    pub(crate) handle: vk::SwapchainKHR,
    pub(crate) images: Vec<vk::Image>,
    pub(crate) views: Vec<vk::ImageView>,
}

pub struct VkDepthImage {
    pub(crate) image: vk::Image,
    pub(crate) memory: vk::DeviceMemory,
    pub(crate) view: vk::ImageView,
}

pub struct VkBuffer {
    pub(crate) buffer: vk::Buffer,
    pub(crate) memory: vk::DeviceMemory,
    pub(crate) size: vk::DeviceSize,
}

pub struct VkPipeline {
    pub(crate) layout: vk::PipelineLayout,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) push_stages: vk::ShaderStageFlags,
}

impl VulkanDevice {
    fn find_memory_type(
        &self,
        type_bits: u32,
        req: vk::MemoryPropertyFlags,
    ) -> Result<u32, DeviceError> {
        let mem = &self.mem_props;
        (0..mem.memory_type_count)
            .find(|&i| {
                (type_bits & (1 << i)) != 0
                    && mem.memory_types[i as usize].property_flags.contains(req)
            })
            .ok_or(DeviceError::NoSuitableMemoryType)
    }

    unsafe fn allocate(
        &self,
        req: vk::MemoryRequirements,
        props: vk::MemoryPropertyFlags,
    ) -> Result<vk::DeviceMemory, DeviceError> {
        let mai = vk::MemoryAllocateInfo {
            s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
            allocation_size: req.size,
            memory_type_index: self.find_memory_type(req.memory_type_bits, props)?,
            ..Default::default()
        };
        self.device
            .allocate_memory(&mai, None)
            .map_err(|e| device_error("allocate_memory", e))
    }

    unsafe fn create_views(
        &self,
        images: &[vk::Image],
        format: vk::Format,
    ) -> Result<Vec<vk::ImageView>, DeviceError> {
        let mut views = Vec::with_capacity(images.len());
        for &image in images {
            let sub = vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            };
            let iv_info = vk::ImageViewCreateInfo {
                s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                image,
                view_type: vk::ImageViewType::TYPE_2D,
                format,
                subresource_range: sub,
                ..Default::default()
            };
            match self.device.create_image_view(&iv_info, None) {
                Ok(view) => views.push(view),
                Err(e) => {
                    for &v in &views {
                        self.device.destroy_image_view(v, None);
                    }
                    return Err(device_error("create_image_view", e));
                }
            }
        }
        Ok(views)
    }
}

impl GpuDevice for VulkanDevice {
    type Swapchain = VkSwapchain;
    type DepthImage = VkDepthImage;
    type RenderPass = vk::RenderPass;
    type Framebuffer = vk::Framebuffer;
    type Semaphore = vk::Semaphore;
    type Fence = vk::Fence;
    type CommandBuffer = vk::CommandBuffer;
    type Buffer = VkBuffer;
    type Pipeline = VkPipeline;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities, DeviceError> {
        unsafe {
            let s = &self.surface_loader;
            let caps = s
                .get_physical_device_surface_capabilities(self.phys, self.surface)
                .map_err(|e| device_error("get_physical_device_surface_capabilities", e))?;
            let formats = s
                .get_physical_device_surface_formats(self.phys, self.surface)
                .map_err(|e| device_error("get_physical_device_surface_formats", e))?;
            let modes = s
                .get_physical_device_surface_present_modes(self.phys, self.surface)
                .map_err(|e| device_error("get_physical_device_surface_present_modes", e))?;
            Ok(conv::capabilities(&caps, &formats, &modes))
        }
    }

    fn supports_depth_format(&self, format: DepthFormat) -> bool {
        let props = unsafe {
            self.instance
                .get_physical_device_format_properties(self.phys, conv::vk_depth_format(format))
        };
        props
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    }

    fn create_swapchain(
        &self,
        desc: &SwapchainDesc,
        retired: Option<&VkSwapchain>,
    ) -> Result<VkSwapchain, DeviceError> {
        unsafe {
            // Only the transform is taken from a fresh query; every other
            // choice was made by the caller.
            let caps = self
                .surface_loader
                .get_physical_device_surface_capabilities(self.phys, self.surface)
                .map_err(|e| device_error("get_physical_device_surface_capabilities", e))?;
            let format = conv::vk_format(desc.format.format);

            let swap_info = vk::SwapchainCreateInfoKHR {
                s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
                surface: self.surface,
                min_image_count: desc.image_count,
                image_format: format,
                image_color_space: conv::vk_color_space(desc.format.color_space),
                image_extent: conv::vk_extent(desc.extent),
                image_array_layers: 1,
                image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
                image_sharing_mode: vk::SharingMode::EXCLUSIVE,
                pre_transform: caps.current_transform,
                composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
                present_mode: conv::vk_present_mode(desc.present_mode),
                clipped: vk::TRUE,
                old_swapchain: retired.map_or(vk::SwapchainKHR::null(), |r| r.handle),
                ..Default::default()
            };

            let handle = self
                .swapchain_loader
                .create_swapchain(&swap_info, None)
                .map_err(|e| device_error("create_swapchain", e))?;

            let images = match self.swapchain_loader.get_swapchain_images(handle) {
                Ok(images) => images,
                Err(e) => {
                    self.swapchain_loader.destroy_swapchain(handle, None);
                    return Err(device_error("get_swapchain_images", e));
                }
            };
            let views = match self.create_views(&images, format) {
                Ok(views) => views,
                Err(e) => {
                    self.swapchain_loader.destroy_swapchain(handle, None);
                    return Err(e);
                }
            };

            debug!(
                images = images.len(),
                retired = retired.is_some(),
                "swapchain created"
            );
            Ok(VkSwapchain {
                handle,
                images,
                views,
            })
        }
    }

    fn swapchain_image_count(&self, swapchain: &VkSwapchain) -> usize {
        swapchain.images.len()
    }

    // Views BEFORE the swapchain they were created from.
    fn destroy_swapchain(&self, swapchain: &VkSwapchain) {
        unsafe {
            for &iv in &swapchain.views {
                self.device.destroy_image_view(iv, None);
            }
            self.swapchain_loader
                .destroy_swapchain(swapchain.handle, None);
        }
    }

    fn create_depth_image(
        &self,
        format: DepthFormat,
        extent: SurfaceExtent,
    ) -> Result<VkDepthImage, DeviceError> {
        let vk_format = conv::vk_depth_format(format);
        unsafe {
            let img_ci = vk::ImageCreateInfo {
                s_type: vk::StructureType::IMAGE_CREATE_INFO,
                image_type: vk::ImageType::TYPE_2D,
                format: vk_format,
                extent: vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                },
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                ..Default::default()
            };
            let d = &self.device;
            let image = d
                .create_image(&img_ci, None)
                .map_err(|e| device_error("create_image", e))?;

            let req = d.get_image_memory_requirements(image);
            let memory = match self.allocate(req, vk::MemoryPropertyFlags::DEVICE_LOCAL) {
                Ok(m) => m,
                Err(e) => {
                    d.destroy_image(image, None);
                    return Err(e);
                }
            };
            if let Err(e) = d.bind_image_memory(image, memory, 0) {
                d.destroy_image(image, None);
                d.free_memory(memory, None);
                return Err(device_error("bind_image_memory", e));
            }

            let view_ci = vk::ImageViewCreateInfo {
                s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                image,
                view_type: vk::ImageViewType::TYPE_2D,
                format: vk_format,
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: conv::depth_aspect(format),
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                ..Default::default()
            };
            let view = match d.create_image_view(&view_ci, None) {
                Ok(v) => v,
                Err(e) => {
                    d.destroy_image(image, None);
                    d.free_memory(memory, None);
                    return Err(device_error("create_image_view", e));
                }
            };
            Ok(VkDepthImage {
                image,
                memory,
                view,
            })
        }
    }

    fn destroy_depth_image(&self, image: &VkDepthImage) {
        unsafe {
            let d = &self.device;
            d.destroy_image_view(image.view, None);
            d.destroy_image(image.image, None);
            d.free_memory(image.memory, None);
        }
    }

    // Color (cleared, presented) + depth (cleared, discarded), one subpass.
    fn create_render_pass(
        &self,
        color: PixelFormat,
        depth: DepthFormat,
    ) -> Result<vk::RenderPass, DeviceError> {
        let attachments = [
            vk::AttachmentDescription {
                format: conv::vk_format(color),
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::STORE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
                ..Default::default()
            },
            vk::AttachmentDescription {
                format: conv::vk_depth_format(depth),
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::DONT_CARE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                ..Default::default()
            },
        ];
        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription {
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
            color_attachment_count: 1,
            p_color_attachments: &color_ref,
            p_depth_stencil_attachment: &depth_ref,
            ..Default::default()
        };

        // Wait for the presentation engine to release the image and for the
        // previous frame's depth writes before writing either attachment.
        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let dependency = vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask: stages,
            src_access_mask: vk::AccessFlags::empty(),
            dst_stage_mask: stages,
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ..Default::default()
        };

        let rp_info = vk::RenderPassCreateInfo {
            s_type: vk::StructureType::RENDER_PASS_CREATE_INFO,
            attachment_count: attachments.len() as u32,
            p_attachments: attachments.as_ptr(),
            subpass_count: 1,
            p_subpasses: &subpass,
            dependency_count: 1,
            p_dependencies: &dependency,
            ..Default::default()
        };
        unsafe { self.device.create_render_pass(&rp_info, None) }
            .map_err(|e| device_error("create_render_pass", e))
    }

    fn destroy_render_pass(&self, pass: &vk::RenderPass) {
        unsafe { self.device.destroy_render_pass(*pass, None) };
    }

    fn create_framebuffer(
        &self,
        pass: &vk::RenderPass,
        swapchain: &VkSwapchain,
        image_index: usize,
        depth: &VkDepthImage,
        extent: SurfaceExtent,
    ) -> Result<vk::Framebuffer, DeviceError> {
        let attachments = [swapchain.views[image_index], depth.view];
        let fb_info = vk::FramebufferCreateInfo {
            s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
            render_pass: *pass,
            attachment_count: attachments.len() as u32,
            p_attachments: attachments.as_ptr(),
            width: extent.width,
            height: extent.height,
            layers: 1,
            ..Default::default()
        };
        unsafe { self.device.create_framebuffer(&fb_info, None) }
            .map_err(|e| device_error("create_framebuffer", e))
    }

    fn destroy_framebuffer(&self, framebuffer: &vk::Framebuffer) {
        unsafe { self.device.destroy_framebuffer(*framebuffer, None) };
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore, DeviceError> {
        let ci = vk::SemaphoreCreateInfo::default();
        unsafe { self.device.create_semaphore(&ci, None) }
            .map_err(|e| device_error("create_semaphore", e))
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.destroy_semaphore(semaphore, None) };
    }

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence, DeviceError> {
        let ci = vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            flags: if signaled {
                vk::FenceCreateFlags::SIGNALED
            } else {
                vk::FenceCreateFlags::empty()
            },
            ..Default::default()
        };
        unsafe { self.device.create_fence(&ci, None) }.map_err(|e| device_error("create_fence", e))
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) };
    }

    fn wait_for_fence(&self, fence: vk::Fence) -> Result<(), DeviceError> {
        unsafe { self.device.wait_for_fences(&[fence], true, u64::MAX) }
            .map_err(|e| device_error("wait_for_fences", e))
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<(), DeviceError> {
        unsafe { self.device.reset_fences(&[fence]) }.map_err(|e| device_error("reset_fences", e))
    }

    fn acquire_next_image(
        &self,
        swapchain: &VkSwapchain,
        signal: vk::Semaphore,
    ) -> Result<AcquireResult, DeviceError> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                swapchain.handle,
                u64::MAX,
                signal,
                vk::Fence::null(),
            )
        };
        match result {
            Ok((index, suboptimal)) => Ok(AcquireResult::Image { index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
            Err(e) => Err(device_error("acquire_next_image", e)),
        }
    }

    fn submit(
        &self,
        commands: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), DeviceError> {
        let wait_stage = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
        let submit = vk::SubmitInfo {
            s_type: vk::StructureType::SUBMIT_INFO,
            wait_semaphore_count: 1,
            p_wait_semaphores: &wait,
            p_wait_dst_stage_mask: &wait_stage,
            command_buffer_count: 1,
            p_command_buffers: &commands,
            signal_semaphore_count: 1,
            p_signal_semaphores: &signal,
            ..Default::default()
        };
        unsafe {
            self.device
                .queue_submit(self.queue, std::slice::from_ref(&submit), fence)
        }
        .map_err(|e| device_error("queue_submit", e))
    }

    fn present(
        &self,
        swapchain: &VkSwapchain,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<SwapStatus, DeviceError> {
        let present = vk::PresentInfoKHR {
            s_type: vk::StructureType::PRESENT_INFO_KHR,
            wait_semaphore_count: 1,
            p_wait_semaphores: &wait,
            swapchain_count: 1,
            p_swapchains: &swapchain.handle,
            p_image_indices: &image_index,
            ..Default::default()
        };
        match unsafe { self.swapchain_loader.queue_present(self.queue, &present) } {
            Ok(false) => Ok(SwapStatus::Optimal),
            Ok(true) => Ok(SwapStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(SwapStatus::OutOfDate),
            Err(e) => Err(device_error("queue_present", e)),
        }
    }

    fn wait_idle(&self) -> Result<(), DeviceError> {
        unsafe { self.device.device_wait_idle() }.map_err(|e| device_error("device_wait_idle", e))
    }

    fn allocate_command_buffers(&self, count: usize) -> Result<Vec<vk::CommandBuffer>, DeviceError> {
        let alloc_info = vk::CommandBufferAllocateInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
            command_pool: self.cmd_pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: count as u32,
            ..Default::default()
        };
        unsafe { self.device.allocate_command_buffers(&alloc_info) }
            .map_err(|e| device_error("allocate_command_buffers", e))
    }

    fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        unsafe { self.device.free_command_buffers(self.cmd_pool, buffers) };
    }

    fn begin_commands(&self, commands: vk::CommandBuffer) -> Result<(), DeviceError> {
        let begin = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };
        unsafe { self.device.begin_command_buffer(commands, &begin) }
            .map_err(|e| device_error("begin_command_buffer", e))
    }

    fn end_commands(&self, commands: vk::CommandBuffer) -> Result<(), DeviceError> {
        unsafe { self.device.end_command_buffer(commands) }
            .map_err(|e| device_error("end_command_buffer", e))
    }

    fn cmd_begin_render_pass(
        &self,
        commands: vk::CommandBuffer,
        pass: &vk::RenderPass,
        framebuffer: &vk::Framebuffer,
        extent: SurfaceExtent,
        clear: ClearValues,
    ) {
        let extent = conv::vk_extent(extent);
        let clears = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: clear.color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: clear.depth,
                    stencil: clear.stencil,
                },
            },
        ];
        let area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let rp_begin = vk::RenderPassBeginInfo {
            s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
            render_pass: *pass,
            framebuffer: *framebuffer,
            render_area: area,
            clear_value_count: clears.len() as u32,
            p_clear_values: clears.as_ptr(),
            ..Default::default()
        };
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        unsafe {
            let d = &self.device;
            d.cmd_begin_render_pass(commands, &rp_begin, vk::SubpassContents::INLINE);
            d.cmd_set_viewport(commands, 0, &[viewport]);
            d.cmd_set_scissor(commands, 0, &[area]);
        }
    }

    fn cmd_end_render_pass(&self, commands: vk::CommandBuffer) {
        unsafe { self.device.cmd_end_render_pass(commands) };
    }

    fn cmd_bind_pipeline(&self, commands: vk::CommandBuffer, pipeline: &VkPipeline) {
        unsafe {
            self.device.cmd_bind_pipeline(
                commands,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.pipeline,
            )
        };
    }

    fn cmd_push_constants(&self, commands: vk::CommandBuffer, pipeline: &VkPipeline, data: &[u8]) {
        unsafe {
            self.device.cmd_push_constants(
                commands,
                pipeline.layout,
                pipeline.push_stages,
                0,
                data,
            )
        };
    }

    fn cmd_bind_vertex_buffer(&self, commands: vk::CommandBuffer, buffer: &VkBuffer) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(commands, 0, &[buffer.buffer], &[0])
        };
    }

    fn cmd_draw(&self, commands: vk::CommandBuffer, vertex_count: u32) {
        unsafe { self.device.cmd_draw(commands, vertex_count, 1, 0, 0) };
    }

    fn create_vertex_buffer(&self, size: u64) -> Result<VkBuffer, DeviceError> {
        let bci = vk::BufferCreateInfo {
            s_type: vk::StructureType::BUFFER_CREATE_INFO,
            size,
            usage: vk::BufferUsageFlags::VERTEX_BUFFER,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        unsafe {
            let d = &self.device;
            let buffer = d
                .create_buffer(&bci, None)
                .map_err(|e| device_error("create_buffer", e))?;
            let req = d.get_buffer_memory_requirements(buffer);
            let props =
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
            let memory = match self.allocate(req, props) {
                Ok(m) => m,
                Err(e) => {
                    d.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };
            if let Err(e) = d.bind_buffer_memory(buffer, memory, 0) {
                d.destroy_buffer(buffer, None);
                d.free_memory(memory, None);
                return Err(device_error("bind_buffer_memory", e));
            }
            Ok(VkBuffer {
                buffer,
                memory,
                size,
            })
        }
    }

    fn write_buffer(&self, buffer: &VkBuffer, data: &[u8]) -> Result<(), DeviceError> {
        if data.len() as u64 > buffer.size {
            return Err(DeviceError::Backend {
                op: "write_buffer",
                code: vk::Result::ERROR_MEMORY_MAP_FAILED.as_raw(),
            });
        }
        unsafe {
            let d = &self.device;
            let ptr = d
                .map_memory(buffer.memory, 0, buffer.size, vk::MemoryMapFlags::empty())
                .map_err(|e| device_error("map_memory", e))?;
            // Host-coherent memory: no flush needed before unmap.
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.cast::<u8>(), data.len());
            d.unmap_memory(buffer.memory);
        }
        Ok(())
    }

    fn destroy_buffer(&self, buffer: &VkBuffer) {
        unsafe {
            self.device.destroy_buffer(buffer.buffer, None);
            self.device.free_memory(buffer.memory, None);
        }
    }

    fn destroy_pipeline(&self, pipeline: &VkPipeline) {
        unsafe {
            self.device.destroy_pipeline(pipeline.pipeline, None);
            self.device.destroy_pipeline_layout(pipeline.layout, None);
        }
    }
}
