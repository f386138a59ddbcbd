// SPDX-License-Identifier: CEPL-1.0
//! Vulkan backend for `ember-render`.
//!
//! [`VulkanDevice`] owns the instance, window surface, logical device, the
//! single graphics+present queue and the command pool, and implements
//! [`ember_render::GpuDevice`] on top of them. Everything it hands out must be
//! released before the last `Arc<VulkanDevice>` goes away.

use std::ffi::CStr;

use anyhow::{anyhow, Context, Result};
use ash::khr::{surface, swapchain};
use ash::{vk, Entry, Instance};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};
use tracing::info;

mod conv;
mod debug;
mod device;
mod pipeline;

pub use device::{VkBuffer, VkDepthImage, VkPipeline, VkSwapchain};
pub use pipeline::{create_draw_pipeline, vertex_attribute_descriptions, vertex_binding_description};

use debug::DebugState;

pub struct VulkanDevice {
    entry: Entry,
    instance: Instance,
    debug_messenger: DebugState,
    surface_loader: surface::Instance,
    surface: vk::SurfaceKHR,

    phys: vk::PhysicalDevice,
    mem_props: vk::PhysicalDeviceMemoryProperties,
    device: ash::Device,
    queue: vk::Queue,

    swapchain_loader: swapchain::Device,
    cmd_pool: vk::CommandPool,
}

impl VulkanDevice {
    /// Brings up Vulkan for `window`. The window must outlive the device.
    pub fn new(window: &dyn HasWindowHandle, display: &dyn HasDisplayHandle) -> Result<Self> {
        unsafe { build_device(window, display) }
    }

    pub fn raw(&self) -> &ash::Device {
        &self.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.phys
    }
}

// STRICT TEARDOWN ORDER:
// - device_wait_idle()
// - command pool BEFORE device (frees any buffers still allocated from it)
// - device, then surface, then debug messenger, instance last
impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_command_pool(self.cmd_pool, None);
            self.device.destroy_device(None);

            self.surface_loader.destroy_surface(self.surface, None);
            debug::destroy_debug_messenger(&self.entry, &self.instance, self.debug_messenger);
            self.instance.destroy_instance(None);
        }
    }
}

unsafe fn create_instance(
    entry: &Entry,
    display_raw: RawDisplayHandle,
) -> Result<(Instance, bool)> {
    let app_name = c"ember";

    let app_info = vk::ApplicationInfo {
        s_type: vk::StructureType::APPLICATION_INFO,
        p_application_name: app_name.as_ptr(),
        application_version: 0,
        p_engine_name: app_name.as_ptr(),
        engine_version: 0,
        api_version: vk::API_VERSION_1_0,
        ..Default::default()
    };

    let mut exts = ash_window::enumerate_required_extensions(display_raw)
        .context("enumerate_required_extensions")?
        .to_vec();
    let extra = debug::wanted_extensions(entry);
    let debug_utils = !extra.is_empty();
    exts.extend(extra.iter().map(|e| e.as_ptr()));

    let layers: Vec<_> = debug::wanted_layers(entry)
        .iter()
        .map(|l| l.as_ptr())
        .collect();

    let create_info = vk::InstanceCreateInfo {
        s_type: vk::StructureType::INSTANCE_CREATE_INFO,
        p_application_info: &app_info,
        enabled_extension_count: exts.len() as u32,
        pp_enabled_extension_names: exts.as_ptr(),
        enabled_layer_count: layers.len() as u32,
        pp_enabled_layer_names: layers.as_ptr(),
        ..Default::default()
    };

    let instance = entry
        .create_instance(&create_info, None)
        .context("create_instance")?;
    Ok((instance, debug_utils))
}

unsafe fn supports_swapchain(instance: &Instance, phys: vk::PhysicalDevice) -> bool {
    instance
        .enumerate_device_extension_properties(phys)
        .unwrap_or_default()
        .iter()
        .any(|e| e.extension_name_as_c_str().is_ok_and(|n| n == swapchain::NAME))
}

// First device exposing one queue family that does both graphics and present.
unsafe fn pick_device_and_queue(
    instance: &Instance,
    surface_loader: &surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32)> {
    for phys in instance.enumerate_physical_devices()? {
        if !supports_swapchain(instance, phys) {
            continue;
        }
        let qprops = instance.get_physical_device_queue_family_properties(phys);
        for (i, q) in qprops.iter().enumerate() {
            if q.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && surface_loader
                    .get_physical_device_surface_support(phys, i as u32, surface)
                    .unwrap_or(false)
            {
                return Ok((phys, i as u32));
            }
        }
    }
    Err(anyhow!("no suitable physical device/queue family"))
}

unsafe fn build_device(
    window: &dyn HasWindowHandle,
    display: &dyn HasDisplayHandle,
) -> Result<VulkanDevice> {
    // STRICT ORDER:
    // 1) instance (WSI + optional debug ext)
    // 2) surface FROM THIS INSTANCE
    // 3) physical device/queue chosen AGAINST THIS SURFACE (present support)
    // 4) logical device with the swapchain extension
    let dh = display
        .display_handle()
        .map_err(|e| anyhow!("{e}"))?
        .as_raw();
    let wh = window
        .window_handle()
        .map_err(|e| anyhow!("{e}"))?
        .as_raw();

    let entry = Entry::linked();
    let (instance, debug_utils) = create_instance(&entry, dh)?;
    let debug_messenger = debug::create_debug_messenger(&entry, &instance, debug_utils)
        .context("create_debug_messenger")?;

    let surface_loader = surface::Instance::new(&entry, &instance);
    let surface = ash_window::create_surface(&entry, &instance, dh, wh, None)
        .context("ash_window::create_surface")?;

    let (phys, queue_family) = pick_device_and_queue(&instance, &surface_loader, surface)?;
    let props = instance.get_physical_device_properties(phys);
    let name = props
        .device_name_as_c_str()
        .map(CStr::to_string_lossy)
        .unwrap_or_default();
    info!(
        "GPU: {name} (Vulkan {}.{}.{}), queue family {queue_family}",
        vk::api_version_major(props.api_version),
        vk::api_version_minor(props.api_version),
        vk::api_version_patch(props.api_version),
    );

    let priorities = [1.0_f32];
    let qinfo = vk::DeviceQueueCreateInfo {
        s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
        queue_family_index: queue_family,
        queue_count: 1,
        p_queue_priorities: priorities.as_ptr(),
        ..Default::default()
    };

    let device_exts = [swapchain::NAME.as_ptr()];
    let dinfo = vk::DeviceCreateInfo {
        s_type: vk::StructureType::DEVICE_CREATE_INFO,
        queue_create_info_count: 1,
        p_queue_create_infos: &qinfo,
        enabled_extension_count: device_exts.len() as u32,
        pp_enabled_extension_names: device_exts.as_ptr(),
        ..Default::default()
    };

    let device = instance
        .create_device(phys, &dinfo, None)
        .context("create_device")?;
    let queue = device.get_device_queue(queue_family, 0);
    let swapchain_loader = swapchain::Device::new(&instance, &device);

    // Command buffers are re-recorded every frame.
    let pool_info = vk::CommandPoolCreateInfo {
        s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
        queue_family_index: queue_family,
        flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        ..Default::default()
    };
    let cmd_pool = device
        .create_command_pool(&pool_info, None)
        .context("create_command_pool")?;

    let mem_props = instance.get_physical_device_memory_properties(phys);

    Ok(VulkanDevice {
        entry,
        instance,
        debug_messenger,
        surface_loader,
        surface,
        phys,
        mem_props,
        device,
        queue,
        swapchain_loader,
        cmd_pool,
    })
}
