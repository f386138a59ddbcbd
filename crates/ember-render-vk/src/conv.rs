// SPDX-License-Identifier: CEPL-1.0
//! Translation between the core's value types and `ash::vk`.

use ash::vk;
use ember_render::{
    ColorSpace, DepthFormat, DeviceError, PixelFormat, PresentMode, SurfaceCapabilities,
    SurfaceExtent, SurfaceFormat,
};

pub(crate) fn device_error(op: &'static str, result: vk::Result) -> DeviceError {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY => DeviceError::OutOfHostMemory,
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => DeviceError::OutOfDeviceMemory,
        vk::Result::ERROR_DEVICE_LOST => DeviceError::DeviceLost,
        vk::Result::ERROR_SURFACE_LOST_KHR => DeviceError::SurfaceLost,
        other => DeviceError::Backend {
            op,
            code: other.as_raw(),
        },
    }
}

pub(crate) fn pixel_format(f: vk::Format) -> PixelFormat {
    match f {
        vk::Format::B8G8R8A8_SRGB => PixelFormat::B8G8R8A8Srgb,
        vk::Format::B8G8R8A8_UNORM => PixelFormat::B8G8R8A8Unorm,
        vk::Format::R8G8B8A8_SRGB => PixelFormat::R8G8B8A8Srgb,
        vk::Format::R8G8B8A8_UNORM => PixelFormat::R8G8B8A8Unorm,
        vk::Format::A2B10G10R10_UNORM_PACK32 => PixelFormat::A2B10G10R10Unorm,
        vk::Format::R16G16B16A16_SFLOAT => PixelFormat::R16G16B16A16Sfloat,
        other => PixelFormat::Other(other.as_raw()),
    }
}

pub(crate) fn vk_format(f: PixelFormat) -> vk::Format {
    match f {
        PixelFormat::B8G8R8A8Srgb => vk::Format::B8G8R8A8_SRGB,
        PixelFormat::B8G8R8A8Unorm => vk::Format::B8G8R8A8_UNORM,
        PixelFormat::R8G8B8A8Srgb => vk::Format::R8G8B8A8_SRGB,
        PixelFormat::R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
        PixelFormat::A2B10G10R10Unorm => vk::Format::A2B10G10R10_UNORM_PACK32,
        PixelFormat::R16G16B16A16Sfloat => vk::Format::R16G16B16A16_SFLOAT,
        PixelFormat::Other(raw) => vk::Format::from_raw(raw),
    }
}

pub(crate) fn color_space(cs: vk::ColorSpaceKHR) -> ColorSpace {
    match cs {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => ColorSpace::SrgbNonlinear,
        vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT => ColorSpace::ExtendedSrgbLinear,
        vk::ColorSpaceKHR::HDR10_ST2084_EXT => ColorSpace::Hdr10St2084,
        other => ColorSpace::Other(other.as_raw()),
    }
}

pub(crate) fn vk_color_space(cs: ColorSpace) -> vk::ColorSpaceKHR {
    match cs {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::ExtendedSrgbLinear => vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        ColorSpace::Hdr10St2084 => vk::ColorSpaceKHR::HDR10_ST2084_EXT,
        ColorSpace::Other(raw) => vk::ColorSpaceKHR::from_raw(raw),
    }
}

pub(crate) fn surface_format(f: vk::SurfaceFormatKHR) -> SurfaceFormat {
    SurfaceFormat {
        format: pixel_format(f.format),
        color_space: color_space(f.color_space),
    }
}

/// Modes the core has no name for (shared-refresh ones) are dropped.
pub(crate) fn present_mode(m: vk::PresentModeKHR) -> Option<PresentMode> {
    match m {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        _ => None,
    }
}

pub(crate) fn vk_present_mode(m: PresentMode) -> vk::PresentModeKHR {
    match m {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

pub(crate) fn vk_depth_format(f: DepthFormat) -> vk::Format {
    match f {
        DepthFormat::D32Sfloat => vk::Format::D32_SFLOAT,
        DepthFormat::D32SfloatS8Uint => vk::Format::D32_SFLOAT_S8_UINT,
        DepthFormat::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
    }
}

/// Aspects a depth attachment view must cover for `f`.
pub(crate) fn depth_aspect(f: DepthFormat) -> vk::ImageAspectFlags {
    match f {
        DepthFormat::D32Sfloat => vk::ImageAspectFlags::DEPTH,
        DepthFormat::D32SfloatS8Uint | DepthFormat::D24UnormS8Uint => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
    }
}

pub(crate) fn extent(e: vk::Extent2D) -> SurfaceExtent {
    SurfaceExtent::new(e.width, e.height)
}

pub(crate) fn vk_extent(e: SurfaceExtent) -> vk::Extent2D {
    vk::Extent2D {
        width: e.width,
        height: e.height,
    }
}

pub(crate) fn capabilities(
    caps: &vk::SurfaceCapabilitiesKHR,
    formats: &[vk::SurfaceFormatKHR],
    modes: &[vk::PresentModeKHR],
) -> SurfaceCapabilities {
    // u32::MAX width means the swapchain extent decides the surface size.
    let current_extent = if caps.current_extent.width == u32::MAX {
        None
    } else {
        Some(extent(caps.current_extent))
    };
    SurfaceCapabilities {
        min_image_count: caps.min_image_count,
        max_image_count: caps.max_image_count,
        current_extent,
        min_extent: extent(caps.min_image_extent),
        max_extent: extent(caps.max_image_extent),
        formats: formats.iter().copied().map(surface_format).collect(),
        present_modes: modes.iter().copied().filter_map(present_mode).collect(),
    }
}
