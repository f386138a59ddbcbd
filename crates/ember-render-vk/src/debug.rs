// SPDX-License-Identifier: CEPL-1.0
//! Validation output, debug builds only. Messages go to `tracing` under the
//! `vulkan` target.

use std::ffi::CStr;

use anyhow::Result;
#[cfg(debug_assertions)]
use ash::ext::debug_utils as ext_debug;
#[cfg(debug_assertions)]
use ash::vk;
use ash::{Entry, Instance};

#[cfg(debug_assertions)]
const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

#[cfg(debug_assertions)]
pub(crate) type DebugState = vk::DebugUtilsMessengerEXT;
#[cfg(not(debug_assertions))]
pub(crate) type DebugState = ();

#[cfg(debug_assertions)]
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if data.is_null() || (*data).p_message.is_null() {
        return vk::FALSE;
    }
    let msg = CStr::from_ptr((*data).p_message).to_string_lossy();

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!(target: "vulkan", "{msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!(target: "vulkan", "{msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        tracing::debug!(target: "vulkan", "{msg}");
    } else {
        tracing::trace!(target: "vulkan", "{msg}");
    }
    vk::FALSE
}

/// Layers and instance extensions wanted on top of the window-system ones.
/// Each is only requested when the loader reports it.
pub(crate) unsafe fn wanted_layers(entry: &Entry) -> Vec<&'static CStr> {
    #[cfg(debug_assertions)]
    {
        let available = entry.enumerate_instance_layer_properties().unwrap_or_default();
        let has_validation = available
            .iter()
            .any(|l| l.layer_name_as_c_str().is_ok_and(|n| n == VALIDATION_LAYER));
        if has_validation {
            return vec![VALIDATION_LAYER];
        }
        tracing::warn!("validation layer not available, continuing without it");
        Vec::new()
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = entry;
        Vec::new()
    }
}

pub(crate) unsafe fn wanted_extensions(entry: &Entry) -> Vec<&'static CStr> {
    #[cfg(debug_assertions)]
    {
        let available = entry
            .enumerate_instance_extension_properties(None)
            .unwrap_or_default();
        let has_debug_utils = available
            .iter()
            .any(|e| e.extension_name_as_c_str().is_ok_and(|n| n == ext_debug::NAME));
        if has_debug_utils {
            return vec![ext_debug::NAME];
        }
        Vec::new()
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = entry;
        Vec::new()
    }
}

#[cfg(debug_assertions)]
pub(crate) unsafe fn create_debug_messenger(
    entry: &Entry,
    instance: &Instance,
    enabled: bool,
) -> Result<DebugState> {
    if !enabled {
        return Ok(vk::DebugUtilsMessengerEXT::null());
    }
    let loader = ext_debug::Instance::new(entry, instance);
    let ci = vk::DebugUtilsMessengerCreateInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    };
    Ok(loader.create_debug_utils_messenger(&ci, None)?)
}

#[cfg(not(debug_assertions))]
pub(crate) unsafe fn create_debug_messenger(
    _entry: &Entry,
    _instance: &Instance,
    _enabled: bool,
) -> Result<DebugState> {
    Ok(())
}

#[cfg(debug_assertions)]
pub(crate) unsafe fn destroy_debug_messenger(entry: &Entry, instance: &Instance, dbg: DebugState) {
    if dbg == vk::DebugUtilsMessengerEXT::null() {
        return;
    }
    let loader = ext_debug::Instance::new(entry, instance);
    loader.destroy_debug_utils_messenger(dbg, None);
}

#[cfg(not(debug_assertions))]
pub(crate) unsafe fn destroy_debug_messenger(_entry: &Entry, _instance: &Instance, _dbg: DebugState) {
    // no-op
}
