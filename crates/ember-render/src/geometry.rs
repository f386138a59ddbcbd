// SPDX-License-Identifier: CEPL-1.0
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::debug;

use crate::device::GpuDevice;
use crate::error::RenderError;
use crate::frame::Frame;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Vertex layout consumed by the draw pipeline: binding 0,
/// `position` at location 0 and `color` at location 1.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 2], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

/// Immutable vertex buffer living in host-visible, host-coherent memory.
///
/// Share it between objects with `Arc`; the buffer is released when the last
/// reference goes away, after the device has drained.
pub struct GeometryBuffer<D: GpuDevice> {
    device: Arc<D>,
    // Process-unique; identifies the buffer in a frame's bind state.
    id: u64,
    buffer: D::Buffer,
    vertex_count: u32,
}

impl<D: GpuDevice> GeometryBuffer<D> {
    /// Uploads `vertices` into a freshly allocated buffer sized exactly to them.
    pub fn new(device: Arc<D>, vertices: &[Vertex]) -> Result<Self, RenderError> {
        if vertices.len() < 3 {
            return Err(RenderError::InvalidGeometry {
                count: vertices.len(),
            });
        }

        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = device.create_vertex_buffer(bytes.len() as u64)?;
        if let Err(e) = device.write_buffer(&buffer, bytes) {
            device.destroy_buffer(&buffer);
            return Err(e.into());
        }

        debug!(
            vertices = vertices.len(),
            bytes = bytes.len(),
            "geometry buffer uploaded"
        );

        Ok(Self {
            device,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            buffer,
            vertex_count: vertices.len() as u32,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Records a vertex-buffer bind into `frame`.
    pub fn bind(&self, frame: &mut Frame<D>) {
        self.device
            .cmd_bind_vertex_buffer(frame.command_buffer, &self.buffer);
        frame.bound_geometry = Some(self.id);
    }

    /// Records a non-indexed draw of every vertex. [`bind`](Self::bind) must
    /// have been recorded for this buffer on the same frame.
    pub fn draw(&self, frame: &mut Frame<D>) -> Result<(), RenderError> {
        if frame.bound_geometry != Some(self.id) {
            return Err(RenderError::UnboundGeometry);
        }
        self.device
            .cmd_draw(frame.command_buffer, self.vertex_count);
        Ok(())
    }
}

impl<D: GpuDevice> Drop for GeometryBuffer<D> {
    fn drop(&mut self) {
        // A frame in flight may still read this buffer.
        let _ = self.device.wait_idle();
        self.device.destroy_buffer(&self.buffer);
    }
}
