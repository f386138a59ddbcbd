// SPDX-License-Identifier: CEPL-1.0
use std::f32::consts::TAU;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::device::GpuDevice;
use crate::error::RenderError;
use crate::frame::Frame;
use crate::object::DrawableObject;

/// Radians added to every object's rotation per executed pass.
pub const DEFAULT_ROTATION_STEP: f32 = 0.01;

/// Per-draw data pushed inline with the commands.
///
/// Matches the shader block `{ mat2 transform; vec2 offset; vec3 color; }`
/// with `color` on a 16-byte boundary.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DrawPushConstants {
    pub transform: [[f32; 2]; 2],
    pub offset: [f32; 2],
    _pad0: [f32; 2],
    pub color: [f32; 3],
    _pad1: f32,
}

impl DrawPushConstants {
    pub fn for_object<D: GpuDevice>(object: &DrawableObject<D>) -> Self {
        Self {
            transform: object.transform.mat2().to_cols_array_2d(),
            offset: object.transform.translation.to_array(),
            color: object.color.to_array(),
            ..Self::default()
        }
    }
}

/// Draws every object with one pipeline, one push-constant block and one
/// non-indexed draw each, in the order given.
pub struct DrawPass<D: GpuDevice> {
    device: Arc<D>,
    pipeline: D::Pipeline,
    rotation_step: f32,
}

impl<D: GpuDevice> DrawPass<D> {
    /// Takes ownership of `pipeline`, which must be compatible with the
    /// surface's render target.
    pub fn new(device: Arc<D>, pipeline: D::Pipeline) -> Self {
        Self {
            device,
            pipeline,
            rotation_step: DEFAULT_ROTATION_STEP,
        }
    }

    pub fn with_rotation_step(mut self, step: f32) -> Self {
        self.rotation_step = step;
        self
    }

    pub fn rotation_step(&self) -> f32 {
        self.rotation_step
    }

    /// Records the draws into `frame`, whose render pass must already be
    /// begun. Each object's rotation advances by the rotation step first, so
    /// animation speed follows frame rate.
    pub fn execute(
        &self,
        frame: &mut Frame<D>,
        objects: &mut [DrawableObject<D>],
    ) -> Result<(), RenderError> {
        if !frame.render_pass_active {
            return Err(RenderError::RenderPassNotActive);
        }

        self.device
            .cmd_bind_pipeline(frame.command_buffer, &self.pipeline);

        for object in objects.iter_mut() {
            object.transform.rotation =
                (object.transform.rotation + self.rotation_step).rem_euclid(TAU);

            let push = DrawPushConstants::for_object(object);
            self.device.cmd_push_constants(
                frame.command_buffer,
                &self.pipeline,
                bytemuck::bytes_of(&push),
            );

            object.geometry.bind(frame);
            object.geometry.draw(frame)?;
        }
        Ok(())
    }
}

impl<D: GpuDevice> Drop for DrawPass<D> {
    fn drop(&mut self) {
        let _ = self.device.wait_idle();
        self.device.destroy_pipeline(&self.pipeline);
    }
}
