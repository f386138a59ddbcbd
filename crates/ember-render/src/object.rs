// SPDX-License-Identifier: CEPL-1.0
use std::sync::Arc;

use glam::{Mat2, Vec2, Vec3};

use crate::device::GpuDevice;
use crate::geometry::GeometryBuffer;

/// Stable handle of a [`DrawableObject`], unique within its [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub translation: Vec2,
    pub scale: Vec2,
    /// Radians.
    pub rotation: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    /// Linear part `R(rotation) * S(scale)`. Translation is not included; it
    /// is pushed separately as an offset.
    pub fn mat2(&self) -> Mat2 {
        let (sin, cos) = self.rotation.sin_cos();
        let rotation = Mat2::from_cols(Vec2::new(cos, sin), Vec2::new(-sin, cos));
        let scale = Mat2::from_diagonal(self.scale);
        rotation * scale
    }
}

/// A geometry reference with a color and a 2D transform. Pure data for the
/// draw pass; it owns no GPU resources of its own.
pub struct DrawableObject<D: GpuDevice> {
    id: ObjectId,
    pub geometry: Arc<GeometryBuffer<D>>,
    pub color: Vec3,
    pub transform: Transform2D,
}

impl<D: GpuDevice> DrawableObject<D> {
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

/// Hands out object identities. Ids grow monotonically and are never reused,
/// even after the object they named is dropped.
#[derive(Debug, Default)]
pub struct Scene {
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_object<D: GpuDevice>(
        &mut self,
        geometry: Arc<GeometryBuffer<D>>,
    ) -> DrawableObject<D> {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        DrawableObject {
            id,
            geometry,
            color: Vec3::ZERO,
            transform: Transform2D::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::geometry::Vertex;
    use crate::mock::MockDevice;

    fn geometry(device: &Arc<MockDevice>) -> Arc<GeometryBuffer<MockDevice>> {
        let vertices = [
            Vertex::new([0.0, -0.5], [1.0, 0.0, 0.0]),
            Vertex::new([0.5, 0.5], [0.0, 1.0, 0.0]),
            Vertex::new([-0.5, 0.5], [0.0, 0.0, 1.0]),
        ];
        Arc::new(GeometryBuffer::new(Arc::clone(device), &vertices).unwrap())
    }

    #[test]
    fn identity_transform_gives_identity_matrix() {
        let t = Transform2D::default();
        assert_eq!(t.mat2(), Mat2::IDENTITY);
        assert_eq!(t.translation, Vec2::ZERO);
    }

    #[test]
    fn rotation_is_applied_after_scale() {
        let t = Transform2D {
            translation: Vec2::new(5.0, 5.0),
            scale: Vec2::new(2.0, 0.5),
            rotation: FRAC_PI_2,
        };
        // x axis is stretched by 2 then turned onto +y.
        let x = t.mat2() * Vec2::X;
        assert!((x - Vec2::new(0.0, 2.0)).length() < 1e-6);
        let y = t.mat2() * Vec2::Y;
        assert!((y - Vec2::new(-0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn half_turn_negates() {
        let t = Transform2D {
            rotation: PI,
            ..Default::default()
        };
        let v = t.mat2() * Vec2::new(0.3, -0.7);
        assert!((v - Vec2::new(-0.3, 0.7)).length() < 1e-6);
    }

    #[test]
    fn ids_increase_and_survive_drops() {
        let device = Arc::new(MockDevice::new());
        let shared = geometry(&device);
        let mut scene = Scene::new();

        let a = scene.create_object(Arc::clone(&shared));
        let b = scene.create_object(Arc::clone(&shared));
        let b_id = b.id();
        drop(b);
        let c = scene.create_object(Arc::clone(&shared));

        assert!(a.id() < b_id);
        assert!(b_id < c.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn objects_share_one_geometry_buffer() {
        let device = Arc::new(MockDevice::new());
        let shared = geometry(&device);
        let mut scene = Scene::new();
        let objects: Vec<_> = (0..4)
            .map(|_| scene.create_object(Arc::clone(&shared)))
            .collect();

        assert_eq!(Arc::strong_count(&shared), 5);
        assert_eq!(device.live_buffers(), 1);
        drop(objects);
        drop(shared);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn new_object_defaults() {
        let device = Arc::new(MockDevice::new());
        let mut scene = Scene::new();
        let object = scene.create_object(geometry(&device));
        assert_eq!(object.transform.scale, Vec2::ONE);
        assert_eq!(object.transform.rotation, 0.0);
        assert_eq!(object.color, Vec3::ZERO);
    }
}
