//! Cascaded Shadow Map Calculations
//!
//! Cascade split distances, the per-cascade culling data shading uses to
//! pick a cascade, and the light-space fitting used by the reference
//! culling implementation. Everything here is pure math.
//!
//! # Cascade Shadow Maps (CSM)
//!
//! CSM divides the shadowed part of the view frustum into depth slices and
//! renders a separate shadow map for each. Each slice is enclosed in a
//! bounding sphere so the orthographic light projection does not change size
//! when the camera rotates.

use glam::{Mat4, Vec3, Vec4};

use crate::config::{FilterMode, MAX_CASCADES};
use crate::culling::{DirectionalCascadeRequest, ShadowMatrices, ShadowSplitData};

/// Camera description used to slice the view frustum
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrustum {
    /// World-to-camera matrix (right-handed, looking down -Z)
    pub view: Mat4,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraFrustum {
    /// Camera at `eye` looking at `target`
    pub fn look_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, target, up_vector(target - eye)),
            fov_y,
            aspect,
            near,
            far,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }
}

/// Far edge of each cascade as a fraction of the shadow distance
///
/// The last active cascade always ends at the shadow distance; unused
/// entries are 1.
pub fn cascade_split_ratios(cascade_count: u32, ratios: Vec3) -> [f32; MAX_CASCADES] {
    let count = cascade_count.clamp(1, MAX_CASCADES as u32) as usize;
    let mut splits = [1.0f32; MAX_CASCADES];
    let ratios = ratios.to_array();
    splits[..count - 1].copy_from_slice(&ratios[..count - 1]);
    splits
}

/// Culling sphere and filter data for one cascade, as shading consumes it
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CascadeCulling {
    /// xyz = sphere center, w = squared radius after the filter margin
    pub culling_sphere: Vec4,
    /// x = 1/radius, y = filter width scaled by sqrt(2)
    pub data: Vec4,
}

impl CascadeCulling {
    /// Derive shading data from a cascade's culling sphere
    ///
    /// The sphere is shrunk by the filter footprint so shading never picks a
    /// cascade whose filter kernel would sample outside its tile.
    pub fn new(culling_sphere: Vec4, tile_size: u32, filter: FilterMode) -> Self {
        let radius = culling_sphere.w;
        let texel_size = 2.0 * radius / tile_size as f32;
        let filter_size = texel_size * (filter.ordinal() as f32 + 1.0);

        let shrunk = (radius - filter_size).max(0.0);
        let inv_radius = if radius > 0.0 { 1.0 / radius } else { 0.0 };

        Self {
            culling_sphere: culling_sphere.truncate().extend(shrunk * shrunk),
            data: Vec4::new(inv_radius, filter_size * std::f32::consts::SQRT_2, 0.0, 0.0),
        }
    }

    pub fn shrunk_radius_squared(&self) -> f32 {
        self.culling_sphere.w
    }
}

/// World-space corners of the camera frustum between two view depths
pub fn frustum_slice_corners(camera: &CameraFrustum, near: f32, far: f32) -> [Vec3; 8] {
    let tan_half = (0.5 * camera.fov_y.to_radians()).tan();
    let to_world = camera.view.inverse();

    let mut corners = [Vec3::ZERO; 8];
    for (slot, depth) in [near, far].into_iter().enumerate() {
        let half_h = depth * tan_half;
        let half_w = half_h * camera.aspect;
        let quad = [
            Vec3::new(-half_w, -half_h, -depth),
            Vec3::new(half_w, -half_h, -depth),
            Vec3::new(-half_w, half_h, -depth),
            Vec3::new(half_w, half_h, -depth),
        ];
        for (i, corner) in quad.into_iter().enumerate() {
            corners[slot * 4 + i] = to_world.transform_point3(corner);
        }
    }
    corners
}

/// Bounding sphere of a set of points (centroid and max distance)
pub fn bounding_sphere(points: &[Vec3]) -> (Vec3, f32) {
    if points.is_empty() {
        return (Vec3::ZERO, 0.0);
    }

    let center = points.iter().fold(Vec3::ZERO, |acc, p| acc + *p) / points.len() as f32;
    let radius = points
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0f32, f32::max);

    (center, radius)
}

/// Up vector that is never parallel to `forward`
fn up_vector(forward: Vec3) -> Vec3 {
    if forward.normalize_or_zero().y.abs() > 0.9 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Fit an orthographic light camera around one cascade of the view frustum
///
/// `light_forward` is the direction the light shines in. The sphere center
/// is snapped to whole shadow-map texels in light space so the shadow does
/// not shimmer as the camera moves; `near_plane_offset` pulls the light
/// camera back to catch casters in front of the sphere.
pub fn fit_directional_cascade(
    camera: &CameraFrustum,
    light_forward: Vec3,
    shadow_distance: f32,
    request: &DirectionalCascadeRequest,
) -> ShadowMatrices {
    let splits = cascade_split_ratios(request.cascade_count, request.ratios);
    let distance = shadow_distance.min(camera.far);
    let index = (request.cascade_index as usize).min(MAX_CASCADES - 1);

    let near = if index == 0 {
        camera.near
    } else {
        (splits[index - 1] * distance).max(camera.near)
    };
    let far = (splits[index] * distance).max(near);

    let corners = frustum_slice_corners(camera, near, far);
    let (center, radius) = bounding_sphere(&corners);
    let radius = radius.max(f32::EPSILON);

    let forward = light_forward.normalize_or_zero();
    let forward = if forward == Vec3::ZERO { Vec3::NEG_Y } else { forward };
    let up = up_vector(forward);

    // Snap the center to the texel grid of the light's rotation
    let rotation = Mat4::look_at_rh(Vec3::ZERO, forward, up);
    let texel = 2.0 * radius / request.tile_size.max(1) as f32;
    let light_center = rotation.transform_point3(center);
    let snapped = Vec3::new(
        (light_center.x / texel).floor() * texel,
        (light_center.y / texel).floor() * texel,
        light_center.z,
    );
    let center = rotation.inverse().transform_point3(snapped);

    let pull_back = radius + request.near_plane_offset.max(0.0);
    let eye = center - forward * pull_back;
    let view = Mat4::look_at_rh(eye, center, up);
    let projection = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, pull_back + radius);

    ShadowMatrices {
        view,
        projection,
        split: ShadowSplitData {
            culling_sphere: center.extend(radius),
            cascade_blend_culling_factor: 0.0,
        },
    }
}

/// Fit a perspective light camera to a spot cone
///
/// `cone_angle` is the full outer angle in degrees; point lights use a 90
/// degree frustum along their forward axis.
pub fn fit_spot_shadow(position: Vec3, forward: Vec3, cone_angle: f32, range: f32) -> ShadowMatrices {
    let forward = forward.normalize_or_zero();
    let forward = if forward == Vec3::ZERO { Vec3::NEG_Y } else { forward };
    let range = range.max(0.02);
    let near = (range * 0.01).max(0.01);

    let view = Mat4::look_at_rh(position, position + forward, up_vector(forward));
    let projection = Mat4::perspective_rh(cone_angle.clamp(1.0, 179.0).to_radians(), 1.0, near, range);

    ShadowMatrices {
        view,
        projection,
        split: ShadowSplitData {
            culling_sphere: position.extend(range),
            cascade_blend_culling_factor: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraFrustum {
        CameraFrustum::look_at(
            Vec3::new(0.0, 2.0, 10.0),
            Vec3::ZERO,
            60.0,
            16.0 / 9.0,
            0.3,
            1000.0,
        )
    }

    fn cascade_request(cascade_index: u32, tile_size: u32, near_plane_offset: f32) -> DirectionalCascadeRequest {
        DirectionalCascadeRequest {
            visible_light_index: 0,
            cascade_index,
            cascade_count: 4,
            ratios: Vec3::new(0.1, 0.25, 0.5),
            tile_size,
            near_plane_offset,
        }
    }

    #[test]
    fn test_cascade_split_ratios() {
        let ratios = Vec3::new(0.1, 0.25, 0.5);
        assert_eq!(cascade_split_ratios(1, ratios), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(cascade_split_ratios(2, ratios), [0.1, 1.0, 1.0, 1.0]);
        assert_eq!(cascade_split_ratios(4, ratios), [0.1, 0.25, 0.5, 1.0]);
        // Out-of-range counts are clamped
        assert_eq!(cascade_split_ratios(9, ratios), [0.1, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_bounding_sphere() {
        let points = [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ];

        let (center, radius) = bounding_sphere(&points);
        assert!(center.length() < 0.001);
        assert!((radius - 3.0f32.sqrt()).abs() < 0.001);
    }

    #[test]
    fn test_cascade_culling_shrinks_radius() {
        let sphere = Vec4::new(1.0, 2.0, 3.0, 10.0);
        for filter in [
            FilterMode::Pcf2x2,
            FilterMode::Pcf3x3,
            FilterMode::Pcf5x5,
            FilterMode::Pcf7x7,
        ] {
            let culling = CascadeCulling::new(sphere, 256, filter);
            assert!(culling.shrunk_radius_squared() <= sphere.w * sphere.w);
            assert_eq!(culling.culling_sphere.truncate(), sphere.truncate());
        }
    }

    #[test]
    fn test_cascade_culling_values() {
        // texel = 2 * 8 / 512, PCF3x3 doubles it
        let culling = CascadeCulling::new(Vec4::new(0.0, 0.0, 0.0, 8.0), 512, FilterMode::Pcf3x3);
        let filter_size = 2.0 * (2.0 * 8.0 / 512.0);

        assert!((culling.data.x - 0.125).abs() < 1e-6);
        assert!((culling.data.y - filter_size * std::f32::consts::SQRT_2).abs() < 1e-6);
        let shrunk = 8.0 - filter_size;
        assert!((culling.shrunk_radius_squared() - shrunk * shrunk).abs() < 1e-4);
    }

    #[test]
    fn test_frustum_slice_in_front_of_camera() {
        let cam = camera();
        let forward = (Vec3::ZERO - cam.position()).normalize();
        for corner in frustum_slice_corners(&cam, 1.0, 5.0) {
            assert!((corner - cam.position()).dot(forward) > 0.0);
        }
    }

    #[test]
    fn test_directional_cascade_centers_sphere() {
        let cam = camera();
        let light_forward = Vec3::new(0.3, -1.0, 0.2).normalize();
        let request = cascade_request(0, 512, 0.2);
        let result = fit_directional_cascade(&cam, light_forward, 50.0, &request);

        let center = result.split.culling_sphere.truncate();
        let clip = (result.projection * result.view).project_point3(center);
        assert!(clip.x.abs() < 1e-3);
        assert!(clip.y.abs() < 1e-3);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_directional_cascades_grow() {
        let cam = camera();
        let radii: Vec<f32> = (0..4)
            .map(|i| {
                let request = cascade_request(i, 256, 0.0);
                fit_directional_cascade(&cam, Vec3::NEG_Y, 100.0, &request).split.culling_sphere.w
            })
            .collect();

        for pair in radii.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_spot_shadow_looks_along_forward() {
        let result = fit_spot_shadow(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 45.0, 10.0);
        let below = (result.projection * result.view).project_point3(Vec3::new(0.0, 0.0, 0.0));
        assert!(below.x.abs() < 1e-4);
        assert!(below.y.abs() < 1e-4);
        assert!(below.z > 0.0 && below.z < 1.0);
    }
}
