//! Built-in Cornell box test scene.
//!
//! Dimensions follow the measured Cornell box data (millimetres, y up). The
//! two blocks are axis aligned. Every quad is wound so that its front face
//! points into the room (walls, light) or out of the block (blocks).

use lumen_math::{Color, Vec3};

use crate::mesh::Mesh;
use crate::scene::{CameraDesc, SceneDescription, SceneMesh, SurfaceMaterial};

const WHITE: Color = Color::new(0.725, 0.71, 0.68);
const RED: Color = Color::new(0.63, 0.065, 0.05);
const GREEN: Color = Color::new(0.14, 0.45, 0.091);
const LIGHT_EMISSION: Color = Color::new(47.8348, 38.5664, 31.0808);

/// Build the Cornell box scene with its camera.
pub fn cornell_box() -> SceneDescription {
    let room_center = Vec3::new(278.0, 274.0, 279.6);
    let mut scene = SceneDescription::default();

    let floor = Mesh::quad_facing(
        [
            Vec3::new(552.8, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 559.2),
            Vec3::new(549.6, 0.0, 559.2),
        ],
        room_center,
    );
    let ceiling = Mesh::quad_facing(
        [
            Vec3::new(556.0, 548.8, 0.0),
            Vec3::new(556.0, 548.8, 559.2),
            Vec3::new(0.0, 548.8, 559.2),
            Vec3::new(0.0, 548.8, 0.0),
        ],
        room_center,
    );
    let back = Mesh::quad_facing(
        [
            Vec3::new(549.6, 0.0, 559.2),
            Vec3::new(0.0, 0.0, 559.2),
            Vec3::new(0.0, 548.8, 559.2),
            Vec3::new(556.0, 548.8, 559.2),
        ],
        room_center,
    );
    let mut white = floor;
    white.append(&ceiling);
    white.append(&back);
    scene.add_mesh(SceneMesh::new(
        "white",
        white,
        SurfaceMaterial::diffuse(WHITE),
    ));

    let left = Mesh::quad_facing(
        [
            Vec3::new(552.8, 0.0, 0.0),
            Vec3::new(549.6, 0.0, 559.2),
            Vec3::new(556.0, 548.8, 559.2),
            Vec3::new(556.0, 548.8, 0.0),
        ],
        room_center,
    );
    scene.add_mesh(SceneMesh::new("left", left, SurfaceMaterial::diffuse(RED)));

    let right = Mesh::quad_facing(
        [
            Vec3::new(0.0, 0.0, 559.2),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 548.8, 0.0),
            Vec3::new(0.0, 548.8, 559.2),
        ],
        room_center,
    );
    scene.add_mesh(SceneMesh::new(
        "right",
        right,
        SurfaceMaterial::diffuse(GREEN),
    ));

    scene.add_mesh(SceneMesh::new(
        "short_block",
        block(Vec3::new(130.0, 0.0, 65.0), Vec3::new(295.0, 165.0, 230.0)),
        SurfaceMaterial::diffuse(WHITE),
    ));
    scene.add_mesh(SceneMesh::new(
        "tall_block",
        block(Vec3::new(265.0, 0.0, 295.0), Vec3::new(430.0, 330.0, 460.0)),
        SurfaceMaterial::diffuse(WHITE),
    ));

    // Slightly below the ceiling so the two never share a plane.
    let light = Mesh::quad_facing(
        [
            Vec3::new(343.0, 548.7, 227.0),
            Vec3::new(343.0, 548.7, 332.0),
            Vec3::new(213.0, 548.7, 332.0),
            Vec3::new(213.0, 548.7, 227.0),
        ],
        room_center,
    );
    scene.add_mesh(SceneMesh::new(
        "light",
        light,
        SurfaceMaterial::emissive(LIGHT_EMISSION, Color::splat(0.65)),
    ));

    scene.camera = CameraDesc {
        position: Vec3::new(278.0, 273.0, -800.0),
        look_at: Vec3::new(278.0, 273.0, 0.0),
        up: Vec3::Y,
        vfov: 40.0,
    };
    scene.point_lights.push(Vec3::new(278.0, 540.0, 279.6));

    scene
}

/// An axis-aligned block without a bottom face, faces pointing outwards.
fn block(min: Vec3, max: Vec3) -> Mesh {
    let center = (min + max) * 0.5;
    let away = |corners: [Vec3; 4]| {
        let face_center = (corners[0] + corners[1] + corners[2] + corners[3]) * 0.25;
        // Mirror the block center through the face to get a point outside.
        Mesh::quad_facing(corners, 2.0 * face_center - center)
    };
    let (x0, y0, z0) = (min.x, min.y, min.z);
    let (x1, y1, z1) = (max.x, max.y, max.z);

    let mut mesh = away([
        Vec3::new(x0, y1, z0),
        Vec3::new(x1, y1, z0),
        Vec3::new(x1, y1, z1),
        Vec3::new(x0, y1, z1),
    ]);
    let sides = [
        [
            Vec3::new(x0, y0, z0),
            Vec3::new(x1, y0, z0),
            Vec3::new(x1, y1, z0),
            Vec3::new(x0, y1, z0),
        ],
        [
            Vec3::new(x0, y0, z1),
            Vec3::new(x1, y0, z1),
            Vec3::new(x1, y1, z1),
            Vec3::new(x0, y1, z1),
        ],
        [
            Vec3::new(x0, y0, z0),
            Vec3::new(x0, y0, z1),
            Vec3::new(x0, y1, z1),
            Vec3::new(x0, y1, z0),
        ],
        [
            Vec3::new(x1, y0, z0),
            Vec3::new(x1, y0, z1),
            Vec3::new(x1, y1, z1),
            Vec3::new(x1, y1, z0),
        ],
    ];
    for side in sides {
        mesh.append(&away(side));
    }
    mesh
}
