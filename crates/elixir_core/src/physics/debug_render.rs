//! Debug visualization of colliders and contacts

use rapier3d::pipeline::{
    DebugRenderBackend, DebugRenderMode, DebugRenderObject, DebugRenderPipeline, DebugRenderStyle,
};
use rapier3d::prelude::{Point, Real};

use super::world::{from_point, PhysicsWorld};
use crate::foundation::math::Vec3;

/// One line segment of the debug overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Segment start in world space
    pub start: Vec3,
    /// Segment end in world space
    pub end: Vec3,
    /// HSLA colour as produced by the backend
    pub color: [f32; 4],
}

/// Collects backend debug geometry into plain line segments
pub struct DebugVisualizer {
    pipeline: DebugRenderPipeline,
}

impl DebugVisualizer {
    /// Visualize collider shapes and contacts
    pub fn new() -> Self {
        Self {
            pipeline: DebugRenderPipeline::new(
                DebugRenderStyle::default(),
                DebugRenderMode::COLLIDER_SHAPES | DebugRenderMode::CONTACTS,
            ),
        }
    }

    /// Render the current world state into line segments
    pub fn collect(&mut self, world: &PhysicsWorld) -> Vec<DebugLine> {
        let mut sink = LineSink::default();
        self.pipeline.render(
            &mut sink,
            &world.bodies,
            &world.colliders,
            &world.impulse_joints,
            &world.multibody_joints,
            &world.narrow_phase,
        );
        sink.lines
    }
}

impl Default for DebugVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct LineSink {
    lines: Vec<DebugLine>,
}

impl DebugRenderBackend for LineSink {
    fn draw_line(
        &mut self,
        _object: DebugRenderObject<'_>,
        a: Point<Real>,
        b: Point<Real>,
        color: [f32; 4],
    ) {
        self.lines.push(DebugLine {
            start: from_point(&a),
            end: from_point(&b),
            color,
        });
    }
}
