//! Draw helpers on `wgpu::RenderPass` for uploaded meshes

use super::gpu_cache::GpuMesh;

/// The pass keeps its own references to bound buffers, so meshes only need to
/// be borrowed for the duration of the call.
pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &GpuMesh);
    /// Three vertices covering the screen, generated in the vertex shader
    fn draw_fullscreen(&mut self);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_fullscreen(&mut self) {
        self.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compiles only while meshes may be borrowed for less than the pass lifetime.
    fn draw_borrowed(render_pass: &mut wgpu::RenderPass<'static>, meshes: &[GpuMesh]) {
        for mesh in meshes {
            render_pass.draw_mesh(mesh);
        }
    }

    #[test]
    fn test_draw_mesh_takes_short_borrows() {
        let _draw: fn(&mut wgpu::RenderPass<'static>, &[GpuMesh]) = draw_borrowed;
    }
}
