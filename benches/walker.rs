use criterion::{criterion_group, criterion_main};

use octant_trace::entity::{Cube, Entity};
use octant_trace::geometry::V3;
use octant_trace::material::{SimpleSubstance, SolidTexture, StaticMaterial};
use octant_trace::octree::entity_index::{add_entity_to_octree, new_entity_octree, GrowthLimits};
use octant_trace::octree::{Walker, WalkerFlags};
use octant_trace::space::Dimension;
use std::rc::Rc;

fn populated_tree(edge_cells: i32) -> octant_trace::Octree<octant_trace::entity::EntitySet> {
    let mut tree = new_entity_octree(Dimension::new(V3::ZERO, edge_cells as f32));
    let material: Rc<dyn octant_trace::material::Material> = Rc::new(StaticMaterial::opaque_diffuse());
    let texture: Rc<dyn octant_trace::material::Texture> = Rc::new(SolidTexture(V3::splat(1.)));
    let substance: Rc<dyn octant_trace::material::Substance> = Rc::new(SimpleSubstance { refractive_index: 1. });
    for x in 0..edge_cells {
        for z in 0..edge_cells {
            let entity: Rc<dyn Entity> = Rc::new(Cube {
                center: V3::new(x as f32 + 0.5, 0.5, z as f32 + 0.5),
                edge: 0.8,
                material: material.clone(),
                texture: texture.clone(),
                substance: substance.clone(),
            });
            add_entity_to_octree(&mut tree, entity, GrowthLimits::default()).unwrap();
        }
    }
    tree
}

fn criterion_benchmark(c: &mut criterion::Criterion) {
    let tree_size = 64;
    let tree = populated_tree(tree_size);

    c.bench_function("walker traversal", |b| {
        let viewport_size = 64;
        let origin = V3::new(tree_size as f32 / 2., tree_size as f32 * 2., tree_size as f32 / 2.);
        b.iter(|| {
            for y in 0..viewport_size {
                for x in 0..viewport_size {
                    let target = V3::new(
                        x as f32 * (tree_size as f32 / viewport_size as f32),
                        0.,
                        y as f32 * (tree_size as f32 / viewport_size as f32),
                    );
                    let dir = (target - origin).normalize();
                    let mut walker = Walker::new(&tree, WalkerFlags::DEFAULT);
                    walker.set_pos_and_dir(origin, dir, None);
                    for stop in walker {
                        std::hint::black_box(stop);
                    }
                }
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
