use eframe::egui::{Vec2, vec2};

use super::SpringLink;

/// Unit vector from `b` towards `a`, with a deterministic fallback so that
/// coincident nodes still separate.
fn separation_direction(delta: Vec2, distance: f32, from: usize, to: usize) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        let angle =
            ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

/// All-pairs inverse-square repulsion, `strength / (d² + softening)`.
pub(super) fn accumulate_repulsion(
    positions: &[Vec2],
    active: &[bool],
    strength: f32,
    softening: f32,
    forces: &mut [Vec2],
) {
    for from in 0..positions.len() {
        if !active[from] {
            continue;
        }
        for to in (from + 1)..positions.len() {
            if !active[to] {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance_sq = delta.length_sq();
            let direction = separation_direction(delta, distance_sq.sqrt(), from, to);
            let push = direction * (strength / (distance_sq + softening));
            forces[from] += push;
            forces[to] -= push;
        }
    }
}

pub(super) fn accumulate_springs(
    positions: &[Vec2],
    links: &[SpringLink],
    stiffness: f32,
    forces: &mut [Vec2],
) {
    let node_count = positions.len();
    for link in links {
        if link.source >= node_count || link.target >= node_count || link.source == link.target {
            continue;
        }

        let delta = positions[link.target] - positions[link.source];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;
        let pull = direction * ((distance - link.rest_length) * stiffness * link.strength);

        forces[link.source] += pull;
        forces[link.target] -= pull;
    }
}

pub(super) fn accumulate_centering(
    positions: &[Vec2],
    active: &[bool],
    center: Vec2,
    strength: f32,
    forces: &mut [Vec2],
) {
    for (index, force) in forces.iter_mut().enumerate() {
        if active[index] {
            *force += (center - positions[index]) * strength;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repulsion_is_symmetric_and_separates_coincident_nodes() {
        let positions = vec![Vec2::ZERO, Vec2::ZERO, vec2(10.0, 0.0)];
        let mut forces = vec![Vec2::ZERO; 3];
        accumulate_repulsion(&positions, &[true, true, true], 120.0, 0.01, &mut forces);

        let total = forces.iter().fold(Vec2::ZERO, |sum, force| sum + *force);
        assert!(total.length() < 1e-2);
        assert!(forces[0].length() > 1.0);
        assert!(forces[0].x.is_finite() && forces[0].y.is_finite());
        assert!(forces[2].x > 0.0);
    }

    #[test]
    fn inactive_nodes_do_not_interact() {
        let positions = vec![Vec2::ZERO, vec2(5.0, 0.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_repulsion(&positions, &[true, false], 120.0, 0.01, &mut forces);
        accumulate_centering(&positions, &[true, false], Vec2::ZERO, 0.1, &mut forces);
        assert_eq!(forces, vec![Vec2::ZERO, Vec2::ZERO]);
    }

    #[test]
    fn springs_pull_stretched_edges_together() {
        let positions = vec![Vec2::ZERO, vec2(200.0, 0.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        let link = SpringLink {
            source: 0,
            target: 1,
            rest_length: 100.0,
            strength: 1.0,
        };
        accumulate_springs(&positions, &[link], 0.015, &mut forces);
        assert!((forces[0].x - 1.5).abs() < 1e-4);
        assert!((forces[1].x + 1.5).abs() < 1e-4);
    }
}
