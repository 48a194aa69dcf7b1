mod forces;

use std::collections::BTreeMap;

use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

use super::filter::DisplayGraph;
use super::model::{ClusterMode, GraphModel};
use forces::{accumulate_centering, accumulate_repulsion, accumulate_springs};

/// Tuned constants for the force layout. Defaults reproduce the dashboard's
/// canvas; none of them have a derivation beyond "looks right".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub repulsion: f32,
    pub softening: f32,
    pub stiffness: f32,
    pub sparse_rest_length: f32,
    pub dense_rest_length: f32,
    /// Extra rest length per missing degree below six on the sparser endpoint.
    pub rest_widen_per_degree: f32,
    pub min_rest_length: f32,
    pub max_rest_length: f32,
    pub centering: f32,
    pub damping: f32,
    pub settle_threshold: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub drag_alpha: f32,
    pub reheat_alpha: f32,
    pub max_speed: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            repulsion: 120.0,
            softening: 0.01,
            stiffness: 0.015,
            sparse_rest_length: 100.0,
            dense_rest_length: 70.0,
            rest_widen_per_degree: 6.0,
            min_rest_length: 70.0,
            max_rest_length: 160.0,
            centering: 0.0005,
            damping: 0.85,
            settle_threshold: 0.01,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
            drag_alpha: 0.2,
            reheat_alpha: 0.5,
            max_speed: 24.0,
        }
    }
}

impl SimulationConfig {
    pub fn base_rest_length(&self, dense: bool) -> f32 {
        if dense {
            self.dense_rest_length
        } else {
            self.sparse_rest_length
        }
    }

    /// Rest length for an edge whose sparser endpoint has `min_degree`
    /// displayed edges: low-degree pairs get more room.
    pub fn rest_length(&self, dense: bool, min_degree: usize) -> f32 {
        let missing = 6.0 - (min_degree as f32);
        (self.base_rest_length(dense) + missing * self.rest_widen_per_degree)
            .clamp(self.min_rest_length, self.max_rest_length)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringLink {
    pub source: usize,
    pub target: usize,
    pub rest_length: f32,
    pub strength: f32,
}

impl SpringLink {
    /// Springs over the displayed edges. Weight scales strength, clamped so
    /// that outlier weights cannot destabilise the integrator.
    pub fn for_display(
        model: &GraphModel,
        display: &DisplayGraph,
        config: &SimulationConfig,
        dense: bool,
    ) -> Vec<Self> {
        display
            .edges
            .iter()
            .filter_map(|&index| model.edges().get(index))
            .map(|edge| {
                let min_degree = display.display_degree[edge.source]
                    .min(display.display_degree[edge.target]);
                Self {
                    source: edge.source,
                    target: edge.target,
                    rest_length: config.rest_length(dense, min_degree),
                    strength: edge.weight_or_default().clamp(0.1, 3.0),
                }
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimState {
    #[default]
    Active,
    Settled,
}

/// Struct-of-arrays layout state, indexed by model node position.
#[derive(Clone, Debug, Default)]
pub struct Simulation {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pins: Vec<Option<Vec2>>,
    forces: Vec<Vec2>,
    state: SimState,
    alpha: f32,
    energy: f32,
    frozen: bool,
    ticks: u64,
}

impl Simulation {
    /// Fresh layout for `model`: cluster centres on a ring around `center`,
    /// nodes jittered around their cluster centre.
    pub fn seeded(model: &GraphModel, mode: ClusterMode, center: Vec2, viewport: Vec2) -> Self {
        let mut simulation = Self {
            positions: seed_positions(model, mode, center, viewport),
            velocities: vec![Vec2::ZERO; model.len()],
            pins: vec![None; model.len()],
            forces: Vec::new(),
            state: SimState::Active,
            alpha: 1.0,
            energy: 0.0,
            frozen: false,
            ticks: 0,
        };
        if model.len() < 2 {
            simulation.state = SimState::Settled;
        }
        simulation
    }

    /// Carries layout over to a merged model. Known ids keep position,
    /// velocity and pin; new ids start next to their first placed neighbor,
    /// or at `center` if they have none.
    pub fn carried_over(
        &self,
        previous: &GraphModel,
        next: &GraphModel,
        center: Vec2,
        reheat: f32,
    ) -> Self {
        let mut positions = vec![None; next.len()];
        let mut velocities = vec![Vec2::ZERO; next.len()];
        let mut pins = vec![None; next.len()];
        for (index, node) in next.nodes().iter().enumerate() {
            if let Some(old) = previous.index_of(&node.id)
                && old < self.positions.len()
            {
                positions[index] = Some(self.positions[old]);
                velocities[index] = self.velocities[old];
                pins[index] = self.pins[old];
            }
        }

        for index in 0..next.len() {
            if positions[index].is_some() {
                continue;
            }
            let anchor = next
                .neighbors(index)
                .iter()
                .find_map(|&neighbor| positions[neighbor])
                .unwrap_or(center);
            let (jx, jy) = stable_pair(&next.nodes()[index].id);
            positions[index] = Some(anchor + vec2(jx, jy) * 24.0);
        }

        let mut simulation = Self {
            positions: positions
                .into_iter()
                .map(|position| position.unwrap_or(center))
                .collect(),
            velocities,
            pins,
            forces: Vec::new(),
            state: self.state,
            alpha: self.alpha,
            energy: self.energy,
            frozen: self.frozen,
            ticks: self.ticks,
        };
        simulation.invalidate(reheat);
        simulation
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.positions.get(index).copied()
    }

    pub fn velocity(&self, index: usize) -> Option<Vec2> {
        self.velocities.get(index).copied()
    }

    pub fn pin(&self, index: usize) -> Option<Vec2> {
        self.pins.get(index).copied().flatten()
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.pin(index).is_some()
    }

    pub fn pinned_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.pins
            .iter()
            .enumerate()
            .filter_map(|(index, pin)| pin.map(|_| index))
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freezing suspends integration but leaves the settle state alone.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn set_pin(&mut self, index: usize, position: Vec2) {
        let Some(pin) = self.pins.get_mut(index) else {
            return;
        };
        *pin = Some(position);
        self.positions[index] = position;
        self.velocities[index] = Vec2::ZERO;
    }

    pub fn pin_in_place(&mut self, index: usize) {
        if let Some(position) = self.position(index) {
            self.set_pin(index, position);
        }
    }

    pub fn unpin(&mut self, index: usize, reheat: f32) {
        if let Some(pin) = self.pins.get_mut(index)
            && pin.take().is_some()
        {
            self.invalidate(reheat);
        }
    }

    pub fn clear_pins(&mut self, reheat: f32) {
        if self.pins.iter().any(Option::is_some) {
            self.pins.fill(None);
            self.invalidate(reheat);
        }
    }

    /// Back to Active with at least `alpha` heat. Used by data and pin changes.
    pub fn invalidate(&mut self, alpha: f32) {
        if self.positions.len() < 2 {
            self.state = SimState::Settled;
            return;
        }
        self.alpha = self.alpha.max(alpha);
        if self.state == SimState::Settled {
            tracing::trace!(alpha = self.alpha, "simulation reactivated");
        }
        self.state = SimState::Active;
    }

    /// One semi-implicit Euler step. Returns whether anything moved.
    pub fn step(
        &mut self,
        links: &[SpringLink],
        active: &[bool],
        center: Vec2,
        config: &SimulationConfig,
    ) -> bool {
        if self.frozen || self.state == SimState::Settled {
            return false;
        }

        let node_count = self.positions.len();
        if node_count < 2 {
            self.state = SimState::Settled;
            return false;
        }

        self.forces.resize(node_count, Vec2::ZERO);
        self.forces.fill(Vec2::ZERO);
        let mask = (0..node_count)
            .map(|index| active.get(index).copied().unwrap_or(true))
            .collect::<Vec<_>>();

        accumulate_repulsion(
            &self.positions,
            &mask,
            config.repulsion,
            config.softening,
            &mut self.forces,
        );
        accumulate_springs(&self.positions, links, config.stiffness, &mut self.forces);
        accumulate_centering(
            &self.positions,
            &mask,
            center,
            config.centering,
            &mut self.forces,
        );

        let max_speed_sq = config.max_speed * config.max_speed;
        let mut energy = 0.0;
        for index in 0..node_count {
            if let Some(pin) = self.pins[index] {
                self.positions[index] = pin;
                self.velocities[index] = Vec2::ZERO;
                continue;
            }
            if !mask[index] {
                continue;
            }

            let mut velocity =
                (self.velocities[index] + self.forces[index] * self.alpha) * config.damping;
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= config.max_speed / speed_sq.sqrt();
            }
            if !velocity.x.is_finite() || !velocity.y.is_finite() {
                velocity = Vec2::ZERO;
            }

            self.velocities[index] = velocity;
            self.positions[index] += velocity;
            energy += velocity.x.abs() + velocity.y.abs();
        }

        self.energy = energy / node_count as f32;
        self.alpha *= 1.0 - config.alpha_decay;
        self.ticks += 1;

        if self.energy < config.settle_threshold || self.alpha < config.alpha_min {
            self.state = SimState::Settled;
            tracing::debug!(
                ticks = self.ticks,
                energy = self.energy,
                alpha = self.alpha,
                "simulation settled"
            );
        }

        true
    }
}

fn seed_positions(model: &GraphModel, mode: ClusterMode, center: Vec2, viewport: Vec2) -> Vec<Vec2> {
    let mut clusters = BTreeMap::<&str, usize>::new();
    for node in model.nodes() {
        let next = clusters.len();
        clusters.entry(node.cluster_key(mode)).or_insert(next);
    }

    let cluster_count = clusters.len();
    let ring_radius = (viewport.x.min(viewport.y) * 0.5 - 60.0).max(160.0);
    let cluster_centre = |slot: usize| {
        if cluster_count < 2 {
            return center;
        }
        let angle = (slot as f32 / cluster_count as f32) * std::f32::consts::TAU;
        center + vec2(angle.cos(), angle.sin()) * ring_radius
    };

    model
        .nodes()
        .iter()
        .map(|node| {
            let slot = clusters.get(node.cluster_key(mode)).copied().unwrap_or(0);
            let (jx, jy) = stable_pair(&node.id);
            let angle = jx * std::f32::consts::PI;
            let spread = (jy + 1.0) * 0.5;
            let radius = if mode == ClusterMode::None {
                140.0 + spread * 90.0
            } else {
                60.0 + spread * 60.0
            };
            cluster_centre(slot) + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}
