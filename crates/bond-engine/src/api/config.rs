use serde::{Deserialize, Serialize};

/// Simulation configuration. Every cadence and force constant lives here.
///
/// Deserializes from partial JSON; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks between force evaluations (default: 2).
    pub force_interval: u32,
    /// Ticks between bonding scans (default: 6). Must exceed `force_interval`.
    pub bond_scan_interval: u32,
    /// Upper bound on a single tick's dt in seconds (default: 0.1).
    pub max_dt: f32,

    /// Bond spring constant, scaled by bond order.
    pub bond_stiffness: f32,
    /// Axial damping along a bond, scaled by bond order.
    pub bond_damping: f32,
    /// Isotropic velocity drag applied to both endpoints of every bond.
    pub velocity_damping: f32,

    /// Pairwise angle spring along the neighbor–neighbor axis.
    pub angle_stiffness: f32,
    /// Damping along the neighbor–neighbor axis, always applied.
    pub angle_damping: f32,
    /// Angle error in degrees below which only damping acts.
    pub angle_tolerance_degrees: f32,
    /// Collinearity pull for linear centers.
    pub linear_stiffness: f32,
    /// Perpendicular velocity damping for linear centers.
    pub linear_damping: f32,
    /// Pull of trigonal-planar neighbors back into the plane.
    pub planarity_stiffness: f32,
    /// Corrective strength when a center's plane normal inverts.
    pub flip_stiffness: f32,
    /// Blend factor pulling the remembered plane normal toward the current one.
    pub plane_memory_blend: f32,

    /// Per-axis velocity damping applied every tick, as `(1 - d)^dt`.
    pub atom_damping: [f32; 3],
    /// Net force magnitude clamp per atom.
    pub max_force: f32,

    /// Unbonded pairs closer than this × ideal length repel.
    pub min_safe_factor: f32,
    /// Unbonded pairs within this × ideal length bond.
    pub max_bond_factor: f32,
    /// Unbonded pairs within this × ideal length attract.
    pub attraction_factor: f32,
    /// Bonds stretched past this × ideal length break.
    pub breaking_factor: f32,
    pub attraction_strength: f32,
    pub repulsion_strength: f32,
    /// Repulsion distance floor as a fraction of ideal length.
    pub repulsion_floor_factor: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            force_interval: 2,
            bond_scan_interval: 6,
            max_dt: 0.1,
            bond_stiffness: 60.0,
            bond_damping: 8.0,
            velocity_damping: 0.5,
            angle_stiffness: 20.0,
            angle_damping: 10.0,
            angle_tolerance_degrees: 0.25,
            linear_stiffness: 60.0,
            linear_damping: 3.0,
            planarity_stiffness: 40.0,
            flip_stiffness: 80.0,
            plane_memory_blend: 0.1,
            atom_damping: [0.4; 3],
            max_force: 500.0,
            min_safe_factor: 0.55,
            max_bond_factor: 1.35,
            attraction_factor: 2.5,
            breaking_factor: 2.2,
            attraction_strength: 8.0,
            repulsion_strength: 2.0,
            repulsion_floor_factor: 0.1,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON and sanitize it.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Repair values the driver cannot run with.
    ///
    /// Intervals are at least 1 and the scan interval stays above the force
    /// interval. Damping factors are clamped into `[0, 1)`.
    pub fn sanitized(mut self) -> Self {
        if self.force_interval == 0 {
            log::warn!("force_interval 0 is invalid, using 1");
            self.force_interval = 1;
        }
        if self.bond_scan_interval <= self.force_interval {
            let repaired = self.force_interval + 1;
            log::warn!(
                "bond_scan_interval {} must exceed force_interval {}, using {}",
                self.bond_scan_interval,
                self.force_interval,
                repaired
            );
            self.bond_scan_interval = repaired;
        }
        if !(self.max_dt > 0.0) {
            log::warn!("max_dt {} is invalid, using default", self.max_dt);
            self.max_dt = Self::default().max_dt;
        }
        for d in &mut self.atom_damping {
            *d = d.clamp(0.0, 0.999);
        }
        self.plane_memory_blend = self.plane_memory_blend.clamp(0.0, 1.0);
        self
    }

    pub fn angle_tolerance(&self) -> f32 {
        self.angle_tolerance_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_scan_slower_than_forces() {
        let c = SimConfig::default();
        assert_eq!(c.force_interval, 2);
        assert_eq!(c.bond_scan_interval, 6);
        assert!(c.bond_scan_interval > c.force_interval);
    }

    #[test]
    fn empty_json_gives_defaults() {
        let c = SimConfig::from_json("{}").unwrap();
        assert_eq!(c, SimConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let c = SimConfig::from_json(r#"{ "bond_stiffness": 90.0, "force_interval": 3 }"#).unwrap();
        assert_eq!(c.bond_stiffness, 90.0);
        assert_eq!(c.force_interval, 3);
        assert_eq!(c.angle_stiffness, SimConfig::default().angle_stiffness);
    }

    #[test]
    fn round_trips_through_json() {
        let original = SimConfig {
            breaking_factor: 3.0,
            atom_damping: [0.1, 0.2, 0.3],
            ..SimConfig::default()
        };
        let json = serde_json::to_string(&original).unwrap();
        let parsed = SimConfig::from_json(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn invalid_intervals_are_repaired() {
        let c = SimConfig::from_json(r#"{ "force_interval": 0, "bond_scan_interval": 1 }"#).unwrap();
        assert_eq!(c.force_interval, 1);
        assert_eq!(c.bond_scan_interval, 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(SimConfig::from_json("{ force_interval: }").is_err());
        assert!(SimConfig::from_json(r#"{ "max_force": "lots" }"#).is_err());
    }
}
