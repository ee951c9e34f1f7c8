//! Configuration for the world-anchoring system

/// Tunable thresholds for synchronization and rebasing
///
/// All distances are in engine units (meters for the built-in references).
/// The defaults are suitable for planetary-scale scenes; shrink the epsilons
/// for millimeter-precision local scenes.
#[derive(Debug, Clone)]
pub struct GeoWorldConfig {
    /// Engine-local distance beyond which a rebase source promotes its
    /// position to become the new universe root
    pub rebase_threshold: f64,
    /// Divergence between a stationary rebase source and its root that
    /// triggers a promotion even below `rebase_threshold`
    pub promotion_epsilon: f64,
    /// Positional tolerance for detecting external engine-transform drift
    pub drift_epsilon: f64,
    /// Rotational tolerance for drift detection, measured as deviation of
    /// the quaternion dot product from 1
    pub rotation_epsilon: f64,
    /// Whether rebase sources may move the universe root at all
    ///
    /// Disable when an external system owns the root and anchors should only
    /// follow it.
    pub enable_rebase: bool,
    /// Cap on the number of kept rebase audit records
    pub max_rebase_history: usize,
}

impl Default for GeoWorldConfig {
    fn default() -> Self {
        Self {
            rebase_threshold: 50_000.0, // 50km
            promotion_epsilon: 1.0,
            drift_epsilon: 1e-6,
            rotation_epsilon: 1e-9,
            enable_rebase: true,
            max_rebase_history: 100,
        }
    }
}
