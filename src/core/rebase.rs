//! Rebase trigger: deciding when a source promotes its position to the root
//!
//! Only objects explicitly flagged as rebase sources (typically the active
//! camera) are considered; one source per root avoids promotion feedback
//! loops. All comparisons are epsilon-gated, never bit-exact.

use crate::config::GeoWorldConfig;
use crate::core::anchor::{GeoAnchor, SyncState};
use crate::core::root::UniverseRoot;

/// Why a promotion fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionReason {
    /// The source's engine-local distance from the root origin exceeded the
    /// rebase threshold
    LocalDrift,
    /// The source sat still this tick yet its cartesian position diverged
    /// from the live root, so the divergence is root-staleness, not movement
    StationaryDivergence,
}

/// Decide whether a synchronized anchor should promote its cartesian
/// position to become the new universe root
pub(crate) fn should_promote(
    anchor: &GeoAnchor,
    root: &UniverseRoot,
    config: &GeoWorldConfig,
) -> Option<PromotionReason> {
    if !config.enable_rebase || !anchor.is_rebase_source() {
        return None;
    }
    // A source that has never synchronized, or still has a pending push, has
    // no trustworthy cartesian baseline to promote
    if !anchor.has_synced() || anchor.state() != SyncState::Clean {
        return None;
    }

    let local_distance = anchor.cached_engine().position.as_dvec3().length();
    if local_distance > config.rebase_threshold {
        return Some(PromotionReason::LocalDrift);
    }

    // The root just moved under this anchor; give the explicit move one tick
    // to settle instead of immediately fighting it
    if anchor.root_changed_this_tick() || anchor.moved_this_tick() {
        return None;
    }
    if anchor.cached_revision() != root.revision() {
        return None;
    }

    let divergence = (anchor.cartesian_pose().position - root.universe_position()).length();
    if divergence > config.promotion_epsilon {
        return Some(PromotionReason::StationaryDivergence);
    }

    None
}
