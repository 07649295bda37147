use faer_core::{MatMut, MatRef};

use crate::Float;

/// Wrap-around closure of the grid: node `-1` is node `NX-1` and node `NX`
/// is node `0`.
pub struct Periodic;

impl Periodic {
    /// Arguments are a partition of the solution column into left ghosts,
    /// interior nodes and right ghosts.
    pub fn apply(&self, mut left: MatMut<Float>, center: MatRef<Float>, mut right: MatMut<Float>) {
        let corresponding = center.subrows(center.nrows() - left.nrows(), left.nrows());
        left.clone_from(corresponding);

        let corresponding = center.subrows(0, right.nrows());
        right.clone_from(corresponding);
    }
}
