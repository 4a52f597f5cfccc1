//! 分离问题：为两状态（SSP）或状态与事件（ESSP）寻找分离区域。
//!
//! [`InequalitySystemSeparation`] 在构造时一次性生成基础约束与可选的析取约束组，
//! 每次查询只在其副本上追加一条实例约束后交给 [`crate::equations::find_solution`]。

mod inequality_system;
mod layout;

use thiserror::Error;

use crate::synthesize::UtilityError;
use crate::synthesize::locations::LocationMap;
use crate::synthesize::properties::PnProperties;
use crate::synthesize::region::Region;
use crate::synthesize::utility::RegionUtility;
use crate::ts::StateId;

pub use inequality_system::InequalitySystemSeparation;
pub use layout::VariableLayout;

#[derive(Debug, Error)]
pub enum SeparationError {
    #[error(transparent)]
    Utility(#[from] UtilityError),
    #[error("solution assigns {value} to variable {variable}, which is not a valid region entry")]
    ValueOutOfRange { variable: usize, value: String },
}

/// Decision procedures for the two separation problems. `Ok(None)` means no
/// region with the requested properties separates the instance.
pub trait Separation {
    /// A region whose marking at `state` is strictly smaller than at `other`.
    fn separate_states(&self, state: StateId, other: StateId) -> Result<Option<Region>, SeparationError>;

    /// A region in which `event` is disabled at `state`.
    fn separate_event(&self, state: StateId, event: &str) -> Result<Option<Region>, SeparationError>;
}

/// Builds the separation engine for `properties`.
///
/// Output-nonbranching nets are synthesized as distributable nets where
/// every event sits in a location of its own, so the flag never reaches the
/// engine.
pub fn create_separation<'a>(
    utility: &'a RegionUtility<'a>,
    properties: PnProperties,
    locations: &LocationMap,
) -> Result<InequalitySystemSeparation<'a>, UtilityError> {
    if properties.is_output_nonbranching() {
        let locations = LocationMap::one_per_event(utility);
        InequalitySystemSeparation::new(utility, properties.with_output_nonbranching(false), &locations)
    } else {
        InequalitySystemSeparation::new(utility, properties, locations)
    }
}
