//! 基于区域理论（theory of regions）的 Petri 网综合。
//!
//! * [`RegionUtility`]：事件编号、生成树（Parikh 向量）与区域基；
//! * [`PnProperties`]：目标网需满足的结构性质；
//! * [`Region`]：候选库所（前向/后向权重 + 初始标识）；
//! * [`separation`]：状态分离（SSP）与事件/状态分离（ESSP）问题的整数约束求解；
//! * [`Synthesizer`]：求解全部分离问题并构造结果网。

mod locations;
mod properties;
mod region;
pub mod separation;
mod spanning_tree;
mod synthesizer;
mod utility;

use thiserror::Error;

pub use locations::LocationMap;
pub use properties::PnProperties;
pub use region::Region;
pub use separation::{InequalitySystemSeparation, Separation, SeparationError, create_separation};
pub use spanning_tree::{ParikhVector, SpanningTree};
pub use synthesizer::{SynthesisOutcome, Synthesizer};
pub use utility::{EventIndex, RegionUtility};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UtilityError {
    #[error("event `{0}` does not occur in the transition system")]
    UnknownEvent(String),
    #[error("state `{0}` is not reachable from the initial state")]
    Unreachable(String),
    #[error("region basis entry {0} does not fit into 64 bits")]
    BasisOverflow(String),
}
