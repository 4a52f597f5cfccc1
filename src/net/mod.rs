//! # 合成 Petri 网（Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T`，输入/输出映射 `Pre, Post ∈ ℕ^{|P|×|T|}`，
//! 迁移效应矩阵 `C = Post - Pre`。合成器为每个分离区域（region）生成一个库所：
//! `Pre[p, t]` 取区域的后向权重，`Post[p, t]` 取前向权重，初始 token 数取区域初始标识。
//!
//! ```rust
//! use pn_synth::net::*;
//!
//! let mut net = Net::empty("demo");
//! let t0 = net.add_transition(Transition::new("a"));
//! let p0 = net.add_place(Place::new("p0", 1), [1], [0]);
//!
//! assert_eq!(net.preset(t0), vec![p0]);
//! assert!(net.is_plain() && net.is_pure());
//! ```

pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use core::Net;
pub use ids::{EventId, PlaceId, TransitionId};
pub use incidence::Incidence;
pub use index_vec::{Idx, IndexVec};
pub use structure::{Marking, Place, Transition, Weight};
