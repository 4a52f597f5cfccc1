//! 基于区域理论的 Petri 网综合：从带标签的迁移系统出发，通过整数约束求解
//! 状态分离与事件/状态分离问题，并由得到的区域构造 P/T 网。

pub mod config;
pub mod equations;
pub mod net;
pub mod options;
pub mod synthesize;
pub mod ts;
