//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 决定"什么时候提交哪篇文章"，不关心表单细节。
//!
//! ### `relay` - 单篇文章转发
//! - 从内容源取文章（失败即止，不碰浏览器）
//! - 交给 `workflow::SubmissionFlow` 提交
//!
//! ### `server` - Webhook 服务
//! - 接收 Ghost 发布事件，每个请求独立转发
//! - 把任何失败映射为错误响应，不自动重试
//!
//! ## 层次关系
//!
//! ```text
//! server (HTTP 触发)
//!     ↓
//! relay (取文章 → 提交)
//!     ↓
//! workflow::SubmissionFlow (一篇文章的完整步骤)
//!     ↓
//! services (登录 / 正文 / 上传 / 校验 / 审计)
//!     ↓
//! infrastructure (BrowserSession)
//! ```

pub mod relay;
pub mod server;

pub use relay::{Relay, RelayReport};
pub use server::{router, serve};
