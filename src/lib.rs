//! # Post Relay
//!
//! 把 Ghost 上新发布的文章，通过浏览器自动化填进一个没有 API 的第三方发布表单
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器进程 + Page），只暴露能力
//! - `BrowserSession` - 会话抽象：导航、填充、点击、脚本、截图、关闭
//! - `ChromeSession` - 基于 chromiumoxide 的真实实现，每次提交一个独立进程
//! - `PageScript` - 所有注入页面的 JS 都登记在这里
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每项能力只关心自己那一步
//! - `Authenticator` - 两段式登录
//! - `BodyResolver` - 正文编辑器探测与写入
//! - `AssetUploader` - 特色图片上传（URL 粘贴 / 本地文件）
//! - `SubmissionValidator` - 提交后的成功/失败判断
//! - `AuditRecorder` - 截图与审计日志
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇文章"的完整提交顺序
//! - `SubmissionCtx` - 上下文封装（标题、步骤序号、警告、截图）
//! - `SubmissionFlow` - 流程编排（登录 → 填表 → 上传 → 发布 → 校验）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/relay` - 取文章并提交
//! - `orchestrator/server` - Ghost webhook 服务
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ContentSource, GhostClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserSession, ChromeLauncher, SessionLauncher};
pub use models::{BodyFillStrategy, EditorKind, FieldMap, Post, SubmissionOutcome};
pub use orchestrator::{Relay, RelayReport};
pub use workflow::{SubmissionCtx, SubmissionFlow, TargetSettings};
