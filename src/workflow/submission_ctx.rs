//! 文章提交上下文
//!
//! 封装"我正在提交哪篇文章、走到第几步、攒了哪些警告"这一信息

use std::fmt::Display;
use std::path::Path;

use crate::models::SubmissionOutcome;
use crate::utils::logging::truncate_text;

/// 单次提交的上下文
///
/// 每次提交独立创建，步骤计数不会在并发提交之间串号
#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// 文章标题（仅用于日志显示）
    pub title: String,

    /// 详细截图模式下的步骤序号
    step: usize,

    warnings: Vec<String>,
    artifacts: Vec<String>,
}

impl SubmissionCtx {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            step: 0,
            warnings: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// 前进一步并返回新的序号（从 1 开始）
    pub fn next_step(&mut self) -> usize {
        self.step += 1;
        self.step
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn record_artifact(&mut self, path: &Path) {
        self.artifacts.push(path.display().to_string());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn artifacts(&self) -> &[String] {
        &self.artifacts
    }

    /// 生成最终结果
    pub fn into_outcome(self, succeeded: bool) -> SubmissionOutcome {
        SubmissionOutcome {
            succeeded,
            warnings: self.warnings,
            artifact_paths: self.artifacts,
        }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文章 \"{}\"]", truncate_text(&self.title, 30))
    }
}
