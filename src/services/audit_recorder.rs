//! 审计记录服务 - 业务能力层
//!
//! 只负责"留证据"：整页截图和追加式文本日志，不关心流程

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::BrowserSession;
use crate::workflow::SubmissionCtx;

/// 审计日志文件名（位于截图目录下）
pub const AUDIT_LOG_FILE: &str = "audit.log";

/// 审计记录服务
///
/// 职责：
/// - 按 `<label>-<时间戳>.png` 命名保存整页截图
/// - 详细模式下每个逻辑步骤截一张带序号的图
/// - 把关键事件追加写入 audit.log
pub struct AuditRecorder {
    dir: PathBuf,
    verbose: bool,
}

impl AuditRecorder {
    pub fn new(dir: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            dir: dir.into(),
            verbose,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 截图路径；时间戳中的冒号和点替换为短横线
    pub fn screenshot_path(&self, label: &str, at: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("{}-{}.png", label, file_timestamp(at)))
    }

    fn ensure_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::file_write_failed(self.dir.display().to_string(), e))
    }

    /// 整页截图
    pub async fn capture(&self, session: &dyn BrowserSession, label: &str) -> AppResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.screenshot_path(label, Utc::now());
        session.screenshot(&path).await?;
        debug!("截图已保存: {}", path.display());
        Ok(path)
    }

    /// 尽力截图：失败只记日志，绝不掩盖调用方手里的原始错误
    pub async fn capture_best_effort(
        &self,
        session: &dyn BrowserSession,
        label: &str,
    ) -> Option<PathBuf> {
        match self.capture(session, label).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("截图 {} 失败（已忽略）: {}", label, e);
                None
            }
        }
    }

    /// 详细模式下为当前步骤截一张带序号的图
    pub async fn step(&self, session: &dyn BrowserSession, ctx: &mut SubmissionCtx, name: &str) {
        if !self.verbose {
            return;
        }
        let label = format!("step-{:02}-{}", ctx.next_step(), name);
        if let Some(path) = self.capture_best_effort(session, &label).await {
            ctx.record_artifact(&path);
        }
    }

    /// 追加一行审计日志
    pub fn note(&self, ctx: &SubmissionCtx, message: &str) -> AppResult<()> {
        self.ensure_dir()?;
        let path = self.dir.join(AUDIT_LOG_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        let line = format!(
            "{} {} {}\n",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            ctx,
            message
        );
        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        Ok(())
    }

    /// 记录审计日志，失败时只打警告
    pub fn note_best_effort(&self, ctx: &SubmissionCtx, message: &str) {
        if let Err(e) = self.note(ctx, message) {
            warn!("写入审计日志失败: {}", e);
        }
    }

    /// 成功时的最终截图
    pub async fn capture_success(&self, session: &dyn BrowserSession, ctx: &mut SubmissionCtx) {
        if let Some(path) = self.capture_best_effort(session, "success").await {
            info!("{} 📷 成功截图: {}", ctx, path.display());
            ctx.record_artifact(&path);
        }
    }
}

/// ISO8601 时间戳，冒号和点替换为 `-`
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake::FakePage;
    use chrono::TimeZone;

    #[test]
    fn test_screenshot_name_replaces_colons_and_periods() {
        let recorder = AuditRecorder::new("shots", false);
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
            + chrono::Duration::milliseconds(42);
        let path = recorder.screenshot_path("error", at);
        assert_eq!(path, Path::new("shots").join("error-2024-03-09T14-05-07-042Z.png"));
    }

    #[tokio::test]
    async fn test_capture_creates_directory_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let shots = dir.path().join("nested").join("shots");
        let recorder = AuditRecorder::new(&shots, false);
        let page = FakePage::new();

        let path = recorder.capture(&page, "success").await.unwrap();
        assert!(path.starts_with(&shots));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_best_effort_swallows_screenshot_failure() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = AuditRecorder::new(dir.path(), false);
        let page = FakePage::new();
        page.state().fail_screenshots = true;

        assert!(recorder.capture_best_effort(&page, "error").await.is_none());
    }

    #[tokio::test]
    async fn test_verbose_steps_are_numbered_per_submission() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = AuditRecorder::new(dir.path(), true);
        let page = FakePage::new();

        let mut first = SubmissionCtx::new("first");
        recorder.step(&page, &mut first, "login").await;
        recorder.step(&page, &mut first, "form").await;
        let mut second = SubmissionCtx::new("second");
        recorder.step(&page, &mut second, "login").await;

        let names = |ctx: &SubmissionCtx| -> Vec<String> {
            ctx.artifacts()
                .iter()
                .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().to_string())
                .collect()
        };
        let first_names = names(&first);
        assert!(first_names[0].starts_with("step-01-login-"));
        assert!(first_names[1].starts_with("step-02-form-"));
        assert!(names(&second)[0].starts_with("step-01-login-"));
    }

    #[tokio::test]
    async fn test_quiet_mode_takes_no_step_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = AuditRecorder::new(dir.path(), false);
        let page = FakePage::new();
        let mut ctx = SubmissionCtx::new("t");

        recorder.step(&page, &mut ctx, "login").await;
        assert!(ctx.artifacts().is_empty());
        assert!(!page.called("screenshot"));
    }

    #[test]
    fn test_note_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = AuditRecorder::new(dir.path(), false);
        let ctx = SubmissionCtx::new("Hello");

        recorder.note(&ctx, "开始提交").unwrap();
        recorder.note(&ctx, "提交完成").unwrap();

        let log = fs::read_to_string(dir.path().join(AUDIT_LOG_FILE)).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[文章 \"Hello\"] 开始提交"));
    }
}
