//! 文章提交流程 - 流程层
//!
//! 核心职责：定义"一篇文章"的完整提交顺序
//!
//! 流程顺序：
//! 1. 登录 → 打开表单
//! 2. 标题 → 日期 → 正文 → 摘要/SEO
//! 3. 作者、特色图片（失败只记警告）
//! 4. 发布 → 校验 → 成功截图
//!
//! 会话一旦打开，无论哪一步失败都会关闭且只关闭一次。

use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{AppResult, ConfigError};
use crate::infrastructure::{BrowserSession, SessionLauncher};
use crate::models::{BodyFillStrategy, FieldMap, Post, SubmissionOutcome};
use crate::services::asset_uploader::{AssetUploader, UploadTiming};
use crate::services::form_inspector::{self, FormReport};
use crate::services::text_filler::{
    fill_date, fill_text, format_display_date, SEO_DESCRIPTION_MAX_CHARS, SEO_TITLE_MAX_CHARS,
    SUMMARY_MAX_CHARS,
};
use crate::services::{
    AuditRecorder, Authenticator, BodyResolver, Credentials, LoginLocators, SubmissionValidator,
};
use crate::utils::logging;
use crate::workflow::submission_ctx::SubmissionCtx;

/// 各类等待的上限
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// 导航与页面静默
    pub navigation: Duration,
    /// 等待单个字段出现
    pub field: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            field: Duration::from_secs(10),
        }
    }
}

/// 目标站点配置，在第一步之前全部解析完毕
#[derive(Debug, Clone)]
pub struct TargetSettings {
    pub login_url: String,
    pub target_url: String,
    pub credentials: Credentials,
    pub fields: FieldMap,
    pub body_strategy: BodyFillStrategy,
    /// 作者下拉框要设置的值
    pub author_value: Option<String>,
    pub headless: bool,
    pub timeouts: Timeouts,
    pub upload_timing: UploadTiming,
}

impl TargetSettings {
    /// 检查必需的定位器、地址和凭据
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fields.validate()?;
        let required = [
            ("loginUrl", &self.login_url),
            ("targetUrl", &self.target_url),
            ("username", &self.credentials.username),
            ("password", &self.credentials.password),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingCredential {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// 文章提交流程
///
/// - 每次提交各自打开一个会话，不与其他提交共享
/// - 只依赖业务能力（services），页面操作全部经由 `BrowserSession`
pub struct SubmissionFlow<L: SessionLauncher> {
    launcher: L,
    settings: TargetSettings,
    recorder: AuditRecorder,
    authenticator: Authenticator,
    body_resolver: BodyResolver,
    validator: SubmissionValidator,
    uploader: Option<AssetUploader>,
}

impl<L: SessionLauncher> SubmissionFlow<L> {
    pub fn new(launcher: L, settings: TargetSettings, recorder: AuditRecorder) -> Self {
        let fields = &settings.fields;
        let authenticator = Authenticator::new(
            LoginLocators {
                username: fields.username.clone(),
                password: fields.password.clone(),
                primary_action: fields.login_button.clone(),
            },
            settings.credentials.clone(),
            settings.timeouts.field,
            settings.timeouts.navigation,
        );
        let validator = SubmissionValidator::new(fields.success.clone(), fields.error.clone());
        let uploader = fields.upload_button.as_ref().map(|button| {
            AssetUploader::new(button.clone(), fields.file_input(), settings.upload_timing)
        });

        Self {
            launcher,
            body_resolver: BodyResolver::new(settings.body_strategy),
            authenticator,
            validator,
            uploader,
            recorder,
            settings,
        }
    }

    pub fn settings(&self) -> &TargetSettings {
        &self.settings
    }

    /// 提交一篇文章
    ///
    /// 配置不完整时在打开浏览器之前就失败；其余致命错误会先尽力截图，
    /// 再关闭会话，最后原样返回给调用方
    pub async fn submit_post(&self, post: &Post) -> AppResult<SubmissionOutcome> {
        self.settings.validate()?;

        let mut ctx = SubmissionCtx::new(&post.title);
        info!("{} 🚀 开始提交", ctx);
        self.recorder.note_best_effort(&ctx, "开始提交");

        let session = self.launcher.open(self.settings.headless).await?;
        let result = self.run_steps(&session, post, &mut ctx).await;

        if let Err(e) = &result {
            error!("{} ❌ 提交失败: {}", ctx, e);
            if let Some(path) = self.recorder.capture_best_effort(&session, "error").await {
                error!("{} 📷 错误截图: {}", ctx, path.display());
            }
            self.recorder
                .note_best_effort(&ctx, &format!("提交失败: {}", e));
        }
        if let Err(e) = session.close().await {
            warn!("{} 关闭浏览器失败: {}", ctx, e);
        }
        result?;

        self.recorder.note_best_effort(&ctx, "提交完成");
        logging::log_relay_complete(&post.title, ctx.warnings().len(), ctx.artifacts().len());
        Ok(ctx.into_outcome(true))
    }

    /// 登录并打开表单，报告页面上的编辑器与控件
    pub async fn detect(&self) -> AppResult<FormReport> {
        self.settings.validate()?;
        let session = self.launcher.open(self.settings.headless).await?;

        let result = self.inspect_form(&session).await;

        if let Err(e) = session.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        result
    }

    async fn inspect_form(&self, session: &dyn BrowserSession) -> AppResult<FormReport> {
        self.open_form(session, None).await?;
        let report = form_inspector::inspect(session).await?;
        info!(
            "🔎 检测到 {} 个编辑器，{} 个表单控件",
            report.editors.len(),
            report.controls.len()
        );
        Ok(report)
    }

    /// 登录后停在发布表单
    async fn open_form(
        &self,
        session: &dyn BrowserSession,
        mut ctx: Option<&mut SubmissionCtx>,
    ) -> AppResult<()> {
        let timeouts = self.settings.timeouts;

        session
            .navigate(&self.settings.login_url, timeouts.navigation)
            .await?;
        if let Some(ctx) = ctx.as_deref_mut() {
            self.recorder.step(session, ctx, "login-page").await;
        }
        self.authenticator.login(session).await?;

        session
            .navigate(&self.settings.target_url, timeouts.navigation)
            .await?;
        if let Some(ctx) = ctx.as_deref_mut() {
            self.recorder.step(session, ctx, "form").await;
        }
        Ok(())
    }

    async fn run_steps(
        &self,
        session: &dyn BrowserSession,
        post: &Post,
        ctx: &mut SubmissionCtx,
    ) -> AppResult<()> {
        let fields = &self.settings.fields;

        // ========== 登录并打开表单 ==========
        self.open_form(session, Some(&mut *ctx)).await?;
        info!("{} 📝 表单已打开", ctx);

        // ========== 标量字段 ==========
        fill_text(session, &fields.title, &post.title, None).await?;

        if let Some(locator) = &fields.display_date {
            let date = format_display_date(post.published_at);
            fill_date(session, locator, &date).await?;
        }

        // ========== 正文 ==========
        let editor = self
            .body_resolver
            .fill_body(session, &fields.body, &post.html)
            .await?;
        self.recorder
            .note_best_effort(ctx, &format!("正文已通过 {} 写入", editor.as_str()));
        self.recorder.step(session, ctx, "content").await;

        // ========== 摘要与 SEO ==========
        if let Some(locator) = &fields.seo_title {
            fill_text(session, locator, &post.title, Some(SEO_TITLE_MAX_CHARS)).await?;
        }
        match post.meta_description.as_deref() {
            Some(description) => {
                if let Some(locator) = &fields.summary {
                    fill_text(session, locator, description, Some(SUMMARY_MAX_CHARS)).await?;
                }
                if let Some(locator) = &fields.seo_description {
                    fill_text(session, locator, description, Some(SEO_DESCRIPTION_MAX_CHARS))
                        .await?;
                }
            }
            None => debug!("{} 没有摘要，跳过摘要与 SEO 描述", ctx),
        }
        self.recorder.step(session, ctx, "metadata").await;

        // ========== 作者（可恢复） ==========
        if let (Some(locator), Some(author)) = (&fields.author_select, &self.settings.author_value) {
            if let Err(e) = session.fill(locator, author).await {
                let message = format!("设置作者失败: {}", e);
                warn!("{} ⚠️ {}", ctx, message);
                ctx.warn(message);
            }
        }

        // ========== 特色图片（可恢复） ==========
        match (&self.uploader, post.feature_image.as_deref()) {
            (Some(uploader), image @ Some(_)) => {
                if let Err(e) = uploader.upload(session, image).await {
                    let message = format!("特色图片上传失败，继续提交: {}", e);
                    warn!("{} ⚠️ {}", ctx, message);
                    ctx.warn(message);
                    uploader.dismiss(session).await;
                }
                self.recorder.step(session, ctx, "image").await;
            }
            (None, Some(_)) => debug!("{} 未配置上传按钮，跳过特色图片", ctx),
            (_, None) => {}
        }

        // ========== 发布 ==========
        info!("{} 📤 点击发布", ctx);
        session.click(&fields.publish).await?;
        session
            .wait_for_idle(self.settings.timeouts.navigation)
            .await?;
        self.recorder.step(session, ctx, "published").await;

        // ========== 校验 ==========
        let verdict = self.validator.validate(session).await?;
        for message in verdict.warnings() {
            ctx.warn(message.as_str());
        }

        self.recorder.capture_success(session, ctx).await;
        Ok(())
    }
}
