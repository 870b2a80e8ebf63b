//! 图片上传服务 - 业务能力层
//!
//! 把远程图片放进第三方上传组件。组件打开后再看它的能力：
//! 支持粘贴链接就走 URL 流程，否则下载到临时文件走本地文件流程。
//! 两条流程共用"等待就绪 → 裁剪 → 确认 → 等待关闭"的尾段。

use serde::Deserialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, UploadError};
use crate::infrastructure::{BrowserSession, PageScript};

const SUBMIT_LABELS: &[&str] = &["Upload", "Add", "Import", "Submit", "Go"];
const CROP_LABELS: &[&str] = &["Crop", "Next", "Apply"];
const CONFIRM_LABELS: &[&str] = &["Save", "Done", "Confirm", "Insert", "Use image", "Select"];
const CLOSE_LABELS: &[&str] = &["Close", "Cancel"];

/// 轮询节奏（固定间隔，不做指数退避）
#[derive(Debug, Clone, Copy)]
pub struct UploadTiming {
    /// 就绪检查次数上限
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    /// 确认后检查组件是否关闭的次数
    pub close_checks: u32,
    /// 等待文件选择框的上限
    pub chooser_timeout: Duration,
    /// 下载远程图片的上限
    pub download_timeout: Duration,
}

impl Default for UploadTiming {
    fn default() -> Self {
        Self {
            poll_attempts: 20,
            poll_interval: Duration::from_millis(500),
            close_checks: 6,
            chooser_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(30),
        }
    }
}

/// 上传流程的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    OpenWidget,
    ChooseSource,
    PasteUrl,
    SubmitUrl,
    AttachLocalFile,
    AwaitReady { attempt: u32 },
    Crop,
    Confirm,
    AwaitClose { check: u32 },
    ForceClose,
    Done,
}

impl UploadStep {
    fn name(&self) -> &'static str {
        match self {
            UploadStep::OpenWidget => "打开上传组件",
            UploadStep::ChooseSource => "选择来源",
            UploadStep::PasteUrl => "粘贴链接",
            UploadStep::SubmitUrl => "提交链接",
            UploadStep::AttachLocalFile => "选择本地文件",
            UploadStep::AwaitReady { .. } => "等待就绪",
            UploadStep::Crop => "裁剪",
            UploadStep::Confirm => "确认",
            UploadStep::AwaitClose { .. } => "等待关闭",
            UploadStep::ForceClose => "强制关闭",
            UploadStep::Done => "完成",
        }
    }
}

/// 组件就绪信号，任意一个成立即可
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Readiness {
    #[serde(default)]
    primary_enabled: bool,
    #[serde(default)]
    selected_marker: bool,
    #[serde(default)]
    thumbnail: bool,
}

impl Readiness {
    fn any(&self) -> bool {
        self.primary_enabled || self.selected_marker || self.thumbnail
    }
}

/// 单次上传的可变状态；临时文件随它一起销毁（包括出错提前返回）
struct UploadJob<'a> {
    source_url: &'a str,
    temp_file: Option<NamedTempFile>,
}

/// 图片上传服务
pub struct AssetUploader {
    upload_button: String,
    file_input: String,
    timing: UploadTiming,
    client: reqwest::Client,
}

impl AssetUploader {
    pub fn new(
        upload_button: impl Into<String>,
        file_input: impl Into<String>,
        timing: UploadTiming,
    ) -> Self {
        Self {
            upload_button: upload_button.into(),
            file_input: file_input.into(),
            timing,
            client: reqwest::Client::new(),
        }
    }

    /// 上传图片；没有图片时直接返回 `false`
    pub async fn upload(
        &self,
        session: &dyn BrowserSession,
        image_url: Option<&str>,
    ) -> AppResult<bool> {
        let Some(source_url) = image_url.filter(|u| !u.trim().is_empty()) else {
            debug!("没有特色图片，跳过上传");
            return Ok(false);
        };

        let mut job = UploadJob {
            source_url,
            temp_file: None,
        };
        let mut step = UploadStep::OpenWidget;
        while step != UploadStep::Done {
            debug!("🖼️ 上传步骤: {}", step.name());
            step = self.advance(session, step, &mut job).await?;
        }
        info!("🖼️ 特色图片已上传");
        Ok(true)
    }

    /// 执行一次状态转移
    async fn advance(
        &self,
        session: &dyn BrowserSession,
        step: UploadStep,
        job: &mut UploadJob<'_>,
    ) -> AppResult<UploadStep> {
        let next = match step {
            UploadStep::OpenWidget => {
                session
                    .click(&self.upload_button)
                    .await
                    .map_err(|e| AppError::upload_step(step.name(), e.to_string()))?;
                UploadStep::ChooseSource
            }
            UploadStep::ChooseSource => {
                let url_mode: bool = session
                    .invoke_as(PageScript::UploadActivateUrlMode, json!({}))
                    .await?;
                if url_mode {
                    UploadStep::PasteUrl
                } else {
                    debug!("组件不支持粘贴链接，改用本地文件");
                    UploadStep::AttachLocalFile
                }
            }
            UploadStep::PasteUrl => {
                let filled: bool = session
                    .invoke_as(PageScript::UploadFillUrl, json!({ "url": job.source_url }))
                    .await?;
                if !filled {
                    return Err(AppError::upload_step(step.name(), "找不到链接输入框"));
                }
                UploadStep::SubmitUrl
            }
            UploadStep::SubmitUrl => {
                if self.click_labeled(session, SUBMIT_LABELS).await?.is_none() {
                    return Err(AppError::upload_step(step.name(), "找不到提交按钮"));
                }
                UploadStep::AwaitReady { attempt: 1 }
            }
            UploadStep::AttachLocalFile => {
                let temp =
                    download_to_temp(&self.client, job.source_url, self.timing.download_timeout)
                        .await?;
                session
                    .upload_via_chooser(&self.file_input, temp.path(), self.timing.chooser_timeout)
                    .await
                    .map_err(|e| AppError::upload_step(step.name(), e.to_string()))?;
                job.temp_file = Some(temp);
                UploadStep::AwaitReady { attempt: 1 }
            }
            UploadStep::AwaitReady { attempt } => {
                let readiness: Readiness = session
                    .invoke_as(PageScript::UploadReadiness, json!({}))
                    .await?;
                if readiness.any() {
                    debug!("图片在第 {} 次检查时就绪", attempt);
                    UploadStep::Crop
                } else if attempt >= self.timing.poll_attempts {
                    return Err(UploadError::NotReady { attempts: attempt }.into());
                } else {
                    tokio::time::sleep(self.timing.poll_interval).await;
                    UploadStep::AwaitReady {
                        attempt: attempt + 1,
                    }
                }
            }
            UploadStep::Crop => {
                if let Some(label) = self.click_labeled(session, CROP_LABELS).await? {
                    debug!("通过裁剪步骤: {}", label);
                }
                UploadStep::Confirm
            }
            UploadStep::Confirm => match self.click_labeled(session, CONFIRM_LABELS).await? {
                Some(_) => UploadStep::AwaitClose { check: 1 },
                None => return Err(AppError::upload_step(step.name(), "找不到确认按钮")),
            },
            UploadStep::AwaitClose { check } => {
                let open: bool = session
                    .invoke_as(PageScript::UploadDialogOpen, json!({}))
                    .await?;
                if !open {
                    UploadStep::Done
                } else if check >= self.timing.close_checks {
                    UploadStep::ForceClose
                } else {
                    tokio::time::sleep(self.timing.poll_interval).await;
                    UploadStep::AwaitClose { check: check + 1 }
                }
            }
            UploadStep::ForceClose => {
                match self.click_labeled(session, CLOSE_LABELS).await? {
                    Some(label) => debug!("组件未自动关闭，已点击 {}", label),
                    None => warn!("上传组件未关闭，也找不到关闭按钮"),
                }
                UploadStep::Done
            }
            UploadStep::Done => UploadStep::Done,
        };
        Ok(next)
    }

    /// 上传失败后尽力关掉组件，免得挡住后面的发布按钮
    pub async fn dismiss(&self, session: &dyn BrowserSession) {
        let open: bool = session
            .invoke_as(PageScript::UploadDialogOpen, json!({}))
            .await
            .unwrap_or(false);
        if !open {
            return;
        }
        if let Err(e) = self.click_labeled(session, CLOSE_LABELS).await {
            warn!("关闭上传组件失败: {}", e);
        }
    }

    /// 在组件内按标签顺序点第一个可用按钮，返回命中的标签
    async fn click_labeled(
        &self,
        session: &dyn BrowserSession,
        labels: &[&str],
    ) -> AppResult<Option<String>> {
        session
            .invoke_as(PageScript::UploadClickButton, json!({ "labels": labels }))
            .await
    }
}

/// 按 Content-Type 推断扩展名，未识别时为 jpg
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|c| c.split(';').next())
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_default();
    match mime.as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

/// 下载远程图片到带正确扩展名的临时文件
/// 下载到带扩展名的临时文件；超时作用在单次请求上（含读取响应体）
async fn download_to_temp(
    client: &reqwest::Client,
    url: &str,
    limit: Duration,
) -> AppResult<NamedTempFile> {
    let failed = |reason: String| -> AppError {
        UploadError::DownloadFailed {
            url: url.to_string(),
            reason,
        }
        .into()
    };

    let response = client
        .get(url)
        .timeout(limit)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| failed(e.to_string()))?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let extension = extension_for(content_type.as_deref());
    let mut file = tempfile::Builder::new()
        .prefix("post-relay-")
        .suffix(&format!(".{}", extension))
        .tempfile()
        .map_err(|e| failed(e.to_string()))?;
    file.write_all(&bytes).map_err(|e| failed(e.to_string()))?;
    file.flush().map_err(|e| failed(e.to_string()))?;

    debug!(
        "图片已下载到 {} ({} 字节)",
        display_name(file.path()),
        bytes.len()
    );
    Ok(file)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
