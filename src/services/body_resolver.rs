//! 正文填充服务 - 业务能力层
//!
//! 正文控件事先未知：按优先级逐个探测，第一个适用的编辑器负责写入。
//! 每次探测在"不适用"时不改动页面。

use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, BrowserError, SubmissionError};
use crate::infrastructure::{BrowserSession, PageScript};
use crate::models::{BodyFillStrategy, EditorKind};

/// 正文填充服务
pub struct BodyResolver {
    strategy: BodyFillStrategy,
}

impl BodyResolver {
    pub fn new(strategy: BodyFillStrategy) -> Self {
        Self { strategy }
    }

    /// 写入正文，返回实际使用的编辑器类型
    ///
    /// 固定策略只尝试该类型；auto 依次尝试全部类型。都不适用时返回 `NoSuitableEditor`
    pub async fn fill_body(
        &self,
        session: &dyn BrowserSession,
        locator: &str,
        html: &str,
    ) -> AppResult<EditorKind> {
        for kind in self.strategy.candidates() {
            debug!("探测正文编辑器: {}", kind.as_str());
            if try_fill(session, kind, locator, html).await? {
                info!("✓ 正文已通过 {} 写入", kind.as_str());
                return Ok(kind);
            }
        }
        Err(SubmissionError::NoSuitableEditor {
            strategy: self.strategy.to_string(),
        }
        .into())
    }
}

/// 单个编辑器的探测 + 写入
async fn try_fill(
    session: &dyn BrowserSession,
    kind: EditorKind,
    locator: &str,
    html: &str,
) -> AppResult<bool> {
    match kind {
        EditorKind::TinyMce => {
            session
                .invoke_as(PageScript::TinyMceSetContent, json!({ "html": html }))
                .await
        }
        EditorKind::CkEditor => {
            session
                .invoke_as(PageScript::CkEditorSetData, json!({ "html": html }))
                .await
        }
        EditorKind::ContentEditable => {
            session
                .invoke_as(
                    PageScript::ContentEditableSetHtml,
                    json!({ "locator": locator, "html": html }),
                )
                .await
        }
        EditorKind::Plain => {
            if !session.exists(locator).await? {
                return Ok(false);
            }
            match session.fill(locator, html).await {
                Ok(()) => Ok(true),
                Err(AppError::Browser(
                    BrowserError::LocatorNotFound { .. } | BrowserError::NotFillable { .. },
                )) => Ok(false),
                Err(e) => Err(e),
            }
        }
    }
}
