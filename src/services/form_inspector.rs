//! 表单探测服务 - 业务能力层
//!
//! 供 `detect` 子命令使用：列出目标表单上的编辑器和控件，帮助修正定位器

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::AppResult;
use crate::infrastructure::{BrowserSession, PageScript};

/// 检测到的富文本编辑器
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedEditor {
    pub kind: String,
    pub count: usize,
    #[serde(default)]
    pub ids: Vec<String>,
}

/// 表单控件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormControl {
    pub tag: String,
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl FormControl {
    /// 建议使用的定位器：优先 id，其次 name
    pub fn suggested_locator(&self) -> Option<String> {
        if let Some(id) = self.id.as_deref().filter(|s| !s.is_empty()) {
            return Some(format!("#{}", id));
        }
        self.name
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|name| format!("{}[name=\"{}\"]", self.tag, name))
    }
}

/// 探测结果
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FormReport {
    pub editors: Vec<DetectedEditor>,
    pub controls: Vec<FormControl>,
}

impl FormReport {
    pub fn log(&self) {
        if self.editors.is_empty() {
            info!("📝 未检测到富文本编辑器，正文将按普通输入框填充");
        }
        for editor in &self.editors {
            info!(
                "📝 编辑器: {} x{} {}",
                editor.kind,
                editor.count,
                editor.ids.join(", ")
            );
        }
        for control in &self.controls {
            info!(
                "  <{}> type={} 定位器={} {}",
                control.tag,
                control.kind.as_deref().unwrap_or("-"),
                control.suggested_locator().unwrap_or_else(|| "-".to_string()),
                control.text
            );
        }
    }
}

/// 探测当前页面
pub async fn inspect(session: &dyn BrowserSession) -> AppResult<FormReport> {
    let editors = session
        .invoke_as(PageScript::DetectEditors, json!({}))
        .await?;
    let controls = session
        .invoke_as(PageScript::DetectFormControls, json!({}))
        .await?;
    Ok(FormReport { editors, controls })
}
