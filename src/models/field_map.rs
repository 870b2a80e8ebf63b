//! 目标表单的字段定位器与正文填充策略

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// 默认的文件选择器触发元素
pub const DEFAULT_FILE_INPUT: &str = r#"input[type="file"]"#;

/// 逻辑字段名 -> 目标页面定位器
///
/// 可选字段为 `None` 时对应步骤直接跳过
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub username: String,
    pub password: String,
    pub login_button: String,
    pub title: String,
    pub display_date: Option<String>,
    pub body: String,
    pub summary: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub upload_button: Option<String>,
    pub upload_file_input: Option<String>,
    pub author_select: Option<String>,
    pub publish: String,
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            username: "#txtUsername".to_string(),
            password: "#txtPassword".to_string(),
            login_button: "#btnLogin".to_string(),
            title: r#"input[name="titleBlog"]"#.to_string(),
            display_date: Some(r#"input[name="displayDate"]"#.to_string()),
            body: "#body".to_string(),
            summary: Some("textarea#summary".to_string()),
            seo_title: Some("input#titleTag".to_string()),
            seo_description: Some("textarea#descriptionTag".to_string()),
            upload_button: Some(r#"button[data-test="qa-upload-button"]"#.to_string()),
            upload_file_input: None,
            author_select: Some(r#"input[name="authorSelectedValue"]"#.to_string()),
            publish: r#"button[data-testid="qa-action-publish-button"]"#.to_string(),
            success: None,
            error: None,
        }
    }
}

impl FieldMap {
    /// 只包含必需字段的映射，其余可选字段全部关闭
    pub fn minimal(
        username: &str,
        password: &str,
        login_button: &str,
        title: &str,
        body: &str,
        publish: &str,
    ) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            login_button: login_button.to_string(),
            title: title.to_string(),
            display_date: None,
            body: body.to_string(),
            summary: None,
            seo_title: None,
            seo_description: None,
            upload_button: None,
            upload_file_input: None,
            author_select: None,
            publish: publish.to_string(),
            success: None,
            error: None,
        }
    }

    /// 校验必需字段都有非空定位器
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("username", &self.username),
            ("password", &self.password),
            ("loginButton", &self.login_button),
            ("title", &self.title),
            ("body", &self.body),
            ("publish", &self.publish),
        ];
        for (field, locator) in required {
            if locator.trim().is_empty() {
                return Err(ConfigError::MissingLocator {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// 本地文件上传时的触发元素
    pub fn file_input(&self) -> &str {
        self.upload_file_input.as_deref().unwrap_or(DEFAULT_FILE_INPUT)
    }

    /// 把空字符串的可选定位器归一为 `None`
    pub fn normalized(mut self) -> Self {
        for slot in [
            &mut self.display_date,
            &mut self.summary,
            &mut self.seo_title,
            &mut self.seo_description,
            &mut self.upload_button,
            &mut self.upload_file_input,
            &mut self.author_select,
            &mut self.success,
            &mut self.error,
        ] {
            if slot.as_deref().map(|s| s.trim().is_empty()).unwrap_or(false) {
                *slot = None;
            }
        }
        self
    }
}

/// 具体的正文编辑器类型，按探测优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// TinyMCE（`window.tinymce` 注册表）
    TinyMce,
    /// CKEditor 4/5
    CkEditor,
    /// 任意 `contenteditable` 区域
    ContentEditable,
    /// 普通 `<input>` / `<textarea>`
    Plain,
}

impl EditorKind {
    /// auto 模式下的探测顺序
    pub const PRIORITY: [EditorKind; 4] = [
        EditorKind::TinyMce,
        EditorKind::CkEditor,
        EditorKind::ContentEditable,
        EditorKind::Plain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EditorKind::TinyMce => "tinymce",
            EditorKind::CkEditor => "ckeditor",
            EditorKind::ContentEditable => "contenteditable",
            EditorKind::Plain => "plain",
        }
    }
}

/// 正文填充策略：固定某一种编辑器，或按优先级自动探测
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyFillStrategy {
    #[default]
    Auto,
    Forced(EditorKind),
}

impl BodyFillStrategy {
    /// 本策略需要尝试的编辑器列表
    pub fn candidates(&self) -> Vec<EditorKind> {
        match self {
            BodyFillStrategy::Auto => EditorKind::PRIORITY.to_vec(),
            BodyFillStrategy::Forced(kind) => vec![*kind],
        }
    }
}

impl fmt::Display for BodyFillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyFillStrategy::Auto => write!(f, "auto"),
            BodyFillStrategy::Forced(kind) => write!(f, "{}", kind.as_str()),
        }
    }
}

impl FromStr for BodyFillStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(BodyFillStrategy::Auto),
            "tinymce" => Ok(BodyFillStrategy::Forced(EditorKind::TinyMce)),
            "ckeditor" => Ok(BodyFillStrategy::Forced(EditorKind::CkEditor)),
            "contenteditable" => Ok(BodyFillStrategy::Forced(EditorKind::ContentEditable)),
            "plain" => Ok(BodyFillStrategy::Forced(EditorKind::Plain)),
            other => Err(ConfigError::UnknownBodyStrategy {
                value: other.to_string(),
            }),
        }
    }
}
