use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 配置错误（自动化开始前检测）
    Config(ConfigError),
    /// 浏览器相关错误（导航、定位、等待超时）
    Browser(BrowserError),
    /// 提交流程错误（编辑器、目标页面拒绝）
    Submission(SubmissionError),
    /// 图片上传错误（调用方会降级为警告）
    Upload(UploadError),
    /// 内容源错误
    Upstream(UpstreamError),
    /// 文件操作错误
    File(FileError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Browser(e) => write!(f, "浏览器错误: {}", e),
            AppError::Submission(e) => write!(f, "提交错误: {}", e),
            AppError::Upload(e) => write!(f, "上传错误: {}", e),
            AppError::Upstream(e) => write!(f, "内容源错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Browser(e) => Some(e),
            AppError::Submission(e) => Some(e),
            AppError::Upload(e) => Some(e),
            AppError::Upstream(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 必需的定位器为空
    #[error("字段 {field} 的定位器未配置")]
    MissingLocator { field: String },

    /// 必需的凭据为空
    #[error("凭据 {name} 未配置")]
    MissingCredential { name: String },

    /// 未知的正文填充策略
    #[error("未知的正文填充策略: {value}")]
    UnknownBodyStrategy { value: String },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {reason}")]
    LaunchFailed { reason: String },

    /// 导航超时（页面未在规定时间内进入静默状态）
    #[error("导航到 {url} 超时 ({timeout:?})")]
    NavigationTimeout { url: String, timeout: Duration },

    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 字段在超时时间内未变为可见
    #[error("[{step}] 字段 {locator} 在 {timeout:?} 内未出现")]
    FieldNotVisible {
        step: String,
        locator: String,
        timeout: Duration,
    },

    /// 通用等待超时
    #[error("[{step}] 等待超时 ({timeout:?})")]
    Timeout { step: String, timeout: Duration },

    /// 定位器未匹配到元素
    #[error("定位器未找到元素: {locator}")]
    LocatorNotFound { locator: String },

    /// 匹配到的元素不是 input / textarea / select
    #[error("元素 {locator} 不是可填写的表单控件")]
    NotFillable { locator: String },

    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 文件选择器交互失败
    #[error("文件选择器失败: {reason}")]
    FileChooserFailed { reason: String },

    /// 截图失败
    #[error("截图 {path} 失败: {reason}")]
    ScreenshotFailed { path: String, reason: String },
}

/// 提交流程错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 没有任何正文填充策略成功
    #[error("没有可用的正文编辑器 (策略: {strategy})")]
    NoSuitableEditor { strategy: String },

    /// 页面上出现了配置的错误提示元素
    #[error("目标页面报告提交失败: {detail}")]
    RejectedByTarget { detail: String },
}

/// 图片上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    /// 下载远程图片失败
    #[error("下载图片 {url} 失败: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// 上传组件的某一步失败
    #[error("上传步骤 {step} 失败: {reason}")]
    StepFailed { step: String, reason: String },

    /// 文件在轮询次数内未就绪
    #[error("图片在 {attempts} 次检查后仍未就绪")]
    NotReady { attempts: u32 },
}

/// 内容源错误
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// 文章不存在
    #[error("文章 {id} 不存在")]
    NotFound { id: String },

    /// 文章 id 不是 Ghost 的十六进制 id
    #[error("非法的文章 id: {id:?}")]
    InvalidId { id: String },

    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 返回了非成功状态码
    #[error("内容源返回错误 {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// 响应格式不符合预期
    #[error("响应解析失败: {reason}")]
    Malformed { reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<BrowserError> for AppError {
    fn from(err: BrowserError) -> Self {
        AppError::Browser(err)
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        AppError::Submission(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Upload(err)
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建定位器未找到错误
    pub fn locator_not_found(locator: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::LocatorNotFound {
            locator: locator.into(),
        })
    }

    /// 创建通用超时错误
    pub fn timeout(step: impl Into<String>, timeout: Duration) -> Self {
        AppError::Browser(BrowserError::Timeout {
            step: step.into(),
            timeout,
        })
    }

    /// 创建上传步骤错误
    pub fn upload_step(step: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Upload(UploadError::StepFailed {
            step: step.into(),
            reason: reason.into(),
        })
    }

    /// 创建内容源请求失败错误
    pub fn upstream_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Upstream(UpstreamError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否属于上传失败（调用方据此降级为警告）
    pub fn is_upload_failure(&self) -> bool {
        matches!(self, AppError::Upload(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
