/// 程序配置
///
/// 全部来自环境变量（启动时先读取 `.env`），字段定位器可以再用一个 TOML 文件整体覆盖
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::browser::LaunchOptions;
use crate::error::{AppResult, ConfigError};
use crate::models::{load_field_map, BodyFillStrategy, FieldMap};
use crate::services::asset_uploader::UploadTiming;
use crate::services::authenticator::Credentials;
use crate::services::AuditRecorder;
use crate::workflow::{TargetSettings, Timeouts};

/// 逻辑字段与覆盖它的环境变量
const SELECTOR_VARS: &[&str] = &[
    "TARGET_USERNAME_SELECTOR",
    "TARGET_PASSWORD_SELECTOR",
    "TARGET_LOGIN_BUTTON_SELECTOR",
    "TARGET_TITLE_SELECTOR",
    "TARGET_DATE_SELECTOR",
    "TARGET_BODY_SELECTOR",
    "TARGET_SUMMARY_SELECTOR",
    "TARGET_SEO_TITLE_SELECTOR",
    "TARGET_SEO_DESC_SELECTOR",
    "TARGET_UPLOAD_SELECTOR",
    "TARGET_FILE_INPUT_SELECTOR",
    "TARGET_AUTHOR_SELECTOR",
    "TARGET_PUBLISH_SELECTOR",
    "TARGET_SUCCESS_SELECTOR",
    "TARGET_ERROR_SELECTOR",
];

#[derive(Clone, Debug)]
pub struct Config {
    // --- Ghost 配置 ---
    pub ghost_api_url: String,
    pub ghost_content_api_key: String,
    /// 只用于提示，不做签名校验
    pub ghost_webhook_secret: Option<String>,
    // --- 服务配置 ---
    pub port: u16,
    // --- 目标站点 ---
    pub target: TargetSettings,
    // --- 浏览器与审计 ---
    pub chrome_executable: Option<PathBuf>,
    pub screenshot_dir: PathBuf,
    pub verbose_screenshots: bool,
}

impl Config {
    /// 读取 `.env` 与环境变量
    pub async fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok()).await
    }

    /// 用任意键值来源构建配置，便于测试
    pub async fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| ConfigError::EnvVarNotFound {
                var_name: key.to_string(),
            })
        };

        let ghost_api_url = require("GHOST_API_URL")?.trim_end_matches('/').to_string();
        let ghost_content_api_key = require("GHOST_CONTENT_API_KEY")?;
        let login_url = require("TARGET_LOGIN_URL")?;
        let username = require("TARGET_USERNAME")?;
        let password = require("TARGET_PASSWORD")?;
        let target_url = require("TARGET_URL")?;

        let mut fields = match get("TARGET_FIELD_MAP") {
            Some(path) => load_field_map(&PathBuf::from(path)).await?,
            None => FieldMap::default(),
        };
        for var in SELECTOR_VARS {
            // 显式设置为空字符串可以关闭可选字段
            if let Some(value) = lookup(var) {
                apply_selector(&mut fields, var, value.trim().to_string());
            }
        }
        let fields = fields.normalized();

        let body_strategy = match get("TARGET_BODY_STRATEGY") {
            Some(value) => value.parse::<BodyFillStrategy>()?,
            None => BodyFillStrategy::Auto,
        };

        let navigation_secs: u64 = parse_or(&get, "NAVIGATION_TIMEOUT_SECS", 30, "u64")?;
        let field_secs: u64 = parse_or(&get, "FIELD_TIMEOUT_SECS", 10, "u64")?;
        let timeouts = Timeouts {
            navigation: Duration::from_secs(navigation_secs),
            field: Duration::from_secs(field_secs),
        };

        let target = TargetSettings {
            login_url,
            target_url,
            credentials: Credentials { username, password },
            fields,
            body_strategy,
            author_value: get("TARGET_AUTHOR_VALUE"),
            headless: parse_bool(&get, "HEADLESS", true)?,
            timeouts,
            upload_timing: UploadTiming::default(),
        };

        Ok(Self {
            ghost_api_url,
            ghost_content_api_key,
            ghost_webhook_secret: get("GHOST_WEBHOOK_SECRET"),
            port: parse_or(&get, "PORT", 3000u16, "u16")?,
            target,
            chrome_executable: get("CHROME_EXECUTABLE").map(PathBuf::from),
            screenshot_dir: PathBuf::from(
                get("SCREENSHOT_DIR").unwrap_or_else(|| "screenshots".to_string()),
            ),
            verbose_screenshots: parse_bool(&get, "VERBOSE_SCREENSHOTS", false)?,
        })
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            executable: self.chrome_executable.clone(),
            ..LaunchOptions::default()
        }
    }

    pub fn audit_recorder(&self) -> AuditRecorder {
        AuditRecorder::new(&self.screenshot_dir, self.verbose_screenshots)
    }
}

fn apply_selector(fields: &mut FieldMap, var: &str, value: String) {
    match var {
        "TARGET_USERNAME_SELECTOR" => fields.username = value,
        "TARGET_PASSWORD_SELECTOR" => fields.password = value,
        "TARGET_LOGIN_BUTTON_SELECTOR" => fields.login_button = value,
        "TARGET_TITLE_SELECTOR" => fields.title = value,
        "TARGET_DATE_SELECTOR" => fields.display_date = Some(value),
        "TARGET_BODY_SELECTOR" => fields.body = value,
        "TARGET_SUMMARY_SELECTOR" => fields.summary = Some(value),
        "TARGET_SEO_TITLE_SELECTOR" => fields.seo_title = Some(value),
        "TARGET_SEO_DESC_SELECTOR" => fields.seo_description = Some(value),
        "TARGET_UPLOAD_SELECTOR" => fields.upload_button = Some(value),
        "TARGET_FILE_INPUT_SELECTOR" => fields.upload_file_input = Some(value),
        "TARGET_AUTHOR_SELECTOR" => fields.author_select = Some(value),
        "TARGET_PUBLISH_SELECTOR" => fields.publish = value,
        "TARGET_SUCCESS_SELECTOR" => fields.success = Some(value),
        "TARGET_ERROR_SELECTOR" => fields.error = Some(value),
        _ => {}
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T, expected_type: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: key.to_string(),
            value,
            expected_type: expected_type.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no") => Ok(false),
        Some(value) => Err(ConfigError::EnvVarParseFailed {
            var_name: key.to_string(),
            value,
            expected_type: "bool".to_string(),
        }),
    }
}
