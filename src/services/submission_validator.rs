//! 提交结果校验 - 业务能力层
//!
//! 目标站点不给明确回执，只能看页面：
//! 1. 配置了错误标识且命中 → 致命失败
//! 2. 配置了成功标识 → 出现即成功；没出现记一条警告，再继续第 3 步
//! 3. 全文关键字扫描，命中记警告
//!
//! 第 3 步只是兜底的启发式，"没有警告"只代表"大概率成功"。

use regex::Regex;
use tracing::{info, warn};

use crate::error::{AppResult, SubmissionError};
use crate::infrastructure::BrowserSession;

/// 失败关键字，按顺序尝试
const FAILURE_KEYWORDS: &[&str] = &[
    r"(?i)\berror\b",
    r"(?i)\bfailed\b",
    r"(?i)\binvalid\b",
    r"(?i)\bcould not\b",
    r"(?i)\bunable to\b",
];

/// 校验结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 成功标识已出现
    Confirmed,
    /// 没有任何失败迹象
    NoFailureSignal,
    /// 证据模糊，每条都记为警告
    Suspicious(Vec<String>),
}

impl Verdict {
    /// 需要写入结果的警告
    pub fn warnings(&self) -> &[String] {
        match self {
            Verdict::Suspicious(messages) => messages,
            _ => &[],
        }
    }
}

/// 提交结果校验服务
pub struct SubmissionValidator {
    success_locator: Option<String>,
    error_locator: Option<String>,
    keywords: Vec<Regex>,
}

impl SubmissionValidator {
    pub fn new(success_locator: Option<String>, error_locator: Option<String>) -> Self {
        let keywords = FAILURE_KEYWORDS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();
        Self {
            success_locator,
            error_locator,
            keywords,
        }
    }

    /// 检查提交后的页面
    ///
    /// 只有错误标识命中时返回 `RejectedByTarget`；其余情况都给出结论
    pub async fn validate(&self, session: &dyn BrowserSession) -> AppResult<Verdict> {
        if let Some(locator) = &self.error_locator {
            if session.exists(locator).await? {
                let detail = session
                    .text_of(locator)
                    .await?
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("错误标识 {} 已出现", locator));
                return Err(SubmissionError::RejectedByTarget { detail }.into());
            }
        }

        let mut warnings = Vec::new();
        if let Some(locator) = &self.success_locator {
            if session.exists(locator).await? {
                info!("✓ 成功标识已出现");
                return Ok(Verdict::Confirmed);
            }
            // 成功标识可能配错了，关键字扫描照常进行
            let message = format!("未找到成功标识 {}，无法确认提交结果", locator);
            warn!("⚠️ {}", message);
            warnings.push(message);
        }

        let text = session.body_text().await?;
        warnings.extend(self.scan_text(&text).warnings().iter().cloned());

        Ok(if warnings.is_empty() {
            Verdict::NoFailureSignal
        } else {
            Verdict::Suspicious(warnings)
        })
    }

    /// 关键字扫描；第一个命中的关键字决定警告内容
    pub fn scan_text(&self, text: &str) -> Verdict {
        for keyword in &self.keywords {
            if let Some(found) = keyword.find(text) {
                let message = format!("页面文本包含疑似失败的字样: \"{}\"", found.as_str());
                warn!("⚠️ {}", message);
                return Verdict::Suspicious(vec![message]);
            }
        }
        info!("✓ 页面未发现失败字样");
        Verdict::NoFailureSignal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::fake::{FakeElement, FakePage};

    fn keyword_validator() -> SubmissionValidator {
        SubmissionValidator::new(None, None)
    }

    #[tokio::test]
    async fn test_error_indicator_wins_over_success() {
        let page = FakePage::new()
            .with_element(".alert-error", FakeElement::input().with_text("  Title is required "))
            .with_element(".alert-success", FakeElement::input());
        let validator = SubmissionValidator::new(
            Some(".alert-success".to_string()),
            Some(".alert-error".to_string()),
        );

        let err = validator.validate(&page).await.unwrap_err();
        match err {
            AppError::Submission(SubmissionError::RejectedByTarget { detail }) => {
                assert_eq!(detail, "Title is required")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_success_indicator_present() {
        let page = FakePage::new().with_element(".alert-success", FakeElement::input());
        let validator = SubmissionValidator::new(
            Some(".alert-success".to_string()),
            Some(".alert-error".to_string()),
        );

        assert_eq!(validator.validate(&page).await.unwrap(), Verdict::Confirmed);
    }

    #[tokio::test]
    async fn test_missing_success_indicator_is_only_a_warning() {
        let page = FakePage::new();
        page.state().body_text = "Post saved".to_string();
        let validator = SubmissionValidator::new(Some(".alert-success".to_string()), None);

        let verdict = validator.validate(&page).await.unwrap();
        assert_eq!(verdict.warnings().len(), 1);
        assert!(verdict.warnings()[0].contains(".alert-success"));
        assert!(page.called("invoke:BodyText"));
    }

    #[tokio::test]
    async fn test_missing_success_indicator_still_scans_keywords() {
        let page = FakePage::new();
        page.state().body_text = "Error: Title is required".to_string();
        let validator = SubmissionValidator::new(Some(".alert-success".to_string()), None);

        let verdict = validator.validate(&page).await.unwrap();
        let warnings = verdict.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains(".alert-success"));
        assert!(warnings[1].contains("\"Error\""));
    }

    #[tokio::test]
    async fn test_clean_page_without_indicators() {
        let page = FakePage::new();
        page.state().body_text = "Post published".to_string();

        let verdict = keyword_validator().validate(&page).await.unwrap();
        assert_eq!(verdict, Verdict::NoFailureSignal);
    }

    #[tokio::test]
    async fn test_keyword_scan_when_no_indicators() {
        let page = FakePage::new();
        page.state().body_text = "Your post could not be saved".to_string();

        let verdict = keyword_validator().validate(&page).await.unwrap();
        assert!(verdict.warnings()[0].contains("could not"));
    }

    #[test]
    fn test_keywords_are_tried_in_order() {
        let verdict = keyword_validator().scan_text("Invalid date. An Error occurred.");
        assert!(verdict.warnings()[0].contains("\"Error\""));
    }

    #[test]
    fn test_keyword_scan_respects_word_boundaries() {
        let validator = keyword_validator();
        assert_eq!(
            validator.scan_text("Post published. No errors, terror-free."),
            Verdict::NoFailureSignal
        );
        assert!(!validator.scan_text("UNABLE TO connect").warnings().is_empty());
    }
}
