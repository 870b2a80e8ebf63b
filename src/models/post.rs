//! 文章与提交结果数据模型

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 从内容源取回的文章
///
/// 交给编排器之后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    /// 已清洗的富文本 HTML
    pub html: String,
    pub feature_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub meta_description: Option<String>,
}

impl Post {
    /// 只有标题和正文的文章
    pub fn new(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            html: html.into(),
            feature_image: None,
            published_at: None,
            meta_description: None,
        }
    }
}

/// 一次提交的最终结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    pub succeeded: bool,
    pub warnings: Vec<String>,
    pub artifact_paths: Vec<String>,
}
