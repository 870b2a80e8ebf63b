//! 单篇文章转发 - 编排层
//!
//! 先从内容源取文章，取不到就直接失败，不会打开浏览器；
//! 取到后交给提交流程。失败不自动重试。

use serde::Serialize;
use tracing::{error, info};

use crate::clients::ContentSource;
use crate::error::AppResult;
use crate::infrastructure::SessionLauncher;
use crate::models::SubmissionOutcome;
use crate::workflow::SubmissionFlow;

/// 一次转发的结果
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelayReport {
    pub title: String,
    pub outcome: SubmissionOutcome,
}

/// 文章转发器
pub struct Relay<C: ContentSource, L: SessionLauncher> {
    source: C,
    flow: SubmissionFlow<L>,
}

impl<C: ContentSource, L: SessionLauncher> Relay<C, L> {
    pub fn new(source: C, flow: SubmissionFlow<L>) -> Self {
        Self { source, flow }
    }

    pub fn flow(&self) -> &SubmissionFlow<L> {
        &self.flow
    }

    /// 转发一篇文章
    pub async fn handle(&self, post_id: &str) -> AppResult<RelayReport> {
        info!("📨 处理文章 {}", post_id);

        let post = self.source.fetch_post(post_id).await.map_err(|e| {
            error!("❌ 获取文章 {} 失败: {}", post_id, e);
            e
        })?;
        let outcome = self.flow.submit_post(&post).await?;

        info!("✅ 已提交 \"{}\"", post.title);
        Ok(RelayReport {
            title: post.title,
            outcome,
        })
    }
}
