/// Ghost Content API 客户端
///
/// 只读：按 id 取单篇文章，或列出最近的文章用于连通性检查
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, UpstreamError};
use crate::models::Post;

/// 文章内容来源
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// 按 id 取文章；不存在时返回 `UpstreamError::NotFound`
    async fn fetch_post(&self, id: &str) -> AppResult<Post>;
}

/// Ghost 返回的文章（只取用得到的字段）
#[derive(Debug, Clone, Deserialize)]
pub struct GhostPost {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub custom_excerpt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<GhostPost>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl GhostPost {
    /// 转换为提交用的文章；摘要优先 meta_description，其次 custom_excerpt
    pub fn into_post(self) -> Post {
        let meta_description =
            non_empty(self.meta_description).or_else(|| non_empty(self.custom_excerpt));
        Post {
            title: self.title,
            html: self.html.unwrap_or_default(),
            feature_image: non_empty(self.feature_image),
            published_at: self.published_at,
            meta_description,
        }
    }
}

/// 解析单篇文章接口的响应体
pub fn post_from_response(body: &str, id: &str) -> AppResult<Post> {
    let envelope: PostsEnvelope =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed {
            reason: e.to_string(),
        })?;
    envelope
        .posts
        .into_iter()
        .next()
        .map(GhostPost::into_post)
        .ok_or_else(|| UpstreamError::NotFound { id: id.to_string() }.into())
}

/// Ghost 客户端
pub struct GhostClient {
    client: Client,
    api_url: String,
    content_api_key: String,
}

impl GhostClient {
    pub fn new(api_url: &str, content_api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            content_api_key: content_api_key.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/ghost/api/content/{}", self.api_url, path)
    }

    /// 发送 GET 请求并取回响应体；非 2xx 时带上状态码和响应内容
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> AppResult<(StatusCode, String)> {
        let endpoint = self.endpoint(path);
        let mut params = vec![("key", self.content_api_key.as_str())];
        params.extend_from_slice(query);

        let response = self
            .client
            .get(&endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::upstream_request_failed(&endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::upstream_request_failed(&endpoint, e))?;
        Ok((status, body))
    }

    /// 列出最近的文章（id、标题、slug、发布时间）
    pub async fn list_recent(&self, limit: usize) -> AppResult<Vec<GhostPost>> {
        let limit = limit.to_string();
        let (status, body) = self
            .get(
                "posts/",
                &[("limit", limit.as_str()), ("fields", "id,title,slug,published_at")],
            )
            .await?;
        if !status.is_success() {
            return Err(UpstreamError::BadStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        let envelope: PostsEnvelope =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Malformed {
                reason: e.to_string(),
            })?;
        info!("📚 Ghost 返回 {} 篇文章", envelope.posts.len());
        Ok(envelope.posts)
    }
}

/// Ghost 文章 id 是小写十六进制串；其他字符不允许拼进请求路径
pub fn is_valid_post_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[async_trait]
impl ContentSource for GhostClient {
    async fn fetch_post(&self, id: &str) -> AppResult<Post> {
        if !is_valid_post_id(id) {
            return Err(UpstreamError::InvalidId { id: id.to_string() }.into());
        }
        debug!("获取 Ghost 文章 {}", id);
        let (status, body) = self
            .get(
                &format!("posts/{}/", id),
                &[("formats", "html"), ("include", "authors")],
            )
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound { id: id.to_string() }.into());
        }
        if !status.is_success() {
            return Err(UpstreamError::BadStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let post = post_from_response(&body, id)?;
        info!("📄 已获取文章: \"{}\"", post.title);
        Ok(post)
    }
}
