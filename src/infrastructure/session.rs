//! 浏览器会话抽象 - 基础设施层
//!
//! 编排器和各项能力只通过 `BrowserSession` 操作页面，
//! 真实实现见 `ChromeSession`，测试中使用脚本化的假页面。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;

use crate::error::AppResult;
use crate::infrastructure::page_script::PageScript;

/// 一个独占的浏览器会话（一个浏览器进程 + 当前页面）
///
/// 所有等待都有上限，超时即失败；`close` 必须幂等。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 导航并等待网络静默
    ///
    /// 超时返回 `BrowserError::NavigationTimeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> AppResult<()>;

    /// 等待当前页面网络静默
    async fn wait_for_idle(&self, timeout: Duration) -> AppResult<()>;

    /// 执行登记过的页面脚本
    async fn invoke(&self, script: PageScript, arg: JsonValue) -> AppResult<JsonValue>;

    /// 直接设置表单控件的值
    ///
    /// 未找到元素时返回 `LocatorNotFound`，元素不是表单控件时返回 `NotFillable`
    async fn fill(&self, locator: &str, value: &str) -> AppResult<()>;

    /// 聚焦元素后逐字键入
    async fn type_text(&self, locator: &str, text: &str) -> AppResult<()>;

    /// 在元素上按键，例如 `Backspace`
    async fn press_key(&self, locator: &str, key: &str) -> AppResult<()>;

    /// 点击元素
    async fn click(&self, locator: &str) -> AppResult<()>;

    /// 点击元素并等待由此引发的页面跳转
    ///
    /// 跳转等待在点击之前就已发起，两者一并等待
    async fn click_and_wait_for_navigation(&self, locator: &str, timeout: Duration)
        -> AppResult<()>;

    /// 等待元素可见
    ///
    /// 超时返回 `BrowserError::FieldNotVisible`
    async fn wait_for_visible(&self, step: &str, locator: &str, timeout: Duration)
        -> AppResult<()>;

    /// 先挂上一次性的文件选择监听，再点击触发元素，最后提交本地文件
    async fn upload_via_chooser(&self, trigger: &str, file: &Path, timeout: Duration)
        -> AppResult<()>;

    /// 整页截图写入 `path`
    async fn screenshot(&self, path: &Path) -> AppResult<()>;

    /// 关闭会话；重复调用无副作用
    async fn close(&self) -> AppResult<()>;
}

/// 基于 `invoke` 的便捷方法
impl dyn BrowserSession + '_ {
    /// 执行脚本并反序列化结果
    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        script: PageScript,
        arg: JsonValue,
    ) -> AppResult<T> {
        let value = self.invoke(script, arg).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 元素是否存在
    pub async fn exists(&self, locator: &str) -> AppResult<bool> {
        self.invoke_as(PageScript::ElementExists, serde_json::json!({ "locator": locator }))
            .await
    }

    /// 元素文本；不存在时为 `None`
    pub async fn text_of(&self, locator: &str) -> AppResult<Option<String>> {
        self.invoke_as(PageScript::ElementText, serde_json::json!({ "locator": locator }))
            .await
    }

    /// 整页可见文本
    pub async fn body_text(&self) -> AppResult<String> {
        self.invoke_as(PageScript::BodyText, serde_json::json!({})).await
    }
}

/// 打开新会话的工厂
///
/// 每次提交各自打开一个会话，不复用、不共享
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession + 'static;

    async fn open(&self, headless: bool) -> AppResult<Self::Session>;
}
