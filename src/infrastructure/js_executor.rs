//! JS 执行器 - 基础设施层
//!
//! 持有 page 资源，只暴露"执行页面脚本"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::page_script::PageScript;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 invoke() / eval() 能力
/// - 不认识 Post / FieldMap
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行任意 JS 表达式并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行登记过的页面脚本
    pub async fn invoke(&self, script: PageScript, arg: &JsonValue) -> AppResult<JsonValue> {
        debug!("执行页面脚本: {:?}", script);
        self.eval(script.expression(arg)).await
    }

    /// 执行页面脚本并反序列化为指定类型
    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        script: PageScript,
        arg: &JsonValue,
    ) -> AppResult<T> {
        let json_value = self.invoke(script, arg).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}
