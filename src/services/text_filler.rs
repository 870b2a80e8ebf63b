//! 标量字段填充 - 业务能力层
//!
//! 标题、摘要、SEO 字段与日期：单一直接填充，没有回退

use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::BrowserSession;

/// 摘要字段字符上限
pub const SUMMARY_MAX_CHARS: usize = 240;
/// SEO 标题字符上限
pub const SEO_TITLE_MAX_CHARS: usize = 100;
/// SEO 描述字符上限
pub const SEO_DESCRIPTION_MAX_CHARS: usize = 280;

/// 目标表单的日期格式
pub const DISPLAY_DATE_FORMAT: &str = "%m/%d/%Y";

/// 按字符截断为前 `max_chars` 个字符（超长截断，不拒绝）
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &value[..byte_index],
        None => value,
    }
}

/// 在指定时区中把时间格式化为 `MM/DD/YYYY`；没有时间时使用 `now`
pub fn format_display_date_in<Tz: TimeZone>(
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    published_at
        .unwrap_or(now)
        .with_timezone(tz)
        .format(DISPLAY_DATE_FORMAT)
        .to_string()
}

/// 按本地日历格式化发布日期
pub fn format_display_date(published_at: Option<DateTime<Utc>>) -> String {
    format_display_date_in(published_at, Utc::now(), &Local)
}

/// 直接填充一个文本字段，可选字符上限
///
/// 元素不存在时返回 `LocatorNotFound`，不是表单控件时返回 `NotFillable`
pub async fn fill_text(
    session: &dyn BrowserSession,
    locator: &str,
    value: &str,
    max_chars: Option<usize>,
) -> AppResult<()> {
    let value = match max_chars {
        Some(limit) => truncate_chars(value, limit),
        None => value,
    };
    debug!("填充字段 {} ({} 字符)", locator, value.chars().count());
    session.fill(locator, value).await
}

/// 填充已有默认值的日期字段：先全选删除，再逐字键入
pub async fn fill_date(session: &dyn BrowserSession, locator: &str, date: &str) -> AppResult<()> {
    if !session.exists(locator).await? {
        return Err(crate::error::AppError::locator_not_found(locator));
    }
    let _: bool = session
        .invoke_as(
            crate::infrastructure::PageScript::SelectAll,
            serde_json::json!({ "locator": locator }),
        )
        .await?;
    session.press_key(locator, "Backspace").await?;
    session.type_text(locator, date).await?;
    debug!("日期字段 {} 已设置为 {}", locator, date);
    Ok(())
}
