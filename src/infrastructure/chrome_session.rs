//! 基于 chromiumoxide 的真实浏览器会话

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventFileChooserOpened, SetInterceptFileChooserDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Browser;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::browser::{launch_browser, LaunchOptions};
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::page_script::PageScript;
use crate::infrastructure::session::{BrowserSession, SessionLauncher};

/// 网络静默判定：资源数量在该时长内不再增长
const QUIET_INTERVAL: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkActivity {
    ready_state: String,
    resources: u64,
}

/// 一个浏览器进程 + 一个页面
pub struct ChromeSession {
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    executor: JsExecutor,
}

impl ChromeSession {
    async fn find(&self, locator: &str) -> AppResult<Element> {
        self.executor
            .page()
            .find_element(locator)
            .await
            .map_err(|_| AppError::locator_not_found(locator))
    }

    /// 轮询资源计数，直到文档加载完成且在静默间隔内没有新请求
    ///
    /// 自身不会结束于错误，调用方用超时兜底
    async fn quiet_network(&self) -> AppResult<()> {
        let arg = json!({});
        settle(
            || {
                self.executor
                    .invoke_as::<NetworkActivity>(PageScript::NetworkActivity, &arg)
            },
            QUIET_INTERVAL,
            POLL_INTERVAL,
        )
        .await;
        Ok(())
    }
}

/// 反复采样网络活动，直到连续 `quiet_interval` 内计数不变且文档加载完成
///
/// 采样失败（例如跳转中执行上下文已销毁）视为"尚未静默"，重新计时
async fn settle<F, Fut>(mut sample: F, quiet_interval: Duration, poll_interval: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<NetworkActivity>>,
{
    let mut last_count = None;
    let mut stable_since = Instant::now();
    loop {
        match sample().await {
            Ok(activity) => {
                if last_count != Some(activity.resources) || activity.ready_state != "complete" {
                    last_count = Some(activity.resources);
                    stable_since = Instant::now();
                } else if stable_since.elapsed() >= quiet_interval {
                    return;
                }
            }
            Err(e) => {
                debug!("网络活动采样失败，继续等待: {}", e);
                last_count = None;
                stable_since = Instant::now();
            }
        }
        sleep(poll_interval).await;
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str, limit: Duration) -> AppResult<()> {
        debug!("导航到: {}", url);
        let page = self.executor.page();
        let loaded = timeout(limit, async {
            page.goto(url)
                .await
                .map_err(|e| BrowserError::NavigationFailed {
                    url: url.to_string(),
                    source: Box::new(e),
                })?;
            self.quiet_network().await
        })
        .await;

        match loaded {
            Ok(result) => result,
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout: limit,
            }
            .into()),
        }
    }

    async fn wait_for_idle(&self, limit: Duration) -> AppResult<()> {
        timeout(limit, self.quiet_network())
            .await
            .map_err(|_| AppError::timeout("等待页面静默", limit))?
    }

    async fn invoke(&self, script: PageScript, arg: JsonValue) -> AppResult<JsonValue> {
        self.executor.invoke(script, &arg).await
    }

    async fn fill(&self, locator: &str, value: &str) -> AppResult<()> {
        let filled: Option<bool> = self
            .executor
            .invoke_as(
                PageScript::FillValue,
                &json!({ "locator": locator, "value": value }),
            )
            .await?;
        match filled {
            Some(true) => Ok(()),
            Some(false) => Err(BrowserError::NotFillable {
                locator: locator.to_string(),
            }
            .into()),
            None => Err(AppError::locator_not_found(locator)),
        }
    }

    async fn type_text(&self, locator: &str, text: &str) -> AppResult<()> {
        let element = self.find(locator).await?;
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_key(&self, locator: &str, key: &str) -> AppResult<()> {
        let element = self.find(locator).await?;
        element.press_key(key).await?;
        Ok(())
    }

    async fn click(&self, locator: &str) -> AppResult<()> {
        let element = self.find(locator).await?;
        element.click().await?;
        Ok(())
    }

    async fn click_and_wait_for_navigation(&self, locator: &str, limit: Duration) -> AppResult<()> {
        let element = self.find(locator).await?;
        let page = self.executor.page();

        // 先发起跳转等待，再点击；两者一起等待，避免错过很快的跳转
        let navigation = page.wait_for_navigation();
        let click = element.click();
        timeout(limit, async { tokio::try_join!(navigation, click) })
            .await
            .map_err(|_| AppError::timeout(format!("点击 {} 后等待跳转", locator), limit))??;

        self.wait_for_idle(limit).await
    }

    async fn wait_for_visible(&self, step: &str, locator: &str, limit: Duration) -> AppResult<()> {
        let deadline = Instant::now() + limit;
        loop {
            let visible: bool = self
                .executor
                .invoke_as(PageScript::ElementVisible, &json!({ "locator": locator }))
                .await?;
            if visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::FieldNotVisible {
                    step: step.to_string(),
                    locator: locator.to_string(),
                    timeout: limit,
                }
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn upload_via_chooser(&self, trigger: &str, file: &Path, limit: Duration) -> AppResult<()> {
        let page = self.executor.page();
        page.execute(SetInterceptFileChooserDialogParams::new(true))
            .await?;

        // 监听必须在点击之前挂好
        let mut chooser_events = page.event_listener::<EventFileChooserOpened>().await?;
        let result = async {
            self.click(trigger).await?;
            let event = timeout(limit, chooser_events.next())
                .await
                .map_err(|_| AppError::timeout("等待文件选择框", limit))?
                .ok_or_else(|| BrowserError::FileChooserFailed {
                    reason: "事件流已关闭".to_string(),
                })?;
            let node = event
                .backend_node_id
                .clone()
                .ok_or_else(|| BrowserError::FileChooserFailed {
                    reason: "文件选择框没有关联的 input 元素".to_string(),
                })?;
            let params = SetFileInputFilesParams::builder()
                .files(vec![file.display().to_string()])
                .backend_node_id(node)
                .build()
                .map_err(|reason| BrowserError::FileChooserFailed { reason })?;
            page.execute(params).await?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(e) = page
            .execute(SetInterceptFileChooserDialogParams::new(false))
            .await
        {
            warn!("恢复文件选择框默认行为失败: {}", e);
        }
        result
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.executor
            .page()
            .save_screenshot(params, path)
            .await
            .map_err(|e| BrowserError::ScreenshotFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let browser = self.browser.lock().await.take();
        let Some(mut browser) = browser else {
            debug!("浏览器已关闭，跳过");
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        closed?;
        info!("🧹 浏览器已关闭");
        Ok(())
    }
}

/// 每次调用都启动一个全新浏览器进程的工厂
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    options: LaunchOptions,
}

impl ChromeLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn open(&self, headless: bool) -> AppResult<ChromeSession> {
        let (browser, page, handler_task) = launch_browser(&self.options, headless).await?;
        Ok(ChromeSession {
            browser: Mutex::new(Some(browser)),
            handler_task: Mutex::new(Some(handler_task)),
            executor: JsExecutor::new(page),
        })
    }
}
