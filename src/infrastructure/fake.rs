//! 脚本化的假浏览器会话，仅用于测试
//!
//! 用一个简单的页面模型模拟定位器、编辑器注册表、登录跳转和上传组件，
//! 并记录每一次调用，供测试断言顺序与次数。

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::page_script::PageScript;
use crate::infrastructure::session::{BrowserSession, SessionLauncher};
use crate::models::{BodyFillStrategy, FieldMap};
use crate::services::asset_uploader::UploadTiming;
use crate::services::authenticator::Credentials;
use crate::workflow::{TargetSettings, Timeouts};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub value: String,
    pub text: String,
    pub visible: bool,
    pub editable: bool,
    /// input / textarea / select
    pub fillable: bool,
}

impl FakeElement {
    pub fn input() -> Self {
        Self {
            visible: true,
            fillable: true,
            ..Default::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            fillable: true,
            ..Default::default()
        }
    }

    /// 普通块级元素，既不能填写也不可编辑
    pub fn block() -> Self {
        Self {
            visible: true,
            ..Default::default()
        }
    }

    pub fn editable() -> Self {
        Self {
            visible: true,
            editable: true,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

/// 上传组件模型
#[derive(Debug, Default)]
pub struct FakeUploadWidget {
    pub supports_url: bool,
    /// 第几次就绪检查时文件就绪；`None` 表示永不就绪
    pub ready_after_polls: Option<u32>,
    pub has_crop_step: bool,
    pub closes_on_confirm: bool,

    pub open: bool,
    pub url_mode: bool,
    pub pasted_url: Option<String>,
    pub submitted: bool,
    pub chosen_file: Option<PathBuf>,
    pub chosen_file_existed: bool,
    pub polls: u32,
    pub cropped: bool,
    pub confirmed: bool,
}

impl FakeUploadWidget {
    fn ready(&self) -> bool {
        let source_given = self.submitted || self.chosen_file.is_some();
        source_given
            && self
                .ready_after_polls
                .map(|n| self.polls >= n)
                .unwrap_or(false)
    }

    fn available_buttons(&self) -> Vec<&'static str> {
        let mut buttons = vec!["close"];
        if self.pasted_url.is_some() && !self.submitted {
            buttons.push("upload");
        }
        if self.ready() {
            if self.has_crop_step && !self.cropped {
                buttons.push("crop");
            } else if !self.confirmed {
                buttons.push("save");
            }
        }
        buttons
    }

    fn press(&mut self, label: &str) {
        match label {
            "upload" => self.submitted = true,
            "crop" => self.cropped = true,
            "save" => {
                self.confirmed = true;
                if self.closes_on_confirm {
                    self.open = false;
                }
            }
            "close" => self.open = false,
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub elements: BTreeMap<String, FakeElement>,
    pub tinymce_editors: Vec<String>,
    pub ckeditor_instances: Vec<String>,
    pub body_text: String,
    /// 点击某元素后变为可见的元素
    pub reveal_on_click: HashMap<String, String>,
    /// 点击后会触发页面跳转的元素
    pub navigates_on_click: HashSet<String>,
    pub unreachable_urls: HashSet<String>,
    /// 每次导航前的人为延迟
    pub navigate_delay: Option<Duration>,
    pub upload_button: Option<String>,
    pub widget: FakeUploadWidget,
    pub fail_screenshots: bool,

    pub selected: Option<String>,
    pub calls: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub close_count: usize,
}

/// 假页面；克隆后共享同一份状态
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, locator: &str, element: FakeElement) -> Self {
        self.state()
            .elements
            .insert(locator.to_string(), element);
        self
    }

    /// 两段式登录 + 只有纯文本正文的发布表单
    ///
    /// 定位器与 `target_settings()` 一致
    pub fn publish_form() -> Self {
        let page = Self::new()
            .with_element("#user", FakeElement::input())
            .with_element("#pass", FakeElement::hidden())
            .with_element("#login", FakeElement::input())
            .with_element("#title", FakeElement::input())
            .with_element("#body", FakeElement::input())
            .with_element("#publish", FakeElement::input());
        {
            let mut state = page.state();
            state
                .reveal_on_click
                .insert("#login".to_string(), "#pass".to_string());
            state.navigates_on_click.insert("#login".to_string());
        }
        page
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state poisoned")
    }

    pub fn value_of(&self, locator: &str) -> Option<String> {
        self.state().elements.get(locator).map(|e| e.value.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.state().calls.iter().any(|c| c.starts_with(prefix))
    }

    pub fn close_count(&self) -> usize {
        self.state().close_count
    }

    fn require(&self, state: &FakeState, locator: &str) -> AppResult<()> {
        if state.elements.contains_key(locator) {
            Ok(())
        } else {
            Err(AppError::locator_not_found(locator))
        }
    }
}

fn arg_str<'a>(arg: &'a JsonValue, key: &str) -> &'a str {
    arg.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}

#[async_trait]
impl BrowserSession for FakePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> AppResult<()> {
        let delay = self.state().navigate_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        state.calls.push(format!("navigate:{}", url));
        if state.unreachable_urls.contains(url) {
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }
            .into());
        }
        Ok(())
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> AppResult<()> {
        self.state().calls.push("idle".to_string());
        Ok(())
    }

    async fn invoke(&self, script: PageScript, arg: JsonValue) -> AppResult<JsonValue> {
        let mut state = self.state();
        state.calls.push(format!("invoke:{:?}", script));
        let locator = arg_str(&arg, "locator").to_string();

        let result = match script {
            PageScript::TinyMceSetContent => match state.tinymce_editors.first_mut() {
                Some(content) => {
                    *content = arg_str(&arg, "html").to_string();
                    json!(true)
                }
                None => json!(false),
            },
            PageScript::CkEditorSetData => match state.ckeditor_instances.first_mut() {
                Some(content) => {
                    *content = arg_str(&arg, "html").to_string();
                    json!(true)
                }
                None => json!(false),
            },
            PageScript::ContentEditableSetHtml => {
                let html = arg_str(&arg, "html").to_string();
                let target = match state.elements.get(&locator) {
                    Some(e) if e.editable => Some(locator.clone()),
                    _ => state
                        .elements
                        .iter()
                        .find(|(_, e)| e.editable)
                        .map(|(k, _)| k.clone()),
                };
                let element = match target {
                    Some(k) => state.elements.get_mut(&k),
                    None => None,
                };
                match element {
                    Some(element) => {
                        element.value = html;
                        json!(true)
                    }
                    None => json!(false),
                }
            }
            PageScript::FillValue => {
                let value = arg_str(&arg, "value").to_string();
                match state.elements.get_mut(&locator) {
                    Some(element) if element.fillable => {
                        element.value = value;
                        json!(true)
                    }
                    Some(_) => json!(false),
                    None => JsonValue::Null,
                }
            }
            PageScript::ElementExists => json!(state.elements.contains_key(&locator)),
            PageScript::ElementVisible => {
                json!(state.elements.get(&locator).map(|e| e.visible).unwrap_or(false))
            }
            PageScript::ElementText => match state.elements.get(&locator) {
                Some(e) => json!(e.text),
                None => JsonValue::Null,
            },
            PageScript::SelectAll => {
                if state.elements.contains_key(&locator) {
                    state.selected = Some(locator.clone());
                    json!(true)
                } else {
                    json!(false)
                }
            }
            PageScript::BodyText => json!(state.body_text),
            PageScript::NetworkActivity => json!({"readyState": "complete", "resources": 0}),
            PageScript::UploadActivateUrlMode => {
                let widget = &mut state.widget;
                if widget.open && widget.supports_url {
                    widget.url_mode = true;
                    json!(true)
                } else {
                    json!(false)
                }
            }
            PageScript::UploadFillUrl => {
                let widget = &mut state.widget;
                if widget.open && widget.url_mode {
                    widget.pasted_url = Some(arg_str(&arg, "url").to_string());
                    json!(true)
                } else {
                    json!(false)
                }
            }
            PageScript::UploadClickButton => {
                let widget = &mut state.widget;
                let wanted: Vec<String> = arg
                    .get("labels")
                    .and_then(|v| v.as_array())
                    .map(|labels| {
                        labels
                            .iter()
                            .filter_map(|l| l.as_str())
                            .map(|l| l.to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                let available = if widget.open {
                    widget.available_buttons()
                } else {
                    Vec::new()
                };
                let hit = wanted
                    .into_iter()
                    .find(|label| available.contains(&label.to_lowercase().as_str()));
                match hit {
                    Some(label) => {
                        widget.press(&label.to_lowercase());
                        json!(label)
                    }
                    None => JsonValue::Null,
                }
            }
            PageScript::UploadReadiness => {
                let widget = &mut state.widget;
                widget.polls += 1;
                json!({
                    "primaryEnabled": widget.ready(),
                    "selectedMarker": false,
                    "thumbnail": false
                })
            }
            PageScript::UploadDialogOpen => json!(state.widget.open),
            PageScript::DetectEditors => {
                let mut found = Vec::new();
                if !state.tinymce_editors.is_empty() {
                    found.push(json!({"kind": "TinyMCE", "count": state.tinymce_editors.len(), "ids": []}));
                }
                json!(found)
            }
            PageScript::DetectFormControls => json!([]),
        };
        Ok(result)
    }

    async fn fill(&self, locator: &str, value: &str) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(format!("fill:{}", locator));
        self.require(&state, locator)?;
        match state.elements.get_mut(locator) {
            Some(element) if element.fillable => {
                element.value = value.to_string();
                Ok(())
            }
            _ => Err(BrowserError::NotFillable {
                locator: locator.to_string(),
            }
            .into()),
        }
    }

    async fn type_text(&self, locator: &str, text: &str) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(format!("type:{}", locator));
        self.require(&state, locator)?;
        if let Some(element) = state.elements.get_mut(locator) {
            element.value.push_str(text);
        }
        Ok(())
    }

    async fn press_key(&self, locator: &str, key: &str) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(format!("press:{}:{}", locator, key));
        self.require(&state, locator)?;
        let clears = key == "Backspace" && state.selected.as_deref() == Some(locator);
        if clears {
            state.selected = None;
            if let Some(element) = state.elements.get_mut(locator) {
                element.value.clear();
            }
        }
        Ok(())
    }

    async fn click(&self, locator: &str) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(format!("click:{}", locator));
        self.require(&state, locator)?;
        if state.upload_button.as_deref() == Some(locator) {
            state.widget.open = true;
        }
        if let Some(revealed) = state.reveal_on_click.get(locator).cloned() {
            if let Some(element) = state.elements.get_mut(&revealed) {
                element.visible = true;
            }
        }
        Ok(())
    }

    async fn click_and_wait_for_navigation(&self, locator: &str, timeout: Duration) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(format!("click_nav:{}", locator));
        self.require(&state, locator)?;
        if state.navigates_on_click.contains(locator) {
            Ok(())
        } else {
            Err(AppError::timeout(format!("点击 {} 后等待跳转", locator), timeout))
        }
    }

    async fn wait_for_visible(&self, step: &str, locator: &str, timeout: Duration) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(format!("wait_visible:{}", locator));
        match state.elements.get(locator) {
            Some(e) if e.visible => Ok(()),
            _ => Err(BrowserError::FieldNotVisible {
                step: step.to_string(),
                locator: locator.to_string(),
                timeout,
            }
            .into()),
        }
    }

    async fn upload_via_chooser(&self, trigger: &str, file: &Path, _timeout: Duration) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(format!("chooser:{}", trigger));
        self.require(&state, trigger)?;
        state.widget.chosen_file = Some(file.to_path_buf());
        state.widget.chosen_file_existed = file.exists();
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push("screenshot".to_string());
        if state.fail_screenshots {
            return Err(BrowserError::ScreenshotFailed {
                path: path.display().to_string(),
                reason: "fake failure".to_string(),
            }
            .into());
        }
        std::fs::write(path, b"\x89PNG")?;
        state.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push("close".to_string());
        state.close_count += 1;
        Ok(())
    }
}

/// 与 `FakePage::publish_form()` 配套的目标配置，所有等待都很短
pub fn target_settings() -> TargetSettings {
    TargetSettings {
        login_url: "https://target.example.com/login".to_string(),
        target_url: "https://target.example.com/posts/new".to_string(),
        credentials: Credentials {
            username: "editor".to_string(),
            password: "hunter2".to_string(),
        },
        fields: FieldMap::minimal("#user", "#pass", "#login", "#title", "#body", "#publish"),
        body_strategy: BodyFillStrategy::Auto,
        author_value: None,
        headless: true,
        timeouts: Timeouts {
            navigation: Duration::from_millis(50),
            field: Duration::from_millis(50),
        },
        upload_timing: UploadTiming {
            poll_attempts: 3,
            poll_interval: Duration::from_millis(1),
            close_checks: 1,
            chooser_timeout: Duration::from_millis(50),
            download_timeout: Duration::from_secs(5),
        },
    }
}

/// 总是交出同一个假页面的工厂
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    pub page: FakePage,
    pub opens: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakePage;

    async fn open(&self, _headless: bool) -> AppResult<FakePage> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.page.clone())
    }
}
