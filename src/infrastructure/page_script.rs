//! 页面脚本目录
//!
//! 所有注入页面的 JS 都以 `(arg) => {...}` 的函数形式登记在这里，
//! 调用时把参数序列化为 JSON 字面量拼成表达式。

use serde_json::Value as JsonValue;

/// 可注入页面的脚本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageScript {
    /// `{html}` -> bool：通过 TinyMCE 注册表写入第一个编辑器
    TinyMceSetContent,
    /// `{html}` -> bool：CKEditor 4 实例或 CKEditor 5 可编辑区
    CkEditorSetData,
    /// `{locator, html}` -> bool：写入 contenteditable 区域
    ContentEditableSetHtml,
    /// `{locator, value}` -> bool | null：设置表单控件的值并触发 input/change；
    /// 元素不存在为 null，不是 input/textarea/select 为 false
    FillValue,
    /// `{locator}` -> bool
    ElementExists,
    /// `{locator}` -> bool：元素存在且有渲染尺寸
    ElementVisible,
    /// `{locator}` -> string | null
    ElementText,
    /// `{locator}` -> bool：聚焦并全选元素内容
    SelectAll,
    /// `{}` -> string：整页可见文本
    BodyText,
    /// `{}` -> `{readyState, resources}`
    NetworkActivity,
    /// `{}` -> bool：上传组件中切换到"链接/URL"模式
    UploadActivateUrlMode,
    /// `{url}` -> bool：把 URL 写入上传组件的地址输入框
    UploadFillUrl,
    /// `{labels}` -> string | null：点击上传组件中文字匹配的第一个可用按钮
    UploadClickButton,
    /// `{}` -> `{primaryEnabled, selectedMarker, thumbnail}`
    UploadReadiness,
    /// `{}` -> bool：上传组件是否仍然打开
    UploadDialogOpen,
    /// `{}` -> array：列出页面上的富文本编辑器
    DetectEditors,
    /// `{}` -> array：列出页面上的表单控件
    DetectFormControls,
}

/// 上传组件对话框的候选容器
const DIALOG_SCOPE: &str = r#"
    const scope = () => {
        const candidates = document.querySelectorAll(
            '[role="dialog"], .modal, .uploadcare--dialog, .filestack-picker, .fsp-picker, [class*="upload"][class*="dialog"]'
        );
        for (const c of candidates) {
            const r = c.getBoundingClientRect();
            if (r.width > 0 && r.height > 0) return c;
        }
        return null;
    };
"#;

impl PageScript {
    /// 脚本函数体
    pub fn source(&self) -> String {
        match self {
            PageScript::TinyMceSetContent => r#"(a) => {
                const mce = window.tinymce;
                if (typeof mce === "undefined" || !mce) return false;
                const editors = mce.editors && mce.editors.length !== undefined
                    ? mce.editors
                    : (typeof mce.get === "function" ? mce.get() : []);
                if (!editors || editors.length === 0) return false;
                editors[0].setContent(a.html);
                return true;
            }"#
            .to_string(),
            PageScript::CkEditorSetData => r#"(a) => {
                if (typeof window.CKEDITOR !== "undefined" && window.CKEDITOR.instances) {
                    const names = Object.keys(window.CKEDITOR.instances);
                    if (names.length > 0) {
                        window.CKEDITOR.instances[names[0]].setData(a.html);
                        return true;
                    }
                }
                const ck5 = document.querySelector(".ck-editor__editable");
                if (ck5 && ck5.ckeditorInstance) {
                    ck5.ckeditorInstance.setData(a.html);
                    return true;
                }
                return false;
            }"#
            .to_string(),
            PageScript::ContentEditableSetHtml => r#"(a) => {
                const write = (el) => {
                    el.innerHTML = a.html;
                    el.dispatchEvent(new Event("input", { bubbles: true }));
                    return true;
                };
                let el = null;
                try { el = document.querySelector(a.locator); } catch (e) { el = null; }
                if (el && el.getAttribute("contenteditable") === "true") return write(el);
                for (const e of document.querySelectorAll('[contenteditable="true"]')) {
                    if (e.tagName !== "BODY") return write(e);
                }
                return false;
            }"#
            .to_string(),
            PageScript::FillValue => r#"(a) => {
                let el = null;
                try { el = document.querySelector(a.locator); } catch (e) { return null; }
                if (!el) return null;
                const protos = {
                    INPUT: window.HTMLInputElement.prototype,
                    TEXTAREA: window.HTMLTextAreaElement.prototype,
                    SELECT: window.HTMLSelectElement.prototype,
                };
                const proto = protos[el.tagName];
                if (!proto) return false;
                const setter = Object.getOwnPropertyDescriptor(proto, "value");
                if (setter && setter.set) {
                    setter.set.call(el, a.value);
                } else {
                    el.value = a.value;
                }
                el.dispatchEvent(new Event("input", { bubbles: true }));
                el.dispatchEvent(new Event("change", { bubbles: true }));
                return true;
            }"#
            .to_string(),
            PageScript::ElementExists => r#"(a) => {
                try { return document.querySelector(a.locator) !== null; } catch (e) { return false; }
            }"#
            .to_string(),
            PageScript::ElementVisible => r#"(a) => {
                let el = null;
                try { el = document.querySelector(a.locator); } catch (e) { return false; }
                if (!el) return false;
                const style = window.getComputedStyle(el);
                if (style.visibility === "hidden" || style.display === "none") return false;
                const r = el.getBoundingClientRect();
                return r.width > 0 && r.height > 0;
            }"#
            .to_string(),
            PageScript::ElementText => r#"(a) => {
                let el = null;
                try { el = document.querySelector(a.locator); } catch (e) { return null; }
                return el ? (el.textContent || "") : null;
            }"#
            .to_string(),
            PageScript::SelectAll => r#"(a) => {
                let el = null;
                try { el = document.querySelector(a.locator); } catch (e) { return false; }
                if (!el) return false;
                el.focus();
                if (typeof el.select === "function") {
                    el.select();
                } else {
                    document.execCommand("selectAll", false, null);
                }
                return true;
            }"#
            .to_string(),
            PageScript::BodyText => r#"(a) => document.body ? document.body.innerText : """#.to_string(),
            PageScript::NetworkActivity => r#"(a) => ({
                readyState: document.readyState,
                resources: performance.getEntriesByType("resource").length
            })"#
            .to_string(),
            PageScript::UploadActivateUrlMode => format!(
                r#"(a) => {{
                {DIALOG_SCOPE}
                const root = scope() || document;
                const pattern = /(^|\b)(url|link|from web|web address|paste)(\b|$)/i;
                for (const el of root.querySelectorAll('button, [role="tab"], a, li, label')) {{
                    const text = (el.innerText || el.getAttribute("aria-label") || "").trim();
                    if (text && text.length < 40 && pattern.test(text)) {{
                        el.click();
                        return true;
                    }}
                }}
                return false;
            }}"#
            ),
            PageScript::UploadFillUrl => format!(
                r#"(a) => {{
                {DIALOG_SCOPE}
                const root = scope() || document;
                const inputs = root.querySelectorAll('input[type="url"], input[type="text"], input:not([type])');
                for (const el of inputs) {{
                    const hint = ((el.placeholder || "") + " " + (el.name || "")).toLowerCase();
                    if (el.type === "url" || hint.includes("url") || hint.includes("http") || hint.includes("link")) {{
                        const setter = Object.getOwnPropertyDescriptor(window.HTMLInputElement.prototype, "value");
                        setter.set.call(el, a.url);
                        el.dispatchEvent(new Event("input", {{ bubbles: true }}));
                        el.dispatchEvent(new Event("change", {{ bubbles: true }}));
                        return true;
                    }}
                }}
                return false;
            }}"#
            ),
            PageScript::UploadClickButton => format!(
                r#"(a) => {{
                {DIALOG_SCOPE}
                const root = scope() || document;
                const buttons = Array.from(root.querySelectorAll('button, [role="button"], input[type="submit"]'));
                for (const label of a.labels) {{
                    const wanted = label.toLowerCase();
                    for (const b of buttons) {{
                        const text = (b.innerText || b.value || b.getAttribute("aria-label") || "").trim().toLowerCase();
                        if (text === wanted && !b.disabled && b.getAttribute("aria-disabled") !== "true") {{
                            b.click();
                            return label;
                        }}
                    }}
                }}
                return null;
            }}"#
            ),
            PageScript::UploadReadiness => format!(
                r#"(a) => {{
                {DIALOG_SCOPE}
                const root = scope() || document;
                const primary = root.querySelector('button[type="submit"], button.primary, button[class*="primary"]');
                const text = (root.innerText || "").toLowerCase();
                return {{
                    primaryEnabled: !!primary && !primary.disabled && primary.getAttribute("aria-disabled") !== "true",
                    selectedMarker: /\b1 (file|image) selected\b|\bselected\b/.test(text),
                    thumbnail: root.querySelector('img[src^="blob:"], img[src^="data:"], [class*="thumb"] img, [class*="preview"] img') !== null
                }};
            }}"#
            ),
            PageScript::UploadDialogOpen => format!(
                r#"(a) => {{
                {DIALOG_SCOPE}
                return scope() !== null;
            }}"#
            ),
            PageScript::DetectEditors => r#"(a) => {
                const found = [];
                if (typeof window.tinymce !== "undefined" && window.tinymce.editors && window.tinymce.editors.length > 0) {
                    found.push({ kind: "TinyMCE", count: window.tinymce.editors.length, ids: window.tinymce.editors.map((e) => e.id) });
                }
                if (typeof window.CKEDITOR !== "undefined" && window.CKEDITOR.instances) {
                    const names = Object.keys(window.CKEDITOR.instances);
                    if (names.length > 0) found.push({ kind: "CKEditor 4", count: names.length, ids: names });
                }
                const ck5 = document.querySelectorAll(".ck-editor");
                if (ck5.length > 0) found.push({ kind: "CKEditor 5", count: ck5.length, ids: [] });
                const editables = Array.from(document.querySelectorAll('[contenteditable="true"]'))
                    .filter((el) => el.tagName !== "BODY");
                if (editables.length > 0) {
                    found.push({
                        kind: "contenteditable",
                        count: editables.length,
                        ids: editables.map((el) => el.id || String(el.className).split(" ").slice(0, 2).join("."))
                    });
                }
                return found;
            }"#
            .to_string(),
            PageScript::DetectFormControls => r#"(a) => {
                const controls = document.querySelectorAll("input, textarea, select, button");
                return Array.from(controls).slice(0, 80).map((el) => ({
                    tag: el.tagName.toLowerCase(),
                    id: el.id || null,
                    name: el.getAttribute("name"),
                    type: el.getAttribute("type"),
                    text: (el.innerText || el.placeholder || "").trim().slice(0, 40)
                }));
            }"#
            .to_string(),
        }
    }

    /// 组装成可直接求值的表达式
    pub fn expression(&self, arg: &JsonValue) -> String {
        format!("({})({})", self.source(), arg)
    }
}
