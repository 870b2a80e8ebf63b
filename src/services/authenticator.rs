//! 登录服务 - 业务能力层
//!
//! 两段式登录：先填用户名并点主按钮，等密码框出现后再填密码，
//! 第二次点击与页面跳转一起等待。失败不重试。

use std::time::Duration;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::infrastructure::BrowserSession;

/// 登录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    AwaitingUsername,
    AwaitingPassword,
    Authenticated,
}

/// 登录所需的定位器与凭据
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// 登录表单定位器
#[derive(Debug, Clone)]
pub struct LoginLocators {
    pub username: String,
    pub password: String,
    pub primary_action: String,
}

/// 登录服务
pub struct Authenticator {
    locators: LoginLocators,
    credentials: Credentials,
    /// 等待密码框出现的上限
    field_timeout: Duration,
    /// 提交密码后等待跳转的上限
    navigation_timeout: Duration,
}

impl Authenticator {
    pub fn new(
        locators: LoginLocators,
        credentials: Credentials,
        field_timeout: Duration,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            locators,
            credentials,
            field_timeout,
            navigation_timeout,
        }
    }

    /// 执行一次状态转移
    pub async fn advance(
        &self,
        session: &dyn BrowserSession,
        state: LoginState,
    ) -> AppResult<LoginState> {
        match state {
            LoginState::AwaitingUsername => {
                debug!("填写用户名");
                session
                    .fill(&self.locators.username, &self.credentials.username)
                    .await?;
                session.click(&self.locators.primary_action).await?;
                session
                    .wait_for_visible("登录-等待密码框", &self.locators.password, self.field_timeout)
                    .await?;
                Ok(LoginState::AwaitingPassword)
            }
            LoginState::AwaitingPassword => {
                debug!("填写密码");
                session
                    .fill(&self.locators.password, &self.credentials.password)
                    .await?;
                session
                    .click_and_wait_for_navigation(
                        &self.locators.primary_action,
                        self.navigation_timeout,
                    )
                    .await?;
                Ok(LoginState::Authenticated)
            }
            LoginState::Authenticated => Ok(LoginState::Authenticated),
        }
    }

    /// 从头走完登录流程
    pub async fn login(&self, session: &dyn BrowserSession) -> AppResult<()> {
        let mut state = LoginState::AwaitingUsername;
        while state != LoginState::Authenticated {
            state = self.advance(session, state).await?;
        }
        info!("🔐 登录完成");
        Ok(())
    }
}
