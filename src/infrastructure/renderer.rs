//! 页面渲染器 - 基础设施层
//!
//! 持有唯一的浏览器资源，只暴露"渲染页面"的能力。
//!
//! 浏览器是昂贵的共享资源：懒初始化，跨多次逻辑运行复用，
//! 失效后可安全地重新初始化。状态机为
//! {Uninitialized, Ready, Failed}，所有状态迁移发生在同一把
//! `tokio::sync::Mutex` 之下，并发调用方阻塞等待，重启只会发生
//! 一次且结果被所有等待者共享（single-flight）。

use anyhow::Result;
use chromiumoxide::{Browser, Page};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::browser::launch_headless_browser;
use crate::config::Config;

/// 浏览器资源状态
enum RendererState {
    Uninitialized,
    Ready(Browser),
    Failed,
}

/// 页面渲染器
///
/// 职责：
/// - 持有唯一的 Browser 资源
/// - 暴露 render() 能力：URL → (HTML, 纯文本)
/// - 不认识 QuizTask，不处理业务流程
pub struct PageRenderer {
    state: Mutex<RendererState>,
    headless: bool,
    render_timeout: Duration,
}

impl PageRenderer {
    /// 创建渲染器（不启动浏览器，首次 render 时懒启动）
    pub fn new(config: &Config) -> Self {
        Self {
            state: Mutex::new(RendererState::Uninitialized),
            headless: config.headless,
            render_timeout: Duration::from_millis(config.browser_timeout_ms),
        }
    }

    /// 渲染页面，返回 (HTML, 纯文本)
    ///
    /// 页面脚本会被执行，因此拿到的是渲染后的内容。
    /// 整个渲染过程受浏览器超时约束。
    pub async fn render(&self, url: &str) -> Result<(String, String)> {
        let page = self.open_page(url).await?;

        let result = timeout(self.render_timeout, extract_content(&page)).await;

        // 页面用完即关，浏览器实例继续复用
        let _ = page.close().await;

        match result {
            Ok(Ok((html, text))) => {
                info!("📄 页面渲染完成: {} 字符 HTML", html.len());
                Ok((html, text))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => anyhow::bail!(
                "渲染 {} 超时 ({} 毫秒)",
                url,
                self.render_timeout.as_millis()
            ),
        }
    }

    /// 打开页面并导航
    ///
    /// 锁内完成资源获取与页面创建；页面创建失败时把状态标记为
    /// Failed 并重启一次浏览器，重启失败则向上传播。
    async fn open_page(&self, url: &str) -> Result<Page> {
        let mut state = self.state.lock().await;

        // 懒初始化 / 失败后恢复
        if !matches!(*state, RendererState::Ready(_)) {
            *state = RendererState::Failed;
            let browser = launch_headless_browser(self.headless).await?;
            *state = RendererState::Ready(browser);
        }

        let RendererState::Ready(browser) = &*state else {
            unreachable!("浏览器状态在锁内刚刚置为 Ready");
        };

        match browser.new_page(url).await {
            Ok(page) => Ok(page),
            Err(e) => {
                // 浏览器大概率已死，重启一次再试
                warn!("创建页面失败，尝试重启浏览器: {}", e);
                *state = RendererState::Failed;
                let browser = launch_headless_browser(self.headless).await?;
                let page = browser.new_page(url).await.map_err(|e| {
                    anyhow::anyhow!("重启后创建页面仍然失败: {}", e)
                })?;
                *state = RendererState::Ready(browser);
                Ok(page)
            }
        }
    }

    /// 关闭浏览器（进程退出前调用）
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let RendererState::Ready(browser) = &mut *state {
            let _ = browser.close().await;
            debug!("浏览器已关闭");
        }
        *state = RendererState::Uninitialized;
    }
}

/// 等待导航完成并抽取页面内容
async fn extract_content(page: &Page) -> Result<(String, String)> {
    page.wait_for_navigation().await?;

    let html = page.content().await?;

    // innerText 拿到的是执行完脚本后的可见文本
    let text: String = page
        .evaluate("document.body ? document.body.innerText : ''")
        .await?
        .into_value()
        .unwrap_or_default();

    debug!("页面文本长度: {} 字符", text.len());
    Ok((html, text))
}
