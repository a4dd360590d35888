use std::sync::Arc;

use order_tally::browser::connect_to_browser_and_page;
use order_tally::config::Config;
use order_tally::services::{ChromeTab, ChromeTabSource, DomOrderExtractor, PageExtractor, ScanTab, TabSource};
use order_tally::utils::logging;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    logging::init(true);
    let config = Config::from_env();

    let result =
        connect_to_browser_and_page(config.browser_debug_port, &config.orders_url, None).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_extract_current_orders_page() {
    logging::init(true);
    let config = Config::from_env();

    let (_browser, page) = connect_to_browser_and_page(
        config.browser_debug_port,
        &config.orders_url,
        Some("/your-orders/orders"),
    )
    .await
    .expect("连接浏览器失败");

    let tab = ChromeTab::attach(page, config.orders_url.clone());
    assert_eq!(tab.ready_state().await.expect("读取 readyState 失败"), "complete");

    let result = DomOrderExtractor::new()
        .extract(&tab)
        .await
        .expect("提取第一页失败");
    println!("第一页: {} 个订单, ${:.2}", result.count, result.total);
}

#[tokio::test]
#[ignore]
async fn test_background_tab_is_closed() {
    logging::init(true);
    let config = Config::from_env();

    let (browser, _page) =
        connect_to_browser_and_page(config.browser_debug_port, &config.orders_url, None)
            .await
            .expect("连接浏览器失败");
    let browser = Arc::new(browser);
    let before = browser.pages().await.expect("获取页面失败").len();

    let source = ChromeTabSource::new(Arc::clone(&browser));
    let tab = source.open("about:blank").await.expect("打开后台标签失败");
    tab.close().await.expect("关闭后台标签失败");

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let after = browser.pages().await.expect("获取页面失败").len();
    assert_eq!(before, after, "后台标签应已关闭");
}
