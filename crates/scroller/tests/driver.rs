use std::time::Duration;

use scroller::{ScrollConfig, ScrollDriver, ScrollState};
use tokio::time::sleep;

const TICK: Duration = Duration::from_millis(50);

#[tokio::test(start_paused = true)]
async fn idle_until_kiosk_and_overflow() {
    let driver = ScrollDriver::spawn(ScrollConfig::default());
    driver.resize(1000, 400);
    sleep(TICK * 10).await;
    assert_eq!(driver.frame().state, ScrollState::Idle);
    assert_eq!(driver.frame().position, 0);

    driver.set_kiosk(true);
    sleep(TICK * 10 + Duration::from_millis(1)).await;
    let frame = driver.frame();
    assert_eq!(frame.state, ScrollState::ScrollingForward);
    assert_eq!(frame.position, 10);
    driver.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sweeps_to_the_end_and_back() {
    let driver = ScrollDriver::spawn(ScrollConfig::default());
    driver.resize(1000, 400);
    driver.set_kiosk(true);

    // 595 steps forward.
    sleep(TICK * 595 + Duration::from_millis(1)).await;
    assert_eq!(driver.frame().state, ScrollState::PausedAtEnd);
    assert_eq!(driver.frame().position, 595);

    // Held for the two second dwell.
    sleep(Duration::from_millis(1_900)).await;
    assert_eq!(driver.frame().position, 595);

    sleep(Duration::from_millis(100) + TICK * 2).await;
    let frame = driver.frame();
    assert_eq!(frame.state, ScrollState::ScrollingBackward);
    assert!(frame.position < 595);
    driver.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn resize_without_overflow_returns_to_idle_and_stays_put() {
    let driver = ScrollDriver::spawn(ScrollConfig::default());
    driver.resize(1000, 400);
    driver.set_kiosk(true);
    sleep(TICK * 100 + Duration::from_millis(1)).await;
    assert_eq!(driver.frame().position, 100);

    driver.resize(300, 400);
    sleep(TICK).await;
    assert_eq!(driver.frame().state, ScrollState::Idle);
    assert_eq!(driver.frame().position, 0);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(driver.frame().position, 0);
    driver.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn subscribers_get_frames() {
    let driver = ScrollDriver::spawn(ScrollConfig::default());
    let mut frames = driver.subscribe();
    driver.resize(1000, 400);
    driver.set_kiosk(true);

    frames.changed().await.expect("driver alive");
    assert_eq!(frames.borrow_and_update().state, ScrollState::ScrollingForward);
    frames.changed().await.expect("driver alive");
    assert_eq!(frames.borrow_and_update().position, 1);
    drop(driver);

    sleep(Duration::from_secs(1)).await;
    assert!(frames.changed().await.is_err(), "task ended with the driver");
}
