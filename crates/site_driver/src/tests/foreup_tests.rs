use super::*;
use crate::mock_webdriver::{spawn_mock, MockPage, SharedPage, NEXT_MONTH_ID};

async fn driver(page: MockPage, venue: Venue) -> (ForeUpDriver, SharedPage) {
    let (url, shared) = spawn_mock(page).await;
    let client = WebDriverClient::connect(url, json!({}), Duration::from_millis(300))
        .await
        .expect("session");
    (ForeUpDriver::new(client, venue, Duration::ZERO), shared)
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
}

#[tokio::test]
async fn authenticate_types_credentials_and_submits() {
    let mut page = MockPage::default();
    page.add(LOGIN_EMAIL, "email", "");
    page.add(LOGIN_PASSWORD, "password", "");
    page.add(LOGIN_SUBMIT, "submit", "Log in");
    let (mut driver, shared) = driver(page, Venue::Mission).await;

    driver
        .authenticate("golfer@example.com", "hunter2")
        .await
        .expect("login");

    let page = shared.lock().expect("page");
    assert_eq!(page.visited, vec![booking_url(Venue::Mission).to_string()]);
    assert_eq!(
        page.typed,
        vec![
            ("email".to_string(), "golfer@example.com".to_string()),
            ("password".to_string(), "hunter2".to_string()),
        ]
    );
    assert_eq!(page.clicks, vec!["submit".to_string()]);
}

#[tokio::test]
async fn authenticate_rejects_blank_credentials_before_touching_the_page() {
    let (mut driver, shared) = driver(MockPage::default(), Venue::Mission).await;
    let err = driver.authenticate("  ", "pw").await.expect_err("blank");
    assert!(matches!(err, DriverError::Auth(_)));
    assert!(shared.lock().expect("page").visited.is_empty());
}

#[tokio::test]
async fn authenticate_reports_missing_login_form_as_auth_error() {
    let (mut driver, _shared) = driver(MockPage::default(), Venue::Torrey).await;
    let err = driver
        .authenticate("golfer@example.com", "pw")
        .await
        .expect_err("no form");
    assert!(matches!(err, DriverError::Auth(_)));
}

#[tokio::test]
async fn start_reservation_picks_class_and_party_size_for_venue() {
    let mut page = MockPage::default();
    page.add(&reservation_class_xpath(Venue::Torrey), "resident", "");
    page.add(&players_xpath(3), "players-3", "3");
    let (mut driver, shared) = driver(page, Venue::Torrey).await;

    driver.start_reservation(3).await.expect("reservation");

    let page = shared.lock().expect("page");
    assert_eq!(page.visited, vec![booking_url(Venue::Torrey).to_string()]);
    assert_eq!(page.clicks, vec!["resident", "players-3"]);
}

#[tokio::test]
async fn select_date_advances_months_until_header_matches() {
    let mut page = MockPage::default();
    page.with_calendar(&["January 2026", "February 2026"]);
    page.add(&day_cell_xpath(14), "day-14", "14");
    let (mut driver, shared) = driver(page, Venue::Mission).await;

    let selected = driver.select_date(date("2026-02-14")).await.expect("select");
    assert!(selected);
    assert_eq!(
        shared.lock().expect("page").clicks,
        vec![NEXT_MONTH_ID, "day-14"]
    );
}

#[tokio::test]
async fn select_date_gives_up_after_month_budget() {
    let mut page = MockPage::default();
    page.with_calendar(&["January 2026"]);
    let (mut driver, shared) = driver(page, Venue::Mission).await;

    let selected = driver.select_date(date("2027-05-01")).await.expect("select");
    assert!(!selected);
    let page = shared.lock().expect("page");
    assert_eq!(page.clicks.len(), MONTH_ATTEMPTS);
    assert!(page.clicks.iter().all(|id| id == NEXT_MONTH_ID));
}

#[tokio::test]
async fn select_date_without_calendar_returns_false() {
    let (mut driver, _shared) = driver(MockPage::default(), Venue::Mission).await;
    let selected = driver.select_date(date("2026-02-14")).await.expect("select");
    assert!(!selected);
}

#[tokio::test]
async fn list_visible_slots_skips_blank_labels() {
    let mut page = MockPage::default();
    page.add(SLOT_LABELS, "a", "9:54am");
    page.add(SLOT_LABELS, "b", "   ");
    page.add(SLOT_LABELS, "c", " 10:03am ");
    let (mut driver, _shared) = driver(page, Venue::Mission).await;

    let slots = driver.list_visible_slots().await.expect("slots");
    assert_eq!(slots, vec!["9:54am", "10:03am"]);
}

#[tokio::test]
async fn activate_slot_clicks_matching_tile_only() {
    let wanted = TimeOfDay::parse("2:06pm").expect("time");
    let absent = TimeOfDay::parse("2:15pm").expect("time");
    let mut page = MockPage::default();
    page.add(&slot_tile_xpath(wanted), "tile-206", "2:06pm");
    let (mut driver, shared) = driver(page, Venue::Mission).await;

    assert!(driver.activate_slot(wanted).await.expect("activate"));
    assert!(!driver.activate_slot(absent).await.expect("activate"));
    assert_eq!(shared.lock().expect("page").clicks, vec!["tile-206"]);
}

#[tokio::test]
async fn factory_opens_session_and_release_closes_it_once() {
    let (url, shared) = spawn_mock(MockPage::default()).await;
    let factory = ForeUpFactory {
        webdriver_url: url,
        venue: Venue::Mission,
        element_timeout: Duration::from_millis(300),
        settle: Duration::ZERO,
        headless: true,
    };

    let mut driver = factory.open().await.expect("open");
    driver.release().await.expect("release");
    driver.release().await.expect("release again");
    assert_eq!(shared.lock().expect("page").deleted_sessions, 1);
}

#[test]
fn headless_flag_reaches_chrome_arguments() {
    let factory = ForeUpFactory {
        webdriver_url: Url::parse("http://127.0.0.1:9515").expect("url"),
        venue: Venue::Mission,
        element_timeout: Duration::from_secs(30),
        settle: Duration::from_secs(1),
        headless: true,
    };
    let caps = factory.capabilities();
    assert_eq!(caps["browserName"], "chrome");
    assert!(caps["goog:chromeOptions"]["args"]
        .as_array()
        .expect("args")
        .iter()
        .any(|arg| arg == "--headless=new"));
}
