//! Calendar event detection
//!
//! Three event classes can trigger FOCUS promotion, all with a ±1 day
//! window around the evaluation date:
//!
//! - earnings announcements (provider earnings calendar)
//! - macro releases: CPI and NFP (FRED release dates)
//! - FOMC meetings (hardcoded annual schedule)

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// FRED release id for the Consumer Price Index
pub const FRED_CPI_RELEASE_ID: u32 = 10;
/// FRED release id for Employment Situation (non-farm payrolls)
pub const FRED_NFP_RELEASE_ID: u32 = 50;

/// Default event window: ±1 day
pub const DEFAULT_EVENT_WINDOW_DAYS: i64 = 1;

// FOMC meeting dates, maintained annually
const FOMC_DATES: [(i32, u32, u32); 16] = [
    (2025, 1, 29),
    (2025, 3, 19),
    (2025, 5, 7),
    (2025, 6, 18),
    (2025, 7, 30),
    (2025, 9, 17),
    (2025, 10, 29),
    (2025, 12, 10),
    (2026, 1, 28),
    (2026, 3, 18),
    (2026, 4, 29),
    (2026, 6, 17),
    (2026, 7, 29),
    (2026, 9, 16),
    (2026, 10, 28),
    (2026, 12, 16),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Earnings,
    /// CPI, NFP, FOMC — market-wide, no single ticker
    Macro,
}

/// A single calendar event that may trigger FOCUS promotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub event_type: EventType,
    pub event_date: NaiveDate,
    /// None for macro events
    pub ticker: Option<String>,
    pub description: String,
}

/// An earnings calendar row as reported by a calendar source
#[derive(Debug, Clone, PartialEq)]
pub struct EarningsRow {
    pub symbol: String,
    pub date: NaiveDate,
}

/// Source of earnings and macro release calendars
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn earnings_calendar(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EarningsRow>>;

    /// Upcoming and recent release dates for a FRED release id
    async fn release_dates(&self, release_id: u32) -> Result<Vec<NaiveDate>>;
}

fn within_window(target: NaiveDate, event: NaiveDate, window_days: i64) -> bool {
    (event - target).num_days().abs() <= window_days
}

/// The earnings calendar covers global listings; keep US-listed symbols
/// only. Skipped: international exchange suffixes (".BO", ".NS"),
/// numeric Asian tickers ("0941"), and 5-char OTC symbols ending in F
/// (foreign ordinaries) or Y (unsponsored ADRs).
fn is_us_listed(symbol: &str) -> bool {
    if symbol.contains('.') {
        return false;
    }
    if symbol.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    if symbol.len() == 5 && (symbol.ends_with('F') || symbol.ends_with('Y')) {
        return false;
    }
    true
}

/// Fetch earnings events within ±window of the target date.
///
/// A source failure is logged and returns no events, never an error.
pub async fn fetch_earnings_events(
    source: &dyn CalendarSource,
    target: NaiveDate,
    window_days: i64,
) -> Vec<EventEntry> {
    let from = target - Days::new(window_days as u64);
    let to = target + Days::new(window_days as u64);

    let calendar = match source.earnings_calendar(from, to).await {
        Ok(calendar) => calendar,
        Err(e) => {
            log::warn!("failed to fetch earnings calendar: {e}");
            return Vec::new();
        }
    };

    let total = calendar.len();
    let events: Vec<EventEntry> = calendar
        .into_iter()
        .filter(|row| !row.symbol.is_empty() && is_us_listed(&row.symbol))
        .map(|row| EventEntry {
            event_type: EventType::Earnings,
            event_date: row.date,
            description: format!("Earnings on {}", row.date),
            ticker: Some(row.symbol.to_uppercase()),
        })
        .collect();

    log::info!(
        "earnings events in [{}, {}]: {} US tickers ({} filtered)",
        from,
        to,
        events.len(),
        total - events.len()
    );
    events
}

/// Fetch CPI and NFP release events within ±window of the target date.
///
/// Pass `None` to skip macro events entirely (graceful degradation
/// when no FRED access is configured). A failing release id is logged
/// and skipped; the other still contributes.
pub async fn fetch_macro_events(
    source: Option<&dyn CalendarSource>,
    target: NaiveDate,
    window_days: i64,
) -> Vec<EventEntry> {
    let Some(source) = source else {
        log::debug!("no macro calendar source, skipping macro events");
        return Vec::new();
    };

    let mut events = Vec::new();
    for (release_id, label) in [
        (FRED_CPI_RELEASE_ID, "CPI"),
        (FRED_NFP_RELEASE_ID, "NFP"),
    ] {
        let dates = match source.release_dates(release_id).await {
            Ok(dates) => dates,
            Err(e) => {
                log::warn!("failed to fetch {label} release dates: {e}");
                continue;
            }
        };

        for release_date in dates {
            if within_window(target, release_date, window_days) {
                events.push(EventEntry {
                    event_type: EventType::Macro,
                    event_date: release_date,
                    ticker: None,
                    description: format!("{label} release on {release_date}"),
                });
            }
        }
    }

    log::info!("macro events near {target}: {}", events.len());
    events
}

/// FOMC meetings within ±window of the target date. Pure function over
/// the hardcoded schedule.
pub fn fomc_events(target: NaiveDate, window_days: i64) -> Vec<EventEntry> {
    FOMC_DATES
        .iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .filter(|&meeting| within_window(target, meeting, window_days))
        .map(|meeting| EventEntry {
            event_type: EventType::Macro,
            event_date: meeting,
            ticker: None,
            description: format!("FOMC meeting on {meeting}"),
        })
        .collect()
}

/// All event types combined: earnings, CPI/NFP, FOMC
pub async fn fetch_all_events(
    earnings_source: &dyn CalendarSource,
    macro_source: Option<&dyn CalendarSource>,
    target: NaiveDate,
    window_days: i64,
) -> Vec<EventEntry> {
    let earnings = fetch_earnings_events(earnings_source, target, window_days).await;
    let macro_releases = fetch_macro_events(macro_source, target, window_days).await;
    let fomc = fomc_events(target, window_days);

    log::info!(
        "events near {target}: {} (earnings={}, macro={}, fomc={})",
        earnings.len() + macro_releases.len() + fomc.len(),
        earnings.len(),
        macro_releases.len(),
        fomc.len()
    );

    let mut all = earnings;
    all.extend(macro_releases);
    all.extend(fomc);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_within_window() {
        let target = ymd(2025, 6, 18);
        assert!(within_window(target, ymd(2025, 6, 17), 1));
        assert!(within_window(target, ymd(2025, 6, 18), 1));
        assert!(within_window(target, ymd(2025, 6, 19), 1));
        assert!(!within_window(target, ymd(2025, 6, 20), 1));
        assert!(!within_window(target, ymd(2025, 6, 16), 1));
    }

    #[test]
    fn test_us_listing_filter() {
        assert!(is_us_listed("AAPL"));
        assert!(is_us_listed("F"));
        assert!(is_us_listed("BRKB"));
        assert!(!is_us_listed("RELIANCE.NS"));
        assert!(!is_us_listed("0941"));
        assert!(!is_us_listed("AKEMF"));
        assert!(!is_us_listed("BCNAY"));
        // 5-char ending in neither F nor Y stays
        assert!(is_us_listed("GOOGL"));
    }

    #[test]
    fn test_fomc_events_window() {
        // June 2025 meeting: 2025-06-18
        let hits = fomc_events(ymd(2025, 6, 17), 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].event_date, ymd(2025, 6, 18));
        assert_eq!(hits[0].event_type, EventType::Macro);
        assert_eq!(hits[0].ticker, None);
        assert!(hits[0].description.contains("FOMC meeting on 2025-06-18"));

        assert!(fomc_events(ymd(2025, 6, 10), 1).is_empty());
    }

    struct StubCalendar {
        earnings: Vec<EarningsRow>,
        cpi_dates: Vec<NaiveDate>,
        fail_nfp: bool,
    }

    #[async_trait]
    impl CalendarSource for StubCalendar {
        async fn earnings_calendar(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<EarningsRow>> {
            Ok(self.earnings.clone())
        }

        async fn release_dates(&self, release_id: u32) -> Result<Vec<NaiveDate>> {
            if release_id == FRED_NFP_RELEASE_ID && self.fail_nfp {
                return Err(Error::CalendarSource("rate limited".to_string()));
            }
            Ok(self.cpi_dates.clone())
        }
    }

    #[tokio::test]
    async fn test_earnings_events_filter_non_us() {
        let source = StubCalendar {
            earnings: vec![
                EarningsRow {
                    symbol: "nvda".to_string(),
                    date: ymd(2025, 2, 26),
                },
                EarningsRow {
                    symbol: "RELIANCE.NS".to_string(),
                    date: ymd(2025, 2, 26),
                },
                EarningsRow {
                    symbol: "AKEMF".to_string(),
                    date: ymd(2025, 2, 25),
                },
            ],
            cpi_dates: Vec::new(),
            fail_nfp: false,
        };

        let events = fetch_earnings_events(&source, ymd(2025, 2, 26), 1).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ticker.as_deref(), Some("NVDA"));
        assert_eq!(events[0].description, "Earnings on 2025-02-26");
    }

    #[tokio::test]
    async fn test_macro_events_survive_partial_failure() {
        let source = StubCalendar {
            earnings: Vec::new(),
            cpi_dates: vec![ymd(2025, 3, 12), ymd(2025, 4, 10)],
            fail_nfp: true,
        };

        // NFP fails; CPI on 2025-03-12 is within ±1 of 2025-03-11
        let events = fetch_macro_events(Some(&source), ymd(2025, 3, 11), 1).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].description.contains("CPI release on 2025-03-12"));
    }

    #[tokio::test]
    async fn test_macro_events_skip_without_source() {
        assert!(fetch_macro_events(None, ymd(2025, 3, 11), 1).await.is_empty());
    }
}
