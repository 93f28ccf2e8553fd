// Regular-hours filtering and window membership.
use crate::config::settings::{AnalysisConfig, SessionHours};
use chrono::NaiveTime;
use shared::models::{minute_of_day, PriceBar, TimeWindow, WindowKey};

/// Regular-hours bars plus each configured window's members, in window order.
/// Bars on a shared boundary minute belong to both adjacent windows.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPartition {
    pub regular: Vec<PriceBar>,
    pub windows: Vec<(TimeWindow, Vec<PriceBar>)>,
}

impl SessionPartition {
    pub fn members(&self, key: WindowKey) -> &[PriceBar] {
        self.windows
            .iter()
            .find(|(window, _)| window.key == key)
            .map(|(_, bars)| bars.as_slice())
            .unwrap_or(&[])
    }
}

/// Inclusive at both ends, compared to the minute.
pub fn is_regular(time: NaiveTime, hours: &SessionHours) -> bool {
    let minute = minute_of_day(time);
    minute >= minute_of_day(hours.start) && minute <= minute_of_day(hours.end)
}

pub fn partition(bars: &[PriceBar], config: &AnalysisConfig) -> SessionPartition {
    let regular: Vec<PriceBar> = bars
        .iter()
        .filter(|bar| is_regular(bar.time_of_day(), &config.regular_hours))
        .copied()
        .collect();

    let windows = config
        .windows
        .iter()
        .map(|window| {
            let members = regular
                .iter()
                .filter(|bar| window.contains(bar.time_of_day()))
                .copied()
                .collect();
            (window.clone(), members)
        })
        .collect();

    tracing::debug!(
        total = bars.len(),
        regular = regular.len(),
        "Partitioned session into regular-hours windows"
    );
    SessionPartition { regular, windows }
}
