use crate::aggregator::Aggregate;
use crate::models::UrlStat;

/// Round to 5 decimal places.
///
/// Rounds the exact binary value, so 0.001375 (stored as 0.00137499...) gives
/// 0.00137. Scaling by 1e5 first would round the product up instead.
fn round5(value: f64) -> f64 {
    format!("{:.5}", value).parse().unwrap_or(value)
}

fn median(times: &[f64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Build one [`UrlStat`] per URL, ranked by `time_sum` descending.
///
/// URLs with equal sums keep the order in which they first appeared in the
/// log. The full list is returned; trimming to the report size is up to the
/// caller.
pub(crate) fn compute_url_stats(aggregate: &Aggregate) -> Vec<UrlStat> {
    let distinct_urls = aggregate.urls.len();
    let total_time = aggregate.totals.total_time;

    let mut stats: Vec<UrlStat> = aggregate
        .urls
        .iter()
        .map(|(url, times)| {
            let count = times.len();
            let time_sum = round5(times.iter().sum());
            let time_percent = if total_time > 0.0 {
                round5(100.0 * time_sum / total_time)
            } else {
                0.0
            };

            UrlStat {
                url: url.to_string(),
                count,
                // Relative to the number of distinct URLs, not to the line count
                count_percent: round5(100.0 * count as f64 / distinct_urls as f64),
                time_sum,
                time_percent,
                // Average of the already rounded sum
                time_avg: round5(time_sum / count as f64),
                time_max: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                time_median: round5(median(times)),
            }
        })
        .collect();

    // sort_by is stable, so ties stay in first-seen order
    stats.sort_by(|a, b| b.time_sum.total_cmp(&a.time_sum));
    stats
}
