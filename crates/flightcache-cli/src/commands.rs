use crate::config::Config;
use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Color, Table as ComfyTable};
use flightcache_analyzer::FlightAnalyzer;
use flightcache_core::{AirportRole, DelayColumn};
use flightcache_storage::CsvFlightSource;
use flightcache_store::{CacheStats, KeyValueCache, MemoryStore};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Rows printed per result table
const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryKind {
    /// Average delay per airline
    Airline,
    /// Flight count per airport
    Airport,
    /// Average delay per month
    Monthly,
}

/// Build the analyzer, against the configured store or an in-process one
pub async fn build_analyzer(config: &Config, in_memory: bool) -> Result<FlightAnalyzer> {
    let source = Arc::new(CsvFlightSource::new(&config.csv_path));
    let analyzer_config = config.analyzer_config();

    if in_memory {
        let cache = KeyValueCache::new(Arc::new(MemoryStore::new())).await?;
        return Ok(FlightAnalyzer::new(cache, source, analyzer_config));
    }

    let store_config = config.store_config();
    FlightAnalyzer::connect(&store_config, source, analyzer_config)
        .await
        .with_context(|| format!("Cannot reach cache store at {}", store_config.redis_url()))
}

pub async fn run_demo(analyzer: &FlightAnalyzer) -> Result<()> {
    let config = analyzer.config();
    println!(
        "{} Cache TTL: {}s{}",
        "→".bright_blue(),
        config.ttl.as_secs(),
        if config.enabled { "" } else { " (disabled)" }
    );

    println!("\n{}", "Average arrival delay by airline".bright_yellow().bold());
    let (first, second) =
        timed_twice(move || analyzer.avg_delay_by_airline(DelayColumn::Arrival)).await?;
    print_delays("Airline", &first.0);
    print_timings(first.1, second.1);

    println!("\n{}", "Flights by origin airport".bright_yellow().bold());
    let (first, second) =
        timed_twice(move || analyzer.flights_by_airport(AirportRole::Origin)).await?;
    print_counts("Airport", &first.0);
    print_timings(first.1, second.1);

    println!("\n{}", "Monthly average arrival delay".bright_yellow().bold());
    let (first, second) =
        timed_twice(move || analyzer.monthly_delays(DelayColumn::Arrival)).await?;
    print_delays("Month", &first.0);
    print_timings(first.1, second.1);

    println!();
    show_stats(analyzer).await
}

pub async fn run_query(
    analyzer: &FlightAnalyzer,
    kind: QueryKind,
    column: Option<&str>,
) -> Result<()> {
    let start = Instant::now();

    match kind {
        QueryKind::Airline => {
            let delay = parse_or_default::<DelayColumn>(column)?;
            let result = analyzer.avg_delay_by_airline(delay).await?;
            print_delays("Airline", &result);
        }
        QueryKind::Airport => {
            let role = parse_or_default::<AirportRole>(column)?;
            let result = analyzer.flights_by_airport(role).await?;
            print_counts("Airport", &result);
        }
        QueryKind::Monthly => {
            let delay = parse_or_default::<DelayColumn>(column)?;
            let result = analyzer.monthly_delays(delay).await?;
            print_delays("Month", &result);
        }
    }

    println!(
        "{} {:.2}ms",
        "Query time:".bright_yellow(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

pub async fn show_stats(analyzer: &FlightAnalyzer) -> Result<()> {
    let stats = analyzer.cache_stats().await;
    if stats.is_empty() {
        println!("{}", "No cache statistics available".bright_black());
        return Ok(());
    }

    println!("{}", "Cache Statistics:".bright_green().bold());
    println!("{}", stats_table(&stats));
    println!("{} {:.2}%", "Hit ratio:".bright_yellow(), stats.hit_ratio());
    Ok(())
}

pub async fn clear_cache(analyzer: &FlightAnalyzer) -> Result<()> {
    if analyzer.clear_cache().await {
        println!("{} Cache cleared", "✓".bright_green());
        Ok(())
    } else {
        anyhow::bail!("Failed to clear cache")
    }
}

fn parse_or_default<T>(raw: Option<&str>) -> Result<T>
where
    T: std::str::FromStr + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => Ok(raw.parse::<T>()?),
        None => Ok(T::default()),
    }
}

/// Run the same query twice: the first call fills the cache, the second
/// should be served from it
async fn timed_twice<T, F, Fut>(run: F) -> Result<((T, Duration), (T, Duration))>
where
    F: Fn() -> Fut,
    Fut: Future<Output = flightcache_core::Result<T>>,
{
    let start = Instant::now();
    let first = run().await?;
    let first_elapsed = start.elapsed();

    let start = Instant::now();
    let second = run().await?;
    let second_elapsed = start.elapsed();

    Ok(((first, first_elapsed), (second, second_elapsed)))
}

fn speedup(first: Duration, second: Duration) -> Option<f64> {
    let second = second.as_secs_f64();
    (second > 0.0).then(|| first.as_secs_f64() / second)
}

fn print_timings(first: Duration, second: Duration) {
    println!(
        "  {} {:.2}ms",
        "First call: ".bright_black(),
        first.as_secs_f64() * 1000.0
    );
    println!(
        "  {} {:.2}ms",
        "Second call:".bright_black(),
        second.as_secs_f64() * 1000.0
    );
    if let Some(factor) = speedup(first, second) {
        println!("  {} {:.1}x", "Speedup:    ".bright_black(), factor);
    }
}

fn print_delays(label: &str, rows: &BTreeMap<String, f64>) {
    // Largest delay first
    let mut sorted: Vec<_> = rows.iter().collect();
    sorted.sort_by(|a, b| b.1.total_cmp(a.1));
    println!(
        "{}",
        result_table(label, "Avg delay (min)", sorted, |v| format!("{:.2}", v))
    );
}

fn print_counts(label: &str, rows: &BTreeMap<String, u64>) {
    let mut sorted: Vec<_> = rows.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1));
    println!("{}", result_table(label, "Flights", sorted, |v| v.to_string()));
}

fn result_table<V>(
    label: &str,
    value_label: &str,
    rows: Vec<(&String, &V)>,
    fmt: impl Fn(&V) -> String,
) -> ComfyTable {
    let total = rows.len();
    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new(label).fg(Color::Cyan),
        Cell::new(value_label).fg(Color::Yellow),
    ]);

    for (key, value) in rows.into_iter().take(PREVIEW_ROWS) {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(fmt(value)).set_alignment(CellAlignment::Right),
        ]);
    }

    if total > PREVIEW_ROWS {
        table.add_row(vec![
            Cell::new(format!("... {} more", total - PREVIEW_ROWS)).fg(Color::DarkGrey),
            Cell::new(""),
        ]);
    }
    table
}

fn stats_table(stats: &CacheStats) -> ComfyTable {
    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new("Metric").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Yellow),
    ]);
    table.add_row(vec![Cell::new("Hits"), Cell::new(stats.hits)]);
    table.add_row(vec![Cell::new("Misses"), Cell::new(stats.misses)]);
    table.add_row(vec![Cell::new("Keys"), Cell::new(stats.total_keys)]);
    table.add_row(vec![Cell::new("Memory"), Cell::new(&stats.used_memory_human)]);
    table.add_row(vec![Cell::new("Clients"), Cell::new(stats.connected_clients)]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speedup() {
        let factor = speedup(Duration::from_millis(200), Duration::from_millis(4)).unwrap();
        assert_eq!(factor, 50.0);
        assert!(speedup(Duration::from_millis(5), Duration::ZERO).is_none());
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default::<DelayColumn>(None).unwrap(), DelayColumn::Arrival);
        assert_eq!(
            parse_or_default::<DelayColumn>(Some("dep")).unwrap(),
            DelayColumn::Departure
        );
        assert_eq!(
            parse_or_default::<AirportRole>(Some("DEST")).unwrap(),
            AirportRole::Destination
        );
        assert!(parse_or_default::<AirportRole>(Some("gate")).is_err());
    }

    #[test]
    fn test_result_table_truncates() {
        let rows: BTreeMap<String, u64> = (0..15).map(|i| (format!("AP{:02}", i), i)).collect();
        let sorted: Vec<_> = rows.iter().collect();

        let rendered = result_table("Airport", "Flights", sorted, |v| v.to_string()).to_string();
        assert!(rendered.contains("AP00"));
        assert!(!rendered.contains("AP14"));
        assert!(rendered.contains("5 more"));
    }

    #[tokio::test]
    async fn test_demo_against_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flights.csv");
        std::fs::write(
            &path,
            "FL_DATE,OP_CARRIER,ORIGIN,DEST,DEP_DELAY,ARR_DELAY,CANCELLED\n\
             2019-01-10,AA,JFK,LAX,0,10,0\n\
             2019-01-20,AA,JFK,SFO,4,20,0\n\
             2019-02-03,BB,LAX,JFK,-1,5,0\n",
        )
        .unwrap();

        let config = Config {
            csv_path: path,
            ..Default::default()
        };
        let analyzer = build_analyzer(&config, true).await.unwrap();
        run_demo(&analyzer).await.unwrap();

        let stats = analyzer.cache_stats().await;
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.total_keys, 3);

        clear_cache(&analyzer).await.unwrap();
        assert_eq!(analyzer.cache_stats().await.total_keys, 0);
    }

    #[tokio::test]
    async fn test_missing_file_fails_query() {
        let config = Config {
            csv_path: "/nonexistent/flights.csv".into(),
            ..Default::default()
        };
        let analyzer = build_analyzer(&config, true).await.unwrap();
        assert!(run_query(&analyzer, QueryKind::Airline, None).await.is_err());
    }
}
