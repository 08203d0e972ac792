//! Report persistence: pretty JSON plus a trade-tape CSV.
//!
//! Reports carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tradelab_core::Trade;

use crate::report::{BacktestReport, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a report, rejecting schema versions this build doesn't know.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: date, type, price, size, profit, cost. Buys leave profit empty.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "type", "price", "size", "profit", "cost"])?;
    for t in trades {
        let side = if t.is_sell() { "sell" } else { "buy" };
        wtr.write_record([
            t.date.to_string(),
            side.to_string(),
            format!("{:.6}", t.price),
            format!("{:.6}", t.size),
            t.realized_profit.map(|p| format!("{p:.6}")).unwrap_or_default(),
            format!("{:.6}", t.cost),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact files ─────────────────────────────────────────────────

/// Write `<run_id>.json` and `<run_id>_trades.csv` under `output_dir`,
/// creating it if needed. Returns the JSON path.
pub fn save_report(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let json_path = output_dir.join(format!("{}.json", report.run_id));
    std::fs::write(&json_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let csv_path = output_dir.join(format!("{}_trades.csv", report.run_id));
    std::fs::write(&csv_path, export_trades_csv(&report.trades)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    tracing::info!(path = %json_path.display(), "report saved");
    Ok(json_path)
}

pub fn load_report(path: &Path) -> Result<BacktestReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
