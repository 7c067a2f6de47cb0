//! Portal-list ingestion: `name;intel-url;keys` rows into `PortalInput`s.
//!
//! `.csv` files are comma separated (quote the URL), everything else uses
//! semicolons. Reading stops at the first row without a URL; a missing or
//! blank key column means zero keys.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use maxfield::PortalInput;
use polars::prelude::*;

/// Micro-degree `(lat, lon)` from the `pll=lat,lon` parameter of an Intel URL.
pub fn parse_intel_url(url: &str) -> Option<(i64, i64)> {
    let query = url.split("pll=").nth(1)?;
    let query = query.split('&').next()?;
    let mut parts = query.split(',');
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    let lon: f64 = parts.next()?.trim().parse().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some(((lat * 1e6).round() as i64, (lon * 1e6).round() as i64))
}

fn separator(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b';',
    }
}

/// Read a portal list.
pub fn read_portals(path: &Path) -> Result<Vec<PortalInput>> {
    let schema = Schema::from_iter([
        Field::new("name".into(), DataType::String),
        Field::new("url".into(), DataType::String),
        Field::new("keys".into(), DataType::String),
    ]);
    let df = LazyCsvReader::new(path)
        .with_has_header(false)
        .with_separator(separator(path))
        .with_schema(Some(Arc::new(schema)))
        .with_truncate_ragged_lines(true)
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("reading portal list {}", path.display()))?;
    tracing::debug!(rows = df.height(), "portal list loaded");

    let names = df.column("name")?.str()?;
    let urls = df.column("url")?.str()?;
    let keys = df.column("keys")?.str()?;

    let mut portals = Vec::with_capacity(df.height());
    for (row, ((name, url), keys)) in names.into_iter().zip(urls).zip(keys).enumerate() {
        let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
            break;
        };
        let (lat_e6, lon_e6) = parse_intel_url(url)
            .ok_or_else(|| anyhow!("row {}: no pll=lat,lon in {url:?}", row + 1))?;
        let keys = match keys.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => k
                .parse::<u32>()
                .with_context(|| format!("row {}: bad key count {k:?}", row + 1))?,
            None => 0,
        };
        portals.push(PortalInput::new(
            name.unwrap_or_default().trim(),
            lat_e6,
            lon_e6,
            keys,
        ));
    }
    tracing::info!(portals = portals.len(), file = %path.display(), "portals read");
    Ok(portals)
}
