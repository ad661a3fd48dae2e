//! Map file parsing.
//!
//! A map file starts with one free-form name line, then four `Key=Value`
//! headers (`Rows`, `Cols`, `MaxSteps`, `NumShells`, any order, arbitrary
//! whitespace around `=`), then the grid. The grid is normalized to the
//! header dimensions: unknown characters become spaces, short rows are
//! right-padded, long rows truncated, missing rows created empty.

use std::path::{Path, PathBuf};

use battle_interface::SatelliteView;
use thiserror::Error;
use tracing::debug;

/// Why a map file was rejected. A bad map is recorded and skipped, never
/// silently defaulted.
#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("cannot read map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required headers: {0}")]
    MissingHeaders(String),
    #[error("invalid {key} value: '{value}'")]
    BadHeaderValue { key: &'static str, value: String },
    #[error("map dimensions must be non-zero (rows={rows}, cols={cols})")]
    ZeroDimension { rows: usize, cols: usize },
}

/// Read-only grid view backing a loaded map. Out-of-range queries yield a
/// space, unlike mid-match satellite snapshots.
#[derive(Debug, Clone)]
pub struct MapView {
    rows: Vec<String>,
}

impl SatelliteView for MapView {
    fn get_object_at(&self, x: usize, y: usize) -> char {
        self.rows
            .get(y)
            .and_then(|row| row.as_bytes().get(x))
            .map(|&b| b as char)
            .unwrap_or(' ')
    }
}

/// A successfully loaded map.
#[derive(Debug, Clone)]
pub struct MapData {
    /// Free-form name line, kept but not semantically significant.
    pub name: String,
    /// Path the map was loaded from, as given.
    pub path: PathBuf,
    pub rows: usize,
    pub cols: usize,
    pub max_steps: usize,
    pub num_shells: usize,
    pub view: MapView,
}

const HEADER_KEYS: [&str; 4] = ["Rows", "Cols", "MaxSteps", "NumShells"];

fn parse_header(line: &str) -> Option<Result<(&'static str, usize), MapLoadError>> {
    let (key, value) = line.split_once('=')?;
    let key = HEADER_KEYS.iter().copied().find(|k| *k == key.trim())?;
    let value = value.trim();
    Some(match value.parse::<usize>() {
        Ok(number) => Ok((key, number)),
        Err(_) => Err(MapLoadError::BadHeaderValue { key, value: value.to_string() }),
    })
}

fn keep_char(c: char) -> char {
    match c {
        '#' | '@' | '1' | '2' => c,
        _ => ' ',
    }
}

/// Load and normalize one map file.
pub fn load_map(path: &Path) -> Result<MapData, MapLoadError> {
    let text = std::fs::read_to_string(path)?;

    let mut name = None;
    let mut headers: [Option<usize>; 4] = [None; 4];
    let mut grid_lines: Vec<&str> = Vec::new();
    let mut in_grid = false;

    for line in text.lines() {
        if in_grid {
            grid_lines.push(line);
            continue;
        }
        if let Some(header) = parse_header(line) {
            let (key, value) = header?;
            let slot = HEADER_KEYS.iter().position(|k| *k == key).unwrap_or(0);
            headers[slot] = Some(value);
            continue;
        }
        let headers_started = headers.iter().any(|h| h.is_some());
        if !headers_started {
            // free-form preamble; the first non-empty line is the map name
            if name.is_none() && !line.trim().is_empty() {
                name = Some(line.trim_end().to_string());
            }
        } else {
            in_grid = true;
            grid_lines.push(line);
        }
    }

    let missing: Vec<&str> = HEADER_KEYS
        .iter()
        .zip(headers.iter())
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| *key)
        .collect();
    if !missing.is_empty() {
        return Err(MapLoadError::MissingHeaders(missing.join(", ")));
    }

    let rows = headers[0].unwrap_or(0);
    let cols = headers[1].unwrap_or(0);
    let max_steps = headers[2].unwrap_or(0);
    let num_shells = headers[3].unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Err(MapLoadError::ZeroDimension { rows, cols });
    }

    // normalize to rows x cols
    let mut normalized = Vec::with_capacity(rows);
    for row in 0..rows {
        let source = grid_lines.get(row).copied().unwrap_or("");
        let mut line = String::with_capacity(cols);
        for col in 0..cols {
            line.push(source.chars().nth(col).map_or(' ', keep_char));
        }
        normalized.push(line);
    }

    debug!(path = %path.display(), rows, cols, max_steps, num_shells, "map loaded");
    Ok(MapData {
        name: name.unwrap_or_default(),
        path: path.to_path_buf(),
        rows,
        cols,
        max_steps,
        num_shells,
        view: MapView { rows: normalized },
    })
}
