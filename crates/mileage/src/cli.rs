//! CLI formatting and lookup helpers
//!
//! Renders controller output as tables (human) or JSON.

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use mileage_core::models::{StatGroup, StatisticRow, Vehicle, VehicleId};
use mileage_core::{CacheStats, JobProgress, JobStatus};
use serde_json::json;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    UnknownVehicle { id: VehicleId, known: String },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::UnknownVehicle { id, known } => {
                write!(f, "No vehicle with id {}\nKnown vehicles:\n{}", id, known)
            }
        }
    }
}

impl std::error::Error for CliError {}

// ============================================================================
// Lookup
// ============================================================================

/// Find a vehicle by id, listing the known ones when it's missing
pub fn find_vehicle(vehicles: &[Vehicle], id: VehicleId) -> Result<&Vehicle, CliError> {
    vehicles.iter().find(|v| v.id == id).ok_or_else(|| {
        let known = if vehicles.is_empty() {
            "  (none)".to_string()
        } else {
            vehicles
                .iter()
                .take(10)
                .map(|v| format!("  {:>4}  {}", v.id, v.display_name()))
                .collect::<Vec<_>>()
                .join("\n")
        };
        CliError::UnknownVehicle { id, known }
    })
}

// ============================================================================
// Formatters
// ============================================================================

/// Statistic rows grouped under their group headings, or JSON
pub fn format_statistics(
    vehicle: &Vehicle,
    rows: &[StatisticRow],
    expected: usize,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        let doc = json!({
            "vehicle": vehicle,
            "complete": rows.len() >= expected,
            "statistics": rows,
        });
        return serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string());
    }

    if rows.is_empty() {
        return format!("No statistics available for {}.", vehicle.display_name());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if no_color {
        table.set_header(vec!["Group", "Statistic", "Value"]);
    } else {
        table.set_header(vec![
            Cell::new("Group").fg(Color::Cyan),
            Cell::new("Statistic").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    }

    let mut previous: Option<StatGroup> = None;
    for row in rows {
        // Only the first row of a group carries its name
        let group = if previous == Some(row.group) {
            String::new()
        } else {
            row.group.name().to_string()
        };
        previous = Some(row.group);

        let label = if row.has_detail {
            format!("{} *", row.label)
        } else {
            row.label.clone()
        };
        table.add_row(Row::from(vec![group, label, row.value.clone()]));
    }

    format!("{}\n{}", vehicle.display_name(), table)
}

/// Vehicles as a table, or JSON
pub fn format_vehicle_table(vehicles: &[Vehicle], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(vehicles).unwrap_or_else(|_| "[]".to_string());
    }

    if vehicles.is_empty() {
        return "No vehicles found.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if no_color {
        table.set_header(vec!["ID", "Vehicle", "Units", "Economy"]);
    } else {
        table.set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Vehicle").fg(Color::Cyan),
            Cell::new("Units").fg(Color::Cyan),
            Cell::new("Economy").fg(Color::Cyan),
        ]);
    }

    for vehicle in vehicles {
        table.add_row(Row::from(vec![
            vehicle.id.to_string(),
            truncate(&vehicle.display_name(), 40),
            format!(
                "{}, {}",
                vehicle.distance_unit.abbreviation(),
                vehicle.volume_unit.abbreviation()
            ),
            vehicle.economy_abbreviation(),
        ]));
    }

    table.to_string()
}

/// One-line summary of how the recompute went
pub fn format_job_summary(status: JobStatus, progress: JobProgress, error: Option<&str>) -> String {
    match status {
        JobStatus::Completed => format!(
            "Recomputed {} of {} statistics ({} not computable)",
            progress.written, progress.total, progress.skipped
        ),
        JobStatus::Failed => format!(
            "Recompute failed: {}",
            error.unwrap_or("unknown error")
        ),
        other => format!("Recompute {:?} after {} statistics", other, progress.evaluated),
    }
}

pub fn format_cache_info(stats: &CacheStats, location: &str, size_bytes: Option<u64>) -> String {
    let mut lines = vec![];
    lines.push(format!("Location:         {}", location));
    if let Some(size) = size_bytes {
        lines.push(format!("Size:             {}", format_size(size)));
    }
    lines.push(format!("Vehicles:         {}", stats.vehicle_count));
    lines.push(format!("Entries:          {}", stats.total_entries));
    lines.push(format!("  Valid:          {}", stats.valid_entries));
    lines.push(format!("  Invalid:        {}", stats.invalid_entries()));
    lines.join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1_024 {
        format!("{:.1}KB", bytes as f64 / 1_024.0)
    } else {
        format!("{}B", bytes)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        // Char-based so multi-byte names don't split
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
