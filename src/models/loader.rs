//! Text instance loader (Solomon layout).
//!
//! # Format
//!
//! ```text
//! C101                                  <- instance name (first line)
//! VEHICLE
//! NUMBER     CAPACITY
//!   25         200                      <- fleet bound and capacity
//! CUSTOMER
//! CUST NO.  XCOORD.  YCOORD.  DEMAND  READY TIME  DUE DATE  SERVICE TIME
//!     0      40       50       0       0          1236      0      <- depot
//!     1      45       68      10     912           967     90
//! ```
//!
//! Header lines starting with `CUSTOMER`, `VEHICLE`, `NUMBER`, `CUST NO.`
//! or `#` are skipped, as are two-column lines with no numeric column and
//! rows that match neither layout. Time-window and
//! service columns are parsed for validity and then discarded. Anything
//! after the seventh column is a free-text comment.
//!
//! The first coordinate column is stored as latitude and the second as
//! longitude, so geographic files list `lat lon` and planar files `x y`.

use std::path::Path;

use super::{Coordinate, Customer, ProblemInstance};
use crate::error::LoadError;

const SKIP_PREFIXES: [&str; 5] = ["CUSTOMER", "VEHICLE", "NUMBER", "CUST NO.", "#"];

/// Reads and parses an instance file.
pub fn load_instance(path: impl AsRef<Path>) -> Result<ProblemInstance, LoadError> {
    let text = std::fs::read_to_string(path)?;
    parse_instance(&text)
}

/// Parses an instance from text.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::loader::parse_instance;
///
/// let text = "\
/// TOY
/// VEHICLE
/// NUMBER CAPACITY
///   2     10
/// CUSTOMER
/// CUST NO. XCOORD. YCOORD. DEMAND READY DUE SERVICE
///   0  0 0 0 0 100 0
///   1  1 0 4 0 100 0
///   2  2 0 5 0 100 0
/// ";
/// let instance = parse_instance(text).unwrap();
/// assert_eq!(instance.name(), Some("TOY"));
/// assert_eq!(instance.num_customers(), 2);
/// assert_eq!(instance.max_vehicle_count(), 2);
/// assert_eq!(instance.vehicle_capacity(), 10.0);
/// ```
pub fn parse_instance(text: &str) -> Result<ProblemInstance, LoadError> {
    let mut name: Option<String> = None;
    let mut fleet: Option<(usize, f64)> = None;
    let mut depot: Option<Coordinate> = None;
    let mut customers = Vec::new();
    let mut seen_content = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || SKIP_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }
        let values: Vec<&str> = line.split_whitespace().collect();

        if !seen_content {
            seen_content = true;
            if values.iter().any(|v| v.parse::<f64>().is_err()) {
                name = Some(line.to_string());
                continue;
            }
        }

        if values.len() == 2 && values.iter().all(|v| v.parse::<f64>().is_err()) {
            tracing::debug!(line = line_no, "skipping column header");
        } else if values.len() == 2 {
            let count = values[0].parse::<usize>().map_err(|e| LoadError::Parse {
                line: line_no,
                message: format!("invalid vehicle count '{}': {e}", values[0]),
            })?;
            let capacity = parse_f64(values[1], line_no, "capacity")?;
            fleet = Some((count, capacity));
        } else if values.len() >= 7 {
            let id = values[0].parse::<usize>().map_err(|e| LoadError::Parse {
                line: line_no,
                message: format!("invalid customer id '{}': {e}", values[0]),
            })?;
            let first = parse_f64(values[1], line_no, "coordinate")?;
            let second = parse_f64(values[2], line_no, "coordinate")?;
            let demand = parse_f64(values[3], line_no, "demand")?;
            for (col, label) in [(4, "ready time"), (5, "due time"), (6, "service time")] {
                parse_f64(values[col], line_no, label)?;
            }
            let coordinate = Coordinate::new(first, second);
            if id == 0 {
                if depot.is_some() {
                    return Err(LoadError::Parse {
                        line: line_no,
                        message: "duplicate depot row".into(),
                    });
                }
                depot = Some(coordinate);
            } else {
                customers.push(Customer::new(id, coordinate, demand));
            }
        } else {
            tracing::debug!(line = line_no, "skipping unrecognized instance line");
        }
    }

    let depot = depot.ok_or(LoadError::MissingDepot)?;
    let (count, capacity) = fleet.ok_or(LoadError::MissingFleet)?;
    let instance = ProblemInstance::new(depot, customers, capacity, count)?;
    Ok(match name {
        Some(n) => instance.with_name(n),
        None => instance,
    })
}

fn parse_f64(token: &str, line: usize, what: &str) -> Result<f64, LoadError> {
    token.parse::<f64>().map_err(|e| LoadError::Parse {
        line,
        message: format!("invalid {what} '{token}': {e}"),
    })
}
