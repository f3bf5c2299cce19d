//! Reader for the pre-YAML line format.
//!
//! Each record is a block of five lines:
//!
//! ```text
//! <sourceType>
//! <name>
//! <size>
//! <holdTime entries separated by spaces>
//! <voltage entries separated by spaces>
//! ```
//!
//! A trailing block with fewer than five lines is ignored.

use crate::{ProjectError, ProjectResult};
use std::path::Path;
use std::str::FromStr;
use sw_waveform::{SourceType, WaveformRecord};

const BLOCK_LINES: usize = 5;

pub fn parse_legacy(content: &str) -> ProjectResult<Vec<WaveformRecord>> {
    let lines: Vec<&str> = content.lines().collect();
    let mut records = Vec::new();

    for (block, chunk) in lines.chunks(BLOCK_LINES).enumerate() {
        if chunk.len() < BLOCK_LINES {
            break;
        }
        let first = block * BLOCK_LINES + 1;

        let code: u8 = parse_scalar(chunk[0], first)?;
        let source_type = SourceType::try_from(code).map_err(|e| ProjectError::Legacy {
            line: first,
            reason: e.to_string(),
        })?;
        let name = chunk[1].trim();
        let size: usize = parse_scalar(chunk[2], first + 2)?;
        let hold_time: Vec<u32> = parse_row(chunk[3], first + 3)?;
        let voltage: Vec<i32> = parse_row(chunk[4], first + 4)?;

        if hold_time.len() != size || voltage.len() != size {
            return Err(ProjectError::Legacy {
                line: first + 2,
                reason: format!(
                    "size {size} does not match {} hold times / {} voltages",
                    hold_time.len(),
                    voltage.len()
                ),
            });
        }

        let record = WaveformRecord::new(name, source_type, hold_time, voltage).map_err(|e| {
            ProjectError::Legacy {
                line: first,
                reason: e.to_string(),
            }
        })?;
        records.push(record);
    }

    Ok(records)
}

pub fn load_legacy(path: &Path) -> ProjectResult<Vec<WaveformRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_legacy(&content)
}

fn parse_scalar<T: FromStr>(text: &str, line: usize) -> ProjectResult<T> {
    text.trim().parse().map_err(|_| ProjectError::Legacy {
        line,
        reason: format!("expected an integer, found {:?}", text.trim()),
    })
}

fn parse_row<T: FromStr>(text: &str, line: usize) -> ProjectResult<Vec<T>> {
    text.split_whitespace()
        .map(|field| parse_scalar(field, line))
        .collect()
}
