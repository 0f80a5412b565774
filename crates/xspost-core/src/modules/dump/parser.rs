//! Parser for the fitting tool's sentinel-delimited text dump.

use super::model::{DumpTables, NumericTable};
use crate::common::constants::{DUMP_BLOCK_SEPARATOR, DUMP_HEADER_SENTINEL, DUMP_MISSING_TOKEN};
use crate::domain::{ParseResult, PostError};

/// Splits the dump into its three numeric tables. The data section starts
/// after the first `!`; it must split on the `NO NO NO NO NO` literal into
/// exactly three sub-blocks (counts, photons, ratio). Each sub-block's
/// first and last line are format boundary markers and are discarded.
pub fn parse_dump(source: &str) -> ParseResult<DumpTables> {
    let Some((_, data_section)) = source.split_once(DUMP_HEADER_SENTINEL) else {
        return Err(PostError::malformed_dump(
            "dump has no '!' data-section sentinel",
        ));
    };

    let blocks: Vec<&str> = data_section.split(DUMP_BLOCK_SEPARATOR).collect();
    if blocks.len() != 3 {
        return Err(PostError::malformed_dump(format!(
            "data section splits into {} block(s), expected exactly 3 (counts, photons, ratio)",
            blocks.len()
        )));
    }

    Ok(DumpTables {
        counts: parse_block(blocks[0], "counts")?,
        photons: parse_block(blocks[1], "photons")?,
        ratio: parse_block(blocks[2], "ratio")?,
    })
}

fn parse_block(block: &str, table_name: &str) -> ParseResult<NumericTable> {
    let lines: Vec<&str> = block.split('\n').collect();
    let interior: &[&str] = if lines.len() > 2 {
        &lines[1..lines.len() - 1]
    } else {
        &[]
    };

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(interior.len());
    let mut width = 0usize;
    for (line_index, line) in interior.iter().enumerate() {
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            if token == DUMP_MISSING_TOKEN {
                row.push(f64::NAN);
                continue;
            }
            let value = token.parse::<f64>().map_err(|_| {
                PostError::malformed_dump(format!(
                    "{} table line {} token '{}' is not numeric",
                    table_name,
                    line_index + 1,
                    token
                ))
            })?;
            row.push(value);
        }

        if row.is_empty() {
            return Err(PostError::malformed_dump(format!(
                "{} table has a blank row at line {}",
                table_name,
                line_index + 1
            )));
        }
        if rows.is_empty() {
            width = row.len();
        } else if row.len() != width {
            return Err(PostError::malformed_dump(format!(
                "{} table row {} has {} column(s), previous rows have {}",
                table_name,
                line_index + 1,
                row.len(),
                width
            )));
        }
        rows.push(row);
    }

    Ok(NumericTable::new(rows, width))
}
