//! Abaqus `*ELSET` writer for classified strata.
//!
//! Output layout, one section per stratum in declared order:
//! ```text
//! *ELSET, ELSET=Unit_1_new
//! 	1, 2, 3, 4, 5, 6, 7, 8, 9
//! 	10, 11
//! *****
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::merge::StrataSet;

/// Element ids per data line.
pub const IDS_PER_LINE: usize = 9;

/// Suffix appended to each stratum name so the sets do not clash with
/// existing ELSETs in the model.
pub const ELSET_SUFFIX: &str = "_new";

pub fn render_element_sets(strata: &StrataSet) -> String {
    let mut out = String::new();
    for (name, ids) in strata.iter() {
        let _ = writeln!(out, "*ELSET, ELSET={name}{ELSET_SUFFIX}");
        for chunk in ids.chunks(IDS_PER_LINE) {
            out.push('\t');
            for (i, id) in chunk.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{id}");
            }
            out.push('\n');
        }
    }
    out.push_str("*****\n");
    out
}

pub fn write_element_sets<W: Write>(writer: &mut W, strata: &StrataSet) -> io::Result<()> {
    writer.write_all(render_element_sets(strata).as_bytes())?;
    writer.flush()
}
