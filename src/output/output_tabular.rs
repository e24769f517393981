use std::io::Write;

use crate::structs::Alignment;

/// Write one header line and one tab row per alignment.
pub fn write_tabular_output(
    alignments: &[Alignment],
    out: &mut impl Write,
) -> std::io::Result<()> {
    writeln!(
        out,
        "#target\tquery\ttarget-start\ttarget-end\tprofile-start\tprofile-end\tscore-nats\tscore-bits\tp-value\te-value\tidentity"
    )?;
    for alignment in alignments {
        writeln!(out, "{}", alignment.tab_string())?;
    }
    Ok(())
}
