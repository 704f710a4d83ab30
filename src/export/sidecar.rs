use crate::error::Result;
use crate::model::OBJECTID;
use crate::schema::TableDef;
use crate::workspace::Record;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The field that identifies rows of `table` in a sidecar file: the last
/// one whose name contains `<table>_ID`, or `OBJECTID` when there is none.
pub fn sidecar_id_field(table: &str, def: &TableDef) -> String {
    let id = format!("{}_ID", table);
    def.fields
        .iter()
        .rev()
        .find(|f| f.name.contains(&id))
        .map(|f| f.name.clone())
        .unwrap_or_else(|| OBJECTID.to_string())
}

/// Writes full values of fields too long for the flat format.
///
/// The header is `<id>,<f1>,<f2>...`; each row is `<id>|<v1>|<v2>...` with
/// nulls left empty.
pub fn write_sidecar(
    path: &Path,
    table: &str,
    def: &TableDef,
    records: &[Record],
    long_fields: &[String],
) -> Result<()> {
    let id_field = sidecar_id_field(table, def);
    let mut out = BufWriter::new(File::create(path)?);

    write!(out, "{}", id_field)?;
    for field in long_fields {
        write!(out, ",{}", field)?;
    }
    writeln!(out)?;

    for record in records {
        if id_field == OBJECTID {
            write!(out, "{}", record.oid)?;
        } else {
            write!(out, "{}", record.text(&id_field))?;
        }
        for field in long_fields {
            write!(out, "|{}", record.text(field))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
