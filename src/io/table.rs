use geo::MultiPolygon;

use crate::io::Attr;

/// Storage type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    /// Fixed-width text; longer values are cut in DBF output.
    Text(u8),
    Integer,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    #[inline] pub(crate) const fn text(name: &'static str, width: u8) -> Self { Self { name, kind: ColumnKind::Text(width) } }
    #[inline] pub(crate) const fn integer(name: &'static str) -> Self { Self { name, kind: ColumnKind::Integer } }
    #[inline] pub(crate) const fn real(name: &'static str) -> Self { Self { name, kind: ColumnKind::Real } }
}

/// A polygon collection with a fixed attribute schema, written by every output driver.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<(MultiPolygon<f64>, Vec<Attr>)>,
}

impl Table {
    pub(crate) fn new(columns: Vec<Column>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Append a row; `values` follow the column order.
    pub(crate) fn push(&mut self, geometry: MultiPolygon<f64>, values: Vec<Attr>) {
        debug_assert_eq!(values.len(), self.columns.len(), "row does not match the table schema");
        self.rows.push((geometry, values));
    }

    #[inline] pub(crate) fn len(&self) -> usize { self.rows.len() }
}
