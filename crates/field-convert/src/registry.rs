//! The converter capability table.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use field_core::{DataType, FieldError, FieldIter, FieldList, FieldResult};

use crate::array::FieldArrayData;
use crate::table::FieldTable;

/// A format-aware converter producing tabular and array materializations of
/// a field collection.
pub trait FieldConverter: Send + Sync {
    /// The data format tag this converter handles (e.g. "grib").
    fn format(&self) -> &'static str;

    /// Materialize the requested attribute columns, one row per field.
    fn to_table(&self, list: &dyn FieldList, columns: &[String]) -> FieldResult<FieldTable>;

    /// Stack every field's values into a `[n_fields, n_points]` array.
    fn to_array(&self, list: &dyn FieldList, dtype: DataType) -> FieldResult<FieldArrayData>;
}

/// The stock converter for regular gridded formats. Reads attributes and
/// values straight through the `Field` trait.
#[derive(Debug, Default)]
pub struct GridConverter;

impl FieldConverter for GridConverter {
    fn format(&self) -> &'static str {
        "grib"
    }

    fn to_table(&self, list: &dyn FieldList, columns: &[String]) -> FieldResult<FieldTable> {
        let mut cells: Vec<Vec<_>> = columns.iter().map(|_| Vec::with_capacity(list.len())).collect();
        for field in FieldIter::new(list) {
            for (i, column) in columns.iter().enumerate() {
                cells[i].push(field.attribute(column));
            }
        }
        Ok(FieldTable::new(columns.to_vec(), cells))
    }

    fn to_array(&self, list: &dyn FieldList, dtype: DataType) -> FieldResult<FieldArrayData> {
        let mut data = Vec::new();
        let mut n_points: Option<usize> = None;
        for (n, field) in FieldIter::new(list).enumerate() {
            let values = field.values(dtype).into_f64();
            match n_points {
                None => n_points = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(FieldError::data_error(format!(
                        "field {} has {} points, expected {}",
                        n,
                        values.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }
            data.extend(values);
        }
        Ok(FieldArrayData {
            shape: [list.len(), n_points.unwrap_or(0)],
            data,
        })
    }
}

/// Capability lookup table: data format tag -> converter.
///
/// The converter for a collection is keyed off its first field's declared
/// format; an unknown format is an error, not a fallback.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn FieldConverter>>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the stock grid converter registered for the regular
    /// gridded formats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let grid = Arc::new(GridConverter);
        registry.register("grib", grid.clone());
        registry.register("netcdf", grid);
        registry
    }

    /// Register a converter under a format tag, replacing any previous one.
    pub fn register(&mut self, format: &str, converter: Arc<dyn FieldConverter>) {
        self.converters.insert(format.to_string(), converter);
    }

    /// Look up the converter for a format tag.
    pub fn get(&self, format: &str) -> FieldResult<Arc<dyn FieldConverter>> {
        self.converters
            .get(format)
            .cloned()
            .ok_or_else(|| FieldError::unsupported_format(format))
    }

    /// Materialize a table for a collection, picking the converter by the
    /// first field's format. An empty collection yields an empty table.
    pub fn convert_table(&self, list: &dyn FieldList, columns: &[String]) -> FieldResult<FieldTable> {
        let Some(first) = list.field(0) else {
            return Ok(FieldTable::default());
        };
        let format = first.data_format().to_string();
        debug!(%format, columns = columns.len(), "table conversion");
        self.get(&format)?.to_table(list, columns)
    }

    /// Materialize a stacked array for a collection, picking the converter
    /// by the first field's format. An empty collection yields an empty
    /// array.
    pub fn convert_array(&self, list: &dyn FieldList, dtype: DataType) -> FieldResult<FieldArrayData> {
        let Some(first) = list.field(0) else {
            return Ok(FieldArrayData::default());
        };
        let format = first.data_format().to_string();
        self.get(&format)?.to_array(list, dtype)
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.converters.keys().collect();
        formats.sort();
        f.debug_struct("ConverterRegistry")
            .field("formats", &formats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_core::{AttrValue, SimpleFieldList};
    use test_utils::TestField;

    fn sample() -> SimpleFieldList {
        SimpleFieldList::from_fields(vec![
            TestField::new()
                .with("param", "2t")
                .with("step", 0i64)
                .with_data(vec![1.0, 2.0])
                .into_arc(),
            TestField::new()
                .with("param", "msl")
                .with_data(vec![3.0, 4.0])
                .into_arc(),
        ])
    }

    #[test]
    fn test_table_conversion_with_missing_cells() {
        let registry = ConverterRegistry::with_defaults();
        let columns = vec!["param".to_string(), "step".to_string()];
        let table = registry.convert_table(&sample(), &columns).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column("param").unwrap()[0],
            Some(AttrValue::from("2t"))
        );
        assert_eq!(table.column("step").unwrap()[1], None);
    }

    #[test]
    fn test_array_conversion_stacks_fields() {
        let registry = ConverterRegistry::with_defaults();
        let array = registry.convert_array(&sample(), DataType::F64).unwrap();
        assert_eq!(array.shape, [2, 2]);
        assert_eq!(array.field_row(1), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn test_mismatched_point_counts_rejected() {
        let registry = ConverterRegistry::with_defaults();
        let list = SimpleFieldList::from_fields(vec![
            TestField::new().with_data(vec![1.0, 2.0]).into_arc(),
            TestField::new().with_data(vec![1.0]).into_arc(),
        ]);
        assert!(matches!(
            registry.convert_array(&list, DataType::F64),
            Err(FieldError::DataError(_))
        ));
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let registry = ConverterRegistry::with_defaults();
        let list = SimpleFieldList::from_fields(vec![TestField::new()
            .with_format("geotiff")
            .into_arc()]);
        assert!(matches!(
            registry.convert_table(&list, &[]),
            Err(FieldError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_empty_collection_yields_empty_table() {
        let registry = ConverterRegistry::with_defaults();
        let table = registry
            .convert_table(&SimpleFieldList::new(), &["param".to_string()])
            .unwrap();
        assert!(table.is_empty());
    }
}
