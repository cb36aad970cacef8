//! Stacked array materialization of field values.

/// Field values stacked into a dense 2-D array: shape `[n_fields,
/// n_points]`, row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldArrayData {
    /// Flattened values, field after field.
    pub data: Vec<f64>,
    /// `[n_fields, n_points]`.
    pub shape: [usize; 2],
}

impl FieldArrayData {
    /// The values of one field.
    pub fn field_row(&self, n: usize) -> Option<&[f64]> {
        let [n_fields, n_points] = self.shape;
        if n >= n_fields {
            return None;
        }
        Some(&self.data[n * n_points..(n + 1) * n_points])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_row() {
        let array = FieldArrayData {
            data: vec![1.0, 2.0, 3.0, 4.0],
            shape: [2, 2],
        };
        assert_eq!(array.field_row(0), Some(&[1.0, 2.0][..]));
        assert_eq!(array.field_row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(array.field_row(2), None);
    }
}
