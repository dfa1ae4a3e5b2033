//! Binding values into application types
//!
//! `Bind` is the single assignment operation from a [`Value`] into a typed
//! target. Scalars, vectors and options bind directly; matrix-like targets go
//! through [`bind_matrix`], which accepts three source shapes:
//!
//! ```text
//! {"rows": 2, "cols": 2, "data": [[1, 2], [3, 4]]}   description map
//! [[1, 2], [3, 4]]                                    sequence of rows
//! @matrix("m.dat", 10, 40)                            byte range in a file
//! ```
//!
//! A target with zero rows or zero columns takes the shape of the input. A
//! sized target must match a description map or a file range exactly.

mod matrix;

pub use matrix::{Matrix, MatrixLike, Transposer};

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};

use dca_json_core::{read_matrix_range, MatrixText, MatrixTextError, Origin, Value, ValueKind};
use tracing::debug;

use crate::error::{ReaderError, Result};

/// Assign from a document value, replacing the current contents
pub trait Bind {
    fn bind_from(&mut self, value: &Value) -> Result<()>;
}

/// Free-function form of [`Bind::bind_from`]
pub fn bind<T: Bind + ?Sized>(target: &mut T, value: &Value) -> Result<()> {
    target.bind_from(value)
}

/// Bind into a fresh default value
pub fn bind_new<T: Bind + Default>(value: &Value) -> Result<T> {
    let mut target = T::default();
    target.bind_from(value)?;
    Ok(target)
}

// ============================================================================
// Scalars
// ============================================================================

fn scalar_mismatch(expected: &str, value: &Value) -> ReaderError {
    match value {
        Value::Scalar(s) => ReaderError::type_mismatch(
            format!("{} (got {} '{}')", expected, s.type_name(), s),
            ValueKind::Scalar,
        ),
        other => ReaderError::type_mismatch(expected, other.kind()),
    }
}

macro_rules! bind_integer {
    ($($t:ty),* $(,)?) => {
        $(
            impl Bind for $t {
                fn bind_from(&mut self, value: &Value) -> Result<()> {
                    let scalar = value.as_scalar()?;
                    let wide = scalar
                        .as_i64()
                        .ok_or_else(|| scalar_mismatch("integer", value))?;
                    *self = <$t>::try_from(wide)
                        .map_err(|_| scalar_mismatch(concat!("integer in range of ", stringify!($t)), value))?;
                    Ok(())
                }
            }
        )*
    };
}

bind_integer!(i32, i64, u32, u64, usize);

impl Bind for f64 {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        let scalar = value.as_scalar()?;
        *self = scalar.as_f64().ok_or_else(|| scalar_mismatch("number", value))?;
        Ok(())
    }
}

impl Bind for f32 {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        let scalar = value.as_scalar()?;
        *self = scalar.as_f64().ok_or_else(|| scalar_mismatch("number", value))? as f32;
        Ok(())
    }
}

impl Bind for bool {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        let scalar = value.as_scalar()?;
        *self = scalar.as_bool().ok_or_else(|| scalar_mismatch("boolean", value))?;
        Ok(())
    }
}

/// Text binds as written; other scalars bind as their display form.
impl Bind for String {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        let scalar = value.as_scalar()?;
        *self = match scalar.as_text() {
            Some(text) => text.to_string(),
            None => scalar.to_string(),
        };
        Ok(())
    }
}

impl<T: Bind + Default> Bind for Vec<T> {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        let items = value.as_sequence()?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(bind_new(item)?);
        }
        *self = out;
        Ok(())
    }
}

/// `null` binds as `None`
impl<T: Bind + Default> Bind for Option<T> {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        *self = match value {
            Value::Null => None,
            other => Some(bind_new(other)?),
        };
        Ok(())
    }
}

// ============================================================================
// Matrix dispatcher
// ============================================================================

/// Bind any matrix-like target from a description map, a sequence of rows or
/// a matrix file reference.
pub fn bind_matrix<M: MatrixLike + ?Sized>(target: &mut M, source: &Value) -> Result<()> {
    match source {
        Value::Map(_) => bind_from_description(target, source),
        Value::Sequence(_) => bind_from_rows(target, source),
        Value::MatrixFile(_) => bind_from_file(target, source),
        other => Err(ReaderError::type_mismatch(
            "matrix-like value (map, sequence of rows or matrix file)",
            other.kind(),
        )),
    }
}

fn is_unsized<M: MatrixLike + ?Sized>(target: &M) -> bool {
    target.n_row() == 0 || target.n_col() == 0
}

fn bind_from_description<M: MatrixLike + ?Sized>(target: &mut M, source: &Value) -> Result<()> {
    let rows: usize = bind_new(source.field("rows")?)?;
    let cols: usize = bind_new(source.field("cols")?)?;
    let data = source.field("data")?;
    checked_len(rows, cols)?;

    if target.n_row() > 0 || target.n_col() > 0 {
        let actual = (target.n_row(), target.n_col());
        if actual != (rows, cols) {
            return Err(ReaderError::ShapeMismatch {
                expected: (rows, cols),
                actual,
            });
        }
        return bind_matrix(target, data);
    }

    match data {
        Value::Sequence(outer) => {
            // the declared shape must be backed by data before allocating it
            ensure_rows_cover(outer, rows, cols)?;
            debug!(rows, cols, "sizing matrix from description");
            target.resize(rows, cols);
            bind_matrix(target, data)
        }
        _ => {
            bind_matrix(target, data)?;
            let read = (target.n_row(), target.n_col());
            if read != (rows, cols) {
                return Err(ReaderError::ShapeMismatch {
                    expected: read,
                    actual: (rows, cols),
                });
            }
            Ok(())
        }
    }
}

/// Element count of a `rows x cols` matrix
fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or(ReaderError::ShapeTooLarge { rows, cols })
}

/// The first `rows` entries of `outer` must be sequences of at least `cols`
/// elements.
fn ensure_rows_cover(outer: &[Value], rows: usize, cols: usize) -> Result<()> {
    for i in 0..rows {
        let row = outer.get(i).ok_or(ReaderError::IndexOutOfRange {
            index: i,
            len: outer.len(),
        })?;
        let len = row.as_sequence()?.len();
        if len < cols {
            return Err(ReaderError::IndexOutOfRange { index: len, len });
        }
    }
    Ok(())
}

fn bind_from_rows<M: MatrixLike + ?Sized>(target: &mut M, source: &Value) -> Result<()> {
    let outer = source.as_sequence()?;

    if is_unsized(target) {
        let rows = outer.len();
        let cols = match outer.first() {
            Some(first) => first.as_sequence()?.len(),
            None => 0,
        };
        ensure_rows_cover(outer, rows, cols)?;
        debug!(rows, cols, "sizing matrix from rows");
        target.resize(rows, cols);
    }

    for i in 0..target.n_row() {
        let row = source.at(i)?;
        for j in 0..target.n_col() {
            target.elem_mut(i, j).bind_from(row.at(j)?)?;
        }
    }
    Ok(())
}

fn bind_from_file<M: MatrixLike + ?Sized>(target: &mut M, source: &Value) -> Result<()> {
    let file_ref = source.as_file_ref()?;
    let path = file_ref.filename();

    let file = File::open(path).map_err(|source| ReaderError::FileNotFound {
        path: path.to_path_buf(),
        cwd: std::env::current_dir().unwrap_or_default(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    reader
        .seek(SeekFrom::Start(file_ref.start()))
        .map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        path = %path.display(),
        start = file_ref.start(),
        end = file_ref.end(),
        "reading matrix from file"
    );

    let text = read_matrix_range(&mut reader, file_ref.end(), &Origin::File(path.to_path_buf()))
        .map_err(|e| match e {
            MatrixTextError::Io(source) => ReaderError::Io {
                path: path.to_path_buf(),
                source,
            },
            MatrixTextError::Parse(e) => ReaderError::Parse(e),
        })?;

    fill_from_text(target, &text)
}

fn fill_from_text<M: MatrixLike + ?Sized>(target: &mut M, text: &MatrixText) -> Result<()> {
    if !is_unsized(target) {
        let actual = (target.n_row(), target.n_col());
        if actual != text.shape() {
            return Err(ReaderError::ShapeMismatch {
                expected: text.shape(),
                actual,
            });
        }
    }
    bind_from_rows(target, &text.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_json_core::{parse_str, MatrixFileRef, Scalar};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_targets() {
        let mut i: i32 = 0;
        bind(&mut i, &Value::from(-7i64)).unwrap();
        assert_eq!(i, -7);

        let mut u: usize = 0;
        bind(&mut u, &Value::from("12")).unwrap();
        assert_eq!(u, 12);
        bind(&mut u, &Value::from(3.0)).unwrap();
        assert_eq!(u, 3);

        assert!(matches!(
            bind(&mut u, &Value::from(-1i64)),
            Err(ReaderError::TypeMismatch { .. })
        ));
        assert!(matches!(
            bind(&mut u, &Value::from(2.5)),
            Err(ReaderError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_float_bool_string_targets() {
        let mut x = 0.0f64;
        bind(&mut x, &Value::from(4i64)).unwrap();
        assert_eq!(x, 4.0);

        let mut y = 0.0f32;
        bind(&mut y, &Value::from(0.5)).unwrap();
        assert_eq!(y, 0.5);

        let mut b = false;
        bind(&mut b, &Value::from(true)).unwrap();
        assert!(b);

        let mut s = String::new();
        bind(&mut s, &Value::from("ct-aux")).unwrap();
        assert_eq!(s, "ct-aux");
        bind(&mut s, &Value::from(42i64)).unwrap();
        assert_eq!(s, "42");
    }

    #[test]
    fn test_non_scalar_into_scalar_is_type_mismatch() {
        let mut x = 0.0f64;
        let err = bind(&mut x, &Value::Sequence(vec![])).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::TypeMismatch {
                found: ValueKind::Sequence,
                ..
            }
        ));

        let err = bind(&mut x, &Value::from("abc")).unwrap_err();
        assert!(err.to_string().contains("text 'abc'"), "{}", err);
    }

    #[test]
    fn test_vec_and_option() {
        let v = parse_str("[1, 2, 3]").unwrap();
        let mut out: Vec<i64> = vec![9];
        bind(&mut out, &v).unwrap();
        assert_eq!(out, vec![1, 2, 3]);

        let nested = parse_str("[[1, 2], [3]]").unwrap();
        let mut rows: Vec<Vec<u32>> = Vec::new();
        bind(&mut rows, &nested).unwrap();
        assert_eq!(rows, vec![vec![1, 2], vec![3]]);

        let mut o: Option<f64> = Some(1.0);
        bind(&mut o, &Value::Null).unwrap();
        assert_eq!(o, None);
        bind(&mut o, &Value::from(2.0)).unwrap();
        assert_eq!(o, Some(2.0));
    }

    #[test]
    fn test_scalar_source_is_not_matrix_like() {
        let mut m: Matrix<f64> = Matrix::default();
        let err = bind_matrix(&mut m, &Value::from(1i64)).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::TypeMismatch {
                found: ValueKind::Scalar,
                ..
            }
        ));
        assert!(bind_matrix(&mut m, &Value::Null).is_err());
    }

    #[test]
    fn test_description_missing_entries() {
        let mut m: Matrix<i64> = Matrix::default();
        let src = parse_str(r#"{"rows": 1, "data": [[1]]}"#).unwrap();
        let err = bind_matrix(&mut m, &src).unwrap_err();
        assert!(matches!(err, ReaderError::KeyNotFound { keys } if keys == ["cols"]));
    }

    #[test]
    fn test_short_row_is_index_out_of_range() {
        let mut m: Matrix<i64> = Matrix::new(2, 2);
        let src = parse_str("[[1, 2], [3]]").unwrap();
        let err = bind_matrix(&mut m, &src).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::IndexOutOfRange { index: 1, len: 1 }
        ));
    }

    #[test]
    fn test_description_shape_overflow_is_error() {
        let mut m: Matrix<f64> = Matrix::default();
        let src = parse_str(r#"{"rows": 4294967296, "cols": 4294967296, "data": []}"#).unwrap();
        let err = bind_matrix(&mut m, &src).unwrap_err();
        assert!(matches!(err, ReaderError::ShapeTooLarge { .. }), "{}", err);
        assert_eq!(m.shape(), (0, 0));
    }

    #[test]
    fn test_description_shape_larger_than_data_is_error() {
        let mut m: Matrix<f64> = Matrix::default();
        let src = parse_str(r#"{"rows": 1000000, "cols": 1000000, "data": [[1, 2]]}"#).unwrap();
        let err = bind_matrix(&mut m, &src).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::IndexOutOfRange { index: 2, len: 2 }
        ));
        assert_eq!(m.shape(), (0, 0));

        let src = parse_str(r#"{"rows": 3, "cols": 1, "data": [[1], [2]]}"#).unwrap();
        assert!(matches!(
            bind_matrix(&mut m, &src),
            Err(ReaderError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_description_with_file_data_checks_declared_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.dat");
        std::fs::write(&path, "1 2\n3 4\n").unwrap();
        let description = |rows: usize| {
            parse_str(&format!(
                r#"{{"rows": {}, "cols": 2, "data": @matrix("{}", 0, 8)}}"#,
                rows,
                path.display()
            ))
            .unwrap()
        };

        let mut ok: Matrix<i64> = Matrix::default();
        bind_matrix(&mut ok, &description(2)).unwrap();
        assert_eq!(ok[(1, 1)], 4);

        let mut wrong: Matrix<i64> = Matrix::default();
        let src = description(3);
        assert!(matches!(
            bind_matrix(&mut wrong, &src),
            Err(ReaderError::ShapeMismatch {
                expected: (2, 2),
                actual: (3, 2)
            })
        ));
    }

    #[test]
    fn test_element_type_mismatch() {
        let mut m: Matrix<f64> = Matrix::default();
        let src = parse_str(r#"[[1, "x"]]"#).unwrap();
        assert!(matches!(
            bind_matrix(&mut m, &src),
            Err(ReaderError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_rows_from_matrix_text_value() {
        let mut m: Matrix<i64> = Matrix::default();
        let text = dca_json_core::parse_matrix_text("1 2 3\n4 5 6\n", &Origin::Memory).unwrap();
        fill_from_text(&mut m, &text).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(1, 2)], 6);

        let mut sized: Matrix<i64> = Matrix::new(3, 2);
        let err = fill_from_text(&mut sized, &text).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::ShapeMismatch {
                expected: (2, 3),
                actual: (3, 2)
            }
        ));
    }

    #[test]
    fn test_missing_matrix_file() {
        let mut m: Matrix<f64> = Matrix::default();
        let src = Value::MatrixFile(MatrixFileRef::new("no-such-dir/m.dat", 10, 40));
        let err = bind_matrix(&mut m, &src).unwrap_err();
        match &err {
            ReaderError::FileNotFound { path, cwd, .. } => {
                assert_eq!(path.to_str(), Some("no-such-dir/m.dat"));
                assert_eq!(cwd, &std::env::current_dir().unwrap());
            }
            other => panic!("expected FileNotFound, got {other:?}"),
        }
        assert!(err.to_string().contains("no-such-dir/m.dat"));
    }

    #[test]
    fn test_scalar_elements_keep_type() {
        let mut m: Matrix<String> = Matrix::default();
        let src = parse_str(r#"[["a", 1], [true, 2.5]]"#).unwrap();
        bind_matrix(&mut m, &src).unwrap();
        assert_eq!(m[(1, 0)], "true");
        assert_eq!(m[(1, 1)], Scalar::Float(2.5).to_string());
    }
}
