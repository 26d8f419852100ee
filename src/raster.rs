use std::ops::{Add, Div, Mul, Sub};

/// Dense row-major grid of `rows x cols` elements of type `T`.
///
/// Shape is fixed after construction; cell values mutate freely through
/// [`Raster::set`]. Arithmetic and equality are element-wise.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Raster<T> {
    /// Construct a `rows x cols` raster filled with `fill`.
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![fill; rows * cols],
        }
    }

    /// Construct a raster from nested row-major literal data.
    ///
    /// # Panics
    /// Panics if rows have inconsistent lengths.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|r| r.len() == ncols),
            "Raster::from_rows: ragged input"
        );
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            data.extend(row);
        }
        Self {
            rows: nrows,
            cols: ncols,
            data,
        }
    }
}

impl<T: Copy> Raster<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols, "raster index out of bounds");
        row * self.cols + col
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let idx = self.index(row, col);
        self.data[idx] = value;
    }

    pub fn is_outside(&self, row: i64, col: i64) -> bool {
        row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols
    }

    pub fn same_shape(&self, other: &Raster<T>) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// Element-wise binary op; panics on shape mismatch (see `PopsError::ShapeMismatch`
    /// for the fallible variant used by higher layers).
    fn zip_with(&self, other: &Raster<T>, f: impl Fn(T, T) -> T) -> Raster<T> {
        assert!(
            self.same_shape(other),
            "Raster shape mismatch: {}x{} vs {}x{}",
            self.rows,
            self.cols,
            other.rows,
            other.cols
        );
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Raster {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    fn map_scalar(&self, scalar: T, f: impl Fn(T, T) -> T) -> Raster<T> {
        let data = self.data.iter().map(|&a| f(a, scalar)).collect();
        Raster {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }
}

macro_rules! impl_raster_arith {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<T: Copy + $trait<Output = T>> $trait for Raster<T> {
            type Output = Raster<T>;
            fn $method(self, rhs: Raster<T>) -> Raster<T> {
                self.zip_with(&rhs, |a, b| a $op b)
            }
        }

        impl<T: Copy + $trait<Output = T>> $trait<&Raster<T>> for &Raster<T> {
            type Output = Raster<T>;
            fn $method(self, rhs: &Raster<T>) -> Raster<T> {
                self.zip_with(rhs, |a, b| a $op b)
            }
        }
    };
}

impl_raster_arith!(Add, add, +);
impl_raster_arith!(Sub, sub, -);
impl_raster_arith!(Mul, mul, *);
impl_raster_arith!(Div, div, /);

/// Scalar division is not a trapped error: dividing by zero returns `T`'s
/// own definition of the operation (e.g. `f64`'s `inf`/`NaN`, or a wrapping
/// panic for integer types in debug builds, matching Rust's native
/// semantics). Callers that cannot tolerate this guard the cell themselves
/// (see `Environment::total_population_at` usage sites).
impl<T: Copy + Div<Output = T>> Raster<T> {
    pub fn div_scalar(&self, scalar: T) -> Raster<T> {
        self.map_scalar(scalar, |a, b| a / b)
    }
}

impl<T: Copy + Mul<Output = T>> Raster<T> {
    pub fn mul_scalar(&self, scalar: T) -> Raster<T> {
        self.map_scalar(scalar, |a, b| a * b)
    }
}

impl<T: Copy + Add<Output = T>> Raster<T> {
    pub fn add_scalar(&self, scalar: T) -> Raster<T> {
        self.map_scalar(scalar, |a, b| a + b)
    }
}
