//! Input abstraction for RQA series.
//!
//! This module defines the `SeriesInput` trait which allows `run` and
//! `run_cross` to accept standard slices and ndarray inputs interchangeably.

use ndarray::{ArrayBase, Data, Ix1};
use num_traits::Float;
use rqa::internals::primitives::RqaError;

/// Trait for types that can be analysed as a scalar time series.
pub trait SeriesInput<T: Float> {
    /// Borrow the input as a contiguous slice.
    fn as_series_slice(&self) -> Result<&[T], RqaError>;
}

impl<T: Float> SeriesInput<T> for [T] {
    fn as_series_slice(&self) -> Result<&[T], RqaError> {
        Ok(self)
    }
}

impl<T: Float, const N: usize> SeriesInput<T> for [T; N] {
    fn as_series_slice(&self) -> Result<&[T], RqaError> {
        Ok(self.as_slice())
    }
}

impl<T: Float> SeriesInput<T> for Vec<T> {
    fn as_series_slice(&self) -> Result<&[T], RqaError> {
        Ok(self.as_slice())
    }
}

impl<T: Float, S> SeriesInput<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
{
    fn as_series_slice(&self) -> Result<&[T], RqaError> {
        self.as_slice()
            .ok_or_else(|| RqaError::invalid("time_series", "ndarray input must be contiguous in memory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array1};

    #[test]
    fn contiguous_inputs_borrow_without_copying() {
        let v = vec![1.0_f64, 2.0, 3.0];
        assert_eq!(v.as_series_slice().unwrap().as_ptr(), v.as_ptr());

        let a = Array1::from(v.clone());
        assert_eq!(a.as_series_slice().unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!([4.0_f32, 5.0].as_series_slice().unwrap(), &[4.0, 5.0]);
    }

    #[test]
    fn strided_views_are_rejected() {
        let a = Array1::from(vec![0.0_f64, 1.0, 2.0, 3.0, 4.0]);
        let view = a.slice(s![..;2]);
        let err = view.as_series_slice().unwrap_err();
        assert!(matches!(
            err,
            RqaError::InvalidParameter { parameter: "time_series", .. }
        ));
    }
}
