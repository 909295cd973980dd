//! Order-preserving fixed-size chunking of identifier lists.

/// Rejected segmentation request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("segment size must be at least 1")]
    ZeroSize,
}

/// Splits `items` into batches of `max_size`, preserving order.
///
/// Every batch holds exactly `max_size` items except possibly the last one,
/// which holds the remainder. Empty input yields no batches.
pub fn segment<T: Clone>(items: &[T], max_size: usize) -> Result<Vec<Vec<T>>, SegmentError> {
    if max_size == 0 {
        return Err(SegmentError::ZeroSize);
    }
    Ok(items.chunks(max_size).map(<[T]>::to_vec).collect())
}
