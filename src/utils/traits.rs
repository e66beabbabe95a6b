pub(crate) trait SafeAccess<T> {
    fn get_safe(&self, index: usize) -> Result<&T, std::io::Error>;
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> Result<&[T], std::io::Error>;
}

impl<T> SafeAccess<T> for [T] {
    /// Safely retrieves a reference to an element at the specified index in a slice.
    ///
    /// # Errors
    ///
    /// Returns an `std::io::Error` with `std::io::ErrorKind::InvalidData`
    /// if the index is out of bounds.
    fn get_safe(&self, index: usize) -> Result<&T, std::io::Error> {
        self.get(index).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Index {} out of bounds (len {})", index, self.len()),
            )
        })
    }

    /// Safely retrieves a reference to a range of elements in a slice.
    ///
    /// # Errors
    ///
    /// Returns an `std::io::Error` with `std::io::ErrorKind::InvalidData`
    /// if the range is out of bounds or reversed.
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> Result<&[T], std::io::Error> {
        self.get(range.clone()).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Range {}..{} out of bounds (len {})",
                    range.start,
                    range.end,
                    self.len()
                ),
            )
        })
    }
}
