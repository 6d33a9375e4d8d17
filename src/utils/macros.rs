///////////////////
// Vector macros //
///////////////////

/// Assertion that all vectors have the same length.
#[macro_export]
macro_rules! assert_same_len {
    ($($vec:expr),+ $(,)?) => {
        {
            let lengths: Vec<usize> = vec![$($vec.len()),+];
            let first_len = lengths[0];

            if !lengths.iter().all(|&len| len == first_len) {
                panic!(
                    "Vectors have different lengths: {:?}",
                    lengths
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_same_len_passes() {
        let a = vec![1, 2, 3];
        let b = [0.0; 3];
        assert_same_len!(a, b);
    }

    #[test]
    #[should_panic(expected = "Vectors have different lengths")]
    fn test_same_len_panics() {
        let a = vec![1, 2, 3];
        let b = vec![1, 2];
        assert_same_len!(a, b);
    }
}
