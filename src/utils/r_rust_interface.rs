use extendr_api::prelude::*;
use faer::MatRef;

use crate::core::errors::NicheError;

/////////////
// Errors  //
/////////////

impl From<NicheError> for extendr_api::Error {
    fn from(err: NicheError) -> Self {
        Error::Other(err.to_string())
    }
}

/////////////
// Vectors //
/////////////

/// Transform an R character vector into optional labels
///
/// `NA` entries become `None`.
pub fn r_strings_to_labels(x: &Strings) -> Vec<Option<String>> {
    x.iter()
        .map(|s| {
            if s.is_na() {
                None
            } else {
                Some(s.as_str().to_string())
            }
        })
        .collect()
}

/// Zip two R numeric vectors into 2D coordinates
pub fn r_coords_to_points(x: &[f64], y: &[f64]) -> extendr_api::Result<Vec<[f64; 2]>> {
    if x.len() != y.len() {
        return Err(Error::Other(format!(
            "Coordinate vectors have different lengths: {} != {}",
            x.len(),
            y.len()
        )));
    }
    Ok(x.iter().zip(y.iter()).map(|(&a, &b)| [a, b]).collect())
}

//////////////
// Matrices //
//////////////

/// Transform an R matrix to a faer one
pub fn r_matrix_to_faer(x: &RMatrix<f64>) -> faer::MatRef<'_, f64> {
    let ncol = x.ncols();
    let nrow = x.nrows();
    let data = x.data();

    MatRef::from_column_major_slice(data, nrow, ncol)
}

/// Transform a faer into an R matrix
pub fn faer_to_r_matrix(x: faer::MatRef<f64>) -> extendr_api::RArray<f64, [usize; 2]> {
    let nrow = x.nrows();
    let ncol = x.ncols();

    RArray::new_matrix(nrow, ncol, |row, column| x[(row, column)])
}
