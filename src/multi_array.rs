//! Rectangular arrays of any rank.

use crate::catalog::Registrar;
use crate::content::{Content, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::format::TargetPlatform;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;

/// A dense multi-dimensional array stored in row-major order (the last
/// dimension varies fastest).
///
/// On disk: rank, each dimension length, then every element in linear
/// order, all counts 7-bit encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiArray<T> {
    dims: Vec<usize>,
    data: Vec<T>,
}

impl<T> MultiArray<T> {
    /// Builds an array from its dimensions and row-major elements.
    pub fn from_vec(dims: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let len = element_count(&dims)?;
        if len != data.len() {
            return Err(ContentError::Corruption(format!(
                "dimensions {dims:?} hold {len} elements but {} were given",
                data.len()
            )));
        }
        Ok(Self { dims, data })
    }

    /// Dimension lengths.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Elements in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The element at the given per-dimension indices.
    pub fn get(&self, indices: &[usize]) -> Option<&T> {
        self.data.get(linear_index(&self.dims, indices)?)
    }

    /// Per-dimension indices of a linear element index.
    pub fn indices_of(&self, linear: usize) -> Result<Vec<usize>> {
        decompose(&self.dims, linear)
    }
}

impl<T: Clone> MultiArray<T> {
    /// An array of the given shape with every element set to `value`.
    pub fn filled(dims: Vec<usize>, value: T) -> Result<Self> {
        let len = element_count(&dims)?;
        Ok(Self {
            dims,
            data: vec![value; len],
        })
    }
}

impl<T> Default for MultiArray<T> {
    fn default() -> Self {
        Self {
            dims: vec![0],
            data: Vec::new(),
        }
    }
}

fn element_count(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Err(ContentError::Corruption(
            "an array needs at least one dimension".into(),
        ));
    }
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)).ok_or_else(|| {
        ContentError::Corruption(format!("dimensions {dims:?} overflow the element count"))
    })
}

fn linear_index(dims: &[usize], indices: &[usize]) -> Option<usize> {
    if dims.len() != indices.len() {
        return None;
    }
    dims.iter().zip(indices).try_fold(0usize, |acc, (&d, &i)| {
        (i < d).then(|| acc * d + i)
    })
}

/// Splits `linear` into per-dimension indices by successive modulo and
/// divide, last dimension first. A quotient left over after the first
/// dimension means the index was out of range.
pub fn decompose(dims: &[usize], linear: usize) -> Result<Vec<usize>> {
    let mut indices = vec![0; dims.len()];
    let mut rest = linear;
    for (slot, &dim) in indices.iter_mut().zip(dims).rev() {
        if dim == 0 {
            return Err(ContentError::Corruption(format!(
                "linear index {linear} in an empty dimension of {dims:?}"
            )));
        }
        *slot = rest % dim;
        rest /= dim;
    }
    if rest != 0 {
        return Err(ContentError::Corruption(format!(
            "linear index {linear} is out of range for dimensions {dims:?}"
        )));
    }
    Ok(indices)
}

impl<T: Content> Content for MultiArray<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("MultiArray", &[T::descriptor()])
    }

    fn register_dependencies(registrar: &mut Registrar<'_>) {
        registrar.include::<T>();
    }

    fn should_compress(platform: TargetPlatform) -> bool {
        T::should_compress(platform)
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_count(self.dims.len())?;
        for &dim in &self.dims {
            writer.write_count(dim)?;
        }
        self.data.iter().try_for_each(|item| writer.write_member(item))
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let rank = reader.read_count()?;
        if rank == 0 {
            return Err(ContentError::Framing("multi-dimensional array of rank 0".into()));
        }
        let mut dims = Vec::with_capacity(rank.min(reader.remaining()));
        for _ in 0..rank {
            dims.push(reader.read_count()?);
        }
        let len = element_count(&dims)?;
        let mut data = Vec::with_capacity(len.min(reader.remaining()));
        for _ in 0..len {
            data.push(reader.read_member()?);
        }
        Ok(Self { dims, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TypeCatalog, Xnb};

    #[test]
    fn linear_indices_decompose_row_major() -> Result<()> {
        let dims = [2, 3, 4];
        assert_eq!(decompose(&dims, 23)?, [1, 2, 3]);
        assert_eq!(decompose(&dims, 0)?, [0, 0, 0]);
        assert_eq!(decompose(&dims, 5)?, [0, 1, 1]);
        assert!(matches!(
            decompose(&dims, 24),
            Err(ContentError::Corruption(_))
        ));
        Ok(())
    }

    #[test]
    fn decomposition_recombines() -> Result<()> {
        let grid = MultiArray::from_vec(vec![2, 3, 4], (0..24).collect::<Vec<i32>>())?;
        for linear in 0..24 {
            let indices = grid.indices_of(linear)?;
            assert_eq!(grid.get(&indices), Some(&(linear as i32)));
        }
        Ok(())
    }

    #[test]
    fn shape_mismatch_and_overflow_are_rejected() {
        assert!(MultiArray::from_vec(vec![2, 2], vec![1u8; 3]).is_err());
        assert!(matches!(
            MultiArray::<u8>::filled(vec![usize::MAX, 2], 0),
            Err(ContentError::Corruption(_))
        ));
    }

    #[test]
    fn grids_of_references_round_trip() -> Result<()> {
        let catalog = TypeCatalog::new();
        let cells: Vec<String> = (0..6).map(|i| format!("cell{i}")).collect();
        let grid = MultiArray::from_vec(vec![3, 2], cells)?;
        let bytes = Xnb::serialize(&catalog, &grid)?;
        let back: MultiArray<String> = Xnb::load_bytes(&catalog, &bytes)?;
        assert_eq!(back, grid);
        assert_eq!(back.get(&[2, 1]).map(String::as_str), Some("cell5"));
        Ok(())
    }
}
