use crate::error::{IndexError, Result};

/// The common shape of a set of named operands, and how each operand maps onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    /// Union of the operands' dimension names, in first-seen order.
    pub dims: Vec<String>,
    /// Length of each of `dims`.
    pub shape: Vec<usize>,
    /// For each operand, for each broadcast axis, the operand axis that feeds it,
    /// or `None` if the operand is stretched along that axis.
    pub maps: Vec<Vec<Option<usize>>>,
}

/// Align operands by dimension name and broadcast them against each other.
///
/// Every operand is given as its dimension names and shape. A length of 1 stretches to
/// whatever length the other operands have for the same name; any other disagreement is an error.
/// Operands without dimensions are scalars and broadcast against anything.
///
/// # Errors
/// [`IndexError::BroadcastShape`] if two operands give different lengths (neither 1) to one name.
pub fn broadcast_dims<S: AsRef<str>>(operands: &[(&[S], &[usize])]) -> Result<Broadcast> {
    let mut dims: Vec<String> = Vec::new();
    let mut shape: Vec<usize> = Vec::new();
    for (names, sizes) in operands {
        debug_assert_eq!(names.len(), sizes.len());
        for (name, &size) in names.iter().zip(sizes.iter()) {
            let name = name.as_ref();
            match dims.iter().position(|d| d == name) {
                None => {
                    dims.push(name.to_string());
                    shape.push(size);
                }
                Some(k) if shape[k] == size || size == 1 => {}
                Some(k) if shape[k] == 1 => shape[k] = size,
                Some(k) => {
                    return Err(IndexError::BroadcastShape {
                        dim: name.to_string(),
                        left: shape[k],
                        right: size,
                    })
                }
            }
        }
    }
    let maps = operands
        .iter()
        .map(|(names, _)| {
            dims.iter()
                .map(|d| names.iter().position(|n| n.as_ref() == d))
                .collect()
        })
        .collect();
    log::trace!("broadcast {} operands to {dims:?} {shape:?}", operands.len());
    Ok(Broadcast { dims, shape, maps })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_operand_is_identity() {
        let b = broadcast_dims(&[(&["window", "x"][..], &[1, 3][..])]).unwrap();
        assert_eq!(b.dims, vec!["window", "x"]);
        assert_eq!(b.shape, vec![1, 3]);
        assert_eq!(b.maps, vec![vec![Some(0), Some(1)]]);
    }

    #[test]
    fn test_union_in_first_seen_order() {
        let b = broadcast_dims(&[
            (&["a", "b"][..], &[2, 1][..]),
            (&["c", "b"][..], &[4, 3][..]),
            (&[][..], &[][..]),
        ])
        .unwrap();
        assert_eq!(b.dims, vec!["a", "b", "c"]);
        assert_eq!(b.shape, vec![2, 3, 4]);
        assert_eq!(
            b.maps,
            vec![
                vec![Some(0), Some(1), None],
                vec![None, Some(1), Some(0)],
                vec![None, None, None],
            ]
        );
    }

    #[test]
    fn test_size_one_stretches_either_way() {
        let b = broadcast_dims(&[(&["p"][..], &[5][..]), (&["p"][..], &[1][..])]).unwrap();
        assert_eq!(b.shape, vec![5]);
        let b = broadcast_dims(&[(&["p"][..], &[1][..]), (&["p"][..], &[5][..])]).unwrap();
        assert_eq!(b.shape, vec![5]);
    }

    #[test]
    fn test_mismatch() {
        let err = broadcast_dims(&[(&["p"][..], &[5][..]), (&["p"][..], &[3][..])]).unwrap_err();
        assert_eq!(
            err,
            IndexError::BroadcastShape {
                dim: "p".to_string(),
                left: 5,
                right: 3
            }
        );
    }
}
