use isel::{
    IndexError, IndexKey, IndexOptions, Indexer, IndexerKind, Key, KeyBuilder, SliceSpec, Variable,
};
use quickcheck::quickcheck;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn no_collapse() -> IndexOptions {
    IndexOptions {
        collapse_leading_singleton: false,
    }
}

fn arange(dims: &[&str], shape: &[usize]) -> Variable<i32> {
    let size: usize = shape.iter().product();
    let data = (0..size).map(|i| i32::try_from(i).unwrap()).collect();
    Variable::new(dims.iter().copied(), shape, data).unwrap()
}

fn window(positions: &[i64]) -> Variable<i64> {
    Variable::new(["window", "idx"], &[1, positions.len()], positions.to_vec()).unwrap()
}

#[test]
fn test_window_indexer_takes_the_outer_path() {
    init_logging();
    let a = arange(&["t", "y", "x"], &[6, 4, 5]);
    let c = a
        .broadcast_indexes(&Key::default().idx(window(&[0, 2, 4])))
        .unwrap();
    assert_eq!(c.indexer.kind(), IndexerKind::Outer);
    assert_eq!(c.dims, vec!["idx", "y", "x"]);
    assert!(c.permutation.is_none());
}

#[test]
fn test_wide_window_is_vectorized() {
    init_logging();
    let a = arange(&["t", "y"], &[6, 4]);
    let idx = Variable::new(["window", "idx"], &[2, 3], vec![0_i64, 1, 2, 3, 4, 5]).unwrap();
    let c = a.broadcast_indexes(&Key::default().idx(idx.clone())).unwrap();
    let Indexer::Vectorized(v) = &c.indexer else {
        panic!("expected a vectorized indexer, got {:?}", c.indexer.kind());
    };
    assert_eq!(v.shape, vec![2, 3]);

    let r = a.isel1("t", idx).unwrap();
    assert_eq!(r.dims(), &["window", "idx", "y"]);
    assert_eq!(r.shape(), &[2, 3, 4]);
    assert_eq!(r.values(), (0..24).collect::<Vec<_>>());
}

#[test]
fn test_collapsed_matches_vectorized() {
    init_logging();
    let a = arange(&["t", "y", "x"], &[6, 4, 5]);
    let idx = window(&[5, 0, 3]);
    let collapsed = a.isel1("t", idx.clone()).unwrap();
    let forced = a
        .isel_with([("t", IndexKey::from(idx))], &no_collapse())
        .unwrap();
    assert_eq!(forced.dims(), &["window", "idx", "y", "x"]);
    assert_eq!(forced.shape(), &[1, 3, 4, 5]);
    assert_eq!(collapsed.shape(), &[3, 4, 5]);
    assert_eq!(collapsed.values(), forced.values());
    assert_eq!(forced.isel1("window", 0_i64).unwrap(), collapsed);
}

#[test]
fn test_window_over_first_axis() {
    init_logging();
    let a = arange(&["x", "y"], &[5, 7]);
    let r = a.isel1("x", window(&[1, 2, 3])).unwrap();
    assert_eq!(r.dims(), &["idx", "y"]);
    assert_eq!(r.shape(), &[3, 7]);
    assert_eq!(r.values(), (7..28).collect::<Vec<_>>());
    assert!(!r.data().shares_buffer_with(a.data()));
}

#[test]
fn test_window_over_middle_axis() {
    init_logging();
    let a = arange(&["x", "y", "z"], &[2, 5, 3]);
    let r = a.isel1("y", window(&[4, 0])).unwrap();
    assert_eq!(r.dims(), &["x", "idx", "z"]);
    assert_eq!(
        r.values(),
        vec![12, 13, 14, 0, 1, 2, 27, 28, 29, 15, 16, 17]
    );
}

#[test]
fn test_footprint_does_not_scale_with_untouched_dims() {
    init_logging();
    let key = Key::default().idx(window(&[0, 1, 2, 3, 4]));
    let footprint = |shape: &[usize], options: &IndexOptions| {
        arange(&["t", "y", "x"], shape)
            .broadcast_indexes_with(&key, options)
            .unwrap()
            .indexer
            .index_footprint()
    };
    let options = IndexOptions::default();
    assert_eq!(footprint(&[10, 4, 6], &options), 5);
    assert_eq!(footprint(&[10, 40, 60], &options), 5);

    let small = footprint(&[10, 4, 6], &no_collapse());
    let large = footprint(&[10, 40, 60], &no_collapse());
    assert!(small >= 5 * 4 * 6);
    assert!(large > 50 * small);
}

#[test]
fn test_ambiguous_dimension() {
    init_logging();
    let a = arange(&["x", "y"], &[3, 4]);
    let idx = Variable::new(["x", "window"], &[2, 2], vec![0_i64, 1, 2, 3]).unwrap();
    let err = a.isel1("y", idx).unwrap_err();
    assert_eq!(
        err,
        IndexError::DimensionAmbiguity {
            dim: "x".to_string(),
            indexed: "y".to_string()
        }
    );
}

#[test]
fn test_basic_selection_is_a_view() {
    init_logging();
    let a = arange(&["x", "y"], &[4, 3]);
    let r = a
        .at(&Key::default().idx(SliceSpec::full().with_step(-1)).idx(1_i64))
        .unwrap();
    assert_eq!(r.dims(), &["x"]);
    assert_eq!(r.values(), vec![10, 7, 4, 1]);
    assert!(r.data().shares_buffer_with(a.data()));
}

#[test]
fn test_errors_leave_nothing_behind() {
    init_logging();
    let a = arange(&["x", "y"], &[4, 3]);
    assert_eq!(
        a.isel1("y", vec![0_i64, 3]).unwrap_err(),
        IndexError::OutOfBounds {
            dim: "y".to_string(),
            index: 3,
            size: 3
        }
    );
    assert_eq!(
        a.isel1("z", 0_i64).unwrap_err(),
        IndexError::MissingDims(vec!["z".to_string()])
    );
    assert_eq!(a, arange(&["x", "y"], &[4, 3]));
}

quickcheck! {
    fn collapsed_equals_forced_vectorized(t: u8, y: u8, x: u8, picks: Vec<u8>) -> bool {
        let (t, y, x) = (usize::from(t % 6) + 1, usize::from(y % 4) + 1, usize::from(x % 4) + 1);
        let positions: Vec<i64> = picks.iter().map(|&p| i64::from(p) % t as i64).collect();
        let a = arange(&["y", "t", "x"], &[y, t, x]);
        let idx = window(&positions);

        let collapsed = a.isel1("t", idx.clone()).unwrap();
        let forced = a.isel_with([("t", IndexKey::from(idx))], &no_collapse()).unwrap();
        collapsed.dims() == ["y", "idx", "x"]
            && forced.dims() == ["y", "window", "idx", "x"]
            && collapsed.shape() == [y, positions.len(), x]
            && collapsed.values() == forced.values()
    }
}
