use std::time::Instant;

use isel::{IndexKey, IndexOptions, Key, KeyBuilder, Variable};

/// A macro to print an expression, evaluate it, and bind the result to a variable.
macro_rules! let_example {
    ($t:ident, $e:expr) => {
        println!(">>> {}", stringify!(let $t = $e));
        let $t = $e;
    };
}

const SHAPE: [usize; 3] = [100, 180, 360];
const WINDOW: usize = 50;

fn megabytes(bytes: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let bytes = bytes as f64;
    bytes / (1024.0 * 1024.0)
}

fn select(
    data: &Variable<f32>,
    index: &Variable<i64>,
    options: &IndexOptions,
) -> isel::Result<Variable<f32>> {
    let classified = data.broadcast_indexes_with(&Key::default().idx(index.clone()), options)?;
    println!(
        "{:?} indexer, index footprint {:.2} MB",
        classified.indexer.kind(),
        megabytes(classified.indexer.index_footprint() * std::mem::size_of::<usize>())
    );
    data.isel_with([("t", IndexKey::from(index.clone()))], options)
}

fn main() -> isel::Result<()> {
    env_logger::init();
    let options = IndexOptions {
        collapse_leading_singleton: std::env::var_os("ISEL_NO_COLLAPSE").is_none(),
    };
    println!("collapse leading singleton: {}", options.collapse_leading_singleton);

    let size: usize = SHAPE.iter().product();
    let_example!(var, Variable::new(["t", "y", "x"], &SHAPE, vec![0.0_f32; size])?);
    let positions: Vec<i64> = (0..i64::try_from(WINDOW).unwrap_or(i64::MAX)).collect();
    let_example!(index, Variable::new(["window", "t"], &[1, WINDOW], positions)?);

    let start = Instant::now();
    let result = select(&var, &index, &options)?;
    println!("result sizes: {:?}", result.sizes());
    println!(
        "result {:.2} MB in {:.2?}",
        megabytes(result.size() * std::mem::size_of::<f32>()),
        start.elapsed()
    );

    println!("\n=== several variables ===\n");
    let vars = (0..5)
        .map(|_| Variable::new(["t", "y", "x"], &SHAPE, vec![0.0_f32; size]))
        .collect::<isel::Result<Vec<_>>>()?;
    let start = Instant::now();
    for (i, var) in vars.iter().enumerate() {
        let result = select(var, &index, &options)?;
        println!("var{i}: {:?}", result.sizes());
    }
    println!("total {:.2?}", start.elapsed());
    Ok(())
}
