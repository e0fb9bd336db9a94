use std::{
    fmt::{Display, Formatter},
    sync::OnceLock,
};

use prettytable::{format, Cell, Table};

use crate::{cpu_array::CpuArray, variable::Variable};

fn get_pretty_format() -> &'static format::TableFormat {
    static FORMAT: OnceLock<format::TableFormat> = OnceLock::new();
    FORMAT.get_or_init(|| {
        format::FormatBuilder::new()
            .column_separator(' ')
            .borders('│')
            .separators(
                &[format::LinePosition::Top],
                format::LineSeparator::new(' ', ' ', '┌', '┐'),
            )
            .separators(
                &[format::LinePosition::Bottom],
                format::LineSeparator::new(' ', ' ', '└', '┘'),
            )
            .padding(1, 1)
            .build()
    })
}

fn get_single_line_format() -> &'static format::TableFormat {
    static FORMAT: OnceLock<format::TableFormat> = OnceLock::new();
    FORMAT.get_or_init(|| {
        format::FormatBuilder::new()
            .column_separator(' ')
            .left_border('[')
            .right_border(']')
            .padding(1, 0)
            .build()
    })
}

fn format_element<T: Display>(value: T, precision: Option<usize>) -> String {
    match precision {
        Some(precision) => format!("{value:.precision$}"),
        None => format!("{value}"),
    }
}

fn nested<T: Display + Copy>(array: &CpuArray<T>, precision: Option<usize>) -> Cell {
    let mut table = Table::new();
    create_table(array, &mut table, precision);
    Cell::new(&format!("{table}"))
}

// Rows and columns come from the first two axes, the rest is rendered inside each cell.
// An odd number of axes puts the first one on a single line.
fn create_table<T: Display + Copy>(array: &CpuArray<T>, table: &mut Table, precision: Option<usize>) {
    let shape = array.shape().to_vec();
    match shape.len() {
        0 => {
            table.set_format(*get_single_line_format());
            table
                .add_empty_row()
                .add_cell(Cell::new(&format_element(array.get(&[]), precision)));
        }
        1 => {
            table.set_format(*get_single_line_format());
            let row = table.add_empty_row();
            for c in 0..shape[0] {
                row.add_cell(Cell::new(&format_element(array.get(&[c]), precision)));
            }
        }
        2 => {
            table.set_format(if shape[0] == 1 {
                *get_single_line_format()
            } else {
                *get_pretty_format()
            });
            for r in 0..shape[0] {
                let row = table.add_empty_row();
                for c in 0..shape[1] {
                    row.add_cell(Cell::new(&format_element(array.get(&[r, c]), precision)));
                }
            }
        }
        n if n % 2 == 1 => {
            table.set_format(*get_single_line_format());
            let row = table.add_empty_row();
            for c in 0..shape[0] {
                row.add_cell(nested(&array.index_axis(0, c), precision));
            }
        }
        _ => {
            table.set_format(*get_pretty_format());
            for r in 0..shape[0] {
                let row = table.add_empty_row();
                let sub = array.index_axis(0, r);
                for c in 0..shape[1] {
                    row.add_cell(nested(&sub.index_axis(0, c), precision));
                }
            }
        }
    }
}

impl<T: Display + Copy> Display for Variable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sizes: Vec<String> = self
            .sizes()
            .iter()
            .map(|(dim, len)| format!("{dim}: {len}"))
            .collect();
        writeln!(f, "<Variable ({})>", sizes.join(", "))?;
        let mut table = Table::new();
        create_table(self.data(), &mut table, f.precision());
        write!(f, "{table}")
    }
}

#[cfg(test)]
mod tests {
    use crate::variable::Variable;

    #[test]
    fn test_header_and_values() {
        let v = Variable::new(["x", "y"], &[2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
        let s = format!("{v}");
        assert!(s.starts_with("<Variable (x: 2, y: 3)>\n"));
        for value in 1..=6 {
            assert!(s.contains(&value.to_string()));
        }
    }

    #[test]
    fn test_precision_and_scalar() {
        let v = Variable::new(["p"], &[2], vec![0.5_f64, 1.25]).unwrap();
        let s = format!("{v:.1}");
        assert!(s.contains("0.5"));
        assert!(s.contains("1.2") || s.contains("1.3"));
        assert!(format!("{}", Variable::scalar(7)).starts_with("<Variable ()>\n"));
    }

    #[test]
    fn test_odd_rank_nests() {
        let v = Variable::new(["a", "b", "c"], &[2, 2, 2], (0..8).collect::<Vec<i32>>()).unwrap();
        let s = format!("{v}");
        assert!(s.contains('7'));
        assert!(s.contains('['));
    }
}
