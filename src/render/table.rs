//! ASCII tables in the texttable layout.
//!
//! ```text
//! +----+----------+
//! | ID |   Name   |
//! +====+==========+
//! |  1 | Imaging  |
//! +----+----------+
//! ```
//!
//! Headers are centred (extra space goes to the right), cells are aligned
//! per column, and every row is followed by a rule.

use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub struct Table {
    header: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

fn width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

impl Table {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>, align: Vec<Align>) -> Self {
        let header: Vec<String> = header
            .into_iter()
            .map(|title| single_line(&Into::<String>::into(title)))
            .collect();
        let mut align = align;
        align.resize(header.len(), Align::Left);
        Self {
            header,
            align,
            rows: Vec::new(),
        }
    }

    /// Adds a row; missing cells are blank and extra cells are dropped.
    pub fn add_row(&mut self, cells: Vec<String>) {
        let mut row: Vec<String> = cells.iter().map(|c| single_line(c)).collect();
        row.resize(self.header.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .map(|(col, title)| {
                self.rows
                    .iter()
                    .map(|row| width(&row[col]))
                    .chain(std::iter::once(width(title)))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn rule(widths: &[usize], fill: char) -> String {
        let mut line = String::from("+");
        for w in widths {
            line.extend(std::iter::repeat(fill).take(w + 2));
            line.push('+');
        }
        line
    }

    fn line<F>(cells: &[String], widths: &[usize], pad: F) -> String
    where
        F: Fn(usize, &str, usize) -> (usize, usize),
    {
        let mut line = String::from("|");
        for (col, (cell, w)) in cells.iter().zip(widths).enumerate() {
            let fill = w - width(cell);
            let (left, right) = pad(col, cell, fill);
            line.push(' ');
            line.push_str(&" ".repeat(left));
            line.push_str(cell);
            line.push_str(&" ".repeat(right));
            line.push_str(" |");
        }
        line
    }

    /// The table as lines joined by `\n`, without a trailing newline.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let border = Self::rule(&widths, '-');

        let mut lines = vec![border.clone()];
        lines.push(Self::line(&self.header, &widths, |_, _, fill| {
            (fill / 2, fill - fill / 2)
        }));
        lines.push(Self::rule(&widths, '='));
        for row in &self.rows {
            lines.push(Self::line(row, &widths, |col, _, fill| match self.align[col] {
                Align::Left => (0, fill),
                Align::Right => (fill, 0),
            }));
            lines.push(border.clone());
        }
        lines.join("\n")
    }
}
