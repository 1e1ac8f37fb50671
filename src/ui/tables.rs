//! Box-drawing text tables for code-block replies.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A grid table with double rules around the header. Cells may span several lines.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let aligns = vec![Align::Left; headers.len()];
        Self { headers, aligns, rows: Vec::new() }
    }

    pub fn align(mut self, column: usize, align: Align) -> Self {
        if let Some(a) = self.aligns.get_mut(column) {
            *a = align;
        }
        self
    }

    pub fn row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut cells: Vec<String> = cells.into_iter().map(Into::into).collect();
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| cell_width(h)).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell_width(cell));
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = Vec::new();
        out.push(rule(&widths, '╒', '═', '╤', '╕'));
        push_cells(&mut out, &self.headers, &widths, &self.aligns);
        if self.rows.is_empty() {
            out.push(rule(&widths, '╘', '═', '╧', '╛'));
            return out.join("\n");
        }
        out.push(rule(&widths, '╞', '═', '╪', '╡'));
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                out.push(rule(&widths, '├', '─', '┼', '┤'));
            }
            push_cells(&mut out, row, &widths, &self.aligns);
        }
        out.push(rule(&widths, '╘', '═', '╧', '╛'));
        out.join("\n")
    }
}

fn cell_width(cell: &str) -> usize {
    cell.lines().map(|l| l.chars().count()).max().unwrap_or(0)
}

fn rule(widths: &[usize], left: char, fill: char, join: char, right: char) -> String {
    let mut s = String::new();
    s.push(left);
    for (i, w) in widths.iter().enumerate() {
        if i > 0 {
            s.push(join);
        }
        s.extend(std::iter::repeat(fill).take(w + 2));
    }
    s.push(right);
    s
}

fn push_cells(out: &mut Vec<String>, cells: &[String], widths: &[usize], aligns: &[Align]) {
    let split: Vec<Vec<&str>> = cells.iter().map(|c| c.lines().collect()).collect();
    let height = split.iter().map(Vec::len).max().unwrap_or(0).max(1);
    for line in 0..height {
        let mut s = String::from("│");
        for (col, w) in widths.iter().enumerate() {
            let text = split.get(col).and_then(|c| c.get(line)).copied().unwrap_or("");
            let pad = w - text.chars().count();
            let padded = match aligns.get(col).copied().unwrap_or(Align::Left) {
                Align::Left => format!(" {text}{} ", " ".repeat(pad)),
                Align::Right => format!(" {}{text} ", " ".repeat(pad)),
            };
            s.push_str(&padded);
            s.push('│');
        }
        out.push(s);
    }
}
