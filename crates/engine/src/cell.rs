use serde::Serialize;

use crate::cell_id::CellId;
use crate::error::EvalError;
use crate::formula::tree::ExpressionTree;

/// What a raw edit string means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellInput {
    /// `-?[0-9]+` that fits in an `i64`
    Literal(i64),
    /// Anything else that does not start with `=`, including the empty string
    Label(String),
    /// Formula text with the leading `=` stripped and upper-cased
    Formula(String),
}

impl CellInput {
    pub fn classify(raw: &str) -> Self {
        if let Some(formula) = raw.strip_prefix('=') {
            return CellInput::Formula(formula.to_ascii_uppercase());
        }

        if is_integer(raw) {
            if let Ok(n) = raw.parse::<i64>() {
                return CellInput::Literal(n);
            }
        }

        CellInput::Label(raw.to_string())
    }
}

/// True for `-?[0-9]+`.
fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One grid location plus its slice of the dependency graph.
///
/// `dependencies` are the cells this cell's formula references; `adjacents`
/// are the cells whose formulas reference this one. The grid keeps the two
/// directions mirrored and the degree counters equal to the list lengths.
#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    pub(crate) value: i64,
    pub(crate) formula: String,
    pub(crate) input: String,
    pub(crate) expression: Option<ExpressionTree>,
    pub(crate) error: Option<EvalError>,
    pub(crate) in_degree: usize,
    pub(crate) in_degree_sort: usize,
    pub(crate) out_degree: usize,
    pub(crate) dependencies: Vec<CellId>,
    pub(crate) adjacents: Vec<CellId>,
}

impl Cell {
    pub fn new(id: CellId) -> Self {
        Self {
            id,
            value: 0,
            formula: String::new(),
            input: String::new(),
            expression: None,
            error: None,
            in_degree: 0,
            in_degree_sort: 0,
            out_degree: 0,
            dependencies: Vec::new(),
            adjacents: Vec::new(),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Display formula: rendered infix for formula cells, otherwise the text as entered.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// The raw text this cell was last set to.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn expression(&self) -> Option<&ExpressionTree> {
        self.expression.as_ref()
    }

    pub fn has_expression(&self) -> bool {
        self.expression.is_some()
    }

    pub fn error(&self) -> Option<EvalError> {
        self.error
    }

    pub fn in_degree(&self) -> usize {
        self.in_degree
    }

    pub fn out_degree(&self) -> usize {
        self.out_degree
    }

    pub fn dependencies(&self) -> &[CellId] {
        &self.dependencies
    }

    pub fn adjacents(&self) -> &[CellId] {
        &self.adjacents
    }

    /// True when the cell holds nothing: no text, no formula, value 0.
    pub fn is_blank(&self) -> bool {
        self.expression.is_none() && self.formula.is_empty() && self.value == 0
    }

    /// What a front-end shows in the grid: the text for literals and labels,
    /// the value (or error code) for formulas.
    pub fn display(&self) -> String {
        match (&self.expression, self.error) {
            (None, _) => self.formula.clone(),
            (Some(_), Some(err)) => err.code().to_string(),
            (Some(_), None) => self.value.to_string(),
        }
    }

    /// Text to put back in an editor: `=`-prefixed for formula cells.
    pub fn editable_text(&self) -> String {
        if self.expression.is_some() {
            format!("={}", self.formula)
        } else {
            self.formula.clone()
        }
    }

    /// Add `dep` to this cell's dependencies. Returns false if already present.
    pub(crate) fn add_dependency(&mut self, dep: CellId) -> bool {
        if self.dependencies.contains(&dep) {
            return false;
        }
        self.dependencies.push(dep);
        self.in_degree += 1;
        self.in_degree_sort += 1;
        true
    }

    /// Add `dependent` to this cell's adjacents. Returns false if already present.
    pub(crate) fn add_adjacent(&mut self, dependent: CellId) -> bool {
        if self.adjacents.contains(&dependent) {
            return false;
        }
        self.adjacents.push(dependent);
        self.out_degree += 1;
        true
    }

    pub(crate) fn remove_adjacent(&mut self, dependent: CellId) {
        if let Some(pos) = self.adjacents.iter().position(|c| *c == dependent) {
            self.adjacents.remove(pos);
            self.out_degree -= 1;
        }
    }

    /// Drop every dependency edge (the caller fixes up the other direction).
    pub(crate) fn clear_dependencies(&mut self) -> Vec<CellId> {
        self.in_degree = 0;
        self.in_degree_sort = 0;
        std::mem::take(&mut self.dependencies)
    }

    pub(crate) fn reset_in_degree_sort(&mut self) {
        self.in_degree_sort = self.in_degree;
    }

    /// Back to the state the cell had when the grid was created.
    pub(crate) fn reset(&mut self) {
        *self = Cell::new(self.id);
    }
}

/// Serializable view of a non-blank cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSnapshot {
    pub cell: String,
    pub row: usize,
    pub col: usize,
    pub input: String,
    pub formula: String,
    pub display: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        Self {
            cell: cell.id.to_string(),
            row: cell.id.row,
            col: cell.id.col,
            input: cell.input.clone(),
            formula: cell.formula.clone(),
            display: cell.display(),
            value: cell.value,
            error: cell.error.map(|e| e.code()),
        }
    }
}
