// Property-based tests for formula evaluation and the edit protocol.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;

use knockoff_engine::formula::compile;
use knockoff_engine::{CellId, EngineError, Grid};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

const SIZE: usize = 3;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Flat arithmetic over positive literals: `7*3-12/5+1`.
fn arb_flat_formula() -> impl Strategy<Value = (i64, Vec<(char, i64)>)> {
    (
        1..100i64,
        prop::collection::vec((prop::sample::select(vec!['+', '-', '*', '/']), 1..100i64), 0..6),
    )
}

/// Arithmetic over literals and cell references, with explicit grouping.
#[derive(Debug, Clone)]
enum Expr {
    Lit(i64),
    Ref(CellId),
    Group(Box<Expr>),
    Bin(char, Box<Expr>, Box<Expr>),
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (0..100i64).prop_map(Expr::Lit),
        arb_cell().prop_map(Expr::Ref),
    ];
    leaf.prop_recursive(5, 48, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Group(Box::new(e))),
            (
                prop::sample::select(vec!['+', '-', '*', '/']),
                inner.clone(),
                inner,
            )
                .prop_map(|(op, l, r)| Expr::Bin(op, Box::new(l), Box::new(r))),
        ]
    })
}

fn arb_cell() -> impl Strategy<Value = CellId> {
    (0..SIZE, 0..SIZE).prop_map(|(row, col)| CellId::new(row, col))
}

/// One edit: a literal when `refs` is empty, otherwise `=` plus the refs summed.
fn arb_edit() -> impl Strategy<Value = (CellId, String)> {
    (
        arb_cell(),
        prop::collection::vec(arb_cell(), 0..4),
        -50..50i64,
    )
        .prop_map(|(target, refs, literal)| {
            let input = if refs.is_empty() {
                literal.to_string()
            } else {
                let names: Vec<String> = refs.iter().map(|c| c.to_string()).collect();
                format!("={}+{}", names.join("+"), literal.abs())
            };
            (target, input)
        })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn formula_text(first: i64, rest: &[(char, i64)]) -> String {
    let mut text = first.to_string();
    for (op, n) in rest {
        text.push(*op);
        text.push_str(&n.to_string());
    }
    text
}

/// Two-level precedence, left to right within a level, truncating division.
fn reference_eval(first: i64, rest: &[(char, i64)]) -> i64 {
    let mut terms: Vec<(char, i64)> = Vec::new();
    let mut sign = '+';
    let mut term = first;

    for &(op, n) in rest {
        match op {
            '*' => term *= n,
            '/' => term /= n,
            _ => {
                terms.push((sign, term));
                sign = op;
                term = n;
            }
        }
    }
    terms.push((sign, term));

    terms
        .into_iter()
        .fold(0, |acc, (sign, t)| if sign == '-' { acc - t } else { acc + t })
}

fn priority(expr: &Expr) -> u8 {
    match expr {
        Expr::Bin('+' | '-', _, _) => 1,
        Expr::Bin(_, _, _) => 2,
        _ => 3,
    }
}

/// Infix text that keeps the tree's shape: operands are parenthesized only
/// where precedence or left associativity would regroup them, plus every
/// explicit `Group`.
fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Lit(n) => n.to_string(),
        Expr::Ref(id) => id.to_string(),
        Expr::Group(inner) => format!("({})", expr_text(inner)),
        Expr::Bin(op, left, right) => {
            let p = priority(expr);
            let mut l = expr_text(left);
            if priority(left) < p {
                l = format!("({})", l);
            }
            let mut r = expr_text(right);
            if priority(right) <= p {
                r = format!("({})", r);
            }
            format!("{}{}{}", l, op, r)
        }
    }
}

fn ref_count(expr: &Expr) -> usize {
    match expr {
        Expr::Lit(_) => 0,
        Expr::Ref(_) => 1,
        Expr::Group(inner) => ref_count(inner),
        Expr::Bin(_, left, right) => ref_count(left) + ref_count(right),
    }
}

/// Evaluate the tree directly; `None` on division by zero or overflow.
fn expr_eval(expr: &Expr, values: &[i64]) -> Option<i64> {
    match expr {
        Expr::Lit(n) => Some(*n),
        Expr::Ref(id) => Some(values[id.row * SIZE + id.col]),
        Expr::Group(inner) => expr_eval(inner, values),
        Expr::Bin(op, left, right) => {
            let l = expr_eval(left, values)?;
            let r = expr_eval(right, values)?;
            match op {
                '+' => l.checked_add(r),
                '-' => l.checked_sub(r),
                '*' => l.checked_mul(r),
                _ => l.checked_div(r),
            }
        }
    }
}

fn displays(grid: &Grid) -> Vec<String> {
    (0..SIZE)
        .flat_map(|row| (0..SIZE).map(move |col| (row, col)))
        .map(|(row, col)| grid.get_cell_display(row, col))
        .collect()
}

fn check_symmetry(grid: &Grid) -> Result<(), TestCaseError> {
    for cell in grid.cells() {
        let id = cell.id();
        for dep in grid.precedents(id) {
            prop_assert!(grid.dependents(*dep).contains(&id), "{} missing from dependents of {}", id, dep);
        }
        for adj in grid.dependents(id) {
            prop_assert!(grid.precedents(*adj).contains(&id), "{} missing from precedents of {}", id, adj);
        }
        prop_assert_eq!(cell.in_degree(), grid.precedents(id).len());
        prop_assert_eq!(cell.out_degree(), grid.dependents(id).len());
    }
    Ok(())
}

// ===========================================================================
// Formula properties
// ===========================================================================

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn precedence_matches_reference((first, rest) in arb_flat_formula()) {
        let text = formula_text(first, &rest);
        let tree = compile(&text).unwrap();
        let value = tree.evaluate(|_| Ok(0)).unwrap();
        prop_assert_eq!(value, reference_eval(first, &rest), "formula {}", text);

        // Without parentheses the rendering is the input itself
        prop_assert_eq!(tree.render(), text);
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn grouping_matches_reference(
        expr in arb_expr(),
        values in prop::collection::vec(-20..20i64, SIZE * SIZE),
    ) {
        let text = expr_text(&expr);
        let tree = compile(&text).unwrap();
        let value = tree.evaluate(|id| Ok(values[id.row * SIZE + id.col])).ok();
        prop_assert_eq!(value, expr_eval(&expr, &values), "formula {}", text);

        prop_assert_eq!(tree.references().count(), ref_count(&expr));
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn literal_round_trip(n in any::<i64>()) {
        let mut grid = Grid::new(1);
        let text = n.to_string();
        grid.set_cell_formula(0, 0, &text).unwrap();

        prop_assert_eq!(grid.get_cell_value(0, 0), Some(n));
        prop_assert_eq!(grid.get_cell_display(0, 0), text);
        prop_assert!(!grid.has_formula(0, 0));
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn address_round_trip(row in 0..100_000usize, col in 0..1_000_000usize) {
        let id = CellId::new(row, col);
        let text = id.to_string();
        let parsed: CellId = text.parse().unwrap();
        prop_assert_eq!(parsed, id);

        let lower: CellId = text.to_ascii_lowercase().parse().unwrap();
        prop_assert_eq!(lower, id);
    }
}

// ===========================================================================
// Edit protocol properties
// ===========================================================================

proptest! {
    #![proptest_config(config_128())]
    #[test]
    fn dependency_symmetry(edits in prop::collection::vec(arb_edit(), 1..30)) {
        let mut grid = Grid::new(SIZE);
        for (target, input) in &edits {
            let _ = grid.set_cell(*target, input);
            check_symmetry(&grid)?;
        }
    }
}

proptest! {
    #![proptest_config(config_128())]
    #[test]
    fn cycle_rollback_restores_grid(edits in prop::collection::vec(arb_edit(), 1..30)) {
        let mut grid = Grid::new(SIZE);
        for (target, input) in &edits {
            let before = displays(&grid);
            let formulas_before = grid.formulas_table();

            match grid.set_cell(*target, input) {
                Err(EngineError::Cycle(report)) => {
                    prop_assert!(!report.cells.is_empty());
                    prop_assert!(report.visited < report.total);
                    prop_assert_eq!(displays(&grid), before);
                    prop_assert_eq!(grid.formulas_table(), formulas_before);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                Ok(()) => {}
            }

            // Whatever happened, the grid is acyclic afterwards
            prop_assert!(grid.evaluation_order().is_ok());
        }
    }
}

// ===========================================================================
// Examples
// ===========================================================================

#[test]
fn snapshot_serializes_to_json() {
    let mut grid = Grid::new(2);
    grid.set_cell_formula(0, 0, "5").unwrap();
    let _ = grid.set_cell_formula(1, 1, "=A0/0");

    let json = serde_json::to_value(grid.snapshot()).unwrap();
    let cells = json.as_array().unwrap();
    assert_eq!(cells.len(), 2);
    assert_eq!(cells[0]["cell"], "A0");
    assert_eq!(cells[0]["value"], 5);
    assert!(cells[0].get("error").is_none());
    assert_eq!(cells[1]["cell"], "B1");
    assert_eq!(cells[1]["error"], "#DIV/0!");
    assert_eq!(cells[1]["display"], "#DIV/0!");
}

#[test]
fn deep_formula_through_grid() {
    let mut grid = Grid::new(2);
    let depth = 50_000;
    let text = format!("={}1{}", "(".repeat(depth), "+1)".repeat(depth));

    grid.set_cell_formula(0, 0, &text).unwrap();
    assert_eq!(grid.get_cell_value(0, 0), Some(depth as i64 + 1));
}
