use std::collections::HashMap;

use crate::syntax::{Coef, Line, ModelOp, ModelSyntax};
use crate::types::ParTableRow;

pub fn par_table(syntax: &ModelSyntax) -> Vec<ParTableRow> {
    let mut rows = Vec::new();
    let mut label_map: HashMap<String, usize> = HashMap::new();

    for group in 0..syntax.groups.len() {
        for line in &syntax.lines {
            let Some(coef) = line.coefs.get(group) else {
                continue;
            };
            let (free, label, ustart) = match coef {
                Coef::Fixed(v) => (0, None, *v),
                Coef::Label(l) => {
                    let next = label_map.len() + 1;
                    let idx = *label_map.entry(l.clone()).or_insert(next);
                    (idx, Some(l.clone()), default_start(line))
                }
            };
            let (op, rhs) = match line.op {
                ModelOp::Intercept => ("~1".to_string(), String::new()),
                op => (op.as_str().to_string(), line.rhs.clone()),
            };
            rows.push(ParTableRow {
                lhs: line.lhs.clone(),
                op,
                rhs,
                group: group + 1,
                free,
                label,
                ustart,
                est: f64::NAN,
                se: f64::NAN,
            });
        }
    }

    for define in &syntax.defines {
        rows.push(ParTableRow {
            lhs: define.name.clone(),
            op: ":=".to_string(),
            rhs: define.expr.clone(),
            group: 0,
            free: 0,
            label: Some(define.name.clone()),
            ustart: f64::NAN,
            est: f64::NAN,
            se: f64::NAN,
        });
    }

    rows
}

pub fn free_count(rows: &[ParTableRow]) -> usize {
    rows.iter().map(|r| r.free).max().unwrap_or(0)
}

fn default_start(line: &Line) -> f64 {
    match line.op {
        ModelOp::Cov => {
            if line.lhs == line.rhs {
                1.0
            } else {
                0.0
            }
        }
        ModelOp::Threshold | ModelOp::Intercept => 0.0,
        _ => 0.5,
    }
}
