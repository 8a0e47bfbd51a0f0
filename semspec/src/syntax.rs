use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOp {
    Measure,
    Regress,
    Cov,
    Threshold,
    Intercept,
}

impl ModelOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelOp::Measure => "=~",
            ModelOp::Regress => "~",
            ModelOp::Cov => "~~",
            ModelOp::Threshold => "|",
            ModelOp::Intercept => "~1",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Coef {
    Fixed(f64),
    Label(String),
}

impl Coef {
    pub fn label(name: impl Into<String>) -> Self {
        Coef::Label(name.into())
    }

    pub fn fixed_value(&self) -> Option<f64> {
        match self {
            Coef::Fixed(v) => Some(*v),
            Coef::Label(_) => None,
        }
    }

    pub fn label_name(&self) -> Option<&str> {
        match self {
            Coef::Fixed(_) => None,
            Coef::Label(l) => Some(l),
        }
    }

    fn render(&self) -> String {
        match self {
            Coef::Fixed(v) => format_number(*v),
            Coef::Label(l) => l.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    pub lhs: String,
    pub op: ModelOp,
    pub rhs: String,
    pub coefs: Vec<Coef>,
}

#[derive(Debug, Clone)]
pub struct DefineLine {
    pub name: String,
    pub expr: String,
}

#[derive(Debug, Clone)]
pub struct ModelSyntax {
    pub groups: Vec<String>,
    pub lines: Vec<Line>,
    pub defines: Vec<DefineLine>,
}

impl ModelSyntax {
    pub fn new(groups: Vec<String>) -> Self {
        Self {
            groups,
            lines: Vec::new(),
            defines: Vec::new(),
        }
    }

    pub fn push(&mut self, line: Line) -> Result<()> {
        if line.coefs.len() != self.groups.len() {
            return Err(anyhow::anyhow!(
                "{} {} {} has {} coefficients for {} groups",
                line.lhs,
                line.op.as_str(),
                line.rhs,
                line.coefs.len(),
                self.groups.len()
            ));
        }
        self.lines.push(line);
        Ok(())
    }

    pub fn define(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        self.defines.push(DefineLine {
            name: name.into(),
            expr: expr.into(),
        });
    }

    pub fn render(&self) -> String {
        let mut out = Vec::with_capacity(self.lines.len() + self.defines.len());
        for line in &self.lines {
            let coefs = line
                .coefs
                .iter()
                .map(Coef::render)
                .collect::<Vec<_>>()
                .join(",");
            let text = match line.op {
                ModelOp::Intercept => format!("{} ~ c({coefs})*1", line.lhs),
                op => format!("{} {} c({coefs})*{}", line.lhs, op.as_str(), line.rhs),
            };
            out.push(text);
        }
        for define in &self.defines {
            out.push(format!("{} := {}", define.name, define.expr));
        }
        out.join("\n")
    }
}

pub fn format_number(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        "NA".to_string()
    }
}
