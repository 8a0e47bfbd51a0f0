use semspec::partable::{free_count, par_table};
use semspec::syntax::{Coef, Line, ModelOp, ModelSyntax};
use semspec::types::{
    DefinedEstimate, Estimator, FitStats, ParamEstimate, Parameterization, SemFit,
};
use semspec::FitRequest;

fn two_group_model() -> ModelSyntax {
    let mut syntax = ModelSyntax::new(vec!["MZ".to_string(), "DZ".to_string()]);
    syntax
        .push(Line {
            lhs: "A1".to_string(),
            op: ModelOp::Measure,
            rhs: "P1".to_string(),
            coefs: vec![Coef::label("a"), Coef::label("a")],
        })
        .expect("push loading");
    syntax
        .push(Line {
            lhs: "A1".to_string(),
            op: ModelOp::Cov,
            rhs: "A2".to_string(),
            coefs: vec![Coef::Fixed(1.0), Coef::Fixed(0.5)],
        })
        .expect("push covariance");
    syntax
        .push(Line {
            lhs: "P1".to_string(),
            op: ModelOp::Intercept,
            rhs: String::new(),
            coefs: vec![Coef::label("mu"), Coef::label("mu")],
        })
        .expect("push intercept");
    syntax.define("a2", "a^2");
    syntax
}

#[test]
fn render_group_vectors() {
    let text = two_group_model().render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "A1 =~ c(a,a)*P1");
    assert_eq!(lines[1], "A1 ~~ c(1,0.5)*A2");
    assert_eq!(lines[2], "P1 ~ c(mu,mu)*1");
    assert_eq!(lines[3], "a2 := a^2");
}

#[test]
fn push_rejects_wrong_group_count() {
    let mut syntax = ModelSyntax::new(vec!["MZ".to_string(), "DZ".to_string()]);
    let err = syntax.push(Line {
        lhs: "P1".to_string(),
        op: ModelOp::Cov,
        rhs: "P1".to_string(),
        coefs: vec![Coef::label("e2")],
    });
    assert!(err.is_err());
    assert!(syntax.lines.is_empty());
}

#[test]
fn shared_labels_share_free_index() {
    let rows = par_table(&two_group_model());
    let loadings: Vec<_> = rows.iter().filter(|r| r.op == "=~").collect();
    assert_eq!(loadings.len(), 2);
    assert_eq!(loadings[0].free, loadings[1].free);
    assert_eq!(loadings[0].group, 1);
    assert_eq!(loadings[1].group, 2);

    let covs: Vec<_> = rows.iter().filter(|r| r.op == "~~").collect();
    assert!(covs.iter().all(|r| r.free == 0));
    assert_eq!(covs[1].ustart, 0.5);

    let intercept = rows.iter().find(|r| r.op == "~1").expect("intercept row");
    assert!(intercept.rhs.is_empty());

    let define = rows.iter().find(|r| r.op == ":=").expect("define row");
    assert_eq!(define.group, 0);
    assert_eq!(free_count(&rows), 2);
}

#[test]
fn request_carries_group_order() {
    let syntax = two_group_model();
    let request = FitRequest::from_syntax(
        &syntax,
        "zyg",
        vec!["P1".to_string(), "P2".to_string()],
        Vec::new(),
        Estimator::Ml,
        Parameterization::Delta,
    );
    assert_eq!(request.group_labels, vec!["MZ", "DZ"]);
    assert_eq!(request.syntax, syntax.render());
}

#[test]
fn fit_lookups_by_label() {
    let fit = SemFit {
        params: vec![ParamEstimate {
            lhs: "A1".to_string(),
            op: "=~".to_string(),
            rhs: "P1".to_string(),
            group: 1,
            label: Some("a".to_string()),
            free: 1,
            est: 0.6,
            se: 0.1,
        }],
        defined: vec![DefinedEstimate {
            name: "a2".to_string(),
            expr: "a^2".to_string(),
            est: 0.36,
            se: 0.12,
        }],
        stats: FitStats {
            chisq: 0.0,
            df: 0,
            p_chisq: f64::NAN,
            cfi: 1.0,
            rmsea: 0.0,
        },
        converged: true,
        iterations: 3,
        npar: 1,
        warnings: Vec::new(),
    };
    assert_eq!(fit.estimate("a"), Some(0.6));
    assert_eq!(fit.estimate("c"), None);
    assert_eq!(fit.defined_estimate("a2").map(|d| d.est), Some(0.36));
    assert!(fit.defined_estimate("c2").is_none());
}
