use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use twinsem::builder::{BatchRequest, BuildOptions, SpecBuilder, build_batch};
use twinsem::family::Family;
use twinsem::group::resolve;
use twinsem::io::{group_order, par_table_frame, read_table, write_dataframe, write_text};
use twinsem::logging::{init_tracing, log_line, warn_line};
use twinsem::relatedness::{GroupProfile, default_table};
use twinsem::simulate::{Paths, SimConfig, simulate, thresholds_from_proportions};
use twinsem::spec::StructuralSpecification;
use twinsem::types::{Component, Phenotypes, Twin};

#[derive(Parser)]
#[command(name = "twinsem")]
#[command(about = "Twin-model SEM specifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Build {
        #[arg(long, required = true)]
        family: String,
        #[arg(long, required = true)]
        groups: String,
        #[arg(long)]
        categories: Option<usize>,
        #[arg(long, default_value = "P")]
        phenotype: String,
        #[arg(long, default_value = "lavaan")]
        format: String,
        #[arg(long)]
        no_means: bool,
        #[arg(long)]
        no_defines: bool,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "zyg")]
        column: String,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    Groups {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "zyg")]
        column: String,
    },
    Simulate {
        #[arg(long, required = true)]
        groups: String,
        #[arg(long, default_value_t = 1000)]
        pairs: usize,
        #[arg(long, default_value_t = 0.6)]
        a: f64,
        #[arg(long, default_value_t = 0.4)]
        c: f64,
        #[arg(long, default_value_t = 0.0)]
        d: f64,
        #[arg(long, default_value_t = 0.69)]
        e: f64,
        /// Female paths as `a,c,d,e`.
        #[arg(long)]
        female: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        beta: f64,
        /// Category proportions, e.g. `0.5,0.3,0.2`.
        #[arg(long)]
        proportions: Option<String>,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long, default_value = "P")]
        phenotype: String,
        #[arg(long, default_value = "zyg")]
        column: String,
        #[arg(long, required = true)]
        output: PathBuf,
    },
    Batch {
        #[arg(long, required = true)]
        families: String,
        #[arg(long, required = true)]
        groups: String,
        #[arg(long, default_value = "P")]
        phenotype: String,
        #[arg(long)]
        cores: Option<usize>,
        #[arg(long, required = true)]
        output_prefix: PathBuf,
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            family,
            groups,
            categories,
            phenotype,
            format,
            no_means,
            no_defines,
            data,
            column,
            output,
            log,
        } => {
            let mut log = open_log(log.as_deref())?;
            let family = Family::from_name(&family, categories)?;
            let groups = resolve(&split_string_list(groups))?;
            let options = BuildOptions {
                phenotypes: Phenotypes::from_base(&phenotype),
                means: !no_means,
                defines: !no_defines,
            };
            let mut spec = SpecBuilder::new(family).options(options).build(&groups)?;
            log_line(
                log.as_mut(),
                &format!(
                    "Built {} over groups [{}] with {} free parameters",
                    spec.family,
                    spec.groups.labels().join(","),
                    spec.free_labels().len()
                ),
            )?;

            if let Some(path) = data {
                let df = read_table(&path)?;
                let observed = group_order(&df, &column)?;
                if spec.check_data_order(&observed).is_err() {
                    warn_line(
                        log.as_mut(),
                        &format!(
                            "Reordering groups to match {}: [{}]",
                            path.display(),
                            observed.join(",")
                        ),
                    )?;
                    spec = spec.align_to(&observed)?;
                }
            }

            write_spec(&spec, &format, output.as_deref())?;
        }
        Command::Groups { data, column } => match data {
            Some(path) => {
                let df = read_table(&path)?;
                let observed = group_order(&df, &column)?;
                let groups = resolve(&observed)?;
                println!("group\ta\tc\td\tsex1\tsex2");
                for group in groups.iter() {
                    println!("{}", group_line(&group.label, group.profile));
                }
            }
            None => {
                let table = default_table();
                println!("group\ta\tc\td\tsex1\tsex2");
                for label in table.labels() {
                    println!("{}", group_line(label, table.profile(label)?));
                }
            }
        },
        Command::Simulate {
            groups,
            pairs,
            a,
            c,
            d,
            e,
            female,
            beta,
            proportions,
            seed,
            phenotype,
            column,
            output,
        } => {
            let groups = resolve(&split_string_list(groups))?;
            let female = female.map(parse_paths).transpose()?;
            let thresholds = proportions
                .map(|p| thresholds_from_proportions(&split_f64_list(p)))
                .transpose()?;
            let config = SimConfig {
                pairs,
                paths: Paths { a, c, d, e },
                female,
                beta,
                thresholds,
                seed,
                phenotypes: Phenotypes::from_base(&phenotype),
                group_column: column,
                parallel: true,
            };
            let df = simulate(&config, &groups)?;
            write_dataframe(&df, &output)?;
        }
        Command::Batch {
            families,
            groups,
            phenotype,
            cores,
            output_prefix,
            log,
        } => {
            let mut log = open_log(log.as_deref())?;
            let groups = split_string_list(groups);
            let options = BuildOptions {
                phenotypes: Phenotypes::from_base(&phenotype),
                ..BuildOptions::default()
            };
            let requests = split_string_list(families)
                .iter()
                .map(|name| {
                    Ok(BatchRequest {
                        family: name.parse::<Family>()?,
                        groups: groups.clone(),
                        options: options.clone(),
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let results = build_batch(&requests, cores)?;
            for (request, result) in requests.iter().zip(results) {
                match result {
                    Ok(spec) => {
                        let path = batch_path(&output_prefix, request.family);
                        write_text(&spec.to_lavaan()?, &path)?;
                        log_line(
                            log.as_mut(),
                            &format!("{} written to {}", request.family, path.display()),
                        )?;
                    }
                    Err(err) => {
                        warn_line(log.as_mut(), &format!("{} skipped: {err}", request.family))?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn open_log(path: Option<&Path>) -> anyhow::Result<Option<File>> {
    path.map(|p| File::create(p).with_context(|| format!("create log {}", p.display())))
        .transpose()
}

fn write_spec(
    spec: &StructuralSpecification,
    format: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match format {
        "lavaan" => {
            let text = spec.to_lavaan()?;
            match output {
                Some(path) => write_text(&text, path)?,
                None => println!("{text}"),
            }
        }
        "table" => {
            let df = par_table_frame(&spec.par_table()?)?;
            match output {
                Some(path) => write_dataframe(&df, path)?,
                None => println!("{df}"),
            }
        }
        other => return Err(anyhow::anyhow!("unknown format {other}; use lavaan or table")),
    }
    Ok(())
}

fn group_line(label: &str, profile: GroupProfile) -> String {
    let sex = |t| {
        profile
            .sex(t)
            .map(|s| s.as_str())
            .unwrap_or("-")
            .to_string()
    };
    let r = profile.relatedness;
    format!(
        "{label}\t{}\t{}\t{}\t{}\t{}",
        r.coefficient(Component::A),
        r.coefficient(Component::C),
        r.coefficient(Component::D),
        sex(Twin::One),
        sex(Twin::Two)
    )
}

fn batch_path(prefix: &Path, family: Family) -> PathBuf {
    let name = family
        .name()
        .to_ascii_lowercase()
        .replace(['(', ')'], "")
        .replace('-', "_");
    let mut path = prefix.as_os_str().to_owned();
    path.push(format!("_{name}.lav"));
    PathBuf::from(path)
}

fn parse_paths(input: String) -> anyhow::Result<Paths> {
    match split_f64_list(input).as_slice() {
        [a, c, d, e] => Ok(Paths {
            a: *a,
            c: *c,
            d: *d,
            e: *e,
        }),
        other => Err(anyhow::anyhow!(
            "expected four paths a,c,d,e, got {}",
            other.len()
        )),
    }
}

fn split_string_list(input: String) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_f64_list(input: String) -> Vec<f64> {
    split_string_list(input)
        .into_iter()
        .map(|s| s.parse::<f64>().unwrap_or(f64::NAN))
        .collect()
}
