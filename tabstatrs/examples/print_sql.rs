use std::{collections::BTreeMap, env, fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use tabstat::{Catalog, QueryParams, SqlBuilder, TablePath, TabstatConfig};

fn usage() {
    eprintln!("Usage: print_sql <project.dataset.table | table_alias> <catalog_json> [params_json_or_yaml]");
    eprintln!(
        "Example: cargo run --example print_sql -- stats.nba.box_scores demos/box_scores.json demos/top_scorers.yaml"
    );
    eprintln!("A table alias is looked up in the tabstat config; its stored query is used when no params file is given.");
}

fn read_params(path: &PathBuf) -> anyhow::Result<QueryParams> {
    let raw = fs::read_to_string(path)?;
    let params = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => QueryParams::from_yaml_str(&raw)?,
        _ => QueryParams::from_json_str(&raw)?,
    };
    Ok(params)
}

fn main() -> anyhow::Result<()> {
    tabstat::logging::init("tabstat=info")?;

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let config = TabstatConfig::load_default();
    let target = args.remove(0);
    let catalog_path = PathBuf::from(args.remove(0));
    let params_path = args.pop().map(PathBuf::from);

    let (table, stored) = match TablePath::parse(&target) {
        Ok(table) => (table, None),
        Err(_) => {
            let binding = config.table(&target)?;
            (binding.table_path()?, binding.params()?)
        }
    };

    let params = match (params_path, stored) {
        (Some(path), _) => read_params(&path)?,
        (None, Some(stored)) => stored,
        (None, None) => {
            usage();
            std::process::exit(1);
        }
    };

    let columns: BTreeMap<String, String> = serde_json::from_str(
        &fs::read_to_string(&catalog_path)
            .with_context(|| format!("reading {}", catalog_path.display()))?,
    )?;
    let catalog = Catalog::from_pairs(columns);

    let builder = SqlBuilder::new(table, Arc::new(catalog))
        .with_max_row_limit(config.defaults.query.max_row_limit);
    let sql = builder.build(&params)?;
    println!("{sql}");
    Ok(())
}
