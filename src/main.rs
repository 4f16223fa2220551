use anyhow::{anyhow, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use dotenv::dotenv;
use rulekit::engine::{evaluate, parse, Environment, Expression, Value};
use rulekit::rules::RuleLoader;
use std::path::{Path, PathBuf};

/// Default variables file when `--vars` is not given
const VARS_ENV: &str = "RULEKIT_VARS";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse an expression and print its tree as JSON
    Parse {
        /// The expression to parse
        #[arg(short, long)]
        expr: String,

        /// Pretty-print the tree
        #[arg(long)]
        pretty: bool,
    },
    /// Evaluate an expression or a stored tree
    #[command(group(ArgGroup::new("input").required(true).args(["expr", "tree"])))]
    Eval {
        /// The expression to evaluate
        #[arg(short, long)]
        expr: Option<String>,

        /// Path to a JSON expression tree
        #[arg(short, long)]
        tree: Option<PathBuf>,

        #[command(flatten)]
        vars: VarArgs,

        /// Print the result as a tagged JSON value
        #[arg(long)]
        json: bool,
    },
    /// Report which rules in a rule file pass
    Check {
        /// Path to the YAML rule file
        #[arg(short, long)]
        rules: PathBuf,

        #[command(flatten)]
        vars: VarArgs,
    },
}

#[derive(clap::Args, Debug)]
struct VarArgs {
    /// JSON or YAML file of variables
    #[arg(long, env = VARS_ENV)]
    vars: Option<PathBuf>,

    /// Single variable as name=value; the value is read as JSON, else as a string
    #[arg(long = "var", value_parser = parse_var)]
    var: Vec<(String, Value)>,
}

impl VarArgs {
    fn environment(self) -> Result<Environment> {
        let mut env = Environment::new().with_builtins();
        if let Some(path) = &self.vars {
            let loaded = Environment::load(path)
                .with_context(|| format!("Failed to load variables from {}", path.display()))?;
            env.merge(loaded);
        }
        for (name, value) in self.var {
            env.set(name, value);
        }
        Ok(env)
    }
}

fn parse_var(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{}'", raw))?;
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return Err(anyhow!("variable name is empty in '{}'", raw));
    }
    let value = serde_json::from_str::<serde_json::Value>(value)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(value));
    Ok((name.to_string(), value))
}

fn load_tree(path: &Path) -> Result<Expression> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid expression tree in {}", path.display()))
}

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Parse { expr, pretty } => {
            let tree = parse(&expr)?;
            let output = if pretty {
                serde_json::to_string_pretty(&tree)?
            } else {
                serde_json::to_string(&tree)?
            };
            println!("{}", output);
        }
        Commands::Eval {
            expr,
            tree,
            vars,
            json,
        } => {
            let tree = match (expr, tree) {
                (Some(expr), _) => parse(&expr)?,
                (None, Some(path)) => load_tree(&path)?,
                (None, None) => return Err(anyhow!("either --expr or --tree is required")),
            };
            let env = vars.environment()?;
            log::info!("Evaluating {}", tree);

            let result = evaluate(&tree, &env)?;
            if json {
                println!("{}", serde_json::to_string(&result)?);
            } else {
                println!("{}", result);
            }
        }
        Commands::Check { rules, vars } => {
            let rule_set = RuleLoader::new()
                .load_rules(&rules)
                .with_context(|| format!("Failed to load rules from {}", rules.display()))?;
            let env = vars.environment()?;

            for (name, result) in rule_set.evaluate_all(&env) {
                match result {
                    Ok(Value::Bool(true)) => println!("PASS  {}", name),
                    Ok(Value::Bool(false)) => println!("FAIL  {}", name),
                    Ok(other) => println!("FAIL  {} (not a bool: {})", name, other.value_type()),
                    Err(e) => println!("ERROR {} ({})", name, e),
                }
            }
        }
    }

    Ok(())
}
