use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use runway_core::{
    EssentialSet, Group, category_breakdown, daily_essential_series, daily_expenses,
    forecast_runway,
};
use runway_insight::{
    CachedCompletion, PromptBuilder, Purchase, advise, render_breakdown, render_daily,
    render_report, render_runway, render_summary,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod auth;
mod chat;
mod config;
mod llm;
mod session;
mod state;

use session::{DataArgs, Session};

#[derive(Parser, Debug)]
#[command(
    name = "runway",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("RUNWAY_BUILD_SHA"), ")"),
    about = "Spending aggregates, balance runway and AI insight from transaction exports"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default ~/.runway/config.toml
    Setup,

    /// List the category taxonomy
    Categories,

    /// Expense/income totals, balance, savings progress and top categories
    Summary {
        #[command(flatten)]
        data: DataArgs,

        /// Also print every category and the daily expense series
        #[arg(long)]
        breakdown: bool,
    },

    /// Project how many days the balance lasts under the essential-spend trend
    Forecast {
        #[command(flatten)]
        data: DataArgs,

        /// Routine categories to project from (default: the Essential group)
        #[arg(long, value_delimiter = ',')]
        essential: Vec<String>,

        /// Ask the AI to explain the projection
        #[arg(long)]
        explain: bool,
    },

    /// AI insight over the current totals
    Insight {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Ask whether a purchase is worth it
    Advise {
        #[command(flatten)]
        data: DataArgs,

        /// Item or service
        #[arg(long)]
        item: String,

        #[arg(long)]
        price: f64,

        /// Why you want it
        #[arg(long, default_value = "")]
        reason: String,

        #[arg(long, default_value = "Misc")]
        category: String,
    },

    /// Interactive chat about the filtered transactions
    Chat {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Generate a plain-text summary with tips and write it to a file
    Report {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "finance_report.txt")]
        out: PathBuf,
    },

    /// Manage the text-completion API key
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Store an OpenRouter API key in ~/.runway/auth.json
    PasteApiKey,

    /// Show where the API key comes from
    Status,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Setup => config::init_config()?,

        Command::Categories => {
            let taxonomy = config::load_config()?.taxonomy();
            for group in Group::ALL {
                let tag = if group == Group::Lifestyle { " (discretionary)" } else { "" };
                println!("{}{tag}: {}", group.label(), taxonomy.group_members(group).join(", "));
            }
        }

        Command::Summary { data, breakdown } => {
            let s = Session::load(config::load_config()?, &data)?;
            println!("{}\n", s.describe_range());
            print!("{}", render_summary(&s.aggregate, s.balance, s.savings_goal, s.currency()));

            if breakdown {
                println!("\n## Categories\n");
                let rows = category_breakdown(&s.transactions, &s.filter, &s.taxonomy);
                print!("{}", render_breakdown(&rows, s.currency()));
                println!("\n## Daily expenses\n");
                print!("{}", render_daily(&daily_expenses(&s.transactions, &s.filter), s.currency()));
            }
        }

        Command::Forecast {
            data,
            essential,
            explain,
        } => {
            let s = Session::load(config::load_config()?, &data)?;
            let set = if essential.is_empty() {
                EssentialSet::from_taxonomy(&s.taxonomy)
            } else {
                EssentialSet::restricted(essential.iter().map(String::as_str), &s.taxonomy)
            };
            let series = daily_essential_series(&s.transactions, &s.filter, &set);
            let forecast = forecast_runway(&series, s.balance.amount(), s.today);

            println!("{}", s.describe_range());
            println!(
                "Routine categories: {}\nBalance ({}): {}\n",
                set.iter().collect::<Vec<_>>().join(", "),
                s.balance.label(),
                runway_insight::format_money(s.balance.amount(), s.currency()),
            );
            println!("{}", render_runway(forecast.as_ref(), s.currency()));

            if explain {
                match &forecast {
                    Some(f) => {
                        let (builder, client) = completion(&s.config)?;
                        println!("\n{}", advise(client.inner(), &builder.runway_request(f, s.balance.amount())));
                    }
                    None => println!("\n(nothing to explain without a projection)"),
                }
            }
        }

        Command::Insight { data } => {
            let s = Session::load(config::load_config()?, &data)?;
            let (builder, client) = completion(&s.config)?;
            let req = builder.summary_request(&s.aggregate, s.balance.amount());
            println!("{}", advise(&client, &req));
        }

        Command::Advise {
            data,
            item,
            price,
            reason,
            category,
        } => {
            if item.trim().is_empty() {
                bail!("--item must not be empty");
            }
            let s = Session::load(config::load_config()?, &data)?;
            let (builder, client) = completion(&s.config)?;
            let purchase = Purchase {
                item,
                price,
                reason,
                category: s.taxonomy.normalize(&category).category,
            };
            println!("{}", advise(client.inner(), &builder.purchase_request(&purchase, s.balance.amount())));
        }

        Command::Chat { data } => {
            let s = Session::load(config::load_config()?, &data)?;
            let (builder, client) = completion(&s.config)?;
            chat::run_chat(&s, &builder, &client)?;
        }

        Command::Report { data, out } => {
            let s = Session::load(config::load_config()?, &data)?;
            let (builder, client) = completion(&s.config)?;
            let req = builder.report_request(&s.aggregate, s.balance.amount(), s.savings_goal);
            let text = advise(client.inner(), &req);
            let report = render_report(
                chrono::Local::now().naive_local(),
                &s.aggregate,
                s.balance,
                s.savings_goal,
                s.currency(),
                &text,
            );
            print!("{report}");
            std::fs::write(&out, &report).with_context(|| format!("write {}", out.display()))?;
            println!("\nSaved {}", out.display());
        }

        Command::Auth { command } => match command {
            AuthCommand::PasteApiKey => auth::paste_api_key()?,
            AuthCommand::Status => auth::status()?,
        },
    }

    Ok(())
}

/// Prompt builder plus the cached completion client for this run
fn completion(cfg: &config::Config) -> Result<(PromptBuilder, CachedCompletion<llm::ChatCompletionsClient>)> {
    let builder = PromptBuilder::new(cfg.system_prompt()?);
    let client = llm::ChatCompletionsClient::new(cfg.llm.clone(), auth::resolve_api_key()?)?;
    Ok((builder, CachedCompletion::new(client, cfg.cache_ttl())))
}
