use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use saltofi_rust::{
    build_follow_up_payload, Block, ElementView, Entity, FieldValue, FollowUpRequest,
    SubmissionClient, SubmissionConfig, GRB_TEMPLATE,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "saltofi", about = "Edit and submit SALT proposal blocks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every field of a block and its nested entities
    Show { path: PathBuf },

    /// Fill a block template for a follow-up target and print the payload as JSON
    FollowUp {
        #[arg(long)]
        target_id: i64,
        #[arg(long)]
        name: String,
        /// Right ascension in degrees
        #[arg(long, allow_hyphen_values = true)]
        ra: f64,
        /// Declination in degrees
        #[arg(long, allow_hyphen_values = true)]
        dec: f64,
        #[arg(long, default_value = "V")]
        mag_filter: String,
        #[arg(long = "finding-chart")]
        finding_charts: Vec<String>,
        #[arg(long)]
        exposure_time: Option<f64>,
        /// Block template, the bundled GRB template when omitted
        #[arg(long)]
        template: Option<PathBuf>,
        /// Date used for semester assignment, today when omitted
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Send the filled block right away
        #[arg(long)]
        submit: bool,
    },

    /// Submit a block document
    Submit { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Show { path } => show(&path),
        Command::FollowUp {
            target_id,
            name,
            ra,
            dec,
            mag_filter,
            finding_charts,
            exposure_time,
            template,
            as_of,
            submit,
        } => {
            let mut request = FollowUpRequest::new(target_id, name, ra, dec);
            request.mag_filter = mag_filter;
            if !finding_charts.is_empty() {
                request.finding_charts = finding_charts;
            }
            request.exposure_time = exposure_time;

            let template = match template {
                Some(path) => std::fs::read(&path)
                    .with_context(|| format!("reading template {}", path.display()))?,
                None => GRB_TEMPLATE.to_vec(),
            };
            let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

            let payload = build_follow_up_payload(&template, &request, as_of)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);

            if submit {
                let doc = ElementView::parse(payload.xml.as_bytes())?;
                let receipt = client()?.submit_block(&doc)?;
                println!("Submitted block {}", receipt.block_code);
            }
            Ok(())
        }
        Command::Submit { path } => {
            let doc = ElementView::open(&path)
                .with_context(|| format!("loading block {}", path.display()))?;
            let receipt = client()?.submit_block(&doc)?;
            println!("Submitted block {}", receipt.block_code);
            Ok(())
        }
    }
}

fn client() -> anyhow::Result<SubmissionClient> {
    let config = SubmissionConfig::load()?;
    config.validate()?;
    println!(
        "Configuration loaded: portal={} proposal={}",
        config.portal_url, config.proposal_code
    );
    Ok(SubmissionClient::new(config)?)
}

fn show(path: &Path) -> anyhow::Result<()> {
    let doc = ElementView::open(path).with_context(|| format!("loading block {}", path.display()))?;
    let block: Block = doc.block();
    print_fields(0, Block::KIND, &block.describe(&doc)?);

    for pointing in block.pointings(&doc)? {
        print_fields(1, "Pointing", &pointing.describe(&doc)?);
        for observation in pointing.observations(&doc)? {
            print_fields(2, "Observation", &observation.describe(&doc)?);
            for config in observation.instrument_configs(&doc)? {
                print_fields(3, config.kind(), &config.describe(&doc)?);
            }
            for target in observation.targets(&doc)? {
                print_fields(3, "Target", &target.describe(&doc)?);
                let coord = target.coordinates(&doc)?;
                let (ra, dec) = (coord.ra_hms(), coord.dec_dms());
                println!(
                    "{:8}coordinates: {:02}:{:02}:{:09.6} {}{:02}:{:02}:{:09.6} (equinox {})",
                    "",
                    ra.hours,
                    ra.minutes,
                    ra.seconds,
                    if dec.negative { "-" } else { "+" },
                    dec.degrees,
                    dec.arcminutes,
                    dec.arcseconds,
                    coord.equinox.unwrap_or(saltofi_rust::DEFAULT_EQUINOX)
                );
                println!("{:8}finding charts: {:?}", "", target.finding_charts(&doc)?);
            }
        }
    }
    Ok(())
}

fn print_fields(depth: usize, kind: &str, fields: &[(&'static str, FieldValue)]) {
    let indent = "  ".repeat(depth);
    println!("{}{}", indent, kind);
    for (name, value) in fields {
        println!("{}  {}: {}", indent, name, value);
    }
}
