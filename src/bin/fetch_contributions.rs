use std::path::Path;

use anyhow::Result;
use env_logger::Env;
use log::{error, info};
use site_tools::config::Config;
use site_tools::contributions::{self, ContributionArchive};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!("fetching contribution data for user: {}", config.github_username);

    let client = reqwest::Client::new();
    let mut archive = ContributionArchive::default();
    for year in contributions::TARGET_YEARS {
        info!("fetching data for {year}...");
        match contributions::fetch_year(
            &client,
            &config.github_username,
            year,
            &config.github_pat,
        )
        .await
        {
            Ok(counts) if !counts.is_empty() => {
                info!("  found {} days of data", counts.len());
                archive.insert(year, counts);
            }
            Ok(_) => info!("  no data found for {year}"),
            Err(e) => error!("  request for {year} failed: {e:?}"),
        }
    }

    archive.write_to(Path::new(contributions::OUTPUT_PATH))?;
    info!("contribution data saved to {}", contributions::OUTPUT_PATH);
    Ok(())
}
