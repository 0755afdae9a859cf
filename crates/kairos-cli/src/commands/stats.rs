use chrono::Utc;
use kairos_core::{Config, Database};

pub fn run(user: Option<String>, json: bool) -> super::CliResult {
    let config = Config::load()?;
    let user = super::resolve_user(user, &config);
    let db = Database::open()?;
    let stats = db.stats(&user, Utc::now(), config.calendar()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", crate::render::stats(&user, &stats));
    }
    Ok(())
}
