extern crate clap;
use env_logger::Env;

mod cmd_pickbest;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = cmd_pickbest::make_command();
    let args = cmd_pickbest::normalize_args(&app, std::env::args());

    cmd_pickbest::execute(&app.get_matches_from(args))?;

    Ok(())
}
