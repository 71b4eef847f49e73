//! The `pickbest` command.

use anyhow::Context;
use clap::*;
use log::{info, warn};
use std::io::IsTerminal;

use polishpick::libs::error::PolishError;
use polishpick::libs::group::DEFAULT_CAPACITY;
use polishpick::libs::report::ReportMode;
use polishpick::libs::select::Tolerance;
use polishpick::libs::stream::{pick_best_stream, PickOptions};

pub fn make_command() -> Command {
    Command::new("pickbest")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Pick the best polish(es) of each query")
        .color(ColorChoice::Auto)
        .after_help(
            r###"
Polishes must be grouped by query id (estID). For each query, the polish with the
best percent identity, number of matches and number of exons is kept; equally good
polishes are all kept.

* --ests: 10 matches of slack when trading matches for exons (default)
* --mrna: 15 matches of slack
* --validate: print every polish as a one-line summary, the best ones marked
  with `*`, under a line naming the rule that decided

Legacy single-dash options are accepted too: -n <count>, -mrna,
-ests and -validate. Unknown options are reported and ignored.

Examples:
  pickbest < in.polish > out.polish
  pickbest -mrna -validate < in.polish
  pickbest --mrna in.polish.gz -o out.polish

"###,
        )
        .arg(
            Arg::new("infile")
                .help("Input polishes. [stdin] for standard input")
                .default_value("stdin")
                .index(1),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Initial number of polishes buffered per query, grows as needed [default: 65536]"),
        )
        .arg(
            Arg::new("mrna")
                .long("mrna")
                .action(ArgAction::SetTrue)
                .overrides_with("ests")
                .help("Use the larger match slack for mRNAs"),
        )
        .arg(
            Arg::new("ests")
                .long("ests")
                .action(ArgAction::SetTrue)
                .overrides_with("mrna")
                .help("Use the smaller match slack for ESTs"),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .action(ArgAction::SetTrue)
                .help("Report all polishes, marking the best ones"),
        )
}

/// Turn legacy single-dash options into their long forms and
/// drop unknown options with a warning. The first element is the program name.
///
/// Only the first two characters of a legacy option are looked at, so `-m`
/// and `-mrna` are the same option.
pub fn normalize_args<I: IntoIterator<Item = String>>(cmd: &Command, args: I) -> Vec<String> {
    let mut longs: Vec<String> = vec!["--help".to_string(), "--version".to_string()];
    let mut shorts: Vec<String> = vec!["-h".to_string(), "-V".to_string()];
    let mut with_value: Vec<String> = vec![];

    for arg in cmd.get_arguments() {
        let takes_value = arg.get_action().takes_values();
        if let Some(long) = arg.get_long() {
            longs.push(format!("--{}", long));
            if takes_value {
                with_value.push(format!("--{}", long));
            }
        }
        if let Some(short) = arg.get_short() {
            shorts.push(format!("-{}", short));
            if takes_value {
                with_value.push(format!("-{}", short));
            }
        }
    }

    let mut iter = args.into_iter();
    let mut normalized: Vec<String> = iter.next().into_iter().collect();
    let mut expect_value = false;

    for arg in iter {
        if expect_value {
            expect_value = false;
            normalized.push(arg);
            continue;
        }

        if !arg.starts_with('-') || arg == "-" {
            normalized.push(arg);
            continue;
        }

        if arg.starts_with("--") {
            let name = arg.split('=').next().unwrap_or_default();
            if longs.iter().any(|l| l == name) {
                expect_value = with_value.iter().any(|l| l == name) && !arg.contains('=');
                normalized.push(arg);
            } else {
                warn!("unknown option: {}", arg);
            }
            continue;
        }

        if shorts.contains(&arg) {
            expect_value = with_value.contains(&arg);
            normalized.push(arg);
            continue;
        }

        let legacy = match arg.get(..2) {
            Some("-n") => Some("--capacity"),
            Some("-m") => Some("--mrna"),
            Some("-e") => Some("--ests"),
            Some("-v") => Some("--validate"),
            _ => None,
        };
        match legacy {
            Some(long) => {
                expect_value = long == "--capacity";
                normalized.push(long.to_string());
            }
            None => warn!("unknown option: {}", arg),
        }
    }

    normalized
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    let opt = PickOptions {
        tolerance: if args.get_flag("mrna") {
            Tolerance::mrna()
        } else {
            Tolerance::ests()
        },
        mode: if args.get_flag("validate") {
            ReportMode::Validate
        } else {
            ReportMode::Normal
        },
        capacity: args
            .get_one::<usize>("capacity")
            .copied()
            .unwrap_or(DEFAULT_CAPACITY),
    };

    if infile == "stdin" && std::io::stdin().is_terminal() {
        eprintln!("{}", make_command().render_usage());
        return Err(PolishError::Terminal.into());
    }

    //----------------------------
    // Ops
    //----------------------------
    let reader = polishpick::reader(infile)?;
    let writer = polishpick::writer(outfile)?;

    let summary = pick_best_stream(reader, writer, &opt)
        .with_context(|| format!("failed to pick best polishes from {}", infile))?;

    info!(
        "{} queries, {} polishes read, {} picked",
        summary.queries, summary.polishes, summary.written
    );

    Ok(())
}
